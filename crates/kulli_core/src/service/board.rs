//! Board controller: the single owner of the note list.
//!
//! # Responsibility
//! - Create notes from completed edits and pastes at the next free cell.
//! - Move deleted notes to trash and purge expired trash on open.
//! - Reflow on viewport changes and apply search filters explicitly.
//!
//! # Invariants
//! - Only notes with non-empty trimmed text are added.
//! - Ids are allocated from a context-owned counter reseeded from notes and
//!   trash, so they never collide with persisted records.
//! - Persisted positions are always the unfiltered layout.
//! - Notes committed during a search are placed against the unfiltered
//!   layout and then filtered like any other note.

use crate::config::{LayoutConfig, TRASH_RETENTION_DAYS};
use crate::layout::{next_position, reflow, SearchFilter};
use crate::model::note::{Note, TrashedNote};
use crate::model::note_id::{NoteId, NoteIdAllocator};
use crate::repo::note_store::{NoteStore, StoreError};
use crate::service::environment::{Environment, Viewport};
use chrono::Utc;
use log::{debug, info};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type BoardResult<T> = Result<T, BoardError>;

/// Board use-case error.
#[derive(Debug)]
pub enum BoardError {
    Store(StoreError),
    NoteNotFound(NoteId),
}

impl Display for BoardError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Store(err) => write!(f, "{err}"),
            Self::NoteNotFound(id) => write!(f, "note not found: {id}"),
        }
    }
}

impl Error for BoardError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            Self::NoteNotFound(_) => None,
        }
    }
}

impl From<StoreError> for BoardError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

/// Note board over a persistence store and a host environment.
pub struct Board<S: NoteStore, E: Environment> {
    config: LayoutConfig,
    store: S,
    env: E,
    notes: Vec<Note>,
    editing: Option<Note>,
    ids: NoteIdAllocator,
    filter: SearchFilter,
    query: String,
    viewport: Viewport,
}

impl<S: NoteStore, E: Environment> Board<S, E> {
    /// Loads persisted state, reseeds ids and purges expired trash.
    pub fn open(config: LayoutConfig, store: S, env: E) -> BoardResult<Self> {
        let notes = store.load_notes()?;
        let trash = store.load_trash()?;
        let ids = NoteIdAllocator::seeded_from(
            notes
                .iter()
                .map(|note| &note.id)
                .chain(trash.iter().map(|item| &item.note.id)),
        );
        store.cleanup_trash(TRASH_RETENTION_DAYS, Utc::now())?;
        let viewport = env.measure_viewport();

        info!(
            "event=board_open module=service status=ok notes={} trash={} next_id={}",
            notes.len(),
            trash.len(),
            ids.peek()
        );

        Ok(Self {
            config,
            store,
            env,
            notes,
            editing: None,
            ids,
            filter: SearchFilter::new(),
            query: String::new(),
            viewport,
        })
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn note(&self, id: &NoteId) -> Option<&Note> {
        self.notes.iter().find(|note| &note.id == id)
    }

    pub fn editing_note(&self) -> Option<&Note> {
        self.editing.as_ref()
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn search_query(&self) -> &str {
        &self.query
    }

    /// Notes the host should render: every note, or only search matches.
    pub fn visible_notes(&self) -> Vec<&Note> {
        if !self.filter.is_active() {
            return self.notes.iter().collect();
        }
        self.filter
            .matches()
            .iter()
            .filter_map(|id| self.note(id))
            .collect()
    }

    /// Whether the empty-board hint should be shown.
    pub fn hint_visible(&self) -> bool {
        self.notes.is_empty() && self.editing.is_none()
    }

    /// Starts composing a note seeded with `initial_text`.
    ///
    /// Returns the id of the note being composed; calling again while a
    /// note is open returns the open note's id.
    pub fn start_editing(&mut self, initial_text: &str) -> NoteId {
        if let Some(editing) = self.editing.as_ref() {
            return editing.id.clone();
        }

        let position =
            next_position(&self.config, &self.unfiltered_notes(), self.viewport.width);
        let note = Note::new(self.ids.next_id(), initial_text, position);
        let id = note.id.clone();
        self.editing = Some(note);
        self.env.focus_and_place_cursor(&id);
        debug!("event=edit_start module=service status=ok note_id={id}");
        id
    }

    /// Replaces the text of the note being composed.
    pub fn update_editing_text(&mut self, text: &str) {
        if let Some(editing) = self.editing.as_mut() {
            editing.text = text.to_string();
        }
    }

    /// Commits the composed note when it has content; discards it otherwise.
    pub fn confirm_editing(&mut self) -> BoardResult<Option<NoteId>> {
        let Some(note) = self.editing.take() else {
            return Ok(None);
        };
        if !note.has_content() {
            debug!(
                "event=edit_confirm module=service status=skip note_id={} reason=empty",
                note.id
            );
            return Ok(None);
        }

        let id = note.id.clone();
        self.admit(note);
        self.persist()?;
        info!("event=note_create module=service status=ok note_id={id} source=edit");
        Ok(Some(id))
    }

    /// Drops the composed note without saving.
    pub fn cancel_editing(&mut self) {
        if let Some(note) = self.editing.take() {
            debug!("event=edit_cancel module=service status=ok note_id={}", note.id);
        }
    }

    /// Creates a note directly from pasted text.
    ///
    /// Text is trimmed; blank input creates nothing. The note being composed,
    /// if any, still reserves its cell.
    pub fn create_note(&mut self, text: &str) -> BoardResult<Option<NoteId>> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(None);
        }

        let mut occupied = self.unfiltered_notes();
        if let Some(editing) = self.editing.as_ref() {
            occupied.push(editing.clone());
        }
        let position = next_position(&self.config, &occupied, self.viewport.width);
        let note = Note::new(self.ids.next_id(), text, position);
        let id = note.id.clone();
        self.admit(note);
        self.persist()?;
        info!("event=note_create module=service status=ok note_id={id} source=paste");
        Ok(Some(id))
    }

    /// Replaces the text of an existing note.
    pub fn update_note_text(&mut self, id: &NoteId, text: &str) -> BoardResult<()> {
        let note = self
            .notes
            .iter_mut()
            .find(|note| &note.id == id)
            .ok_or_else(|| BoardError::NoteNotFound(id.clone()))?;
        note.text = text.to_string();
        self.reapply_filter();
        self.persist()
    }

    /// Moves a note to trash and removes it from the board.
    ///
    /// The board is left untouched when the store rejects the deletion.
    pub fn delete_note(&mut self, id: &NoteId) -> BoardResult<TrashedNote> {
        let index = self
            .notes
            .iter()
            .position(|note| &note.id == id)
            .ok_or_else(|| BoardError::NoteNotFound(id.clone()))?;

        let mut unfiltered = self.unfiltered_notes();
        let note = unfiltered.remove(index);
        let trashed = self.store.trash_note(&unfiltered, &note, Utc::now())?;

        self.notes.remove(index);
        self.filter.forget(id);
        info!("event=note_trash module=service status=ok note_id={id}");
        Ok(trashed)
    }

    /// Re-measures the viewport and reflows the board.
    ///
    /// With a filter active, the stored pre-filter layout is re-packed for
    /// the new width and the matches are packed again.
    pub fn on_viewport_changed(&mut self) -> BoardResult<()> {
        self.viewport = self.env.measure_viewport();
        let width = self.viewport.width;

        if self.filter.is_active() {
            self.filter.reflow_snapshot(&self.config, &self.notes, width);
            self.filter
                .filter_and_reflow(&self.config, &mut self.notes, &self.query, width);
        } else {
            reflow(&self.config, &mut self.notes, width);
        }

        debug!(
            "event=board_reflow module=service status=ok width={width} notes={}",
            self.notes.len()
        );
        self.persist()
    }

    /// Applies a search query; an empty query restores the full board.
    pub fn set_search_query(&mut self, query: &str) {
        self.query = query.to_string();
        self.filter.filter_and_reflow(
            &self.config,
            &mut self.notes,
            query,
            self.viewport.width,
        );
    }

    /// Adds a committed note; while filtering it joins the snapshot at its
    /// unfiltered cell and the query is applied again.
    fn admit(&mut self, note: Note) {
        self.filter.record(&note.id, note.position());
        self.notes.push(note);
        self.reapply_filter();
    }

    fn reapply_filter(&mut self) {
        if self.filter.is_active() {
            self.filter.filter_and_reflow(
                &self.config,
                &mut self.notes,
                &self.query,
                self.viewport.width,
            );
        }
    }

    /// Notes at the positions they hold without a search filter.
    fn unfiltered_notes(&self) -> Vec<Note> {
        self.notes
            .iter()
            .map(|note| {
                let mut note = note.clone();
                if let Some(original) = self.filter.original_position(&note.id) {
                    note.set_position(original);
                }
                note
            })
            .collect()
    }

    /// Writes the unfiltered layout to the store.
    fn persist(&self) -> BoardResult<()> {
        self.store.save_notes(&self.unfiltered_notes())?;
        Ok(())
    }
}
