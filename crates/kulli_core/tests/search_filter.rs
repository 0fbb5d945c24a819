use chrono::{TimeZone, Utc};
use kulli_core::{reflow, LayoutConfig, Note, NoteId, Position, SearchFilter};

const WIDTH: f64 = 1000.0;

fn board() -> Vec<Note> {
    let texts = ["Buy milk", "call mom", "Milk shake recipe", "dentist friday"];
    let mut notes: Vec<Note> = texts
        .iter()
        .enumerate()
        .map(|(index, text)| {
            Note::with_created_at(
                NoteId::from_sequence(index as u64 + 1),
                *text,
                Position::default(),
                Utc.with_ymd_and_hms(2026, 4, 2, 10, index as u32, 0).unwrap(),
            )
        })
        .collect();
    reflow(&LayoutConfig::default(), &mut notes, WIDTH);
    notes
}

fn snapshot(notes: &[Note]) -> Vec<(NoteId, Position)> {
    notes.iter().map(|note| (note.id.clone(), note.position())).collect()
}

#[test]
fn matches_are_packed_newest_first_and_others_stay_put() {
    let config = LayoutConfig::default();
    let mut notes = board();
    let before = snapshot(&notes);
    let mut filter = SearchFilter::new();

    filter.filter_and_reflow(&config, &mut notes, "MILK", WIDTH);

    assert!(filter.is_active());
    assert_eq!(
        filter.matches(),
        &[NoteId::from_sequence(3), NoteId::from_sequence(1)]
    );
    assert_eq!(notes[2].position(), Position::new(240.0, 24.0));
    assert_eq!(notes[0].position(), Position::new(440.0, 24.0));
    assert_eq!(notes[1].position(), before[1].1);
    assert_eq!(notes[3].position(), before[3].1);
}

#[test]
fn clearing_restores_exact_pre_filter_positions() {
    let config = LayoutConfig::default();
    let mut notes = board();
    let before = snapshot(&notes);
    let mut filter = SearchFilter::new();

    filter.filter_and_reflow(&config, &mut notes, "milk", WIDTH);
    filter.filter_and_reflow(&config, &mut notes, "milk s", WIDTH);
    filter.filter_and_reflow(&config, &mut notes, "mom", WIDTH);
    assert_ne!(snapshot(&notes), before);

    filter.filter_and_reflow(&config, &mut notes, "", WIDTH);

    assert!(!filter.is_active());
    assert!(filter.matches().is_empty());
    assert_eq!(snapshot(&notes), before);
}

#[test]
fn snapshot_survives_successive_queries() {
    let config = LayoutConfig::default();
    let mut notes = board();
    let mut filter = SearchFilter::new();

    filter.filter_and_reflow(&config, &mut notes, "milk", WIDTH);
    filter.filter_and_reflow(&config, &mut notes, "dentist", WIDTH);

    // The second query must not re-snapshot the already-filtered layout.
    assert_eq!(
        filter.original_position(&NoteId::from_sequence(3)),
        Some(Position::new(640.0, 24.0))
    );
}

#[test]
fn query_without_matches_moves_nothing() {
    let config = LayoutConfig::default();
    let mut notes = board();
    let before = snapshot(&notes);
    let mut filter = SearchFilter::new();

    filter.filter_and_reflow(&config, &mut notes, "zebra", WIDTH);
    assert!(filter.is_active());
    assert!(filter.matches().is_empty());
    assert_eq!(snapshot(&notes), before);
}

#[test]
fn equal_timestamps_keep_insertion_order() {
    let config = LayoutConfig::default();
    let created_at = Utc.with_ymd_and_hms(2026, 4, 2, 10, 0, 0).unwrap();
    let mut notes: Vec<Note> = (1..=3)
        .map(|seq| {
            Note::with_created_at(
                NoteId::from_sequence(seq),
                "same",
                Position::default(),
                created_at,
            )
        })
        .collect();
    let mut filter = SearchFilter::new();

    filter.filter_and_reflow(&config, &mut notes, "same", WIDTH);
    assert_eq!(
        filter.matches(),
        &[
            NoteId::from_sequence(1),
            NoteId::from_sequence(2),
            NoteId::from_sequence(3)
        ]
    );
}

#[test]
fn resize_while_filtering_updates_restore_target() {
    let config = LayoutConfig::default();
    let mut notes = board();
    let mut filter = SearchFilter::new();

    filter.filter_and_reflow(&config, &mut notes, "milk", WIDTH);
    filter.reflow_snapshot(&config, &notes, 800.0);
    filter.filter_and_reflow(&config, &mut notes, "milk", 800.0);
    filter.clear(&mut notes);

    let mut expected = board();
    reflow(&config, &mut expected, 800.0);
    assert_eq!(snapshot(&notes), snapshot(&expected));
}
