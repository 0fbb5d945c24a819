//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `kulli_core` linkage and print its version.
//! - Preview packed note cells for a viewport width.
//! - List or add notes in a board database.
//! - Run one install pass of the offline cache against a live origin.
//!
//! Logs go to `$KULLI_LOG_DIR` (default: `<tmp>/kulli/logs`) at
//! `$KULLI_LOG_LEVEL` (default: build-dependent).

use kulli_core::db::open_db;
use kulli_core::{
    core_version, default_log_level, init_logging, pack_positions, Board, CacheConfig,
    CacheStorage, CacheWorker, HeadlessEnvironment, HttpNetwork, LayoutConfig, NoteStore,
    SqliteNoteStore, Viewport,
};
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

const LOG_DIR_ENV: &str = "KULLI_LOG_DIR";
const LOG_LEVEL_ENV: &str = "KULLI_LOG_LEVEL";
const USAGE: &str = "usage: kulli_cli [layout <viewport_width> <count> | notes <db_path> | add <db_path> <viewport_width> <text> | prefetch <origin>]";

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();
    if let Err(err) = start_logging() {
        eprintln!("error: {err}");
        return ExitCode::FAILURE;
    }
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            eprintln!("{USAGE}");
            ExitCode::FAILURE
        }
    }
}

fn start_logging() -> Result<(), Box<dyn Error>> {
    let log_dir = match std::env::var_os(LOG_DIR_ENV) {
        Some(dir) => PathBuf::from(dir),
        None => std::env::temp_dir().join("kulli").join("logs"),
    };
    let level =
        std::env::var(LOG_LEVEL_ENV).unwrap_or_else(|_| default_log_level().to_string());
    let log_dir = log_dir
        .to_str()
        .ok_or("log directory is not valid UTF-8")?;
    init_logging(&level, log_dir)?;
    Ok(())
}

fn run(args: &[String]) -> Result<(), Box<dyn Error>> {
    match args {
        [] => {
            println!("kulli_core version={}", core_version());
            Ok(())
        }
        [command, width, count] if command == "layout" => {
            let width: f64 = width.parse()?;
            let count: usize = count.parse()?;
            let config = LayoutConfig::default();
            for (index, cell) in pack_positions(&config, count, width).iter().enumerate() {
                println!("{:>3} x={} y={}", index + 1, cell.x, cell.y);
            }
            Ok(())
        }
        [command, path] if command == "notes" => {
            let conn = open_db(path)?;
            let store = SqliteNoteStore::try_new(&conn)?;
            for note in store.load_notes()? {
                println!(
                    "{} x={} y={} created_at={} text={:?}",
                    note.id,
                    note.x,
                    note.y,
                    note.created_at.to_rfc3339(),
                    note.text
                );
            }
            Ok(())
        }
        [command, path, width, text] if command == "add" => {
            let width: f64 = width.parse()?;
            let conn = open_db(path)?;
            let store = SqliteNoteStore::try_new(&conn)?;
            let env = HeadlessEnvironment::new(Viewport::new(width, width));
            let mut board = Board::open(LayoutConfig::default(), store, env)?;
            match board.create_note(text)? {
                Some(id) => {
                    let note = board.note(&id).ok_or("created note vanished")?;
                    println!("{} x={} y={}", note.id, note.x, note.y);
                }
                None => println!("skipped: empty text"),
            }
            Ok(())
        }
        [command, origin] if command == "prefetch" => {
            let config = CacheConfig {
                origin: origin.clone(),
                ..CacheConfig::default()
            };
            let runtime = tokio::runtime::Runtime::new()?;
            let report = runtime.block_on(async {
                let network = Arc::new(HttpNetwork::new()?);
                let worker = CacheWorker::new(config, Arc::new(CacheStorage::new()), network)?;
                Ok::<_, Box<dyn Error>>(worker.install().await)
            })?;
            println!(
                "cached_static={} cached_external={}",
                report.cached_static, report.cached_external
            );
            for failed in report.failed_static.iter().chain(&report.failed_external) {
                println!("failed {failed}");
            }
            Ok(())
        }
        _ => Err("unrecognized arguments".into()),
    }
}
