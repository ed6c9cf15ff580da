//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `pendulum_core` linkage.
//! - Print a deterministic store summary when given a database path.

use pendulum_core::db::open_db;
use pendulum_core::{
    EventService, PenPalService, SqliteEventRepository, SqlitePenPalRepository,
};
use std::process::ExitCode;

fn main() -> ExitCode {
    println!("pendulum_core ping={}", pendulum_core::ping());
    println!("pendulum_core version={}", pendulum_core::core_version());

    let Some(db_path) = std::env::args().nth(1) else {
        return ExitCode::SUCCESS;
    };
    match print_summary(&db_path) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("pendulum_cli error={err}");
            ExitCode::FAILURE
        }
    }
}

fn print_summary(db_path: &str) -> Result<(), String> {
    let mut conn = open_db(db_path).map_err(|err| err.to_string())?;

    let events = EventService::new(
        SqliteEventRepository::try_new(&mut conn).map_err(|err| err.to_string())?,
    );
    println!("events total={}", events.count_events());
    drop(events);

    let penpals = PenPalService::new(
        SqlitePenPalRepository::try_new(&mut conn).map_err(|err| err.to_string())?,
    );
    for section in penpals.grouped_penpals() {
        println!(
            "section type={} label=\"{}\" penpals={}",
            section.event_type.raw_value(),
            section.event_type.label(),
            section.penpals.len()
        );
    }
    Ok(())
}
