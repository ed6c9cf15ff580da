//! Core domain logic for Pendulum, a pen-pal correspondence tracker.
//! This crate is the single source of truth for event, stationery and
//! pen-pal status invariants.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use logging::{default_log_level, init_default_logging, init_logging, logging_status};
pub use model::event::{sort_photos, Event, EventDraft, EventId, EventPhoto, PhotoId};
pub use model::event_type::{Direction, EventType};
pub use model::letter_type::LetterType;
pub use model::now_epoch_ms;
pub use model::penpal::{
    days_between, group_by_status, verbose_days, PenPal, PenPalId, PenPalSection,
};
pub use model::stationery::{parse_tokens, rename_token, StationeryKind, StationeryList};
pub use model::validation::ModelValidationError;
pub use repo::event_repo::{
    EventListQuery, EventRepository, SqliteEventRepository, StationeryRename,
};
pub use repo::penpal_repo::{PenPalRepository, SqlitePenPalRepository};
pub use repo::{RepoError, RepoResult};
pub use service::event_service::{EventService, EventTarget};
pub use service::penpal_service::PenPalService;

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
