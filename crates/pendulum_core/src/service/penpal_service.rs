//! Pen-pal use-case service.
//!
//! # Responsibility
//! - Manage pen-pal identity records.
//! - Expose the aggregate entry points used by the UI: cache refresh,
//!   add-event and cascading delete.
//! - Produce status-grouped sections for the list screen.

use crate::model::event::Event;
use crate::model::event_type::EventType;
use crate::model::now_epoch_ms;
use crate::model::penpal::{group_by_status, PenPal, PenPalSection};
use crate::repo::penpal_repo::PenPalRepository;
use crate::service::logged;

/// Pen-pal service facade over repository implementations.
pub struct PenPalService<R: PenPalRepository> {
    repo: R,
}

impl<R: PenPalRepository> PenPalService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Inserts or updates identity fields. Returns whether it was stored.
    pub fn save_penpal(&self, penpal: &PenPal) -> bool {
        logged("penpal_save", self.repo.upsert_penpal(penpal)).is_some()
    }

    pub fn get_penpal(&self, id: &str) -> Option<PenPal> {
        logged("penpal_get", self.repo.get_penpal(id)).flatten()
    }

    pub fn list_penpals(&self) -> Vec<PenPal> {
        logged("penpal_list", self.repo.list_penpals()).unwrap_or_default()
    }

    /// Pen-pals grouped by cached status in display order.
    pub fn grouped_penpals(&self) -> Vec<PenPalSection> {
        group_by_status(self.list_penpals())
    }

    /// Recomputes the cached last-event fields from stored events.
    pub fn update_last_event_type(&mut self, id: &str) -> Option<PenPal> {
        logged("penpal_refresh", self.repo.update_last_event_type(id))
    }

    /// Logs a new event of `kind` dated now.
    pub fn add_event(&mut self, id: &str, kind: EventType) -> Option<Event> {
        self.add_event_at(id, kind, now_epoch_ms())
    }

    /// Logs a new event of `kind` at an explicit date.
    pub fn add_event_at(&mut self, id: &str, kind: EventType, date: i64) -> Option<Event> {
        logged("penpal_add_event", self.repo.add_event(id, kind, date))
    }

    /// Deletes the pen-pal with its events and photos.
    pub fn delete_penpal(&mut self, id: &str) -> bool {
        logged("penpal_delete", self.repo.delete_penpal(id)).is_some()
    }
}
