//! Event use-case service.
//!
//! # Responsibility
//! - Build or mutate events from user drafts and persist them synchronously.
//! - Expose fetch/count/delete and bulk stationery rename for UI callers.
//!
//! # Invariants
//! - Every mutating call refreshes the owning pen-pal's cached status before
//!   it returns.
//! - Failures are logged and mapped to `None`/`false`/empty/zero.

use crate::model::event::{Event, EventDraft, EventId, EventPhoto};
use crate::model::event_type::{Direction, EventType};
use crate::model::penpal::PenPalId;
use crate::model::stationery::StationeryKind;
use crate::repo::event_repo::{EventListQuery, EventRepository, StationeryRename};
use crate::service::logged;
use log::debug;

/// Which record an event save applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventTarget {
    /// Construct a new event for the pen-pal.
    New { penpal_id: PenPalId, kind: EventType },
    /// Mutate an already persisted event.
    Existing(Event),
}

/// Event service facade over repository implementations.
pub struct EventService<R: EventRepository> {
    repo: R,
}

impl<R: EventRepository> EventService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Creates or updates an event from a draft.
    ///
    /// `photos = Some(set)` attaches new photos and deletes stored ones
    /// missing from `set`; `None` leaves photos untouched.
    pub fn save_event(
        &mut self,
        target: EventTarget,
        draft: &EventDraft,
        photos: Option<&[EventPhoto]>,
    ) -> Option<Event> {
        let mut event = match target {
            EventTarget::New { penpal_id, kind } => Event::new(penpal_id, kind, draft.date),
            EventTarget::Existing(event) => event,
        };
        event.apply_draft(draft);
        if let Some(photos) = photos {
            debug!(
                "event=event_photos module=service status=start supplied={}",
                photos.len()
            );
        }
        logged("event_save", self.repo.save_event(&event, photos))
    }

    /// Creates a new event of `kind` for the pen-pal.
    pub fn create_event(
        &mut self,
        penpal_id: impl Into<PenPalId>,
        kind: EventType,
        draft: &EventDraft,
        photos: Option<&[EventPhoto]>,
    ) -> Option<Event> {
        let target = EventTarget::New {
            penpal_id: penpal_id.into(),
            kind,
        };
        self.save_event(target, draft, photos)
    }

    /// Applies a draft to an existing event.
    pub fn update_event(
        &mut self,
        event: Event,
        draft: &EventDraft,
        photos: Option<&[EventPhoto]>,
    ) -> Option<Event> {
        self.save_event(EventTarget::Existing(event), draft, photos)
    }

    /// Deletes one event. Returns whether the delete was committed.
    pub fn delete_event(&mut self, id: EventId) -> bool {
        logged("event_delete", self.repo.delete_event(id)).is_some()
    }

    pub fn get_event(&self, id: EventId) -> Option<Event> {
        logged("event_get", self.repo.get_event(id)).flatten()
    }

    /// Fetches events whose type is in `kinds`; `None` or empty means all.
    pub fn fetch_events(&self, kinds: Option<&[EventType]>) -> Vec<Event> {
        let query = EventListQuery {
            kinds: kinds.map(<[EventType]>::to_vec).unwrap_or_default(),
            ..EventListQuery::default()
        };
        logged("event_fetch", self.repo.list_events(&query)).unwrap_or_default()
    }

    /// Timeline of one pen-pal, newest first.
    pub fn events_for_penpal(&self, penpal_id: &str) -> Vec<Event> {
        let query = EventListQuery {
            penpal_id: Some(penpal_id.to_string()),
            newest_first: true,
            ..EventListQuery::default()
        };
        logged("event_timeline", self.repo.list_events(&query)).unwrap_or_default()
    }

    pub fn count_events(&self) -> u64 {
        logged("event_count", self.repo.count_events()).unwrap_or(0)
    }

    /// Renames a stationery token on outbound (`sent`/`written`) or inbound
    /// (`received`) events. Returns the number of rewritten events.
    pub fn rename_stationery(
        &mut self,
        kind: StationeryKind,
        from: &str,
        to: &str,
        outbound: bool,
    ) -> usize {
        let rename = StationeryRename {
            kind,
            from: from.to_string(),
            to: to.to_string(),
            direction: Direction::from_outbound(outbound),
        };
        logged("stationery_rename", self.repo.rename_stationery(&rename)).unwrap_or(0)
    }

    /// Photos of one event ordered by `date_added`.
    pub fn photos(&self, event_id: EventId) -> Vec<EventPhoto> {
        logged("photo_list", self.repo.list_photos(event_id)).unwrap_or_default()
    }

    /// Stores raw image bytes as a new photo on the event.
    pub fn add_photo(&mut self, event_id: EventId, data: Vec<u8>) -> Option<EventPhoto> {
        let photo = EventPhoto::new(data);
        logged("photo_add", self.repo.add_photo(event_id, &photo))
    }
}
