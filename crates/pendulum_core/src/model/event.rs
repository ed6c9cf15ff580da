//! Event and photo domain models.
//!
//! # Responsibility
//! - Define one timeline entry recorded for a pen-pal.
//! - Define photo attachments exclusively owned by an event.
//! - Apply user-edited drafts with edge-only text normalization.
//!
//! # Invariants
//! - `id` is `None` until storage assigns a row id.
//! - `penpal_id` always references an existing pen-pal once persisted.
//! - Stationery fields are token lists; delimited text exists only at the
//!   storage edge.
//! - Photos are ordered by `date_added`, then `id`.

use crate::model::event_type::EventType;
use crate::model::letter_type::LetterType;
use crate::model::now_epoch_ms;
use crate::model::penpal::PenPalId;
use crate::model::stationery::{StationeryKind, StationeryList};
use crate::model::validation::ModelValidationError;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Storage-assigned event row id.
pub type EventId = i64;

/// Stable photo identity.
pub type PhotoId = Uuid;

/// One postal occurrence on a pen-pal timeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: Option<EventId>,
    pub penpal_id: PenPalId,
    /// Serialized as `type` to match the persisted record naming.
    #[serde(rename = "type")]
    pub kind: EventType,
    /// Unix epoch milliseconds.
    pub date: i64,
    pub notes: Option<String>,
    pub pen: StationeryList,
    pub ink: StationeryList,
    pub paper: StationeryList,
    pub tracking_reference: Option<String>,
    pub letter_type: LetterType,
    /// Excluded from the pen-pal's cached status when set.
    pub ignore: bool,
}

/// User-edited fields applied by an event create/update.
///
/// Stationery fields carry raw delimited text as typed by the user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventDraft {
    pub date: i64,
    pub notes: Option<String>,
    pub pen: Option<String>,
    pub ink: Option<String>,
    pub paper: Option<String>,
    pub letter_type: LetterType,
    pub ignore: bool,
    pub tracking_reference: Option<String>,
}

impl EventDraft {
    /// Draft with only a date set; every other field empty.
    pub fn dated(date: i64) -> Self {
        Self {
            date,
            ..Self::default()
        }
    }
}

impl From<&Event> for EventDraft {
    /// Draft that reproduces the event's current field values.
    fn from(event: &Event) -> Self {
        Self {
            date: event.date,
            notes: event.notes.clone(),
            pen: event.pen.to_storage(),
            ink: event.ink.to_storage(),
            paper: event.paper.to_storage(),
            letter_type: event.letter_type,
            ignore: event.ignore,
            tracking_reference: event.tracking_reference.clone(),
        }
    }
}

impl Event {
    /// Creates an unsaved event with empty optional fields.
    pub fn new(penpal_id: impl Into<PenPalId>, kind: EventType, date: i64) -> Self {
        Self {
            id: None,
            penpal_id: penpal_id.into(),
            kind,
            date,
            notes: None,
            pen: StationeryList::new(),
            ink: StationeryList::new(),
            paper: StationeryList::new(),
            tracking_reference: None,
            letter_type: LetterType::default(),
            ignore: false,
        }
    }

    /// Copies a draft into this event.
    ///
    /// Free text is trimmed at the edges only. Blank values become `None`.
    pub fn apply_draft(&mut self, draft: &EventDraft) {
        self.date = draft.date;
        self.notes = normalize_text(draft.notes.as_deref());
        self.pen = StationeryList::parse(draft.pen.as_deref());
        self.ink = StationeryList::parse(draft.ink.as_deref());
        self.paper = StationeryList::parse(draft.paper.as_deref());
        self.tracking_reference = normalize_text(draft.tracking_reference.as_deref());
        self.letter_type = draft.letter_type;
        self.ignore = draft.ignore;
    }

    pub fn stationery(&self, kind: StationeryKind) -> &StationeryList {
        match kind {
            StationeryKind::Pen => &self.pen,
            StationeryKind::Ink => &self.ink,
            StationeryKind::Paper => &self.paper,
        }
    }

    pub fn stationery_mut(&mut self, kind: StationeryKind) -> &mut StationeryList {
        match kind {
            StationeryKind::Pen => &mut self.pen,
            StationeryKind::Ink => &mut self.ink,
            StationeryKind::Paper => &mut self.paper,
        }
    }

    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }

    pub fn has_stationery(&self) -> bool {
        !self.pen.is_empty() || !self.ink.is_empty() || !self.paper.is_empty()
    }

    pub fn has_attributes(&self) -> bool {
        self.has_stationery() || is_present(self.tracking_reference.as_deref())
    }

    pub fn has_notes(&self) -> bool {
        is_present(self.notes.as_deref()) || self.has_attributes()
    }

    /// Validates write-path invariants.
    pub fn validate(&self) -> Result<(), ModelValidationError> {
        if self.penpal_id.trim().is_empty() {
            return Err(ModelValidationError::BlankPenPalId);
        }
        Ok(())
    }
}

/// Image attachment owned by one event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventPhoto {
    pub id: PhotoId,
    /// `None` for photos not yet attached to a saved event.
    pub event_id: Option<EventId>,
    pub data: Vec<u8>,
    /// Unix epoch milliseconds; defines display order.
    pub date_added: i64,
}

impl EventPhoto {
    /// Creates an unattached photo with a fresh id and the current time.
    pub fn new(data: Vec<u8>) -> Self {
        Self {
            id: Uuid::new_v4(),
            event_id: None,
            data,
            date_added: now_epoch_ms(),
        }
    }

    /// Returns whether this photo still needs attaching to an event.
    pub fn is_new(&self) -> bool {
        self.event_id.is_none()
    }

    pub fn validate(&self) -> Result<(), ModelValidationError> {
        if self.data.is_empty() {
            return Err(ModelValidationError::EmptyPhoto);
        }
        Ok(())
    }
}

/// Sorts photos into stable display order.
pub fn sort_photos(photos: &mut [EventPhoto]) {
    photos.sort_by(|a, b| a.date_added.cmp(&b.date_added).then(a.id.cmp(&b.id)));
}

fn normalize_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|trimmed| !trimmed.is_empty())
        .map(str::to_string)
}

fn is_present(value: Option<&str>) -> bool {
    value.is_some_and(|text| !text.is_empty())
}
