//! Pen-pal aggregate root.
//!
//! # Responsibility
//! - Hold contact identity, display names and the cached last-event status.
//! - Group pen-pals into list sections by cached status.
//! - Render relative "days since" text for the cached date.
//!
//! # Invariants
//! - A `None` cached date means the pen-pal has no counted event.
//! - The cache is refreshed eagerly by event writes, never lazily on read.

use crate::model::event_type::EventType;
use crate::model::validation::ModelValidationError;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Stable pen-pal id, typically a contact identifier from the host.
pub type PenPalId = String;

const MILLIS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// Correspondence contact with a denormalized status cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PenPal {
    pub id: PenPalId,
    pub given_name: Option<String>,
    pub family_name: Option<String>,
    /// Avatar image bytes.
    pub image: Option<Vec<u8>>,
    pub notes: Option<String>,
    pub last_event_type: EventType,
    /// Unix epoch milliseconds of the latest counted event.
    pub last_event_date: Option<i64>,
}

impl PenPal {
    /// Creates a pen-pal with an empty status cache.
    pub fn new(
        id: impl Into<PenPalId>,
        given_name: Option<String>,
        family_name: Option<String>,
    ) -> Self {
        Self {
            id: id.into(),
            given_name,
            family_name,
            image: None,
            notes: None,
            last_event_type: EventType::NoEvent,
            last_event_date: None,
        }
    }

    /// Given and family names joined by a space. Falls back to `id`.
    pub fn full_name(&self) -> String {
        let parts = [self.given_name.as_deref(), self.family_name.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>();
        if parts.is_empty() {
            self.id.clone()
        } else {
            parts.join(" ")
        }
    }

    /// Uppercase initials of up to two name parts.
    pub fn initials(&self) -> String {
        let initials = [self.given_name.as_deref(), self.family_name.as_deref()]
            .into_iter()
            .flatten()
            .filter_map(|part| part.trim().chars().next())
            .flat_map(char::to_uppercase)
            .collect::<String>();
        if initials.is_empty() {
            "?".to_string()
        } else {
            initials
        }
    }

    /// Whole days between the cached date and `now_ms`.
    pub fn days_since_last_event(&self, now_ms: i64) -> Option<i64> {
        self.last_event_date
            .map(|date| days_between(date, now_ms))
    }

    /// Status text such as "You wrote to them 3 days ago".
    ///
    /// Returns `None` when no event is cached.
    pub fn status_line(&self, now_ms: i64) -> Option<String> {
        self.days_since_last_event(now_ms).map(|days| {
            format!(
                "{} {}",
                self.last_event_type.date_prefix(),
                verbose_days(days)
            )
        })
    }

    pub fn validate(&self) -> Result<(), ModelValidationError> {
        if self.id.trim().is_empty() {
            return Err(ModelValidationError::BlankPenPalId);
        }
        Ok(())
    }
}

/// One list section: pen-pals sharing the same cached status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PenPalSection {
    pub event_type: EventType,
    pub penpals: Vec<PenPal>,
}

/// Groups pen-pals by cached status.
///
/// Sections follow `EventType::ALL` order and empty sections are omitted.
/// Inside a section the longest-waiting pen-pal comes first; pen-pals
/// without a date come last, ties break on full name.
pub fn group_by_status(penpals: impl IntoIterator<Item = PenPal>) -> Vec<PenPalSection> {
    let mut sections = EventType::ALL
        .into_iter()
        .map(|event_type| PenPalSection {
            event_type,
            penpals: Vec::new(),
        })
        .collect::<Vec<_>>();

    for penpal in penpals {
        if let Some(section) = sections
            .iter_mut()
            .find(|section| section.event_type == penpal.last_event_type)
        {
            section.penpals.push(penpal);
        }
    }

    sections.retain(|section| !section.penpals.is_empty());
    for section in &mut sections {
        section.penpals.sort_by(compare_for_section);
    }
    sections
}

fn compare_for_section(a: &PenPal, b: &PenPal) -> Ordering {
    let by_date = match (a.last_event_date, b.last_event_date) {
        (Some(left), Some(right)) => left.cmp(&right),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    };
    by_date.then_with(|| a.full_name().cmp(&b.full_name()))
}

/// Calendar-day difference between two instants, using UTC day boundaries.
///
/// Negative when `to_ms` is on an earlier day than `from_ms`.
pub fn days_between(from_ms: i64, to_ms: i64) -> i64 {
    to_ms.div_euclid(MILLIS_PER_DAY) - from_ms.div_euclid(MILLIS_PER_DAY)
}

/// Human-readable form of a day difference.
pub fn verbose_days(days: i64) -> String {
    match days {
        0 => "today".to_string(),
        1 => "yesterday".to_string(),
        -1 => "tomorrow".to_string(),
        n if n < 0 => format!("in {} days", -n),
        n => format!("{n} days ago"),
    }
}
