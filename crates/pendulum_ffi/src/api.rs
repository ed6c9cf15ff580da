//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose stable, use-case-level functions to Dart via FRB.
//! - Translate core results into flat envelopes with `ok` and `message`.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - Every call opens its own short-lived connection.
//! - Event types cross the boundary as their persisted raw values.

use pendulum_core::db::open_db;
use pendulum_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, ping as ping_inner,
    EventDraft, EventPhoto, EventService, EventType, LetterType, PenPal, PenPalSection,
    PenPalService, SqliteEventRepository, SqlitePenPalRepository, StationeryKind,
};
use log::warn;
use rusqlite::Connection;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::OnceLock;
use uuid::Uuid;

const DB_FILE_NAME: &str = "pendulum.sqlite3";
static DB_PATH: OnceLock<PathBuf> = OnceLock::new();

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir` (idempotent).
/// - Reconfiguration attempts with different level or directory fail.
/// - Never panics.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> ActionResponse {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => ActionResponse::success("Logging ready."),
        Err(err) => ActionResponse::failure(err),
    }
}

/// Generic action response envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionResponse {
    /// Whether operation succeeded.
    pub ok: bool,
    /// Human-readable response message for diagnostics/UI.
    pub message: String,
}

impl ActionResponse {
    fn success(message: impl Into<String>) -> Self {
        Self {
            ok: true,
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            message: message.into(),
        }
    }
}

/// Response envelope for event writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventActionResponse {
    pub ok: bool,
    /// Storage id of the saved event.
    pub event_id: Option<i64>,
    pub message: String,
}

impl EventActionResponse {
    fn success(message: impl Into<String>, event_id: i64) -> Self {
        Self {
            ok: true,
            event_id: Some(event_id),
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            event_id: None,
            message: message.into(),
        }
    }
}

/// Response envelope for counting calls (`events_count`, `stationery_rename`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountResponse {
    pub ok: bool,
    pub count: u64,
    pub message: String,
}

impl CountResponse {
    fn from_result(result: Result<u64, String>, noun: &str) -> Self {
        match result {
            Ok(count) => Self {
                ok: true,
                count,
                message: format!("{count} {noun}."),
            },
            Err(message) => Self {
                ok: false,
                count: 0,
                message,
            },
        }
    }
}

/// User-editable event fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventInput {
    pub date_epoch_ms: i64,
    pub notes: Option<String>,
    /// Semicolon- or newline-delimited stationery text.
    pub pen: Option<String>,
    pub ink: Option<String>,
    pub paper: Option<String>,
    /// Raw letter type value (`0` letter, `1` postcard, `2` package, `3` newsletter).
    pub letter_type: i64,
    pub ignore: bool,
    pub tracking_reference: Option<String>,
}

impl EventInput {
    fn to_draft(&self) -> EventDraft {
        EventDraft {
            date: self.date_epoch_ms,
            notes: self.notes.clone(),
            pen: self.pen.clone(),
            ink: self.ink.clone(),
            paper: self.paper.clone(),
            letter_type: LetterType::from_raw(self.letter_type),
            ignore: self.ignore,
            tracking_reference: self.tracking_reference.clone(),
        }
    }
}

/// Pen-pal projection for list rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PenPalItem {
    pub id: String,
    pub display_name: String,
    pub initials: String,
    /// Raw value of the cached last event type.
    pub last_event_type: i64,
    pub last_event_date: Option<i64>,
    /// Text such as "You received their letter 2 days ago".
    pub status_line: Option<String>,
    /// Raw value of the suggested next event type, if any.
    pub next_event_type: Option<i64>,
    pub next_action_text: String,
}

/// One status section of the pen-pal list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PenPalSectionItem {
    pub event_type: i64,
    pub title: String,
    pub phrase: String,
    pub icon: String,
    pub penpals: Vec<PenPalItem>,
}

/// Response envelope for the grouped pen-pal list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PenPalSectionsResponse {
    pub ok: bool,
    pub sections: Vec<PenPalSectionItem>,
    pub message: String,
}

/// Inserts or updates pen-pal identity fields.
///
/// # FFI contract
/// - Sync call, DB-backed execution.
/// - Never touches the cached status fields.
/// - Never panics.
#[flutter_rust_bridge::frb(sync)]
pub fn penpal_upsert(
    id: String,
    given_name: Option<String>,
    family_name: Option<String>,
    notes: Option<String>,
    image: Option<Vec<u8>>,
) -> ActionResponse {
    let mut penpal = PenPal::new(id.trim(), non_blank(given_name), non_blank(family_name));
    penpal.notes = non_blank(notes);
    penpal.image = image.filter(|bytes| !bytes.is_empty());

    let result = with_penpal_service("penpal_upsert", |service| {
        Ok(service.save_penpal(&penpal))
    });
    match result {
        Ok(true) => ActionResponse::success("Pen-pal saved."),
        Ok(false) => ActionResponse::failure("penpal_upsert failed: pen-pal was not stored"),
        Err(err) => ActionResponse::failure(err),
    }
}

/// Deletes a pen-pal together with its events and photos.
#[flutter_rust_bridge::frb(sync)]
pub fn penpal_delete(id: String) -> ActionResponse {
    let result = with_penpal_service("penpal_delete", |service| {
        Ok(service.delete_penpal(id.trim()))
    });
    match result {
        Ok(true) => ActionResponse::success("Pen-pal deleted."),
        Ok(false) => ActionResponse::failure("penpal_delete failed: pen-pal not found"),
        Err(err) => ActionResponse::failure(err),
    }
}

/// Lists pen-pals grouped into status sections.
///
/// `now_epoch_ms` anchors relative day text; `None` uses the current time.
#[flutter_rust_bridge::frb(sync)]
pub fn penpal_sections(now_epoch_ms: Option<i64>) -> PenPalSectionsResponse {
    let now = now_epoch_ms.unwrap_or_else(pendulum_core::now_epoch_ms);
    match with_penpal_service("penpal_sections", |service| Ok(service.grouped_penpals())) {
        Ok(sections) => {
            let sections = sections
                .into_iter()
                .map(|section| to_section_item(section, now))
                .collect::<Vec<_>>();
            let message = format!("{} section(s).", sections.len());
            PenPalSectionsResponse {
                ok: true,
                sections,
                message,
            }
        }
        Err(message) => PenPalSectionsResponse {
            ok: false,
            sections: Vec::new(),
            message,
        },
    }
}

/// Logs a new event for a pen-pal.
///
/// # FFI contract
/// - `event_type` must be an actionable raw value (`1..=4`).
/// - Refreshes the pen-pal's cached status before returning.
/// - Never panics.
#[flutter_rust_bridge::frb(sync)]
pub fn event_add(penpal_id: String, event_type: i64, input: EventInput) -> EventActionResponse {
    let Some(kind) = actionable_type(event_type) else {
        return EventActionResponse::failure(format!(
            "event_add failed: unsupported event type `{event_type}`"
        ));
    };
    let draft = input.to_draft();
    let result = with_event_service("event_add", |service| {
        service
            .create_event(penpal_id.trim(), kind, &draft, None)
            .and_then(|event| event.id)
            .ok_or_else(|| "event_add failed: event was not stored".to_string())
    });
    match result {
        Ok(event_id) => EventActionResponse::success("Event saved.", event_id),
        Err(err) => EventActionResponse::failure(err),
    }
}

/// Replaces the editable fields and type of an existing event.
#[flutter_rust_bridge::frb(sync)]
pub fn event_update(event_id: i64, event_type: i64, input: EventInput) -> EventActionResponse {
    let Some(kind) = actionable_type(event_type) else {
        return EventActionResponse::failure(format!(
            "event_update failed: unsupported event type `{event_type}`"
        ));
    };
    let draft = input.to_draft();
    let result = with_event_service("event_update", |service| {
        let mut event = service
            .get_event(event_id)
            .ok_or_else(|| format!("event_update failed: event `{event_id}` not found"))?;
        event.kind = kind;
        service
            .update_event(event, &draft, None)
            .and_then(|saved| saved.id)
            .ok_or_else(|| "event_update failed: event was not stored".to_string())
    });
    match result {
        Ok(event_id) => EventActionResponse::success("Event updated.", event_id),
        Err(err) => EventActionResponse::failure(err),
    }
}

/// Reconciles an event's photos: keeps `keep_photo_ids`, attaches
/// `new_photos`, deletes the rest.
#[flutter_rust_bridge::frb(sync)]
pub fn event_set_photos(
    event_id: i64,
    keep_photo_ids: Vec<String>,
    new_photos: Vec<Vec<u8>>,
) -> ActionResponse {
    let keep = match parse_photo_ids(&keep_photo_ids) {
        Ok(keep) => keep,
        Err(err) => return ActionResponse::failure(format!("event_set_photos failed: {err}")),
    };

    let result = with_event_service("event_set_photos", |service| {
        let event = service
            .get_event(event_id)
            .ok_or_else(|| format!("event_set_photos failed: event `{event_id}` not found"))?;
        let mut photos = service
            .photos(event_id)
            .into_iter()
            .filter(|photo| keep.contains(&photo.id))
            .collect::<Vec<_>>();
        photos.extend(new_photos.into_iter().map(EventPhoto::new));

        let draft = EventDraft::from(&event);
        service
            .update_event(event, &draft, Some(&photos))
            .map(|_| photos.len())
            .ok_or_else(|| "event_set_photos failed: photos were not stored".to_string())
    });
    match result {
        Ok(total) => ActionResponse::success(format!("{total} photo(s) attached.")),
        Err(err) => ActionResponse::failure(err),
    }
}

/// Deletes one event and its photos.
#[flutter_rust_bridge::frb(sync)]
pub fn event_delete(event_id: i64) -> ActionResponse {
    match with_event_service("event_delete", |service| Ok(service.delete_event(event_id))) {
        Ok(true) => ActionResponse::success("Event deleted."),
        Ok(false) => ActionResponse::failure("event_delete failed: event not found"),
        Err(err) => ActionResponse::failure(err),
    }
}

/// Counts events whose type is in `event_types`; an empty list counts all.
#[flutter_rust_bridge::frb(sync)]
pub fn events_count(event_types: Vec<i64>) -> CountResponse {
    let kinds = event_types
        .into_iter()
        .map(EventType::from_raw)
        .collect::<Vec<_>>();
    let result = with_event_service("events_count", |service| {
        if kinds.is_empty() {
            return Ok(service.count_events());
        }
        Ok(service.fetch_events(Some(&kinds)).len() as u64)
    });
    CountResponse::from_result(result, "event(s)")
}

/// Renames a stationery token across outbound or inbound events.
///
/// Input semantics:
/// - `kind`: `pen|ink|paper` (case-insensitive).
/// - `outbound`: `true` targets sent/written events, `false` received ones.
#[flutter_rust_bridge::frb(sync)]
pub fn stationery_rename(kind: String, from: String, to: String, outbound: bool) -> CountResponse {
    let Some(kind) = StationeryKind::parse(&kind) else {
        return CountResponse::from_result(
            Err(format!(
                "stationery_rename failed: unsupported stationery kind `{}`",
                kind.trim()
            )),
            "event(s) updated",
        );
    };
    let result = with_event_service("stationery_rename", |service| {
        Ok(service.rename_stationery(kind, &from, &to, outbound) as u64)
    });
    CountResponse::from_result(result, "event(s) updated")
}

fn actionable_type(raw: i64) -> Option<EventType> {
    EventType::ACTIONABLE
        .into_iter()
        .find(|kind| kind.raw_value() == raw)
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}

fn parse_photo_ids(raw_ids: &[String]) -> Result<HashSet<Uuid>, String> {
    raw_ids
        .iter()
        .map(|raw| {
            Uuid::parse_str(raw.trim()).map_err(|_| format!("invalid photo id `{}`", raw.trim()))
        })
        .collect()
}

fn resolve_db_path() -> PathBuf {
    DB_PATH
        .get_or_init(|| {
            if let Ok(raw) = std::env::var("PENDULUM_DB_PATH") {
                let trimmed = raw.trim();
                if !trimmed.is_empty() {
                    return PathBuf::from(trimmed);
                }
            }
            std::env::temp_dir().join(DB_FILE_NAME)
        })
        .clone()
}

fn with_connection<T>(
    operation: &'static str,
    f: impl FnOnce(&mut Connection) -> Result<T, String>,
) -> Result<T, String> {
    let db_path = resolve_db_path();
    let mut conn = open_db(&db_path).map_err(|err| {
        warn!("event=ffi_db_open module=ffi status=error operation={operation}");
        format!("{operation} failed: DB open failed: {err}")
    })?;
    f(&mut conn)
}

fn with_event_service<T>(
    operation: &'static str,
    f: impl FnOnce(&mut EventService<SqliteEventRepository<'_>>) -> Result<T, String>,
) -> Result<T, String> {
    with_connection(operation, |conn| {
        let repo = SqliteEventRepository::try_new(conn)
            .map_err(|err| format!("{operation} failed: repo init failed: {err}"))?;
        let mut service = EventService::new(repo);
        f(&mut service)
    })
}

fn with_penpal_service<T>(
    operation: &'static str,
    f: impl FnOnce(&mut PenPalService<SqlitePenPalRepository<'_>>) -> Result<T, String>,
) -> Result<T, String> {
    with_connection(operation, |conn| {
        let repo = SqlitePenPalRepository::try_new(conn)
            .map_err(|err| format!("{operation} failed: repo init failed: {err}"))?;
        let mut service = PenPalService::new(repo);
        f(&mut service)
    })
}

fn to_section_item(section: PenPalSection, now: i64) -> PenPalSectionItem {
    let kind = section.event_type;
    PenPalSectionItem {
        event_type: kind.raw_value(),
        title: kind.label().to_string(),
        phrase: kind.phrase().to_string(),
        icon: kind.icon().to_string(),
        penpals: section
            .penpals
            .iter()
            .map(|penpal| to_penpal_item(penpal, now))
            .collect(),
    }
}

fn to_penpal_item(penpal: &PenPal, now: i64) -> PenPalItem {
    let kind = penpal.last_event_type;
    PenPalItem {
        id: penpal.id.clone(),
        display_name: penpal.full_name(),
        initials: penpal.initials(),
        last_event_type: kind.raw_value(),
        last_event_date: penpal.last_event_date,
        status_line: penpal.status_line(now),
        next_event_type: kind.next_type().map(EventType::raw_value),
        next_action_text: kind.next_type_button_text().to_string(),
    }
}
