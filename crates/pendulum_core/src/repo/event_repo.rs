//! Event repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist timeline events and their owned photos.
//! - Reconcile photo sets by id on save.
//! - Run the two-stage stationery rename (substring pre-filter, token-exact
//!   rewrite).
//!
//! # Invariants
//! - Every write refreshes the owning pen-pal's cached status before commit.
//! - Deleting an event deletes its photos (`ON DELETE CASCADE`).
//! - Stationery columns hold newline-joined tokens or `NULL`.
//! - Any `EventType` may be written for any pen-pal; transitions are not
//!   enforced here.

use crate::model::event::{sort_photos, Event, EventId, EventPhoto};
use crate::model::event_type::{Direction, EventType};
use crate::model::letter_type::LetterType;
use crate::model::penpal::PenPalId;
use crate::model::stationery::{StationeryKind, StationeryList};
use crate::repo::penpal_repo::refresh_last_event;
use crate::repo::{bool_to_int, ensure_connection_ready, int_to_bool, RepoError, RepoResult};
use log::{debug, info};
use rusqlite::types::Value;
use rusqlite::{
    params, params_from_iter, Connection, OptionalExtension, Row, Transaction,
    TransactionBehavior,
};
use uuid::Uuid;

const EVENT_SELECT_SQL: &str = "SELECT
    id,
    penpal_id,
    type_value,
    date,
    notes,
    pen,
    ink,
    paper,
    letter_type_value,
    is_ignored,
    tracking_reference
FROM events";

/// Query options for listing events.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventListQuery {
    /// Type filter. Empty means every type.
    pub kinds: Vec<EventType>,
    /// Restrict to one pen-pal's timeline.
    pub penpal_id: Option<PenPalId>,
    /// `true` sorts by `date DESC`; `false` keeps storage (insertion) order.
    pub newest_first: bool,
}

/// Bulk stationery rename request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StationeryRename {
    pub kind: StationeryKind,
    pub from: String,
    pub to: String,
    pub direction: Direction,
}

/// Repository interface for event and photo operations.
pub trait EventRepository {
    /// Inserts (`id == None`) or updates an event, optionally reconciling its
    /// photo set, and refreshes the owning pen-pal. Returns the saved event.
    fn save_event(&mut self, event: &Event, photos: Option<&[EventPhoto]>) -> RepoResult<Event>;
    /// Gets one event by id.
    fn get_event(&self, id: EventId) -> RepoResult<Option<Event>>;
    /// Lists events using type/pen-pal filters.
    fn list_events(&self, query: &EventListQuery) -> RepoResult<Vec<Event>>;
    /// Counts all events.
    fn count_events(&self) -> RepoResult<u64>;
    /// Deletes an event and its photos, then refreshes the owning pen-pal.
    fn delete_event(&mut self, id: EventId) -> RepoResult<()>;
    /// Renames one stationery token across matching events in one
    /// transaction. Returns the number of rewritten events.
    fn rename_stationery(&mut self, rename: &StationeryRename) -> RepoResult<usize>;
    /// Lists photos of one event in display order.
    fn list_photos(&self, event_id: EventId) -> RepoResult<Vec<EventPhoto>>;
    /// Attaches one photo to an existing event.
    fn add_photo(&mut self, event_id: EventId, photo: &EventPhoto) -> RepoResult<EventPhoto>;
}

/// SQLite-backed event repository.
pub struct SqliteEventRepository<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> SqliteEventRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn mut Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl EventRepository for SqliteEventRepository<'_> {
    fn save_event(&mut self, event: &Event, photos: Option<&[EventPhoto]>) -> RepoResult<Event> {
        event.validate()?;
        if let Some(photos) = photos {
            for photo in photos {
                photo.validate()?;
            }
        }

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        if !penpal_exists(&tx, &event.penpal_id)? {
            return Err(RepoError::PenPalNotFound(event.penpal_id.clone()));
        }

        let (event_id, previous_penpal) = match event.id {
            None => (insert_event_row(&tx, event)?, None),
            Some(id) => {
                let previous = owning_penpal(&tx, id)?.ok_or(RepoError::EventNotFound(id))?;
                update_event_row(&tx, id, event)?;
                (id, Some(previous))
            }
        };

        let mut attached = 0;
        let mut removed = 0;
        if let Some(photos) = photos {
            (attached, removed) = reconcile_photos(&tx, event_id, photos)?;
        }

        refresh_last_event(&tx, &event.penpal_id)?;
        if let Some(previous) = previous_penpal.filter(|prev| prev != &event.penpal_id) {
            refresh_last_event(&tx, &previous)?;
        }
        tx.commit()?;

        info!(
            "event=event_save module=repo status=ok event_id={} type={} photos_attached={} photos_removed={}",
            event_id,
            event.kind.raw_value(),
            attached,
            removed
        );

        let mut saved = event.clone();
        saved.id = Some(event_id);
        Ok(saved)
    }

    fn get_event(&self, id: EventId) -> RepoResult<Option<Event>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{EVENT_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_event_row(row)?));
        }
        Ok(None)
    }

    fn list_events(&self, query: &EventListQuery) -> RepoResult<Vec<Event>> {
        let mut sql = format!("{EVENT_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if !query.kinds.is_empty() {
            sql.push_str(&format!(
                " AND type_value IN ({})",
                placeholders(query.kinds.len())
            ));
            bind_values.extend(
                query
                    .kinds
                    .iter()
                    .map(|kind| Value::Integer(kind.raw_value())),
            );
        }

        if let Some(penpal_id) = query.penpal_id.as_ref() {
            sql.push_str(" AND penpal_id = ?");
            bind_values.push(Value::Text(penpal_id.clone()));
        }

        if query.newest_first {
            sql.push_str(" ORDER BY date DESC, id DESC");
        } else {
            sql.push_str(" ORDER BY id ASC");
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut events = Vec::new();
        while let Some(row) = rows.next()? {
            events.push(parse_event_row(row)?);
        }
        Ok(events)
    }

    fn count_events(&self) -> RepoResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM events;", [], |row| row.get(0))?;
        u64::try_from(count)
            .map_err(|_| RepoError::InvalidData(format!("negative event count `{count}`")))
    }

    fn delete_event(&mut self, id: EventId) -> RepoResult<()> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let penpal_id = owning_penpal(&tx, id)?.ok_or(RepoError::EventNotFound(id))?;
        tx.execute("DELETE FROM events WHERE id = ?1;", [id])?;
        refresh_last_event(&tx, &penpal_id)?;
        tx.commit()?;

        info!("event=event_delete module=repo status=ok event_id={id}");
        Ok(())
    }

    fn rename_stationery(&mut self, rename: &StationeryRename) -> RepoResult<usize> {
        let from = rename.from.trim();
        if from.is_empty() {
            return Ok(0);
        }

        let column = rename.kind.column();
        let kinds = rename.direction.event_types();
        let tx = self.conn.transaction()?;

        // Substring pre-filter; the token-exact match happens below.
        let candidates = {
            let mut stmt = tx.prepare(&format!(
                "SELECT id, {column}
                 FROM events
                 WHERE instr({column}, ?) > 0
                   AND type_value IN ({});",
                placeholders(kinds.len())
            ))?;
            let bind_values = std::iter::once(Value::Text(from.to_string()))
                .chain(kinds.iter().map(|kind| Value::Integer(kind.raw_value())))
                .collect::<Vec<_>>();
            let mut rows = stmt.query(params_from_iter(bind_values))?;
            let mut candidates = Vec::new();
            while let Some(row) = rows.next()? {
                candidates.push((row.get::<_, EventId>(0)?, row.get::<_, Option<String>>(1)?));
            }
            candidates
        };

        let mut rewritten = 0;
        for (id, current) in &candidates {
            let mut tokens = StationeryList::parse(current.as_deref());
            if !tokens.rename(from, &rename.to) {
                continue;
            }
            let renamed = tokens.to_storage();
            tx.execute(
                &format!("UPDATE events SET {column} = ?1 WHERE id = ?2;"),
                params![renamed, *id],
            )?;
            rewritten += 1;
        }
        tx.commit()?;

        info!(
            "event=stationery_rename module=repo status=ok kind={} candidates={} rewritten={}",
            column,
            candidates.len(),
            rewritten
        );
        Ok(rewritten)
    }

    fn list_photos(&self, event_id: EventId) -> RepoResult<Vec<EventPhoto>> {
        load_photos(self.conn, event_id)
    }

    fn add_photo(&mut self, event_id: EventId, photo: &EventPhoto) -> RepoResult<EventPhoto> {
        photo.validate()?;
        if owning_penpal(self.conn, event_id)?.is_none() {
            return Err(RepoError::EventNotFound(event_id));
        }
        insert_photo_row(self.conn, event_id, photo)?;

        let mut attached = photo.clone();
        attached.event_id = Some(event_id);
        Ok(attached)
    }
}

fn insert_event_row(tx: &Transaction<'_>, event: &Event) -> RepoResult<EventId> {
    tx.execute(
        "INSERT INTO events (
            penpal_id,
            type_value,
            date,
            notes,
            pen,
            ink,
            paper,
            letter_type_value,
            is_ignored,
            tracking_reference
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10);",
        params![
            event.penpal_id.as_str(),
            event.kind.raw_value(),
            event.date,
            event.notes.as_deref(),
            event.pen.to_storage(),
            event.ink.to_storage(),
            event.paper.to_storage(),
            event.letter_type.raw_value(),
            bool_to_int(event.ignore),
            event.tracking_reference.as_deref(),
        ],
    )?;
    Ok(tx.last_insert_rowid())
}

fn update_event_row(tx: &Transaction<'_>, id: EventId, event: &Event) -> RepoResult<()> {
    let changed = tx.execute(
        "UPDATE events
         SET
            penpal_id = ?1,
            type_value = ?2,
            date = ?3,
            notes = ?4,
            pen = ?5,
            ink = ?6,
            paper = ?7,
            letter_type_value = ?8,
            is_ignored = ?9,
            tracking_reference = ?10
         WHERE id = ?11;",
        params![
            event.penpal_id.as_str(),
            event.kind.raw_value(),
            event.date,
            event.notes.as_deref(),
            event.pen.to_storage(),
            event.ink.to_storage(),
            event.paper.to_storage(),
            event.letter_type.raw_value(),
            bool_to_int(event.ignore),
            event.tracking_reference.as_deref(),
            id,
        ],
    )?;
    if changed == 0 {
        return Err(RepoError::EventNotFound(id));
    }
    Ok(())
}

/// Attaches new photos and deletes stored photos missing from `photos`.
///
/// Returns `(attached, removed)` counts.
fn reconcile_photos(
    tx: &Transaction<'_>,
    event_id: EventId,
    photos: &[EventPhoto],
) -> RepoResult<(usize, usize)> {
    let mut attached = 0;
    for photo in photos.iter().filter(|photo| photo.is_new()) {
        debug!("event=photo_attach module=repo status=start event_id={event_id}");
        insert_photo_row(tx, event_id, photo)?;
        attached += 1;
    }

    let keep = photos
        .iter()
        .map(|photo| Value::Text(photo.id.to_string()))
        .collect::<Vec<_>>();
    let removed = if keep.is_empty() {
        tx.execute("DELETE FROM event_photos WHERE event_id = ?1;", [event_id])?
    } else {
        let sql = format!(
            "DELETE FROM event_photos WHERE event_id = ? AND id NOT IN ({});",
            placeholders(keep.len())
        );
        let bind_values = std::iter::once(Value::Integer(event_id)).chain(keep);
        tx.execute(&sql, params_from_iter(bind_values))?
    };

    Ok((attached, removed))
}

fn insert_photo_row(conn: &Connection, event_id: EventId, photo: &EventPhoto) -> RepoResult<()> {
    conn.execute(
        "INSERT INTO event_photos (id, event_id, data, date_added)
         VALUES (?1, ?2, ?3, ?4);",
        params![
            photo.id.to_string(),
            event_id,
            photo.data.as_slice(),
            photo.date_added,
        ],
    )?;
    Ok(())
}

fn load_photos(conn: &Connection, event_id: EventId) -> RepoResult<Vec<EventPhoto>> {
    let mut stmt = conn.prepare(
        "SELECT id, event_id, data, date_added
         FROM event_photos
         WHERE event_id = ?1;",
    )?;
    let mut rows = stmt.query([event_id])?;
    let mut photos = Vec::new();
    while let Some(row) = rows.next()? {
        let id_text: String = row.get("id")?;
        let id = Uuid::parse_str(&id_text).map_err(|_| {
            RepoError::InvalidData(format!("invalid uuid value `{id_text}` in event_photos.id"))
        })?;
        photos.push(EventPhoto {
            id,
            event_id: Some(row.get("event_id")?),
            data: row.get("data")?,
            date_added: row.get("date_added")?,
        });
    }
    sort_photos(&mut photos);
    Ok(photos)
}

fn owning_penpal(conn: &Connection, event_id: EventId) -> RepoResult<Option<PenPalId>> {
    let penpal_id = conn
        .query_row(
            "SELECT penpal_id FROM events WHERE id = ?1;",
            [event_id],
            |row| row.get(0),
        )
        .optional()?;
    Ok(penpal_id)
}

fn penpal_exists(conn: &Connection, penpal_id: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM penpals WHERE id = ?1);",
        [penpal_id],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn parse_event_row(row: &Row<'_>) -> RepoResult<Event> {
    let pen: Option<String> = row.get("pen")?;
    let ink: Option<String> = row.get("ink")?;
    let paper: Option<String> = row.get("paper")?;

    Ok(Event {
        id: Some(row.get("id")?),
        penpal_id: row.get("penpal_id")?,
        kind: EventType::from_raw(row.get("type_value")?),
        date: row.get("date")?,
        notes: row.get("notes")?,
        pen: StationeryList::parse(pen.as_deref()),
        ink: StationeryList::parse(ink.as_deref()),
        paper: StationeryList::parse(paper.as_deref()),
        tracking_reference: row.get("tracking_reference")?,
        letter_type: LetterType::from_raw(row.get("letter_type_value")?),
        ignore: int_to_bool(row.get("is_ignored")?, "events.is_ignored")?,
    })
}

fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}
