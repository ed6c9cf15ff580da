//! Pen-pal repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist pen-pal identity, display fields and notes.
//! - Recompute the denormalized last-event cache from stored events.
//! - Delete pen-pals with cascade to events and photos.
//!
//! # Invariants
//! - Identity upserts never touch `last_event_type`/`last_event_date`.
//! - The cache always reflects the latest-dated non-ignored event, or the
//!   `NoEvent` sentinel when none exist.
//! - Cache refresh runs inside the caller's transaction when invoked from an
//!   event write.

use crate::model::event::Event;
use crate::model::event_type::EventType;
use crate::model::penpal::{PenPal, PenPalId};
use crate::repo::event_repo::{EventRepository, SqliteEventRepository};
use crate::repo::{ensure_connection_ready, RepoError, RepoResult};
use log::{debug, info};
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};

const PENPAL_SELECT_SQL: &str = "SELECT
    id,
    given_name,
    family_name,
    image,
    notes,
    last_event_type,
    last_event_date
FROM penpals";

/// Repository interface for the pen-pal aggregate.
pub trait PenPalRepository {
    /// Inserts a pen-pal or updates identity fields of an existing one.
    fn upsert_penpal(&self, penpal: &PenPal) -> RepoResult<()>;
    /// Gets one pen-pal by id.
    fn get_penpal(&self, id: &str) -> RepoResult<Option<PenPal>>;
    /// Lists all pen-pals sorted by name.
    fn list_penpals(&self) -> RepoResult<Vec<PenPal>>;
    /// Deletes a pen-pal together with its events and photos.
    fn delete_penpal(&mut self, id: &str) -> RepoResult<()>;
    /// Recomputes the cached last-event fields and returns the updated row.
    fn update_last_event_type(&mut self, id: &str) -> RepoResult<PenPal>;
    /// Records a new event of `kind` for the pen-pal.
    fn add_event(&mut self, id: &str, kind: EventType, date: i64) -> RepoResult<Event>;
}

/// SQLite-backed pen-pal repository.
pub struct SqlitePenPalRepository<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> SqlitePenPalRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn mut Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl PenPalRepository for SqlitePenPalRepository<'_> {
    fn upsert_penpal(&self, penpal: &PenPal) -> RepoResult<()> {
        penpal.validate()?;

        self.conn.execute(
            "INSERT INTO penpals (
                id,
                given_name,
                family_name,
                image,
                notes
            ) VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT (id) DO UPDATE SET
                given_name = excluded.given_name,
                family_name = excluded.family_name,
                image = excluded.image,
                notes = excluded.notes,
                updated_at = (strftime('%s', 'now') * 1000);",
            params![
                penpal.id.as_str(),
                penpal.given_name.as_deref(),
                penpal.family_name.as_deref(),
                penpal.image.as_deref(),
                penpal.notes.as_deref(),
            ],
        )?;

        debug!("event=penpal_upsert module=repo status=ok");
        Ok(())
    }

    fn get_penpal(&self, id: &str) -> RepoResult<Option<PenPal>> {
        load_penpal(self.conn, id)
    }

    fn list_penpals(&self) -> RepoResult<Vec<PenPal>> {
        let mut stmt = self.conn.prepare(&format!(
            "{PENPAL_SELECT_SQL}
             ORDER BY
                given_name COLLATE NOCASE ASC,
                family_name COLLATE NOCASE ASC,
                id ASC;"
        ))?;
        let mut rows = stmt.query([])?;
        let mut penpals = Vec::new();
        while let Some(row) = rows.next()? {
            penpals.push(parse_penpal_row(row)?);
        }
        Ok(penpals)
    }

    fn delete_penpal(&mut self, id: &str) -> RepoResult<()> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let removed_events: i64 = tx.query_row(
            "SELECT COUNT(*) FROM events WHERE penpal_id = ?1;",
            [id],
            |row| row.get(0),
        )?;
        let changed = tx.execute("DELETE FROM penpals WHERE id = ?1;", [id])?;
        if changed == 0 {
            return Err(RepoError::PenPalNotFound(id.to_string()));
        }
        tx.commit()?;

        info!(
            "event=penpal_delete module=repo status=ok cascaded_events={}",
            removed_events
        );
        Ok(())
    }

    fn update_last_event_type(&mut self, id: &str) -> RepoResult<PenPal> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        refresh_last_event(&tx, id)?;
        let penpal = load_penpal(&tx, id)?.ok_or_else(|| {
            RepoError::InvalidData(format!("pen-pal `{id}` vanished during cache refresh"))
        })?;
        tx.commit()?;
        Ok(penpal)
    }

    fn add_event(&mut self, id: &str, kind: EventType, date: i64) -> RepoResult<Event> {
        let mut events = SqliteEventRepository::try_new(&mut *self.conn)?;
        events.save_event(&Event::new(id, kind, date), None)
    }
}

/// Recomputes the cached last-event fields for one pen-pal.
///
/// Takes the latest-dated event that is not ignored; ties on date go to the
/// newest row. Falls back to `NoEvent` with no date when nothing remains.
///
/// # Errors
/// - `RepoError::PenPalNotFound` when no pen-pal row has `penpal_id`.
pub(crate) fn refresh_last_event(
    conn: &Connection,
    penpal_id: &str,
) -> RepoResult<Option<(EventType, i64)>> {
    let latest = conn
        .query_row(
            "SELECT type_value, date
             FROM events
             WHERE penpal_id = ?1
               AND is_ignored = 0
             ORDER BY date DESC, id DESC
             LIMIT 1;",
            [penpal_id],
            |row| Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?)),
        )
        .optional()?
        .map(|(raw_type, date)| (EventType::from_raw(raw_type), date));

    let (raw_type, date) = match latest {
        Some((kind, date)) => (kind.raw_value(), Some(date)),
        None => (EventType::NoEvent.raw_value(), None),
    };

    let changed = conn.execute(
        "UPDATE penpals
         SET
            last_event_type = ?1,
            last_event_date = ?2
         WHERE id = ?3;",
        params![raw_type, date, penpal_id],
    )?;
    if changed == 0 {
        return Err(RepoError::PenPalNotFound(penpal_id.to_string()));
    }

    debug!(
        "event=penpal_refresh module=repo status=ok last_event_type={}",
        raw_type
    );
    Ok(latest)
}

fn load_penpal(conn: &Connection, id: &str) -> RepoResult<Option<PenPal>> {
    let mut stmt = conn.prepare(&format!("{PENPAL_SELECT_SQL} WHERE id = ?1;"))?;
    let mut rows = stmt.query([id])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_penpal_row(row)?));
    }
    Ok(None)
}

fn parse_penpal_row(row: &Row<'_>) -> RepoResult<PenPal> {
    let id: PenPalId = row.get("id")?;
    if id.trim().is_empty() {
        return Err(RepoError::InvalidData(
            "blank id value in penpals.id".to_string(),
        ));
    }

    Ok(PenPal {
        id,
        given_name: row.get("given_name")?,
        family_name: row.get("family_name")?,
        image: row.get("image")?,
        notes: row.get("notes")?,
        last_event_type: EventType::from_raw(row.get("last_event_type")?),
        last_event_date: row.get("last_event_date")?,
    })
}
