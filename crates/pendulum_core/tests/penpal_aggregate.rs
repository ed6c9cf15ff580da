use pendulum_core::db::open_db_in_memory;
use pendulum_core::{
    EventDraft, EventPhoto, EventService, EventType, PenPal, PenPalRepository, PenPalService,
    RepoError, SqliteEventRepository, SqlitePenPalRepository,
};
use rusqlite::Connection;

const DAY: i64 = 24 * 60 * 60 * 1000;

fn count(conn: &Connection, table: &str) -> i64 {
    conn.query_row(&format!("SELECT COUNT(*) FROM {table};"), [], |row| {
        row.get(0)
    })
    .unwrap()
}

#[test]
fn upsert_updates_identity_but_keeps_status_cache() {
    let mut conn = open_db_in_memory().unwrap();
    let mut service = PenPalService::new(SqlitePenPalRepository::try_new(&mut conn).unwrap());

    assert!(service.save_penpal(&PenPal::new("pp-a", Some("Ada".to_string()), None)));
    service.add_event_at("pp-a", EventType::Written, 4 * DAY).unwrap();

    let mut renamed = PenPal::new(
        "pp-a",
        Some("Ada".to_string()),
        Some("Lovelace".to_string()),
    );
    renamed.notes = Some("Prefers airmail".to_string());
    renamed.image = Some(vec![0xFF, 0xD8]);
    assert!(service.save_penpal(&renamed));

    let loaded = service.get_penpal("pp-a").unwrap();
    assert_eq!(loaded.full_name(), "Ada Lovelace");
    assert_eq!(loaded.notes.as_deref(), Some("Prefers airmail"));
    assert_eq!(loaded.image, Some(vec![0xFF, 0xD8]));
    assert_eq!(loaded.last_event_type, EventType::Written);
    assert_eq!(loaded.last_event_date, Some(4 * DAY));
}

#[test]
fn blank_penpal_id_is_rejected() {
    let mut conn = open_db_in_memory().unwrap();
    let repo = SqlitePenPalRepository::try_new(&mut conn).unwrap();

    let err = repo.upsert_penpal(&PenPal::new("  ", None, None)).unwrap_err();
    assert!(matches!(err, RepoError::Validation(_)));
}

#[test]
fn add_event_creates_event_and_refreshes_cache() {
    let mut conn = open_db_in_memory().unwrap();
    {
        let mut service =
            PenPalService::new(SqlitePenPalRepository::try_new(&mut conn).unwrap());
        service.save_penpal(&PenPal::new("pp-a", None, None));

        let event = service.add_event("pp-a", EventType::Sent).unwrap();
        assert!(event.id.is_some());
        assert_eq!(event.kind, EventType::Sent);

        let penpal = service.get_penpal("pp-a").unwrap();
        assert_eq!(penpal.last_event_type, EventType::Sent);
        assert_eq!(penpal.last_event_date, Some(event.date));
    }
    assert_eq!(count(&conn, "events"), 1);
}

#[test]
fn update_last_event_type_recomputes_from_stored_events() {
    let mut conn = open_db_in_memory().unwrap();
    conn.execute_batch(
        "INSERT INTO penpals (id, last_event_type, last_event_date) VALUES ('pp-a', 1, 5);
         INSERT INTO events (penpal_id, type_value, date) VALUES ('pp-a', 2, 10);
         INSERT INTO events (penpal_id, type_value, date) VALUES ('pp-a', 4, 30);
         INSERT INTO events (penpal_id, type_value, date, is_ignored) VALUES ('pp-a', 1, 90, 1);",
    )
    .unwrap();

    let mut service = PenPalService::new(SqlitePenPalRepository::try_new(&mut conn).unwrap());
    let refreshed = service.update_last_event_type("pp-a").unwrap();
    assert_eq!(refreshed.last_event_type, EventType::Sent);
    assert_eq!(refreshed.last_event_date, Some(30));

    assert!(service.update_last_event_type("missing").is_none());
}

#[test]
fn same_date_ties_go_to_newest_row() {
    let mut conn = open_db_in_memory().unwrap();
    let mut service = PenPalService::new(SqlitePenPalRepository::try_new(&mut conn).unwrap());
    service.save_penpal(&PenPal::new("pp-a", None, None));

    service.add_event_at("pp-a", EventType::Received, DAY).unwrap();
    service.add_event_at("pp-a", EventType::Written, DAY).unwrap();

    let penpal = service.get_penpal("pp-a").unwrap();
    assert_eq!(penpal.last_event_type, EventType::Written);
}

#[test]
fn delete_penpal_cascades_to_events_and_photos() {
    let mut conn = open_db_in_memory().unwrap();
    {
        let repo = SqlitePenPalRepository::try_new(&mut conn).unwrap();
        repo.upsert_penpal(&PenPal::new("pp-a", None, None)).unwrap();
        repo.upsert_penpal(&PenPal::new("pp-b", None, None)).unwrap();
    }
    {
        let mut events = EventService::new(SqliteEventRepository::try_new(&mut conn).unwrap());
        let photos = vec![EventPhoto::new(vec![1, 2])];
        events
            .create_event(
                "pp-a",
                EventType::Received,
                &EventDraft::dated(DAY),
                Some(&photos),
            )
            .unwrap();
        events
            .create_event("pp-b", EventType::Written, &EventDraft::dated(DAY), None)
            .unwrap();
    }

    {
        let mut service =
            PenPalService::new(SqlitePenPalRepository::try_new(&mut conn).unwrap());
        assert!(service.delete_penpal("pp-a"));
        assert!(service.get_penpal("pp-a").is_none());
        assert!(!service.delete_penpal("pp-a"));
    }

    assert_eq!(count(&conn, "penpals"), 1);
    assert_eq!(count(&conn, "events"), 1);
    assert_eq!(count(&conn, "event_photos"), 0);
}

#[test]
fn add_event_for_unknown_penpal_is_swallowed() {
    let mut conn = open_db_in_memory().unwrap();
    let mut service = PenPalService::new(SqlitePenPalRepository::try_new(&mut conn).unwrap());

    assert!(service.add_event("ghost", EventType::Written).is_none());
    assert!(service.get_penpal("ghost").is_none());
    assert!(service.list_penpals().is_empty());
}

#[test]
fn grouped_sections_follow_status_order() {
    let mut conn = open_db_in_memory().unwrap();
    let mut service = PenPalService::new(SqlitePenPalRepository::try_new(&mut conn).unwrap());
    for id in ["pp-a", "pp-b", "pp-c", "pp-d"] {
        service.save_penpal(&PenPal::new(id, Some(id.to_string()), None));
    }
    service.add_event_at("pp-a", EventType::Received, 2 * DAY).unwrap();
    service.add_event_at("pp-b", EventType::Written, DAY).unwrap();
    service.add_event_at("pp-c", EventType::Received, DAY).unwrap();

    let sections = service.grouped_penpals();
    let summary: Vec<(EventType, Vec<&str>)> = sections
        .iter()
        .map(|section| {
            (
                section.event_type,
                section.penpals.iter().map(|p| p.id.as_str()).collect(),
            )
        })
        .collect();
    assert_eq!(
        summary,
        vec![
            (EventType::Written, vec!["pp-b"]),
            (EventType::Received, vec!["pp-c", "pp-a"]),
            (EventType::NoEvent, vec!["pp-d"]),
        ]
    );
}

#[test]
fn list_penpals_sorts_by_name() {
    let mut conn = open_db_in_memory().unwrap();
    let service = PenPalService::new(SqlitePenPalRepository::try_new(&mut conn).unwrap());
    service.save_penpal(&PenPal::new("1", Some("zoe".to_string()), None));
    service.save_penpal(&PenPal::new("2", Some("Anna".to_string()), None));
    service.save_penpal(&PenPal::new("3", Some("bea".to_string()), None));

    let names: Vec<String> = service
        .list_penpals()
        .iter()
        .map(PenPal::full_name)
        .collect();
    assert_eq!(names, vec!["Anna", "bea", "zoe"]);
}
