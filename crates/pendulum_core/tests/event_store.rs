use pendulum_core::db::open_db_in_memory;
use pendulum_core::{
    Event, EventDraft, EventListQuery, EventPhoto, EventRepository, EventService, EventType,
    LetterType, PenPal, PenPalRepository, RepoError, SqliteEventRepository,
    SqlitePenPalRepository,
};
use rusqlite::Connection;

const DAY: i64 = 24 * 60 * 60 * 1000;

fn seed_penpal(conn: &mut Connection, id: &str) {
    let repo = SqlitePenPalRepository::try_new(conn).unwrap();
    repo.upsert_penpal(&PenPal::new(id, Some(id.to_uppercase()), None))
        .unwrap();
}

fn load_penpal(conn: &mut Connection, id: &str) -> PenPal {
    let repo = SqlitePenPalRepository::try_new(conn).unwrap();
    repo.get_penpal(id).unwrap().unwrap()
}

#[test]
fn creating_written_event_updates_penpal_cache() {
    let mut conn = open_db_in_memory().unwrap();
    seed_penpal(&mut conn, "pp-a");

    let saved = {
        let mut service = EventService::new(SqliteEventRepository::try_new(&mut conn).unwrap());
        let draft = EventDraft {
            notes: Some("Hello".to_string()),
            pen: Some("Lamy 2000".to_string()),
            ..EventDraft::dated(1_000)
        };
        service
            .create_event("pp-a", EventType::Written, &draft, None)
            .expect("event should be saved")
    };

    assert!(saved.id.is_some());
    assert_eq!(saved.kind, EventType::Written);
    assert_eq!(saved.notes.as_deref(), Some("Hello"));
    assert_eq!(saved.pen.tokens(), ["Lamy 2000"]);
    assert!(saved.ink.is_empty());
    assert!(saved.paper.is_empty());
    assert!(!saved.ignore);

    let penpal = load_penpal(&mut conn, "pp-a");
    assert_eq!(penpal.last_event_type, EventType::Written);
    assert_eq!(penpal.last_event_date, Some(1_000));
}

#[test]
fn stored_event_round_trips_all_fields() {
    let mut conn = open_db_in_memory().unwrap();
    seed_penpal(&mut conn, "pp-a");

    let mut repo = SqliteEventRepository::try_new(&mut conn).unwrap();
    let mut event = Event::new("pp-a", EventType::Received, 5 * DAY);
    event.apply_draft(&EventDraft {
        date: 5 * DAY,
        notes: Some("  postmarked Oslo\n".to_string()),
        pen: None,
        ink: Some("Blue Black;Sepia".to_string()),
        paper: Some("Tomoe River\nTomoe River".to_string()),
        letter_type: LetterType::Package,
        ignore: false,
        tracking_reference: Some("RR123".to_string()),
    });
    let saved = repo.save_event(&event, None).unwrap();

    let loaded = repo.get_event(saved.id.unwrap()).unwrap().unwrap();
    assert_eq!(loaded, saved);
    assert_eq!(loaded.notes.as_deref(), Some("postmarked Oslo"));
    assert_eq!(loaded.ink.tokens(), ["Blue Black", "Sepia"]);
    assert_eq!(loaded.paper.tokens(), ["Tomoe River"]);
    assert_eq!(loaded.letter_type, LetterType::Package);
    assert_eq!(loaded.tracking_reference.as_deref(), Some("RR123"));
}

#[test]
fn stationery_is_stored_newline_joined_or_null() {
    let mut conn = open_db_in_memory().unwrap();
    seed_penpal(&mut conn, "pp-a");

    let id = {
        let mut repo = SqliteEventRepository::try_new(&mut conn).unwrap();
        let mut event = Event::new("pp-a", EventType::Written, 0);
        event.pen.push("A");
        event.pen.push("B");
        repo.save_event(&event, None).unwrap().id.unwrap()
    };

    let (pen, ink): (Option<String>, Option<String>) = conn
        .query_row("SELECT pen, ink FROM events WHERE id = ?1;", [id], |row| {
            Ok((row.get(0)?, row.get(1)?))
        })
        .unwrap();
    assert_eq!(pen.as_deref(), Some("A\nB"));
    assert_eq!(ink, None);
}

#[test]
fn deleting_only_event_resets_cache_to_no_event() {
    let mut conn = open_db_in_memory().unwrap();
    seed_penpal(&mut conn, "pp-a");

    {
        let mut service = EventService::new(SqliteEventRepository::try_new(&mut conn).unwrap());
        let saved = service
            .create_event("pp-a", EventType::Sent, &EventDraft::dated(2_000), None)
            .unwrap();
        assert!(service.delete_event(saved.id.unwrap()));
        assert_eq!(service.count_events(), 0);
    }

    let penpal = load_penpal(&mut conn, "pp-a");
    assert_eq!(penpal.last_event_type, EventType::NoEvent);
    assert_eq!(penpal.last_event_date, None);
}

#[test]
fn cache_tracks_latest_date_not_latest_write() {
    let mut conn = open_db_in_memory().unwrap();
    seed_penpal(&mut conn, "pp-a");

    let (newer, older) = {
        let mut service = EventService::new(SqliteEventRepository::try_new(&mut conn).unwrap());
        let newer = service
            .create_event("pp-a", EventType::Received, &EventDraft::dated(10 * DAY), None)
            .unwrap();
        let older = service
            .create_event("pp-a", EventType::Written, &EventDraft::dated(3 * DAY), None)
            .unwrap();
        (newer, older)
    };
    assert_eq!(load_penpal(&mut conn, "pp-a").last_event_type, EventType::Received);

    {
        let mut service = EventService::new(SqliteEventRepository::try_new(&mut conn).unwrap());
        assert!(service.delete_event(newer.id.unwrap()));
    }
    let penpal = load_penpal(&mut conn, "pp-a");
    assert_eq!(penpal.last_event_type, EventType::Written);
    assert_eq!(penpal.last_event_date, Some(older.date));
}

#[test]
fn ignored_events_do_not_count_toward_status() {
    let mut conn = open_db_in_memory().unwrap();
    seed_penpal(&mut conn, "pp-a");

    {
        let mut service = EventService::new(SqliteEventRepository::try_new(&mut conn).unwrap());
        service
            .create_event("pp-a", EventType::Written, &EventDraft::dated(DAY), None)
            .unwrap();
        let ignored = EventDraft {
            ignore: true,
            ..EventDraft::dated(9 * DAY)
        };
        let saved = service
            .create_event("pp-a", EventType::Received, &ignored, None)
            .unwrap();
        assert!(saved.ignore);
    }

    let penpal = load_penpal(&mut conn, "pp-a");
    assert_eq!(penpal.last_event_type, EventType::Written);
    assert_eq!(penpal.last_event_date, Some(DAY));
}

#[test]
fn only_ignored_events_leave_no_event_sentinel() {
    let mut conn = open_db_in_memory().unwrap();
    seed_penpal(&mut conn, "pp-a");

    {
        let mut service = EventService::new(SqliteEventRepository::try_new(&mut conn).unwrap());
        let ignored = EventDraft {
            ignore: true,
            ..EventDraft::dated(DAY)
        };
        service
            .create_event("pp-a", EventType::Sent, &ignored, None)
            .unwrap();
        assert_eq!(service.count_events(), 1);
    }

    let penpal = load_penpal(&mut conn, "pp-a");
    assert_eq!(penpal.last_event_type, EventType::NoEvent);
    assert_eq!(penpal.last_event_date, None);
}

#[test]
fn moving_event_to_other_penpal_refreshes_both() {
    let mut conn = open_db_in_memory().unwrap();
    seed_penpal(&mut conn, "pp-a");
    seed_penpal(&mut conn, "pp-b");

    {
        let mut service = EventService::new(SqliteEventRepository::try_new(&mut conn).unwrap());
        let saved = service
            .create_event("pp-a", EventType::Written, &EventDraft::dated(DAY), None)
            .unwrap();
        let mut moved = saved.clone();
        moved.penpal_id = "pp-b".to_string();
        service
            .update_event(moved, &EventDraft::dated(2 * DAY), None)
            .unwrap();
    }

    let previous = load_penpal(&mut conn, "pp-a");
    assert_eq!(previous.last_event_type, EventType::NoEvent);
    assert_eq!(previous.last_event_date, None);
    let current = load_penpal(&mut conn, "pp-b");
    assert_eq!(current.last_event_type, EventType::Written);
    assert_eq!(current.last_event_date, Some(2 * DAY));
}

#[test]
fn update_replaces_fields_from_draft() {
    let mut conn = open_db_in_memory().unwrap();
    seed_penpal(&mut conn, "pp-a");

    let mut service = EventService::new(SqliteEventRepository::try_new(&mut conn).unwrap());
    let first = EventDraft {
        notes: Some("draft".to_string()),
        pen: Some("Pilot".to_string()),
        ..EventDraft::dated(DAY)
    };
    let saved = service
        .create_event("pp-a", EventType::Written, &first, None)
        .unwrap();

    let second = EventDraft {
        notes: Some("   ".to_string()),
        ink: Some("Sepia".to_string()),
        ..EventDraft::dated(2 * DAY)
    };
    let updated = service.update_event(saved.clone(), &second, None).unwrap();
    assert_eq!(updated.id, saved.id);

    let loaded = service.get_event(saved.id.unwrap()).unwrap();
    assert_eq!(loaded.date, 2 * DAY);
    assert_eq!(loaded.notes, None);
    assert!(loaded.pen.is_empty());
    assert_eq!(loaded.ink.tokens(), ["Sepia"]);
    assert_eq!(service.count_events(), 1);
}

#[test]
fn photo_set_is_reconciled_by_id() {
    let mut conn = open_db_in_memory().unwrap();
    seed_penpal(&mut conn, "pp-a");

    let mut service = EventService::new(SqliteEventRepository::try_new(&mut conn).unwrap());
    let photos = vec![EventPhoto::new(vec![1, 2, 3]), EventPhoto::new(vec![4, 5])];
    let saved = service
        .create_event(
            "pp-a",
            EventType::Received,
            &EventDraft::dated(DAY),
            Some(&photos),
        )
        .unwrap();
    let event_id = saved.id.unwrap();

    let stored = service.photos(event_id);
    assert_eq!(stored.len(), 2);
    assert!(stored.iter().all(|photo| photo.event_id == Some(event_id)));

    // Keep the first photo, drop the second, add a third.
    let kept = stored
        .iter()
        .find(|photo| photo.id == photos[0].id)
        .cloned()
        .unwrap();
    let added = EventPhoto::new(vec![9]);
    let next_set = vec![kept.clone(), added.clone()];
    service
        .update_event(saved.clone(), &EventDraft::dated(DAY), Some(&next_set))
        .unwrap();

    let mut ids: Vec<_> = service.photos(event_id).iter().map(|photo| photo.id).collect();
    ids.sort();
    let mut expected = vec![kept.id, added.id];
    expected.sort();
    assert_eq!(ids, expected);

    // `None` leaves photos untouched.
    service
        .update_event(saved.clone(), &EventDraft::dated(DAY), None)
        .unwrap();
    assert_eq!(service.photos(event_id).len(), 2);

    // An empty set removes every photo.
    service
        .update_event(saved, &EventDraft::dated(DAY), Some(&[]))
        .unwrap();
    assert!(service.photos(event_id).is_empty());
}

#[test]
fn add_photo_attaches_to_existing_event_only() {
    let mut conn = open_db_in_memory().unwrap();
    seed_penpal(&mut conn, "pp-a");

    let mut service = EventService::new(SqliteEventRepository::try_new(&mut conn).unwrap());
    let saved = service
        .create_event("pp-a", EventType::Received, &EventDraft::dated(DAY), None)
        .unwrap();
    let event_id = saved.id.unwrap();

    let photo = service.add_photo(event_id, vec![7, 7]).unwrap();
    assert_eq!(photo.event_id, Some(event_id));
    assert_eq!(service.photos(event_id), vec![photo]);

    assert!(service.add_photo(event_id + 100, vec![1]).is_none());
    assert!(service.add_photo(event_id, Vec::new()).is_none());
}

#[test]
fn deleting_event_cascades_to_photos() {
    let mut conn = open_db_in_memory().unwrap();
    seed_penpal(&mut conn, "pp-a");

    {
        let mut service = EventService::new(SqliteEventRepository::try_new(&mut conn).unwrap());
        let photos = vec![EventPhoto::new(vec![1])];
        let saved = service
            .create_event(
                "pp-a",
                EventType::Received,
                &EventDraft::dated(DAY),
                Some(&photos),
            )
            .unwrap();
        assert!(service.delete_event(saved.id.unwrap()));
    }

    let remaining: i64 = conn
        .query_row("SELECT COUNT(*) FROM event_photos;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(remaining, 0);
}

#[test]
fn fetch_filters_by_type_and_treats_empty_as_all() {
    let mut conn = open_db_in_memory().unwrap();
    seed_penpal(&mut conn, "pp-a");

    let mut service = EventService::new(SqliteEventRepository::try_new(&mut conn).unwrap());
    for (kind, date) in [
        (EventType::Written, DAY),
        (EventType::Sent, 2 * DAY),
        (EventType::Inbound, 3 * DAY),
        (EventType::Received, 4 * DAY),
    ] {
        service
            .create_event("pp-a", kind, &EventDraft::dated(date), None)
            .unwrap();
    }

    let outbound = service.fetch_events(Some(&[EventType::Sent, EventType::Written]));
    let kinds: Vec<_> = outbound.iter().map(|event| event.kind).collect();
    assert_eq!(kinds, vec![EventType::Written, EventType::Sent]);

    assert_eq!(service.fetch_events(Some(&[])).len(), 4);
    assert_eq!(service.fetch_events(None).len(), 4);
    assert!(service.fetch_events(Some(&[EventType::NoEvent])).is_empty());
    assert_eq!(service.count_events(), 4);
}

#[test]
fn timeline_is_newest_first_and_scoped_to_penpal() {
    let mut conn = open_db_in_memory().unwrap();
    seed_penpal(&mut conn, "pp-a");
    seed_penpal(&mut conn, "pp-b");

    let mut service = EventService::new(SqliteEventRepository::try_new(&mut conn).unwrap());
    service
        .create_event("pp-a", EventType::Written, &EventDraft::dated(DAY), None)
        .unwrap();
    service
        .create_event("pp-a", EventType::Sent, &EventDraft::dated(3 * DAY), None)
        .unwrap();
    service
        .create_event("pp-b", EventType::Received, &EventDraft::dated(2 * DAY), None)
        .unwrap();

    let dates: Vec<_> = service
        .events_for_penpal("pp-a")
        .iter()
        .map(|event| event.date)
        .collect();
    assert_eq!(dates, vec![3 * DAY, DAY]);
}

#[test]
fn saving_for_unknown_penpal_fails_without_writing() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = SqliteEventRepository::try_new(&mut conn).unwrap();

    let err = repo
        .save_event(&Event::new("missing", EventType::Written, 0), None)
        .unwrap_err();
    assert!(matches!(err, RepoError::PenPalNotFound(ref id) if id == "missing"));
    assert_eq!(repo.count_events().unwrap(), 0);
}

#[test]
fn updating_or_deleting_unknown_event_reports_not_found() {
    let mut conn = open_db_in_memory().unwrap();
    seed_penpal(&mut conn, "pp-a");
    let mut repo = SqliteEventRepository::try_new(&mut conn).unwrap();

    let mut ghost = Event::new("pp-a", EventType::Written, 0);
    ghost.id = Some(404);
    assert!(matches!(
        repo.save_event(&ghost, None).unwrap_err(),
        RepoError::EventNotFound(404)
    ));
    assert!(matches!(
        repo.delete_event(404).unwrap_err(),
        RepoError::EventNotFound(404)
    ));
}

#[test]
fn service_swallows_storage_errors() {
    let mut conn = open_db_in_memory().unwrap();
    let mut service = EventService::new(SqliteEventRepository::try_new(&mut conn).unwrap());

    assert!(service
        .create_event("nobody", EventType::Written, &EventDraft::dated(0), None)
        .is_none());
    assert!(!service.delete_event(1));
    assert!(service.get_event(1).is_none());
    assert_eq!(service.count_events(), 0);
}

#[test]
fn list_query_combines_filters() {
    let mut conn = open_db_in_memory().unwrap();
    seed_penpal(&mut conn, "pp-a");
    seed_penpal(&mut conn, "pp-b");

    let mut repo = SqliteEventRepository::try_new(&mut conn).unwrap();
    for (penpal, kind) in [
        ("pp-a", EventType::Received),
        ("pp-b", EventType::Received),
        ("pp-a", EventType::Written),
    ] {
        repo.save_event(&Event::new(penpal, kind, DAY), None).unwrap();
    }

    let query = EventListQuery {
        kinds: vec![EventType::Received],
        penpal_id: Some("pp-a".to_string()),
        newest_first: true,
    };
    let events = repo.list_events(&query).unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].penpal_id, "pp-a");
    assert_eq!(events[0].kind, EventType::Received);
}
