use super::*;
use chrono::TimeZone;

async fn seeded() -> (Storage, Vec<SessionId>, SpeakerId) {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let track = storage.create_track("Backend").await.expect("track");
    let speaker = storage
        .create_speaker("Maria Rossi", "Writes databases.", None)
        .await
        .expect("speaker");

    let mut ids = Vec::new();
    for (hour, title) in [(11, "Third"), (9, "First"), (10, "Second")] {
        let starts_at = Utc.with_ymd_and_hms(2024, 5, 1, hour, 0, 0).single();
        let id = storage
            .create_session(&NewSession {
                title,
                abstract_text: "An abstract",
                starts_at,
                ends_at: None,
                track_id: Some(track),
                speaker_ids: &[speaker],
            })
            .await
            .expect("session");
        ids.push(id);
    }
    (storage, ids, speaker)
}

fn attendee(user_name: &str) -> NewAttendee<'_> {
    NewAttendee {
        user_name,
        first_name: "Ada",
        last_name: "Lovelace",
        email_address: "ada@example.com",
    }
}

#[tokio::test]
async fn health_check_succeeds_for_live_pool() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    storage.health_check().await.expect("health check");
}

#[tokio::test]
async fn creates_database_file_when_missing() {
    let temp_root = tempfile::tempdir().expect("tempdir");
    let db_path = temp_root.path().join("nested").join("storage.db");
    let database_url = format!("sqlite://{}", db_path.to_string_lossy().replace('\\', "/"));

    let storage = Storage::new(&database_url).await.expect("db");
    drop(storage);

    assert!(
        db_path.exists(),
        "database file should exist: {}",
        db_path.display()
    );
}

#[tokio::test]
async fn lists_sessions_in_start_order_with_track_and_speakers() {
    let (storage, _ids, speaker) = seeded().await;
    let sessions = storage.list_sessions().await.expect("sessions");
    let titles: Vec<_> = sessions.iter().map(|s| s.title.as_str()).collect();
    assert_eq!(titles, ["First", "Second", "Third"]);
    assert_eq!(sessions[0].track.as_ref().map(|t| t.1.as_str()), Some("Backend"));
    assert_eq!(sessions[0].speakers, vec![(speaker, "Maria Rossi".to_string())]);
}

#[tokio::test]
async fn unscheduled_sessions_sort_last() {
    let (storage, _ids, _speaker) = seeded().await;
    storage
        .create_session(&NewSession {
            title: "Lightning talks",
            ..NewSession::default()
        })
        .await
        .expect("session");
    let sessions = storage.list_sessions().await.expect("sessions");
    assert_eq!(sessions.last().map(|s| s.title.as_str()), Some("Lightning talks"));
}

#[tokio::test]
async fn update_and_delete_session() {
    let (storage, ids, _speaker) = seeded().await;
    let updated = storage
        .update_session(
            ids[0],
            &NewSession {
                title: "Renamed",
                ..NewSession::default()
            },
        )
        .await
        .expect("update");
    assert!(updated);
    let session = storage
        .load_session(ids[0])
        .await
        .expect("load")
        .expect("exists");
    assert_eq!(session.title, "Renamed");
    assert!(session.speakers.is_empty());
    assert!(session.track.is_none());

    assert!(storage.delete_session(ids[0]).await.expect("delete"));
    assert!(!storage.delete_session(ids[0]).await.expect("delete again"));
    assert!(storage.load_session(ids[0]).await.expect("load").is_none());
    assert!(!storage
        .update_session(
            ids[0],
            &NewSession {
                title: "Ghost",
                ..NewSession::default()
            }
        )
        .await
        .expect("update missing"));
}

#[tokio::test]
async fn duplicate_attendee_user_name_is_rejected() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let first = storage
        .create_attendee(&attendee("ada"))
        .await
        .expect("insert");
    assert!(first.is_some());

    let second = storage
        .create_attendee(&attendee("ada"))
        .await
        .expect("insert");
    assert!(second.is_none());
}

#[tokio::test]
async fn user_names_differing_only_by_case_are_distinct_attendees() {
    let (storage, ids, _speaker) = seeded().await;
    let lower = storage
        .create_attendee(&attendee("ada"))
        .await
        .expect("insert")
        .expect("created");
    let upper = storage
        .create_attendee(&attendee("ADA"))
        .await
        .expect("insert")
        .expect("created");
    assert_ne!(lower, upper);

    assert!(storage
        .add_attendee_session(lower, ids[0])
        .await
        .expect("add"));
    let other = storage
        .load_attendee("ADA")
        .await
        .expect("load")
        .expect("exists");
    assert_eq!(other.user_name, "ADA");
    assert!(other.sessions.is_empty());
    assert!(storage.load_attendee("Ada").await.expect("load").is_none());
}

#[tokio::test]
async fn unknown_attendee_loads_as_none() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    assert!(storage.load_attendee("nobody").await.expect("load").is_none());
    assert!(storage
        .attendee_id_for_user_name("nobody")
        .await
        .expect("lookup")
        .is_none());
}

#[tokio::test]
async fn attendee_session_add_and_remove_are_idempotent() {
    let (storage, ids, _speaker) = seeded().await;
    let attendee_id = storage
        .create_attendee(&attendee("ada"))
        .await
        .expect("insert")
        .expect("created");

    assert!(storage
        .add_attendee_session(attendee_id, ids[1])
        .await
        .expect("add"));
    assert!(!storage
        .add_attendee_session(attendee_id, ids[1])
        .await
        .expect("add again"));

    let loaded = storage
        .load_attendee("ada")
        .await
        .expect("load")
        .expect("exists");
    assert_eq!(loaded.sessions.len(), 1);
    assert_eq!(loaded.sessions[0].session_id, ids[1]);

    assert!(storage
        .remove_attendee_session(attendee_id, ids[1])
        .await
        .expect("remove"));
    assert!(!storage
        .remove_attendee_session(attendee_id, ids[1])
        .await
        .expect("remove again"));

    let loaded = storage
        .load_attendee("ada")
        .await
        .expect("load")
        .expect("exists");
    assert!(loaded.sessions.is_empty());
}

#[tokio::test]
async fn lists_sessions_for_attendee_in_start_order() {
    let (storage, ids, _speaker) = seeded().await;
    let attendee_id = storage
        .create_attendee(&attendee("ada"))
        .await
        .expect("insert")
        .expect("created");
    for id in [ids[0], ids[1]] {
        storage
            .add_attendee_session(attendee_id, id)
            .await
            .expect("add");
    }

    let sessions = storage
        .list_sessions_for_attendee(attendee_id)
        .await
        .expect("sessions");
    let titles: Vec<_> = sessions.iter().map(|s| s.title.as_str()).collect();
    assert_eq!(titles, ["First", "Third"]);
}

#[tokio::test]
async fn deleting_a_session_drops_agenda_entries() {
    let (storage, ids, _speaker) = seeded().await;
    let attendee_id = storage
        .create_attendee(&attendee("ada"))
        .await
        .expect("insert")
        .expect("created");
    storage
        .add_attendee_session(attendee_id, ids[2])
        .await
        .expect("add");

    storage.delete_session(ids[2]).await.expect("delete");
    let loaded = storage
        .load_attendee("ada")
        .await
        .expect("load")
        .expect("exists");
    assert!(loaded.sessions.is_empty());
}

#[tokio::test]
async fn search_matches_titles_and_speaker_bios_case_insensitively() {
    let (storage, _ids, speaker) = seeded().await;
    let sessions = storage.search_sessions("SECOND").await.expect("search");
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].title, "Second");

    let speakers = storage.search_speakers("databases").await.expect("search");
    assert_eq!(speakers.len(), 1);
    assert_eq!(speakers[0].speaker_id, speaker);
    assert_eq!(speakers[0].sessions.len(), 3);
}

#[tokio::test]
async fn search_matches_non_ascii_text() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let speaker = storage
        .create_speaker("Émile Zola", "Écrivain.", None)
        .await
        .expect("speaker");
    storage
        .create_session(&NewSession {
            title: "Über Rust",
            speaker_ids: &[speaker],
            ..NewSession::default()
        })
        .await
        .expect("session");

    for term in ["Über", "Über RUST", "ber r"] {
        let sessions = storage.search_sessions(term).await.expect("search");
        let titles: Vec<_> = sessions.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, ["Über Rust"], "term {term:?}");
    }

    for term in ["Émile", "Émile ZOLA", "Écrivain"] {
        let speakers = storage.search_speakers(term).await.expect("search");
        assert_eq!(speakers.len(), 1, "term {term:?}");
        assert_eq!(speakers[0].speaker_id, speaker);
    }
}

#[tokio::test]
async fn search_treats_wildcards_literally() {
    let (storage, _ids, _speaker) = seeded().await;
    let sessions = storage.search_sessions("%").await.expect("search");
    assert!(sessions.is_empty());
}

#[test]
fn memory_urls_have_no_parent_dir() {
    assert!(sqlite_path("sqlite::memory:").is_none());
    assert_eq!(
        sqlite_path("sqlite://./data/conf.db?mode=rwc"),
        Some(PathBuf::from("./data/conf.db"))
    );
}
