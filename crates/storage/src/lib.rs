use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow},
    Pool, QueryBuilder, Row, Sqlite,
};
use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};

use shared::domain::{AttendeeId, SessionId, SpeakerId, TrackId};

const SESSION_COLUMNS: &str = "SELECT s.id, s.title, s.abstract, s.starts_at, s.ends_at, t.id, t.name
     FROM sessions s
     LEFT JOIN tracks t ON t.id = s.track_id";

const SESSION_ORDER: &str = "ORDER BY s.starts_at IS NULL, s.starts_at ASC, s.id ASC";

#[derive(Clone)]
pub struct Storage {
    pool: Pool<Sqlite>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredSession {
    pub session_id: SessionId,
    pub title: String,
    pub abstract_text: String,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    pub track: Option<(TrackId, String)>,
    pub speakers: Vec<(SpeakerId, String)>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredSessionRef {
    pub session_id: SessionId,
    pub title: String,
    pub starts_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredSpeaker {
    pub speaker_id: SpeakerId,
    pub name: String,
    pub bio: String,
    pub web_site: Option<String>,
    pub sessions: Vec<StoredSessionRef>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredAttendee {
    pub attendee_id: AttendeeId,
    pub user_name: String,
    pub first_name: String,
    pub last_name: String,
    pub email_address: String,
    pub sessions: Vec<StoredSessionRef>,
}

#[derive(Debug, Clone, Default)]
pub struct NewSession<'a> {
    pub title: &'a str,
    pub abstract_text: &'a str,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    pub track_id: Option<TrackId>,
    pub speaker_ids: &'a [SpeakerId],
}

#[derive(Debug, Clone)]
pub struct NewAttendee<'a> {
    pub user_name: &'a str,
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub email_address: &'a str,
}

impl Storage {
    pub async fn new(database_url: &str) -> Result<Self> {
        ensure_sqlite_parent_dir_exists(database_url)?;

        let connect_options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(connect_options)
            .await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    pub async fn health_check(&self) -> Result<()> {
        let _: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("sqlite ping failed")?;
        Ok(())
    }

    pub async fn create_track(&self, name: &str) -> Result<TrackId> {
        let rec = sqlx::query(
            "INSERT INTO tracks (name) VALUES (?)
             ON CONFLICT(name) DO UPDATE SET name=excluded.name
             RETURNING id",
        )
        .bind(name)
        .fetch_one(&self.pool)
        .await?;
        Ok(TrackId(rec.get::<i64, _>(0)))
    }

    pub async fn track_exists(&self, track_id: TrackId) -> Result<bool> {
        let row = sqlx::query("SELECT 1 FROM tracks WHERE id = ?")
            .bind(track_id.0)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }

    pub async fn create_speaker(
        &self,
        name: &str,
        bio: &str,
        web_site: Option<&str>,
    ) -> Result<SpeakerId> {
        let rec =
            sqlx::query("INSERT INTO speakers (name, bio, web_site) VALUES (?, ?, ?) RETURNING id")
                .bind(name)
                .bind(bio)
                .bind(web_site)
                .fetch_one(&self.pool)
                .await?;
        Ok(SpeakerId(rec.get::<i64, _>(0)))
    }

    pub async fn speaker_exists(&self, speaker_id: SpeakerId) -> Result<bool> {
        let row = sqlx::query("SELECT 1 FROM speakers WHERE id = ?")
            .bind(speaker_id.0)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }

    pub async fn list_speakers(&self) -> Result<Vec<StoredSpeaker>> {
        let rows = sqlx::query(
            "SELECT id, name, bio, web_site FROM speakers ORDER BY lower(name) ASC, id ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        self.hydrate_speakers(rows).await
    }

    pub async fn load_speaker(&self, speaker_id: SpeakerId) -> Result<Option<StoredSpeaker>> {
        let row = sqlx::query("SELECT id, name, bio, web_site FROM speakers WHERE id = ?")
            .bind(speaker_id.0)
            .fetch_optional(&self.pool)
            .await?;
        let Some(row) = row else {
            return Ok(None);
        };
        Ok(self.hydrate_speakers(vec![row]).await?.pop())
    }

    pub async fn search_speakers(&self, term: &str) -> Result<Vec<StoredSpeaker>> {
        let pattern = like_pattern(term);
        let rows = sqlx::query(
            "SELECT id, name, bio, web_site FROM speakers
             WHERE lower(name) LIKE ?1 ESCAPE '\\' OR lower(bio) LIKE ?1 ESCAPE '\\'
             ORDER BY lower(name) ASC, id ASC",
        )
        .bind(pattern)
        .fetch_all(&self.pool)
        .await?;
        self.hydrate_speakers(rows).await
    }

    pub async fn create_session(&self, session: &NewSession<'_>) -> Result<SessionId> {
        let mut tx = self.pool.begin().await?;
        let rec = sqlx::query(
            "INSERT INTO sessions (title, abstract, starts_at, ends_at, track_id)
             VALUES (?, ?, ?, ?, ?) RETURNING id",
        )
        .bind(session.title)
        .bind(session.abstract_text)
        .bind(session.starts_at)
        .bind(session.ends_at)
        .bind(session.track_id.map(|id| id.0))
        .fetch_one(&mut *tx)
        .await?;
        let session_id = SessionId(rec.get::<i64, _>(0));

        for speaker_id in session.speaker_ids {
            sqlx::query(
                "INSERT OR IGNORE INTO session_speakers (session_id, speaker_id) VALUES (?, ?)",
            )
            .bind(session_id.0)
            .bind(speaker_id.0)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(session_id)
    }

    /// Replaces every column and the speaker list. Returns `false` when the
    /// session does not exist.
    pub async fn update_session(
        &self,
        session_id: SessionId,
        session: &NewSession<'_>,
    ) -> Result<bool> {
        let mut tx = self.pool.begin().await?;
        let updated = sqlx::query(
            "UPDATE sessions SET title = ?, abstract = ?, starts_at = ?, ends_at = ?, track_id = ?
             WHERE id = ?",
        )
        .bind(session.title)
        .bind(session.abstract_text)
        .bind(session.starts_at)
        .bind(session.ends_at)
        .bind(session.track_id.map(|id| id.0))
        .bind(session_id.0)
        .execute(&mut *tx)
        .await?
        .rows_affected();
        if updated == 0 {
            return Ok(false);
        }

        sqlx::query("DELETE FROM session_speakers WHERE session_id = ?")
            .bind(session_id.0)
            .execute(&mut *tx)
            .await?;
        for speaker_id in session.speaker_ids {
            sqlx::query(
                "INSERT OR IGNORE INTO session_speakers (session_id, speaker_id) VALUES (?, ?)",
            )
            .bind(session_id.0)
            .bind(speaker_id.0)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(true)
    }

    pub async fn delete_session(&self, session_id: SessionId) -> Result<bool> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM session_speakers WHERE session_id = ?")
            .bind(session_id.0)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM session_attendees WHERE session_id = ?")
            .bind(session_id.0)
            .execute(&mut *tx)
            .await?;
        let deleted = sqlx::query("DELETE FROM sessions WHERE id = ?")
            .bind(session_id.0)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        tx.commit().await?;
        Ok(deleted > 0)
    }

    pub async fn session_exists(&self, session_id: SessionId) -> Result<bool> {
        let row = sqlx::query("SELECT 1 FROM sessions WHERE id = ?")
            .bind(session_id.0)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }

    pub async fn list_sessions(&self) -> Result<Vec<StoredSession>> {
        let rows = sqlx::query(&format!("{SESSION_COLUMNS} {SESSION_ORDER}"))
            .fetch_all(&self.pool)
            .await?;
        self.hydrate_sessions(rows).await
    }

    pub async fn load_session(&self, session_id: SessionId) -> Result<Option<StoredSession>> {
        let row = sqlx::query(&format!("{SESSION_COLUMNS} WHERE s.id = ?"))
            .bind(session_id.0)
            .fetch_optional(&self.pool)
            .await?;
        let Some(row) = row else {
            return Ok(None);
        };
        Ok(self.hydrate_sessions(vec![row]).await?.pop())
    }

    pub async fn list_sessions_for_attendee(
        &self,
        attendee_id: AttendeeId,
    ) -> Result<Vec<StoredSession>> {
        let rows = sqlx::query(&format!(
            "{SESSION_COLUMNS}
             INNER JOIN session_attendees sa ON sa.session_id = s.id
             WHERE sa.attendee_id = ?
             {SESSION_ORDER}"
        ))
        .bind(attendee_id.0)
        .fetch_all(&self.pool)
        .await?;
        self.hydrate_sessions(rows).await
    }

    pub async fn search_sessions(&self, term: &str) -> Result<Vec<StoredSession>> {
        let pattern = like_pattern(term);
        let rows = sqlx::query(&format!(
            "{SESSION_COLUMNS}
             WHERE lower(s.title) LIKE ?1 ESCAPE '\\' OR lower(s.abstract) LIKE ?1 ESCAPE '\\'
             {SESSION_ORDER}"
        ))
        .bind(pattern)
        .fetch_all(&self.pool)
        .await?;
        self.hydrate_sessions(rows).await
    }

    /// Inserts the attendee unless the user name is already taken, in which
    /// case `None` is returned and nothing is written.
    pub async fn create_attendee(&self, attendee: &NewAttendee<'_>) -> Result<Option<AttendeeId>> {
        let rec = sqlx::query(
            "INSERT INTO attendees (user_name, first_name, last_name, email_address)
             VALUES (?, ?, ?, ?)
             ON CONFLICT(user_name) DO NOTHING
             RETURNING id",
        )
        .bind(attendee.user_name)
        .bind(attendee.first_name)
        .bind(attendee.last_name)
        .bind(attendee.email_address)
        .fetch_optional(&self.pool)
        .await?;
        Ok(rec.map(|r| AttendeeId(r.get::<i64, _>(0))))
    }

    pub async fn attendee_id_for_user_name(&self, user_name: &str) -> Result<Option<AttendeeId>> {
        let row = sqlx::query("SELECT id FROM attendees WHERE user_name = ?")
            .bind(user_name)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|r| AttendeeId(r.get::<i64, _>(0))))
    }

    pub async fn load_attendee(&self, user_name: &str) -> Result<Option<StoredAttendee>> {
        let row = sqlx::query(
            "SELECT id, user_name, first_name, last_name, email_address
             FROM attendees WHERE user_name = ?",
        )
        .bind(user_name)
        .fetch_optional(&self.pool)
        .await?;
        let Some(row) = row else {
            return Ok(None);
        };

        let attendee_id = AttendeeId(row.get::<i64, _>(0));
        let sessions = sqlx::query(
            "SELECT s.id, s.title, s.starts_at
             FROM session_attendees sa
             INNER JOIN sessions s ON s.id = sa.session_id
             WHERE sa.attendee_id = ?
             ORDER BY s.starts_at IS NULL, s.starts_at ASC, s.id ASC",
        )
        .bind(attendee_id.0)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(|r| session_ref_from_row(&r, 0))
        .collect();

        Ok(Some(StoredAttendee {
            attendee_id,
            user_name: row.get::<String, _>(1),
            first_name: row.get::<String, _>(2),
            last_name: row.get::<String, _>(3),
            email_address: row.get::<String, _>(4),
            sessions,
        }))
    }

    /// Returns `true` when the pair was newly recorded.
    pub async fn add_attendee_session(
        &self,
        attendee_id: AttendeeId,
        session_id: SessionId,
    ) -> Result<bool> {
        let inserted = sqlx::query(
            "INSERT OR IGNORE INTO session_attendees (session_id, attendee_id) VALUES (?, ?)",
        )
        .bind(session_id.0)
        .bind(attendee_id.0)
        .execute(&self.pool)
        .await?
        .rows_affected();
        Ok(inserted > 0)
    }

    /// Returns `true` when an existing pair was deleted.
    pub async fn remove_attendee_session(
        &self,
        attendee_id: AttendeeId,
        session_id: SessionId,
    ) -> Result<bool> {
        let deleted =
            sqlx::query("DELETE FROM session_attendees WHERE session_id = ? AND attendee_id = ?")
                .bind(session_id.0)
                .bind(attendee_id.0)
                .execute(&self.pool)
                .await?
                .rows_affected();
        Ok(deleted > 0)
    }

    async fn hydrate_sessions(&self, rows: Vec<SqliteRow>) -> Result<Vec<StoredSession>> {
        let mut sessions: Vec<StoredSession> = rows
            .into_iter()
            .map(|r| StoredSession {
                session_id: SessionId(r.get::<i64, _>(0)),
                title: r.get::<String, _>(1),
                abstract_text: r.get::<String, _>(2),
                starts_at: r.get::<Option<DateTime<Utc>>, _>(3),
                ends_at: r.get::<Option<DateTime<Utc>>, _>(4),
                track: r
                    .get::<Option<i64>, _>(5)
                    .map(|id| (TrackId(id), r.get::<Option<String>, _>(6).unwrap_or_default())),
                speakers: Vec::new(),
            })
            .collect();
        if sessions.is_empty() {
            return Ok(sessions);
        }

        let mut query = QueryBuilder::<Sqlite>::new(
            "SELECT ss.session_id, sp.id, sp.name
             FROM session_speakers ss
             INNER JOIN speakers sp ON sp.id = ss.speaker_id
             WHERE ss.session_id IN (",
        );
        let mut ids = query.separated(", ");
        for session in &sessions {
            ids.push_bind(session.session_id.0);
        }
        ids.push_unseparated(") ORDER BY lower(sp.name) ASC, sp.id ASC");
        let speaker_rows = query.build().fetch_all(&self.pool).await?;

        let mut by_session: HashMap<SessionId, Vec<(SpeakerId, String)>> = HashMap::new();
        for r in speaker_rows {
            by_session
                .entry(SessionId(r.get::<i64, _>(0)))
                .or_default()
                .push((SpeakerId(r.get::<i64, _>(1)), r.get::<String, _>(2)));
        }
        for session in &mut sessions {
            session.speakers = by_session.remove(&session.session_id).unwrap_or_default();
        }
        Ok(sessions)
    }

    async fn hydrate_speakers(&self, rows: Vec<SqliteRow>) -> Result<Vec<StoredSpeaker>> {
        let mut speakers: Vec<StoredSpeaker> = rows
            .into_iter()
            .map(|r| StoredSpeaker {
                speaker_id: SpeakerId(r.get::<i64, _>(0)),
                name: r.get::<String, _>(1),
                bio: r.get::<String, _>(2),
                web_site: r.get::<Option<String>, _>(3),
                sessions: Vec::new(),
            })
            .collect();
        if speakers.is_empty() {
            return Ok(speakers);
        }

        let mut query = QueryBuilder::<Sqlite>::new(
            "SELECT ss.speaker_id, s.id, s.title, s.starts_at
             FROM session_speakers ss
             INNER JOIN sessions s ON s.id = ss.session_id
             WHERE ss.speaker_id IN (",
        );
        let mut ids = query.separated(", ");
        for speaker in &speakers {
            ids.push_bind(speaker.speaker_id.0);
        }
        ids.push_unseparated(") ORDER BY s.starts_at IS NULL, s.starts_at ASC, s.id ASC");
        let session_rows = query.build().fetch_all(&self.pool).await?;

        let mut by_speaker: HashMap<SpeakerId, Vec<StoredSessionRef>> = HashMap::new();
        for r in session_rows {
            by_speaker
                .entry(SpeakerId(r.get::<i64, _>(0)))
                .or_default()
                .push(session_ref_from_row(&r, 1));
        }
        for speaker in &mut speakers {
            speaker.sessions = by_speaker.remove(&speaker.speaker_id).unwrap_or_default();
        }
        Ok(speakers)
    }
}

fn session_ref_from_row(row: &SqliteRow, offset: usize) -> StoredSessionRef {
    StoredSessionRef {
        session_id: SessionId(row.get::<i64, _>(offset)),
        title: row.get::<String, _>(offset + 1),
        starts_at: row.get::<Option<DateTime<Utc>>, _>(offset + 2),
    }
}

/// SQLite `lower()` folds ASCII only, so the term is folded the same way.
fn like_pattern(term: &str) -> String {
    let escaped = term
        .trim()
        .to_ascii_lowercase()
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

fn ensure_sqlite_parent_dir_exists(database_url: &str) -> Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };

    let Some(parent) = path.parent() else {
        return Ok(());
    };

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })?;

    Ok(())
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if database_url.starts_with("sqlite::memory:") || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
