use std::{
    collections::{BTreeSet, HashMap},
    sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    },
};

use async_trait::async_trait;
use reqwest::StatusCode;
use shared::{
    domain::{AttendeeId, SessionId, SpeakerId},
    error::{ApiError, ErrorCode},
    protocol::{
        AttendeeRequest, AttendeeResponse, SearchResult, SessionResponse, SessionSummary,
        SpeakerResponse,
    },
};

use crate::api::{ApiClientError, ConferenceApi};

pub(crate) fn session(id: i64, title: &str) -> SessionResponse {
    SessionResponse {
        session_id: SessionId(id),
        title: title.to_string(),
        abstract_text: String::new(),
        starts_at: None,
        ends_at: None,
        track: None,
        speakers: Vec::new(),
    }
}

#[derive(Default)]
struct FakeState {
    sessions: Vec<SessionResponse>,
    attendees: HashMap<String, (AttendeeRequest, BTreeSet<SessionId>)>,
    failing: bool,
}

/// In-memory back end that counts attendee lookups and can be switched into
/// a failure mode.
#[derive(Default)]
pub(crate) struct FakeApi {
    state: Mutex<FakeState>,
    attendee_lookups: AtomicUsize,
}

impl FakeApi {
    pub(crate) fn with_sessions(ids: impl IntoIterator<Item = i64>) -> Self {
        let api = Self::default();
        api.state.lock().expect("state").sessions = ids
            .into_iter()
            .map(|id| session(id, &format!("Session {id}")))
            .collect();
        api
    }

    pub(crate) fn with_attendee(self, user_name: &str, session_ids: &[i64]) -> Self {
        self.state.lock().expect("state").attendees.insert(
            user_name.to_string(),
            (
                AttendeeRequest {
                    user_name: user_name.to_string(),
                    first_name: "Test".into(),
                    last_name: "Attendee".into(),
                    email_address: format!("{user_name}@example.com"),
                },
                session_ids.iter().copied().map(SessionId).collect(),
            ),
        );
        self
    }

    pub(crate) fn fail(&self) {
        self.state.lock().expect("state").failing = true;
    }

    pub(crate) fn attendee_lookups(&self) -> usize {
        self.attendee_lookups.load(Ordering::SeqCst)
    }

    pub(crate) fn registered(&self, user_name: &str) -> Option<Vec<SessionId>> {
        self.state
            .lock()
            .expect("state")
            .attendees
            .get(user_name)
            .map(|(_, ids)| ids.iter().copied().collect())
    }

    fn guard(&self) -> Result<std::sync::MutexGuard<'_, FakeState>, ApiClientError> {
        let state = self.state.lock().expect("state");
        if state.failing {
            return Err(ApiClientError::rejected(
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiError::new(ErrorCode::Internal, "backend down"),
            ));
        }
        Ok(state)
    }
}

fn not_found(what: &str) -> ApiClientError {
    ApiClientError::rejected(StatusCode::NOT_FOUND, ApiError::not_found(what))
}

fn attendee_response(
    state: &FakeState,
    request: &AttendeeRequest,
    ids: &BTreeSet<SessionId>,
) -> AttendeeResponse {
    AttendeeResponse {
        attendee_id: AttendeeId(1),
        user_name: request.user_name.clone(),
        first_name: request.first_name.clone(),
        last_name: request.last_name.clone(),
        email_address: request.email_address.clone(),
        sessions: state
            .sessions
            .iter()
            .filter(|s| ids.contains(&s.session_id))
            .map(|s| SessionSummary {
                session_id: s.session_id,
                title: s.title.clone(),
                starts_at: s.starts_at,
            })
            .collect(),
    }
}

#[async_trait]
impl ConferenceApi for FakeApi {
    async fn create_attendee(
        &self,
        attendee: &AttendeeRequest,
    ) -> Result<AttendeeResponse, ApiClientError> {
        let mut state = self.guard()?;
        let key = attendee.user_name.clone();
        if state.attendees.contains_key(&key) {
            return Err(ApiClientError::rejected(
                StatusCode::CONFLICT,
                ApiError::new(ErrorCode::Conflict, "user name taken"),
            ));
        }
        state
            .attendees
            .insert(key, (attendee.clone(), BTreeSet::new()));
        Ok(attendee_response(&state, attendee, &BTreeSet::new()))
    }

    async fn get_attendee(
        &self,
        user_name: &str,
    ) -> Result<Option<AttendeeResponse>, ApiClientError> {
        self.attendee_lookups.fetch_add(1, Ordering::SeqCst);
        let state = self.guard()?;
        Ok(state
            .attendees
            .get(user_name)
            .map(|(request, ids)| attendee_response(&state, request, ids)))
    }

    async fn list_sessions(&self) -> Result<Vec<SessionResponse>, ApiClientError> {
        Ok(self.guard()?.sessions.clone())
    }

    async fn get_session(
        &self,
        session_id: SessionId,
    ) -> Result<Option<SessionResponse>, ApiClientError> {
        Ok(self
            .guard()?
            .sessions
            .iter()
            .find(|s| s.session_id == session_id)
            .cloned())
    }

    async fn list_speakers(&self) -> Result<Vec<SpeakerResponse>, ApiClientError> {
        let _state = self.guard()?;
        Ok(Vec::new())
    }

    async fn get_speaker(
        &self,
        _speaker_id: SpeakerId,
    ) -> Result<Option<SpeakerResponse>, ApiClientError> {
        let _state = self.guard()?;
        Ok(None)
    }

    async fn search(&self, query: &str) -> Result<Vec<SearchResult>, ApiClientError> {
        let needle = query.to_lowercase();
        Ok(self
            .guard()?
            .sessions
            .iter()
            .filter(|s| s.title.to_lowercase().contains(&needle))
            .cloned()
            .map(SearchResult::Session)
            .collect())
    }

    async fn list_attendee_sessions(
        &self,
        user_name: &str,
    ) -> Result<Vec<SessionResponse>, ApiClientError> {
        let state = self.guard()?;
        let (_, ids) = state
            .attendees
            .get(user_name)
            .ok_or_else(|| not_found("attendee not found"))?;
        Ok(state
            .sessions
            .iter()
            .filter(|s| ids.contains(&s.session_id))
            .cloned()
            .collect())
    }

    async fn add_attendee_session(
        &self,
        user_name: &str,
        session_id: SessionId,
    ) -> Result<(), ApiClientError> {
        let mut state = self.guard()?;
        if !state.sessions.iter().any(|s| s.session_id == session_id) {
            return Err(not_found("session not found"));
        }
        let (_, ids) = state
            .attendees
            .get_mut(user_name)
            .ok_or_else(|| not_found("attendee not found"))?;
        ids.insert(session_id);
        Ok(())
    }

    async fn remove_attendee_session(
        &self,
        user_name: &str,
        session_id: SessionId,
    ) -> Result<(), ApiClientError> {
        let mut state = self.guard()?;
        let (_, ids) = state
            .attendees
            .get_mut(user_name)
            .ok_or_else(|| not_found("attendee not found"))?;
        ids.remove(&session_id);
        Ok(())
    }
}
