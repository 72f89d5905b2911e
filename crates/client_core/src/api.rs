use async_trait::async_trait;
use reqwest::StatusCode;
use shared::{
    domain::{SessionId, SpeakerId},
    error::{ApiError, ApiException, ErrorCode},
    protocol::{AttendeeRequest, AttendeeResponse, SearchResult, SessionResponse, SpeakerResponse},
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiClientError {
    #[error("invalid api url: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("api url '{0}' cannot be used as a base url")]
    NotABaseUrl(String),
    #[error("request to conference api failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("conference api answered {status}: {source}")]
    Rejected {
        status: StatusCode,
        #[source]
        source: ApiException,
    },
}

impl ApiClientError {
    pub fn rejected(status: StatusCode, error: ApiError) -> Self {
        Self::Rejected {
            status,
            source: error.into(),
        }
    }

    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            Self::Rejected { source, .. } => Some(source.code),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.code() == Some(ErrorCode::NotFound)
    }

    pub fn is_conflict(&self) -> bool {
        self.code() == Some(ErrorCode::Conflict)
    }
}

/// Operations the front end consumes from the conference back end.
#[async_trait]
pub trait ConferenceApi: Send + Sync {
    async fn create_attendee(
        &self,
        attendee: &AttendeeRequest,
    ) -> Result<AttendeeResponse, ApiClientError>;

    /// `Ok(None)` when no attendee is registered under `user_name`.
    async fn get_attendee(&self, user_name: &str)
        -> Result<Option<AttendeeResponse>, ApiClientError>;

    async fn list_sessions(&self) -> Result<Vec<SessionResponse>, ApiClientError>;

    async fn get_session(
        &self,
        session_id: SessionId,
    ) -> Result<Option<SessionResponse>, ApiClientError>;

    async fn list_speakers(&self) -> Result<Vec<SpeakerResponse>, ApiClientError>;

    async fn get_speaker(
        &self,
        speaker_id: SpeakerId,
    ) -> Result<Option<SpeakerResponse>, ApiClientError>;

    async fn search(&self, query: &str) -> Result<Vec<SearchResult>, ApiClientError>;

    async fn list_attendee_sessions(
        &self,
        user_name: &str,
    ) -> Result<Vec<SessionResponse>, ApiClientError>;

    async fn add_attendee_session(
        &self,
        user_name: &str,
        session_id: SessionId,
    ) -> Result<(), ApiClientError>;

    async fn remove_attendee_session(
        &self,
        user_name: &str,
        session_id: SessionId,
    ) -> Result<(), ApiClientError>;
}
