use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use shared::{
    domain::{SessionId, SpeakerId},
    error::{ApiError, ErrorCode},
    protocol::{
        AttendeeRequest, AttendeeResponse, SearchRequest, SearchResult, SessionResponse,
        SpeakerResponse,
    },
};
use tracing::debug;
use url::Url;

use crate::api::{ApiClientError, ConferenceApi};

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Thin reqwest wrapper over the conference REST API. Every method is one
/// HTTP round trip.
#[derive(Clone)]
pub struct HttpConferenceApi {
    http: Client,
    base_url: Url,
}

impl HttpConferenceApi {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiClientError> {
        let base_url = Url::parse(base_url)?;
        if base_url.cannot_be_a_base() {
            return Err(ApiClientError::NotABaseUrl(base_url.to_string()));
        }
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }
}

#[async_trait]
impl ConferenceApi for HttpConferenceApi {
    async fn create_attendee(
        &self,
        attendee: &AttendeeRequest,
    ) -> Result<AttendeeResponse, ApiClientError> {
        let response = self
            .http
            .post(self.endpoint(&["api", "attendees"]))
            .json(attendee)
            .send()
            .await?;
        decode(response).await
    }

    async fn get_attendee(
        &self,
        user_name: &str,
    ) -> Result<Option<AttendeeResponse>, ApiClientError> {
        let response = self
            .http
            .get(self.endpoint(&["api", "attendees", user_name]))
            .send()
            .await?;
        decode_optional(response).await
    }

    async fn list_sessions(&self) -> Result<Vec<SessionResponse>, ApiClientError> {
        let response = self
            .http
            .get(self.endpoint(&["api", "sessions"]))
            .send()
            .await?;
        decode(response).await
    }

    async fn get_session(
        &self,
        session_id: SessionId,
    ) -> Result<Option<SessionResponse>, ApiClientError> {
        let id = session_id.to_string();
        let response = self
            .http
            .get(self.endpoint(&["api", "sessions", &id]))
            .send()
            .await?;
        decode_optional(response).await
    }

    async fn list_speakers(&self) -> Result<Vec<SpeakerResponse>, ApiClientError> {
        let response = self
            .http
            .get(self.endpoint(&["api", "speakers"]))
            .send()
            .await?;
        decode(response).await
    }

    async fn get_speaker(
        &self,
        speaker_id: SpeakerId,
    ) -> Result<Option<SpeakerResponse>, ApiClientError> {
        let id = speaker_id.to_string();
        let response = self
            .http
            .get(self.endpoint(&["api", "speakers", &id]))
            .send()
            .await?;
        decode_optional(response).await
    }

    async fn search(&self, query: &str) -> Result<Vec<SearchResult>, ApiClientError> {
        let response = self
            .http
            .post(self.endpoint(&["api", "search"]))
            .json(&SearchRequest {
                query: query.to_string(),
            })
            .send()
            .await?;
        decode(response).await
    }

    async fn list_attendee_sessions(
        &self,
        user_name: &str,
    ) -> Result<Vec<SessionResponse>, ApiClientError> {
        let response = self
            .http
            .get(self.endpoint(&["api", "attendees", user_name, "sessions"]))
            .send()
            .await?;
        decode(response).await
    }

    async fn add_attendee_session(
        &self,
        user_name: &str,
        session_id: SessionId,
    ) -> Result<(), ApiClientError> {
        let id = session_id.to_string();
        let response = self
            .http
            .post(self.endpoint(&["api", "attendees", user_name, "session", &id]))
            .send()
            .await?;
        ensure_success(response).await.map(drop)
    }

    async fn remove_attendee_session(
        &self,
        user_name: &str,
        session_id: SessionId,
    ) -> Result<(), ApiClientError> {
        let id = session_id.to_string();
        let response = self
            .http
            .delete(self.endpoint(&["api", "attendees", user_name, "session", &id]))
            .send()
            .await?;
        ensure_success(response).await.map(drop)
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiClientError> {
    let response = ensure_success(response).await?;
    Ok(response.json().await?)
}

async fn decode_optional<T: DeserializeOwned>(
    response: Response,
) -> Result<Option<T>, ApiClientError> {
    if response.status() == StatusCode::NOT_FOUND {
        debug!(url = %response.url(), "conference api returned not found");
        return Ok(None);
    }
    decode(response).await.map(Some)
}

async fn ensure_success(response: Response) -> Result<Response, ApiClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.bytes().await.unwrap_or_default();
    let error = serde_json::from_slice::<ApiError>(&body).unwrap_or_else(|_| {
        let message = String::from_utf8_lossy(&body).trim().to_string();
        let message = if message.is_empty() {
            status.to_string()
        } else {
            message
        };
        ApiError::new(code_for_status(status), message)
    });
    Err(ApiClientError::rejected(status, error))
}

fn code_for_status(status: StatusCode) -> ErrorCode {
    match status {
        StatusCode::UNAUTHORIZED => ErrorCode::Unauthorized,
        StatusCode::FORBIDDEN => ErrorCode::Forbidden,
        StatusCode::NOT_FOUND => ErrorCode::NotFound,
        StatusCode::CONFLICT => ErrorCode::Conflict,
        status if status.is_client_error() => ErrorCode::Validation,
        _ => ErrorCode::Internal,
    }
}

#[cfg(test)]
#[path = "tests/http_tests.rs"]
mod tests;
