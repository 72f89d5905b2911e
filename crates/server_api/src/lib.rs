use shared::{
    domain::{AttendeeId, SessionId, SpeakerId},
    error::{ApiError, ErrorCode},
    protocol::{
        AttendeeRequest, AttendeeResponse, SearchResult, SessionRequest, SessionResponse,
        SessionSummary, SpeakerResponse, SpeakerSummary, TrackSummary,
    },
    validation::validate_attendee,
};
use storage::{
    NewAttendee, NewSession, Storage, StoredAttendee, StoredSession, StoredSessionRef,
    StoredSpeaker,
};
use tracing::{debug, info};

pub const MAX_SEARCH_CHARS: usize = 100;

#[derive(Clone)]
pub struct ApiContext {
    pub storage: Storage,
}

pub async fn list_sessions(ctx: &ApiContext) -> Result<Vec<SessionResponse>, ApiError> {
    let sessions = ctx.storage.list_sessions().await.map_err(internal)?;
    Ok(sessions.into_iter().map(session_response).collect())
}

pub async fn get_session(
    ctx: &ApiContext,
    session_id: SessionId,
) -> Result<SessionResponse, ApiError> {
    ctx.storage
        .load_session(session_id)
        .await
        .map_err(internal)?
        .map(session_response)
        .ok_or_else(|| ApiError::not_found("session not found"))
}

pub async fn create_session(
    ctx: &ApiContext,
    request: &SessionRequest,
) -> Result<SessionResponse, ApiError> {
    ensure_valid_session_request(ctx, request).await?;
    let session_id = ctx
        .storage
        .create_session(&new_session(request))
        .await
        .map_err(internal)?;
    info!(%session_id, title = %request.title, "session created");
    get_session(ctx, session_id).await
}

pub async fn update_session(
    ctx: &ApiContext,
    session_id: SessionId,
    request: &SessionRequest,
) -> Result<SessionResponse, ApiError> {
    ensure_valid_session_request(ctx, request).await?;
    let updated = ctx
        .storage
        .update_session(session_id, &new_session(request))
        .await
        .map_err(internal)?;
    if !updated {
        return Err(ApiError::not_found("session not found"));
    }
    info!(%session_id, "session updated");
    get_session(ctx, session_id).await
}

pub async fn delete_session(ctx: &ApiContext, session_id: SessionId) -> Result<(), ApiError> {
    let deleted = ctx
        .storage
        .delete_session(session_id)
        .await
        .map_err(internal)?;
    if !deleted {
        return Err(ApiError::not_found("session not found"));
    }
    info!(%session_id, "session deleted");
    Ok(())
}

pub async fn list_speakers(ctx: &ApiContext) -> Result<Vec<SpeakerResponse>, ApiError> {
    let speakers = ctx.storage.list_speakers().await.map_err(internal)?;
    Ok(speakers.into_iter().map(speaker_response).collect())
}

pub async fn get_speaker(
    ctx: &ApiContext,
    speaker_id: SpeakerId,
) -> Result<SpeakerResponse, ApiError> {
    ctx.storage
        .load_speaker(speaker_id)
        .await
        .map_err(internal)?
        .map(speaker_response)
        .ok_or_else(|| ApiError::not_found("speaker not found"))
}

pub async fn get_attendee(ctx: &ApiContext, user_name: &str) -> Result<AttendeeResponse, ApiError> {
    ctx.storage
        .load_attendee(user_name)
        .await
        .map_err(internal)?
        .map(attendee_response)
        .ok_or_else(|| ApiError::not_found("attendee not found"))
}

pub async fn create_attendee(
    ctx: &ApiContext,
    request: &AttendeeRequest,
) -> Result<AttendeeResponse, ApiError> {
    let request = validate_attendee(request).map_err(|errors| {
        let message = errors
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ");
        ApiError::validation(message)
    })?;

    let created = ctx
        .storage
        .create_attendee(&NewAttendee {
            user_name: &request.user_name,
            first_name: &request.first_name,
            last_name: &request.last_name,
            email_address: &request.email_address,
        })
        .await
        .map_err(internal)?;
    let Some(attendee_id) = created else {
        return Err(ApiError::new(
            ErrorCode::Conflict,
            format!("attendee '{}' already exists", request.user_name),
        ));
    };

    info!(%attendee_id, user_name = %request.user_name, "attendee registered");
    get_attendee(ctx, &request.user_name).await
}

pub async fn add_session_to_attendee(
    ctx: &ApiContext,
    user_name: &str,
    session_id: SessionId,
) -> Result<(), ApiError> {
    let attendee_id = ensure_attendee_and_session(ctx, user_name, session_id).await?;
    let inserted = ctx
        .storage
        .add_attendee_session(attendee_id, session_id)
        .await
        .map_err(internal)?;
    debug!(%user_name, %session_id, inserted, "agenda add");
    Ok(())
}

pub async fn remove_session_from_attendee(
    ctx: &ApiContext,
    user_name: &str,
    session_id: SessionId,
) -> Result<(), ApiError> {
    let attendee_id = ensure_attendee_and_session(ctx, user_name, session_id).await?;
    let deleted = ctx
        .storage
        .remove_attendee_session(attendee_id, session_id)
        .await
        .map_err(internal)?;
    debug!(%user_name, %session_id, deleted, "agenda remove");
    Ok(())
}

pub async fn list_attendee_sessions(
    ctx: &ApiContext,
    user_name: &str,
) -> Result<Vec<SessionResponse>, ApiError> {
    let attendee_id = ensure_attendee(ctx, user_name).await?;
    let sessions = ctx
        .storage
        .list_sessions_for_attendee(attendee_id)
        .await
        .map_err(internal)?;
    Ok(sessions.into_iter().map(session_response).collect())
}

pub async fn search(ctx: &ApiContext, query: &str) -> Result<Vec<SearchResult>, ApiError> {
    let query = query.trim();
    if query.is_empty() {
        return Err(ApiError::validation("search query cannot be empty"));
    }
    if query.chars().count() > MAX_SEARCH_CHARS {
        return Err(ApiError::validation(format!(
            "search query must be at most {MAX_SEARCH_CHARS} characters"
        )));
    }

    let sessions = ctx.storage.search_sessions(query).await.map_err(internal)?;
    let speakers = ctx.storage.search_speakers(query).await.map_err(internal)?;
    Ok(sessions
        .into_iter()
        .map(|session| SearchResult::Session(session_response(session)))
        .chain(
            speakers
                .into_iter()
                .map(|speaker| SearchResult::Speaker(speaker_response(speaker))),
        )
        .collect())
}

async fn ensure_valid_session_request(
    ctx: &ApiContext,
    request: &SessionRequest,
) -> Result<(), ApiError> {
    if request.title.trim().is_empty() {
        return Err(ApiError::validation("session title cannot be empty"));
    }
    if let (Some(starts_at), Some(ends_at)) = (request.starts_at, request.ends_at) {
        if ends_at < starts_at {
            return Err(ApiError::validation("session cannot end before it starts"));
        }
    }
    if let Some(track_id) = request.track_id {
        if !ctx.storage.track_exists(track_id).await.map_err(internal)? {
            return Err(ApiError::validation(format!("unknown track {track_id}")));
        }
    }
    for speaker_id in &request.speaker_ids {
        if !ctx
            .storage
            .speaker_exists(*speaker_id)
            .await
            .map_err(internal)?
        {
            return Err(ApiError::validation(format!("unknown speaker {speaker_id}")));
        }
    }
    Ok(())
}

async fn ensure_attendee(ctx: &ApiContext, user_name: &str) -> Result<AttendeeId, ApiError> {
    ctx.storage
        .attendee_id_for_user_name(user_name)
        .await
        .map_err(internal)?
        .ok_or_else(|| ApiError::not_found("attendee not found"))
}

async fn ensure_attendee_and_session(
    ctx: &ApiContext,
    user_name: &str,
    session_id: SessionId,
) -> Result<AttendeeId, ApiError> {
    let attendee_id = ensure_attendee(ctx, user_name).await?;
    if !ctx
        .storage
        .session_exists(session_id)
        .await
        .map_err(internal)?
    {
        return Err(ApiError::not_found("session not found"));
    }
    Ok(attendee_id)
}

fn new_session(request: &SessionRequest) -> NewSession<'_> {
    NewSession {
        title: request.title.trim(),
        abstract_text: request.abstract_text.trim(),
        starts_at: request.starts_at,
        ends_at: request.ends_at,
        track_id: request.track_id,
        speaker_ids: &request.speaker_ids,
    }
}

fn session_response(session: StoredSession) -> SessionResponse {
    SessionResponse {
        session_id: session.session_id,
        title: session.title,
        abstract_text: session.abstract_text,
        starts_at: session.starts_at,
        ends_at: session.ends_at,
        track: session
            .track
            .map(|(track_id, name)| TrackSummary { track_id, name }),
        speakers: session
            .speakers
            .into_iter()
            .map(|(speaker_id, name)| SpeakerSummary { speaker_id, name })
            .collect(),
    }
}

fn speaker_response(speaker: StoredSpeaker) -> SpeakerResponse {
    SpeakerResponse {
        speaker_id: speaker.speaker_id,
        name: speaker.name,
        bio: speaker.bio,
        web_site: speaker.web_site,
        sessions: speaker.sessions.into_iter().map(session_summary).collect(),
    }
}

fn attendee_response(attendee: StoredAttendee) -> AttendeeResponse {
    AttendeeResponse {
        attendee_id: attendee.attendee_id,
        user_name: attendee.user_name,
        first_name: attendee.first_name,
        last_name: attendee.last_name,
        email_address: attendee.email_address,
        sessions: attendee.sessions.into_iter().map(session_summary).collect(),
    }
}

fn session_summary(session: StoredSessionRef) -> SessionSummary {
    SessionSummary {
        session_id: session.session_id,
        title: session.title,
        starts_at: session.starts_at,
    }
}

fn internal(err: anyhow::Error) -> ApiError {
    ApiError::new(ErrorCode::Internal, err.to_string())
}

#[cfg(test)]
#[path = "tests/mod_tests.rs"]
mod tests;
