use std::collections::HashSet;

use shared::{
    domain::{AgendaMembership, SessionId},
    protocol::{AttendeeResponse, SessionResponse},
};
use tracing::info;

use crate::api::{ApiClientError, ConferenceApi};

/// Sessions the attendee registered for, in the order of the full session
/// list. An unknown attendee has an empty agenda.
pub async fn read_agenda(
    api: &dyn ConferenceApi,
    user_name: &str,
) -> Result<Vec<SessionResponse>, ApiClientError> {
    let (sessions, attendee) =
        futures::try_join!(api.list_sessions(), api.get_attendee(user_name))?;

    let Some(attendee) = attendee else {
        return Ok(Vec::new());
    };
    let registered = registered_ids(&attendee);
    Ok(sessions
        .into_iter()
        .filter(|session| registered.contains(&session.session_id))
        .collect())
}

pub fn registered_ids(attendee: &AttendeeResponse) -> HashSet<SessionId> {
    attendee.session_ids().collect()
}

pub fn membership(session_id: SessionId, registered: &HashSet<SessionId>) -> AgendaMembership {
    AgendaMembership::from_registered(registered.contains(&session_id))
}

pub async fn add_session(
    api: &dyn ConferenceApi,
    user_name: &str,
    session_id: SessionId,
) -> Result<(), ApiClientError> {
    api.add_attendee_session(user_name, session_id).await?;
    info!(%user_name, %session_id, "session added to agenda");
    Ok(())
}

pub async fn remove_session(
    api: &dyn ConferenceApi,
    user_name: &str,
    session_id: SessionId,
) -> Result<(), ApiClientError> {
    api.remove_attendee_session(user_name, session_id).await?;
    info!(%user_name, %session_id, "session removed from agenda");
    Ok(())
}

#[cfg(test)]
#[path = "tests/agenda_tests.rs"]
mod tests;
