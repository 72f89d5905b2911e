use serde::{Deserialize, Serialize};
use shared::{
    protocol::{AttendeeRequest, AttendeeResponse},
    validation::{validate_attendee, FieldError},
};
use thiserror::Error;
use tracing::{info, warn};

use crate::api::{ApiClientError, ConferenceApi};

/// Fields the caller types in. The user name always comes from the
/// authenticated identity.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegistrationForm {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email_address: String,
}

#[derive(Debug, Error)]
pub enum RegistrationError {
    #[error("registration form has {} invalid field(s)", .0.len())]
    Invalid(Vec<FieldError>),
    #[error("an attendee is already registered under this user name")]
    AlreadyRegistered,
    #[error(transparent)]
    Api(#[from] ApiClientError),
}

pub async fn register(
    api: &dyn ConferenceApi,
    user_name: &str,
    form: &RegistrationForm,
) -> Result<AttendeeResponse, RegistrationError> {
    let request = validate_attendee(&AttendeeRequest {
        user_name: user_name.to_string(),
        first_name: form.first_name.clone(),
        last_name: form.last_name.clone(),
        email_address: form.email_address.clone(),
    })
    .map_err(RegistrationError::Invalid)?;

    match api.create_attendee(&request).await {
        Ok(attendee) => {
            info!(user_name = %attendee.user_name, attendee_id = %attendee.attendee_id, "attendee registered");
            Ok(attendee)
        }
        Err(err) if err.is_conflict() => {
            warn!(%user_name, "duplicate registration rejected");
            Err(RegistrationError::AlreadyRegistered)
        }
        Err(err) => Err(err.into()),
    }
}

#[cfg(test)]
#[path = "tests/registration_tests.rs"]
mod tests;
