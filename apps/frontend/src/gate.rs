use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use client_core::GateDecision;
use tracing::warn;

use crate::{app_state::AppState, error::PageError, identity::CallerIdentity};

/// Sends signed-in callers without an attendee record to the registration
/// page. A failed lookup fails the request.
pub(crate) async fn require_registration(
    State(state): State<Arc<AppState>>,
    caller: CallerIdentity,
    request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_owned();
    match state
        .gate
        .check(state.api.as_ref(), caller.user_name(), &path)
        .await
    {
        Ok(GateDecision::Allow) => next.run(request).await,
        Ok(GateDecision::RedirectToRegistration(target)) => Redirect::to(&target).into_response(),
        Err(error) => {
            warn!(%path, %error, "attendee lookup failed during sign-up check");
            PageError::Upstream(error).into_response()
        }
    }
}
