use std::sync::Arc;

use client_core::{ConferenceApi, SignupGate};

use crate::identity::IdentityKeys;

pub(crate) struct AppState {
    pub(crate) api: Arc<dyn ConferenceApi>,
    pub(crate) gate: SignupGate,
    pub(crate) identity: IdentityKeys,
}
