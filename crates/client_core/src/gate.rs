use std::collections::HashSet;

use tracing::debug;

use crate::api::{ApiClientError, ConferenceApi};

pub const REGISTRATION_PATH: &str = "/Welcome";
pub const DEFAULT_EXEMPT_PATHS: [&str; 3] =
    ["/Account/Login", "/Account/Logout", REGISTRATION_PATH];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    Allow,
    RedirectToRegistration(String),
}

/// Forces authenticated callers without an attendee record through the
/// registration page before anything else.
#[derive(Debug, Clone)]
pub struct SignupGate {
    exempt: HashSet<String>,
    registration_path: String,
}

impl Default for SignupGate {
    fn default() -> Self {
        Self::new(DEFAULT_EXEMPT_PATHS, REGISTRATION_PATH)
    }
}

impl SignupGate {
    pub fn new<I, S>(exempt_paths: I, registration_path: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let registration_path = registration_path.into();
        let mut exempt: HashSet<String> = exempt_paths
            .into_iter()
            .map(|path| canonical_path(path.as_ref()))
            .collect();
        exempt.insert(canonical_path(&registration_path));
        Self {
            exempt,
            registration_path,
        }
    }

    pub fn registration_path(&self) -> &str {
        &self.registration_path
    }

    pub fn is_exempt(&self, path: &str) -> bool {
        self.exempt.contains(&canonical_path(path))
    }

    /// Decides whether a request may proceed. Performs at most one attendee
    /// lookup and never caches the answer.
    pub async fn check(
        &self,
        api: &dyn ConferenceApi,
        caller: Option<&str>,
        path: &str,
    ) -> Result<GateDecision, ApiClientError> {
        let Some(user_name) = caller else {
            return Ok(GateDecision::Allow);
        };
        if self.is_exempt(path) {
            return Ok(GateDecision::Allow);
        }

        match api.get_attendee(user_name).await? {
            Some(_) => Ok(GateDecision::Allow),
            None => {
                debug!(%user_name, %path, "caller has no attendee record; redirecting");
                Ok(GateDecision::RedirectToRegistration(
                    self.registration_path.clone(),
                ))
            }
        }
    }
}

/// ASCII-lowercased with any trailing slash removed (except on `/`).
fn canonical_path(path: &str) -> String {
    let trimmed = path.trim();
    let trimmed = match trimmed.strip_suffix('/') {
        Some(rest) if !rest.is_empty() => rest,
        _ => trimmed,
    };
    trimmed.to_ascii_lowercase()
}

#[cfg(test)]
#[path = "tests/gate_tests.rs"]
mod tests;
