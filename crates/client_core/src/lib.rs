//! Front-end side of the conference planner: the back-end collaborator
//! contract, its HTTP implementation, and the sign-up gate and personal
//! agenda workflow built on top of it.

pub mod agenda;
pub mod api;
pub mod gate;
pub mod http;
pub mod registration;
pub mod schedule;

pub use agenda::{add_session, membership, read_agenda, registered_ids, remove_session};
pub use api::{ApiClientError, ConferenceApi};
pub use gate::{GateDecision, SignupGate, DEFAULT_EXEMPT_PATHS, REGISTRATION_PATH};
pub use http::{HttpConferenceApi, DEFAULT_REQUEST_TIMEOUT};
pub use registration::{register, RegistrationError, RegistrationForm};
pub use schedule::{group_by_slot, ScheduleDay, TimeSlot};

#[cfg(test)]
#[path = "tests/fake_api.rs"]
mod fake_api;

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
