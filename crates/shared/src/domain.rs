use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_newtype!(AttendeeId);
id_newtype!(SessionId);
id_newtype!(SpeakerId);
id_newtype!(TrackId);

/// Whether one (attendee, session) pair is part of the attendee's agenda.
///
/// `add` on `Registered` and `remove` on `NotRegistered` leave the state
/// unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgendaMembership {
    Registered,
    NotRegistered,
}

impl AgendaMembership {
    pub fn from_registered(registered: bool) -> Self {
        if registered {
            Self::Registered
        } else {
            Self::NotRegistered
        }
    }

    #[cfg(test)]
    fn add(self) -> Self {
        Self::Registered
    }

    #[cfg(test)]
    fn remove(self) -> Self {
        Self::NotRegistered
    }

    pub fn is_registered(self) -> bool {
        matches!(self, Self::Registered)
    }
}
