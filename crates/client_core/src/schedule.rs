use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use shared::protocol::SessionResponse;

#[derive(Debug, Clone, PartialEq)]
pub struct TimeSlot {
    pub starts_at: DateTime<Utc>,
    pub sessions: Vec<SessionResponse>,
}

/// One conference day. `date` is `None` for the trailing group of sessions
/// that have no start time yet; that group has a single slot-less list.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleDay {
    pub date: Option<NaiveDate>,
    pub slots: Vec<TimeSlot>,
    pub unscheduled: Vec<SessionResponse>,
}

/// Groups sessions by UTC day, then by exact start time. Days and slots are
/// ascending; sessions inside a slot keep their input order.
pub fn group_by_slot(sessions: Vec<SessionResponse>) -> Vec<ScheduleDay> {
    let mut days: BTreeMap<NaiveDate, BTreeMap<DateTime<Utc>, Vec<SessionResponse>>> =
        BTreeMap::new();
    let mut unscheduled = Vec::new();

    for session in sessions {
        match session.starts_at {
            Some(starts_at) => days
                .entry(starts_at.date_naive())
                .or_default()
                .entry(starts_at)
                .or_default()
                .push(session),
            None => unscheduled.push(session),
        }
    }

    let mut schedule: Vec<ScheduleDay> = days
        .into_iter()
        .map(|(date, slots)| ScheduleDay {
            date: Some(date),
            slots: slots
                .into_iter()
                .map(|(starts_at, sessions)| TimeSlot {
                    starts_at,
                    sessions,
                })
                .collect(),
            unscheduled: Vec::new(),
        })
        .collect();

    if !unscheduled.is_empty() {
        schedule.push(ScheduleDay {
            date: None,
            slots: Vec::new(),
            unscheduled,
        });
    }
    schedule
}

#[cfg(test)]
#[path = "tests/schedule_tests.rs"]
mod tests;
