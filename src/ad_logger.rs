use crate::cue_point::CuePoint;
use chrono::Local;
use serde::Serialize;
use std::collections::VecDeque;

const MAX_ATTEMPTS: usize = 50;

/// Record of one ad lifecycle step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdAttempt {
    /// Timestamp in "MM-DD-YY HH:MM:SS" format.
    pub t: String,
    /// Break the ad belongs to.
    pub cue: CuePoint,
    /// Ad tag.
    pub ad: String,
    /// What happened (e.g. "started", "completed", "error:retriable").
    pub outcome: String,
}

/// In-memory history of ad attempts for the current session.
///
/// Keeps the most recent `MAX_ATTEMPTS` entries, oldest discarded.
#[derive(Debug, Clone, Default)]
pub struct AdAttemptLog {
    attempts: VecDeque<AdAttempt>,
}

impl AdAttemptLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an attempt at the current local time.
    pub fn log(&mut self, cue: CuePoint, ad: &str, outcome: &str) {
        let t = Local::now().format("%m-%d-%y %H:%M:%S").to_string();
        self.log_at(cue, ad, outcome, &t);
    }

    /// Record an attempt with an explicit timestamp (for testing).
    pub fn log_at(&mut self, cue: CuePoint, ad: &str, outcome: &str, t: &str) {
        self.attempts.push_back(AdAttempt {
            t: t.to_string(),
            cue,
            ad: ad.to_string(),
            outcome: outcome.to_string(),
        });
        while self.attempts.len() > MAX_ATTEMPTS {
            self.attempts.pop_front();
        }
    }

    pub fn attempts(&self) -> impl Iterator<Item = &AdAttempt> + '_ {
        self.attempts.iter()
    }

    /// Attempts that ended in an error.
    pub fn failures(&self) -> impl Iterator<Item = &AdAttempt> + '_ {
        self.attempts.iter().filter(|a| a.outcome.starts_with("error"))
    }

    pub fn len(&self) -> usize {
        self.attempts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attempts.is_empty()
    }

    pub fn clear(&mut self) {
        self.attempts.clear();
    }
}
