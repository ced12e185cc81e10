//! Auto-save session state: one per mounted form.
//!
//! Pure value type. The runtime controller owns one and drives it with
//! wall-clock timestamps; every operation returns the status changes it made
//! so the caller can publish them in order.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::TransitionError;
use crate::status::{self, SaveEvent, SaveStatus};

/// One observed status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChange {
    pub from: SaveStatus,
    pub to: SaveStatus,
    pub at: DateTime<Utc>,
}

/// Read-only view handed to the presentation layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveSnapshot {
    pub status: SaveStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_saved_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AutoSaveSession {
    status: SaveStatus,
    /// Set only on success; never cleared.
    last_saved_at: Option<DateTime<Utc>>,
    error_message: Option<String>,
    in_flight: bool,
}

impl AutoSaveSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> SaveStatus {
        self.status
    }

    pub fn last_saved_at(&self) -> Option<DateTime<Utc>> {
        self.last_saved_at
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn in_flight(&self) -> bool {
        self.in_flight
    }

    pub fn snapshot(&self) -> SaveSnapshot {
        SaveSnapshot {
            status: self.status,
            last_saved_at: self.last_saved_at,
            error_message: self.error_message.clone(),
        }
    }

    /// A save call is about to start.
    pub fn begin(&mut self, now: DateTime<Utc>) -> Result<Vec<StatusChange>, TransitionError> {
        let changes = self.apply(SaveEvent::Begin, now)?;
        self.in_flight = true;
        self.error_message = None;
        Ok(changes)
    }

    /// The in-flight save resolved.
    pub fn succeed(&mut self, now: DateTime<Utc>) -> Result<Vec<StatusChange>, TransitionError> {
        let changes = self.apply(SaveEvent::Succeeded, now)?;
        self.in_flight = false;
        self.last_saved_at = Some(match self.last_saved_at {
            Some(prev) if prev > now => prev,
            _ => now,
        });
        Ok(changes)
    }

    /// The in-flight save rejected.
    pub fn fail(
        &mut self,
        message: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Result<Vec<StatusChange>, TransitionError> {
        let changes = self.apply(SaveEvent::Failed, now)?;
        self.in_flight = false;
        self.error_message = Some(message.into());
        Ok(changes)
    }

    /// The saved/error display window ran out.
    pub fn display_elapsed(
        &mut self,
        now: DateTime<Utc>,
    ) -> Result<Vec<StatusChange>, TransitionError> {
        self.apply(SaveEvent::DisplayElapsed, now)
    }

    /// Debounce settled with nothing dirty.
    pub fn settle(&mut self, now: DateTime<Utc>) -> Result<Vec<StatusChange>, TransitionError> {
        self.apply(SaveEvent::Settled, now)
    }

    fn apply(
        &mut self,
        event: SaveEvent,
        now: DateTime<Utc>,
    ) -> Result<Vec<StatusChange>, TransitionError> {
        let visited = status::path(self.status, event)?;
        let mut changes = Vec::with_capacity(visited.len());
        for to in visited {
            changes.push(StatusChange {
                from: self.status,
                to,
                at: now,
            });
            self.status = to;
        }
        Ok(changes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;

    fn ts(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s)
            .expect("valid RFC3339")
            .with_timezone(&Utc)
    }

    fn t0() -> DateTime<Utc> {
        ts("2026-03-02T09:00:00Z")
    }

    #[test]
    fn new_session_is_idle_and_clean() {
        let session = AutoSaveSession::new();
        assert_eq!(session.status(), SaveStatus::Idle);
        assert!(session.last_saved_at().is_none());
        assert!(session.error_message().is_none());
        assert!(!session.in_flight());
    }

    #[test]
    fn begin_sets_in_flight_and_clears_error() {
        let mut session = AutoSaveSession::new();
        session.begin(t0()).expect("begin");
        session.fail("Network error", t0()).expect("fail");
        assert_eq!(session.error_message(), Some("Network error"));

        let changes = session.begin(t0()).expect("begin again");
        assert!(session.in_flight());
        assert!(session.error_message().is_none());
        assert_eq!(changes.len(), 2);
        assert_eq!(changes[0].to, SaveStatus::Idle);
        assert_eq!(changes[1].to, SaveStatus::Saving);
    }

    #[test]
    fn succeed_records_timestamp() {
        let mut session = AutoSaveSession::new();
        session.begin(t0()).expect("begin");
        let done = t0() + TimeDelta::milliseconds(50);
        let changes = session.succeed(done).expect("succeed");

        assert_eq!(
            changes,
            vec![StatusChange {
                from: SaveStatus::Saving,
                to: SaveStatus::Saved,
                at: done,
            }]
        );
        assert_eq!(session.last_saved_at(), Some(done));
        assert!(!session.in_flight());
    }

    #[test]
    fn last_saved_at_survives_revert_to_idle() {
        let mut session = AutoSaveSession::new();
        session.begin(t0()).expect("begin");
        session.succeed(t0()).expect("succeed");
        session
            .display_elapsed(t0() + TimeDelta::seconds(2))
            .expect("revert");

        assert_eq!(session.status(), SaveStatus::Idle);
        assert_eq!(session.last_saved_at(), Some(t0()));
    }

    #[test]
    fn last_saved_at_never_moves_backwards() {
        let mut session = AutoSaveSession::new();
        let later = t0() + TimeDelta::seconds(10);
        session.begin(later).expect("begin");
        session.succeed(later).expect("succeed");

        // Clock stepped back between saves.
        session.begin(t0()).expect("begin");
        session.succeed(t0()).expect("succeed");
        assert_eq!(session.last_saved_at(), Some(later));
    }

    #[test]
    fn failure_keeps_previous_last_saved_at() {
        let mut session = AutoSaveSession::new();
        session.begin(t0()).expect("begin");
        session.succeed(t0()).expect("succeed");
        session.begin(t0()).expect("begin");
        session.fail("boom", t0()).expect("fail");

        assert_eq!(session.status(), SaveStatus::Error);
        assert_eq!(session.last_saved_at(), Some(t0()));
    }

    #[test]
    fn illegal_transition_leaves_state_untouched() {
        let mut session = AutoSaveSession::new();
        assert!(session.succeed(t0()).is_err());
        assert_eq!(session.status(), SaveStatus::Idle);
        assert!(session.last_saved_at().is_none());
    }

    #[test]
    fn settle_from_saved_returns_to_idle() {
        let mut session = AutoSaveSession::new();
        session.begin(t0()).expect("begin");
        session.succeed(t0()).expect("succeed");
        let changes = session.settle(t0()).expect("settle");
        assert_eq!(changes.len(), 1);
        assert_eq!(session.status(), SaveStatus::Idle);
    }

    #[test]
    fn snapshot_mirrors_session() {
        let mut session = AutoSaveSession::new();
        session.begin(t0()).expect("begin");
        session.fail("offline", t0()).expect("fail");
        let snap = session.snapshot();
        assert_eq!(snap.status, SaveStatus::Error);
        assert_eq!(snap.error_message.as_deref(), Some("offline"));
        assert!(snap.last_saved_at.is_none());

        let json = serde_json::to_value(&snap).expect("serialize");
        assert_eq!(json["status"], "error");
        assert!(json.get("last_saved_at").is_none());
    }
}
