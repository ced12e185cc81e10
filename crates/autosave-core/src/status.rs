//! Save status lifecycle: the four states and their legal transitions.
//!
//! ```text
//!   idle ──Begin──▶ saving ──Succeeded──▶ saved ──DisplayElapsed──▶ idle
//!                      │                    │
//!                      └───Failed──▶ error ─┴──DisplayElapsed──▶ idle
//! ```
//!
//! `saved` and `error` re-enter `saving` only through `idle`; [`path`]
//! reports that implicit visit so observers see it exactly once.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, TransitionError};

/// Default debounce before a triggered save runs (milliseconds).
pub const DEFAULT_DEBOUNCE_MS: u64 = 2_000;

/// How long `saved` stays visible before reverting to `idle` (milliseconds).
pub const SAVED_DISPLAY_MS: u64 = 2_000;

/// How long `error` stays visible before reverting to `idle` (milliseconds).
pub const ERROR_DISPLAY_MS: u64 = 5_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SaveStatus {
    #[default]
    Idle,
    Saving,
    Saved,
    Error,
}

impl SaveStatus {
    pub const ALL: [Self; 4] = [Self::Idle, Self::Saving, Self::Saved, Self::Error];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Saving => "saving",
            Self::Saved => "saved",
            Self::Error => "error",
        }
    }

    /// `saved` and `error` are transient display states.
    pub fn reverts_to_idle(self) -> bool {
        matches!(self, Self::Saved | Self::Error)
    }
}

impl fmt::Display for SaveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SaveStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "idle" => Ok(Self::Idle),
            "saving" => Ok(Self::Saving),
            "saved" => Ok(Self::Saved),
            "error" => Ok(Self::Error),
            _ => Err(CoreError::UnknownStatus(s.to_string())),
        }
    }
}

/// Inputs that move the lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SaveEvent {
    /// Debounce settled (or a forced save) with a dirty payload.
    Begin,
    /// The save operation resolved.
    Succeeded,
    /// The save operation rejected or timed out.
    Failed,
    /// The saved/error display duration ran out with no new trigger.
    DisplayElapsed,
    /// Debounce settled but nothing was dirty.
    Settled,
}

/// Apply `event` to `status`, returning the resulting status.
pub fn transition(status: SaveStatus, event: SaveEvent) -> Result<SaveStatus, TransitionError> {
    path(status, event).map(|visited| visited.last().copied().unwrap_or(status))
}

/// Every status visited when applying `event` to `status`, in order.
///
/// The re-entrant `saved|error → saving` move reports `[Idle, Saving]`.
/// A `Settled` event while already idle visits nothing.
pub fn path(status: SaveStatus, event: SaveEvent) -> Result<Vec<SaveStatus>, TransitionError> {
    use SaveEvent as E;
    use SaveStatus as S;

    let visited = match (status, event) {
        (S::Idle, E::Begin) => vec![S::Saving],
        (S::Saved | S::Error, E::Begin) => vec![S::Idle, S::Saving],
        (S::Saving, E::Succeeded) => vec![S::Saved],
        (S::Saving, E::Failed) => vec![S::Error],
        (S::Saved | S::Error, E::DisplayElapsed) => vec![S::Idle],
        (S::Idle, E::Settled) => Vec::new(),
        (S::Saved | S::Error, E::Settled) => vec![S::Idle],
        (from, event) => return Err(TransitionError { from, event }),
    };
    Ok(visited)
}
