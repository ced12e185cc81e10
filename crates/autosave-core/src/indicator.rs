//! What a save indicator should show for a given snapshot.
//!
//! Idle renders nothing. The other states map to a spinner, a confirmation
//! with a relative timestamp, and the captured error text.

use std::fmt;

use chrono::{DateTime, Utc};

use crate::session::SaveSnapshot;
use crate::status::SaveStatus;

const FALLBACK_ERROR: &str = "Error saving changes";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndicatorView {
    Hidden,
    Saving,
    Saved { ago: Option<String> },
    Error { message: String },
}

impl IndicatorView {
    pub fn from_snapshot(snapshot: &SaveSnapshot, now: DateTime<Utc>) -> Self {
        match snapshot.status {
            SaveStatus::Idle => Self::Hidden,
            SaveStatus::Saving => Self::Saving,
            SaveStatus::Saved => Self::Saved {
                ago: snapshot
                    .last_saved_at
                    .map(|at| relative_time(now.signed_duration_since(at).num_seconds())),
            },
            SaveStatus::Error => Self::Error {
                message: snapshot
                    .error_message
                    .clone()
                    .unwrap_or_else(|| FALLBACK_ERROR.to_string()),
            },
        }
    }

    pub fn is_visible(&self) -> bool {
        !matches!(self, Self::Hidden)
    }
}

impl fmt::Display for IndicatorView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hidden => Ok(()),
            Self::Saving => f.write_str("Saving..."),
            Self::Saved { ago: Some(ago) } => write!(f, "Saved {ago}"),
            Self::Saved { ago: None } => f.write_str("Saved"),
            Self::Error { message } => f.write_str(message),
        }
    }
}

/// Relative-time helper: seconds -> human string.
pub fn relative_time(seconds: i64) -> String {
    let s = seconds.max(0);
    if s < 60 {
        "just now".to_string()
    } else if s < 3600 {
        let minutes = s / 60;
        format!("{minutes} {} ago", plural(minutes, "minute"))
    } else {
        let hours = s / 3600;
        format!("{hours} {} ago", plural(hours, "hour"))
    }
}

fn plural(n: i64, unit: &str) -> String {
    if n == 1 {
        unit.to_string()
    } else {
        format!("{unit}s")
    }
}
