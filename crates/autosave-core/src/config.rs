//! Auto-save configuration surface.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::status::{DEFAULT_DEBOUNCE_MS, ERROR_DISPLAY_MS, SAVED_DISPLAY_MS};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutoSaveConfig {
    /// Quiet period after the last trigger before a save runs.
    pub debounce_ms: u64,
    /// When false, triggers only mark the payload dirty; `force_save` still works.
    pub enabled: bool,
    pub saved_display_ms: u64,
    pub error_display_ms: u64,
    /// `None` leaves a hung save in `saving` indefinitely.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub save_timeout_ms: Option<u64>,
}

impl Default for AutoSaveConfig {
    fn default() -> Self {
        Self {
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            enabled: true,
            saved_display_ms: SAVED_DISPLAY_MS,
            error_display_ms: ERROR_DISPLAY_MS,
            save_timeout_ms: None,
        }
    }
}

impl AutoSaveConfig {
    pub fn from_json_str(json: &str) -> Result<Self, CoreError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    #[must_use]
    pub fn with_debounce_ms(mut self, ms: u64) -> Self {
        self.debounce_ms = ms;
        self
    }

    #[must_use]
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    #[must_use]
    pub fn with_save_timeout_ms(mut self, ms: u64) -> Self {
        self.save_timeout_ms = Some(ms);
        self
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if self.saved_display_ms == 0 {
            return Err(CoreError::InvalidConfig(
                "saved_display_ms must be positive".into(),
            ));
        }
        if self.error_display_ms == 0 {
            return Err(CoreError::InvalidConfig(
                "error_display_ms must be positive".into(),
            ));
        }
        if self.save_timeout_ms == Some(0) {
            return Err(CoreError::InvalidConfig(
                "save_timeout_ms must be positive when set".into(),
            ));
        }
        Ok(())
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn saved_display(&self) -> Duration {
        Duration::from_millis(self.saved_display_ms)
    }

    pub fn error_display(&self) -> Duration {
        Duration::from_millis(self.error_display_ms)
    }

    pub fn save_timeout(&self) -> Option<Duration> {
        self.save_timeout_ms.map(Duration::from_millis)
    }
}
