use serde::{Deserialize, Serialize};

use crate::paths::StorePaths;

/// User settings stored in `config.json`. Every key is optional.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlashConfig {
    pub quiet_hours_enabled: bool,
    pub quiet_hours_start: u32,
    pub quiet_hours_end: u32,
    pub max_daily_notifications: u32,
    pub max_resurface_count: u32,
    pub interval_days: Vec<i64>,
    /// Arm a morning reminder to triage yesterday's captures.
    pub daily_reflection_enabled: bool,
}

impl Default for FlashConfig {
    fn default() -> Self {
        Self {
            quiet_hours_enabled: true,
            quiet_hours_start: 22,
            quiet_hours_end: 8,
            max_daily_notifications: 3,
            max_resurface_count: 5,
            interval_days: vec![1, 3, 7, 14, 30],
            daily_reflection_enabled: false,
        }
    }
}

impl FlashConfig {
    /// Load from `config.json`.
    /// Returns the defaults if the file is missing or unparseable.
    pub fn load(paths: &StorePaths) -> Self {
        let content = match std::fs::read_to_string(&paths.config_json) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Self::default(),
            Err(e) => {
                tracing::warn!(path = %paths.config_json.display(), error = %e, "cannot read config, using defaults");
                return Self::default();
            }
        };
        match serde_json::from_str(&content) {
            Ok(cfg) => cfg,
            Err(e) => {
                tracing::warn!(path = %paths.config_json.display(), error = %e, "invalid config, using defaults");
                Self::default()
            }
        }
    }

    /// Keys accepted by `config.json`.
    pub const KEYS: [&'static str; 7] = [
        "quiet_hours_enabled",
        "quiet_hours_start",
        "quiet_hours_end",
        "max_daily_notifications",
        "max_resurface_count",
        "interval_days",
        "daily_reflection_enabled",
    ];
}
