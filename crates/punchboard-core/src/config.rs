//! Punchboard configuration
//!
//! Stored as TOML in `<config_dir>/punchboard/config.toml`. Every field has a
//! default, so a missing file (or a partial one) is fine.

use chrono::{FixedOffset, Local, Offset};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::analytics::DEFAULT_TOP_N;
use crate::classify::ArrivalPolicy;
use crate::error::CoreError;
use crate::paginate::DEFAULT_PAGE_SIZE;

/// Engine and display settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PunchboardConfig {
    /// Entries per ranked list on the dashboard
    pub top_n: usize,

    /// Rows per drill-down page
    pub page_size: usize,

    /// Viewer time zone as minutes east of UTC (None = machine local offset)
    pub utc_offset_minutes: Option<i32>,

    /// Late threshold and default leave shift
    pub arrival: ArrivalPolicy,
}

impl Default for PunchboardConfig {
    fn default() -> Self {
        Self {
            top_n: DEFAULT_TOP_N,
            page_size: DEFAULT_PAGE_SIZE,
            utc_offset_minutes: None,
            arrival: ArrivalPolicy::default(),
        }
    }
}

impl PunchboardConfig {
    /// `<config_dir>/punchboard/config.toml`, if the platform has a config dir
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("punchboard").join("config.toml"))
    }

    /// Load from `path`; a missing file yields defaults
    pub fn load(path: &Path) -> Result<Self, CoreError> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No config file, using defaults");
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(CoreError::FileRead {
                    path: path.to_path_buf(),
                    source: e,
                })
            }
        };

        let config: Self = toml::from_str(&content).map_err(|e| CoreError::ConfigParse {
            path: path.to_path_buf(),
            message: e.message().to_string(),
            source: e,
        })?;
        config.validate()?;

        debug!(path = %path.display(), "Config loaded");
        Ok(config)
    }

    /// Load from the default location, or defaults when there is none
    pub fn load_default() -> Result<Self, CoreError> {
        match Self::default_path() {
            Some(path) => Self::load(&path),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if self.top_n == 0 {
            return Err(CoreError::InvalidConfig {
                message: "top_n must be at least 1".to_string(),
            });
        }
        if self.page_size == 0 {
            return Err(CoreError::InvalidConfig {
                message: "page_size must be at least 1".to_string(),
            });
        }
        if self.timezone_opt().is_none() {
            return Err(CoreError::InvalidConfig {
                message: format!(
                    "utc_offset_minutes {:?} is outside +/-24h",
                    self.utc_offset_minutes
                ),
            });
        }
        if self.arrival.shift_end <= self.arrival.shift_start {
            return Err(CoreError::InvalidConfig {
                message: "arrival.shift_end must be after arrival.shift_start".to_string(),
            });
        }
        Ok(())
    }

    /// Viewer time zone used for date filtering and display
    pub fn timezone(&self) -> FixedOffset {
        self.timezone_opt()
            .unwrap_or_else(|| Local::now().offset().fix())
    }

    fn timezone_opt(&self) -> Option<FixedOffset> {
        match self.utc_offset_minutes {
            Some(minutes) => FixedOffset::east_opt(minutes.checked_mul(60)?),
            None => Some(Local::now().offset().fix()),
        }
    }
}
