//! # Client Configuration
//!
//! Configuration for the ATS client: base URL, API key, request timeout,
//! and the custom-field question ids this deployment uses.
//!
//! Sources, weakest first: compiled defaults, an optional TOML file
//! (`stagetrack.toml`, or the path in `STAGETRACK_CONFIG`), environment
//! variables. The API key has no default; construction fails without one.
//!
//! Question ids identify custom fields in the remote ATS and differ per
//! deployment, which is why every one of them is overridable.

use crate::types::StagetrackError;
use serde::Deserialize;
use std::path::Path;

/// Default ATS API base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.talentwire.io/v1";

/// Default per-request timeout, in seconds. Applies uniformly to every
/// individual call; there is no aggregate query deadline.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Default config file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "stagetrack.toml";

// =============================================================================
// FIELD CONFIGURATION
// =============================================================================

/// Custom-field question ids for the ATS deployment.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FieldConfig {
    /// Text field holding the externally-visible stage name.
    pub stage_name_field: String,
    /// Date field holding the date of the last stage update.
    pub stage_date_field: String,
    /// Select field holding the active/inactive flag.
    pub active_flag_field: String,
    /// Boolean field marking subscribers.
    pub subscriber_flag_field: String,
    /// Actor id recorded on disqualifications performed by this service.
    pub disqualified_by_id: String,
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            stage_name_field: "665f3a1c8d2b4e90a1c7d312".to_string(),
            stage_date_field: "665f3a2bf04c11da8b3e5540".to_string(),
            active_flag_field: "66a81d95c3f2708b4d1e9a27".to_string(),
            subscriber_flag_field: "6671bc08ae5d3f14c2090b86".to_string(),
            disqualified_by_id: "664d20e7513a9fb8c60721d4".to_string(),
        }
    }
}

// =============================================================================
// CLIENT CONFIGURATION
// =============================================================================

/// Immutable configuration an `AtsClient` is built from.
///
/// Construct once, pass by reference; there is no global client state.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub api_key: String,
    pub timeout_secs: u64,
    pub fields: FieldConfig,
}

/// TOML file overlay. Every key is optional; absent keys keep the
/// previous value.
#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    base_url: Option<String>,
    api_key: Option<String>,
    timeout_secs: Option<u64>,
    fields: Option<FieldOverrides>,
}

#[derive(Debug, Default, Deserialize)]
struct FieldOverrides {
    stage_name_field: Option<String>,
    stage_date_field: Option<String>,
    active_flag_field: Option<String>,
    subscriber_flag_field: Option<String>,
    disqualified_by_id: Option<String>,
}

impl ClientConfig {
    /// Config with compiled defaults and the given API key.
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: api_key.into(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            fields: FieldConfig::default(),
        }
    }

    /// Load configuration from defaults, config file, and environment.
    ///
    /// The file is `STAGETRACK_CONFIG` if set, otherwise
    /// `stagetrack.toml` in the working directory if present. Environment
    /// variables win over file values.
    pub fn from_env() -> Result<Self, StagetrackError> {
        let mut config = Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: String::new(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            fields: FieldConfig::default(),
        };

        match std::env::var("STAGETRACK_CONFIG").ok() {
            Some(path) => config.apply_file(Path::new(&path))?,
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    config.apply_file(default_path)?;
                }
            }
        }

        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Overlay values from a TOML file onto this config.
    pub fn apply_file(&mut self, path: &Path) -> Result<(), StagetrackError> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            StagetrackError::Config(format!("cannot read {}: {e}", path.display()))
        })?;
        let file: FileConfig = toml::from_str(&raw).map_err(|e| {
            StagetrackError::Config(format!("cannot parse {}: {e}", path.display()))
        })?;

        if let Some(base_url) = file.base_url {
            self.base_url = base_url;
        }
        if let Some(api_key) = file.api_key {
            self.api_key = api_key;
        }
        if let Some(timeout) = file.timeout_secs {
            self.timeout_secs = timeout;
        }
        if let Some(fields) = file.fields {
            overlay(&mut self.fields.stage_name_field, fields.stage_name_field);
            overlay(&mut self.fields.stage_date_field, fields.stage_date_field);
            overlay(&mut self.fields.active_flag_field, fields.active_flag_field);
            overlay(
                &mut self.fields.subscriber_flag_field,
                fields.subscriber_flag_field,
            );
            overlay(&mut self.fields.disqualified_by_id, fields.disqualified_by_id);
        }
        Ok(())
    }

    /// Overlay values from environment variables onto this config.
    pub fn apply_env(&mut self) {
        overlay(&mut self.base_url, env_var("STAGETRACK_ATS_BASE_URL"));
        overlay(&mut self.api_key, env_var("STAGETRACK_ATS_API_KEY"));
        if let Some(timeout) = env_var("STAGETRACK_ATS_TIMEOUT_SECS").and_then(|s| s.parse().ok())
        {
            self.timeout_secs = timeout;
        }
        overlay(
            &mut self.fields.stage_name_field,
            env_var("STAGETRACK_FIELD_STAGE_NAME"),
        );
        overlay(
            &mut self.fields.stage_date_field,
            env_var("STAGETRACK_FIELD_STAGE_DATE"),
        );
        overlay(
            &mut self.fields.active_flag_field,
            env_var("STAGETRACK_FIELD_ACTIVE_FLAG"),
        );
        overlay(
            &mut self.fields.subscriber_flag_field,
            env_var("STAGETRACK_FIELD_SUBSCRIBER"),
        );
        overlay(
            &mut self.fields.disqualified_by_id,
            env_var("STAGETRACK_DISQUALIFIED_BY_ID"),
        );
    }

    /// Check the config is usable.
    pub fn validate(&self) -> Result<(), StagetrackError> {
        if self.api_key.is_empty() {
            return Err(StagetrackError::Config(
                "ATS API key is required; set STAGETRACK_ATS_API_KEY or api_key in stagetrack.toml"
                    .to_string(),
            ));
        }
        if self.timeout_secs == 0 {
            return Err(StagetrackError::Config(
                "timeout_secs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

fn overlay(slot: &mut String, value: Option<String>) {
    if let Some(v) = value.filter(|v| !v.is_empty()) {
        *slot = v;
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

// =============================================================================
// TESTS
// =============================================================================
