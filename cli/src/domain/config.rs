//! Domain types and validators for extcheck configuration.
//!
//! Pure functions only — no I/O, no async, no filesystem access.

use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::domain::error::{ConfigError, PollConfigError};
use crate::domain::extension::{
    DEFAULT_EXTENSION_PREFIX, DEFAULT_PROCESS_NAME, DEFAULT_WAAGENT_DIR,
};
use crate::domain::os::validate_package_name;
use crate::domain::poll::PollConfig;

// ── Constants ────────────────────────────────────────────────────────────────

pub const VALID_CONFIG_KEYS: &[&str] = &[
    "waagent_dir",
    "extension_prefix",
    "process_name",
    "helper_package",
    "use_sudo",
    "download_limit_mb",
];

/// Phases whose poll settings can be changed with `<phase>.<field>` keys.
pub const POLL_PHASES: &[&str] = &["locate", "status", "package", "process", "reinstall"];

/// Fields of a phase's poll settings.
pub const POLL_FIELDS: &[&str] = &["interval_secs", "timeout_secs", "max_attempts"];

// ── Config schema ────────────────────────────────────────────────────────────

/// Top-level configuration stored in `~/.extcheck/config.yaml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidatorConfig {
    /// Guest agent library directory.
    pub waagent_dir: String,
    /// Extension directory name prefix.
    pub extension_prefix: String,
    /// Companion process that must be running after install.
    pub process_name: String,
    /// Helper package that must be installed.
    pub helper_package: String,
    /// Run package manager commands through `sudo -n`.
    pub use_sudo: bool,
    /// Upper bound on the replacement package download.
    pub download_limit_mb: u64,
    pub poll: PollPhases,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            waagent_dir: DEFAULT_WAAGENT_DIR.to_string(),
            extension_prefix: DEFAULT_EXTENSION_PREFIX.to_string(),
            process_name: DEFAULT_PROCESS_NAME.to_string(),
            helper_package: "jq".to_string(),
            use_sudo: false,
            download_limit_mb: 200,
            poll: PollPhases::default(),
        }
    }
}

/// Poll settings for each validation phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollPhases {
    pub locate: PollSettings,
    pub status: PollSettings,
    pub package: PollSettings,
    pub process: PollSettings,
    pub reinstall: PollSettings,
}

impl Default for PollPhases {
    fn default() -> Self {
        Self {
            locate: PollSettings::new(5, 300, None),
            status: PollSettings::new(5, 300, None),
            package: PollSettings::new(5, 300, Some(5)),
            process: PollSettings::new(5, 120, None),
            reinstall: PollSettings::new(5, 600, None),
        }
    }
}

impl PollPhases {
    /// Every phase with its name, in execution order.
    #[must_use]
    pub fn phases(&self) -> [(&'static str, &PollSettings); 5] {
        [
            ("locate", &self.locate),
            ("status", &self.status),
            ("package", &self.package),
            ("process", &self.process),
            ("reinstall", &self.reinstall),
        ]
    }

    fn get_mut(&mut self, phase: &str) -> Option<&mut PollSettings> {
        match phase {
            "locate" => Some(&mut self.locate),
            "status" => Some(&mut self.status),
            "package" => Some(&mut self.package),
            "process" => Some(&mut self.process),
            "reinstall" => Some(&mut self.reinstall),
            _ => None,
        }
    }
}

/// Interval, deadline and optional attempt budget of one phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollSettings {
    pub interval_secs: u64,
    pub timeout_secs: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_attempts: Option<u32>,
}

impl PollSettings {
    #[must_use]
    pub const fn new(interval_secs: u64, timeout_secs: u64, max_attempts: Option<u32>) -> Self {
        Self {
            interval_secs,
            timeout_secs,
            max_attempts,
        }
    }

    /// Convert to a validated [`PollConfig`].
    ///
    /// # Errors
    ///
    /// Returns an error if the interval, timeout or attempt budget is zero.
    pub fn to_poll_config(&self) -> Result<PollConfig, PollConfigError> {
        let cfg = PollConfig::new(
            Duration::from_secs(self.interval_secs),
            Duration::from_secs(self.timeout_secs),
        )?;
        match self.max_attempts {
            Some(n) => cfg.with_max_attempts(n),
            None => Ok(cfg),
        }
    }
}

// ── Validators ───────────────────────────────────────────────────────────────

fn all_keys() -> Vec<String> {
    let mut keys: Vec<String> = VALID_CONFIG_KEYS.iter().map(ToString::to_string).collect();
    for phase in POLL_PHASES {
        for field in POLL_FIELDS {
            keys.push(format!("poll.{phase}.{field}"));
        }
    }
    keys
}

/// Validates a configuration key against the whitelist.
///
/// # Errors
///
/// Returns an error if the key is not in the allowed list.
pub fn validate_config_key(key: &str) -> Result<()> {
    if !all_keys().iter().any(|k| k == key) {
        return Err(ConfigError::UnknownKey {
            key: key.to_string(),
            valid: all_keys().join(", "),
        }
        .into());
    }
    Ok(())
}

fn invalid(key: &str, value: &str, expected: &str) -> anyhow::Error {
    ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
        expected: expected.to_string(),
    }
    .into()
}

fn parse_positive<T: std::str::FromStr + PartialEq + Default>(key: &str, value: &str) -> Result<T> {
    match value.parse::<T>() {
        Ok(v) if v != T::default() => Ok(v),
        _ => Err(invalid(key, value, "a positive integer")),
    }
}

/// Validates `value` for `key` and stores it in `config`.
///
/// # Errors
///
/// Returns an error if the key is unknown or the value does not fit it.
pub fn set_config_value(config: &mut ValidatorConfig, key: &str, value: &str) -> Result<()> {
    validate_config_key(key)?;
    match key {
        "waagent_dir" | "extension_prefix" | "process_name" | "helper_package" => {
            if value.trim().is_empty() {
                return Err(invalid(key, value, "a non-empty string"));
            }
            if key == "helper_package" && validate_package_name(value.trim()).is_err() {
                return Err(invalid(key, value, "a package name not starting with '-'"));
            }
            let slot = match key {
                "waagent_dir" => &mut config.waagent_dir,
                "extension_prefix" => &mut config.extension_prefix,
                "process_name" => &mut config.process_name,
                _ => &mut config.helper_package,
            };
            *slot = value.trim().to_string();
        }
        "use_sudo" => {
            config.use_sudo = value
                .parse()
                .map_err(|_| invalid(key, value, "true or false"))?;
        }
        "download_limit_mb" => config.download_limit_mb = parse_positive(key, value)?,
        _ => {
            let mut parts = key.splitn(3, '.').skip(1);
            let (Some(phase), Some(field)) = (parts.next(), parts.next()) else {
                return Err(invalid(key, value, "poll.<phase>.<field>"));
            };
            let settings = config
                .poll
                .get_mut(phase)
                .ok_or_else(|| invalid(key, value, "a known phase"))?;
            match field {
                "interval_secs" => settings.interval_secs = parse_positive(key, value)?,
                "timeout_secs" => settings.timeout_secs = parse_positive(key, value)?,
                _ if value == "none" => settings.max_attempts = None,
                _ => settings.max_attempts = Some(parse_positive(key, value)?),
            }
        }
    }
    Ok(())
}

// ── Unit tests ───────────────────────────────────────────────────────────────
