//! Application and filter configuration.
//!
//! Filter thresholds are fixed when the engine is constructed. Everything
//! in [`FilterConfig`] is validated up front so the engine never starts in
//! an invalid state.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{SteadyError, SteadyResult};

/// Global application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Motion filter and click gate thresholds.
    #[serde(default)]
    pub filter: FilterConfig,

    /// Input/output device settings.
    #[serde(default)]
    pub devices: DeviceConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Optional JSONL file receiving one record per filter decision.
    #[serde(default)]
    pub decision_log: Option<PathBuf>,
}

/// Thresholds for the motion filter, click gate, and sample history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Which motion policy to run and its parameters.
    #[serde(flatten)]
    pub policy: PolicyConfig,

    /// Click gate thresholds (shared by both policies).
    #[serde(default)]
    pub click_gate: ClickGateConfig,

    /// How long raw samples are kept in history (seconds).
    ///
    /// The effective horizon is never shorter than the click lookback.
    #[serde(default = "default_history_retention")]
    pub history_retention: f64,
}

/// Motion policy selection. Serialized with a `"policy"` tag.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum PolicyConfig {
    /// Discrete jitter/jerk classification.
    Discrete(DiscreteParams),
    /// Continuous deadzone + eased tracking.
    Smoothing(SmoothingParams),
}

/// Parameters for the discrete jitter/jerk policy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DiscreteParams {
    /// Max distance (px) from the stable point still treated as tremor.
    #[serde(default = "default_jitter_dist_max")]
    pub jitter_dist_max: f64,

    /// Max time (s) since the stable point was set for tremor suppression.
    #[serde(default = "default_jitter_interval_max")]
    pub jitter_interval_max: f64,

    /// Min distance (px) of a displacement treated as a spasm. `None` disables the jerk test.
    #[serde(default = "default_jerk_dist_min")]
    pub jerk_dist_min: Option<f64>,

    /// Max time (s) in which a spasm-sized displacement must happen.
    #[serde(default = "default_jerk_interval_max")]
    pub jerk_interval_max: Option<f64>,
}

/// Parameters for the deadzone + easing policy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SmoothingParams {
    /// Radius (px) around the reference within which motion is ignored.
    #[serde(default = "default_deadzone_radius")]
    pub deadzone_radius: f64,

    /// Fraction of the remaining distance covered per update, in (0, 1].
    #[serde(default = "default_smoothing_factor")]
    pub smoothing_factor: f64,

    /// Cap (px) on how far a single update may move the reference.
    #[serde(default = "default_max_step")]
    pub max_step: f64,
}

/// Click gate thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClickGateConfig {
    /// Whether presses are gated at all.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Displacement (px) across the lookback window above which a press is cancelled.
    #[serde(default = "default_click_move_threshold")]
    pub click_move_threshold: f64,

    /// Lookback window (s) inspected before a press.
    #[serde(default = "default_click_lookback")]
    pub click_lookback: f64,
}

/// Device paths and screen geometry used by the live adapters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Aggregated relative pointer device.
    pub mice_path: PathBuf,

    /// Screen size (px) used to clamp the integrated pointer position.
    pub screen_width: u32,
    pub screen_height: u32,

    /// Stop the session when ESC is pressed on any keyboard.
    pub stop_on_escape: bool,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "steadyhand=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,
}

fn default_history_retention() -> f64 {
    1.0
}

fn default_jitter_dist_max() -> f64 {
    5.0
}

fn default_jitter_interval_max() -> f64 {
    0.05
}

fn default_jerk_dist_min() -> Option<f64> {
    Some(30.0)
}

fn default_jerk_interval_max() -> Option<f64> {
    Some(0.12)
}

fn default_deadzone_radius() -> f64 {
    20.0
}

fn default_smoothing_factor() -> f64 {
    0.25
}

fn default_max_step() -> f64 {
    35.0
}

fn default_click_move_threshold() -> f64 {
    20.0
}

fn default_click_lookback() -> f64 {
    0.15
}

fn default_true() -> bool {
    true
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            policy: PolicyConfig::Discrete(DiscreteParams::default()),
            click_gate: ClickGateConfig::default(),
            history_retention: default_history_retention(),
        }
    }
}

impl Default for DiscreteParams {
    fn default() -> Self {
        Self {
            jitter_dist_max: default_jitter_dist_max(),
            jitter_interval_max: default_jitter_interval_max(),
            jerk_dist_min: default_jerk_dist_min(),
            jerk_interval_max: default_jerk_interval_max(),
        }
    }
}

impl Default for SmoothingParams {
    fn default() -> Self {
        Self {
            deadzone_radius: default_deadzone_radius(),
            smoothing_factor: default_smoothing_factor(),
            max_step: default_max_step(),
        }
    }
}

impl Default for ClickGateConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            click_move_threshold: default_click_move_threshold(),
            click_lookback: default_click_lookback(),
        }
    }
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            mice_path: PathBuf::from("/dev/input/mice"),
            screen_width: 1920,
            screen_height: 1080,
            stop_on_escape: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl FilterConfig {
    /// Config using the discrete jitter/jerk policy with default thresholds.
    pub fn discrete() -> Self {
        Self::default()
    }

    /// Config using the deadzone + easing policy with default thresholds.
    pub fn smoothing() -> Self {
        Self {
            policy: PolicyConfig::Smoothing(SmoothingParams::default()),
            ..Self::default()
        }
    }

    /// Effective history horizon: retention, widened to cover the click lookback.
    pub fn history_horizon(&self) -> f64 {
        self.history_retention.max(self.click_gate.click_lookback)
    }

    /// Reject configurations the engine cannot run with.
    pub fn validate(&self) -> SteadyResult<()> {
        match &self.policy {
            PolicyConfig::Discrete(p) => p.validate()?,
            PolicyConfig::Smoothing(p) => p.validate()?,
        }
        self.click_gate.validate()?;
        require_positive("history_retention", self.history_retention)
    }
}

impl DiscreteParams {
    fn validate(&self) -> SteadyResult<()> {
        require_non_negative("jitter_dist_max", self.jitter_dist_max)?;
        require_non_negative("jitter_interval_max", self.jitter_interval_max)?;
        match (self.jerk_dist_min, self.jerk_interval_max) {
            (Some(dist), Some(interval)) => {
                require_non_negative("jerk_dist_min", dist)?;
                require_non_negative("jerk_interval_max", interval)
            }
            (None, None) => Ok(()),
            _ => Err(SteadyError::config(
                "jerk_dist_min and jerk_interval_max must be set together",
            )),
        }
    }
}

impl SmoothingParams {
    fn validate(&self) -> SteadyResult<()> {
        require_non_negative("deadzone_radius", self.deadzone_radius)?;
        if !(self.smoothing_factor > 0.0 && self.smoothing_factor <= 1.0) {
            return Err(SteadyError::config(format!(
                "smoothing_factor must be in (0, 1], got {}",
                self.smoothing_factor
            )));
        }
        require_positive("max_step", self.max_step)
    }
}

impl ClickGateConfig {
    fn validate(&self) -> SteadyResult<()> {
        require_non_negative("click_move_threshold", self.click_move_threshold)?;
        require_positive("click_lookback", self.click_lookback)
    }
}

fn require_non_negative(name: &str, value: f64) -> SteadyResult<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(SteadyError::config(format!(
            "{name} must be a finite, non-negative number, got {value}"
        )))
    }
}

fn require_positive(name: &str, value: f64) -> SteadyResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(SteadyError::config(format!(
            "{name} must be a finite, positive number, got {value}"
        )))
    }
}

impl AppConfig {
    /// Load config from the standard location, falling back to defaults.
    pub fn load() -> Self {
        let config_path = config_file_path();
        if config_path.exists() {
            match std::fs::read_to_string(&config_path) {
                Ok(content) => match serde_json::from_str(&content) {
                    Ok(config) => return config,
                    Err(e) => {
                        tracing::warn!("Failed to parse config at {:?}: {}", config_path, e);
                    }
                },
                Err(e) => {
                    tracing::warn!("Failed to read config at {:?}: {}", config_path, e);
                }
            }
        }
        Self::default()
    }

    /// Load config from an explicit path. Errors are returned, not defaulted.
    pub fn load_from(path: &Path) -> SteadyResult<Self> {
        if !path.exists() {
            return Err(SteadyError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Save config to the standard location.
    pub fn save(&self) -> SteadyResult<PathBuf> {
        let config_path = config_file_path();
        self.save_to(&config_path)?;
        Ok(config_path)
    }

    /// Save config to an explicit path, creating parent directories.
    pub fn save_to(&self, path: &Path) -> SteadyResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

/// Standard config file location.
pub fn config_file_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("steadyhand").join("config.json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        FilterConfig::discrete().validate().unwrap();
        FilterConfig::smoothing().validate().unwrap();
    }

    #[test]
    fn test_smoothing_factor_out_of_range_rejected() {
        for bad in [0.0, -0.1, 1.5, f64::NAN] {
            let config = FilterConfig {
                policy: PolicyConfig::Smoothing(SmoothingParams {
                    smoothing_factor: bad,
                    ..SmoothingParams::default()
                }),
                ..FilterConfig::default()
            };
            let err = config.validate().unwrap_err();
            assert!(err.to_string().contains("smoothing_factor"), "{err}");
        }
    }

    #[test]
    fn test_smoothing_factor_of_one_accepted() {
        let config = FilterConfig {
            policy: PolicyConfig::Smoothing(SmoothingParams {
                smoothing_factor: 1.0,
                ..SmoothingParams::default()
            }),
            ..FilterConfig::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_lookback_rejected() {
        let mut config = FilterConfig::default();
        config.click_gate.click_lookback = 0.0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("click_lookback"));
    }

    #[test]
    fn test_half_configured_jerk_rejected() {
        let config = FilterConfig {
            policy: PolicyConfig::Discrete(DiscreteParams {
                jerk_interval_max: None,
                ..DiscreteParams::default()
            }),
            ..FilterConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_history_horizon_covers_lookback() {
        let mut config = FilterConfig::default();
        assert_eq!(config.history_horizon(), 1.0);
        config.click_gate.click_lookback = 2.5;
        assert_eq!(config.history_horizon(), 2.5);
    }

    #[test]
    fn test_policy_tag_parses_with_defaults() {
        let parsed: FilterConfig =
            serde_json::from_str(r#"{"policy":"smoothing","max_step":10.0}"#).unwrap();
        assert_eq!(
            parsed.policy,
            PolicyConfig::Smoothing(SmoothingParams {
                max_step: 10.0,
                ..SmoothingParams::default()
            })
        );
        assert_eq!(parsed.click_gate, ClickGateConfig::default());
    }

    #[test]
    fn test_null_jerk_disables_jerk_test() {
        let parsed: FilterConfig = serde_json::from_str(
            r#"{"policy":"discrete","jerk_dist_min":null,"jerk_interval_max":null}"#,
        )
        .unwrap();
        match parsed.policy {
            PolicyConfig::Discrete(p) => {
                assert_eq!(p.jerk_dist_min, None);
                assert_eq!(p.jerk_interval_max, None);
            }
            other => panic!("unexpected policy {other:?}"),
        }
        assert!(parsed.validate().is_ok());
    }

    #[test]
    fn test_app_config_save_and_load() {
        let dir = std::env::temp_dir().join("steadyhand_test_config");
        let _ = std::fs::remove_dir_all(&dir);
        let path = dir.join("config.json");

        let mut config = AppConfig::default();
        config.filter = FilterConfig::smoothing();
        config.devices.screen_width = 2560;
        config.save_to(&path).unwrap();

        let loaded = AppConfig::load_from(&path).unwrap();
        assert_eq!(loaded.filter, config.filter);
        assert_eq!(loaded.devices.screen_width, 2560);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_load_from_missing_file_errors() {
        let path = std::env::temp_dir().join("steadyhand_definitely_missing.json");
        assert!(matches!(
            AppConfig::load_from(&path),
            Err(SteadyError::FileNotFound { .. })
        ));
    }
}
