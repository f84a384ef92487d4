//! Subcommand implementations and the option handling they share.

pub mod check;
pub mod config;
pub mod replay;
pub mod run;

use std::path::{Path, PathBuf};

use clap::ValueEnum;
use steadyhand_common::clock::EngineClock;
use steadyhand_common::config::{
    AppConfig, DiscreteParams, FilterConfig, PolicyConfig, SmoothingParams,
};
use steadyhand_filter_core::EngineStats;
use steadyhand_input::decision_log::{DecisionLogHeader, JsonlDecisionLog};

const DECISION_LOG_SCHEMA: &str = "1.0";

/// Motion policy selectable on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PolicyArg {
    /// Jitter/jerk classification
    Discrete,
    /// Deadzone with eased tracking
    Smoothing,
}

impl PolicyArg {
    /// Keep the configured parameters when the kind already matches.
    fn select(self, current: PolicyConfig) -> PolicyConfig {
        match (self, current) {
            (PolicyArg::Discrete, PolicyConfig::Discrete(_))
            | (PolicyArg::Smoothing, PolicyConfig::Smoothing(_)) => current,
            (PolicyArg::Discrete, _) => PolicyConfig::Discrete(DiscreteParams::default()),
            (PolicyArg::Smoothing, _) => PolicyConfig::Smoothing(SmoothingParams::default()),
        }
    }
}

/// Fold command-line flags into the loaded configuration.
pub fn apply_overrides(
    config: &mut AppConfig,
    policy: Option<PolicyArg>,
    no_click_gate: bool,
    decision_log: Option<PathBuf>,
) {
    if let Some(policy) = policy {
        config.filter.policy = policy.select(config.filter.policy);
    }
    if no_click_gate {
        config.filter.click_gate.enabled = false;
    }
    if decision_log.is_some() {
        config.decision_log = decision_log;
    }
}

/// Open a decision log whose header records the active filter settings.
pub fn open_decision_log(
    path: &Path,
    filter: &FilterConfig,
    clock: &EngineClock,
) -> anyhow::Result<JsonlDecisionLog> {
    let header = DecisionLogHeader {
        schema_version: DECISION_LOG_SCHEMA.to_string(),
        epoch_wall: clock.epoch_wall().to_string(),
        filter: filter.clone(),
    };
    let log = JsonlDecisionLog::create(path, &header)?;
    println!("  Decision log: {}", path.display());
    Ok(log)
}

pub fn policy_label(policy: &PolicyConfig) -> &'static str {
    match policy {
        PolicyConfig::Discrete(_) => "discrete",
        PolicyConfig::Smoothing(_) => "smoothing",
    }
}

pub fn print_stats(stats: &EngineStats) {
    println!("  Samples: {}", stats.samples);
    println!("    seeded:              {}", stats.seeded);
    println!("    accepted:            {}", stats.accepted);
    println!("    eased:               {}", stats.eased);
    println!("    suppressed (jitter): {}", stats.suppressed_jitter);
    println!("    suppressed (jerk):   {}", stats.suppressed_jerk);
    println!("    suppressed (dead):   {}", stats.suppressed_deadzone);
    println!(
        "  Presses: {} ({} cancelled)",
        stats.presses, stats.presses_cancelled
    );
    println!("  Releases: {}", stats.releases);
    if stats.ignored > 0 {
        println!("  Ignored (self-inflicted or late): {}", stats.ignored);
    }
    if stats.effect_failures > 0 {
        println!("  [WARN] Output effects failed: {}", stats.effect_failures);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_override_keeps_matching_params() {
        let mut config = AppConfig::default();
        if let PolicyConfig::Discrete(ref mut params) = config.filter.policy {
            params.jitter_dist_max = 8.0;
        }

        apply_overrides(&mut config, Some(PolicyArg::Discrete), false, None);
        match config.filter.policy {
            PolicyConfig::Discrete(params) => assert_eq!(params.jitter_dist_max, 8.0),
            other => panic!("unexpected policy: {other:?}"),
        }
    }

    #[test]
    fn test_policy_override_switches_kind() {
        let mut config = AppConfig::default();
        apply_overrides(&mut config, Some(PolicyArg::Smoothing), true, None);

        assert_eq!(
            config.filter.policy,
            PolicyConfig::Smoothing(SmoothingParams::default())
        );
        assert!(!config.filter.click_gate.enabled);
    }

    #[test]
    fn test_decision_log_override() {
        let mut config = AppConfig {
            decision_log: Some(PathBuf::from("/tmp/a.jsonl")),
            ..AppConfig::default()
        };

        apply_overrides(&mut config, None, false, None);
        assert_eq!(config.decision_log, Some(PathBuf::from("/tmp/a.jsonl")));

        apply_overrides(&mut config, None, false, Some(PathBuf::from("/tmp/b.jsonl")));
        assert_eq!(config.decision_log, Some(PathBuf::from("/tmp/b.jsonl")));
    }
}
