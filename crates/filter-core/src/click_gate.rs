//! Click gate: cancels presses that coincide with involuntary motion.
//!
//! A press is cancelled when the pointer moved more than
//! `click_move_threshold` between the first and last raw samples inside
//! the lookback window. Only the endpoints are compared, not the path.

use serde::{Deserialize, Serialize};
use steadyhand_common::config::ClickGateConfig;

use crate::history::SampleHistory;

/// Result of gating one button event.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum ClickVerdict {
    /// Release events and presses on a disabled gate are not inspected.
    PassThrough,
    /// Press allowed. `displacement` is `None` when fewer than two samples were in the window.
    Allow { displacement: Option<f64> },
    /// Press cancelled; the button is released immediately.
    Cancel { displacement: f64 },
}

impl ClickVerdict {
    pub fn is_cancel(&self) -> bool {
        matches!(self, ClickVerdict::Cancel { .. })
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ClickGate {
    config: ClickGateConfig,
}

impl ClickGate {
    pub fn new(config: ClickGateConfig) -> Self {
        Self { config }
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Endpoint displacement over the lookback window ending at `now`.
    pub fn recent_displacement(&self, history: &SampleHistory, now: f64) -> Option<f64> {
        let recent = history.snapshot_within(now, self.config.click_lookback);
        match (recent.first(), recent.last()) {
            (Some(first), Some(last)) if recent.len() >= 2 => Some(first.pos.distance(last.pos)),
            _ => None,
        }
    }

    /// Whether a press at `now` should be cancelled.
    pub fn should_cancel(&self, history: &SampleHistory, now: f64) -> bool {
        self.evaluate(history, now).is_cancel()
    }

    /// Gate a press at `now`. A non-finite displacement allows the click.
    pub fn evaluate(&self, history: &SampleHistory, now: f64) -> ClickVerdict {
        if !self.config.enabled {
            return ClickVerdict::PassThrough;
        }
        match self.recent_displacement(history, now) {
            Some(d) if d.is_finite() && d > self.config.click_move_threshold => {
                ClickVerdict::Cancel { displacement: d }
            }
            displacement => ClickVerdict::Allow { displacement },
        }
    }
}
