//! Motion filtering: turns each raw sample into a suppress / ease / accept decision.
//!
//! Two interchangeable policies are provided:
//!
//! - [`DiscretePolicy`]: small fast wobble (jitter) and large fast jumps
//!   (jerk) near the stable point are suppressed; everything else is accepted.
//! - [`SmoothingPolicy`]: motion inside a deadzone is suppressed; beyond it the
//!   reference eases toward the raw position by a fraction of the remaining
//!   distance, capped at `max_step`.
//!
//! The [`MotionFilter`] owns the only mutable filter state and is the only
//! place it changes.

use serde::{Deserialize, Serialize};
use steadyhand_common::config::{DiscreteParams, PolicyConfig, SmoothingParams};

use crate::event::TimedSample;
use crate::geometry::Point;

/// Why a sample was suppressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuppressReason {
    Jitter,
    Jerk,
    Deadzone,
}

/// Outcome of classifying one raw sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum Decision {
    /// First sample after start or reset; becomes the reference unclassified.
    Seed { pos: Point },
    /// Noise: re-assert the reference position.
    Suppress { pos: Point, reason: SuppressReason },
    /// Move to an intermediate position toward the raw sample.
    Ease { pos: Point },
    /// Intentional motion: the raw sample is the new reference.
    Accept { pos: Point },
}

impl Decision {
    /// Position the pointer should end up at after this decision.
    pub fn position(&self) -> Point {
        match *self {
            Decision::Seed { pos }
            | Decision::Suppress { pos, .. }
            | Decision::Ease { pos }
            | Decision::Accept { pos } => pos,
        }
    }

    /// Where the cursor must be moved, if anywhere.
    ///
    /// Seed and Accept leave the physical cursor where it already is.
    pub fn reposition_target(&self) -> Option<Point> {
        match *self {
            Decision::Suppress { pos, .. } | Decision::Ease { pos } => Some(pos),
            Decision::Seed { .. } | Decision::Accept { .. } => None,
        }
    }

    pub fn is_suppress(&self) -> bool {
        matches!(self, Decision::Suppress { .. })
    }
}

/// The filter's reference point and when it was last set.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FilterState {
    pub ref_pos: Point,
    pub ref_time: f64,
}

/// Distance and elapsed time of a sample relative to the reference.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    pub dist: f64,
    /// Elapsed time, clamped to be non-negative.
    pub dt: f64,
}

impl Measurement {
    fn between(sample: &TimedSample, state: &FilterState) -> Self {
        let dist = sample.pos.distance(state.ref_pos);
        let dt = sample.time - state.ref_time;
        Self {
            dist,
            dt: if dt.is_finite() { dt.max(0.0) } else { dt },
        }
    }

    fn is_finite(&self) -> bool {
        self.dist.is_finite() && self.dt.is_finite()
    }

    /// Pixels per second. Diagnostics only; `None` for instantaneous samples.
    pub fn speed(&self) -> Option<f64> {
        (self.dt > 0.0 && self.is_finite()).then(|| self.dist / self.dt)
    }
}

/// A motion classification policy.
///
/// Policies are pure: they look at the sample, the current state, and the
/// measurement between them, and return a decision. [`MotionFilter`] applies
/// the decision to the state.
pub trait MotionPolicy: Send {
    fn classify(&self, sample: &TimedSample, state: &FilterState, m: Measurement) -> Decision;

    /// Policy name for logging.
    fn name(&self) -> &'static str;
}

/// Discrete jitter/jerk classification.
///
/// Distance and time thresholds are tested independently rather than as a
/// speed. Jitter is tested first.
#[derive(Debug, Clone, Copy)]
pub struct DiscretePolicy {
    params: DiscreteParams,
}

impl DiscretePolicy {
    pub fn new(params: DiscreteParams) -> Self {
        Self { params }
    }

    fn is_jitter(&self, m: Measurement) -> bool {
        m.dist <= self.params.jitter_dist_max && m.dt <= self.params.jitter_interval_max
    }

    fn is_jerk(&self, m: Measurement) -> bool {
        match (self.params.jerk_dist_min, self.params.jerk_interval_max) {
            (Some(dist_min), Some(interval_max)) => m.dist >= dist_min && m.dt <= interval_max,
            _ => false,
        }
    }
}

impl MotionPolicy for DiscretePolicy {
    fn classify(&self, sample: &TimedSample, state: &FilterState, m: Measurement) -> Decision {
        if self.is_jitter(m) {
            Decision::Suppress {
                pos: state.ref_pos,
                reason: SuppressReason::Jitter,
            }
        } else if self.is_jerk(m) {
            Decision::Suppress {
                pos: state.ref_pos,
                reason: SuppressReason::Jerk,
            }
        } else {
            Decision::Accept { pos: sample.pos }
        }
    }

    fn name(&self) -> &'static str {
        "discrete"
    }
}

/// Continuous deadzone + eased tracking. Ignores time.
#[derive(Debug, Clone, Copy)]
pub struct SmoothingPolicy {
    params: SmoothingParams,
}

impl SmoothingPolicy {
    pub fn new(params: SmoothingParams) -> Self {
        Self { params }
    }
}

impl MotionPolicy for SmoothingPolicy {
    fn classify(&self, sample: &TimedSample, state: &FilterState, m: Measurement) -> Decision {
        if m.dist <= self.params.deadzone_radius {
            return Decision::Suppress {
                pos: state.ref_pos,
                reason: SuppressReason::Deadzone,
            };
        }

        let step = (m.dist * self.params.smoothing_factor).min(self.params.max_step);
        let pos = state.ref_pos + (sample.pos - state.ref_pos) * (step / m.dist);
        Decision::Ease { pos }
    }

    fn name(&self) -> &'static str {
        "smoothing"
    }
}

/// Build the policy described by a config.
pub fn policy_from_config(config: &PolicyConfig) -> Box<dyn MotionPolicy> {
    match *config {
        PolicyConfig::Discrete(params) => Box::new(DiscretePolicy::new(params)),
        PolicyConfig::Smoothing(params) => Box::new(SmoothingPolicy::new(params)),
    }
}

/// Stateful classifier owning the filter's reference point.
pub struct MotionFilter {
    policy: Box<dyn MotionPolicy>,
    state: Option<FilterState>,
}

impl MotionFilter {
    pub fn new(policy: Box<dyn MotionPolicy>) -> Self {
        Self {
            policy,
            state: None,
        }
    }

    pub fn from_config(config: &PolicyConfig) -> Self {
        Self::new(policy_from_config(config))
    }

    /// Classify a sample and update the reference accordingly.
    pub fn classify(&mut self, sample: TimedSample) -> Decision {
        self.classify_measured(sample).0
    }

    /// Like [`classify`](Self::classify), also returning the measurement
    /// against the previous reference (`None` when the sample seeded the state).
    pub fn classify_measured(&mut self, sample: TimedSample) -> (Decision, Option<Measurement>) {
        let Some(state) = self.state else {
            return (self.seed(sample), None);
        };

        let m = Measurement::between(&sample, &state);
        if !m.is_finite() {
            // Fail open so a corrupt sample can never lock the cursor in place.
            self.advance_if_finite(sample.pos, sample.time);
            return (Decision::Accept { pos: sample.pos }, Some(m));
        }

        let decision = self.policy.classify(&sample, &state, m);
        match decision {
            Decision::Accept { pos } | Decision::Ease { pos } => {
                self.advance_if_finite(pos, sample.time);
            }
            Decision::Suppress { .. } | Decision::Seed { .. } => {}
        }
        (decision, Some(m))
    }

    fn seed(&mut self, sample: TimedSample) -> Decision {
        if sample.pos.is_finite() && sample.time.is_finite() {
            self.state = Some(FilterState {
                ref_pos: sample.pos,
                ref_time: sample.time,
            });
            Decision::Seed { pos: sample.pos }
        } else {
            Decision::Accept { pos: sample.pos }
        }
    }

    fn advance_if_finite(&mut self, pos: Point, time: f64) {
        if pos.is_finite() && time.is_finite() {
            self.state = Some(FilterState {
                ref_pos: pos,
                ref_time: time,
            });
        }
    }

    /// Current reference, if seeded.
    pub fn state(&self) -> Option<FilterState> {
        self.state
    }

    /// Forget the reference; the next sample seeds again.
    pub fn reset(&mut self) {
        self.state = None;
    }

    /// Swap the classification policy, keeping the current reference.
    pub fn set_policy(&mut self, policy: Box<dyn MotionPolicy>) {
        self.policy = policy;
    }

    pub fn policy_name(&self) -> &'static str {
        self.policy.name()
    }
}

impl std::fmt::Debug for MotionFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MotionFilter")
            .field("policy", &self.policy.name())
            .field("state", &self.state)
            .finish()
    }
}
