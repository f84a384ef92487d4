//! The filter engine: wires samples through history and the motion filter,
//! and presses through the click gate.
//!
//! All mutable state sits behind a single mutex so the engine can be
//! shared between a pointer thread and a keyboard thread. The mutex is
//! released while an effect runs; a "self-inflicted" flag set for the
//! duration of the effect makes the engine ignore any event that arrives
//! in that window, including the OS echo of its own cursor move.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use steadyhand_common::config::{FilterConfig, PolicyConfig};
use steadyhand_common::error::SteadyResult;

use crate::adapter::OutputAdapter;
use crate::click_gate::{ClickGate, ClickVerdict};
use crate::diagnostics::{DecisionRecord, DecisionSink};
use crate::event::{ClickEvent, EngineEvent, TimedSample};
use crate::history::SampleHistory;
use crate::motion::{policy_from_config, Decision, FilterState, MotionFilter, SuppressReason};

/// What the engine did with an event.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    Ignored { reason: IgnoreReason },
    Position { decision: Decision },
    Button { verdict: ClickVerdict },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IgnoreReason {
    /// Arrived while the engine's own effect was in flight.
    SelfInflicted,
    /// Arrived after shutdown.
    ShutDown,
}

/// Running counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineStats {
    pub samples: u64,
    pub seeded: u64,
    pub suppressed_jitter: u64,
    pub suppressed_jerk: u64,
    pub suppressed_deadzone: u64,
    pub eased: u64,
    pub accepted: u64,
    pub presses: u64,
    pub presses_cancelled: u64,
    pub releases: u64,
    pub ignored: u64,
    pub effect_failures: u64,
}

impl EngineStats {
    pub fn suppressed(&self) -> u64 {
        self.suppressed_jitter + self.suppressed_jerk + self.suppressed_deadzone
    }

    fn count_decision(&mut self, decision: &Decision) {
        self.samples += 1;
        match decision {
            Decision::Seed { .. } => self.seeded += 1,
            Decision::Suppress { reason, .. } => match reason {
                SuppressReason::Jitter => self.suppressed_jitter += 1,
                SuppressReason::Jerk => self.suppressed_jerk += 1,
                SuppressReason::Deadzone => self.suppressed_deadzone += 1,
            },
            Decision::Ease { .. } => self.eased += 1,
            Decision::Accept { .. } => self.accepted += 1,
        }
    }
}

struct EngineState {
    motion: MotionFilter,
    history: SampleHistory,
    policy: PolicyConfig,
    self_inflicted: bool,
    running: bool,
    stats: EngineStats,
    sink: Option<Box<dyn DecisionSink>>,
}

impl EngineState {
    fn ignore_reason(&self) -> Option<IgnoreReason> {
        if !self.running {
            Some(IgnoreReason::ShutDown)
        } else if self.self_inflicted {
            Some(IgnoreReason::SelfInflicted)
        } else {
            None
        }
    }

    fn emit(&mut self, record: DecisionRecord) {
        if let Some(sink) = self.sink.as_mut() {
            if let Err(e) = sink.record(&record) {
                tracing::warn!(error = %e, "Failed to write decision record");
            }
        }
    }
}

/// Clears the self-inflicted flag when dropped.
struct SelfInflictedGuard<'a> {
    state: &'a Mutex<EngineState>,
}

impl Drop for SelfInflictedGuard<'_> {
    fn drop(&mut self) {
        self.state.lock().self_inflicted = false;
    }
}

/// Tremor filter engine driving an output adapter.
pub struct FilterEngine<A: OutputAdapter> {
    config: FilterConfig,
    gate: ClickGate,
    horizon: f64,
    state: Mutex<EngineState>,
    adapter: A,
}

impl<A: OutputAdapter> FilterEngine<A> {
    /// Create an engine. Fails if the configuration is invalid.
    pub fn new(config: FilterConfig, adapter: A) -> SteadyResult<Self> {
        config.validate()?;

        let state = EngineState {
            motion: MotionFilter::from_config(&config.policy),
            history: SampleHistory::new(),
            policy: config.policy,
            self_inflicted: false,
            running: true,
            stats: EngineStats::default(),
            sink: None,
        };

        let gate = ClickGate::new(config.click_gate);
        tracing::debug!(
            policy = state.motion.policy_name(),
            adapter = adapter.name(),
            horizon = config.history_horizon(),
            click_gate = gate.is_enabled(),
            "Filter engine created"
        );

        Ok(Self {
            gate,
            horizon: config.history_horizon(),
            config,
            state: Mutex::new(state),
            adapter,
        })
    }

    /// Attach a diagnostics sink.
    pub fn with_decision_sink(mut self, sink: Box<dyn DecisionSink>) -> Self {
        self.state.get_mut().sink = Some(sink);
        self
    }

    /// Handle a raw pointer position.
    pub fn on_position_sample(&self, sample: TimedSample) -> Outcome {
        let (decision, target) = {
            let mut st = self.state.lock();
            if let Some(reason) = st.ignore_reason() {
                st.stats.ignored += 1;
                return Outcome::Ignored { reason };
            }

            st.history.append(sample);
            st.history.prune(sample.time, self.horizon);

            let (decision, measurement) = st.motion.classify_measured(sample);
            st.stats.count_decision(&decision);
            st.emit(DecisionRecord::position(&sample, decision, measurement));
            tracing::trace!(
                t = sample.time,
                x = sample.pos.x,
                y = sample.pos.y,
                dist = measurement.map(|m| m.dist),
                ?decision,
                "Classified sample"
            );

            let target = decision.reposition_target();
            if target.is_some() {
                st.self_inflicted = true;
            }
            (decision, target)
        };

        if let Some(point) = target {
            self.run_effect("reposition", || self.adapter.reposition(point));
        }
        Outcome::Position { decision }
    }

    /// Handle a button press or release.
    pub fn on_button_event(&self, event: ClickEvent) -> Outcome {
        let verdict = {
            let mut st = self.state.lock();
            if let Some(reason) = st.ignore_reason() {
                st.stats.ignored += 1;
                return Outcome::Ignored { reason };
            }

            let verdict = if event.pressed {
                st.stats.presses += 1;
                self.gate.evaluate(&st.history, event.time)
            } else {
                st.stats.releases += 1;
                ClickVerdict::PassThrough
            };
            st.emit(DecisionRecord::button(&event, verdict));

            if verdict.is_cancel() {
                st.stats.presses_cancelled += 1;
                st.self_inflicted = true;
            }
            verdict
        };

        if let ClickVerdict::Cancel { displacement } = verdict {
            tracing::debug!(
                button = ?event.button,
                displacement,
                "Cancelling press after involuntary motion"
            );
            self.run_effect("cancel_press", || self.adapter.cancel_press(event.button));
        }
        Outcome::Button { verdict }
    }

    /// Dispatch either kind of event.
    pub fn on_event(&self, event: EngineEvent) -> Outcome {
        match event {
            EngineEvent::Position(sample) => self.on_position_sample(sample),
            EngineEvent::Button(click) => self.on_button_event(click),
        }
    }

    /// Run an effect with the self-inflicted flag already set, then clear it.
    ///
    /// The flag is cleared even if the adapter panics.
    fn run_effect(&self, effect: &str, f: impl FnOnce() -> SteadyResult<()>) {
        let guard = SelfInflictedGuard { state: &self.state };
        let result = f();
        drop(guard);

        if let Err(e) = result {
            self.state.lock().stats.effect_failures += 1;
            tracing::warn!(effect, adapter = self.adapter.name(), error = %e, "Output effect failed");
        }
    }

    /// Forget the reference position and clear history.
    pub fn reset(&self) {
        let mut st = self.state.lock();
        st.motion.reset();
        st.history.clear();
    }

    /// Swap the motion policy. History, click gate, and reference are kept.
    pub fn swap_policy(&self, policy: PolicyConfig) -> SteadyResult<()> {
        FilterConfig {
            policy,
            ..self.config.clone()
        }
        .validate()?;

        let mut st = self.state.lock();
        st.motion.set_policy(policy_from_config(&policy));
        st.policy = policy;
        tracing::info!(policy = st.motion.policy_name(), "Motion policy swapped");
        Ok(())
    }

    /// Stop accepting events and release the history buffer. Idempotent.
    pub fn shutdown(&self) {
        let mut st = self.state.lock();
        if !st.running {
            return;
        }
        st.running = false;
        st.history.clear();
        if let Some(sink) = st.sink.as_mut() {
            if let Err(e) = sink.flush() {
                tracing::warn!(error = %e, "Failed to flush decision sink");
            }
        }
        tracing::info!(stats = ?st.stats, "Filter engine shut down");
    }

    pub fn is_running(&self) -> bool {
        self.state.lock().running
    }

    pub fn stats(&self) -> EngineStats {
        self.state.lock().stats
    }

    /// Current reference position, if seeded.
    pub fn filter_state(&self) -> Option<FilterState> {
        self.state.lock().motion.state()
    }

    pub fn history_len(&self) -> usize {
        self.state.lock().history.len()
    }

    /// Policy currently in use.
    pub fn policy(&self) -> PolicyConfig {
        self.state.lock().policy
    }

    /// Configuration the engine was built with.
    pub fn config(&self) -> &FilterConfig {
        &self.config
    }

    pub fn adapter(&self) -> &A {
        &self.adapter
    }

    /// Take the diagnostics sink back, e.g. to inspect it after a replay.
    pub fn take_decision_sink(&self) -> Option<Box<dyn DecisionSink>> {
        self.state.lock().sink.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::{Effect, RecordingAdapter};
    use crate::event::MouseButton;
    use crate::geometry::Point;
    use steadyhand_common::config::SmoothingParams;

    fn engine(config: FilterConfig) -> FilterEngine<RecordingAdapter> {
        FilterEngine::new(config, RecordingAdapter::new()).unwrap()
    }

    struct PanickingAdapter;

    impl OutputAdapter for PanickingAdapter {
        fn reposition(&self, _point: Point) -> SteadyResult<()> {
            panic!("virtual pointer vanished");
        }

        fn cancel_press(&self, _button: MouseButton) -> SteadyResult<()> {
            panic!("virtual pointer vanished");
        }

        fn name(&self) -> &str {
            "panicking"
        }
    }

    #[test]
    fn test_panicking_adapter_does_not_wedge_engine() {
        let engine = FilterEngine::new(FilterConfig::discrete(), PanickingAdapter).unwrap();
        engine.on_position_sample(TimedSample::new(0.0, 100.0, 100.0));

        let jitter = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            engine.on_position_sample(TimedSample::new(0.01, 102.0, 100.0))
        }));
        assert!(jitter.is_err());

        let outcome = engine.on_position_sample(TimedSample::new(5.0, 300.0, 300.0));
        assert!(matches!(
            outcome,
            Outcome::Position {
                decision: Decision::Accept { .. }
            }
        ));

        // Slow enough to be accepted, far enough to cancel the next press.
        let outcome = engine.on_position_sample(TimedSample::new(5.13, 330.0, 300.0));
        assert!(matches!(
            outcome,
            Outcome::Position {
                decision: Decision::Accept { .. }
            }
        ));
        let press = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            engine.on_button_event(ClickEvent::press(5.14, MouseButton::Left, 330.0, 300.0))
        }));
        assert!(press.is_err());

        let later = engine.on_position_sample(TimedSample::new(6.0, 500.0, 500.0));
        assert!(!matches!(later, Outcome::Ignored { .. }));
        assert_eq!(engine.stats().ignored, 0);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = FilterConfig {
            policy: PolicyConfig::Smoothing(SmoothingParams {
                smoothing_factor: 1.5,
                ..SmoothingParams::default()
            }),
            ..FilterConfig::default()
        };
        assert!(FilterEngine::new(config, RecordingAdapter::new()).is_err());
    }

    #[test]
    fn test_suppress_reasserts_reference() {
        let engine = engine(FilterConfig::discrete());
        engine.on_position_sample(TimedSample::new(0.0, 100.0, 100.0));
        let outcome = engine.on_position_sample(TimedSample::new(0.02, 102.0, 101.0));

        assert!(matches!(
            outcome,
            Outcome::Position {
                decision: Decision::Suppress { .. }
            }
        ));
        assert_eq!(
            engine.adapter().effects(),
            vec![Effect::Reposition { x: 100.0, y: 100.0 }]
        );
    }

    #[test]
    fn test_seed_and_accept_issue_no_effects() {
        let engine = engine(FilterConfig::discrete());
        engine.on_position_sample(TimedSample::new(0.0, 100.0, 100.0));
        engine.on_position_sample(TimedSample::new(0.5, 300.0, 100.0));
        assert!(engine.adapter().effects().is_empty());
        assert_eq!(engine.stats().seeded, 1);
        assert_eq!(engine.stats().accepted, 1);
    }

    #[test]
    fn test_every_sample_enters_history() {
        let engine = engine(FilterConfig::discrete());
        engine.on_position_sample(TimedSample::new(0.0, 100.0, 100.0));
        engine.on_position_sample(TimedSample::new(0.01, 101.0, 100.0));
        engine.on_position_sample(TimedSample::new(0.02, 140.0, 100.0));
        assert_eq!(engine.history_len(), 3);
    }

    #[test]
    fn test_history_pruned_to_horizon() {
        let engine = engine(FilterConfig::discrete());
        for i in 0..30 {
            engine.on_position_sample(TimedSample::new(i as f64 * 0.125, 0.0, 0.0));
        }
        // Samples at 2.625..=3.625 remain with a 1 s horizon.
        assert_eq!(engine.history_len(), 9);
    }

    #[test]
    fn test_release_passes_through_untouched() {
        let engine = engine(FilterConfig::discrete());
        engine.on_position_sample(TimedSample::new(0.0, 0.0, 0.0));
        engine.on_position_sample(TimedSample::new(0.5, 300.0, 0.0));
        let outcome =
            engine.on_button_event(ClickEvent::release(0.5, MouseButton::Left, 300.0, 0.0));
        assert_eq!(
            outcome,
            Outcome::Button {
                verdict: ClickVerdict::PassThrough
            }
        );
        assert!(engine.adapter().effects().is_empty());
    }

    #[test]
    fn test_press_after_spasm_cancelled() {
        let engine = engine(FilterConfig::discrete());
        engine.on_position_sample(TimedSample::new(0.0, 0.0, 0.0));
        engine.on_position_sample(TimedSample::new(0.1, 0.0, 50.0));
        let outcome = engine.on_button_event(ClickEvent::press(0.1, MouseButton::Right, 0.0, 50.0));

        assert!(matches!(
            outcome,
            Outcome::Button {
                verdict: ClickVerdict::Cancel { .. }
            }
        ));
        assert!(engine.adapter().effects().contains(&Effect::CancelPress {
            button: MouseButton::Right
        }));
        assert_eq!(engine.stats().presses_cancelled, 1);
    }

    #[test]
    fn test_effect_failure_does_not_roll_back_state() {
        let engine = FilterEngine::new(FilterConfig::smoothing(), RecordingAdapter::failing())
            .unwrap();
        engine.on_position_sample(TimedSample::new(0.0, 0.0, 0.0));
        engine.on_position_sample(TimedSample::new(0.01, 100.0, 0.0));

        assert_eq!(engine.filter_state().unwrap().ref_pos, Point::new(25.0, 0.0));
        assert_eq!(engine.stats().effect_failures, 1);

        // The flag is cleared even though the effect failed.
        let outcome = engine.on_position_sample(TimedSample::new(0.02, 100.0, 0.0));
        assert!(matches!(outcome, Outcome::Position { .. }));
    }

    #[test]
    fn test_shutdown_ignores_events_and_releases_history() {
        let engine = engine(FilterConfig::discrete());
        engine.on_position_sample(TimedSample::new(0.0, 0.0, 0.0));
        engine.shutdown();
        engine.shutdown();

        assert!(!engine.is_running());
        assert_eq!(engine.history_len(), 0);
        assert_eq!(
            engine.on_position_sample(TimedSample::new(0.1, 5.0, 5.0)),
            Outcome::Ignored {
                reason: IgnoreReason::ShutDown
            }
        );
        assert_eq!(
            engine.on_button_event(ClickEvent::press(0.1, MouseButton::Left, 5.0, 5.0)),
            Outcome::Ignored {
                reason: IgnoreReason::ShutDown
            }
        );
        assert_eq!(engine.stats().ignored, 2);
    }

    #[test]
    fn test_reset_reseeds_and_clears_history() {
        let engine = engine(FilterConfig::discrete());
        engine.on_position_sample(TimedSample::new(0.0, 0.0, 0.0));
        engine.reset();
        assert_eq!(engine.filter_state(), None);
        assert_eq!(engine.history_len(), 0);

        let outcome = engine.on_position_sample(TimedSample::new(0.01, 400.0, 400.0));
        assert!(matches!(
            outcome,
            Outcome::Position {
                decision: Decision::Seed { .. }
            }
        ));
    }

    #[test]
    fn test_swap_policy_validates() {
        let engine = engine(FilterConfig::discrete());
        let bad = PolicyConfig::Smoothing(SmoothingParams {
            max_step: 0.0,
            ..SmoothingParams::default()
        });
        assert!(engine.swap_policy(bad).is_err());
        assert!(matches!(engine.policy(), PolicyConfig::Discrete(_)));

        let good = PolicyConfig::Smoothing(SmoothingParams::default());
        engine.swap_policy(good).unwrap();
        assert_eq!(engine.policy(), good);
    }
}
