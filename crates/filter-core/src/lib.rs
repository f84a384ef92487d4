//! Steadyhand Filter Core
//!
//! The tremor filtering engine:
//! - **Motion filter:** classifies each raw pointer sample as tremor to
//!   suppress, motion to ease toward, or intentional motion to accept
//! - **Click gate:** cancels button presses that follow a sudden displacement
//! - **Sample history:** short time window of raw samples for the click gate
//! - **Engine:** owns the above and drives an [`OutputAdapter`]
//!
//! This crate performs no I/O. Events come in through
//! [`FilterEngine::on_position_sample`] and [`FilterEngine::on_button_event`];
//! corrections go out through the adapter.

pub mod adapter;
pub mod click_gate;
pub mod diagnostics;
pub mod engine;
pub mod event;
pub mod geometry;
pub mod history;
pub mod motion;

pub use adapter::{Effect, NullAdapter, OutputAdapter, RecordingAdapter};
pub use click_gate::{ClickGate, ClickVerdict};
pub use diagnostics::{DecisionRecord, DecisionSink};
pub use engine::{EngineStats, FilterEngine, IgnoreReason, Outcome};
pub use event::{ClickEvent, EngineEvent, MouseButton, RawEvent, TimedSample};
pub use geometry::Point;
pub use motion::{Decision, FilterState, MotionFilter, MotionPolicy, SuppressReason};
