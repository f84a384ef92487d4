//! Structured per-decision records for diagnostics.
//!
//! A sink is optional. Sink failures are logged and otherwise ignored so
//! diagnostics can never change what the filter does.

use serde::{Deserialize, Serialize};
use steadyhand_common::error::SteadyResult;

use crate::click_gate::ClickVerdict;
use crate::event::{ClickEvent, MouseButton, TimedSample};
use crate::motion::{Decision, Measurement};

/// One filter decision, as written to a diagnostics sink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionRecord {
    /// Sample time (s).
    pub t: f64,
    pub x: f64,
    pub y: f64,
    #[serde(flatten)]
    pub detail: RecordDetail,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RecordDetail {
    Position {
        outcome: Decision,
        dist: Option<f64>,
        dt: Option<f64>,
        speed: Option<f64>,
    },
    Button {
        button: MouseButton,
        pressed: bool,
        outcome: ClickVerdict,
    },
}

impl DecisionRecord {
    pub fn position(sample: &TimedSample, outcome: Decision, m: Option<Measurement>) -> Self {
        Self {
            t: sample.time,
            x: sample.pos.x,
            y: sample.pos.y,
            detail: RecordDetail::Position {
                outcome,
                dist: m.map(|m| m.dist),
                dt: m.map(|m| m.dt),
                speed: m.and_then(|m| m.speed()),
            },
        }
    }

    pub fn button(event: &ClickEvent, outcome: ClickVerdict) -> Self {
        Self {
            t: event.time,
            x: event.pos.x,
            y: event.pos.y,
            detail: RecordDetail::Button {
                button: event.button,
                pressed: event.pressed,
                outcome,
            },
        }
    }
}

/// Receives decision records.
pub trait DecisionSink: Send {
    fn record(&mut self, record: &DecisionRecord) -> SteadyResult<()>;

    fn flush(&mut self) -> SteadyResult<()> {
        Ok(())
    }
}

/// Sink that keeps records in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub records: Vec<DecisionRecord>,
}

impl DecisionSink for MemorySink {
    fn record(&mut self, record: &DecisionRecord) -> SteadyResult<()> {
        self.records.push(record.clone());
        Ok(())
    }
}
