//! Pointer events consumed by the filter engine.
//!
//! The engine works on [`TimedSample`] and [`ClickEvent`], timestamped in
//! seconds. Recorded streams use [`RawEvent`], an append-only JSONL format
//! with nanosecond timestamps:
//!
//! ```text
//! # {"schema_version":"1.0", ...}
//! {"t":0,"type":"pointer","x":100.0,"y":100.0}
//! {"t":20000000,"type":"click","button":"left","state":"down","x":102.0,"y":101.0}
//! ```

use serde::{Deserialize, Serialize};
use steadyhand_common::clock::EngineClock;

use crate::geometry::Point;

/// Monotonic timestamp in nanoseconds since session start.
pub type TimestampNs = u64;

/// A raw pointer position with the time it was observed (seconds).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimedSample {
    pub time: f64,
    pub pos: Point,
}

impl TimedSample {
    pub fn new(time: f64, x: f64, y: f64) -> Self {
        Self {
            time,
            pos: Point::new(x, y),
        }
    }
}

/// Mouse button identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MouseButton {
    Left,
    Right,
    Middle,
    Back,
    Forward,
}

/// Button state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ButtonState {
    Down,
    Up,
}

/// A button press or release at a position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClickEvent {
    pub time: f64,
    pub pos: Point,
    pub button: MouseButton,
    pub pressed: bool,
}

impl ClickEvent {
    pub fn press(time: f64, button: MouseButton, x: f64, y: f64) -> Self {
        Self {
            time,
            pos: Point::new(x, y),
            button,
            pressed: true,
        }
    }

    pub fn release(time: f64, button: MouseButton, x: f64, y: f64) -> Self {
        Self {
            pressed: false,
            ..Self::press(time, button, x, y)
        }
    }
}

/// An event ready to be fed to the engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EngineEvent {
    Position(TimedSample),
    Button(ClickEvent),
}

impl EngineEvent {
    pub fn time(&self) -> f64 {
        match self {
            EngineEvent::Position(sample) => sample.time,
            EngineEvent::Button(click) => click.time,
        }
    }
}

/// A single recorded input event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawEvent {
    #[serde(rename = "t")]
    pub timestamp_ns: TimestampNs,

    #[serde(flatten)]
    pub kind: RawEventKind,
}

/// Discriminated union of recorded event types.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RawEventKind {
    /// Absolute pointer position (px).
    Pointer { x: f64, y: f64 },

    /// Button press or release at a position (px).
    Click {
        button: MouseButton,
        state: ButtonState,
        x: f64,
        y: f64,
    },
}

impl RawEvent {
    /// Create a pointer event.
    pub fn pointer(timestamp_ns: TimestampNs, x: f64, y: f64) -> Self {
        Self {
            timestamp_ns,
            kind: RawEventKind::Pointer { x, y },
        }
    }

    /// Create a click event.
    pub fn click(
        timestamp_ns: TimestampNs,
        button: MouseButton,
        state: ButtonState,
        x: f64,
        y: f64,
    ) -> Self {
        Self {
            timestamp_ns,
            kind: RawEventKind::Click {
                button,
                state,
                x,
                y,
            },
        }
    }

    /// Timestamp as fractional seconds.
    pub fn timestamp_secs(&self) -> f64 {
        EngineClock::ns_to_secs(self.timestamp_ns)
    }

    /// Convert to the engine's event representation.
    pub fn to_engine_event(&self) -> EngineEvent {
        let time = self.timestamp_secs();
        match self.kind {
            RawEventKind::Pointer { x, y } => EngineEvent::Position(TimedSample::new(time, x, y)),
            RawEventKind::Click {
                button,
                state,
                x,
                y,
            } => EngineEvent::Button(ClickEvent {
                time,
                pos: Point::new(x, y),
                button,
                pressed: state == ButtonState::Down,
            }),
        }
    }
}

/// Parse a JSONL event stream. Blank lines and `#` header lines are skipped.
pub fn parse_events(jsonl: &str) -> Result<Vec<RawEvent>, serde_json::Error> {
    jsonl
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(serde_json::from_str)
        .collect()
}

/// Serialize events to JSONL, one event per line.
pub fn serialize_events(events: &[RawEvent]) -> Result<String, serde_json::Error> {
    let mut out = String::new();
    for event in events {
        out.push_str(&serde_json::to_string(event)?);
        out.push('\n');
    }
    Ok(out)
}
