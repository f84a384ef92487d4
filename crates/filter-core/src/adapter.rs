//! Outbound effects the engine asks its host to perform.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use steadyhand_common::error::{SteadyError, SteadyResult};

use crate::event::MouseButton;
use crate::geometry::Point;

/// Trait for cursor output adapters.
///
/// Effects are fire-and-forget: a failure is logged by the engine and
/// never rolls back filter state.
pub trait OutputAdapter: Send + Sync {
    /// Move the system cursor to an absolute position.
    fn reposition(&self, point: Point) -> SteadyResult<()>;

    /// Synthesize a release of `button` to nullify a press.
    fn cancel_press(&self, button: MouseButton) -> SteadyResult<()>;

    /// Adapter name for logging.
    fn name(&self) -> &str;
}

impl<T: OutputAdapter + ?Sized> OutputAdapter for Box<T> {
    fn reposition(&self, point: Point) -> SteadyResult<()> {
        (**self).reposition(point)
    }

    fn cancel_press(&self, button: MouseButton) -> SteadyResult<()> {
        (**self).cancel_press(button)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// An effect issued by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum Effect {
    Reposition { x: f64, y: f64 },
    CancelPress { button: MouseButton },
}

/// Adapter that discards every effect.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullAdapter;

impl OutputAdapter for NullAdapter {
    fn reposition(&self, _point: Point) -> SteadyResult<()> {
        Ok(())
    }

    fn cancel_press(&self, _button: MouseButton) -> SteadyResult<()> {
        Ok(())
    }

    fn name(&self) -> &str {
        "null"
    }
}

/// Adapter that records effects in memory. Used by replay and tests.
#[derive(Debug, Default)]
pub struct RecordingAdapter {
    effects: Mutex<Vec<Effect>>,
    fail: bool,
}

impl RecordingAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// An adapter whose every effect fails after being recorded.
    pub fn failing() -> Self {
        Self {
            effects: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    /// Snapshot of all effects issued so far.
    pub fn effects(&self) -> Vec<Effect> {
        self.effects.lock().clone()
    }

    fn push(&self, effect: Effect) -> SteadyResult<()> {
        self.effects.lock().push(effect);
        if self.fail {
            return Err(SteadyError::output("recording adapter configured to fail"));
        }
        Ok(())
    }
}

impl OutputAdapter for RecordingAdapter {
    fn reposition(&self, point: Point) -> SteadyResult<()> {
        self.push(Effect::Reposition {
            x: point.x,
            y: point.y,
        })
    }

    fn cancel_press(&self, button: MouseButton) -> SteadyResult<()> {
        self.push(Effect::CancelPress { button })
    }

    fn name(&self) -> &str {
        "recording"
    }
}
