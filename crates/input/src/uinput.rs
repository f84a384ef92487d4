//! Cursor output through an evdev uinput virtual pointer.

use std::sync::Arc;

use evdev::uinput::{VirtualDevice, VirtualDeviceBuilder};
use evdev::{AttributeSet, EventType, InputEvent, Key, RelativeAxisType};
use parking_lot::Mutex;
use steadyhand_common::error::{SteadyError, SteadyResult};
use steadyhand_filter_core::{MouseButton, OutputAdapter, Point};

use crate::tracker::PointerTracker;

const DEVICE_NAME: &str = "steadyhand virtual pointer";

/// Injects corrective motion and synthesized releases via `/dev/uinput`.
pub struct UinputPointer {
    device: Mutex<VirtualDevice>,
    tracker: Arc<PointerTracker>,
}

impl UinputPointer {
    pub fn new(tracker: Arc<PointerTracker>) -> SteadyResult<Self> {
        let mut keys = AttributeSet::<Key>::new();
        for button in [
            MouseButton::Left,
            MouseButton::Right,
            MouseButton::Middle,
            MouseButton::Back,
            MouseButton::Forward,
        ] {
            keys.insert(key_for(button));
        }

        let mut axes = AttributeSet::<RelativeAxisType>::new();
        axes.insert(RelativeAxisType::REL_X);
        axes.insert(RelativeAxisType::REL_Y);

        let device = VirtualDeviceBuilder::new()
            .and_then(|builder| builder.name(DEVICE_NAME).with_keys(&keys))
            .and_then(|builder| builder.with_relative_axes(&axes))
            .and_then(|builder| builder.build())
            .map_err(|e| {
                SteadyError::output(format!("Failed to create uinput virtual pointer: {e}"))
            })?;

        tracing::info!(name = DEVICE_NAME, "Virtual pointer created");
        Ok(Self {
            device: Mutex::new(device),
            tracker,
        })
    }

    fn emit(&self, events: &[InputEvent]) -> SteadyResult<()> {
        self.device
            .lock()
            .emit(events)
            .map_err(|e| SteadyError::output(format!("Failed to emit uinput events: {e}")))
    }
}

impl OutputAdapter for UinputPointer {
    fn reposition(&self, point: Point) -> SteadyResult<()> {
        let (dx, dy) = self.tracker.plan_move(point);
        if dx == 0 && dy == 0 {
            return Ok(());
        }
        tracing::debug!(dx, dy, x = point.x, y = point.y, "Repositioning cursor");
        self.emit(&[
            InputEvent::new(EventType::RELATIVE, RelativeAxisType::REL_X.0, dx),
            InputEvent::new(EventType::RELATIVE, RelativeAxisType::REL_Y.0, dy),
        ])
    }

    fn cancel_press(&self, button: MouseButton) -> SteadyResult<()> {
        self.tracker.expect_release(button);
        tracing::debug!(?button, "Synthesizing release");
        self.emit(&[InputEvent::new(EventType::KEY, key_for(button).code(), 0)])
    }

    fn name(&self) -> &str {
        "uinput"
    }
}

fn key_for(button: MouseButton) -> Key {
    match button {
        MouseButton::Left => Key::BTN_LEFT,
        MouseButton::Right => Key::BTN_RIGHT,
        MouseButton::Middle => Key::BTN_MIDDLE,
        MouseButton::Back => Key::BTN_SIDE,
        MouseButton::Forward => Key::BTN_EXTRA,
    }
}

/// Whether `/dev/uinput` can be opened for writing.
pub fn uinput_available() -> bool {
    std::fs::OpenOptions::new()
        .write(true)
        .open("/dev/uinput")
        .is_ok()
}
