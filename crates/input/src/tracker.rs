//! Shared pointer position estimate for relative-motion devices.
//!
//! `/dev/input/mice` reports relative motion, including motion injected by
//! our own virtual pointer. The tracker integrates every packet into an
//! absolute pixel estimate and remembers how much injected motion and which
//! synthesized releases have not been echoed back yet, so the source can
//! recognise its own corrections and not report them as new samples.

use parking_lot::Mutex;
use steadyhand_filter_core::{MouseButton, Point};

#[derive(Debug)]
struct TrackerState {
    x: f64,
    y: f64,
    max_x: f64,
    max_y: f64,
    pending_dx: i32,
    pending_dy: i32,
    pending_releases: Vec<MouseButton>,
}

/// Absolute position estimate shared by a relative input source and the output adapter.
#[derive(Debug)]
pub struct PointerTracker {
    state: Mutex<TrackerState>,
}

/// How one relative packet was interpreted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionUpdate {
    /// Position after applying the packet.
    pub pos: Point,
    /// The packet was entirely our own injected motion. A packet mixing
    /// injected and physical motion is not an echo, but its injected part
    /// is still consumed.
    pub echo: bool,
}

impl PointerTracker {
    /// Start in the middle of a `width` x `height` screen.
    pub fn new(width: u32, height: u32) -> Self {
        let max_x = width.max(1) as f64 - 1.0;
        let max_y = height.max(1) as f64 - 1.0;
        Self {
            state: Mutex::new(TrackerState {
                x: (max_x / 2.0).round(),
                y: (max_y / 2.0).round(),
                max_x,
                max_y,
                pending_dx: 0,
                pending_dy: 0,
                pending_releases: Vec::new(),
            }),
        }
    }

    pub fn position(&self) -> Point {
        let st = self.state.lock();
        Point::new(st.x, st.y)
    }

    /// Apply one relative packet (screen-oriented: +y is down).
    pub fn apply_motion(&self, dx: i32, dy: i32) -> MotionUpdate {
        let mut st = self.state.lock();
        st.x = (st.x + dx as f64).clamp(0.0, st.max_x);
        st.y = (st.y + dy as f64).clamp(0.0, st.max_y);

        let own_x = injected_share(st.pending_dx, dx);
        let own_y = injected_share(st.pending_dy, dy);
        st.pending_dx -= own_x;
        st.pending_dy -= own_y;

        let echo = (dx != 0 || dy != 0) && own_x == dx && own_y == dy;
        MotionUpdate {
            pos: Point::new(st.x, st.y),
            echo,
        }
    }

    /// Plan a move to `target` and record it as pending echo.
    ///
    /// Returns the relative motion to inject, measured from where the cursor
    /// will be once every earlier injected move has landed.
    pub fn plan_move(&self, target: Point) -> (i32, i32) {
        let mut st = self.state.lock();
        let expected_x = st.x + st.pending_dx as f64;
        let expected_y = st.y + st.pending_dy as f64;
        let tx = target.x.clamp(0.0, st.max_x);
        let ty = target.y.clamp(0.0, st.max_y);
        let dx = (tx - expected_x).round() as i32;
        let dy = (ty - expected_y).round() as i32;
        st.pending_dx += dx;
        st.pending_dy += dy;
        (dx, dy)
    }

    /// Remember that a release of `button` was synthesized.
    pub fn expect_release(&self, button: MouseButton) {
        self.state.lock().pending_releases.push(button);
    }

    /// Returns true (and forgets it) if a release of `button` was synthesized by us.
    pub fn take_expected_release(&self, button: MouseButton) -> bool {
        let mut st = self.state.lock();
        match st.pending_releases.iter().position(|b| *b == button) {
            Some(idx) => {
                st.pending_releases.remove(idx);
                true
            }
            None => false,
        }
    }
}

/// Part of `delta` on one axis that is explained by pending injected motion.
fn injected_share(pending: i32, delta: i32) -> i32 {
    if pending.signum() != delta.signum() {
        return 0;
    }
    delta.signum() * pending.abs().min(delta.abs())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_centered_and_clamps() {
        let tracker = PointerTracker::new(1920, 1080);
        assert_eq!(tracker.position(), Point::new(960.0, 540.0));

        let update = tracker.apply_motion(-5000, 5000);
        assert_eq!(update.pos, Point::new(0.0, 1079.0));
        assert!(!update.echo);
    }

    #[test]
    fn test_injected_motion_recognised_as_echo() {
        let tracker = PointerTracker::new(1920, 1080);
        let (dx, dy) = tracker.plan_move(Point::new(1160.0, 440.0));
        assert_eq!((dx, dy), (200, -100));

        // The kernel may split a large move over several packets.
        assert!(tracker.apply_motion(127, -100).echo);
        assert!(tracker.apply_motion(73, 0).echo);
        assert_eq!(tracker.position(), Point::new(1160.0, 440.0));

        // Nothing left pending: real motion is reported.
        assert!(!tracker.apply_motion(1, 0).echo);
    }

    #[test]
    fn test_plan_move_accounts_for_pending_motion() {
        let tracker = PointerTracker::new(1920, 1080);
        assert_eq!(tracker.plan_move(Point::new(1000.0, 540.0)), (40, 0));
        // First move not echoed yet; second target is measured from 1000.
        assert_eq!(tracker.plan_move(Point::new(990.0, 540.0)), (-10, 0));
    }

    #[test]
    fn test_mixed_packet_consumes_only_injected_share() {
        let tracker = PointerTracker::new(1920, 1080);
        assert_eq!(tracker.plan_move(Point::new(970.0, 540.0)), (10, 0));

        // Physical motion merged into the same packet as the echo.
        let mixed = tracker.apply_motion(15, 2);
        assert!(!mixed.echo);
        assert_eq!(mixed.pos, Point::new(975.0, 542.0));

        // The echo was used up, so later real motion is reported.
        assert!(!tracker.apply_motion(5, 0).echo);
        assert_eq!(tracker.plan_move(Point::new(990.0, 542.0)), (10, 0));
    }

    #[test]
    fn test_opposite_motion_is_not_echo() {
        let tracker = PointerTracker::new(1920, 1080);
        tracker.plan_move(Point::new(1000.0, 540.0));
        assert!(!tracker.apply_motion(-3, 0).echo);
    }

    #[test]
    fn test_expected_release_consumed_once() {
        let tracker = PointerTracker::new(800, 600);
        tracker.expect_release(MouseButton::Left);
        assert!(!tracker.take_expected_release(MouseButton::Right));
        assert!(tracker.take_expected_release(MouseButton::Left));
        assert!(!tracker.take_expected_release(MouseButton::Left));
    }
}
