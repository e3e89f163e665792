//! Drag-to-rotate interaction state.

/// Rotation applied per logical pixel of horizontal drag.
pub const DEGREES_PER_DRAG_UNIT: f32 = 0.5;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub enum TrackingState {
    #[default]
    Idle,
    Tracking,
}

/// Click-drag rotation editing of the selected object.
///
/// The tracker only accumulates a rotation delta; the renderer applies it to
/// the selected transform during `update` and drains it with
/// [`Tracker::take_delta`]. Updates while idle are dropped. Motion recorded
/// before `stop_tracking` is still applied by the next `update`.
#[derive(Debug, Clone)]
pub struct Tracker {
    state: TrackingState,
    pending_radians: f32,
    degrees_per_unit: f32,
}

impl Default for Tracker {
    fn default() -> Self {
        Self::new(DEGREES_PER_DRAG_UNIT)
    }
}

impl Tracker {
    pub fn new(degrees_per_unit: f32) -> Self {
        Self {
            state: TrackingState::Idle,
            pending_radians: 0.0,
            degrees_per_unit,
        }
    }

    /// Idle → Tracking. Calling it while already tracking changes nothing.
    pub fn start_tracking(&mut self) {
        if self.state == TrackingState::Idle {
            log::debug!("tracking: start");
            self.state = TrackingState::Tracking;
        }
    }

    /// Accumulates a 1-D drag delta in logical pixels. No-op while idle.
    pub fn tracking_update(&mut self, position_delta: f32) {
        if self.state != TrackingState::Tracking {
            return;
        }
        self.pending_radians += (position_delta * self.degrees_per_unit).to_radians();
    }

    /// Tracking → Idle. Accumulated rotation stays pending until drained.
    pub fn stop_tracking(&mut self) {
        if self.state == TrackingState::Tracking {
            log::debug!("tracking: stop");
        }
        self.state = TrackingState::Idle;
    }

    /// Drops accumulated rotation without applying it.
    pub fn cancel(&mut self) {
        self.state = TrackingState::Idle;
        self.pending_radians = 0.0;
    }

    #[inline]
    pub fn is_tracking(&self) -> bool {
        self.state == TrackingState::Tracking
    }

    #[inline]
    pub fn state(&self) -> TrackingState {
        self.state
    }

    #[inline]
    pub fn degrees_per_unit(&self) -> f32 {
        self.degrees_per_unit
    }

    /// Drains the accumulated rotation (radians). `None` when nothing moved
    /// since the last call.
    pub fn take_delta(&mut self) -> Option<f32> {
        if self.pending_radians == 0.0 {
            return None;
        }
        Some(std::mem::take(&mut self.pending_radians))
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    // ── transitions ───────────────────────────────────────────────────────

    #[test]
    fn starts_idle() {
        let t = Tracker::default();
        assert_eq!(t.state(), TrackingState::Idle);
        assert!(!t.is_tracking());
    }

    #[test]
    fn start_twice_stays_tracking() {
        let mut t = Tracker::default();
        t.start_tracking();
        t.start_tracking();
        assert!(t.is_tracking());
        t.stop_tracking();
        assert!(!t.is_tracking());
    }

    #[test]
    fn stop_while_idle_is_noop() {
        let mut t = Tracker::default();
        t.stop_tracking();
        assert_eq!(t.state(), TrackingState::Idle);
    }

    // ── deltas ────────────────────────────────────────────────────────────

    #[test]
    fn update_while_idle_produces_no_delta() {
        let mut t = Tracker::default();
        t.tracking_update(100.0);
        assert_eq!(t.take_delta(), None);

        // Starting afterwards does not resurrect the dropped motion.
        t.start_tracking();
        assert_eq!(t.take_delta(), None);
    }

    #[test]
    fn delta_uses_sensitivity() {
        let mut t = Tracker::default();
        t.start_tracking();
        t.tracking_update(90.0);
        t.tracking_update(90.0);
        let d = t.take_delta().unwrap();
        assert_relative_eq!(d, (180.0 * DEGREES_PER_DRAG_UNIT).to_radians(), epsilon = 1e-6);
        assert_eq!(t.take_delta(), None);
    }

    #[test]
    fn stop_keeps_pending_delta() {
        let mut t = Tracker::new(1.0);
        t.start_tracking();
        t.tracking_update(10.0);
        t.stop_tracking();
        assert!(!t.is_tracking());
        assert_relative_eq!(t.take_delta().unwrap(), 10.0f32.to_radians(), epsilon = 1e-6);
        assert_eq!(t.take_delta(), None);
    }

    #[test]
    fn cancel_discards_pending_delta() {
        let mut t = Tracker::new(1.0);
        t.start_tracking();
        t.tracking_update(10.0);
        t.cancel();
        assert!(!t.is_tracking());
        assert_eq!(t.take_delta(), None);
    }
}
