use crate::history::{TipHistory, TipSample};
use glam::{Quat, Vec3};
use swing_imu::FrameAdapter;

/// Motion gate for history recording.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackingParams {
    /// Deviation from gravity (m/s^2) that opens the window.
    pub motion_threshold: f32,
    /// Longest span of history kept, in seconds.
    pub max_duration_s: f32,
}

impl Default for TrackingParams {
    fn default() -> Self {
        Self {
            motion_threshold: 2.0,
            max_duration_s: 2.0,
        }
    }
}

enum TrackingWindow {
    Idle,
    Active { opened_ms: f64 },
}

/// Tracks the virtual club tip from the fused device orientation.
///
/// Positions are course-frame (x lateral, y up, z away) and relative to
/// the ball once [`TipTracker::calibrate`] has run.
pub struct TipTracker {
    adapter: FrameAdapter,
    params: TrackingParams,
    /// Calibration vector captured when the ball is set.
    offset: Vec3,
    /// Tip before offset subtraction.
    raw: Vec3,
    position: Vec3,
    velocity_hint: Vec3,
    history: TipHistory,
    window: TrackingWindow,
}

impl TipTracker {
    pub fn new(adapter: FrameAdapter, params: TrackingParams) -> Self {
        Self {
            adapter,
            params,
            offset: Vec3::ZERO,
            raw: Vec3::ZERO,
            position: Vec3::ZERO,
            velocity_hint: Vec3::ZERO,
            history: TipHistory::default(),
            window: TrackingWindow::Idle,
        }
    }

    /// Recompute the tip from a new orientation and return its position.
    ///
    /// The club hangs along device -Y from the grip. Adding the club length
    /// back on world Y puts the un-rotated tip at the origin.
    pub fn update(&mut self, orientation: Quat, club_length: f32) -> Vec3 {
        let world = orientation * Vec3::new(0.0, -club_length, 0.0)
            + Vec3::new(0.0, club_length, 0.0);
        if !world.is_finite() {
            tracing::trace!(?orientation, "Ignoring non-finite tip position");
            return self.position;
        }

        self.raw = self.adapter.to_course(world);
        self.position = self.raw - self.offset;
        self.position
    }

    /// Feed the motion gate and record the current position while it is open.
    ///
    /// `motion` is the accelerometer's deviation from gravity in m/s^2.
    /// Returns whether the sample was recorded.
    pub fn track(&mut self, motion: f32, timestamp_ms: f64) -> bool {
        let max_ms = self.params.max_duration_s as f64 * 1000.0;

        if let TrackingWindow::Active { opened_ms } = self.window {
            if timestamp_ms - opened_ms > max_ms {
                self.window = TrackingWindow::Idle;
                tracing::debug!(timestamp_ms, "Tracking window closed");
            }
        }

        if let TrackingWindow::Idle = self.window {
            if motion > self.params.motion_threshold {
                self.window = TrackingWindow::Active {
                    opened_ms: timestamp_ms,
                };
                tracing::debug!(motion, timestamp_ms, "Tracking window opened");
            } else {
                return false;
            }
        }

        self.history.push(TipSample {
            position: self.position,
            timestamp_ms,
        });
        self.history.evict_older_than(timestamp_ms - max_ms);
        self.velocity_hint = self.history.latest_velocity();
        true
    }

    /// Make the current tip position the origin.
    ///
    /// The offset accumulates, so calibrating twice without movement leaves
    /// the tip at the origin both times.
    pub fn calibrate(&mut self) {
        self.offset += self.position;
        self.position = self.raw - self.offset;
        self.history.clear();
        self.velocity_hint = Vec3::ZERO;
        self.window = TrackingWindow::Idle;
        tracing::info!(offset = ?self.offset, "Tip calibrated");
    }

    /// Cancel recording without touching calibration.
    pub fn stop_tracking(&mut self) {
        self.history.clear();
        self.velocity_hint = Vec3::ZERO;
        self.window = TrackingWindow::Idle;
    }

    pub fn reset(&mut self) {
        self.offset = Vec3::ZERO;
        self.raw = Vec3::ZERO;
        self.position = Vec3::ZERO;
        self.stop_tracking();
    }

    pub fn set_params(&mut self, adapter: FrameAdapter, params: TrackingParams) {
        self.adapter = adapter;
        self.params = params;
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn offset(&self) -> Vec3 {
        self.offset
    }

    pub fn velocity_hint(&self) -> Vec3 {
        self.velocity_hint
    }

    pub fn history(&self) -> &TipHistory {
        &self.history
    }

    pub fn is_tracking(&self) -> bool {
        matches!(self.window, TrackingWindow::Active { .. })
    }

    pub fn adapter(&self) -> FrameAdapter {
        self.adapter
    }
}
