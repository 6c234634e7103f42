//! Session state and hit conditions.

use glam::{Quat, Vec3};
use swing_config::AppConfig;
use swing_tracker::TipHistory;

/// Samples inspected for proof of a backswing.
pub const BACKSWING_SAMPLES: usize = 20;

/// Distance (m) the tip must have reached recently for a hit to count.
pub const MIN_BACKSWING_M: f32 = 0.15;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GameState {
    ReadyToSetBall,
    BallSetReadyToSwing,
    Swinging,
    BallFlying,
    ShowingResults,
}

impl GameState {
    pub fn name(&self) -> &'static str {
        match self {
            GameState::ReadyToSetBall => "READY_TO_SET_BALL",
            GameState::BallSetReadyToSwing => "BALL_SET_READY_TO_SWING",
            GameState::Swinging => "SWINGING",
            GameState::BallFlying => "BALL_FLYING",
            GameState::ShowingResults => "SHOWING_RESULTS",
        }
    }

    /// States in which the swing timer runs and hits are checked.
    pub fn is_swing_window(&self) -> bool {
        matches!(self, GameState::BallSetReadyToSwing | GameState::Swinging)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SwingTimer {
    pub start_ms: f64,
    pub remaining_s: f32,
    pub expired: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct HitRecord {
    pub detected: bool,
    pub time_ms: f64,
    /// Club tip velocity at impact (m/s).
    pub impact_velocity: Vec3,
}

/// One tee-up: from `set_ball_position` until the next one or a reset.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SwingSession {
    pub timer: SwingTimer,
    pub hit: HitRecord,
    /// Device yaw at tee-up. Attitudes are turned by its inverse, so the
    /// direction the player faced when setting the ball is course +Z.
    pub yaw_reference: Quat,
}

impl SwingSession {
    pub fn new(now_ms: f64, timeout_s: f32, yaw_reference: Quat) -> Self {
        Self {
            timer: SwingTimer {
                start_ms: now_ms,
                remaining_s: timeout_s,
                expired: false,
            },
            hit: HitRecord::default(),
            yaw_reference,
        }
    }
}

/// Whether the tip is striking the ball right now.
///
/// All three must hold: the tip is inside the hit zone, the device is
/// accelerating harder than `min_swing_speed`, and the tip was at least
/// [`MIN_BACKSWING_M`] away within the last [`BACKSWING_SAMPLES`] samples.
pub fn is_hit(tip: Vec3, accel_magnitude: f32, history: &TipHistory, config: &AppConfig) -> bool {
    tip.length() < config.hit_zone_radius_m()
        && accel_magnitude > config.swing.min_swing_speed
        && history.max_distance_recent(BACKSWING_SAMPLES) > MIN_BACKSWING_M
}
