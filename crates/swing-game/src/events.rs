use crate::state::GameState;
use glam::Vec3;
use swing_physics::{ShotResult, VelocityEstimate};

/// Notifications for the host, drained once per frame.
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    StateChanged {
        from: GameState,
        to: GameState,
    },
    /// The club met the ball and the ball is in the air.
    Hit {
        impact_velocity: Vec3,
        impact_speed: f32,
        estimate: VelocityEstimate,
    },
    /// The swing timer ran out before a hit.
    Timeout,
    Landed(ShotResult),
}
