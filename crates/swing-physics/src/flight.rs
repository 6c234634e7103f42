//! Ballistic flight with gravity, Magnus curve, and drag.
//!
//! Per-tick order is fixed: gravity, Magnus + spin decay, drag, position,
//! max height, ground contact. Each step reads what the previous one wrote.

use crate::impact::{Impact, VelocityEstimate};
use crate::result::ShotResult;
use glam::Vec3;
use swing_config::{AppConfig, PhysicsConfig};

/// Ticks longer than this (seconds) are skipped instead of integrated.
pub const MAX_TICK_S: f32 = 0.1;

/// Spin kept per tick.
pub const SPIN_DECAY: f32 = 0.98;

/// Flights still airborne after this long are force-landed.
pub const MAX_FLIGHT_S: f32 = 30.0;

/// Ball weight (g) at which launch scaling is neutral.
pub const REFERENCE_BALL_WEIGHT_G: f32 = 45.9;

const MAGNUS_SCALE: f32 = 1e-5;
const DRAG_SCALE: f32 = 0.01;

pub struct FlightState {
    position: Vec3,
    velocity: Vec3,
    spin: Vec3,
    initial_spin: Vec3,
    launch_velocity: Vec3,
    flying: bool,
    trajectory: Vec<Vec3>,
    max_height: f32,
    elapsed_s: f32,
    impact_speed: f32,
    estimate: VelocityEstimate,
    launched_ms: f64,
    result: Option<ShotResult>,
}

impl FlightState {
    /// Ball at the tee with the given velocity and spin.
    pub fn new(launch_velocity: Vec3, spin: Vec3) -> Self {
        Self {
            position: Vec3::ZERO,
            velocity: launch_velocity,
            spin,
            initial_spin: spin,
            launch_velocity,
            flying: true,
            trajectory: vec![Vec3::ZERO],
            max_height: 0.0,
            elapsed_s: 0.0,
            impact_speed: 0.0,
            estimate: VelocityEstimate::History,
            launched_ms: 0.0,
            result: None,
        }
    }

    /// Launch from a resolved impact. A lighter ball leaves proportionally faster.
    pub fn launch(impact: &Impact, config: &AppConfig, timestamp_ms: f64) -> Self {
        let ball_scale = REFERENCE_BALL_WEIGHT_G / config.ball.weight_g;
        let velocity = crate::impact::finite_or_zero(impact.launch_velocity * ball_scale);

        tracing::info!(
            velocity = ?velocity,
            spin = ?impact.spin,
            "Ball launched"
        );

        Self {
            impact_speed: impact.impact_speed(),
            estimate: impact.estimate,
            launched_ms: timestamp_ms,
            ..Self::new(velocity, impact.spin)
        }
    }

    /// Advance the ball by `dt` seconds.
    ///
    /// Returns `true` on the tick the ball lands. Stale ticks and ticks after
    /// landing do nothing.
    pub fn step(&mut self, dt: f32, physics: &PhysicsConfig) -> bool {
        if !self.flying {
            return false;
        }
        if !(dt > 0.0) || dt > MAX_TICK_S {
            tracing::debug!(dt, "Skipping stale flight tick");
            return false;
        }

        self.velocity.y -= physics.gravity * dt;

        if physics.spin_effect > 0.0 {
            let magnus = self.spin.cross(self.velocity) * (physics.spin_effect * MAGNUS_SCALE);
            let dv = magnus * dt;
            if dv.x.is_finite() {
                self.velocity.x += dv.x;
            }
            if dv.y.is_finite() {
                self.velocity.y += dv.y;
            }
            if dv.z.is_finite() {
                self.velocity.z += dv.z;
            }
            self.spin *= SPIN_DECAY;
        }

        if physics.air_resistance > 0.0 {
            let keep = 1.0 - physics.air_resistance * DRAG_SCALE;
            self.velocity.x *= keep;
            self.velocity.z *= keep;
            // Descent is left undamped.
            if self.velocity.y > 0.0 {
                self.velocity.y *= keep;
            }
        }

        self.position += self.velocity * dt;
        self.trajectory.push(self.position);
        self.elapsed_s += dt;
        self.max_height = self.max_height.max(self.position.y);

        let grounded = self.position.y <= 0.0 && self.velocity.y < 0.0;
        if grounded || self.elapsed_s >= MAX_FLIGHT_S {
            if !grounded {
                tracing::warn!(elapsed_s = self.elapsed_s, "Flight time cap reached");
            }
            self.land();
            return true;
        }
        false
    }

    fn land(&mut self) {
        self.position.y = 0.0;
        self.flying = false;

        let landing_distance =
            (self.position.x * self.position.x + self.position.z * self.position.z).sqrt();
        let launch = self.launch_velocity;
        let horizontal = (launch.x * launch.x + launch.z * launch.z).sqrt();

        let result = ShotResult {
            launch_velocity: launch,
            spin: self.initial_spin,
            backspin: -self.initial_spin.x,
            sidespin: self.initial_spin.y,
            trajectory: self.trajectory.clone(),
            landing_distance,
            lateral_offset: self.position.x,
            max_height: self.max_height,
            flight_time_s: self.elapsed_s,
            impact_speed: self.impact_speed,
            launch_speed: launch.length(),
            launch_angle_deg: launch.y.atan2(horizontal).to_degrees(),
            velocity_estimate: self.estimate,
            timestamp_ms: self.launched_ms,
        };

        tracing::info!(
            distance = result.landing_distance,
            max_height = result.max_height,
            flight_time_s = result.flight_time_s,
            "Ball landed"
        );
        self.result = Some(result);
    }

    pub fn is_flying(&self) -> bool {
        self.flying
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn velocity(&self) -> Vec3 {
        self.velocity
    }

    pub fn spin(&self) -> Vec3 {
        self.spin
    }

    pub fn trajectory(&self) -> &[Vec3] {
        &self.trajectory
    }

    pub fn max_height(&self) -> f32 {
        self.max_height
    }

    /// Set once the ball has landed.
    pub fn result(&self) -> Option<&ShotResult> {
        self.result.as_ref()
    }
}
