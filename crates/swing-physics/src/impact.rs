//! Club-to-ball impact: tip velocity estimate, loft, scaling, and spin.
//!
//! All vectors are course-frame (x lateral, y up, z away). The tip tracker
//! already maps positions into that frame, so velocities derived from its
//! history need no further axis correction here.

use glam::Vec3;
use serde::{Deserialize, Serialize};
use swing_config::AppConfig;
use swing_tracker::TipHistory;

/// Samples spanned by the finite-difference velocity estimate.
pub const VELOCITY_SPAN: usize = 5;

/// Gain of the acceleration-based fallback estimator.
pub const FALLBACK_ACCEL_GAIN: f32 = 5.0;

/// Club weight (g) at which impact scaling is neutral.
pub const REFERENCE_CLUB_WEIGHT_G: f32 = 200.0;

const SIDESPIN_GAIN: f32 = 0.02;
const BACKSPIN_GAIN: f32 = 0.05;

/// Which estimator produced the club velocity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VelocityEstimate {
    /// Finite difference over the tip history.
    History,
    /// Too little history; scaled linear acceleration was used instead.
    AccelerationFallback,
}

/// Outcome of a registered hit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Impact {
    /// Estimated club tip velocity at impact (m/s).
    pub club_velocity: Vec3,
    /// Ball velocity leaving the face, before ball-weight scaling (m/s).
    pub launch_velocity: Vec3,
    /// Ball angular velocity (rad/s). Backspin turns about -x, sidespin about +y.
    pub spin: Vec3,
    pub estimate: VelocityEstimate,
}

impl Impact {
    pub fn impact_speed(&self) -> f32 {
        self.club_velocity.length()
    }

    /// Whether the fallback estimator was used.
    pub fn is_degraded(&self) -> bool {
        self.estimate == VelocityEstimate::AccelerationFallback
    }

    pub fn backspin(&self) -> f32 {
        -self.spin.x
    }

    pub fn sidespin(&self) -> f32 {
        self.spin.y
    }
}

/// Estimate the tip velocity at the newest history sample.
///
/// Uses the 5th-newest and newest samples. With fewer samples, falls back to
/// `linear_accel * 5`. Zero elapsed time yields zero velocity.
pub fn estimate_velocity(history: &TipHistory, linear_accel: Vec3) -> (Vec3, VelocityEstimate) {
    match (history.nth_latest(VELOCITY_SPAN - 1), history.latest()) {
        (Some(then), Some(now)) => {
            let dt = (now.timestamp_ms - then.timestamp_ms) / 1000.0;
            let velocity = if dt > 0.0 {
                (now.position - then.position) / dt as f32
            } else {
                Vec3::ZERO
            };
            (velocity, VelocityEstimate::History)
        }
        _ => (
            linear_accel * FALLBACK_ACCEL_GAIN,
            VelocityEstimate::AccelerationFallback,
        ),
    }
}

/// Turn downswing momentum into upward launch through the club face.
///
/// A non-negative vertical component passes through unchanged.
pub fn loft_transform(velocity: Vec3, loft_rad: f32) -> Vec3 {
    if velocity.y >= 0.0 {
        return velocity;
    }
    let horizontal = (velocity.x * velocity.x + velocity.z * velocity.z).sqrt();
    let up = horizontal * loft_rad.sin() + velocity.y.abs() * loft_rad.cos();
    Vec3::new(velocity.x, up, velocity.z)
}

/// Resolve the hit into launch velocity and spin.
///
/// `linear_accel` is the course-frame acceleration with gravity removed,
/// used only when the history is too short.
pub fn resolve_impact(history: &TipHistory, linear_accel: Vec3, config: &AppConfig) -> Impact {
    let (club_velocity, estimate) = estimate_velocity(history, linear_accel);
    let club_velocity = finite_or_zero(club_velocity);

    let lofted = loft_transform(club_velocity, config.club.loft_deg.to_radians());
    let scale = (config.club.weight_g / REFERENCE_CLUB_WEIGHT_G) * config.physics.impact_power;
    let mut launch = finite_or_zero(lofted * scale);
    // The ball always leaves away from the player.
    launch.z = launch.z.abs();

    let radius = config.ball_radius_m();
    let sidespin = -(launch.x / radius) * SIDESPIN_GAIN;
    let backspin = (launch.y / radius) * BACKSPIN_GAIN;
    let spin = finite_or_zero(Vec3::new(-backspin, sidespin, 0.0));

    if estimate == VelocityEstimate::AccelerationFallback {
        tracing::warn!(
            samples = history.len(),
            "Short tip history, impact velocity from acceleration"
        );
    }
    tracing::info!(
        club_speed = club_velocity.length(),
        launch = ?launch,
        backspin,
        sidespin,
        "Impact resolved"
    );

    Impact {
        club_velocity,
        launch_velocity: launch,
        spin,
        estimate,
    }
}

pub(crate) fn finite_or_zero(v: Vec3) -> Vec3 {
    let clean = |c: f32| if c.is_finite() { c } else { 0.0 };
    Vec3::new(clean(v.x), clean(v.y), clean(v.z))
}

#[cfg(test)]
mod tests {
    use super::*;
    use swing_tracker::TipSample;

    fn history_from(points: &[(Vec3, f64)]) -> TipHistory {
        let mut history = TipHistory::default();
        for &(position, timestamp_ms) in points {
            history.push(TipSample {
                position,
                timestamp_ms,
            });
        }
        history
    }

    /// Five samples over 50 ms, moving `delta` in total.
    fn linear_history(start: Vec3, delta: Vec3) -> TipHistory {
        let points: Vec<_> = (0..5)
            .map(|i| {
                let t = i as f32 / 4.0;
                (start + delta * t, 1000.0 + 12.5 * i as f64)
            })
            .collect();
        history_from(&points)
    }

    fn scenario_config() -> AppConfig {
        let mut config = AppConfig::default();
        config.club.length_m = 1.2;
        config.club.loft_deg = 25.0;
        config.club.weight_g = 200.0;
        config.physics.impact_power = 1.5;
        config.ball.weight_g = 45.9;
        config
    }

    #[test]
    fn history_velocity_uses_fifth_newest() {
        let history = linear_history(Vec3::ZERO, Vec3::new(0.0, 0.0, 0.5));
        let (v, estimate) = estimate_velocity(&history, Vec3::ZERO);
        assert_eq!(estimate, VelocityEstimate::History);
        assert!((v - Vec3::new(0.0, 0.0, 10.0)).length() < 1e-4);
    }

    #[test]
    fn short_history_falls_back_to_acceleration() {
        let history = history_from(&[(Vec3::ZERO, 0.0), (Vec3::X, 10.0)]);
        let accel = Vec3::new(1.0, -2.0, 3.0);
        let (v, estimate) = estimate_velocity(&history, accel);
        assert_eq!(estimate, VelocityEstimate::AccelerationFallback);
        assert_eq!(v, accel * 5.0);

        let impact = resolve_impact(&history, accel, &AppConfig::default());
        assert!(impact.is_degraded());
    }

    #[test]
    fn zero_elapsed_time_gives_zero_velocity() {
        let points: Vec<_> = (0..5).map(|i| (Vec3::splat(i as f32), 500.0)).collect();
        let history = history_from(&points);
        let (v, estimate) = estimate_velocity(&history, Vec3::ONE);
        assert_eq!(v, Vec3::ZERO);
        assert_eq!(estimate, VelocityEstimate::History);

        let impact = resolve_impact(&history, Vec3::ONE, &AppConfig::default());
        assert_eq!(impact.launch_velocity, Vec3::ZERO);
        assert_eq!(impact.spin, Vec3::ZERO);
    }

    #[test]
    fn loft_lifts_downswing_only() {
        let loft = 25f32.to_radians();
        let down = loft_transform(Vec3::new(3.0, -4.0, 4.0), loft);
        let expected = 5.0 * loft.sin() + 4.0 * loft.cos();
        assert!((down.y - expected).abs() < 1e-5);
        assert_eq!(down.x, 3.0);
        assert_eq!(down.z, 4.0);

        let up = Vec3::new(1.0, 2.0, 3.0);
        assert_eq!(loft_transform(up, loft), up);
        let level = Vec3::new(1.0, 0.0, 3.0);
        assert_eq!(loft_transform(level, loft), level);
    }

    #[test]
    fn club_weight_and_power_scale_launch() {
        let history = linear_history(Vec3::ZERO, Vec3::new(0.0, 0.1, 0.5));
        let mut config = AppConfig::default();
        config.physics.impact_power = 1.0;
        let base = resolve_impact(&history, Vec3::ZERO, &config);

        config.club.weight_g = 400.0;
        config.physics.impact_power = 1.5;
        let heavy = resolve_impact(&history, Vec3::ZERO, &config);
        assert!((heavy.launch_velocity - base.launch_velocity * 3.0).length() < 1e-4);
    }

    #[test]
    fn launch_always_travels_away() {
        let directions = [
            Vec3::new(0.0, -0.2, -0.3),
            Vec3::new(0.4, 0.1, -0.3),
            Vec3::new(-0.4, -0.3, -0.01),
            Vec3::new(0.0, 0.0, 0.3),
            Vec3::new(0.2, -0.2, 0.0),
        ];
        for delta in directions {
            let history = linear_history(Vec3::ZERO, delta);
            let impact = resolve_impact(&history, Vec3::ZERO, &AppConfig::default());
            assert!(impact.launch_velocity.z >= 0.0, "delta {delta:?}");
        }

        let impact = resolve_impact(
            &TipHistory::default(),
            Vec3::new(0.0, 0.0, -8.0),
            &AppConfig::default(),
        );
        assert!(impact.launch_velocity.z >= 0.0);
    }

    #[test]
    fn spin_signs_follow_launch() {
        // Moving right and upward after loft.
        let history = linear_history(Vec3::ZERO, Vec3::new(0.1, -0.1, 0.3));
        let impact = resolve_impact(&history, Vec3::ZERO, &AppConfig::default());
        assert!(impact.launch_velocity.x > 0.0);
        assert!(impact.sidespin() < 0.0);
        assert!(impact.backspin() > 0.0);
        assert_eq!(impact.spin.z, 0.0);

        let radius = AppConfig::default().ball_radius_m();
        let expected = impact.launch_velocity.y / radius * 0.05;
        assert!((impact.backspin() - expected).abs() < 1e-3);
    }

    #[test]
    fn non_finite_history_is_clamped() {
        let history = history_from(&[
            (Vec3::new(f32::NAN, 0.0, 0.0), 0.0),
            (Vec3::ZERO, 10.0),
            (Vec3::ZERO, 20.0),
            (Vec3::ZERO, 30.0),
            (Vec3::new(0.0, 0.0, f32::INFINITY), 40.0),
        ]);
        let impact = resolve_impact(&history, Vec3::ZERO, &AppConfig::default());
        assert!(impact.launch_velocity.is_finite());
        assert!(impact.spin.is_finite());
    }

    #[test]
    fn downward_forward_swing_launches_up_and_away() {
        // 0.3 m of travel over 50 ms, down and forward into the ball.
        let delta = Vec3::new(0.0, -1.0, 1.0).normalize() * 0.3;
        let history = linear_history(-delta, delta);
        let impact = resolve_impact(&history, Vec3::ZERO, &scenario_config());

        assert_eq!(impact.estimate, VelocityEstimate::History);
        assert!((impact.impact_speed() - 6.0).abs() < 1e-3);
        assert!(impact.launch_velocity.y > 0.0);
        assert!(impact.launch_velocity.z > 0.0);
    }
}
