//! Synthetic swing traces for tests and the demo host.
//!
//! The phone is held upright with the screen toward the target (device +Y
//! up) and swings about device X. The swing angle is zero at address,
//! positive toward the top of the backswing and negative in the finish.

use glam::{Quat, Vec3};
use std::f32::consts::{FRAC_PI_2, PI};
use swing_imu::SensorSample;

/// Step for the central difference that yields the gyro rate (s).
const RATE_STEP_S: f32 = 1e-3;

#[derive(Debug, Clone, PartialEq)]
pub struct SwingProfile {
    pub sample_rate_hz: f32,
    pub gravity: f32,
    /// Still at address before the takeaway.
    pub address_s: f32,
    pub backswing_s: f32,
    /// Hold at the top.
    pub pause_s: f32,
    /// Top to impact. The follow-through mirrors it.
    pub downswing_s: f32,
    pub finish_hold_s: f32,
    pub top_deg: f32,
    /// Distance from the rotation center to the phone (m).
    pub arm_radius_m: f32,
    /// Compass heading reported with every sample. The player faces one
    /// way for the whole trace, so it never changes.
    pub heading_deg: Option<f32>,
}

impl Default for SwingProfile {
    fn default() -> Self {
        Self {
            sample_rate_hz: 120.0,
            gravity: 9.81,
            address_s: 0.5,
            backswing_s: 0.8,
            pause_s: 0.1,
            downswing_s: 0.3,
            finish_hold_s: 0.2,
            top_deg: 90.0,
            arm_radius_m: 0.6,
            heading_deg: None,
        }
    }
}

impl SwingProfile {
    /// Seconds from the first sample to the bottom of the downswing.
    pub fn impact_s(&self) -> f32 {
        self.address_s + self.backswing_s + self.pause_s + self.downswing_s
    }

    pub fn duration_s(&self) -> f32 {
        self.impact_s() + self.downswing_s + self.finish_hold_s
    }

    /// Swing angle (rad) at `t` seconds into the trace.
    pub fn angle(&self, t: f32) -> f32 {
        let top = self.top_deg.to_radians();
        if t < self.address_s {
            return 0.0;
        }
        let t = t - self.address_s;
        if t < self.backswing_s {
            return top * 0.5 * (1.0 - (PI * t / self.backswing_s).cos());
        }
        let t = t - self.backswing_s;
        if t < self.pause_s {
            return top;
        }
        let t = t - self.pause_s;
        if t < self.downswing_s {
            return top * (FRAC_PI_2 * t / self.downswing_s).cos();
        }
        let t = t - self.downswing_s;
        if t < self.downswing_s {
            return -top * (FRAC_PI_2 * t / self.downswing_s).sin();
        }
        -top
    }

    /// True device-to-world orientation at `t`. A heading turns the whole
    /// swing about world +Z, to yaw `-heading`.
    pub fn orientation(&self, t: f32) -> Quat {
        let yaw = self.heading_deg.map_or(0.0, |h| -h.to_radians());
        Quat::from_rotation_z(yaw) * Quat::from_rotation_x(FRAC_PI_2 + self.angle(t))
    }

    /// The sample a phone following this profile reports at `t`.
    pub fn sample_at(&self, t: f32, start_ms: f64) -> SensorSample {
        let rate =
            (self.angle(t + RATE_STEP_S) - self.angle(t - RATE_STEP_S)) / (2.0 * RATE_STEP_S);
        let gravity = self.orientation(t).inverse() * Vec3::new(0.0, 0.0, self.gravity);
        // Swinging on the end of the arm pushes the phone outward along device -Y,
        // which the accelerometer reads as +Y.
        let centripetal = Vec3::new(0.0, rate * rate * self.arm_radius_m, 0.0);

        SensorSample {
            acceleration: gravity + centripetal,
            rotation_rate: Vec3::new(rate.to_degrees(), 0.0, 0.0),
            heading: self.heading_deg,
            timestamp_ms: start_ms + t as f64 * 1000.0,
        }
    }

    /// The whole swing, sampled at `sample_rate_hz`.
    pub fn generate(&self, start_ms: f64) -> Vec<SensorSample> {
        let count = (self.duration_s() * self.sample_rate_hz).round() as usize;
        (0..=count)
            .map(|k| self.sample_at(k as f32 / self.sample_rate_hz, start_ms))
            .collect()
    }

    /// Standing still at address for `duration_s`.
    pub fn hold(&self, duration_s: f32, start_ms: f64) -> Vec<SensorSample> {
        let count = (duration_s * self.sample_rate_hz).round() as usize;
        (0..count)
            .map(|k| self.sample_at(0.0, start_ms + k as f64 * 1000.0 / self.sample_rate_hz as f64))
            .collect()
    }
}
