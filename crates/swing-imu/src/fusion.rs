use crate::types::Orientation;
use ahrs::{Ahrs, Madgwick};
use glam::{Quat, Vec3};
use nalgebra::{Quaternion, UnitQuaternion, Vector3};

/// Deltas above this (seconds) are a stalled host, not motion. The step is skipped.
pub const MAX_STEP_S: f32 = 0.1;

/// Below this `w^2 + z^2` the attitude is within ~140 degrees of a half turn
/// about a horizontal axis and its yaw is not well defined.
const MIN_YAW_CONDITIONING: f32 = 0.1;

/// Yaw about world +Z of a device-to-world attitude, in radians.
///
/// This is the twist of `q` about the vertical axis. `None` near a half turn
/// about a horizontal axis, where the twist flips sign.
pub fn yaw_of(q: Quat) -> Option<f32> {
    (q.w * q.w + q.z * q.z > MIN_YAW_CONDITIONING).then(|| 2.0 * q.z.atan2(q.w))
}

/// Sensor fusion using the Madgwick AHRS filter.
///
/// Converts gyro + accelerometer readings (and an optional compass heading)
/// into a stable orientation quaternion. Without a heading the filter runs
/// the 6DOF update, which drifts in yaw but is otherwise stable.
pub struct SensorFusion {
    beta: f64,
    /// Current device-to-world estimate.
    quat: UnitQuaternion<f64>,
    /// Whether the first accelerometer reading has set the initial attitude.
    seeded: bool,
    /// Gyroscope bias in deg/s (average of calibration samples).
    gyro_bias: Vec3,
    /// Calibration state.
    calibration: CalibrationState,
    sample_count: u64,
}

enum CalibrationState {
    Collecting {
        samples: Vec<Vec3>,
        target: usize,
    },
    Calibrated,
}

impl CalibrationState {
    fn new(samples: u32) -> Self {
        if samples == 0 {
            CalibrationState::Calibrated
        } else {
            CalibrationState::Collecting {
                samples: Vec::with_capacity(samples as usize),
                target: samples as usize,
            }
        }
    }
}

impl SensorFusion {
    pub fn new(beta: f32, calibration_samples: u32) -> Self {
        Self {
            beta: beta as f64,
            quat: UnitQuaternion::identity(),
            seeded: false,
            gyro_bias: Vec3::ZERO,
            calibration: CalibrationState::new(calibration_samples),
            sample_count: 0,
        }
    }

    /// Fold one sample into the estimate.
    ///
    /// `gyro` is in deg/s, `accel` in m/s^2, `dt` in seconds, `heading` in degrees.
    /// Returns the new orientation, or `None` when the sample was not applied
    /// (zero-norm accelerometer, stale `dt`, bias calibration in progress).
    pub fn update(
        &mut self,
        gyro: Vec3,
        accel: Vec3,
        dt: f32,
        heading: Option<f32>,
    ) -> Option<Orientation> {
        if !accel.is_finite() || accel.length_squared() == 0.0 || !gyro.is_finite() {
            tracing::trace!(?accel, ?gyro, "Skipping degenerate IMU sample");
            return None;
        }

        if let CalibrationState::Collecting { samples, target } = &mut self.calibration {
            samples.push(gyro);
            if samples.len() >= *target {
                // Compute average gyro bias.
                let sum: Vec3 = samples.iter().copied().sum();
                self.gyro_bias = sum / samples.len() as f32;
                self.calibration = CalibrationState::Calibrated;
                tracing::info!(
                    bias_x = self.gyro_bias.x,
                    bias_y = self.gyro_bias.y,
                    bias_z = self.gyro_bias.z,
                    "Gyro bias calibration complete"
                );
            }
            return None;
        }

        let heading = heading.filter(|h| h.is_finite());

        if !self.seeded {
            self.seed(accel, heading);
            return Some(self.orientation());
        }

        if !(dt > 0.0 && dt <= MAX_STEP_S) {
            tracing::debug!(dt, "Skipping fusion step with stale time delta");
            return None;
        }

        let corrected_gyro = gyro - self.gyro_bias;
        let gyro = Vector3::new(
            (corrected_gyro.x as f64).to_radians(),
            (corrected_gyro.y as f64).to_radians(),
            (corrected_gyro.z as f64).to_radians(),
        );
        let accel = Vector3::new(accel.x as f64, accel.y as f64, accel.z as f64);

        let mut filter = Madgwick::new_with_quat(dt as f64, self.beta, self.quat);
        let result = match heading.and_then(|h| self.heading_field(h)) {
            Some(mag) => filter.update(&gyro, &accel, &mag).map(|q| *q),
            None => filter.update_imu(&gyro, &accel).map(|q| *q),
        };

        self.quat = match result {
            Ok(q) if q.coords.iter().all(|c| c.is_finite()) => q,
            other => {
                // A zero gradient (estimate already agrees with gravity) normalizes
                // to NaN inside the filter. Integrate the gyro alone for this step.
                tracing::trace!(rejected = other.is_err(), "Gyro-only fusion step");
                self.quat * UnitQuaternion::from_scaled_axis(gyro * dt as f64)
            }
        };

        self.sample_count += 1;
        if self.sample_count % 1000 == 0 {
            tracing::debug!(sample_count = self.sample_count, "IMU samples fused");
        }

        Some(self.orientation())
    }

    /// Current orientation estimate.
    pub fn orientation(&self) -> Orientation {
        let q = self.quat;
        Orientation {
            quaternion: Quat::from_xyzw(
                q.coords[0] as f32,
                q.coords[1] as f32,
                q.coords[2] as f32,
                q.coords[3] as f32, // w component
            ),
        }
    }

    /// Back to identity. The next sample re-seeds the attitude from gravity.
    /// The gyro bias is a property of the device and survives.
    pub fn reset(&mut self) {
        self.quat = UnitQuaternion::identity();
        self.seeded = false;
    }

    /// Restart gyro bias calibration.
    pub fn recalibrate(&mut self, samples: u32) {
        self.calibration = CalibrationState::new(samples);
        self.gyro_bias = Vec3::ZERO;
        tracing::info!(samples, "Recalibration started");
    }

    pub fn set_beta(&mut self, beta: f32) {
        self.beta = beta as f64;
    }

    /// Whether calibration is complete.
    pub fn is_calibrated(&self) -> bool {
        matches!(self.calibration, CalibrationState::Calibrated)
    }

    pub fn gyro_bias(&self) -> Vec3 {
        self.gyro_bias
    }

    /// The yaw-only part of the current attitude.
    ///
    /// Rotating by its conjugate turns the device to yaw zero and leaves
    /// gravity on world +Z. `None` while yaw is not well defined.
    pub fn yaw_reference(&self) -> Option<Quat> {
        yaw_of(self.orientation().quaternion).map(Quat::from_rotation_z)
    }

    /// Device-frame field vector for a compass heading in degrees.
    ///
    /// The heading sets the target yaw `-heading`, so a level device at
    /// identity sees `(cos h, sin h, 0)`. For any other attitude the field is
    /// the one that puts the current estimate off the target by exactly its
    /// yaw error, so tilt never leaks into the correction.
    fn heading_field(&self, heading: f32) -> Option<Vector3<f64>> {
        let q = self.orientation().quaternion;
        let yaw = yaw_of(q)?;
        let target = -heading.to_radians();
        let field = q.inverse() * (Quat::from_rotation_z(yaw - target) * Vec3::X);
        Some(Vector3::new(field.x as f64, field.y as f64, field.z as f64))
    }

    /// Start from the attitude that maps measured gravity onto world +Z, and
    /// onto the heading's yaw when one is given, instead of converging there
    /// at `beta` rad/s.
    fn seed(&mut self, accel: Vec3, heading: Option<f32>) {
        // Shortest arc about a horizontal axis: zero yaw.
        let tilt = Quat::from_rotation_arc(accel.normalize(), Vec3::Z);
        let seed = match heading {
            Some(h) => Quat::from_rotation_z(-h.to_radians()) * tilt,
            None => tilt,
        };
        self.quat = UnitQuaternion::from_quaternion(Quaternion::new(
            seed.w as f64,
            seed.x as f64,
            seed.y as f64,
            seed.z as f64,
        ));
        self.seeded = true;
        tracing::debug!(?seed, ?heading, "Attitude seeded");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const G: f32 = 9.81;
    const DT: f32 = 1.0 / 100.0;

    fn level() -> Vec3 {
        Vec3::new(0.0, 0.0, G)
    }

    #[test]
    fn starts_at_identity() {
        let fusion = SensorFusion::new(0.1, 0);
        assert_eq!(fusion.orientation().quaternion, Quat::IDENTITY);
        assert!(fusion.is_calibrated());
    }

    #[test]
    fn zero_accel_is_a_no_op() {
        let mut fusion = SensorFusion::new(0.1, 0);
        fusion.update(Vec3::ZERO, level(), DT, None).unwrap();
        let before = fusion.orientation().quaternion;

        assert!(fusion
            .update(Vec3::new(90.0, 0.0, 0.0), Vec3::ZERO, DT, None)
            .is_none());
        assert_eq!(fusion.orientation().quaternion, before);
    }

    #[test]
    fn seeds_attitude_from_gravity() {
        let mut fusion = SensorFusion::new(0.1, 0);
        // Phone upright: gravity along device +Y.
        let orientation = fusion.update(Vec3::ZERO, Vec3::new(0.0, G, 0.0), DT, None).unwrap();
        let up = orientation.to_world(Vec3::Y);
        assert!((up - Vec3::Z).length() < 1e-5);
    }

    #[test]
    fn stale_delta_is_skipped() {
        let mut fusion = SensorFusion::new(0.1, 0);
        fusion.update(Vec3::ZERO, level(), DT, None).unwrap();
        let before = fusion.orientation().quaternion;

        assert!(fusion.update(Vec3::new(0.0, 0.0, 500.0), level(), 0.5, None).is_none());
        assert!(fusion.update(Vec3::new(0.0, 0.0, 500.0), level(), 0.0, None).is_none());
        assert_eq!(fusion.orientation().quaternion, before);
    }

    #[test]
    fn integrates_gyro_rate() {
        let mut fusion = SensorFusion::new(0.0, 0);
        fusion.update(Vec3::ZERO, level(), DT, None).unwrap();

        // 90 deg/s about +Z for one second, accelerometer consistent with level.
        for _ in 0..100 {
            fusion.update(Vec3::new(0.0, 0.0, 90.0), level(), DT, None);
        }
        let x_axis = fusion.orientation().to_world(Vec3::X);
        assert!((x_axis - Vec3::Y).length() < 0.02, "got {x_axis:?}");
    }

    #[test]
    fn quaternion_stays_normalized() {
        let mut fusion = SensorFusion::new(0.1, 0);
        for i in 0..2000 {
            let t = i as f32 * DT;
            let gyro = Vec3::new(200.0 * t.sin(), -150.0 * (1.3 * t).cos(), 80.0);
            let accel = Vec3::new(3.0 * (2.0 * t).sin(), 1.5, G + 4.0 * t.cos());
            let heading = (i % 3 == 0).then_some(t * 10.0);
            fusion.update(gyro, accel, DT, heading);

            let norm = fusion.orientation().quaternion.length();
            assert!((norm - 1.0).abs() < 1e-6, "norm {norm} at step {i}");
        }
    }

    #[test]
    fn heading_pulls_yaw() {
        let mut with_heading = SensorFusion::new(0.5, 0);
        let mut without = SensorFusion::new(0.5, 0);
        for fusion in [&mut with_heading, &mut without] {
            fusion.update(Vec3::ZERO, level(), DT, None).unwrap();
        }

        for _ in 0..500 {
            with_heading.update(Vec3::ZERO, level(), DT, Some(90.0));
            without.update(Vec3::ZERO, level(), DT, None);
        }

        let yawed = with_heading.orientation().quaternion;
        let still = without.orientation().quaternion;
        assert!(still.angle_between(Quat::IDENTITY) < 1e-4);
        assert!(yawed.angle_between(Quat::IDENTITY) > 0.1);
        // Yaw only: gravity stays on world +Z.
        assert!((with_heading.orientation().to_world(Vec3::Z) - Vec3::Z).length() < 0.05);
    }

    #[test]
    fn seeds_yaw_from_heading() {
        for heading in [0.0_f32, 45.0, 90.0, 180.0, -120.0] {
            let mut fusion = SensorFusion::new(0.1, 0);
            let upright = Vec3::new(0.0, G, 0.0);
            fusion.update(Vec3::ZERO, upright, DT, Some(heading)).unwrap();

            let yaw = fusion.yaw_reference().unwrap();
            let expected = Quat::from_rotation_z(-heading.to_radians());
            assert!(yaw.angle_between(expected) < 1e-4, "heading {heading}");
            assert!((fusion.orientation().to_world(Vec3::Y) - Vec3::Z).length() < 1e-5);

            // Already converged: holding still with the same heading keeps the attitude.
            let seeded = fusion.orientation().quaternion;
            for _ in 0..300 {
                fusion.update(Vec3::ZERO, upright, DT, Some(heading));
            }
            let drift = fusion.orientation().quaternion.angle_between(seeded);
            assert!(drift < 0.01, "heading {heading} drifted {drift}");
        }
    }

    #[test]
    fn heading_ignores_pitch() {
        // Pitching about world X with a steady heading must not pull yaw.
        let mut fusion = SensorFusion::new(0.5, 0);
        let heading = 90.0_f32;
        let start = Quat::from_rotation_x(std::f32::consts::FRAC_PI_2);
        fusion.update(Vec3::ZERO, start.inverse() * level(), DT, Some(heading)).unwrap();

        let rate = 60.0_f32;
        for i in 1..=50 {
            let pitch = std::f32::consts::FRAC_PI_2 + (rate * DT * i as f32).to_radians();
            let truth =
                Quat::from_rotation_z(-heading.to_radians()) * Quat::from_rotation_x(pitch);
            let accel = truth.inverse() * level();
            fusion.update(Vec3::new(rate, 0.0, 0.0), accel, DT, Some(heading));
        }
        let yaw = yaw_of(fusion.orientation().quaternion).unwrap();
        assert!((yaw + heading.to_radians()).abs() < 0.02, "yaw {yaw}");
    }

    #[test]
    fn yaw_is_undefined_near_a_half_turn() {
        assert!(yaw_of(Quat::from_rotation_x(std::f32::consts::PI)).is_none());
        let yaw = yaw_of(Quat::from_rotation_z(0.7) * Quat::from_rotation_x(1.2)).unwrap();
        assert!((yaw - 0.7).abs() < 1e-5);
    }

    #[test]
    fn bias_calibration_collects_then_subtracts() {
        let mut fusion = SensorFusion::new(0.0, 4);
        let bias = Vec3::new(1.0, -2.0, 0.5);
        for _ in 0..4 {
            assert!(fusion.update(bias, level(), DT, None).is_none());
        }
        assert!(fusion.is_calibrated());
        assert!((fusion.gyro_bias() - bias).length() < 1e-6);

        // Seed, then a biased-but-still device must not rotate.
        fusion.update(bias, level(), DT, None).unwrap();
        for _ in 0..200 {
            fusion.update(bias, level(), DT, None);
        }
        assert!(fusion.orientation().quaternion.angle_between(Quat::IDENTITY) < 1e-4);

        fusion.recalibrate(2);
        assert!(!fusion.is_calibrated());
        assert_eq!(fusion.gyro_bias(), Vec3::ZERO);
    }

    #[test]
    fn reset_returns_to_identity() {
        let mut fusion = SensorFusion::new(0.1, 0);
        fusion.update(Vec3::ZERO, Vec3::new(G, 0.0, 0.0), DT, None).unwrap();
        assert!(fusion.orientation().quaternion.angle_between(Quat::IDENTITY) > 1.0);

        fusion.reset();
        assert_eq!(fusion.orientation().quaternion, Quat::IDENTITY);
    }
}
