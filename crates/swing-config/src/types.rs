use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Virtual club dimensions and face angle.
    pub club: ClubConfig,
    /// Ball mass and size.
    pub ball: BallConfig,
    /// Hit detection and session timing.
    pub swing: SwingConfig,
    /// Flight simulation constants.
    pub physics: PhysicsConfig,
    /// IMU fusion and device grip.
    pub imu: ImuConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClubConfig {
    /// Grip-to-tip distance in meters.
    pub length_m: f32,
    /// Club head weight in grams. 200 g is the reference weight.
    pub weight_g: f32,
    /// Face loft in degrees.
    pub loft_deg: f32,
}

impl Default for ClubConfig {
    fn default() -> Self {
        Self {
            length_m: 1.2,
            weight_g: 200.0,
            loft_deg: 25.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BallConfig {
    /// Ball weight in grams. 45.9 g is a regulation ball.
    pub weight_g: f32,
    /// Ball diameter in centimeters.
    pub diameter_cm: f32,
}

impl Default for BallConfig {
    fn default() -> Self {
        Self {
            weight_g: 45.9,
            diameter_cm: 4.27,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SwingConfig {
    /// Diameter of the zone around the ball the tip must pass through, in centimeters.
    pub hit_zone_diameter_cm: f32,
    /// Minimum total acceleration magnitude (m/s^2) at the moment of impact.
    pub min_swing_speed: f32,
    /// Seconds the player has to swing after the ball is set.
    pub timeout_s: f32,
    /// Deviation from gravity (m/s^2) that opens the tracking window.
    pub motion_threshold: f32,
    /// Longest span of tip history kept once the window opens, in seconds.
    pub max_tracking_duration_s: f32,
}

impl Default for SwingConfig {
    fn default() -> Self {
        Self {
            hit_zone_diameter_cm: 20.0,
            min_swing_speed: 15.0,
            timeout_s: 10.0,
            motion_threshold: 2.0,
            max_tracking_duration_s: 2.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Gravitational acceleration in m/s^2.
    pub gravity: f32,
    /// Drag factor. Each tick scales velocity by `1 - air_resistance * 0.01`.
    pub air_resistance: f32,
    /// Multiplier applied to the club velocity at impact.
    pub impact_power: f32,
    /// Magnus force multiplier. 0 disables spin curve.
    pub spin_effect: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: 9.81,
            air_resistance: 0.5,
            impact_power: 1.5,
            spin_effect: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImuConfig {
    /// Madgwick filter beta parameter (convergence speed). Higher = more responsive, less smooth.
    pub madgwick_beta: f32,
    /// Number of stationary samples for gyro bias calibration. 0 disables it.
    pub calibration_samples: u32,
    /// How the phone is held against the virtual club.
    pub grip: GripMode,
}

impl Default for ImuConfig {
    fn default() -> Self {
        Self {
            madgwick_beta: 0.1,
            calibration_samples: 0,
            grip: GripMode::ScreenFirst,
        }
    }
}

/// Holding convention for the phone.
///
/// Decides which device axis leads the swing, and therefore how the fused
/// world frame maps onto the course frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum GripMode {
    /// Screen faces the target; the swing sweeps along the screen normal.
    #[default]
    ScreenFirst,
    /// Side edge faces the target; the swing sweeps along the device x axis.
    EdgeFirst,
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{field} must be a finite number")]
    NotFinite { field: &'static str },
    #[error("{field} must be greater than zero (got {value})")]
    NotPositive { field: &'static str, value: f32 },
    #[error("{field} must not be negative (got {value})")]
    Negative { field: &'static str, value: f32 },
    #[error("club loft must be within [0, 90) degrees (got {0})")]
    LoftOutOfRange(f32),
}

impl AppConfig {
    /// Check every tunable before it reaches the simulation.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("club.length_m", self.club.length_m),
            ("club.weight_g", self.club.weight_g),
            ("ball.weight_g", self.ball.weight_g),
            ("ball.diameter_cm", self.ball.diameter_cm),
            ("swing.timeout_s", self.swing.timeout_s),
            ("physics.gravity", self.physics.gravity),
        ];
        let non_negative = [
            ("club.loft_deg", self.club.loft_deg),
            ("swing.hit_zone_diameter_cm", self.swing.hit_zone_diameter_cm),
            ("swing.min_swing_speed", self.swing.min_swing_speed),
            ("swing.motion_threshold", self.swing.motion_threshold),
            ("swing.max_tracking_duration_s", self.swing.max_tracking_duration_s),
            ("physics.air_resistance", self.physics.air_resistance),
            ("physics.impact_power", self.physics.impact_power),
            ("physics.spin_effect", self.physics.spin_effect),
            ("imu.madgwick_beta", self.imu.madgwick_beta),
        ];

        for &(field, value) in positive.iter().chain(non_negative.iter()) {
            if !value.is_finite() {
                return Err(ConfigError::NotFinite { field });
            }
        }
        for (field, value) in positive {
            if value <= 0.0 {
                return Err(ConfigError::NotPositive { field, value });
            }
        }
        for (field, value) in non_negative {
            if value < 0.0 {
                return Err(ConfigError::Negative { field, value });
            }
        }
        if self.club.loft_deg >= 90.0 {
            return Err(ConfigError::LoftOutOfRange(self.club.loft_deg));
        }
        Ok(())
    }

    /// Radius of the hit zone in meters.
    pub fn hit_zone_radius_m(&self) -> f32 {
        self.swing.hit_zone_diameter_cm / 200.0
    }

    /// Ball radius in meters.
    pub fn ball_radius_m(&self) -> f32 {
        self.ball.diameter_cm / 200.0
    }
}
