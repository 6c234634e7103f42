use glam::{Quat, Vec3};

/// One motion reading delivered by the platform sensor collaborator.
#[derive(Debug, Clone, Copy)]
pub struct SensorSample {
    /// Accelerometer reading including gravity (m/s^2), device frame.
    pub acceleration: Vec3,
    /// Angular velocity about the device x, y, z axes (deg/s).
    pub rotation_rate: Vec3,
    /// Compass heading in degrees, when the platform provides one.
    pub heading: Option<f32>,
    /// Sample time in milliseconds on the host's monotonic clock.
    pub timestamp_ms: f64,
}

/// Fused orientation output from the sensor fusion filter.
#[derive(Debug, Clone, Copy)]
pub struct Orientation {
    /// Device-to-world rotation as a unit quaternion. World +Z is up.
    pub quaternion: Quat,
}

impl Default for Orientation {
    fn default() -> Self {
        Self {
            quaternion: Quat::IDENTITY,
        }
    }
}

impl Orientation {
    /// Rotate a device-frame vector into the world frame.
    pub fn to_world(&self, device: Vec3) -> Vec3 {
        self.quaternion * device
    }
}
