use crate::impact::VelocityEstimate;
use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Finalized record of one shot, produced when the ball lands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShotResult {
    /// Ball velocity at launch, after ball-weight scaling (m/s).
    #[serde(with = "vec3_serde")]
    pub launch_velocity: Vec3,
    /// Spin at launch, before any in-flight decay (rad/s).
    #[serde(with = "vec3_serde")]
    pub spin: Vec3,
    pub backspin: f32,
    pub sidespin: f32,
    /// Ball positions, one per simulated tick.
    #[serde(with = "vec3_list_serde")]
    pub trajectory: Vec<Vec3>,
    /// Horizontal distance from the tee to the landing point (m).
    pub landing_distance: f32,
    /// Landing x: positive is right of the target line (m).
    pub lateral_offset: f32,
    pub max_height: f32,
    pub flight_time_s: f32,
    /// Club tip speed at impact (m/s).
    pub impact_speed: f32,
    pub launch_speed: f32,
    /// Elevation of the launch velocity above horizontal.
    pub launch_angle_deg: f32,
    pub velocity_estimate: VelocityEstimate,
    /// Host time of the hit, in milliseconds.
    pub timestamp_ms: f64,
}

// Serde helpers for glam types: plain arrays keep the stored shot readable.

mod vec3_serde {
    use glam::Vec3;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(v: &Vec3, s: S) -> Result<S::Ok, S::Error> {
        [v.x, v.y, v.z].serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec3, D::Error> {
        let [x, y, z] = <[f32; 3]>::deserialize(d)?;
        Ok(Vec3::new(x, y, z))
    }
}

mod vec3_list_serde {
    use glam::Vec3;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(points: &[Vec3], s: S) -> Result<S::Ok, S::Error> {
        points
            .iter()
            .map(|v| v.to_array())
            .collect::<Vec<_>>()
            .serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<Vec3>, D::Error> {
        let points = Vec::<[f32; 3]>::deserialize(d)?;
        Ok(points.into_iter().map(Vec3::from_array).collect())
    }
}
