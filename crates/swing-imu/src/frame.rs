//! Mapping between the fusion world frame and the course frame.
//!
//! The Madgwick filter reports attitude against an earth frame with +Z up.
//! Everything downstream of the tip tracker works in the course frame:
//! x lateral, y up, z away from the player. This adapter is the only
//! place where axes are permuted or negated.

use glam::Vec3;
use swing_config::GripMode;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameAdapter {
    grip: GripMode,
}

impl FrameAdapter {
    pub fn new(grip: GripMode) -> Self {
        Self { grip }
    }

    pub fn grip(&self) -> GripMode {
        self.grip
    }

    /// World frame -> course frame.
    pub fn to_course(&self, world: Vec3) -> Vec3 {
        match self.grip {
            // Screen normal leads the swing: world -Y is away from the player.
            GripMode::ScreenFirst => Vec3::new(world.x, world.z, -world.y),
            // Device edge leads the swing: world +X is away from the player.
            GripMode::EdgeFirst => Vec3::new(world.y, world.z, world.x),
        }
    }

    /// Course frame -> world frame. Exact inverse of [`Self::to_course`].
    pub fn to_world(&self, course: Vec3) -> Vec3 {
        match self.grip {
            GripMode::ScreenFirst => Vec3::new(course.x, -course.z, course.y),
            GripMode::EdgeFirst => Vec3::new(course.z, course.x, course.y),
        }
    }
}

impl Default for FrameAdapter {
    fn default() -> Self {
        Self::new(GripMode::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GRIPS: [GripMode; 2] = [GripMode::ScreenFirst, GripMode::EdgeFirst];

    #[test]
    fn round_trip_is_exact() {
        let v = Vec3::new(0.3, -1.7, 2.25);
        for grip in GRIPS {
            let adapter = FrameAdapter::new(grip);
            assert_eq!(adapter.to_world(adapter.to_course(v)), v);
            assert_eq!(adapter.to_course(adapter.to_world(v)), v);
        }
    }

    #[test]
    fn world_up_is_course_up() {
        for grip in GRIPS {
            let adapter = FrameAdapter::new(grip);
            assert_eq!(adapter.to_course(Vec3::Z), Vec3::Y);
        }
    }

    #[test]
    fn mapping_is_a_proper_rotation() {
        // A reflection would flip the sign of the cross product.
        let a = Vec3::new(1.0, 2.0, 0.5);
        let b = Vec3::new(-0.4, 0.3, 1.1);
        for grip in GRIPS {
            let adapter = FrameAdapter::new(grip);
            let lhs = adapter.to_course(a.cross(b));
            let rhs = adapter.to_course(a).cross(adapter.to_course(b));
            assert!((lhs - rhs).length() < 1e-6);
        }
    }

    #[test]
    fn leading_axis_points_away() {
        let screen = FrameAdapter::new(GripMode::ScreenFirst);
        assert_eq!(screen.to_course(Vec3::NEG_Y), Vec3::Z);

        let edge = FrameAdapter::new(GripMode::EdgeFirst);
        assert_eq!(edge.to_course(Vec3::X), Vec3::Z);
    }
}
