//! Orientation fusion for a handheld phone used as a golf club grip.
//!
//! [`SensorFusion`] turns accelerometer + gyroscope (+ optional compass) samples
//! into a device attitude; [`FrameAdapter`] maps that attitude's world frame
//! onto the course frame used by the rest of the pipeline.

pub mod frame;
pub mod fusion;
pub mod types;

pub use frame::FrameAdapter;
pub use fusion::{yaw_of, SensorFusion, MAX_STEP_S};
pub use types::{Orientation, SensorSample};
