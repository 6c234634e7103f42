//! Impact and ball flight physics.

pub mod flight;
pub mod impact;
pub mod result;

pub use flight::{FlightState, MAX_FLIGHT_S, MAX_TICK_S, REFERENCE_BALL_WEIGHT_G, SPIN_DECAY};
pub use impact::{
    estimate_velocity, loft_transform, resolve_impact, Impact, VelocityEstimate, VELOCITY_SPAN,
};
pub use result::ShotResult;
