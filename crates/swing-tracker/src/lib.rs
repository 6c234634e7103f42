//! Virtual club tip tracking.
//!
//! Turns a device orientation into a ball-relative tip position and keeps
//! a motion-gated, time-bounded history of it for hit detection and
//! impact velocity estimation.

pub mod history;
pub mod tracker;

pub use history::{TipHistory, TipSample, HISTORY_CAPACITY};
pub use tracker::{TipTracker, TrackingParams};
