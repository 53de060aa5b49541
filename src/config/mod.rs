//! Startup-only configuration of a gPTP instance
//!
//! # Instance
//! * [`InstanceConfig`]
//!
//! # Port
//! * [`PortConfig`], [`PathDelayMechanism`], [`PathDelayProfile`]
//!
//! # Servo
//! * [`ServoConfig`]

mod instance;
mod port;
mod servo;

pub use instance::InstanceConfig;
pub use port::{PathDelayMechanism, PathDelayProfile, PortConfig};
pub use servo::ServoConfig;

pub use crate::datastructures::common::{
    ClockAccuracy, ClockIdentity, ClockQuality, PortIdentity, TimeSource,
};
