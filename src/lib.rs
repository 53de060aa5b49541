//! Pure rust implementation of the core of an IEEE 802.1AS-2021 (gPTP)
//! time-aware system
//!
//! This crate contains everything needed to synchronize a clock over
//! ethernet with the generalized precision time protocol: the wire codec for
//! all gPTP message types, the per port state machines, the peer to peer
//! delay measurement, the best master clock algorithm, and a PI servo that
//! turns offset measurements into clock corrections.
//!
//! It performs no I/O of its own. The system integrator provides three
//! things: a [`Transport`](`transport::Transport`) that sends frames and
//! captures transmit timestamps, a [`Clock`] handle onto the hardware clock
//! being disciplined, and a monotonic time that is passed into every
//! `handle_*` call of the [`GptpInstance`]. This keeps the core portable
//! between operating systems and embedded targets, and makes every state
//! machine testable in isolation.

#![cfg_attr(all(not(test), not(feature = "std")), no_std)]

use datastructures::common::PortIdentity;

pub mod clock;
pub mod config;
pub mod datastructures;
pub mod discipline;
pub mod instance;
pub mod observability;
pub mod port;
pub mod servo;
pub mod time;
pub mod transport;

pub(crate) mod bmc;
pub(crate) mod float_polyfill;
pub(crate) mod pdelay;

pub use clock::Clock;
pub use instance::GptpInstance;
pub use port::{PortAction, PortRole, TimestampContext};
pub use servo::{Measurement, Servo, ServoOutput};
pub use transport::Transport;

/// The largest amount of ports one instance can hold
pub const MAX_PORTS: usize = 16;

/// The largest amount of domains one instance can take part in
pub const MAX_DOMAINS: usize = 8;

/// A notification about a state change the caller may want to act on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// A port started up
    PortBecameInitializing {
        /// The port that changed
        port_id: PortIdentity,
    },
    /// A port encountered a fault
    PortBecameFaulty {
        /// The port that changed
        port_id: PortIdentity,
    },
    /// A port went down
    PortBecameDisabled {
        /// The port that changed
        port_id: PortIdentity,
    },
    /// A port is waiting for the master election
    PortBecameListening {
        /// The port that changed
        port_id: PortIdentity,
    },
    /// A port is about to become master
    PortBecamePreMaster {
        /// The port that changed
        port_id: PortIdentity,
    },
    /// A port started distributing time
    PortBecameMaster {
        /// The port that changed
        port_id: PortIdentity,
    },
    /// A port stopped taking part in time distribution
    PortBecamePassive {
        /// The port that changed
        port_id: PortIdentity,
    },
    /// A port follows a master but has not converged yet
    PortBecameUncalibrated {
        /// The port that changed
        port_id: PortIdentity,
    },
    /// A port synchronizes the local clock now
    PortBecameSlave {
        /// The port that changed
        port_id: PortIdentity,
        /// The master the port listens to
        master_port_id: PortIdentity,
    },
    /// The servo of a domain locked onto its master
    ClockLocked {
        /// The domain whose servo changed
        domain: u8,
    },
    /// The servo of a domain lost its lock
    ClockUnlocked {
        /// The domain whose servo changed
        domain: u8,
    },
}

impl core::fmt::Display for Event {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Event::PortBecameInitializing { port_id } => {
                write!(f, "Port {port_id} became `Initializing`")
            }
            Event::PortBecameFaulty { port_id } => write!(f, "Port {port_id} became `Faulty`"),
            Event::PortBecameDisabled { port_id } => write!(f, "Port {port_id} became `Disabled`"),
            Event::PortBecameListening { port_id } => {
                write!(f, "Port {port_id} became `Listening`")
            }
            Event::PortBecamePreMaster { port_id } => {
                write!(f, "Port {port_id} became `PreMaster`")
            }
            Event::PortBecameMaster { port_id } => write!(f, "Port {port_id} became `Master`"),
            Event::PortBecamePassive { port_id } => write!(f, "Port {port_id} became `Passive`"),
            Event::PortBecameUncalibrated { port_id } => {
                write!(f, "Port {port_id} became `Uncalibrated`")
            }
            Event::PortBecameSlave {
                port_id,
                master_port_id,
            } => write!(f, "Port {port_id} became `Slave` to {master_port_id}"),
            Event::ClockLocked { domain } => {
                write!(f, "The clock of domain {domain} is locked")
            }
            Event::ClockUnlocked { domain } => {
                write!(f, "The clock of domain {domain} lost its lock")
            }
        }
    }
}
