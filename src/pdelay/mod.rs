//! Peer to peer path delay measurement, *IEEE 802.1AS-2021 section 16.4.3*
//!
//! Three calculators implement the same interface: the standard peer to peer
//! exchange, and the two coordinated shared network variants that get their
//! numbers from the attached network instead. Which one a port uses is fixed
//! at configuration time.

pub(crate) mod csn;
pub(crate) mod filter;
pub(crate) mod standard;

pub(crate) use csn::{IntrinsicCsn, NativeCsn};
pub(crate) use standard::StandardP2P;

use crate::{
    config::PathDelayMechanism,
    time::Duration,
};

/// The per port path delay calculator, dispatched by configured variant
#[derive(Debug)]
pub(crate) enum PathDelayCalculator {
    StandardP2P(StandardP2P),
    NativeCsn(NativeCsn),
    IntrinsicCsn(IntrinsicCsn),
}

impl PathDelayCalculator {
    pub(crate) fn new(mechanism: PathDelayMechanism) -> Self {
        match mechanism {
            PathDelayMechanism::P2P { profile } => Self::StandardP2P(StandardP2P::new(profile)),
            PathDelayMechanism::NativeCsn => Self::NativeCsn(NativeCsn::new()),
            PathDelayMechanism::IntrinsicCsn => Self::IntrinsicCsn(IntrinsicCsn::new()),
        }
    }

    /// Whether this variant drives the Pdelay_Req exchange itself
    pub(crate) fn sends_requests(&self) -> bool {
        matches!(self, Self::StandardP2P(_))
    }

    /// Whether the link is usable for gPTP
    pub(crate) fn as_capable(&self) -> bool {
        match self {
            Self::StandardP2P(p2p) => p2p.as_capable(),
            Self::NativeCsn(csn) => csn.as_capable(),
            Self::IntrinsicCsn(csn) => csn.as_capable(),
        }
    }

    /// The filtered one way delay of the link, never negative
    pub(crate) fn mean_link_delay(&self) -> Option<Duration> {
        match self {
            Self::StandardP2P(p2p) => p2p.mean_link_delay(),
            Self::NativeCsn(csn) => csn.mean_link_delay(),
            Self::IntrinsicCsn(csn) => csn.mean_link_delay(),
        }
    }

    /// The rate of the neighbor's clock relative to ours
    pub(crate) fn neighbor_rate_ratio(&self) -> f64 {
        match self {
            Self::StandardP2P(p2p) => p2p.neighbor_rate_ratio(),
            Self::NativeCsn(csn) => csn.neighbor_rate_ratio(),
            Self::IntrinsicCsn(csn) => csn.neighbor_rate_ratio(),
        }
    }

    pub(crate) fn as_standard_mut(&mut self) -> Option<&mut StandardP2P> {
        match self {
            Self::StandardP2P(p2p) => Some(p2p),
            _ => None,
        }
    }
}
