use crate::time::{Duration, Interval};

/// How a port measures the delay of its link
///
/// The mechanism is fixed at configuration time and cannot change while the
/// port runs.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PathDelayMechanism {
    /// The standard peer to peer delay measurement of *IEEE 802.1AS-2021
    /// section 16.4.3.2*
    P2P {
        /// Validation limits for the measurement
        profile: PathDelayProfile,
    },
    /// The attached coordinated shared network measures the delay itself and
    /// supplies (delay, rate ratio) pairs, *section 16.4.3.3*
    NativeCsn,
    /// The attached coordinated shared network is intrinsically synchronized;
    /// the path delay equals the supplied residence time, *section 16.4.3.4*
    IntrinsicCsn,
}

/// Validation limits for the peer to peer delay measurement
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PathDelayProfile {
    /// Exchanges measuring a larger delay than this are rejected
    pub max_link_delay: Duration,
    /// Allowed deviation of the neighbor rate ratio from 1.0, in parts per
    /// million. Never larger than the 802.1AS bound of 200 ppm.
    pub rate_ratio_tolerance_ppm: f64,
    /// Number of exchanges in the rate ratio window of equation 16-1
    pub rate_ratio_window: usize,
    /// Valid consecutive exchanges before the port reports asCapable
    pub capable_exchanges: u8,
}

impl PathDelayProfile {
    /// Limits for automotive networks: links are short and engineered
    pub fn automotive() -> Self {
        Self {
            max_link_delay: Duration::from_micros(500),
            rate_ratio_tolerance_ppm: 200.0,
            rate_ratio_window: 10,
            capable_exchanges: 2,
        }
    }

    /// Limits for industrial networks with longer cable runs
    pub fn industrial() -> Self {
        Self {
            max_link_delay: Duration::from_millis(10),
            rate_ratio_tolerance_ppm: 200.0,
            rate_ratio_window: 10,
            capable_exchanges: 2,
        }
    }

    /// Limits for short high precision measurement setups
    pub fn high_precision() -> Self {
        Self {
            max_link_delay: Duration::from_micros(100),
            rate_ratio_tolerance_ppm: 100.0,
            rate_ratio_window: 10,
            capable_exchanges: 2,
        }
    }
}

impl Default for PathDelayProfile {
    fn default() -> Self {
        Self::industrial()
    }
}

/// Configuration items of the gPTP PortDS dataset. Dynamical fields are kept
/// as part of [`crate::port::Port`].
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PortConfig {
    /// The domain this port participates in
    pub domain_number: u8,
    /// Pacing of sync transmission when master, default 2^-3 s
    pub sync_interval: Interval,
    /// Pacing of announce transmission when master, default 2^0 s
    pub announce_interval: Interval,
    /// Pacing of peer delay requests, default 2^0 s
    pub pdelay_interval: Interval,
    /// Announce intervals without announce before the selected master is
    /// considered gone, default 3
    pub announce_receipt_timeout: u8,
    /// Sync intervals without valid sync before a slave port stops
    /// forwarding, default 3
    pub sync_receipt_timeout: u8,
    /// How this port measures its link delay
    pub delay_mechanism: PathDelayMechanism,
    /// How long to wait for the follow up of a two step sync, default 100 ms
    pub follow_up_timeout: Duration,
    /// How long to wait for a peer delay response, default 100 ms
    pub pdelay_resp_timeout: Duration,
}

impl Default for PortConfig {
    fn default() -> Self {
        Self {
            domain_number: 0,
            sync_interval: Interval::EIGHT_PER_SECOND,
            announce_interval: Interval::ONE_SECOND,
            pdelay_interval: Interval::ONE_SECOND,
            announce_receipt_timeout: 3,
            sync_receipt_timeout: 3,
            delay_mechanism: PathDelayMechanism::P2P {
                profile: PathDelayProfile::default(),
            },
            follow_up_timeout: Duration::from_millis(100),
            pdelay_resp_timeout: Duration::from_millis(100),
        }
    }
}

impl PortConfig {
    /// The span after which the selected master is considered gone
    pub fn announce_timeout_duration(&self) -> Duration {
        self.announce_interval.as_duration() * self.announce_receipt_timeout as i32
    }

    /// The span after which a slave port stops considering its sync source
    /// valid
    pub fn sync_timeout_duration(&self) -> Duration {
        self.sync_interval.as_duration() * self.sync_receipt_timeout as i32
    }
}
