//! Path delay calculators for coordinated shared networks, *IEEE
//! 802.1AS-2021 sections 16.4.3.3 and 16.4.3.4*

use crate::time::Duration;

/// A network that measures its own propagation delay and rate ratio and
/// supplies them out of band
///
/// The port never transmits Pdelay_Req messages with this calculator; it
/// reports whatever the network last supplied.
#[derive(Debug)]
pub(crate) struct NativeCsn {
    as_capable: bool,
    mean_link_delay: Option<Duration>,
    neighbor_rate_ratio: f64,
}

impl NativeCsn {
    pub(crate) fn new() -> Self {
        Self {
            as_capable: false,
            mean_link_delay: None,
            neighbor_rate_ratio: 1.0,
        }
    }

    /// Accept an externally measured (delay, rate ratio) pair
    pub(crate) fn supply(&mut self, delay: Duration, rate_ratio: f64) {
        self.mean_link_delay = Some(delay.max(Duration::ZERO));
        self.neighbor_rate_ratio = rate_ratio;
        self.as_capable = true;
    }

    pub(crate) fn invalidate(&mut self) {
        self.as_capable = false;
    }

    pub(crate) fn as_capable(&self) -> bool {
        self.as_capable
    }

    pub(crate) fn mean_link_delay(&self) -> Option<Duration> {
        self.mean_link_delay
    }

    pub(crate) fn neighbor_rate_ratio(&self) -> f64 {
        self.neighbor_rate_ratio
    }
}

/// A network whose members are already time synchronized by other means
///
/// The path delay then equals the residence time of the frame inside the
/// network, and the rate ratio is exactly one.
#[derive(Debug)]
pub(crate) struct IntrinsicCsn {
    residence_time: Option<Duration>,
}

impl IntrinsicCsn {
    pub(crate) fn new() -> Self {
        Self {
            residence_time: None,
        }
    }

    /// Update the residence time reported by the network
    pub(crate) fn set_residence_time(&mut self, residence_time: Duration) {
        self.residence_time = Some(residence_time.max(Duration::ZERO));
    }

    pub(crate) fn as_capable(&self) -> bool {
        self.residence_time.is_some()
    }

    pub(crate) fn mean_link_delay(&self) -> Option<Duration> {
        self.residence_time
    }

    pub(crate) fn neighbor_rate_ratio(&self) -> f64 {
        1.0
    }
}
