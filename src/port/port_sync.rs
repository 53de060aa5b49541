//! The PortSync state machine: decides whether this port takes part in time
//! distribution at all, *IEEE 802.1AS-2021 section 10.2.4*

use super::PortRole;
use crate::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PortSyncState {
    /// Sync information on this port is ignored
    Discard,
    /// Sync information flows: a master transmits, a slave consumes
    Transmit,
}

#[derive(Debug)]
pub(crate) struct PortSync {
    state: PortSyncState,
    /// Monotonic time of the last valid sync a slave port saw
    last_valid_sync: Option<Duration>,
}

impl PortSync {
    pub(crate) fn new() -> Self {
        Self {
            state: PortSyncState::Discard,
            last_valid_sync: None,
        }
    }

    pub(crate) fn is_transmit(&self) -> bool {
        self.state == PortSyncState::Transmit
    }

    pub(crate) fn handle_role_change(&mut self, role: PortRole) {
        self.state = match role {
            // A master starts distributing right away; a slave only counts
            // as forwarding once it has a valid sync source
            PortRole::Master => PortSyncState::Transmit,
            _ => PortSyncState::Discard,
        };
        self.last_valid_sync = None;
    }

    /// A slave port saw a usable sync from its master
    pub(crate) fn valid_sync_received(&mut self, now: Duration) {
        self.last_valid_sync = Some(now);
        self.state = PortSyncState::Transmit;
    }

    /// Expire the sync source of a slave port. Returns whether the timeout
    /// fired on this call.
    pub(crate) fn sweep(&mut self, role: PortRole, now: Duration, timeout: Duration) -> bool {
        if !matches!(role, PortRole::Slave | PortRole::Uncalibrated) {
            return false;
        }

        match (self.state, self.last_valid_sync) {
            (PortSyncState::Transmit, Some(last)) if now - last > timeout => {
                log::warn!("sync receipt timed out");
                self.state = PortSyncState::Discard;
                self.last_valid_sync = None;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn master_role_transmits_immediately() {
        let mut sm = PortSync::new();
        assert!(!sm.is_transmit());

        sm.handle_role_change(PortRole::Master);
        assert!(sm.is_transmit());

        sm.handle_role_change(PortRole::Passive);
        assert!(!sm.is_transmit());
    }

    #[test]
    fn slave_needs_a_valid_sync_first() {
        let mut sm = PortSync::new();

        sm.handle_role_change(PortRole::Slave);
        assert!(!sm.is_transmit());

        sm.valid_sync_received(Duration::from_millis(10));
        assert!(sm.is_transmit());
    }

    #[test]
    fn slave_sync_source_expires() {
        let mut sm = PortSync::new();
        sm.handle_role_change(PortRole::Slave);
        sm.valid_sync_received(Duration::from_millis(0));

        let timeout = Duration::from_millis(375);

        assert!(!sm.sweep(PortRole::Slave, Duration::from_millis(300), timeout));
        assert!(sm.is_transmit());

        assert!(sm.sweep(PortRole::Slave, Duration::from_millis(400), timeout));
        assert!(!sm.is_transmit());

        // The timeout only fires once
        assert!(!sm.sweep(PortRole::Slave, Duration::from_millis(500), timeout));
    }

    #[test]
    fn master_never_expires() {
        let mut sm = PortSync::new();
        sm.handle_role_change(PortRole::Master);

        assert!(!sm.sweep(
            PortRole::Master,
            Duration::from_secs(100),
            Duration::from_millis(375)
        ));
        assert!(sm.is_transmit());
    }
}
