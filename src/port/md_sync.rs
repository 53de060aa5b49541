//! The MDSync state machine: two step sync transmission on a master port,
//! *IEEE 802.1AS-2021 section 10.2.15*

use crate::time::{Duration, Time};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum MdSyncState {
    /// The port is not acting as a sync source
    Initializing,
    /// Ready to transmit the next sync when the interval timer fires
    SendSync,
    /// A sync left the port; its follow up waits for the transmit timestamp
    WaitFollowUpTx { id: u16, deadline: Duration },
}

#[derive(Debug)]
pub(crate) struct MdSync {
    state: MdSyncState,
    pub(crate) follow_up_tx_timeouts: u32,
}

impl MdSync {
    pub(crate) fn new() -> Self {
        Self {
            state: MdSyncState::Initializing,
            follow_up_tx_timeouts: 0,
        }
    }

    pub(crate) fn activate(&mut self) {
        if matches!(self.state, MdSyncState::Initializing) {
            self.state = MdSyncState::SendSync;
        }
    }

    pub(crate) fn deactivate(&mut self) {
        self.state = MdSyncState::Initializing;
    }

    /// Whether the interval timer may transmit a sync right now
    pub(crate) fn ready_to_send(&self) -> bool {
        matches!(self.state, MdSyncState::SendSync)
    }

    /// A sync with this sequence id was handed to the transport
    pub(crate) fn sync_sent(&mut self, id: u16, deadline: Duration) {
        self.state = MdSyncState::WaitFollowUpTx { id, deadline };
    }

    /// The transmit timestamp of a sync became available. Returns the
    /// sequence id the follow up must carry.
    pub(crate) fn sync_timestamp(&mut self, timestamp_id: u16, _timestamp: Time) -> Option<u16> {
        match self.state {
            MdSyncState::WaitFollowUpTx { id, .. } if id == timestamp_id => {
                self.state = MdSyncState::SendSync;
                Some(id)
            }
            _ => {
                log::warn!("late sync transmit timestamp ignored");
                None
            }
        }
    }

    /// Drop the pending follow up when its transmit timestamp never came.
    /// Returns whether the timeout fired.
    pub(crate) fn sweep(&mut self, now: Duration) -> bool {
        match self.state {
            MdSyncState::WaitFollowUpTx { id, deadline } if now >= deadline => {
                log::warn!("no transmit timestamp for sync {id}, dropping its follow up");
                self.follow_up_tx_timeouts += 1;
                self.state = MdSyncState::SendSync;
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
    fn follows_the_send_cycle() {
        let mut sm = MdSync::new();
        assert!(!sm.ready_to_send());

        sm.activate();
        assert!(sm.ready_to_send());

        sm.sync_sent(7, Duration::from_millis(100));
        assert!(!sm.ready_to_send());

        // The follow up for sequence id 7 may now be sent
        assert_eq!(sm.sync_timestamp(7, Time::from_micros(10)), Some(7));
        assert!(sm.ready_to_send());
    }

    #[test]
    fn wrong_timestamp_id_is_ignored() {
        let mut sm = MdSync::new();
        sm.activate();
        sm.sync_sent(7, Duration::from_millis(100));

        assert_eq!(sm.sync_timestamp(8, Time::from_micros(10)), None);
        assert!(!sm.ready_to_send());
    }

    #[test]
    fn missing_timestamp_drops_the_follow_up() {
        let mut sm = MdSync::new();
        sm.activate();
        sm.sync_sent(7, Duration::from_millis(100));

        assert!(!sm.sweep(Duration::from_millis(99)));
        assert!(sm.sweep(Duration::from_millis(100)));
        assert_eq!(sm.follow_up_tx_timeouts, 1);
        assert!(sm.ready_to_send());

        // The timestamp showing up afterwards no longer produces a follow up
        assert_eq!(sm.sync_timestamp(7, Time::from_micros(10)), None);
    }
}
