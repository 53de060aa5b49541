//! The SiteSyncSync state machine: sync reception on a slave port, *IEEE
//! 802.1AS-2021 section 10.2.8*

use arrayvec::ArrayVec;

use super::sequence_id::in_progression;
use crate::{
    datastructures::messages::{FollowUpMessage, Header, SyncMessage},
    time::{Duration, Time},
};

/// At most this many syncs can wait for their follow up at the same time
const MAX_PENDING_SYNCS: usize = 8;

/// A two step sync whose follow up has not arrived yet
#[derive(Debug, Clone, Copy)]
struct PendingSync {
    id: u16,
    recv_time: Time,
    /// Correction accumulated from the sync header
    correction: Duration,
    deadline: Duration,
}

/// A matched sync and origin time, ready for the offset calculation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct SyncCompletion {
    /// When the master sent the sync, corrections included
    pub(crate) send_time: Time,
    /// When we received the sync
    pub(crate) recv_time: Time,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SiteSyncState {
    Initializing,
    Receiving,
}

#[derive(Debug)]
pub(crate) struct SiteSyncSync {
    state: SiteSyncState,
    pending: ArrayVec<PendingSync, MAX_PENDING_SYNCS>,
    last_sync_sequence_id: Option<u16>,
    pub(crate) sequence_gaps: u32,
    pub(crate) unmatched_follow_ups: u32,
    pub(crate) expired_pending_syncs: u32,
}

impl SiteSyncSync {
    pub(crate) fn new() -> Self {
        Self {
            state: SiteSyncState::Initializing,
            pending: ArrayVec::new(),
            last_sync_sequence_id: None,
            sequence_gaps: 0,
            unmatched_follow_ups: 0,
            expired_pending_syncs: 0,
        }
    }

    pub(crate) fn activate(&mut self) {
        self.state = SiteSyncState::Receiving;
    }

    pub(crate) fn deactivate(&mut self) {
        self.state = SiteSyncState::Initializing;
        self.pending.clear();
        self.last_sync_sequence_id = None;
    }

    /// Process a sync from the current master. For one step syncs the
    /// completion is immediate; a two step sync waits for its follow up.
    pub(crate) fn handle_sync(
        &mut self,
        header: &Header,
        message: &SyncMessage,
        recv_time: Time,
        now: Duration,
        follow_up_timeout: Duration,
    ) -> Option<SyncCompletion> {
        if self.state != SiteSyncState::Receiving {
            return None;
        }

        if let Some(last) = self.last_sync_sequence_id {
            if !in_progression(last.wrapping_add(1), header.sequence_id) {
                self.sequence_gaps += 1;
            }
        }
        self.last_sync_sequence_id = Some(header.sequence_id);

        if header.two_step_flag {
            // Only the correction travels in the sync; the origin time
            // follows in the follow up
            if self.pending.is_full() {
                self.expired_pending_syncs += 1;
                self.pending.remove(0);
            }
            self.pending.push(PendingSync {
                id: header.sequence_id,
                recv_time,
                correction: Duration::from(header.correction_field),
                deadline: now + follow_up_timeout,
            });

            None
        } else {
            Some(SyncCompletion {
                send_time: Time::from(message.origin_timestamp)
                    + Duration::from(header.correction_field),
                recv_time,
            })
        }
    }

    /// Match a follow up against a pending sync. Late or unknown follow ups
    /// are dropped.
    pub(crate) fn handle_follow_up(
        &mut self,
        header: &Header,
        message: &FollowUpMessage,
    ) -> Option<SyncCompletion> {
        if self.state != SiteSyncState::Receiving {
            return None;
        }

        let index = self
            .pending
            .iter()
            .position(|pending| pending.id == header.sequence_id);

        match index {
            Some(index) => {
                let pending = self.pending.remove(index);

                Some(SyncCompletion {
                    send_time: Time::from(message.precise_origin_timestamp)
                        + Duration::from(header.correction_field)
                        + pending.correction,
                    recv_time: pending.recv_time,
                })
            }
            None => {
                log::debug!("follow up {} without pending sync", header.sequence_id);
                self.unmatched_follow_ups += 1;
                None
            }
        }
    }

    /// Drop pending syncs whose follow up never arrived. Returns how many
    /// expired on this call.
    pub(crate) fn sweep(&mut self, now: Duration) -> usize {
        let before = self.pending.len();
        self.pending.retain(|pending| now < pending.deadline);
        let expired = before - self.pending.len();

        if expired > 0 {
            log::debug!("{expired} pending syncs expired without follow up");
            self.expired_pending_syncs += expired as u32;
        }

        expired
    }
}
