//! Bookkeeping of the foreign masters a port hears announce messages from

use arrayvec::ArrayVec;

use super::dataset_comparison::PriorityVector;
use crate::{
    datastructures::{
        common::{PortIdentity, TimeSource},
        messages::AnnounceMessage,
    },
    port::sequence_difference,
    time::{Duration, Interval},
};

/// The time window in which announce messages count towards qualification.
/// To get the real window, multiply it with the announce interval of the
/// sender.
const FOREIGN_MASTER_TIME_WINDOW: i32 = 4;

/// This is the amount of announce messages that must have been received
/// within the time window for a foreign master to be qualified
const FOREIGN_MASTER_THRESHOLD: usize = 2;

/// The maximum amount of announce arrival times to store per foreign master
const MAX_ANNOUNCE_ARRIVALS: usize = 8;

/// The maximum amount of foreign masters to track at the same time
const MAX_FOREIGN_MASTERS: usize = 8;

/// One remote port this port hears announces from
#[derive(Debug)]
pub(crate) struct ForeignMaster {
    sender_identity: PortIdentity,
    vector: PriorityVector,
    time_source: TimeSource,
    /// The announce pacing the sender advertises
    announce_interval: Interval,
    /// Monotonic arrival times of recent announces
    arrivals: ArrayVec<Duration, MAX_ANNOUNCE_ARRIVALS>,
    last_sequence_id: u16,
}

impl ForeignMaster {
    fn new(message: &AnnounceMessage, receiver_identity: PortIdentity, now: Duration) -> Self {
        let mut arrivals = ArrayVec::new();
        arrivals.push(now);

        Self {
            sender_identity: message.header.source_port_identity,
            vector: PriorityVector::from_announce_message(message, receiver_identity),
            time_source: message.time_source,
            // Clamped so that a nonsense interval cannot overflow the timers
            announce_interval: Interval::from_log_2(message.header.log_message_interval.clamp(-7, 10)),
            arrivals,
            last_sequence_id: message.header.sequence_id,
        }
    }

    fn update(&mut self, message: &AnnounceMessage, receiver_identity: PortIdentity, now: Duration) {
        self.vector = PriorityVector::from_announce_message(message, receiver_identity);
        self.time_source = message.time_source;
        self.announce_interval =
            Interval::from_log_2(message.header.log_message_interval.clamp(-7, 10));
        self.last_sequence_id = message.header.sequence_id;

        self.purge_window(now);
        if self.arrivals.is_full() {
            self.arrivals.remove(0);
        }
        self.arrivals.push(now);
    }

    /// Drop arrival times that fall outside the qualification window
    fn purge_window(&mut self, now: Duration) {
        let cutoff = self.announce_interval.as_duration() * FOREIGN_MASTER_TIME_WINDOW;
        self.arrivals.retain(|arrival| now - *arrival < cutoff);
    }

    fn last_arrival(&self) -> Duration {
        // A record without arrivals reads as ancient and gets purged
        self.arrivals.last().copied().unwrap_or(Duration::ZERO)
    }

    /// A foreign master only takes part in the algorithm once enough
    /// announces arrived inside the time window
    fn is_qualified(&self, now: Duration) -> bool {
        let cutoff = self.announce_interval.as_duration() * FOREIGN_MASTER_TIME_WINDOW;
        let in_window = self
            .arrivals
            .iter()
            .filter(|arrival| now - **arrival < cutoff)
            .count();

        in_window >= FOREIGN_MASTER_THRESHOLD
    }

    pub(crate) fn vector(&self) -> PriorityVector {
        self.vector
    }

    pub(crate) fn time_source(&self) -> TimeSource {
        self.time_source
    }
}

/// All foreign masters one port currently hears from
#[derive(Debug)]
pub(crate) struct ForeignMasterList {
    foreign_masters: ArrayVec<ForeignMaster, MAX_FOREIGN_MASTERS>,
    receiver_identity: PortIdentity,
    /// Intervals without announce before a record expires
    announce_receipt_timeout: u8,
}

impl ForeignMasterList {
    pub(crate) fn new(receiver_identity: PortIdentity, announce_receipt_timeout: u8) -> Self {
        Self {
            foreign_masters: ArrayVec::new(),
            receiver_identity,
            announce_receipt_timeout,
        }
    }

    /// Register a received announce message. Returns whether the message was
    /// accepted.
    pub(crate) fn register_announce_message(
        &mut self,
        message: &AnnounceMessage,
        now: Duration,
    ) -> bool {
        if !self.is_announce_message_qualified(message) {
            return false;
        }

        let source_identity = message.header.source_port_identity;
        let receiver_identity = self.receiver_identity;
        if let Some(foreign_master) = self.get_mut(source_identity) {
            foreign_master.update(message, receiver_identity, now);
            return true;
        }

        if self.foreign_masters.len() < MAX_FOREIGN_MASTERS {
            self.foreign_masters
                .push(ForeignMaster::new(message, self.receiver_identity, now));
            true
        } else {
            false
        }
    }

    /// Remove records that have not been refreshed within the receipt
    /// timeout. Returns whether any record was removed.
    pub(crate) fn purge_timed_out(&mut self, now: Duration) -> bool {
        let timeout_intervals = self.announce_receipt_timeout as i32;
        let before = self.foreign_masters.len();

        self.foreign_masters.retain(|fm| {
            let timeout = fm.announce_interval.as_duration() * timeout_intervals;
            now - fm.last_arrival() <= timeout
        });

        self.foreign_masters.len() != before
    }

    /// The best priority vector among the qualified foreign masters of this
    /// port, called Erbest by the spec
    pub(crate) fn best_qualified(&mut self, now: Duration) -> Option<&ForeignMaster> {
        for fm in &mut self.foreign_masters {
            fm.purge_window(now);
        }

        self.foreign_masters
            .iter()
            .filter(|fm| fm.is_qualified(now))
            .max_by(|a, b| a.vector.compare(&b.vector).as_ordering())
    }

    pub(crate) fn clear(&mut self) {
        self.foreign_masters.clear();
    }

    fn get_mut(&mut self, sender_identity: PortIdentity) -> Option<&mut ForeignMaster> {
        self.foreign_masters
            .iter_mut()
            .find(|fm| fm.sender_identity == sender_identity)
    }

    fn get(&self, sender_identity: PortIdentity) -> Option<&ForeignMaster> {
        self.foreign_masters
            .iter()
            .find(|fm| fm.sender_identity == sender_identity)
    }

    fn is_announce_message_qualified(&self, message: &AnnounceMessage) -> bool {
        let source_identity = message.header.source_port_identity;

        // 1. The message must not come from our own instance. Every instance
        // has one clock, so the clock identity decides.
        if source_identity.clock_identity == self.receiver_identity.clock_identity {
            return false;
        }

        // 2. The message must be newer than the one we already have from the
        // same sender, with rollover handling on the sequence id
        if let Some(foreign_master) = self.get(source_identity) {
            let distance =
                sequence_difference(foreign_master.last_sequence_id, message.header.sequence_id);
            if distance >= u16::MAX / 2 {
                return false;
            }
        }

        // 3. A stepsRemoved of 255 or more means the message traveled too far
        if message.steps_removed >= 255 {
            return false;
        }

        true
    }
}
