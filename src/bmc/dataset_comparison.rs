//! Implementation of the priority vector comparison of *IEEE 802.1AS-2021
//! section 10.3.4*

use core::cmp::Ordering;

use crate::datastructures::{
    common::{ClockIdentity, ClockQuality, PortIdentity},
    datasets::DefaultDS,
    messages::AnnounceMessage,
};

/// The data gathered from an announce message or from our own data sets that
/// the best master clock algorithm orders. When gathered from two different
/// sources, [`PriorityVector::compare`] finds out which source is the better
/// master.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PriorityVector {
    pub(crate) gm_priority_1: u8,
    pub(crate) gm_clock_quality: ClockQuality,
    pub(crate) gm_priority_2: u8,
    pub(crate) gm_identity: ClockIdentity,
    pub(crate) steps_removed: u16,
    pub(crate) sender_identity: PortIdentity,
    pub(crate) receiver_identity: PortIdentity,
}

impl PriorityVector {
    /// Create a vector from the data in an announce message and the identity
    /// of the port that received it
    pub(crate) fn from_announce_message(
        message: &AnnounceMessage,
        receiver_identity: PortIdentity,
    ) -> Self {
        Self {
            gm_priority_1: message.grandmaster_priority_1,
            gm_clock_quality: message.grandmaster_clock_quality,
            gm_priority_2: message.grandmaster_priority_2,
            gm_identity: message.grandmaster_identity,
            steps_removed: message.steps_removed,
            sender_identity: message.header.source_port_identity,
            receiver_identity,
        }
    }

    /// The vector our own clock would advertise, called D0 by the spec
    pub(crate) fn from_own_data(data: &DefaultDS) -> Self {
        let own_port = PortIdentity {
            clock_identity: data.clock_identity,
            port_number: 0,
        };

        Self {
            gm_priority_1: data.priority_1,
            gm_clock_quality: data.clock_quality,
            gm_priority_2: data.priority_2,
            gm_identity: data.clock_identity,
            steps_removed: 0,
            sender_identity: own_port,
            receiver_identity: own_port,
        }
    }

    /// Returns how `self` orders as a master candidate compared to `other`
    pub(crate) fn compare(&self, other: &Self) -> VectorOrdering {
        if self.gm_identity == other.gm_identity {
            self.compare_same_grandmaster(other)
        } else {
            self.compare_different_grandmaster(other)
        }
    }

    /// The candidates claim different grandmasters, figure 10-14 part 1
    fn compare_different_grandmaster(&self, other: &Self) -> VectorOrdering {
        let ordering = (self.gm_priority_1.cmp(&other.gm_priority_1))
            .then_with(|| self.gm_clock_quality.cmp_numeric(&other.gm_clock_quality))
            .then_with(|| self.gm_priority_2.cmp(&other.gm_priority_2))
            .then_with(|| self.gm_identity.cmp(&other.gm_identity));

        match ordering {
            Ordering::Equal => unreachable!("gm_identity is guaranteed to be different"),
            Ordering::Greater => VectorOrdering::Worse,
            Ordering::Less => VectorOrdering::Better,
        }
    }

    /// The candidates claim the same grandmaster, figure 10-14 part 2
    fn compare_same_grandmaster(&self, other: &Self) -> VectorOrdering {
        let steps_removed_difference = self.steps_removed as i32 - other.steps_removed as i32;

        match steps_removed_difference {
            // Two or more hops apart, the closer candidate wins on topology
            2..=i32::MAX => VectorOrdering::WorseByTopology,
            i32::MIN..=-2 => VectorOrdering::BetterByTopology,
            1 => match Ord::cmp(
                &self.receiver_identity.clock_identity,
                &self.sender_identity.clock_identity,
            ) {
                Ordering::Less => VectorOrdering::Worse,
                Ordering::Equal => VectorOrdering::Error1,
                Ordering::Greater => VectorOrdering::WorseByTopology,
            },
            -1 => match Ord::cmp(
                &other.receiver_identity.clock_identity,
                &other.sender_identity.clock_identity,
            ) {
                Ordering::Less => VectorOrdering::Better,
                Ordering::Equal => VectorOrdering::Error1,
                Ordering::Greater => VectorOrdering::BetterByTopology,
            },
            0 => {
                let senders = self.sender_identity.cmp(&other.sender_identity);
                let receivers = Ord::cmp(
                    &self.receiver_identity.port_number,
                    &other.receiver_identity.port_number,
                );

                match senders.then(receivers) {
                    Ordering::Less => VectorOrdering::BetterByTopology,
                    Ordering::Greater => VectorOrdering::WorseByTopology,
                    Ordering::Equal if self == other => VectorOrdering::SameMaster,
                    Ordering::Equal => VectorOrdering::Error2,
                }
            }
        }
    }
}

/// The result of ordering two priority vectors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum VectorOrdering {
    /// The left vector is the better master
    Better,
    /// Equal quality, but the left vector is preferred because of the
    /// network topology
    BetterByTopology,
    /// The vectors are the same data seen through the same path
    SameMaster,
    /// Equal quality and equal topology, which indicates a network loop
    Error1,
    /// Two different receptions that are indistinguishable, which indicates
    /// duplicated messages
    Error2,
    /// Equal quality, but the right vector is preferred because of the
    /// network topology
    WorseByTopology,
    /// The right vector is the better master
    Worse,
}

impl VectorOrdering {
    pub(crate) const fn as_ordering(self) -> Ordering {
        // The error outcomes mean two candidates are functionally the same,
        // either choice is then valid
        match self {
            VectorOrdering::Better | VectorOrdering::BetterByTopology => Ordering::Greater,
            VectorOrdering::SameMaster | VectorOrdering::Error1 | VectorOrdering::Error2 => {
                Ordering::Equal
            }
            VectorOrdering::WorseByTopology | VectorOrdering::Worse => Ordering::Less,
        }
    }

    pub(crate) const fn is_better(self) -> bool {
        matches!(self, VectorOrdering::Better | VectorOrdering::BetterByTopology)
    }
}
