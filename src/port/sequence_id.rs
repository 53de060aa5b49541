use crate::datastructures::messages::MessageType;

/// A pool of sequence ids for one message type
///
/// `generate` hands out the current value and advances, wrapping at the
/// 16 bit boundary.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct SequenceIdGenerator {
    next: u16,
}

impl SequenceIdGenerator {
    pub(crate) fn new() -> Self {
        SequenceIdGenerator { next: 0 }
    }

    pub(crate) fn generate(&mut self) -> u16 {
        let id = self.next;
        self.next = self.next.wrapping_add(1);
        id
    }
}

/// One sequence id pool per transmitted message type, *IEEE 802.1AS-2021
/// section 10.5.7*
///
/// A follow up reuses the sequence id of the sync it belongs to and a peer
/// delay response mirrors the request, so in practice only four pools
/// advance; the others exist for symmetry and test determinism.
#[derive(Debug, Default)]
pub(crate) struct SequencePools {
    sync: SequenceIdGenerator,
    follow_up: SequenceIdGenerator,
    pdelay_req: SequenceIdGenerator,
    pdelay_resp: SequenceIdGenerator,
    announce: SequenceIdGenerator,
    signaling: SequenceIdGenerator,
}

impl SequencePools {
    pub(crate) fn new() -> Self {
        Self {
            sync: SequenceIdGenerator::new(),
            follow_up: SequenceIdGenerator::new(),
            pdelay_req: SequenceIdGenerator::new(),
            pdelay_resp: SequenceIdGenerator::new(),
            announce: SequenceIdGenerator::new(),
            signaling: SequenceIdGenerator::new(),
        }
    }

    pub(crate) fn generate(&mut self, message_type: MessageType) -> u16 {
        match message_type {
            MessageType::Sync => self.sync.generate(),
            MessageType::FollowUp => self.follow_up.generate(),
            MessageType::PDelayReq => self.pdelay_req.generate(),
            MessageType::PDelayResp => self.pdelay_resp.generate(),
            MessageType::Announce => self.announce.generate(),
            MessageType::Signaling => self.signaling.generate(),
            MessageType::DelayReq
            | MessageType::DelayResp
            | MessageType::Management
            | MessageType::PDelayRespFollowUp => {
                debug_assert!(false, "no pool for this message type");
                0
            }
        }
    }
}

/// Whether going from `previous` to `current` is the single step wrap of the
/// sequence space
pub(crate) fn is_rollover(previous: u16, current: u16) -> bool {
    previous == 0xffff && current == 0x0000
}

/// Distance from `from` to `to`, walking forward through the wrap
pub(crate) fn sequence_difference(from: u16, to: u16) -> u16 {
    to.wrapping_sub(from)
}

/// A received sequence id is in progression when it is the expected value or
/// a valid single step rollover
pub(crate) fn in_progression(expected: u16, received: u16) -> bool {
    received == expected || is_rollover(expected, received)
}
