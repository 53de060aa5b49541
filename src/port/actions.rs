use core::iter::Fuse;

use arrayvec::ArrayVec;

use crate::datastructures::common::PortIdentity;

/// Identification of a packet that should be sent out.
///
/// The caller receives this from a [`PortAction::SendEvent`] and should
/// return it with
/// [`handle_send_timestamp`](`crate::GptpInstance::handle_send_timestamp`)
/// once the transmit timestamp of that packet is known.
///
/// This type is non-copy and non-clone on purpose to ensure a single
/// timestamp per sent event message.
#[derive(Debug)]
pub struct TimestampContext {
    pub(crate) inner: TimestampContextInner,
}

#[derive(Debug)]
pub(crate) enum TimestampContextInner {
    Sync {
        id: u16,
    },
    PDelayReq {
        id: u16,
    },
    PDelayResp {
        id: u16,
        requestor_identity: PortIdentity,
    },
}

/// An action the user has to perform for the protocol to work
#[derive(Debug)]
#[must_use]
pub enum PortAction<'a> {
    /// Send a time-critical packet
    ///
    /// Once the packet is sent and the transmit timestamp known, the user
    /// should return the given [`TimestampContext`] together with the
    /// timestamp.
    SendEvent {
        context: TimestampContext,
        data: &'a [u8],
    },
    /// Send a general packet; no timestamp needs to be captured
    SendGeneral { data: &'a [u8] },
}

pub(crate) const MAX_ACTIONS: usize = 4;

/// An Iterator over [`PortAction`]s
///
/// These are returned whenever the library needs the user to perform
/// actions towards the system.
#[derive(Debug)]
#[must_use]
pub struct PortActionIterator<'a> {
    internal: Fuse<<ArrayVec<PortAction<'a>, MAX_ACTIONS> as IntoIterator>::IntoIter>,
}

impl<'a> PortActionIterator<'a> {
    /// Get an empty iterator
    pub fn empty() -> Self {
        Self {
            internal: ArrayVec::new().into_iter().fuse(),
        }
    }

    pub(crate) fn from(list: ArrayVec<PortAction<'a>, MAX_ACTIONS>) -> Self {
        Self {
            internal: list.into_iter().fuse(),
        }
    }
}

impl<'a> Iterator for PortActionIterator<'a> {
    type Item = PortAction<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        self.internal.next()
    }
}
