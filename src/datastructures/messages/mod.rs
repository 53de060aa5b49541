//! gPTP network messages

pub use announce::*;
pub use follow_up::*;
pub use header::*;
pub use p_delay_req::*;
pub use p_delay_resp::*;
pub use p_delay_resp_follow_up::*;
pub use signaling::*;
pub use sync::*;

use super::{
    common::PortIdentity,
    datasets::{CurrentDS, DefaultDS, ParentDS},
    ParseError,
};
use crate::time::{Interval, Time};

mod announce;
mod control_field;
mod follow_up;
mod header;
mod p_delay_req;
mod p_delay_resp;
mod p_delay_resp_follow_up;
mod signaling;
mod sync;

/// Maximum length of a gPTP packet
///
/// This can be used to preallocate buffers that can always fit packets sent
/// by this crate.
pub const MAX_DATA_LEN: usize = 255;

/// The type field of a message, *IEEE 802.1AS-2021 table 10-6*
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum MessageType {
    Sync = 0x0,
    DelayReq = 0x1,
    PDelayReq = 0x2,
    PDelayResp = 0x3,
    FollowUp = 0x8,
    DelayResp = 0x9,
    PDelayRespFollowUp = 0xa,
    Announce = 0xb,
    Signaling = 0xc,
    Management = 0xd,
}

pub struct EnumConversionError;

impl TryFrom<u8> for MessageType {
    type Error = EnumConversionError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        use MessageType::*;

        match value {
            0x0 => Ok(Sync),
            0x1 => Ok(DelayReq),
            0x2 => Ok(PDelayReq),
            0x3 => Ok(PDelayResp),
            0x8 => Ok(FollowUp),
            0x9 => Ok(DelayResp),
            0xa => Ok(PDelayRespFollowUp),
            0xb => Ok(Announce),
            0xc => Ok(Signaling),
            0xd => Ok(Management),
            _ => Err(EnumConversionError),
        }
    }
}

#[cfg(feature = "fuzz")]
pub use fuzz::FuzzMessage;

#[cfg(feature = "fuzz")]
mod fuzz {
    #![allow(missing_docs)] // These are only used for internal fuzzing
    use super::*;

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct FuzzMessage<'a> {
        inner: Message<'a>,
    }

    impl<'a> FuzzMessage<'a> {
        pub fn deserialize(buffer: &'a [u8]) -> Result<Self, ParseError> {
            Ok(FuzzMessage {
                inner: Message::deserialize(buffer)?,
            })
        }

        pub fn serialize(&self, buffer: &mut [u8]) -> Result<usize, ParseError> {
            self.inner.serialize(buffer)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message<'a> {
    pub(crate) header: Header,
    pub(crate) body: MessageBody<'a>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageBody<'a> {
    Sync(SyncMessage),
    FollowUp(FollowUpMessage),
    PDelayReq(PDelayReqMessage),
    PDelayResp(PDelayRespMessage),
    PDelayRespFollowUp(PDelayRespFollowUpMessage),
    Announce(AnnounceMessage),
    Signaling(SignalingMessage<'a>),
}

impl MessageBody<'_> {
    pub(crate) fn wire_size(&self) -> usize {
        match &self {
            MessageBody::Sync(m) => m.content_size(),
            MessageBody::FollowUp(m) => m.content_size(),
            MessageBody::PDelayReq(m) => m.content_size(),
            MessageBody::PDelayResp(m) => m.content_size(),
            MessageBody::PDelayRespFollowUp(m) => m.content_size(),
            MessageBody::Announce(m) => m.content_size(),
            MessageBody::Signaling(m) => m.content_size(),
        }
    }

    pub(crate) fn content_type(&self) -> MessageType {
        match self {
            MessageBody::Sync(_) => MessageType::Sync,
            MessageBody::FollowUp(_) => MessageType::FollowUp,
            MessageBody::PDelayReq(_) => MessageType::PDelayReq,
            MessageBody::PDelayResp(_) => MessageType::PDelayResp,
            MessageBody::PDelayRespFollowUp(_) => MessageType::PDelayRespFollowUp,
            MessageBody::Announce(_) => MessageType::Announce,
            MessageBody::Signaling(_) => MessageType::Signaling,
        }
    }

    pub(crate) fn serialize(&self, buffer: &mut [u8]) -> Result<usize, ParseError> {
        match &self {
            MessageBody::Sync(m) => m.serialize_content(buffer)?,
            MessageBody::FollowUp(m) => m.serialize_content(buffer)?,
            MessageBody::PDelayReq(m) => m.serialize_content(buffer)?,
            MessageBody::PDelayResp(m) => m.serialize_content(buffer)?,
            MessageBody::PDelayRespFollowUp(m) => m.serialize_content(buffer)?,
            MessageBody::Announce(m) => m.serialize_content(buffer)?,
            MessageBody::Signaling(m) => m.serialize_content(buffer)?,
        }

        Ok(self.wire_size())
    }

    pub(crate) fn deserialize<'a>(
        message_type: MessageType,
        header: &Header,
        buffer: &'a [u8],
    ) -> Result<MessageBody<'a>, ParseError> {
        let body = match message_type {
            MessageType::Sync => MessageBody::Sync(SyncMessage::deserialize_content(buffer)?),
            MessageType::FollowUp => {
                MessageBody::FollowUp(FollowUpMessage::deserialize_content(buffer)?)
            }
            MessageType::PDelayReq => {
                MessageBody::PDelayReq(PDelayReqMessage::deserialize_content(buffer)?)
            }
            MessageType::PDelayResp => {
                MessageBody::PDelayResp(PDelayRespMessage::deserialize_content(buffer)?)
            }
            MessageType::PDelayRespFollowUp => MessageBody::PDelayRespFollowUp(
                PDelayRespFollowUpMessage::deserialize_content(buffer)?,
            ),
            MessageType::Announce => {
                MessageBody::Announce(AnnounceMessage::deserialize_content(*header, buffer)?)
            }
            MessageType::Signaling => {
                MessageBody::Signaling(SignalingMessage::deserialize_content(buffer)?)
            }
            // End to end delay and management are not part of gPTP
            MessageType::DelayReq | MessageType::DelayResp | MessageType::Management => {
                return Err(ParseError::UnsupportedMessageType)
            }
        };

        Ok(body)
    }
}

fn base_header(default_ds: &DefaultDS, port_identity: PortIdentity, sequence_id: u16) -> Header {
    Header {
        domain_number: default_ds.domain_number,
        source_port_identity: port_identity,
        sequence_id,
        ..Default::default()
    }
}

impl<'a> Message<'a> {
    pub(crate) fn header(&self) -> &Header {
        &self.header
    }

    /// An event message is one that is timestamped on transmission and
    /// reception
    pub(crate) fn is_event(&self) -> bool {
        use MessageBody::*;
        match self.body {
            Sync(_) | PDelayReq(_) | PDelayResp(_) => true,
            FollowUp(_) | PDelayRespFollowUp(_) | Announce(_) | Signaling(_) => false,
        }
    }

    pub(crate) fn sync(
        default_ds: &DefaultDS,
        port_identity: PortIdentity,
        sequence_id: u16,
        sync_interval: Interval,
    ) -> Self {
        let header = Header {
            two_step_flag: true,
            log_message_interval: sync_interval.as_log_2(),
            ..base_header(default_ds, port_identity, sequence_id)
        };

        Message {
            header,
            body: MessageBody::Sync(SyncMessage {
                origin_timestamp: Default::default(),
            }),
        }
    }

    pub(crate) fn follow_up(
        default_ds: &DefaultDS,
        port_identity: PortIdentity,
        sequence_id: u16,
        sync_interval: Interval,
        timestamp: Time,
    ) -> Self {
        let header = Header {
            correction_field: timestamp.subnano(),
            log_message_interval: sync_interval.as_log_2(),
            ..base_header(default_ds, port_identity, sequence_id)
        };

        Message {
            header,
            body: MessageBody::FollowUp(FollowUpMessage {
                precise_origin_timestamp: timestamp.into(),
            }),
        }
    }

    pub(crate) fn announce(
        default_ds: &DefaultDS,
        parent_ds: &ParentDS,
        current_ds: &CurrentDS,
        port_identity: PortIdentity,
        sequence_id: u16,
        announce_interval: Interval,
    ) -> Self {
        let header = Header {
            log_message_interval: announce_interval.as_log_2(),
            ..base_header(default_ds, port_identity, sequence_id)
        };

        let body = MessageBody::Announce(AnnounceMessage {
            header,
            origin_timestamp: Default::default(),
            current_utc_offset: 0,
            grandmaster_priority_1: parent_ds.grandmaster_priority_1,
            grandmaster_clock_quality: parent_ds.grandmaster_clock_quality,
            grandmaster_priority_2: parent_ds.grandmaster_priority_2,
            grandmaster_identity: parent_ds.grandmaster_identity,
            steps_removed: current_ds.steps_removed,
            time_source: parent_ds.time_source,
        });

        Message { header, body }
    }

    pub(crate) fn pdelay_req(
        default_ds: &DefaultDS,
        port_identity: PortIdentity,
        sequence_id: u16,
        pdelay_interval: Interval,
    ) -> Self {
        let header = Header {
            log_message_interval: pdelay_interval.as_log_2(),
            ..base_header(default_ds, port_identity, sequence_id)
        };

        Message {
            header,
            body: MessageBody::PDelayReq(PDelayReqMessage {
                origin_timestamp: Default::default(),
            }),
        }
    }

    pub(crate) fn pdelay_resp(
        default_ds: &DefaultDS,
        port_identity: PortIdentity,
        request_header: &Header,
        timestamp: Time,
    ) -> Self {
        let header = Header {
            two_step_flag: true,
            // Fractional nanoseconds of t2 travel in the correction field
            correction_field: timestamp.subnano(),
            log_message_interval: 0x7f,
            ..base_header(default_ds, port_identity, request_header.sequence_id)
        };

        Message {
            header,
            body: MessageBody::PDelayResp(PDelayRespMessage {
                request_receive_timestamp: timestamp.into(),
                requesting_port_identity: request_header.source_port_identity,
            }),
        }
    }

    pub(crate) fn pdelay_resp_follow_up(
        default_ds: &DefaultDS,
        port_identity: PortIdentity,
        requestor_identity: PortIdentity,
        sequence_id: u16,
        timestamp: Time,
    ) -> Self {
        let header = Header {
            correction_field: timestamp.subnano(),
            log_message_interval: 0x7f,
            ..base_header(default_ds, port_identity, sequence_id)
        };

        Message {
            header,
            body: MessageBody::PDelayRespFollowUp(PDelayRespFollowUpMessage {
                response_origin_timestamp: timestamp.into(),
                requesting_port_identity: requestor_identity,
            }),
        }
    }

    #[allow(unused)]
    pub(crate) fn signaling(
        default_ds: &DefaultDS,
        port_identity: PortIdentity,
        sequence_id: u16,
        target_port_identity: PortIdentity,
        tlvs: &'a [u8],
    ) -> Self {
        let header = Header {
            log_message_interval: 0x7f,
            ..base_header(default_ds, port_identity, sequence_id)
        };

        Message {
            header,
            body: MessageBody::Signaling(SignalingMessage {
                target_port_identity,
                tlvs,
            }),
        }
    }

    /// The byte size on the wire of this message
    pub(crate) fn wire_size(&self) -> usize {
        self.header.wire_size() + self.body.wire_size()
    }

    /// Serializes the message into the gPTP wire format.
    ///
    /// Returns the used buffer size that contains the message or an error.
    pub(crate) fn serialize(&self, buffer: &mut [u8]) -> Result<usize, ParseError> {
        if buffer.len() < self.wire_size() {
            return Err(ParseError::Truncated);
        }

        let (header, rest) = buffer.split_at_mut(34);

        self.header
            .serialize_header(self.body.content_type(), self.body.wire_size(), header)?;
        self.body.serialize(rest)?;

        Ok(self.wire_size())
    }

    /// Deserializes a message from the gPTP wire format.
    ///
    /// Returns the message or an error. The output is never partially
    /// constructed: any fault in the buffer leaves only an error behind.
    pub(crate) fn deserialize(buffer: &'a [u8]) -> Result<Self, ParseError> {
        let header_data = Header::deserialize_header(buffer)?;

        if (header_data.message_length as usize) < 34 {
            return Err(ParseError::InconsistentLength);
        }

        if header_data.message_length as usize != buffer.len() {
            return Err(ParseError::InconsistentLength);
        }

        let content_buffer = buffer
            .get(34..header_data.message_length as usize)
            .ok_or(ParseError::Truncated)?;

        let body = MessageBody::deserialize(
            header_data.message_type,
            &header_data.header,
            content_buffer,
        )?;

        Ok(Message {
            header: header_data.header,
            body,
        })
    }
}
