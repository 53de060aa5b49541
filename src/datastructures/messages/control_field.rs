use super::MessageType;

/// The legacy control field of the common header
///
/// Receivers ignore it; transmitters fill it according to *IEEE 1588-2019
/// table 42* for interoperability with v2.0 hardware.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ControlField {
    Sync,
    DelayReq,
    FollowUp,
    DelayResp,
    Management,
    AllOthers,
}

impl ControlField {
    pub(crate) fn to_primitive(self) -> u8 {
        match self {
            ControlField::Sync => 0x00,
            ControlField::DelayReq => 0x01,
            ControlField::FollowUp => 0x02,
            ControlField::DelayResp => 0x03,
            ControlField::Management => 0x04,
            ControlField::AllOthers => 0x05,
        }
    }
}

impl From<MessageType> for ControlField {
    fn from(message_type: MessageType) -> Self {
        match message_type {
            MessageType::Sync => ControlField::Sync,
            MessageType::DelayReq => ControlField::DelayReq,
            MessageType::FollowUp => ControlField::FollowUp,
            MessageType::DelayResp => ControlField::DelayResp,
            MessageType::Management => ControlField::Management,
            MessageType::PDelayReq
            | MessageType::PDelayResp
            | MessageType::PDelayRespFollowUp
            | MessageType::Announce
            | MessageType::Signaling => ControlField::AllOthers,
        }
    }
}
