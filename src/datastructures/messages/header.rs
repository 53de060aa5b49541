use super::{control_field::ControlField, MessageType};
use crate::datastructures::{
    common::{PortIdentity, TimeInterval},
    ParseError, WireFormat,
};

/// The common header of every gPTP message, 34 bytes on the wire
///
/// See *IEEE 802.1AS-2021 section 10.5.2* for the field layout and
/// *section 10.5.2.2.6* for the flag bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub(crate) domain_number: u8,
    pub(crate) alternate_master_flag: bool,
    pub(crate) two_step_flag: bool,
    pub(crate) unicast_flag: bool,
    pub(crate) profile_specific_1: bool,
    pub(crate) profile_specific_2: bool,
    pub(crate) leap61: bool,
    pub(crate) leap59: bool,
    pub(crate) current_utc_offset_valid: bool,
    pub(crate) ptp_timescale: bool,
    pub(crate) time_traceable: bool,
    pub(crate) frequency_traceable: bool,
    pub(crate) synchronization_uncertain: bool,
    pub(crate) correction_field: TimeInterval,
    pub(crate) source_port_identity: PortIdentity,
    pub(crate) sequence_id: u16,
    pub(crate) log_message_interval: i8,
}

/// The nibble identifying 802.1AS in the first header byte
pub(crate) const TRANSPORT_SPECIFIC_GPTP: u8 = 1;

/// The PTP version gPTP messages carry
pub(crate) const VERSION_PTP: u8 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct DeserializedHeader {
    pub(crate) header: Header,
    pub(crate) message_type: MessageType,
    pub(crate) message_length: u16,
}

impl Header {
    pub(crate) fn new() -> Self {
        Self {
            domain_number: 0,
            alternate_master_flag: false,
            two_step_flag: false,
            unicast_flag: false,
            profile_specific_1: false,
            profile_specific_2: false,
            leap61: false,
            leap59: false,
            current_utc_offset_valid: false,
            ptp_timescale: true,
            time_traceable: false,
            frequency_traceable: false,
            synchronization_uncertain: false,
            correction_field: TimeInterval::default(),
            source_port_identity: PortIdentity::default(),
            sequence_id: 0,
            log_message_interval: 0,
        }
    }

    pub(crate) fn wire_size(&self) -> usize {
        34
    }

    pub(crate) fn serialize_header(
        &self,
        content_type: MessageType,
        content_length: usize,
        buffer: &mut [u8],
    ) -> Result<(), ParseError> {
        if buffer.len() < 34 {
            return Err(ParseError::Truncated);
        }

        buffer[0] = (TRANSPORT_SPECIFIC_GPTP << 4) | ((content_type as u8) & 0x0f);
        buffer[1] = VERSION_PTP;
        buffer[2..4].copy_from_slice(&((content_length + 34) as u16).to_be_bytes());
        buffer[4] = self.domain_number;
        buffer[5] = 0;

        buffer[6] = (self.alternate_master_flag as u8)
            | ((self.two_step_flag as u8) << 1)
            | ((self.unicast_flag as u8) << 2)
            | ((self.profile_specific_1 as u8) << 5)
            | ((self.profile_specific_2 as u8) << 6);
        buffer[7] = (self.leap61 as u8)
            | ((self.leap59 as u8) << 1)
            | ((self.current_utc_offset_valid as u8) << 2)
            | ((self.ptp_timescale as u8) << 3)
            | ((self.time_traceable as u8) << 4)
            | ((self.frequency_traceable as u8) << 5)
            | ((self.synchronization_uncertain as u8) << 6);

        self.correction_field.serialize(&mut buffer[8..16])?;
        buffer[16..20].copy_from_slice(&[0, 0, 0, 0]);
        self.source_port_identity.serialize(&mut buffer[20..30])?;
        buffer[30..32].copy_from_slice(&self.sequence_id.to_be_bytes());
        buffer[32] = ControlField::from(content_type).to_primitive();
        buffer[33] = self.log_message_interval as u8;

        Ok(())
    }

    pub(crate) fn deserialize_header(buffer: &[u8]) -> Result<DeserializedHeader, ParseError> {
        if buffer.len() < 34 {
            return Err(ParseError::Truncated);
        }

        if buffer[0] >> 4 != TRANSPORT_SPECIFIC_GPTP {
            return Err(ParseError::BadTransportSpecific);
        }

        if buffer[1] & 0x0f != VERSION_PTP {
            return Err(ParseError::UnsupportedVersion);
        }

        let message_type = MessageType::try_from(buffer[0] & 0x0f)
            .map_err(|_| ParseError::UnsupportedMessageType)?;

        Ok(DeserializedHeader {
            header: Self {
                domain_number: buffer[4],
                alternate_master_flag: buffer[6] & (1 << 0) > 0,
                two_step_flag: buffer[6] & (1 << 1) > 0,
                unicast_flag: buffer[6] & (1 << 2) > 0,
                profile_specific_1: buffer[6] & (1 << 5) > 0,
                profile_specific_2: buffer[6] & (1 << 6) > 0,
                leap61: buffer[7] & (1 << 0) > 0,
                leap59: buffer[7] & (1 << 1) > 0,
                current_utc_offset_valid: buffer[7] & (1 << 2) > 0,
                ptp_timescale: buffer[7] & (1 << 3) > 0,
                time_traceable: buffer[7] & (1 << 4) > 0,
                frequency_traceable: buffer[7] & (1 << 5) > 0,
                synchronization_uncertain: buffer[7] & (1 << 6) > 0,
                correction_field: TimeInterval::deserialize(&buffer[8..16])?,
                source_port_identity: PortIdentity::deserialize(&buffer[20..30])?,
                sequence_id: u16::from_be_bytes(buffer[30..32].try_into().unwrap()),
                log_message_interval: buffer[33] as i8,
            },
            message_type,
            message_length: u16::from_be_bytes(buffer[2..4].try_into().unwrap()),
        })
    }
}

impl Default for Header {
    fn default() -> Self {
        Self::new()
    }
}
