use crate::datastructures::{
    common::{PortIdentity, WireTimestamp},
    ParseError, WireFormat,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PDelayRespMessage {
    pub(crate) request_receive_timestamp: WireTimestamp,
    pub(crate) requesting_port_identity: PortIdentity,
}

impl PDelayRespMessage {
    pub(crate) fn content_size(&self) -> usize {
        20
    }

    pub(crate) fn serialize_content(&self, buffer: &mut [u8]) -> Result<(), ParseError> {
        if buffer.len() < 20 {
            return Err(ParseError::Truncated);
        }
        self.request_receive_timestamp
            .serialize(&mut buffer[0..10])?;
        self.requesting_port_identity
            .serialize(&mut buffer[10..20])?;

        Ok(())
    }

    pub(crate) fn deserialize_content(buffer: &[u8]) -> Result<Self, ParseError> {
        if buffer.len() < 20 {
            return Err(ParseError::Truncated);
        }
        Ok(Self {
            request_receive_timestamp: WireTimestamp::deserialize(&buffer[0..10])?,
            requesting_port_identity: PortIdentity::deserialize(&buffer[10..20])?,
        })
    }
}
