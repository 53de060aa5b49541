use crate::datastructures::{common::WireTimestamp, ParseError, WireFormat};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PDelayReqMessage {
    pub(crate) origin_timestamp: WireTimestamp,
}

impl PDelayReqMessage {
    pub(crate) fn content_size(&self) -> usize {
        20
    }

    pub(crate) fn serialize_content(&self, buffer: &mut [u8]) -> Result<(), ParseError> {
        if buffer.len() < 20 {
            return Err(ParseError::Truncated);
        }
        self.origin_timestamp.serialize(&mut buffer[0..10])?;
        buffer[10..20].fill(0);

        Ok(())
    }

    pub(crate) fn deserialize_content(buffer: &[u8]) -> Result<Self, ParseError> {
        if buffer.len() < 20 {
            return Err(ParseError::Truncated);
        }
        Ok(Self {
            origin_timestamp: WireTimestamp::deserialize(&buffer[0..10])?,
        })
    }
}
