use crate::datastructures::{common::PortIdentity, ParseError, WireFormat};

/// A signaling message: a target port identity followed by TLVs
///
/// The TLV suffix is carried verbatim; this implementation interprets none of
/// them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignalingMessage<'a> {
    pub(crate) target_port_identity: PortIdentity,
    pub(crate) tlvs: &'a [u8],
}

impl<'a> SignalingMessage<'a> {
    pub(crate) fn content_size(&self) -> usize {
        10 + self.tlvs.len()
    }

    pub(crate) fn serialize_content(&self, buffer: &mut [u8]) -> Result<(), ParseError> {
        if buffer.len() < self.content_size() {
            return Err(ParseError::Truncated);
        }
        self.target_port_identity.serialize(&mut buffer[0..10])?;
        buffer[10..10 + self.tlvs.len()].copy_from_slice(self.tlvs);

        Ok(())
    }

    pub(crate) fn deserialize_content(buffer: &'a [u8]) -> Result<Self, ParseError> {
        if buffer.len() < 10 {
            return Err(ParseError::Truncated);
        }
        Ok(Self {
            target_port_identity: PortIdentity::deserialize(&buffer[0..10])?,
            tlvs: &buffer[10..],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datastructures::common::ClockIdentity;

    #[test]
    fn wireformat() {
        let byte_representation = [
            0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0a, // tlv suffix
            0x00, 0x03, 0x00, 0x02, 0xab, 0xcdu8,
        ];

        let object_representation = SignalingMessage {
            target_port_identity: PortIdentity {
                clock_identity: ClockIdentity([0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08]),
                port_number: 0x090a,
            },
            tlvs: &byte_representation[10..],
        };

        let mut serialization_buffer = [0; 16];
        object_representation
            .serialize_content(&mut serialization_buffer)
            .unwrap();
        assert_eq!(serialization_buffer, byte_representation);

        let deserialized_data =
            SignalingMessage::deserialize_content(&byte_representation).unwrap();
        assert_eq!(deserialized_data, object_representation);
    }

    #[test]
    fn empty_tlv_suffix() {
        let message = SignalingMessage {
            target_port_identity: PortIdentity::default(),
            tlvs: &[],
        };
        assert_eq!(message.content_size(), 10);

        let mut buffer = [0; 10];
        message.serialize_content(&mut buffer).unwrap();
        assert_eq!(
            SignalingMessage::deserialize_content(&buffer).unwrap(),
            message
        );
    }
}
