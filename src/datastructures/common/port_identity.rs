use super::clock_identity::ClockIdentity;
use crate::datastructures::{ParseError, WireFormat};

/// The identity of a single port of a gPTP instance
///
/// Port numbers are 1-based, 0 is reserved. For more details see *IEEE
/// 802.1AS-2021 section 8.5.2*.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PortIdentity {
    /// The identity of the clock this port is part of
    pub clock_identity: ClockIdentity,
    /// The number of the port, unique within the instance
    pub port_number: u16,
}

impl WireFormat for PortIdentity {
    fn wire_size(&self) -> usize {
        10
    }

    fn serialize(&self, buffer: &mut [u8]) -> Result<(), ParseError> {
        self.clock_identity.serialize(&mut buffer[0..8])?;
        buffer[8..10].copy_from_slice(&self.port_number.to_be_bytes());
        Ok(())
    }

    fn deserialize(buffer: &[u8]) -> Result<Self, ParseError> {
        Ok(Self {
            clock_identity: ClockIdentity::deserialize(&buffer[0..8])?,
            port_number: u16::from_be_bytes(buffer[8..10].try_into().unwrap()),
        })
    }
}

impl core::fmt::Display for PortIdentity {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}-{}", self.clock_identity, self.port_number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wireformat() {
        let representations = [
            (
                [
                    0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x15, 0xb3u8,
                ],
                PortIdentity {
                    clock_identity: ClockIdentity([0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07]),
                    port_number: 5555,
                },
            ),
            (
                [
                    0x40, 0x6b, 0x96, 0xae, 0x40, 0x82, 0x37, 0xc9, 0x16, 0x42u8,
                ],
                PortIdentity {
                    clock_identity: ClockIdentity([0x40, 0x6b, 0x96, 0xae, 0x40, 0x82, 0x37, 0xc9]),
                    port_number: 5698,
                },
            ),
        ];

        for (byte_representation, object_representation) in representations {
            // Test the serialization output
            let mut serialization_buffer = [0; 10];
            object_representation
                .serialize(&mut serialization_buffer)
                .unwrap();
            assert_eq!(serialization_buffer, byte_representation);

            // Test the deserialization output
            let deserialized_data = PortIdentity::deserialize(&byte_representation).unwrap();
            assert_eq!(deserialized_data, object_representation);
        }
    }
}
