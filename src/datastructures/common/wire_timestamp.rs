use crate::datastructures::{ParseError, WireFormat};

/// A timestamp as encoded in gPTP messages: a 48-bit unsigned seconds field
/// followed by a 32-bit nanoseconds field
///
/// `nanos` below 10^9 is an invariant of the type; the deserializer rejects
/// anything larger as an encoding fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct WireTimestamp {
    /// The seconds field of the timestamp, at most 48 bits wide
    pub seconds: u64,
    /// The nanoseconds field of the timestamp, in `[0, 10^9)`
    pub nanos: u32,
}

impl WireFormat for WireTimestamp {
    fn wire_size(&self) -> usize {
        10
    }

    fn serialize(&self, buffer: &mut [u8]) -> Result<(), ParseError> {
        buffer[0..6].copy_from_slice(&self.seconds.to_be_bytes()[2..8]);
        buffer[6..10].copy_from_slice(&self.nanos.to_be_bytes());
        Ok(())
    }

    fn deserialize(buffer: &[u8]) -> Result<Self, ParseError> {
        let mut seconds = [0; 8];
        seconds[2..8].copy_from_slice(&buffer[0..6]);

        let nanos = u32::from_be_bytes(buffer[6..10].try_into().unwrap());
        if nanos >= 1_000_000_000 {
            return Err(ParseError::InvalidNanoseconds);
        }

        Ok(Self {
            seconds: u64::from_be_bytes(seconds),
            nanos,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wireformat() {
        let representations = [
            (
                [0x00, 0x00, 0x00, 0x00, 0x00, 0x02, 0x00, 0x00, 0x00, 0x05u8],
                WireTimestamp {
                    seconds: 2,
                    nanos: 5,
                },
            ),
            (
                [0x10, 0x00, 0x00, 0x00, 0x00, 0x02, 0x00, 0x00, 0x02, 0x05u8],
                WireTimestamp {
                    seconds: 0x0000_1000_0000_0002,
                    nanos: 0x0000_0205,
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
            let deserialized_data = WireTimestamp::deserialize(&byte_representation).unwrap();
            assert_eq!(deserialized_data, object_representation);
        }
    }

    #[test]
    fn rejects_invalid_nanoseconds() {
        // One full second expressed in the nanoseconds field
        let buffer = [0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x3b, 0x9a, 0xca, 0x00u8];
        assert_eq!(
            WireTimestamp::deserialize(&buffer),
            Err(ParseError::InvalidNanoseconds)
        );
    }
}
