use core::cmp::Ordering;

use super::clock_accuracy::ClockAccuracy;
use crate::datastructures::{ParseError, WireFormat};

/// A description of the accuracy and type of a clock
///
/// The ordered triple (class, accuracy, variance) is what the best master
/// clock algorithm compares; the semantic ranges of *IEEE 802.1AS-2021
/// section 8.6.2.2* are opaque to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ClockQuality {
    /// The traceability of the distributed time, lower is better
    pub clock_class: u8,
    /// The bounded accuracy range of the clock
    pub clock_accuracy: ClockAccuracy,
    /// 2-log of the variance (in seconds^2) of the clock when not
    /// synchronized
    pub offset_scaled_log_variance: u16,
}

impl ClockQuality {
    /// Numeric comparison in BMCA order: class, then accuracy, then variance.
    /// Lower byte values order first on every field.
    pub fn cmp_numeric(&self, other: &Self) -> Ordering {
        self.clock_class
            .cmp(&other.clock_class)
            .then_with(|| self.clock_accuracy.cmp_numeric(&other.clock_accuracy))
            .then_with(|| {
                self.offset_scaled_log_variance
                    .cmp(&other.offset_scaled_log_variance)
            })
    }
}

impl Default for ClockQuality {
    fn default() -> Self {
        Self {
            // gPTP default for a grandmaster-capable end station
            clock_class: 248,
            clock_accuracy: ClockAccuracy::Unknown,
            offset_scaled_log_variance: 0x436A,
        }
    }
}

impl WireFormat for ClockQuality {
    fn wire_size(&self) -> usize {
        4
    }

    fn serialize(&self, buffer: &mut [u8]) -> Result<(), ParseError> {
        buffer[0] = self.clock_class;
        buffer[1] = self.clock_accuracy.to_primitive();
        buffer[2..4].copy_from_slice(&self.offset_scaled_log_variance.to_be_bytes());
        Ok(())
    }

    fn deserialize(buffer: &[u8]) -> Result<Self, ParseError> {
        Ok(Self {
            clock_class: buffer[0],
            clock_accuracy: ClockAccuracy::from_primitive(buffer[1]),
            offset_scaled_log_variance: u16::from_be_bytes(buffer[2..4].try_into().unwrap()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wireformat() {
        let representations = [(
            [0x06, 0x21, 0x41, 0x21u8],
            ClockQuality {
                clock_class: 6,
                clock_accuracy: ClockAccuracy::NS100,
                offset_scaled_log_variance: 0x4121,
            },
        )];

        for (byte_representation, object_representation) in representations {
            let mut serialization_buffer = [0; 4];
            object_representation
                .serialize(&mut serialization_buffer)
                .unwrap();
            assert_eq!(serialization_buffer, byte_representation);

            let deserialized_data = ClockQuality::deserialize(&byte_representation).unwrap();
            assert_eq!(deserialized_data, object_representation);
        }
    }

    #[test]
    fn comparison_order() {
        let better = ClockQuality {
            clock_class: 6,
            ..Default::default()
        };
        let worse = ClockQuality {
            clock_class: 248,
            ..Default::default()
        };

        assert_eq!(better.cmp_numeric(&worse), Ordering::Less);

        // Same class, accuracy decides
        let better = ClockQuality {
            clock_accuracy: ClockAccuracy::NS25,
            ..Default::default()
        };
        let worse = ClockQuality {
            clock_accuracy: ClockAccuracy::MS1,
            ..Default::default()
        };

        assert_eq!(better.cmp_numeric(&worse), Ordering::Less);

        // Same class and accuracy, variance decides
        let better = ClockQuality {
            offset_scaled_log_variance: 0x4000,
            ..Default::default()
        };
        let worse = ClockQuality {
            offset_scaled_log_variance: 0x436A,
            ..Default::default()
        };

        assert_eq!(better.cmp_numeric(&worse), Ordering::Less);
    }
}
