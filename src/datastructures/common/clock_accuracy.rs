use core::cmp::Ordering;

use num_enum::{FromPrimitive, IntoPrimitive};

/// The accuracy of a clock, encoded as a single byte
///
/// The byte values follow *IEEE 802.1AS-2021 table 8-2*. The best master
/// clock algorithm only ever uses the numeric ordering of the raw byte, so
/// the enumeration is treated as opaque apart from that ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive, IntoPrimitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum ClockAccuracy {
    /// Accurate within 25ns
    NS25 = 0x20,
    /// Accurate within 100ns
    NS100 = 0x21,
    /// Accurate within 250ns
    NS250 = 0x22,
    /// Accurate within 1us
    US1 = 0x23,
    /// Accurate within 2.5us
    US2_5 = 0x24,
    /// Accurate within 10us
    US10 = 0x25,
    /// Accurate within 25us
    US25 = 0x26,
    /// Accurate within 100us
    US100 = 0x27,
    /// Accurate within 250us
    US250 = 0x28,
    /// Accurate within 1ms
    MS1 = 0x29,
    /// Accurate within 2.5ms
    MS2_5 = 0x2A,
    /// Accurate within 10ms
    MS10 = 0x2B,
    /// Accurate within 25ms
    MS25 = 0x2C,
    /// Accurate within 100ms
    MS100 = 0x2D,
    /// Accurate within 250ms
    MS250 = 0x2E,
    /// Accurate within 1s
    S1 = 0x2F,
    /// Accurate within 10s
    S10 = 0x30,
    /// Accurate to more than 10s
    GT10S = 0x31,
    /// Accuracy is unknown
    Unknown = 0xFE,
    /// A reserved or profile-specific byte value, kept verbatim
    #[num_enum(catch_all)]
    Reserved(u8),
}

impl ClockAccuracy {
    /// Numeric comparison of the raw byte values.
    ///
    /// The spec assumes numerical ordering of the encoded byte, which is the
    /// reverse of the semantic ordering for the defined range.
    pub fn cmp_numeric(&self, other: &Self) -> Ordering {
        u8::from(*self).cmp(&u8::from(*other))
    }

    /// The raw byte value as carried in announce messages
    pub fn to_primitive(self) -> u8 {
        self.into()
    }

    /// Decode a byte value, keeping reserved values verbatim
    pub fn from_primitive(value: u8) -> Self {
        Self::from(value)
    }
}

impl Default for ClockAccuracy {
    fn default() -> Self {
        Self::Unknown
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn byte_round_trip() {
        assert_eq!(ClockAccuracy::from_primitive(0x21), ClockAccuracy::NS100);
        assert_eq!(ClockAccuracy::NS100.to_primitive(), 0x21);
        // Reserved values are kept verbatim
        assert_eq!(
            ClockAccuracy::from_primitive(0x80),
            ClockAccuracy::Reserved(0x80)
        );
        assert_eq!(ClockAccuracy::Reserved(0x80).to_primitive(), 0x80);
    }

    #[test]
    fn numeric_ordering() {
        // A tighter bound encodes as a smaller byte
        assert_eq!(
            ClockAccuracy::NS25.cmp_numeric(&ClockAccuracy::US1),
            Ordering::Less
        );
        assert_eq!(
            ClockAccuracy::Unknown.cmp_numeric(&ClockAccuracy::S1),
            Ordering::Greater
        );
    }
}
