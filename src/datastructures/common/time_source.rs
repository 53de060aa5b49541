use num_enum::{FromPrimitive, IntoPrimitive};

/// The origin of the time a grandmaster distributes
///
/// See *IEEE 802.1AS-2021 table 8-3*. The value is informational and not used
/// by the best master clock algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive, IntoPrimitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum TimeSource {
    /// An atomic clock
    AtomicClock = 0x10,
    /// A global navigation satellite system
    Gnss = 0x20,
    /// A terrestrial radio signal
    TerrestrialRadio = 0x30,
    /// A serial time code signal
    SerialTimeCode = 0x39,
    /// Another PTP domain
    Ptp = 0x40,
    /// The network time protocol
    Ntp = 0x50,
    /// Manually set
    HandSet = 0x60,
    /// Another source not covered by the other values
    Other = 0x90,
    /// The internal free-running oscillator
    InternalOscillator = 0xA0,
    /// An unrepresented byte value, kept verbatim
    #[num_enum(catch_all)]
    Unknown(u8),
}

impl TimeSource {
    /// The raw byte value as carried in announce messages
    pub fn to_primitive(self) -> u8 {
        self.into()
    }

    /// Decode a byte value, keeping unknown values verbatim
    pub fn from_primitive(value: u8) -> Self {
        Self::from(value)
    }
}

impl Default for TimeSource {
    fn default() -> Self {
        Self::InternalOscillator
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn byte_round_trip() {
        assert_eq!(TimeSource::from_primitive(0x20), TimeSource::Gnss);
        assert_eq!(TimeSource::Gnss.to_primitive(), 0x20);
        assert_eq!(TimeSource::from_primitive(0x42), TimeSource::Unknown(0x42));
        assert_eq!(TimeSource::Unknown(0x42).to_primitive(), 0x42);
    }
}
