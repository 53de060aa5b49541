//! General datastructures as defined by the gPTP spec

use core::fmt::Debug;

pub mod common;
pub mod datasets;
pub mod messages;

/// Errors that can occur when parsing a message from the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(thiserror::Error))]
pub enum ParseError {
    /// Fewer bytes were supplied than the fixed size of the message type
    #[cfg_attr(feature = "std", error("buffer too short for message type"))]
    Truncated,
    /// The versionPTP field was not 2
    #[cfg_attr(feature = "std", error("unsupported ptp version"))]
    UnsupportedVersion,
    /// The transportSpecific nibble was not 1 (802.1AS)
    #[cfg_attr(feature = "std", error("transport specific field is not 802.1AS"))]
    BadTransportSpecific,
    /// The messageLength field disagrees with the supplied buffer
    #[cfg_attr(feature = "std", error("message length field inconsistent with buffer"))]
    InconsistentLength,
    /// A timestamp carried a nanoseconds field of 10^9 or larger
    #[cfg_attr(feature = "std", error("timestamp nanoseconds out of range"))]
    InvalidNanoseconds,
    /// The messageType is not one this implementation processes
    #[cfg_attr(feature = "std", error("unsupported message type"))]
    UnsupportedMessageType,
}

impl<Enum: num_enum::TryFromPrimitive> From<num_enum::TryFromPrimitiveError<Enum>> for ParseError {
    fn from(_: num_enum::TryFromPrimitiveError<Enum>) -> Self {
        Self::UnsupportedMessageType
    }
}

pub(crate) trait WireFormat: Debug + Clone + Eq {
    /// The byte size on the wire of this object
    fn wire_size(&self) -> usize;

    /// Serializes the object into the gPTP wire format.
    fn serialize(&self, buffer: &mut [u8]) -> Result<(), ParseError>;

    /// Deserializes the object from the gPTP wire format.
    fn deserialize(buffer: &[u8]) -> Result<Self, ParseError>;
}
