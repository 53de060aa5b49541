//! The abstract frame transport the core sends through

use crate::port::TimestampContext;

/// The EtherType all gPTP frames are carried under
pub const GPTP_ETHERTYPE: u16 = 0x88F7;

/// The destination mac address of all gPTP event and general messages
pub const GPTP_MULTICAST_MAC: [u8; 6] = [0x01, 0x80, 0xC2, 0x00, 0x00, 0x0E];

/// Whether an ethernet frame with this destination and EtherType can carry
/// gPTP. Transports that parse layer 2 themselves can use this before
/// handing payloads to the instance.
pub fn is_gptp_frame(destination_mac: [u8; 6], ethertype: u16) -> bool {
    destination_mac == GPTP_MULTICAST_MAC && ethertype == GPTP_ETHERTYPE
}

/// How the instance hands frames to the network
///
/// Implementations send raw gPTP message bytes out of the given port,
/// wrapped in an ethernet frame with [`GPTP_MULTICAST_MAC`] and
/// [`GPTP_ETHERTYPE`]. For [`send_event`](`Transport::send_event`) the
/// transport must capture a transmit timestamp and later return it together
/// with the [`TimestampContext`] through
/// [`GptpInstance::handle_send_timestamp`](`crate::GptpInstance::handle_send_timestamp`).
///
/// Transmit and receive timestamps must come from the same clock the
/// [`Clock`](`crate::Clock`) implementation reads.
pub trait Transport {
    /// Type of the error sends may return
    type Error: core::fmt::Debug;

    /// Send a time critical message; a transmit timestamp is expected later
    fn send_event(
        &mut self,
        port: u16,
        data: &[u8],
        context: TimestampContext,
    ) -> Result<(), Self::Error>;

    /// Send a general message; no timestamp is captured
    fn send_general(&mut self, port: u16, data: &[u8]) -> Result<(), Self::Error>;
}
