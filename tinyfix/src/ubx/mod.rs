//! The binary configuration/acknowledgement protocol.
//!
//! Runs on the same byte source as the sentence decoder but is driven
//! explicitly by the caller: configuration is a deliberate action, never
//! autodetected from the stream. Frames are length prefixed between two sync
//! bytes and carry a two-byte Fletcher checksum over class, id, length and
//! payload.

mod ack;
#[cfg(feature = "std")]
mod device;
mod frame;

pub use ack::{send_with_ack, AckParser, Acknowledgement};
#[cfg(feature = "std")]
pub use device::{Device, IoTransport};
pub use frame::{
    BaudRate, CfgMsgBuilder, CfgNav5Builder, CfgPrtUartBuilder, CfgRateBuilder, DynamicModel,
    OutputRate, ReceiverSettings, SentenceId, SentenceOutputs,
};

pub const SYNC_CHAR_1: u8 = 0xb5;
pub const SYNC_CHAR_2: u8 = 0x62;

/// Largest payload the receive cursor will buffer. Frames longer than this
/// are skipped by resynchronizing on the next sync pair.
pub(crate) const MAX_PAYLOAD_LEN: usize = 60;

pub(crate) const CLASS_ACK: u8 = 0x05;
pub(crate) const ID_ACK_NAK: u8 = 0x00;
pub(crate) const ID_ACK_ACK: u8 = 0x01;

/// One byte written to / polled from the receiver.
///
/// `read_byte` must not block: it reports `Ok(None)` when nothing is pending
/// so the acknowledgement wait can spend its budget instead of stalling.
pub trait Transport {
    type Error;

    fn write_all(&mut self, bytes: &[u8]) -> Result<(), Self::Error>;

    fn read_byte(&mut self) -> Result<Option<u8>, Self::Error>;
}

/// Fletcher checksum over class, id, length and payload, on the fly.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct UbxChecksumCalc {
    ck_a: u8,
    ck_b: u8,
}

impl UbxChecksumCalc {
    pub(crate) const fn new() -> Self {
        Self { ck_a: 0, ck_b: 0 }
    }

    pub(crate) const fn update_byte(&mut self, byte: u8) {
        self.ck_a = self.ck_a.wrapping_add(byte);
        self.ck_b = self.ck_b.wrapping_add(self.ck_a);
    }

    pub(crate) const fn update(&mut self, bytes: &[u8]) {
        let mut i = 0;
        while i < bytes.len() {
            self.update_byte(bytes[i]);
            i += 1;
        }
    }

    pub(crate) const fn result(self) -> (u8, u8) {
        (self.ck_a, self.ck_b)
    }
}
