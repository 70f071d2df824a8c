//! # tinyfix
//!
//! A small library for GPS receivers that speak NMEA over a serial line:
//! an incremental, checksum-verifying decoder for position/velocity/time
//! sentences, plus UBX configuration commands for u-blox receivers.
//!
//! Decoding sentences
//! ==================
//!
//! Decoding happens one byte at a time, driven by whatever polling loop owns
//! the serial port. The decoder never blocks and never allocates; feed it
//! each received byte together with a millisecond reading from your
//! monotonic clock, and it reports when a verified sentence has produced new
//! fix data:
//! ```
//! use tinyfix::NmeaDecoder;
//!
//! let mut decoder = NmeaDecoder::new();
//! let sentence = "$GPGGA,123519,4807.038,N,01131.000,E,1,08,0.9,545.4,M,46.9,M,,*47\r\n";
//! for byte in sentence.bytes() {
//!     let now_ms = 17; // your clock here
//!     if decoder.process_byte(byte, now_ms) {
//!         let fix = decoder.fix();
//!         assert_eq!(fix.lat_raw(), 4_811_730);
//!         assert_eq!(fix.satellites(), 8);
//!         assert_eq!(fix.position_age(now_ms), 0);
//!     }
//! }
//! ```
//! Fields that have not been observed yet report documented sentinel values
//! ([`INVALID_ANGLE`], [`INVALID_AGE`], ...), never zero. A sentence whose
//! checksum fails is discarded whole; the previous fix stays authoritative.
//!
//! Configuring the receiver
//! ========================
//!
//! Configuration frames are built with the `Builder` variant of each
//! command, for example:
//! ```
//! use tinyfix::{CfgRateBuilder, OutputRate};
//!
//! let frame: [u8; 14] = CfgRateBuilder {
//!     measure_rate_ms: OutputRate::Hz2.period_ms(),
//!     ..CfgRateBuilder::default()
//! }
//! .into_packet_bytes();
//! // write `frame` to the receiver, then run send_with_ack / Device to
//! // await the bounded acknowledgement
//! ```
//! With the `std` feature (on by default), [`Device`] wraps a transport and
//! drives the whole exchange, including the acknowledgement wait:
//! ```no_run
//! use std::time::Duration;
//! use tinyfix::{Device, DynamicModel, IoTransport};
//!
//! # fn open_port() -> std::fs::File { unimplemented!() }
//! let port = open_port(); // e.g. a serialport::SerialPort
//! let mut device = Device::new(IoTransport::new(port))
//!     .with_ack_timeout(Duration::from_secs(3));
//! device.set_navigation_mode(DynamicModel::Automotive).unwrap();
//! ```
//!
//! no_std support
//! ==============
//!
//! The decoder, the frame builders and the acknowledgement state machine are
//! `no_std` and allocation free; build with `default-features = false` and
//! drive [`send_with_ack`] with your own [`Transport`] implementation. Only
//! the [`Device`] wrapper and its wall-clock budget need `std`.

#![cfg_attr(not(feature = "std"), no_std)]

pub use crate::{error::*, fix::*, geodesy::*, nmea::*, ubx::*};

mod error;
mod fix;
mod geodesy;
mod nmea;
mod ubx;

/// The crate version, as compiled.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod test {
    #[test]
    fn version_matches_manifest() {
        assert_eq!(super::version(), env!("CARGO_PKG_VERSION"));
    }
}
