//! Outbound configuration frames.
//!
//! Each builder lays out one fixed-size command frame: sync pair, class, id,
//! little-endian payload length, payload, then the two checksum bytes over
//! everything between the sync pair and the checksum itself.

use super::{UbxChecksumCalc, SYNC_CHAR_1, SYNC_CHAR_2};
use bitflags::bitflags;

/// Class of the standard NMEA output messages addressed by CFG-MSG.
const NMEA_MSG_CLASS: u8 = 0xf0;

/// Dynamic platform model applied through CFG-NAV5.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DynamicModel {
    Pedestrian = 3,
    Automotive = 4,
    Sea = 5,
    AirborneWithLess1gAcceleration = 6,
}

impl DynamicModel {
    const fn into_raw(self) -> u8 {
        self as u8
    }
}

/// Navigation solution output rate applied through CFG-RATE.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum OutputRate {
    Hz1,
    Hz2,
    Hz3_33,
    Hz4,
    Hz5,
}

impl OutputRate {
    /// Measurement period in milliseconds.
    pub const fn period_ms(self) -> u16 {
        match self {
            OutputRate::Hz1 => 1000,
            OutputRate::Hz2 => 500,
            OutputRate::Hz3_33 => 300,
            OutputRate::Hz4 => 250,
            OutputRate::Hz5 => 200,
        }
    }
}

/// UART baud rate applied through CFG-PRT.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BaudRate {
    B4800,
    B9600,
    B19200,
    B38400,
    B57600,
    B115200,
    B230400,
}

impl BaudRate {
    pub const fn bps(self) -> u32 {
        match self {
            BaudRate::B4800 => 4800,
            BaudRate::B9600 => 9600,
            BaudRate::B19200 => 19_200,
            BaudRate::B38400 => 38_400,
            BaudRate::B57600 => 57_600,
            BaudRate::B115200 => 115_200,
            BaudRate::B230400 => 230_400,
        }
    }
}

/// Standard NMEA sentence classes addressable through CFG-MSG.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SentenceId {
    Gga = 0x00,
    Gll = 0x01,
    Gsa = 0x02,
    Gsv = 0x03,
    Rmc = 0x04,
    Vtg = 0x05,
}

bitflags! {
    /// Sentence types the receiver is asked to emit.
    ///
    /// GGA is not listed: the decoder depends on it and it is left enabled.
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
    pub struct SentenceOutputs: u8 {
        const GLL = 1;
        const GSA = 2;
        const GSV = 4;
        const RMC = 8;
        const VTG = 0x10;
    }
}

impl SentenceOutputs {
    /// Every toggleable sentence class paired with its CFG-MSG id.
    pub const ALL_IDS: [(Self, SentenceId); 5] = [
        (Self::GLL, SentenceId::Gll),
        (Self::GSA, SentenceId::Gsa),
        (Self::GSV, SentenceId::Gsv),
        (Self::RMC, SentenceId::Rmc),
        (Self::VTG, SentenceId::Vtg),
    ];
}

/// One complete receiver configuration, applied as a command sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReceiverSettings {
    pub nav_mode: DynamicModel,
    pub output_rate: OutputRate,
    pub baud_rate: BaudRate,
    pub outputs: SentenceOutputs,
}

impl Default for ReceiverSettings {
    fn default() -> Self {
        Self {
            nav_mode: DynamicModel::Pedestrian,
            output_rate: OutputRate::Hz1,
            baud_rate: BaudRate::B9600,
            outputs: SentenceOutputs::RMC,
        }
    }
}

/// Computes and appends the checksum once header and payload are in place.
fn finalize(frame: &mut [u8]) {
    let end = frame.len() - 2;
    let mut calc = UbxChecksumCalc::new();
    calc.update(&frame[2..end]);
    let (ck_a, ck_b) = calc.result();
    frame[end] = ck_a;
    frame[end + 1] = ck_b;
}

fn header(frame: &mut [u8], class: u8, id: u8, payload_len: u16) {
    frame[0] = SYNC_CHAR_1;
    frame[1] = SYNC_CHAR_2;
    frame[2] = class;
    frame[3] = id;
    frame[4..6].copy_from_slice(&payload_len.to_le_bytes());
}

/// Navigation Engine Settings
#[derive(Debug, Clone, Copy)]
pub struct CfgNav5Builder {
    pub dyn_model: DynamicModel,
    /// Only the masked parameters will be applied
    pub mask: u16,
    pub fix_mode: u8,
    /// Fixed altitude for 2D fix mode, centimeters
    pub fixed_alt: i32,
    /// Fixed altitude variance for 2D mode, 0.0001 m^2
    pub fixed_alt_var: u32,
    /// Minimum elevation for a satellite to be used, degrees
    pub min_elev_degrees: i8,
    pub dr_limit: u8,
    /// Position DOP mask, tenths
    pub pdop: u16,
    /// Time DOP mask, tenths
    pub tdop: u16,
    /// Position accuracy mask, meters
    pub pacc: u16,
    /// Time accuracy mask, meters
    pub tacc: u16,
    pub static_hold_thresh: u8,
    pub dgps_time_out: u8,
}

impl CfgNav5Builder {
    pub const CLASS: u8 = 0x06;
    pub const ID: u8 = 0x24;
    const PAYLOAD_LEN: u16 = 36;
    pub const PACKET_LEN: usize = 44;

    pub fn into_packet_bytes(self) -> [u8; Self::PACKET_LEN] {
        let mut frame = [0; Self::PACKET_LEN];
        header(&mut frame, Self::CLASS, Self::ID, Self::PAYLOAD_LEN);
        frame[6..8].copy_from_slice(&self.mask.to_le_bytes());
        frame[8] = self.dyn_model.into_raw();
        frame[9] = self.fix_mode;
        frame[10..14].copy_from_slice(&self.fixed_alt.to_le_bytes());
        frame[14..18].copy_from_slice(&self.fixed_alt_var.to_le_bytes());
        frame[18] = self.min_elev_degrees as u8;
        frame[19] = self.dr_limit;
        frame[20..22].copy_from_slice(&self.pdop.to_le_bytes());
        frame[22..24].copy_from_slice(&self.tdop.to_le_bytes());
        frame[24..26].copy_from_slice(&self.pacc.to_le_bytes());
        frame[26..28].copy_from_slice(&self.tacc.to_le_bytes());
        frame[28] = self.static_hold_thresh;
        frame[29] = self.dgps_time_out;
        // remaining payload bytes are reserved and stay zero
        finalize(&mut frame);
        frame
    }
}

impl Default for CfgNav5Builder {
    fn default() -> Self {
        Self {
            dyn_model: DynamicModel::Pedestrian,
            mask: 0xffff,
            fix_mode: 3,
            fixed_alt: 0,
            fixed_alt_var: 10_000,
            min_elev_degrees: 5,
            dr_limit: 0,
            pdop: 250,
            tdop: 250,
            pacc: 100,
            tacc: 300,
            static_hold_thresh: 0,
            dgps_time_out: 0,
        }
    }
}

/// Navigation/Measurement Rate Settings
#[derive(Debug, Clone, Copy)]
pub struct CfgRateBuilder {
    /// Measurements are taken every `measure_rate_ms` milliseconds
    pub measure_rate_ms: u16,
    /// Navigation rate in measurement cycles, always 1 on older receivers
    pub nav_rate: u16,
    /// Alignment to reference time: 0 UTC, 1 GPS
    pub time_ref: u16,
}

impl CfgRateBuilder {
    pub const CLASS: u8 = 0x06;
    pub const ID: u8 = 0x08;
    const PAYLOAD_LEN: u16 = 6;
    pub const PACKET_LEN: usize = 14;

    pub fn into_packet_bytes(self) -> [u8; Self::PACKET_LEN] {
        let mut frame = [0; Self::PACKET_LEN];
        header(&mut frame, Self::CLASS, Self::ID, Self::PAYLOAD_LEN);
        frame[6..8].copy_from_slice(&self.measure_rate_ms.to_le_bytes());
        frame[8..10].copy_from_slice(&self.nav_rate.to_le_bytes());
        frame[10..12].copy_from_slice(&self.time_ref.to_le_bytes());
        finalize(&mut frame);
        frame
    }
}

impl Default for CfgRateBuilder {
    fn default() -> Self {
        Self {
            measure_rate_ms: OutputRate::Hz1.period_ms(),
            nav_rate: 1,
            time_ref: 1,
        }
    }
}

/// UART Port Configuration
#[derive(Debug, Clone, Copy)]
pub struct CfgPrtUartBuilder {
    pub portid: u8,
    pub tx_ready: u16,
    /// Raw UART mode bits; the default is 8 data bits, no parity, 1 stop bit
    pub mode: u32,
    pub baud_rate: u32,
    pub in_proto_mask: u16,
    pub out_proto_mask: u16,
    pub flags: u16,
}

impl CfgPrtUartBuilder {
    pub const CLASS: u8 = 0x06;
    pub const ID: u8 = 0x00;
    const PAYLOAD_LEN: u16 = 20;
    pub const PACKET_LEN: usize = 28;

    pub fn into_packet_bytes(self) -> [u8; Self::PACKET_LEN] {
        let mut frame = [0; Self::PACKET_LEN];
        header(&mut frame, Self::CLASS, Self::ID, Self::PAYLOAD_LEN);
        frame[6] = self.portid;
        // frame[7] reserved
        frame[8..10].copy_from_slice(&self.tx_ready.to_le_bytes());
        frame[10..14].copy_from_slice(&self.mode.to_le_bytes());
        frame[14..18].copy_from_slice(&self.baud_rate.to_le_bytes());
        frame[18..20].copy_from_slice(&self.in_proto_mask.to_le_bytes());
        frame[20..22].copy_from_slice(&self.out_proto_mask.to_le_bytes());
        frame[22..24].copy_from_slice(&self.flags.to_le_bytes());
        // frame[24..26] reserved
        finalize(&mut frame);
        frame
    }
}

impl Default for CfgPrtUartBuilder {
    fn default() -> Self {
        Self {
            portid: 1,
            tx_ready: 0,
            mode: 0x8d0,
            baud_rate: BaudRate::B9600.bps(),
            in_proto_mask: 0x07,
            out_proto_mask: 0x03,
            flags: 0,
        }
    }
}

/// Per-message output rate
#[derive(Debug, Clone, Copy)]
pub struct CfgMsgBuilder {
    pub msg_class: u8,
    pub msg_id: u8,
    /// Output rate on the current port; 0 disables the message
    pub rate: u8,
}

impl CfgMsgBuilder {
    pub const CLASS: u8 = 0x06;
    pub const ID: u8 = 0x01;
    const PAYLOAD_LEN: u16 = 3;
    pub const PACKET_LEN: usize = 11;

    /// Enables or disables one standard NMEA sentence class.
    pub fn sentence(id: SentenceId, enabled: bool) -> Self {
        Self {
            msg_class: NMEA_MSG_CLASS,
            msg_id: id as u8,
            rate: u8::from(enabled),
        }
    }

    pub fn into_packet_bytes(self) -> [u8; Self::PACKET_LEN] {
        let mut frame = [0; Self::PACKET_LEN];
        header(&mut frame, Self::CLASS, Self::ID, Self::PAYLOAD_LEN);
        frame[6] = self.msg_class;
        frame[7] = self.msg_id;
        frame[8] = self.rate;
        finalize(&mut frame);
        frame
    }
}
