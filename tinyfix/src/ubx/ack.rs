use super::{Transport, UbxChecksumCalc, CLASS_ACK, ID_ACK_ACK, ID_ACK_NAK, MAX_PAYLOAD_LEN,
    SYNC_CHAR_1, SYNC_CHAR_2};
use crate::error::AckError;

/// A checksum-verified ACK-class frame received from the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Acknowledgement {
    /// ACK-ACK: the command with this class/id was accepted.
    Ack { class: u8, id: u8 },
    /// ACK-NAK: the command with this class/id was rejected.
    Nak { class: u8, id: u8 },
}

// States are named for the portion of the frame which was last received
#[derive(Debug, Clone, Copy)]
enum State {
    Start,
    Sync1,
    Sync2,
    Class {
        class: u8,
        checksum: UbxChecksumCalc,
    },
    Id {
        class: u8,
        id: u8,
        checksum: UbxChecksumCalc,
    },
    Len1 {
        class: u8,
        id: u8,
        len1: u8,
        checksum: UbxChecksumCalc,
    },
    Payload {
        class: u8,
        id: u8,
        len: u16,
        checksum: UbxChecksumCalc,
    },
    // first checksum byte received, holding it for the pair comparison
    Checksum1 {
        class: u8,
        id: u8,
        expect: (u8, u8),
        found: u8,
    },
}

/// Byte-at-a-time matcher for acknowledgement frames.
///
/// Anything that is not a well-formed frame resets the matcher to sync
/// search without producing an event; transient noise between frames is
/// expected and must not abort an acknowledgement wait. Frames of other
/// classes are consumed and dropped so that navigation output interleaved
/// with the acknowledgement does not desynchronize the stream.
#[derive(Debug)]
pub struct AckParser {
    state: State,
    payload: [u8; MAX_PAYLOAD_LEN],
    received: usize,
}

impl Default for AckParser {
    fn default() -> Self {
        Self::new()
    }
}

impl AckParser {
    pub const fn new() -> Self {
        Self {
            state: State::Start,
            payload: [0; MAX_PAYLOAD_LEN],
            received: 0,
        }
    }

    pub fn reset(&mut self) {
        self.state = State::Start;
        self.received = 0;
    }

    /// Consumes one byte; returns a verified acknowledgement when this byte
    /// completed one.
    pub fn process_byte(&mut self, byte: u8) -> Option<Acknowledgement> {
        self.state = match self.state {
            State::Start => {
                if byte == SYNC_CHAR_1 {
                    State::Sync1
                } else {
                    State::Start
                }
            },
            State::Sync1 => match byte {
                SYNC_CHAR_2 => State::Sync2,
                SYNC_CHAR_1 => State::Sync1,
                _ => State::Start,
            },
            State::Sync2 => {
                let mut checksum = UbxChecksumCalc::new();
                checksum.update_byte(byte);
                State::Class {
                    class: byte,
                    checksum,
                }
            },
            State::Class { class, mut checksum } => {
                checksum.update_byte(byte);
                State::Id {
                    class,
                    id: byte,
                    checksum,
                }
            },
            State::Id { class, id, mut checksum } => {
                checksum.update_byte(byte);
                State::Len1 {
                    class,
                    id,
                    len1: byte,
                    checksum,
                }
            },
            State::Len1 {
                class,
                id,
                len1,
                mut checksum,
            } => {
                checksum.update_byte(byte);
                let len = u16::from_le_bytes([len1, byte]);
                if usize::from(len) > MAX_PAYLOAD_LEN {
                    // too big to buffer, resynchronize on the next frame
                    State::Start
                } else {
                    self.received = 0;
                    State::Payload {
                        class,
                        id,
                        len,
                        checksum,
                    }
                }
            },
            State::Payload {
                class,
                id,
                len,
                mut checksum,
            } => {
                if self.received == usize::from(len) {
                    // payload exhausted, this byte is the first checksum byte
                    State::Checksum1 {
                        class,
                        id,
                        expect: checksum.result(),
                        found: byte,
                    }
                } else {
                    checksum.update_byte(byte);
                    self.payload[self.received] = byte;
                    self.received += 1;
                    State::Payload {
                        class,
                        id,
                        len,
                        checksum,
                    }
                }
            },
            State::Checksum1 {
                class,
                id,
                expect,
                found,
            } => {
                if expect == (found, byte) {
                    if let Some(event) = self.matched(class, id) {
                        self.state = State::Start;
                        return Some(event);
                    }
                }
                State::Start
            },
        };
        None
    }

    fn matched(&self, class: u8, id: u8) -> Option<Acknowledgement> {
        if class != CLASS_ACK || self.received != 2 {
            return None;
        }
        let (acked_class, acked_id) = (self.payload[0], self.payload[1]);
        match id {
            ID_ACK_ACK => Some(Acknowledgement::Ack {
                class: acked_class,
                id: acked_id,
            }),
            ID_ACK_NAK => Some(Acknowledgement::Nak {
                class: acked_class,
                id: acked_id,
            }),
            _ => None,
        }
    }
}

/// Writes `frame` to the transport and polls for the matching ACK-ACK.
///
/// `poll_budget` bounds the wait: every poll of the transport, whether it
/// yielded a byte or not, consumes one unit. Running out is a recoverable
/// [`AckError::TimedOut`]; an ACK-NAK naming the sent class/id is
/// [`AckError::Rejected`]. Unrelated traffic and noise are skipped.
pub fn send_with_ack<T: Transport>(
    transport: &mut T,
    frame: &[u8],
    class: u8,
    id: u8,
    poll_budget: u32,
) -> Result<(), AckError<T::Error>> {
    transport.write_all(frame)?;

    let mut parser = AckParser::new();
    for _ in 0..poll_budget {
        let Some(byte) = transport.read_byte()? else {
            continue;
        };
        match parser.process_byte(byte) {
            Some(Acknowledgement::Ack { class: c, id: i }) if (c, i) == (class, id) => {
                return Ok(());
            },
            Some(Acknowledgement::Nak { class: c, id: i }) if (c, i) == (class, id) => {
                return Err(AckError::Rejected { class, id });
            },
            _ => {},
        }
    }
    Err(AckError::TimedOut)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::ubx::frame::{CfgNav5Builder, DynamicModel};

    fn ack_frame(class: u8, id: u8, ack: bool) -> [u8; 10] {
        let mut frame = [
            SYNC_CHAR_1,
            SYNC_CHAR_2,
            CLASS_ACK,
            if ack { ID_ACK_ACK } else { ID_ACK_NAK },
            0x02,
            0x00,
            class,
            id,
            0,
            0,
        ];
        let mut calc = UbxChecksumCalc::new();
        calc.update(&frame[2..8]);
        let (ck_a, ck_b) = calc.result();
        frame[8] = ck_a;
        frame[9] = ck_b;
        frame
    }

    #[test]
    fn matches_a_clean_ack() {
        let mut parser = AckParser::new();
        let mut events = ack_frame(0x06, 0x24, true)
            .into_iter()
            .filter_map(|b| parser.process_byte(b));
        assert_eq!(
            events.next(),
            Some(Acknowledgement::Ack {
                class: 0x06,
                id: 0x24
            })
        );
    }

    #[test]
    fn nak_is_distinguished() {
        let mut parser = AckParser::new();
        let mut events = ack_frame(0x06, 0x08, false)
            .into_iter()
            .filter_map(|b| parser.process_byte(b));
        assert_eq!(
            events.next(),
            Some(Acknowledgement::Nak {
                class: 0x06,
                id: 0x08
            })
        );
    }

    #[test]
    fn corrupt_checksum_resets_without_event() {
        let mut frame = ack_frame(0x06, 0x24, true);
        frame[9] ^= 0xff;
        let mut parser = AckParser::new();
        assert!(frame.iter().all(|b| parser.process_byte(*b).is_none()));

        // and the parser is back at sync search
        let clean = ack_frame(0x06, 0x24, true);
        assert!(clean
            .into_iter()
            .filter_map(|b| parser.process_byte(b))
            .next()
            .is_some());
    }

    #[test]
    fn leading_noise_and_repeated_sync_are_skipped() {
        let mut parser = AckParser::new();
        for byte in [0x00, 0xff, SYNC_CHAR_1, SYNC_CHAR_1] {
            assert_eq!(parser.process_byte(byte), None);
        }
        // the second 0xb5 keeps the sync1 state alive; continue from sync2
        let frame = ack_frame(0x01, 0x02, true);
        let event = frame[1..]
            .iter()
            .filter_map(|b| parser.process_byte(*b))
            .next();
        assert_eq!(
            event,
            Some(Acknowledgement::Ack {
                class: 0x01,
                id: 0x02
            })
        );
    }

    #[test]
    fn interleaved_foreign_frame_is_skipped() {
        // a NAV-class frame with a correct checksum, then the ack
        let mut nav = [
            SYNC_CHAR_1,
            SYNC_CHAR_2,
            0x01,
            0x02,
            0x04,
            0x00,
            0xde,
            0xad,
            0xbe,
            0xef,
            0,
            0,
        ];
        let mut calc = UbxChecksumCalc::new();
        calc.update(&nav[2..10]);
        let (ck_a, ck_b) = calc.result();
        nav[10] = ck_a;
        nav[11] = ck_b;

        let mut parser = AckParser::new();
        assert!(nav.iter().all(|b| parser.process_byte(*b).is_none()));
        let event = ack_frame(0x06, 0x24, true)
            .into_iter()
            .filter_map(|b| parser.process_byte(b))
            .next();
        assert!(event.is_some());
    }

    struct LoopbackTransport {
        incoming: std::vec::Vec<u8>,
        cursor: usize,
        sent: std::vec::Vec<u8>,
    }

    impl Transport for LoopbackTransport {
        type Error = core::convert::Infallible;

        fn write_all(&mut self, bytes: &[u8]) -> Result<(), Self::Error> {
            self.sent.extend_from_slice(bytes);
            Ok(())
        }

        fn read_byte(&mut self) -> Result<Option<u8>, Self::Error> {
            let byte = self.incoming.get(self.cursor).copied();
            self.cursor += 1;
            Ok(byte)
        }
    }

    #[test]
    fn nav_mode_command_acknowledged() {
        let ack: std::vec::Vec<u8> = ack_frame(CfgNav5Builder::CLASS, CfgNav5Builder::ID, true)
            .into_iter()
            .collect();
        let mut transport = LoopbackTransport {
            incoming: ack,
            cursor: 0,
            sent: std::vec::Vec::new(),
        };

        let frame = CfgNav5Builder {
            dyn_model: DynamicModel::Sea,
            ..CfgNav5Builder::default()
        }
        .into_packet_bytes();
        send_with_ack(
            &mut transport,
            &frame,
            CfgNav5Builder::CLASS,
            CfgNav5Builder::ID,
            64,
        )
        .unwrap();
        assert_eq!(transport.sent, frame);
    }

    #[test]
    fn silence_times_out_within_budget() {
        let mut transport = LoopbackTransport {
            incoming: std::vec::Vec::new(),
            cursor: 0,
            sent: std::vec::Vec::new(),
        };
        let frame = CfgNav5Builder::default().into_packet_bytes();
        let err = send_with_ack(
            &mut transport,
            &frame,
            CfgNav5Builder::CLASS,
            CfgNav5Builder::ID,
            32,
        )
        .unwrap_err();
        assert_eq!(err, AckError::TimedOut);
    }

    #[test]
    fn nak_reports_rejection() {
        let nak: std::vec::Vec<u8> = ack_frame(CfgNav5Builder::CLASS, CfgNav5Builder::ID, false)
            .into_iter()
            .collect();
        let mut transport = LoopbackTransport {
            incoming: nak,
            cursor: 0,
            sent: std::vec::Vec::new(),
        };
        let frame = CfgNav5Builder::default().into_packet_bytes();
        let err = send_with_ack(
            &mut transport,
            &frame,
            CfgNav5Builder::CLASS,
            CfgNav5Builder::ID,
            64,
        )
        .unwrap_err();
        assert_eq!(
            err,
            AckError::Rejected {
                class: CfgNav5Builder::CLASS,
                id: CfgNav5Builder::ID
            }
        );
    }
}
