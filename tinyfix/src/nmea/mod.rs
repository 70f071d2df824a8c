//! Incremental decoder for the text sentence protocol.
//!
//! The decoder is fed one byte at a time and never blocks: every byte either
//! advances the current sentence or is discarded as noise. A sentence only
//! becomes visible through [`NmeaDecoder::fix`] after its checksum trailer
//! verified, and then atomically.

mod checksum;
mod fields;
mod token;

use crate::fix::{Fix, FixFields, INVALID_ALTITUDE, INVALID_ANGLE, INVALID_COURSE, INVALID_DATE,
    INVALID_HDOP, INVALID_SATELLITES, INVALID_SPEED, INVALID_TIME};
use checksum::SentenceParity;
use token::{Token, Tokenizer};

const RMC_HEADER: &[u8] = b"GPRMC";
const GGA_HEADER: &[u8] = b"GPGGA";

/// Observational counters, never reset after construction.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Statistics {
    /// Every byte handed to the decoder, noise included.
    pub bytes_processed: u32,
    /// Sentences that committed new fix data.
    pub good_sentences: u16,
    /// Sentences whose checksum trailer verified, committed or not.
    pub passed_checksums: u16,
    /// Sentences whose checksum trailer was wrong or unparsable.
    pub failed_checksums: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SentenceKind {
    Rmc,
    Gga,
    Other,
}

impl SentenceKind {
    fn identify(header: &[u8]) -> Self {
        // exact, case-sensitive match on the 5-character header
        match header {
            h if h == RMC_HEADER => SentenceKind::Rmc,
            h if h == GGA_HEADER => SentenceKind::Gga,
            _ => SentenceKind::Other,
        }
    }
}

/// Byte-at-a-time decoder for RMC and GGA sentences.
///
/// Holds the last committed [`Fix`] and a staging copy written while a
/// sentence is mid-parse; the staging copy is published in one step when the
/// sentence checksum verifies, and silently dropped otherwise. Not safe for
/// concurrent mutation; feed it from a single polling loop.
#[derive(Debug)]
pub struct NmeaDecoder {
    tokenizer: Tokenizer,
    parity: SentenceParity,
    in_sentence: bool,
    in_checksum: bool,
    term_number: u8,
    kind: SentenceKind,
    data_good: bool,
    pending_latitude: Option<i32>,
    pending_longitude: Option<i32>,
    staged: Fix,
    touched: FixFields,
    fix: Fix,
    stats: Statistics,
}

impl Default for NmeaDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl NmeaDecoder {
    pub fn new() -> Self {
        Self {
            tokenizer: Tokenizer::new(),
            parity: SentenceParity::new(),
            in_sentence: false,
            in_checksum: false,
            term_number: 0,
            kind: SentenceKind::Other,
            data_good: false,
            pending_latitude: None,
            pending_longitude: None,
            staged: Fix::new(),
            touched: FixFields::empty(),
            fix: Fix::new(),
            stats: Statistics::default(),
        }
    }

    /// Feeds one byte from the receiver.
    ///
    /// `now_ms` is the caller's wrapping monotonic millisecond clock; it is
    /// recorded as the fix timestamp if this byte completes a sentence.
    /// Returns `true` exactly when a sentence just committed, i.e. new fix
    /// data is available.
    pub fn process_byte(&mut self, byte: u8, now_ms: u32) -> bool {
        self.stats.bytes_processed = self.stats.bytes_processed.wrapping_add(1);
        match self.tokenizer.consume(byte) {
            Token::Start => {
                self.begin_sentence();
                false
            },
            Token::Pending => {
                if self.in_sentence && !self.in_checksum {
                    self.parity.update(byte);
                }
                false
            },
            Token::Field { checksum_follows } => {
                if !self.in_sentence {
                    return false;
                }
                // the comma is part of the checksummed body, the star is not
                if !checksum_follows && !self.in_checksum {
                    self.parity.update(byte);
                }
                let committed = self.term_complete(now_ms);
                self.term_number = self.term_number.saturating_add(1);
                self.in_checksum |= checksum_follows;
                self.tokenizer.clear();
                committed
            },
            Token::End => {
                if !self.in_sentence {
                    return false;
                }
                self.in_sentence = false;
                self.term_complete(now_ms)
            },
        }
    }

    /// The last committed fix.
    pub fn fix(&self) -> &Fix {
        &self.fix
    }

    pub fn statistics(&self) -> Statistics {
        self.stats
    }

    fn begin_sentence(&mut self) {
        self.parity.reset();
        self.in_sentence = true;
        self.in_checksum = false;
        self.term_number = 0;
        self.kind = SentenceKind::Other;
        self.data_good = false;
        self.pending_latitude = None;
        self.pending_longitude = None;
        self.staged = Fix::new();
        self.touched = FixFields::empty();
    }

    fn term_complete(&mut self, now_ms: u32) -> bool {
        if self.in_checksum {
            // the trailer has been judged either way, the sentence is over
            self.in_sentence = false;
            return match checksum::trailer_value(self.tokenizer.term()) {
                Some(expected) if expected == self.parity.value() => self.commit(),
                _ => {
                    self.stats.failed_checksums = self.stats.failed_checksums.wrapping_add(1);
                    false
                },
            };
        }
        if self.term_number == 0 {
            self.kind = SentenceKind::identify(self.tokenizer.term());
            return false;
        }
        if self.kind != SentenceKind::Other {
            self.dispatch(now_ms);
        }
        false
    }

    /// Routes the completed field to its staging destination by
    /// (sentence type, field index).
    fn dispatch(&mut self, now_ms: u32) {
        use SentenceKind::{Gga, Rmc};

        let term = self.tokenizer.term();
        match (self.kind, self.term_number) {
            (Rmc, 1) | (Gga, 1) => {
                match fields::parse_decimal(term) {
                    Some(time) if time >= 0 => {
                        self.staged.time = time as u32;
                        self.staged.time_stamp = Some(now_ms);
                    },
                    _ => self.staged.time = INVALID_TIME,
                }
                self.touched |= FixFields::TIME;
            },
            (Rmc, 2) => self.data_good = term.first() == Some(&b'A'),
            (Rmc, 3) | (Gga, 2) => self.pending_latitude = fields::parse_degrees(term),
            (Rmc, 4) | (Gga, 3) => {
                match self.pending_latitude.take() {
                    Some(value) => {
                        self.staged.latitude =
                            if term.first() == Some(&b'S') { -value } else { value };
                        self.staged.position_stamp = Some(now_ms);
                    },
                    None => self.staged.latitude = INVALID_ANGLE,
                }
                self.touched |= FixFields::LATITUDE;
            },
            (Rmc, 5) | (Gga, 4) => self.pending_longitude = fields::parse_degrees(term),
            (Rmc, 6) | (Gga, 5) => {
                match self.pending_longitude.take() {
                    Some(value) => {
                        self.staged.longitude =
                            if term.first() == Some(&b'W') { -value } else { value };
                    },
                    None => self.staged.longitude = INVALID_ANGLE,
                }
                self.touched |= FixFields::LONGITUDE;
            },
            (Rmc, 7) => {
                self.staged.speed = match fields::parse_decimal(term) {
                    Some(speed) if speed >= 0 => speed as u32,
                    _ => INVALID_SPEED,
                };
                self.touched |= FixFields::SPEED;
            },
            (Rmc, 8) => {
                self.staged.course = match fields::parse_decimal(term) {
                    Some(course) if course >= 0 => course as u32,
                    _ => INVALID_COURSE,
                };
                self.touched |= FixFields::COURSE;
            },
            (Rmc, 9) => {
                self.staged.date = fields::parse_u32(term).unwrap_or(INVALID_DATE);
                self.touched |= FixFields::DATE;
            },
            (Gga, 6) => self.data_good = term.first().is_some_and(|q| *q > b'0'),
            (Gga, 7) => {
                self.staged.satellites =
                    fields::parse_u8(term).unwrap_or(INVALID_SATELLITES);
                self.touched |= FixFields::SATELLITES;
            },
            (Gga, 8) => {
                self.staged.hdop = match fields::parse_decimal(term) {
                    Some(hdop) if hdop >= 0 => hdop as u32,
                    _ => INVALID_HDOP,
                };
                self.touched |= FixFields::HDOP;
            },
            (Gga, 9) => {
                self.staged.altitude =
                    fields::parse_decimal(term).unwrap_or(INVALID_ALTITUDE);
                self.touched |= FixFields::ALTITUDE;
            },
            _ => {},
        }
    }

    fn commit(&mut self) -> bool {
        self.stats.passed_checksums = self.stats.passed_checksums.wrapping_add(1);
        if self.kind == SentenceKind::Other || !self.data_good {
            // checksum-verified but nothing to publish
            return false;
        }
        self.stats.good_sentences = self.stats.good_sentences.wrapping_add(1);
        self.fix.commit_from(&self.staged, self.touched);
        true
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::fix::{INVALID_AGE, INVALID_ANGLE};
    use proptest::prelude::*;

    const GGA: &str = "$GPGGA,123519,4807.038,N,01131.000,E,1,08,0.9,545.4,M,46.9,M,,*47\r\n";
    const RMC: &str =
        "$GPRMC,123519,A,4807.038,N,01131.000,E,022.4,084.4,230394,003.1,W*6A\r\n";

    fn feed(decoder: &mut NmeaDecoder, sentence: &str, now_ms: u32) -> bool {
        let mut committed = false;
        for byte in sentence.bytes() {
            committed |= decoder.process_byte(byte, now_ms);
        }
        committed
    }

    #[test]
    fn gga_commits_position_and_altitude() {
        let mut decoder = NmeaDecoder::new();
        assert!(feed(&mut decoder, GGA, 5000));

        let fix = decoder.fix();
        assert_eq!(fix.lat_raw(), 4_811_730);
        assert_eq!(fix.lon_raw(), 1_151_667);
        assert!(fix.lat_raw() > 0);
        assert!(fix.lon_raw() > 0);
        assert_eq!(fix.time(), 12_35_19_00);
        assert_eq!(fix.altitude(), 54_540);
        assert_eq!(fix.satellites(), 8);
        assert_eq!(fix.hdop(), 90);
        assert_eq!(fix.position_age(5250), 250);

        let stats = decoder.statistics();
        assert_eq!(stats.good_sentences, 1);
        assert_eq!(stats.passed_checksums, 1);
        assert_eq!(stats.failed_checksums, 0);
        assert_eq!(stats.bytes_processed, GGA.len() as u32);
    }

    #[test]
    fn rmc_commits_speed_course_and_date() {
        let mut decoder = NmeaDecoder::new();
        assert!(feed(&mut decoder, RMC, 100));

        let fix = decoder.fix();
        assert_eq!(fix.lat_raw(), 4_811_730);
        assert_eq!(fix.lon_raw(), 1_151_667);
        assert_eq!(fix.speed(), 2_240);
        assert_eq!(fix.course(), 8_440);
        assert_eq!(fix.date(), 230_394);
        assert_eq!(fix.time(), 12_35_19_00);
    }

    #[test]
    fn southern_and_western_hemispheres_negate() {
        let mut decoder = NmeaDecoder::new();
        let body = "GPGGA,123519,4807.038,S,01131.000,W,1,08,0.9,545.4,M,46.9,M,,";
        let parity = body.bytes().fold(0u8, |p, b| p ^ b);
        let sentence = format!("${body}*{parity:02X}\r\n");
        assert!(feed(&mut decoder, &sentence, 0));
        assert_eq!(decoder.fix().lat_raw(), -4_811_730);
        assert_eq!(decoder.fix().lon_raw(), -1_151_667);
    }

    #[test]
    fn flipped_character_is_rejected() {
        let corrupted = GGA.replace("4807.038", "4907.038");
        let mut decoder = NmeaDecoder::new();
        assert!(!feed(&mut decoder, &corrupted, 0));
        assert_eq!(decoder.fix().lat_raw(), INVALID_ANGLE);
        assert_eq!(decoder.statistics().failed_checksums, 1);
        assert_eq!(decoder.statistics().good_sentences, 0);
    }

    #[test]
    fn refeeding_is_idempotent() {
        let mut one_shot = NmeaDecoder::new();
        feed(&mut one_shot, GGA, 0);

        let mut refed = NmeaDecoder::new();
        assert!(feed(&mut refed, GGA, 0));
        assert!(feed(&mut refed, GGA, 0));
        assert_eq!(refed.fix(), one_shot.fix());
    }

    #[test]
    fn invalid_fix_flag_blocks_commit_but_counts_checksum() {
        let mut decoder = NmeaDecoder::new();
        assert!(feed(&mut decoder, GGA, 1000));
        let before = *decoder.fix();

        // same sentence with the quality field cleared to 0
        let body = "GPGGA,134000,5555.000,N,02222.000,E,0,08,0.9,545.4,M,46.9,M,,";
        let parity = body.bytes().fold(0u8, |p, b| p ^ b);
        let cleared = format!("${body}*{parity:02X}\r\n");
        assert!(!feed(&mut decoder, &cleared, 2000));

        assert_eq!(decoder.fix(), &before);
        assert_eq!(decoder.statistics().passed_checksums, 2);
        assert_eq!(decoder.statistics().good_sentences, 1);
        assert_eq!(decoder.statistics().failed_checksums, 0);
    }

    #[test]
    fn rmc_void_status_blocks_commit() {
        let mut decoder = NmeaDecoder::new();
        let voided = RMC.replace(",A,", ",V,");
        // recompute the trailer for the altered body
        let body: String = voided
            .trim_start_matches('$')
            .chars()
            .take_while(|c| *c != '*')
            .collect();
        let parity = body.bytes().fold(0u8, |p, b| p ^ b);
        let sentence = format!("${body}*{parity:02X}\r\n");
        assert!(!feed(&mut decoder, &sentence, 0));
        assert_eq!(decoder.fix().lat_raw(), INVALID_ANGLE);
    }

    #[test]
    fn empty_fields_publish_sentinels_not_zero() {
        let mut decoder = NmeaDecoder::new();
        assert!(feed(&mut decoder, GGA, 0));
        assert_eq!(decoder.fix().altitude(), 54_540);

        // altitude and satellite fields present but empty
        let body = "GPGGA,123520,4807.038,N,01131.000,E,1,,0.9,,M,46.9,M,,";
        let parity = body.bytes().fold(0u8, |p, b| p ^ b);
        let sentence = format!("${body}*{parity:02X}\r\n");
        assert!(feed(&mut decoder, &sentence, 0));
        assert_eq!(decoder.fix().altitude(), INVALID_ALTITUDE);
        assert_eq!(decoder.fix().satellites(), INVALID_SATELLITES);
        assert_eq!(decoder.fix().hdop(), 90);
    }

    #[test]
    fn unknown_sentences_are_checksum_accounted_only() {
        let mut decoder = NmeaDecoder::new();
        let body = "GPVTG,054.7,T,034.4,M,005.5,N,010.2,K";
        let parity = body.bytes().fold(0u8, |p, b| p ^ b);
        let sentence = format!("${body}*{parity:02X}\r\n");
        assert!(!feed(&mut decoder, &sentence, 0));
        assert_eq!(decoder.statistics().passed_checksums, 1);
        assert_eq!(decoder.statistics().good_sentences, 0);
        assert_eq!(decoder.fix().position_age(0), INVALID_AGE);

        // and the next real sentence still decodes cleanly
        assert!(feed(&mut decoder, GGA, 0));
    }

    #[test]
    fn lowercase_header_is_not_recognized() {
        let mut decoder = NmeaDecoder::new();
        let body = "gpgga,123519,4807.038,N,01131.000,E,1,08,0.9,545.4,M,46.9,M,,";
        let parity = body.bytes().fold(0u8, |p, b| p ^ b);
        let sentence = format!("${body}*{parity:02X}\r\n");
        assert!(!feed(&mut decoder, &sentence, 0));
        assert_eq!(decoder.fix().lat_raw(), INVALID_ANGLE);
    }

    #[test]
    fn noise_outside_sentences_is_ignored() {
        let mut decoder = NmeaDecoder::new();
        for byte in [0xffu8, 0x00, b'*', b',', b'\r', b'\n', b'x'] {
            assert!(!decoder.process_byte(byte, 0));
        }
        assert!(feed(&mut decoder, GGA, 0));
        assert_eq!(decoder.statistics().bytes_processed, 7 + GGA.len() as u32);
    }

    #[test]
    fn sentence_restart_discards_partial_sentence() {
        let mut decoder = NmeaDecoder::new();
        let partial = "$GPGGA,123519,4807.038,N,011";
        for byte in partial.bytes() {
            decoder.process_byte(byte, 0);
        }
        assert!(feed(&mut decoder, GGA, 0));
        assert_eq!(decoder.fix().lat_raw(), 4_811_730);
    }

    #[test]
    fn oversized_field_truncates_without_losing_the_stream() {
        let mut decoder = NmeaDecoder::new();
        let body = "GPGGA,123519,4807.038,N,01131.000,E,1,08,0.9,545.400000000000001,M,46.9,M,,";
        let parity = body.bytes().fold(0u8, |p, b| p ^ b);
        let sentence = format!("${body}*{parity:02X}\r\n");
        feed(&mut decoder, &sentence, 0);
        // the truncated altitude still decodes from its surviving prefix
        assert_eq!(decoder.fix().altitude(), 54_540);
        assert!(feed(&mut decoder, GGA, 0));
    }

    #[test]
    fn missing_hemisphere_discards_pending_angle() {
        let mut decoder = NmeaDecoder::new();
        // latitude present, hemisphere field empty
        let body = "GPGGA,123519,4807.038,,01131.000,E,1,08,0.9,545.4,M,46.9,M,,";
        let parity = body.bytes().fold(0u8, |p, b| p ^ b);
        let sentence = format!("${body}*{parity:02X}\r\n");
        feed(&mut decoder, &sentence, 0);
        // hemisphere defaults north, value survives; but a sentence that ends
        // before the hemisphere field must not publish a half-decoded angle
        let mut truncated = NmeaDecoder::new();
        let body = "GPRMC,123519,A,4807.038";
        let parity = body.bytes().fold(0u8, |p, b| p ^ b);
        let sentence = format!("${body}*{parity:02X}\r\n");
        // time still commits, the pending latitude does not
        assert!(feed(&mut truncated, &sentence, 0));
        assert_eq!(truncated.fix().time(), 12_35_19_00);
        assert_eq!(truncated.fix().lat_raw(), INVALID_ANGLE);
    }

    proptest! {
        #[test]
        fn arbitrary_bytes_never_wedge_the_decoder(noise in proptest::collection::vec(any::<u8>(), 0..512)) {
            let mut decoder = NmeaDecoder::new();
            for byte in &noise {
                decoder.process_byte(*byte, 0);
            }
            // a clean sentence after arbitrary soup still commits
            let mut committed = false;
            for byte in GGA.bytes() {
                committed |= decoder.process_byte(byte, 77);
            }
            prop_assert!(committed);
            prop_assert_eq!(decoder.fix().lat_raw(), 4_811_730);
            prop_assert_eq!(decoder.fix().position_age(77), 0);
        }

        #[test]
        fn angle_round_trip_within_one_unit(
            degrees in 0u32..90,
            minutes_e4 in 0u32..600_000u32,
        ) {
            let whole_minutes = minutes_e4 / 10_000;
            let fraction = minutes_e4 % 10_000;
            let term = format!("{degrees:02}{whole_minutes:02}.{fraction:04}");
            let decoded = super::fields::parse_degrees(term.as_bytes()).unwrap();
            let expected = f64::from(degrees) * 100_000.0 + f64::from(minutes_e4) / 6.0;
            prop_assert!((f64::from(decoded) - expected).abs() <= 1.0);
        }
    }
}
