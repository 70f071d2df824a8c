use crate::error::DateTimeError;
use bitflags::bitflags;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

/// Age reported before any sentence has committed.
pub const INVALID_AGE: u32 = u32::MAX;
/// Latitude, longitude and course before any sentence has committed.
pub const INVALID_ANGLE: i32 = 999_999_999;
/// Altitude (centimeters) before a GGA sentence has committed.
pub const INVALID_ALTITUDE: i32 = 999_999_999;
/// Speed (hundredths of a knot) before an RMC sentence has committed.
pub const INVALID_SPEED: u32 = 999_999_999;
/// Course (hundredths of a degree) before an RMC sentence has committed.
pub const INVALID_COURSE: u32 = 999_999_999;
/// Packed ddmmyy date before an RMC sentence has committed.
pub const INVALID_DATE: u32 = 0;
/// Packed hhmmsscc time before a sentence has committed.
pub const INVALID_TIME: u32 = u32::MAX;
pub const INVALID_SATELLITES: u8 = 0xFF;
pub const INVALID_HDOP: u32 = u32::MAX;

/// Floating point counterparts of the integer sentinels.
pub const INVALID_F_ANGLE: f64 = 1000.0;
pub const INVALID_F_ALTITUDE: f64 = 1_000_000.0;
pub const INVALID_F_SPEED: f64 = -1.0;

pub const MPH_PER_KNOT: f64 = 1.150_779_45;
pub const MPS_PER_KNOT: f64 = 0.514_444_44;
pub const KMPH_PER_KNOT: f64 = 1.852;
pub const MILES_PER_METER: f64 = 0.000_621_371_12;
pub const KM_PER_METER: f64 = 0.001;

bitflags! {
    /// Fix fields written while the current sentence is being parsed.
    ///
    /// Only fields flagged here are copied from the staging fix into the
    /// published fix when a sentence commits.
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
    pub(crate) struct FixFields: u16 {
        const LATITUDE = 1;
        const LONGITUDE = 2;
        const TIME = 4;
        const DATE = 8;
        const ALTITUDE = 0x10;
        const SPEED = 0x20;
        const COURSE = 0x40;
        const SATELLITES = 0x80;
        const HDOP = 0x100;
    }
}

/// The most recently committed, checksum-verified navigation snapshot.
///
/// All integer accessors report a reserved sentinel value while the
/// corresponding field has never been observed; no valid decode produces a
/// sentinel. Angles are fixed point in hundred-thousandths of a degree,
/// speed in hundredths of a knot, course and HDOP in hundredths, altitude
/// in centimeters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Fix {
    pub(crate) latitude: i32,
    pub(crate) longitude: i32,
    pub(crate) date: u32,
    pub(crate) time: u32,
    pub(crate) altitude: i32,
    pub(crate) speed: u32,
    pub(crate) course: u32,
    pub(crate) hdop: u32,
    pub(crate) satellites: u8,
    pub(crate) time_stamp: Option<u32>,
    pub(crate) position_stamp: Option<u32>,
}

impl Default for Fix {
    fn default() -> Self {
        Self::new()
    }
}

impl Fix {
    pub const fn new() -> Self {
        Self {
            latitude: INVALID_ANGLE,
            longitude: INVALID_ANGLE,
            date: INVALID_DATE,
            time: INVALID_TIME,
            altitude: INVALID_ALTITUDE,
            speed: INVALID_SPEED,
            course: INVALID_COURSE,
            hdop: INVALID_HDOP,
            satellites: INVALID_SATELLITES,
            time_stamp: None,
            position_stamp: None,
        }
    }

    /// Copies every staged field flagged in `touched` into `self`.
    ///
    /// This is the single commit step: readers of `self` observe either the
    /// pre-sentence state or the post-sentence state, never a mix.
    pub(crate) fn commit_from(&mut self, staged: &Fix, touched: FixFields) {
        if touched.contains(FixFields::LATITUDE) {
            self.latitude = staged.latitude;
        }
        if touched.contains(FixFields::LONGITUDE) {
            self.longitude = staged.longitude;
        }
        if touched.intersects(FixFields::LATITUDE | FixFields::LONGITUDE) {
            self.position_stamp = staged.position_stamp.or(self.position_stamp);
        }
        if touched.contains(FixFields::TIME) {
            self.time = staged.time;
            self.time_stamp = staged.time_stamp.or(self.time_stamp);
        }
        if touched.contains(FixFields::DATE) {
            self.date = staged.date;
        }
        if touched.contains(FixFields::ALTITUDE) {
            self.altitude = staged.altitude;
        }
        if touched.contains(FixFields::SPEED) {
            self.speed = staged.speed;
        }
        if touched.contains(FixFields::COURSE) {
            self.course = staged.course;
        }
        if touched.contains(FixFields::SATELLITES) {
            self.satellites = staged.satellites;
        }
        if touched.contains(FixFields::HDOP) {
            self.hdop = staged.hdop;
        }
    }

    /// Latitude in hundred-thousandths of a degree, south negative.
    pub const fn lat_raw(&self) -> i32 {
        self.latitude
    }

    /// Longitude in hundred-thousandths of a degree, west negative.
    pub const fn lon_raw(&self) -> i32 {
        self.longitude
    }

    /// Latitude and longitude together, as [`Fix::lat_raw`]/[`Fix::lon_raw`].
    pub const fn position(&self) -> (i32, i32) {
        (self.latitude, self.longitude)
    }

    /// Date of the last committed fix as packed decimal ddmmyy.
    pub const fn date(&self) -> u32 {
        self.date
    }

    /// UTC time of the last committed fix as packed decimal hhmmsscc.
    pub const fn time(&self) -> u32 {
        self.time
    }

    /// Altitude above mean sea level in centimeters, signed.
    pub const fn altitude(&self) -> i32 {
        self.altitude
    }

    /// Course over ground in hundredths of a degree.
    pub const fn course(&self) -> u32 {
        self.course
    }

    /// Speed over ground in hundredths of a knot.
    pub const fn speed(&self) -> u32 {
        self.speed
    }

    /// Satellites used in the last fix.
    pub const fn satellites(&self) -> u8 {
        self.satellites
    }

    /// Horizontal dilution of precision in hundredths.
    pub const fn hdop(&self) -> u32 {
        self.hdop
    }

    /// Milliseconds elapsed between the last committed position and the
    /// caller's clock snapshot, [`INVALID_AGE`] if none ever committed.
    ///
    /// `now_ms` must come from the same wrapping monotonic millisecond clock
    /// that was passed to the decoder.
    pub fn position_age(&self, now_ms: u32) -> u32 {
        match self.position_stamp {
            Some(stamp) => now_ms.wrapping_sub(stamp),
            None => INVALID_AGE,
        }
    }

    /// Milliseconds elapsed since the last committed UTC time,
    /// [`INVALID_AGE`] if none ever committed.
    pub fn time_age(&self, now_ms: u32) -> u32 {
        match self.time_stamp {
            Some(stamp) => now_ms.wrapping_sub(stamp),
            None => INVALID_AGE,
        }
    }

    /// Latitude in degrees, [`INVALID_F_ANGLE`] when never observed.
    pub fn lat_degrees(&self) -> f64 {
        if self.latitude == INVALID_ANGLE {
            INVALID_F_ANGLE
        } else {
            f64::from(self.latitude) / 100_000.0
        }
    }

    /// Longitude in degrees, [`INVALID_F_ANGLE`] when never observed.
    pub fn lon_degrees(&self) -> f64 {
        if self.longitude == INVALID_ANGLE {
            INVALID_F_ANGLE
        } else {
            f64::from(self.longitude) / 100_000.0
        }
    }

    /// Altitude in meters, [`INVALID_F_ALTITUDE`] when never observed.
    pub fn altitude_meters(&self) -> f64 {
        if self.altitude == INVALID_ALTITUDE {
            INVALID_F_ALTITUDE
        } else {
            f64::from(self.altitude) / 100.0
        }
    }

    /// Course in degrees, [`INVALID_F_ANGLE`] when never observed.
    pub fn course_degrees(&self) -> f64 {
        if self.course == INVALID_COURSE {
            INVALID_F_ANGLE
        } else {
            f64::from(self.course) / 100.0
        }
    }

    /// Speed in knots, [`INVALID_F_SPEED`] when never observed.
    pub fn speed_knots(&self) -> f64 {
        if self.speed == INVALID_SPEED {
            INVALID_F_SPEED
        } else {
            f64::from(self.speed) / 100.0
        }
    }

    /// Speed in miles per hour, [`INVALID_F_SPEED`] when never observed.
    pub fn speed_mph(&self) -> f64 {
        let knots = self.speed_knots();
        if knots < 0.0 {
            INVALID_F_SPEED
        } else {
            knots * MPH_PER_KNOT
        }
    }

    /// Speed in meters per second, [`INVALID_F_SPEED`] when never observed.
    pub fn speed_mps(&self) -> f64 {
        let knots = self.speed_knots();
        if knots < 0.0 {
            INVALID_F_SPEED
        } else {
            knots * MPS_PER_KNOT
        }
    }

    /// Speed in kilometers per hour, [`INVALID_F_SPEED`] when never observed.
    pub fn speed_kmph(&self) -> f64 {
        let knots = self.speed_knots();
        if knots < 0.0 {
            INVALID_F_SPEED
        } else {
            knots * KMPH_PER_KNOT
        }
    }

    /// Cracks the packed date and time fields into a calendar date and time.
    ///
    /// The two-digit year is interpreted as 20yy. Errors if either field has
    /// never been observed or does not form a valid calendar value.
    pub fn datetime(&self) -> Result<NaiveDateTime, DateTimeError> {
        if self.date == INVALID_DATE {
            return Err(DateTimeError::InvalidDate);
        }
        if self.time == INVALID_TIME {
            return Err(DateTimeError::InvalidTime);
        }
        let day = self.date / 10_000;
        let month = (self.date / 100) % 100;
        let year = 2000 + (self.date % 100) as i32;
        let date =
            NaiveDate::from_ymd_opt(year, month, day).ok_or(DateTimeError::InvalidDate)?;

        let hour = self.time / 1_000_000;
        let minute = (self.time / 10_000) % 100;
        let second = (self.time / 100) % 100;
        let hundredths = self.time % 100;
        let time = NaiveTime::from_hms_milli_opt(hour, minute, second, hundredths * 10)
            .ok_or(DateTimeError::InvalidTime)?;

        Ok(NaiveDateTime::new(date, time))
    }
}
