//! Julian temporal values.
//!
//! Temporal cells are modeled on the astronomical Julian day: an integer
//! day number for dates, a noon-anchored fractional day in `[-0.5, 0.5)`
//! for times, and their sum for full timestamps. Civil calendar fields
//! convert to and from the Julian day number with exact integer formulas
//! valid over the proleptic Gregorian calendar; no leap seconds, no
//! calendar library round-trips.
//!
//! Parsing accepts ISO-like forms:
//!
//! - `YYYY-MM-DD` (the year may be signed and longer than four digits)
//! - `hh:mm` or `hh:mm:ss`
//! - date `T`-or-space time, optionally followed by `Z` or `±hh[:]mm`
//!
//! When a zone offset is present the value is normalized to UTC, but the
//! fields as written (the "local" fields) are retained alongside the
//! normalized ones so the original rendering can be reproduced.

use std::fmt;

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::error::JulianError;

/// Day-of-week for a Julian day number; `julian_day % 7` with Monday = 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DayOfWeek {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl DayOfWeek {
    fn from_julian_day(julian_day: i64) -> Self {
        match julian_day.rem_euclid(7) {
            0 => Self::Monday,
            1 => Self::Tuesday,
            2 => Self::Wednesday,
            3 => Self::Thursday,
            4 => Self::Friday,
            5 => Self::Saturday,
            _ => Self::Sunday,
        }
    }
}

/// A parsed temporal value.
///
/// Carries which components were present in the source text, the
/// normalized (UTC) fields, the local fields as written, and the derived
/// Julian quantities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Julian {
    has_date: bool,
    has_time: bool,
    has_zone: bool,

    year: i64,
    month: u8,
    day: u8,
    hour: u8,
    minute: u8,
    second: u8,

    local_year: i64,
    local_month: u8,
    local_day: u8,
    local_hour: u8,
    local_minute: u8,
    local_second: u8,

    zone_hour: i8,
    zone_minute: u8,

    julian_day: i64,
    julian_time: f64,
}

impl Julian {
    /// Parses a temporal value. Returns [`JulianError::NotTemporal`] when
    /// the text does not start with a date or time shape at all, and a
    /// more specific error when it does but a component is out of range.
    pub fn parse(text: &str) -> Result<Self, JulianError> {
        let trimmed = text.trim();
        let mut cursor = Cursor::new(trimmed);

        if let Some((year, month, day)) = cursor.scan_date() {
            if !(1..=12).contains(&month) || !(1..=31).contains(&day) {
                return Err(JulianError::InvalidDate(text.to_string()));
            }
            if cursor.at_end() {
                return Ok(Self::from_date(year, month as u8, day as u8));
            }
            if !cursor.eat_any(&['T', ' ']) {
                return Err(JulianError::InvalidDate(text.to_string()));
            }
            let (hour, minute, second) = cursor
                .scan_time()
                .ok_or_else(|| JulianError::InvalidTime(text.to_string()))?;
            if hour >= 24 || minute >= 60 || second >= 60 {
                return Err(JulianError::InvalidTime(text.to_string()));
            }
            let zone = cursor
                .scan_zone()
                .map_err(|()| JulianError::InvalidZone(text.to_string()))?;
            if !cursor.at_end() {
                return Err(JulianError::InvalidZone(text.to_string()));
            }
            return Ok(Self::from_date_time(
                year,
                month as u8,
                day as u8,
                hour as u8,
                minute as u8,
                second as u8,
                zone,
            ));
        }

        if let Some((hour, minute, second)) = cursor.scan_time() {
            if hour >= 24 || minute >= 60 || second >= 60 || !cursor.at_end() {
                return Err(JulianError::InvalidTime(text.to_string()));
            }
            return Ok(Self::from_time(hour as u8, minute as u8, second as u8));
        }

        Err(JulianError::NotTemporal(text.to_string()))
    }

    /// A date-only value.
    pub fn from_date(year: i64, month: u8, day: u8) -> Self {
        let julian_day = julian_day_number(year, i64::from(month), i64::from(day));
        Self {
            has_date: true,
            has_time: false,
            has_zone: false,
            year,
            month,
            day,
            hour: 12,
            minute: 0,
            second: 0,
            local_year: year,
            local_month: month,
            local_day: day,
            local_hour: 12,
            local_minute: 0,
            local_second: 0,
            zone_hour: 0,
            zone_minute: 0,
            julian_day,
            julian_time: 0.0,
        }
    }

    /// A time-only value.
    pub fn from_time(hour: u8, minute: u8, second: u8) -> Self {
        Self {
            has_date: false,
            has_time: true,
            has_zone: false,
            year: -4713,
            month: 1,
            day: 1,
            hour,
            minute,
            second,
            local_year: -4713,
            local_month: 1,
            local_day: 1,
            local_hour: hour,
            local_minute: minute,
            local_second: second,
            zone_hour: 0,
            zone_minute: 0,
            julian_day: 0,
            julian_time: time_fraction(i64::from(hour), i64::from(minute), i64::from(second)),
        }
    }

    /// A full timestamp, optionally zoned. A zone offset normalizes the
    /// value to UTC while the fields as written are kept as the local
    /// fields.
    pub fn from_date_time(
        year: i64,
        month: u8,
        day: u8,
        hour: u8,
        minute: u8,
        second: u8,
        zone: Option<(i8, u8)>,
    ) -> Self {
        let mut julian_day = julian_day_number(year, i64::from(month), i64::from(day));
        let mut norm_hour = i64::from(hour);
        let mut norm_minute = i64::from(minute);

        if let Some((zone_hour, zone_minute)) = zone {
            let offset_minutes = if zone_hour < 0 {
                -i64::from(zone_minute)
            } else {
                i64::from(zone_minute)
            };
            norm_minute -= offset_minutes;
            if norm_minute < 0 {
                norm_minute += 60;
                norm_hour -= 1;
            } else if norm_minute >= 60 {
                norm_minute -= 60;
                norm_hour += 1;
            }
            norm_hour -= i64::from(zone_hour);
            if norm_hour < 0 {
                norm_hour += 24;
                julian_day -= 1;
            } else if norm_hour >= 24 {
                norm_hour -= 24;
                julian_day += 1;
            }
        }

        let (norm_year, norm_month, norm_day) = civil_from_julian_day(julian_day);
        let (zone_hour, zone_minute) = zone.unwrap_or((0, 0));
        Self {
            has_date: true,
            has_time: true,
            has_zone: zone.is_some(),
            year: norm_year,
            month: norm_month as u8,
            day: norm_day as u8,
            hour: norm_hour as u8,
            minute: norm_minute as u8,
            second,
            local_year: year,
            local_month: month,
            local_day: day,
            local_hour: hour,
            local_minute: minute,
            local_second: second,
            zone_hour,
            zone_minute,
            julian_day,
            julian_time: time_fraction(norm_hour, norm_minute, i64::from(second)),
        }
    }

    /// Reconstructs a date-only value from a Julian day number.
    pub fn from_julian_day(julian_day: i64) -> Self {
        let (year, month, day) = civil_from_julian_day(julian_day);
        Self::from_date(year, month as u8, day as u8)
    }

    /// Reconstructs a time-only value from a noon-anchored day fraction.
    /// Rounds to the nearest whole second, carrying into the minute and
    /// hour, and saturates at the ends of the day.
    pub fn from_julian_time(julian_time: f64) -> Self {
        let total_seconds = (((0.5 + julian_time) * 86400.0).round() as i64).clamp(0, 86_399);
        Self::from_time(
            (total_seconds / 3600) as u8,
            (total_seconds / 60 % 60) as u8,
            (total_seconds % 60) as u8,
        )
    }

    /// Reconstructs a full timestamp from a fractional Julian date.
    pub fn from_julian_date(julian_date: f64) -> Self {
        let julian_day = (julian_date + 0.5).floor() as i64;
        let julian_time = julian_date - julian_day as f64;
        let (year, month, day) = civil_from_julian_day(julian_day);
        let time = Self::from_julian_time(julian_time);
        Self::from_date_time(
            year,
            month as u8,
            day as u8,
            time.local_hour,
            time.local_minute,
            time.local_second,
            None,
        )
    }

    pub fn has_date(&self) -> bool {
        self.has_date
    }

    pub fn has_time(&self) -> bool {
        self.has_time
    }

    pub fn has_zone(&self) -> bool {
        self.has_zone
    }

    /// The Julian day number (normalized when zoned).
    pub fn julian_day(&self) -> i64 {
        self.julian_day
    }

    /// The noon-anchored day fraction in `[-0.5, 0.5)`.
    pub fn julian_time(&self) -> f64 {
        self.julian_time
    }

    /// Day number plus fraction.
    pub fn julian_date(&self) -> f64 {
        self.julian_day as f64 + self.julian_time
    }

    pub fn day_of_week(&self) -> DayOfWeek {
        DayOfWeek::from_julian_day(self.julian_day)
    }

    /// Normalized calendar fields `(year, month, day)`.
    pub fn date_fields(&self) -> (i64, u8, u8) {
        (self.year, self.month, self.day)
    }

    /// Normalized clock fields `(hour, minute, second)`.
    pub fn time_fields(&self) -> (u8, u8, u8) {
        (self.hour, self.minute, self.second)
    }

    /// Calendar fields as written, before any zone shift.
    pub fn local_date_fields(&self) -> (i64, u8, u8) {
        (self.local_year, self.local_month, self.local_day)
    }

    /// Clock fields as written, before any zone shift.
    pub fn local_time_fields(&self) -> (u8, u8, u8) {
        (self.local_hour, self.local_minute, self.local_second)
    }

    /// Zone offset `(hours, minutes)`; hours carry the sign.
    pub fn zone_fields(&self) -> (i8, u8) {
        (self.zone_hour, self.zone_minute)
    }

    pub fn to_naive_date(&self) -> Option<NaiveDate> {
        if !self.has_date {
            return None;
        }
        let year = i32::try_from(self.year).ok()?;
        NaiveDate::from_ymd_opt(year, u32::from(self.month), u32::from(self.day))
    }

    pub fn to_naive_time(&self) -> Option<NaiveTime> {
        if !self.has_time {
            return None;
        }
        NaiveTime::from_hms_opt(
            u32::from(self.hour),
            u32::from(self.minute),
            u32::from(self.second),
        )
    }
}

impl fmt::Display for Julian {
    /// Renders the local fields in the canonical textual form, so a value
    /// parsed from `YYYY-MM-DD` style text formats back to the same text.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.has_date {
            write!(
                f,
                "{}-{:02}-{:02}",
                self.local_year, self.local_month, self.local_day
            )?;
            if self.has_time {
                f.write_str("T")?;
            }
        }
        if self.has_time {
            write!(
                f,
                "{:02}:{:02}:{:02}",
                self.local_hour, self.local_minute, self.local_second
            )?;
        }
        if self.has_zone {
            if self.zone_hour == 0 && self.zone_minute == 0 {
                f.write_str("Z")?;
            } else {
                write!(f, "{:+03}:{:02}", self.zone_hour, self.zone_minute)?;
            }
        }
        Ok(())
    }
}

/// Civil date to Julian day number, integer arithmetic throughout.
fn julian_day_number(year: i64, month: i64, day: i64) -> i64 {
    day - 32075
        + 1461 * (year + 4800 + (month - 14) / 12) / 4
        + 367 * (month - 2 - (month - 14) / 12 * 12) / 12
        - 3 * ((year + 4900 + (month - 14) / 12) / 100) / 4
}

/// Julian day number back to civil `(year, month, day)`.
fn civil_from_julian_day(julian_day: i64) -> (i64, i64, i64) {
    let mut l = julian_day + 68569;
    let n = 4 * l / 146097;
    l -= (146097 * n + 3) / 4;
    let mut year = 4000 * (l + 1) / 1461001;
    l = l - 1461 * year / 4 + 31;
    let mut month = 80 * l / 2447;
    let day = l - 2447 * month / 80;
    l = month / 11;
    month = month + 2 - 12 * l;
    year = 100 * (n - 49) + year + l;
    (year, month, day)
}

/// Noon-anchored fraction of a day.
fn time_fraction(hour: i64, minute: i64, second: i64) -> f64 {
    (hour - 12) as f64 / 24.0 + minute as f64 / 1440.0 + second as f64 / 86400.0
}

/// Character cursor for the hand parser.
struct Cursor<'a> {
    rest: &'a str,
}

impl<'a> Cursor<'a> {
    fn new(text: &'a str) -> Self {
        Self { rest: text }
    }

    fn at_end(&self) -> bool {
        self.rest.is_empty()
    }

    fn eat(&mut self, c: char) -> bool {
        if let Some(rest) = self.rest.strip_prefix(c) {
            self.rest = rest;
            true
        } else {
            false
        }
    }

    fn eat_any(&mut self, choices: &[char]) -> bool {
        choices.iter().any(|&c| self.eat(c))
    }

    /// A run of digits, at most `max` long and at least one.
    fn digits(&mut self, max: usize) -> Option<&'a str> {
        let len = self
            .rest
            .char_indices()
            .take(max)
            .take_while(|(_, c)| c.is_ascii_digit())
            .count();
        if len == 0 {
            return None;
        }
        let (taken, rest) = self.rest.split_at(len);
        self.rest = rest;
        Some(taken)
    }

    fn fixed_digits(&mut self, n: usize) -> Option<i64> {
        let taken = self.digits(n)?;
        if taken.len() != n {
            return None;
        }
        taken.parse().ok()
    }

    /// `[+-]?digits-NN-NN`; backtracks entirely on failure.
    fn scan_date(&mut self) -> Option<(i64, i64, i64)> {
        let saved = self.rest;
        let date = self.scan_date_inner();
        if date.is_none() {
            self.rest = saved;
        }
        date
    }

    fn scan_date_inner(&mut self) -> Option<(i64, i64, i64)> {
        let negative = if self.eat('-') {
            true
        } else {
            self.eat('+');
            false
        };
        let year: i64 = self.digits(10)?.parse().ok()?;
        if !self.eat('-') {
            return None;
        }
        let month = self.fixed_digits(2)?;
        if !self.eat('-') {
            return None;
        }
        let day = self.fixed_digits(2)?;
        Some((if negative { -year } else { year }, month, day))
    }

    /// `NN:NN(:NN)?`; backtracks entirely on failure.
    fn scan_time(&mut self) -> Option<(i64, i64, i64)> {
        let saved = self.rest;
        let time = self.scan_time_inner();
        if time.is_none() {
            self.rest = saved;
        }
        time
    }

    fn scan_time_inner(&mut self) -> Option<(i64, i64, i64)> {
        let hour = self.fixed_digits(2)?;
        if !self.eat(':') {
            return None;
        }
        let minute = self.fixed_digits(2)?;
        let second = if self.eat(':') {
            self.fixed_digits(2)?
        } else {
            0
        };
        Some((hour, minute, second))
    }

    /// Empty, `Z`, or `±NN[:]NN`. `Err` means a malformed suffix.
    fn scan_zone(&mut self) -> Result<Option<(i8, u8)>, ()> {
        if self.at_end() {
            return Ok(None);
        }
        if self.eat('Z') {
            return Ok(Some((0, 0)));
        }
        let negative = if self.eat('-') {
            true
        } else if self.eat('+') {
            false
        } else {
            return Err(());
        };
        let hour = self.fixed_digits(2).ok_or(())?;
        self.eat(':');
        let minute = self.fixed_digits(2).ok_or(())?;
        if hour > 14 || minute > 59 {
            return Err(());
        }
        let hour = hour as i8;
        Ok(Some((if negative { -hour } else { hour }, minute as u8)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn known_day_numbers() {
        assert_eq!(julian_day_number(2000, 1, 1), 2_451_545);
        assert_eq!(julian_day_number(1970, 1, 1), 2_440_588);
        assert_eq!(julian_day_number(-4713, 11, 24), 0);
    }

    #[test]
    fn day_of_week_anchors() {
        // 2000-01-01 was a Saturday.
        assert_eq!(
            Julian::from_date(2000, 1, 1).day_of_week(),
            DayOfWeek::Saturday
        );
        // 2023-06-15 was a Thursday.
        assert_eq!(
            Julian::from_date(2023, 6, 15).day_of_week(),
            DayOfWeek::Thursday
        );
    }

    #[test]
    fn parse_date_round_trips_text() {
        let julian = Julian::parse("2023-01-15").unwrap();
        assert!(julian.has_date() && !julian.has_time());
        assert_eq!(julian.to_string(), "2023-01-15");
    }

    #[test]
    fn parse_signed_year() {
        let julian = Julian::parse("-0044-03-15").unwrap();
        assert_eq!(julian.local_date_fields(), (-44, 3, 15));
    }

    #[test]
    fn parse_time_only() {
        let julian = Julian::parse("10:30:15").unwrap();
        assert!(julian.has_time() && !julian.has_date());
        assert_eq!(julian.local_time_fields(), (10, 30, 15));
        assert_eq!(julian.to_string(), "10:30:15");
    }

    #[test]
    fn seconds_default_to_zero() {
        let julian = Julian::parse("10:30").unwrap();
        assert_eq!(julian.local_time_fields(), (10, 30, 0));
    }

    #[test]
    fn parse_date_time_with_space() {
        let julian = Julian::parse("2023-01-15 10:30").unwrap();
        assert!(julian.has_date() && julian.has_time());
        assert_eq!(julian.to_string(), "2023-01-15T10:30:00");
    }

    #[test]
    fn noon_anchored_fractions() {
        assert_eq!(Julian::from_time(12, 0, 0).julian_time(), 0.0);
        assert_eq!(Julian::from_time(18, 0, 0).julian_time(), 0.25);
        assert_eq!(Julian::from_time(0, 0, 0).julian_time(), -0.5);
    }

    #[test]
    fn time_fraction_round_trips() {
        let julian = Julian::from_julian_time(0.25);
        assert_eq!(julian.local_time_fields(), (18, 0, 0));
    }

    #[test]
    fn time_fraction_carries_across_a_minute() {
        // 10:30:59.9996 is nearest to 10:31:00; the rounded second must
        // carry into the minute instead of wrapping to 10:30:00.
        let fraction = 37_859.9996 / 86_400.0 - 0.5;
        let julian = Julian::from_julian_time(fraction);
        assert_eq!(julian.local_time_fields(), (10, 31, 0));
    }

    #[test]
    fn time_fraction_saturates_at_end_of_day() {
        let julian = Julian::from_julian_time(0.5 - 1e-9);
        assert_eq!(julian.local_time_fields(), (23, 59, 59));
    }

    #[test]
    fn zone_normalizes_to_utc() {
        let julian = Julian::parse("2023-06-15T23:30:00+02:00").unwrap();
        assert_eq!(julian.time_fields(), (21, 30, 0));
        assert_eq!(julian.date_fields(), (2023, 6, 15));
        assert_eq!(julian.local_time_fields(), (23, 30, 0));
    }

    #[test]
    fn zone_borrows_a_day() {
        let julian = Julian::parse("2023-06-15T01:00:00+02:00").unwrap();
        assert_eq!(julian.time_fields(), (23, 0, 0));
        assert_eq!(julian.date_fields(), (2023, 6, 14));
        assert_eq!(
            julian.julian_day(),
            Julian::from_date(2023, 6, 14).julian_day()
        );
    }

    #[test]
    fn zone_carries_a_day() {
        let julian = Julian::parse("2023-06-15T23:30:00-05:00").unwrap();
        assert_eq!(julian.time_fields(), (4, 30, 0));
        assert_eq!(julian.date_fields(), (2023, 6, 16));
    }

    #[test]
    fn zulu_suffix() {
        let julian = Julian::parse("2023-06-15T10:00:00Z").unwrap();
        assert!(julian.has_zone());
        assert_eq!(julian.time_fields(), (10, 0, 0));
        assert_eq!(julian.to_string(), "2023-06-15T10:00:00Z");
    }

    #[test]
    fn rejects_non_temporal() {
        assert!(matches!(
            Julian::parse("hello"),
            Err(JulianError::NotTemporal(_))
        ));
        assert!(matches!(
            Julian::parse("42"),
            Err(JulianError::NotTemporal(_))
        ));
    }

    #[test]
    fn rejects_out_of_range_components() {
        assert!(matches!(
            Julian::parse("2023-13-01"),
            Err(JulianError::InvalidDate(_))
        ));
        assert!(matches!(
            Julian::parse("25:00"),
            Err(JulianError::InvalidTime(_))
        ));
        assert!(matches!(
            Julian::parse("2023-01-15T10:00:00+99:00"),
            Err(JulianError::InvalidZone(_))
        ));
    }

    #[test]
    fn trailing_garbage_after_time_only() {
        assert!(Julian::parse("10:30:15x").is_err());
    }

    proptest! {
        #[test]
        fn civil_round_trip(year in -4000i64..4000, month in 1i64..=12, day in 1i64..=28) {
            let jd = julian_day_number(year, month, day);
            prop_assert_eq!(civil_from_julian_day(jd), (year, month, day));
        }

        #[test]
        fn consecutive_days(year in -4000i64..4000, month in 1i64..=12, day in 1i64..=27) {
            let jd = julian_day_number(year, month, day);
            prop_assert_eq!(julian_day_number(year, month, day + 1), jd + 1);
        }
    }
}
