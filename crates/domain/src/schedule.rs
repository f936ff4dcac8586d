// Copyright (C) 2026 PoachCoach contributors
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Class schedules and wall-clock time handling.
//!
//! A schedule is stored the way clients send it: a calendar date, a start
//! and end wall-clock time, and the IANA timezone those times are expressed
//! in. Comparisons never happen on strings; every schedule resolves to a
//! pair of UTC instants first.
//!
//! ## Invariants
//!
//! - The timezone is validated at construction
//! - Start and end are never equal
//! - An end earlier than the start means the class runs past midnight,
//!   so the end instant falls on the following calendar day
//! - Local times that do not exist or are ambiguous because of a DST change
//!   are rejected as `InvalidScheduleData`

use crate::error::DomainError;
use chrono::{NaiveDate, NaiveTime, TimeZone};
use chrono_tz::Tz;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::{Date, OffsetDateTime, Time};

const DATE_FORMAT: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");

/// When and in which timezone a class takes place.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClassSchedule {
    date: Date,
    start: Time,
    end: Time,
    timezone: String,
}

impl ClassSchedule {
    /// Creates a schedule from already-parsed parts.
    ///
    /// # Errors
    ///
    /// Returns an error if the timezone is unknown or start equals end.
    pub fn new(date: Date, start: Time, end: Time, timezone: &str) -> Result<Self, DomainError> {
        parse_timezone(timezone)?;

        if start == end {
            return Err(DomainError::InvalidScheduleData {
                field: "end_time",
                value: format_24h(end),
                reason: String::from("end time must differ from start time"),
            });
        }

        Ok(Self {
            date,
            start,
            end,
            timezone: timezone.to_string(),
        })
    }

    /// Parses a schedule from its wire representation.
    ///
    /// # Arguments
    ///
    /// * `date` - Calendar date, `YYYY-MM-DD`
    /// * `start` - Start time, `HH:MM` or `HH:MM:SS` (24-hour)
    /// * `end` - End time, same format as `start`
    /// * `timezone` - IANA timezone name, e.g. `America/New_York`
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidScheduleData` if any part is malformed,
    /// or `DomainError::InvalidTimezone` for an unknown timezone.
    pub fn parse(date: &str, start: &str, end: &str, timezone: &str) -> Result<Self, DomainError> {
        let date: Date = parse_date(date)?;
        let start: Time = parse_24h(start).map_err(|e| rename_field(e, "start_time"))?;
        let end: Time = parse_24h(end).map_err(|e| rename_field(e, "end_time"))?;
        Self::new(date, start, end, timezone)
    }

    /// Returns the calendar date.
    #[must_use]
    pub const fn date(&self) -> Date {
        self.date
    }

    /// Returns the wall-clock start time.
    #[must_use]
    pub const fn start_time(&self) -> Time {
        self.start
    }

    /// Returns the wall-clock end time.
    #[must_use]
    pub const fn end_time(&self) -> Time {
        self.end
    }

    /// Returns the IANA timezone name.
    #[must_use]
    pub fn timezone(&self) -> &str {
        &self.timezone
    }

    /// Returns whether the class ends on the day after it starts.
    #[must_use]
    pub fn crosses_midnight(&self) -> bool {
        self.end < self.start
    }

    /// Returns the date as `YYYY-MM-DD`.
    #[must_use]
    pub fn date_string(&self) -> String {
        format_date(self.date)
    }

    /// Returns the start time as `HH:MM`.
    #[must_use]
    pub fn start_string(&self) -> String {
        format_24h(self.start)
    }

    /// Returns the end time as `HH:MM`.
    #[must_use]
    pub fn end_string(&self) -> String {
        format_24h(self.end)
    }

    /// Resolves the start of the class to a UTC instant.
    ///
    /// # Errors
    ///
    /// Returns an error if the local time cannot be resolved in the
    /// declared timezone.
    pub fn start_instant(&self) -> Result<OffsetDateTime, DomainError> {
        resolve(self.date, self.start, &self.timezone, "start_time")
    }

    /// Resolves the end of the class to a UTC instant.
    ///
    /// # Errors
    ///
    /// Returns an error if the local time cannot be resolved in the
    /// declared timezone.
    pub fn end_instant(&self) -> Result<OffsetDateTime, DomainError> {
        let end_date: Date = if self.crosses_midnight() {
            self.date
                .next_day()
                .ok_or_else(|| DomainError::DateArithmeticOverflow {
                    operation: format!("rolling {} over midnight", self.date),
                })?
        } else {
            self.date
        };

        resolve(end_date, self.end, &self.timezone, "end_time")
    }
}

/// Parses a `YYYY-MM-DD` calendar date.
///
/// # Errors
///
/// Returns `DomainError::InvalidScheduleData` if the date is malformed.
pub fn parse_date(value: &str) -> Result<Date, DomainError> {
    Date::parse(value.trim(), DATE_FORMAT).map_err(|e| DomainError::InvalidScheduleData {
        field: "date",
        value: value.to_string(),
        reason: e.to_string(),
    })
}

/// Formats a date as `YYYY-MM-DD`.
#[must_use]
pub fn format_date(date: Date) -> String {
    format!(
        "{:04}-{:02}-{:02}",
        date.year(),
        u8::from(date.month()),
        date.day()
    )
}

/// Parses a 24-hour `HH:MM` or `HH:MM:SS` time.
///
/// Single-digit hours (`9:05`) are accepted.
///
/// # Errors
///
/// Returns `DomainError::InvalidScheduleData` if the time is malformed or
/// out of range.
pub fn parse_24h(value: &str) -> Result<Time, DomainError> {
    let invalid = |reason: &str| DomainError::InvalidScheduleData {
        field: "time",
        value: value.to_string(),
        reason: reason.to_string(),
    };

    let parts: Vec<&str> = value.trim().split(':').collect();
    if !(2..=3).contains(&parts.len()) {
        return Err(invalid("expected HH:MM or HH:MM:SS"));
    }

    let mut numbers: [u8; 3] = [0; 3];
    for (slot, part) in numbers.iter_mut().zip(&parts) {
        if part.is_empty() || part.len() > 2 || !part.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid("each component must be one or two digits"));
        }
        *slot = part.parse().map_err(|_| invalid("not a number"))?;
    }

    Time::from_hms(numbers[0], numbers[1], numbers[2]).map_err(|e| invalid(&e.to_string()))
}

/// Formats a time as 24-hour `HH:MM`.
#[must_use]
pub fn format_24h(time: Time) -> String {
    format!("{:02}:{:02}", time.hour(), time.minute())
}

/// Formats a time for display as `h:MM AM`/`h:MM PM`.
///
/// Midnight is `12:00 AM` and noon is `12:00 PM`.
#[must_use]
pub fn format_12h(time: Time) -> String {
    let hour: u8 = time.hour();
    let display_hour: u8 = match hour % 12 {
        0 => 12,
        h => h,
    };
    let suffix: &str = if hour < 12 { "AM" } else { "PM" };
    format!("{display_hour}:{:02} {suffix}", time.minute())
}

/// Parses a 12-hour display time such as `9:05 AM` or `12:30pm`.
///
/// # Errors
///
/// Returns `DomainError::InvalidScheduleData` if the suffix is missing or
/// the hour is outside 1..=12.
pub fn parse_12h(value: &str) -> Result<Time, DomainError> {
    let invalid = |reason: &str| DomainError::InvalidScheduleData {
        field: "time",
        value: value.to_string(),
        reason: reason.to_string(),
    };

    let trimmed: String = value.trim().to_uppercase();
    let (clock, is_pm) = if let Some(rest) = trimmed.strip_suffix("AM") {
        (rest.trim_end(), false)
    } else if let Some(rest) = trimmed.strip_suffix("PM") {
        (rest.trim_end(), true)
    } else {
        return Err(invalid("expected an AM or PM suffix"));
    };

    let (hour_part, minute_part) = clock
        .split_once(':')
        .ok_or_else(|| invalid("expected h:MM"))?;
    let one_or_two_digits =
        |part: &str| (1..=2).contains(&part.len()) && part.bytes().all(|b| b.is_ascii_digit());
    if !one_or_two_digits(hour_part) || !one_or_two_digits(minute_part) {
        return Err(invalid("expected h:MM with digits only"));
    }
    let hour: u8 = hour_part.parse().map_err(|_| invalid("hour is not a number"))?;
    let minute: u8 = minute_part
        .parse()
        .map_err(|_| invalid("minute is not a number"))?;

    if !(1..=12).contains(&hour) {
        return Err(invalid("hour must be between 1 and 12"));
    }

    let hour_24: u8 = match (hour, is_pm) {
        (12, false) => 0,
        (12, true) => 12,
        (h, false) => h,
        (h, true) => h + 12,
    };

    Time::from_hms(hour_24, minute, 0).map_err(|e| invalid(&e.to_string()))
}

/// Validates an IANA timezone name.
///
/// # Errors
///
/// Returns `DomainError::InvalidTimezone` if the name is unknown.
pub fn parse_timezone(timezone: &str) -> Result<Tz, DomainError> {
    timezone
        .parse()
        .map_err(|_| DomainError::InvalidTimezone(timezone.to_string()))
}

fn rename_field(err: DomainError, field: &'static str) -> DomainError {
    match err {
        DomainError::InvalidScheduleData { value, reason, .. } => DomainError::InvalidScheduleData {
            field,
            value,
            reason,
        },
        other => other,
    }
}

/// Resolves a local wall-clock date and time in `timezone` to UTC.
fn resolve(
    date: Date,
    time: Time,
    timezone: &str,
    field: &'static str,
) -> Result<OffsetDateTime, DomainError> {
    let tz: Tz = parse_timezone(timezone)?;

    let naive_date: NaiveDate = NaiveDate::from_ymd_opt(
        date.year(),
        u32::from(u8::from(date.month())),
        u32::from(date.day()),
    )
    .ok_or_else(|| DomainError::InvalidScheduleData {
        field: "date",
        value: format_date(date),
        reason: String::from("date is out of range"),
    })?;

    let naive_time: NaiveTime = NaiveTime::from_hms_opt(
        u32::from(time.hour()),
        u32::from(time.minute()),
        u32::from(time.second()),
    )
    .ok_or_else(|| DomainError::InvalidScheduleData {
        field,
        value: format_24h(time),
        reason: String::from("time is out of range"),
    })?;

    let local = tz
        .from_local_datetime(&naive_date.and_time(naive_time))
        .single()
        .ok_or_else(|| DomainError::InvalidScheduleData {
            field,
            value: format!("{} {}", format_date(date), format_24h(time)),
            reason: format!(
                "local time is ambiguous or does not exist in {timezone} (DST transition)"
            ),
        })?;

    OffsetDateTime::from_unix_timestamp(local.timestamp()).map_err(|e| {
        DomainError::DateArithmeticOverflow {
            operation: format!("converting {local} to UTC: {e}"),
        }
    })
}
