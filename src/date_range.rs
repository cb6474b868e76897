use std::fmt;

use chrono::{DateTime, Duration, Months, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};

use crate::shared::{HegeError, Result};

/// Spans up to this many days are walked day by day.
pub const DAILY_SPAN_DAYS: i64 = 31;
/// Spans up to this many days are walked month by month, longer ones by year.
pub const MONTHLY_SPAN_DAYS: i64 = 356;
/// Offset of the default instant from now, so the data has been published.
pub const DEFAULT_DAYS_AGO: i64 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Granularity {
    Day,
    Month,
    Year,
}

impl Granularity {
    pub fn for_span(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        let days = (end - start).num_days();
        if days <= DAILY_SPAN_DAYS {
            Granularity::Day
        } else if days <= MONTHLY_SPAN_DAYS {
            Granularity::Month
        } else {
            Granularity::Year
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Granularity::Day => "day",
            Granularity::Month => "month",
            Granularity::Year => "year",
        };
        write!(f, "{}", s)
    }
}

pub fn midnight(dt: DateTime<Utc>) -> DateTime<Utc> {
    Utc.from_utc_datetime(&dt.date_naive().and_time(NaiveTime::default()))
}

/// Parse a user supplied date; anything without an offset is taken as UTC.
pub fn parse_date(input: &str) -> Result<DateTime<Utc>> {
    let s = input.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(Utc.from_utc_datetime(&naive));
        }
    }

    let date = NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(&format!("{}-01", s), "%Y-%m-%d"))
        .ok()
        .or_else(|| {
            if s.len() == 4 && s.chars().all(|c| c.is_ascii_digit()) {
                s.parse::<i32>().ok().and_then(|year| NaiveDate::from_ymd_opt(year, 1, 1))
            } else {
                None
            }
        });

    match date {
        Some(date) => Ok(Utc.from_utc_datetime(&date.and_time(NaiveTime::default()))),
        None => Err(HegeError::Argument(format!("unrecognized date '{}'", input))),
    }
}

/// Inclusive sequence of midnights from `start` to `end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub granularity: Granularity,
}

impl DateRange {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        let start = midnight(start);
        let end = midnight(end);
        DateRange {
            start,
            end,
            granularity: Granularity::for_span(start, end),
        }
    }

    /// Resolve the command line dates against `now`.
    pub fn from_args(start: Option<&str>, end: Option<&str>, now: DateTime<Utc>) -> Result<Self> {
        let (start, end) = match (start, end) {
            (None, None) => {
                let date = now - Duration::days(DEFAULT_DAYS_AGO);
                (date, date)
            }
            (None, Some(_)) => {
                return Err(HegeError::Argument(
                    "an end date requires a start date".to_string(),
                ))
            }
            (Some(start), None) => {
                let start = parse_date(start)?;
                (start, start)
            }
            (Some(start), Some(end)) => (parse_date(start)?, parse_date(end)?),
        };

        let range = DateRange::new(start, end);
        if range.end < range.start {
            return Err(HegeError::Argument(format!(
                "end date {} is before start date {}",
                range.end.date_naive(),
                range.start.date_naive()
            )));
        }
        Ok(range)
    }

    /// The `index`-th step from `start`, regardless of `end`.
    pub fn instant(&self, index: u32) -> Option<DateTime<Utc>> {
        match self.granularity {
            Granularity::Day => self.start.checked_add_signed(Duration::days(index as i64)),
            Granularity::Month => self.start.checked_add_months(Months::new(index)),
            Granularity::Year => self.start.checked_add_months(Months::new(index.checked_mul(12)?)),
        }
    }

    pub fn iter(&self) -> DateRangeIter {
        DateRangeIter {
            range: *self,
            index: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.start > self.end
    }
}

impl<'a> IntoIterator for &'a DateRange {
    type Item = DateTime<Utc>;
    type IntoIter = DateRangeIter;

    fn into_iter(self) -> DateRangeIter {
        self.iter()
    }
}

pub struct DateRangeIter {
    range: DateRange,
    index: u32,
}

impl Iterator for DateRangeIter {
    type Item = DateTime<Utc>;

    fn next(&mut self) -> Option<DateTime<Utc>> {
        let instant = self.range.instant(self.index)?;
        if instant > self.range.end {
            return None;
        }
        self.index += 1;
        Some(instant)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn midnight_truncates_time() {
        let dt = Utc.with_ymd_and_hms(2024, 3, 5, 17, 42, 9).unwrap();
        assert_eq!(midnight(dt), Utc.with_ymd_and_hms(2024, 3, 5, 0, 0, 0).unwrap());
    }

    #[test]
    fn parse_date_formats() {
        let jan = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(parse_date("2024-01-01").unwrap(), jan);
        assert_eq!(parse_date("2024-01").unwrap(), jan);
        assert_eq!(parse_date("2024").unwrap(), jan);
        assert_eq!(
            parse_date("2024-01-01T12:30").unwrap(),
            Utc.with_ymd_and_hms(2024, 1, 1, 12, 30, 0).unwrap()
        );
        assert_eq!(
            parse_date("2024-01-01T09:00:00+09:00").unwrap(),
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn parse_date_rejects_garbage() {
        assert!(matches!(parse_date("yesterday"), Err(HegeError::Argument(_))));
        assert!(matches!(parse_date("2024-13-01"), Err(HegeError::Argument(_))));
    }
}
