use time::{util::days_in_year_month, Date, Duration, Month, OffsetDateTime, Time};

use crate::error::{Error, Result};

/// Bucket width used when the caller does not pick one.
pub const DEFAULT_BUCKET_WIDTH: Duration = Duration::days(7);

/// The range `[start, end)` split into buckets of `bucket_width`.
///
/// `start > end` is allowed and describes an empty series. A non-positive
/// `bucket_width` is only rejected when the series is generated, see
/// [`TimeWindow::validate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: OffsetDateTime,
    pub end: OffsetDateTime,
    pub bucket_width: Duration,
}

impl TimeWindow {
    pub fn new(start: OffsetDateTime, end: OffsetDateTime, bucket_width: Duration) -> Self {
        Self {
            start,
            end,
            bucket_width,
        }
    }

    /// The default reporting window relative to `now`: from the start of the
    /// day one calendar month ago to the end of today, in weekly buckets.
    pub fn trailing_month(now: OffsetDateTime) -> Result<Self> {
        let start = one_month_before(now.date())?.midnight().assume_offset(now.offset());
        let end_of_day = Time::from_hms_nano(23, 59, 59, 999_999_999)
            .map_err(|e| Error::InvalidConfiguration(e.to_string()))?;
        let end = now.replace_time(end_of_day);
        Ok(Self::new(start, end, DEFAULT_BUCKET_WIDTH))
    }

    pub fn with_start(mut self, start: OffsetDateTime) -> Self {
        self.start = start;
        self
    }

    pub fn with_end(mut self, end: OffsetDateTime) -> Self {
        self.end = end;
        self
    }

    pub fn with_bucket_width(mut self, bucket_width: Duration) -> Self {
        self.bucket_width = bucket_width;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !self.bucket_width.is_positive() {
            return Err(Error::InvalidConfiguration(format!(
                "bucket width must be positive, got {}",
                self.bucket_width
            )));
        }
        Ok(())
    }

    /// Number of buckets: `ceil((end - start) / bucket_width)`, or zero when
    /// the range is empty or inverted.
    pub fn num_buckets(&self) -> Result<usize> {
        self.validate()?;
        let span = (self.end - self.start).whole_nanoseconds();
        if span <= 0 {
            return Ok(0);
        }
        let width = self.bucket_width.whole_nanoseconds();
        let n = (span + width - 1) / width;
        n.try_into()
            .map_err(|_| Error::InvalidConfiguration(format!("too many buckets: {n}")))
    }
}

/// Same day of the previous month, clamped to the length of that month.
fn one_month_before(date: Date) -> Result<Date> {
    let month = date.month().previous();
    let year = if month == Month::December {
        date.year() - 1
    } else {
        date.year()
    };
    let day = date.day().min(days_in_year_month(year, month));
    Date::from_calendar_date(year, month, day)
        .map_err(|e| Error::InvalidConfiguration(e.to_string()))
}
