//! Cumulative series over a bucketed time window.

use futures::{stream, Stream, TryStreamExt};
use time::OffsetDateTime;

use crate::{
    counters::MetricCounter,
    error::{Error, Result},
    value::Point,
    window::TimeWindow,
};

/// Cumulative graph of one metric over a [`TimeWindow`].
///
/// Every point re-counts from the start of the window, so the series is
/// non-decreasing whenever the counter is monotonic in the range size.
pub struct OverTime<C> {
    counter: C,
    window: TimeWindow,
}

impl<C: MetricCounter> OverTime<C> {
    pub fn new(counter: C, window: TimeWindow) -> Self {
        Self { counter, window }
    }

    pub fn counter(&self) -> &C {
        &self.counter
    }

    pub fn window(&self) -> &TimeWindow {
        &self.window
    }

    /// Number of points [`OverTime::points`] yields, known before any count
    /// is performed.
    pub fn len(&self) -> Result<usize> {
        self.window.num_buckets()
    }

    /// Lazily yields one point per bucket, in ascending time order.
    ///
    /// Each pull performs exactly one `count(start, upper_bound)` call and
    /// nothing is memoized: traversing a second stream repeats every query.
    /// The stream ends after the first error.
    pub fn points(&self) -> Result<impl Stream<Item = Result<Point>> + Send + '_> {
        self.window.validate()?;
        Ok(stream::try_unfold(self.window.start, move |cursor| {
            self.next_point(cursor)
        }))
    }

    /// Realises the whole series.
    pub async fn collect(&self) -> Result<Vec<Point>> {
        self.points()?.try_collect().await
    }

    async fn next_point(
        &self,
        cursor: OffsetDateTime,
    ) -> Result<Option<(Point, OffsetDateTime)>> {
        let TimeWindow {
            start,
            end,
            bucket_width,
        } = self.window;
        if cursor >= end {
            return Ok(None);
        }
        let upper = cursor.checked_add(bucket_width).ok_or_else(|| {
            Error::InvalidConfiguration(format!("bucket after {cursor} is out of range"))
        })?;
        let count = self.counter.count(start, upper).await?;
        tracing::debug!(counter = self.counter.name(), %upper, count, "counted bucket");
        Ok(Some((Point::new(upper, count), upper)))
    }
}
