use async_trait::async_trait;
use time::OffsetDateTime;

use super::MetricCounter;
use crate::error::Result;

/// Counts against a fixed, in-memory set of creation timestamps.
#[derive(Debug, Clone)]
pub struct TimestampCounter {
    name: String,
    /// sorted ascending
    timestamps: Vec<OffsetDateTime>,
}

impl TimestampCounter {
    pub fn new<I>(name: impl Into<String>, timestamps: I) -> Self
    where
        I: IntoIterator<Item = OffsetDateTime>,
    {
        let mut timestamps = timestamps.into_iter().collect::<Vec<_>>();
        timestamps.sort_unstable();
        Self {
            name: name.into(),
            timestamps,
        }
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }
}

#[async_trait]
impl MetricCounter for TimestampCounter {
    fn name(&self) -> &str {
        &self.name
    }

    async fn count(&self, min: OffsetDateTime, max: OffsetDateTime) -> Result<u64> {
        let lo = self.timestamps.partition_point(|t| *t < min);
        let hi = self.timestamps.partition_point(|t| *t < max);
        Ok(hi.saturating_sub(lo) as u64)
    }
}
