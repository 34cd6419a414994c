//! Counting strategies plugged into [`crate::OverTime`].
//!
//! A counter answers one question: how many entities have a timestamp in
//! `[min, max)`. New metrics are new implementations of [`MetricCounter`];
//! the bucketing code does not change.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use strum::{AsRefStr, Display, EnumString};
use time::OffsetDateTime;

use crate::{
    error::{Error, Result},
    value,
};

mod created;
mod memory;

pub use created::CreatedCounter;
pub use memory::TimestampCounter;

#[async_trait]
pub trait MetricCounter: Send + Sync {
    /// Name used in logs and errors.
    fn name(&self) -> &str;

    /// Number of entities whose timestamp lies in `[min, max)`.
    ///
    /// Must be a pure read, and must return `0` for an empty or inverted
    /// range. Counters that do not override this fail every call with
    /// [`Error::NotImplemented`] rather than reporting "no data".
    async fn count(&self, _min: OffsetDateTime, _max: OffsetDateTime) -> Result<u64> {
        Err(Error::NotImplemented(self.name().to_owned()))
    }
}

#[async_trait]
impl<C: MetricCounter + ?Sized> MetricCounter for Arc<C> {
    fn name(&self) -> &str {
        (**self).name()
    }

    async fn count(&self, min: OffsetDateTime, max: OffsetDateTime) -> Result<u64> {
        (**self).count(min, max).await
    }
}

/// Repository metrics with a stock counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, AsRefStr, Display, EnumString, Serialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    /// Works deposited in the repository
    Works,
    /// Registered user accounts
    Users,
}

impl Metric {
    pub const ALL: [Metric; 2] = [Metric::Works, Metric::Users];

    /// Table holding one row per entity of this kind.
    pub fn table_name(&self) -> &'static str {
        match self {
            Metric::Works => value::TABLE_WORKS,
            Metric::Users => value::TABLE_USERS,
        }
    }
}
