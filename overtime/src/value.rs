use serde::ser::{SerializeSeq, Serializer};
use serde::Serialize;
use time::OffsetDateTime;

use crate::error::{Error, Result};

pub const FIELD_ID: &str = "id";
/// Creation time of the entity, in microseconds since the Unix epoch.
pub const FIELD_TIME: &str = "_timestamp";
pub const FIELD_DEPOSITOR: &str = "depositor";
pub const FIELD_RESOURCE_TYPE: &str = "resource_type";

pub const TABLE_WORKS: &str = "works";
pub const TABLE_USERS: &str = "users";

/// One bucket of a cumulative series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Point {
    /// Upper bound of the bucket, in milliseconds since the Unix epoch
    pub timestamp: i64,
    /// Entities counted from the start of the window up to `timestamp`
    pub count: u64,
}

impl Point {
    pub fn new(upper_bound: OffsetDateTime, count: u64) -> Self {
        Self {
            timestamp: upper_bound.unix_timestamp() * 1000,
            count,
        }
    }
}

/// Serialized the way chart widgets expect a series entry: `[millis, count]`.
impl Serialize for Point {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut seq = serializer.serialize_seq(Some(2))?;
        seq.serialize_element(&self.timestamp)?;
        seq.serialize_element(&self.count)?;
        seq.end()
    }
}

/// Converts `t` to the number of microseconds elapsed since the beginning of the Unix epoch.
pub fn micros_since_epoch(t: OffsetDateTime) -> Result<i64> {
    (t.unix_timestamp_nanos() / 1_000)
        .try_into()
        .map_err(|_| Error::InvalidConfiguration(format!("{t} does not fit in i64 microseconds")))
}
