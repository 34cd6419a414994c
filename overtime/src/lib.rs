//! Cumulative "created over time" graphs.
//!
//! [`OverTime`] splits a [`TimeWindow`] into fixed-width buckets and, for
//! each bucket, asks a [`MetricCounter`] how many entities were created
//! between the start of the window and the end of that bucket.

pub mod counters;
mod error;
mod series;
pub mod value;
mod window;

pub use {
    counters::{CreatedCounter, Metric, MetricCounter, TimestampCounter},
    error::{Error, Result},
    series::OverTime,
    value::Point,
    window::{TimeWindow, DEFAULT_BUCKET_WIDTH},
};
