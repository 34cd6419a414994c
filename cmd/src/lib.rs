use arrow::{
    array::{ArrayRef, Int64Array, StringArray},
    datatypes::{DataType, Field, Schema},
    record_batch::RecordBatch,
};
use clap::Args;
use color_eyre::eyre::{bail, eyre, Result, WrapErr};
use datafusion::{datasource::MemTable, prelude::SessionContext};
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path, str::FromStr, sync::Arc};
use time::{format_description::well_known::Rfc3339, Duration, OffsetDateTime};

use overtime::{value, CreatedCounter, Metric, OverTime, Point, TimeWindow};

pub mod api;
pub mod http;

/// One row of a `samples/<metric>.json` fixture.
#[derive(Debug, Serialize, Deserialize)]
struct Record {
    id: String,
    #[serde(with = "time::serde::rfc3339")]
    created: OffsetDateTime,
    depositor: Option<String>,
    resource_type: Option<String>,
}

/// Window and filters of one graph, shared by the CLI and the HTTP API.
///
/// Unset fields fall back to a trailing month in weekly buckets.
#[derive(Debug, Default, Clone, Args, Deserialize)]
pub struct GraphRequest {
    /// Bucket width in days
    #[arg(long, allow_negative_numbers = true)]
    pub delta_x: Option<i64>,
    /// Start of the graph (RFC 3339)
    #[arg(long, value_parser = parse_rfc3339)]
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub x_min: Option<OffsetDateTime>,
    /// End of the graph (RFC 3339)
    #[arg(long, value_parser = parse_rfc3339)]
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub x_max: Option<OffsetDateTime>,
    /// Only count works deposited by this user
    #[arg(long)]
    pub depositor: Option<String>,
    /// Only count works of this resource type
    #[arg(long)]
    pub resource_type: Option<String>,
}

impl GraphRequest {
    pub fn window(&self, now: OffsetDateTime) -> overtime::Result<TimeWindow> {
        let mut window = TimeWindow::trailing_month(now)?;
        if let Some(days) = self.delta_x {
            let width = days
                .checked_mul(86_400)
                .map(Duration::seconds)
                .ok_or_else(|| {
                    overtime::Error::InvalidConfiguration(format!(
                        "bucket width of {days} days is out of range"
                    ))
                })?;
            window = window.with_bucket_width(width);
        }
        if let Some(start) = self.x_min {
            window = window.with_start(start);
        }
        if let Some(end) = self.x_max {
            window = window.with_end(end);
        }
        Ok(window)
    }
}

#[derive(Debug, Serialize)]
pub struct Graph {
    pub metric: Metric,
    pub points: Vec<Point>,
}

pub async fn graph(
    ctx: Arc<SessionContext>,
    metric: Metric,
    req: &GraphRequest,
    now: OffsetDateTime,
) -> overtime::Result<Graph> {
    let mut counter = CreatedCounter::for_metric(ctx, metric);
    let filters = [
        (value::FIELD_DEPOSITOR, &req.depositor),
        (value::FIELD_RESOURCE_TYPE, &req.resource_type),
    ];
    for (column, wanted) in filters {
        let Some(wanted) = wanted else { continue };
        if metric != Metric::Works {
            return Err(overtime::Error::InvalidConfiguration(format!(
                "{metric} cannot be filtered by {column}"
            )));
        }
        counter = counter.with_filter(column, wanted.as_str());
    }
    let series = OverTime::new(counter, req.window(now)?);
    let points = series.collect().await?;
    Ok(Graph { metric, points })
}

// Creates local session context with one in-memory table per sample file.
pub fn create_context(samples_dir: impl AsRef<Path>) -> Result<SessionContext> {
    let ctx = SessionContext::new();
    let samples_dir = samples_dir.as_ref();
    let paths = fs::read_dir(samples_dir).wrap_err_with(|| format!("{}", samples_dir.display()))?;
    for dentry in paths {
        create_table_by_file(&ctx, dentry?.path())?;
    }
    Ok(ctx)
}

pub fn parse_rfc3339(s: &str) -> Result<OffsetDateTime, time::error::Parse> {
    OffsetDateTime::parse(s, &Rfc3339)
}

fn create_table_by_file<P: AsRef<Path>>(ctx: &SessionContext, path: P) -> Result<()> {
    let path = path.as_ref();
    if path.extension().map_or(true, |ext| ext != "json") {
        return Ok(());
    }
    let Some(metric) = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .and_then(|stem| Metric::from_str(stem).ok())
    else {
        tracing::warn!(path = %path.display(), "no metric named after file, skipping");
        return Ok(());
    };

    let data = fs::read(path).wrap_err_with(|| format!("{}", path.display()))?;
    let records: Vec<Record> = serde_json::from_slice(&data)
        .map_err(|e| eyre!("Failed to parse JSON file {}: {e}", path.display()))?;
    let schema = Arc::new(create_schema());
    let batch = create_record_batch(schema.clone(), &records)
        .wrap_err_with(|| format!("{}", path.display()))?;
    let provider = MemTable::try_new(schema, vec![vec![batch]])?;
    ctx.register_table(metric.table_name(), Arc::new(provider))?;
    tracing::info!(table = metric.table_name(), rows = records.len(), "registered table");
    Ok(())
}

fn create_schema() -> Schema {
    Schema::new(vec![
        Field::new(value::FIELD_ID, DataType::Utf8, false),
        Field::new(value::FIELD_DEPOSITOR, DataType::Utf8, true),
        Field::new(value::FIELD_RESOURCE_TYPE, DataType::Utf8, true),
        Field::new(value::FIELD_TIME, DataType::Int64, false),
    ])
}

fn create_record_batch(schema: Arc<Schema>, records: &[Record]) -> Result<RecordBatch> {
    let mut ids = FxHashSet::default();
    let mut time_values = Vec::with_capacity(records.len());
    for record in records {
        if !ids.insert(record.id.as_str()) {
            bail!("duplicate id {:?}", record.id);
        }
        time_values.push(value::micros_since_epoch(record.created)?);
    }

    let columns: Vec<ArrayRef> = vec![
        Arc::new(StringArray::from_iter_values(
            records.iter().map(|r| r.id.as_str()),
        )),
        Arc::new(StringArray::from(
            records
                .iter()
                .map(|r| r.depositor.as_deref())
                .collect::<Vec<_>>(),
        )),
        Arc::new(StringArray::from(
            records
                .iter()
                .map(|r| r.resource_type.as_deref())
                .collect::<Vec<_>>(),
        )),
        Arc::new(Int64Array::from(time_values)),
    ];
    Ok(RecordBatch::try_new(schema, columns)?)
}
