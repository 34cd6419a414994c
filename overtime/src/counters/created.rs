// Copyright 2022 Zinc Labs Inc. and Contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::sync::Arc;

use async_trait::async_trait;
use datafusion::prelude::{col, lit, SessionContext};
use time::OffsetDateTime;

use super::{Metric, MetricCounter};
use crate::{
    error::Result,
    value::{self, micros_since_epoch},
};

/// Counts rows of a DataFusion table created within a range.
///
/// The table must carry a [`value::FIELD_TIME`] column holding the creation
/// time in microseconds since the Unix epoch.
#[derive(Clone)]
pub struct CreatedCounter {
    ctx: Arc<SessionContext>,
    name: String,
    table: String,
    /// column name — required value
    filters: Vec<(String, String)>,
}

impl CreatedCounter {
    pub fn new(ctx: Arc<SessionContext>, table: impl Into<String>) -> Self {
        let table = table.into();
        Self {
            ctx,
            name: table.clone(),
            table,
            filters: Vec::new(),
        }
    }

    pub fn for_metric(ctx: Arc<SessionContext>, metric: Metric) -> Self {
        Self::new(ctx, metric.table_name())
    }

    /// Works created over time.
    pub fn works(ctx: Arc<SessionContext>) -> Self {
        Self::for_metric(ctx, Metric::Works)
    }

    /// User accounts created over time.
    pub fn users(ctx: Arc<SessionContext>) -> Self {
        Self::for_metric(ctx, Metric::Users)
    }

    /// Only counts rows where `column` equals `value`.
    pub fn with_filter(mut self, column: impl Into<String>, value: impl Into<String>) -> Self {
        let (column, value) = (column.into(), value.into());
        self.name = format!("{}{{{column}={value}}}", self.name);
        self.filters.push((column, value));
        self
    }

    pub fn with_depositor(self, depositor: impl Into<String>) -> Self {
        self.with_filter(value::FIELD_DEPOSITOR, depositor)
    }

    pub fn with_resource_type(self, resource_type: impl Into<String>) -> Self {
        self.with_filter(value::FIELD_RESOURCE_TYPE, resource_type)
    }
}

#[async_trait]
impl MetricCounter for CreatedCounter {
    fn name(&self) -> &str {
        &self.name
    }

    #[tracing::instrument(skip_all, fields(counter = %self.name))]
    async fn count(&self, min: OffsetDateTime, max: OffsetDateTime) -> Result<u64> {
        if max <= min {
            return Ok(0);
        }
        let (min, max) = (micros_since_epoch(min)?, micros_since_epoch(max)?);

        let mut df = self.ctx.table(self.table.as_str()).await?.filter(
            col(value::FIELD_TIME)
                .gt_eq(lit(min))
                .and(col(value::FIELD_TIME).lt(lit(max))),
        )?;
        for (column, value) in &self.filters {
            df = df.filter(col(column.as_str()).eq(lit(value.as_str())))?;
        }
        let n = df.count().await?;
        tracing::trace!(min, max, n, "counted rows");
        Ok(n as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use datafusion::{
        arrow::{
            array::{ArrayRef, Int64Array, StringArray},
            datatypes::{DataType, Field, Schema},
            record_batch::RecordBatch,
        },
        datasource::MemTable,
    };
    use time::macros::datetime;

    use crate::error::Error;

    fn works_context() -> Arc<SessionContext> {
        let schema = Arc::new(Schema::new(vec![
            Field::new(value::FIELD_ID, DataType::Utf8, false),
            Field::new(value::FIELD_DEPOSITOR, DataType::Utf8, false),
            Field::new(value::FIELD_RESOURCE_TYPE, DataType::Utf8, false),
            Field::new(value::FIELD_TIME, DataType::Int64, false),
        ]));
        let created = [
            datetime!(2024-01-02 00:00 UTC),
            datetime!(2024-01-09 00:00 UTC),
            datetime!(2024-01-20 00:00 UTC),
        ];
        let columns: Vec<ArrayRef> = vec![
            Arc::new(StringArray::from(vec!["w1", "w2", "w3"])),
            Arc::new(StringArray::from(vec!["alice", "bob", "alice"])),
            Arc::new(StringArray::from(vec!["Article", "Article", "Dataset"])),
            Arc::new(Int64Array::from(
                created
                    .iter()
                    .map(|t| micros_since_epoch(*t).unwrap())
                    .collect::<Vec<_>>(),
            )),
        ];
        let batch = RecordBatch::try_new(schema.clone(), columns).unwrap();
        let provider = MemTable::try_new(schema, vec![vec![batch]]).unwrap();
        let ctx = SessionContext::new();
        ctx.register_table(value::TABLE_WORKS, Arc::new(provider))
            .unwrap();
        Arc::new(ctx)
    }

    #[tokio::test]
    async fn test_count_half_open_range() {
        let counter = CreatedCounter::works(works_context());
        let start = datetime!(2024-01-01 00:00 UTC);

        assert_eq!(
            counter
                .count(start, datetime!(2024-01-08 00:00 UTC))
                .await
                .unwrap(),
            1
        );
        assert_eq!(
            counter
                .count(start, datetime!(2024-01-15 00:00 UTC))
                .await
                .unwrap(),
            2
        );
        // lower bound inclusive, upper bound exclusive
        assert_eq!(
            counter
                .count(
                    datetime!(2024-01-09 00:00 UTC),
                    datetime!(2024-01-20 00:00 UTC)
                )
                .await
                .unwrap(),
            1
        );
    }

    #[tokio::test]
    async fn test_count_empty_and_inverted() {
        let counter = CreatedCounter::works(works_context());
        let t = datetime!(2024-01-09 00:00 UTC);
        assert_eq!(counter.count(t, t).await.unwrap(), 0);
        assert_eq!(
            counter
                .count(t, datetime!(2024-01-01 00:00 UTC))
                .await
                .unwrap(),
            0
        );
    }

    #[tokio::test]
    async fn test_count_with_depositor() {
        let counter = CreatedCounter::works(works_context()).with_depositor("alice");
        assert_eq!(counter.name(), "works{depositor=alice}");
        let n = counter
            .count(
                datetime!(2024-01-01 00:00 UTC),
                datetime!(2024-02-01 00:00 UTC),
            )
            .await
            .unwrap();
        assert_eq!(n, 2);
    }

    #[tokio::test]
    async fn test_count_with_resource_type() {
        let start = datetime!(2024-01-01 00:00 UTC);
        let end = datetime!(2024-02-01 00:00 UTC);

        let articles = CreatedCounter::works(works_context()).with_resource_type("Article");
        assert_eq!(articles.name(), "works{resource_type=Article}");
        assert_eq!(articles.count(start, end).await.unwrap(), 2);
        assert_eq!(
            articles
                .count(start, datetime!(2024-01-08 00:00 UTC))
                .await
                .unwrap(),
            1
        );

        // filters combine
        let counter = CreatedCounter::works(works_context())
            .with_depositor("alice")
            .with_resource_type("Dataset");
        assert_eq!(
            counter.name(),
            "works{depositor=alice}{resource_type=Dataset}"
        );
        assert_eq!(counter.count(start, end).await.unwrap(), 1);

        let counter = CreatedCounter::works(works_context()).with_resource_type("Thesis");
        assert_eq!(counter.count(start, end).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_missing_table_propagates() {
        let counter = CreatedCounter::users(works_context());
        let err = counter
            .count(
                datetime!(2024-01-01 00:00 UTC),
                datetime!(2024-02-01 00:00 UTC),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::DataFusion(_)));
    }
}
