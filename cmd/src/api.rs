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

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use datafusion::prelude::SessionContext;
use serde_json::{json, Value};
use std::{str::FromStr, sync::Arc};
use time::OffsetDateTime;

use overtime::Metric;

use crate::GraphRequest;

pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl From<overtime::Error> for ApiError {
    fn from(e: overtime::Error) -> Self {
        let status = match e {
            overtime::Error::InvalidConfiguration(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            tracing::error!(error = %e, "failed to build graph");
        }
        Self {
            status,
            message: e.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = json!({ "status": "error", "error": self.message });
        (self.status, Json(body)).into_response()
    }
}

/// `GET /api/v1/stats/:metric` — one cumulative graph.
pub async fn stats(
    State(ctx): State<Arc<SessionContext>>,
    Path(metric): Path<String>,
    Query(req): Query<GraphRequest>,
) -> Result<Json<Value>, ApiError> {
    let start_time = std::time::Instant::now();
    let metric = Metric::from_str(&metric).map_err(|_| ApiError {
        status: StatusCode::NOT_FOUND,
        message: format!("unknown metric: {metric}"),
    })?;

    let data = crate::graph(ctx, metric, &req, OffsetDateTime::now_utc()).await?;
    tracing::info!(%metric, points = data.points.len(), "execute time: {:?}", start_time.elapsed());

    Ok(Json(json!({ "status": "success", "data": data })))
}

/// `GET /api/v1/stats` — every metric over the same window, evaluated
/// concurrently.
pub async fn dashboard(
    State(ctx): State<Arc<SessionContext>>,
    Query(req): Query<GraphRequest>,
) -> Result<Json<Value>, ApiError> {
    let start_time = std::time::Instant::now();
    let now = OffsetDateTime::now_utc();
    let unfiltered = GraphRequest {
        depositor: None,
        resource_type: None,
        ..req
    };

    let (works, users) = tokio::try_join!(
        crate::graph(ctx.clone(), Metric::Works, &req, now),
        crate::graph(ctx, Metric::Users, &unfiltered, now),
    )?;
    tracing::info!("execute time: {:?}", start_time.elapsed());

    Ok(Json(json!({
        "status": "success",
        "data": { "works": works.points, "users": users.points },
    })))
}
