use axum::{routing::get, Router};
use color_eyre::eyre::Result;
use datafusion::prelude::SessionContext;
use std::{net::SocketAddr, sync::Arc};
use tower_http::trace::{self, TraceLayer};
use tracing::Level;

use super::api;

pub fn router(ctx: Arc<SessionContext>) -> Router {
    Router::new()
        .route("/api/v1/stats", get(api::dashboard))
        .route("/api/v1/stats/:metric", get(api::stats))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(trace::DefaultMakeSpan::new().level(Level::INFO))
                .on_response(trace::DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(ctx)
}

pub async fn server(ctx: Arc<SessionContext>, addr: SocketAddr) -> Result<()> {
    let app = router(ctx);

    // run our app with hyper
    tracing::info!("start http server: {:?}", addr);
    axum::Server::bind(&addr)
        .serve(app.into_make_service())
        .await?;
    Ok(())
}
