//! Prometheus metrics handler

use crate::shared::metrics::Metrics;
use std::sync::Arc;
use warp::Reply;

/// GET /metrics
pub async fn handle_metrics(
    metrics: Arc<Metrics>,
) -> Result<impl Reply, warp::reject::Rejection> {
    Ok(warp::reply::with_header(
        metrics.gather(),
        "content-type",
        "text/plain; version=0.0.4; charset=utf-8",
    ))
}
