//! Stateless proxy handlers for the KHQR and Bakong endpoints
//!
//! The body is forwarded verbatim; the upstream's JSON body and status are
//! relayed back. Transport failures collapse to a 500 with a generic
//! message so upstream identity and error detail never leak to the caller.

use crate::infrastructure::adapters::{BakongStatusAdapter, KhqrProviderAdapter};
use crate::infrastructure::http::models::ErrorBody;
use crate::shared::metrics::Metrics;
use bytes::Bytes;
use std::sync::Arc;
use tracing::error;
use warp::Reply;

fn relay_reply(
    result: crate::shared::error::AppResult<(u16, serde_json::Value)>,
    failure_message: &str,
    metrics: &Metrics,
) -> warp::reply::WithStatus<warp::reply::Json> {
    match result {
        Ok((status, value)) => {
            let status = warp::http::StatusCode::from_u16(status)
                .unwrap_or(warp::http::StatusCode::INTERNAL_SERVER_ERROR);
            warp::reply::with_status(warp::reply::json(&value), status)
        }
        Err(e) => {
            metrics.upstream_failures_total.inc();
            error!(error = %e, "proxy relay failed");
            warp::reply::with_status(
                warp::reply::json(&ErrorBody::new(failure_message)),
                warp::http::StatusCode::INTERNAL_SERVER_ERROR,
            )
        }
    }
}

/// POST /api/khqr
pub async fn handle_khqr_proxy(
    body: Bytes,
    provider: Arc<KhqrProviderAdapter>,
    metrics: Arc<Metrics>,
) -> Result<impl Reply, warp::reject::Rejection> {
    metrics.http_requests_total.inc();
    let result = provider.relay(body).await;
    Ok(relay_reply(result, "Failed to generate QR code", &metrics))
}

/// POST /api/verify-payment
pub async fn handle_verify_proxy(
    body: Bytes,
    client: Arc<BakongStatusAdapter>,
    metrics: Arc<Metrics>,
) -> Result<impl Reply, warp::reject::Rejection> {
    metrics.http_requests_total.inc();
    let result = client.relay(body).await;
    Ok(relay_reply(result, "Failed to verify payment", &metrics))
}
