//! Checkout flow handlers

use crate::application::services::{FlowService, FlowStore, RateLimiterService, SigningService};
use crate::domain::order::OrderDescriptor;
use crate::infrastructure::http::models::{ErrorBody, FlowStatusResponse};
use crate::shared::logging::LoggingUtils;
use crate::shared::metrics::Metrics;
use std::sync::Arc;
use tracing::warn;
use warp::http::StatusCode;
use warp::Reply;

/// Dependencies injected into the checkout handlers
pub struct CheckoutContext {
    pub flow: Arc<FlowService>,
    pub signing: Arc<SigningService>,
    pub limiter: Arc<RateLimiterService>,
    pub metrics: Arc<Metrics>,
    pub signing_enabled: bool,
}

fn error_reply(status: StatusCode, message: &str) -> warp::reply::WithStatus<warp::reply::Json> {
    warp::reply::with_status(warp::reply::json(&ErrorBody::new(message)), status)
}

/// POST /api/checkout
pub async fn handle_checkout(
    body: serde_json::Value,
    signature: Option<String>,
    timestamp: Option<String>,
    nonce: Option<String>,
    client_ip: Option<String>,
    ctx: Arc<CheckoutContext>,
) -> Result<impl Reply, warp::reject::Rejection> {
    ctx.metrics.http_requests_total.inc();

    let request_id = LoggingUtils::generate_request_id();
    let client_ip = client_ip.unwrap_or_else(|| "unknown".to_string());
    LoggingUtils::log_request(&request_id, "checkout", &client_ip);

    if !ctx.limiter.try_acquire(&client_ip) {
        warn!(client_ip = %client_ip, "checkout rate limited");
        return Ok(error_reply(
            StatusCode::TOO_MANY_REQUESTS,
            "Rate limit exceeded",
        ));
    }

    if ctx.signing_enabled {
        let (signature, timestamp, nonce) = match (signature, timestamp, nonce) {
            (Some(signature), Some(timestamp), Some(nonce)) => (signature, timestamp, nonce),
            _ => {
                warn!(client_ip = %client_ip, "unsigned checkout request rejected");
                return Ok(error_reply(StatusCode::FORBIDDEN, "Invalid request"));
            }
        };
        let timestamp: i64 = match timestamp.parse() {
            Ok(ts) => ts,
            Err(_) => return Ok(error_reply(StatusCode::FORBIDDEN, "Invalid request")),
        };
        if let Err(e) = ctx.signing.verify(&signature, &body, &nonce, timestamp) {
            LoggingUtils::log_error(&request_id, "checkout", &e);
            return Ok(error_reply(e.http_status_code(), e.client_message()));
        }
    }

    let order: OrderDescriptor = match serde_json::from_value(body) {
        Ok(order) => order,
        Err(e) => {
            warn!(client_ip = %client_ip, error = %e, "malformed checkout body");
            return Ok(error_reply(StatusCode::BAD_REQUEST, "Invalid request"));
        }
    };

    match ctx.flow.start_checkout(order).await {
        Ok(response) => Ok(warp::reply::with_status(
            warp::reply::json(&response),
            StatusCode::OK,
        )),
        Err(e) => {
            LoggingUtils::log_error(&request_id, "checkout", &e);
            Ok(error_reply(e.http_status_code(), e.client_message()))
        }
    }
}

/// GET /api/checkout/{flow_id}
pub async fn handle_flow_status(
    flow_id: String,
    store: Arc<FlowStore>,
    metrics: Arc<Metrics>,
) -> Result<impl Reply, warp::reject::Rejection> {
    metrics.http_requests_total.inc();

    match store.get(&flow_id).await {
        Some(snapshot) => Ok(warp::reply::with_status(
            warp::reply::json(&FlowStatusResponse {
                status: snapshot.status,
                check_count: snapshot.check_count,
                error_message: snapshot.error_message,
                transaction_id: snapshot.transaction_id,
            }),
            StatusCode::OK,
        )),
        None => Ok(error_reply(StatusCode::NOT_FOUND, "Not found")),
    }
}
