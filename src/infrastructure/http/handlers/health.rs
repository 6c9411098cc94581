//! Health check handler

use crate::infrastructure::http::models::HealthResponse;
use warp::Reply;

/// GET /health
pub async fn handle_health() -> Result<impl Reply, warp::reject::Rejection> {
    Ok(warp::reply::json(&HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        timestamp: chrono::Utc::now().to_rfc3339(),
    }))
}
