//! Rejection recovery
//!
//! Normalizes every rejection to the `{"error": <generic message>}` shape.
//! Upstream or internal detail never reaches the client.

use crate::infrastructure::http::models::ErrorBody;
use crate::shared::error::AppError;
use std::convert::Infallible;
use tracing::error;
use warp::http::StatusCode;
use warp::{Rejection, Reply};

pub async fn handle_rejection(err: Rejection) -> Result<impl Reply, Infallible> {
    let (status, message) = if err.is_not_found() {
        (StatusCode::NOT_FOUND, "Not found")
    } else if let Some(app_error) = err.find::<AppError>() {
        (app_error.http_status_code(), app_error.client_message())
    } else if err
        .find::<warp::filters::body::BodyDeserializeError>()
        .is_some()
    {
        (StatusCode::BAD_REQUEST, "Invalid request")
    } else if err.find::<warp::reject::PayloadTooLarge>().is_some() {
        (StatusCode::PAYLOAD_TOO_LARGE, "Request too large")
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        (StatusCode::METHOD_NOT_ALLOWED, "Method not allowed")
    } else {
        error!(rejection = ?err, "unhandled rejection");
        (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
    };

    Ok(warp::reply::with_status(
        warp::reply::json(&ErrorBody::new(message)),
        status,
    ))
}
