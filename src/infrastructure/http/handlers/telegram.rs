//! Notification endpoint handler
//!
//! Requires a bearer payment token; the token resolves to order data
//! server-side, so an unauthenticated client cannot trigger arbitrary
//! notifications. Partial delivery is reported per channel, not as an
//! error.

use crate::application::services::NotificationService;
use crate::infrastructure::http::models::{ErrorBody, TelegramNotifyResponse};
use crate::shared::error::AppError;
use crate::shared::metrics::Metrics;
use std::sync::Arc;
use tracing::{error, warn};
use warp::http::StatusCode;
use warp::Reply;

fn error_reply(status: StatusCode, message: &str) -> warp::reply::WithStatus<warp::reply::Json> {
    warp::reply::with_status(warp::reply::json(&ErrorBody::new(message)), status)
}

/// POST /api/telegram
pub async fn handle_telegram_notify(
    auth_header: Option<String>,
    notifier: Arc<NotificationService>,
    metrics: Arc<Metrics>,
) -> Result<impl Reply, warp::reject::Rejection> {
    metrics.http_requests_total.inc();

    let token = match auth_header
        .as_deref()
        .and_then(|header| header.strip_prefix("Bearer "))
    {
        Some(token) => token.to_string(),
        None => {
            return Ok(error_reply(
                StatusCode::UNAUTHORIZED,
                "Missing authorization header",
            ))
        }
    };

    match notifier.notify_with_token(&token).await {
        Ok(report) => Ok(warp::reply::with_status(
            warp::reply::json(&TelegramNotifyResponse {
                success: true,
                main_group_sent: report.main_group_sent,
                orders_group_sent: report.orders_group_sent,
                queued: report.queued,
            }),
            StatusCode::OK,
        )),
        Err(AppError::Authentication(reason)) => {
            warn!(reason = %reason, "notification rejected");
            Ok(error_reply(
                StatusCode::UNAUTHORIZED,
                "Invalid or expired token",
            ))
        }
        Err(e) => {
            error!(error = %e, "notification dispatch failed");
            Ok(error_reply(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to process request",
            ))
        }
    }
}
