//! Logging utilities module
//!
//! This module provides centralized logging functionality and utilities.

use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{error, info};

/// Logging utilities for the application
pub struct LoggingUtils;

impl LoggingUtils {
    /// Log a request with structured data
    pub fn log_request(request_id: &str, endpoint: &str, client_ip: &str) {
        info!(
            request_id = %request_id,
            endpoint = %endpoint,
            client_ip = %client_ip,
            "Processing request"
        );
    }

    /// Log an error response
    pub fn log_error(request_id: &str, endpoint: &str, error: &crate::shared::error::AppError) {
        error!(
            request_id = %request_id,
            endpoint = %endpoint,
            error = %error,
            "Request failed"
        );
    }

    /// Generate a unique request ID
    pub fn generate_request_id() -> String {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();

        format!("req_{:x}", now)
    }
}
