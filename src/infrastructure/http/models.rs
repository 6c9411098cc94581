//! HTTP wire models
//!
//! Response shapes mirror the storefront's JSON contract, so fields are
//! camelCase on the wire.

use crate::domain::flow::FlowStatus;
use serde::Serialize;

/// Uniform error body
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    pub fn new(message: &str) -> Self {
        Self {
            error: message.to_string(),
        }
    }
}

/// Flow status snapshot for UI polling
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowStatusResponse {
    pub status: FlowStatus,
    pub check_count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
}

/// Result of a notification dispatch request
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TelegramNotifyResponse {
    pub success: bool,
    pub main_group_sent: bool,
    pub orders_group_sent: bool,
    pub queued: bool,
}

/// Liveness probe response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub timestamp: String,
}
