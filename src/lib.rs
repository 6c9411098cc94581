//! TopUp Gateway - payment orchestration for KHQR storefronts
//!
//! This library provides the server-side pipeline between a top-up storefront
//! and its external collaborators: the KHQR generator, the Bakong
//! transaction-status API, and the Telegram Bot API. It owns QR generation
//! with cooldown, payment verification polling, and at-least-once order
//! notification.

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod middleware;
pub mod shared;

pub use config::AppConfig;
pub use infrastructure::http::server::GatewayServer;
pub use shared::error::{AppError, AppResult};

/// Application result type
pub type Result<T> = std::result::Result<T, shared::error::AppError>;
