//! HTTP handlers

pub mod checkout;
pub mod health;
pub mod metrics;
pub mod proxy;
pub mod telegram;

pub use checkout::{handle_checkout, handle_flow_status, CheckoutContext};
pub use health::handle_health;
pub use metrics::handle_metrics;
pub use proxy::{handle_khqr_proxy, handle_verify_proxy};
pub use telegram::handle_telegram_notify;
