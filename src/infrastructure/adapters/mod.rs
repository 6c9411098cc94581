//! Infrastructure adapters for external services

pub mod bakong_client;
pub mod khqr_provider;
pub mod telegram_api;

pub use bakong_client::BakongStatusAdapter;
pub use khqr_provider::KhqrProviderAdapter;
pub use telegram_api::TelegramApiAdapter;
