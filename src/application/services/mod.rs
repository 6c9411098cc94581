//! Application services

pub mod dispatcher;
pub mod flow;
pub mod notification;
pub mod payment_token;
pub mod rate_limit;
pub mod signing;

pub use dispatcher::{DispatchReport, DispatcherService, MessageSender};
pub use flow::{FlowService, FlowStore, PaymentStatusClient, QrProvider};
pub use notification::NotificationService;
pub use payment_token::PaymentTokenService;
pub use rate_limit::RateLimiterService;
pub use signing::SigningService;
