//! HTTP server wiring
//!
//! Builds the service graph, starts the background loops (dispatcher drain,
//! limiter sweeps, nonce sweep), and serves the routes. Deployed behind a
//! reverse proxy that terminates TLS.

use crate::application::services::dispatcher::DispatcherService;
use crate::application::services::flow::{FlowService, FlowStore};
use crate::application::services::{
    NotificationService, PaymentTokenService, RateLimiterService, SigningService,
};
use crate::config::AppConfig;
use crate::infrastructure::adapters::{
    BakongStatusAdapter, KhqrProviderAdapter, TelegramApiAdapter,
};
use crate::infrastructure::http::handlers::CheckoutContext;
use crate::infrastructure::http::routes::RouteBuilder;
use crate::shared::error::{AppError, AppResult};
use crate::shared::metrics::Metrics;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument};
use warp::{Filter, Reply};

/// Gateway HTTP server
pub struct GatewayServer {
    config: AppConfig,
    khqr: Arc<KhqrProviderAdapter>,
    bakong: Arc<BakongStatusAdapter>,
    notifier: Arc<NotificationService>,
    dispatcher: Arc<DispatcherService>,
    chat_limiter: Arc<RateLimiterService>,
    checkout_limiter: Arc<RateLimiterService>,
    signing: Arc<SigningService>,
    flow_service: Arc<FlowService>,
    flow_store: Arc<FlowStore>,
    metrics: Arc<Metrics>,
}

impl GatewayServer {
    /// Create a new server instance and wire the service graph
    pub async fn new(config: AppConfig) -> AppResult<Self> {
        let config_arc = Arc::new(config.clone());
        let metrics = Arc::new(Metrics::new());

        // Upstream adapters
        let khqr = Arc::new(KhqrProviderAdapter::new(config_arc.clone())?);
        let bakong = Arc::new(BakongStatusAdapter::new(config_arc.clone())?);
        let telegram = Arc::new(TelegramApiAdapter::new(config_arc.clone())?);

        // Per-chat limiter feeding the dispatcher queue
        let chat_limiter = Arc::new(RateLimiterService::new(
            Duration::from_secs(config.telegram.window_seconds),
            config.telegram.max_per_window,
            Duration::from_secs(config.rate_limit.block_seconds),
        ));
        let dispatcher = Arc::new(DispatcherService::new(
            telegram,
            chat_limiter.clone(),
            config.telegram.max_retries,
            Duration::from_secs(config.telegram.stale_after_seconds),
            Duration::from_millis(config.telegram.drain_tick_ms),
            config.telegram.main_chat_id.clone(),
            config.telegram.orders_chat_id.clone(),
            metrics.clone(),
        ));

        let tokens = Arc::new(PaymentTokenService::new(config_arc.clone()));
        let notifier = Arc::new(NotificationService::new(tokens.clone(), dispatcher.clone()));

        let flow_store = Arc::new(FlowStore::new());
        let flow_service = Arc::new(FlowService::new(
            config_arc.clone(),
            khqr.clone(),
            bakong.clone(),
            notifier.clone(),
            tokens,
            flow_store.clone(),
            metrics.clone(),
        ));

        // Per-IP limiter guarding the checkout endpoint
        let checkout_limiter = Arc::new(RateLimiterService::new(
            Duration::from_secs(config.rate_limit.window_seconds),
            config.rate_limit.max_requests,
            Duration::from_secs(config.rate_limit.block_seconds),
        ));
        let signing = Arc::new(SigningService::new(&config));

        Ok(Self {
            config,
            khqr,
            bakong,
            notifier,
            dispatcher,
            chat_limiter,
            checkout_limiter,
            signing,
            flow_service,
            flow_store,
            metrics,
        })
    }

    /// Get a reference to the configuration
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Run the HTTP server
    #[instrument(skip(self))]
    pub async fn run(self) -> AppResult<()> {
        let addr = self.config.server_address();
        let addr: std::net::SocketAddr = addr
            .parse()
            .map_err(|e| AppError::Config(format!("Invalid server address: {}", e)))?;

        // Background loops: queue drain and periodic sweeps
        self.dispatcher.clone().start();
        self.chat_limiter.clone().start();
        self.checkout_limiter.clone().start();
        self.signing.clone().start();

        let routes = self.create_routes();

        info!("Starting HTTP server (reverse proxy mode)");
        warp::serve(routes).run(addr).await;

        Ok(())
    }

    /// Create the application routes
    fn create_routes(self) -> impl Filter<Extract = impl Reply, Error = std::convert::Infallible> + Clone {
        let checkout_context = Arc::new(CheckoutContext {
            flow: self.flow_service.clone(),
            signing: self.signing.clone(),
            limiter: self.checkout_limiter.clone(),
            metrics: self.metrics.clone(),
            signing_enabled: self.config.security.signing_enabled,
        });

        RouteBuilder::build_routes(
            self.config,
            self.khqr,
            self.bakong,
            self.notifier,
            checkout_context,
            self.flow_store,
            self.metrics,
        )
    }
}
