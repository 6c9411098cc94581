//! Route builder module
//!
//! Orchestrates the creation of all application routes behind the global
//! rate limiting layer and the uniform rejection handler.

use crate::application::services::{FlowStore, NotificationService};
use crate::config::AppConfig;
use crate::infrastructure::adapters::{BakongStatusAdapter, KhqrProviderAdapter};
use crate::infrastructure::http::handlers::CheckoutContext;
use crate::infrastructure::http::rejections::handle_rejection;
use crate::infrastructure::http::routes::{
    CheckoutRoutes, HealthRoutes, MetricsRoutes, ProxyRoutes, TelegramRoutes,
};
use crate::middleware::rate_limit::create_rate_limit_layer;
use crate::shared::metrics::Metrics;
use std::sync::Arc;
use warp::Filter;

/// Route builder that orchestrates the creation of all application routes
pub struct RouteBuilder;

impl RouteBuilder {
    /// Build all application routes
    #[allow(clippy::too_many_arguments)]
    pub fn build_routes(
        config: AppConfig,
        khqr: Arc<KhqrProviderAdapter>,
        bakong: Arc<BakongStatusAdapter>,
        notifier: Arc<NotificationService>,
        checkout_context: Arc<CheckoutContext>,
        flow_store: Arc<FlowStore>,
        metrics: Arc<Metrics>,
    ) -> impl Filter<Extract = impl warp::Reply, Error = std::convert::Infallible> + Clone {
        let rate_limit_layer = create_rate_limit_layer(&config);

        let proxy_routes = ProxyRoutes::create_routes(
            config.clone(),
            khqr,
            bakong,
            metrics.clone(),
        );

        let telegram_routes = TelegramRoutes::create_routes(notifier, metrics.clone());

        let checkout_routes = CheckoutRoutes::create_routes(
            config.server.max_request_size as u64,
            checkout_context,
            flow_store,
            metrics.clone(),
        );

        let health_routes = HealthRoutes::create_routes();

        let metrics_routes = MetricsRoutes::create_routes(metrics);

        rate_limit_layer
            .and(
                proxy_routes
                    .or(telegram_routes)
                    .or(checkout_routes)
                    .or(health_routes)
                    .or(metrics_routes),
            )
            .recover(handle_rejection)
    }
}
