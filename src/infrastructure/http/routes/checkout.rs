//! Checkout flow routes

use crate::application::services::FlowStore;
use crate::infrastructure::http::handlers::{
    handle_checkout, handle_flow_status, CheckoutContext,
};
use crate::shared::metrics::Metrics;
use std::sync::Arc;
use warp::Filter;

pub struct CheckoutRoutes;

impl CheckoutRoutes {
    pub fn create_routes(
        max_request_size: u64,
        context: Arc<CheckoutContext>,
        store: Arc<FlowStore>,
        metrics: Arc<Metrics>,
    ) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
        let checkout = warp::path("api")
            .and(warp::path("checkout"))
            .and(warp::path::end())
            .and(warp::post())
            .and(warp::body::content_length_limit(max_request_size))
            .and(warp::body::json())
            .and(warp::header::optional::<String>("x-signature"))
            .and(warp::header::optional::<String>("x-timestamp"))
            .and(warp::header::optional::<String>("x-nonce"))
            .and(warp::header::optional::<String>("x-forwarded-for"))
            .and(Self::with_context(context))
            .and_then(handle_checkout);

        let status = warp::path("api")
            .and(warp::path("checkout"))
            .and(warp::path::param::<String>())
            .and(warp::get())
            .and(Self::with_store(store))
            .and(Self::with_metrics(metrics))
            .and_then(handle_flow_status);

        checkout.or(status)
    }

    fn with_context(
        context: Arc<CheckoutContext>,
    ) -> impl Filter<Extract = (Arc<CheckoutContext>,), Error = std::convert::Infallible> + Clone
    {
        warp::any().map(move || context.clone())
    }

    fn with_store(
        store: Arc<FlowStore>,
    ) -> impl Filter<Extract = (Arc<FlowStore>,), Error = std::convert::Infallible> + Clone {
        warp::any().map(move || store.clone())
    }

    fn with_metrics(
        metrics: Arc<Metrics>,
    ) -> impl Filter<Extract = (Arc<Metrics>,), Error = std::convert::Infallible> + Clone {
        warp::any().map(move || metrics.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::services::dispatcher::{DispatcherService, MessageSender};
    use crate::application::services::flow::{
        FlowService, PaymentStatusClient, QrProvider, QrRequest, QrSession,
    };
    use crate::application::services::{
        NotificationService, PaymentTokenService, RateLimiterService, SigningService,
    };
    use crate::config::AppConfig;
    use crate::domain::flow::PollOutcome;
    use crate::shared::error::AppResult;
    use async_trait::async_trait;
    use std::time::Duration;

    struct StaticQr;

    #[async_trait]
    impl QrProvider for StaticQr {
        async fn generate(&self, _request: &QrRequest) -> AppResult<QrSession> {
            Ok(QrSession {
                qr_image: "data:image/png;base64,qr".to_string(),
                md5: "0123456789abcdef0123456789abcdef".to_string(),
            })
        }
    }

    struct NeverPaid;

    #[async_trait]
    impl PaymentStatusClient for NeverPaid {
        async fn check(&self, _md5: &str) -> PollOutcome {
            PollOutcome::NotFound
        }
    }

    struct NoopSender;

    #[async_trait]
    impl MessageSender for NoopSender {
        async fn send(&self, _chat_id: &str, _text: &str) -> AppResult<()> {
            Ok(())
        }
    }

    fn routes() -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
        let config = Arc::new(AppConfig::default());
        let metrics = Arc::new(Metrics::new());
        let chat_limiter = Arc::new(RateLimiterService::new(
            Duration::from_secs(60),
            1000,
            Duration::from_secs(3600),
        ));
        let dispatcher = Arc::new(DispatcherService::new(
            Arc::new(NoopSender),
            chat_limiter,
            3,
            Duration::from_secs(300),
            Duration::from_secs(1),
            "main".to_string(),
            "orders".to_string(),
            metrics.clone(),
        ));
        let tokens = Arc::new(PaymentTokenService::new(config.clone()));
        let notifier = Arc::new(NotificationService::new(tokens.clone(), dispatcher));
        let store = Arc::new(FlowStore::new());
        let flow = Arc::new(FlowService::new(
            config.clone(),
            Arc::new(StaticQr),
            Arc::new(NeverPaid),
            notifier,
            tokens,
            store.clone(),
            metrics.clone(),
        ));
        let context = Arc::new(CheckoutContext {
            flow,
            signing: Arc::new(SigningService::new(&config)),
            limiter: Arc::new(RateLimiterService::new(
                Duration::from_secs(60),
                100,
                Duration::from_secs(3600),
            )),
            metrics: metrics.clone(),
            signing_enabled: false,
        });
        CheckoutRoutes::create_routes(
            config.server.max_request_size as u64,
            context,
            store,
            metrics,
        )
    }

    fn order_body() -> serde_json::Value {
        serde_json::json!({
            "game": "mlbb",
            "userId": "123456789",
            "serverId": "1234",
            "product": {
                "name": "86 Diamonds",
                "code": "86",
                "diamonds": 86,
                "price": 1.24
            }
        })
    }

    #[tokio::test]
    async fn test_checkout_returns_qr() {
        let routes = routes();
        let res = warp::test::request()
            .method("POST")
            .path("/api/checkout")
            .json(&order_body())
            .reply(&routes)
            .await;

        assert_eq!(res.status(), warp::http::StatusCode::OK);
        let body: serde_json::Value = serde_json::from_slice(res.body()).unwrap();
        assert!(body["flowId"].is_string());
        assert!(body["qrImage"].is_string());
        assert_eq!(body["qrCooldown"], 0);
    }

    #[tokio::test]
    async fn test_status_endpoint_roundtrip() {
        let routes = routes();
        let res = warp::test::request()
            .method("POST")
            .path("/api/checkout")
            .json(&order_body())
            .reply(&routes)
            .await;
        let body: serde_json::Value = serde_json::from_slice(res.body()).unwrap();
        let flow_id = body["flowId"].as_str().unwrap().to_string();

        let status = warp::test::request()
            .method("GET")
            .path(&format!("/api/checkout/{}", flow_id))
            .reply(&routes)
            .await;

        assert_eq!(status.status(), warp::http::StatusCode::OK);
        let body: serde_json::Value = serde_json::from_slice(status.body()).unwrap();
        assert!(body["status"].is_string());
        assert!(body["checkCount"].is_number());
    }

    #[tokio::test]
    async fn test_unknown_flow_is_404() {
        let routes = routes();
        let res = warp::test::request()
            .method("GET")
            .path("/api/checkout/no-such-flow")
            .reply(&routes)
            .await;
        assert_eq!(res.status(), warp::http::StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_malformed_body_is_400() {
        let routes = routes();
        let res = warp::test::request()
            .method("POST")
            .path("/api/checkout")
            .json(&serde_json::json!({"game": "mlbb"}))
            .reply(&routes)
            .await;
        assert_eq!(res.status(), warp::http::StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_checkout_cooldown_on_second_request() {
        let routes = routes();
        let first = warp::test::request()
            .method("POST")
            .path("/api/checkout")
            .json(&order_body())
            .reply(&routes)
            .await;
        assert_eq!(first.status(), warp::http::StatusCode::OK);

        let second = warp::test::request()
            .method("POST")
            .path("/api/checkout")
            .json(&order_body())
            .reply(&routes)
            .await;
        assert_eq!(second.status(), warp::http::StatusCode::OK);
        let body: serde_json::Value = serde_json::from_slice(second.body()).unwrap();
        assert!(body["flowId"].is_null());
        assert!(body["qrCooldown"].as_u64().unwrap() > 0);
    }
}
