//! Proxy endpoint routes

use crate::config::AppConfig;
use crate::infrastructure::adapters::{BakongStatusAdapter, KhqrProviderAdapter};
use crate::infrastructure::http::handlers::{handle_khqr_proxy, handle_verify_proxy};
use crate::middleware::cors;
use crate::shared::metrics::Metrics;
use std::sync::Arc;
use warp::Filter;

pub struct ProxyRoutes;

impl ProxyRoutes {
    pub fn create_routes(
        config: AppConfig,
        khqr: Arc<KhqrProviderAdapter>,
        bakong: Arc<BakongStatusAdapter>,
        metrics: Arc<Metrics>,
    ) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
        let khqr_post = warp::path("api")
            .and(warp::path("khqr"))
            .and(warp::post())
            .and(warp::body::content_length_limit(
                config.server.max_request_size as u64,
            ))
            .and(warp::body::bytes())
            .and(Self::with_khqr(khqr))
            .and(Self::with_metrics(metrics.clone()))
            .and_then(handle_khqr_proxy);

        let khqr_preflight = warp::path("api")
            .and(warp::path("khqr"))
            .and(warp::options())
            .map(|| cors::preflight_reply(cors::PROXY_ALLOW_HEADERS));

        let verify_post = warp::path("api")
            .and(warp::path("verify-payment"))
            .and(warp::post())
            .and(warp::body::content_length_limit(
                config.server.max_request_size as u64,
            ))
            .and(warp::body::bytes())
            .and(Self::with_bakong(bakong))
            .and(Self::with_metrics(metrics))
            .and_then(handle_verify_proxy);

        let verify_preflight = warp::path("api")
            .and(warp::path("verify-payment"))
            .and(warp::options())
            .map(|| cors::preflight_reply(cors::PROXY_ALLOW_HEADERS));

        khqr_post
            .or(khqr_preflight)
            .or(verify_post)
            .or(verify_preflight)
    }

    fn with_khqr(
        khqr: Arc<KhqrProviderAdapter>,
    ) -> impl Filter<Extract = (Arc<KhqrProviderAdapter>,), Error = std::convert::Infallible> + Clone
    {
        warp::any().map(move || khqr.clone())
    }

    fn with_bakong(
        bakong: Arc<BakongStatusAdapter>,
    ) -> impl Filter<Extract = (Arc<BakongStatusAdapter>,), Error = std::convert::Infallible> + Clone
    {
        warp::any().map(move || bakong.clone())
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

    fn routes() -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
        let config = AppConfig::default();
        let config_arc = Arc::new(config.clone());
        let khqr = Arc::new(KhqrProviderAdapter::new(config_arc.clone()).unwrap());
        let bakong = Arc::new(BakongStatusAdapter::new(config_arc).unwrap());
        ProxyRoutes::create_routes(config, khqr, bakong, Arc::new(Metrics::new()))
    }

    #[tokio::test]
    async fn test_khqr_preflight() {
        let res = warp::test::request()
            .method("OPTIONS")
            .path("/api/khqr")
            .reply(&routes())
            .await;

        assert_eq!(res.status(), warp::http::StatusCode::OK);
        assert_eq!(
            res.headers().get("access-control-allow-methods").unwrap(),
            "POST, OPTIONS"
        );
        assert_eq!(
            res.headers().get("access-control-allow-origin").unwrap(),
            "*"
        );
    }

    #[tokio::test]
    async fn test_verify_preflight() {
        let res = warp::test::request()
            .method("OPTIONS")
            .path("/api/verify-payment")
            .reply(&routes())
            .await;

        assert_eq!(res.status(), warp::http::StatusCode::OK);
        assert_eq!(
            res.headers().get("access-control-allow-headers").unwrap(),
            "Content-Type"
        );
    }
}
