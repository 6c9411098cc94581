//! Metrics routes

use crate::infrastructure::http::handlers::handle_metrics;
use crate::shared::metrics::Metrics;
use std::sync::Arc;
use warp::Filter;

pub struct MetricsRoutes;

impl MetricsRoutes {
    pub fn create_routes(
        metrics: Arc<Metrics>,
    ) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
        warp::path("metrics")
            .and(warp::get())
            .and(Self::with_metrics(metrics))
            .and_then(handle_metrics)
    }

    fn with_metrics(
        metrics: Arc<Metrics>,
    ) -> impl Filter<Extract = (Arc<Metrics>,), Error = std::convert::Infallible> + Clone {
        warp::any().map(move || metrics.clone())
    }
}
