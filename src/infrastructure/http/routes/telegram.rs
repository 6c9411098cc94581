//! Notification endpoint routes

use crate::application::services::NotificationService;
use crate::infrastructure::http::handlers::handle_telegram_notify;
use crate::middleware::cors;
use crate::shared::metrics::Metrics;
use std::sync::Arc;
use warp::Filter;

pub struct TelegramRoutes;

impl TelegramRoutes {
    pub fn create_routes(
        notifier: Arc<NotificationService>,
        metrics: Arc<Metrics>,
    ) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
        let notify = warp::path("api")
            .and(warp::path("telegram"))
            .and(warp::post())
            .and(warp::header::optional::<String>("authorization"))
            .and(Self::with_notifier(notifier))
            .and(Self::with_metrics(metrics))
            .and_then(handle_telegram_notify);

        let preflight = warp::path("api")
            .and(warp::path("telegram"))
            .and(warp::options())
            .map(|| cors::preflight_reply(cors::AUTH_ALLOW_HEADERS));

        notify.or(preflight)
    }

    fn with_notifier(
        notifier: Arc<NotificationService>,
    ) -> impl Filter<Extract = (Arc<NotificationService>,), Error = std::convert::Infallible> + Clone
    {
        warp::any().map(move || notifier.clone())
    }

    fn with_metrics(
        metrics: Arc<Metrics>,
    ) -> impl Filter<Extract = (Arc<Metrics>,), Error = std::convert::Infallible> + Clone {
        warp::any().map(move || metrics.clone())
    }
}
