//! Global request rate limiting layer
//!
//! A coarse process-wide limiter applied in front of every route. The
//! per-key fixed-window limiter with escalation lives in
//! `application::services::rate_limit`; this layer only caps total request
//! throughput.

use crate::config::AppConfig;
use crate::shared::error::AppError;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use std::num::NonZeroU32;
use std::sync::Arc;
use warp::filters::BoxedFilter;
use warp::Filter;

/// Create the global rate limiting layer based on configuration
pub fn create_rate_limit_layer(config: &AppConfig) -> BoxedFilter<()> {
    let limiter = if config.rate_limit.enabled {
        Some(Arc::new(RateLimiter::direct(Quota::per_minute(
            NonZeroU32::new(config.rate_limit.requests_per_minute).unwrap(),
        ))))
    } else {
        None
    };

    warp::any()
        .map(move || limiter.clone())
        .and_then(rate_limit_check)
        .untuple_one()
        .boxed()
}

async fn rate_limit_check(
    limiter: Option<Arc<DefaultDirectRateLimiter>>,
) -> Result<(), warp::reject::Rejection> {
    if let Some(limiter) = limiter {
        if limiter.check().is_err() {
            return Err(warp::reject::custom(AppError::RateLimit));
        }
    }
    Ok(())
}
