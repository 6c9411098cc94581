//! Health routes

use crate::infrastructure::http::handlers::handle_health;
use warp::Filter;

pub struct HealthRoutes;

impl HealthRoutes {
    pub fn create_routes(
    ) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
        warp::path("health").and(warp::get()).and_then(handle_health)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_health_endpoint() {
        let routes = HealthRoutes::create_routes();
        let res = warp::test::request()
            .method("GET")
            .path("/health")
            .reply(&routes)
            .await;

        assert_eq!(res.status(), warp::http::StatusCode::OK);
        let body: serde_json::Value = serde_json::from_slice(res.body()).unwrap();
        assert_eq!(body["status"], "ok");
        assert!(body["version"].is_string());
    }
}
