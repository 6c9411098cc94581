//! CORS preflight replies for the API endpoints
//!
//! The endpoints answer `OPTIONS` directly with the standard allow-headers;
//! actual cross-origin policy for production deployments is expected to be
//! tightened at the reverse proxy.

/// Allow-headers for the plain proxy endpoints
pub const PROXY_ALLOW_HEADERS: &str = "Content-Type";

/// Allow-headers for endpoints that accept a bearer token
pub const AUTH_ALLOW_HEADERS: &str = "Content-Type, Authorization";

/// Build a 200 preflight reply carrying the CORS headers
pub fn preflight_reply(allow_headers: &'static str) -> impl warp::Reply {
    let reply = warp::reply();
    let reply = warp::reply::with_header(reply, "Access-Control-Allow-Origin", "*");
    let reply = warp::reply::with_header(reply, "Access-Control-Allow-Methods", "POST, OPTIONS");
    warp::reply::with_header(reply, "Access-Control-Allow-Headers", allow_headers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use warp::Reply;

    #[test]
    fn test_preflight_headers_present() {
        let response = preflight_reply(AUTH_ALLOW_HEADERS).into_response();
        assert_eq!(response.status(), warp::http::StatusCode::OK);

        let headers = response.headers();
        assert_eq!(headers.get("access-control-allow-origin").unwrap(), "*");
        assert_eq!(
            headers.get("access-control-allow-methods").unwrap(),
            "POST, OPTIONS"
        );
        assert_eq!(
            headers.get("access-control-allow-headers").unwrap(),
            "Content-Type, Authorization"
        );
    }
}
