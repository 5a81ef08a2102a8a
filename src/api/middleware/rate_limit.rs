//! Per-client rate limiting over the injected [`RateLimiter`].

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderMap, HeaderName, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use std::net::{IpAddr, SocketAddr};

use crate::api::AppState;
use crate::config::{
    RATE_LIMIT_AUTH_REQUESTS, RATE_LIMIT_AUTH_WINDOW_SECONDS, RATE_LIMIT_REQUESTS,
    RATE_LIMIT_WINDOW_SECONDS,
};

const LIMIT_HEADER: HeaderName = HeaderName::from_static("x-ratelimit-limit");
const REMAINING_HEADER: HeaderName = HeaderName::from_static("x-ratelimit-remaining");

/// Rate limit error response
#[derive(Debug)]
pub struct RateLimitError {
    pub limit: u64,
    pub retry_after: u64,
}

impl IntoResponse for RateLimitError {
    fn into_response(self) -> Response {
        let mut headers = HeaderMap::new();
        headers.insert(axum::http::header::RETRY_AFTER, HeaderValue::from(self.retry_after));
        headers.insert(LIMIT_HEADER, HeaderValue::from(self.limit));
        headers.insert(REMAINING_HEADER, HeaderValue::from_static("0"));

        (
            StatusCode::TOO_MANY_REQUESTS,
            headers,
            Json(serde_json::json!({ "error": "Too many requests. Please try again later." })),
        )
            .into_response()
    }
}

/// Client identifier for rate-limit keys.
///
/// Forwarding headers are honoured only when the direct peer is a trusted
/// proxy: the rightmost `X-Forwarded-For` hop that is not itself a trusted
/// proxy, else `X-Real-IP`. Otherwise the peer address is used.
fn client_identifier(request: &Request, trusted_proxies: &[IpAddr]) -> String {
    let Some(peer) = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0.ip())
    else {
        return "unknown".to_string();
    };
    if !trusted_proxies.contains(&peer) {
        return peer.to_string();
    }

    let header = |name: &str| {
        request
            .headers()
            .get(name)
            .and_then(|h| h.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };

    let forwarded = header("x-forwarded-for").and_then(|v| {
        v.rsplit(',')
            .filter_map(|hop| hop.trim().parse::<IpAddr>().ok())
            .find(|ip| !trusted_proxies.contains(ip))
    });
    if let Some(ip) = forwarded {
        return ip.to_string();
    }
    if let Some(ip) = header("x-real-ip").and_then(|v| v.parse::<IpAddr>().ok()) {
        return ip.to_string();
    }
    peer.to_string()
}

async fn enforce(
    state: &AppState,
    scope: &str,
    max: u64,
    window_seconds: u64,
    request: Request,
    next: Next,
) -> Result<Response, RateLimitError> {
    let client = client_identifier(&request, &state.config.trusted_proxies);
    let key = format!("{}:{}", scope, client);
    let rejected = RateLimitError {
        limit: max,
        retry_after: window_seconds,
    };

    // Fail closed: a limiter error denies the request.
    let (count, allowed) = match state.rate_limiter.hit(&key, max, window_seconds).await {
        Ok(result) => result,
        Err(e) => {
            tracing::error!(error = %e, backend = state.rate_limiter.backend(), "Rate limit check failed - denying request");
            return Err(rejected);
        }
    };

    if !allowed {
        tracing::warn!(client = %client, scope, count, "Rate limit exceeded");
        return Err(rejected);
    }

    let mut response = next.run(request).await;
    let headers = response.headers_mut();
    headers.insert(LIMIT_HEADER, HeaderValue::from(max));
    headers.insert(REMAINING_HEADER, HeaderValue::from(max.saturating_sub(count)));
    Ok(response)
}

/// General limit: RATE_LIMIT_REQUESTS per RATE_LIMIT_WINDOW_SECONDS.
pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, RateLimitError> {
    enforce(
        &state,
        "general",
        RATE_LIMIT_REQUESTS,
        RATE_LIMIT_WINDOW_SECONDS,
        request,
        next,
    )
    .await
}

/// Stricter limit for the public authentication endpoints.
pub async fn rate_limit_auth_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, RateLimitError> {
    enforce(
        &state,
        "auth",
        RATE_LIMIT_AUTH_REQUESTS,
        RATE_LIMIT_AUTH_WINDOW_SECONDS,
        request,
        next,
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    #[test]
    fn rejection_is_429_with_retry_after() {
        let response = RateLimitError {
            limit: 10,
            retry_after: 60,
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()["retry-after"], "60");
        assert_eq!(response.headers()["x-ratelimit-remaining"], "0");
    }

    fn from_peer(peer: &str, forwarded_for: &str) -> Request {
        let mut request = Request::builder()
            .header("x-forwarded-for", forwarded_for)
            .body(Body::empty())
            .unwrap();
        let addr: SocketAddr = format!("{}:443", peer).parse().unwrap();
        request.extensions_mut().insert(ConnectInfo(addr));
        request
    }

    #[test]
    fn forwarded_for_is_ignored_from_untrusted_peers() {
        let trusted: Vec<IpAddr> = vec!["10.0.0.1".parse().unwrap()];
        let spoofed = from_peer("198.51.100.9", "203.0.113.7");
        assert_eq!(client_identifier(&spoofed, &trusted), "198.51.100.9");
        assert_eq!(client_identifier(&spoofed, &[]), "198.51.100.9");
    }

    #[test]
    fn trusted_proxy_reports_the_rightmost_untrusted_hop() {
        let trusted: Vec<IpAddr> = vec!["10.0.0.1".parse().unwrap(), "10.0.0.2".parse().unwrap()];
        // The client may prepend anything; only hops appended by our proxies count.
        let request = from_peer("10.0.0.1", "1.1.1.1, 203.0.113.7, 10.0.0.2");
        assert_eq!(client_identifier(&request, &trusted), "203.0.113.7");

        let bare = Request::builder().body(Body::empty()).unwrap();
        assert_eq!(client_identifier(&bare, &trusted), "unknown");
    }
}
