//! Security middleware for the rewards API
//!
//! Layers, outermost first:
//! - security headers on every response
//! - request logging, tagged with a request id and the acting user
//! - per-client rate limiting
//! - API key authentication (public paths exempt)
//! - request body size limit

use axum::{
    Json,
    extract::{ConnectInfo, Request, State},
    http::{HeaderMap, HeaderName, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use dashmap::DashMap;
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::api::identity::USER_ID_HEADER;
use crate::config::RewardsConfig;
use crate::error::AppError;

pub const REQUEST_ID_HEADER: &str = "x-request-id";
const API_KEY_HEADER: &str = "x-api-key";
const RATE_WINDOW: Duration = Duration::from_secs(60);

/// Static headers stamped onto every response
const SECURITY_HEADERS: [(&str, &str); 5] = [
    ("x-frame-options", "DENY"),
    ("x-content-type-options", "nosniff"),
    (
        "strict-transport-security",
        "max-age=31536000; includeSubDomains",
    ),
    ("referrer-policy", "strict-origin-when-cross-origin"),
    // balances and reward states change underneath any cached copy
    ("cache-control", "no-store"),
];

/// Security configuration for middleware
#[derive(Debug, Clone)]
pub struct SecurityMiddlewareConfig {
    pub enable_auth: bool,
    pub api_keys: Vec<String>,
    /// Requests per minute per client
    pub rate_limit_per_minute: u32,
    /// Maximum request body size in bytes
    pub max_request_size: usize,
    pub log_requests: bool,
    /// Mask client addresses in request logs
    pub sanitize_logs: bool,
    /// Path prefixes that skip authentication
    pub public_paths: Vec<String>,
}

impl Default for SecurityMiddlewareConfig {
    fn default() -> Self {
        Self {
            enable_auth: true,
            api_keys: Vec::new(),
            rate_limit_per_minute: 120,
            max_request_size: 1024 * 1024,
            log_requests: false,
            sanitize_logs: true,
            public_paths: vec!["/health".to_string()],
        }
    }
}

impl SecurityMiddlewareConfig {
    pub fn from_config(config: &RewardsConfig) -> Self {
        Self {
            enable_auth: config.security.enable_auth,
            api_keys: config.security.api_keys.clone(),
            rate_limit_per_minute: config.security.rate_limit_per_minute,
            max_request_size: config.security.max_request_size,
            log_requests: config.logging.log_requests,
            sanitize_logs: config.logging.sanitize_logs,
            ..Self::default()
        }
    }

    fn is_public(&self, path: &str) -> bool {
        self.public_paths.iter().any(|p| path.starts_with(p.as_str()))
    }
}

/// Outcome of counting one request against a client's window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateDecision {
    pub allowed: bool,
    pub limit: u32,
    pub remaining: u32,
    pub reset_after_secs: u64,
}

impl RateDecision {
    fn write_headers(&self, headers: &mut HeaderMap) {
        headers.insert("x-ratelimit-limit", HeaderValue::from(self.limit));
        headers.insert("x-ratelimit-remaining", HeaderValue::from(self.remaining));
        headers.insert("x-ratelimit-reset", HeaderValue::from(self.reset_after_secs));
        if !self.allowed {
            headers.insert("retry-after", HeaderValue::from(self.reset_after_secs));
        }
    }
}

/// Fixed-window request counter keyed by client address
#[derive(Debug)]
pub struct RateLimiter {
    windows: DashMap<String, (u32, Instant)>,
    limit: u32,
    window: Duration,
}

impl RateLimiter {
    pub fn new(requests_per_minute: u32) -> Self {
        Self {
            windows: DashMap::new(),
            limit: requests_per_minute,
            window: RATE_WINDOW,
        }
    }

    pub fn check(&self, client: &str) -> RateDecision {
        let now = Instant::now();
        let mut entry = self.windows.entry(client.to_string()).or_insert((0, now));
        let (count, started) = entry.value_mut();

        if now.duration_since(*started) >= self.window {
            *count = 0;
            *started = now;
        }
        let reset_after_secs = self
            .window
            .saturating_sub(now.duration_since(*started))
            .as_secs();

        let allowed = *count < self.limit;
        if allowed {
            *count += 1;
        }
        RateDecision {
            allowed,
            limit: self.limit,
            remaining: self.limit.saturating_sub(*count),
            reset_after_secs,
        }
    }

    /// Forget clients whose window ended at least one full window ago.
    pub fn cleanup(&self) {
        let now = Instant::now();
        let before = self.windows.len();
        self.windows
            .retain(|_, (_, started)| now.duration_since(*started) < self.window * 2);
        let dropped = before.saturating_sub(self.windows.len());
        if dropped > 0 {
            debug!(dropped, "Rate limiter windows expired");
        }
    }

    pub fn tracked_clients(&self) -> usize {
        self.windows.len()
    }
}

/// Shared state for security middleware
#[derive(Clone)]
pub struct SecurityState {
    pub config: SecurityMiddlewareConfig,
    pub rate_limiter: Arc<RateLimiter>,
}

impl SecurityState {
    pub fn new(config: SecurityMiddlewareConfig) -> Self {
        let rate_limiter = Arc::new(RateLimiter::new(config.rate_limit_per_minute));
        Self {
            config,
            rate_limiter,
        }
    }
}

/// Client address, preferring proxy headers over the socket peer
pub(crate) fn get_client_ip(headers: &HeaderMap, addr: Option<&SocketAddr>) -> String {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next());
    let real_ip = headers.get("x-real-ip").and_then(|v| v.to_str().ok());

    match forwarded.or(real_ip).map(str::trim) {
        Some(ip) if !ip.is_empty() => ip.to_string(),
        _ => addr
            .map(|a| a.ip().to_string())
            .unwrap_or_else(|| "unknown".to_string()),
    }
}

fn peer_addr(request: &Request) -> Option<SocketAddr> {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr)
}

/// Mask the middle of a value for logging
pub fn sanitize_for_log(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}

fn presented_api_key(headers: &HeaderMap) -> Option<&str> {
    if let Some(key) = headers.get(API_KEY_HEADER).and_then(|v| v.to_str().ok()) {
        return Some(key.trim());
    }
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
}

/// API key authentication
pub async fn auth_middleware(
    State(state): State<SecurityState>,
    headers: HeaderMap,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let path = request.uri().path();
    if !state.config.enable_auth || state.config.is_public(path) {
        return Ok(next.run(request).await);
    }

    match presented_api_key(&headers) {
        Some(key) if state.config.api_keys.iter().any(|k| k == key) => {
            debug!(path, key = %sanitize_for_log(key), "API key accepted");
            Ok(next.run(request).await)
        }
        Some(key) => {
            warn!(path, key = %sanitize_for_log(key), "Rejected unknown API key");
            Err(AppError::Unauthorized("Invalid API key".to_string()))
        }
        None => {
            warn!(path, "Request without API key");
            Err(AppError::Unauthorized("API key required".to_string()))
        }
    }
}

/// Per-client rate limiting
pub async fn rate_limit_middleware(
    State(state): State<SecurityState>,
    headers: HeaderMap,
    request: Request,
    next: Next,
) -> Response {
    let client_ip = get_client_ip(&headers, peer_addr(&request).as_ref());
    let decision = state.rate_limiter.check(&client_ip);

    let mut response = if decision.allowed {
        next.run(request).await
    } else {
        warn!(
            client_ip = %sanitize_for_log(&client_ip),
            path = %request.uri().path(),
            "Rate limit exceeded"
        );
        (
            StatusCode::TOO_MANY_REQUESTS,
            Json(json!({
                "error": "rate_limited",
                "message": format!("Too many requests, retry in {}s", decision.reset_after_secs),
            })),
        )
            .into_response()
    };

    decision.write_headers(response.headers_mut());
    response
}

/// Security headers on every response
pub async fn security_headers_middleware(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();
    for (name, value) in SECURITY_HEADERS {
        headers.insert(HeaderName::from_static(name), HeaderValue::from_static(value));
    }
    headers.remove("server");
    response
}

/// Request logging with a per-request id
pub async fn logging_middleware(
    State(state): State<SecurityState>,
    headers: HeaderMap,
    request: Request,
    next: Next,
) -> Response {
    let request_id = headers
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    if !state.config.log_requests {
        let mut response = next.run(request).await;
        if let Ok(value) = HeaderValue::from_str(&request_id) {
            response.headers_mut().insert(REQUEST_ID_HEADER, value);
        }
        return response;
    }

    let start = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let user_id = headers
        .get(USER_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-")
        .to_string();
    let client_ip = get_client_ip(&headers, peer_addr(&request).as_ref());
    let client_ip = if state.config.sanitize_logs {
        sanitize_for_log(&client_ip)
    } else {
        client_ip
    };

    let mut response = next.run(request).await;
    let status = response.status().as_u16();
    let duration_ms = start.elapsed().as_millis() as u64;

    if response.status().is_server_error() {
        error!(%request_id, %method, %path, status, duration_ms, %user_id, %client_ip, "Request failed");
    } else if response.status().is_client_error() {
        warn!(%request_id, %method, %path, status, duration_ms, %user_id, %client_ip, "Request rejected");
    } else {
        info!(%request_id, %method, %path, status, duration_ms, %user_id, %client_ip, "Request completed");
    }

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}

/// Rejects declared bodies above the configured limit
pub async fn body_size_middleware(
    State(state): State<SecurityState>,
    headers: HeaderMap,
    request: Request,
    next: Next,
) -> Response {
    let declared = headers
        .get("content-length")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<usize>().ok());

    if let Some(length) = declared
        && length > state.config.max_request_size
    {
        warn!(
            length,
            max = state.config.max_request_size,
            path = %request.uri().path(),
            "Request body too large"
        );
        return (
            StatusCode::PAYLOAD_TOO_LARGE,
            Json(json!({
                "error": "payload_too_large",
                "message": format!("Request body exceeds {} bytes", state.config.max_request_size),
            })),
        )
            .into_response();
    }

    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limiter_window() {
        let limiter = RateLimiter::new(3);

        for expected_remaining in [2, 1, 0] {
            let decision = limiter.check("10.1.1.1");
            assert!(decision.allowed);
            assert_eq!(decision.remaining, expected_remaining);
        }

        let blocked = limiter.check("10.1.1.1");
        assert!(!blocked.allowed);
        assert_eq!(blocked.remaining, 0);
        assert!(blocked.reset_after_secs <= 60);

        assert!(limiter.check("10.1.1.2").allowed);
        limiter.cleanup();
        assert_eq!(limiter.tracked_clients(), 2);
    }

    #[test]
    fn test_blocked_decision_sets_retry_after() {
        let decision = RateDecision {
            allowed: false,
            limit: 5,
            remaining: 0,
            reset_after_secs: 12,
        };
        let mut headers = HeaderMap::new();
        decision.write_headers(&mut headers);
        assert_eq!(headers["retry-after"], "12");
        assert_eq!(headers["x-ratelimit-limit"], "5");
    }

    #[test]
    fn test_sanitize_for_log() {
        assert_eq!(sanitize_for_log("short"), "*****");
        assert_eq!(sanitize_for_log("abcdefghij"), "abcd...ghij");
    }

    #[test]
    fn test_public_paths() {
        let config = SecurityMiddlewareConfig::default();
        assert!(config.is_public("/health"));
        assert!(!config.is_public("/rewards"));
    }

    #[test]
    fn test_api_key_sources() {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_static("Bearer key-1"));
        assert_eq!(presented_api_key(&headers), Some("key-1"));
        headers.insert(API_KEY_HEADER, HeaderValue::from_static("key-2"));
        assert_eq!(presented_api_key(&headers), Some("key-2"));
        assert_eq!(presented_api_key(&HeaderMap::new()), None);
    }

    #[test]
    fn test_client_ip_prefers_forwarded() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("10.0.0.1, 10.0.0.2"));
        let addr: SocketAddr = "127.0.0.1:9000".parse().unwrap();
        assert_eq!(get_client_ip(&headers, Some(&addr)), "10.0.0.1");
        assert_eq!(get_client_ip(&HeaderMap::new(), Some(&addr)), "127.0.0.1");
        assert_eq!(get_client_ip(&HeaderMap::new(), None), "unknown");
    }
}
