use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;
use itertools::Itertools;
use std::time::Instant;

use crate::logic::parse_query;

/// Query keys whose values are replaced before logging.
const SENSITIVE_KEYS: [&str; 6] = [
    "token",
    "auth",
    "password",
    "apikey",
    "api_key",
    "authorization",
];

/// Emit one access line per request: method, path, redacted query, status
/// and duration.
pub async fn log_requests(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let query = request.uri().query().map(str::to_string);
    let start = Instant::now();

    let response = next.run(request).await;

    let duration_ms = start.elapsed().as_millis();
    log::info!(
        "\"{} {}{}\" {} {}ms",
        method,
        path,
        redacted_query(query.as_deref()),
        response.status().as_u16(),
        duration_ms
    );
    response
}

fn redacted_query(raw: Option<&str>) -> String {
    let pairs = parse_query(raw);
    if pairs.is_empty() {
        return String::new();
    }
    let rendered = pairs
        .iter()
        .map(|(key, value)| {
            if SENSITIVE_KEYS.contains(&key.as_str()) {
                format!("{}=***", key)
            } else {
                format!("{}={}", key, value)
            }
        })
        .join("&");
    format!("?{}", rendered)
}
