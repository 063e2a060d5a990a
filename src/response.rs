use serde::Serialize;
use serde_json::json;
use std::collections::BTreeMap;

use crate::counter::VisitRecord;
use crate::validation::ValidationError;

pub const PREFLIGHT_METHOD: &str = "OPTIONS";
pub const MUTATION_METHOD: &str = "POST";

/// Message attached to every validation rejection.
pub const BLOCKED_MESSAGE: &str = "Request blocked by security validation";

/// Transport-neutral response: status, flat headers and a JSON-encoded body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse {
    pub status_code: u16,
    pub headers: BTreeMap<String, String>,
    pub body: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitResponse<'a> {
    pub origin: &'a str,
    pub period: &'a str,
    pub visit_count: u64,
    /// Alias of `visitCount` kept for older clients.
    pub count: u64,
    pub last_visit_date: Option<&'a str>,
    pub timestamp: &'a str,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse<'a> {
    pub status: &'static str,
    pub timestamp: &'a str,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse<'a> {
    pub error: &'a str,
    pub message: &'a str,
}

/// Headers attached to every response.
pub fn default_headers() -> BTreeMap<String, String> {
    [
        ("Access-Control-Allow-Origin", "*".to_string()),
        ("Access-Control-Allow-Headers", "Content-Type".to_string()),
        (
            "Access-Control-Allow-Methods",
            format!("{}, {}", PREFLIGHT_METHOD, MUTATION_METHOD),
        ),
        ("Content-Type", "application/json".to_string()),
    ]
    .into_iter()
    .map(|(name, value)| (name.to_string(), value))
    .collect()
}

impl ApiResponse {
    fn new(status_code: u16, body: String) -> Self {
        Self {
            status_code,
            headers: default_headers(),
            body,
        }
    }

    fn json<T: Serialize>(status_code: u16, payload: &T) -> Self {
        match serde_json::to_string(payload) {
            Ok(body) => Self::new(status_code, body),
            Err(e) => Self::internal_error(&e.to_string()),
        }
    }

    pub fn preflight() -> Self {
        Self::new(200, String::new())
    }

    pub fn health(timestamp: &str) -> Self {
        Self::json(
            200,
            &HealthResponse {
                status: "healthy",
                timestamp,
            },
        )
    }

    pub fn rejected(err: &ValidationError) -> Self {
        Self::json(
            err.status(),
            &ErrorResponse {
                error: &err.to_string(),
                message: BLOCKED_MESSAGE,
            },
        )
    }

    pub fn visit(record: &VisitRecord, timestamp: &str) -> Self {
        Self::json(
            200,
            &VisitResponse {
                origin: &record.origin,
                period: &record.period,
                visit_count: record.visit_count,
                count: record.visit_count,
                last_visit_date: record.last_visit_date.as_deref(),
                timestamp,
            },
        )
    }

    pub fn internal_error(detail: &str) -> Self {
        let body = json!({
            "error": "Internal server error",
            "message": detail,
        });
        Self::new(500, body.to_string())
    }
}
