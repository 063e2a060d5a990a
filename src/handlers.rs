use std::collections::HashMap;
use std::sync::Arc;

use crate::counter::CounterStore;
use crate::error::{Error, Result};
use crate::period::{period_key, timestamp, Clock};
use crate::response::{ApiResponse, PREFLIGHT_METHOD};
use crate::validation::RequestValidator;

pub const HEALTH_PATH: &str = "/health";

/// One invocation, as handed over by whatever hosts the handler.
#[derive(Debug, Clone, Default)]
pub struct InvocationRequest {
    pub method: String,
    pub path: String,
    /// Header names are stored lower-cased.
    pub headers: HashMap<String, String>,
    pub source_ip: String,
}

impl InvocationRequest {
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            headers: HashMap::new(),
            source_ip: "unknown".to_string(),
        }
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    pub fn with_source_ip(mut self, source_ip: impl Into<String>) -> Self {
        self.source_ip = source_ip.into();
        self
    }
}

/// Stateless visit-tracking handler. Only configuration is shared between calls.
#[derive(Clone)]
pub struct VisitHandler {
    validator: Arc<RequestValidator>,
    counter: CounterStore,
    clock: Arc<dyn Clock>,
}

impl VisitHandler {
    pub fn new(validator: Arc<RequestValidator>, counter: CounterStore, clock: Arc<dyn Clock>) -> Self {
        Self {
            validator,
            counter,
            clock,
        }
    }

    /// Maps any request to a response; never fails.
    pub async fn handle(&self, request: &InvocationRequest) -> ApiResponse {
        if request.method.eq_ignore_ascii_case(PREFLIGHT_METHOD) {
            return ApiResponse::preflight();
        }

        if request.path == HEALTH_PATH {
            return ApiResponse::health(&timestamp(&self.clock.now()));
        }

        match self.track_visit(request).await {
            Ok(response) => response,
            Err(Error::Validation(err)) => ApiResponse::rejected(&err),
            Err(err) => {
                tracing::error!(
                    method = %request.method,
                    path = %request.path,
                    source_ip = %request.source_ip,
                    error = %err,
                    "Visit tracking failed"
                );
                ApiResponse::internal_error(&err.to_string())
            }
        }
    }

    async fn track_visit(&self, request: &InvocationRequest) -> Result<ApiResponse> {
        let accepted = self.validator.validate(&request.headers, &request.source_ip)?;

        let now = self.clock.now();
        let period = period_key(&now);

        let mut record = self.counter.get(&accepted.origin, &period).await?;
        record.record_visit(&now);
        self.counter.put(&record).await?;

        tracing::info!(
            origin = %record.origin,
            period = %record.period,
            visit_count = record.visit_count,
            "Visit recorded"
        );

        Ok(ApiResponse::visit(&record, &timestamp(&self.clock.now())))
    }
}
