use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum::response::Response;
use axum::{middleware, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::counter::CounterStore;
use crate::error::Error;
use crate::handlers::{InvocationRequest, VisitHandler};
use crate::middleware::{get_client_ip, logging_middleware};
use crate::period::SystemClock;
use crate::response::ApiResponse;
use crate::store;
use crate::validation::RequestValidator;

pub struct Server {
    app: Router,
    bind_address: String,
}

impl Server {
    /// Builds the validator, store and handler described by `config`.
    pub async fn from_config(config: &Config) -> Result<Self, Error> {
        let validator = RequestValidator::new(config.allowed_origins.clone(), config.bot_patterns())?;
        let store = store::from_config(config).await?;
        let handler = VisitHandler::new(
            Arc::new(validator),
            CounterStore::new(store),
            Arc::new(SystemClock),
        );

        Ok(Self::new(handler, config.bind_address.clone()))
    }

    pub fn new(handler: VisitHandler, bind_address: String) -> Self {
        Self {
            app: create_app(handler),
            bind_address,
        }
    }

    pub async fn run(self) -> Result<(), Error> {
        let listener = tokio::net::TcpListener::bind(&self.bind_address).await?;

        tracing::info!("Visit counter listening on {}", self.bind_address);

        axum::serve(
            listener,
            self.app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown_signal())
        .await?;

        Ok(())
    }
}

/// Every method and path goes to the same dispatcher.
pub fn create_app(handler: VisitHandler) -> Router {
    Router::new()
        .fallback(dispatch)
        .with_state(handler)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(middleware::from_fn(logging_middleware)),
        )
}

async fn dispatch(State(handler): State<VisitHandler>, request: Request) -> Response {
    let invocation = invocation_from_http(&request);
    let response = handler.handle(&invocation).await;
    into_http_response(response)
}

fn invocation_from_http(request: &Request) -> InvocationRequest {
    let mut invocation = InvocationRequest::new(request.method().as_str(), request.uri().path())
        .with_source_ip(get_client_ip(request));

    for (name, value) in request.headers() {
        if invocation.headers.contains_key(name.as_str()) {
            continue;
        }
        let value = match value.to_str() {
            Ok(value) => value.to_string(),
            Err(_) => {
                tracing::debug!(header = %name, "Header value is not visible ASCII, decoding lossily");
                String::from_utf8_lossy(value.as_bytes()).into_owned()
            }
        };
        invocation = invocation.with_header(name.as_str(), value);
    }

    invocation
}

fn into_http_response(api: ApiResponse) -> Response {
    let mut response = Response::new(Body::from(api.body));
    *response.status_mut() =
        StatusCode::from_u16(api.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    for (name, value) in &api.headers {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                response.headers_mut().insert(name, value);
            }
            _ => tracing::warn!(header = %name, "Dropping invalid response header"),
        }
    }

    response
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received terminate signal, initiating graceful shutdown");
        },
    }
}
