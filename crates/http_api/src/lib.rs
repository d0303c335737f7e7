//! HTTP gateway server.
//!
//! Built on axum; exposes
//! - `GET /` reporting the configured project
//! - `POST /pipeline/process` fanning a batch out to Pub/Sub and BigQuery

pub mod error;
pub mod handlers;
pub mod types;

use std::any::Any;
use std::future::Future;
use std::sync::Arc;

use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use contracts::{BulkInserter, MessagePublisher};
use ingestion::IngestCoordinator;
use tokio::net::TcpListener;
use tower_http::catch_panic::CatchPanicLayer;
use tracing::{error, info};

pub use error::{ApiError, Result};
pub use types::{ErrorResponse, ProcessResponse, RootResponse};

use crate::handlers::{process_handler, root_handler};

/// Shared handler state.
pub struct ApiState<P, I> {
    coordinator: Arc<IngestCoordinator<P, I>>,
    project_id: Arc<str>,
}

impl<P, I> Clone for ApiState<P, I> {
    fn clone(&self) -> Self {
        Self {
            coordinator: self.coordinator.clone(),
            project_id: self.project_id.clone(),
        }
    }
}

/// HTTP server wrapping one ingest coordinator.
pub struct GatewayServer<P, I> {
    state: ApiState<P, I>,
}

impl<P, I> GatewayServer<P, I>
where
    P: MessagePublisher + Send + Sync + 'static,
    I: BulkInserter + Send + Sync + 'static,
{
    pub fn new(coordinator: Arc<IngestCoordinator<P, I>>, project_id: &str) -> Self {
        Self {
            state: ApiState {
                coordinator,
                project_id: Arc::from(project_id),
            },
        }
    }

    pub fn into_router(self) -> Router {
        Router::new()
            .route("/", get(root_handler::<P, I>))
            .route("/pipeline/process", post(process_handler::<P, I>))
            .with_state(self.state)
            .layer(CatchPanicLayer::custom(panic_response))
    }

    /// Serve on `listener` until `shutdown` resolves.
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> std::io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        if let Ok(addr) = listener.local_addr() {
            info!(address = %addr, "HTTP gateway listening");
        }
        axum::serve(listener, self.into_router())
            .with_graceful_shutdown(shutdown)
            .await
    }
}

/// A panic inside the coordinator or a collaborator becomes a 500 with a detail body.
fn panic_response(payload: Box<dyn Any + Send + 'static>) -> Response {
    let cause = if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else {
        "unknown panic".to_string()
    };
    error!(cause = %cause, "Request handler panicked");
    ApiError::Internal(cause).into_response()
}
