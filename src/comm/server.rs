use crate::comm::config::CommConfig;
use crate::comm::error::{CommError, CommInitError, Result};
use crate::comm::types::{CommandBody, WorkflowBody, parse_body};
use crate::executor::{CommandKind, CommandRequest, ExecutionResult, ExecutionService, ExecutorError};
use axum::body::Bytes;
use axum::extract::State;
use axum::response::Html;
use axum::routing::{get, post};
use axum::{Json, Router};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<CommConfig>,
    pub service: Arc<ExecutionService>,
}

/// Build the HTTP router with its middleware stack
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(serve_index))
        .route("/api/resources", get(serve_resources))
        .route("/api/run-workflow", post(run_workflow))
        .route("/api/install-tool", post(install_tool))
        .route("/api/run-command", post(run_command))
        .layer(CatchPanicLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Comm server - serves the UI and the execution API over HTTP
pub struct Comm {
    listener: TcpListener,
    router: Router,
}

impl Comm {
    /// Bind the listener and build the router
    pub async fn new(
        config: CommConfig,
        service: Arc<ExecutionService>,
    ) -> std::result::Result<Comm, CommInitError> {
        let addr = config.bind_addr()?;
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| CommInitError::BindFailed(format!("{addr}: {e}")))?;

        if let Ok(local) = listener.local_addr() {
            info!(addr = %local, "Comm listening");
        }

        let state = AppState {
            config: Arc::new(config),
            service,
        };

        Ok(Self {
            listener,
            router: router(state),
        })
    }

    /// Get local socket address
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Serve until `shutdown` resolves
    pub async fn run<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(CommError::Serve)
    }
}

async fn serve_index(State(state): State<AppState>) -> Result<Html<String>> {
    let path = state.config.index_file();
    let content = tokio::fs::read_to_string(&path)
        .await
        .map_err(CommError::Template)?;
    debug!(path = %path.display(), bytes = content.len(), "served index");
    Ok(Html(content))
}

async fn serve_resources(State(state): State<AppState>) -> Result<Json<serde_json::Value>> {
    let raw = tokio::fs::read(&state.config.resources_file)
        .await
        .map_err(CommError::CatalogRead)?;
    let catalog = serde_json::from_slice(&raw).map_err(CommError::CatalogParse)?;
    Ok(Json(catalog))
}

async fn run_workflow(State(state): State<AppState>, body: Bytes) -> Result<Json<ExecutionResult>> {
    let body: WorkflowBody = parse_body(&body)?;
    Ok(Json(dispatch(&state, body.into_request()).await))
}

async fn install_tool(State(state): State<AppState>, body: Bytes) -> Result<Json<ExecutionResult>> {
    let body: CommandBody = parse_body(&body)?;
    Ok(Json(dispatch(&state, body.into_request(CommandKind::ToolInstall)).await))
}

async fn run_command(State(state): State<AppState>, body: Bytes) -> Result<Json<ExecutionResult>> {
    let body: CommandBody = parse_body(&body)?;
    Ok(Json(dispatch(&state, body.into_request(CommandKind::AdHocRun)).await))
}

async fn dispatch(
    state: &AppState,
    request: std::result::Result<CommandRequest, ExecutorError>,
) -> ExecutionResult {
    match request {
        Ok(request) => state.service.execute(&request).await,
        Err(e) => {
            warn!(error = %e, "rejected malformed request");
            ExecutionResult::failure(e.to_string())
        }
    }
}
