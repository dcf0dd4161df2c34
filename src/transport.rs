/// HTTP transport
///
/// Serves a built engine over axum: `GET /graphql` returns the schema text as
/// a JSON string, `POST /graphql` runs a query and returns the execution
/// result. An optional guard over the request headers rejects requests with
/// 403 before any planning happens.

use crate::engine::{AsyncEngine, ExecutionResult, SyncEngine};
use crate::error::{Result, TablegraphError};
use crate::store::{AsyncSession, Session};

use async_trait::async_trait;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

/// Authorization predicate over request headers
pub type Guard = Arc<dyn Fn(&HeaderMap) -> bool + Send + Sync>;

/// An engine paired with the session its queries run against
#[async_trait]
pub trait QueryService: Send + Sync {
    fn schema_text(&self) -> Result<String>;

    async fn execute(
        &self,
        query: String,
        variables: Option<serde_json::Value>,
    ) -> Result<ExecutionResult>;
}

pub struct SyncService {
    engine: Arc<SyncEngine>,
    session: Arc<dyn Session>,
}

impl SyncService {
    pub fn new(engine: Arc<SyncEngine>, session: Arc<dyn Session>) -> Self {
        Self { engine, session }
    }
}

#[async_trait]
impl QueryService for SyncService {
    fn schema_text(&self) -> Result<String> {
        self.engine.get_schema().map(str::to_string)
    }

    async fn execute(
        &self,
        query: String,
        variables: Option<serde_json::Value>,
    ) -> Result<ExecutionResult> {
        let engine = self.engine.clone();
        let session = self.session.clone();
        tokio::task::spawn_blocking(move || engine.execute_query(&query, variables, session))
            .await
            .map_err(|e| TablegraphError::query(format!("Query task failed: {}", e)))?
    }
}

pub struct AsyncService {
    engine: Arc<AsyncEngine>,
    session: Arc<dyn AsyncSession>,
}

impl AsyncService {
    pub fn new(engine: Arc<AsyncEngine>, session: Arc<dyn AsyncSession>) -> Self {
        Self { engine, session }
    }
}

#[async_trait]
impl QueryService for AsyncService {
    fn schema_text(&self) -> Result<String> {
        self.engine.get_schema().map(str::to_string)
    }

    async fn execute(
        &self,
        query: String,
        variables: Option<serde_json::Value>,
    ) -> Result<ExecutionResult> {
        self.engine
            .execute_query(&query, variables, self.session.clone())
            .await
    }
}

/// Body of a query request
#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    pub query: String,
    #[serde(default)]
    pub variables: Option<serde_json::Value>,
}

#[derive(Clone)]
struct AppState {
    service: Arc<dyn QueryService>,
    guard: Option<Guard>,
}

impl AppState {
    fn allowed(&self, headers: &HeaderMap) -> bool {
        self.guard.as_ref().map_or(true, |guard| guard(headers))
    }
}

/// Build the router for a query service
pub fn router(service: Arc<dyn QueryService>, guard: Option<Guard>) -> Router {
    Router::new()
        .route("/graphql", get(schema_handler).post(query_handler))
        .route("/health", get(health_check))
        .with_state(AppState { service, guard })
        .layer(CorsLayer::permissive())
}

/// Bind and serve a router until the process stops
pub async fn serve(app: Router, bind: &str, port: u16) -> Result<()> {
    let addr: SocketAddr = format!("{}:{}", bind, port).parse().map_err(|e| {
        TablegraphError::configuration(format!("Invalid bind address {}:{}: {}", bind, port, e))
    })?;

    let listener = tokio::net::TcpListener::bind(addr).await.map_err(|e| {
        TablegraphError::configuration(format!(
            "Failed to bind to port {}: {}. Port may be in use.",
            port, e
        ))
    })?;

    tracing::info!("GraphQL server listening on http://{}/graphql", addr);
    axum::serve(listener, app).await?;
    Ok(())
}

async fn schema_handler(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if !state.allowed(&headers) {
        return forbidden();
    }
    match state.service.schema_text() {
        Ok(schema) => Json(schema).into_response(),
        Err(e) => failure(e),
    }
}

async fn query_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<QueryRequest>,
) -> Response {
    if !state.allowed(&headers) {
        return forbidden();
    }
    match state.service.execute(request.query, request.variables).await {
        Ok(result) => Json(result).into_response(),
        Err(e) => failure(e),
    }
}

async fn health_check() -> &'static str {
    "OK"
}

fn forbidden() -> Response {
    (StatusCode::FORBIDDEN, "Forbidden").into_response()
}

fn failure(err: TablegraphError) -> Response {
    tracing::warn!("Request failed: {}", err);
    (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()).into_response()
}
