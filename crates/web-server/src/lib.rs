// In crates/web-server/src/lib.rs

use axum::{
    Router,
    extract::{Path, Query, State},
    response::Json,
    routing::{get, post},
};
use app_config::types::ServerSettings;
use database::{Alert, Db, Trade};
use engine::SharedEngine;
use serde_json::json;
use task_queue::{ALERT_QUEUE, Task, TaskQueue};
use tokio::net::TcpListener;
use uuid::Uuid;

pub mod error;
pub mod types;

// Re-export our custom error type for convenience.
pub use error::{Error, Result};
use types::{ListParams, QueuedResponse, RefreshResponse};

/// The shared application state that is available to all API handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Db,
    pub queue: TaskQueue,
    pub engine: SharedEngine,
}

/// Creates the main application router with all routes and middleware.
pub fn create_router(app_state: AppState) -> Router {
    // In a production environment, restrict the origin to the actual frontend domain.
    let cors = tower_http::cors::CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods(tower_http::cors::Any)
        .allow_headers(tower_http::cors::Any);

    let api_router = Router::new()
        .route("/alerts", get(get_alerts_handler))
        .route("/alerts/{alertId}/process", post(process_alert_handler))
        .route("/trades", get(get_trades_handler))
        .route("/trades/{tradeId}/refresh", post(refresh_trade_handler));

    Router::new()
        .route("/health", get(health_check_handler))
        .nest("/api", api_router)
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .layer(cors)
        .with_state(app_state)
}

/// A simple health check handler.
async fn health_check_handler() -> &'static str {
    "OK"
}

/// Handler for `GET /api/alerts`. Most recent alerts first.
async fn get_alerts_handler(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<Alert>>> {
    let alerts = state.db.recent_alerts(params.limit).await?;
    Ok(Json(alerts))
}

/// Handler for `POST /api/alerts/:alertId/process`.
///
/// Queues the alert for asynchronous processing rather than processing it
/// inline, so a slow broker cannot stall the HTTP worker.
async fn process_alert_handler(
    State(state): State<AppState>,
    Path(alert_id): Path<Uuid>,
) -> Result<Json<QueuedResponse>> {
    if state.db.get_alert(alert_id).await?.is_none() {
        return Err(Error::NotFound(format!("Alert {alert_id} not found")));
    }

    let task = Task::new(json!({ "alert_id": alert_id.to_string() }), 1);
    state.queue.enqueue(ALERT_QUEUE, &task).await?;
    tracing::info!(%alert_id, task_id = %task.id, "Alert queued for processing");

    Ok(Json(QueuedResponse {
        queued: true,
        task_id: task.id,
    }))
}

/// Handler for `GET /api/trades`. Most recent trades first.
async fn get_trades_handler(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<Trade>>> {
    let trades = state.db.recent_trades(params.limit).await?;
    Ok(Json(trades))
}

/// Handler for `POST /api/trades/:tradeId/refresh`.
///
/// Reconciles one trade with the broker on demand.
async fn refresh_trade_handler(
    State(state): State<AppState>,
    Path(trade_id): Path<Uuid>,
) -> Result<Json<RefreshResponse>> {
    if state.db.get_trade(trade_id).await?.is_none() {
        return Err(Error::NotFound(format!("Trade {trade_id} not found")));
    }

    let updated = state.engine.update_trade_status(trade_id).await?;
    Ok(Json(RefreshResponse { updated }))
}

/// The main entry point for running the web server.
///
/// Sets up the TCP listener and serves the application router until the
/// process is terminated.
pub async fn run(settings: ServerSettings, app_state: AppState) -> Result<()> {
    let app = create_router(app_state);

    let address = format!("{}:{}", settings.host, settings.port);
    tracing::info!("Web server listening on {}", address);

    let listener = TcpListener::bind(&address)
        .await
        .map_err(Error::ServerBindError)?;

    axum::serve(listener, app.into_make_service())
        .await
        .map_err(Error::ServerBindError)?;

    Ok(())
}
