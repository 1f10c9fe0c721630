// HTTP routes configuration

use super::handlers::{
    analyze_handler, create_session_handler, delete_session_handler, health_handler,
    quiz_guess_handler, quiz_round_handler, reset_handler, session_state_handler, tile_handler,
    view_handler,
};
use super::middleware;
use crate::config::AppConfig;
use crate::error::Result;
use crate::gemini::GeminiClient;
use crate::geo::GeoClient;
use crate::session::DashboardState;
use axum::{
    routing::{get, post},
    Router,
};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

/// In-memory session store. Nothing here survives the process; every record
/// is request- and view-scoped.
pub type SessionStore = Arc<Mutex<HashMap<Uuid, DashboardState>>>;

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub gemini: Arc<GeminiClient>,
    pub geo: Arc<GeoClient>,
    pub sessions: SessionStore,
}

pub fn create_router(config: AppConfig, gemini: GeminiClient, geo: GeoClient) -> Result<Router> {
    let state = AppState {
        config,
        gemini: Arc::new(gemini),
        geo: Arc::new(geo),
        sessions: Arc::new(Mutex::new(HashMap::new())),
    };

    Ok(create_router_with_state(state))
}

/// Build the router over an existing `AppState`, session store included.
pub fn create_router_with_state(state: AppState) -> Router {
    let (set_request_id, propagate_request_id) = middleware::request_id_layers();

    Router::new()
        .route("/health", get(health_handler))
        .route("/v1/sessions", post(create_session_handler))
        .route(
            "/v1/sessions/:id",
            get(session_state_handler).delete(delete_session_handler),
        )
        .route("/v1/sessions/:id/view", post(view_handler))
        .route("/v1/sessions/:id/analyze", post(analyze_handler))
        .route("/v1/sessions/:id/reset", post(reset_handler))
        .route("/v1/sessions/:id/quiz/round", post(quiz_round_handler))
        .route("/v1/sessions/:id/quiz/guess", post(quiz_guess_handler))
        .route("/v1/tiles/:z/:x/:y", get(tile_handler))
        .layer(middleware::upload_body_limit())
        .layer(middleware::cors())
        .layer(TraceLayer::new_for_http())
        .layer(propagate_request_id)
        .layer(set_request_id)
        .with_state(state)
}
