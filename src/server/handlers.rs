// HTTP request handlers

use super::routes::AppState;
use crate::analysis;
use crate::dispatch::{self, Artifact};
use crate::error::{Result, TriageError};
use crate::geo::{GeoLocation, MapView, WORLD_VIEW};
use crate::geo::tiles;
use crate::models::report::AnalysisReport;
use crate::quiz;
use crate::session::{AnalysisOutcome, AnalysisSlot, DashboardState, Event, Mode};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Redirect;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{error, info, warn};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub checks: HashMap<String, HealthCheck>,
    pub timestamp: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthCheck {
    pub status: String,
    pub message: String,
}

pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let mut checks = HashMap::new();
    let mut overall_status = HealthStatus::Healthy;

    // Check the one required credential
    let credential_check = if state.config.gemini.api_key.is_empty() {
        overall_status = HealthStatus::Unhealthy;
        HealthCheck {
            status: "error".to_string(),
            message: "No API key configured".to_string(),
        }
    } else {
        HealthCheck {
            status: "ok".to_string(),
            message: "API key present".to_string(),
        }
    };
    checks.insert("credential".to_string(), credential_check);

    // Check configuration
    let config_check = HealthCheck {
        status: "ok".to_string(),
        message: format!(
            "API base: {}, model: {}",
            state.config.gemini.api_base_url, state.config.gemini.model
        ),
    };
    checks.insert("configuration".to_string(), config_check);

    // Report session count
    let session_check = HealthCheck {
        status: "ok".to_string(),
        message: format!("{} active sessions", state.sessions.lock().len()),
    };
    checks.insert("sessions".to_string(), session_check);

    Json(HealthResponse {
        status: overall_status,
        checks,
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionCreated {
    pub session_id: Uuid,
}

/// Summary of a session's view state, as the dashboard renders it.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub mode: Mode,
    pub quiz_open: bool,
    pub analysis: AnalysisPanel,
    pub score: u32,
    pub rounds_played: u32,
    pub round_outstanding: bool,
}

#[derive(Debug, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum AnalysisPanel {
    Idle,
    InFlight,
    Ready {
        report: AnalysisReport,
        origin: Option<GeoLocation>,
        map: MapView,
    },
    Failed {
        message: String,
    },
}

impl SessionView {
    fn from_state(state: &DashboardState) -> Self {
        let analysis = match &state.analysis {
            AnalysisSlot::Idle => AnalysisPanel::Idle,
            AnalysisSlot::InFlight => AnalysisPanel::InFlight,
            AnalysisSlot::Ready(outcome) => AnalysisPanel::Ready {
                report: outcome.report.clone(),
                origin: outcome.origin.clone(),
                map: outcome
                    .origin
                    .as_ref()
                    .map(MapView::for_location)
                    .unwrap_or(WORLD_VIEW),
            },
            AnalysisSlot::Failed(message) => AnalysisPanel::Failed {
                message: message.to_string(),
            },
        };

        Self {
            mode: state.mode,
            quiz_open: state.quiz_open,
            analysis,
            score: state.quiz.score,
            rounds_played: state.quiz.rounds_played,
            round_outstanding: state.quiz.current.is_some(),
        }
    }
}

pub async fn create_session_handler(State(state): State<AppState>) -> Json<SessionCreated> {
    let session_id = Uuid::new_v4();
    state
        .sessions
        .lock()
        .insert(session_id, DashboardState::default());
    info!("Created session {}", session_id);
    Json(SessionCreated { session_id })
}

pub async fn delete_session_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    state
        .sessions
        .lock()
        .remove(&id)
        .ok_or(TriageError::UnknownSession)?;
    info!("Deleted session {}", id);
    Ok(StatusCode::NO_CONTENT)
}

pub async fn session_state_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>> {
    let sessions = state.sessions.lock();
    let session = sessions.get(&id).ok_or(TriageError::UnknownSession)?;
    Ok(Json(SessionView::from_state(session)))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewRequest {
    pub mode: Option<Mode>,
    pub quiz_open: Option<bool>,
}

/// Apply view intents reported by the dashboard (mode toggle, modal open).
pub async fn view_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<ViewRequest>,
) -> Result<Json<SessionView>> {
    let mut sessions = state.sessions.lock();
    let session = sessions.get_mut(&id).ok_or(TriageError::UnknownSession)?;

    if let Some(mode) = request.mode {
        *session = session.clone().apply(Event::ModeChanged(mode));
    }
    match request.quiz_open {
        Some(true) => *session = session.clone().apply(Event::QuizOpened),
        Some(false) => *session = session.clone().apply(Event::QuizClosed),
        None => {}
    }

    Ok(Json(SessionView::from_state(session)))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeResponse {
    pub report: AnalysisReport,
    pub origin: Option<GeoLocation>,
    pub map: MapView,
}

/// Handler for the analysis flow: dispatch, model call, geolocation, bind.
pub async fn analyze_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(artifact): Json<Artifact>,
) -> Result<Json<AnalyzeResponse>> {
    info!(
        "Received analyze request: file={}, mime={}",
        artifact.file_name, artifact.mime_type
    );

    // The dispatcher decides text vs inline data; nothing submittable is the
    // caller's gate, surfaced as the static missing-input message.
    let payload = dispatch::build_payload(&artifact).ok_or(TriageError::MissingInput)?;

    // Gate duplicate submission while a call is outstanding. The lock is
    // released before the upstream await.
    {
        let mut sessions = state.sessions.lock();
        let session = sessions.get_mut(&id).ok_or(TriageError::UnknownSession)?;
        if session.analysis_in_flight() {
            return Err(TriageError::Busy("analysis"));
        }
        *session = session.clone().apply(Event::AnalysisStarted);
    }

    let report = match analysis::analyze(&state.gemini, payload).await {
        Ok(report) => report,
        Err(e) => {
            error!("Analysis failed: {}", e);
            apply_event(&state, &id, Event::AnalysisFailed)?;
            return Err(e);
        }
    };

    // Geolocation is best-effort; the report renders either way and the map
    // degrades to the default world view.
    let origin = match state.geo.lookup(&report.headers.originating_ip).await {
        Ok(location) => Some(location),
        Err(e) => {
            warn!("Geolocation lookup failed: {}", e);
            None
        }
    };

    let map = origin
        .as_ref()
        .map(MapView::for_location)
        .unwrap_or(WORLD_VIEW);
    let outcome = AnalysisOutcome {
        report: report.clone(),
        origin: origin.clone(),
    };
    apply_event(&state, &id, Event::AnalysisCompleted(Box::new(outcome)))?;

    Ok(Json(AnalyzeResponse {
        report,
        origin,
        map,
    }))
}

pub async fn reset_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    apply_event(&state, &id, Event::Reset)?;
    Ok(StatusCode::NO_CONTENT)
}

/// The scenario as shown to the trainee: ground truth withheld.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioCard {
    pub sender: String,
    pub subject: String,
    pub body: String,
}

pub async fn quiz_round_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ScenarioCard>> {
    {
        let mut sessions = state.sessions.lock();
        let session = sessions.get_mut(&id).ok_or(TriageError::UnknownSession)?;
        if session.quiz_in_flight() {
            return Err(TriageError::Busy("quiz"));
        }
        *session = session.clone().apply(Event::RoundStarted);
    }

    let scenario = match quiz::next_scenario(&state.gemini).await {
        Ok(scenario) => scenario,
        Err(e) => {
            error!("Scenario generation failed: {}", e);
            apply_event(&state, &id, Event::RoundFailed)?;
            return Err(e);
        }
    };

    let card = ScenarioCard {
        sender: scenario.sender.clone(),
        subject: scenario.subject.clone(),
        body: scenario.body.clone(),
    };
    apply_event(&state, &id, Event::RoundReady(scenario))?;

    Ok(Json(card))
}

#[derive(Debug, Deserialize)]
pub struct GuessRequest {
    pub guess: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GuessResponse {
    pub correct: bool,
    pub is_phishing: bool,
    pub explanation: String,
    pub score: u32,
    pub rounds_played: u32,
}

pub async fn quiz_guess_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<GuessRequest>,
) -> Result<Json<GuessResponse>> {
    let mut sessions = state.sessions.lock();
    let session = sessions.get_mut(&id).ok_or(TriageError::UnknownSession)?;

    let (correct, scenario) = session
        .quiz
        .judge(request.guess)
        .ok_or(TriageError::NoOutstandingRound)?;
    *session = session.clone().apply(Event::GuessScored { correct });

    Ok(Json(GuessResponse {
        correct,
        is_phishing: scenario.is_phishing,
        explanation: scenario.explanation,
        score: session.quiz.score,
        rounds_played: session.quiz.rounds_played,
    }))
}

/// Redirect to the rotated tile host so the dashboard never hard-codes the
/// subdomain rotation.
pub async fn tile_handler(Path((z, x, y)): Path<(u32, u32, u32)>) -> Redirect {
    Redirect::temporary(&tiles::tile_url(z, x, y))
}

fn apply_event(state: &AppState, id: &Uuid, event: Event) -> Result<()> {
    let mut sessions = state.sessions.lock();
    let session = sessions.get_mut(id).ok_or(TriageError::UnknownSession)?;
    *session = session.clone().apply(event);
    Ok(())
}
