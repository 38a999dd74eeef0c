//! HTTP endpoints
//!
//! REST API for walkthrough sessions. Every session-mutating call
//! answers with a fresh session snapshot so a thin client can render
//! the walkthrough from the response alone.

use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use carelink_engine::{WalkthroughSession, WalkthroughState};
use carelink_speech::ListeningStatus;

use crate::state::AppState;
use crate::ServerError;

/// Create the application router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Session lifecycle
        .route("/api/sessions", post(create_session))
        .route("/api/sessions", get(list_sessions))
        .route("/api/sessions/:id", get(get_session))
        .route("/api/sessions/:id", delete(delete_session))
        // Walkthrough actions
        .route("/api/sessions/:id/query", post(submit_query))
        .route("/api/sessions/:id/done", post(mark_done))
        .route("/api/sessions/:id/repeat", post(repeat_step))
        .route("/api/sessions/:id/reset", post(reset_session))
        .route("/api/sessions/:id/language", post(toggle_language))
        // Narration controls
        .route("/api/sessions/:id/narration/pause", post(pause_narration))
        .route("/api/sessions/:id/narration/resume", post(resume_narration))
        .route("/api/sessions/:id/narration/stop", post(stop_narration))
        // Voice input
        .route("/api/sessions/:id/listen", post(toggle_listening))
        .route("/api/sessions/:id/transcript", get(get_transcript))
        // History
        .route("/api/sessions/:id/history", get(get_history))
        .route("/api/sessions/:id/history", delete(clear_history))
        // Health check
        .route("/health", get(health_check))
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

/// Snapshot of a session for the client
#[derive(Debug, Serialize)]
struct SessionView {
    session_id: String,
    state: &'static str,
    language: &'static str,
    progress: Option<ProgressView>,
    steps: Option<Vec<StepView>>,
}

#[derive(Debug, Serialize)]
struct ProgressView {
    done: usize,
    total: usize,
    /// Rendered progress line, e.g. "2 of 6 steps done"
    label: String,
}

#[derive(Debug, Serialize)]
struct StepView {
    text: String,
    status: &'static str,
}

/// Voice-input snapshot: the recognized text so far plus where the
/// mic control stands, with a status line when the session failed
#[derive(Debug, Serialize)]
struct TranscriptView {
    text: String,
    status: &'static str,
    message: Option<&'static str>,
}

fn transcript_view(session: &WalkthroughSession) -> TranscriptView {
    let status = session.listening_status();
    TranscriptView {
        text: session.transcript(),
        status: match status {
            ListeningStatus::Idle => "idle",
            ListeningStatus::Listening => "listening",
            ListeningStatus::Failed(_) => "failed",
        },
        message: match status {
            ListeningStatus::Failed(kind) => Some(kind.status_message()),
            _ => None,
        },
    }
}

fn state_label(state: WalkthroughState) -> &'static str {
    match state {
        WalkthroughState::Idle => "idle",
        WalkthroughState::Loading => "loading",
        WalkthroughState::Presenting { .. } => "presenting",
        WalkthroughState::Completed => "completed",
    }
}

fn session_view(session: &Arc<WalkthroughSession>) -> SessionView {
    let state = session.state();
    let progress = session.progress().map(|(done, total)| ProgressView {
        done,
        total,
        label: format!("{done} of {total} steps done"),
    });

    let steps = session.step_texts().map(|texts| {
        let active = match state {
            WalkthroughState::Presenting { index } => index,
            // Completed: everything before a past-the-end index is done.
            _ => texts.len(),
        };
        texts
            .into_iter()
            .enumerate()
            .map(|(i, text)| StepView {
                text,
                status: if i < active {
                    "done"
                } else if i == active {
                    "active"
                } else {
                    "pending"
                },
            })
            .collect()
    });

    SessionView {
        session_id: session.id.clone(),
        state: state_label(state),
        language: session.language().display_name(),
        progress,
        steps,
    }
}

fn lookup(state: &AppState, id: &str) -> Result<Arc<WalkthroughSession>, ServerError> {
    state
        .sessions
        .get(id)
        .ok_or_else(|| ServerError::Session(format!("No session {id}")))
}

/// Create a new walkthrough session
async fn create_session(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ServerError> {
    let session = state.sessions.create().map_err(|e| {
        tracing::warn!(error = %e, "Session creation refused");
        ServerError::Unavailable(e.to_string())
    })?;
    Ok((StatusCode::CREATED, Json(session_view(&session))))
}

async fn list_sessions(State(state): State<AppState>) -> Json<serde_json::Value> {
    let sessions = state.sessions.list();
    Json(serde_json::json!({
        "sessions": sessions,
        "count": sessions.len(),
    }))
}

async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SessionView>, ServerError> {
    let session = lookup(&state, &id)?;
    Ok(Json(session_view(&session)))
}

async fn delete_session(State(state): State<AppState>, Path(id): Path<String>) -> StatusCode {
    state.sessions.remove(&id);
    StatusCode::NO_CONTENT
}

/// Query submission body
#[derive(Debug, Deserialize)]
struct QueryRequest {
    query: String,
}

async fn submit_query(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<QueryRequest>,
) -> Result<Json<SessionView>, ServerError> {
    let session = lookup(&state, &id)?;
    session.submit(&request.query).await;
    Ok(Json(session_view(&session)))
}

async fn mark_done(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SessionView>, ServerError> {
    let session = lookup(&state, &id)?;
    session.mark_done().await;
    Ok(Json(session_view(&session)))
}

async fn repeat_step(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SessionView>, ServerError> {
    let session = lookup(&state, &id)?;
    session.repeat().await;
    Ok(Json(session_view(&session)))
}

async fn reset_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SessionView>, ServerError> {
    let session = lookup(&state, &id)?;
    session.new_query().await;
    Ok(Json(session_view(&session)))
}

async fn toggle_language(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SessionView>, ServerError> {
    let session = lookup(&state, &id)?;
    session.toggle_language();
    Ok(Json(session_view(&session)))
}

async fn pause_narration(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ServerError> {
    lookup(&state, &id)?.pause_narration();
    Ok(StatusCode::NO_CONTENT)
}

async fn resume_narration(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ServerError> {
    lookup(&state, &id)?.resume_narration();
    Ok(StatusCode::NO_CONTENT)
}

async fn stop_narration(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ServerError> {
    lookup(&state, &id)?.stop_narration();
    Ok(StatusCode::NO_CONTENT)
}

/// Mic-button toggle: starts a listening session in the session's
/// current language, or stops the live one
async fn toggle_listening(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ServerError> {
    let session = lookup(&state, &id)?;
    let listening = session
        .toggle_listening()
        .await
        .map_err(|e| ServerError::Internal(e.to_string()))?;
    Ok(Json(serde_json::json!({ "listening": listening })))
}

async fn get_transcript(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<TranscriptView>, ServerError> {
    let session = lookup(&state, &id)?;
    Ok(Json(transcript_view(&session)))
}

async fn get_history(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ServerError> {
    let session = lookup(&state, &id)?;
    let entries = session.history();
    Ok(Json(serde_json::json!({
        "entries": entries,
        "count": entries.len(),
    })))
}

async fn clear_history(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ServerError> {
    lookup(&state, &id)?.clear_history();
    Ok(StatusCode::NO_CONTENT)
}

async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
