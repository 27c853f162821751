use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::{
    error::{AppError, AppResult},
    middleware::request_id::RequestId,
    models::{Action, Book, ChoiceEvent, SavedChoice, Summary},
    services::{catalog, Session},
};

use super::AppState;

// Request/Response types

#[derive(Debug, Deserialize)]
pub struct ChoiceRequest {
    pub book: Option<Book>,
    pub action: Option<Action>,
    pub timestamp: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct ChoiceResponse {
    pub ok: bool,
    pub saved: SavedChoice,
}

#[derive(Debug, Deserialize)]
pub struct SwipeRequest {
    pub action: Action,
}

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    #[serde(default)]
    pub api_key: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub fetched: usize,
    pub added: usize,
    pub message: String,
}

/// What the card view renders
#[derive(Debug, Serialize)]
pub struct SessionView {
    pub current: Option<Book>,
    pub remaining: usize,
    pub liked_count: usize,
    pub disliked_count: usize,
    pub liked: Vec<ChoiceEvent>,
    pub exhausted: bool,
}

impl From<&Session> for SessionView {
    fn from(session: &Session) -> Self {
        Self {
            current: session.current().cloned(),
            remaining: session.remaining(),
            liked_count: session.state().liked.len(),
            disliked_count: session.state().disliked.len(),
            liked: session.state().liked.clone(),
            exhausted: session.is_exhausted(),
        }
    }
}

fn invalid_json(rejection: JsonRejection) -> AppError {
    AppError::InvalidInput(rejection.body_text())
}

/// Runs a session mutation on the blocking pool while holding the write lock
///
/// Mutations that persist through the session store do file I/O.
async fn with_session_blocking<T, F>(state: &AppState, mutate: F) -> AppResult<T>
where
    F: FnOnce(&mut Session) -> AppResult<T> + Send + 'static,
    T: Send + 'static,
{
    let mut session = state.session.clone().write_owned().await;
    tokio::task::spawn_blocking(move || mutate(&mut session))
        .await
        .map_err(|e| AppError::Internal(format!("Session task failed: {e}")))?
}

// Handlers

/// Health check endpoint
pub async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}

/// Append a choice to the log
pub async fn record_choice(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    payload: Result<Json<ChoiceRequest>, JsonRejection>,
) -> AppResult<Json<ChoiceResponse>> {
    let Json(request) = payload.map_err(invalid_json)?;

    let (Some(book), Some(action)) = (request.book, request.action) else {
        return Err(AppError::InvalidInput(
            "book and action required".to_string(),
        ));
    };

    tracing::info!(
        request_id = %request_id,
        book_id = %book.id,
        action = %action,
        "Recording choice"
    );

    let saved = state.choices.record(book, action, request.timestamp).await;
    Ok(Json(ChoiceResponse { ok: true, saved }))
}

/// Get every recorded choice
pub async fn list_choices(State(state): State<AppState>) -> Json<Vec<ChoiceEvent>> {
    Json(state.choices.list_all().await)
}

/// Counts and the ten most recent choices
pub async fn summary(State(state): State<AppState>) -> Json<Summary> {
    Json(state.choices.summary().await)
}

/// Current card and liked panel
pub async fn get_session(State(state): State<AppState>) -> Json<SessionView> {
    let session = state.session.read().await;
    Json(SessionView::from(&*session))
}

/// Like or dislike the current card
///
/// Local state changes immediately; the choice log is written in the
/// background and its failure does not undo the decision.
pub async fn swipe(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    payload: Result<Json<SwipeRequest>, JsonRejection>,
) -> AppResult<Json<SessionView>> {
    let Json(request) = payload.map_err(invalid_json)?;

    let (event, view) = with_session_blocking(&state, move |session| {
        let event = session.decide(request.action, Utc::now().timestamp_millis())?;
        Ok((event, SessionView::from(&*session)))
    })
    .await?;

    tracing::info!(
        request_id = %request_id,
        book_id = %event.book.id,
        action = %event.action,
        remaining = view.remaining,
        "Swipe applied"
    );

    let choices = state.choices.clone();
    tokio::spawn(async move {
        choices
            .record(event.book, event.action, Some(event.timestamp))
            .await;
    });

    Ok(Json(view))
}

/// Move to the next card without deciding; the cursor is not persisted
pub async fn skip(State(state): State<AppState>) -> AppResult<Json<SessionView>> {
    let mut session = state.session.write().await;
    session.skip()?;
    Ok(Json(SessionView::from(&*session)))
}

/// Clear all decisions and restore the bundled catalog
pub async fn reset(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
) -> AppResult<Json<SessionView>> {
    let view = with_session_blocking(&state, |session| {
        session.reset(Utc::now().timestamp_millis());
        Ok(SessionView::from(&*session))
    })
    .await?;
    tracing::info!(request_id = %request_id, "Session reset requested");
    Ok(Json(view))
}

/// Search the external catalog and merge new books
pub async fn search_catalog(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    payload: Result<Json<SearchRequest>, JsonRejection>,
) -> AppResult<Json<SearchResponse>> {
    let Json(request) = payload.map_err(invalid_json)?;

    tracing::info!(
        request_id = %request_id,
        query = %request.query,
        "Processing catalog search"
    );

    let api_key = request.api_key.filter(|k| !k.trim().is_empty());
    let outcome = catalog::search_and_merge(
        state.searcher.as_ref(),
        &state.session,
        &request.query,
        api_key,
        state.search_max_results,
    )
    .await?;

    Ok(Json(SearchResponse {
        fetched: outcome.fetched,
        added: outcome.added,
        message: outcome.message(),
    }))
}
