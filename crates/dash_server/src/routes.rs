use std::sync::Arc;

use axum::{
    extract::{Path, Request, State},
    http::{header, HeaderValue, Method, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;

use dash_core::highscores::{normalize_name, HighScoreEntry, HighScoreTable};
use dash_core::level::{LevelFile, LevelSummary};
use dash_core::store::{DataDir, HighScoreStore, LevelSource, StoreError};

#[derive(Clone)]
pub struct AppState {
    pub data: Arc<DataDir>,
}

impl AppState {
    pub fn new(data: DataDir) -> Self {
        Self {
            data: Arc::new(data),
        }
    }
}

/// JSON `{ "error": ... }` with a status code.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        let status = match err {
            StoreError::NotFound(_) => StatusCode::NOT_FOUND,
            StoreError::Invalid(_) => StatusCode::BAD_REQUEST,
            StoreError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, err.to_string())
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/high-scores", get(get_high_scores).post(save_high_scores))
        .route("/api/levels", get(list_levels))
        .route("/api/levels/{id}", get(get_level))
        .fallback(not_found)
        .layer(middleware::from_fn(cors))
        .with_state(state)
}

/// Every response is readable cross-origin; preflights short-circuit with 200.
async fn cors(req: Request, next: Next) -> Response {
    let mut res = if req.method() == Method::OPTIONS {
        StatusCode::OK.into_response()
    } else {
        next.run(req).await
    };
    let headers = res.headers_mut();
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, POST, PUT, DELETE, OPTIONS"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Content-Type"),
    );
    res
}

async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, "Not found")
}

/// Runs store I/O off the async workers.
async fn blocking<T, F>(state: &AppState, job: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&DataDir) -> Result<T, ApiError> + Send + 'static,
{
    let data = state.data.clone();
    tokio::task::spawn_blocking(move || job(&data))
        .await
        .map_err(|e| {
            log::error!("Store task failed: {e}");
            ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal error")
        })?
}

async fn get_high_scores(
    State(state): State<AppState>,
) -> Result<Json<Vec<HighScoreEntry>>, ApiError> {
    let entries = blocking(&state, |data| Ok(data.load_high_scores())).await?;
    Ok(Json(entries))
}

/// Accepts the client's full list, keeps valid names, stores the top ten.
async fn save_high_scores(
    State(state): State<AppState>,
    body: String,
) -> Result<Json<serde_json::Value>, ApiError> {
    let submitted: Vec<HighScoreEntry> = serde_json::from_str(&body).map_err(|e| {
        log::warn!("Rejected high-score payload: {e}");
        ApiError::new(StatusCode::BAD_REQUEST, "Invalid JSON")
    })?;
    let entries: Vec<HighScoreEntry> = submitted
        .into_iter()
        .filter_map(|entry| {
            normalize_name(&entry.name).map(|name| HighScoreEntry {
                name,
                score: entry.score,
            })
        })
        .collect();
    let table = HighScoreTable::new(entries);

    blocking(&state, move |data| {
        data.save_high_scores(table.entries()).map_err(|e| {
            log::error!("{e}");
            ApiError::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to save high scores",
            )
        })?;
        log::info!("Saved {} high scores", table.entries().len());
        Ok(())
    })
    .await?;
    Ok(Json(json!({ "success": true })))
}

async fn list_levels(State(state): State<AppState>) -> Result<Json<Vec<LevelSummary>>, ApiError> {
    let levels = blocking(&state, |data| Ok(data.list_levels()?)).await?;
    Ok(Json(levels))
}

async fn get_level(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<LevelFile>, ApiError> {
    let level = blocking(&state, move |data| {
        data.fetch_level(&id).map_err(|e| {
            log::warn!("Level request failed: {e}");
            ApiError::from(e)
        })
    })
    .await?;
    Ok(Json(level))
}
