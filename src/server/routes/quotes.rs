use crate::error::EpigraphError;
use crate::server::router::AppState;
use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};

pub async fn healthz() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Serve one random quote. Quote contents are response data, never log data
/// on this path.
pub async fn random_quote(State(state): State<AppState>) -> Result<Response, EpigraphError> {
    let db = state.db.as_ref().ok_or(EpigraphError::DatabaseNotConfigured)?;

    match db.random_quote().await? {
        Some(quote) => Ok(Json(quote).into_response()),
        None => Ok((
            StatusCode::NOT_FOUND,
            Json(json!({ "message": "No quotes available" })),
        )
            .into_response()),
    }
}

/// A random quote plus engine metadata proving where it came from.
pub async fn quote_with_source(State(state): State<AppState>) -> Result<Response, EpigraphError> {
    let db = state.db.as_ref().ok_or(EpigraphError::DatabaseNotConfigured)?;

    let Some(quote) = db.random_quote().await? else {
        return Ok((
            StatusCode::NOT_FOUND,
            Json(json!({ "message": "No quotes available" })),
        )
            .into_response());
    };
    let engine_version = db.engine_version().await?;

    Ok(Json(json!({
        "quote": quote,
        "source_validation": {
            "engine": "sqlite",
            "engine_version": engine_version,
            "query_time": chrono::Utc::now().to_rfc3339(),
            "source": "SQLite database"
        }
    }))
    .into_response())
}
