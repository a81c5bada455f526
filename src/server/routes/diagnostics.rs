//! Diagnostic routes, compiled only with the `diagnostics` feature.
//!
//! Production builds must not carry these. Responses report counts, paths,
//! and engine metadata; quote text is never included.

use crate::error::EpigraphError;
use crate::resolver::{candidate_seed_paths, load_from_seed_files};
use crate::server::router::AppState;
use axum::{Json, extract::State};
use serde_json::{Value, json};

pub async fn db_validate(State(state): State<AppState>) -> Result<Json<Value>, EpigraphError> {
    let db = state.db.as_ref().ok_or(EpigraphError::DatabaseNotConfigured)?;
    let stats = db.table_stats().await?;

    Ok(Json(json!({
        "status": "success",
        "database_validation": {
            "engine": "sqlite",
            "engine_version": stats.sqlite_version,
            "total_quotes": stats.total_quotes,
            "sample_quotes": stats.sample,
        }
    })))
}

pub async fn seed_probe(State(state): State<AppState>) -> Json<Value> {
    let override_path = state.sources.seed_path.as_deref();
    let candidates = candidate_seed_paths(override_path);

    let checks: Vec<Value> = candidates
        .iter()
        .map(|p| {
            json!({
                "path": p.display().to_string(),
                "exists": p.exists(),
                "is_file": p.is_file(),
            })
        })
        .collect();

    let loading = match load_from_seed_files(override_path) {
        Ok(entries) => json!({ "success": true, "quote_count": entries.len() }),
        Err(e) => json!({ "success": false, "error": e.to_string() }),
    };

    Json(json!({
        "seed_file_check": checks,
        "data_loading_test": loading,
    }))
}
