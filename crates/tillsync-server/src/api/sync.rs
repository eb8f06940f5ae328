use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;

use tillsync_sync::{run_sync, SyncRequest};

use super::AppState;

/// Invocation error body. Unlike the read endpoints this is not enveloped:
/// callers of the trigger endpoint get the flat historical shape.
#[derive(Debug, Serialize)]
struct SyncErrorBody {
    success: bool,
    error: String,
}

/// `POST /api/v1/sync` — runs a sync and answers with the flat summary.
///
/// The body is optional; an absent or empty body means a scheduled-style
/// run over the rolling lookback window. Per-shop failures are reported
/// inside the 200 summary; only failures before the shop loop produce a 500.
pub(super) async fn trigger_sync(
    State(state): State<AppState>,
    body: Option<Json<SyncRequest>>,
) -> impl IntoResponse {
    let request = body.map(|Json(r)| r).unwrap_or_default();

    match run_sync(&state.pool, &state.config, &state.roster, &request).await {
        Ok(summary) => (StatusCode::OK, Json(summary)).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "sync invocation failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(SyncErrorBody {
                    success: false,
                    error: e.to_string(),
                }),
            )
                .into_response()
        }
    }
}
