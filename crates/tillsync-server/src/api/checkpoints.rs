use axum::{extract::State, Extension, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::middleware::RequestId;

use super::{map_db_error, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Serialize)]
pub(super) struct CheckpointItem {
    shop_key: String,
    shop_name: String,
    last_window_end: Option<String>,
    last_synced_at: Option<DateTime<Utc>>,
    orders_count: i32,
    products_count: i32,
}

pub(super) async fn list_checkpoints(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<Vec<CheckpointItem>>>, ApiError> {
    let rows = tillsync_db::list_checkpoints(&state.pool)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let data = rows
        .into_iter()
        .map(|row| CheckpointItem {
            shop_key: row.shop_key,
            shop_name: row.shop_name,
            last_window_end: row.last_window_end,
            last_synced_at: row.last_synced_at,
            orders_count: row.orders_count,
            products_count: row.products_count,
        })
        .collect();

    Ok(Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    }))
}
