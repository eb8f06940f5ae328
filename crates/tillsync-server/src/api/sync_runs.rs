use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::middleware::RequestId;

use super::{map_db_error, normalize_limit, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Serialize)]
pub(super) struct SyncRunItem {
    pub id: i64,
    pub public_id: Uuid,
    pub run_type: String,
    pub from_date: String,
    pub to_date: String,
    pub status: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub orders_synced: i32,
    pub new_orders: i32,
    pub products_synced: i32,
    pub sessions_synced: i32,
    pub error_message: Option<String>,
}

impl From<tillsync_db::SyncRunRow> for SyncRunItem {
    fn from(row: tillsync_db::SyncRunRow) -> Self {
        Self {
            id: row.id,
            public_id: row.public_id,
            run_type: row.run_type,
            from_date: row.from_date,
            to_date: row.to_date,
            status: row.status,
            started_at: row.started_at,
            finished_at: row.finished_at,
            orders_synced: row.orders_synced,
            new_orders: row.new_orders,
            products_synced: row.products_synced,
            sessions_synced: row.sessions_synced,
            error_message: row.error_message,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct SyncRunQuery {
    pub limit: Option<i64>,
}

pub(super) async fn list_sync_runs(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<SyncRunQuery>,
) -> Result<Json<ApiResponse<Vec<SyncRunItem>>>, ApiError> {
    let rows = tillsync_db::list_sync_runs(&state.pool, normalize_limit(query.limit))
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let data = rows.into_iter().map(SyncRunItem::from).collect();

    Ok(Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn get_sync_run(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<SyncRunItem>>, ApiError> {
    let row = tillsync_db::get_sync_run(&state.pool, id)
        .await
        .map_err(|e| match e {
            tillsync_db::DbError::NotFound => {
                ApiError::new(req_id.0.clone(), "not_found", format!("sync run {id} not found"))
            }
            other => map_db_error(req_id.0.clone(), &other),
        })?;

    Ok(Json(ApiResponse {
        data: SyncRunItem::from(row),
        meta: ResponseMeta::new(req_id.0),
    }))
}
