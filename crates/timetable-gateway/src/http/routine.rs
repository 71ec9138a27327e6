use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use timetable_scheduler::{EntryFilter, EntryPatch, NewEntry, RoutineScheduler, SlotCalendar};
use tracing::info;

use super::error::ApiError;
use crate::app::AppState;

type ApiResult<T> = Result<T, ApiError>;

/// Run a mutation on the blocking pool; commits may wait on the SQLite save.
async fn on_scheduler<T, F>(state: Arc<AppState>, op: F) -> ApiResult<T>
where
    T: Send + 'static,
    F: FnOnce(&RoutineScheduler) -> timetable_scheduler::Result<T> + Send + 'static,
{
    let out = tokio::task::spawn_blocking(move || op(&state.scheduler)).await??;
    Ok(out)
}

/// GET /routine/slots
pub async fn slots(State(state): State<Arc<AppState>>) -> Json<SlotCalendar> {
    Json(state.scheduler.calendar().clone())
}

/// GET /routine/entries?day=&time_slot=&instructor_id=&room_id=&student_group_id=
pub async fn list_entries(
    State(state): State<Arc<AppState>>,
    filter: Result<Query<EntryFilter>, QueryRejection>,
) -> ApiResult<Json<Value>> {
    let Query(filter) = filter?;
    let entries = state.scheduler.list_entries(&filter);
    Ok(Json(json!({ "count": entries.len(), "entries": entries })))
}

/// POST /routine/entries
pub async fn add_entry(
    State(state): State<Arc<AppState>>,
    body: Result<Json<NewEntry>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let Json(draft) = body?;
    let entry = on_scheduler(state, move |s| s.add_entry(draft)).await?;
    info!(id = %entry.id, day = %entry.day, slot = %entry.time_slot, "routine entry added");
    Ok((StatusCode::CREATED, Json(json!({ "entry": entry }))))
}

/// GET /routine/entries/{id}
pub async fn get_entry(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let entry = state.scheduler.get_entry(&id)?;
    Ok(Json(json!({ "entry": entry })))
}

/// PATCH /routine/entries/{id}
pub async fn update_entry(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    body: Result<Json<EntryPatch>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let Json(patch) = body?;
    let entry = on_scheduler(state, move |s| s.update_entry(&id, patch)).await?;
    info!(id = %entry.id, "routine entry updated");
    Ok(Json(json!({ "entry": entry })))
}

/// DELETE /routine/entries/{id}
pub async fn delete_entry(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let target = id.clone();
    on_scheduler(state, move |s| s.delete_entry(&target)).await?;
    info!(%id, "routine entry deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct CheckRequest {
    pub entry: NewEntry,
    #[serde(default)]
    pub exclude_id: Option<String>,
}

/// POST /routine/check: dry-run conflict check, nothing is stored.
pub async fn check_entry(
    State(state): State<Arc<AppState>>,
    body: Result<Json<CheckRequest>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let Json(req) = body?;
    let result = state
        .scheduler
        .check_entry(req.entry, req.exclude_id.as_deref())?;
    Ok(Json(json!({ "result": result })))
}

/// GET /routine/audit
pub async fn audit(State(state): State<Arc<AppState>>) -> Json<Value> {
    let clashes = state.scheduler.audit();
    Json(json!({ "count": clashes.len(), "clashes": clashes }))
}
