//! `/api/capsules`, `/api/tags` and `/api/stats` handlers.
//!
//! Handlers only decode, delegate to [`CapsuleService`] and wrap the result;
//! every lock decision happens in the service.
//!
//! [`CapsuleService`]: capsule_core::app::CapsuleService

use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};

use capsule_core::app::{CapsulePage, ListQuery};
use capsule_core::domain::{CapsuleId, CapsuleView, FragmentUpdate, NewCapsule};
use capsule_core::observability::CapsuleCounts;

use super::AppState;
use crate::error::ApiError;

#[derive(Debug, Default, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CapsuleList {
    pub capsules: Vec<CapsuleView>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreatedCapsule {
    pub message: String,
    pub capsule: CapsuleView,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Message {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TagList {
    pub tags: Vec<String>,
}

fn parse_id(raw: &str) -> Result<CapsuleId, ApiError> {
    raw.parse().map_err(|_| ApiError::UnknownId(raw.to_owned()))
}

fn query<T>(q: Result<Query<T>, QueryRejection>) -> Result<T, ApiError> {
    q.map(|Query(inner)| inner)
        .map_err(|e| ApiError::BadRequest(e.body_text()))
}

fn body<T>(b: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    b.map(|Json(inner)| inner)
        .map_err(|e| ApiError::BadRequest(e.body_text()))
}

/// `GET /api/capsules`
pub async fn list_capsules(
    State(state): State<AppState>,
    q: Result<Query<ListQuery>, QueryRejection>,
) -> Result<Json<CapsulePage>, ApiError> {
    let page = state.service.list(query(q)?).await?;
    Ok(Json(page))
}

/// `POST /api/capsules`
pub async fn create_capsule(
    State(state): State<AppState>,
    b: Result<Json<NewCapsule>, JsonRejection>,
) -> Result<(StatusCode, Json<CreatedCapsule>), ApiError> {
    let capsule = state.service.create(body(b)?).await?;
    Ok((
        StatusCode::CREATED,
        Json(CreatedCapsule {
            message: "Capsule created successfully".into(),
            capsule,
        }),
    ))
}

/// `GET /api/capsules/unlocked`
pub async fn unlocked_capsules(
    State(state): State<AppState>,
    q: Result<Query<LimitQuery>, QueryRejection>,
) -> Result<Json<CapsuleList>, ApiError> {
    let capsules = state.service.unlocked(query(q)?.limit).await?;
    Ok(Json(CapsuleList { capsules }))
}

/// `GET /api/capsules/locked`
pub async fn locked_capsules(
    State(state): State<AppState>,
    q: Result<Query<LimitQuery>, QueryRejection>,
) -> Result<Json<CapsuleList>, ApiError> {
    let capsules = state.service.locked(query(q)?.limit).await?;
    Ok(Json(CapsuleList { capsules }))
}

/// `GET /api/capsules/{id}`
pub async fn get_capsule(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<CapsuleView>, ApiError> {
    let view = state.service.get(parse_id(&id)?).await?;
    Ok(Json(view))
}

/// `DELETE /api/capsules/{id}`
pub async fn delete_capsule(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Message>, ApiError> {
    state.service.delete(parse_id(&id)?).await?;
    Ok(Json(Message {
        message: "Capsule deleted successfully".into(),
    }))
}

/// `PATCH /api/capsules/{id}/position`
pub async fn update_position(
    State(state): State<AppState>,
    Path(id): Path<String>,
    b: Result<Json<FragmentUpdate>, JsonRejection>,
) -> Result<Json<CapsuleView>, ApiError> {
    let id = parse_id(&id)?;
    let view = state.service.reposition(id, body(b)?).await?;
    Ok(Json(view))
}

/// `GET /api/tags`
pub async fn list_tags(State(state): State<AppState>) -> Result<Json<TagList>, ApiError> {
    let tags = state.service.tags().await?;
    Ok(Json(TagList { tags }))
}

/// `GET /api/stats`
pub async fn stats(State(state): State<AppState>) -> Result<Json<CapsuleCounts>, ApiError> {
    Ok(Json(state.service.stats().await?))
}
