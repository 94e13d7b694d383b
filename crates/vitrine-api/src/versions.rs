use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use vitrine_db::models::VersionRow;
use vitrine_types::api::{Claims, CreateVersionRequest, UpdateVersionRequest};
use vitrine_types::models::Version;

use crate::auth::AppState;
use crate::error::ApiError;
use crate::products::parse_id;

/// POST /products/{id}/versions — create a version against an existing
/// product. Marking it current clears the flag on siblings transactionally.
pub async fn create_version(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
    Extension(_claims): Extension<Claims>,
    Json(req): Json<CreateVersionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if state.db.get_product(&product_id.to_string())?.is_none() {
        return Err(ApiError::NotFound("product"));
    }

    let row = VersionRow {
        id: Uuid::new_v4().to_string(),
        version_name: req.version_name,
        version_number: req.version_number,
        is_current: req.is_current,
        product_id: Some(product_id.to_string()),
    };
    state.db.create_version(&row)?;

    Ok((StatusCode::CREATED, Json(version_to_model(row))))
}

pub async fn get_version(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(_claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let row = state
        .db
        .get_version(&id.to_string())?
        .ok_or(ApiError::NotFound("version"))?;

    Ok(Json(version_to_model(row)))
}

pub async fn update_version(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(_claims): Extension<Claims>,
    Json(req): Json<UpdateVersionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let updated = state.db.update_version(
        &id.to_string(),
        &req.version_name,
        &req.version_number,
        req.is_current,
    )?;
    if !updated {
        return Err(ApiError::NotFound("version"));
    }

    let row = state
        .db
        .get_version(&id.to_string())?
        .ok_or(ApiError::NotFound("version"))?;

    Ok(Json(version_to_model(row)))
}

pub(crate) fn version_to_model(row: VersionRow) -> Version {
    Version {
        id: parse_id(&row.id, "version"),
        version_name: row.version_name,
        version_number: row.version_number,
        is_current: row.is_current,
        product_id: row.product_id.as_deref().map(|id| parse_id(id, "product")),
    }
}
