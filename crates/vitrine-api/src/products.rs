use std::collections::HashMap;

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::{error, warn};
use uuid::Uuid;

use vitrine_db::models::ProductRow;
use vitrine_types::api::{Claims, CreateProductRequest, ProductResponse, UpdateProductRequest};
use vitrine_types::models::Version;

use crate::auth::AppState;
use crate::authz::{Decision, authorize_product_mutation};
use crate::error::ApiError;
use crate::moderation::find_banned_word;
use crate::versions::version_to_model;

/// GET /products — public listing, ordered by name, with each product's
/// active version resolved in one batch query instead of one per product.
pub async fn list_products(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    // Run blocking DB reads off the async runtime
    let db = state.clone();
    let (rows, version_rows) = tokio::task::spawn_blocking(move || {
        let rows = db.db.list_products()?;
        let product_ids: Vec<String> = rows.iter().map(|r| r.id.clone()).collect();
        let version_rows = db.db.get_active_versions_for_products(&product_ids)?;
        Ok::<_, anyhow::Error>((rows, version_rows))
    })
    .await
    .map_err(|e| {
        error!("spawn_blocking join error: {}", e);
        anyhow::anyhow!("listing task failed: {}", e)
    })??;

    let mut active_versions: HashMap<String, Version> = HashMap::new();
    for row in version_rows {
        if let Some(product_id) = row.product_id.clone() {
            active_versions.insert(product_id, version_to_model(row));
        }
    }

    let products: Vec<ProductResponse> = rows
        .into_iter()
        .map(|row| {
            let active_version = active_versions.remove(&row.id);
            product_to_response(row, active_version)
        })
        .collect();

    Ok(Json(products))
}

pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(_claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let row = state
        .db
        .get_product(&id.to_string())?
        .ok_or(ApiError::NotFound("product"))?;
    let active_version = state
        .db
        .get_active_version(&row.id)?
        .map(version_to_model);

    Ok(Json(product_to_response(row, active_version)))
}

pub async fn create_product(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateProductRequest>,
) -> Result<impl IntoResponse, ApiError> {
    // Moderation runs at creation only, and a hit writes nothing.
    if let Some(word) = find_banned_word(&req.name) {
        return Err(ApiError::Validation {
            field: "name",
            message: format!("the word '{word}' is not allowed in the product name"),
        });
    }
    if let Some(word) = find_banned_word(&req.description) {
        return Err(ApiError::Validation {
            field: "description",
            message: format!("the word '{word}' is not allowed in the product description"),
        });
    }

    if state.db.get_category(&req.category_id.to_string())?.is_none() {
        return Err(ApiError::Validation {
            field: "category_id",
            message: "unknown category".to_string(),
        });
    }

    let now = chrono::Utc::now().to_rfc3339();
    let row = ProductRow {
        id: Uuid::new_v4().to_string(),
        name: req.name,
        description: req.description,
        image: req.image.map(normalize_image),
        category_id: req.category_id.to_string(),
        price_per_unit: req.price_per_unit,
        created_at: now.clone(),
        updated_at: now,
        owner_id: claims.sub.to_string(),
        is_published: false,
    };
    state.db.create_product(&row)?;

    Ok((
        StatusCode::CREATED,
        Json(product_to_response(row, None)),
    ))
}

pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<UpdateProductRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let row = state
        .db
        .get_product(&id.to_string())?
        .ok_or(ApiError::NotFound("product"))?;

    if authorize_product_mutation(&claims, &row) == Decision::Deny {
        return Err(ApiError::Forbidden(
            "you do not have permission to edit this product",
        ));
    }

    if state.db.get_category(&req.category_id.to_string())?.is_none() {
        return Err(ApiError::Validation {
            field: "category_id",
            message: "unknown category".to_string(),
        });
    }

    let image = req.image.map(normalize_image);
    state.db.update_product(
        &row.id,
        &req.name,
        &req.description,
        image.as_deref(),
        &req.category_id.to_string(),
        req.price_per_unit,
    )?;

    let updated = state
        .db
        .get_product(&row.id)?
        .ok_or(ApiError::NotFound("product"))?;
    let active_version = state
        .db
        .get_active_version(&updated.id)?
        .map(version_to_model);

    Ok(Json(product_to_response(updated, active_version)))
}

pub async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let row = state
        .db
        .get_product(&id.to_string())?
        .ok_or(ApiError::NotFound("product"))?;

    if authorize_product_mutation(&claims, &row) == Decision::Deny {
        return Err(ApiError::Forbidden(
            "you do not have permission to delete this product",
        ));
    }

    // Versions go with the product via the FK cascade.
    state.db.delete_product(&row.id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Image references live under the products/ prefix in storage.
fn normalize_image(image: String) -> String {
    if image.starts_with("products/") {
        image
    } else {
        format!("products/{image}")
    }
}

fn product_to_response(row: ProductRow, active_version: Option<Version>) -> ProductResponse {
    ProductResponse {
        id: parse_id(&row.id, "product"),
        name: row.name,
        description: row.description,
        image: row.image,
        category_id: parse_id(&row.category_id, "category"),
        price_per_unit: row.price_per_unit,
        created_at: parse_timestamp(&row.created_at, &row.id),
        updated_at: parse_timestamp(&row.updated_at, &row.id),
        owner_id: parse_id(&row.owner_id, "owner"),
        is_published: row.is_published,
        active_version,
    }
}

pub(crate) fn parse_id(raw: &str, what: &str) -> Uuid {
    raw.parse().unwrap_or_else(|e| {
        warn!("Corrupt {} id '{}': {}", what, raw, e);
        Uuid::default()
    })
}

pub(crate) fn parse_timestamp(raw: &str, row_id: &str) -> chrono::DateTime<chrono::Utc> {
    raw.parse::<chrono::DateTime<chrono::Utc>>()
        .or_else(|_| {
            // SQLite's datetime('now') default stores "YYYY-MM-DD HH:MM:SS"
            // without a timezone. Parse as naive UTC and convert.
            chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            warn!("Corrupt timestamp '{}' on row '{}': {}", raw, row_id, e);
            chrono::DateTime::default()
        })
}
