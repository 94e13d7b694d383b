use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};
use uuid::Uuid;

use vitrine_types::api::{Claims, CreateCategoryRequest};
use vitrine_types::models::Category;

use crate::auth::AppState;
use crate::error::ApiError;
use crate::products::parse_id;

/// GET /categories — served through the read-through cache. Within the TTL
/// this returns the cached snapshot even after categories changed in storage;
/// see [`crate::cache::CategoryCache`] for the staleness trade-off.
pub async fn list_categories(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let categories = state.categories.get_or_populate(|| {
        let rows = state.db.list_categories()?;
        Ok(rows
            .into_iter()
            .map(|row| Category {
                id: parse_id(&row.id, "category"),
                name: row.name,
                description: row.description,
            })
            .collect())
    })?;

    Ok(Json(categories))
}

/// POST /categories — creation deliberately does not invalidate the cache;
/// the listing catches up when the TTL lapses.
pub async fn create_category(
    State(state): State<AppState>,
    Extension(_claims): Extension<Claims>,
    Json(req): Json<CreateCategoryRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let id = Uuid::new_v4();
    state
        .db
        .create_category(&id.to_string(), &req.name, &req.description)?;

    Ok((
        StatusCode::CREATED,
        Json(Category {
            id,
            name: req.name,
            description: req.description,
        }),
    ))
}
