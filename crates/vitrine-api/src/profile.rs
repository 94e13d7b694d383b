use axum::{Extension, Json, extract::State, response::IntoResponse};

use vitrine_db::models::UserRow;
use vitrine_types::api::{Claims, UpdateProfileRequest};
use vitrine_types::models::User;

use crate::auth::AppState;
use crate::error::ApiError;
use crate::products::{parse_id, parse_timestamp};
use crate::validation::validate_phone;

pub async fn get_profile(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state
        .db
        .get_user_by_id(&claims.sub.to_string())?
        .ok_or(ApiError::NotFound("user"))?;

    Ok(Json(user_to_model(user)))
}

pub async fn update_profile(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if let Some(phone) = &req.phone {
        validate_phone(phone).map_err(|message| ApiError::Validation {
            field: "phone",
            message,
        })?;
    }

    let user = state
        .db
        .get_user_by_id(&claims.sub.to_string())?
        .ok_or(ApiError::NotFound("user"))?;

    state
        .db
        .update_profile(
            &user.id,
            req.username.as_deref(),
            &req.first_name,
            &req.last_name,
            req.middle_name.as_deref(),
            req.message.as_deref(),
            req.phone.as_deref(),
        )
        .map_err(|e| ApiError::from_db(e, "username or phone already in use"))?;

    let updated = state
        .db
        .get_user_by_id(&user.id)?
        .ok_or(ApiError::NotFound("user"))?;

    Ok(Json(user_to_model(updated)))
}

fn user_to_model(row: UserRow) -> User {
    User {
        id: parse_id(&row.id, "user"),
        username: row.username,
        email: row.email,
        first_name: row.first_name,
        last_name: row.last_name,
        middle_name: row.middle_name,
        message: row.message,
        phone: row.phone,
        email_verified: row.email_verified,
        created_at: parse_timestamp(&row.created_at, &row.id),
    }
}
