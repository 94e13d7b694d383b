use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::Version;

// -- JWT Claims --

/// JWT claims shared between the REST middleware and the auth handlers.
/// Canonical definition lives here in vitrine-types to eliminate duplication.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub email: String,
    pub exp: usize,
}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub username: Option<String>,
    pub email: String,
    pub password: String,
    pub phone: Option<String>,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub middle_name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub user_id: Uuid,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user_id: Uuid,
    pub email: String,
    pub token: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PasswordResetRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PasswordResetConfirmRequest {
    pub uid: String,
    pub token: String,
    pub new_password: String,
}

// -- Products --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateProductRequest {
    pub name: String,
    pub description: String,
    pub image: Option<String>,
    pub category_id: Uuid,
    pub price_per_unit: i64,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateProductRequest {
    pub name: String,
    pub description: String,
    pub image: Option<String>,
    pub category_id: Uuid,
    pub price_per_unit: i64,
}

#[derive(Debug, Serialize)]
pub struct ProductResponse {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub image: Option<String>,
    pub category_id: Uuid,
    pub price_per_unit: i64,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
    pub owner_id: Uuid,
    pub is_published: bool,
    pub active_version: Option<Version>,
}

// -- Categories --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateCategoryRequest {
    pub name: String,
    pub description: String,
}

// -- Versions --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateVersionRequest {
    pub version_name: String,
    #[serde(default = "default_version_number")]
    pub version_number: String,
    #[serde(default)]
    pub is_current: bool,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateVersionRequest {
    pub version_name: String,
    pub version_number: String,
    pub is_current: bool,
}

fn default_version_number() -> String {
    "1.0.0".to_string()
}

// -- Profile --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateProfileRequest {
    pub username: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub middle_name: Option<String>,
    pub message: Option<String>,
    pub phone: Option<String>,
}
