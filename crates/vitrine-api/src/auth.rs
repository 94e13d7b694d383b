use std::sync::Arc;

use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{Json, extract::Path, extract::State, http::StatusCode, response::IntoResponse};
use jsonwebtoken::{EncodingKey, Header, encode};
use tracing::warn;
use uuid::Uuid;

use vitrine_db::Database;
use vitrine_db::models::UserRow;
use vitrine_types::api::{
    Claims, LoginRequest, LoginResponse, PasswordResetConfirmRequest, PasswordResetRequest,
    RegisterRequest, RegisterResponse,
};

use crate::cache::CategoryCache;
use crate::error::ApiError;
use crate::mailer::Mailer;
use crate::tokens::{self, TokenPurpose};
use crate::validation::{validate_password, validate_phone};

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub jwt_secret: String,
    pub base_url: String,
    pub categories: CategoryCache,
    pub mailer: Mailer,
}

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if !req.email.contains('@') {
        return Err(ApiError::Validation {
            field: "email",
            message: "enter a valid email address".to_string(),
        });
    }
    validate_password(&req.password).map_err(|message| ApiError::Validation {
        field: "password",
        message,
    })?;
    if let Some(phone) = &req.phone {
        validate_phone(phone).map_err(|message| ApiError::Validation {
            field: "phone",
            message,
        })?;
    }

    // Email is the login key; refuse duplicates up front.
    if state.db.get_user_by_email(&req.email)?.is_some() {
        return Err(ApiError::Conflict("email already registered"));
    }

    // Hash password with Argon2id
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(req.password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("password hashing failed: {}", e))?
        .to_string();

    let user_id = Uuid::new_v4();
    let user = UserRow {
        id: user_id.to_string(),
        username: req.username,
        email: req.email,
        password: password_hash,
        first_name: req.first_name,
        last_name: req.last_name,
        middle_name: req.middle_name,
        message: None,
        phone: req.phone,
        is_staff: false,
        is_superuser: false,
        email_verified: false,
        created_at: chrono::Utc::now().to_rfc3339(),
    };

    state
        .db
        .create_user(&user)
        .map_err(|e| ApiError::from_db(e, "username, email or phone already in use"))?;

    let token = tokens::issue_account_token(&state.jwt_secret, TokenPurpose::VerifyEmail, &user)?;
    let link = format!(
        "{}/auth/verify/{}/{}",
        state.base_url.trim_end_matches('/'),
        tokens::encode_uid(user_id),
        token
    );
    // The account is already written at this point, so a transport failure
    // must not fail the request; a 500 here would leave retries hitting the
    // duplicate-email conflict. The user can re-trigger a link later.
    if let Err(e) = state.mailer.send_verification(&user.email, &link).await {
        warn!("verification mail to {} failed: {:#}", user.email, e);
    }

    Ok((StatusCode::CREATED, Json(RegisterResponse { user_id })))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state
        .db
        .get_user_by_email(&req.email)?
        .ok_or(ApiError::Unauthorized)?;

    // Verify password. Accounts created by the seed tool carry an unusable
    // hash and can never log in.
    let parsed_hash = PasswordHash::new(&user.password).map_err(|_| ApiError::Unauthorized)?;

    Argon2::default()
        .verify_password(req.password.as_bytes(), &parsed_hash)
        .map_err(|_| ApiError::Unauthorized)?;

    let user_id: Uuid = user
        .id
        .parse()
        .map_err(|e| anyhow::anyhow!("corrupt user id '{}': {}", user.id, e))?;

    let token = create_token(&state.jwt_secret, user_id, &user.email)?;

    Ok(Json(LoginResponse {
        user_id,
        email: user.email,
        token,
    }))
}

/// GET /auth/verify/{uid}/{token} — the link from the registration mail.
/// Any malformed or stale input yields a 401 without touching the account.
pub async fn verify_email(
    State(state): State<AppState>,
    Path((uid, token)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = tokens::decode_uid(&uid).ok_or(ApiError::Unauthorized)?;
    let user = state
        .db
        .get_user_by_id(&user_id.to_string())?
        .ok_or(ApiError::Unauthorized)?;

    if !tokens::check_account_token(&state.jwt_secret, TokenPurpose::VerifyEmail, &user, &token) {
        return Err(ApiError::Unauthorized);
    }

    state.db.mark_email_verified(&user.id)?;
    Ok(Json(serde_json::json!({ "verified": true })))
}

/// Always answers 202 regardless of whether the address exists, so the
/// endpoint cannot be used to enumerate accounts. Mail failures are logged
/// for the same reason instead of surfacing.
pub async fn password_reset(
    State(state): State<AppState>,
    Json(req): Json<PasswordResetRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if let Some(user) = state.db.get_user_by_email(&req.email)? {
        let token =
            tokens::issue_account_token(&state.jwt_secret, TokenPurpose::ResetPassword, &user)?;
        let link = format!(
            "{}/auth/password-reset/confirm?uid={}&token={}",
            state.base_url.trim_end_matches('/'),
            tokens::encode_uid(user.id.parse().unwrap_or_default()),
            token
        );
        if let Err(e) = state.mailer.send_password_reset(&user.email, &link).await {
            warn!("password reset mail to {} failed: {:#}", user.email, e);
        }
    }

    Ok((
        StatusCode::ACCEPTED,
        Json(serde_json::json!({ "status": "accepted" })),
    ))
}

pub async fn password_reset_confirm(
    State(state): State<AppState>,
    Json(req): Json<PasswordResetConfirmRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_password(&req.new_password).map_err(|message| ApiError::Validation {
        field: "new_password",
        message,
    })?;

    let user_id = tokens::decode_uid(&req.uid).ok_or(ApiError::Unauthorized)?;
    let user = state
        .db
        .get_user_by_id(&user_id.to_string())?
        .ok_or(ApiError::Unauthorized)?;

    if !tokens::check_account_token(
        &state.jwt_secret,
        TokenPurpose::ResetPassword,
        &user,
        &req.token,
    ) {
        return Err(ApiError::Unauthorized);
    }

    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(req.new_password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("password hashing failed: {}", e))?
        .to_string();

    state.db.set_user_password(&user.id, &password_hash)?;
    Ok(Json(serde_json::json!({ "status": "password updated" })))
}

fn create_token(secret: &str, user_id: Uuid, email: &str) -> anyhow::Result<String> {
    let claims = Claims {
        sub: user_id,
        email: email.to_string(),
        exp: (chrono::Utc::now() + chrono::Duration::days(30)).timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}
