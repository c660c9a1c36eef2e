use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use common_auth::Role;
use common_http_errors::{ApiError, ApiResult};
use rand_core::OsRng;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::repo::{self, UserRow};
use crate::tokens::TokenSubject;
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct NewUser {
    pub username: String,
    pub password: String,
    pub role: String,
}

/// Account view returned to clients; the password hash never leaves the store layer.
#[derive(Debug, Serialize)]
pub struct UserSummary {
    pub id: i64,
    pub username: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user_id: i64,
    pub username: String,
    pub role: Role,
}

pub async fn signup_user(
    State(state): State<AppState>,
    payload: Result<Json<NewUser>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<UserSummary>)> {
    let Json(new_user) = payload.map_err(|_| invalid_body())?;
    let NewUser {
        username,
        password,
        role,
    } = new_user;

    let username = username.trim();
    if username.is_empty() {
        return Err(ApiError::bad_request(
            "invalid_user",
            "Username and password are required",
        ));
    }
    let role = validate_role(&role)?;
    let password_hash = hash_password(&password)?;

    let row = repo::insert_user(&state.db, username, &password_hash, role.as_str())
        .await
        .map_err(|err| match err {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                ApiError::conflict("username_taken", "Username already exists")
            }
            other => {
                error!(error = %other, "Failed to create user");
                ApiError::internal("Failed to create user")
            }
        })?;

    info!(user_id = row.id, role = %role, "user registered");
    Ok((StatusCode::CREATED, Json(summarize(row, role))))
}

pub async fn login_user(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<Json<LoginResponse>> {
    let Json(LoginRequest { username, password }) = payload.map_err(|_| invalid_body())?;

    let row = match repo::find_user_by_username(&state.db, username.trim())
        .await
        .map_err(|err| {
            error!(error = %err, "Login lookup failed");
            ApiError::internal("Failed to log in")
        })? {
        Some(row) => row,
        None => {
            state.metrics.login_attempt("unknown_user");
            return Err(invalid_credentials());
        }
    };

    if !verify_password(&password, &row.password_hash) {
        state.metrics.login_attempt("invalid_credentials");
        warn!(user_id = row.id, "Rejected login with wrong password");
        return Err(invalid_credentials());
    }

    let role = row.role.parse::<Role>().map_err(|err| {
        error!(user_id = row.id, error = %err, "Stored role is not recognised");
        ApiError::internal("Failed to log in")
    })?;

    let issued = state
        .token_signer
        .issue(TokenSubject {
            user_id: row.id,
            username: &row.username,
            role,
        })
        .map_err(|err| {
            error!(user_id = row.id, error = ?err, "Failed to issue token");
            ApiError::internal("Unable to issue authentication token")
        })?;

    state.metrics.login_attempt("success");
    info!(user_id = row.id, expires_at = %issued.expires_at, "login succeeded");

    Ok(Json(LoginResponse {
        token: issued.token,
        user_id: row.id,
        username: row.username,
        role,
    }))
}

fn summarize(row: UserRow, role: Role) -> UserSummary {
    UserSummary {
        id: row.id,
        username: row.username,
        role,
        created_at: row.created_at,
    }
}

fn invalid_body() -> ApiError {
    ApiError::bad_request("invalid_body", "Invalid request body")
}

fn invalid_credentials() -> ApiError {
    ApiError::unauthorized("invalid_credentials", "Invalid username or password")
}

fn validate_role(role: &str) -> ApiResult<Role> {
    role.parse::<Role>().map_err(|_| {
        let allowed = Role::ALL.map(|role| role.as_str()).join(", ");
        ApiError::bad_request(
            "invalid_role",
            format!("Unsupported role '{role}'. Allowed roles: {allowed}"),
        )
    })
}

fn hash_password(password: &str) -> ApiResult<String> {
    if password.trim().is_empty() {
        return Err(ApiError::bad_request(
            "invalid_user",
            "Username and password are required",
        ));
    }

    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| {
            error!(error = %err, "Failed to hash password");
            ApiError::internal("Failed to create user")
        })
}

fn verify_password(password: &str, stored_hash: &str) -> bool {
    match PasswordHash::new(stored_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(err) => {
            warn!(error = %err, "Stored password hash is unreadable");
            false
        }
    }
}
