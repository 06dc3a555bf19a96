//! Account registration, login and password recovery
//!
//! Passwords are hashed with bcrypt on the blocking pool. Verification and
//! reset tokens are random UUIDs stored on the user. Login hands back an
//! opaque token; sessions are not tracked server side.

use super::handlers::{ApiResponse, payload};
use crate::config::AuthConfig;
use crate::core::error::{CrmError, EntityError, RequestError};
use crate::core::{DataService, Entity};
use crate::entities::{User, UserView};
use crate::mail::{Email, MailError, Mailer, templates};
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use chrono::{Duration, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

#[derive(Clone)]
pub struct AuthState {
    pub users: Arc<dyn DataService<User>>,
    pub mailer: Arc<dyn Mailer>,
    pub config: AuthConfig,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
    #[validate(email(message = "a valid email is required"))]
    pub email: String,
    #[validate(length(min = 6, message = "password must be at least 6 characters"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "a valid email is required"))]
    pub email: String,
    #[validate(length(min = 1, message = "password is required"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ForgotPasswordRequest {
    #[validate(email(message = "a valid email is required"))]
    pub email: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ResetPasswordRequest {
    #[validate(length(min = 6, message = "password must be at least 6 characters"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct VerifyEmailRequest {
    #[validate(length(min = 1, message = "token is required"))]
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user: UserView,
    pub token: String,
}

/// Decode and validate a JSON body.
fn validated<T: DeserializeOwned + Validate>(
    body: Result<Json<Value>, JsonRejection>,
) -> Result<T, CrmError> {
    let request: T = serde_json::from_value(payload(body)?).map_err(|e| {
        CrmError::Validation(crate::core::error::ValidationError::InvalidPayload {
            message: e.to_string(),
        })
    })?;
    request.validate()?;
    Ok(request)
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

async fn hash_password(password: String, cost: u32) -> Result<String, CrmError> {
    tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(|e| CrmError::Internal(e.to_string()))?
        .map_err(|e| CrmError::Internal(format!("password hashing failed: {}", e)))
}

async fn verify_password(password: String, hash: String) -> Result<bool, CrmError> {
    tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|e| CrmError::Internal(e.to_string()))?
        .map_err(|e| CrmError::Internal(format!("password check failed: {}", e)))
}

impl AuthState {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, CrmError> {
        let email = normalize_email(email);
        Ok(self
            .users
            .list()
            .await?
            .into_iter()
            .find(|u| u.email == email))
    }

    async fn find_by<F>(&self, predicate: F) -> Result<Option<User>, CrmError>
    where
        F: Fn(&User) -> bool,
    {
        Ok(self.users.list().await?.into_iter().find(|u| predicate(u)))
    }

    fn link(&self, path: &str, token: &str) -> String {
        format!("{}/{}/{}", self.config.app_base_url.trim_end_matches('/'), path, token)
    }

    /// Send a message; delivery problems are logged, never surfaced.
    async fn send(&self, email: Result<Email, MailError>, user_id: Uuid) {
        let result = match email {
            Ok(email) => self.mailer.send(email).await,
            Err(e) => Err(e),
        };
        if let Err(e) = result {
            tracing::warn!(user_id = %user_id, error = %e, "account email not sent");
        }
    }
}

pub async fn register(
    State(state): State<AuthState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<UserView>>), CrmError> {
    let request: RegisterRequest = validated(body)?;
    let email = normalize_email(&request.email);

    if state.find_by_email(&email).await?.is_some() {
        return Err(EntityError::AlreadyExists {
            entity_type: "user".to_string(),
            key: email,
        }
        .into());
    }

    let now = Utc::now();
    let token = Uuid::new_v4().to_string();
    let user = User {
        id: Uuid::new_v4(),
        created_at: now,
        updated_at: now,
        name: request.name.trim().to_string(),
        email,
        password_hash: hash_password(request.password, state.config.bcrypt_cost).await?,
        is_verified: false,
        verification_token: Some(token.clone()),
        reset_token: None,
        reset_token_expires_at: None,
    };
    let user = state.users.create(user).await?;
    tracing::info!(user_id = %user.id, "user registered");

    let link = state.link("verify-email", &token);
    state
        .send(templates::verification(&user.email, &user.name, &link), user.id)
        .await;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok("user registered successfully", user.view())),
    ))
}

pub async fn login(
    State(state): State<AuthState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<ApiResponse<LoginResponse>>, CrmError> {
    let request: LoginRequest = validated(body)?;
    let rejected = || {
        CrmError::from(RequestError::Unauthorized {
            message: "invalid email or password".to_string(),
        })
    };

    let user = state.find_by_email(&request.email).await?.ok_or_else(rejected)?;
    if !verify_password(request.password, user.password_hash.clone()).await? {
        tracing::debug!(user_id = %user.id, "login rejected");
        return Err(rejected());
    }

    Ok(Json(ApiResponse::ok(
        "login successful",
        LoginResponse {
            user: user.view(),
            token: Uuid::new_v4().to_string(),
        },
    )))
}

/// Answers 200 whether or not the address is registered.
pub async fn forgot_password(
    State(state): State<AuthState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<ApiResponse<Value>>, CrmError> {
    let request: ForgotPasswordRequest = validated(body)?;

    if let Some(mut user) = state.find_by_email(&request.email).await? {
        let token = Uuid::new_v4().to_string();
        user.reset_token = Some(token.clone());
        user.reset_token_expires_at =
            Some(Utc::now() + Duration::minutes(state.config.reset_token_ttl_minutes));
        user.touch();
        let user = state.users.update(&user.id, user.clone()).await?;

        let link = state.link("reset-password", &token);
        state
            .send(
                templates::password_reset(
                    &user.email,
                    &user.name,
                    &link,
                    state.config.reset_token_ttl_minutes,
                ),
                user.id,
            )
            .await;
    }

    Ok(Json(ApiResponse::ok(
        "if the address is registered, a reset link has been sent",
        Value::Null,
    )))
}

pub async fn reset_password(
    State(state): State<AuthState>,
    Path(token): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<ApiResponse<Value>>, CrmError> {
    let request: ResetPasswordRequest = validated(body)?;
    let now = Utc::now();

    let mut user = state
        .find_by(|u| u.reset_token_valid(&token, now))
        .await?
        .ok_or_else(|| RequestError::InvalidToken {
            message: "reset link is invalid or has expired".to_string(),
        })?;

    user.password_hash = hash_password(request.password, state.config.bcrypt_cost).await?;
    user.reset_token = None;
    user.reset_token_expires_at = None;
    user.touch();
    state.users.update(&user.id, user.clone()).await?;
    tracing::info!(user_id = %user.id, "password reset");

    Ok(Json(ApiResponse::ok("password has been reset", Value::Null)))
}

pub async fn verify_email(
    State(state): State<AuthState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<ApiResponse<UserView>>, CrmError> {
    let request: VerifyEmailRequest = validated(body)?;

    let mut user = state
        .find_by(|u| u.verification_token.as_deref() == Some(request.token.as_str()))
        .await?
        .ok_or_else(|| RequestError::InvalidToken {
            message: "verification token is invalid".to_string(),
        })?;

    user.is_verified = true;
    user.verification_token = None;
    user.touch();
    let user = state.users.update(&user.id, user.clone()).await?;

    Ok(Json(ApiResponse::ok("email verified", user.view())))
}

pub fn routes(state: AuthState) -> Router {
    Router::new()
        .route("/api/v1/auth/register", post(register))
        .route("/api/v1/auth/login", post(login))
        .route("/api/v1/auth/forgotPassword", post(forgot_password))
        .route("/api/v1/auth/resetPassword/{token}", post(reset_password))
        .route("/api/v1/auth/verifyEmail", post(verify_email))
        .with_state(state)
}
