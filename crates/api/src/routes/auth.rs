//! Signup, login, and profile endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use common::UserId;
use domain::{Credentials, Mailer, Signup, UpdateProfile};
use serde::Serialize;
use store::{Role, Store, User};

use crate::AppState;
use crate::auth::{AuthUser, issue_token};
use crate::error::ApiError;

/// User identity as served to clients; never carries the password hash.
#[derive(Serialize)]
pub struct UserResponse {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub role: Role,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            role: user.role,
        }
    }
}

#[derive(Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserResponse,
}

/// POST /api/auth/signup — create a local account.
#[tracing::instrument(skip(state, req))]
pub async fn signup<S: Store, M: Mailer + 'static>(
    State(state): State<Arc<AppState<S, M>>>,
    Json(req): Json<Signup>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    let user = state.accounts.signup(req).await?;
    let token = issue_token(
        user.id,
        &state.config.jwt_secret,
        state.config.token_ttl_hours,
    )?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            token,
            user: user.into(),
        }),
    ))
}

/// POST /api/auth/login — verify credentials and issue a token.
#[tracing::instrument(skip(state, req))]
pub async fn login<S: Store, M: Mailer + 'static>(
    State(state): State<Arc<AppState<S, M>>>,
    Json(req): Json<Credentials>,
) -> Result<Json<AuthResponse>, ApiError> {
    let user = state.accounts.login(req).await?;
    let token = issue_token(
        user.id,
        &state.config.jwt_secret,
        state.config.token_ttl_hours,
    )?;

    Ok(Json(AuthResponse {
        token,
        user: user.into(),
    }))
}

/// PUT /api/auth/profile — update the caller's profile and re-issue a
/// token.
#[tracing::instrument(skip(state, user, req))]
pub async fn profile<S: Store, M: Mailer + 'static>(
    State(state): State<Arc<AppState<S, M>>>,
    AuthUser(user): AuthUser,
    Json(req): Json<UpdateProfile>,
) -> Result<Json<AuthResponse>, ApiError> {
    let updated = state.accounts.update_profile(&user, req).await?;
    let token = issue_token(
        updated.id,
        &state.config.jwt_secret,
        state.config.token_ttl_hours,
    )?;

    Ok(Json(AuthResponse {
        token,
        user: updated.into(),
    }))
}
