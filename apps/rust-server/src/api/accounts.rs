// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Registration, login and token refresh endpoints.

use axum::{extract::rejection::JsonRejection, extract::State, http::StatusCode, Json};

use super::json_body;
use crate::{
    auth::Ctx,
    error::ApiError,
    models::{CredentialsRequest, LoginResponse, RegisterResponse, TokenRequest, TokenResponse},
    state::AppState,
};

#[utoipa::path(
    post,
    path = "/api/v1/register",
    request_body = CredentialsRequest,
    tag = "Accounts",
    responses(
        (status = 201, description = "Account created", body = RegisterResponse),
        (status = 400, description = "Missing or invalid email or password"),
        (status = 409, description = "Email already exists"),
    )
)]
pub async fn register(
    State(state): State<AppState>,
    Ctx(ctx): Ctx,
    payload: Result<Json<CredentialsRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<RegisterResponse>), ApiError> {
    let request = json_body(payload)?;
    let (user, token) = state
        .accounts
        .register(&ctx, &request.email, &request.password)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            user: user.into(),
            message: "User registered successfully".to_string(),
            token: token.into_string(),
        }),
    ))
}

#[utoipa::path(
    post,
    path = "/api/v1/login",
    request_body = CredentialsRequest,
    tag = "Accounts",
    responses(
        (status = 200, description = "Signed in", body = LoginResponse),
        (status = 400, description = "Missing email or password"),
        (status = 401, description = "Invalid email or password"),
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Ctx(ctx): Ctx,
    payload: Result<Json<CredentialsRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, ApiError> {
    let request = json_body(payload)?;
    if request.email.trim().is_empty() || request.password.is_empty() {
        return Err(ApiError::bad_request("Email and password are required"));
    }

    let (user, token) = state
        .accounts
        .login(&ctx, &request.email, &request.password)
        .await?;

    Ok(Json(LoginResponse {
        user: user.into(),
        token: token.into_string(),
    }))
}

/// Exchange a still-valid token for a fresh one with a 24 hour lifetime.
#[utoipa::path(
    post,
    path = "/api/v1/token/refresh",
    request_body = TokenRequest,
    tag = "Accounts",
    responses(
        (status = 200, description = "Renewed token", body = TokenResponse),
        (status = 401, description = "Token is malformed, forged or expired"),
    )
)]
pub async fn refresh_token(
    State(state): State<AppState>,
    payload: Result<Json<TokenRequest>, JsonRejection>,
) -> Result<Json<TokenResponse>, ApiError> {
    let request = json_body(payload)?;
    let token = state.accounts.refresh(&request.token)?;
    Ok(Json(TokenResponse {
        token: token.into_string(),
    }))
}
