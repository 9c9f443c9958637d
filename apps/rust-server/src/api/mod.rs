// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::time::Duration;

use axum::{
    extract::rejection::JsonRejection,
    middleware::from_fn_with_state,
    routing::{get, post},
    Json, Router,
};
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    auth::{optional_auth, request_context, require_auth},
    error::ApiError,
    models::{
        CredentialsRequest, LoginResponse, MessageResponse, RegisterResponse, SessionResponse,
        TokenRequest, TokenResponse, UpdateProfileRequest, User,
    },
    state::AppState,
};

pub mod accounts;
pub mod health;
pub mod profile;
pub mod session;

pub fn router(state: AppState, request_timeout: Duration) -> Router {
    let protected = Router::new()
        .route(
            "/profile",
            get(profile::get_profile).put(profile::update_profile),
        )
        .route_layer(from_fn_with_state(state.gate.clone(), require_auth));

    let session = Router::new()
        .route("/session", get(session::get_session))
        .route_layer(from_fn_with_state(state.gate.clone(), optional_auth));

    let v1_routes = Router::new()
        .route("/register", post(accounts::register))
        .route("/login", post(accounts::login))
        .route("/token/refresh", post(accounts::refresh_token))
        .merge(protected)
        .merge(session)
        .with_state(state);

    Router::new()
        .route("/", get(health::root))
        .route("/ping", get(health::ping))
        .nest("/api/v1", v1_routes)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(from_fn_with_state(request_timeout, request_context))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(CorsLayer::permissive())
}

/// Unwrap a JSON body, turning any rejection into a 400.
fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| ApiError::bad_request(rejection.body_text()))
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::root,
        health::ping,
        accounts::register,
        accounts::login,
        accounts::refresh_token,
        session::get_session,
        profile::get_profile,
        profile::update_profile
    ),
    components(
        schemas(
            User,
            CredentialsRequest,
            RegisterResponse,
            LoginResponse,
            TokenRequest,
            TokenResponse,
            UpdateProfileRequest,
            SessionResponse,
            MessageResponse
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "Health", description = "Liveness"),
        (name = "Accounts", description = "Registration, login and tokens"),
        (name = "Profile", description = "The caller's own profile")
    )
)]
struct ApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}
