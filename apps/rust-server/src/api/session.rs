// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::Json;

use crate::{auth::OptionalAuth, models::SessionResponse};

/// Report whether the request carried a valid token. Never fails.
#[utoipa::path(
    get,
    path = "/api/v1/session",
    tag = "Accounts",
    security((), ("bearer" = [])),
    responses((status = 200, body = SessionResponse))
)]
pub async fn get_session(OptionalAuth(identity): OptionalAuth) -> Json<SessionResponse> {
    Json(match identity {
        Some(identity) => SessionResponse {
            authenticated: true,
            user_id: Some(identity.user_id().to_string()),
            email: Some(identity.email().to_string()),
        },
        None => SessionResponse {
            authenticated: false,
            user_id: None,
            email: None,
        },
    })
}
