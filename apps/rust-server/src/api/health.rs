// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::Json;

use crate::models::MessageResponse;

/// Liveness probe.
#[utoipa::path(
    get,
    path = "/ping",
    tag = "Health",
    responses((status = 200, body = MessageResponse))
)]
pub async fn ping() -> Json<MessageResponse> {
    Json(MessageResponse {
        message: "pong".to_string(),
    })
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Health",
    responses((status = 200, body = String))
)]
pub async fn root() -> &'static str {
    "Hello World!"
}
