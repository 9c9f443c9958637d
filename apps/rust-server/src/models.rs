// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Request and response bodies of the account API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::storage::StoredUser;

/// Public view of a user account. Never carries the password hash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct User {
    pub id: String,
    pub name: String,
    pub username: Option<String>,
    pub email: String,
    pub phone: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<StoredUser> for User {
    fn from(user: StoredUser) -> Self {
        Self {
            id: user.id,
            name: user.name,
            username: user.username,
            email: user.email,
            phone: user.phone,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CredentialsRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RegisterResponse {
    pub user: User,
    pub message: String,
    pub token: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    pub user: User,
    pub token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TokenRequest {
    pub token: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TokenResponse {
    pub token: String,
}

/// Fields a user may change on their own profile; anything else is rejected.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub username: Option<String>,
}

/// Who the caller is, if anyone.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SessionResponse {
    pub authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_view_drops_password_hash() {
        let stored = StoredUser::new("ash@example.com".into(), "$argon2id$secret".into());
        let json = serde_json::to_string(&User::from(stored.clone())).unwrap();

        assert!(!json.contains("argon2id"));
        assert!(!json.contains("password"));
        assert!(json.contains(&stored.id));
    }

    #[test]
    fn profile_request_rejects_unknown_fields() {
        let result = serde_json::from_str::<UpdateProfileRequest>(r#"{"email":"x@y.z"}"#);
        assert!(result.is_err());

        let ok: UpdateProfileRequest = serde_json::from_str(r#"{"name":"Ash"}"#).unwrap();
        assert_eq!(ok.name.as_deref(), Some("Ash"));
        assert!(ok.phone.is_none());
    }

    #[test]
    fn anonymous_session_omits_identity_fields() {
        let body = SessionResponse {
            authenticated: false,
            user_id: None,
            email: None,
        };
        assert_eq!(serde_json::to_string(&body).unwrap(), r#"{"authenticated":false}"#);
    }
}
