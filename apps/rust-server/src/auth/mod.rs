// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Stateless bearer tokens for the account API.
//!
//! ## Auth Flow
//!
//! 1. `POST /api/v1/register` or `/api/v1/login` returns a token signed with
//!    the server's single HS256 secret, valid for 72 hours
//! 2. The client sends `Authorization: Bearer <token>`
//! 3. The auth gate validates the token and attaches an [`Identity`] to the
//!    request context:
//!    - `sub` → `user_id`
//!    - `email`
//!    - `iat` / `nbf` / `exp` → validity window
//! 4. `POST /api/v1/token/refresh` trades a still-valid token for a new one
//!    valid for 24 hours
//!
//! ## Security
//!
//! - Only HS256 is accepted; tokens naming another algorithm are rejected
//! - No clock-skew leeway
//! - No revocation list: a token is trusted until it expires
//! - Passwords are stored as Argon2id hashes

pub mod claims;
pub mod codec;
pub mod error;
pub mod extractor;
pub mod middleware;
pub mod password;
pub mod token;

pub use claims::{Identity, TokenSubject};
pub use codec::{ClaimsCodec, Secret, Token};
pub use error::{AuthError, TokenError};
pub use extractor::{Auth, Ctx, OptionalAuth};
pub use middleware::{optional_auth, request_context, require_auth, AuthGate, AuthMode};
pub use password::{hash_password, verify_password, PasswordError};
pub use token::{TokenService, ISSUE_TTL_HOURS, RENEW_TTL_HOURS};
