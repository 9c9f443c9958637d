// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Account business logic.
//!
//! Services take the request's [`RequestContext`](crate::context::RequestContext)
//! and get their database handle from the transaction scope, so a caller that
//! already opened a transaction pulls them into it.

pub mod accounts;
pub mod profile;

pub use accounts::AccountService;
pub use profile::ProfileService;

use crate::auth::{PasswordError, TokenError};
use crate::storage::{DbError, TransactionError};

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("{0}")]
    Validation(String),

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("{0}")]
    Conflict(String),

    #[error("User not found")]
    NotFound,

    #[error(transparent)]
    Token(#[from] TokenError),

    #[error(transparent)]
    Password(#[from] PasswordError),

    #[error(transparent)]
    Database(#[from] DbError),

    #[error(transparent)]
    Transaction(#[from] TransactionError),

    #[error("background task failed: {0}")]
    Task(String),
}
