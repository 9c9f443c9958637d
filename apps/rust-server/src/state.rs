// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use crate::auth::{AuthGate, Secret, TokenError, TokenService};
use crate::services::{AccountService, ProfileService};
use crate::storage::{Database, TransactionScope};

/// Shared handles wired once at startup.
#[derive(Debug, Clone)]
pub struct AppState {
    pub accounts: AccountService,
    pub profiles: ProfileService,
    pub gate: AuthGate,
}

impl AppState {
    pub fn new(db: Database, secret: &Secret, issuer: &str) -> Result<Self, TokenError> {
        let scope = Arc::new(TransactionScope::new(Arc::new(db)));
        let tokens = Arc::new(TokenService::new(secret, issuer)?);
        Ok(Self {
            accounts: AccountService::new(Arc::clone(&scope), Arc::clone(&tokens)),
            profiles: ProfileService::new(Arc::clone(&scope)),
            gate: AuthGate::new(tokens),
        })
    }
}
