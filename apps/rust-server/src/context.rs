// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Per-request context carrier.
//!
//! A [`RequestContext`] is threaded explicitly down a call chain. It has two
//! named slots, the authenticated [`Identity`] and the [`TransactionState`],
//! and both are append-only: once set they are never replaced for the rest of
//! the chain. Augmenting returns a new context and leaves the original as is.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::auth::Identity;
use crate::storage::TransactionHandle;

/// Attempt to overwrite a slot that is already set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ContextError {
    #[error("an identity is already attached to this request context")]
    IdentityAlreadyAttached,
    #[error("a transaction is already active in this request context")]
    TransactionAlreadyActive,
}

/// Transaction status of a call chain.
#[derive(Debug, Clone, Default)]
pub enum TransactionState {
    #[default]
    None,
    Active(Arc<TransactionHandle>),
}

impl TransactionState {
    pub fn is_active(&self) -> bool {
        matches!(self, TransactionState::Active(_))
    }
}

#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    identity: Option<Arc<Identity>>,
    transaction: TransactionState,
    cancellation: Option<CancellationToken>,
}

impl RequestContext {
    /// Anonymous context with no transaction.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a caller-supplied cancellation signal (deadline, disconnect).
    ///
    /// Transactions opened under this context roll back when it fires.
    pub fn with_cancellation(&self, token: CancellationToken) -> Self {
        Self {
            cancellation: Some(token),
            ..self.clone()
        }
    }

    pub fn with_identity(&self, identity: Identity) -> Result<Self, ContextError> {
        if self.identity.is_some() {
            return Err(ContextError::IdentityAlreadyAttached);
        }
        Ok(Self {
            identity: Some(Arc::new(identity)),
            ..self.clone()
        })
    }

    pub(crate) fn with_transaction(
        &self,
        handle: Arc<TransactionHandle>,
    ) -> Result<Self, ContextError> {
        if self.transaction.is_active() {
            return Err(ContextError::TransactionAlreadyActive);
        }
        Ok(Self {
            transaction: TransactionState::Active(handle),
            ..self.clone()
        })
    }

    /// The authenticated caller, or `None` for anonymous requests.
    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_deref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.identity.is_some()
    }

    pub fn transaction(&self) -> &TransactionState {
        &self.transaction
    }

    pub fn cancellation(&self) -> Option<&CancellationToken> {
        self.cancellation.as_ref()
    }
}
