// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Context-scoped transactions.
//!
//! [`TransactionScope`] owns the shared [`Database`] and lets a caller run a
//! whole call chain inside one redb write transaction:
//!
//! ```rust,ignore
//! scope.with_transaction(&ctx, |ctx| async move {
//!     let db = scope.resolve(&ctx);   // the active transaction
//!     db.create(USERS, &id, &user)?;
//!     Ok::<_, ServiceError>(())
//! }).await?;
//! ```
//!
//! A `with_transaction` call made with a context that already carries an
//! active transaction runs the work on that transaction: no second handle,
//! no nested commit or rollback. Only the outermost call commits. A joined
//! call whose work fails marks the transaction rollback-only, so the outermost
//! call rolls back even if its own work swallowed that error.
//!
//! ## State machine
//!
//! `None → Active → Committed | RolledBack`. A handle counts as rolled back
//! from the moment it leaves `Active` until its commit succeeds.

use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use redb::WriteTransaction;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use super::database::{Database, DbError, DbResult, Handle};
use crate::context::{ContextError, RequestContext, TransactionState};

/// Infrastructure failure of a transaction (as opposed to the work's own error).
#[derive(Debug, thiserror::Error)]
pub enum TransactionError {
    #[error("failed to begin transaction: {0}")]
    Begin(DbError),

    #[error("failed to commit transaction: {0}")]
    Commit(DbError),

    #[error("transaction cancelled")]
    Cancelled,

    #[error("transaction marked rollback-only by a failed nested call")]
    RollbackOnly,

    #[error(transparent)]
    Context(#[from] ContextError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionStatus {
    Active,
    Committed,
    RolledBack,
}

enum Slot {
    Open(WriteTransaction),
    Closed(TransactionStatus),
}

/// One atomic unit of work, owned by the call chain that opened it.
pub struct TransactionHandle {
    id: u64,
    slot: Mutex<Slot>,
    rollback_only: AtomicBool,
}

impl TransactionHandle {
    fn new(id: u64, txn: WriteTransaction) -> Self {
        Self {
            id,
            slot: Mutex::new(Slot::Open(txn)),
            rollback_only: AtomicBool::new(false),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn status(&self) -> TransactionStatus {
        match &*self.lock() {
            Slot::Open(_) => TransactionStatus::Active,
            Slot::Closed(status) => *status,
        }
    }

    /// Run `op` against the open write transaction.
    pub(crate) fn with_write<R>(
        &self,
        op: impl FnOnce(&WriteTransaction) -> DbResult<R>,
    ) -> DbResult<R> {
        match &*self.lock() {
            Slot::Open(txn) => op(txn),
            Slot::Closed(_) => Err(DbError::TransactionFinished(self.id)),
        }
    }

    /// Whether a joined call failed on this transaction.
    pub fn is_rollback_only(&self) -> bool {
        self.rollback_only.load(Ordering::Acquire)
    }

    fn mark_rollback_only(&self) {
        self.rollback_only.store(true, Ordering::Release);
    }

    fn take(&self) -> Option<WriteTransaction> {
        let mut slot = self.lock();
        match std::mem::replace(&mut *slot, Slot::Closed(TransactionStatus::RolledBack)) {
            Slot::Open(txn) => Some(txn),
            closed @ Slot::Closed(_) => {
                *slot = closed;
                None
            }
        }
    }

    /// Blocking: redb syncs the file before returning.
    fn commit(&self) -> Result<(), TransactionError> {
        let txn = self
            .take()
            .ok_or(TransactionError::Commit(DbError::TransactionFinished(self.id)))?;

        txn.commit().map_err(|e| {
            error!(tx_id = self.id, error = %e, "Transaction commit failed");
            TransactionError::Commit(e.into())
        })?;

        *self.lock() = Slot::Closed(TransactionStatus::Committed);
        debug!(tx_id = self.id, "Transaction committed");
        Ok(())
    }

    fn abort(&self, reason: &str) {
        let Some(txn) = self.take() else {
            return;
        };
        match txn.abort() {
            Ok(()) => debug!(tx_id = self.id, reason, "Transaction rolled back"),
            Err(e) => warn!(tx_id = self.id, reason, error = %e, "Transaction rollback failed"),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for TransactionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransactionHandle")
            .field("id", &self.id)
            .field("status", &self.status())
            .field("rollback_only", &self.is_rollback_only())
            .finish()
    }
}

/// Hands every call chain the database handle it should use right now.
#[derive(Debug)]
pub struct TransactionScope {
    db: Arc<Database>,
    opened: AtomicU64,
}

impl TransactionScope {
    /// The shared database is fixed for the lifetime of the scope.
    pub fn new(db: Arc<Database>) -> Self {
        Self {
            db,
            opened: AtomicU64::new(0),
        }
    }

    /// Active transaction of `ctx`, or the shared database. Never fails.
    pub fn resolve(&self, ctx: &RequestContext) -> Handle {
        match ctx.transaction() {
            TransactionState::Active(handle) => Handle::Transaction(Arc::clone(handle)),
            TransactionState::None => Handle::Shared(Arc::clone(&self.db)),
        }
    }

    /// Number of transactions this scope has opened.
    pub fn opened(&self) -> u64 {
        self.opened.load(Ordering::Relaxed)
    }

    /// Run `work` inside a transaction.
    ///
    /// Reuses the context's active transaction if there is one. Otherwise
    /// opens a new one, commits when `work` returns `Ok` and rolls back when
    /// it returns `Err`, in which case that error is returned unchanged. If
    /// the context's cancellation token fires first, the work is dropped,
    /// the transaction rolls back and `Cancelled` is returned.
    ///
    /// A joined call that fails marks the transaction rollback-only. The
    /// outermost call then rolls back and returns `RollbackOnly` even when
    /// its own work returned `Ok`.
    pub async fn with_transaction<T, E, F, Fut>(&self, ctx: &RequestContext, work: F) -> Result<T, E>
    where
        F: FnOnce(RequestContext) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: From<TransactionError>,
    {
        if let TransactionState::Active(handle) = ctx.transaction() {
            debug!(tx_id = handle.id(), "Joining active transaction");
            let result = work(ctx.clone()).await;
            if result.is_err() {
                debug!(tx_id = handle.id(), "Nested work failed, transaction is rollback-only");
                handle.mark_rollback_only();
            }
            return result;
        }

        let cancellation = ctx.cancellation();
        let handle = match until_cancelled(cancellation, self.begin()).await {
            Some(handle) => Arc::new(handle?),
            None => return Err(TransactionError::Cancelled.into()),
        };
        let tx_ctx = ctx
            .with_transaction(Arc::clone(&handle))
            .map_err(TransactionError::from)?;

        match until_cancelled(cancellation, work(tx_ctx)).await {
            Some(Ok(_)) if handle.is_rollback_only() => {
                self.rollback(&handle, "rollback-only").await;
                Err(TransactionError::RollbackOnly.into())
            }
            Some(Ok(value)) => {
                self.commit(&handle).await?;
                Ok(value)
            }
            Some(Err(e)) => {
                self.rollback(&handle, "work failed").await;
                Err(e)
            }
            None => {
                self.rollback(&handle, "cancelled").await;
                Err(TransactionError::Cancelled.into())
            }
        }
    }

    async fn begin(&self) -> Result<TransactionHandle, TransactionError> {
        let db = Arc::clone(&self.db);
        // redb admits one writer at a time; wait for it off the async workers.
        let txn = tokio::task::spawn_blocking(move || db.begin_write())
            .await
            .map_err(|e| TransactionError::Begin(DbError::Task(e.to_string())))?
            .map_err(TransactionError::Begin)?;

        let id = self.opened.fetch_add(1, Ordering::Relaxed) + 1;
        debug!(tx_id = id, "Transaction opened");
        Ok(TransactionHandle::new(id, txn))
    }

    // The status moves inside the blocking task, so a caller dropped while
    // waiting cannot leave a committed handle reporting `Active`.
    async fn commit(&self, handle: &Arc<TransactionHandle>) -> Result<(), TransactionError> {
        let handle = Arc::clone(handle);
        tokio::task::spawn_blocking(move || handle.commit())
            .await
            .map_err(|e| TransactionError::Commit(DbError::Task(e.to_string())))?
    }

    async fn rollback(&self, handle: &Arc<TransactionHandle>, reason: &'static str) {
        let task_handle = Arc::clone(handle);
        if let Err(e) = tokio::task::spawn_blocking(move || task_handle.abort(reason)).await {
            warn!(tx_id = handle.id(), reason, error = %e, "Transaction rollback task failed");
        }
    }
}

/// Drive `fut` to completion unless `token` fires first.
async fn until_cancelled<F: Future>(token: Option<&CancellationToken>, fut: F) -> Option<F::Output> {
    match token {
        Some(token) => {
            if token.is_cancelled() {
                return None;
            }
            tokio::select! {
                output = fut => Some(output),
                _ = token.cancelled() => None,
            }
        }
        None => Some(fut.await),
    }
}
