// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Storage Module
//!
//! Persistent account storage on an embedded redb file.
//!
//! ## Layout
//!
//! ```text
//! {DATA_DIR}/
//!   app.redb
//!     users               # user_id → StoredUser
//!     users_by_email      # email → user_id
//!     users_by_username   # username → user_id
//! ```
//!
//! ## Transactions
//!
//! Every call chain asks [`TransactionScope::resolve`] for its [`Handle`].
//! Inside [`TransactionScope::with_transaction`] that is the chain's write
//! transaction; everywhere else it is the shared database, where each write
//! commits on its own.

pub mod database;
pub mod repository;
pub mod transaction;

pub use database::{
    Database, DbError, DbResult, Handle, JsonTable, USERS, USERS_BY_EMAIL, USERS_BY_USERNAME,
};
pub use repository::{ProfileChanges, StoredUser, UserRepository};
pub use transaction::{TransactionError, TransactionHandle, TransactionScope, TransactionStatus};
