// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Repository layer providing typed access to the account tables.
//!
//! Repositories borrow a [`Handle`](super::Handle) and never decide on their
//! own whether to open a transaction.

pub mod users;

pub use users::{ProfileChanges, StoredUser, UserRepository};
