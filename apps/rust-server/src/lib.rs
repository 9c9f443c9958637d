// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Pokedex Backend - Account API
//!
//! Account registration, login and profile service with stateless bearer
//! tokens and context-scoped transactions over an embedded redb store.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `auth` - Token lifecycle, auth gate and password hashing
//! - `context` - Per-request context carrier (identity, transaction, cancellation)
//! - `services` - Account and profile business logic
//! - `storage` - redb storage and the transaction scope

pub mod api;
pub mod auth;
pub mod config;
pub mod context;
pub mod error;
pub mod models;
pub mod services;
pub mod state;
pub mod storage;
