// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! User account repository.
//!
//! A user record lives in `users` and is reachable through two unique
//! indexes, `users_by_email` and `users_by_username`. Writes that touch a
//! record and an index must run on a transactional [`Handle`] so both land
//! together.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::super::{DbError, DbResult, Handle, USERS, USERS_BY_EMAIL, USERS_BY_USERNAME};

/// Persisted user record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredUser {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    pub email: String,
    /// Argon2id PHC string. Never leaves the storage layer in a response.
    pub password_hash: String,
    #[serde(default)]
    pub phone: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StoredUser {
    /// A fresh account with a random id and no profile data yet.
    pub fn new(email: String, password_hash: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            name: String::new(),
            username: None,
            email,
            password_hash,
            phone: String::new(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Profile fields a user may change about themselves.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileChanges {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub username: Option<String>,
}

impl ProfileChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.phone.is_none() && self.username.is_none()
    }
}

pub struct UserRepository<'a> {
    db: &'a Handle,
}

impl<'a> UserRepository<'a> {
    pub fn new(db: &'a Handle) -> Self {
        Self { db }
    }

    pub fn get(&self, user_id: &str) -> DbResult<Option<StoredUser>> {
        self.db.query(USERS, user_id)
    }

    pub fn find_by_email(&self, email: &str) -> DbResult<Option<StoredUser>> {
        match self.db.query::<String>(USERS_BY_EMAIL, email)? {
            Some(user_id) => self.get(&user_id),
            None => Ok(None),
        }
    }

    /// Owner of `username`, if any.
    pub fn username_owner(&self, username: &str) -> DbResult<Option<String>> {
        self.db.query(USERS_BY_USERNAME, username)
    }

    /// Insert a new user and its email index entry.
    ///
    /// Fails with `AlreadyExists` when the email is taken.
    pub fn create(&self, user: &StoredUser) -> DbResult<()> {
        self.db.create(USERS_BY_EMAIL, &user.email, &user.id)?;
        self.db.create(USERS, &user.id, user)?;
        if let Some(username) = &user.username {
            self.db.create(USERS_BY_USERNAME, username, &user.id)?;
        }
        Ok(())
    }

    /// Apply profile changes and keep the username index in step.
    ///
    /// Fails with `NotFound` for an unknown user and `AlreadyExists` when
    /// the requested username belongs to someone else.
    pub fn update_profile(&self, user_id: &str, changes: &ProfileChanges) -> DbResult<StoredUser> {
        let mut user = self
            .get(user_id)?
            .ok_or_else(|| DbError::NotFound(format!("users/{user_id}")))?;

        if let Some(username) = &changes.username {
            if user.username.as_deref() != Some(username.as_str()) {
                match self.username_owner(username)? {
                    Some(owner) if owner != user.id => {
                        return Err(DbError::AlreadyExists(format!(
                            "users_by_username/{username}"
                        )));
                    }
                    Some(_) => {}
                    None => self.db.create(USERS_BY_USERNAME, username, &user.id)?,
                }
                if let Some(previous) = user.username.take() {
                    self.db.remove(USERS_BY_USERNAME, &previous)?;
                }
                user.username = Some(username.clone());
            }
        }
        if let Some(name) = &changes.name {
            user.name = name.clone();
        }
        if let Some(phone) = &changes.phone {
            user.phone = phone.clone();
        }

        user.updated_at = Utc::now();
        self.db.update(USERS, &user.id, &user)?;
        Ok(user)
    }
}
