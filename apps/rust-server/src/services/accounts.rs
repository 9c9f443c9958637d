// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Registration, login and token refresh.

use std::sync::Arc;

use tracing::{info, warn};

use super::ServiceError;
use crate::auth::{hash_password, verify_password, Token, TokenService, TokenSubject};
use crate::context::RequestContext;
use crate::storage::{DbError, StoredUser, TransactionScope, UserRepository};

pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Clone)]
pub struct AccountService {
    scope: Arc<TransactionScope>,
    tokens: Arc<TokenService>,
}

impl AccountService {
    pub fn new(scope: Arc<TransactionScope>, tokens: Arc<TokenService>) -> Self {
        Self { scope, tokens }
    }

    /// Create an account and sign the caller in.
    ///
    /// The user record and its email index are written in one transaction.
    pub async fn register(
        &self,
        ctx: &RequestContext,
        email: &str,
        password: &str,
    ) -> Result<(StoredUser, Token), ServiceError> {
        let email = email.trim();
        validate_email(email)?;
        validate_password(password)?;

        let password = password.to_string();
        let hash = run_blocking(move || hash_password(&password)).await??;
        let user = StoredUser::new(email.to_string(), hash);

        let user = self
            .scope
            .with_transaction(ctx, |ctx| async move {
                let db = self.scope.resolve(&ctx);
                UserRepository::new(&db).create(&user).map_err(|e| match e {
                    DbError::AlreadyExists(_) => {
                        ServiceError::Conflict("Email already exists".to_string())
                    }
                    other => other.into(),
                })?;
                Ok::<_, ServiceError>(user)
            })
            .await?;

        let token = self.tokens.issue(&subject(&user))?;
        info!(user_id = %user.id, "User registered");
        Ok((user, token))
    }

    pub async fn login(
        &self,
        ctx: &RequestContext,
        email: &str,
        password: &str,
    ) -> Result<(StoredUser, Token), ServiceError> {
        let db = self.scope.resolve(ctx);
        let Some(user) = UserRepository::new(&db).find_by_email(email.trim())? else {
            warn!("Login attempt for unknown email");
            return Err(ServiceError::InvalidCredentials);
        };

        let password = password.to_string();
        let stored_hash = user.password_hash.clone();
        if !run_blocking(move || verify_password(&password, &stored_hash)).await?? {
            warn!(user_id = %user.id, "Login attempt with wrong password");
            return Err(ServiceError::InvalidCredentials);
        }

        let token = self.tokens.issue(&subject(&user))?;
        info!(user_id = %user.id, "User logged in");
        Ok((user, token))
    }

    /// Trade a still-valid token for a fresh, shorter-lived one.
    pub fn refresh(&self, token: &str) -> Result<Token, ServiceError> {
        Ok(self.tokens.renew(token)?)
    }
}

fn subject(user: &StoredUser) -> TokenSubject {
    TokenSubject::new(&user.id, &user.email)
}

fn validate_email(email: &str) -> Result<(), ServiceError> {
    if email.is_empty() {
        return Err(ServiceError::Validation("Email is required".to_string()));
    }
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    };
    if valid {
        Ok(())
    } else {
        Err(ServiceError::Validation("Invalid email format".to_string()))
    }
}

fn validate_password(password: &str) -> Result<(), ServiceError> {
    if password.is_empty() {
        return Err(ServiceError::Validation("Password is required".to_string()));
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ServiceError::Validation(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters long"
        )));
    }
    Ok(())
}

/// Argon2 is deliberately slow; keep it off the async workers.
async fn run_blocking<T, F>(f: F) -> Result<T, ServiceError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ServiceError::Task(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{Secret, TokenError};
    use crate::storage::Database;

    struct Fixture {
        accounts: AccountService,
        scope: Arc<TransactionScope>,
        tokens: Arc<TokenService>,
        _dir: tempfile::TempDir,
    }

    fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open(&dir.path().join("accounts.redb")).unwrap();
        let scope = Arc::new(TransactionScope::new(Arc::new(db)));
        let tokens =
            Arc::new(TokenService::new(&Secret::new(b"accounts-secret".to_vec()), "test").unwrap());
        Fixture {
            accounts: AccountService::new(Arc::clone(&scope), Arc::clone(&tokens)),
            scope,
            tokens,
            _dir: dir,
        }
    }

    #[tokio::test]
    async fn register_then_login() {
        let f = fixture();
        let ctx = RequestContext::new();

        let (user, token) = f.accounts.register(&ctx, " ash@example.com ", "pikachu").await.unwrap();
        assert_eq!(user.email, "ash@example.com");
        assert_ne!(user.password_hash, "pikachu");
        assert_eq!(f.tokens.validate(token.as_str()).unwrap().user_id(), user.id);

        let (logged_in, token) = f.accounts.login(&ctx, "ash@example.com", "pikachu").await.unwrap();
        assert_eq!(logged_in.id, user.id);
        assert_eq!(f.tokens.validate(token.as_str()).unwrap().email(), "ash@example.com");
    }

    #[tokio::test]
    async fn duplicate_email_is_conflict() {
        let f = fixture();
        let ctx = RequestContext::new();
        f.accounts.register(&ctx, "ash@example.com", "pikachu").await.unwrap();

        let err = f
            .accounts
            .register(&ctx, "ash@example.com", "bulbasaur")
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
    }

    #[tokio::test]
    async fn register_validates_input() {
        let f = fixture();
        let ctx = RequestContext::new();

        for email in ["", "ash", "@example.com", "ash@example", "ash@.com", "a b@example.com"] {
            let err = f.accounts.register(&ctx, email, "pikachu").await.unwrap_err();
            assert!(matches!(err, ServiceError::Validation(_)), "{email}");
        }
        let err = f.accounts.register(&ctx, "ash@example.com", "pika").await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(msg) if msg.contains("at least 6")));
    }

    #[tokio::test]
    async fn login_failures_are_indistinguishable() {
        let f = fixture();
        let ctx = RequestContext::new();
        f.accounts.register(&ctx, "ash@example.com", "pikachu").await.unwrap();

        let wrong_password = f.accounts.login(&ctx, "ash@example.com", "raichu").await.unwrap_err();
        let unknown_email = f.accounts.login(&ctx, "gary@example.com", "pikachu").await.unwrap_err();

        assert_eq!(wrong_password.to_string(), "Invalid email or password");
        assert_eq!(unknown_email.to_string(), wrong_password.to_string());
    }

    #[tokio::test]
    async fn registration_joins_the_callers_transaction() {
        let f = fixture();
        let result = f
            .scope
            .with_transaction(&RequestContext::new(), |ctx| {
                let accounts = f.accounts.clone();
                async move {
                    accounts.register(&ctx, "ash@example.com", "pikachu").await?;
                    Err::<(), _>(ServiceError::Validation("abort".into()))
                }
            })
            .await;

        assert!(matches!(result, Err(ServiceError::Validation(_))));
        assert_eq!(f.scope.opened(), 1);

        let err = f
            .accounts
            .login(&RequestContext::new(), "ash@example.com", "pikachu")
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidCredentials));
    }

    #[tokio::test]
    async fn refresh_returns_a_new_valid_token() {
        let f = fixture();
        let (_, token) = f
            .accounts
            .register(&RequestContext::new(), "ash@example.com", "pikachu")
            .await
            .unwrap();

        let renewed = f.accounts.refresh(token.as_str()).unwrap();
        assert!(f.tokens.validate(renewed.as_str()).is_ok());

        let err = f.accounts.refresh("garbage").unwrap_err();
        assert!(matches!(err, ServiceError::Token(TokenError::Malformed)));
    }
}
