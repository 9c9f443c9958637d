// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Reading and editing the caller's own profile.

use std::sync::Arc;

use tracing::info;

use super::ServiceError;
use crate::context::RequestContext;
use crate::models::UpdateProfileRequest;
use crate::storage::{DbError, ProfileChanges, StoredUser, TransactionScope, UserRepository};

#[derive(Debug, Clone)]
pub struct ProfileService {
    scope: Arc<TransactionScope>,
}

impl ProfileService {
    pub fn new(scope: Arc<TransactionScope>) -> Self {
        Self { scope }
    }

    pub fn get(&self, ctx: &RequestContext, user_id: &str) -> Result<StoredUser, ServiceError> {
        let db = self.scope.resolve(ctx);
        UserRepository::new(&db)
            .get(user_id)?
            .ok_or(ServiceError::NotFound)
    }

    /// Apply the non-blank fields of `request` to the user's profile.
    pub async fn update(
        &self,
        ctx: &RequestContext,
        user_id: &str,
        request: UpdateProfileRequest,
    ) -> Result<StoredUser, ServiceError> {
        let changes = sanitize(request);
        if changes.is_empty() {
            return Err(ServiceError::Validation(
                "No valid updates provided".to_string(),
            ));
        }

        let user = self
            .scope
            .with_transaction(ctx, |ctx| async move {
                let db = self.scope.resolve(&ctx);
                UserRepository::new(&db)
                    .update_profile(user_id, &changes)
                    .map_err(|e| match e {
                        DbError::NotFound(_) => ServiceError::NotFound,
                        DbError::AlreadyExists(_) => {
                            ServiceError::Conflict("Username already exists".to_string())
                        }
                        other => other.into(),
                    })
            })
            .await?;

        info!(user_id = %user.id, "Profile updated");
        Ok(user)
    }
}

/// Trim every field and drop the ones left blank.
fn sanitize(request: UpdateProfileRequest) -> ProfileChanges {
    let clean = |value: Option<String>| {
        value
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };
    ProfileChanges {
        name: clean(request.name),
        phone: clean(request.phone),
        username: clean(request.username),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Database;

    fn setup() -> (ProfileService, StoredUser, StoredUser, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open(&dir.path().join("profile.redb")).unwrap();
        let scope = Arc::new(TransactionScope::new(Arc::new(db)));

        let ash = StoredUser::new("ash@example.com".into(), "hash".into());
        let misty = StoredUser::new("misty@example.com".into(), "hash".into());
        let shared = scope.resolve(&RequestContext::new());
        UserRepository::new(&shared).create(&ash).unwrap();
        UserRepository::new(&shared).create(&misty).unwrap();

        (ProfileService::new(scope), ash, misty, dir)
    }

    fn request(name: Option<&str>, phone: Option<&str>, username: Option<&str>) -> UpdateProfileRequest {
        UpdateProfileRequest {
            name: name.map(str::to_string),
            phone: phone.map(str::to_string),
            username: username.map(str::to_string),
        }
    }

    #[test]
    fn sanitize_trims_and_drops_blanks() {
        let changes = sanitize(request(Some("  Ash  "), Some("   "), None));
        assert_eq!(changes.name.as_deref(), Some("Ash"));
        assert!(changes.phone.is_none());
        assert!(changes.username.is_none());
    }

    #[tokio::test]
    async fn update_applies_trimmed_fields() {
        let (profiles, ash, _, _dir) = setup();
        let ctx = RequestContext::new();

        let updated = profiles
            .update(&ctx, &ash.id, request(Some(" Ash Ketchum "), Some("555-0100"), Some("ash")))
            .await
            .unwrap();

        assert_eq!(updated.name, "Ash Ketchum");
        assert_eq!(updated.phone, "555-0100");
        assert_eq!(updated.username.as_deref(), Some("ash"));
        assert_eq!(profiles.get(&ctx, &ash.id).unwrap(), updated);
    }

    #[tokio::test]
    async fn blank_only_update_is_rejected() {
        let (profiles, ash, _, _dir) = setup();
        let err = profiles
            .update(&RequestContext::new(), &ash.id, request(Some(" "), None, Some("")))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[tokio::test]
    async fn taken_username_is_conflict_and_changes_nothing() {
        let (profiles, ash, misty, _dir) = setup();
        let ctx = RequestContext::new();
        profiles
            .update(&ctx, &ash.id, request(None, None, Some("champion")))
            .await
            .unwrap();

        let err = profiles
            .update(&ctx, &misty.id, request(Some("Misty"), None, Some("champion")))
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::Conflict(_)));
        assert_eq!(profiles.get(&ctx, &misty.id).unwrap().name, "");
    }

    #[tokio::test]
    async fn unknown_user_is_not_found() {
        let (profiles, _, _, _dir) = setup();
        let ctx = RequestContext::new();

        let err = profiles.get(&ctx, "ghost").unwrap_err();
        assert!(matches!(err, ServiceError::NotFound));

        let err = profiles
            .update(&ctx, "ghost", request(Some("Nobody"), None, None))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound));
    }
}
