use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use super::error::{ServiceError, ServiceResult, ValidationErrors};
use super::validation;
use crate::database::models::UserProfile;
use crate::database::EntityStore;

/// Partial profile update; absent fields are left unchanged
#[derive(Debug, Default, Deserialize)]
pub struct UpdateProfileInput {
    pub name: Option<String>,
    pub avatar: Option<String>,
    pub bio: Option<String>,
}

pub struct UserService {
    store: Arc<dyn EntityStore>,
}

impl UserService {
    pub fn new(store: Arc<dyn EntityStore>) -> Self {
        Self { store }
    }

    pub async fn get_profile(&self, user_id: Uuid) -> ServiceResult<UserProfile> {
        self.store
            .user_by_id(user_id)
            .await?
            .map(|u| u.profile())
            .ok_or(ServiceError::NotFound("User"))
    }

    /// Only the account holder may edit a profile
    pub async fn update_profile(
        &self,
        actor_id: Uuid,
        user_id: Uuid,
        input: UpdateProfileInput,
    ) -> ServiceResult<UserProfile> {
        if actor_id != user_id {
            return Err(ServiceError::Unauthorized);
        }
        let mut user = self
            .store
            .user_by_id(user_id)
            .await?
            .ok_or(ServiceError::NotFound("User"))?;

        let mut errors = ValidationErrors::new();
        let name = validation::non_blank_if_present(&mut errors, "name", input.name.as_deref());
        errors.into_result()?;

        if let Some(name) = name {
            user.name = name;
        }
        if let Some(avatar) = validation::optional_text(input.avatar.as_deref()) {
            user.avatar = avatar;
        }
        if let Some(bio) = validation::optional_text(input.bio.as_deref()) {
            user.bio = bio;
        }
        user.updated_at = Utc::now();

        self.store.update_user(&user).await?;
        info!(user_id = %user.id, "Updated profile");
        Ok(user.profile())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::TestContext;

    #[tokio::test]
    async fn profile_is_publicly_readable() {
        let ctx = TestContext::new();
        let ada = ctx.user("ada").await;

        let profile = ctx.users.get_profile(ada.id).await.unwrap();
        assert_eq!(profile.email, "ada@example.com");
        assert!(matches!(
            ctx.users.get_profile(Uuid::new_v4()).await,
            Err(ServiceError::NotFound("User"))
        ));
    }

    #[tokio::test]
    async fn updates_only_provided_fields() {
        let ctx = TestContext::new();
        let ada = ctx.user("ada").await;

        let updated = ctx
            .users
            .update_profile(
                ada.id,
                ada.id,
                UpdateProfileInput {
                    bio: Some(" Engineer ".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.name, "ada");
        assert_eq!(updated.bio, "Engineer");
    }

    #[tokio::test]
    async fn cannot_update_someone_else() {
        let ctx = TestContext::new();
        let ada = ctx.user("ada").await;
        let bob = ctx.user("bob").await;

        let err = ctx
            .users
            .update_profile(bob.id, ada.id, UpdateProfileInput::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Unauthorized));
    }

    #[tokio::test]
    async fn rejects_blank_name() {
        let ctx = TestContext::new();
        let ada = ctx.user("ada").await;

        let err = ctx
            .users
            .update_profile(
                ada.id,
                ada.id,
                UpdateProfileInput {
                    name: Some("   ".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(e) if e.has_field("name")));
    }
}
