use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::sync::Arc;
use time::OffsetDateTime;
use tower_sessions::session_store::SessionStore;
use tower_sessions::session::Id;
use tower_sessions::Session;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::error::{ServiceError, ServiceResult, ValidationErrors};
use super::validation;
use crate::auth::session::{establish, record_user, USER_ID_KEY};
use crate::auth::{Claims, PasswordHasher, TokenSigner};
use crate::database::models::{PasswordHash, User, UserProfile};
use crate::database::{DatabaseError, EntityStore};

#[derive(Debug, Default, Deserialize)]
pub struct RegisterInput {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub avatar: Option<String>,
    pub bio: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginInput {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// A freshly established session
#[derive(Debug, Clone)]
pub struct SessionGrant {
    pub user: UserProfile,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Caller identity resolved from a valid session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    pub user_id: Uuid,
    pub session_id: Id,
}

/// Registration, login and session lifecycle.
///
/// Browser clients are identified by the session cookie; other clients send
/// the signed token from the login response, which names the same
/// server-side record.
pub struct AuthService {
    store: Arc<dyn EntityStore>,
    sessions: Arc<dyn SessionStore>,
    signer: TokenSigner,
    hasher: PasswordHasher,
}

impl AuthService {
    pub fn new(
        store: Arc<dyn EntityStore>,
        sessions: Arc<dyn SessionStore>,
        signer: TokenSigner,
        hasher: PasswordHasher,
    ) -> Self {
        Self {
            store,
            sessions,
            signer,
            hasher,
        }
    }

    pub async fn register(&self, input: RegisterInput, session: &Session) -> ServiceResult<SessionGrant> {
        let mut errors = ValidationErrors::new();
        let name = validation::required_text(&mut errors, "name", input.name.as_deref());
        let email = validation::email(&mut errors, "email", input.email.as_deref());
        let password = validation::password(&mut errors, "password", input.password.as_deref());
        errors.into_result()?;
        let (Some(name), Some(email), Some(password)) = (name, email, password) else {
            return Err(ServiceError::Internal("validated registration fields missing".to_string()));
        };

        if self.store.user_by_email(&email).await?.is_some() {
            return Err(ServiceError::DuplicateEmail);
        }

        let hash = self.hash_password(password).await?;
        let user = User::new(
            name,
            email,
            PasswordHash::new(hash),
            validation::optional_text(input.avatar.as_deref()).unwrap_or_default(),
            validation::optional_text(input.bio.as_deref()).unwrap_or_default(),
        );

        match self.store.insert_user(&user).await {
            Ok(()) => {}
            // Lost a race with a concurrent registration
            Err(DatabaseError::Duplicate(_)) => return Err(ServiceError::DuplicateEmail),
            Err(e) => return Err(e.into()),
        }

        info!(user_id = %user.id, "Registered user");
        self.open_session(&user, session).await
    }

    pub async fn login(&self, input: LoginInput, session: &Session) -> ServiceResult<SessionGrant> {
        let mut errors = ValidationErrors::new();
        let email = validation::required_text(&mut errors, "email", input.email.as_deref());
        if input.password.as_deref().map_or(true, str::is_empty) {
            errors.add("password", "is required");
        }
        errors.into_result()?;
        let (Some(email), Some(password)) = (email, input.password) else {
            return Err(ServiceError::Internal("validated login fields missing".to_string()));
        };

        // Unknown email and wrong password are indistinguishable to the caller
        let user = self
            .store
            .user_by_email(&email)
            .await?
            .ok_or(ServiceError::InvalidCredentials)?;

        if !self.verify_password(password, &user).await? {
            debug!(user_id = %user.id, "Password mismatch");
            return Err(ServiceError::InvalidCredentials);
        }

        info!(user_id = %user.id, "User logged in");
        self.open_session(&user, session).await
    }

    /// Ends the cookie session and the session named by `bearer`. A bearer
    /// token past its expiry still identifies the record to drop. Missing,
    /// malformed and already ended sessions all succeed.
    pub async fn logout(&self, session: &Session, bearer: Option<&str>) -> ServiceResult<()> {
        if let Some(claims) = bearer.and_then(|t| self.signer.verify_ignoring_expiry(t).ok()) {
            if let Some(session_id) = claims.session_id() {
                self.sessions
                    .delete(&session_id)
                    .await
                    .map_err(|e| ServiceError::SessionTeardown(e.into()))?;
                info!(user_id = %claims.sub, session_id = %session_id, "Session ended");
            }
        }

        if let Some(session_id) = session.id() {
            session.flush().await.map_err(ServiceError::SessionTeardown)?;
            info!(session_id = %session_id, "Session ended");
        }
        Ok(())
    }

    /// Bearer token first, then the cookie session. A token is valid only
    /// when its signature and expiry hold and the server still has the
    /// session for the same user.
    pub async fn authenticate(&self, session: &Session, bearer: Option<&str>) -> ServiceResult<Identity> {
        if let Some(token) = bearer {
            return self.authenticate_token(token).await;
        }

        let user_id = session
            .get::<Uuid>(USER_ID_KEY)
            .await?
            .ok_or(ServiceError::Unauthenticated)?;
        let session_id = session.id().ok_or(ServiceError::Unauthenticated)?;
        Ok(Identity { user_id, session_id })
    }

    async fn authenticate_token(&self, token: &str) -> ServiceResult<Identity> {
        let claims = self.signer.verify(token).map_err(|e| {
            debug!("Rejected session token: {}", e);
            ServiceError::Unauthenticated
        })?;
        let session_id = claims.session_id().ok_or(ServiceError::Unauthenticated)?;

        match self.sessions.load(&session_id).await? {
            Some(record) if record_user(&record) == Some(claims.sub) => Ok(Identity {
                user_id: claims.sub,
                session_id,
            }),
            _ => Err(ServiceError::Unauthenticated),
        }
    }

    /// Profile of the caller, if any. Never fails: lookup errors are
    /// logged and reported as unauthenticated.
    pub async fn current_user(&self, session: &Session, bearer: Option<&str>) -> Option<UserProfile> {
        let identity = match self.authenticate(session, bearer).await {
            Ok(identity) => identity,
            Err(ServiceError::Unauthenticated) => return None,
            Err(e) => {
                warn!("Session check failed: {}", e);
                return None;
            }
        };
        match self.store.user_by_id(identity.user_id).await {
            Ok(user) => user.map(|u| u.profile()),
            Err(e) => {
                warn!("Session check failed: {}", e);
                None
            }
        }
    }

    async fn open_session(&self, user: &User, session: &Session) -> ServiceResult<SessionGrant> {
        let issued_at = Utc::now();
        let expires_at = issued_at + self.signer.ttl();
        let expiry = OffsetDateTime::from_unix_timestamp(expires_at.timestamp())
            .map_err(|e| ServiceError::Internal(format!("session expiry out of range: {}", e)))?;

        let session_id = establish(session, user.id, expiry)
            .await?
            .ok_or_else(|| ServiceError::Internal("session was not assigned an id".to_string()))?;
        let token = self.signer.sign(&Claims::new(user.id, session_id, issued_at, expires_at))?;

        Ok(SessionGrant {
            user: user.profile(),
            token,
            expires_at,
        })
    }

    async fn hash_password(&self, password: String) -> ServiceResult<String> {
        let hasher = self.hasher.clone();
        let hash = tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| ServiceError::Internal(format!("password hashing task failed: {}", e)))??;
        Ok(hash)
    }

    async fn verify_password(&self, password: String, user: &User) -> ServiceResult<bool> {
        let hasher = self.hasher.clone();
        let stored = user.password_hash.as_str().to_string();
        let matches = tokio::task::spawn_blocking(move || hasher.verify(&password, &stored))
            .await
            .map_err(|e| ServiceError::Internal(format!("password check task failed: {}", e)))??;
        Ok(matches)
    }
}
