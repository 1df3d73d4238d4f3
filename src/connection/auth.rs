use super::config::ConsoleConfig;
use crate::core::{EntityKind, StoreError};
use crate::schema::is_password_hash;
use crate::storage::DocumentStore;
use chrono::{DateTime, Duration as TimeDelta, Utc};
use serde_json::Value as JsonValue;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Invalid admin name or password")]
    InvalidCredentials,

    #[error("Session for '{0}' has expired")]
    Expired(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// An authenticated administrator, valid until `expires_at`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminSession {
    admin_name: String,
    issued_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

impl AdminSession {
    pub fn new(admin_name: impl Into<String>, issued_at: DateTime<Utc>, ttl: TimeDelta) -> Self {
        Self {
            admin_name: admin_name.into(),
            issued_at,
            expires_at: issued_at
                .checked_add_signed(ttl)
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
        }
    }

    pub fn admin_name(&self) -> &str {
        &self.admin_name
    }

    pub fn issued_at(&self) -> DateTime<Utc> {
        self.issued_at
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    #[inline]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    pub fn ensure_active(&self, now: DateTime<Utc>) -> Result<(), AuthError> {
        if self.is_expired(now) {
            Err(AuthError::Expired(self.admin_name.clone()))
        } else {
            Ok(())
        }
    }

    /// Time left, zero once expired.
    pub fn remaining(&self, now: DateTime<Utc>) -> TimeDelta {
        (self.expires_at - now).max(TimeDelta::zero())
    }
}

/// Issues [`AdminSession`]s against the `admins` collection.
///
/// While that collection is empty the bootstrap credentials from the
/// configuration are accepted instead, so a fresh store can be administered.
pub struct Authenticator {
    bootstrap_username: String,
    bootstrap_password: String,
    ttl: TimeDelta,
}

impl Authenticator {
    pub fn new(bootstrap_username: &str, bootstrap_password: &str, ttl: Duration) -> Self {
        Self {
            bootstrap_username: bootstrap_username.to_string(),
            bootstrap_password: bootstrap_password.to_string(),
            ttl: TimeDelta::from_std(ttl).unwrap_or(TimeDelta::MAX),
        }
    }

    pub fn from_config(config: &ConsoleConfig) -> Self {
        Self::new(
            &config.admin_username,
            &config.admin_password,
            config.session_ttl,
        )
    }

    /// Verifies a password against its stored form. Stored values that look
    /// like bcrypt hashes are checked with bcrypt, anything else is compared
    /// as plain text.
    fn verify_password(password: &str, stored: &str) -> bool {
        if is_password_hash(stored) {
            bcrypt::verify(password, stored).unwrap_or(false)
        } else {
            password == stored
        }
    }

    pub async fn sign_in(
        &self,
        store: &dyn DocumentStore,
        admin_name: &str,
        password: &str,
        now: DateTime<Utc>,
    ) -> Result<AdminSession, AuthError> {
        let admins = store.list_all(EntityKind::Admins).await?;

        let accepted = if admins.is_empty() {
            admin_name == self.bootstrap_username && password == self.bootstrap_password
        } else {
            admins.iter().any(|admin| {
                admin.get("adminName").and_then(JsonValue::as_str) == Some(admin_name)
                    && admin
                        .get("password")
                        .and_then(JsonValue::as_str)
                        .is_some_and(|stored| Self::verify_password(password, stored))
            })
        };

        if !accepted {
            warn!(admin = %admin_name, "admin sign-in rejected");
            return Err(AuthError::InvalidCredentials);
        }

        info!(admin = %admin_name, bootstrap = admins.is_empty(), "admin signed in");
        Ok(AdminSession::new(admin_name, now, self.ttl))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use chrono::TimeZone;
    use serde_json::json;

    fn noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
    }

    fn authenticator() -> Authenticator {
        Authenticator::new("admin", "adminpass", Duration::from_secs(3600))
    }

    async fn add_admin(store: &MemoryStore, name: &str, password: &str) {
        store
            .insert(
                EntityKind::Admins,
                json!({"adminName": name, "password": password})
                    .as_object()
                    .unwrap()
                    .clone(),
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_bootstrap_credentials_on_empty_store() {
        let store = MemoryStore::new();
        let session = authenticator()
            .sign_in(&store, "admin", "adminpass", noon())
            .await
            .unwrap();

        assert_eq!(session.admin_name(), "admin");
        assert_eq!(session.expires_at(), noon() + TimeDelta::hours(1));
    }

    #[tokio::test]
    async fn test_bootstrap_credentials_stop_working_once_admins_exist() {
        let store = MemoryStore::new();
        add_admin(&store, "ops", "s3cret").await;

        let err = authenticator()
            .sign_in(&store, "admin", "adminpass", noon())
            .await
            .unwrap_err();
        assert_eq!(err, AuthError::InvalidCredentials);

        assert!(
            authenticator()
                .sign_in(&store, "ops", "s3cret", noon())
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn test_bcrypt_hashed_passwords() {
        let store = MemoryStore::new();
        let hash = bcrypt::hash("hunter2", 4).unwrap();
        add_admin(&store, "ops", &hash).await;

        let auth = authenticator();
        assert!(auth.sign_in(&store, "ops", "hunter2", noon()).await.is_ok());
        assert_eq!(
            auth.sign_in(&store, "ops", &hash, noon()).await.unwrap_err(),
            AuthError::InvalidCredentials
        );
    }

    #[tokio::test]
    async fn test_store_outage_is_reported() {
        let store = MemoryStore::new();
        store.set_available(false);

        let err = authenticator()
            .sign_in(&store, "admin", "adminpass", noon())
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Store(StoreError::StoreUnavailable(_))));
    }

    #[test]
    fn test_session_expiry() {
        let session = AdminSession::new("ops", noon(), TimeDelta::minutes(30));

        assert!(session.ensure_active(noon() + TimeDelta::minutes(29)).is_ok());
        assert_eq!(session.remaining(noon() + TimeDelta::minutes(20)), TimeDelta::minutes(10));
        assert!(session.is_expired(noon() + TimeDelta::minutes(30)));
        assert_eq!(
            session.ensure_active(noon() + TimeDelta::hours(2)),
            Err(AuthError::Expired("ops".to_string()))
        );
        assert_eq!(session.remaining(noon() + TimeDelta::hours(2)), TimeDelta::zero());
    }
}
