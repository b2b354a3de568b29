//! In-process auth provider backed by argon2 password hashes

use super::password::{hash_password, verify_password};
use super::{AuthError, AuthProvider};
use argon2::{Algorithm, Argon2, Params, Version};
use async_trait::async_trait;
use chrono::Duration;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;
use vigil_core::{Clock, Identity, Session, SystemClock, VigilConfig};

struct Account {
    identity: Identity,
    password_hash: String,
}

/// Single-user session holder with a registry of known accounts.
///
/// Sessions expire after the configured lifetime; an expired session is dropped
/// the next time the current user is queried.
pub struct InMemoryAuthProvider {
    accounts: RwLock<HashMap<String, Account>>,
    session: RwLock<Option<Session>>,
    hasher: Argon2<'static>,
    clock: Arc<dyn Clock>,
    session_ttl: Duration,
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

impl InMemoryAuthProvider {
    pub fn new(clock: Arc<dyn Clock>, session_ttl: Duration) -> Self {
        Self {
            accounts: RwLock::new(HashMap::new()),
            session: RwLock::new(None),
            hasher: Argon2::default(),
            clock,
            session_ttl,
        }
    }

    pub fn from_config(config: &VigilConfig) -> Result<Self, anyhow::Error> {
        let ttl = Duration::try_hours(config.session_expiry_hours)
            .filter(|ttl| *ttl > Duration::zero())
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "Session expiry of {} hours is out of range",
                    config.session_expiry_hours
                )
            })?;
        Ok(Self::new(Arc::new(SystemClock), ttl))
    }

    /// Replace the argon2 cost parameters (argon2id, v19)
    pub fn with_hasher_params(mut self, params: Params) -> Self {
        self.hasher = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);
        self
    }

    /// Register an account. Emails are matched case-insensitively.
    pub async fn register(
        &self,
        email: &str,
        display_name: Option<String>,
        password: &str,
    ) -> Result<Identity, AuthError> {
        let key = normalize_email(email);
        let mut accounts = self.accounts.write().await;
        if accounts.contains_key(&key) {
            return Err(AuthError::AlreadyRegistered(email.trim().to_string()));
        }

        let password_hash = hash_password(&self.hasher, password)?;
        let identity = Identity::new(email.trim(), display_name);
        accounts.insert(
            key,
            Account {
                identity: identity.clone(),
                password_hash,
            },
        );

        tracing::info!(user_id = %identity.user_id, "Account registered");
        Ok(identity)
    }

    pub async fn current_session(&self) -> Option<Session> {
        self.session.read().await.clone()
    }
}

#[async_trait]
impl AuthProvider for InMemoryAuthProvider {
    async fn current_user(&self) -> Option<Identity> {
        let now = self.clock.now();
        let mut session = self.session.write().await;
        match session.as_ref() {
            Some(s) if s.is_expired(now) => {
                tracing::info!(user_id = %s.identity.user_id, "Session expired");
                *session = None;
                None
            }
            Some(s) => Some(s.identity.clone()),
            None => None,
        }
    }

    #[tracing::instrument(skip(self, password))]
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let identity = {
            let accounts = self.accounts.read().await;
            let account = accounts
                .get(&normalize_email(email))
                .ok_or(AuthError::InvalidCredentials)?;
            if !verify_password(&self.hasher, password, &account.password_hash)? {
                tracing::warn!("Sign-in rejected");
                return Err(AuthError::InvalidCredentials);
            }
            account.identity.clone()
        };

        let issued_at = self.clock.now();
        let session = Session {
            token: Uuid::new_v4(),
            identity,
            issued_at,
            expires_at: issued_at + self.session_ttl,
        };
        *self.session.write().await = Some(session.clone());

        tracing::info!(user_id = %session.identity.user_id, "Signed in");
        Ok(session)
    }

    async fn sign_out(&self) {
        if let Some(session) = self.session.write().await.take() {
            tracing::info!(user_id = %session.identity.user_id, "Signed out");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};
    use std::sync::Mutex;

    struct ManualClock(Mutex<DateTime<Utc>>);

    impl ManualClock {
        fn advance(&self, by: Duration) {
            let mut now = self.0.lock().unwrap();
            *now += by;
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> DateTime<Utc> {
            *self.0.lock().unwrap()
        }
    }

    fn fast_params() -> Params {
        Params::new(Params::MIN_M_COST, 1, 1, None).unwrap()
    }

    fn provider(clock: Arc<ManualClock>) -> InMemoryAuthProvider {
        InMemoryAuthProvider::new(clock, Duration::hours(1)).with_hasher_params(fast_params())
    }

    #[test]
    fn test_from_config_rejects_out_of_range_expiry() {
        let config = VigilConfig {
            session_expiry_hours: i64::MAX,
            ..VigilConfig::default()
        };
        assert!(InMemoryAuthProvider::from_config(&config).is_err());

        let config = VigilConfig {
            session_expiry_hours: 0,
            ..VigilConfig::default()
        };
        assert!(InMemoryAuthProvider::from_config(&config).is_err());

        assert!(InMemoryAuthProvider::from_config(&VigilConfig::default()).is_ok());
    }

    #[tokio::test]
    async fn test_sign_in_and_out() {
        let clock = Arc::new(ManualClock(Mutex::new(Utc::now())));
        let auth = provider(clock);
        auth.register("Agent@Example.com", None, "hunter2")
            .await
            .unwrap();

        assert!(auth.current_user().await.is_none());

        let session = auth.sign_in("agent@example.com", "hunter2").await.unwrap();
        assert_eq!(session.identity.email, "Agent@Example.com");
        assert_eq!(
            auth.current_user().await.map(|i| i.user_id),
            Some(session.identity.user_id)
        );

        auth.sign_out().await;
        assert!(auth.current_user().await.is_none());
    }

    #[tokio::test]
    async fn test_wrong_password_and_unknown_user() {
        let clock = Arc::new(ManualClock(Mutex::new(Utc::now())));
        let auth = provider(clock);
        auth.register("agent@example.com", None, "hunter2")
            .await
            .unwrap();

        assert!(matches!(
            auth.sign_in("agent@example.com", "nope").await,
            Err(AuthError::InvalidCredentials)
        ));
        assert!(matches!(
            auth.sign_in("ghost@example.com", "hunter2").await,
            Err(AuthError::InvalidCredentials)
        ));
        assert!(auth.current_user().await.is_none());
    }

    #[tokio::test]
    async fn test_duplicate_registration() {
        let clock = Arc::new(ManualClock(Mutex::new(Utc::now())));
        let auth = provider(clock);
        auth.register("agent@example.com", None, "a").await.unwrap();
        assert!(matches!(
            auth.register(" AGENT@example.com", None, "b").await,
            Err(AuthError::AlreadyRegistered(_))
        ));
    }

    #[tokio::test]
    async fn test_session_expiry() {
        let clock = Arc::new(ManualClock(Mutex::new(Utc::now())));
        let auth = provider(clock.clone());
        auth.register("agent@example.com", None, "pw").await.unwrap();
        auth.sign_in("agent@example.com", "pw").await.unwrap();

        clock.advance(Duration::minutes(59));
        assert!(auth.current_user().await.is_some());

        clock.advance(Duration::minutes(1));
        assert!(auth.current_user().await.is_none());
        assert!(auth.current_session().await.is_none());
    }
}
