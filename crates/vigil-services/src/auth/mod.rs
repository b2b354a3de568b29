//! Authentication collaborator
//!
//! Intake operations need an authenticated uploader. The provider reports the
//! current identity and exchanges credentials for a session.

mod memory;
mod password;

pub use memory::InMemoryAuthProvider;
pub use password::{hash_password, verify_password};

use async_trait::async_trait;
use vigil_core::{Identity, Session};

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("An account already exists for {0}")]
    AlreadyRegistered(String),

    #[error("Password hashing failed: {0}")]
    Hashing(String),
}

#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Identity of the signed-in user, if a live session exists
    async fn current_user(&self) -> Option<Identity>;

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError>;

    async fn sign_out(&self);
}
