use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Authenticated uploader, as reported by the auth collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: Uuid,
    pub email: String,
    pub display_name: Option<String>,
}

impl Identity {
    pub fn new(email: impl Into<String>, display_name: Option<String>) -> Self {
        Self {
            user_id: Uuid::new_v4(),
            email: email.into(),
            display_name,
        }
    }

    /// Name recorded as the evidence collector: the profile display name when set,
    /// otherwise the local part of the email address.
    pub fn collector_name(&self) -> String {
        if let Some(name) = self
            .display_name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
        {
            return name.to_string();
        }

        match self.email.split_once('@') {
            Some((local, _)) if !local.is_empty() => local.to_string(),
            _ => self.email.clone(),
        }
    }
}

/// Authenticated session handed out by the auth collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub token: Uuid,
    pub identity: Identity,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}
