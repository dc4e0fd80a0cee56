use serde::{Deserialize, Serialize};

use super::domain::TraineeId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Trainee,
}

/// Authenticated caller. `uid` is the trainee document id for trainee sessions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub uid: String,
    pub email: String,
    pub role: Role,
}

impl Principal {
    pub fn admin(uid: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            email: email.into(),
            role: Role::Admin,
        }
    }

    pub fn trainee(uid: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            email: email.into(),
            role: Role::Trainee,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Admins act on any trainee; trainees only on their own record.
    pub fn can_act_for(&self, trainee: &TraineeId) -> bool {
        self.is_admin() || self.uid == trainee.0
    }
}

/// Resolves session tokens to principals.
pub trait IdentityProvider: Send + Sync {
    fn resolve(&self, token: &str) -> Result<Principal, AuthError>;
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("missing bearer token")]
    MissingToken,
    #[error("invalid or expired session token")]
    InvalidToken,
    #[error("identity provider unavailable: {0}")]
    Unavailable(String),
}
