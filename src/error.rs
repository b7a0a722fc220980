use std::fmt;

use thiserror::Error;

use crate::account::auth::AuthError;
use crate::assets::AssetError;
use crate::storage::StorageError;

/// Which identity field(s) collided with an existing account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collision {
    Username,
    Email,
    Both,
}

impl Collision {
    pub fn from_flags(username: bool, email: bool) -> Option<Self> {
        match (username, email) {
            (true, true) => Some(Self::Both),
            (true, false) => Some(Self::Username),
            (false, true) => Some(Self::Email),
            (false, false) => None,
        }
    }
}

impl fmt::Display for Collision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Collision::Username => write!(f, "username"),
            Collision::Email => write!(f, "email"),
            Collision::Both => write!(f, "username and email"),
        }
    }
}

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    #[error("Duplicate identity: {0} already exists")]
    DuplicateIdentity(Collision),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Authentication failed")]
    AuthenticationFailed,
    #[error("Storage failure: {0}")]
    StorageFailure(String),
}

impl ServiceError {
    /// Stable, machine-readable name of the taxonomy case.
    pub fn code(&self) -> &'static str {
        match self {
            ServiceError::InvalidRequest(_) => "invalid_request",
            ServiceError::DuplicateIdentity(_) => "duplicate_identity",
            ServiceError::NotFound(_) => "not_found",
            ServiceError::AuthenticationFailed => "authentication_failed",
            ServiceError::StorageFailure(_) => "storage_failure",
        }
    }
}

impl From<StorageError> for ServiceError {
    fn from(err: StorageError) -> Self {
        ServiceError::StorageFailure(err.to_string())
    }
}

impl From<AssetError> for ServiceError {
    fn from(err: AssetError) -> Self {
        match err {
            AssetError::InvalidReference(r) => {
                ServiceError::InvalidRequest(format!("unknown asset reference: {}", r))
            }
            other => ServiceError::StorageFailure(other.to_string()),
        }
    }
}

impl From<AuthError> for ServiceError {
    fn from(err: AuthError) -> Self {
        ServiceError::StorageFailure(err.to_string())
    }
}
