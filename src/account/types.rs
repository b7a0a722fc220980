//! Account type definitions

use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::ServiceError;

/// Storage-assigned identity (UUID v4 string)
pub type InternalKey = String;

/// Persisted account record
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Account {
    // Identity
    pub internal_key: InternalKey,
    pub sequential_id: u64,
    pub username: String,
    pub email: String,

    // Authentication
    pub credential_hash: String, // Argon2id PHC string

    // Profile
    pub role: String,
    pub birthday: NaiveDate,
    pub avatar_ref: Option<String>,

    pub created_at: u64,
    pub updated_at: u64,
}

/// Client-facing projection of an [`Account`]; never carries the credential.
///
/// Field names follow the wire format the mobile client already consumes.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct AccountView {
    #[serde(rename = "_id")]
    pub internal_key: InternalKey,
    #[serde(rename = "id")]
    pub sequential_id: u64,
    pub username: String,
    pub email: String,
    pub role: String,
    pub birthday: NaiveDate,
    #[serde(rename = "avatar")]
    pub avatar_ref: Option<String>,
}

impl Account {
    pub fn view(&self) -> AccountView {
        AccountView {
            internal_key: self.internal_key.clone(),
            sequential_id: self.sequential_id,
            username: self.username.clone(),
            email: self.email.clone(),
            role: self.role.clone(),
            birthday: self.birthday,
            avatar_ref: self.avatar_ref.clone(),
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == "Admin"
    }
}

/// Input to account creation, before validation.
#[derive(Debug, Clone, Default)]
pub struct NewAccount {
    pub username: String,
    pub credential: String,
    pub email: String,
    pub role: String,
    pub birthday: String,
}

/// Partial update; `None` or empty values leave the field untouched.
#[derive(Debug, Clone, Default)]
pub struct AccountChanges {
    pub username: Option<String>,
    pub email: Option<String>,
    pub credential: Option<String>,
    pub role: Option<String>,
    pub birthday: Option<String>,
}

/// Parse an ISO calendar date. A full RFC 3339 timestamp is accepted and
/// truncated to its date part.
pub fn parse_birthday(raw: &str) -> Result<NaiveDate, ServiceError> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| DateTime::parse_from_rfc3339(raw).map(|dt| dt.date_naive()))
        .map_err(|_| ServiceError::InvalidRequest(format!("birthday is not a date: {}", raw)))
}

/// `Some(value)` only when the value is present and non-empty.
pub fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}
