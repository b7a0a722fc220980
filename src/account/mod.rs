//! Account System Module
//!
//! This module implements the user-account lifecycle with:
//! - Unique usernames and emails
//! - Gapless, never-recycled sequential ids
//! - Argon2id credential hashing
//! - Avatar files kept in the asset store

pub mod types;
pub mod store;
pub mod auth;

pub use types::{Account, AccountChanges, AccountView, InternalKey, NewAccount};
pub use store::AccountRegistry;
pub use auth::CredentialHasher;
