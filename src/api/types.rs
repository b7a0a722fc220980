// Request/response bodies of the HTTP API
use serde::{Deserialize, Serialize};

use crate::account::AccountView;

#[derive(Deserialize, Debug)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, alias = "credential")]
    pub password: Option<String>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ForgetPasswordRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, alias = "newCredential")]
    pub new_password: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct DeleteUserRequest {
    #[serde(default)]
    pub username: Option<String>,
}

#[derive(Serialize, Debug)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Serialize, Debug)]
pub struct LoginResponse {
    pub message: String,
    pub user: AccountView,
    pub role: String,
}

#[derive(Serialize, Debug)]
pub struct UserResponse {
    pub message: String,
    pub user: AccountView,
}

#[derive(Serialize, Debug)]
pub struct UpdateUserResponse {
    pub message: String,
    #[serde(rename = "updatedUser")]
    pub updated_user: AccountView,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct ErrorBody {
    /// Taxonomy code, e.g. `duplicate_identity`
    pub error: String,
    pub message: String,
}
