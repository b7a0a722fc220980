use super::types::*;
use super::AppState;
use crate::account::{AccountChanges, AccountView, NewAccount};
use crate::assets::AvatarUpload;
use crate::catalog::{Category, Location};
use crate::error::ServiceError;
use axum::{
    extract::{
        multipart::MultipartRejection,
        rejection::JsonRejection,
        Multipart, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use std::collections::HashMap;
use tracing::{debug, error, info};

/// A [`ServiceError`] on its way out as an HTTP response.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    error: ServiceError,
}

impl ApiError {
    fn status_for(error: &ServiceError) -> StatusCode {
        match error {
            ServiceError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ServiceError::DuplicateIdentity(_) => StatusCode::CONFLICT,
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::AuthenticationFailed => StatusCode::UNAUTHORIZED,
            ServiceError::StorageFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Keep the taxonomy code but answer with a different status.
    fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }
}

impl From<ServiceError> for ApiError {
    fn from(error: ServiceError) -> Self {
        Self {
            status: Self::status_for(&error),
            error,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // storage details stay in the log
        let message = match &self.error {
            ServiceError::StorageFailure(cause) => {
                error!("storage failure: {}", cause);
                "internal server error".to_string()
            }
            other => other.to_string(),
        };
        let body = ErrorBody {
            error: self.error.code().to_string(),
            message,
        };
        (self.status, Json(body)).into_response()
    }
}

type ApiResult<T> = Result<T, ApiError>;

/// Run registry work (RocksDB I/O, Argon2) off the async workers.
async fn blocking<T, F>(f: F) -> ApiResult<T>
where
    F: FnOnce() -> Result<T, ServiceError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ServiceError::StorageFailure(format!("worker task failed: {}", e)))?
        .map_err(ApiError::from)
}

/// Text fields and optional avatar file of a multipart account form.
#[derive(Default, Debug)]
struct AccountForm {
    fields: HashMap<String, String>,
    avatar: Option<AvatarUpload>,
}

impl AccountForm {
    async fn read(mut multipart: Multipart) -> ApiResult<Self> {
        let mut form = AccountForm::default();
        while let Some(field) = multipart.next_field().await.map_err(malformed)? {
            let name = field.name().unwrap_or_default().to_string();
            if name == "avatar" {
                // a text `avatar` (the current URL echoed back) is not an upload
                let Some(file_name) = field.file_name().map(str::to_string) else {
                    continue;
                };
                let bytes = field.bytes().await.map_err(malformed)?;
                if !bytes.is_empty() {
                    form.avatar = Some(AvatarUpload {
                        file_name: Some(file_name),
                        bytes: bytes.to_vec(),
                    });
                }
            } else {
                let value = field.text().await.map_err(malformed)?;
                form.fields.insert(name, value);
            }
        }
        Ok(form)
    }

    /// First present value among `names`.
    fn take(&mut self, names: &[&str]) -> Option<String> {
        names.iter().find_map(|n| self.fields.remove(*n))
    }
}

fn malformed(e: axum::extract::multipart::MultipartError) -> ApiError {
    ServiceError::InvalidRequest(format!("malformed multipart body: {}", e)).into()
}

// Extractor rejections answer in the same `{error, message}` shape as
// everything else instead of axum's plain-text bodies.
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ServiceError::InvalidRequest(rejection.body_text()).into()
    }
}

impl From<MultipartRejection> for ApiError {
    fn from(rejection: MultipartRejection) -> Self {
        ServiceError::InvalidRequest(rejection.body_text()).into()
    }
}

//
// === Handlers ===
//

/// GET /users
pub async fn list_users(State(state): State<AppState>) -> ApiResult<Json<Vec<AccountView>>> {
    let registry = state.registry.clone();
    let accounts = blocking(move || registry.list()).await?;
    debug!("listing {} accounts", accounts.len());
    Ok(Json(accounts.iter().map(|a| a.view()).collect()))
}

/// GET /categories
pub async fn list_categories(State(state): State<AppState>) -> ApiResult<Json<Vec<Category>>> {
    let catalog = state.catalog.clone();
    let categories = blocking(move || Ok(catalog.categories()?)).await?;
    Ok(Json(categories))
}

/// GET /locations
pub async fn list_locations(State(state): State<AppState>) -> ApiResult<Json<Vec<Location>>> {
    let catalog = state.catalog.clone();
    let locations = blocking(move || Ok(catalog.locations()?)).await?;
    Ok(Json(locations))
}

/// POST /login
pub async fn login(
    State(state): State<AppState>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<Json<LoginResponse>> {
    let Json(req) = body?;
    let email = req.email.unwrap_or_default();
    let password = req.password.unwrap_or_default();
    let registry = state.registry.clone();
    let account = blocking(move || registry.authenticate(&email, &password)).await?;

    info!("login #{} {} (admin: {})", account.sequential_id, account.username, account.is_admin());
    Ok(Json(LoginResponse {
        message: "Login successful".to_string(),
        role: account.role.clone(),
        user: account.view(),
    }))
}

/// PUT /forgetpassword
pub async fn forget_password(
    State(state): State<AppState>,
    body: Result<Json<ForgetPasswordRequest>, JsonRejection>,
) -> ApiResult<Json<MessageResponse>> {
    let Json(req) = body?;
    let email = req.email.unwrap_or_default();
    let new_password = req.new_password.unwrap_or_default();
    let registry = state.registry.clone();
    blocking(move || registry.reset_credential(&email, &new_password)).await?;

    Ok(Json(MessageResponse {
        message: "Password updated".to_string(),
    }))
}

/// POST /users/add (multipart)
pub async fn add_user(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<(StatusCode, Json<UserResponse>)> {
    let mut form = AccountForm::read(multipart?).await?;
    let new = NewAccount {
        username: form.take(&["username"]).unwrap_or_default(),
        credential: form.take(&["password", "credential"]).unwrap_or_default(),
        email: form.take(&["email"]).unwrap_or_default(),
        role: form.take(&["role"]).unwrap_or_default(),
        birthday: form.take(&["birthday"]).unwrap_or_default(),
    };

    let registry = state.registry.clone();
    let avatar = form.avatar;
    let account = blocking(move || registry.create(new, avatar)).await?;

    Ok((
        StatusCode::CREATED,
        Json(UserResponse {
            message: "User created".to_string(),
            user: account.view(),
        }),
    ))
}

/// DELETE /delete-user
pub async fn delete_user(
    State(state): State<AppState>,
    body: Result<Json<DeleteUserRequest>, JsonRejection>,
) -> ApiResult<Json<UserResponse>> {
    let Json(req) = body?;
    let username = req.username.unwrap_or_default();
    let registry = state.registry.clone();
    let removed = blocking(move || registry.delete(&username)).await?;

    Ok(Json(UserResponse {
        message: "User deleted".to_string(),
        user: removed.view(),
    }))
}

/// PUT /update-user (multipart)
///
/// An unknown `_id` answers 400, which is what existing clients expect.
pub async fn update_user(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Json<UpdateUserResponse>> {
    let mut form = AccountForm::read(multipart?).await?;
    let internal_key = form.take(&["_id", "internalKey"]).unwrap_or_default();
    let changes = AccountChanges {
        username: form.take(&["username"]),
        email: form.take(&["email"]),
        credential: form.take(&["password", "credential"]),
        role: form.take(&["role"]),
        birthday: form.take(&["birthday"]),
    };

    let registry = state.registry.clone();
    let avatar = form.avatar;
    let updated = blocking(move || registry.update(&internal_key, changes, avatar))
        .await
        .map_err(|e| {
            if matches!(e.error, ServiceError::NotFound(_)) {
                e.with_status(StatusCode::BAD_REQUEST)
            } else {
                e
            }
        })?;

    Ok(Json(UpdateUserResponse {
        message: "User updated".to_string(),
        updated_user: updated.view(),
    }))
}
