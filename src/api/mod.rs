pub mod handlers;
pub mod types;

use crate::account::AccountRegistry;
use crate::assets::{AssetStore, UPLOADS_ROUTE};
use crate::catalog::Catalog;
use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post, put},
    Router,
};
use std::future::Future;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::info;

#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<AccountRegistry>,
    pub catalog: Arc<Catalog>,
    pub assets: Arc<AssetStore>,
}

pub fn router(state: AppState, max_upload_bytes: usize) -> Router {
    let uploads = ServeDir::new(state.assets.root());

    Router::new()
        .route("/users", get(handlers::list_users))
        .route("/categories", get(handlers::list_categories))
        .route("/locations", get(handlers::list_locations))
        .route("/login", post(handlers::login))
        .route("/forgetpassword", put(handlers::forget_password))
        .route("/users/add", post(handlers::add_user))
        .route("/delete-user", delete(handlers::delete_user))
        .route("/update-user", put(handlers::update_user))
        .nest_service(UPLOADS_ROUTE, uploads)
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub struct ApiServer {
    state: AppState,
    bind_addr: String,
    max_upload_bytes: usize,
}

impl ApiServer {
    pub fn new(state: AppState, bind_addr: String, max_upload_bytes: usize) -> Self {
        Self {
            state,
            bind_addr,
            max_upload_bytes,
        }
    }

    /// Serve until `shutdown` resolves.
    pub async fn start<F>(self, shutdown: F) -> std::io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let app = router(self.state, self.max_upload_bytes);

        let listener = tokio::net::TcpListener::bind(&self.bind_addr).await?;

        info!("HTTP server listening on {}", self.bind_addr);
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await
    }
}
