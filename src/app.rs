use axum::{
    extract::{DefaultBodyLimit, State},
    http::{header, HeaderValue, Method},
    middleware,
    response::Json,
    routing::{get, post, put},
    Router,
};
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use tracing::warn;

use crate::auth::{MemorySessionStore, PasswordError, PasswordHasher, TokenError, TokenSigner};
use crate::config::AppConfig;
use crate::database::EntityStore;
use crate::handlers;
use crate::error::ApiError;
use crate::middleware::{session_auth_middleware, session_layer, ApiResponse};
use crate::services::upload::UPLOADS_ROUTE;
use crate::services::{AuthService, BoardService, LocalFileStore, PinService, UploadPolicy, UserService};

/// Multipart framing allowance on top of the file size limit
const UPLOAD_OVERHEAD_BYTES: usize = 1024 * 1024;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("Session signing setup failed: {0}")]
    Token(#[from] TokenError),

    #[error("Password hashing setup failed: {0}")]
    Password(#[from] PasswordError),
}

/// Request-independent HTTP settings
#[derive(Debug, Clone, Default)]
pub struct HttpSettings {
    pub cookie_secure: bool,
    pub session_hours: u64,
    pub public_base_url: Option<String>,
    pub cors_origins: Vec<String>,
    pub uploads_dir: PathBuf,
    pub max_file_bytes: usize,
}

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthService>,
    pub users: Arc<UserService>,
    pub boards: Arc<BoardService>,
    pub pins: Arc<PinService>,
    pub store: Arc<dyn EntityStore>,
    pub sessions: MemorySessionStore,
    pub http: Arc<HttpSettings>,
}

impl AppState {
    pub fn new(
        config: &AppConfig,
        store: Arc<dyn EntityStore>,
        sessions: MemorySessionStore,
    ) -> Result<Self, StartupError> {
        let signer = TokenSigner::new(&config.security.session_secret, config.security.session_expiry_hours)?;
        let hasher = PasswordHasher::from_config(&config.security)?;
        let files = Arc::new(LocalFileStore::new(config.uploads.dir.clone()));
        let uploads = UploadPolicy::new(config.uploads.max_file_bytes);

        Ok(Self {
            auth: Arc::new(AuthService::new(store.clone(), Arc::new(sessions.clone()), signer, hasher)),
            users: Arc::new(UserService::new(store.clone())),
            boards: Arc::new(BoardService::new(store.clone())),
            pins: Arc::new(PinService::new(store.clone(), files, uploads)),
            store,
            sessions,
            http: Arc::new(HttpSettings {
                cookie_secure: config.security.cookie_secure,
                session_hours: config.security.session_expiry_hours,
                public_base_url: config.server.public_base_url.clone(),
                cors_origins: config.security.cors_origins.clone(),
                uploads_dir: config.uploads.dir.clone(),
                max_file_bytes: config.uploads.max_file_bytes,
            }),
        })
    }
}

pub fn app(state: AppState) -> Router {
    let uploads = ServeDir::new(&state.http.uploads_dir);
    let cors = cors_layer(&state.http.cors_origins);
    let sessions = session_layer(
        state.sessions.clone(),
        state.http.cookie_secure,
        state.http.session_hours,
    );

    Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        // Users: public auth plus self-only profile edits
        .merge(user_routes(&state))
        // Protected API
        .merge(board_routes(&state))
        .merge(pin_routes(&state))
        // Uploaded files
        .nest_service(UPLOADS_ROUTE, uploads)
        // Global middleware
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors)
                .layer(sessions),
        )
        .with_state(state)
}

fn user_routes(state: &AppState) -> Router<AppState> {
    use handlers::protected::profile;
    use handlers::public::users;

    Router::new()
        .route("/api/users/register", post(users::register))
        .route("/api/users/login", post(users::login))
        .route("/api/users/logout", post(users::logout))
        .route("/api/users/auth/check", get(users::auth_check))
        .route(
            "/api/users/profile/:id",
            get(users::profile_get).merge(
                put(profile::profile_put)
                    .route_layer(middleware::from_fn_with_state(state.clone(), session_auth_middleware)),
            ),
        )
}

fn board_routes(state: &AppState) -> Router<AppState> {
    use handlers::protected::boards;

    Router::new()
        .route("/api/boards", get(boards::list).post(boards::create))
        .route(
            "/api/boards/:id",
            get(boards::get).put(boards::update).delete(boards::delete),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), session_auth_middleware))
}

fn pin_routes(state: &AppState) -> Router<AppState> {
    use handlers::protected::pins;

    let upload_limit = state.http.max_file_bytes + UPLOAD_OVERHEAD_BYTES;

    Router::new()
        .route("/api/pins", get(pins::search).post(pins::create))
        .route(
            "/api/pins/upload",
            post(pins::upload).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/api/pins/board/:board_id", get(pins::list_for_board))
        .route(
            "/api/pins/:id",
            get(pins::get).put(pins::update).delete(pins::delete),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), session_auth_middleware))
}

/// Cookies need credentialed CORS, which rules out a wildcard origin
fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "success": true,
        "data": {
            "name": "Pinboard API",
            "version": version,
            "description": "Boards, collaborators and tagged pins",
            "endpoints": {
                "home": "/ (public)",
                "health": "/health (public)",
                "users": "/api/users/register, /api/users/login, /api/users/logout, /api/users/auth/check, /api/users/profile/:id",
                "boards": "/api/boards[/:id] (session)",
                "pins": "/api/pins[/:id], /api/pins/upload, /api/pins/board/:boardId (session)",
                "uploads": "/uploads/:file (public)",
            }
        }
    }))
}

async fn health(State(state): State<AppState>) -> Result<ApiResponse<Value>, ApiError> {
    if let Err(e) = state.store.ping().await {
        warn!("Health check failed: {}", e);
        return Err(ApiError::service_unavailable("database unavailable"));
    }
    Ok(ApiResponse::success(json!({
        "status": "ok",
        "timestamp": chrono::Utc::now(),
        "database": "ok"
    })))
}
