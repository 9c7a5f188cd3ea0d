use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderValue, StatusCode},
    middleware,
    routing::get,
    Router,
};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::api::{DirectoryApi, HttpDirectoryClient};
use crate::config::AppConfig;
use crate::handlers::views;
use crate::middleware::{jwt_auth_middleware, ApiResponse, ApiResult};

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub directory: Arc<dyn DirectoryApi>,
    pub jwt_secret: Arc<str>,
    pub log_filter_resolution: bool,
}

impl AppState {
    pub fn new(directory: Arc<dyn DirectoryApi>, jwt_secret: impl Into<Arc<str>>) -> Self {
        Self {
            directory,
            jwt_secret: jwt_secret.into(),
            log_filter_resolution: false,
        }
    }

    pub fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        let client = HttpDirectoryClient::new(&config.portal.backend_url, config.portal.request_timeout())?;
        let mut state = Self::new(Arc::new(client), config.security.jwt_secret.as_str());
        state.log_filter_resolution = config.api.log_filter_resolution;
        Ok(state)
    }
}

pub fn router(state: AppState, config: &AppConfig) -> Router {
    let mut app = Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        // List views (JWT required)
        .merge(view_routes(state.clone()));

    if config.api.enable_request_logging {
        app = app.layer(TraceLayer::new_for_http());
    }

    if config.security.enable_cors {
        app = app.layer(cors_layer(&config.security.cors_origins));
    }

    app.with_state(state)
}

fn view_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/d/:view",
            get(views::list)
                .post(views::update_filters)
                .delete(views::clear_filters),
        )
        .route("/d/:view/:id", get(views::detail))
        .route_layer(middleware::from_fn_with_state(state, jwt_auth_middleware))
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match o.parse() {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", o);
                None
            }
        })
        .collect();
    CorsLayer::new().allow_origin(origins)
}

async fn root() -> axum::response::Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    axum::response::Json(json!({
        "success": true,
        "data": {
            "name": "Flock Admin Portal",
            "version": version,
            "endpoints": {
                "home": "/ (public)",
                "health": "/health (public)",
                "list": "GET /d/:view?name=&church=&fellowship=&page= (protected)",
                "filters": "POST /d/:view (protected - JSON patch, redirects)",
                "clear": "DELETE /d/:view (protected - redirects)",
                "detail": "GET /d/:view/:id (protected)",
            },
            "views": ["cells", "fellowships", "workers", "churches"],
        }
    }))
}

async fn health(State(state): State<AppState>) -> ApiResult<Value> {
    let now = chrono::Utc::now();

    match state.directory.ping().await {
        Ok(()) => Ok(ApiResponse::success(json!({
            "status": "ok",
            "timestamp": now,
            "directory": "ok"
        }))),
        Err(e) => {
            tracing::warn!("Directory backend unhealthy: {}", e);
            Ok(ApiResponse::with_status(
                json!({
                    "status": "degraded",
                    "timestamp": now,
                    "directory": e.user_message()
                }),
                StatusCode::SERVICE_UNAVAILABLE,
            ))
        }
    }
}
