#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result};
use axum::{
    extract::{Path, RawQuery, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};

use flock_admin::api::HttpDirectoryClient;
use flock_admin::app::{self, AppState};
use flock_admin::auth::{generate_jwt, Claims};
use flock_admin::config::AppConfig;
use flock_admin::types::{Role, UserScope};

pub const SECRET: &str = "portal-test-secret";

/// Pages served by the fake directory for every collection.
pub const LAST_PAGE: u32 = 3;

/// In-process stand-in for the directory REST backend. Records the query
/// string of every list request it receives.
#[derive(Clone, Default)]
pub struct Backend {
    seen: Arc<Mutex<Vec<String>>>,
}

impl Backend {
    pub fn queries(&self) -> Vec<String> {
        self.seen.lock().map(|q| q.clone()).unwrap_or_default()
    }

    pub fn last_query(&self) -> Option<String> {
        self.queries().pop()
    }
}

pub struct TestPortal {
    pub base_url: String,
    pub backend: Backend,
}

impl TestPortal {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

async fn serve(router: Router) -> Result<String> {
    let port = portpicker::pick_unused_port().context("failed to pick free port")?;
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port)).await?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    Ok(format!("http://127.0.0.1:{}", port))
}

pub async fn spawn_backend() -> Result<(String, Backend)> {
    let backend = Backend::default();
    let router = Router::new()
        .route("/", get(|| async { Json(json!({ "ok": true })) }))
        .route("/:collection", get(backend_list))
        .route("/:collection/:id", get(backend_fetch))
        .with_state(backend.clone());
    Ok((serve(router).await?, backend))
}

async fn backend_list(
    State(backend): State<Backend>,
    Path(collection): Path<String>,
    RawQuery(query): RawQuery,
) -> Json<Value> {
    let query = query.unwrap_or_default();
    if let Ok(mut seen) = backend.seen.lock() {
        seen.push(query.clone());
    }
    let page: u32 = url::form_urlencoded::parse(query.as_bytes())
        .find(|(k, _)| k == "page")
        .and_then(|(_, v)| v.parse().ok())
        .unwrap_or(1);

    let link = |p: u32| format!("http://backend/{}?page={}", collection, p);
    Json(json!({
        "data": [
            {
                "id": 5,
                "name": "Kobiti cell",
                "leader": { "first_name": "Ama", "last_name": "Mensah" },
                "fellowship": { "name": "Grace" },
                "members_count": 12,
                "created_at": "2024-03-01T10:00:00Z"
            },
            {
                "id": 6,
                "name": "Adenta cell",
                "leader": { "first_name": "Kofi", "last_name": "Boateng" },
                "fellowship": { "name": "Grace" },
                "members_count": 4,
                "created_at": "2024-05-11T08:30:00Z"
            }
        ],
        "per_page": 2,
        "current_page": page,
        "last_page": LAST_PAGE,
        "total": 6,
        "next_page_url": (page < LAST_PAGE).then(|| link(page + 1)),
        "prev_page_url": (page > 1).then(|| link(page - 1)),
    }))
}

async fn backend_fetch(Path((collection, id)): Path<(String, String)>) -> Response {
    if id == "missing" {
        return (StatusCode::NOT_FOUND, Json(json!({ "message": "not found" }))).into_response();
    }
    Json(json!({ "data": { "id": id, "collection": collection, "name": "Kobiti cell" } })).into_response()
}

/// Portal wired to a freshly spawned fake backend.
pub async fn spawn_portal() -> Result<TestPortal> {
    let (backend_url, backend) = spawn_backend().await?;
    let base_url = spawn_portal_with_backend(&backend_url).await?;
    Ok(TestPortal { base_url, backend })
}

/// Portal pointed at an arbitrary backend URL (which may be down).
pub async fn spawn_portal_with_backend(backend_url: &str) -> Result<String> {
    let client = HttpDirectoryClient::new(backend_url, Duration::from_secs(2))?;
    let state = AppState::new(Arc::new(client), SECRET);
    serve(app::router(state, &AppConfig::development())).await
}

/// A backend URL nothing is listening on.
pub fn dead_backend_url() -> Result<String> {
    let port = portpicker::pick_unused_port().context("failed to pick free port")?;
    Ok(format!("http://127.0.0.1:{}", port))
}

pub fn token(role: Role, scope: UserScope) -> String {
    let claims = Claims::new("tester".to_string(), role, scope, 1);
    generate_jwt(&claims, SECRET).expect("failed to sign test token")
}

pub fn admin_token() -> String {
    token(Role::Admin, UserScope::default())
}

pub fn scope(church: &str, fellowship: Option<&str>, cell: Option<&str>) -> UserScope {
    UserScope {
        church: Some(church.to_string()),
        fellowship: fellowship.map(str::to_string),
        cell: cell.map(str::to_string),
    }
}

/// Client that surfaces redirects instead of following them.
pub fn no_redirect_client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .expect("failed to build client")
}

pub fn location_header(res: &reqwest::Response) -> Option<String> {
    res.headers()
        .get(reqwest::header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}
