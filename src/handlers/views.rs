use axum::{
    extract::{Extension, Path, RawQuery, State},
    response::{IntoResponse, Redirect, Response},
    Json,
};
use serde::Serialize;
use serde_json::Value;
use url::form_urlencoded;

use crate::api::PaginatedResult;
use crate::app::AppState;
use crate::error::ApiError;
use crate::filter::{policy, Access, FilterKey, FilterPatch, FilterState, Location, QueryCodec, ViewKind};
use crate::middleware::{ApiResponse, AuthUser};
use crate::table::{SortDirection, Table, TableSpec, TableView};

/// Per-page presentation options. They never reach the backend and are
/// dropped from the location on the next filter change.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct TableParams {
    pub sort: Option<String>,
    pub order: Option<String>,
    pub q: Option<String>,
}

impl TableParams {
    /// Pick the table controls out of the raw query. Repeated keys: last wins.
    pub fn from_query(query: Option<&str>) -> Self {
        let mut params = Self::default();
        for (name, value) in form_urlencoded::parse(query.unwrap_or_default().as_bytes()) {
            let slot = match name.as_ref() {
                "sort" => &mut params.sort,
                "order" => &mut params.order,
                "q" => &mut params.q,
                _ => continue,
            };
            *slot = Some(value.into_owned());
        }
        params
    }
}

#[derive(Debug, Serialize)]
pub struct Notice {
    pub level: &'static str,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ListView {
    pub view: ViewKind,
    pub location: Location,
    pub filters: FilterState,
    pub visible_filters: Vec<FilterKey>,
    pub table: TableView,
    pub next: Option<Location>,
    pub previous: Option<Location>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<Notice>,
}

fn authorize(user: &AuthUser, view: ViewKind) -> Option<Redirect> {
    match policy::authorize(user.role, view) {
        Access::Allow => None,
        Access::Redirect(target) => {
            tracing::info!(user = %user.user, role = %user.role, %view, to = %target, "view outside role scope, redirecting");
            Some(Redirect::to(&target.path()))
        }
    }
}

/// GET /d/:view - One page of a list view under the user's scope
pub async fn list(
    State(state): State<AppState>,
    Path(view): Path<String>,
    RawQuery(query): RawQuery,
    Extension(user): Extension<AuthUser>,
) -> Result<Response, ApiError> {
    let view: ViewKind = view.parse()?;
    let params = TableParams::from_query(query.as_deref());
    if let Some(redirect) = authorize(&user, view) {
        return Ok(redirect.into_response());
    }

    let codec = QueryCodec::new(view);
    let requested = codec.read(&Location::new(view.path(), query));
    let effective = policy::effective_filters(user.role, &user.scope, &requested)?;
    if state.log_filter_resolution && effective != requested {
        tracing::debug!(?requested, ?effective, "filters narrowed by role scope");
    }

    let (page, notice) = match state.directory.list(&effective, Some(&user.token)).await {
        Ok(page) => (page, None),
        Err(e) => {
            tracing::error!(%view, "Failed to load list: {}", e);
            let notice = Notice {
                level: "error",
                message: e.user_message(),
            };
            (PaginatedResult::empty(effective.page()), Some(notice))
        }
    };

    let mut table = Table::new(TableSpec::for_view(view), page);
    if let Some(column) = params.sort.as_deref() {
        table.sort_by(column, SortDirection::parse(params.order.as_deref().unwrap_or("asc")));
    }
    if let Some(text) = params.q.as_deref() {
        table.search(text);
    }

    let location = codec.write(&effective);
    let mut next = None;
    table.clone().next_page(|p| next = Some(codec.update(&location, &FilterPatch::new().page(p))));
    let mut previous = None;
    table.clone().previous_page(|p| previous = Some(codec.update(&location, &FilterPatch::new().page(p))));

    let body = ListView {
        view,
        location,
        filters: effective,
        visible_filters: policy::visible_filters(user.role, view),
        table: table.render(),
        next,
        previous,
        notice,
    };
    Ok(ApiResponse::success(body).into_response())
}

/// POST /d/:view - Apply a filter patch to the current location and redirect
pub async fn update_filters(
    Path(view): Path<String>,
    RawQuery(query): RawQuery,
    Extension(user): Extension<AuthUser>,
    Json(patch): Json<FilterPatch>,
) -> Result<Redirect, ApiError> {
    let view: ViewKind = view.parse()?;
    if let Some(redirect) = authorize(&user, view) {
        return Ok(redirect);
    }

    let current = Location::new(view.path(), query);
    let next = QueryCodec::new(view).resolve_and_update(&current, &patch);
    tracing::debug!(from = %current, to = %next, "filters updated");
    Ok(Redirect::to(&next.href()))
}

/// DELETE /d/:view - Drop every filter
pub async fn clear_filters(
    Path(view): Path<String>,
    Extension(user): Extension<AuthUser>,
) -> Result<Redirect, ApiError> {
    let view: ViewKind = view.parse()?;
    if let Some(redirect) = authorize(&user, view) {
        return Ok(redirect);
    }
    Ok(Redirect::to(&QueryCodec::new(view).clear(&Location::new(view.path(), None)).href()))
}

/// GET /d/:view/:id - Record detail, the target of a table row link
pub async fn detail(
    State(state): State<AppState>,
    Path((view, id)): Path<(String, String)>,
    Extension(user): Extension<AuthUser>,
) -> Result<Response, ApiError> {
    let view: ViewKind = view.parse()?;
    if let Some(redirect) = authorize(&user, view) {
        return Ok(redirect.into_response());
    }

    let record: Value = state.directory.fetch(view, &id, Some(&user.token)).await?;
    Ok(ApiResponse::success(record).into_response())
}
