mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::Value;

use flock_admin::types::{Role, UserScope};

async fn get_json(url: String, token: &str) -> Result<(StatusCode, Value)> {
    let res = reqwest::Client::new().get(url).bearer_auth(token).send().await?;
    let status = res.status();
    Ok((status, res.json().await?))
}

#[tokio::test]
async fn admin_filters_reach_backend_in_view_order() -> Result<()> {
    let portal = common::spawn_portal().await?;

    let (status, body) = get_json(
        portal.url("/d/cells?church=3&name=Kobiti&utm=mail&page=2"),
        &common::admin_token(),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(portal.backend.last_query().as_deref(), Some("name=Kobiti&church=3&page=2"));

    let data = &body["data"];
    assert_eq!(data["view"], "cells");
    assert_eq!(data["location"], "/d/cells?name=Kobiti&church=3&page=2");
    assert_eq!(data["filters"]["page"], 2);
    Ok(())
}

#[tokio::test]
async fn table_rows_render_columns_and_links() -> Result<()> {
    let portal = common::spawn_portal().await?;

    let (_, body) = get_json(portal.url("/d/cells"), &common::admin_token()).await?;
    let table = &body["data"]["table"];
    let titles: Vec<&str> = table["columns"]
        .as_array()
        .map(|c| c.iter().filter_map(|col| col["title"].as_str()).collect())
        .unwrap_or_default();
    assert_eq!(titles, vec!["Cell", "Leader", "Fellowship", "Members", "Created"]);

    let first = &table["rows"][0];
    assert_eq!(first["href"], "/d/cells/5");
    assert_eq!(first["cells"][1], "Ama Mensah");
    assert_eq!(first["cells"][4], "2024-03-01");
    assert!(table.get("empty").is_none());
    Ok(())
}

#[tokio::test]
async fn pagination_links_keep_filters() -> Result<()> {
    let portal = common::spawn_portal().await?;

    let (_, body) = get_json(portal.url("/d/cells?church=3&page=2"), &common::admin_token()).await?;
    let data = &body["data"];
    assert_eq!(data["table"]["pagination"]["page"], 2);
    assert_eq!(data["table"]["pagination"]["total_pages"], 3);
    assert_eq!(data["next"], "/d/cells?church=3&page=3");
    assert_eq!(data["previous"], "/d/cells?church=3&page=1");

    let (_, last) = get_json(portal.url("/d/cells?page=3"), &common::admin_token()).await?;
    assert!(last["data"]["next"].is_null());
    Ok(())
}

#[tokio::test]
async fn search_and_sort_apply_within_the_page() -> Result<()> {
    let portal = common::spawn_portal().await?;

    let (_, body) = get_json(
        portal.url("/d/cells?sort=members_count&order=asc"),
        &common::admin_token(),
    )
    .await?;
    assert_eq!(body["data"]["table"]["rows"][0]["cells"][0], "Adenta cell");

    let (_, body) = get_json(portal.url("/d/cells?q=kobiti"), &common::admin_token()).await?;
    let rows = body["data"]["table"]["rows"].as_array().cloned().unwrap_or_default();
    assert_eq!(rows.len(), 1);
    // client-side controls never reach the backend
    assert_eq!(portal.backend.last_query().as_deref(), Some("page=1"));
    Ok(())
}

#[tokio::test]
async fn scoped_role_cannot_widen_its_filters() -> Result<()> {
    let portal = common::spawn_portal().await?;
    let token = common::token(Role::FellowshipLeader, common::scope("1", Some("12"), None));

    let (status, body) = get_json(portal.url("/d/workers?church=99&fellowship=7&name=Ada"), &token).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        portal.backend.last_query().as_deref(),
        Some("name=Ada&church=1&fellowship=12&page=1")
    );
    let visible: Vec<&str> = body["data"]["visible_filters"]
        .as_array()
        .map(|v| v.iter().filter_map(|k| k.as_str()).collect())
        .unwrap_or_default();
    assert!(!visible.contains(&"church"));
    assert!(!visible.contains(&"fellowship"));
    assert!(visible.contains(&"cell"));
    Ok(())
}

#[tokio::test]
async fn missing_scope_is_forbidden() -> Result<()> {
    let portal = common::spawn_portal().await?;
    let token = common::token(Role::CellLeader, UserScope { church: Some("1".into()), ..Default::default() });

    let (status, body) = get_json(portal.url("/d/cells"), &token).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "FORBIDDEN");
    assert!(portal.backend.queries().is_empty());
    Ok(())
}

#[tokio::test]
async fn unreachable_backend_shows_notice_and_empty_table() -> Result<()> {
    let base = common::spawn_portal_with_backend(&common::dead_backend_url()?).await?;

    let (status, body) = get_json(format!("{}/d/cells?page=4", base), &common::admin_token()).await?;
    assert_eq!(status, StatusCode::OK);
    let data = &body["data"];
    assert_eq!(data["notice"]["level"], "error");
    assert_eq!(data["table"]["empty"]["illustration"], "empty-table");
    assert_eq!(data["table"]["rows"].as_array().map(Vec::len), Some(0));
    assert_eq!(data["table"]["pagination"]["page"], 4);
    Ok(())
}

#[tokio::test]
async fn unauthenticated_requests_are_rejected() -> Result<()> {
    let portal = common::spawn_portal().await?;

    let res = reqwest::get(portal.url("/d/cells")).await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let (status, _) = get_json(portal.url("/d/cells"), "not-a-token").await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn unknown_view_is_not_found() -> Result<()> {
    let portal = common::spawn_portal().await?;

    let (status, _) = get_json(portal.url("/d/pews"), &common::admin_token()).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn detail_loads_record_and_maps_missing_to_404() -> Result<()> {
    let portal = common::spawn_portal().await?;

    let (status, body) = get_json(portal.url("/d/cells/5"), &common::admin_token()).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["id"], "5");
    assert_eq!(body["data"]["collection"], "cells");

    let (status, _) = get_json(portal.url("/d/cells/missing"), &common::admin_token()).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn repeated_table_controls_use_last_value() -> Result<()> {
    let portal = common::spawn_portal().await?;

    let (status, body) = get_json(portal.url("/d/cells?q=zzz&q=adenta&name=x"), &common::admin_token()).await?;
    assert_eq!(status, StatusCode::OK);
    let rows = body["data"]["table"]["rows"].as_array().cloned().unwrap_or_default();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["cells"][0], "Adenta cell");
    assert_eq!(portal.backend.last_query().as_deref(), Some("name=x&page=1"));
    Ok(())
}
