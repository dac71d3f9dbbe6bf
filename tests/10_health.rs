mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::Value;

use common::TestServer;

#[tokio::test]
async fn health_endpoint_reports_store() -> Result<()> {
    let server = TestServer::spawn().await?;

    let res = reqwest::get(server.url("/health")).await?;
    assert_eq!(res.status(), StatusCode::OK);

    let body: Value = res.json().await?;
    assert_eq!(body["status"], 200);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["database"], "ok");
    Ok(())
}

#[tokio::test]
async fn root_lists_endpoints() -> Result<()> {
    let server = TestServer::spawn().await?;

    let body: Value = reqwest::get(server.url("/")).await?.json().await?;
    assert_eq!(body["success"], true);
    assert!(body["data"]["endpoints"]["courses"].is_string());
    Ok(())
}

#[tokio::test]
async fn malformed_json_uses_error_envelope() -> Result<()> {
    let server = TestServer::spawn().await?;

    let res = reqwest::Client::new()
        .post(server.api("/users/register"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let body: Value = res.json().await?;
    assert_eq!(body["success"], false);
    assert!(body["data"].is_null());
    assert_eq!(body["code"], "INVALID_JSON");
    Ok(())
}
