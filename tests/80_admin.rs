mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::Value;

use common::{client, signed_in, TestServer, ADMIN_KEY};

#[tokio::test]
async fn user_list_requires_api_key() -> Result<()> {
    let server = TestServer::spawn().await?;
    signed_in(&server, "listed").await?;

    let res = client().get(server.api("/users")).send().await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = client()
        .get(server.api("/users"))
        .header("x-api-key", "wrong-key")
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let body: Value = res.json().await?;
    assert_eq!(body["message"], "Invalid API key");

    let res = client()
        .get(server.api("/users"))
        .header("x-api-key", ADMIN_KEY)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await?;
    let users = body["data"].as_array().cloned().unwrap_or_default();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0]["username"], "listed");
    assert!(users[0].get("password").is_none());
    Ok(())
}
