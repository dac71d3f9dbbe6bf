mod common;

use anyhow::Result;
use reqwest::{
    header::{COOKIE, SET_COOKIE},
    StatusCode,
};
use serde_json::{json, Value};

use common::{client, register, signed_in, TestServer};

#[tokio::test]
async fn register_hides_password_and_rejects_duplicates() -> Result<()> {
    let server = TestServer::spawn().await?;
    let client = client();

    let res = register(&server, &client, "ada").await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: Value = res.json().await?;
    assert_eq!(body["data"]["email"], "ada@example.com");
    assert!(body["data"].get("password").is_none());

    let again = register(&server, &client, "ada").await?;
    assert_eq!(again.status(), StatusCode::CONFLICT);
    let body: Value = again.json().await?;
    assert_eq!(body["code"], "CONFLICT");
    Ok(())
}

#[tokio::test]
async fn register_validates_input() -> Result<()> {
    let server = TestServer::spawn().await?;

    let res = client()
        .post(server.api("/users/register"))
        .json(&json!({ "username": "bob", "email": "not-an-email", "password": "pw" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = client()
        .post(server.api("/users/register"))
        .json(&json!({ "username": "bob", "email": "bob@example.com" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await?;
    assert!(body["field_errors"]["password"].is_string());
    Ok(())
}

#[tokio::test]
async fn login_sets_http_only_cookies() -> Result<()> {
    let server = TestServer::spawn().await?;
    register(&server, &client(), "cookie").await?;

    let res = reqwest::Client::new()
        .post(server.api("/users/login"))
        .json(&json!({ "email": "cookie@example.com", "password": "password123" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let cookies: Vec<String> = res
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok().map(str::to_string))
        .collect();
    assert!(cookies.iter().any(|c| c.starts_with("accessToken=") && c.contains("HttpOnly")));
    assert!(cookies.iter().any(|c| c.starts_with("refreshToken=") && c.contains("HttpOnly")));

    let body: Value = res.json().await?;
    assert!(body["data"]["accessToken"].is_string());
    assert!(body["data"]["refreshToken"].is_string());
    assert_eq!(body["message"], "Logged in");
    Ok(())
}

#[tokio::test]
async fn bad_credentials_are_unauthorized() -> Result<()> {
    let server = TestServer::spawn().await?;
    register(&server, &client(), "eve").await?;

    for (email, password) in [("eve@example.com", "wrong"), ("nobody@example.com", "password123")] {
        let res = client()
            .post(server.api("/users/login"))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        let body: Value = res.json().await?;
        assert_eq!(body["message"], "Invalid credentials");
    }
    Ok(())
}

#[tokio::test]
async fn protected_routes_require_a_valid_token() -> Result<()> {
    let server = TestServer::spawn().await?;
    let session = signed_in(&server, "grace").await?;

    let res = client().get(server.api("/users/current")).send().await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = client()
        .get(server.api("/users/current"))
        .bearer_auth("not.a.token")
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    // refresh tokens are not access tokens
    let res = client()
        .get(server.api("/users/current"))
        .bearer_auth(&session.refresh_token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = client()
        .get(server.api("/users/current"))
        .bearer_auth(&session.access_token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let body: Value = session.client.get(server.api("/users/current")).send().await?.json().await?;
    assert_eq!(body["data"]["id"], session.user_id.as_str());
    Ok(())
}

#[tokio::test]
async fn refresh_rotates_and_rejects_stale_token() -> Result<()> {
    let server = TestServer::spawn().await?;
    let session = signed_in(&server, "linus").await?;

    let res = client()
        .post(server.api("/users/refresh"))
        .json(&json!({ "refreshToken": session.refresh_token }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await?;
    let rotated = body["data"]["refreshToken"].as_str().unwrap_or_default().to_string();
    assert!(!rotated.is_empty());
    assert_ne!(rotated, session.refresh_token);

    let stale = client()
        .post(server.api("/users/refresh"))
        .json(&json!({ "refreshToken": session.refresh_token }))
        .send()
        .await?;
    assert_eq!(stale.status(), StatusCode::UNAUTHORIZED);

    let missing = client().post(server.api("/users/refresh")).send().await?;
    assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn logout_clears_cookies_and_refresh_reference() -> Result<()> {
    let server = TestServer::spawn().await?;
    let session = signed_in(&server, "ken").await?;

    let res = session.client.post(server.api("/users/logout")).send().await?;
    assert_eq!(res.status(), StatusCode::OK);

    let res = session.client.get(server.api("/users/current")).send().await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = client()
        .post(server.api("/users/refresh"))
        .json(&json!({ "refreshToken": session.refresh_token }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn account_routes_only_touch_own_account() -> Result<()> {
    let server = TestServer::spawn().await?;
    let alice = signed_in(&server, "alice").await?;
    let bob = signed_in(&server, "bob").await?;

    let res = alice
        .client
        .put(server.api(&format!("/users/{}/updateprofile", bob.user_id)))
        .json(&json!({ "fullname": "Bob B", "bio": "hijacked" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = alice
        .client
        .put(server.api(&format!("/users/{}/updateprofile", alice.user_id)))
        .json(&json!({ "fullname": "Alice A", "bio": "Rustacean" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await?;
    assert_eq!(body["data"]["fullname"], "Alice A");

    let res = alice
        .client
        .put(server.api(&format!("/users/{}/updateprofile", alice.user_id)))
        .json(&json!({ "fullname": "Alice A" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn change_password_requires_old_password() -> Result<()> {
    let server = TestServer::spawn().await?;
    let session = signed_in(&server, "pat").await?;
    let path = server.api(&format!("/users/{}/changepassword", session.user_id));

    let res = session
        .client
        .put(&path)
        .json(&json!({ "oldPassword": "wrong", "newPassword": "fresh-password" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = session
        .client
        .put(&path)
        .json(&json!({ "oldPassword": "password123", "newPassword": "password123" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = session
        .client
        .put(&path)
        .json(&json!({ "oldPassword": "password123", "newPassword": "fresh-password" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let res = client()
        .post(server.api("/users/login"))
        .json(&json!({ "email": "pat@example.com", "password": "fresh-password" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    // the refresh token issued before the change is void
    let res = client()
        .post(server.api("/users/refresh"))
        .json(&json!({ "refreshToken": session.refresh_token }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn profile_and_cover_images_are_stored() -> Result<()> {
    let server = TestServer::spawn().await?;
    let session = signed_in(&server, "pic").await?;

    let form = reqwest::multipart::Form::new().part("image", common::image("me.png"));
    let res = session
        .client
        .post(server.api(&format!("/users/{}/profile/image", session.user_id)))
        .multipart(form)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await?;
    let url = body["data"]["profileImage"].as_str().unwrap_or_default().to_string();
    assert!(url.starts_with("memory://profile-images/"));
    assert!(server.storage.contains(&url).await);

    let form = reqwest::multipart::Form::new().part("image", common::video("clip.mp4"));
    let res = session
        .client
        .post(server.api(&format!("/users/{}/cover/image", session.user_id)))
        .multipart(form)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let form = reqwest::multipart::Form::new().text("caption", "no file");
    let res = session
        .client
        .post(server.api(&format!("/users/{}/cover/image", session.user_id)))
        .multipart(form)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn deleting_account_logs_out() -> Result<()> {
    let server = TestServer::spawn().await?;
    let session = signed_in(&server, "temp").await?;

    let res = session
        .client
        .delete(server.api(&format!("/users/{}/delete", session.user_id)))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let res = client()
        .get(server.api("/users/current"))
        .bearer_auth(&session.access_token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = client()
        .post(server.api("/users/login"))
        .json(&json!({ "email": "temp@example.com", "password": "password123" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn logout_with_rotated_token_keeps_live_session() -> Result<()> {
    let server = TestServer::spawn().await?;
    let session = signed_in(&server, "grace").await?;

    // Rotate through the session's cookie jar; `session.refresh_token` is now stale
    let res = session.client.post(server.api("/users/refresh")).send().await?;
    assert_eq!(res.status(), StatusCode::OK);

    let res = client()
        .post(server.api("/users/logout"))
        .header(COOKIE, format!("refreshToken={}", session.refresh_token))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let res = session.client.post(server.api("/users/refresh")).send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn passwords_are_not_trimmed() -> Result<()> {
    let server = TestServer::spawn().await?;
    let client = client();

    let res = client
        .post(server.api("/users/register"))
        .json(&json!({ "username": "barbara", "email": "barbara@example.com", "password": "  padded secret  " }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);

    let trimmed = client
        .post(server.api("/users/login"))
        .json(&json!({ "email": "barbara@example.com", "password": "padded secret" }))
        .send()
        .await?;
    assert_eq!(trimmed.status(), StatusCode::UNAUTHORIZED);

    let exact = client
        .post(server.api("/users/login"))
        .json(&json!({ "email": "barbara@example.com", "password": "  padded secret  " }))
        .send()
        .await?;
    assert_eq!(exact.status(), StatusCode::OK);

    let blank = client
        .post(server.api("/users/register"))
        .json(&json!({ "username": "blank", "email": "blank@example.com", "password": "   " }))
        .send()
        .await?;
    assert_eq!(blank.status(), StatusCode::BAD_REQUEST);
    Ok(())
}
