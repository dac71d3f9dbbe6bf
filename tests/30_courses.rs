mod common;

use anyhow::Result;
use reqwest::{multipart::Form, StatusCode};
use serde_json::{json, Value};

use common::{client, course_form, create_course, image, signed_in, TestServer};

#[tokio::test]
async fn educator_creates_course_with_thumbnail() -> Result<()> {
    let server = TestServer::spawn().await?;
    let session = signed_in(&server, "educator").await?;

    let course = create_course(&server, &session, "rust-101", "499").await?;
    assert_eq!(course["courseName"], "rust-101");
    assert_eq!(course["title"], "rust-101");
    assert_eq!(course["category"], "web development");
    assert_eq!(course["tags"], json!(["rust", "web"]));
    assert_eq!(course["educatorId"], session.user_id.as_str());
    assert_eq!(course["likes"], 0);
    assert_eq!(course["enrollments"], 0);

    let thumbnail = course["thumbnail"].as_str().unwrap_or_default();
    assert!(thumbnail.starts_with("memory://thumbnails/"));
    assert!(server.storage.contains(thumbnail).await);
    Ok(())
}

#[tokio::test]
async fn create_course_validates_form() -> Result<()> {
    let server = TestServer::spawn().await?;
    let session = signed_in(&server, "strict").await?;
    let path = server.api("/courses/createCourse");

    let res = session.client.post(&path).multipart(course_form("neg", "-1")).send().await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await?;
    assert!(body["field_errors"]["price"].is_string());

    let tags = (0..11).map(|i| format!("t{i}")).collect::<Vec<_>>().join(",");
    let form = Form::new()
        .text("courseName", "too-many-tags")
        .text("description", "d")
        .text("price", "10")
        .text("duration", "1h")
        .text("category", "Language")
        .text("tags", tags)
        .part("thumbnail", image("t.png"));
    let res = session.client.post(&path).multipart(form).send().await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await?;
    assert!(body["field_errors"]["tags"].is_string());

    let form = Form::new()
        .text("courseName", "no-thumb")
        .text("description", "d")
        .text("price", "10")
        .text("duration", "1h")
        .text("category", "Language");
    let res = session.client.post(&path).multipart(form).send().await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await?;
    assert!(body["field_errors"]["thumbnail"].is_string());

    // nothing was left behind in storage by the rejected requests
    let res = client().get(server.api("/courses/allCourses")).send().await?;
    let body: Value = res.json().await?;
    assert_eq!(body["data"], json!([]));
    Ok(())
}

#[tokio::test]
async fn course_names_are_unique() -> Result<()> {
    let server = TestServer::spawn().await?;
    let session = signed_in(&server, "dup").await?;
    create_course(&server, &session, "same-name", "10").await?;

    let res = session
        .client
        .post(server.api("/courses/createCourse"))
        .multipart(course_form("same-name", "20"))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CONFLICT);
    Ok(())
}

#[tokio::test]
async fn only_the_owner_can_modify_a_course() -> Result<()> {
    let server = TestServer::spawn().await?;
    let owner = signed_in(&server, "owner").await?;
    let other = signed_in(&server, "other").await?;
    let course = create_course(&server, &owner, "owned", "100").await?;
    let id = course["id"].as_str().unwrap_or_default().to_string();

    let res = other
        .client
        .post(server.api(&format!("/courses/{id}/updateCourse")))
        .json(&json!({ "price": 1 }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = other
        .client
        .post(server.api(&format!("/courses/{id}/updateThumbnail")))
        .multipart(Form::new().part("thumbnail", image("x.png")))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = owner
        .client
        .post(server.api(&format!("/courses/{id}/updateCourse")))
        .json(&json!({ "price": 0, "title": "Owned, now free" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await?;
    assert_eq!(body["data"]["price"], 0.0);
    assert_eq!(body["data"]["title"], "Owned, now free");
    assert_eq!(body["data"]["courseName"], "owned");

    let res = owner
        .client
        .post(server.api(&format!("/courses/{id}/updateCourse")))
        .json(&json!({}))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = owner
        .client
        .post(server.api(&format!("/courses/{id}/updateCourse")))
        .json(&json!({ "price": -5 }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn thumbnail_replacement_discards_old_object() -> Result<()> {
    let server = TestServer::spawn().await?;
    let owner = signed_in(&server, "thumbs").await?;
    let course = create_course(&server, &owner, "pictured", "10").await?;
    let id = course["id"].as_str().unwrap_or_default().to_string();
    let old = course["thumbnail"].as_str().unwrap_or_default().to_string();

    let res = owner
        .client
        .post(server.api(&format!("/courses/{id}/updateThumbnail")))
        .multipart(Form::new().part("thumbnail", image("new.png")))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await?;
    let new = body["data"]["thumbnail"].as_str().unwrap_or_default().to_string();

    assert_ne!(old, new);
    assert!(server.storage.contains(&new).await);
    assert!(!server.storage.contains(&old).await);
    Ok(())
}

#[tokio::test]
async fn catalog_listings() -> Result<()> {
    let server = TestServer::spawn().await?;
    let session = signed_in(&server, "catalog").await?;
    create_course(&server, &session, "paid", "250").await?;
    create_course(&server, &session, "gratis", "0").await?;

    let body: Value = client().get(server.api("/courses/allCourses")).send().await?.json().await?;
    assert_eq!(body["data"].as_array().map(Vec::len), Some(2));
    assert_eq!(body["data"][0]["educator"]["username"], "catalog");

    let body: Value = client().get(server.api("/courses/getFree")).send().await?.json().await?;
    let free = body["data"].as_array().cloned().unwrap_or_default();
    assert_eq!(free.len(), 1);
    assert_eq!(free[0]["courseName"], "gratis");

    let body: Value = client()
        .get(server.api("/courses"))
        .query(&[("category", "WEB DEVELOPMENT")])
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(body["data"].as_array().map(Vec::len), Some(2));

    let body: Value = client()
        .get(server.api("/courses"))
        .query(&[("category", "cybersecurity")])
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(body["data"], json!([]));

    let res = client().get(server.api("/courses")).send().await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let body: Value = client().get(server.api("/courses/listCategory")).send().await?.json().await?;
    let categories = body["data"]["categories"].as_array().cloned().unwrap_or_default();
    assert!(categories.contains(&json!("Web Development")));
    Ok(())
}

#[tokio::test]
async fn course_detail_includes_lessons() -> Result<()> {
    let server = TestServer::spawn().await?;
    let session = signed_in(&server, "detail").await?;
    let course = create_course(&server, &session, "detailed", "5").await?;
    let id = course["id"].as_str().unwrap_or_default().to_string();
    common::create_lesson(&server, &session, &id, "Intro").await?;

    let res = client().get(server.api(&format!("/courses/{id}"))).send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await?;
    assert_eq!(body["data"]["educator"]["username"], "detail");
    assert_eq!(body["data"]["lessons"][0]["title"], "Intro");
    assert_eq!(body["data"]["lessons"][0]["videos"][0]["title"], "Intro video");

    let res = client()
        .get(server.api("/courses/00000000-0000-0000-0000-000000000000"))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = client().get(server.api("/courses/not-a-uuid")).send().await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    Ok(())
}
