mod common;

use anyhow::Result;
use reqwest::{multipart::Form, StatusCode};
use serde_json::{json, Value};

use common::{client, create_course, create_lesson, signed_in, video, TestServer};

fn id(value: &Value) -> String {
    value["id"].as_str().unwrap_or_default().to_string()
}

#[tokio::test]
async fn lessons_are_listed_in_creation_order() -> Result<()> {
    let server = TestServer::spawn().await?;
    let owner = signed_in(&server, "lecturer").await?;
    let course_id = id(&create_course(&server, &owner, "ordered", "10").await?);

    let first = create_lesson(&server, &owner, &course_id, "First").await?;
    create_lesson(&server, &owner, &course_id, "Second").await?;
    assert_eq!(first["videos"].as_array().map(Vec::len), Some(1));

    let res = owner.client.get(server.api(&format!("/lessons/{course_id}"))).send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await?;
    let titles: Vec<&str> = body["data"]
        .as_array()
        .map(|lessons| lessons.iter().filter_map(|l| l["title"].as_str()).collect())
        .unwrap_or_default();
    assert_eq!(titles, ["First", "Second"]);

    // listing needs a session
    let res = client().get(server.api(&format!("/lessons/{course_id}"))).send().await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn lesson_creation_requires_video_and_ownership() -> Result<()> {
    let server = TestServer::spawn().await?;
    let owner = signed_in(&server, "maker").await?;
    let stranger = signed_in(&server, "stranger").await?;
    let course_id = id(&create_course(&server, &owner, "guarded", "10").await?);

    let form = Form::new().text("lessonTitle", "No video").text("videoTitle", "missing");
    let res = owner
        .client
        .post(server.api(&format!("/lessons/{course_id}")))
        .multipart(form)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let form = Form::new()
        .text("lessonTitle", "Wrong kind")
        .text("videoTitle", "image")
        .part("video", common::image("frame.png"));
    let res = owner
        .client
        .post(server.api(&format!("/lessons/{course_id}")))
        .multipart(form)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let form = Form::new()
        .text("lessonTitle", "Intruder")
        .text("videoTitle", "x")
        .part("video", video("x.mp4"));
    let res = stranger
        .client
        .post(server.api(&format!("/lessons/{course_id}")))
        .multipart(form)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test]
async fn videos_are_added_updated_and_removed() -> Result<()> {
    let server = TestServer::spawn().await?;
    let owner = signed_in(&server, "editor").await?;
    let course_id = id(&create_course(&server, &owner, "editable", "10").await?);
    let lesson = create_lesson(&server, &owner, &course_id, "Basics").await?;
    let lesson_id = id(&lesson);

    let form = Form::new()
        .text("videoTitle", "Part two")
        .part("video", video("two.mp4"));
    let res = owner
        .client
        .post(server.api(&format!("/lessons/{course_id}/{lesson_id}")))
        .multipart(form)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    let added: Value = res.json().await?;
    let video_id = id(&added["data"]);
    let video_url = added["data"]["url"].as_str().unwrap_or_default().to_string();
    assert!(video_url.starts_with("memory://course-videos/"));
    assert!(server.storage.contains(&video_url).await);

    let res = owner
        .client
        .put(server.api(&format!("/lessons/{course_id}/{lesson_id}")))
        .json(&json!({ "title": "Basics, revised" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await?;
    assert_eq!(body["data"]["title"], "Basics, revised");

    let res = owner
        .client
        .delete(server.api(&format!("/lessons/{course_id}/{lesson_id}/{video_id}")))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    assert!(!server.storage.contains(&video_url).await);

    let body: Value = owner
        .client
        .get(server.api(&format!("/lessons/{course_id}")))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(body["data"][0]["videos"].as_array().map(Vec::len), Some(1));
    Ok(())
}

#[tokio::test]
async fn deleting_lesson_removes_its_videos() -> Result<()> {
    let server = TestServer::spawn().await?;
    let owner = signed_in(&server, "cleaner").await?;
    let course_id = id(&create_course(&server, &owner, "tidy", "10").await?);
    let lesson = create_lesson(&server, &owner, &course_id, "Temporary").await?;
    let lesson_id = id(&lesson);
    let url = lesson["videos"][0]["url"].as_str().unwrap_or_default().to_string();
    assert!(server.storage.contains(&url).await);

    let res = owner
        .client
        .delete(server.api(&format!("/lessons/{course_id}/{lesson_id}")))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await?;
    assert_eq!(body["data"]["id"], lesson_id.as_str());
    assert!(!server.storage.contains(&url).await);

    let res = owner
        .client
        .delete(server.api(&format!("/lessons/{course_id}/{lesson_id}")))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    Ok(())
}
