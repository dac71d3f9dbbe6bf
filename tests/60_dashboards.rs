mod common;

use std::time::Duration;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::Value;

use common::{client, create_course, signed_in, TestServer};

#[tokio::test]
async fn student_dashboard_lists_enrollments_newest_first() -> Result<()> {
    let server = TestServer::spawn().await?;
    let educator = signed_in(&server, "dean").await?;
    let student = signed_in(&server, "learner").await?;

    let body: Value = student.client.get(server.api("/dashboards")).send().await?.json().await?;
    assert_eq!(body["message"], "You have not enrolled in any courses");
    assert_eq!(body["data"]["username"], "learner");
    assert!(body["data"]["courses"].as_array().is_some_and(Vec::is_empty));

    for name in ["older", "newer"] {
        let course = create_course(&server, &educator, name, "0").await?;
        let id = course["id"].as_str().unwrap_or_default();
        let res = student.client.post(server.api(&format!("/enrollments/{id}"))).send().await?;
        assert_eq!(res.status(), StatusCode::OK);
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    let body: Value = student.client.get(server.api("/dashboards")).send().await?.json().await?;
    assert_eq!(body["message"], "Dashboard fetched");
    assert!(body["data"].get("password").is_none());
    assert_eq!(body["data"]["courses"][0]["courseName"], "newer");
    assert_eq!(body["data"]["courses"][1]["courseName"], "older");
    Ok(())
}

#[tokio::test]
async fn educator_dashboard_sums_counters() -> Result<()> {
    let server = TestServer::spawn().await?;
    let educator = signed_in(&server, "founder").await?;
    let a = signed_in(&server, "a").await?;
    let b = signed_in(&server, "b").await?;

    let first = create_course(&server, &educator, "first", "10").await?;
    let second = create_course(&server, &educator, "second", "20").await?;
    let first_id = first["id"].as_str().unwrap_or_default();
    let second_id = second["id"].as_str().unwrap_or_default();

    for student in [&a, &b] {
        student.client.post(server.api(&format!("/enrollments/{first_id}"))).send().await?;
    }
    a.client.post(server.api(&format!("/enrollments/{second_id}"))).send().await?;
    b.client.post(server.api(&format!("/likes/{second_id}/toggleLike"))).send().await?;

    let res = educator.client.get(server.api("/dashboards/educator")).send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await?;
    assert_eq!(body["data"]["totalCourses"], 2);
    assert_eq!(body["data"]["totalEnrollments"], 3);
    assert_eq!(body["data"]["totalLikes"], 1);

    let body: Value = a.client.get(server.api("/dashboards/educator")).send().await?.json().await?;
    assert_eq!(body["data"]["totalCourses"], 0);
    Ok(())
}

#[tokio::test]
async fn dashboards_require_a_session() -> Result<()> {
    let server = TestServer::spawn().await?;

    for path in ["/dashboards", "/dashboards/educator"] {
        let res = client().get(server.api(path)).send().await?;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }
    Ok(())
}
