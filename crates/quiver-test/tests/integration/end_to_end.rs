#![allow(unused_must_use)]
//! First-run flow from an empty installation to an admin bypass.

use salvo::http::StatusCode;
use serde_json::json;

use super::helpers::*;

#[test_log::test(tokio::test)]
async fn first_run_to_admin_bypass() {
    let server = server();

    TestRequest::post("/auth/init")
        .json(&json!({ "username": "admin", "password": "admin123" }))
        .send(&server.service)
        .await
        .assert_status(StatusCode::OK);

    let status = TestRequest::get("/auth/init").send(&server.service).await.json();
    assert_eq!(status["needsInit"], json!(false));

    let token = login(&server, "admin", "admin123").await;
    let space_id = create_space(&server, &token, "Work", Some("secret1")).await;
    let path = format!("/spaces/{space_id}/verify-password");

    TestRequest::post(&path)
        .json(&json!({ "password": "wrong" }))
        .send(&server.service)
        .await
        .assert_status(StatusCode::UNAUTHORIZED);

    let bypass = TestRequest::post(&path)
        .bearer(&token)
        .json(&json!({ "password": "wrong" }))
        .send(&server.service)
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert_eq!(bypass["valid"], json!(true));
}
