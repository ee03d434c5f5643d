#![allow(unused_must_use, clippy::too_many_lines)]
//! Space endpoints and the access guard behind them.
//!
//! ## Access Model
//! - The administrator acts on every space, encrypted or not, without its password
//! - An owner acts on their own spaces; encrypted ones need `x-space-password`
//! - Other owners see `404` for spaces they do not own
//! - Anonymous callers read the public owner's unprotected spaces only

use salvo::http::StatusCode;
use serde_json::json;

use super::helpers::*;

#[test_log::test(tokio::test)]
async fn owner_reads_encrypted_space_only_with_password() {
    let server = server();
    let admin = init_admin(&server).await;
    let alice = register_member(&server, &admin, "alice").await;
    let space_id = create_space(&server, &alice, "Work", Some("secret1")).await;
    let path = format!("/spaces/{space_id}");

    let body = TestRequest::get(&path)
        .bearer(&alice)
        .space_password("secret1")
        .send(&server.service)
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert_eq!(body["data"]["name"], json!("Work"));
    assert_eq!(body["data"]["isEncrypted"], json!(true));
    assert!(body["data"].get("passwordHash").is_none());

    TestRequest::get(&path)
        .bearer(&alice)
        .space_password("wrong")
        .send(&server.service)
        .await
        .assert_status(StatusCode::FORBIDDEN);

    TestRequest::get(&path)
        .bearer(&alice)
        .send(&server.service)
        .await
        .assert_status(StatusCode::FORBIDDEN);
}

#[test_log::test(tokio::test)]
async fn foreign_spaces_are_not_found() {
    let server = server();
    let admin = init_admin(&server).await;
    let alice = register_member(&server, &admin, "alice").await;
    let bob = register_member(&server, &admin, "bob").await;
    let space_id = create_space(&server, &alice, "Reading", None).await;
    let path = format!("/spaces/{space_id}");

    let response = TestRequest::get(&path)
        .bearer(&bob)
        .send(&server.service)
        .await
        .assert_status(StatusCode::NOT_FOUND);
    assert_eq!(response.json(), json!({ "error": "Not found" }));

    TestRequest::delete(&path)
        .bearer(&bob)
        .send(&server.service)
        .await
        .assert_status(StatusCode::NOT_FOUND);

    let unknown = format!("/spaces/{}", uuid::Uuid::now_v7());
    TestRequest::get(&unknown)
        .bearer(&alice)
        .send(&server.service)
        .await
        .assert_status(StatusCode::NOT_FOUND);

    TestRequest::get("/spaces/not-a-uuid")
        .bearer(&alice)
        .send(&server.service)
        .await
        .assert_status(StatusCode::NOT_FOUND);

    let listed = TestRequest::get("/spaces")
        .bearer(&bob)
        .send(&server.service)
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert_eq!(listed["data"], json!([]));
}

#[test_log::test(tokio::test)]
async fn admin_bypasses_space_passwords() {
    let server = server();
    let admin = init_admin(&server).await;
    let alice = register_member(&server, &admin, "alice").await;
    let space_id = create_space(&server, &alice, "Private", Some("secret1")).await;
    let path = format!("/spaces/{space_id}");

    TestRequest::get(&path)
        .bearer(&admin)
        .send(&server.service)
        .await
        .assert_status(StatusCode::OK);

    let renamed = TestRequest::put(&path)
        .bearer(&admin)
        .json(&json!({ "name": "Audited" }))
        .send(&server.service)
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert_eq!(renamed["data"]["name"], json!("Audited"));
    assert_eq!(renamed["data"]["isEncrypted"], json!(true));

    let listed = TestRequest::get("/spaces")
        .bearer(&admin)
        .send(&server.service)
        .await
        .json();
    let names: Vec<_> = listed["data"]
        .as_array()
        .expect("space list")
        .iter()
        .map(|space| space["name"].clone())
        .collect();
    assert_eq!(names, [json!("Default"), json!("Audited")]);
}

#[test_log::test(tokio::test)]
async fn anonymous_reads_public_owner_spaces_only() {
    let server = public_server(ADMIN_USERNAME);
    let admin = init_admin(&server).await;
    let open_id = create_space(&server, &admin, "Links", None).await;
    let locked_id = create_space(&server, &admin, "Vault", Some("secret1")).await;

    let listed = TestRequest::get("/spaces")
        .send(&server.service)
        .await
        .assert_status(StatusCode::OK)
        .json();
    let names: Vec<_> = listed["data"]
        .as_array()
        .expect("space list")
        .iter()
        .map(|space| space["name"].clone())
        .collect();
    assert_eq!(names, [json!("Default"), json!("Links")]);

    TestRequest::get(&format!("/spaces/{open_id}"))
        .send(&server.service)
        .await
        .assert_status(StatusCode::OK);

    TestRequest::get(&format!("/spaces/{locked_id}"))
        .space_password("secret1")
        .send(&server.service)
        .await
        .assert_status(StatusCode::UNAUTHORIZED);

    TestRequest::put(&format!("/spaces/{open_id}"))
        .json(&json!({ "name": "Defaced" }))
        .send(&server.service)
        .await
        .assert_status(StatusCode::UNAUTHORIZED);

    TestRequest::post("/spaces")
        .json(&json!({ "name": "Spam" }))
        .send(&server.service)
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}

#[test_log::test(tokio::test)]
async fn anonymous_without_public_owner_sees_nothing() {
    let server = server();
    let admin = init_admin(&server).await;
    let space_id = create_space(&server, &admin, "Links", None).await;

    let listed = TestRequest::get("/spaces")
        .send(&server.service)
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert_eq!(listed["data"], json!([]));

    TestRequest::get(&format!("/spaces/{space_id}"))
        .send(&server.service)
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[test_log::test(tokio::test)]
async fn create_validates_name_and_password_combination() {
    let server = server();
    let admin = init_admin(&server).await;

    let cases = [
        (json!({ "name": "  " }), "Space name is required"),
        (
            json!({ "name": "Work", "isEncrypted": true }),
            "Password is required for encrypted spaces",
        ),
        (
            json!({ "name": "Work", "password": "secret1" }),
            "Password is only allowed for encrypted spaces",
        ),
        (
            json!({ "name": "Work", "isEncrypted": true, "password": "abc" }),
            "Password must be at least 6 characters",
        ),
    ];

    for (body, message) in cases {
        let response = TestRequest::post("/spaces")
            .bearer(&admin)
            .json(&body)
            .send(&server.service)
            .await
            .assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(response.json(), json!({ "error": message }), "body {body}");
    }
}

#[test_log::test(tokio::test)]
async fn owner_toggles_encryption() {
    let server = server();
    let admin = init_admin(&server).await;
    let alice = register_member(&server, &admin, "alice").await;
    let space_id = create_space(&server, &alice, "Work", None).await;
    let path = format!("/spaces/{space_id}");

    TestRequest::put(&path)
        .bearer(&alice)
        .json(&json!({ "isEncrypted": true }))
        .send(&server.service)
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    let locked = TestRequest::put(&path)
        .bearer(&alice)
        .json(&json!({ "isEncrypted": true, "password": "secret1" }))
        .send(&server.service)
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert_eq!(locked["data"]["isEncrypted"], json!(true));

    TestRequest::put(&path)
        .bearer(&alice)
        .json(&json!({ "isEncrypted": false }))
        .send(&server.service)
        .await
        .assert_status(StatusCode::FORBIDDEN);

    let rekeyed = TestRequest::put(&path)
        .bearer(&alice)
        .space_password("secret1")
        .json(&json!({ "password": "secret2" }))
        .send(&server.service)
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert_eq!(rekeyed["data"]["isEncrypted"], json!(true));

    TestRequest::get(&path)
        .bearer(&alice)
        .space_password("secret1")
        .send(&server.service)
        .await
        .assert_status(StatusCode::FORBIDDEN);

    let unlocked = TestRequest::put(&path)
        .bearer(&alice)
        .space_password("secret2")
        .json(&json!({ "isEncrypted": false }))
        .send(&server.service)
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert_eq!(unlocked["data"]["isEncrypted"], json!(false));

    TestRequest::get(&path)
        .bearer(&alice)
        .send(&server.service)
        .await
        .assert_status(StatusCode::OK);
}

#[test_log::test(tokio::test)]
async fn delete_requires_password_and_removes_space() {
    let server = server();
    let admin = init_admin(&server).await;
    let alice = register_member(&server, &admin, "alice").await;
    let space_id = create_space(&server, &alice, "Work", Some("secret1")).await;
    let path = format!("/spaces/{space_id}");

    TestRequest::delete(&path)
        .bearer(&alice)
        .send(&server.service)
        .await
        .assert_status(StatusCode::FORBIDDEN);

    TestRequest::delete(&path)
        .bearer(&alice)
        .space_password("secret1")
        .send(&server.service)
        .await
        .assert_status(StatusCode::OK);

    TestRequest::get(&path)
        .bearer(&alice)
        .space_password("secret1")
        .send(&server.service)
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

/// ## Summary
/// Access is decided before the body is read, so a malformed update body
/// cannot turn a refusal into a `400`.
#[test_log::test(tokio::test)]
async fn update_refuses_access_before_reading_body() {
    let server = public_server(ADMIN_USERNAME);
    let admin = init_admin(&server).await;
    let alice = register_member(&server, &admin, "alice").await;
    let open_id = create_space(&server, &admin, "Links", None).await;
    let locked_id = create_space(&server, &alice, "Work", Some("secret1")).await;

    TestRequest::put(&format!("/spaces/{open_id}"))
        .raw_json("{ not json")
        .send(&server.service)
        .await
        .assert_status(StatusCode::UNAUTHORIZED);

    TestRequest::put(&format!("/spaces/{locked_id}"))
        .bearer(&alice)
        .raw_json("{ not json")
        .send(&server.service)
        .await
        .assert_status(StatusCode::FORBIDDEN);

    TestRequest::put(&format!("/spaces/{locked_id}"))
        .bearer(&alice)
        .space_password("secret1")
        .raw_json("{ not json")
        .send(&server.service)
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}
