#![allow(unused_must_use)]
//! Spaces whose encryption flag disagrees with their password hash.
//!
//! Such records can only arrive through an import; every access to them
//! fails closed with an opaque `500`.

use quiver_store::{Store, model::space::Space};
use salvo::http::StatusCode;
use serde_json::json;

use super::helpers::*;

/// Imports a space owned by `username` with the given protection fields.
fn import_space(
    server: &TestServer,
    username: &str,
    name: &str,
    is_encrypted: bool,
    password_hash: Option<&str>,
) -> String {
    let owner = server
        .store
        .account_by_username(username)
        .expect("lookup")
        .expect("owner exists");
    let now = chrono::Utc::now();
    let space = Space {
        id: uuid::Uuid::now_v7(),
        owner_id: owner.id,
        name: name.to_string(),
        is_encrypted,
        password_hash: password_hash.map(str::to_string),
        created_at: now,
        updated_at: now,
    };
    let id = space.id.to_string();
    server.store.import_space(space);
    id
}

fn assert_internal(response: TestResponse) {
    let response = response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.json(), json!({ "error": "Internal server error" }));
}

#[test_log::test(tokio::test)]
async fn encrypted_space_without_hash_fails_for_owner_and_admin() {
    let server = server();
    let admin = init_admin(&server).await;
    let alice = register_member(&server, &admin, "alice").await;
    let broken_id = import_space(&server, "alice", "Broken", true, None);
    let path = format!("/spaces/{broken_id}");
    let verify_path = format!("{path}/verify-password");

    for token in [&alice, &admin] {
        assert_internal(
            TestRequest::get(&path)
                .bearer(token)
                .space_password("secret1")
                .send(&server.service)
                .await,
        );

        assert_internal(
            TestRequest::post(&verify_path)
                .bearer(token)
                .json(&json!({ "password": "secret1" }))
                .send(&server.service)
                .await,
        );
    }

    assert_internal(
        TestRequest::delete(&path)
            .bearer(&alice)
            .space_password("secret1")
            .send(&server.service)
            .await,
    );
    let still_stored = server
        .store
        .space_by_id(broken_id.parse().expect("uuid"))
        .expect("lookup");
    assert!(still_stored.is_some());
}

#[test_log::test(tokio::test)]
async fn public_reads_of_inconsistent_spaces_fail_closed() {
    let server = public_server(ADMIN_USERNAME);
    init_admin(&server).await;
    let broken_id = import_space(&server, ADMIN_USERNAME, "Broken", true, None);
    let stray_id = import_space(
        &server,
        ADMIN_USERNAME,
        "Stray",
        false,
        Some("not-a-digest"),
    );

    for id in [&broken_id, &stray_id] {
        assert_internal(
            TestRequest::get(&format!("/spaces/{id}"))
                .send(&server.service)
                .await,
        );
    }

    let anonymous_check = TestRequest::post(&format!("/spaces/{broken_id}/verify-password"))
        .json(&json!({ "password": "secret1" }))
        .send(&server.service)
        .await
        .assert_status(StatusCode::UNAUTHORIZED)
        .json();
    assert_eq!(anonymous_check["valid"], json!(false));

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
    assert_eq!(names, [json!("Default")]);
}
