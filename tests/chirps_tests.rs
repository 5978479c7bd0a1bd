mod common;

use axum::http::StatusCode;
use common::{bearer, create_test_app};
use serde_json::json;

#[tokio::test]
async fn test_create_chirp() {
    let app = create_test_app().await;
    let (id, access, _) = app.signup("a@x.com", "pw1").await;

    let chirp = app.create_chirp(&access, "Hello, world!").await;
    assert_eq!(chirp["body"], "Hello, world!");
    assert_eq!(chirp["user_id"], id.as_str());
    assert!(uuid::Uuid::parse_str(chirp["id"].as_str().unwrap()).is_ok());
}

#[tokio::test]
async fn test_create_chirp_filters_profanity() {
    let app = create_test_app().await;
    let (_, access, _) = app.signup("a@x.com", "pw1").await;

    let chirp = app
        .create_chirp(&access, "I hear Mastodon is better than Chirpy. sharbert I need to migrate")
        .await;
    assert_eq!(
        chirp["body"],
        "I hear Mastodon is better than Chirpy. **** I need to migrate"
    );

    let chirp = app.create_chirp(&access, "Kerfuffle and FORNAX").await;
    assert_eq!(chirp["body"], "**** and ****");
}

#[tokio::test]
async fn test_create_chirp_length_limit() {
    let app = create_test_app().await;
    let (_, access, _) = app.signup("a@x.com", "pw1").await;

    app.create_chirp(&access, &"a".repeat(140)).await;

    // Limit counts characters, not bytes
    app.create_chirp(&access, &"é".repeat(140)).await;

    let (status, json) = app
        .send(
            "POST",
            "/api/chirps",
            Some(&bearer(&access)),
            Some(json!({ "body": "a".repeat(141) })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "Chirp is too long");
}

#[tokio::test]
async fn test_create_chirp_requires_auth() {
    let app = create_test_app().await;

    let (status, json) = app
        .send("POST", "/api/chirps", None, Some(json!({ "body": "hi" })))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["error"], "Unauthorized");

    let (status, _) = app
        .send(
            "POST",
            "/api/chirps",
            Some("Bearer not.a.jwt"),
            Some(json!({ "body": "hi" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_list_chirps_order_and_author() {
    let app = create_test_app().await;
    let (alice, alice_token, _) = app.signup("a@x.com", "pw1").await;
    let (_, bob_token, _) = app.signup("b@x.com", "pw2").await;

    app.create_chirp(&alice_token, "first").await;
    app.create_chirp(&bob_token, "second").await;
    app.create_chirp(&alice_token, "third").await;

    let bodies = |json: &serde_json::Value| -> Vec<String> {
        json.as_array()
            .unwrap()
            .iter()
            .map(|c| c["body"].as_str().unwrap().to_string())
            .collect()
    };

    let (status, json) = app.send("GET", "/api/chirps", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(bodies(&json), ["first", "second", "third"]);

    let (_, json) = app.send("GET", "/api/chirps?sort=desc", None, None).await;
    assert_eq!(bodies(&json), ["third", "second", "first"]);

    let (_, json) = app.send("GET", "/api/chirps?sort=asc", None, None).await;
    assert_eq!(bodies(&json), ["first", "second", "third"]);

    let uri = format!("/api/chirps?author_id={}&sort=desc", alice);
    let (status, json) = app.send("GET", &uri, None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(bodies(&json), ["third", "first"]);
}

#[tokio::test]
async fn test_list_chirps_empty() {
    let app = create_test_app().await;

    let (status, json) = app.send("GET", "/api/chirps", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, json!([]));
}

#[tokio::test]
async fn test_list_chirps_invalid_author() {
    let app = create_test_app().await;

    let (status, json) = app
        .send("GET", "/api/chirps?author_id=nope", None, None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "Invalid author_id");
}

#[tokio::test]
async fn test_get_chirp() {
    let app = create_test_app().await;
    let (_, access, _) = app.signup("a@x.com", "pw1").await;
    let chirp = app.create_chirp(&access, "findable").await;

    let uri = format!("/api/chirps/{}", chirp["id"].as_str().unwrap());
    let (status, json) = app.send("GET", &uri, None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, chirp);

    let uri = format!("/api/chirps/{}", uuid::Uuid::new_v4());
    let (status, json) = app.send("GET", &uri, None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"], "Chirp not found");

    let (status, json) = app.send("GET", "/api/chirps/not-a-uuid", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "Invalid chirp ID");
}

#[tokio::test]
async fn test_delete_chirp_owner_only() {
    let app = create_test_app().await;
    let (_, alice_token, _) = app.signup("a@x.com", "pw1").await;
    let (_, bob_token, _) = app.signup("b@x.com", "pw2").await;

    let chirp = app.create_chirp(&bob_token, "bob's chirp").await;
    let uri = format!("/api/chirps/{}", chirp["id"].as_str().unwrap());

    let (status, json) = app
        .send("DELETE", &uri, Some(&bearer(&alice_token)), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(json["error"], "Forbidden");

    // Still there
    let (status, _) = app.send("GET", &uri, None, None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app
        .send("DELETE", &uri, Some(&bearer(&bob_token)), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(body.is_null());

    let (status, _) = app.send("GET", &uri, None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_chirp_check_order() {
    let app = create_test_app().await;
    let (_, access, _) = app.signup("a@x.com", "pw1").await;

    // Unauthenticated wins over a bad ID
    let (status, _) = app
        .send("DELETE", "/api/chirps/not-a-uuid", None, None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Bad ID wins over lookup
    let (status, _) = app
        .send(
            "DELETE",
            "/api/chirps/not-a-uuid",
            Some(&bearer(&access)),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Absent resource is 404, not 403
    let uri = format!("/api/chirps/{}", uuid::Uuid::new_v4());
    let (status, _) = app.send("DELETE", &uri, Some(&bearer(&access)), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_deleting_user_removes_chirps() {
    let app = create_test_app().await;
    let (_, access, _) = app.signup("a@x.com", "pw1").await;
    app.create_chirp(&access, "gone soon").await;

    app.db.users().delete_all().await.unwrap();

    let (_, json) = app.send("GET", "/api/chirps", None, None).await;
    assert_eq!(json, json!([]));
}
