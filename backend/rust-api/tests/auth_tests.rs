mod common;

use axum::http::StatusCode;
use serde_json::json;

use phonics_api::models::ExerciseCategory;

#[tokio::test]
async fn test_register_returns_profile_and_token() {
    let app = common::create_test_app();

    let (status, json) = app
        .request(
            "POST",
            "/api/auth/register",
            None,
            Some(json!({
                "email": "Kid@School.com",
                "password": "password123",
                "name": "Kid",
                "grade": 2,
            })),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["user"]["email"], "kid@school.com");
    assert_eq!(json["user"]["role"], "student");
    assert_eq!(json["user"]["grade"], 2);
    assert!(json["user"].get("passwordHash").is_none());
    assert!(!json["token"].as_str().unwrap().is_empty());

    let claims = app
        .state
        .jwt
        .validate_token(json["token"].as_str().unwrap())
        .unwrap();
    assert_eq!(claims.sub, json["user"]["id"].as_str().unwrap());
}

#[tokio::test]
async fn test_duplicate_email_is_rejected() {
    let app = common::create_test_app();
    let body = json!({ "email": "dup@school.com", "password": "password123", "name": "A" });

    let (first, _) = app
        .request("POST", "/api/auth/register", None, Some(body.clone()))
        .await;
    let (second, json) = app
        .request("POST", "/api/auth/register", None, Some(body))
        .await;

    assert_eq!(first, StatusCode::CREATED);
    assert_eq!(second, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "User with this email already exists");
}

#[tokio::test]
async fn test_register_validates_input() {
    let app = common::create_test_app();

    let (status, json) = app
        .request(
            "POST",
            "/api/auth/register",
            None,
            Some(json!({ "email": "nope", "password": "short", "name": "" })),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"]
        .as_str()
        .unwrap()
        .starts_with("Validation error"));
}

#[tokio::test]
async fn test_register_rejects_whitespace_name() {
    let app = common::create_test_app();

    let (status, json) = app
        .request(
            "POST",
            "/api/auth/register",
            None,
            Some(json!({ "email": "blank@school.com", "password": "password123", "name": "   " })),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let error = json["error"].as_str().unwrap();
    assert!(error.starts_with("Validation error"), "{}", error);
    assert!(error.contains("name"), "{}", error);
}

#[tokio::test]
async fn test_login_returns_progress() {
    let app = common::create_test_app();
    let (status, json) = app
        .request(
            "POST",
            "/api/auth/register",
            None,
            Some(json!({ "email": "reader@school.com", "password": "password123", "name": "Reader" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let user_id = json["user"]["id"].as_str().unwrap().to_string();
    let token = json["token"].as_str().unwrap().to_string();

    let (_, json) = app
        .request(
            "POST",
            "/api/auth/login",
            None,
            Some(json!({ "email": "reader@school.com", "password": "password123" })),
        )
        .await;
    assert_eq!(json["progress"], serde_json::Value::Null);

    let exercise = app.add_exercise(ExerciseCategory::Syllable, 0, 1).await;
    app.submit(&token, &user_id, &exercise.id, 0, None).await;

    let (status, json) = app
        .request(
            "POST",
            "/api/auth/login",
            None,
            Some(json!({ "email": "READER@school.com", "password": "password123" })),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["user"]["id"], user_id.as_str());
    assert_eq!(json["progress"]["points"], 10);
    assert!(json["token"].is_string());
}

#[tokio::test]
async fn test_wrong_password_and_unknown_email_look_the_same() {
    let app = common::create_test_app();
    app.request(
        "POST",
        "/api/auth/register",
        None,
        Some(json!({ "email": "a@school.com", "password": "password123", "name": "A" })),
    )
    .await;

    let (wrong_status, wrong) = app
        .request(
            "POST",
            "/api/auth/login",
            None,
            Some(json!({ "email": "a@school.com", "password": "wrong-password" })),
        )
        .await;
    let (unknown_status, unknown) = app
        .request(
            "POST",
            "/api/auth/login",
            None,
            Some(json!({ "email": "nobody@school.com", "password": "password123" })),
        )
        .await;

    assert_eq!(wrong_status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong, unknown);
    assert_eq!(wrong["error"], "Invalid credentials");
}

#[tokio::test]
async fn test_login_locks_out_after_repeated_failures() {
    let app = common::create_test_app();
    app.request(
        "POST",
        "/api/auth/register",
        None,
        Some(json!({ "email": "locked@school.com", "password": "password123", "name": "L" })),
    )
    .await;

    let bad = json!({ "email": "locked@school.com", "password": "wrong-password" });
    for _ in 0..5 {
        let (status, _) = app
            .request("POST", "/api/auth/login", None, Some(bad.clone()))
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    // even the right password is refused while locked
    let (status, json) = app
        .request(
            "POST",
            "/api/auth/login",
            None,
            Some(json!({ "email": "locked@school.com", "password": "password123" })),
        )
        .await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert!(json["error"].is_string());
}

#[tokio::test]
async fn test_successful_login_clears_failure_count() {
    let app = common::create_test_app();
    app.request(
        "POST",
        "/api/auth/register",
        None,
        Some(json!({ "email": "retry@school.com", "password": "password123", "name": "R" })),
    )
    .await;

    let bad = json!({ "email": "retry@school.com", "password": "wrong-password" });
    let good = json!({ "email": "retry@school.com", "password": "password123" });

    for _ in 0..4 {
        app.request("POST", "/api/auth/login", None, Some(bad.clone()))
            .await;
    }
    let (status, _) = app
        .request("POST", "/api/auth/login", None, Some(good.clone()))
        .await;
    assert_eq!(status, StatusCode::OK);

    for _ in 0..4 {
        app.request("POST", "/api/auth/login", None, Some(bad.clone()))
            .await;
    }
    let (status, _) = app
        .request("POST", "/api/auth/login", None, Some(good))
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_invalid_token_is_unauthorized() {
    let app = common::create_test_app();

    let (status, json) = app
        .request("GET", "/api/users/anyone", Some("not-a-jwt"), None)
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(json["error"].is_string());
}
