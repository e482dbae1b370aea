mod common;

use axum::http::StatusCode;
use serde_json::json;

use phonics_api::models::ExerciseCategory;

#[tokio::test]
async fn test_get_own_profile_with_progress_attempts_and_badges() {
    let app = common::create_test_app();
    let (user_id, token) = app.register("student").await;
    let exercise = app.add_exercise(ExerciseCategory::Suffix, 1, 1).await;
    app.submit(&token, &user_id, &exercise.id, 1, None).await;
    app.submit(&token, &user_id, &exercise.id, 0, None).await;

    let (status, json) = app
        .request("GET", &format!("/api/users/{}", user_id), Some(&token), None)
        .await;

    assert_eq!(status, StatusCode::OK, "{}", json);
    assert_eq!(json["id"], user_id.as_str());
    assert!(json.get("passwordHash").is_none());
    assert_eq!(json["progress"]["exercisesCompleted"], 2);

    let attempts = json["attempts"].as_array().unwrap();
    assert_eq!(attempts.len(), 2);
    assert_eq!(attempts[0]["isCorrect"], false);
    assert_eq!(attempts[1]["isCorrect"], true);

    let badges = json["badges"].as_array().unwrap();
    assert_eq!(badges.len(), 1);
    assert_eq!(badges[0]["id"], "first-steps");
    assert_eq!(badges[0]["name"], "First Steps");
    assert!(badges[0]["awardedAt"].is_string());
}

#[tokio::test]
async fn test_profile_lists_ten_most_recent_attempts() {
    let app = common::create_test_app();
    let (user_id, token) = app.register("student").await;
    let exercise = app.add_exercise(ExerciseCategory::Syllable, 0, 1).await;
    for _ in 0..12 {
        app.submit(&token, &user_id, &exercise.id, 0, None).await;
    }

    let (_, json) = app
        .request("GET", &format!("/api/users/{}", user_id), Some(&token), None)
        .await;

    assert_eq!(json["attempts"].as_array().unwrap().len(), 10);
    assert_eq!(json["progress"]["exercisesCompleted"], 12);
}

#[tokio::test]
async fn test_teacher_can_view_student_but_student_cannot_view_peer() {
    let app = common::create_test_app();
    let (student_id, student_token) = app.register("student").await;
    let (peer_id, _) = app.register("student").await;
    let (_, teacher_token) = app.register("teacher").await;
    let (_, parent_token) = app.register("parent").await;

    let (status, _) = app
        .request(
            "GET",
            &format!("/api/users/{}", peer_id),
            Some(&student_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    for token in [&teacher_token, &parent_token] {
        let (status, json) = app
            .request(
                "GET",
                &format!("/api/users/{}", student_id),
                Some(token),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["progress"], serde_json::Value::Null);
        assert_eq!(json["attempts"], json!([]));
    }
}

#[tokio::test]
async fn test_unknown_user_is_not_found() {
    let app = common::create_test_app();
    let (_, teacher_token) = app.register("teacher").await;

    let (status, json) = app
        .request("GET", "/api/users/missing", Some(&teacher_token), None)
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"], "User not found");
}

#[tokio::test]
async fn test_update_profile_fields() {
    let app = common::create_test_app();
    let (user_id, token) = app.register("student").await;

    let (status, json) = app
        .request(
            "PUT",
            &format!("/api/users/{}", user_id),
            Some(&token),
            Some(json!({ "name": "Renamed", "grade": 4, "email": "renamed@school.com" })),
        )
        .await;

    assert_eq!(status, StatusCode::OK, "{}", json);
    assert_eq!(json["name"], "Renamed");
    assert_eq!(json["grade"], 4);
    assert_eq!(json["email"], "renamed@school.com");
    assert_ne!(json["updatedAt"], json["createdAt"]);
}

#[tokio::test]
async fn test_blank_name_is_rejected_and_name_is_trimmed() {
    let app = common::create_test_app();
    let (user_id, token) = app.register("student").await;
    let uri = format!("/api/users/{}", user_id);

    let (status, _) = app
        .request("PUT", &uri, Some(&token), Some(json!({ "name": "   " })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, json) = app
        .request("PUT", &uri, Some(&token), Some(json!({ "name": "  Sam Lee  " })))
        .await;
    assert_eq!(status, StatusCode::OK, "{}", json);
    assert_eq!(json["name"], "Sam Lee");

    let stored = app.store().find_user(&user_id).await.unwrap().unwrap();
    assert_eq!(stored.name, "Sam Lee");
}

#[tokio::test]
async fn test_update_password_allows_login_with_new_password() {
    let app = common::create_test_app();
    let (user_id, token) = app.register("student").await;

    app.request(
        "PUT",
        &format!("/api/users/{}", user_id),
        Some(&token),
        Some(json!({ "email": "newpass@school.com", "password": "brand-new-pass" })),
    )
    .await;

    let (old, _) = app
        .request(
            "POST",
            "/api/auth/login",
            None,
            Some(json!({ "email": "newpass@school.com", "password": "password123" })),
        )
        .await;
    let (new, _) = app
        .request(
            "POST",
            "/api/auth/login",
            None,
            Some(json!({ "email": "newpass@school.com", "password": "brand-new-pass" })),
        )
        .await;

    assert_eq!(old, StatusCode::UNAUTHORIZED);
    assert_eq!(new, StatusCode::OK);
}

#[tokio::test]
async fn test_update_to_taken_email_is_rejected() {
    let app = common::create_test_app();
    let (user_id, token) = app.register("student").await;
    app.request(
        "POST",
        "/api/auth/register",
        None,
        Some(json!({ "email": "taken@school.com", "password": "password123", "name": "T" })),
    )
    .await;

    let (status, json) = app
        .request(
            "PUT",
            &format!("/api/users/{}", user_id),
            Some(&token),
            Some(json!({ "email": "taken@school.com" })),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "User with this email already exists");
}

#[tokio::test]
async fn test_cannot_update_or_delete_someone_else() {
    let app = common::create_test_app();
    let (student_id, _) = app.register("student").await;
    let (_, teacher_token) = app.register("teacher").await;

    let (put_status, _) = app
        .request(
            "PUT",
            &format!("/api/users/{}", student_id),
            Some(&teacher_token),
            Some(json!({ "name": "Hijacked" })),
        )
        .await;
    let (delete_status, _) = app
        .request(
            "DELETE",
            &format!("/api/users/{}", student_id),
            Some(&teacher_token),
            None,
        )
        .await;

    assert_eq!(put_status, StatusCode::FORBIDDEN);
    assert_eq!(delete_status, StatusCode::FORBIDDEN);
    assert!(app.store().find_user(&student_id).await.unwrap().is_some());
}

#[tokio::test]
async fn test_delete_removes_progress_and_attempts() {
    let app = common::create_test_app();
    let (user_id, token) = app.register("student").await;
    let exercise = app.add_exercise(ExerciseCategory::Blend, 0, 1).await;
    app.submit(&token, &user_id, &exercise.id, 0, None).await;

    let (status, json) = app
        .request(
            "DELETE",
            &format!("/api/users/{}", user_id),
            Some(&token),
            None,
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["message"], "User deleted successfully");

    let store = app.store();
    assert!(store.find_user(&user_id).await.unwrap().is_none());
    assert!(store.load_progress(&user_id).await.unwrap().is_none());
    assert!(store.recent_attempts(&user_id, 10).await.unwrap().is_empty());
    assert!(store.badge_awards(&user_id).await.unwrap().is_empty());

    let (status, _) = app
        .request(
            "DELETE",
            &format!("/api/users/{}", user_id),
            Some(&token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
