use axum::http::{Method, StatusCode};
use serde_json::json;
use tower::ServiceExt;

use crate::db::types::{UserRole, UserStatus};
use crate::repositories;
use crate::test_support;

#[tokio::test]
async fn admin_lists_users_with_filters() {
    let Some(ctx) = test_support::setup_test_context().await else { return };

    let admin = test_support::insert_admin(ctx.state.db(), "admin01").await;
    test_support::insert_invigilator(ctx.state.db(), "inv01").await;
    test_support::insert_user(ctx.state.db(), "inv02", UserRole::Invigilator, UserStatus::Pending)
        .await;
    let token = test_support::bearer_token(&admin, ctx.state.settings());

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::GET,
            "/api/users?role=invigilator&status=pending",
            Some(&token),
            None,
        ))
        .await
        .expect("list users");
    let status = response.status();
    let body = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::OK, "response: {body}");
    assert_eq!(body["total_count"], 1);
    assert_eq!(body["items"][0]["username"], "inv02");
    assert_eq!(body["page"], 1);
    assert_eq!(body["limit"], 10);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::GET,
            "/api/users?search=INV0&limit=1",
            Some(&token),
            None,
        ))
        .await
        .expect("search users");
    let body = test_support::read_json(response).await;
    assert_eq!(body["total_count"], 2);
    assert_eq!(body["total_pages"], 2);
    assert_eq!(body["items"].as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn invigilator_cannot_list_users() {
    let Some(ctx) = test_support::setup_test_context().await else { return };

    let invigilator = test_support::insert_invigilator(ctx.state.db(), "inv01").await;
    let token = test_support::bearer_token(&invigilator, ctx.state.settings());

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(Method::GET, "/api/users", Some(&token), None))
        .await
        .expect("list users");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn approving_user_sends_status_notification() {
    let Some(ctx) = test_support::setup_test_context().await else { return };

    let admin = test_support::insert_admin(ctx.state.db(), "admin01").await;
    let pending =
        test_support::insert_user(ctx.state.db(), "inv01", UserRole::Invigilator, UserStatus::Pending)
            .await;
    let token = test_support::bearer_token(&admin, ctx.state.settings());

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::PATCH,
            &format!("/api/users/{}/status", pending.id),
            Some(&token),
            Some(json!({ "status": "approved" })),
        ))
        .await
        .expect("approve user");
    let status = response.status();
    let body = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::OK, "response: {body}");
    assert_eq!(body["status"], "approved");

    let notifications = repositories::notifications::list_by_related(ctx.state.db(), &pending.id)
        .await
        .expect("notifications");
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].user_id, pending.id);
    assert_eq!(notifications[0].title, "Account Status Updated");

    let logs = repositories::audit_logs::list_for_resource(ctx.state.db(), "user", &pending.id)
        .await
        .expect("audit logs");
    assert!(logs.iter().any(|log| log.action == "update_user_status"));
}

#[tokio::test]
async fn pending_user_token_is_refused() {
    let Some(ctx) = test_support::setup_test_context().await else { return };

    let pending =
        test_support::insert_user(ctx.state.db(), "inv01", UserRole::Invigilator, UserStatus::Pending)
            .await;
    let token = test_support::bearer_token(&pending, ctx.state.settings());

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::PATCH,
            "/api/users/me",
            Some(&token),
            Some(json!({ "department": "Physics" })),
        ))
        .await
        .expect("update me");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn admin_updates_capacity_fields() {
    let Some(ctx) = test_support::setup_test_context().await else { return };

    let admin = test_support::insert_admin(ctx.state.db(), "admin01").await;
    let invigilator = test_support::insert_invigilator(ctx.state.db(), "inv01").await;
    let token = test_support::bearer_token(&admin, ctx.state.settings());

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::PATCH,
            &format!("/api/users/{}", invigilator.id),
            Some(&token),
            Some(json!({ "max_duties_per_day": 3, "max_duties_per_week": 10, "designation": "Lecturer" })),
        ))
        .await
        .expect("update user");
    let status = response.status();
    let body = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::OK, "response: {body}");
    assert_eq!(body["max_duties_per_day"], 3);
    assert_eq!(body["max_duties_per_week"], 10);
    assert_eq!(body["designation"], "Lecturer");
    assert_eq!(body["department"], "Mathematics");

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::PATCH,
            &format!("/api/users/{}", invigilator.id),
            Some(&token),
            Some(json!({ "max_duties_per_day": 99 })),
        ))
        .await
        .expect("invalid update");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn profile_update_rejects_taken_email() {
    let Some(ctx) = test_support::setup_test_context().await else { return };

    let admin = test_support::insert_admin(ctx.state.db(), "admin01").await;
    let invigilator = test_support::insert_invigilator(ctx.state.db(), "inv01").await;
    let token = test_support::bearer_token(&invigilator, ctx.state.settings());

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::PATCH,
            "/api/users/me",
            Some(&token),
            Some(json!({ "email": admin.email })),
        ))
        .await
        .expect("update me");
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::PATCH,
            "/api/users/me",
            Some(&token),
            Some(json!({ "full_name": "Renamed Person" })),
        ))
        .await
        .expect("update me");
    let body = test_support::read_json(response).await;
    assert_eq!(body["full_name"], "Renamed Person");
    assert_eq!(body["email"], invigilator.email);
}

#[tokio::test]
async fn unknown_user_is_not_found() {
    let Some(ctx) = test_support::setup_test_context().await else { return };

    let admin = test_support::insert_admin(ctx.state.db(), "admin01").await;
    let token = test_support::bearer_token(&admin, ctx.state.settings());

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::GET,
            "/api/users/does-not-exist",
            Some(&token),
            None,
        ))
        .await
        .expect("get user");
    let status = response.status();
    let body = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "User not found");
}
