use axum::http::{Method, StatusCode};
use serde_json::json;
use tower::ServiceExt;
use uuid::Uuid;

use crate::core::time::primitive_now_utc;
use crate::repositories;
use crate::test_support;

#[tokio::test]
async fn admin_creates_exam_with_classrooms() {
    let Some(ctx) = test_support::setup_test_context().await else { return };

    let admin = test_support::insert_admin(ctx.state.db(), "admin01").await;
    let room_a = test_support::insert_classroom(ctx.state.db(), "A-101").await;
    let room_b = test_support::insert_classroom(ctx.state.db(), "A-102").await;
    let token = test_support::bearer_token(&admin, ctx.state.settings());

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/exams",
            Some(&token),
            Some(json!({
                "title": "Discrete Mathematics",
                "exam_date": "2030-01-15",
                "start_time": "09:00",
                "end_time": "11:30",
                "classrooms": [
                    { "classroom_id": room_a.id, "required_invigilators": 2 },
                    { "classroom_id": room_b.id, "notes": "Bring spare paper" }
                ]
            })),
        ))
        .await
        .expect("create exam");
    let status = response.status();
    let body = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::CREATED, "response: {body}");
    assert_eq!(body["duration_minutes"], 150);
    assert_eq!(body["status"], "scheduled");
    assert_eq!(body["start_time"], "09:00");
    assert_eq!(body["created_by_name"], admin.full_name);
    assert_eq!(body["classrooms"].as_array().map(Vec::len), Some(2));

    let exam_id = body["id"].as_str().expect("exam id").to_string();
    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::GET,
            "/api/exams?date=2030-01-15",
            Some(&token),
            None,
        ))
        .await
        .expect("list exams");
    let body = test_support::read_json(response).await;
    assert_eq!(body["total_count"], 1);
    assert_eq!(body["items"][0]["id"], exam_id);
    assert_eq!(body["items"][0]["classroom_count"], 2);
}

#[tokio::test]
async fn exam_with_inverted_window_is_rejected() {
    let Some(ctx) = test_support::setup_test_context().await else { return };

    let admin = test_support::insert_admin(ctx.state.db(), "admin01").await;
    let token = test_support::bearer_token(&admin, ctx.state.settings());

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/exams",
            Some(&token),
            Some(json!({
                "title": "Backwards",
                "exam_date": "2030-01-15",
                "start_time": "12:00",
                "end_time": "09:00"
            })),
        ))
        .await
        .expect("create exam");
    let status = response.status();
    let body = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "end_time must be after start_time");
}

#[tokio::test]
async fn unknown_classroom_rolls_back_exam() {
    let Some(ctx) = test_support::setup_test_context().await else { return };

    let admin = test_support::insert_admin(ctx.state.db(), "admin01").await;
    let token = test_support::bearer_token(&admin, ctx.state.settings());

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/exams",
            Some(&token),
            Some(json!({
                "title": "Ghost Room",
                "exam_date": "2030-01-15",
                "start_time": "09:00",
                "end_time": "10:00",
                "classrooms": [{ "classroom_id": "missing-room" }]
            })),
        ))
        .await
        .expect("create exam");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let rows = repositories::exams::list(
        ctx.state.db(),
        repositories::exams::ListExamsParams {
            status: None,
            exam_date: None,
            search: None,
            sort: Default::default(),
            order: Default::default(),
            offset: 0,
            limit: 10,
        },
    )
    .await
    .expect("list exams");
    assert!(rows.is_empty());
}

#[tokio::test]
async fn invigilator_cannot_create_exam() {
    let Some(ctx) = test_support::setup_test_context().await else { return };

    let invigilator = test_support::insert_invigilator(ctx.state.db(), "inv01").await;
    let token = test_support::bearer_token(&invigilator, ctx.state.settings());

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/exams",
            Some(&token),
            Some(json!({
                "title": "Nope",
                "exam_date": "2030-01-15",
                "start_time": "09:00",
                "end_time": "10:00"
            })),
        ))
        .await
        .expect("create exam");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn update_replaces_links_and_recomputes_duration() {
    let Some(ctx) = test_support::setup_test_context().await else { return };

    let admin = test_support::insert_admin(ctx.state.db(), "admin01").await;
    let exam = test_support::insert_exam(ctx.state.db(), "Physics", &admin.id, 3).await;
    let room_a = test_support::insert_classroom(ctx.state.db(), "B-201").await;
    let room_b = test_support::insert_classroom(ctx.state.db(), "B-202").await;
    repositories::exam_classrooms::insert(
        ctx.state.db(),
        &exam.id,
        repositories::exam_classrooms::LinkClassroom {
            classroom_id: &room_a.id,
            required_invigilators: 1,
            notes: None,
        },
        primitive_now_utc(),
    )
    .await
    .expect("link classroom");
    let token = test_support::bearer_token(&admin, ctx.state.settings());

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::PATCH,
            &format!("/api/exams/{}", exam.id),
            Some(&token),
            Some(json!({
                "end_time": "10:00",
                "classrooms": [{ "classroom_id": room_b.id, "required_invigilators": 3 }]
            })),
        ))
        .await
        .expect("update exam");
    let status = response.status();
    let body = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::OK, "response: {body}");
    assert_eq!(body["duration_minutes"], 60);
    assert_eq!(body["classrooms"].as_array().map(Vec::len), Some(1));
    assert_eq!(body["classrooms"][0]["classroom_id"], room_b.id);
    assert_eq!(body["classrooms"][0]["required_invigilators"], 3);
}

#[tokio::test]
async fn status_endpoint_sets_exam_status() {
    let Some(ctx) = test_support::setup_test_context().await else { return };

    let admin = test_support::insert_admin(ctx.state.db(), "admin01").await;
    let exam = test_support::insert_exam(ctx.state.db(), "Chemistry", &admin.id, 1).await;
    let token = test_support::bearer_token(&admin, ctx.state.settings());

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::PATCH,
            &format!("/api/exams/{}/status", exam.id),
            Some(&token),
            Some(json!({ "status": "cancelled" })),
        ))
        .await
        .expect("update status");
    let status = response.status();
    let body = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::OK, "response: {body}");
    assert_eq!(body["status"], "cancelled");
}

#[tokio::test]
async fn exam_with_assignments_cannot_be_deleted() {
    let Some(ctx) = test_support::setup_test_context().await else { return };

    let admin = test_support::insert_admin(ctx.state.db(), "admin01").await;
    let invigilator = test_support::insert_invigilator(ctx.state.db(), "inv01").await;
    let exam = test_support::insert_exam(ctx.state.db(), "Biology", &admin.id, 2).await;
    let room = test_support::insert_classroom(ctx.state.db(), "C-301").await;
    repositories::assignments::insert(
        ctx.state.db(),
        repositories::assignments::CreateAssignment {
            id: &Uuid::new_v4().to_string(),
            invigilator_id: &invigilator.id,
            exam_id: &exam.id,
            classroom_id: &room.id,
            assigned_by: &admin.id,
            notes: None,
            now: primitive_now_utc(),
        },
    )
    .await
    .expect("insert assignment");
    let token = test_support::bearer_token(&admin, ctx.state.settings());

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::DELETE,
            &format!("/api/exams/{}", exam.id),
            Some(&token),
            None,
        ))
        .await
        .expect("delete exam");
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let empty = test_support::insert_exam(ctx.state.db(), "Empty", &admin.id, 2).await;
    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::DELETE,
            &format!("/api/exams/{}", empty.id),
            Some(&token),
            None,
        ))
        .await
        .expect("delete exam");
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::GET,
            &format!("/api/exams/{}", empty.id),
            Some(&token),
            None,
        ))
        .await
        .expect("get exam");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
