use super::common::*;
use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{header, Request, StatusCode};
use serde_json::json;
use tower::ServiceExt;

use crate::workflows::recruitment::domain::{Actor, Role, UserId};
use crate::workflows::recruitment::router::{
    self, recruitment_router, AdvanceRequest, OptionalJson, ACTOR_ID_HEADER, ACTOR_NAME_HEADER,
    ACTOR_ROLE_HEADER,
};
use crate::workflows::recruitment::AUTO_REJECTION_REASON;

fn post_json(uri: &str, actor: &Actor, body: serde_json::Value) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .header(ACTOR_ID_HEADER, actor.id.0.to_string())
        .header(ACTOR_ROLE_HEADER, actor.role.label())
        .header(ACTOR_NAME_HEADER, actor.display_name.as_str())
        .body(Body::from(serde_json::to_vec(&body).expect("serializable")))
        .expect("request builds")
}

fn get_as(uri: &str, actor: &Actor) -> Request<Body> {
    Request::get(uri)
        .header(ACTOR_ID_HEADER, actor.id.0.to_string())
        .header(ACTOR_ROLE_HEADER, actor.role.label())
        .body(Body::empty())
        .expect("request builds")
}

#[tokio::test]
async fn next_stage_route_reports_counts() {
    let fx = fixture();
    let position = fx.open_position(None);
    let a1 = fx.apply(1, position);
    let a2 = fx.apply(2, position);
    fx.service.approve(&hr(), a1).expect("approve");

    let response = recruitment_router(fx.service.clone())
        .oneshot(post_json(
            &format!("/api/v1/positions/{position}/next_stage"),
            &hr(),
            json!({ "global_comment": "Welcome to pre-selection" }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["approved_count"], 1);
    assert_eq!(payload["rejected_count"], 1);
    assert_eq!(payload["next_stage"]["name"], "PreSelection");
    assert!(payload["message"].as_str().is_some());
    assert_eq!(fx.stored(a2).rejection_reason(), AUTO_REJECTION_REASON);
}

#[tokio::test]
async fn next_stage_without_body_is_accepted() {
    let fx = fixture();
    let position = fx.open_position(None);

    let request = Request::post(format!("/api/v1/positions/{position}/next_stage"))
        .header(ACTOR_ID_HEADER, "1")
        .header(ACTOR_ROLE_HEADER, "hr")
        .body(Body::empty())
        .expect("request builds");
    let response = recruitment_router(fx.service.clone())
        .oneshot(request)
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["approved_count"], 0);
    assert_eq!(payload["rejected_count"], 0);
}

#[tokio::test]
async fn next_stage_at_last_stage_is_bad_request() {
    let fx = fixture();
    let position = fx.open_position(Some(INTERVIEW));

    let response = router::next_stage_handler(
        State(fx.service.clone()),
        hr(),
        Path(position.0),
        OptionalJson(AdvanceRequest::default()),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let payload = read_json_body(response).await;
    assert_eq!(payload["error"], "no next stage available");
}

#[tokio::test]
async fn apply_route_creates_then_rejects_duplicates() {
    let fx = fixture();
    let position = fx.open_position(None);
    let router = recruitment_router(fx.service.clone());

    let created = router
        .clone()
        .oneshot(post_json(
            "/api/v1/applications/apply",
            &candidate_user(1),
            json!({ "position": position.0 }),
        ))
        .await
        .expect("route executes");
    assert_eq!(created.status(), StatusCode::CREATED);
    let payload = read_json_body(created).await;
    assert_eq!(payload["status"], "pending");
    assert_eq!(payload["current_stage_name"], "Reception");

    let duplicate = router
        .oneshot(post_json(
            "/api/v1/applications/apply",
            &candidate_user(1),
            json!({ "position": position.0 }),
        ))
        .await
        .expect("route executes");
    assert_eq!(duplicate.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn transition_routes_map_invalid_transitions_to_bad_request() {
    let fx = fixture();
    let position = fx.open_position(None);
    let app = fx.apply(1, position);
    let router = recruitment_router(fx.service.clone());

    let reactivate = router
        .clone()
        .oneshot(post_json(
            &format!("/api/v1/applications/{app}/reactivate"),
            &hr(),
            json!({}),
        ))
        .await
        .expect("route executes");
    assert_eq!(reactivate.status(), StatusCode::BAD_REQUEST);

    let reject = router
        .clone()
        .oneshot(post_json(
            &format!("/api/v1/applications/{app}/reject"),
            &hr(),
            json!({ "rejection_reason": "Profile mismatch" }),
        ))
        .await
        .expect("route executes");
    assert_eq!(reject.status(), StatusCode::OK);
    let payload = read_json_body(reject).await;
    assert_eq!(payload["status"], "rejected");
    assert_eq!(payload["rejection_reason"], "Profile mismatch");

    let approve = router
        .clone()
        .oneshot(post_json(
            &format!("/api/v1/applications/{app}/approve"),
            &hr(),
            json!({}),
        ))
        .await
        .expect("route executes");
    assert_eq!(approve.status(), StatusCode::BAD_REQUEST);
    let payload = read_json_body(approve).await;
    assert_eq!(payload["error"], "cannot approve a rejected application");

    let reactivated = router
        .oneshot(post_json(
            &format!("/api/v1/applications/{app}/reactivate"),
            &hr(),
            json!({}),
        ))
        .await
        .expect("route executes");
    assert_eq!(reactivated.status(), StatusCode::OK);
}

#[tokio::test]
async fn missing_actor_headers_are_unauthorized() {
    let fx = fixture();
    let position = fx.open_position(None);

    let request = Request::post(format!("/api/v1/positions/{position}/next_stage"))
        .body(Body::empty())
        .expect("request builds");
    let response = recruitment_router(fx.service.clone())
        .oneshot(request)
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(fx.position(position).current_stage, Some(RECEPTION));
}

#[tokio::test]
async fn unknown_application_is_not_found() {
    let fx = fixture();
    let response = recruitment_router(fx.service.clone())
        .oneshot(get_as("/api/v1/applications/4242", &hr()))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn listing_routes_expose_stages_filters_and_statistics() {
    let fx = fixture();
    let position = fx.open_position(None);
    let a1 = fx.apply(1, position);
    fx.apply(2, position);
    fx.service.approve(&hr(), a1).expect("approve");
    let router = recruitment_router(fx.service.clone());
    let director = Actor {
        id: UserId(3),
        role: Role::Direction,
        display_name: "Direction".to_string(),
    };

    let stages = router
        .clone()
        .oneshot(get_as("/api/v1/recruitment-stages", &director))
        .await
        .expect("route executes");
    let payload = read_json_body(stages).await;
    assert_eq!(payload.as_array().map(Vec::len), Some(3));

    let approved = router
        .clone()
        .oneshot(get_as(
            &format!("/api/v1/positions/{position}/applications?status=approved"),
            &director,
        ))
        .await
        .expect("route executes");
    let payload = read_json_body(approved).await;
    assert_eq!(payload.as_array().map(Vec::len), Some(1));
    assert_eq!(payload[0]["id"], a1.0);

    let bogus = router
        .clone()
        .oneshot(get_as(
            &format!("/api/v1/positions/{position}/applications?status=archived"),
            &director,
        ))
        .await
        .expect("route executes");
    assert_eq!(bogus.status(), StatusCode::BAD_REQUEST);

    let stats = router
        .oneshot(get_as(
            &format!("/api/v1/positions/{position}/stage_statistics"),
            &director,
        ))
        .await
        .expect("route executes");
    let payload = read_json_body(stats).await;
    assert_eq!(payload["total_active"], 2);
    assert_eq!(payload["approved_current_stage"], 1);
    assert_eq!(payload["can_proceed_to_next"], true);
}

#[tokio::test]
async fn comment_routes_append_and_list() {
    let fx = fixture();
    let position = fx.open_position(None);
    let app = fx.apply(1, position);
    let router = recruitment_router(fx.service.clone());

    let created = router
        .clone()
        .oneshot(post_json(
            &format!("/api/v1/applications/{app}/comments"),
            &hr(),
            json!({ "content": "Requested teaching portfolio" }),
        ))
        .await
        .expect("route executes");
    assert_eq!(created.status(), StatusCode::CREATED);

    let listed = router
        .oneshot(get_as(&format!("/api/v1/applications/{app}/comments"), &hr()))
        .await
        .expect("route executes");
    let payload = read_json_body(listed).await;
    assert_eq!(payload[0]["content"], "Requested teaching portfolio");
    assert_eq!(payload[0]["author_name"], "Nadia Benali");
}

#[tokio::test]
async fn open_position_route_defaults_to_first_stage() {
    let fx = fixture();
    let response = recruitment_router(fx.service.clone())
        .oneshot(post_json(
            "/api/v1/positions",
            &hr(),
            json!({ "title": "Lecturer", "department": "History" }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::CREATED);
    let payload = read_json_body(response).await;
    assert_eq!(payload["current_stage"], RECEPTION.0);
    assert_eq!(payload["status"], "open");
}

#[tokio::test]
async fn malformed_advance_body_is_refused_without_moving_the_position() {
    let fx = fixture();
    let position = fx.open_position(None);
    let a1 = fx.apply(1, position);
    let a2 = fx.apply(2, position);
    fx.service.approve(&hr(), a1).expect("approve");
    let comments_before = fx.comment_count();

    let response = recruitment_router(fx.service.clone())
        .oneshot(post_json(
            &format!("/api/v1/positions/{position}/next_stage"),
            &hr(),
            json!({ "global_comment": 42 }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let payload = read_json_body(response).await;
    assert!(payload["error"].as_str().is_some());
    assert_eq!(fx.position(position).current_stage, Some(RECEPTION));
    assert!(fx.stored(a1).is_approved_current_stage());
    assert!(fx.stored(a2).is_active());
    assert_eq!(fx.comment_count(), comments_before);
}

#[tokio::test]
async fn advance_body_that_is_not_json_is_refused() {
    let fx = fixture();
    let position = fx.open_position(None);

    let request = Request::post(format!("/api/v1/positions/{position}/next_stage"))
        .header(header::CONTENT_TYPE, "text/plain")
        .header(ACTOR_ID_HEADER, "1")
        .header(ACTOR_ROLE_HEADER, "hr")
        .body(Body::from("move everyone along"))
        .expect("request builds");
    let response = recruitment_router(fx.service.clone())
        .oneshot(request)
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(fx.position(position).current_stage, Some(RECEPTION));
}

#[tokio::test]
async fn malformed_reject_body_leaves_the_application_active() {
    let fx = fixture();
    let position = fx.open_position(None);
    let app = fx.apply(1, position);

    let response = recruitment_router(fx.service.clone())
        .oneshot(post_json(
            &format!("/api/v1/applications/{app}/reject"),
            &hr(),
            json!({ "rejection_reason": ["not", "a", "string"] }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let stored = fx.stored(app);
    assert!(stored.is_active());
    assert_eq!(stored.rejection_reason(), "");
    assert!(fx.comments(app).is_empty());
}
