use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use base64::Engine;
use serde_json::{json, Value};
use tower::ServiceExt;

use super::common::{
    build_service, read_json_body, router_with_service, ADMIN_TOKEN, ANA_TOKEN, BO_TOKEN,
    CATCH_UP_WEEK,
};
use crate::onboarding::domain::TraineeId;
use crate::onboarding::generation::GenerationError;
use crate::onboarding::repository::RepositoryError;
use crate::onboarding::router::status_for;
use crate::onboarding::service::MindsetError;

fn request(method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("request"),
        None => builder.body(Body::empty()).expect("request"),
    }
}

fn router() -> Router {
    let (service, _, _, _) = build_service();
    router_with_service(service)
}

#[tokio::test]
async fn requests_without_a_valid_token_are_unauthorized() {
    let app = router();

    let missing = app
        .clone()
        .oneshot(request(Method::GET, "/api/v1/leaderboard", None, None))
        .await
        .expect("router response");
    assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);

    let unknown = app
        .oneshot(request(Method::GET, "/api/v1/leaderboard", Some("forged"), None))
        .await
        .expect("router response");
    assert_eq!(unknown.status(), StatusCode::UNAUTHORIZED);
    let payload = read_json_body(unknown).await;
    assert!(payload["error"].is_string());
}

#[tokio::test]
async fn leaderboard_ranks_by_progress_within_department() {
    let app = router();

    let response = app
        .oneshot(request(
            Method::GET,
            "/api/v1/leaderboard?department=Engineering",
            Some(ANA_TOKEN),
            None,
        ))
        .await
        .expect("router response");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    let entries = payload.as_array().expect("entries");
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["name"], "Cy");
    assert_eq!(entries[0]["rankLabel"], "Gold");
    assert_eq!(entries[1]["traineeId"], "t1");
    assert_eq!(entries[1]["status"], "At Risk");
}

#[tokio::test]
async fn trainee_list_is_admin_only_and_sortable() {
    let app = router();

    let forbidden = app
        .clone()
        .oneshot(request(Method::GET, "/api/v1/trainees", Some(ANA_TOKEN), None))
        .await
        .expect("router response");
    assert_eq!(forbidden.status(), StatusCode::FORBIDDEN);

    let response = app
        .oneshot(request(
            Method::GET,
            "/api/v1/trainees?sort=name&direction=desc",
            Some(ADMIN_TOKEN),
            None,
        ))
        .await
        .expect("router response");
    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    let names: Vec<&str> = payload
        .as_array()
        .expect("rows")
        .iter()
        .filter_map(|row| row["name"].as_str())
        .collect();
    assert_eq!(names, vec!["Cy", "Bo", "Ana"]);
}

#[tokio::test]
async fn dashboard_of_another_trainee_is_forbidden() {
    let app = router();

    let response = app
        .oneshot(request(Method::GET, "/api/v1/trainees/t1", Some(BO_TOKEN), None))
        .await
        .expect("router response");

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn out_of_range_plan_edit_is_unprocessable() {
    let app = router();

    let response = app
        .oneshot(request(
            Method::POST,
            "/api/v1/trainees/t1/plan/edits",
            Some(ADMIN_TOKEN),
            Some(json!({ "op": "remove_task", "week_index": 0, "task_index": 5 })),
        ))
        .await
        .expect("router response");

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn plan_edit_returns_updated_plan() {
    let app = router();

    let response = app
        .oneshot(request(
            Method::POST,
            "/api/v1/trainees/t1/plan/edits",
            Some(ADMIN_TOKEN),
            Some(json!({
                "op": "set_week_field",
                "week_index": 1,
                "change": { "field": "topic", "value": "Services" }
            })),
        ))
        .await
        .expect("router response");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload[1]["topic"], "Services");
}

#[tokio::test]
async fn quiz_attempt_reports_score_and_progress() {
    let app = router();

    let response = app
        .oneshot(request(
            Method::POST,
            "/api/v1/trainees/t1/quizzes/quiz-git/attempts",
            Some(ANA_TOKEN),
            Some(json!({ "answers": ["git commit", "git push"] })),
        ))
        .await
        .expect("router response");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["scorePct"], 100);
    assert_eq!(payload["progress"], 45);
}

#[tokio::test]
async fn base64_submission_is_stored_and_typed_from_name() {
    let (service, _, _, storage) = build_service();
    let app = router_with_service(service);
    let content = base64::engine::general_purpose::STANDARD.encode(b"fn main() {}");

    let response = app
        .oneshot(request(
            Method::POST,
            "/api/v1/trainees/t1/submissions",
            Some(ANA_TOKEN),
            Some(json!({
                "assignmentTitle": "Hello world",
                "fileName": "main.rs",
                "contentBase64": content,
            })),
        ))
        .await
        .expect("router response");

    assert_eq!(response.status(), StatusCode::CREATED);
    let payload = read_json_body(response).await;
    assert_eq!(payload["assignmentTitle"], "Hello world");
    let id = payload["id"].as_str().expect("submission id");
    let (content_type, bytes) = storage
        .stored(&format!("submissions/t1/{id}/main.rs"))
        .expect("file stored");
    assert_eq!(bytes, b"fn main() {}".to_vec());
    assert_eq!(content_type, mime_guess::from_path("main.rs").first_or_octet_stream().to_string());
}

#[tokio::test]
async fn invalid_base64_is_unprocessable() {
    let app = router();

    let response = app
        .oneshot(request(
            Method::POST,
            "/api/v1/trainees/t1/submissions",
            Some(ANA_TOKEN),
            Some(json!({
                "assignmentTitle": "Hello world",
                "fileName": "main.rs",
                "contentBase64": "***",
            })),
        ))
        .await
        .expect("router response");

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn catch_up_runs_through_generator() {
    let (service, _, generator, _) = build_service();
    generator.push(CATCH_UP_WEEK);
    let app = router_with_service(service);

    let response = app
        .oneshot(request(
            Method::POST,
            "/api/v1/trainees/t1/plan/catch-up",
            Some(ADMIN_TOKEN),
            None,
        ))
        .await
        .expect("router response");

    assert_eq!(response.status(), StatusCode::CREATED);
    let payload = read_json_body(response).await;
    assert_eq!(payload.as_array().map(Vec::len), Some(3));
}

#[tokio::test]
async fn disabled_generator_is_a_bad_gateway() {
    let app = router();

    let response = app
        .oneshot(request(
            Method::POST,
            "/api/v1/trainees/t1/chat",
            Some(ANA_TOKEN),
            Some(json!({ "text": "hi" })),
        ))
        .await
        .expect("router response");

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn daily_quiz_is_not_found_until_selected() {
    let app = router();

    let before = app
        .clone()
        .oneshot(request(Method::GET, "/api/v1/daily-quiz", Some(ANA_TOKEN), None))
        .await
        .expect("router response");
    assert_eq!(before.status(), StatusCode::NOT_FOUND);

    let set = app
        .clone()
        .oneshot(request(
            Method::PUT,
            "/api/v1/daily-quiz",
            Some(ADMIN_TOKEN),
            Some(json!({ "quizId": "quiz-git" })),
        ))
        .await
        .expect("router response");
    assert_eq!(set.status(), StatusCode::OK);

    let after = app
        .oneshot(request(Method::GET, "/api/v1/daily-quiz", Some(ANA_TOKEN), None))
        .await
        .expect("router response");
    assert_eq!(after.status(), StatusCode::OK);
    let payload = read_json_body(after).await;
    assert_eq!(payload["id"], "quiz-git");
}

#[tokio::test]
async fn messages_are_posted_and_listed() {
    let app = router();

    let sent = app
        .clone()
        .oneshot(request(
            Method::POST,
            "/api/v1/trainees/t1/messages",
            Some(ADMIN_TOKEN),
            Some(json!({ "text": "Stand-up at ten" })),
        ))
        .await
        .expect("router response");
    assert_eq!(sent.status(), StatusCode::CREATED);

    let listed = app
        .oneshot(request(
            Method::GET,
            "/api/v1/trainees/t1/messages",
            Some(ANA_TOKEN),
            None,
        ))
        .await
        .expect("router response");
    let payload = read_json_body(listed).await;
    assert_eq!(payload[0]["sender"], "admin");
    assert_eq!(payload[0]["text"], "Stand-up at ten");
}

#[test]
fn error_statuses_follow_error_kind() {
    let cases = [
        (MindsetError::invalid("bad"), StatusCode::UNPROCESSABLE_ENTITY),
        (
            MindsetError::not_found("trainee", TraineeId::from("t9")),
            StatusCode::NOT_FOUND,
        ),
        (
            MindsetError::Persistence(RepositoryError::NotFound),
            StatusCode::NOT_FOUND,
        ),
        (MindsetError::Forbidden("no".to_string()), StatusCode::FORBIDDEN),
        (MindsetError::Conflict("twice".to_string()), StatusCode::CONFLICT),
        (
            MindsetError::Generation(GenerationError::Disabled),
            StatusCode::BAD_GATEWAY,
        ),
        (
            MindsetError::Persistence(RepositoryError::Unavailable("down".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR,
        ),
    ];

    for (err, expected) in cases {
        assert_eq!(status_for(&err), expected, "{err}");
    }
}
