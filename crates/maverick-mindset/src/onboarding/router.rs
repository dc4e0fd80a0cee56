use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::error;

use super::auth::{AuthError, IdentityProvider, Principal};
use super::domain::{ChallengeId, QuizId, SubmissionId, TraineeId, TraineeStatus};
use super::generation::{GenerationError, TextGenerator};
use super::leaderboard::{SortDirection, TableSort, TraineeColumn, TraineeFilter};
use super::mutation::PlanEdit;
use super::plan::{Plan, TaskKey};
use super::repository::{FileStorage, OnboardingRepository, RepositoryError};
use super::service::{AssignmentUpload, MindsetError, OnboardingService, TaskCompletion};

/// Shared handler state: the service plus the token resolver.
pub struct RouterState<R, G, F> {
    service: Arc<OnboardingService<R, G, F>>,
    identity: Arc<dyn IdentityProvider>,
}

impl<R, G, F> Clone for RouterState<R, G, F> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
            identity: Arc::clone(&self.identity),
        }
    }
}

/// Router builder exposing the trainee, plan, catalog and messaging endpoints.
pub fn onboarding_router<R, G, F>(
    service: Arc<OnboardingService<R, G, F>>,
    identity: Arc<dyn IdentityProvider>,
) -> Router
where
    R: OnboardingRepository + 'static,
    G: TextGenerator + 'static,
    F: FileStorage + 'static,
{
    let state = RouterState { service, identity };

    Router::new()
        .route("/api/v1/trainees", get(list_trainees_handler::<R, G, F>))
        .route("/api/v1/trainees/:trainee_id", get(dashboard_handler::<R, G, F>))
        .route("/api/v1/leaderboard", get(leaderboard_handler::<R, G, F>))
        .route(
            "/api/v1/trainees/:trainee_id/plan",
            put(save_plan_handler::<R, G, F>),
        )
        .route(
            "/api/v1/trainees/:trainee_id/plan/edits",
            post(plan_edit_handler::<R, G, F>),
        )
        .route(
            "/api/v1/trainees/:trainee_id/plan/generate",
            post(generate_plan_handler::<R, G, F>),
        )
        .route(
            "/api/v1/trainees/:trainee_id/plan/catch-up",
            post(catch_up_handler::<R, G, F>),
        )
        .route(
            "/api/v1/trainees/:trainee_id/tasks/complete",
            post(complete_task_handler::<R, G, F>),
        )
        .route(
            "/api/v1/trainees/:trainee_id/quizzes/:quiz_id/attempts",
            post(quiz_attempt_handler::<R, G, F>),
        )
        .route(
            "/api/v1/trainees/:trainee_id/challenges/:challenge_id/complete",
            post(complete_challenge_handler::<R, G, F>),
        )
        .route(
            "/api/v1/trainees/:trainee_id/submissions",
            post(submit_assignment_handler::<R, G, F>),
        )
        .route(
            "/api/v1/submissions/:submission_id/review",
            post(review_handler::<R, G, F>),
        )
        .route(
            "/api/v1/trainees/:trainee_id/messages",
            get(messages_handler::<R, G, F>).post(send_message_handler::<R, G, F>),
        )
        .route(
            "/api/v1/trainees/:trainee_id/chat",
            post(chat_handler::<R, G, F>),
        )
        .route(
            "/api/v1/trainees/:trainee_id/report",
            post(report_handler::<R, G, F>),
        )
        .route(
            "/api/v1/daily-quiz",
            get(daily_quiz_handler::<R, G, F>).put(set_daily_quiz_handler::<R, G, F>),
        )
        .route("/api/v1/quizzes", get(quizzes_handler::<R, G, F>))
        .route(
            "/api/v1/quizzes/generate",
            post(generate_quiz_handler::<R, G, F>),
        )
        .route("/api/v1/challenges", get(challenges_handler::<R, G, F>))
        .route(
            "/api/v1/challenges/generate",
            post(generate_challenge_handler::<R, G, F>),
        )
        .with_state(state)
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct TraineeListQuery {
    #[serde(default)]
    department: Option<String>,
    #[serde(default)]
    search: Option<String>,
    #[serde(default)]
    status: Option<TraineeStatus>,
    #[serde(default)]
    sort: Option<TraineeColumn>,
    #[serde(default)]
    direction: Option<SortDirection>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct DepartmentQuery {
    #[serde(default)]
    department: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct GeneratePlanQuery {
    #[serde(default)]
    weeks: Option<u8>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct QuizAttemptRequest {
    answers: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SubmissionRequest {
    #[serde(default)]
    task_key: Option<TaskKey>,
    #[serde(default)]
    assignment_title: Option<String>,
    file_name: String,
    #[serde(default)]
    content_type: Option<String>,
    content_base64: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ReviewRequest {
    score: u8,
    #[serde(default)]
    feedback: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DailyQuizRequest {
    quiz_id: QuizId,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MessageRequest {
    text: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerateQuizRequest {
    topic: String,
    #[serde(default)]
    question_count: Option<u8>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GenerateChallengeRequest {
    topic: String,
    difficulty: String,
}

pub(crate) async fn list_trainees_handler<R, G, F>(
    State(state): State<RouterState<R, G, F>>,
    headers: HeaderMap,
    Query(query): Query<TraineeListQuery>,
) -> Response
where
    R: OnboardingRepository + 'static,
    G: TextGenerator + 'static,
    F: FileStorage + 'static,
{
    let actor = match authenticate(&state, &headers) {
        Ok(actor) => actor,
        Err(response) => return response,
    };
    let filter = TraineeFilter {
        search: query.search,
        department: query.department,
        status: query.status,
    };
    let sort = query
        .sort
        .map(|column| TableSort::new(column, query.direction.unwrap_or_default()));

    respond(StatusCode::OK, state.service.list_trainees(&actor, &filter, sort))
}

pub(crate) async fn dashboard_handler<R, G, F>(
    State(state): State<RouterState<R, G, F>>,
    headers: HeaderMap,
    Path(trainee_id): Path<String>,
) -> Response
where
    R: OnboardingRepository + 'static,
    G: TextGenerator + 'static,
    F: FileStorage + 'static,
{
    let actor = match authenticate(&state, &headers) {
        Ok(actor) => actor,
        Err(response) => return response,
    };
    let trainee_id = TraineeId(trainee_id);
    respond(StatusCode::OK, state.service.dashboard(&actor, &trainee_id))
}

pub(crate) async fn leaderboard_handler<R, G, F>(
    State(state): State<RouterState<R, G, F>>,
    headers: HeaderMap,
    Query(query): Query<DepartmentQuery>,
) -> Response
where
    R: OnboardingRepository + 'static,
    G: TextGenerator + 'static,
    F: FileStorage + 'static,
{
    let actor = match authenticate(&state, &headers) {
        Ok(actor) => actor,
        Err(response) => return response,
    };
    let department = query
        .department
        .as_deref()
        .map(str::trim)
        .filter(|department| !department.is_empty());
    respond(StatusCode::OK, state.service.leaderboard(&actor, department))
}

pub(crate) async fn save_plan_handler<R, G, F>(
    State(state): State<RouterState<R, G, F>>,
    headers: HeaderMap,
    Path(trainee_id): Path<String>,
    Json(plan): Json<Plan>,
) -> Response
where
    R: OnboardingRepository + 'static,
    G: TextGenerator + 'static,
    F: FileStorage + 'static,
{
    let actor = match authenticate(&state, &headers) {
        Ok(actor) => actor,
        Err(response) => return response,
    };
    let trainee_id = TraineeId(trainee_id);
    respond(StatusCode::OK, state.service.save_plan(&actor, &trainee_id, plan))
}

pub(crate) async fn plan_edit_handler<R, G, F>(
    State(state): State<RouterState<R, G, F>>,
    headers: HeaderMap,
    Path(trainee_id): Path<String>,
    Json(edit): Json<PlanEdit>,
) -> Response
where
    R: OnboardingRepository + 'static,
    G: TextGenerator + 'static,
    F: FileStorage + 'static,
{
    let actor = match authenticate(&state, &headers) {
        Ok(actor) => actor,
        Err(response) => return response,
    };
    let trainee_id = TraineeId(trainee_id);
    respond(
        StatusCode::OK,
        state.service.apply_plan_edit(&actor, &trainee_id, &edit),
    )
}

pub(crate) async fn generate_plan_handler<R, G, F>(
    State(state): State<RouterState<R, G, F>>,
    headers: HeaderMap,
    Path(trainee_id): Path<String>,
    Query(query): Query<GeneratePlanQuery>,
) -> Response
where
    R: OnboardingRepository + 'static,
    G: TextGenerator + 'static,
    F: FileStorage + 'static,
{
    let actor = match authenticate(&state, &headers) {
        Ok(actor) => actor,
        Err(response) => return response,
    };
    let service = Arc::clone(&state.service);
    let trainee_id = TraineeId(trainee_id);
    let result =
        run_blocking(move || service.generate_plan(&actor, &trainee_id, query.weeks)).await;
    respond(StatusCode::CREATED, result)
}

pub(crate) async fn catch_up_handler<R, G, F>(
    State(state): State<RouterState<R, G, F>>,
    headers: HeaderMap,
    Path(trainee_id): Path<String>,
) -> Response
where
    R: OnboardingRepository + 'static,
    G: TextGenerator + 'static,
    F: FileStorage + 'static,
{
    let actor = match authenticate(&state, &headers) {
        Ok(actor) => actor,
        Err(response) => return response,
    };
    let service = Arc::clone(&state.service);
    let trainee_id = TraineeId(trainee_id);
    let result = run_blocking(move || service.generate_catch_up(&actor, &trainee_id)).await;
    respond(StatusCode::CREATED, result)
}

pub(crate) async fn complete_task_handler<R, G, F>(
    State(state): State<RouterState<R, G, F>>,
    headers: HeaderMap,
    Path(trainee_id): Path<String>,
    Json(completion): Json<TaskCompletion>,
) -> Response
where
    R: OnboardingRepository + 'static,
    G: TextGenerator + 'static,
    F: FileStorage + 'static,
{
    let actor = match authenticate(&state, &headers) {
        Ok(actor) => actor,
        Err(response) => return response,
    };
    let trainee_id = TraineeId(trainee_id);
    respond(
        StatusCode::OK,
        state.service.complete_task(&actor, &trainee_id, completion),
    )
}

pub(crate) async fn quiz_attempt_handler<R, G, F>(
    State(state): State<RouterState<R, G, F>>,
    headers: HeaderMap,
    Path((trainee_id, quiz_id)): Path<(String, String)>,
    Json(attempt): Json<QuizAttemptRequest>,
) -> Response
where
    R: OnboardingRepository + 'static,
    G: TextGenerator + 'static,
    F: FileStorage + 'static,
{
    let actor = match authenticate(&state, &headers) {
        Ok(actor) => actor,
        Err(response) => return response,
    };
    let trainee_id = TraineeId(trainee_id);
    let quiz_id = QuizId(quiz_id);
    respond(
        StatusCode::OK,
        state
            .service
            .submit_quiz(&actor, &trainee_id, &quiz_id, &attempt.answers),
    )
}

pub(crate) async fn complete_challenge_handler<R, G, F>(
    State(state): State<RouterState<R, G, F>>,
    headers: HeaderMap,
    Path((trainee_id, challenge_id)): Path<(String, String)>,
) -> Response
where
    R: OnboardingRepository + 'static,
    G: TextGenerator + 'static,
    F: FileStorage + 'static,
{
    let actor = match authenticate(&state, &headers) {
        Ok(actor) => actor,
        Err(response) => return response,
    };
    let trainee_id = TraineeId(trainee_id);
    let challenge_id = ChallengeId(challenge_id);
    respond(
        StatusCode::OK,
        state
            .service
            .complete_challenge(&actor, &trainee_id, &challenge_id),
    )
}

pub(crate) async fn submit_assignment_handler<R, G, F>(
    State(state): State<RouterState<R, G, F>>,
    headers: HeaderMap,
    Path(trainee_id): Path<String>,
    Json(request): Json<SubmissionRequest>,
) -> Response
where
    R: OnboardingRepository + 'static,
    G: TextGenerator + 'static,
    F: FileStorage + 'static,
{
    let actor = match authenticate(&state, &headers) {
        Ok(actor) => actor,
        Err(response) => return response,
    };
    let bytes = match base64::engine::general_purpose::STANDARD.decode(request.content_base64.trim())
    {
        Ok(bytes) => bytes,
        Err(err) => {
            return error_response(MindsetError::invalid(format!(
                "file content is not valid base64: {err}"
            )))
        }
    };
    let content_type = request
        .content_type
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| {
            mime_guess::from_path(&request.file_name)
                .first_or_octet_stream()
                .to_string()
        });
    let upload = AssignmentUpload {
        task_key: request.task_key,
        assignment_title: request.assignment_title,
        file_name: request.file_name,
        content_type,
        bytes,
    };

    let service = Arc::clone(&state.service);
    let trainee_id = TraineeId(trainee_id);
    let result = run_blocking(move || service.submit_assignment(&actor, &trainee_id, upload)).await;
    respond(StatusCode::CREATED, result)
}

pub(crate) async fn review_handler<R, G, F>(
    State(state): State<RouterState<R, G, F>>,
    headers: HeaderMap,
    Path(submission_id): Path<String>,
    Json(review): Json<ReviewRequest>,
) -> Response
where
    R: OnboardingRepository + 'static,
    G: TextGenerator + 'static,
    F: FileStorage + 'static,
{
    let actor = match authenticate(&state, &headers) {
        Ok(actor) => actor,
        Err(response) => return response,
    };
    let submission_id = SubmissionId(submission_id);
    respond(
        StatusCode::OK,
        state
            .service
            .review_submission(&actor, &submission_id, review.score, review.feedback),
    )
}

pub(crate) async fn messages_handler<R, G, F>(
    State(state): State<RouterState<R, G, F>>,
    headers: HeaderMap,
    Path(trainee_id): Path<String>,
) -> Response
where
    R: OnboardingRepository + 'static,
    G: TextGenerator + 'static,
    F: FileStorage + 'static,
{
    let actor = match authenticate(&state, &headers) {
        Ok(actor) => actor,
        Err(response) => return response,
    };
    let trainee_id = TraineeId(trainee_id);
    respond(StatusCode::OK, state.service.messages(&actor, &trainee_id))
}

pub(crate) async fn send_message_handler<R, G, F>(
    State(state): State<RouterState<R, G, F>>,
    headers: HeaderMap,
    Path(trainee_id): Path<String>,
    Json(message): Json<MessageRequest>,
) -> Response
where
    R: OnboardingRepository + 'static,
    G: TextGenerator + 'static,
    F: FileStorage + 'static,
{
    let actor = match authenticate(&state, &headers) {
        Ok(actor) => actor,
        Err(response) => return response,
    };
    let trainee_id = TraineeId(trainee_id);
    respond(
        StatusCode::CREATED,
        state.service.send_message(&actor, &trainee_id, &message.text),
    )
}

pub(crate) async fn chat_handler<R, G, F>(
    State(state): State<RouterState<R, G, F>>,
    headers: HeaderMap,
    Path(trainee_id): Path<String>,
    Json(message): Json<MessageRequest>,
) -> Response
where
    R: OnboardingRepository + 'static,
    G: TextGenerator + 'static,
    F: FileStorage + 'static,
{
    let actor = match authenticate(&state, &headers) {
        Ok(actor) => actor,
        Err(response) => return response,
    };
    let service = Arc::clone(&state.service);
    let trainee_id = TraineeId(trainee_id);
    let result = run_blocking(move || service.chat(&actor, &trainee_id, &message.text)).await;
    respond(StatusCode::OK, result)
}

pub(crate) async fn report_handler<R, G, F>(
    State(state): State<RouterState<R, G, F>>,
    headers: HeaderMap,
    Path(trainee_id): Path<String>,
) -> Response
where
    R: OnboardingRepository + 'static,
    G: TextGenerator + 'static,
    F: FileStorage + 'static,
{
    let actor = match authenticate(&state, &headers) {
        Ok(actor) => actor,
        Err(response) => return response,
    };
    let service = Arc::clone(&state.service);
    let trainee_id = TraineeId(trainee_id);
    let result = run_blocking(move || service.progress_report(&actor, &trainee_id)).await;
    respond(StatusCode::OK, result)
}

pub(crate) async fn daily_quiz_handler<R, G, F>(
    State(state): State<RouterState<R, G, F>>,
    headers: HeaderMap,
) -> Response
where
    R: OnboardingRepository + 'static,
    G: TextGenerator + 'static,
    F: FileStorage + 'static,
{
    let actor = match authenticate(&state, &headers) {
        Ok(actor) => actor,
        Err(response) => return response,
    };
    match state.service.daily_quiz(&actor) {
        Ok(Some(quiz)) => (StatusCode::OK, Json(quiz)).into_response(),
        Ok(None) => {
            let payload = json!({ "error": "no daily quiz selected" });
            (StatusCode::NOT_FOUND, Json(payload)).into_response()
        }
        Err(err) => error_response(err),
    }
}

pub(crate) async fn set_daily_quiz_handler<R, G, F>(
    State(state): State<RouterState<R, G, F>>,
    headers: HeaderMap,
    Json(request): Json<DailyQuizRequest>,
) -> Response
where
    R: OnboardingRepository + 'static,
    G: TextGenerator + 'static,
    F: FileStorage + 'static,
{
    let actor = match authenticate(&state, &headers) {
        Ok(actor) => actor,
        Err(response) => return response,
    };
    respond(
        StatusCode::OK,
        state.service.set_daily_quiz(&actor, &request.quiz_id),
    )
}

pub(crate) async fn quizzes_handler<R, G, F>(
    State(state): State<RouterState<R, G, F>>,
    headers: HeaderMap,
) -> Response
where
    R: OnboardingRepository + 'static,
    G: TextGenerator + 'static,
    F: FileStorage + 'static,
{
    let actor = match authenticate(&state, &headers) {
        Ok(actor) => actor,
        Err(response) => return response,
    };
    respond(StatusCode::OK, state.service.quizzes(&actor))
}

pub(crate) async fn generate_quiz_handler<R, G, F>(
    State(state): State<RouterState<R, G, F>>,
    headers: HeaderMap,
    Json(request): Json<GenerateQuizRequest>,
) -> Response
where
    R: OnboardingRepository + 'static,
    G: TextGenerator + 'static,
    F: FileStorage + 'static,
{
    let actor = match authenticate(&state, &headers) {
        Ok(actor) => actor,
        Err(response) => return response,
    };
    let service = Arc::clone(&state.service);
    let result = run_blocking(move || {
        service.generate_quiz(&actor, &request.topic, request.question_count)
    })
    .await;
    respond(StatusCode::CREATED, result)
}

pub(crate) async fn challenges_handler<R, G, F>(
    State(state): State<RouterState<R, G, F>>,
    headers: HeaderMap,
) -> Response
where
    R: OnboardingRepository + 'static,
    G: TextGenerator + 'static,
    F: FileStorage + 'static,
{
    let actor = match authenticate(&state, &headers) {
        Ok(actor) => actor,
        Err(response) => return response,
    };
    respond(StatusCode::OK, state.service.challenges(&actor))
}

pub(crate) async fn generate_challenge_handler<R, G, F>(
    State(state): State<RouterState<R, G, F>>,
    headers: HeaderMap,
    Json(request): Json<GenerateChallengeRequest>,
) -> Response
where
    R: OnboardingRepository + 'static,
    G: TextGenerator + 'static,
    F: FileStorage + 'static,
{
    let actor = match authenticate(&state, &headers) {
        Ok(actor) => actor,
        Err(response) => return response,
    };
    let service = Arc::clone(&state.service);
    let result = run_blocking(move || {
        service.generate_challenge(&actor, &request.topic, &request.difficulty)
    })
    .await;
    respond(StatusCode::CREATED, result)
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

fn authenticate<R, G, F>(
    state: &RouterState<R, G, F>,
    headers: &HeaderMap,
) -> Result<Principal, Response> {
    let result = match bearer_token(headers) {
        Some(token) => state.identity.resolve(token),
        None => Err(AuthError::MissingToken),
    };

    result.map_err(|err| {
        let status = match err {
            AuthError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AuthError::MissingToken | AuthError::InvalidToken => StatusCode::UNAUTHORIZED,
        };
        let payload = json!({ "error": err.to_string() });
        (status, Json(payload)).into_response()
    })
}

/// Runs a service call that may block on the generator or file store.
async fn run_blocking<T, Op>(op: Op) -> Result<T, MindsetError>
where
    T: Send + 'static,
    Op: FnOnce() -> Result<T, MindsetError> + Send + 'static,
{
    match tokio::task::spawn_blocking(op).await {
        Ok(result) => result,
        Err(err) => Err(MindsetError::Generation(GenerationError::Transport(
            err.to_string(),
        ))),
    }
}

pub(crate) fn status_for(err: &MindsetError) -> StatusCode {
    match err {
        MindsetError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        MindsetError::NotFound { .. } | MindsetError::Persistence(RepositoryError::NotFound) => {
            StatusCode::NOT_FOUND
        }
        MindsetError::Forbidden(_) => StatusCode::FORBIDDEN,
        MindsetError::Conflict(_) | MindsetError::Persistence(RepositoryError::Conflict) => {
            StatusCode::CONFLICT
        }
        MindsetError::Generation(_) => StatusCode::BAD_GATEWAY,
        MindsetError::Persistence(_) | MindsetError::Storage(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

fn error_response(err: MindsetError) -> Response {
    let status = status_for(&err);
    if status.is_server_error() {
        error!(status = status.as_u16(), error = %err, "request failed");
    }
    let payload = json!({ "error": err.to_string() });
    (status, Json(payload)).into_response()
}

fn respond<T: Serialize>(status: StatusCode, result: Result<T, MindsetError>) -> Response {
    match result {
        Ok(body) => (status, Json(body)).into_response(),
        Err(err) => error_response(err),
    }
}
