use std::sync::Arc;

use axum::{
    async_trait,
    body::{to_bytes, Body},
    extract::{FromRequest, FromRequestParts, Path, Query, Request, State},
    http::{request::Parts, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::json;

use super::domain::{
    Actor, ApplicationId, ApplicationStatus, PositionId, RecruitmentStage, Role, StageId, UserId,
};
use super::engine::{ApplicationFilter, RecruitmentWorkflow, WorkflowError};
use super::repository::{CandidateDirectory, RecruitmentRepository, RepositoryError};

pub const ACTOR_ID_HEADER: &str = "x-actor-id";
pub const ACTOR_ROLE_HEADER: &str = "x-actor-role";
pub const ACTOR_NAME_HEADER: &str = "x-actor-name";

/// Same ceiling as axum's default body limit.
const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Router builder exposing the recruitment workflow over HTTP.
pub fn recruitment_router<R, C>(service: Arc<RecruitmentWorkflow<R, C>>) -> Router
where
    R: RecruitmentRepository + 'static,
    C: CandidateDirectory + 'static,
{
    Router::new()
        .route(
            "/api/v1/recruitment-stages",
            get(stages_handler::<R, C>),
        )
        .route("/api/v1/positions", post(open_position_handler::<R, C>))
        .route(
            "/api/v1/positions/:position_id",
            get(position_handler::<R, C>),
        )
        .route(
            "/api/v1/positions/:position_id/next_stage",
            post(next_stage_handler::<R, C>),
        )
        .route(
            "/api/v1/positions/:position_id/stage_statistics",
            get(stage_statistics_handler::<R, C>),
        )
        .route(
            "/api/v1/positions/:position_id/applications",
            get(position_applications_handler::<R, C>),
        )
        .route("/api/v1/applications/apply", post(apply_handler::<R, C>))
        .route(
            "/api/v1/applications/:application_id",
            get(application_handler::<R, C>),
        )
        .route(
            "/api/v1/applications/:application_id/approve",
            post(approve_handler::<R, C>),
        )
        .route(
            "/api/v1/applications/:application_id/reject",
            post(reject_handler::<R, C>),
        )
        .route(
            "/api/v1/applications/:application_id/reactivate",
            post(reactivate_handler::<R, C>),
        )
        .route(
            "/api/v1/applications/:application_id/comments",
            get(comments_handler::<R, C>).post(add_comment_handler::<R, C>),
        )
        .with_state(service)
}

type Service<R, C> = State<Arc<RecruitmentWorkflow<R, C>>>;

#[derive(Debug, Deserialize)]
pub struct OpenPositionRequest {
    pub title: String,
    pub department: String,
    #[serde(default)]
    pub current_stage: Option<StageId>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AdvanceRequest {
    #[serde(default)]
    pub global_comment: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AdvanceResponse {
    pub message: String,
    pub next_stage: RecruitmentStage,
    pub approved_count: usize,
    pub rejected_count: usize,
}

#[derive(Debug, Deserialize)]
pub struct ApplyRequest {
    pub position: PositionId,
}

#[derive(Debug, Default, Deserialize)]
pub struct RejectRequest {
    #[serde(default)]
    pub rejection_reason: String,
}

#[derive(Debug, Deserialize)]
pub struct CommentRequest {
    pub content: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ApplicationListQuery {
    #[serde(default)]
    pub status: Option<String>,
}

pub(crate) async fn stages_handler<R, C>(State(service): Service<R, C>, _actor: Actor) -> Response
where
    R: RecruitmentRepository + 'static,
    C: CandidateDirectory + 'static,
{
    let stages: Vec<RecruitmentStage> = service.stages().active().into_iter().cloned().collect();
    (StatusCode::OK, Json(stages)).into_response()
}

pub(crate) async fn open_position_handler<R, C>(
    State(service): Service<R, C>,
    actor: Actor,
    Json(request): Json<OpenPositionRequest>,
) -> Response
where
    R: RecruitmentRepository + 'static,
    C: CandidateDirectory + 'static,
{
    match service.open_position(
        &actor,
        request.title,
        request.department,
        request.current_stage,
    ) {
        Ok(position) => (StatusCode::CREATED, Json(position)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn position_handler<R, C>(
    State(service): Service<R, C>,
    _actor: Actor,
    Path(position_id): Path<u64>,
) -> Response
where
    R: RecruitmentRepository + 'static,
    C: CandidateDirectory + 'static,
{
    match service.position(PositionId(position_id)) {
        Ok(position) => (StatusCode::OK, Json(position)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn next_stage_handler<R, C>(
    State(service): Service<R, C>,
    actor: Actor,
    Path(position_id): Path<u64>,
    OptionalJson(request): OptionalJson<AdvanceRequest>,
) -> Response
where
    R: RecruitmentRepository + 'static,
    C: CandidateDirectory + 'static,
{
    match service.advance_stage(
        &actor,
        PositionId(position_id),
        request.global_comment.as_deref(),
    ) {
        Ok(advance) => {
            let body = AdvanceResponse {
                message: advance.summary(),
                approved_count: advance.approved_count,
                rejected_count: advance.rejected_count,
                next_stage: advance.next_stage,
            };
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(err) => error_response(err),
    }
}

pub(crate) async fn stage_statistics_handler<R, C>(
    State(service): Service<R, C>,
    _actor: Actor,
    Path(position_id): Path<u64>,
) -> Response
where
    R: RecruitmentRepository + 'static,
    C: CandidateDirectory + 'static,
{
    match service.stage_statistics(PositionId(position_id)) {
        Ok(statistics) => (StatusCode::OK, Json(statistics)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn position_applications_handler<R, C>(
    State(service): Service<R, C>,
    _actor: Actor,
    Path(position_id): Path<u64>,
    Query(query): Query<ApplicationListQuery>,
) -> Response
where
    R: RecruitmentRepository + 'static,
    C: CandidateDirectory + 'static,
{
    let filter = match query.status.as_deref() {
        None => ApplicationFilter::Active,
        Some(raw) => match ApplicationStatus::parse(raw) {
            Some(status) => ApplicationFilter::Only(status),
            None => return bad_request(&format!("unknown status filter '{raw}'")),
        },
    };

    match service.applications(PositionId(position_id), filter) {
        Ok(applications) => (StatusCode::OK, Json(applications)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn apply_handler<R, C>(
    State(service): Service<R, C>,
    actor: Actor,
    Json(request): Json<ApplyRequest>,
) -> Response
where
    R: RecruitmentRepository + 'static,
    C: CandidateDirectory + 'static,
{
    match service.apply(&actor, request.position) {
        Ok(detail) => (StatusCode::CREATED, Json(detail)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn application_handler<R, C>(
    State(service): Service<R, C>,
    _actor: Actor,
    Path(application_id): Path<u64>,
) -> Response
where
    R: RecruitmentRepository + 'static,
    C: CandidateDirectory + 'static,
{
    match service.detail(ApplicationId(application_id)) {
        Ok(detail) => (StatusCode::OK, Json(detail)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn approve_handler<R, C>(
    State(service): Service<R, C>,
    actor: Actor,
    Path(application_id): Path<u64>,
) -> Response
where
    R: RecruitmentRepository + 'static,
    C: CandidateDirectory + 'static,
{
    match service.approve(&actor, ApplicationId(application_id)) {
        Ok(detail) => (StatusCode::OK, Json(detail)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn reject_handler<R, C>(
    State(service): Service<R, C>,
    actor: Actor,
    Path(application_id): Path<u64>,
    OptionalJson(request): OptionalJson<RejectRequest>,
) -> Response
where
    R: RecruitmentRepository + 'static,
    C: CandidateDirectory + 'static,
{
    match service.reject(
        &actor,
        ApplicationId(application_id),
        &request.rejection_reason,
    ) {
        Ok(detail) => (StatusCode::OK, Json(detail)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn reactivate_handler<R, C>(
    State(service): Service<R, C>,
    actor: Actor,
    Path(application_id): Path<u64>,
) -> Response
where
    R: RecruitmentRepository + 'static,
    C: CandidateDirectory + 'static,
{
    match service.reactivate(&actor, ApplicationId(application_id)) {
        Ok(detail) => (StatusCode::OK, Json(detail)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn comments_handler<R, C>(
    State(service): Service<R, C>,
    _actor: Actor,
    Path(application_id): Path<u64>,
) -> Response
where
    R: RecruitmentRepository + 'static,
    C: CandidateDirectory + 'static,
{
    match service.comments(ApplicationId(application_id)) {
        Ok(comments) => (StatusCode::OK, Json(comments)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn add_comment_handler<R, C>(
    State(service): Service<R, C>,
    actor: Actor,
    Path(application_id): Path<u64>,
    Json(request): Json<CommentRequest>,
) -> Response
where
    R: RecruitmentRepository + 'static,
    C: CandidateDirectory + 'static,
{
    match service.add_comment(&actor, ApplicationId(application_id), &request.content) {
        Ok(comments) => (StatusCode::CREATED, Json(comments)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) fn status_for(err: &WorkflowError) -> StatusCode {
    match err {
        WorkflowError::InvalidTransition(_)
        | WorkflowError::NoCurrentStage
        | WorkflowError::NoNextStage
        | WorkflowError::DuplicateApplication
        | WorkflowError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        WorkflowError::NotFound(_) | WorkflowError::Repository(RepositoryError::NotFound) => {
            StatusCode::NOT_FOUND
        }
        WorkflowError::Repository(RepositoryError::Conflict) => StatusCode::CONFLICT,
        WorkflowError::Repository(RepositoryError::Unavailable(_)) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

fn error_response(err: WorkflowError) -> Response {
    let payload = json!({ "error": err.to_string() });
    (status_for(&err), Json(payload)).into_response()
}

impl IntoResponse for WorkflowError {
    fn into_response(self) -> Response {
        error_response(self)
    }
}

fn bad_request(message: &str) -> Response {
    let payload = json!({ "error": message });
    (StatusCode::BAD_REQUEST, Json(payload)).into_response()
}

/// JSON body that may be left out. An empty body yields `T::default()`; a
/// body that is present must deserialize as `T` or the request fails with 400.
#[derive(Debug)]
pub struct OptionalJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for OptionalJson<T>
where
    T: DeserializeOwned + Default + Send,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let (parts, body) = req.into_parts();
        let bytes = to_bytes(body, MAX_BODY_BYTES)
            .await
            .map_err(|_| bad_request("request body is unreadable or too large"))?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self(T::default()));
        }

        let request = Request::from_parts(parts, Body::from(bytes));
        match Json::<T>::from_request(request, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(bad_request(&rejection.body_text())),
        }
    }
}

/// Rejection raised when the authenticated-actor headers are missing or malformed.
#[derive(Debug)]
pub struct MissingActor(&'static str);

impl IntoResponse for MissingActor {
    fn into_response(self) -> Response {
        let payload = json!({ "error": format!("unauthenticated: {}", self.0) });
        (StatusCode::UNAUTHORIZED, Json(payload)).into_response()
    }
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

#[async_trait]
impl<S> FromRequestParts<S> for Actor
where
    S: Send + Sync,
{
    type Rejection = MissingActor;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let id = header(&parts.headers, ACTOR_ID_HEADER)
            .and_then(|raw| raw.parse::<u64>().ok())
            .ok_or(MissingActor("x-actor-id must be a numeric user id"))?;
        let role = header(&parts.headers, ACTOR_ROLE_HEADER)
            .and_then(Role::parse)
            .ok_or(MissingActor("x-actor-role must name a known role"))?;
        let display_name = header(&parts.headers, ACTOR_NAME_HEADER)
            .map(str::to_string)
            .unwrap_or_else(|| format!("user-{id}"));

        Ok(Actor {
            id: UserId(id),
            role,
            display_name,
        })
    }
}
