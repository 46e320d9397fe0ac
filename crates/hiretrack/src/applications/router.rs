use std::sync::Arc;

use axum::async_trait;
use axum::extract::{FromRequestParts, Multipart, Path, Query, State};
use axum::http::request::Parts;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;

use super::artifacts::{ArtifactError, ArtifactStore, ArtifactUpload};
use super::domain::{ApplicationId, JobId};
use super::notify::NotificationDispatcher;
use super::repository::{ApplicationRegistry, JobCatalog, RegistryError, UserDirectory};
use super::service::{ApplicationServiceError, JobApplicationService};

/// Header carrying the authenticated caller's email, populated by the
/// upstream gateway after credential checks.
const CALLER_HEADER: &str = "x-caller-email";

/// Caller identity resolved by upstream authentication middleware. The core
/// never sees credentials, only the account email.
#[derive(Debug, Clone)]
pub struct CallerIdentity(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for CallerIdentity
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(CALLER_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(|email| Self(email.to_string()))
            .ok_or_else(|| {
                (
                    StatusCode::UNAUTHORIZED,
                    Json(json!({ "error": "missing caller identity" })),
                )
                    .into_response()
            })
    }
}

/// Router builder exposing the application lifecycle endpoints.
pub fn application_router<R, U, C, S, N>(
    service: Arc<JobApplicationService<R, U, C, S, N>>,
) -> Router
where
    R: ApplicationRegistry + 'static,
    U: UserDirectory + 'static,
    C: JobCatalog + 'static,
    S: ArtifactStore + 'static,
    N: NotificationDispatcher + 'static,
{
    Router::new()
        .route(
            "/applications/apply/:job_id",
            post(apply_handler::<R, U, C, S, N>),
        )
        .route(
            "/applications/my",
            get(my_applications_handler::<R, U, C, S, N>),
        )
        .route(
            "/applications/:application_id/status",
            put(update_status_handler::<R, U, C, S, N>)
                .get(status_handler::<R, U, C, S, N>),
        )
        .route(
            "/applications/:application_id/withdraw",
            put(withdraw_handler::<R, U, C, S, N>),
        )
        .route(
            "/applications/job/:job_id",
            get(job_applications_handler::<R, U, C, S, N>),
        )
        .route(
            "/applications/resume/:application_id",
            get(resume_handler::<R, U, C, S, N>),
        )
        .route(
            "/applications/cover-letter/:application_id",
            get(cover_letter_handler::<R, U, C, S, N>),
        )
        .route(
            "/applications/admin/applications",
            get(admin_applications_handler::<R, U, C, S, N>),
        )
        .with_state(service)
}

pub(crate) async fn apply_handler<R, U, C, S, N>(
    State(service): State<Arc<JobApplicationService<R, U, C, S, N>>>,
    Path(job_id): Path<u64>,
    caller: CallerIdentity,
    mut multipart: Multipart,
) -> Response
where
    R: ApplicationRegistry + 'static,
    U: UserDirectory + 'static,
    C: JobCatalog + 'static,
    S: ArtifactStore + 'static,
    N: NotificationDispatcher + 'static,
{
    let (resume, cover_letter) = match read_documents(&mut multipart).await {
        Ok(documents) => documents,
        Err(response) => return response,
    };

    match service.apply(JobId(job_id), &caller.0, resume, cover_letter) {
        Ok(record) => (StatusCode::OK, Json(record.application)).into_response(),
        Err(err) => err.into_response(),
    }
}

/// Pull the `resume` and `coverLetter` parts out of the multipart form.
async fn read_documents(
    multipart: &mut Multipart,
) -> Result<(ArtifactUpload, ArtifactUpload), Response> {
    let mut resume = None;
    let mut cover_letter = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(err) => return Err(bad_request(err.to_string())),
        };

        let Some(name) = field.name().map(ToString::to_string) else {
            continue;
        };
        let original_name = field.file_name().unwrap_or("document.pdf").to_string();
        let bytes = match field.bytes().await {
            Ok(bytes) => bytes,
            Err(err) => return Err(bad_request(err.to_string())),
        };

        let upload = ArtifactUpload {
            bytes: bytes.to_vec(),
            original_name,
        };
        match name.as_str() {
            "resume" => resume = Some(upload),
            "coverLetter" => cover_letter = Some(upload),
            _ => {}
        }
    }

    match (resume, cover_letter) {
        (Some(resume), Some(cover_letter)) => Ok((resume, cover_letter)),
        (None, _) => Err(bad_request("missing multipart field 'resume'".to_string())),
        (_, None) => Err(bad_request(
            "missing multipart field 'coverLetter'".to_string(),
        )),
    }
}

pub(crate) async fn my_applications_handler<R, U, C, S, N>(
    State(service): State<Arc<JobApplicationService<R, U, C, S, N>>>,
    caller: CallerIdentity,
) -> Response
where
    R: ApplicationRegistry + 'static,
    U: UserDirectory + 'static,
    C: JobCatalog + 'static,
    S: ArtifactStore + 'static,
    N: NotificationDispatcher + 'static,
{
    match service.my_applications(&caller.0) {
        Ok(listing) => (StatusCode::OK, Json(listing)).into_response(),
        Err(err) => err.into_response(),
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct StatusQuery {
    status: String,
}

pub(crate) async fn update_status_handler<R, U, C, S, N>(
    State(service): State<Arc<JobApplicationService<R, U, C, S, N>>>,
    Path(application_id): Path<u64>,
    Query(query): Query<StatusQuery>,
    caller: CallerIdentity,
) -> Response
where
    R: ApplicationRegistry + 'static,
    U: UserDirectory + 'static,
    C: JobCatalog + 'static,
    S: ArtifactStore + 'static,
    N: NotificationDispatcher + 'static,
{
    match service.update_status(ApplicationId(application_id), &query.status, &caller.0) {
        Ok(record) => (StatusCode::OK, Json(record.application)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn status_handler<R, U, C, S, N>(
    State(service): State<Arc<JobApplicationService<R, U, C, S, N>>>,
    Path(application_id): Path<u64>,
    caller: CallerIdentity,
) -> Response
where
    R: ApplicationRegistry + 'static,
    U: UserDirectory + 'static,
    C: JobCatalog + 'static,
    S: ArtifactStore + 'static,
    N: NotificationDispatcher + 'static,
{
    let application_id = ApplicationId(application_id);
    match service.can_access(application_id, &caller.0) {
        Ok(true) => {}
        Ok(false) => return forbidden("access denied to this application"),
        Err(err) => return err.into_response(),
    }

    match service.get(application_id) {
        Ok(record) => (
            StatusCode::OK,
            Json(json!({ "status": record.application.status })),
        )
            .into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn withdraw_handler<R, U, C, S, N>(
    State(service): State<Arc<JobApplicationService<R, U, C, S, N>>>,
    Path(application_id): Path<u64>,
    caller: CallerIdentity,
) -> Response
where
    R: ApplicationRegistry + 'static,
    U: UserDirectory + 'static,
    C: JobCatalog + 'static,
    S: ArtifactStore + 'static,
    N: NotificationDispatcher + 'static,
{
    match service.withdraw(ApplicationId(application_id), &caller.0) {
        Ok(message) => (StatusCode::OK, Json(json!({ "message": message }))).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn job_applications_handler<R, U, C, S, N>(
    State(service): State<Arc<JobApplicationService<R, U, C, S, N>>>,
    Path(job_id): Path<u64>,
    caller: CallerIdentity,
) -> Response
where
    R: ApplicationRegistry + 'static,
    U: UserDirectory + 'static,
    C: JobCatalog + 'static,
    S: ArtifactStore + 'static,
    N: NotificationDispatcher + 'static,
{
    match service.applications_for_job(JobId(job_id), &caller.0) {
        Ok(summaries) => (
            StatusCode::OK,
            Json(json!({ "count": summaries.len(), "applications": summaries })),
        )
            .into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn resume_handler<R, U, C, S, N>(
    State(service): State<Arc<JobApplicationService<R, U, C, S, N>>>,
    Path(application_id): Path<u64>,
    caller: CallerIdentity,
) -> Response
where
    R: ApplicationRegistry + 'static,
    U: UserDirectory + 'static,
    C: JobCatalog + 'static,
    S: ArtifactStore + 'static,
    N: NotificationDispatcher + 'static,
{
    let application_id = ApplicationId(application_id);
    match service.can_access(application_id, &caller.0) {
        Ok(true) => {}
        Ok(false) => return forbidden("unauthorized access to resume"),
        Err(err) => return err.into_response(),
    }

    match service.resume(application_id) {
        Ok(bytes) => attachment_response(bytes, "resume.pdf"),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn cover_letter_handler<R, U, C, S, N>(
    State(service): State<Arc<JobApplicationService<R, U, C, S, N>>>,
    Path(application_id): Path<u64>,
    caller: CallerIdentity,
) -> Response
where
    R: ApplicationRegistry + 'static,
    U: UserDirectory + 'static,
    C: JobCatalog + 'static,
    S: ArtifactStore + 'static,
    N: NotificationDispatcher + 'static,
{
    let application_id = ApplicationId(application_id);
    match service.can_access(application_id, &caller.0) {
        Ok(true) => {}
        Ok(false) => return forbidden("unauthorized access to cover letter"),
        Err(err) => return err.into_response(),
    }

    match service.cover_letter(application_id) {
        Ok(bytes) => attachment_response(bytes, "cover_letter.pdf"),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn admin_applications_handler<R, U, C, S, N>(
    State(service): State<Arc<JobApplicationService<R, U, C, S, N>>>,
    caller: CallerIdentity,
) -> Response
where
    R: ApplicationRegistry + 'static,
    U: UserDirectory + 'static,
    C: JobCatalog + 'static,
    S: ArtifactStore + 'static,
    N: NotificationDispatcher + 'static,
{
    match service.all_applications(&caller.0) {
        Ok(views) => (StatusCode::OK, Json(views)).into_response(),
        Err(err) => err.into_response(),
    }
}

fn attachment_response(bytes: Vec<u8>, filename: &str) -> Response {
    (
        StatusCode::OK,
        [
            (
                header::CONTENT_TYPE,
                mime::APPLICATION_PDF.as_ref().to_string(),
            ),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename={filename}"),
            ),
        ],
        bytes,
    )
        .into_response()
}

fn bad_request(message: String) -> Response {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response()
}

fn forbidden(message: &str) -> Response {
    (StatusCode::FORBIDDEN, Json(json!({ "error": message }))).into_response()
}

impl ApplicationServiceError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::JobNotFound(_) | Self::UserNotFound(_) | Self::ApplicationNotFound(_) => {
                StatusCode::NOT_FOUND
            }
            Self::AlreadyApplied => StatusCode::CONFLICT,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::WithdrawnImmutable | Self::UnknownStatus(_) => StatusCode::BAD_REQUEST,
            Self::Registry(RegistryError::NotFound) => StatusCode::NOT_FOUND,
            Self::Artifact(ArtifactError::NotFound(_)) => StatusCode::NOT_FOUND,
            Self::Registry(_) | Self::Directory(_) | Self::Artifact(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApplicationServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}
