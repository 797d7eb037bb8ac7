//! HTTP request handlers for API endpoints

use axum::{
    extract::{
        rejection::{FormRejection, QueryRejection},
        Form, Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use schedule_engine::{
    find_free_slot, meetings_in_window, EngineError, Meeting, MeetingId, Period, Presence,
    RecurrenceDef, User, UserId,
};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error, info, warn};
use utoipa::ToSchema;

use crate::openapi::{NewMeetingForm, NewUserForm, PresenceForm};
use crate::params::{Args, Param, ParamError};
use crate::store::StoreError;
use crate::AppState;

type Pairs = Vec<(String, String)>;

/// Everything a handler can fail with, mapped onto a status code.
///
/// Error responses have an empty body; the cause goes to the log.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Params(#[from] ParamError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("malformed request: {0}")]
    Malformed(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Params(_) | ApiError::Malformed(_) => StatusCode::BAD_REQUEST,
            ApiError::Store(StoreError::RecurrenceChanged(_)) => StatusCode::CONFLICT,
            ApiError::Store(_) => StatusCode::NOT_FOUND,
            ApiError::Engine(EngineError::LookaheadExceeded { .. }) => StatusCode::NOT_FOUND,
            ApiError::Engine(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match status {
            StatusCode::BAD_REQUEST => warn!("rejected request: {}", self),
            StatusCode::NOT_FOUND => debug!("not found: {}", self),
            _ => error!("request failed: {}", self),
        }
        status.into_response()
    }
}

/// Id of a newly created user or meeting.
#[derive(Debug, Serialize, ToSchema)]
pub struct Created {
    #[serde(rename = "Id")]
    pub id: u32,
}

fn query_args(query: Result<Query<Pairs>, QueryRejection>, accepted: &[Param]) -> Result<Args, ApiError> {
    let Query(pairs) = query.map_err(|e| ApiError::Malformed(e.body_text()))?;
    Ok(Args::check(pairs, accepted)?)
}

/// Form body values first, then query string values. A body that is not a
/// urlencoded form contributes nothing.
fn form_args(
    query: Result<Query<Pairs>, QueryRejection>,
    form: Result<Form<Pairs>, FormRejection>,
    accepted: &[Param],
) -> Result<Args, ApiError> {
    let Query(from_query) = query.map_err(|e| ApiError::Malformed(e.body_text()))?;
    let mut pairs = match form {
        Ok(Form(body)) => body,
        Err(FormRejection::InvalidFormContentType(_)) => Vec::new(),
        Err(e) => return Err(ApiError::Malformed(e.body_text())),
    };
    pairs.extend(from_query);
    Ok(Args::check(pairs, accepted)?)
}

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/health",
    tag = "service",
    responses((status = 200, description = "Service is up; reports its version"))
)]
pub async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Any method a path does not support.
pub async fn not_implemented() -> StatusCode {
    StatusCode::NOT_IMPLEMENTED
}

/// `GET /user[?id=N]` -- one user, or every user ordered by id.
#[utoipa::path(
    get,
    path = "/user",
    tag = "users",
    params(("id" = Option<u32>, Query, description = "User id; omit to list every user")),
    responses(
        (status = 200, description = "The user, or all users ordered by id", body = Vec<User>),
        (status = 400, description = "Unknown or malformed argument"),
        (status = 404, description = "No such user"),
    )
)]
pub async fn get_user(
    State(state): State<AppState>,
    query: Result<Query<Pairs>, QueryRejection>,
) -> Result<Response, ApiError> {
    let args = query_args(query, &[Param::optional("id")])?;
    match args.get_opt::<UserId>("id")? {
        Some(id) => Ok(Json(state.store.find_user(id)?).into_response()),
        None => {
            let users: Vec<User> = state.store.list_users();
            Ok(Json(users).into_response())
        }
    }
}

/// `POST /user` with `name`.
#[utoipa::path(
    post,
    path = "/user",
    tag = "users",
    request_body(content = NewUserForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Id of the new user", body = Created),
        (status = 400, description = "Missing, empty or unknown argument"),
    )
)]
pub async fn create_user(
    State(state): State<AppState>,
    query: Result<Query<Pairs>, QueryRejection>,
    form: Result<Form<Pairs>, FormRejection>,
) -> Result<Json<Created>, ApiError> {
    let args = form_args(query, form, &[Param::required("name")])?;
    let name: String = args.get("name")?;
    let id = state.store.create_user(&name);
    info!("created user {} ({})", id, name);
    Ok(Json(Created { id: id.0 }))
}

/// `GET /meeting[?id=N]` -- one meeting, or every meeting ordered by id.
#[utoipa::path(
    get,
    path = "/meeting",
    tag = "meetings",
    params(("id" = Option<u32>, Query, description = "Meeting id; omit to list every meeting")),
    responses(
        (status = 200, description = "The meeting, or all meetings ordered by id", body = Vec<Meeting>),
        (status = 400, description = "Unknown or malformed argument"),
        (status = 404, description = "No such meeting"),
    )
)]
pub async fn get_meeting(
    State(state): State<AppState>,
    query: Result<Query<Pairs>, QueryRejection>,
) -> Result<Response, ApiError> {
    let args = query_args(query, &[Param::optional("id")])?;
    match args.get_opt::<MeetingId>("id")? {
        Some(id) => Ok(Json(state.store.find_meeting(id)?).into_response()),
        None => {
            let meetings: Vec<Meeting> = state.store.all_meetings();
            Ok(Json(meetings).into_response())
        }
    }
}

/// `POST /meeting` with `creator_id`, `member_ids`, `start_at`, `duration`
/// and an optional `period` (defaults to `Once`).
#[utoipa::path(
    post,
    path = "/meeting",
    tag = "meetings",
    request_body(content = NewMeetingForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Id of the new meeting", body = Created),
        (status = 400, description = "Malformed argument or negative duration"),
        (status = 404, description = "Creator or a member does not exist"),
    )
)]
pub async fn create_meeting(
    State(state): State<AppState>,
    query: Result<Query<Pairs>, QueryRejection>,
    form: Result<Form<Pairs>, FormRejection>,
) -> Result<Json<Created>, ApiError> {
    let args = form_args(
        query,
        form,
        &[
            Param::required("creator_id"),
            Param::repeated("member_ids"),
            Param::required("start_at"),
            Param::required("duration"),
            Param::optional("period"),
        ],
    )?;
    let creator: UserId = args.get("creator_id")?;
    let members: Vec<UserId> = args.get_list("member_ids")?;
    let start_at = args.get_instant("start_at")?;
    let duration = args.get_signed_span("duration")?;
    let period: Period = args.get_opt("period")?.unwrap_or_default();

    let recurrence = RecurrenceDef::new(start_at, duration, period)?;
    let id = state.store.create_meeting(creator, &members, recurrence)?;
    info!(
        "created meeting {} by user {} ({} members, {})",
        id,
        creator,
        members.len(),
        period
    );
    Ok(Json(Created { id: id.0 }))
}

/// `PUT /response` with `user_id`, `meeting_id` and `presence`.
#[utoipa::path(
    put,
    path = "/response",
    tag = "meetings",
    request_body(content = PresenceForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Response recorded"),
        (status = 400, description = "Malformed argument or unknown presence"),
        (status = 404, description = "No such meeting, or the user is not a member"),
    )
)]
pub async fn put_response(
    State(state): State<AppState>,
    query: Result<Query<Pairs>, QueryRejection>,
    form: Result<Form<Pairs>, FormRejection>,
) -> Result<StatusCode, ApiError> {
    let args = form_args(
        query,
        form,
        &[
            Param::required("user_id"),
            Param::required("meeting_id"),
            Param::required("presence"),
        ],
    )?;
    let user: UserId = args.get("user_id")?;
    let meeting: MeetingId = args.get("meeting_id")?;
    let presence: Presence = args.get("presence")?;

    state.store.set_presence(meeting, user, presence)?;
    info!("user {} answered {} to meeting {}", user, presence, meeting);
    Ok(StatusCode::OK)
}

/// `GET /user_meetings?id=N&start_at=T&duration=D` -- ids of the user's
/// meetings occurring in the window.
#[utoipa::path(
    get,
    path = "/user_meetings",
    tag = "meetings",
    params(
        ("id" = u32, Query, description = "User id"),
        ("start_at" = String, Query, description = "Window start, RFC 3339"),
        ("duration" = String, Query, description = "Window length such as `1h2m3s`"),
    ),
    responses(
        (status = 200, description = "Ids of the meetings occurring in the window", body = Vec<MeetingId>),
        (status = 400, description = "Malformed argument or negative duration"),
        (status = 404, description = "No such user"),
    )
)]
pub async fn get_user_meetings(
    State(state): State<AppState>,
    query: Result<Query<Pairs>, QueryRejection>,
) -> Result<Json<Vec<MeetingId>>, ApiError> {
    let args = query_args(
        query,
        &[
            Param::required("id"),
            Param::required("start_at"),
            Param::required("duration"),
        ],
    )?;
    let user: UserId = args.get("id")?;
    let start_at = args.get_instant("start_at")?;
    let duration = args.get_span("duration")?;

    let meetings = state.store.user_meetings(user)?;
    let ids = meetings_in_window(&meetings, start_at, duration);
    debug!(
        "user {} has {} of {} meetings in [{}, +{})",
        user,
        ids.len(),
        meetings.len(),
        start_at,
        duration
    );
    Ok(Json(ids))
}

/// `GET /find_free_time?id=1,2,3&start_at=T&duration=D` -- earliest instant at
/// or after `start_at` when all users are free for `duration`.
#[utoipa::path(
    get,
    path = "/find_free_time",
    tag = "meetings",
    params(
        ("id" = String, Query, description = "User ids separated with commas; may repeat"),
        ("start_at" = String, Query, description = "Earliest acceptable start, RFC 3339"),
        ("duration" = String, Query, description = "Slot length such as `1h30m`"),
    ),
    responses(
        (status = 200, description = "Start of the earliest common free slot, RFC 3339", body = String),
        (status = 400, description = "Malformed argument or negative duration"),
        (status = 404, description = "A user does not exist, or no slot within the search horizon"),
    )
)]
pub async fn find_free_time(
    State(state): State<AppState>,
    query: Result<Query<Pairs>, QueryRejection>,
) -> Result<Json<DateTime<Utc>>, ApiError> {
    let args = query_args(
        query,
        &[
            Param::repeated("id"),
            Param::required("start_at"),
            Param::required("duration"),
        ],
    )?;
    let users: Vec<UserId> = args.get_list("id")?;
    let start_at = args.get_instant("start_at")?;
    let slot = args.get_span("duration")?;

    let meetings = state.store.users_meetings(&users)?;
    let found = find_free_slot(&meetings, start_at, slot, &state.limits)?;
    debug!(
        "free slot for {} users after {}: {}",
        users.len(),
        start_at,
        found
    );
    Ok(Json(found))
}
