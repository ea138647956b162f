use super::auth::AuthUser;
use super::state::AppState;
use crate::error::{ApiError, ApiResult};
use crate::model::{
    CancelRequest, CreateMeetingRequest, LoginRequest, LoginResponse, MeetingDetail, MeetingId,
    MeetingRequest, MentorSummary, ProfileUpdate, RegisterRequest, Role, SchedulingLink,
    StatusUpdate, StudentProfile, UserId,
};
use crate::store::{hash_password_blocking, verify_password_blocking};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use axum_extra::extract::WithRejection;
use chrono::Utc;
use tracing::{info, warn};

/// JSON body whose rejection is reported as an `ApiError`
type ApiJson<T> = WithRejection<Json<T>, ApiError>;

/// Path parameters whose rejection is reported as an `ApiError`
type ApiPath<T> = WithRejection<Path<T>, ApiError>;

// ============================================================================
// Students
// ============================================================================

/// POST /api/students
/// Register a student
pub async fn register_student(
    State(state): State<AppState>,
    WithRejection(Json(req), _): ApiJson<RegisterRequest>,
) -> ApiResult<impl IntoResponse> {
    state
        .directory
        .read()
        .await
        .check_registration(Role::Student, &req)?;
    let password_hash = hash_password_blocking(req.password.clone()).await?;

    let profile = state
        .directory
        .write()
        .await
        .register_student(req, password_hash)?;
    Ok((StatusCode::CREATED, Json(profile)))
}

/// POST /api/students/login
pub async fn login_student(
    State(state): State<AppState>,
    WithRejection(Json(req), _): ApiJson<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    login(&state, Role::Student, req).await
}

/// GET /api/students/:id
pub async fn get_student(
    State(state): State<AppState>,
    _user: AuthUser,
    WithRejection(Path(id), _): ApiPath<UserId>,
) -> ApiResult<Json<StudentProfile>> {
    let directory = state.directory.read().await;
    Ok(Json(directory.student(id)?))
}

/// PUT /api/students/:id
/// Partial profile update by the student themselves
pub async fn update_student(
    State(state): State<AppState>,
    user: AuthUser,
    WithRejection(Path(id), _): ApiPath<UserId>,
    WithRejection(Json(mut update), _): ApiJson<ProfileUpdate>,
) -> ApiResult<Json<StudentProfile>> {
    user.require(Role::Student, id)?;
    let password_hash = new_password_hash(&mut update).await?;
    let profile = state
        .directory
        .write()
        .await
        .update_student(id, update, password_hash)?;
    Ok(Json(profile))
}

// ============================================================================
// Mentors
// ============================================================================

/// POST /api/mentors
/// Register a mentor, optionally with an initial skill list
pub async fn register_mentor(
    State(state): State<AppState>,
    WithRejection(Json(req), _): ApiJson<RegisterRequest>,
) -> ApiResult<impl IntoResponse> {
    state
        .directory
        .read()
        .await
        .check_registration(Role::Mentor, &req)?;
    let password_hash = hash_password_blocking(req.password.clone()).await?;

    let summary = state
        .directory
        .write()
        .await
        .register_mentor(req, password_hash)?;
    Ok((StatusCode::CREATED, Json(summary)))
}

/// POST /api/mentors/login
pub async fn login_mentor(
    State(state): State<AppState>,
    WithRejection(Json(req), _): ApiJson<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    login(&state, Role::Mentor, req).await
}

/// GET /api/mentors
pub async fn list_mentors(State(state): State<AppState>) -> Json<Vec<MentorSummary>> {
    Json(state.directory.read().await.mentors())
}

/// GET /api/mentors/:id
pub async fn get_mentor(
    State(state): State<AppState>,
    WithRejection(Path(id), _): ApiPath<UserId>,
) -> ApiResult<Json<MentorSummary>> {
    Ok(Json(state.directory.read().await.mentor(id)?))
}

/// PUT /api/mentors/:id
pub async fn update_mentor(
    State(state): State<AppState>,
    user: AuthUser,
    WithRejection(Path(id), _): ApiPath<UserId>,
    WithRejection(Json(mut update), _): ApiJson<ProfileUpdate>,
) -> ApiResult<Json<MentorSummary>> {
    user.require(Role::Mentor, id)?;
    let password_hash = new_password_hash(&mut update).await?;
    let summary = state
        .directory
        .write()
        .await
        .update_mentor(id, update, password_hash)?;
    Ok(Json(summary))
}

/// GET /api/mentors/:id/skills
pub async fn get_mentor_skills(
    State(state): State<AppState>,
    WithRejection(Path(id), _): ApiPath<UserId>,
) -> ApiResult<Json<Vec<String>>> {
    Ok(Json(state.directory.read().await.mentor_skills(id)?))
}

/// POST /api/mentors/:id/skills
pub async fn add_mentor_skills(
    State(state): State<AppState>,
    user: AuthUser,
    WithRejection(Path(id), _): ApiPath<UserId>,
    WithRejection(Json(skills), _): ApiJson<Vec<String>>,
) -> ApiResult<Json<Vec<String>>> {
    user.require(Role::Mentor, id)?;
    let skills = state.directory.write().await.add_mentor_skills(id, skills)?;
    Ok(Json(skills))
}

/// DELETE /api/mentors/:id/skills/:skill
pub async fn remove_mentor_skill(
    State(state): State<AppState>,
    user: AuthUser,
    WithRejection(Path((id, skill)), _): ApiPath<(UserId, String)>,
) -> ApiResult<Json<Vec<String>>> {
    user.require(Role::Mentor, id)?;
    let skills = state.directory.write().await.remove_mentor_skill(id, &skill)?;
    Ok(Json(skills))
}

/// GET /api/mentors/:id/scheduling-link
/// Where a student books an approved meeting
pub async fn get_scheduling_link(
    State(state): State<AppState>,
    _user: AuthUser,
    WithRejection(Path(id), _): ApiPath<UserId>,
) -> ApiResult<Json<SchedulingLink>> {
    let link = state.directory.read().await.scheduling_link(id)?;
    Ok(Json(SchedulingLink { link }))
}

/// PUT /api/mentors/:id/scheduling-link
pub async fn set_scheduling_link(
    State(state): State<AppState>,
    user: AuthUser,
    WithRejection(Path(id), _): ApiPath<UserId>,
    WithRejection(Json(body), _): ApiJson<SchedulingLink>,
) -> ApiResult<StatusCode> {
    user.require(Role::Mentor, id)?;
    state
        .directory
        .write()
        .await
        .set_scheduling_link(id, body.link)?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/skills
pub async fn list_skills(State(state): State<AppState>) -> Json<Vec<String>> {
    Json(state.directory.read().await.skills())
}

// ============================================================================
// Meetings
// ============================================================================

/// POST /api/meetings
/// A student asks a mentor for a meeting on selected skills
pub async fn create_meeting(
    State(state): State<AppState>,
    user: AuthUser,
    WithRejection(Json(req), _): ApiJson<CreateMeetingRequest>,
) -> ApiResult<impl IntoResponse> {
    user.require(Role::Student, req.student_id)?;
    let meeting = state
        .directory
        .write()
        .await
        .create_meeting(req, Utc::now())?;
    Ok((StatusCode::CREATED, Json(meeting)))
}

/// GET /api/meetings/:id
pub async fn get_meeting(
    State(state): State<AppState>,
    user: AuthUser,
    WithRejection(Path(id), _): ApiPath<MeetingId>,
) -> ApiResult<Json<MeetingRequest>> {
    let directory = state.directory.read().await;
    let meeting = directory.meeting(id)?;

    if !user.is(Role::Student, meeting.student_id) && !user.is(Role::Mentor, meeting.mentor_id) {
        return Err(ApiError::Forbidden(
            "You can only view your own meetings".to_string(),
        ));
    }

    Ok(Json(meeting.clone()))
}

/// PUT /api/meetings/:id
/// Mentor accepts or rejects a request
pub async fn update_meeting_status(
    State(state): State<AppState>,
    user: AuthUser,
    WithRejection(Path(id), _): ApiPath<MeetingId>,
    WithRejection(Json(update), _): ApiJson<StatusUpdate>,
) -> ApiResult<Json<MeetingRequest>> {
    user.require(Role::Mentor, update.mentor_id)?;

    info!(
        "Mentor {} sets meeting {} to {}",
        update.mentor_id, id, update.status
    );

    let result = state
        .directory
        .write()
        .await
        .update_status(id, update.status, update.mentor_id);

    match result {
        Ok(meeting) => Ok(Json(meeting)),
        Err(e) => {
            warn!("Status update for meeting {} refused: {}", id, e);
            Err(e)
        }
    }
}

/// PUT /api/meetings/:id/cancel
pub async fn cancel_meeting(
    State(state): State<AppState>,
    user: AuthUser,
    WithRejection(Path(id), _): ApiPath<MeetingId>,
    WithRejection(Json(req), _): ApiJson<CancelRequest>,
) -> ApiResult<Json<MeetingRequest>> {
    user.require(req.user_type, req.user_id)?;
    let meeting = state
        .directory
        .write()
        .await
        .cancel_meeting(id, req.user_id, req.user_type)?;
    Ok(Json(meeting))
}

/// GET /api/meetings/student/:id/details
/// A student's requests with mentor details
pub async fn student_meeting_details(
    State(state): State<AppState>,
    user: AuthUser,
    WithRejection(Path(id), _): ApiPath<UserId>,
) -> ApiResult<Json<Vec<MeetingDetail>>> {
    user.require(Role::Student, id)?;
    Ok(Json(state.directory.read().await.meetings_for_student(id)))
}

/// GET /api/meetings/student/:id/upcoming
/// Pending and approved meetings, oldest first
pub async fn student_upcoming(
    State(state): State<AppState>,
    user: AuthUser,
    WithRejection(Path(id), _): ApiPath<UserId>,
) -> ApiResult<Json<Vec<MeetingRequest>>> {
    user.require(Role::Student, id)?;
    Ok(Json(state.directory.read().await.upcoming_for_student(id)))
}

/// GET /api/meetings/mentor/:id/requests
/// A mentor's incoming requests with student details
pub async fn mentor_meeting_requests(
    State(state): State<AppState>,
    user: AuthUser,
    WithRejection(Path(id), _): ApiPath<UserId>,
) -> ApiResult<Json<Vec<MeetingDetail>>> {
    user.require(Role::Mentor, id)?;
    Ok(Json(state.directory.read().await.meetings_for_mentor(id)))
}

/// GET /api/meetings/mentor/:id/pending
pub async fn mentor_pending(
    State(state): State<AppState>,
    user: AuthUser,
    WithRejection(Path(id), _): ApiPath<UserId>,
) -> ApiResult<Json<Vec<MeetingRequest>>> {
    user.require(Role::Mentor, id)?;
    Ok(Json(state.directory.read().await.pending_for_mentor(id)))
}

/// POST /api/logout
/// Revoke the caller's bearer token
pub async fn logout(State(state): State<AppState>, user: AuthUser) -> StatusCode {
    state.directory.write().await.revoke(&user.token);
    info!("{} {} logged out", user.identity.user_type, user.identity.id);
    StatusCode::NO_CONTENT
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// Verify the password off the lock, then take the write lock only to
/// record the token
async fn login(state: &AppState, role: Role, req: LoginRequest) -> ApiResult<Json<LoginResponse>> {
    let found = state.directory.read().await.credentials(role, &req.email);

    let verified = match found {
        Some((identity, hash)) => verify_password_blocking(req.password, hash)
            .await?
            .then_some(identity),
        None => None,
    };

    let Some(identity) = verified else {
        warn!("Failed {} login for {}", role, req.email);
        return Err(ApiError::BadRequest("Invalid email or password".to_string()));
    };

    let response = state
        .directory
        .write()
        .await
        .issue_token(identity, Utc::now());
    Ok(Json(response))
}

/// Take a new password out of `update` and hash it
async fn new_password_hash(update: &mut ProfileUpdate) -> ApiResult<Option<String>> {
    match update.password.take().filter(|p| !p.is_empty()) {
        Some(password) => Ok(Some(hash_password_blocking(password).await?)),
        None => Ok(None),
    }
}
