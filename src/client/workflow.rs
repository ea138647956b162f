use super::api::MeetingApi;
use super::error::{ClientError, ClientResult};
use super::session::{SessionContext, StoredSession};
use crate::model::{
    CancelRequest, CreateMeetingRequest, Decision, MeetingDetail, MeetingId, MeetingRequest,
    MeetingStatus, MentorSummary, Role, SessionIdentity, StatusUpdate, UserId,
};
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use tracing::{error, info, warn};

pub const LIST_FAILED: &str = "Failed to load meeting requests. Please try again.";
pub const CREATE_FAILED: &str = "Failed to send meeting request. Please try again.";

// ============================================================================
// Status filtering
// ============================================================================

/// Anything that carries a meeting status
pub trait HasStatus {
    fn status(&self) -> MeetingStatus;
}

impl HasStatus for MeetingRequest {
    fn status(&self) -> MeetingStatus {
        self.status
    }
}

impl HasStatus for MeetingDetail {
    fn status(&self) -> MeetingStatus {
        self.meeting.status
    }
}

/// Keep the elements whose status matches `status`.
///
/// `"all"` (any case) returns the list unchanged; anything else is upper-cased
/// as given, without trimming, and compared with the status name, so an
/// unknown value matches nothing.
pub fn filter_by_status<T: HasStatus + Clone>(list: &[T], status: &str) -> Vec<T> {
    if status.eq_ignore_ascii_case("all") {
        return list.to_vec();
    }

    let wanted = status.to_uppercase();
    list.iter()
        .filter(|item| item.status().as_str() == wanted)
        .cloned()
        .collect()
}

/// Typed form of the status filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Only(MeetingStatus),
}

impl StatusFilter {
    pub fn apply<T: HasStatus + Clone>(self, list: &[T]) -> Vec<T> {
        match self {
            StatusFilter::All => list.to_vec(),
            StatusFilter::Only(status) => filter_by_status(list, status.as_str()),
        }
    }
}

impl FromStr for StatusFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            return Ok(StatusFilter::All);
        }
        s.parse::<MeetingStatus>()
            .map(StatusFilter::Only)
            .map_err(|e| e.to_string())
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusFilter::All => f.write_str("all"),
            StatusFilter::Only(status) => write!(f, "{}", status.as_str().to_lowercase()),
        }
    }
}

/// How many elements sit in each status, in lifecycle order
pub fn status_counts<T: HasStatus>(list: &[T]) -> Vec<(MeetingStatus, usize)> {
    MeetingStatus::ALL
        .iter()
        .map(|status| (*status, list.iter().filter(|i| i.status() == *status).count()))
        .collect()
}

// ============================================================================
// Notices
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
}

impl NoticeKind {
    /// How long the notice stays up before clearing itself
    pub fn lifetime(self) -> Duration {
        match self {
            NoticeKind::Success => Duration::seconds(3),
            NoticeKind::Error => Duration::seconds(5),
        }
    }
}

/// A transient, dismissible message for the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
    pub shown_at: DateTime<Utc>,
}

impl Notice {
    pub fn success(message: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            kind: NoticeKind::Success,
            message: message.into(),
            shown_at: now,
        }
    }

    pub fn error(message: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            kind: NoticeKind::Error,
            message: message.into(),
            shown_at: now,
        }
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.shown_at + self.kind.lifetime()
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at()
    }
}

// ============================================================================
// Request draft
// ============================================================================

/// What a student fills in before asking a mentor for a meeting
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeetingDraft {
    pub mentor_id: UserId,
    pub mentor_name: String,
    /// Skills the mentor offers
    pub offered: Vec<String>,
    /// Skills picked so far, in picking order
    pub skills: Vec<String>,
    pub question: String,
}

impl MeetingDraft {
    pub fn new(mentor: &MentorSummary) -> Self {
        Self {
            mentor_id: mentor.id,
            mentor_name: mentor.name.clone(),
            offered: mentor.skills.clone(),
            skills: Vec::new(),
            question: String::new(),
        }
    }

    /// Select a skill, or deselect it if already picked
    pub fn toggle_skill(&mut self, skill: &str) {
        if let Some(pos) = self.skills.iter().position(|s| s == skill) {
            self.skills.remove(pos);
        } else {
            self.skills.push(skill.to_string());
        }
    }

    pub fn set_question(&mut self, question: impl Into<String>) {
        self.question = question.into();
    }

    pub fn clear(&mut self) {
        self.skills.clear();
        self.question.clear();
    }

    /// Local checks that must pass before anything is sent
    pub fn validate(&self) -> ClientResult<()> {
        if self.skills.is_empty() {
            return Err(ClientError::Validation(
                "Please select at least one skill.".to_string(),
            ));
        }
        if self.question.trim().is_empty() {
            return Err(ClientError::Validation(
                "Please enter your question.".to_string(),
            ));
        }
        Ok(())
    }
}

// ============================================================================
// Workflow
// ============================================================================

/// Client-side meeting-request workflow for whoever is logged in.
///
/// Holds the last fetched list, the last list error (so a caller can offer
/// "Try Again") and the current notice. Every operation reads the session
/// through the injected [`SessionContext`] at call time.
pub struct MeetingWorkflow<A: MeetingApi> {
    api: A,
    session: SessionContext,
    requests: Vec<MeetingDetail>,
    load_error: Option<String>,
    notice: Option<Notice>,
    scheduling_links: HashMap<UserId, Option<String>>,
}

impl<A: MeetingApi> MeetingWorkflow<A> {
    pub fn new(api: A, session: SessionContext) -> Self {
        Self {
            api,
            session,
            requests: Vec::new(),
            load_error: None,
            notice: None,
            scheduling_links: HashMap::new(),
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn session(&mut self) -> &mut SessionContext {
        &mut self.session
    }

    /// The logged-in identity; `None` also resets the view
    pub fn identity(&mut self, now: DateTime<Utc>) -> Option<SessionIdentity> {
        let identity = self.session.identity(now);
        if identity.is_none() {
            self.reset_view();
        }
        identity
    }

    pub fn requests(&self) -> &[MeetingDetail] {
        &self.requests
    }

    pub fn filtered(&self, status: &str) -> Vec<MeetingDetail> {
        filter_by_status(&self.requests, status)
    }

    pub fn load_error(&self) -> Option<&str> {
        self.load_error.as_deref()
    }

    /// The current notice, unless it has timed out
    pub fn notice(&mut self, now: DateTime<Utc>) -> Option<&Notice> {
        if self.notice.as_ref().is_some_and(|n| n.is_expired(now)) {
            self.notice = None;
        }
        self.notice.as_ref()
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    pub async fn login(
        &mut self,
        role: Role,
        email: &str,
        password: &str,
        now: DateTime<Utc>,
    ) -> ClientResult<SessionIdentity> {
        let response = self.api.login(role, email, password).await?;
        let session = self
            .session
            .login(&response, now)
            .map_err(ClientError::Storage)?;

        self.reset_view();
        Ok(session.identity)
    }

    /// Revoke the token on the server (best effort) and forget the session
    pub async fn logout(&mut self, now: DateTime<Utc>) -> ClientResult<()> {
        if let Some(session) = self.session.current(now) {
            if let Err(e) = self.api.logout(&session.token).await {
                warn!("Server-side logout failed: {}", e);
            }
        }

        self.reset_view();
        self.session.logout().map_err(ClientError::Storage)
    }

    /// Fetch every meeting of the logged-in identity, in backend order.
    ///
    /// On failure the previous list is kept and the error is remembered for
    /// [`load_error`](Self::load_error); nothing is retried.
    pub async fn list_requests(&mut self, now: DateTime<Utc>) -> ClientResult<&[MeetingDetail]> {
        let session = match self.require_session(now) {
            Ok(session) => session,
            Err(e) => {
                self.load_error = Some(e.to_string());
                return Err(e);
            }
        };

        let identity = &session.identity;
        match self
            .api
            .list_meetings(&session.token, identity.id, identity.user_type)
            .await
        {
            Ok(requests) => {
                info!(
                    "Loaded {} meeting(s) for {} {}",
                    requests.len(),
                    identity.user_type,
                    identity.id
                );
                self.requests = requests;
                self.load_error = None;
                Ok(&self.requests)
            }
            Err(e) => {
                error!("Failed to load meeting requests: {}", e);
                self.load_error = Some(e.user_message(LIST_FAILED));
                self.forget_session_if_expired(&e);
                Err(e)
            }
        }
    }

    /// The "Try Again" action after a failed load
    pub async fn retry(&mut self, now: DateTime<Utc>) -> ClientResult<&[MeetingDetail]> {
        self.list_requests(now).await
    }

    /// Send a student's draft to the mentor.
    ///
    /// The draft is validated first; an invalid draft never reaches the
    /// network. On success the draft is cleared.
    pub async fn create_request(
        &mut self,
        draft: &mut MeetingDraft,
        now: DateTime<Utc>,
    ) -> ClientResult<MeetingRequest> {
        if let Err(e) = draft.validate() {
            self.notice = Some(Notice::error(e.to_string(), now));
            return Err(e);
        }

        let session = self.require_role(Role::Student, "Only students can request meetings", now)?;

        let body = CreateMeetingRequest {
            student_id: session.identity.id,
            mentor_id: draft.mentor_id,
            skills: draft.skills.clone(),
            question: draft.question.trim().to_string(),
        };

        match self.api.create_meeting(&session.token, &body).await {
            Ok(meeting) => {
                info!("Meeting request {} sent to mentor {}", meeting.id, draft.mentor_id);
                self.notice = Some(Notice::success(
                    format!("Meeting request sent successfully to {}!", draft.mentor_name),
                    now,
                ));
                draft.clear();
                Ok(meeting)
            }
            Err(e) => {
                error!("Error sending meeting request: {}", e);
                self.notice = Some(Notice::error(e.user_message(CREATE_FAILED), now));
                self.forget_session_if_expired(&e);
                Err(e)
            }
        }
    }

    /// Mentor accepts or rejects a request.
    ///
    /// On success only the matching local record changes, and it takes the
    /// status the server answered with.
    pub async fn resolve_request(
        &mut self,
        meeting_id: MeetingId,
        decision: Decision,
        now: DateTime<Utc>,
    ) -> ClientResult<MeetingStatus> {
        let session =
            self.require_role(Role::Mentor, "Only mentors can respond to meeting requests", now)?;

        let update = StatusUpdate {
            status: decision.target_status(),
            mentor_id: session.identity.id,
        };

        match self.api.update_status(&session.token, meeting_id, &update).await {
            Ok(meeting) => {
                self.patch_status(meeting_id, meeting.status);
                self.notice = Some(Notice::success(
                    format!("Meeting request {}ed successfully!", decision.verb()),
                    now,
                ));
                Ok(meeting.status)
            }
            Err(e) => {
                error!("Error {}ing meeting request {}: {}", decision.verb(), meeting_id, e);
                let message = match &e {
                    ClientError::SessionExpired => e.to_string(),
                    _ => format!(
                        "Failed to {} meeting request. Please try again.",
                        decision.verb()
                    ),
                };
                self.notice = Some(Notice::error(message, now));
                self.forget_session_if_expired(&e);
                Err(e)
            }
        }
    }

    /// Either participant withdraws from a meeting
    pub async fn cancel_request(
        &mut self,
        meeting_id: MeetingId,
        now: DateTime<Utc>,
    ) -> ClientResult<MeetingStatus> {
        let session = self.require_action_session(now)?;

        let body = CancelRequest {
            user_id: session.identity.id,
            user_type: session.identity.user_type,
        };

        match self.api.cancel_meeting(&session.token, meeting_id, &body).await {
            Ok(meeting) => {
                self.patch_status(meeting_id, meeting.status);
                self.notice = Some(Notice::success("Meeting cancelled successfully", now));
                Ok(meeting.status)
            }
            Err(e) => {
                self.notice = Some(Notice::error(
                    e.user_message("Failed to cancel meeting. Please try again."),
                    now,
                ));
                self.forget_session_if_expired(&e);
                Err(e)
            }
        }
    }

    /// Where the student books an approved meeting; cached per mentor
    pub async fn scheduling_link(
        &mut self,
        mentor_id: UserId,
        now: DateTime<Utc>,
    ) -> ClientResult<Option<String>> {
        if let Some(link) = self.scheduling_links.get(&mentor_id) {
            return Ok(link.clone());
        }

        let session = self.require_session(now)?;
        let link = match self.api.scheduling_link(&session.token, mentor_id).await {
            Ok(link) => link,
            Err(e) => {
                self.forget_session_if_expired(&e);
                return Err(e);
            }
        };

        self.scheduling_links.insert(mentor_id, link.clone());
        Ok(link)
    }

    fn patch_status(&mut self, meeting_id: MeetingId, status: MeetingStatus) {
        for detail in self
            .requests
            .iter_mut()
            .filter(|d| d.meeting.id == meeting_id)
        {
            detail.meeting.status = status;
        }
    }

    fn require_session(&mut self, now: DateTime<Utc>) -> ClientResult<StoredSession> {
        match self.session.current(now) {
            Some(session) => Ok(session),
            None => {
                self.reset_view();
                Err(ClientError::SessionExpired)
            }
        }
    }

    /// Like `require_session`, for user actions: a missing session also
    /// raises an error notice
    fn require_action_session(&mut self, now: DateTime<Utc>) -> ClientResult<StoredSession> {
        self.require_session(now).map_err(|e| {
            self.notice = Some(Notice::error(e.to_string(), now));
            e
        })
    }

    fn require_role(
        &mut self,
        role: Role,
        refusal: &str,
        now: DateTime<Utc>,
    ) -> ClientResult<StoredSession> {
        let session = self.require_action_session(now)?;
        if session.identity.user_type != role {
            let e = ClientError::Validation(refusal.to_string());
            self.notice = Some(Notice::error(e.to_string(), now));
            return Err(e);
        }
        Ok(session)
    }

    fn forget_session_if_expired(&mut self, e: &ClientError) {
        if matches!(e, ClientError::SessionExpired) {
            warn!("Server rejected the session token, logging out");
            if let Err(e) = self.session.logout() {
                warn!("Failed to clear session: {:#}", e);
            }
            self.requests.clear();
        }
    }

    fn reset_view(&mut self) {
        self.requests.clear();
        self.load_error = None;
        self.scheduling_links.clear();
    }
}
