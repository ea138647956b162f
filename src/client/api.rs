use super::error::{ClientError, ClientResult};
use crate::model::{
    CancelRequest, CreateMeetingRequest, LoginRequest, LoginResponse, MeetingDetail, MeetingId,
    MeetingRequest, MentorSummary, ProfileUpdate, RegisterRequest, Role, SchedulingLink,
    StatusUpdate, StudentProfile, UserId,
};
use async_trait::async_trait;
use reqwest::{RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::{error, info};

/// The backend calls the meeting workflow depends on
#[async_trait]
pub trait MeetingApi: Send + Sync {
    async fn login(&self, role: Role, email: &str, password: &str) -> ClientResult<LoginResponse>;

    /// Revoke `token` on the server
    async fn logout(&self, token: &str) -> ClientResult<()>;

    async fn mentors(&self) -> ClientResult<Vec<MentorSummary>>;

    async fn mentor(&self, mentor_id: UserId) -> ClientResult<MentorSummary>;

    async fn mentor_skills(&self, mentor_id: UserId) -> ClientResult<Vec<String>>;

    async fn scheduling_link(&self, token: &str, mentor_id: UserId) -> ClientResult<Option<String>>;

    /// All meetings of `identity`, in the order the backend returns them
    async fn list_meetings(
        &self,
        token: &str,
        identity_id: UserId,
        role: Role,
    ) -> ClientResult<Vec<MeetingDetail>>;

    async fn create_meeting(
        &self,
        token: &str,
        req: &CreateMeetingRequest,
    ) -> ClientResult<MeetingRequest>;

    async fn update_status(
        &self,
        token: &str,
        meeting_id: MeetingId,
        update: &StatusUpdate,
    ) -> ClientResult<MeetingRequest>;

    async fn cancel_meeting(
        &self,
        token: &str,
        meeting_id: MeetingId,
        req: &CancelRequest,
    ) -> ClientResult<MeetingRequest>;
}

/// HTTP implementation of [`MeetingApi`] over reqwest
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(alias = "message")]
    error: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> ClientResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn register(&self, role: Role, req: &RegisterRequest) -> ClientResult<UserId> {
        match role {
            Role::Student => {
                let profile: StudentProfile =
                    send(self.http.post(self.url("/api/students")).json(req)).await?;
                Ok(profile.id)
            }
            Role::Mentor => {
                let summary: MentorSummary =
                    send(self.http.post(self.url("/api/mentors")).json(req)).await?;
                Ok(summary.id)
            }
        }
    }

    pub async fn update_student(
        &self,
        token: &str,
        id: UserId,
        update: &ProfileUpdate,
    ) -> ClientResult<StudentProfile> {
        let path = format!("/api/students/{}", id);
        send(self.http.put(self.url(&path)).bearer_auth(token).json(update)).await
    }

    pub async fn update_mentor(
        &self,
        token: &str,
        id: UserId,
        update: &ProfileUpdate,
    ) -> ClientResult<MentorSummary> {
        let path = format!("/api/mentors/{}", id);
        send(self.http.put(self.url(&path)).bearer_auth(token).json(update)).await
    }

    pub async fn add_skills(
        &self,
        token: &str,
        mentor_id: UserId,
        skills: &[String],
    ) -> ClientResult<Vec<String>> {
        let path = format!("/api/mentors/{}/skills", mentor_id);
        send(self.http.post(self.url(&path)).bearer_auth(token).json(skills)).await
    }

    pub async fn student(&self, token: &str, id: UserId) -> ClientResult<StudentProfile> {
        let path = format!("/api/students/{}", id);
        send(self.http.get(self.url(&path)).bearer_auth(token)).await
    }

    /// Drop one offered skill; the skill is sent as a single encoded path segment
    pub async fn remove_skill(
        &self,
        token: &str,
        mentor_id: UserId,
        skill: &str,
    ) -> ClientResult<Vec<String>> {
        let base = self.url(&format!("/api/mentors/{}/skills", mentor_id));
        let mut url = Url::parse(&base)
            .map_err(|e| ClientError::Validation(format!("Invalid service URL {}: {}", base, e)))?;
        url.path_segments_mut()
            .map_err(|_| ClientError::Validation(format!("Invalid service URL {}", base)))?
            .push(skill);

        send_list(self.http.delete(url).bearer_auth(token)).await
    }

    pub async fn set_scheduling_link(
        &self,
        token: &str,
        mentor_id: UserId,
        link: Option<String>,
    ) -> ClientResult<()> {
        let path = format!("/api/mentors/{}/scheduling-link", mentor_id);
        let response = self
            .http
            .put(self.url(&path))
            .bearer_auth(token)
            .json(&SchedulingLink { link })
            .send()
            .await?;
        check(response).await.map(|_| ())
    }
}

#[async_trait]
impl MeetingApi for ApiClient {
    async fn login(&self, role: Role, email: &str, password: &str) -> ClientResult<LoginResponse> {
        let path = match role {
            Role::Student => "/api/students/login",
            Role::Mentor => "/api/mentors/login",
        };
        let body = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };

        info!("Logging in as {} {}", role, email);
        send(self.http.post(self.url(path)).json(&body)).await
    }

    async fn logout(&self, token: &str) -> ClientResult<()> {
        let response = self
            .http
            .post(self.url("/api/logout"))
            .bearer_auth(token)
            .send()
            .await?;
        check(response).await.map(|_| ())
    }

    async fn mentors(&self) -> ClientResult<Vec<MentorSummary>> {
        send_list(self.http.get(self.url("/api/mentors"))).await
    }

    async fn mentor(&self, mentor_id: UserId) -> ClientResult<MentorSummary> {
        let path = format!("/api/mentors/{}", mentor_id);
        send(self.http.get(self.url(&path))).await
    }

    async fn mentor_skills(&self, mentor_id: UserId) -> ClientResult<Vec<String>> {
        let path = format!("/api/mentors/{}/skills", mentor_id);
        send_list(self.http.get(self.url(&path))).await
    }

    async fn scheduling_link(&self, token: &str, mentor_id: UserId) -> ClientResult<Option<String>> {
        let path = format!("/api/mentors/{}/scheduling-link", mentor_id);
        let body: SchedulingLink = send(self.http.get(self.url(&path)).bearer_auth(token)).await?;
        Ok(body.link)
    }

    async fn list_meetings(
        &self,
        token: &str,
        identity_id: UserId,
        role: Role,
    ) -> ClientResult<Vec<MeetingDetail>> {
        let path = match role {
            Role::Student => format!("/api/meetings/student/{}/details", identity_id),
            Role::Mentor => format!("/api/meetings/mentor/{}/requests", identity_id),
        };
        send_list(self.http.get(self.url(&path)).bearer_auth(token)).await
    }

    async fn create_meeting(
        &self,
        token: &str,
        req: &CreateMeetingRequest,
    ) -> ClientResult<MeetingRequest> {
        send(
            self.http
                .post(self.url("/api/meetings"))
                .bearer_auth(token)
                .json(req),
        )
        .await
    }

    async fn update_status(
        &self,
        token: &str,
        meeting_id: MeetingId,
        update: &StatusUpdate,
    ) -> ClientResult<MeetingRequest> {
        let path = format!("/api/meetings/{}", meeting_id);
        send(self.http.put(self.url(&path)).bearer_auth(token).json(update)).await
    }

    async fn cancel_meeting(
        &self,
        token: &str,
        meeting_id: MeetingId,
        req: &CancelRequest,
    ) -> ClientResult<MeetingRequest> {
        let path = format!("/api/meetings/{}/cancel", meeting_id);
        send(self.http.put(self.url(&path)).bearer_auth(token).json(req)).await
    }
}

async fn send<T: DeserializeOwned>(request: RequestBuilder) -> ClientResult<T> {
    let response = request.send().await?;
    let bytes = check(response).await?.bytes().await?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Like [`send`], but `204 No Content` means an empty list
async fn send_list<T: DeserializeOwned>(request: RequestBuilder) -> ClientResult<Vec<T>> {
    let response = check(request.send().await?).await?;
    if response.status() == StatusCode::NO_CONTENT {
        return Ok(Vec::new());
    }

    let bytes = response.bytes().await?;
    if bytes.is_empty() {
        return Ok(Vec::new());
    }
    Ok(serde_json::from_slice(&bytes)?)
}

/// Turn non-success statuses into [`ClientError`]s
async fn check(response: Response) -> ClientResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    if status == StatusCode::UNAUTHORIZED {
        return Err(ClientError::SessionExpired);
    }

    let body = response.text().await.unwrap_or_default();
    let message = match serde_json::from_str::<ErrorBody>(&body) {
        Ok(parsed) => Some(parsed.error),
        Err(_) if !body.trim().is_empty() && !body.trim_start().starts_with('{') => {
            Some(body.trim().to_string())
        }
        Err(_) => None,
    };

    error!("Request failed with {}: {:?}", status, message);
    Err(ClientError::Server {
        status: status.as_u16(),
        message,
    })
}
