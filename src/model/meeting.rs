use super::status::MeetingStatus;
use super::user::{MentorSummary, Role, StudentProfile, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type MeetingId = u64;

/// A student's request to meet a mentor on specific skills
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeetingRequest {
    pub id: MeetingId,
    pub student_id: UserId,
    pub mentor_id: UserId,
    /// Selected skill tags, in the order the student picked them
    pub skills: Vec<String>,
    pub question: String,
    pub status: MeetingStatus,
    pub request_date: DateTime<Utc>,
    #[serde(default)]
    pub is_scheduled: bool,
}

/// A meeting together with the profile of the other participant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeetingDetail {
    pub meeting: MeetingRequest,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub student: Option<StudentProfile>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mentor: Option<MentorSummary>,
}

impl MeetingDetail {
    pub fn status(&self) -> MeetingStatus {
        self.meeting.status
    }

    /// Name of whoever sits on the other side of the meeting
    pub fn counterpart_name(&self, viewer: Role) -> Option<&str> {
        match viewer {
            Role::Student => self.mentor.as_ref().map(|m| m.name.as_str()),
            Role::Mentor => self.student.as_ref().map(|s| s.name.as_str()),
        }
    }
}

/// Body of `POST /api/meetings`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMeetingRequest {
    pub student_id: UserId,
    pub mentor_id: UserId,
    pub skills: Vec<String>,
    pub question: String,
}

/// Body of `PUT /api/meetings/{id}`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdate {
    pub status: MeetingStatus,
    pub mentor_id: UserId,
}

/// Body of `PUT /api/meetings/{id}/cancel`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelRequest {
    pub user_id: UserId,
    pub user_type: Role,
}
