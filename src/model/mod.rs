//! Records shared by the service and the client
//!
//! Field names serialize as camelCase on the wire.

mod meeting;
mod status;
mod user;

pub use meeting::{
    CancelRequest, CreateMeetingRequest, MeetingDetail, MeetingId, MeetingRequest, StatusUpdate,
};
pub use status::{BadgeStyle, Decision, MeetingStatus, UnknownStatus};
pub use user::{
    LoginRequest, LoginResponse, MentorSummary, ProfileUpdate, RegisterRequest, Role,
    SchedulingLink, SessionIdentity, StudentProfile, UserId,
};
