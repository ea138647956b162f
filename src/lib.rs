pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod model;
pub mod store;

pub use client::{
    filter_by_status, search_mentors, ApiClient, ClientError, MeetingApi, MeetingWorkflow,
    SessionContext,
};
pub use config::Config;
pub use error::{ApiError, ApiResult};
pub use http::{create_router, AppState};
pub use model::{MeetingDetail, MeetingRequest, MeetingStatus, MentorSummary, Role};
pub use store::Directory;
