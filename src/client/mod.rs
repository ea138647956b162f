//! Client side of the mentorship service
//!
//! This module provides:
//! - `ApiClient`: typed HTTP calls behind the `MeetingApi` trait
//! - `SessionContext`: the injected login session with its 24h expiry
//! - `MeetingWorkflow`: list, create, resolve and filter meeting requests
//! - Mentor discovery by skill

mod api;
mod discovery;
mod error;
mod session;
mod workflow;

pub use api::{ApiClient, MeetingApi};
pub use discovery::{load_mentors, search_mentors};
pub use error::{ClientError, ClientResult};
pub use session::{
    is_expired, FileSessionStore, MemorySessionStore, SessionContext, SessionStore, StoredSession,
};
pub use workflow::{
    filter_by_status, status_counts, HasStatus, MeetingDraft, MeetingWorkflow, Notice, NoticeKind,
    StatusFilter, CREATE_FAILED, LIST_FAILED,
};
