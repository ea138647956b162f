use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle tag of a meeting request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MeetingStatus {
    Pending,
    Approved,
    Rejected,
    Completed,
    Cancelled,
}

/// Display style of a status badge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BadgeStyle {
    Warning,
    Success,
    Danger,
    Primary,
    Secondary,
}

impl BadgeStyle {
    pub fn css_class(self) -> &'static str {
        match self {
            BadgeStyle::Warning => "badge bg-warning text-dark",
            BadgeStyle::Success => "badge bg-success",
            BadgeStyle::Danger => "badge bg-danger",
            BadgeStyle::Primary => "badge bg-primary",
            BadgeStyle::Secondary => "badge bg-secondary",
        }
    }
}

impl MeetingStatus {
    pub const ALL: [MeetingStatus; 5] = [
        MeetingStatus::Pending,
        MeetingStatus::Approved,
        MeetingStatus::Rejected,
        MeetingStatus::Completed,
        MeetingStatus::Cancelled,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            MeetingStatus::Pending => "PENDING",
            MeetingStatus::Approved => "APPROVED",
            MeetingStatus::Rejected => "REJECTED",
            MeetingStatus::Completed => "COMPLETED",
            MeetingStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn badge(self) -> BadgeStyle {
        match self {
            MeetingStatus::Pending => BadgeStyle::Warning,
            MeetingStatus::Approved => BadgeStyle::Success,
            MeetingStatus::Rejected => BadgeStyle::Danger,
            MeetingStatus::Completed => BadgeStyle::Primary,
            MeetingStatus::Cancelled => BadgeStyle::Secondary,
        }
    }

    /// Message shown to the student who sent the request
    pub fn student_message(self) -> &'static str {
        match self {
            MeetingStatus::Pending => "Your meeting request is pending approval",
            MeetingStatus::Approved => "Your meeting request has been approved!",
            MeetingStatus::Rejected => "Your meeting request has been rejected",
            MeetingStatus::Completed => "Meeting has been completed",
            MeetingStatus::Cancelled => "Meeting has been cancelled",
        }
    }

    /// Whether the lifecycle allows moving from `self` to `next`.
    ///
    /// PENDING may be approved, rejected or withdrawn; APPROVED may be
    /// completed or cancelled. Every other status is terminal.
    pub fn can_transition_to(self, next: MeetingStatus) -> bool {
        matches!(
            (self, next),
            (MeetingStatus::Pending, MeetingStatus::Approved)
                | (MeetingStatus::Pending, MeetingStatus::Rejected)
                | (MeetingStatus::Pending, MeetingStatus::Cancelled)
                | (MeetingStatus::Approved, MeetingStatus::Completed)
                | (MeetingStatus::Approved, MeetingStatus::Cancelled)
        )
    }

    pub fn is_terminal(self) -> bool {
        MeetingStatus::ALL
            .iter()
            .all(|next| !self.can_transition_to(*next))
    }
}

impl fmt::Display for MeetingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownStatus(pub String);

impl fmt::Display for UnknownStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown meeting status '{}'", self.0)
    }
}

impl std::error::Error for UnknownStatus {}

impl FromStr for MeetingStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_uppercase();
        MeetingStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == upper)
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}

/// Decision a mentor takes on a pending request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Accept,
    Reject,
}

impl Decision {
    pub fn target_status(self) -> MeetingStatus {
        match self {
            Decision::Accept => MeetingStatus::Approved,
            Decision::Reject => MeetingStatus::Rejected,
        }
    }

    pub fn verb(self) -> &'static str {
        match self {
            Decision::Accept => "accept",
            Decision::Reject => "reject",
        }
    }
}

impl FromStr for Decision {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "accept" | "approve" => Ok(Decision::Accept),
            "reject" => Ok(Decision::Reject),
            other => Err(format!("unknown decision '{}' (expected accept or reject)", other)),
        }
    }
}
