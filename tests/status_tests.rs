use chrono::{TimeZone, Utc};
use mentor_connect::client::{filter_by_status, search_mentors, status_counts, StatusFilter};
use mentor_connect::model::{BadgeStyle, Decision, MeetingRequest, MeetingStatus, MentorSummary};

fn meeting(id: u64, status: MeetingStatus) -> MeetingRequest {
    MeetingRequest {
        id,
        student_id: 1,
        mentor_id: 2,
        skills: vec!["Rust".to_string()],
        question: format!("Question {}", id),
        status,
        request_date: Utc.with_ymd_and_hms(2025, 3, 1, 10, 0, 0).unwrap() + chrono::Duration::minutes(id as i64),
        is_scheduled: false,
    }
}

fn mentor(id: u64, name: &str, skills: &[&str]) -> MentorSummary {
    MentorSummary {
        id,
        name: name.to_string(),
        email: format!("{}@alumni.example", name.to_lowercase()),
        phone: None,
        skills: skills.iter().map(|s| s.to_string()).collect(),
    }
}

fn sample() -> Vec<MeetingRequest> {
    vec![
        meeting(1, MeetingStatus::Pending),
        meeting(2, MeetingStatus::Approved),
        meeting(3, MeetingStatus::Pending),
        meeting(4, MeetingStatus::Rejected),
        meeting(5, MeetingStatus::Completed),
    ]
}

#[test]
fn test_filter_all_returns_list_unchanged() {
    let list = sample();
    assert_eq!(filter_by_status(&list, "all"), list);
    assert_eq!(filter_by_status(&list, "ALL"), list);
}

#[test]
fn test_filter_is_case_insensitive_and_keeps_order() {
    let list = sample();
    let pending = filter_by_status(&list, "pending");

    let ids: Vec<u64> = pending.iter().map(|m| m.id).collect();
    assert_eq!(ids, vec![1, 3]);
    assert!(pending.iter().all(|m| m.status == MeetingStatus::Pending));
    assert_eq!(filter_by_status(&list, "Pending"), pending);
}

#[test]
fn test_filter_partitions_the_list() {
    let list = sample();
    let total: usize = MeetingStatus::ALL
        .iter()
        .map(|s| filter_by_status(&list, s.as_str()).len())
        .sum();
    assert_eq!(total, list.len());
}

#[test]
fn test_filter_unknown_status_matches_nothing() {
    assert!(filter_by_status(&sample(), "scheduled").is_empty());
}

#[test]
fn test_filter_does_not_trim_its_argument() {
    let list = sample();
    assert!(filter_by_status(&list, " pending ").is_empty());
    assert!(filter_by_status(&list, "pending\n").is_empty());
    assert!(filter_by_status(&list, " all").is_empty());
}

#[test]
fn test_status_filter_parse_and_apply() {
    let filter: StatusFilter = "approved".parse().unwrap();
    assert_eq!(filter, StatusFilter::Only(MeetingStatus::Approved));
    assert_eq!(filter.to_string(), "approved");
    assert_eq!(filter.apply(&sample()).len(), 1);

    let all: StatusFilter = "All".parse().unwrap();
    assert_eq!(all, StatusFilter::All);
    assert_eq!(all.apply(&sample()).len(), 5);

    assert!("later".parse::<StatusFilter>().is_err());
}

#[test]
fn test_status_counts_in_lifecycle_order() {
    let counts = status_counts(&sample());
    assert_eq!(
        counts,
        vec![
            (MeetingStatus::Pending, 2),
            (MeetingStatus::Approved, 1),
            (MeetingStatus::Rejected, 1),
            (MeetingStatus::Completed, 1),
            (MeetingStatus::Cancelled, 0),
        ]
    );
}

#[test]
fn test_badge_mapping() {
    assert_eq!(MeetingStatus::Pending.badge(), BadgeStyle::Warning);
    assert_eq!(MeetingStatus::Approved.badge(), BadgeStyle::Success);
    assert_eq!(MeetingStatus::Rejected.badge(), BadgeStyle::Danger);
    assert_eq!(MeetingStatus::Completed.badge(), BadgeStyle::Primary);
    assert_eq!(MeetingStatus::Cancelled.badge(), BadgeStyle::Secondary);
    assert_eq!(
        MeetingStatus::Pending.badge().css_class(),
        "badge bg-warning text-dark"
    );
}

#[test]
fn test_allowed_transitions() {
    use MeetingStatus::*;

    assert!(Pending.can_transition_to(Approved));
    assert!(Pending.can_transition_to(Rejected));
    assert!(Pending.can_transition_to(Cancelled));
    assert!(Approved.can_transition_to(Completed));
    assert!(Approved.can_transition_to(Cancelled));

    assert!(!Pending.can_transition_to(Completed));
    assert!(!Approved.can_transition_to(Rejected));
    assert!(!Rejected.can_transition_to(Approved));
    assert!(!Completed.can_transition_to(Cancelled));
    for status in MeetingStatus::ALL {
        assert!(!status.can_transition_to(status));
    }
}

#[test]
fn test_status_wire_format() {
    let m = meeting(7, MeetingStatus::Approved);
    let json = serde_json::to_string(&m).unwrap();
    assert!(json.contains("\"status\":\"APPROVED\""));
    assert!(json.contains("\"studentId\":1"));
    assert!(json.contains("\"isScheduled\":false"));

    let err = serde_json::from_str::<MeetingStatus>("\"SCHEDULED\"");
    assert!(err.is_err());
}

#[test]
fn test_decision_targets() {
    assert_eq!(Decision::Accept.target_status(), MeetingStatus::Approved);
    assert_eq!(Decision::Reject.target_status(), MeetingStatus::Rejected);
    assert_eq!("approve".parse::<Decision>(), Ok(Decision::Accept));
    assert!("maybe".parse::<Decision>().is_err());
}

#[test]
fn test_search_mentors_by_skill_substring() {
    let mentors = vec![
        mentor(1, "Ana", &["Java", "Spring"]),
        mentor(2, "Ben", &["React"]),
        mentor(3, "Cy", &["JavaScript"]),
    ];

    let found = search_mentors(&mentors, "java");
    let names: Vec<&str> = found.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names, vec!["Ana", "Cy"]);
}

#[test]
fn test_search_mentors_blank_term_keeps_everyone() {
    let mentors = vec![mentor(1, "Ana", &["Java"]), mentor(2, "Ben", &[])];
    assert_eq!(search_mentors(&mentors, "").len(), 2);
    assert_eq!(search_mentors(&mentors, "   ").len(), 2);
    assert!(search_mentors(&mentors, "go").is_empty());
}
