use anyhow::Result;
use chrono::{Duration, Utc};
use mentor_connect::client::{
    load_mentors, search_mentors, ApiClient, ClientError, MeetingApi, MeetingDraft,
    MeetingWorkflow, MemorySessionStore, SessionContext,
};
use mentor_connect::model::{Decision, MeetingStatus, RegisterRequest, Role};
use mentor_connect::{create_router, AppState};
use tokio::net::TcpListener;

/// Start the service on an ephemeral port and return its base URL
async fn spawn_server() -> Result<String> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let app = create_router(AppState::default());

    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    Ok(format!("http://{}", addr))
}

fn registration(name: &str, email: &str, skills: &[&str]) -> RegisterRequest {
    RegisterRequest {
        name: name.to_string(),
        email: email.to_string(),
        phone: None,
        password: "secret".to_string(),
        skills: skills.iter().map(|s| s.to_string()).collect(),
    }
}

fn fresh_workflow(base_url: &str) -> Result<MeetingWorkflow<ApiClient>> {
    let session = SessionContext::new(MemorySessionStore::new(), Duration::hours(24));
    Ok(MeetingWorkflow::new(ApiClient::new(base_url)?, session))
}

#[tokio::test]
async fn test_end_to_end_request_and_approval() -> Result<()> {
    let base_url = spawn_server().await?;

    let api = ApiClient::new(&base_url)?;
    api.register(Role::Student, &registration("Maya", "maya@student.example", &[]))
        .await?;
    let mentor_id = api
        .register(
            Role::Mentor,
            &registration("Omar", "omar@alumni.example", &["Rust", "Databases"]),
        )
        .await?;
    api.register(
        Role::Mentor,
        &registration("Lena", "lena@alumni.example", &["Kubernetes"]),
    )
    .await?;

    // Student finds a mentor and asks for a meeting
    let mut student = fresh_workflow(&base_url)?;
    let now = Utc::now();
    student
        .login(Role::Student, "maya@student.example", "secret", now)
        .await?;

    let mentors = load_mentors(student.api()).await?;
    let found = search_mentors(&mentors, "rust");
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, mentor_id);

    let mut draft = MeetingDraft::new(&found[0]);
    draft.toggle_skill("Rust");
    draft.set_question("How should I structure my first crate?");
    let created = student.create_request(&mut draft, now).await?;
    assert_eq!(created.status, MeetingStatus::Pending);
    assert_eq!(
        student.notice(now).unwrap().message,
        "Meeting request sent successfully to Omar!"
    );

    // Mentor sees it and accepts
    let mut mentor = fresh_workflow(&base_url)?;
    mentor
        .login(Role::Mentor, "omar@alumni.example", "secret", now)
        .await?;
    let pending = mentor.list_requests(now).await?.len();
    assert_eq!(pending, 1);
    assert_eq!(
        mentor.requests()[0].counterpart_name(Role::Mentor),
        Some("Maya")
    );

    let status = mentor
        .resolve_request(created.id, Decision::Accept, now)
        .await?;
    assert_eq!(status, MeetingStatus::Approved);
    assert_eq!(mentor.filtered("approved").len(), 1);

    // Student reloads and sees the new status
    student.list_requests(now).await?;
    assert_eq!(student.filtered("APPROVED").len(), 1);
    assert_eq!(
        student.requests()[0].counterpart_name(Role::Student),
        Some("Omar")
    );

    // A second decision on the same request is refused by the server
    assert!(mentor
        .resolve_request(created.id, Decision::Reject, now)
        .await
        .is_err());
    assert_eq!(
        mentor.notice(now).unwrap().message,
        "Failed to reject meeting request. Please try again."
    );
    assert_eq!(mentor.requests()[0].status(), MeetingStatus::Approved);

    Ok(())
}

#[tokio::test]
async fn test_server_errors_surface_their_message() -> Result<()> {
    let base_url = spawn_server().await?;
    let api = ApiClient::new(&base_url)?;
    api.register(Role::Student, &registration("Maya", "maya@student.example", &[]))
        .await?;

    let err = api
        .register(Role::Student, &registration("Maya", "maya@student.example", &[]))
        .await
        .unwrap_err();
    match err {
        ClientError::Server { status, message } => {
            assert_eq!(status, 409);
            assert_eq!(
                message.as_deref(),
                Some("Student with this email already exists")
            );
        }
        other => panic!("unexpected error: {}", other),
    }

    let err = api
        .login(Role::Student, "maya@student.example", "wrong")
        .await
        .unwrap_err();
    assert_eq!(err.server_message(), Some("Invalid email or password"));
    Ok(())
}

#[tokio::test]
async fn test_revoked_token_expires_session() -> Result<()> {
    let base_url = spawn_server().await?;
    let api = ApiClient::new(&base_url)?;
    api.register(Role::Student, &registration("Maya", "maya@student.example", &[]))
        .await?;

    let store = MemorySessionStore::new();
    let session = SessionContext::new(store.clone(), Duration::hours(24));
    let mut workflow = MeetingWorkflow::new(ApiClient::new(&base_url)?, session);
    let now = Utc::now();
    workflow
        .login(Role::Student, "maya@student.example", "secret", now)
        .await?;

    // Revoke behind the workflow's back
    let token = workflow.session().current(now).unwrap().token;
    api.logout(&token).await?;

    assert!(matches!(
        workflow.list_requests(now).await,
        Err(ClientError::SessionExpired)
    ));
    assert!(workflow.identity(now).is_none());
    Ok(())
}

#[tokio::test]
async fn test_unreachable_server_is_a_network_error() -> Result<()> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    drop(listener);

    let api = ApiClient::new(format!("http://{}/", addr))?;
    assert_eq!(api.base_url(), format!("http://{}", addr));
    assert!(matches!(api.mentors().await, Err(ClientError::Network(_))));
    Ok(())
}

#[tokio::test]
async fn test_profile_reads_and_skill_removal() -> Result<()> {
    let base_url = spawn_server().await?;
    let api = ApiClient::new(&base_url)?;
    let student_id = api
        .register(Role::Student, &registration("Maya", "maya@student.example", &[]))
        .await?;
    let mentor_id = api
        .register(
            Role::Mentor,
            &registration("Omar", "omar@alumni.example", &["Rust", "Machine Learning"]),
        )
        .await?;

    let student = api
        .login(Role::Student, "maya@student.example", "secret")
        .await?;
    let profile = api.student(&student.token, student_id).await?;
    assert_eq!(profile.name, "Maya");
    assert_eq!(profile.email, "maya@student.example");

    let mentor = api
        .login(Role::Mentor, "omar@alumni.example", "secret")
        .await?;
    let remaining = api
        .remove_skill(&mentor.token, mentor_id, "Machine Learning")
        .await?;
    assert_eq!(remaining, vec!["Rust".to_string()]);
    assert_eq!(api.mentor_skills(mentor_id).await?, vec!["Rust".to_string()]);

    let err = api
        .remove_skill(&mentor.token, mentor_id, "Machine Learning")
        .await
        .unwrap_err();
    assert_eq!(err.server_message(), Some("Skill not found for this mentor"));

    // Only the mentor may edit their own skills
    assert!(api
        .remove_skill(&student.token, mentor_id, "Rust")
        .await
        .is_err());
    Ok(())
}
