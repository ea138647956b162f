use super::handlers;
use super::state::AppState;
use axum::{
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Students
        .route("/api/students", post(handlers::register_student))
        .route("/api/students/login", post(handlers::login_student))
        .route(
            "/api/students/:id",
            get(handlers::get_student).put(handlers::update_student),
        )
        // Mentors
        .route(
            "/api/mentors",
            get(handlers::list_mentors).post(handlers::register_mentor),
        )
        .route("/api/mentors/login", post(handlers::login_mentor))
        .route(
            "/api/mentors/:id",
            get(handlers::get_mentor).put(handlers::update_mentor),
        )
        .route(
            "/api/mentors/:id/skills",
            get(handlers::get_mentor_skills).post(handlers::add_mentor_skills),
        )
        .route(
            "/api/mentors/:id/skills/:skill",
            delete(handlers::remove_mentor_skill),
        )
        .route(
            "/api/mentors/:id/scheduling-link",
            get(handlers::get_scheduling_link).put(handlers::set_scheduling_link),
        )
        .route("/api/skills", get(handlers::list_skills))
        .route("/api/logout", post(handlers::logout))
        // Meeting requests
        .route("/api/meetings", post(handlers::create_meeting))
        .route(
            "/api/meetings/:id",
            get(handlers::get_meeting).put(handlers::update_meeting_status),
        )
        .route("/api/meetings/:id/cancel", put(handlers::cancel_meeting))
        .route(
            "/api/meetings/student/:id/details",
            get(handlers::student_meeting_details),
        )
        .route(
            "/api/meetings/student/:id/upcoming",
            get(handlers::student_upcoming),
        )
        .route(
            "/api/meetings/mentor/:id/requests",
            get(handlers::mentor_meeting_requests),
        )
        .route(
            "/api/meetings/mentor/:id/pending",
            get(handlers::mentor_pending),
        )
        // Request logging and browser access
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
