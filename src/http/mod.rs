//! REST API for the mentorship service
//!
//! - POST /api/students, /api/mentors - Register
//! - POST /api/students/login, /api/mentors/login - Issue a bearer token
//! - GET /api/mentors, /api/mentors/:id/skills - Mentor discovery
//! - POST /api/meetings - Student requests a meeting
//! - PUT /api/meetings/:id - Mentor accepts or rejects
//! - GET /api/meetings/student/:id/details - Student's requests
//! - GET /api/meetings/mentor/:id/requests - Mentor's incoming requests
//! - GET /health - Health check

mod auth;
mod handlers;
mod routes;
mod state;

pub use auth::AuthUser;
pub use routes::create_router;
pub use state::AppState;
