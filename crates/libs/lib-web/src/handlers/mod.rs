//! # HTTP Request Handlers
//!
//! Axum handlers organized by feature domain. Chat endpoints live in
//! [`crate::chat::handlers`].
//!
//! ## Handler Modules
//!
//! - **[`auth`]**: signup and login
//!   - `POST /api/auth/signup`
//!   - `POST /api/auth/login`
//!
//! - **[`profiles`]**: own and public profiles
//!   - `GET|PUT /api/profiles/me`
//!   - `GET /api/profiles/{user_id}`
//!
//! - **[`connections`]**: connection lifecycle and conversation overview
//!   - `POST /api/connections`
//!   - `GET /api/connections[?status=]`
//!   - `POST /api/connections/{id}/status`
//!   - `GET /api/conversations`
//!
//! - **[`mentors`]**: mentor search and recommendations
//!   - `POST /api/mentors/search`
//!   - `GET /api/mentors/recommendations`
//!
//! ## Handler Architecture
//!
//! Handlers take their dependencies from [`AppState`](crate::server::AppState) through
//! `FromRef` and the caller through the [`CurrentUser`](crate::middleware::CurrentUser)
//! extractor, and return `Result<T, AppError>`:
//!
//! ```rust,ignore
//! async fn handler(
//!     State(pool): State<DbPool>,
//!     user: CurrentUser,
//!     Json(payload): Json<RequestBody>,
//! ) -> Result<Json<Response>> {
//!     // ...
//! }
//! ```
//!
//! Errors render as `{"error": "...", "code": "..."}` with the status of the variant.

pub mod auth;
pub mod connections;
pub mod mentors;
pub mod profiles;
