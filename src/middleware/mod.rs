//! Middleware and extractors for cross-cutting request concerns.
//!
//! # Modules
//!
//! - [`access`]: the role-based access gate run on every request
//! - [`auth`]: session token decoding and the [`auth::AuthUser`] extractor
//!
//! # Authentication Flow
//!
//! 1. Client sends `Authorization: Bearer <token>` or the `klassmata_session` cookie
//! 2. [`access::access_gate`] decodes the token and checks the path against the role table
//! 3. On allow, the session is stored in request extensions
//! 4. Handlers take `AuthUser` to receive the caller explicitly
//!
//! # Example
//!
//! ```ignore
//! use crate::middleware::auth::AuthUser;
//!
//! async fn list_invites(State(state): State<AppState>, auth_user: AuthUser) -> impl IntoResponse {
//!     state.invites.list_invites(&auth_user).await
//! }
//! ```

pub mod access;
pub mod auth;
