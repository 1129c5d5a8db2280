//! # KlassMata Auth
//!
//! Session token types and JWT utilities.
//!
//! - [`claims`]: the claims carried by a session token
//! - [`jwt`]: token creation and verification
//!
//! The session token is an HS256 JWT issued by `POST /api/auth/login`. The
//! access middleware decodes it on every request and decides from the role
//! claim whether the caller may reach the requested path.
//!
//! # Example
//!
//! ```ignore
//! use klassmata_auth::{create_access_token, verify_token};
//! use klassmata_config::JwtConfig;
//!
//! let config = JwtConfig::from_env();
//! let token = create_access_token(user_id, &email, Role::Admin, Some(school_id), &config)?;
//! let claims = verify_token(&token, &config)?;
//! ```

pub mod claims;
pub mod jwt;

// Re-export commonly used types at crate root
pub use claims::Claims;
pub use jwt::{create_access_token, verify_token};
