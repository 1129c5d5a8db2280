//! # KlassMata Core
//!
//! Core types shared by every KlassMata crate:
//!
//! - [`errors`]: the application error type and its HTTP mapping
//! - [`password`]: bcrypt password hashing and verification
//!
//! # Example
//!
//! ```ignore
//! use klassmata_core::{AppError, hash_password};
//!
//! let error = AppError::not_found(anyhow::anyhow!("Invite not found"));
//! let hash = hash_password("longenough1")?;
//! ```

pub mod errors;
pub mod password;

// Re-export commonly used types at crate root
pub use errors::{AppError, ErrorResponse};
pub use password::{
    MIN_PASSWORD_LENGTH, hash_password, hash_password_async, verify_password, verify_password_async,
};
