//! # KlassMata Config
//!
//! Configuration structures loaded from environment variables:
//!
//! - [`jwt`]: session token signing configuration
//! - [`cors`]: CORS (Cross-Origin Resource Sharing) configuration
//! - [`email`]: SMTP configuration for outgoing mail
//! - [`invites`]: teacher invite lifetime and mail dispatch limits
//! - [`server`]: listen address and store backend selection
//!
//! # Example
//!
//! ```ignore
//! use klassmata_config::{EmailConfig, InviteConfig, JwtConfig};
//!
//! let jwt_config = JwtConfig::from_env();
//! let email_config = EmailConfig::from_env();
//! let invite_config = InviteConfig::from_env();
//! ```

pub mod cors;
pub mod email;
pub mod invites;
pub mod jwt;
pub mod server;

// Re-export commonly used types at crate root
pub use cors::CorsConfig;
pub use email::EmailConfig;
pub use invites::InviteConfig;
pub use jwt::JwtConfig;
pub use server::{ServerConfig, StoreBackend};

pub(crate) fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}
