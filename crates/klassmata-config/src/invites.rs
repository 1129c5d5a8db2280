//! Teacher invite configuration.
//!
//! # Environment Variables
//!
//! - `INVITE_TTL_DAYS`: days an invite stays redeemable (default: 7, clamped to 1..=365)
//! - `INVITE_EMAIL_TIMEOUT_SECS`: upper bound on a single invitation email
//!   dispatch (default: 10)

use std::time::Duration;

use crate::env_parse;

pub const MAX_INVITE_TTL_DAYS: i64 = 365;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InviteConfig {
    pub ttl_days: i64,
    pub email_timeout: Duration,
}

impl Default for InviteConfig {
    fn default() -> Self {
        Self {
            ttl_days: 7,
            email_timeout: Duration::from_secs(10),
        }
    }
}

fn clamp_ttl_days(days: i64) -> i64 {
    days.clamp(1, MAX_INVITE_TTL_DAYS)
}

impl InviteConfig {
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            ttl_days: clamp_ttl_days(env_parse("INVITE_TTL_DAYS", defaults.ttl_days)),
            email_timeout: Duration::from_secs(env_parse(
                "INVITE_EMAIL_TIMEOUT_SECS",
                defaults.email_timeout.as_secs(),
            )),
        }
    }
}
