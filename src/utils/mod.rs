//! Shared utilities.
//!
//! - [`email`]: the [`email::Mailer`] collaborator, SMTP delivery and the
//!   invitation template

pub mod email;
