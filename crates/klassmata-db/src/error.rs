use klassmata_core::AppError;
use thiserror::Error;

/// Uniform error type for every store backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("{0}")]
    Conflict(String),
    /// The invite exists and is pending but its expiry has passed.
    #[error("Invite has expired")]
    Expired,
    /// Another invite already uses the generated code.
    #[error("invite code already in use")]
    CodeTaken,
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl StoreError {
    pub fn conflict(message: impl Into<String>) -> Self {
        StoreError::Conflict(message.into())
    }

    pub fn already_used() -> Self {
        StoreError::conflict("Invite has already been used")
    }

    pub fn email_taken() -> Self {
        StoreError::conflict("An account with this email already exists")
    }

    /// Maps the store error onto the HTTP error taxonomy.
    pub fn into_app_error(self) -> AppError {
        match self {
            StoreError::NotFound(what) => AppError::not_found(anyhow::anyhow!("{} not found", what)),
            StoreError::Conflict(message) => AppError::conflict(anyhow::Error::msg(message)),
            StoreError::Expired => AppError::gone(anyhow::anyhow!("Invite has expired")),
            StoreError::CodeTaken => AppError::internal_error("Invite code collision"),
            StoreError::Database(e) => AppError::database(e),
        }
    }
}
