//! Teacher invite models and DTOs.
//!
//! An invite is created by a school admin, delivered by email as a short
//! code, and redeemed once by the invitee to create a teacher account.
//!
//! Only `pending`, `accepted` and `cancelled` are ever stored. Whether an
//! invite has expired is computed from `expires_at` at read time, see
//! [`InviteRecord::is_expired`] and [`InviteRecord::effective_status`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::ids::{InviteId, SchoolId, UserId};
use crate::value_types::Email;

/// Stored invite status. Transitions are one-way:
/// `Pending -> Accepted` or `Pending -> Cancelled`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "invite_status", rename_all = "snake_case")]
pub enum InviteStatus {
    Pending,
    Accepted,
    Cancelled,
}

impl InviteStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, InviteStatus::Pending)
    }

    /// Whether the state machine allows moving from `self` to `next`.
    pub fn can_transition_to(&self, next: InviteStatus) -> bool {
        matches!(
            (self, next),
            (InviteStatus::Pending, InviteStatus::Accepted)
                | (InviteStatus::Pending, InviteStatus::Cancelled)
        )
    }
}

/// Status as seen by readers: a pending invite past its expiry reads as `Expired`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum EffectiveStatus {
    Pending,
    Accepted,
    Cancelled,
    Expired,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct InviteRecord {
    pub id: InviteId,
    pub code: String,
    pub email: Email,
    pub first_name: String,
    pub last_name: String,
    pub subject: Option<String>,
    pub school_id: SchoolId,
    pub invited_by: Option<UserId>,
    pub status: InviteStatus,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub used_at: Option<DateTime<Utc>>,
    pub used_by_user_id: Option<UserId>,
}

impl InviteRecord {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    pub fn effective_status(&self, now: DateTime<Utc>) -> EffectiveStatus {
        match self.status {
            InviteStatus::Accepted => EffectiveStatus::Accepted,
            InviteStatus::Cancelled => EffectiveStatus::Cancelled,
            InviteStatus::Pending if self.is_expired(now) => EffectiveStatus::Expired,
            InviteStatus::Pending => EffectiveStatus::Pending,
        }
    }

    pub fn full_name(&self) -> String {
        if self.last_name.is_empty() {
            self.first_name.clone()
        } else {
            format!("{} {}", self.first_name, self.last_name)
        }
    }

    pub fn to_summary(&self, now: DateTime<Utc>) -> InviteSummary {
        InviteSummary {
            id: self.id,
            code: self.code.clone(),
            email: self.email.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            subject: self.subject.clone(),
            status: self.effective_status(now),
            created_at: self.created_at,
            expires_at: self.expires_at,
            used_at: self.used_at,
        }
    }
}

/// Body of `POST /api/admin/invites`.
///
/// The invitee's name may be given either as `firstName` + `lastName` or as
/// a single `name`, which is split at the first run of whitespace.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateInviteRequest {
    #[validate(email(message = "email must be a valid email address"))]
    pub email: String,
    #[validate(length(max = 200, message = "name must not exceed 200 characters"))]
    pub name: Option<String>,
    #[validate(length(max = 100, message = "firstName must not exceed 100 characters"))]
    pub first_name: Option<String>,
    #[validate(length(max = 100, message = "lastName must not exceed 100 characters"))]
    pub last_name: Option<String>,
    #[validate(length(max = 200, message = "subject must not exceed 200 characters"))]
    pub subject: Option<String>,
}

impl CreateInviteRequest {
    /// Resolves `(first_name, last_name)`, or `None` when no usable name was sent.
    pub fn resolve_names(&self) -> Option<(String, String)> {
        let first = non_blank(self.first_name.as_deref());
        let last = non_blank(self.last_name.as_deref());

        if let Some(first) = first {
            return Some((first.to_string(), last.unwrap_or_default().to_string()));
        }

        let full = non_blank(self.name.as_deref())?;
        match full.split_once(char::is_whitespace) {
            Some((first, rest)) => Some((first.to_string(), rest.trim().to_string())),
            None => Some((full.to_string(), String::new())),
        }
    }

    pub fn subject(&self) -> Option<String> {
        non_blank(self.subject.as_deref()).map(str::to_string)
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateInviteResponse {
    pub id: InviteId,
    pub code: String,
    /// Whether the invitation email was handed to the mail server. When
    /// `false` the code is still valid and can be shared manually.
    pub email_sent: bool,
    pub expires_at: DateTime<Utc>,
}

/// Admin-facing view of an invite.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InviteSummary {
    pub id: InviteId,
    pub code: String,
    pub email: Email,
    pub first_name: String,
    pub last_name: String,
    pub subject: Option<String>,
    pub status: EffectiveStatus,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub used_at: Option<DateTime<Utc>>,
}

/// Public projection returned when an invitee opens their invite link.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InviteDetails {
    pub email: Email,
    pub first_name: String,
    pub last_name: String,
    pub school_name: String,
    pub subject: Option<String>,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RedeemInviteRequest {
    #[validate(length(min = 1, message = "code is required"))]
    pub code: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RedeemInviteResponse {
    pub new_account_id: UserId,
}
