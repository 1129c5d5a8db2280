//! # KlassMata Models
//!
//! Domain models and DTOs for the KlassMata API.
//!
//! # Modules
//!
//! - [`ids`]: strongly-typed UUID identifiers
//! - [`value_types`]: validated primitives such as [`Email`]
//! - [`roles`]: the five fixed user roles
//! - [`invites`]: teacher invite records, status and request/response DTOs
//! - [`users`]: user accounts, schools and login DTOs

pub mod ids;
pub mod invites;
pub mod roles;
pub mod users;
pub mod value_types;

pub use ids::{InviteId, SchoolId, UserId};
pub use invites::{
    CreateInviteRequest, CreateInviteResponse, EffectiveStatus, InviteDetails, InviteRecord,
    InviteStatus, InviteSummary, RedeemInviteRequest, RedeemInviteResponse,
};
pub use roles::Role;
pub use users::{LoginRequest, LoginResponse, NewUser, School, UserAccount, UserCredentials};
pub use value_types::{Email, ValueTypeError};
