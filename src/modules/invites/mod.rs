//! Teacher invite lifecycle: create, list, cancel, validate and redeem.

pub mod code;
pub mod controller;
pub mod router;
pub mod service;
