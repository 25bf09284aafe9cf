//! # Core
//!
//! Request and response plumbing shared by the issuer crates, along with
//! `application/x-www-form-urlencoded` helpers.

pub mod api;
pub mod urlencode;
