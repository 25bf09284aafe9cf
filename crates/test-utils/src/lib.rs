//! # Mock Provider

pub mod issuer;

pub use issuer::Issuer;
