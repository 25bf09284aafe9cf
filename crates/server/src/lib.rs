//! # Unicred Server
//!
//! An HTTP issuer of university credentials using the `OpenID4VCI`
//! pre-authorized code flow.

pub mod config;
pub mod http;
pub mod provider;
pub mod router;

pub use self::config::Config;
pub use self::provider::{HttpRegistrar, IssuerProvider};
pub use self::router::{AppState, router};
