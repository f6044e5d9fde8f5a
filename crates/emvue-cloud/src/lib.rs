//! emvue-cloud - Cloud backend for the Emporia Vue client.
//!
//! Provides the production [`CloudSession`]: a credential manager over the
//! vendor identity provider plus a resilient dispatcher that handles token
//! expiry, 401 remediation, and retry with exponential backoff.

pub mod identity;
pub mod maintenance;
pub mod session;
pub mod token;

pub use identity::IdentityClient;
pub use session::{CloudConfig, CloudSession};

/// Production API root.
pub const API_ROOT: &str = "https://api.emporiaenergy.com";
