//! emvue-core - Core types and traits for the Emporia Vue client.

pub mod client;
pub mod credentials;
pub mod error;
pub mod models;
pub mod request;
pub mod retry;
pub mod tokens;
pub mod traits;
pub mod types;

pub use client::Vue;
pub use credentials::Credentials;
pub use error::Error;
pub use request::{ApiRequest, ApiResponse};
pub use retry::RetryPolicy;
pub use tokens::TokenSet;
pub use traits::ApiSession;
pub use types::{ApiUrl, Scale, Unit};

/// Result type alias using the crate's Error type.
pub type Result<T> = std::result::Result<T, Error>;
