//! emvue-sim - Simulated backend for the Emporia Vue client.
//!
//! Provides two halves of a local development loop:
//!
//! - [`SimulatedSession`], an [`ApiSession`](emvue_core::ApiSession)
//!   implementation that skips real authentication and issues single-shot
//!   requests against a trusted local service.
//! - An in-memory simulator server (axum) reproducing the cloud API
//!   surface, embeddable in tests or run standalone via `emvue-simd`.

pub mod server;
pub mod session;
pub mod state;

pub use server::{router, SimulatorServer};
pub use session::SimulatedSession;
pub use state::{default_home, SimulatorState};
