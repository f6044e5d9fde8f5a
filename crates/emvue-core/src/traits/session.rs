//! Authenticated API session trait.

use async_trait::async_trait;
use http::Method;

use crate::request::{ApiRequest, ApiResponse};
use crate::tokens::TokenSet;
use crate::Result;

/// An authenticated session against the metering API.
///
/// This is the seam between the typed client and the backends: the cloud
/// session (credential manager plus resilient dispatcher) and the simulated
/// session (trivial credentials, single-shot dispatch) both implement it.
/// The two have materially different retry semantics, which is why this is
/// a trait over `{authenticate, dispatch}` rather than shared base
/// behavior.
#[async_trait]
pub trait ApiSession: Send + Sync {
    /// Obtain a fresh credential set from the identity provider and store
    /// it as the current snapshot.
    async fn authenticate(&self) -> Result<TokenSet>;

    /// Returns the latest credential snapshot, without side effects.
    fn tokens(&self) -> TokenSet;

    /// Returns the configured username, or a sentinel when none is set.
    fn username(&self) -> String;

    /// Issue one logical API call.
    ///
    /// Expiry handling, 401 remediation, and retries happen inside the
    /// implementation; by the time this returns, the response is a terminal
    /// outcome for this call.
    async fn dispatch(
        &self,
        method: Method,
        path: &str,
        request: ApiRequest,
    ) -> Result<ApiResponse>;

    /// Issue a GET with no extra headers or body.
    async fn get(&self, path: &str) -> Result<ApiResponse> {
        self.dispatch(Method::GET, path, ApiRequest::new()).await
    }

    /// Issue a PUT with a JSON body.
    async fn put_json(&self, path: &str, body: serde_json::Value) -> Result<ApiResponse> {
        self.dispatch(Method::PUT, path, ApiRequest::new().with_json(body))
            .await
    }
}
