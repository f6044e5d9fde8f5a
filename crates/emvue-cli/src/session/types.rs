//! CLI session wrapper.

use async_trait::async_trait;
use http::Method;

use emvue_cloud::CloudSession;
use emvue_core::{ApiRequest, ApiResponse, ApiSession, Result, TokenSet};
use emvue_sim::SimulatedSession;

/// Session wrapper for CLI use: one command loop over either backend.
#[derive(Debug, Clone)]
pub enum CliSession {
    Cloud(CloudSession),
    Simulated(SimulatedSession),
}

#[async_trait]
impl ApiSession for CliSession {
    async fn authenticate(&self) -> Result<TokenSet> {
        match self {
            CliSession::Cloud(session) => session.authenticate().await,
            CliSession::Simulated(session) => session.authenticate().await,
        }
    }

    fn tokens(&self) -> TokenSet {
        match self {
            CliSession::Cloud(session) => session.tokens(),
            CliSession::Simulated(session) => session.tokens(),
        }
    }

    fn username(&self) -> String {
        match self {
            CliSession::Cloud(session) => session.username(),
            CliSession::Simulated(session) => session.username(),
        }
    }

    async fn dispatch(
        &self,
        method: Method,
        path: &str,
        request: ApiRequest,
    ) -> Result<ApiResponse> {
        match self {
            CliSession::Cloud(session) => session.dispatch(method, path, request).await,
            CliSession::Simulated(session) => session.dispatch(method, path, request).await,
        }
    }
}
