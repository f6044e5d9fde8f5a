//! Simulated session implementation.

use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use http::{HeaderValue, Method, StatusCode};
use tracing::{debug, instrument};

use emvue_core::{ApiRequest, ApiResponse, ApiSession, ApiUrl, Result, TokenSet};

const AUTHTOKEN_HEADER: &str = "authtoken";
const SIMULATOR_TOKEN: &str = "simulator";
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_millis(6_030);
const DEFAULT_READ_TIMEOUT: Duration = Duration::from_millis(10_030);

/// Session against a local simulator.
///
/// Models a trustworthy local service: there is no real credential to
/// acquire or to expire, so `authenticate` hands back a fixed marker token
/// and `dispatch` issues each call exactly once — with a single 401
/// remediation cycle, and no backoff loop.
#[derive(Clone)]
pub struct SimulatedSession {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    api: ApiUrl,
    http: reqwest::Client,
    username: Option<String>,
    read_timeout: Duration,
    tokens: RwLock<TokenSet>,
}

impl SimulatedSession {
    /// Create a session against the given simulator URL.
    pub fn new(api: ApiUrl, username: Option<String>) -> Self {
        let http = reqwest::Client::builder()
            .user_agent(concat!("emvue/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
            .build()
            .expect("failed to build HTTP client");

        Self {
            inner: Arc::new(SessionInner {
                api,
                http,
                username: username.map(|name| name.to_lowercase()),
                read_timeout: DEFAULT_READ_TIMEOUT,
                tokens: RwLock::new(Self::simulator_tokens()),
            }),
        }
    }

    /// Returns the simulator URL this session talks to.
    pub fn api(&self) -> &ApiUrl {
        &self.inner.api
    }

    fn simulator_tokens() -> TokenSet {
        TokenSet {
            id_token: Some(SIMULATOR_TOKEN.to_string()),
            ..TokenSet::default()
        }
    }

    async fn send_once(
        &self,
        method: &Method,
        path: &str,
        request: &ApiRequest,
    ) -> Result<ApiResponse> {
        let url = self.inner.api.endpoint(path);

        let mut headers = request.headers().clone();
        let id_token = self
            .inner
            .tokens
            .read()
            .unwrap()
            .id_token
            .clone()
            .unwrap_or_default();
        headers.insert(
            AUTHTOKEN_HEADER,
            HeaderValue::from_str(&id_token).expect("invalid token characters"),
        );

        let mut builder = self
            .inner
            .http
            .request(method.clone(), url)
            .headers(headers)
            .timeout(self.inner.read_timeout);
        if let Some(body) = request.body() {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;
        Ok(ApiResponse::new(status, bytes))
    }
}

#[async_trait]
impl ApiSession for SimulatedSession {
    async fn authenticate(&self) -> Result<TokenSet> {
        let tokens = Self::simulator_tokens();
        *self.inner.tokens.write().unwrap() = tokens.clone();
        Ok(tokens)
    }

    fn tokens(&self) -> TokenSet {
        self.inner.tokens.read().unwrap().clone()
    }

    fn username(&self) -> String {
        self.inner
            .username
            .clone()
            .unwrap_or_else(|| SIMULATOR_TOKEN.to_string())
    }

    #[instrument(skip_all, fields(%method, path))]
    async fn dispatch(
        &self,
        method: Method,
        path: &str,
        request: ApiRequest,
    ) -> Result<ApiResponse> {
        let mut response = self.send_once(&method, path, &request).await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            debug!(path, "401 from simulator, re-authenticating");
            self.authenticate().await?;
            response = self.send_once(&method, path, &request).await?;
        }

        Ok(response)
    }
}

impl std::fmt::Debug for SimulatedSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimulatedSession")
            .field("api", &self.inner.api)
            .field("username", &self.inner.username)
            .finish()
    }
}
