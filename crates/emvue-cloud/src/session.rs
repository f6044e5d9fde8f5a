//! Cloud session: credential lifecycle plus resilient dispatch.

use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use http::{HeaderValue, Method, StatusCode};
use tokio::time::sleep;
use tracing::{debug, info, instrument, warn};

use emvue_core::error::AuthError;
use emvue_core::{
    ApiRequest, ApiResponse, ApiSession, ApiUrl, Credentials, Error, Result, RetryPolicy, TokenSet,
};

use crate::identity::IdentityClient;
use crate::token;

/// Caller-supplied sink, invoked synchronously with the new snapshot after
/// every successful exchange. The session itself never touches storage.
pub type TokenSink = Box<dyn Fn(&TokenSet) + Send + Sync>;

const AUTHTOKEN_HEADER: &str = "authtoken";
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_millis(6_030);
const DEFAULT_READ_TIMEOUT: Duration = Duration::from_millis(10_030);

/// Configuration for a [`CloudSession`].
pub struct CloudConfig {
    api: ApiUrl,
    username: Option<String>,
    password: Option<String>,
    tokens: Option<TokenSet>,
    connect_timeout: Duration,
    read_timeout: Duration,
    retry: RetryPolicy,
    identity_endpoint: Option<(String, String)>,
    sink: Option<TokenSink>,
}

impl CloudConfig {
    /// Start a configuration against the given API root.
    pub fn new(api: ApiUrl) -> Self {
        Self {
            api,
            username: None,
            password: None,
            tokens: None,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            read_timeout: DEFAULT_READ_TIMEOUT,
            retry: RetryPolicy::default(),
            identity_endpoint: None,
            sink: None,
        }
    }

    /// Supply the principal. A password enables the password flow; without
    /// one the session can only renew via a stored refresh credential.
    pub fn credentials(mut self, credentials: Credentials) -> Self {
        self.username = Some(credentials.username().to_lowercase());
        self.password = credentials.password().map(str::to_owned);
        self
    }

    /// Restore a previously persisted credential set. Only a complete
    /// access/identity/refresh triple is usable; partial sets are ignored.
    pub fn tokens(mut self, tokens: TokenSet) -> Self {
        self.tokens = Some(tokens);
        self
    }

    /// Override the per-attempt connect and read timeouts.
    pub fn timeouts(mut self, connect: Duration, read: Duration) -> Self {
        self.connect_timeout = connect;
        self.read_timeout = read;
        self
    }

    /// Override the retry policy.
    pub fn retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Point the identity exchange at a different pool endpoint.
    pub fn identity_endpoint(
        mut self,
        endpoint: impl Into<String>,
        client_id: impl Into<String>,
    ) -> Self {
        self.identity_endpoint = Some((endpoint.into(), client_id.into()));
        self
    }

    /// Register the persistence sink for refreshed credentials.
    pub fn on_token_update(mut self, sink: impl Fn(&TokenSet) + Send + Sync + 'static) -> Self {
        self.sink = Some(Box::new(sink));
        self
    }
}

struct SessionInner {
    api: ApiUrl,
    http: reqwest::Client,
    identity: IdentityClient,
    username: Option<String>,
    read_timeout: Duration,
    retry: RetryPolicy,
    password: RwLock<Option<String>>,
    tokens: RwLock<TokenSet>,
    sink: Option<TokenSink>,
}

/// Authenticated session against the cloud API.
///
/// Owns the current credential snapshot, knows how to obtain a fresh one
/// (password exchange or stored refresh credential), and wraps every call
/// in the expiry pre-check / 401 remediation / backoff retry pipeline.
///
/// # Thread Safety
///
/// Sessions are cheap to clone (internal `Arc`) and safe to share across
/// tasks. Concurrent calls that both observe an expired credential will
/// each refresh on their own; the refresh is idempotent server-side and
/// the snapshot swap is atomic, so readers only ever see a prior or a new
/// set, never a torn one.
#[derive(Clone)]
pub struct CloudSession {
    inner: Arc<SessionInner>,
}

impl CloudSession {
    /// Build a session from configuration. No network traffic happens
    /// until the first authenticate or dispatch.
    pub fn new(config: CloudConfig) -> Self {
        let http = reqwest::Client::builder()
            .user_agent(concat!("emvue/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(config.connect_timeout)
            .build()
            .expect("failed to build HTTP client");

        let identity = match config.identity_endpoint {
            Some((endpoint, client_id)) => {
                IdentityClient::with_endpoint(http.clone(), endpoint, client_id)
            }
            None => IdentityClient::new(http.clone()),
        };

        let tokens = config
            .tokens
            .filter(TokenSet::is_complete)
            .unwrap_or_default();
        // A restored complete triple takes precedence; the password is only
        // kept when it is the sole way in, and is dropped again after the
        // first successful exchange.
        let password = if tokens.is_complete() {
            None
        } else {
            config.password
        };

        Self {
            inner: Arc::new(SessionInner {
                api: config.api,
                http,
                identity,
                username: config.username,
                read_timeout: config.read_timeout,
                retry: config.retry,
                password: RwLock::new(password),
                tokens: RwLock::new(tokens),
                sink: config.sink,
            }),
        }
    }

    /// Returns the API root this session talks to.
    pub fn api(&self) -> &ApiUrl {
        &self.inner.api
    }

    /// Store a new snapshot and notify the persistence sink.
    fn store(&self, tokens: TokenSet) -> TokenSet {
        *self.inner.tokens.write().unwrap() = tokens.clone();
        if let Some(sink) = &self.inner.sink {
            sink(&tokens);
        }
        tokens
    }

    /// Issue the request once, identity header attached.
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
        // Inserted after the caller's headers so it cannot be overridden.
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

    /// One attempt: a request plus at most one 401 remediation cycle.
    async fn attempt(
        &self,
        method: &Method,
        path: &str,
        request: &ApiRequest,
    ) -> Result<ApiResponse> {
        let mut response = self.send_once(method, path, request).await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            debug!(path, "401 from API, re-authenticating");
            self.authenticate().await?;
            response = self.send_once(method, path, request).await?;
        }

        Ok(response)
    }
}

#[async_trait]
impl ApiSession for CloudSession {
    #[instrument(skip(self), fields(username = %self.username()))]
    async fn authenticate(&self) -> Result<TokenSet> {
        let password = self.inner.password.read().unwrap().clone();

        if let Some(username) = self.inner.username.as_deref() {
            if let Some(password) = password {
                info!("Authenticating with password");
                let tokens = self.inner.identity.password_auth(username, &password).await?;
                // The plaintext secret must not outlive its first
                // successful exchange.
                *self.inner.password.write().unwrap() = None;
                debug!("Password exchange succeeded");
                return Ok(self.store(tokens));
            }

            let refresh_token = self.inner.tokens.read().unwrap().refresh_token.clone();
            if let Some(refresh_token) = refresh_token {
                info!("Refreshing session");
                let mut tokens = self.inner.identity.refresh_auth(&refresh_token).await?;
                if tokens.refresh_token.is_none() {
                    // The refresh flow does not rotate the refresh token.
                    tokens.refresh_token = Some(refresh_token);
                }
                debug!("Session refreshed successfully");
                return Ok(self.store(tokens));
            }
        }

        Err(AuthError::NotAuthenticated.into())
    }

    fn tokens(&self) -> TokenSet {
        self.inner.tokens.read().unwrap().clone()
    }

    fn username(&self) -> String {
        self.inner
            .username
            .clone()
            .unwrap_or_else(|| "unknown".to_string())
    }

    #[instrument(skip_all, fields(%method, path))]
    async fn dispatch(
        &self,
        method: Method,
        path: &str,
        request: ApiRequest,
    ) -> Result<ApiResponse> {
        let access_token = self
            .inner
            .tokens
            .read()
            .unwrap()
            .access_token
            .clone()
            .filter(|token| !token.is_empty())
            .ok_or(AuthError::NotAuthenticated)?;

        // Decoded once per logical call; a mid-call refresh leaves this
        // stale, so subsequent attempts re-authenticate unconditionally.
        // The exchange is idempotent, so that costs one spare round trip.
        let expiry = token::decode_expiry(&access_token)?;

        let max_attempts = self.inner.retry.max_attempts();
        let mut attempt = 0;

        while attempt < max_attempts {
            attempt += 1;

            if token::epoch_now() > expiry {
                debug!(attempt, "access token expired, refreshing");
                self.authenticate().await?;
            }

            match self.attempt(&method, path, &request).await {
                Ok(response) if response.status().as_u16() < 500 => {
                    return Ok(response);
                }
                Ok(response) => {
                    warn!(
                        status = response.status().as_u16(),
                        attempt, "server error, backing off"
                    );
                    if attempt < max_attempts {
                        sleep(self.inner.retry.delay_for(attempt)).await;
                    }
                }
                Err(Error::Transport(err)) => {
                    if attempt >= max_attempts {
                        return Err(Error::Transport(err));
                    }
                    warn!(error = %err, attempt, "transport failure, backing off");
                    sleep(self.inner.retry.delay_for(attempt)).await;
                }
                // Authentication failures during remediation are terminal;
                // retrying cannot fix a rejected principal.
                Err(err) => return Err(err),
            }
        }

        Err(Error::RetriesExhausted {
            attempts: max_attempts,
        })
    }
}

// Custom Debug impl that hides credential state
impl std::fmt::Debug for CloudSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudSession")
            .field("api", &self.inner.api)
            .field("username", &self.inner.username)
            .field("tokens", &"[REDACTED]")
            .finish()
    }
}
