//! Identity provider exchange.
//!
//! The vendor authenticates against an AWS Cognito user pool. Both flows go
//! through the pool's `InitiateAuth` call: `USER_PASSWORD_AUTH` for the
//! initial password exchange and `REFRESH_TOKEN_AUTH` for session renewal.

use http::header::CONTENT_TYPE;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, instrument};

use emvue_core::error::AuthError;
use emvue_core::{Result, TokenSet};

/// The vendor's user pool endpoint.
pub const USER_POOL_URL: &str = "https://cognito-idp.us-east-2.amazonaws.com/";

/// The vendor's public app client id.
pub const CLIENT_ID: &str = "4qte47jbstod8apnfic0bunmrq";

const AMZ_TARGET_HEADER: &str = "x-amz-target";
const AMZ_TARGET: &str = "AWSCognitoIdentityProviderService.InitiateAuth";
const AMZ_JSON: &str = "application/x-amz-json-1.1";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct InitiateAuthResponse {
    authentication_result: Option<AuthenticationResult>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AuthenticationResult {
    access_token: Option<String>,
    id_token: Option<String>,
    refresh_token: Option<String>,
    token_type: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ProviderError {
    #[serde(rename = "__type")]
    kind: Option<String>,
    message: Option<String>,
}

/// Client for the identity provider's token endpoints.
#[derive(Debug, Clone)]
pub struct IdentityClient {
    http: reqwest::Client,
    endpoint: String,
    client_id: String,
}

impl IdentityClient {
    /// Create a client against the vendor pool.
    pub fn new(http: reqwest::Client) -> Self {
        Self::with_endpoint(http, USER_POOL_URL, CLIENT_ID)
    }

    /// Create a client against an explicit pool endpoint and app client.
    pub fn with_endpoint(
        http: reqwest::Client,
        endpoint: impl Into<String>,
        client_id: impl Into<String>,
    ) -> Self {
        Self {
            http,
            endpoint: endpoint.into(),
            client_id: client_id.into(),
        }
    }

    /// Exchange a username/password pair for a fresh token triple.
    #[instrument(skip(self, password))]
    pub async fn password_auth(&self, username: &str, password: &str) -> Result<TokenSet> {
        self.initiate(
            "USER_PASSWORD_AUTH",
            json!({
                "USERNAME": username,
                "PASSWORD": password,
            }),
        )
        .await
    }

    /// Exchange a stored refresh credential for a fresh access/identity
    /// pair. The provider does not rotate the refresh token on this flow.
    #[instrument(skip(self, refresh_token))]
    pub async fn refresh_auth(&self, refresh_token: &str) -> Result<TokenSet> {
        self.initiate(
            "REFRESH_TOKEN_AUTH",
            json!({
                "REFRESH_TOKEN": refresh_token,
            }),
        )
        .await
    }

    async fn initiate(&self, flow: &str, parameters: serde_json::Value) -> Result<TokenSet> {
        debug!(flow, "identity exchange");

        let body = json!({
            "AuthFlow": flow,
            "ClientId": self.client_id,
            "AuthParameters": parameters,
        });

        let response = self
            .http
            .post(&self.endpoint)
            .header(CONTENT_TYPE, AMZ_JSON)
            .header(AMZ_TARGET_HEADER, AMZ_TARGET)
            .body(body.to_string())
            .send()
            .await?;

        let status = response.status();
        let bytes = response.bytes().await?;

        if !status.is_success() {
            let error: ProviderError = serde_json::from_slice(&bytes).unwrap_or_default();
            let message = match (error.kind, error.message) {
                (Some(kind), Some(message)) => format!("{kind}: {message}"),
                (_, Some(message)) => message,
                (Some(kind), None) => kind,
                (None, None) => format!("identity exchange failed with status {status}"),
            };
            return Err(AuthError::Rejected { message }.into());
        }

        let parsed: InitiateAuthResponse =
            serde_json::from_slice(&bytes).map_err(|err| AuthError::Rejected {
                message: format!("unexpected identity response: {err}"),
            })?;

        let result = parsed
            .authentication_result
            .ok_or_else(|| AuthError::Rejected {
                message: "identity exchange returned a challenge, not tokens".to_string(),
            })?;

        Ok(TokenSet {
            access_token: result.access_token,
            id_token: result.id_token,
            refresh_token: result.refresh_token,
            token_type: result.token_type.or_else(|| Some("Bearer".to_string())),
        })
    }
}
