//! Session construction and persistence for CLI use.

pub mod storage;
mod types;

use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::warn;

use emvue_cloud::{CloudConfig, CloudSession};
use emvue_core::{ApiUrl, Credentials, Vue};
use emvue_sim::SimulatedSession;

pub use types::CliSession;

/// Where and how to connect, from the global CLI flags.
pub struct ConnectOptions {
    pub host: String,
    pub simulator: Option<String>,
    pub token_file: Option<PathBuf>,
}

impl ConnectOptions {
    /// Resolve the token storage path.
    pub fn token_path(&self) -> Result<PathBuf> {
        match &self.token_file {
            Some(path) => Ok(path.clone()),
            None => storage::default_path(),
        }
    }
}

/// Connect using the stored session (or the simulator) without prompting.
pub async fn connect(options: &ConnectOptions) -> Result<Vue<CliSession>> {
    if let Some(simulator) = &options.simulator {
        let api = ApiUrl::new(simulator).context("Invalid simulator URL")?;
        let session = SimulatedSession::new(api, None);
        return Ok(Vue::new(CliSession::Simulated(session)));
    }

    let path = options.token_path()?;
    let stored = storage::load(&path)?
        .filter(|stored| stored.tokens().is_complete())
        .context("Not logged in; run `emvue login` first")?;

    let username = stored
        .username
        .clone()
        .context("Stored session has no username; run `emvue login` again")?;

    let session = cloud_session(options, &path, &username, None, Some(stored))?;
    Ok(Vue::new(CliSession::Cloud(session)))
}

/// Build a cloud session wired to persist refreshed tokens.
pub fn cloud_session(
    options: &ConnectOptions,
    path: &std::path::Path,
    username: &str,
    password: Option<String>,
    stored: Option<storage::StoredSession>,
) -> Result<CloudSession> {
    let api = ApiUrl::new(&options.host).context("Invalid API URL")?;

    let credentials = match password {
        Some(password) => Credentials::new(username, password),
        None => Credentials::for_refresh(username),
    };

    let mut config = CloudConfig::new(api).credentials(credentials);
    if let Some(stored) = stored {
        config = config.tokens(stored.tokens());
    }

    let sink_path = path.to_path_buf();
    let sink_username = username.to_lowercase();
    config = config.on_token_update(move |tokens| {
        if let Err(err) = storage::save(&sink_path, Some(&sink_username), tokens) {
            warn!(error = %err, "Failed to persist refreshed tokens");
        }
    });

    Ok(CloudSession::new(config))
}
