//! Whoami command implementation.

use anyhow::{Context, Result};
use clap::Args;

use crate::output;
use crate::session::{storage, ConnectOptions};

#[derive(Args, Debug)]
pub struct WhoamiArgs {}

pub async fn run(_args: WhoamiArgs, options: &ConnectOptions) -> Result<()> {
    let path = options.token_path()?;
    let stored = storage::load(&path)?.context("Not logged in; run `emvue login` first")?;

    output::field(
        "Username",
        stored.username.as_deref().unwrap_or("unknown"),
    );
    output::field("Host", &options.host);
    output::field(
        "Stored tokens",
        if stored.tokens().is_complete() {
            "complete"
        } else {
            "incomplete"
        },
    );
    output::field("Token file", &path.display().to_string());

    Ok(())
}
