//! Login command implementation.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use emvue_core::{ApiSession, ApiUrl, Vue};
use emvue_sim::SimulatedSession;

use crate::output;
use crate::session::{cloud_session, storage, CliSession, ConnectOptions};

#[derive(Args, Debug)]
pub struct LoginArgs {
    /// Account username (email)
    #[arg(long)]
    pub username: Option<String>,

    /// Account password; omit to reuse the stored session
    #[arg(long)]
    pub password: Option<String>,
}

pub async fn run(args: LoginArgs, options: &ConnectOptions) -> Result<()> {
    if let Some(simulator) = &options.simulator {
        return run_simulator(simulator, args.username).await;
    }

    let path = options.token_path()?;
    let stored = storage::load(&path)?;

    let username = args
        .username
        .or_else(|| stored.as_ref().and_then(|s| s.username.clone()))
        .context("--username required (no stored session found)")?
        .to_lowercase();

    // A password on the command line wins; otherwise fall back to one
    // seeded in the token file, and finally to the stored refresh tokens.
    let password = args
        .password
        .or_else(|| stored.as_ref().and_then(|s| s.password.clone()));

    if password.is_none() && !stored.as_ref().is_some_and(|s| s.tokens().is_complete()) {
        anyhow::bail!("No password given and no stored tokens; pass --password");
    }

    eprintln!("{}", "Logging in...".dimmed());

    let session = cloud_session(options, &path, &username, password, stored)?;
    session.authenticate().await.context("Failed to login")?;

    let vue = Vue::new(CliSession::Cloud(session));
    let customer = vue
        .customer()
        .await
        .context("Authenticated, but fetching the account failed")?;

    output::success("Logged in successfully");
    println!();
    output::field("Account", &customer.email);
    output::field("Customer", &customer.customer_gid.to_string());
    output::field("Token file", &path.display().to_string());

    Ok(())
}

async fn run_simulator(simulator: &str, username: Option<String>) -> Result<()> {
    let api = ApiUrl::new(simulator).context("Invalid simulator URL")?;
    let session = SimulatedSession::new(api, username);
    let vue = Vue::new(CliSession::Simulated(session));

    let customer = vue
        .customer()
        .await
        .context("Simulator did not answer; is emvue-simd running?")?;

    output::success("Connected to simulator");
    println!();
    output::field("Account", &customer.email);
    output::field("User", &vue.session().username());

    Ok(())
}
