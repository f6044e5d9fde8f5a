//! Outlet command implementation.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use crate::output;
use crate::session::{connect, ConnectOptions};

#[derive(Args, Debug)]
pub struct OutletArgs {
    /// Outlet device gid (omit to list all outlets)
    pub gid: Option<i64>,

    /// Switch the outlet on
    #[arg(long, conflicts_with = "off")]
    pub on: bool,

    /// Switch the outlet off
    #[arg(long)]
    pub off: bool,
}

pub async fn run(args: OutletArgs, options: &ConnectOptions) -> Result<()> {
    let vue = connect(options).await?;
    let outlets = vue.outlets().await?;

    let Some(gid) = args.gid else {
        for outlet in &outlets {
            println!(
                "{:>8}  {}",
                outlet.device_gid,
                if outlet.outlet_on { "on".green() } else { "off".red() }
            );
        }
        return Ok(());
    };

    let outlet = outlets
        .iter()
        .find(|outlet| outlet.device_gid == gid)
        .with_context(|| format!("No outlet with gid {gid}"))?;

    let requested = if args.on {
        Some(true)
    } else if args.off {
        Some(false)
    } else {
        None
    };

    match requested {
        Some(on) => {
            let updated = vue.update_outlet(outlet, Some(on)).await?;
            output::success(&format!(
                "Outlet {} is now {}",
                updated.device_gid,
                if updated.outlet_on { "on" } else { "off" }
            ));
        }
        None => {
            output::field(
                &format!("Outlet {gid}"),
                if outlet.outlet_on { "on" } else { "off" },
            );
        }
    }

    Ok(())
}
