//! Charger command implementation.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use crate::output;
use crate::session::{connect, ConnectOptions};

#[derive(Args, Debug)]
pub struct ChargerArgs {
    /// Charger device gid (defaults to the only charger)
    pub gid: Option<i64>,

    /// Switch the charger on
    #[arg(long, conflicts_with = "off")]
    pub on: bool,

    /// Switch the charger off
    #[arg(long)]
    pub off: bool,

    /// Set the charging rate in amps
    #[arg(long)]
    pub rate: Option<f64>,
}

pub async fn run(args: ChargerArgs, options: &ConnectOptions) -> Result<()> {
    let vue = connect(options).await?;
    let chargers = vue.chargers().await?;

    let charger = match args.gid {
        Some(gid) => chargers
            .iter()
            .find(|charger| charger.device_gid == gid)
            .with_context(|| format!("No charger with gid {gid}"))?,
        None => match chargers.as_slice() {
            [only] => only,
            [] => anyhow::bail!("No chargers on this account"),
            _ => anyhow::bail!("Several chargers found; pass a gid"),
        },
    };

    let requested = if args.on {
        Some(true)
    } else if args.off {
        Some(false)
    } else {
        None
    };

    if requested.is_none() && args.rate.is_none() {
        println!(
            "{:>8}  {} at {}A (max {}A)  {}",
            charger.device_gid,
            if charger.charger_on { "on".green() } else { "off".red() },
            charger.charging_rate,
            charger.max_charging_rate,
            charger.status.dimmed()
        );
        if !charger.message.is_empty() {
            output::field("Message", &charger.message);
        }
        return Ok(());
    }

    let updated = vue.update_charger(charger, requested, args.rate).await?;
    output::success(&format!(
        "Charger {} is now {} at {}A",
        updated.device_gid,
        if updated.charger_on { "on" } else { "off" },
        updated.charging_rate
    ));

    Ok(())
}
