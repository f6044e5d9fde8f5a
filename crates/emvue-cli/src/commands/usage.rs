//! Usage command implementation.

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use emvue_core::{Scale, Unit};

use crate::session::{connect, ConnectOptions};

#[derive(Args, Debug)]
pub struct UsageArgs {
    /// Device gids to query, comma separated (default: all devices)
    #[arg(long, value_delimiter = ',')]
    pub gids: Vec<i64>,

    /// Usage scale (1S, 1MIN, 15MIN, 1H, 1D, 1W, 1MON, 1Y)
    #[arg(long, default_value = "1MIN")]
    pub scale: String,

    /// Energy unit (KilowattHours, Dollars, ...)
    #[arg(long, default_value = "KilowattHours")]
    pub unit: String,
}

pub async fn run(args: UsageArgs, options: &ConnectOptions) -> Result<()> {
    let scale: Scale = args.scale.parse()?;
    let unit: Unit = args.unit.parse()?;

    let vue = connect(options).await?;

    let gids = if args.gids.is_empty() {
        vue.devices()
            .await?
            .iter()
            .map(|device| device.device_gid)
            .collect()
    } else {
        args.gids
    };

    let usage = vue.device_list_usage(&gids, None, scale, unit).await?;

    let mut gids: Vec<_> = usage.keys().copied().collect();
    gids.sort_unstable();

    for gid in gids {
        let device = &usage[&gid];
        println!("{}", format!("device {gid}").bold());
        for channel in device.channel_usages.iter().flatten() {
            let value = match channel.usage {
                Some(value) => format!("{value:>12.6}"),
                None => format!("{:>12}", "-".dimmed()),
            };
            println!(
                "  {:<12} {:<16} {value} {unit}",
                channel.channel_num,
                channel.name.as_deref().unwrap_or(""),
            );
        }
    }

    Ok(())
}
