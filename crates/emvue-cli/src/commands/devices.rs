//! Devices command implementation.

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use crate::output;
use crate::session::{connect, ConnectOptions};

#[derive(Args, Debug)]
pub struct DevicesArgs {
    /// Output the raw device list as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn run(args: DevicesArgs, options: &ConnectOptions) -> Result<()> {
    let vue = connect(options).await?;

    let mut devices = vue.devices().await?;
    let status = vue.devices_status().await?;
    status.apply_connectivity(&mut devices);

    if args.json {
        return output::json_pretty(&devices);
    }

    for device in &devices {
        let name = device
            .location_properties
            .as_ref()
            .map(|props| props.device_name.as_str())
            .unwrap_or("(unnamed)");
        let connected = match device.device_connected.as_ref() {
            Some(report) if report.connected => "online".green(),
            Some(_) => "offline".red(),
            None => "unknown".dimmed(),
        };

        println!(
            "{:>8}  {:<10} {:<20} {}",
            device.device_gid,
            device.model.as_deref().unwrap_or("-"),
            name,
            connected
        );
    }

    Ok(())
}
