//! Vehicles command implementation.

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use crate::session::{connect, ConnectOptions};

#[derive(Args, Debug)]
pub struct VehiclesArgs {
    /// Include per-vehicle charging status
    #[arg(long)]
    pub status: bool,
}

pub async fn run(args: VehiclesArgs, options: &ConnectOptions) -> Result<()> {
    let vue = connect(options).await?;
    let vehicles = vue.vehicles().await?;

    if vehicles.is_empty() {
        println!("{}", "No vehicles linked".dimmed());
        return Ok(());
    }

    for vehicle in &vehicles {
        println!(
            "{:>8}  {} {} {} ({})",
            vehicle.vehicle_gid,
            vehicle.year,
            vehicle.make,
            vehicle.model,
            vehicle.display_name
        );

        if args.status {
            if let Some(status) = vue.vehicle_status(vehicle.vehicle_gid).await? {
                println!(
                    "          battery {:.0}%  {}  {:.0} min to full",
                    status.battery_level,
                    status.charging_state.dimmed(),
                    status.minutes_to_full_charge
                );
            }
        }
    }

    Ok(())
}
