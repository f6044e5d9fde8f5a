//! Subcommand implementations.

pub mod charger;
pub mod devices;
pub mod login;
pub mod outlet;
pub mod usage;
pub mod vehicles;
pub mod whoami;

use anyhow::Result;

use crate::cli::Commands;
use crate::session::ConnectOptions;

pub async fn handle(command: Commands, options: &ConnectOptions) -> Result<()> {
    match command {
        Commands::Login(args) => login::run(args, options).await,
        Commands::Whoami(args) => whoami::run(args, options).await,
        Commands::Devices(args) => devices::run(args, options).await,
        Commands::Usage(args) => usage::run(args, options).await,
        Commands::Outlet(args) => outlet::run(args, options).await,
        Commands::Charger(args) => charger::run(args, options).await,
        Commands::Vehicles(args) => vehicles::run(args, options).await,
    }
}
