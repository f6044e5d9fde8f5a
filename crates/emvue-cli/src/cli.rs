//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::commands;

/// Emporia Vue CLI tool.
#[derive(Parser, Debug)]
#[command(name = "emvue")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Output logs as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// API base URL
    #[arg(long, global = true, default_value = emvue_cloud::API_ROOT)]
    pub host: String,

    /// Talk to a local simulator at this URL instead of the cloud
    #[arg(long, global = true)]
    pub simulator: Option<String>,

    /// Token storage file (defaults to the platform data directory)
    #[arg(long, global = true)]
    pub token_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Authenticate and store the session tokens
    Login(commands::login::LoginArgs),

    /// Display the stored session
    Whoami(commands::whoami::WhoamiArgs),

    /// List devices and their connectivity
    Devices(commands::devices::DevicesArgs),

    /// Show per-channel usage for devices
    Usage(commands::usage::UsageArgs),

    /// Show or switch a smart outlet
    Outlet(commands::outlet::OutletArgs),

    /// Show or adjust an EV charger
    Charger(commands::charger::ChargerArgs),

    /// List vehicles and their charging status
    Vehicles(commands::vehicles::VehiclesArgs),
}
