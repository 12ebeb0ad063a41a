use std::str::FromStr;

use admanager_domain::Permission;
use clap::{Parser, Subcommand};

/// AD manager console command-line client.
#[derive(Parser, Debug)]
#[command(name = "admanager-console")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Sign in; the password comes from ADMANAGER_PASSWORD or stdin
    Login {
        /// Directory account name
        username: String,
        /// Ask the backend for a long-lived session
        #[arg(long)]
        remember_me: bool,
    },
    /// Discard the cached session
    Logout,
    /// Validate the cached session with the backend
    Status,
    /// Show the backend's view of the current user
    Whoami,
    /// Check a permission against the cached session
    Can {
        /// Permission name, e.g. ResetPasswords
        #[arg(value_parser = parse_permission)]
        permission: Permission,
    },
    /// List console pages the cached session may open
    Routes,
    /// Authorized GET against the console API
    Get {
        /// API path, e.g. /api/users
        path: String,
    },
}

fn parse_permission(value: &str) -> Result<Permission, String> {
    Permission::from_str(value).map_err(|error| error.to_string())
}
