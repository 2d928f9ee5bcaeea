use std::{env, env::VarError};

use clap::{Args, Parser, Subcommand};
use order_index::order_types::OrderId;

#[derive(Parser, Debug)]
#[command(version, about = "Triage new orders from the terminal")]
pub struct Arguments {
    #[command(flatten)]
    pub connection: ConnectionOverrides,
    #[command(subcommand)]
    pub command: Command,
}

/// Overrides for the `OTD_*` connection variables.
#[derive(Args, Debug, Default, Clone)]
pub struct ConnectionOverrides {
    /// Base URL of the admin service, e.g. http://localhost:8080
    #[arg(long = "api-url", global = true)]
    pub api_url: Option<String>,
    /// WebSocket endpoint for order updates
    #[arg(long = "push-url", global = true)]
    pub push_url: Option<String>,
    /// Push framing: stomp or json
    #[arg(long = "push-protocol", global = true)]
    pub push_protocol: Option<String>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show the board and follow live updates. Type `help` once it is running for the operator commands.
    #[clap(name = "watch")]
    Watch {
        /// Open this order's detail view straight away
        #[arg(short = 'o', long = "open")]
        open: Option<OrderId>,
    },
    /// Print the board once and exit
    #[clap(name = "snapshot")]
    Snapshot {
        /// Print the board as JSON instead of tables
        #[arg(long = "json")]
        json: bool,
    },
    /// Confirm a new order
    #[clap(name = "confirm")]
    Confirm {
        order_id: OrderId,
        /// Optional note for the customer
        #[arg(short = 'c', long = "comment")]
        comment: Option<String>,
    },
    /// Cancel a new order
    #[clap(name = "cancel")]
    Cancel {
        order_id: OrderId,
        /// Why the order is canceled. Required.
        #[arg(short = 'r', long = "reason", default_value = "")]
        reason: String,
    },
    /// Print the configuration variables currently in effect
    #[clap(name = "env")]
    Env,
}

pub fn display_envs() {
    // Be explicit about which envars to print, so as to avoid accidentally exposing secrets
    const DISPLAY_ENVS: [&str; 11] = [
        "RUST_LOG",
        "OTD_API_URL",
        "OTD_SNAPSHOT_PATH",
        "OTD_REQUEST_TIMEOUT",
        "OTD_PUSH_URL",
        "OTD_PUSH_TOPIC",
        "OTD_PUSH_PROTOCOL",
        "OTD_FEED_BUFFER",
        "OTD_USER_ID",
        "OTD_USER_ROLE",
        "OTD_USER_NAME",
    ];

    println!("Current environment values (EXCLUDING variables that contain secrets):");
    DISPLAY_ENVS.iter().for_each(|&name| {
        let val = match env::var(name) {
            Ok(s) => s,
            Err(VarError::NotPresent) => "Not set".into(),
            Err(VarError::NotUnicode(s)) => format!("Invalid value: {}", s.to_string_lossy()),
        };
        println!("  {name:<35} {val:<15}");
    });
    let token_set = env::var("OTD_ACCESS_TOKEN").map(|s| !s.trim().is_empty()).unwrap_or(false);
    let token = if token_set { "Set" } else { "Not set" };
    println!("  {:<35} {token:<15}", "OTD_ACCESS_TOKEN");
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parse_commands() {
        let args = Arguments::try_parse_from(["triage_dashboard", "watch", "--open", "17"]).unwrap();
        assert!(matches!(args.command, Command::Watch { open: Some(ref id) } if id.as_str() == "17"));

        let cmd = ["triage_dashboard", "cancel", "9", "--reason", "Out of stock", "--api-url", "http://x"];
        let args = Arguments::try_parse_from(cmd).unwrap();
        assert_eq!(args.connection.api_url.as_deref(), Some("http://x"));
        match args.command {
            Command::Cancel { order_id, reason } => {
                assert_eq!(order_id.as_str(), "9");
                assert_eq!(reason, "Out of stock");
            },
            other => panic!("Unexpected command {other:?}"),
        }

        let args = Arguments::try_parse_from(["triage_dashboard", "confirm", "9"]).unwrap();
        assert!(matches!(args.command, Command::Confirm { comment: None, .. }));
        assert!(Arguments::try_parse_from(["triage_dashboard"]).is_err());
    }
}
