use std::process::ExitCode;

use clap::Parser;
use dotenvy::dotenv;
use log::*;
use triage_dashboard::{
    cli::{display_envs, Arguments, Command},
    config::DashboardConfig,
    runner,
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    dotenv().ok();
    env_logger::init();
    let args = Arguments::parse();
    if let Command::Env = args.command {
        display_envs();
        return ExitCode::SUCCESS;
    }
    let config = match DashboardConfig::from_env_or_default().apply_overrides(&args.connection) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        },
    };
    info!("🚀️ Using admin service at {} and push channel at {}", config.api.base_url, config.push.url);
    let result = match args.command {
        Command::Watch { open } => runner::watch(config, open).await,
        Command::Snapshot { json } => runner::print_snapshot(config, json).await,
        Command::Confirm { order_id, comment } => runner::confirm_order(config, order_id, comment).await,
        Command::Cancel { order_id, reason } => runner::cancel_order(config, order_id, reason).await,
        Command::Env => Ok(()),
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        },
    }
}
