use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;

use apc_ups_snmp::app::{self, cli::Cli};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    app::run(Cli::parse()).await
}
