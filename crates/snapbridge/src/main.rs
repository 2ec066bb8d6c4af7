#![expect(
    clippy::multiple_crate_versions,
    reason = "transitive dependency duplication"
)]

use clap::{Parser, Subcommand};
use eyre::Context as _;
use tracing_subscriber::prelude::*;

mod amount;
mod config;
mod errors;
mod ops;
mod provider;
mod session;
mod snap;
mod swap;

use config::BridgeConfig;
use ops::Bridge;
use provider::HttpWalletProvider;
use session::SessionState;

#[derive(Parser, Debug)]
#[command(name = "snapbridge", version)]
struct Cli {
    /// Path to a TOML config file (defaults apply when absent).
    #[arg(long, global = true)]
    config: Option<std::path::PathBuf>,

    /// Override the wallet JSON-RPC endpoint for this invocation.
    #[arg(long, global = true)]
    rpc_url: Option<String>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Detect wallet capability and snap installation; print session state.
    Status,

    /// Request permission to enable/install the configured snap.
    Connect,

    /// Prompt the user to log into their account inside the snap.
    Login,

    /// Request the user's private balance from the snap.
    Balance,

    /// Submit the fixed-amount swap through the snap.
    ///
    /// This induces an on-chain action if the wallet prompt is approved.
    Transact,
}

fn init_logging() {
    let env_filter = tracing_subscriber::EnvFilter::from_default_env();
    let stderr_layer = tracing_subscriber::fmt::layer()
        .json()
        .with_writer(std::io::stderr)
        .with_filter(env_filter);
    tracing_subscriber::registry().with(stderr_layer).init();
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    color_eyre::install()?;
    init_logging();
    let cli = Cli::parse();

    let mut cfg = BridgeConfig::load(cli.config.as_deref()).context("load config")?;
    if let Some(url) = cli.rpc_url {
        cfg.wallet_rpc_url = url;
    }

    let gateway = HttpWalletProvider::new(&cfg.wallet_rpc_url).context("build provider gateway")?;
    let bridge = Bridge::new(gateway, cfg);

    let mut state = SessionState::new();
    bridge.refresh(&mut state).await;

    match cli.cmd {
        Command::Status => {}
        Command::Connect => bridge.connect(&mut state).await,
        Command::Login => bridge.initialize(&mut state).await,
        Command::Balance => bridge.request_balance(&mut state).await,
        Command::Transact => bridge.transact(&mut state).await,
    }

    use std::io::Write as _;
    let s = serde_json::to_string_pretty(&state).context("serialize session state")?;
    writeln!(std::io::stdout().lock(), "{s}").context("write session state")?;
    Ok(())
}
