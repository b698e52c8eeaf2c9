//! WXH CLI - cache Weather Underground daily history into SQLite and export it.

use clap::Parser;
use env_logger::Env;

#[derive(Parser)]
#[command(
    name = "wxh",
    version,
    about = "Daily airport weather history cache"
)]
struct Cli {
    #[command(subcommand)]
    command: wxh_cmd::Command,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();
    wxh_cmd::run(cli.command).await
}
