use clap::Parser;
use opts::{SafeCli, SafeSubcommand};

mod cmd;
mod config;
mod opts;
mod retry;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args = SafeCli::parse();

    match args.cmd {
        SafeSubcommand::Network(cmd) => cmd.run(),
        SafeSubcommand::TxHash(cmd) => cmd.run(),
        SafeSubcommand::MessageHash(cmd) => cmd.run(),
        SafeSubcommand::Sign(cmd) => cmd.run().await,
        SafeSubcommand::Status(cmd) => cmd.run().await,
    }
}
