use crate::cmd::{
    message_hash::MessageHashArgs, network::NetworkArgs, sign::SignArgs, status::StatusArgs,
    tx_hash::TxHashArgs,
};
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "safe")]
#[command(version, about = "CLI for Safe digests, signatures and authorization checks", long_about = None)]
pub(crate) struct SafeCli {
    #[command(subcommand)]
    pub(crate) cmd: SafeSubcommand,
}

#[derive(Subcommand, Debug)]
pub(crate) enum SafeSubcommand {
    /// Show the network a chain id maps to
    Network(NetworkArgs),

    /// Compute the EIP-712 hash of a Safe transaction
    TxHash(TxHashArgs),

    /// Compute the hashes of an off-chain Safe message
    MessageHash(MessageHashArgs),

    /// Sign a digest with a local key
    Sign(SignArgs),

    /// Check whether a digest is authorized for a Safe
    Status(StatusArgs),
}
