//! Optional TOML configuration shared by the networked commands.

use std::path::{Path, PathBuf};

use alloy_primitives::Address;
use clap::Args;
use eyre::{Result, WrapErr, eyre};
use safe_contracts::WEBAUTHN_SHARED_SIGNER_ADDRESS;
use serde::Deserialize;

/// Contents of the configuration file. Every key is optional.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct CliConfig {
    pub(crate) rpc_url: Option<String>,
    pub(crate) tx_service_url: Option<String>,
    pub(crate) chain_id: Option<u64>,
    pub(crate) shared_signer: Option<Address>,
}

impl CliConfig {
    pub(crate) fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("failed to read config file {}", path.display()))?;
        toml::from_str(&contents)
            .wrap_err_with(|| format!("failed to parse config file {}", path.display()))
    }
}

/// Connection flags; each one overrides the matching config key.
#[derive(Args, Debug, Clone, Default)]
pub(crate) struct ConnectionArgs {
    /// Path to a TOML config file
    #[arg(short, long)]
    pub(crate) config: Option<PathBuf>,

    /// JSON-RPC endpoint of the chain
    #[arg(long, env = "SAFE_RPC_URL")]
    pub(crate) rpc_url: Option<String>,

    /// Transaction service root URL
    #[arg(long, env = "SAFE_TX_SERVICE_URL")]
    pub(crate) tx_service_url: Option<String>,

    /// Chain id; queried from the RPC endpoint when neither flag nor config sets it
    #[arg(long)]
    pub(crate) chain_id: Option<u64>,

    /// Address of the WebAuthn shared signer, if not the canonical deployment
    #[arg(long)]
    pub(crate) shared_signer: Option<Address>,
}

/// Connection settings after merging flags over the config file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Endpoints {
    pub(crate) rpc_url: String,
    pub(crate) tx_service_url: Option<String>,
    pub(crate) chain_id: Option<u64>,
    pub(crate) shared_signer: Address,
}

impl ConnectionArgs {
    pub(crate) fn resolve(self) -> Result<Endpoints> {
        let file = match &self.config {
            Some(path) => CliConfig::load(path)?,
            None => CliConfig::default(),
        };
        self.merge(file)
    }

    fn merge(self, file: CliConfig) -> Result<Endpoints> {
        Ok(Endpoints {
            rpc_url: self
                .rpc_url
                .or(file.rpc_url)
                .ok_or_else(|| eyre!("no RPC URL: pass --rpc-url or set rpc_url in the config"))?,
            tx_service_url: self.tx_service_url.or(file.tx_service_url),
            chain_id: self.chain_id.or(file.chain_id),
            shared_signer: self
                .shared_signer
                .or(file.shared_signer)
                .unwrap_or(WEBAUTHN_SHARED_SIGNER_ADDRESS),
        })
    }
}
