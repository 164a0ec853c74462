//! Chain id to network mapping.
//!
//! The table is the single source of truth: a chain id is supported iff it has a row.

use alloy_primitives::Address;
use safe_contracts::FCL_P256_VERIFIER_ADDRESS;

use crate::SafeError;

/// Chain family a chain id belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, derive_more::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Chain {
    #[display("ethereum")]
    Ethereum,
    #[display("gnosis")]
    Gnosis,
    #[display("polygon")]
    Polygon,
}

/// Named network within a [`Chain`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, derive_more::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Network {
    #[display("mainnet")]
    Mainnet,
    #[display("goerli")]
    Goerli,
    #[display("sepolia")]
    Sepolia,
    #[display("chiado")]
    Chiado,
    #[display("mumbai")]
    Mumbai,
    #[display("amoy")]
    Amoy,
    #[display("cardona")]
    Cardona,
}

/// One row of the network table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NetworkInfo {
    pub chain_id: u64,
    pub chain: Chain,
    pub network: Network,
    /// P-256 verifier passkey signers use when no custom verifier is configured
    pub default_p256_verifier: Address,
}

impl NetworkInfo {
    const fn new(chain_id: u64, chain: Chain, network: Network) -> Self {
        Self {
            chain_id,
            chain,
            network,
            default_p256_verifier: FCL_P256_VERIFIER_ADDRESS,
        }
    }
}

/// Every supported chain id.
pub const NETWORKS: &[NetworkInfo] = &[
    NetworkInfo::new(1, Chain::Ethereum, Network::Mainnet),
    NetworkInfo::new(5, Chain::Ethereum, Network::Goerli),
    NetworkInfo::new(11155111, Chain::Ethereum, Network::Sepolia),
    NetworkInfo::new(100, Chain::Gnosis, Network::Mainnet),
    NetworkInfo::new(10200, Chain::Gnosis, Network::Chiado),
    NetworkInfo::new(137, Chain::Polygon, Network::Mainnet),
    NetworkInfo::new(80001, Chain::Polygon, Network::Mumbai),
    NetworkInfo::new(80002, Chain::Polygon, Network::Amoy),
    NetworkInfo::new(2442, Chain::Polygon, Network::Cardona),
];

/// Looks `chain_id` up in [`NETWORKS`].
pub fn chain_id_to_network(chain_id: u64) -> Result<&'static NetworkInfo, SafeError> {
    NETWORKS
        .iter()
        .find(|info| info.chain_id == chain_id)
        .ok_or(SafeError::UnsupportedChain(chain_id))
}

/// Chain family of `chain_id`.
pub fn chain_of(chain_id: u64) -> Result<Chain, SafeError> {
    chain_id_to_network(chain_id).map(|info| info.chain)
}

/// Default P-256 verifier for passkeys on `chain_id`.
pub fn default_p256_verifier(chain_id: u64) -> Result<Address, SafeError> {
    chain_id_to_network(chain_id).map(|info| info.default_p256_verifier)
}
