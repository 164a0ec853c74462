use alloy_primitives::{Address, B256};
use safe_primitives::{CallFailure, SafeError};

/// Errors raised while producing signer proofs.
#[derive(Debug, thiserror::Error)]
pub enum SignerError {
    /// A requested EOA signer has no key to sign with.
    #[error("signer {signer} cannot sign: {reason}")]
    SigningUnavailable { signer: Address, reason: String },

    /// The passkey assertion could not be obtained or is unusable.
    #[error("passkey signer {signer} unavailable: {reason}")]
    PasskeyUnavailable { signer: Address, reason: String },

    /// A nested wallet delegates back to a wallet already being signed for.
    #[error("delegation cycle at wallet {wallet} (path: {})", format_path(path))]
    DelegationCycle { wallet: Address, path: Vec<Address> },

    /// The wallet's signers could not produce enough proofs.
    #[error(
        "wallet {wallet} collected {collected} of {threshold} signatures for digest {digest}"
    )]
    ThresholdNotMet {
        wallet: Address,
        digest: B256,
        collected: usize,
        threshold: usize,
    },

    /// A proof or the composite signature violated an encoding invariant.
    #[error("wallet {wallet}, digest {digest}: {source}")]
    Signature {
        wallet: Address,
        digest: B256,
        #[source]
        source: SafeError,
    },

    /// Reading signer configuration from the chain failed.
    #[error("reading configuration of {contract} for wallet {wallet}: {source}")]
    Call {
        contract: Address,
        wallet: Address,
        #[source]
        source: CallFailure,
    },
}

impl SignerError {
    pub(crate) fn signature(wallet: Address, digest: B256, source: SafeError) -> Self {
        match source {
            SafeError::ThresholdNotMet {
                collected,
                threshold,
            } => Self::ThresholdNotMet {
                wallet,
                digest,
                collected,
                threshold,
            },
            source => Self::Signature {
                wallet,
                digest,
                source,
            },
        }
    }
}

fn format_path(path: &[Address]) -> String {
    path.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" -> ")
}
