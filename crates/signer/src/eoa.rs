use std::{fmt, sync::Arc};

use alloy_primitives::{Address, B256};
use alloy_signer::Signer;
use safe_primitives::{EoaSignature, SignerProof};
use tracing::debug;

use crate::SignerError;

/// How an EOA owner authorizes a digest.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SigningMethod {
    /// Sign the digest itself. Used for transaction hashes.
    #[default]
    Digest,
    /// Sign with the `"\x19Ethereum Signed Message:\n32"` prefix, as wallets do for
    /// `personal_sign` message flows.
    EthSign,
    /// The owner approved the digest on-chain with `approveHash`; no key is needed.
    PreApproved,
}

/// Owner key held outside the chain.
#[derive(Clone)]
pub struct EoaSigner {
    address: Address,
    key: Option<Arc<dyn Signer + Send + Sync>>,
    method: SigningMethod,
}

impl EoaSigner {
    pub fn new(key: impl Signer + Send + Sync + 'static) -> Self {
        Self {
            address: key.address(),
            key: Some(Arc::new(key)),
            method: SigningMethod::Digest,
        }
    }

    /// An owner whose key is not available locally. Only [`SigningMethod::PreApproved`]
    /// can produce a proof for it.
    pub const fn watch_only(address: Address) -> Self {
        Self {
            address,
            key: None,
            method: SigningMethod::Digest,
        }
    }

    pub const fn with_method(mut self, method: SigningMethod) -> Self {
        self.method = method;
        self
    }

    pub const fn address(&self) -> Address {
        self.address
    }

    pub const fn method(&self) -> SigningMethod {
        self.method
    }

    pub async fn sign(&self, digest: B256) -> Result<SignerProof, SignerError> {
        let signature = match self.method {
            SigningMethod::PreApproved => EoaSignature::PreApproved,
            SigningMethod::Digest => EoaSignature::Digest(
                self.key()?
                    .sign_hash(&digest)
                    .await
                    .map_err(|err| self.unavailable(err))?,
            ),
            SigningMethod::EthSign => EoaSignature::EthSign(
                self.key()?
                    .sign_message(digest.as_slice())
                    .await
                    .map_err(|err| self.unavailable(err))?,
            ),
        };
        debug!(signer = %self.address, method = ?self.method, %digest, "signed digest");

        Ok(SignerProof::Eoa {
            signer: self.address,
            signature,
        })
    }

    fn key(&self) -> Result<&Arc<dyn Signer + Send + Sync>, SignerError> {
        self.key
            .as_ref()
            .ok_or_else(|| SignerError::SigningUnavailable {
                signer: self.address,
                reason: "no private key available".to_string(),
            })
    }

    fn unavailable(&self, err: alloy_signer::Error) -> SignerError {
        SignerError::SigningUnavailable {
            signer: self.address,
            reason: err.to_string(),
        }
    }
}

impl fmt::Debug for EoaSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EoaSigner")
            .field("address", &self.address)
            .field("has_key", &self.key.is_some())
            .field("method", &self.method)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::b256;
    use alloy_signer_local::PrivateKeySigner;

    const DIGEST: B256 = b256!("0x2c2bd2ec0f0d3cd08ce4a8e6c58d6d4b0b9a6d0c9a5e9f51bfa2e3e3b7c1c0d1");

    #[tokio::test]
    async fn test_raw_and_prefixed_paths_differ() {
        let key = PrivateKeySigner::random();
        let address = key.address();
        let raw = EoaSigner::new(key.clone()).sign(DIGEST).await.unwrap();
        let prefixed = EoaSigner::new(key)
            .with_method(SigningMethod::EthSign)
            .sign(DIGEST)
            .await
            .unwrap();

        let (
            SignerProof::Eoa {
                signature: EoaSignature::Digest(raw_sig),
                ..
            },
            SignerProof::Eoa {
                signature: EoaSignature::EthSign(prefixed_sig),
                ..
            },
        ) = (&raw, &prefixed)
        else {
            panic!("unexpected proof kinds: {raw:?} {prefixed:?}");
        };
        assert_ne!(raw_sig, prefixed_sig);
        assert!(raw.verify(DIGEST).is_ok());
        assert!(prefixed.verify(DIGEST).is_ok());
        assert_eq!(raw.signer(), address);
    }

    #[tokio::test]
    async fn test_watch_only() {
        let address = Address::repeat_byte(0x77);
        let err = EoaSigner::watch_only(address).sign(DIGEST).await.unwrap_err();
        assert!(matches!(err, SignerError::SigningUnavailable { signer, .. } if signer == address));

        let proof = EoaSigner::watch_only(address)
            .with_method(SigningMethod::PreApproved)
            .sign(DIGEST)
            .await
            .unwrap();
        assert_eq!(
            proof,
            SignerProof::Eoa {
                signer: address,
                signature: EoaSignature::PreApproved,
            }
        );
    }
}
