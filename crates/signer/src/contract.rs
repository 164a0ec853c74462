use alloy_primitives::B256;
use futures::{FutureExt, future::BoxFuture};
use safe_primitives::{SafeWallet, SignerProof};
use tracing::debug;

use crate::{SignerError, SignerRegistry, SigningContext};

/// A Safe owning another Safe. Signs by collecting a composite signature from its own
/// signers and wrapping it as an ERC-1271 contract signature.
#[derive(Clone, Debug)]
pub struct ContractSigner {
    wallet: SafeWallet,
    signers: SignerRegistry,
}

impl ContractSigner {
    pub const fn new(wallet: SafeWallet, signers: SignerRegistry) -> Self {
        Self { wallet, signers }
    }

    pub const fn wallet(&self) -> &SafeWallet {
        &self.wallet
    }

    /// Signs `digest` of the parent wallet.
    ///
    /// The nested wallet's fallback handler checks its own signatures over a `SafeMessage`:
    /// of `abi.encode(digest)` when the parent passes the digest, or of the parent's
    /// preimage under the legacy scheme. The nested signers sign that message, and the
    /// wallet's own contract owners are asked with the scheme one level down.
    pub fn sign<'a>(
        &'a self,
        digest: B256,
        ctx: &'a SigningContext,
    ) -> BoxFuture<'a, Result<SignerProof, SignerError>> {
        async move {
            let delegate = self.wallet.address();
            let (nested, scheme) = ctx.scheme().nest(delegate, ctx.chain_id(), digest);
            debug!(
                %delegate,
                parent_digest = %digest,
                %nested,
                legacy = scheme.is_legacy(),
                "signing through nested wallet"
            );

            let ctx = ctx.clone().with_scheme(scheme);
            let composite = self.signers.sign(&self.wallet, nested, &ctx).await?;
            Ok(SignerProof::Contract {
                signer: delegate,
                signature: composite.into_bytes(),
            })
        }
        .boxed()
    }
}
