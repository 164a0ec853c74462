use std::{fmt, sync::Arc};

use alloy_primitives::{Address, B256};
use futures::future::join_all;
use safe_primitives::{
    CallFailure, ChainCaller, CompositeSignature, ContractSignatureScheme, ProofSet, SafeWallet,
    SignerProof,
};
use tracing::{debug, info, instrument};

use crate::{ContractSigner, EoaSigner, PasskeySigner, SharedSigner, SignerError};

/// Per-request signing state passed down nested signers.
#[derive(Clone)]
pub struct SigningContext {
    chain_id: u64,
    caller: Option<Arc<dyn ChainCaller>>,
    scheme: ContractSignatureScheme,
    path: Vec<Address>,
}

impl SigningContext {
    pub const fn new(chain_id: u64) -> Self {
        Self {
            chain_id,
            caller: None,
            scheme: ContractSignatureScheme::Hash,
            path: Vec::new(),
        }
    }

    /// How the wallet being signed for validates its contract owners.
    pub fn with_scheme(mut self, scheme: ContractSignatureScheme) -> Self {
        self.scheme = scheme;
        self
    }

    pub const fn scheme(&self) -> &ContractSignatureScheme {
        &self.scheme
    }

    /// Chain access for signers that read their configuration on-chain.
    pub fn with_caller(mut self, caller: Arc<dyn ChainCaller>) -> Self {
        self.caller = Some(caller);
        self
    }

    pub const fn chain_id(&self) -> u64 {
        self.chain_id
    }

    /// Wallets currently being signed for, outermost first.
    pub fn path(&self) -> &[Address] {
        &self.path
    }

    /// Context for signing on behalf of `wallet`. Fails if `wallet` is already on the path.
    fn enter(&self, wallet: Address) -> Result<Self, SignerError> {
        if self.path.contains(&wallet) {
            return Err(SignerError::DelegationCycle {
                wallet,
                path: self.path.clone(),
            });
        }
        let mut ctx = self.clone();
        ctx.path.push(wallet);
        Ok(ctx)
    }

    fn caller(&self, signer: Address, wallet: Address) -> Result<&dyn ChainCaller, SignerError> {
        self.caller.as_deref().ok_or_else(|| SignerError::Call {
            contract: signer,
            wallet,
            source: CallFailure::transport("no chain access configured"),
        })
    }
}

impl fmt::Debug for SigningContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningContext")
            .field("chain_id", &self.chain_id)
            .field("has_caller", &self.caller.is_some())
            .field("legacy", &self.scheme.is_legacy())
            .field("path", &self.path)
            .finish()
    }
}

/// Every kind of owner a Safe can have.
#[derive(Clone, Debug)]
pub enum SafeSigner {
    Eoa(EoaSigner),
    Contract(ContractSigner),
    Passkey(PasskeySigner),
    Shared(SharedSigner),
}

impl SafeSigner {
    /// Owner address this signer signs as.
    pub fn address(&self) -> Address {
        match self {
            Self::Eoa(signer) => signer.address(),
            Self::Contract(signer) => signer.wallet().address(),
            Self::Passkey(signer) => signer.address(),
            Self::Shared(signer) => signer.address(),
        }
    }

    /// Produces a proof for `digest` of `wallet`. `None` means the signer is not eligible
    /// for this wallet.
    pub async fn sign(
        &self,
        wallet: &SafeWallet,
        digest: B256,
        ctx: &SigningContext,
    ) -> Result<Option<SignerProof>, SignerError> {
        match self {
            Self::Eoa(signer) => signer.sign(digest).await.map(Some),
            Self::Contract(signer) => signer.sign(digest, ctx).await.map(Some),
            Self::Passkey(signer) => signer.sign(digest, ctx.chain_id()).await.map(Some),
            Self::Shared(signer) => {
                let caller = ctx.caller(signer.address(), wallet.address())?;
                signer.sign(wallet, digest, ctx.chain_id(), caller).await
            }
        }
    }
}

impl From<EoaSigner> for SafeSigner {
    fn from(signer: EoaSigner) -> Self {
        Self::Eoa(signer)
    }
}

impl From<ContractSigner> for SafeSigner {
    fn from(signer: ContractSigner) -> Self {
        Self::Contract(signer)
    }
}

impl From<PasskeySigner> for SafeSigner {
    fn from(signer: PasskeySigner) -> Self {
        Self::Passkey(signer)
    }
}

impl From<SharedSigner> for SafeSigner {
    fn from(signer: SharedSigner) -> Self {
        Self::Shared(signer)
    }
}

/// Signers available to sign for a wallet.
#[derive(Clone, Debug, Default)]
pub struct SignerRegistry {
    signers: Vec<SafeSigner>,
}

impl SignerRegistry {
    pub const fn new() -> Self {
        Self {
            signers: Vec::new(),
        }
    }

    pub fn with_signer(mut self, signer: impl Into<SafeSigner>) -> Self {
        self.signers.push(signer.into());
        self
    }

    pub fn push(&mut self, signer: impl Into<SafeSigner>) {
        self.signers.push(signer.into());
    }

    pub fn signers(&self) -> &[SafeSigner] {
        &self.signers
    }

    pub fn len(&self) -> usize {
        self.signers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signers.is_empty()
    }

    /// Asks every signer owning `wallet` for a proof of `digest`, concurrently.
    ///
    /// Signers that are not owners and ineligible shared signers are skipped. Any other
    /// failure aborts the collection.
    #[instrument(skip_all, fields(wallet = %wallet.address(), %digest))]
    pub async fn collect(
        &self,
        wallet: &SafeWallet,
        digest: B256,
        ctx: &SigningContext,
    ) -> Result<ProofSet, SignerError> {
        let ctx = ctx.enter(wallet.address())?;

        let requests = self.signers.iter().filter(|signer| {
            let owner = wallet.is_owner(&signer.address());
            if !owner {
                debug!(signer = %signer.address(), "skipping signer that is not an owner");
            }
            owner
        });
        let results = join_all(requests.map(|signer| signer.sign(wallet, digest, &ctx))).await;

        let mut proofs = ProofSet::new(digest);
        for result in results {
            if let Some(proof) = result? {
                proofs
                    .insert(proof)
                    .map_err(|err| SignerError::signature(wallet.address(), digest, err))?;
            }
        }
        debug!(collected = proofs.len(), threshold = wallet.threshold(), "collected proofs");
        Ok(proofs)
    }

    /// Collects proofs and aggregates them against the wallet threshold.
    pub async fn sign(
        &self,
        wallet: &SafeWallet,
        digest: B256,
        ctx: &SigningContext,
    ) -> Result<CompositeSignature, SignerError> {
        let proofs = self.collect(wallet, digest, ctx).await?;
        let signature = proofs
            .aggregate(wallet.threshold())
            .map_err(|err| SignerError::signature(wallet.address(), digest, err))?;
        info!(
            wallet = %wallet.address(),
            %digest,
            signers = signature.signers().len(),
            "aggregated signature"
        );
        Ok(signature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{U256, b256};
    use alloy_signer_local::PrivateKeySigner;

    const DIGEST: B256 = b256!("0x4a5e1e4baab89f3a32518a88c31bc87f618f76673e2cc77ab2127b7afdeda33b");

    #[tokio::test]
    async fn test_non_owner_signers_are_skipped() {
        let owner = PrivateKeySigner::random();
        let stranger = PrivateKeySigner::random();
        let wallet =
            SafeWallet::new(Address::repeat_byte(0xaa), vec![owner.address()], 1, U256::ZERO)
                .unwrap();

        let registry = SignerRegistry::new()
            .with_signer(EoaSigner::new(stranger))
            .with_signer(EoaSigner::new(owner.clone()));
        let proofs = registry
            .collect(&wallet, DIGEST, &SigningContext::new(1))
            .await
            .unwrap();
        assert_eq!(proofs.signers().collect::<Vec<_>>(), vec![&owner.address()]);
    }

    #[tokio::test]
    async fn test_threshold_not_met_carries_context() {
        let owners = vec![Address::repeat_byte(1), Address::repeat_byte(2)];
        let wallet = SafeWallet::new(Address::repeat_byte(0xaa), owners, 2, U256::ZERO).unwrap();
        let registry = SignerRegistry::new().with_signer(
            EoaSigner::watch_only(Address::repeat_byte(1))
                .with_method(crate::SigningMethod::PreApproved),
        );

        let err = registry
            .sign(&wallet, DIGEST, &SigningContext::new(1))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            SignerError::ThresholdNotMet { wallet, digest, collected: 1, threshold: 2 }
                if wallet == Address::repeat_byte(0xaa) && digest == DIGEST
        ));
    }

    #[tokio::test]
    async fn test_unavailable_signer_is_not_skipped() {
        let owners = vec![Address::repeat_byte(1), Address::repeat_byte(2)];
        let wallet = SafeWallet::new(Address::repeat_byte(0xaa), owners, 1, U256::ZERO).unwrap();
        let registry = SignerRegistry::new()
            .with_signer(
                EoaSigner::watch_only(Address::repeat_byte(1))
                    .with_method(crate::SigningMethod::PreApproved),
            )
            .with_signer(EoaSigner::watch_only(Address::repeat_byte(2)));

        let err = registry
            .sign(&wallet, DIGEST, &SigningContext::new(1))
            .await
            .unwrap_err();
        assert!(matches!(err, SignerError::SigningUnavailable { .. }));
    }

    #[test]
    fn test_context_detects_revisited_wallet() {
        let ctx = SigningContext::new(1);
        let a = ctx.enter(Address::repeat_byte(0xa)).unwrap();
        let b = a.enter(Address::repeat_byte(0xb)).unwrap();
        assert_eq!(b.path(), &[Address::repeat_byte(0xa), Address::repeat_byte(0xb)]);

        let err = b.enter(Address::repeat_byte(0xa)).unwrap_err();
        assert!(matches!(err, SignerError::DelegationCycle { wallet, .. } if wallet == Address::repeat_byte(0xa)));
        // siblings do not share a path
        assert!(a.enter(Address::repeat_byte(0xc)).is_ok());
    }
}
