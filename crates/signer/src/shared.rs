use alloy_primitives::{Address, B256, U256};
use alloy_sol_types::{SolCall, SolValue};
use safe_contracts::{ISafeWebAuthnSharedSigner, WEBAUTHN_SHARED_SIGNER_ADDRESS};
use safe_primitives::{CallFailure, ChainCaller, SafeWallet, SignerProof};
use tracing::debug;

use crate::{Passkey, PasskeyCredential, SignerError};

/// Passkey configuration a Safe stored in the shared signer.
pub type SharedSignerSlot = ISafeWebAuthnSharedSigner::Signer;

/// Whether `credential` may sign for a wallet through the shared signer at `shared_signer`.
///
/// Holds iff the shared signer is one of the wallet's owners and the wallet's slot holds
/// the credential's coordinates and verifier. The verifier falls back to the chain default
/// when the credential has none; an unsupported chain without a custom verifier is never
/// eligible.
pub fn is_eligible(
    owners: &[Address],
    shared_signer: Address,
    slot: &SharedSignerSlot,
    credential: &PasskeyCredential,
    chain_id: u64,
) -> bool {
    if !owners.contains(&shared_signer) {
        return false;
    }
    let Ok(verifier) = credential.verifier(chain_id) else {
        return false;
    };
    slot.x == credential.x
        && slot.y == credential.y
        && slot.verifiers == U256::from_be_slice(verifier.as_slice())
}

/// Reads the slot `wallet` configured in the shared signer at `shared_signer`.
pub async fn read_slot(
    caller: &dyn ChainCaller,
    shared_signer: Address,
    wallet: Address,
) -> Result<SharedSignerSlot, SignerError> {
    let call_error = |source| SignerError::Call {
        contract: shared_signer,
        wallet,
        source,
    };
    let data = ISafeWebAuthnSharedSigner::getConfigurationCall { account: wallet }.abi_encode();
    let output = caller
        .call(shared_signer, data.into())
        .await
        .map_err(call_error)?;
    SharedSignerSlot::abi_decode(&output).map_err(|err| {
        call_error(CallFailure::new(
            format!("undecodable getConfiguration output: {err}"),
            output.clone(),
        ))
    })
}

/// Passkey signing through the shared signer slot of the wallet being signed for.
#[derive(Clone, Debug)]
pub struct SharedSigner {
    address: Address,
    passkey: Passkey,
}

impl SharedSigner {
    /// Shared signer at its canonical deployment.
    pub const fn new(passkey: Passkey) -> Self {
        Self::at(WEBAUTHN_SHARED_SIGNER_ADDRESS, passkey)
    }

    pub const fn at(address: Address, passkey: Passkey) -> Self {
        Self { address, passkey }
    }

    pub const fn address(&self) -> Address {
        self.address
    }

    /// Signs `digest` for `wallet`, or returns `None` when the passkey is not the one the
    /// wallet configured.
    pub async fn sign(
        &self,
        wallet: &SafeWallet,
        digest: B256,
        chain_id: u64,
        caller: &dyn ChainCaller,
    ) -> Result<Option<SignerProof>, SignerError> {
        if !wallet.is_owner(&self.address) {
            debug!(wallet = %wallet.address(), shared_signer = %self.address, "shared signer is not an owner");
            return Ok(None);
        }

        let slot = read_slot(caller, self.address, wallet.address()).await?;
        if !is_eligible(
            wallet.owners(),
            self.address,
            &slot,
            self.passkey.credential(),
            chain_id,
        ) {
            debug!(wallet = %wallet.address(), shared_signer = %self.address, "passkey does not match the configured slot");
            return Ok(None);
        }

        let signature = self.passkey.assert(self.address, digest).await?;
        Ok(Some(SignerProof::Shared {
            signer: self.address,
            signature,
        }))
    }
}
