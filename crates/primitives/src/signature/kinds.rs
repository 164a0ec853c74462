use std::collections::{BTreeMap, BTreeSet};

use alloy_primitives::Address;
use safe_contracts::WEBAUTHN_SHARED_SIGNER_ADDRESS;

use super::SignerProof;

/// Owners whose dynamic entries carry a WebAuthn assertion.
///
/// Passkey, shared-signer and contract proofs share one wire layout, so the decoder is
/// told which owners are WebAuthn signers. Every other dynamic entry decodes as an opaque
/// contract signature.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SignerKinds {
    shared: BTreeSet<Address>,
    /// passkey signer proxy -> its P-256 verifier
    passkeys: BTreeMap<Address, Address>,
}

impl SignerKinds {
    /// No WebAuthn signers: every dynamic entry is a contract signature.
    pub const fn new() -> Self {
        Self {
            shared: BTreeSet::new(),
            passkeys: BTreeMap::new(),
        }
    }

    /// Only the shared signer at its canonical deployment.
    pub fn canonical() -> Self {
        Self::new().with_shared(WEBAUTHN_SHARED_SIGNER_ADDRESS)
    }

    /// Kinds of the WebAuthn signers among `proofs`.
    pub fn of<'a>(proofs: impl IntoIterator<Item = &'a SignerProof>) -> Self {
        let mut kinds = Self::new();
        for proof in proofs {
            kinds.learn(proof);
        }
        kinds
    }

    pub fn with_shared(mut self, signer: Address) -> Self {
        self.passkeys.remove(&signer);
        self.shared.insert(signer);
        self
    }

    pub fn with_passkey(mut self, signer: Address, verifier: Address) -> Self {
        self.shared.remove(&signer);
        self.passkeys.insert(signer, verifier);
        self
    }

    /// Records the kind of a WebAuthn proof. Other proofs leave the set unchanged.
    pub fn learn(&mut self, proof: &SignerProof) {
        match proof {
            SignerProof::Passkey {
                signer, verifier, ..
            } => {
                self.shared.remove(signer);
                self.passkeys.insert(*signer, *verifier);
            }
            SignerProof::Shared { signer, .. } => {
                self.passkeys.remove(signer);
                self.shared.insert(*signer);
            }
            SignerProof::Eoa { .. } | SignerProof::Contract { .. } => {}
        }
    }

    pub fn is_shared(&self, signer: &Address) -> bool {
        self.shared.contains(signer)
    }

    /// Verifier of a passkey signer, `None` if `signer` is not one.
    pub fn passkey_verifier(&self, signer: &Address) -> Option<Address> {
        self.passkeys.get(signer).copied()
    }
}
