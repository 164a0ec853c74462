use std::{collections::BTreeMap, ops::Deref};

use alloy_primitives::{Address, B256, Bytes, U256};

use super::{EncodedSignature, SignerKinds, SignerProof, codec};
use crate::SafeError;

/// Signature blob accepted by `checkSignatures` / `execTransaction`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompositeSignature {
    bytes: Bytes,
    signers: Vec<Address>,
}

impl CompositeSignature {
    /// Lays `proofs` out in the given order. Callers sort and deduplicate first.
    pub(crate) fn assemble(proofs: &[SignerProof]) -> Self {
        let entries: Vec<EncodedSignature> = proofs.iter().map(SignerProof::encode).collect();

        let mut table = Vec::with_capacity(entries.len() * codec::ENTRY_LEN);
        let mut dynamic = Vec::new();
        let table_len = entries.len() * codec::ENTRY_LEN;
        for entry in &entries {
            match entry {
                EncodedSignature::Static(bytes) => table.extend_from_slice(bytes),
                EncodedSignature::Dynamic { signer, payload } => {
                    let offset = U256::from(table_len + dynamic.len());
                    table.extend_from_slice(&[0u8; 12]);
                    table.extend_from_slice(signer.as_slice());
                    table.extend_from_slice(&offset.to_be_bytes::<32>());
                    table.push(0);

                    dynamic.extend_from_slice(&U256::from(payload.len()).to_be_bytes::<32>());
                    dynamic.extend_from_slice(payload);
                }
            }
        }
        table.extend_from_slice(&dynamic);

        Self {
            bytes: table.into(),
            signers: proofs.iter().map(SignerProof::signer).collect(),
        }
    }

    /// Decodes and validates `bytes` produced for `digest`, reading the dynamic entries of
    /// the WebAuthn signers in `kinds` as assertions.
    pub fn decode(bytes: Bytes, digest: B256, kinds: &SignerKinds) -> Result<Self, SafeError> {
        let proofs = codec::decode(&bytes, digest, kinds)?;
        Ok(Self {
            signers: proofs.iter().map(SignerProof::signer).collect(),
            bytes,
        })
    }

    /// Signer addresses in table order (strictly ascending).
    pub fn signers(&self) -> &[Address] {
        &self.signers
    }

    pub const fn as_bytes(&self) -> &Bytes {
        &self.bytes
    }

    pub fn into_bytes(self) -> Bytes {
        self.bytes
    }
}

impl Deref for CompositeSignature {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.bytes
    }
}

impl From<CompositeSignature> for Bytes {
    fn from(signature: CompositeSignature) -> Self {
        signature.bytes
    }
}

/// Orders `proofs` by signer and concatenates them into one composite signature.
///
/// Fails with [`SafeError::ThresholdNotMet`] below `threshold` proofs and with
/// [`SafeError::InvalidSignatureOrder`] if two proofs share a signer.
pub fn aggregate(proofs: &[SignerProof], threshold: usize) -> Result<CompositeSignature, SafeError> {
    if threshold == 0 {
        return Err(SafeError::invalid_payload("threshold", "must be at least 1"));
    }
    if proofs.len() < threshold {
        return Err(SafeError::ThresholdNotMet {
            collected: proofs.len(),
            threshold,
        });
    }

    let mut sorted = proofs.to_vec();
    sorted.sort_by_key(SignerProof::signer);
    codec::check_ascending(&sorted)?;

    Ok(CompositeSignature::assemble(&sorted))
}

/// Proofs collected for one digest, possibly across sessions.
///
/// One proof per signer; inserting for a signer already present replaces the old proof.
/// The set remembers which signers are WebAuthn signers so that composite signatures it
/// aggregated decode back into the same proofs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProofSet {
    digest: B256,
    kinds: SignerKinds,
    proofs: BTreeMap<Address, SignerProof>,
}

impl ProofSet {
    /// Empty set that knows the canonical shared signer.
    pub fn new(digest: B256) -> Self {
        Self::with_kinds(digest, SignerKinds::canonical())
    }

    pub const fn with_kinds(digest: B256, kinds: SignerKinds) -> Self {
        Self {
            digest,
            kinds,
            proofs: BTreeMap::new(),
        }
    }

    pub const fn digest(&self) -> B256 {
        self.digest
    }

    pub const fn kinds(&self) -> &SignerKinds {
        &self.kinds
    }

    /// Adds `proof` after checking ECDSA proofs recover to their signer for this digest.
    /// Returns the proof it replaced, if any.
    pub fn insert(&mut self, proof: SignerProof) -> Result<Option<SignerProof>, SafeError> {
        proof.verify(self.digest)?;
        self.kinds.learn(&proof);
        Ok(self.proofs.insert(proof.signer(), proof))
    }

    /// Adds every proof decoded from an existing composite signature for this digest.
    pub fn extend_from_bytes(&mut self, bytes: &[u8]) -> Result<(), SafeError> {
        for proof in codec::decode(bytes, self.digest, &self.kinds)? {
            self.proofs.insert(proof.signer(), proof);
        }
        Ok(())
    }

    pub fn remove(&mut self, signer: &Address) -> Option<SignerProof> {
        self.proofs.remove(signer)
    }

    pub fn contains(&self, signer: &Address) -> bool {
        self.proofs.contains_key(signer)
    }

    pub fn len(&self) -> usize {
        self.proofs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.proofs.is_empty()
    }

    /// Signers in ascending order.
    pub fn signers(&self) -> impl Iterator<Item = &Address> {
        self.proofs.keys()
    }

    pub fn proofs(&self) -> impl Iterator<Item = &SignerProof> {
        self.proofs.values()
    }

    /// Aggregates a snapshot of the set.
    pub fn aggregate(&self, threshold: usize) -> Result<CompositeSignature, SafeError> {
        let snapshot: Vec<SignerProof> = self.proofs.values().cloned().collect();
        aggregate(&snapshot, threshold)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signature::{EoaSignature, WebAuthnSignature};
    use alloy_primitives::{Signature, b256};
    use alloy_signer::SignerSync;
    use alloy_signer_local::PrivateKeySigner;
    use proptest::prelude::*;

    const DIGEST: B256 = b256!("0x5fe2a7e1b0bd7bd8d9c0d4c54fa1c1ef6e05b4c2f8ad6a6df0e5c1e4ab3a9f01");

    fn key(seed: u8) -> PrivateKeySigner {
        PrivateKeySigner::from_bytes(&B256::left_padding_from(&[seed])).unwrap()
    }

    fn eoa(seed: u8) -> SignerProof {
        let key = key(seed);
        SignerProof::Eoa {
            signer: key.address(),
            signature: EoaSignature::Digest(key.sign_hash_sync(&DIGEST).unwrap()),
        }
    }

    fn contract(byte: u8, payload: &[u8]) -> SignerProof {
        SignerProof::Contract {
            signer: Address::repeat_byte(byte),
            signature: Bytes::copy_from_slice(payload),
        }
    }

    #[test]
    fn test_threshold_gate() {
        let proofs = [eoa(1), eoa(2)];
        assert_eq!(
            aggregate(&proofs, 3),
            Err(SafeError::ThresholdNotMet {
                collected: 2,
                threshold: 3,
            })
        );
        assert!(aggregate(&proofs, 2).is_ok());
        assert!(aggregate(&proofs, 0).is_err());
    }

    #[test]
    fn test_duplicate_signer_rejected() {
        let signer = Address::repeat_byte(0x10);
        let result = aggregate(&[contract(0x10, b"a"), contract(0x10, b"b")], 1);
        assert_eq!(
            result,
            Err(SafeError::InvalidSignatureOrder {
                signer,
                previous: signer,
            })
        );
    }

    #[test]
    fn test_offsets_follow_static_table() {
        let proofs = [
            contract(0x30, &[0xaa; 40]),
            contract(0x20, &[0xbb; 7]),
            eoa(5),
        ];
        let composite = aggregate(&proofs, 3).unwrap();

        let table_len = 3 * codec::ENTRY_LEN;
        let mut expected_offset = table_len;
        for (i, signer) in composite.signers().iter().enumerate() {
            let entry = &composite[i * codec::ENTRY_LEN..(i + 1) * codec::ENTRY_LEN];
            if entry[64] != 0 {
                continue;
            }
            assert_eq!(&entry[12..32], signer.as_slice());
            assert_eq!(U256::from_be_slice(&entry[32..64]), U256::from(expected_offset));
            let len = U256::from_be_slice(&composite[expected_offset..expected_offset + 32]);
            expected_offset += 32 + len.to::<usize>();
        }
        assert_eq!(expected_offset, composite.len());
        assert_eq!(
            CompositeSignature::decode(composite.as_bytes().clone(), DIGEST, &SignerKinds::new()),
            Ok(composite)
        );
    }

    #[test]
    fn test_proof_set() {
        let mut set = ProofSet::new(DIGEST);
        assert!(set.is_empty());

        let wrong = SignerProof::Eoa {
            signer: key(2).address(),
            signature: EoaSignature::Digest(key(1).sign_hash_sync(&DIGEST).unwrap()),
        };
        assert!(matches!(set.insert(wrong), Err(SafeError::SignerMismatch { .. })));

        assert_eq!(set.insert(eoa(1)), Ok(None));
        assert_eq!(set.insert(eoa(1)), Ok(Some(eoa(1))));
        assert_eq!(set.len(), 1);
        assert!(matches!(
            set.aggregate(2),
            Err(SafeError::ThresholdNotMet { collected: 1, .. })
        ));

        let mut restored = ProofSet::new(DIGEST);
        set.insert(contract(0x01, b"nested")).unwrap();
        restored.extend_from_bytes(&set.aggregate(2).unwrap()).unwrap();
        assert_eq!(restored, set);
        assert!(restored.contains(&Address::repeat_byte(0x01)));
    }

    #[test]
    fn test_proof_set_restores_webauthn_kinds() {
        let signer = Address::repeat_byte(0x44);
        let verifier = Address::repeat_byte(0x45);
        let passkey = SignerProof::Passkey {
            signer,
            verifier,
            signature: WebAuthnSignature {
                authenticator_data: Bytes::from(vec![0x49; 37]),
                client_data_fields: r#""origin":"https://app.example""#.to_string(),
                r: U256::from(7),
                s: U256::from(8),
            },
        };

        let mut set = ProofSet::new(DIGEST);
        set.insert(passkey.clone()).unwrap();
        set.insert(eoa(3)).unwrap();
        assert_eq!(set.kinds().passkey_verifier(&signer), Some(verifier));

        let composite = set.aggregate(2).unwrap();
        let mut restored = ProofSet::with_kinds(DIGEST, set.kinds().clone());
        restored.extend_from_bytes(&composite).unwrap();
        assert_eq!(restored, set);

        // without the kinds the same bytes only read as a contract signature
        let mut blind = ProofSet::with_kinds(DIGEST, SignerKinds::new());
        blind.extend_from_bytes(&composite).unwrap();
        assert!(matches!(
            blind.proofs().find(|proof| proof.signer() == signer),
            Some(SignerProof::Contract { .. })
        ));
    }

    fn arb_proof() -> impl Strategy<Value = SignerProof> {
        prop_oneof![
            (1u8..=255).prop_map(eoa),
            (1u8..=255, any::<bool>()).prop_map(|(seed, approved)| {
                let key = key(seed);
                let signature = if approved {
                    EoaSignature::PreApproved
                } else {
                    EoaSignature::EthSign(key.sign_message_sync(DIGEST.as_slice()).unwrap())
                };
                SignerProof::Eoa {
                    signer: key.address(),
                    signature,
                }
            }),
            (any::<[u8; 20]>(), proptest::collection::vec(any::<u8>(), 0..200)).prop_map(
                |(signer, payload)| SignerProof::Contract {
                    signer: Address::from(signer),
                    signature: payload.into(),
                }
            ),
            (
                any::<[u8; 20]>(),
                proptest::collection::vec(any::<u8>(), 37..80),
                "[a-z\":,]{0,60}",
                any::<[u8; 32]>(),
                any::<[u8; 32]>(),
            )
                .prop_map(|(signer, data, fields, r, s)| SignerProof::Passkey {
                    signer: Address::from(signer),
                    verifier: Address::repeat_byte(0xfc),
                    signature: WebAuthnSignature {
                        authenticator_data: data.into(),
                        client_data_fields: fields,
                        r: U256::from_be_bytes(r),
                        s: U256::from_be_bytes(s),
                    },
                }),
        ]
    }

    proptest! {
        #[test]
        fn proptest_single_proof_roundtrip(proof in arb_proof()) {
            let kinds = SignerKinds::of([&proof]);
            prop_assert_eq!(SignerProof::from_bytes(&proof.to_bytes(), DIGEST, &kinds), Ok(proof));
        }

        #[test]
        fn proptest_aggregate_orders_signers(proofs in proptest::collection::vec(arb_proof(), 1..8)) {
            let mut distinct: Vec<SignerProof> = Vec::new();
            for proof in proofs {
                if distinct.iter().all(|p| p.signer() != proof.signer()) {
                    distinct.push(proof);
                }
            }

            let composite = aggregate(&distinct, distinct.len()).unwrap();
            let kinds = SignerKinds::of(&distinct);
            let decoded = CompositeSignature::decode(composite.as_bytes().clone(), DIGEST, &kinds).unwrap();
            prop_assert!(decoded.signers().windows(2).all(|w| w[0] < w[1]));
            prop_assert_eq!(decoded.signers().len(), distinct.len());

            let below = aggregate(&distinct[1..], distinct.len());
            let is_threshold_error = matches!(below, Err(SafeError::ThresholdNotMet { .. }));
            prop_assert!(is_threshold_error);
        }
    }

    #[test]
    fn test_digest_entry_matches_alloy_encoding() {
        // alloy signatures encode parity as 27/28 in `as_bytes`
        let sig = key(9).sign_hash_sync(&DIGEST).unwrap();
        let proof = SignerProof::Eoa {
            signer: key(9).address(),
            signature: EoaSignature::Digest(Signature::new(sig.r(), sig.s(), sig.v())),
        };
        assert_eq!(&proof.to_bytes()[..], &sig.as_bytes()[..]);
    }
}
