//! Signer proofs and the Safe signature byte layout.
//!
//! A composite signature is a table of 65-byte entries sorted by signer address,
//! followed by the length-prefixed payloads of its dynamic entries:
//!
//! ```text
//! static  entry : r(32) ‖ s(32) ‖ v(1)
//! dynamic header: signer(32, left padded) ‖ offset(32) ‖ 0x00
//! dynamic part  : len(32) ‖ payload(len)
//! ```

mod aggregate;
mod codec;
mod kinds;

pub use aggregate::{CompositeSignature, ProofSet, aggregate};
pub use codec::{ENTRY_LEN, decode};
pub use kinds::SignerKinds;

use alloy_primitives::{Address, B256, Bytes, Signature, U256, eip191_hash_message};
use alloy_sol_types::SolValue;
use safe_contracts::WEBAUTHN_SHARED_SIGNER_ADDRESS;

use crate::SafeError;

alloy_sol_types::sol! {
    /// Contract-signature payload verified by WebAuthn signers
    #[derive(Debug, PartialEq, Eq)]
    struct WebAuthnPayload {
        bytes authenticatorData;
        string clientDataFields;
        uint256[2] rs;
    }
}

/// Static-table proof kinds of an externally owned account.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EoaSignature {
    /// ECDSA over the raw digest (v = 27/28).
    Digest(Signature),
    /// ECDSA over the EIP-191 prefixed digest (v = 31/32).
    EthSign(Signature),
    /// Digest approved on-chain through `approveHash` (v = 1).
    PreApproved,
}

impl EoaSignature {
    /// Recovers the signer of `digest`. `None` for pre-approved hashes, which carry no
    /// signature.
    pub fn recover(&self, digest: B256) -> Option<Result<Address, SafeError>> {
        let (signature, hash) = match self {
            Self::Digest(signature) => (signature, digest),
            Self::EthSign(signature) => (signature, eip191_hash_message(digest)),
            Self::PreApproved => return None,
        };
        Some(
            signature
                .recover_address_from_prehash(&hash)
                .map_err(|_| SafeError::malformed(0, crate::MalformedReason::Unrecoverable)),
        )
    }
}

/// WebAuthn assertion in the form the on-chain P-256 verifiers consume.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WebAuthnSignature {
    pub authenticator_data: Bytes,
    /// Client data JSON fields that follow `"challenge":"..."`, without the leading comma
    /// and the closing brace.
    pub client_data_fields: String,
    pub r: U256,
    pub s: U256,
}

impl WebAuthnSignature {
    /// `abi.encode(authenticatorData, clientDataFields, [r, s])`.
    pub fn abi_encode(&self) -> Bytes {
        WebAuthnPayload {
            authenticatorData: self.authenticator_data.clone(),
            clientDataFields: self.client_data_fields.clone(),
            rs: [self.r, self.s],
        }
        .abi_encode_params()
        .into()
    }

    /// Decodes `payload` only if it is exactly the canonical encoding of an assertion.
    pub fn decode_canonical(payload: &[u8]) -> Option<Self> {
        let decoded = WebAuthnPayload::abi_decode_params(payload).ok()?;
        let signature = Self {
            authenticator_data: decoded.authenticatorData,
            client_data_fields: decoded.clientDataFields,
            r: decoded.rs[0],
            s: decoded.rs[1],
        };
        (signature.abi_encode().as_ref() == payload).then_some(signature)
    }
}

/// One signer's contribution towards a digest.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SignerProof {
    /// Owner key held outside the chain.
    Eoa {
        signer: Address,
        signature: EoaSignature,
    },
    /// Contract owner validating `signature` through ERC-1271, typically a nested Safe
    /// whose composite signature is carried as the payload.
    Contract { signer: Address, signature: Bytes },
    /// WebAuthn signer proxy owning the Safe.
    ///
    /// `verifier` is the P-256 verifier the proxy was deployed with. The proxy holds it
    /// on-chain, so it is not part of the encoded signature.
    Passkey {
        signer: Address,
        verifier: Address,
        signature: WebAuthnSignature,
    },
    /// Shared WebAuthn signer slot; the verifier is read from the Safe's storage.
    Shared {
        signer: Address,
        signature: WebAuthnSignature,
    },
}

/// Entry of a composite signature before offsets are assigned.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EncodedSignature {
    Static([u8; ENTRY_LEN]),
    Dynamic { signer: Address, payload: Bytes },
}

impl SignerProof {
    /// Proof of a shared signer at its canonical deployment.
    pub const fn shared(signature: WebAuthnSignature) -> Self {
        Self::Shared {
            signer: WEBAUTHN_SHARED_SIGNER_ADDRESS,
            signature,
        }
    }

    /// Owner address the verifier attributes this proof to.
    pub const fn signer(&self) -> Address {
        match self {
            Self::Eoa { signer, .. }
            | Self::Contract { signer, .. }
            | Self::Passkey { signer, .. }
            | Self::Shared { signer, .. } => *signer,
        }
    }

    pub const fn is_dynamic(&self) -> bool {
        !matches!(self, Self::Eoa { .. })
    }

    /// Checks that an ECDSA proof recovers to its claimed signer for `digest`.
    ///
    /// Other kinds are verified on-chain and always pass.
    pub fn verify(&self, digest: B256) -> Result<(), SafeError> {
        let Self::Eoa { signer, signature } = self else {
            return Ok(());
        };
        match signature.recover(digest) {
            Some(Ok(recovered)) if recovered != *signer => Err(SafeError::SignerMismatch {
                expected: *signer,
                recovered,
            }),
            Some(Err(err)) => Err(err),
            _ => Ok(()),
        }
    }

    /// Encodes the proof into its table entry (and payload, for dynamic kinds).
    pub fn encode(&self) -> EncodedSignature {
        match self {
            Self::Eoa { signer, signature } => {
                let mut entry = [0u8; ENTRY_LEN];
                match signature {
                    EoaSignature::Digest(sig) => {
                        write_rs(&mut entry, sig);
                        entry[64] = 27 + sig.v() as u8;
                    }
                    EoaSignature::EthSign(sig) => {
                        write_rs(&mut entry, sig);
                        entry[64] = 31 + sig.v() as u8;
                    }
                    EoaSignature::PreApproved => {
                        entry[12..32].copy_from_slice(signer.as_slice());
                        entry[64] = 1;
                    }
                }
                EncodedSignature::Static(entry)
            }
            Self::Contract { signer, signature } => EncodedSignature::Dynamic {
                signer: *signer,
                payload: signature.clone(),
            },
            Self::Passkey {
                signer, signature, ..
            }
            | Self::Shared { signer, signature } => {
                EncodedSignature::Dynamic {
                    signer: *signer,
                    payload: signature.abi_encode(),
                }
            }
        }
    }

    /// Stand-alone encoding: a composite signature holding only this proof.
    pub fn to_bytes(&self) -> Bytes {
        CompositeSignature::assemble(std::slice::from_ref(self)).into()
    }

    /// Inverse of [`Self::to_bytes`]. ECDSA signers are recovered against `digest`;
    /// dynamic entries are typed by `kinds`.
    pub fn from_bytes(bytes: &[u8], digest: B256, kinds: &SignerKinds) -> Result<Self, SafeError> {
        let mut proofs = decode(bytes, digest, kinds)?;
        match proofs.len() {
            1 => Ok(proofs.remove(0)),
            _ => Err(SafeError::malformed(
                ENTRY_LEN,
                crate::MalformedReason::TrailingBytes,
            )),
        }
    }
}

fn write_rs(entry: &mut [u8; ENTRY_LEN], signature: &Signature) {
    entry[..32].copy_from_slice(&signature.r().to_be_bytes::<32>());
    entry[32..64].copy_from_slice(&signature.s().to_be_bytes::<32>());
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{b256, bytes};
    use alloy_signer::SignerSync;
    use alloy_signer_local::PrivateKeySigner;

    const DIGEST: B256 = b256!("0x9c1185a5c5e9fc54612808977ee8f548b2258d31aaaaaaaaaaaaaaaaaaaaaaaa");

    fn passkey_signature() -> WebAuthnSignature {
        WebAuthnSignature {
            authenticator_data: bytes!(
                "49960de5880e8c687434170f6476605b8fe4aeb9a28632c7995cf3ba831d97630500000000"
            ),
            client_data_fields: r#""origin":"http://localhost:3000","crossOrigin":false"#
                .to_string(),
            r: U256::from(11),
            s: U256::from(13),
        }
    }

    #[test]
    fn test_eoa_entries_use_safe_markers() {
        let key = PrivateKeySigner::random();
        let sig = key.sign_hash_sync(&DIGEST).unwrap();

        let raw = SignerProof::Eoa {
            signer: key.address(),
            signature: EoaSignature::Digest(sig),
        };
        let EncodedSignature::Static(entry) = raw.encode() else {
            panic!("eoa proofs are static");
        };
        assert_eq!(entry, sig.as_bytes());
        assert!(entry[64] == 27 || entry[64] == 28);

        let eth_sign = SignerProof::Eoa {
            signer: key.address(),
            signature: EoaSignature::EthSign(sig),
        };
        let EncodedSignature::Static(entry) = eth_sign.encode() else {
            panic!("eoa proofs are static");
        };
        assert_eq!(entry[64], sig.as_bytes()[64] + 4);

        let approved = SignerProof::Eoa {
            signer: key.address(),
            signature: EoaSignature::PreApproved,
        };
        let EncodedSignature::Static(entry) = approved.encode() else {
            panic!("eoa proofs are static");
        };
        assert_eq!(&entry[12..32], key.address().as_slice());
        assert_eq!(&entry[32..64], &[0u8; 32]);
        assert_eq!(entry[64], 1);
    }

    #[test]
    fn test_verify_detects_wrong_signer() {
        let key = PrivateKeySigner::random();
        let other = PrivateKeySigner::random();
        let proof = SignerProof::Eoa {
            signer: other.address(),
            signature: EoaSignature::Digest(key.sign_hash_sync(&DIGEST).unwrap()),
        };
        assert_eq!(
            proof.verify(DIGEST),
            Err(SafeError::SignerMismatch {
                expected: other.address(),
                recovered: key.address(),
            })
        );

        let eth_sign = SignerProof::Eoa {
            signer: key.address(),
            signature: EoaSignature::EthSign(key.sign_message_sync(DIGEST.as_slice()).unwrap()),
        };
        assert_eq!(eth_sign.verify(DIGEST), Ok(()));
    }

    #[test]
    fn test_webauthn_payload_is_canonical() {
        let signature = passkey_signature();
        let encoded = signature.abi_encode();
        assert_eq!(WebAuthnSignature::decode_canonical(&encoded), Some(signature));

        let mut padded = encoded.to_vec();
        padded.extend_from_slice(&[0u8; 32]);
        assert_eq!(WebAuthnSignature::decode_canonical(&padded), None);
        assert_eq!(WebAuthnSignature::decode_canonical(&[0xde, 0xad]), None);
    }

    #[test]
    fn test_single_proof_bytes() {
        let proof = SignerProof::Passkey {
            signer: Address::repeat_byte(0x42),
            verifier: Address::repeat_byte(0x0e),
            signature: passkey_signature(),
        };
        let bytes = proof.to_bytes();
        let payload = passkey_signature().abi_encode();

        assert_eq!(bytes.len(), ENTRY_LEN + 32 + payload.len());
        assert_eq!(U256::from_be_slice(&bytes[32..64]), U256::from(ENTRY_LEN));
        assert_eq!(
            SignerProof::from_bytes(&bytes, DIGEST, &SignerKinds::of([&proof])),
            Ok(proof)
        );

        let shared = SignerProof::shared(passkey_signature());
        assert_eq!(
            SignerProof::from_bytes(&shared.to_bytes(), DIGEST, &SignerKinds::canonical()),
            Ok(shared)
        );
    }

    #[test]
    fn test_same_wire_bytes_decode_by_signer_kind() {
        let signer = Address::repeat_byte(0x42);
        let shared = SignerProof::Shared {
            signer,
            signature: passkey_signature(),
        };
        let contract = SignerProof::Contract {
            signer,
            signature: passkey_signature().abi_encode(),
        };
        assert_eq!(shared.to_bytes(), contract.to_bytes());

        let bytes = shared.to_bytes();
        assert_eq!(
            SignerProof::from_bytes(&bytes, DIGEST, &SignerKinds::new().with_shared(signer)),
            Ok(shared)
        );
        assert_eq!(
            SignerProof::from_bytes(&bytes, DIGEST, &SignerKinds::new()),
            Ok(contract)
        );
        assert_eq!(
            SignerProof::from_bytes(
                &bytes,
                DIGEST,
                &SignerKinds::new().with_passkey(signer, Address::repeat_byte(0x0e))
            ),
            Ok(SignerProof::Passkey {
                signer,
                verifier: Address::repeat_byte(0x0e),
                signature: passkey_signature(),
            })
        );
    }

    #[test]
    fn test_webauthn_signer_requires_assertion_payload() {
        let signer = Address::repeat_byte(0x42);
        let contract = SignerProof::Contract {
            signer,
            signature: bytes!("c0ffee"),
        };
        assert_eq!(
            SignerProof::from_bytes(
                &contract.to_bytes(),
                DIGEST,
                &SignerKinds::new().with_shared(signer)
            ),
            Err(SafeError::malformed(
                0,
                crate::MalformedReason::InvalidWebAuthnPayload
            ))
        );
    }
}
