use alloy_primitives::{Address, B256, Bytes, Signature, U256};

use super::{EoaSignature, SignerKinds, SignerProof, WebAuthnSignature};
use crate::{MalformedReason, SafeError};

/// Length of one static table entry.
pub const ENTRY_LEN: usize = 65;

const WORD: usize = 32;

struct DynamicEntry {
    position: usize,
    signer: Address,
    offset: usize,
}

enum Slot {
    Ready(SignerProof),
    Pending(DynamicEntry),
}

/// Decodes a composite signature produced for `digest`.
///
/// Only the canonical layout is accepted: dynamic parts follow the static table
/// back-to-back, in table order, and end exactly at the end of `bytes`. Signers must be
/// strictly ascending. Dynamic entries of the WebAuthn signers in `kinds` must carry a
/// canonical assertion; all other dynamic entries are contract signatures.
pub fn decode(
    bytes: &[u8],
    digest: B256,
    kinds: &SignerKinds,
) -> Result<Vec<SignerProof>, SafeError> {
    if bytes.is_empty() {
        return Err(SafeError::malformed(0, MalformedReason::Empty));
    }

    let mut slots = Vec::new();
    let mut table_end = bytes.len();
    let mut position = 0;
    while position < table_end {
        let entry = bytes
            .get(position..position + ENTRY_LEN)
            .ok_or(SafeError::malformed(position, MalformedReason::Truncated))?;
        slots.push(decode_entry(entry, position, bytes.len(), digest)?);
        if let Some(Slot::Pending(dynamic)) = slots.last() {
            if dynamic.offset < position + ENTRY_LEN {
                return Err(SafeError::malformed(
                    position,
                    MalformedReason::OffsetOutOfBounds,
                ));
            }
            table_end = table_end.min(dynamic.offset);
        }
        position += ENTRY_LEN;
    }
    if position != table_end {
        // the first dynamic part starts inside a table entry
        return Err(SafeError::malformed(
            table_end,
            MalformedReason::NonCanonicalDynamicPart,
        ));
    }

    let mut cursor = table_end;
    let mut proofs = Vec::with_capacity(slots.len());
    for slot in slots {
        let dynamic = match slot {
            Slot::Ready(proof) => {
                proofs.push(proof);
                continue;
            }
            Slot::Pending(dynamic) => dynamic,
        };
        if dynamic.offset != cursor {
            return Err(SafeError::malformed(
                dynamic.position,
                MalformedReason::NonCanonicalDynamicPart,
            ));
        }
        let len_word = bytes
            .get(cursor..cursor + WORD)
            .ok_or(SafeError::malformed(cursor, MalformedReason::Truncated))?;
        let start = cursor + WORD;
        let payload = read_usize(len_word)
            .and_then(|len| bytes.get(start..start.checked_add(len)?))
            .ok_or(SafeError::malformed(cursor, MalformedReason::Truncated))?;
        cursor = start + payload.len();
        proofs.push(dynamic_proof(&dynamic, payload, kinds)?);
    }
    if cursor != bytes.len() {
        return Err(SafeError::malformed(cursor, MalformedReason::TrailingBytes));
    }

    check_ascending(&proofs)?;
    Ok(proofs)
}

fn decode_entry(
    entry: &[u8],
    position: usize,
    total_len: usize,
    digest: B256,
) -> Result<Slot, SafeError> {
    let (r, s, v) = (&entry[..WORD], &entry[WORD..2 * WORD], entry[2 * WORD]);
    let proof = match v {
        0 => {
            let signer = read_address(r, position)?;
            let offset = read_usize(s)
                .filter(|offset| *offset <= total_len)
                .ok_or(SafeError::malformed(
                    position,
                    MalformedReason::OffsetOutOfBounds,
                ))?;
            return Ok(Slot::Pending(DynamicEntry {
                position,
                signer,
                offset,
            }));
        }
        1 => SignerProof::Eoa {
            signer: read_address(r, position)?,
            signature: EoaSignature::PreApproved,
        },
        27 | 28 | 31 | 32 => {
            let y_parity = v == 28 || v == 32;
            let ecdsa = Signature::new(U256::from_be_slice(r), U256::from_be_slice(s), y_parity);
            let signature = if v > 30 {
                EoaSignature::EthSign(ecdsa)
            } else {
                EoaSignature::Digest(ecdsa)
            };
            let signer = signature
                .recover(digest)
                .and_then(Result::ok)
                .ok_or(SafeError::malformed(position, MalformedReason::Unrecoverable))?;
            SignerProof::Eoa { signer, signature }
        }
        other => {
            return Err(SafeError::malformed(
                position + 2 * WORD,
                MalformedReason::UnknownMarker(other),
            ));
        }
    };
    Ok(Slot::Ready(proof))
}

fn dynamic_proof(
    entry: &DynamicEntry,
    payload: &[u8],
    kinds: &SignerKinds,
) -> Result<SignerProof, SafeError> {
    let signer = entry.signer;
    let verifier = kinds.passkey_verifier(&signer);
    if verifier.is_none() && !kinds.is_shared(&signer) {
        return Ok(SignerProof::Contract {
            signer,
            signature: Bytes::copy_from_slice(payload),
        });
    }

    let signature = WebAuthnSignature::decode_canonical(payload).ok_or(SafeError::malformed(
        entry.position,
        MalformedReason::InvalidWebAuthnPayload,
    ))?;
    Ok(match verifier {
        Some(verifier) => SignerProof::Passkey {
            signer,
            verifier,
            signature,
        },
        None => SignerProof::Shared { signer, signature },
    })
}

pub(super) fn check_ascending(proofs: &[SignerProof]) -> Result<(), SafeError> {
    for pair in proofs.windows(2) {
        let (previous, signer) = (pair[0].signer(), pair[1].signer());
        if signer <= previous {
            return Err(SafeError::InvalidSignatureOrder { signer, previous });
        }
    }
    Ok(())
}

fn read_address(word: &[u8], position: usize) -> Result<Address, SafeError> {
    if word[..12].iter().any(|b| *b != 0) {
        return Err(SafeError::malformed(position, MalformedReason::DirtyAddressWord));
    }
    Ok(Address::from_slice(&word[12..]))
}

fn read_usize(word: &[u8]) -> Option<usize> {
    usize::try_from(U256::from_be_slice(word)).ok()
}
