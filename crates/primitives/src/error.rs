use alloy_primitives::Address;

/// Errors raised while hashing payloads or encoding, decoding and aggregating signatures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SafeError {
    /// A transaction or operation field does not fit the width the verifier expects.
    #[error("invalid payload: `{field}` {reason}")]
    InvalidPayload { field: &'static str, reason: String },

    /// Fewer distinct proofs than the threshold.
    #[error("threshold not met: {collected} of {threshold} signatures collected")]
    ThresholdNotMet { collected: usize, threshold: usize },

    /// Signer addresses are not strictly ascending (out of order or duplicated).
    #[error("invalid signature order: signer {signer} follows {previous}")]
    InvalidSignatureOrder { signer: Address, previous: Address },

    /// The signature bytes violate the static/dynamic layout.
    #[error("malformed signature at byte {position}: {reason}")]
    MalformedSignature {
        position: usize,
        reason: MalformedReason,
    },

    /// The recovered ECDSA signer is not the claimed signer.
    #[error("signature for {expected} recovers to {recovered}")]
    SignerMismatch { expected: Address, recovered: Address },

    /// The chain id is not in the network table.
    #[error("chain not supported: {0}")]
    UnsupportedChain(u64),
}

impl SafeError {
    pub(crate) fn invalid_payload(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidPayload {
            field,
            reason: reason.into(),
        }
    }

    pub(crate) const fn malformed(position: usize, reason: MalformedReason) -> Self {
        Self::MalformedSignature { position, reason }
    }
}

/// Why a signature blob failed to decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum MalformedReason {
    #[display("input truncated")]
    Truncated,
    #[display("dynamic offset points outside the buffer")]
    OffsetOutOfBounds,
    #[display("dynamic parts are not contiguous")]
    NonCanonicalDynamicPart,
    #[display("unknown signature marker {_0}")]
    UnknownMarker(u8),
    #[display("address word has non-zero high bytes")]
    DirtyAddressWord,
    #[display("trailing bytes after the last dynamic part")]
    TrailingBytes,
    #[display("payload of a WebAuthn signer is not a canonical assertion")]
    InvalidWebAuthnPayload,
    #[display("ECDSA signature is not recoverable")]
    Unrecoverable,
    #[display("empty signature")]
    Empty,
}
