use alloy_primitives::Bytes;
use safe_contracts::ERC1271_MAGIC_VALUE;
use safe_primitives::CallFailure;

/// Revert reasons older fallback handlers emit in front of the magic value when the
/// signature check itself passed.
const KNOWN_REVERT_REASONS: &[&str] = &["Hash not approved"];

/// Outcome of an `isValidSignature` static call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CallVerdict {
    /// Returned the magic value.
    Accepted,
    /// Returned, but not the magic value.
    ReturnedOther,
    /// Reverted with the magic value in the revert data.
    RevertedWithMagic,
    /// Reverted for any other reason.
    Reverted,
}

impl CallVerdict {
    pub fn from_result(result: &Result<Bytes, CallFailure>) -> Self {
        match result {
            Ok(output) if output.starts_with(&ERC1271_MAGIC_VALUE) => Self::Accepted,
            Ok(_) => Self::ReturnedOther,
            Err(failure) if revert_embeds_magic(&failure.revert_data) => Self::RevertedWithMagic,
            Err(_) => Self::Reverted,
        }
    }

    pub const fn is_authorized(self) -> bool {
        matches!(self, Self::Accepted | Self::RevertedWithMagic)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Accepted => "accepted",
            Self::ReturnedOther => "returned_other",
            Self::RevertedWithMagic => "reverted_with_magic",
            Self::Reverted => "reverted",
        }
    }
}

/// Revert data is the magic value, optionally preceded by a known reason string.
fn revert_embeds_magic(data: &[u8]) -> bool {
    if data.starts_with(&ERC1271_MAGIC_VALUE) {
        return true;
    }
    KNOWN_REVERT_REASONS.iter().any(|reason| {
        data.strip_prefix(reason.as_bytes())
            .is_some_and(|rest| rest.starts_with(&ERC1271_MAGIC_VALUE))
    })
}
