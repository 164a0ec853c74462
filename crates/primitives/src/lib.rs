//! Safe authorization primitives.
//!
//! Digest computation for transactions, messages and user operations, the Safe
//! signature layout, and aggregation of signer proofs into one composite signature.
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod call;
pub mod chain;
pub mod digest;
pub mod error;
pub mod signature;
pub mod wallet;

pub use call::{CallFailure, ChainCaller};
pub use chain::{Chain, Network, NetworkInfo, chain_id_to_network};
pub use digest::{
    Call, ContractSignatureScheme, EntryPointVersion, Operation, SafeOperation, SafeTransaction,
    eip191_message_hash, nested_wallet_digest, safe_message_digest, safe_message_preimage,
    safe_operation_digest, safe_tx_digest, safe_tx_preimage,
};
pub use error::{MalformedReason, SafeError};
pub use signature::{
    CompositeSignature, EoaSignature, EncodedSignature, ProofSet, SignerKinds, SignerProof,
    WebAuthnSignature, aggregate,
};
pub use wallet::SafeWallet;

/// Re-exported so downstream crates share the signature type.
pub use alloy_primitives::Signature;
