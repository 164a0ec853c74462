//! Safe smart-account contract bindings.
//!
//! ABI definitions for the contracts the signing engine talks to, plus the canonical
//! (deterministically deployed) addresses the engine falls back to.
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub(crate) use alloy_sol_types::sol;

pub mod abi;
pub mod deployments;

pub use abi::{
    ISafe, ISafe4337Module, ISafeWebAuthnSharedSigner, ISignMessageLib, ISignatureValidator,
    multi_send::{IMultiSend, MultiSendCall, encode_multi_send},
};
pub use deployments::*;
