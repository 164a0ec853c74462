//! `sol!` interfaces for the Safe contracts.

pub mod multi_send;
mod safe;
mod safe_4337;
mod sign_message_lib;
mod signature_validator;
mod webauthn;

pub use safe::ISafe;
pub use safe_4337::ISafe4337Module;
pub use sign_message_lib::ISignMessageLib;
pub use signature_validator::{ISignatureValidator, LEGACY_EIP1271_MAGIC_VALUE};
pub use webauthn::ISafeWebAuthnSharedSigner;
