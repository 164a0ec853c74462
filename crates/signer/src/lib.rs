//! Signer proofs for Safe owners.
//!
//! [`SignerRegistry`] holds the signers available to a caller and turns a digest into a
//! composite signature: EOA keys sign directly, nested Safes recurse through their own
//! registry, passkeys go through a WebAuthn ceremony, and the shared signer is used only
//! when the wallet's slot holds the presented passkey.
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![cfg_attr(docsrs, feature(doc_cfg))]

mod contract;
mod eoa;
mod error;
pub mod passkey;
mod registry;
pub mod shared;

pub use contract::ContractSigner;
pub use eoa::{EoaSigner, SigningMethod};
pub use error::SignerError;
pub use passkey::{
    Passkey, PasskeyAuthenticator, PasskeyCredential, PasskeySigner, SoftwareAuthenticator,
    WebAuthnAssertion,
};
pub use registry::{SafeSigner, SignerRegistry, SigningContext};
pub use shared::{SharedSigner, SharedSignerSlot, is_eligible};
