//! Canonical Safe deployments.
//!
//! Every address below comes from a deterministic (CREATE2) deployment, so it is the same
//! on each chain the contracts were deployed to.

use alloy_primitives::{Address, address};

/// ERC-1271 magic value for a valid signature:
/// `bytes4(keccak256("isValidSignature(bytes32,bytes)"))`
pub const ERC1271_MAGIC_VALUE: [u8; 4] = [0x16, 0x26, 0xba, 0x7e];

/// MultiSendCallOnly v1.4.1
pub const MULTI_SEND_CALL_ONLY_ADDRESS: Address =
    address!("0x9641d764fc13c8B624c04430C7356C1C7C8102e2");

/// MultiSend v1.4.1
pub const MULTI_SEND_ADDRESS: Address = address!("0x38869bf66a61cF6bDB996A6aE40D5853Fd43B526");

/// SignMessageLib v1.4.1
pub const SIGN_MESSAGE_LIB_ADDRESS: Address =
    address!("0xd53cd0aB83D845Ac265BE939c57F53AD838012c9");

/// Safe4337Module v0.2.0, bound to EntryPoint v0.6
pub const SAFE_4337_MODULE_V06_ADDRESS: Address =
    address!("0xa581c4A4DB7175302464fF3C06380BC3270b4037");

/// Safe4337Module v0.3.0, bound to EntryPoint v0.7
pub const SAFE_4337_MODULE_V07_ADDRESS: Address =
    address!("0x75cf11467937ce3F2f357CE24ffc3DBF8fD5c226");

pub const ENTRY_POINT_V06_ADDRESS: Address =
    address!("0x5FF137D4b0FDCD49DcA30c7CF57E578a026d2789");

pub const ENTRY_POINT_V07_ADDRESS: Address =
    address!("0x0000000071727De22E5E9d8BAf0edAc6f37da032");

/// SafeWebAuthnSharedSigner v0.2.1
pub const WEBAUTHN_SHARED_SIGNER_ADDRESS: Address =
    address!("0x94a4F6affBd8975951142c3999aEAB7ecee555c2");

/// FreshCryptoLib P-256 verifier v0.2.1, the default passkey verifier
pub const FCL_P256_VERIFIER_ADDRESS: Address =
    address!("0xA86e0054C51E4894D88762a017ECc5E5235f5DBA");
