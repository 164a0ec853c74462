//! Account-abstraction (`SafeOp`) digests for the Safe4337 module.

use alloy_primitives::{Address, B256, Bytes, U256, keccak256};
use alloy_sol_types::SolCall;
use safe_contracts::{
    ENTRY_POINT_V06_ADDRESS, ENTRY_POINT_V07_ADDRESS, ISafe4337Module,
    SAFE_4337_MODULE_V06_ADDRESS, SAFE_4337_MODULE_V07_ADDRESS,
};

use super::{Call, pack_calls, safe_domain};
use crate::SafeError;

const SAFE_OP_V06_TYPE: &str = "SafeOp(address safe,uint256 nonce,bytes initCode,bytes callData,uint256 callGasLimit,uint256 verificationGasLimit,uint256 preVerificationGas,uint256 maxFeePerGas,uint256 maxPriorityFeePerGas,bytes paymasterAndData,uint48 validAfter,uint48 validUntil,address entryPoint)";

const SAFE_OP_V07_TYPE: &str = "SafeOp(address safe,uint256 nonce,bytes initCode,bytes callData,uint128 verificationGasLimit,uint128 callGasLimit,uint256 preVerificationGas,uint128 maxPriorityFeePerGas,uint128 maxFeePerGas,bytes paymasterAndData,uint48 validAfter,uint48 validUntil,address entryPoint)";

const MAX_UINT48: u64 = (1 << 48) - 1;

/// EntryPoint generation an operation targets. Fixes the module, the entry point and the
/// `SafeOp` field layout.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EntryPointVersion {
    V06,
    #[default]
    V07,
}

impl EntryPointVersion {
    pub const fn entry_point(self) -> Address {
        match self {
            Self::V06 => ENTRY_POINT_V06_ADDRESS,
            Self::V07 => ENTRY_POINT_V07_ADDRESS,
        }
    }

    /// Safe4337 module bound to this entry point; the EIP-712 verifying contract.
    pub const fn module(self) -> Address {
        match self {
            Self::V06 => SAFE_4337_MODULE_V06_ADDRESS,
            Self::V07 => SAFE_4337_MODULE_V07_ADDRESS,
        }
    }

    fn type_hash(self) -> B256 {
        match self {
            Self::V06 => keccak256(SAFE_OP_V06_TYPE),
            Self::V07 => keccak256(SAFE_OP_V07_TYPE),
        }
    }
}

/// User operation as signed by Safe owners.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct SafeOperation {
    pub safe: Address,
    pub nonce: U256,
    pub init_code: Bytes,
    pub call_data: Bytes,
    pub call_gas_limit: U256,
    pub verification_gas_limit: U256,
    pub pre_verification_gas: U256,
    pub max_fee_per_gas: U256,
    pub max_priority_fee_per_gas: U256,
    pub paymaster_and_data: Bytes,
    /// Unix timestamp, 0 = valid immediately
    pub valid_after: u64,
    /// Unix timestamp, 0 = no expiry
    pub valid_until: u64,
    pub entry_point_version: EntryPointVersion,
}

impl SafeOperation {
    /// Operation executing `calls` from `safe`. Gas fields are left at zero for the
    /// caller (or a bundler estimate) to fill in.
    pub fn from_calls(
        safe: Address,
        nonce: U256,
        calls: &[Call],
        entry_point_version: EntryPointVersion,
    ) -> Result<Self, SafeError> {
        let (to, value, data, operation) = pack_calls(calls)?;
        let call_data = ISafe4337Module::executeUserOpCall {
            to,
            value,
            data,
            operation: operation as u8,
        }
        .abi_encode();

        Ok(Self {
            safe,
            nonce,
            call_data: call_data.into(),
            entry_point_version,
            ..Default::default()
        })
    }

    /// Sets the validity window.
    pub const fn with_validity(mut self, valid_after: u64, valid_until: u64) -> Self {
        self.valid_after = valid_after;
        self.valid_until = valid_until;
        self
    }

    /// EIP-712 `SafeOp` digest, verified by the Safe4337 module on `chain_id`.
    pub fn digest(&self, chain_id: u64) -> Result<B256, SafeError> {
        self.validate()?;

        let version = self.entry_point_version;
        let mut buf = Vec::with_capacity(14 * 32);
        buf.extend_from_slice(version.type_hash().as_slice());
        push_address(&mut buf, self.safe);
        push_uint(&mut buf, self.nonce);
        buf.extend_from_slice(keccak256(&self.init_code).as_slice());
        buf.extend_from_slice(keccak256(&self.call_data).as_slice());
        match version {
            EntryPointVersion::V06 => {
                push_uint(&mut buf, self.call_gas_limit);
                push_uint(&mut buf, self.verification_gas_limit);
                push_uint(&mut buf, self.pre_verification_gas);
                push_uint(&mut buf, self.max_fee_per_gas);
                push_uint(&mut buf, self.max_priority_fee_per_gas);
            }
            EntryPointVersion::V07 => {
                push_uint(&mut buf, self.verification_gas_limit);
                push_uint(&mut buf, self.call_gas_limit);
                push_uint(&mut buf, self.pre_verification_gas);
                push_uint(&mut buf, self.max_priority_fee_per_gas);
                push_uint(&mut buf, self.max_fee_per_gas);
            }
        }
        buf.extend_from_slice(keccak256(&self.paymaster_and_data).as_slice());
        push_uint(&mut buf, U256::from(self.valid_after));
        push_uint(&mut buf, U256::from(self.valid_until));
        push_address(&mut buf, version.entry_point());
        let struct_hash = keccak256(&buf);

        let domain_separator = safe_domain(version.module(), chain_id).hash_struct();

        let mut preimage = [0u8; 66];
        preimage[..2].copy_from_slice(&[0x19, 0x01]);
        preimage[2..34].copy_from_slice(domain_separator.as_slice());
        preimage[34..].copy_from_slice(struct_hash.as_slice());
        Ok(keccak256(preimage))
    }

    fn validate(&self) -> Result<(), SafeError> {
        for (field, value) in [("validAfter", self.valid_after), ("validUntil", self.valid_until)]
        {
            if value > MAX_UINT48 {
                return Err(SafeError::invalid_payload(
                    field,
                    format!("{value} does not fit in uint48"),
                ));
            }
        }
        if self.valid_until != 0 && self.valid_until < self.valid_after {
            return Err(SafeError::invalid_payload(
                "validUntil",
                format!("{} is before validAfter {}", self.valid_until, self.valid_after),
            ));
        }

        if self.entry_point_version == EntryPointVersion::V07 {
            let max = U256::from(u128::MAX);
            for (field, value) in [
                ("verificationGasLimit", self.verification_gas_limit),
                ("callGasLimit", self.call_gas_limit),
                ("maxPriorityFeePerGas", self.max_priority_fee_per_gas),
                ("maxFeePerGas", self.max_fee_per_gas),
            ] {
                if value > max {
                    return Err(SafeError::invalid_payload(
                        field,
                        format!("{value} does not fit in uint128"),
                    ));
                }
            }
        }

        Ok(())
    }
}

fn push_uint(buf: &mut Vec<u8>, value: U256) {
    buf.extend_from_slice(&value.to_be_bytes::<32>());
}

fn push_address(buf: &mut Vec<u8>, address: Address) {
    buf.extend_from_slice(B256::left_padding_from(address.as_slice()).as_slice());
}
