crate::sol! {
    /// ERC-1271 signature validation as exposed by the Safe fallback handler and by
    /// contract owners (nested Safes, WebAuthn signer proxies, the shared signer).
    #[derive(Debug, PartialEq, Eq)]
    #[sol(abi)]
    interface ISignatureValidator {
        /// @return magicValue 0x1626ba7e if valid
        function isValidSignature(bytes32 _hash, bytes calldata _signature) external view returns (bytes4 magicValue);

        /// EIP-712 `SafeMessage` hash the handler checks signatures against
        function getMessageHash(bytes memory message) external view returns (bytes32);
    }
}

/// Magic value of the pre-standard `isValidSignature(bytes,bytes)` variant served by the
/// compatibility fallback handler.
pub const LEGACY_EIP1271_MAGIC_VALUE: [u8; 4] = [0x20, 0xc1, 0x3b, 0x0b];
