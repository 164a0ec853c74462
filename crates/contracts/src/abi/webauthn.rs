crate::sol! {
    /// SafeWebAuthnSharedSigner: a single owner slot that any Safe can configure with a
    /// passkey public key. The configuration lives in the Safe's own storage.
    #[derive(Debug, PartialEq, Eq)]
    #[sol(abi)]
    interface ISafeWebAuthnSharedSigner {
        /// Slot contents for one Safe. `verifiers` packs the precompile and fallback
        /// verifier addresses (`uint176` on-chain, widened here).
        struct Signer {
            uint256 x;
            uint256 y;
            uint256 verifiers;
        }

        /// Read the passkey configuration the Safe `account` stored for this signer
        function getConfiguration(address account) external view returns (Signer memory signer);

        /// Delegate-called during Safe setup to store the passkey configuration
        function configure(Signer memory signer) external;

        function isValidSignature(bytes32 message, bytes calldata signature) external view returns (bytes4 magicValue);
    }
}
