crate::sol! {
    /// Safe (v1.3.0 / v1.4.1) singleton interface.
    ///
    /// Only the entry points the signing engine reads or targets are declared here.
    #[derive(Debug, PartialEq, Eq)]
    #[sol(abi)]
    interface ISafe {
        /// Execute a transaction once `threshold` owners signed its hash
        function execTransaction(
            address to,
            uint256 value,
            bytes calldata data,
            uint8 operation,
            uint256 safeTxGas,
            uint256 baseGas,
            uint256 gasPrice,
            address gasToken,
            address payable refundReceiver,
            bytes memory signatures
        ) external payable returns (bool success);

        /// Marks a hash as approved by `msg.sender` (pre-validated signatures)
        function approveHash(bytes32 hashToApprove) external;

        /// Non-zero if `owner` approved `hash` on-chain
        function approvedHashes(address owner, bytes32 hash) external view returns (uint256);

        /// Reverts unless `signatures` holds `threshold` valid signatures for `dataHash`
        function checkSignatures(bytes32 dataHash, bytes memory data, bytes memory signatures) external view;

        function nonce() external view returns (uint256);
        function getThreshold() external view returns (uint256);
        function getOwners() external view returns (address[] memory);
        function isOwner(address owner) external view returns (bool);
        function domainSeparator() external view returns (bytes32);

        event ExecutionSuccess(bytes32 indexed txHash, uint256 payment);
        event ExecutionFailure(bytes32 indexed txHash, uint256 payment);
        event ApproveHash(bytes32 indexed approvedHash, address indexed owner);
        event SignMsg(bytes32 indexed msgHash);
    }
}
