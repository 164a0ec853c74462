crate::sol! {
    /// SignMessageLib, delegate-called by a Safe to mark a message as signed on-chain.
    #[derive(Debug, PartialEq, Eq)]
    #[sol(abi)]
    interface ISignMessageLib {
        /// Stores `getMessageHash(_data)` in the Safe's `signedMessages` mapping
        function signMessage(bytes calldata _data) external;

        function getMessageHash(bytes memory message) external view returns (bytes32);

        event SignMsg(bytes32 indexed msgHash);
    }
}
