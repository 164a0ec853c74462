crate::sol! {
    /// Safe4337Module entry points called by the EntryPoint on behalf of a Safe.
    #[derive(Debug, PartialEq, Eq)]
    #[sol(abi)]
    interface ISafe4337Module {
        /// Executes a user operation; reverts bubble up without data
        function executeUserOp(address to, uint256 value, bytes memory data, uint8 operation) external;

        /// Same as `executeUserOp` but reverts with the inner error string
        function executeUserOpWithErrorString(address to, uint256 value, bytes memory data, uint8 operation) external;

        function SUPPORTED_ENTRYPOINT() external view returns (address);
    }
}
