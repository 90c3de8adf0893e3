use alloy::sol;

sol! {
    /// Minimal ERC20 read interface.
    #[sol(rpc)]
    interface IERC20 {
        /// Balance in the token's smallest unit.
        function balanceOf(address account) external view returns (uint256);

        function decimals() external view returns (uint8);

        function symbol() external view returns (string memory);
    }
}
