//! Contract bindings for the settlement token and the campaign contract

use alloy::sol;

sol! {
    /// Settlement stablecoin. The platform wallet is the token owner and
    /// mints directly, bypassing the public faucet limit.
    #[sol(rpc)]
    contract SettlementToken {
        function mint(address to, uint256 amount) external;
        function approve(address spender, uint256 amount) external returns (bool);
        function balanceOf(address account) external view returns (uint256);
    }

    /// Per-campaign donation contract; pulls approved token amounts
    #[sol(rpc)]
    contract CampaignFund {
        function donate(uint256 campaignId, uint256 amount) external;
    }
}
