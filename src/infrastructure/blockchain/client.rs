//! EVM RPC client for the settlement pipeline.
//!
//! Every call that submits a transaction awaits the mined receipt before
//! returning, so callers observe on-chain completion; a call may take tens
//! of seconds on a congested network.

use alloy::network::{EthereumWallet, TransactionBuilder};
use alloy::primitives::{Address, U256};
use alloy::providers::{Provider, ProviderBuilder};
use alloy::rpc::types::TransactionRequest;
use alloy::signers::local::PrivateKeySigner;
use async_trait::async_trait;
use url::Url;

use crate::config::ChainConfig;
use crate::infrastructure::blockchain::contracts::{CampaignFund, SettlementToken};
use crate::infrastructure::blockchain::error::{ChainError, ChainResult};
use crate::utils::{logging, units};

/// On-chain operations the transfer orchestrator depends on
#[async_trait]
pub trait ChainOps: Send + Sync {
    /// Token balance of an address, in base units
    async fn token_balance(&self, address: Address) -> ChainResult<U256>;

    /// Send native currency and wait for the transaction to be mined
    async fn transfer_native(
        &self,
        from: &PrivateKeySigner,
        to: Address,
        amount_wei: U256,
    ) -> ChainResult<String>;

    /// Mint tokens into a wallet (token-owner only) and wait for inclusion
    async fn mint_token(
        &self,
        owner: &PrivateKeySigner,
        to: Address,
        raw_amount: U256,
    ) -> ChainResult<String>;

    /// Approve a spender for a token amount and wait for inclusion
    async fn approve_token(
        &self,
        owner: &PrivateKeySigner,
        spender: Address,
        raw_amount: U256,
    ) -> ChainResult<String>;

    /// Call the campaign contract's donate entry point and wait for inclusion
    async fn donate_to_campaign(
        &self,
        donor: &PrivateKeySigner,
        contract: Address,
        chain_campaign_id: U256,
        raw_amount: U256,
    ) -> ChainResult<String>;
}

/// RPC-backed implementation of [`ChainOps`]
pub struct EvmChainClient {
    rpc_url: Url,
    token_address: Address,
    gas_limit: u64,
    gas_price_wei: u128,
}

impl EvmChainClient {
    pub fn new(config: &ChainConfig) -> ChainResult<Self> {
        let rpc_url: Url = config.rpc_url.parse().map_err(|e| {
            ChainError::Rpc(format!("Invalid RPC URL '{}': {}", config.rpc_url, e))
        })?;

        let token_address = parse_address(&config.token_contract_address)?;

        logging::log_info(&format!(
            "Chain client initialized for {} (token contract {})",
            config.rpc_url, config.token_contract_address
        ));

        Ok(Self {
            rpc_url,
            token_address,
            gas_limit: config.gas_limit,
            gas_price_wei: units::gwei_to_wei(config.max_gas_price_gwei),
        })
    }

    /// Provider that signs with the given key
    fn signed_provider(&self, signer: &PrivateKeySigner) -> impl Provider + Clone {
        ProviderBuilder::new()
            .wallet(EthereumWallet::from(signer.clone()))
            .connect_http(self.rpc_url.clone())
    }

    /// Read-only provider
    fn read_provider(&self) -> impl Provider + Clone {
        ProviderBuilder::new().connect_http(self.rpc_url.clone())
    }
}

#[async_trait]
impl ChainOps for EvmChainClient {
    async fn token_balance(&self, address: Address) -> ChainResult<U256> {
        let token = SettlementToken::new(self.token_address, self.read_provider());

        let balance = token
            .balanceOf(address)
            .call()
            .await
            .map_err(|e| ChainError::Rpc(e.to_string()))?;

        Ok(balance)
    }

    async fn transfer_native(
        &self,
        from: &PrivateKeySigner,
        to: Address,
        amount_wei: U256,
    ) -> ChainResult<String> {
        let provider = self.signed_provider(from);

        let tx = TransactionRequest::default()
            .with_to(to)
            .with_value(amount_wei);

        let receipt = provider
            .send_transaction(tx)
            .await
            .map_err(|e| ChainError::Rpc(e.to_string()))?
            .get_receipt()
            .await
            .map_err(|e| ChainError::Rpc(e.to_string()))?;

        if !receipt.status() {
            return Err(ChainError::Reverted(format!(
                "native transfer to {}",
                to
            )));
        }

        Ok(receipt.transaction_hash.to_string())
    }

    async fn mint_token(
        &self,
        owner: &PrivateKeySigner,
        to: Address,
        raw_amount: U256,
    ) -> ChainResult<String> {
        let provider = self.signed_provider(owner);
        let token = SettlementToken::new(self.token_address, provider);

        let receipt = token
            .mint(to, raw_amount)
            .gas(self.gas_limit)
            .gas_price(self.gas_price_wei)
            .send()
            .await
            .map_err(|e| ChainError::Rpc(e.to_string()))?
            .get_receipt()
            .await
            .map_err(|e| ChainError::Rpc(e.to_string()))?;

        if !receipt.status() {
            return Err(ChainError::Reverted(format!("mint to {}", to)));
        }

        Ok(receipt.transaction_hash.to_string())
    }

    async fn approve_token(
        &self,
        owner: &PrivateKeySigner,
        spender: Address,
        raw_amount: U256,
    ) -> ChainResult<String> {
        let provider = self.signed_provider(owner);
        let token = SettlementToken::new(self.token_address, provider);

        let receipt = token
            .approve(spender, raw_amount)
            .gas(self.gas_limit)
            .gas_price(self.gas_price_wei)
            .send()
            .await
            .map_err(|e| ChainError::Rpc(e.to_string()))?
            .get_receipt()
            .await
            .map_err(|e| ChainError::Rpc(e.to_string()))?;

        if !receipt.status() {
            return Err(ChainError::Reverted(format!("approve for {}", spender)));
        }

        Ok(receipt.transaction_hash.to_string())
    }

    async fn donate_to_campaign(
        &self,
        donor: &PrivateKeySigner,
        contract: Address,
        chain_campaign_id: U256,
        raw_amount: U256,
    ) -> ChainResult<String> {
        let provider = self.signed_provider(donor);
        let fund = CampaignFund::new(contract, provider);

        let receipt = fund
            .donate(chain_campaign_id, raw_amount)
            .gas(self.gas_limit)
            .gas_price(self.gas_price_wei)
            .send()
            .await
            .map_err(|e| ChainError::Rpc(e.to_string()))?
            .get_receipt()
            .await
            .map_err(|e| ChainError::Rpc(e.to_string()))?;

        if !receipt.status() {
            return Err(ChainError::Reverted(format!(
                "donate to campaign {} on {}",
                chain_campaign_id, contract
            )));
        }

        Ok(receipt.transaction_hash.to_string())
    }
}

/// Parse a hex on-chain address
pub fn parse_address(value: &str) -> ChainResult<Address> {
    value
        .parse::<Address>()
        .map_err(|_| ChainError::InvalidAddress(value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_address() {
        let address = parse_address("0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266").unwrap();
        assert_eq!(
            address.to_string().to_lowercase(),
            "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266"
        );
    }

    #[test]
    fn test_parse_address_rejects_garbage() {
        assert!(parse_address("").is_err());
        assert!(parse_address("0x123").is_err());
        assert!(parse_address("not an address").is_err());
    }
}
