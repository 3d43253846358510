//! Per-donation transfer orchestration.
//!
//! Each donation runs the same strict sequence: validate, resolve the donor
//! wallet, fund gas, mint the token amount, verify the balance, then approve
//! and donate. Steps 3-6 mutate on-chain state and are not rolled back; a
//! donation that fails after gas funding leaves the donor wallet funded (see
//! DESIGN.md).

use std::sync::Arc;
use std::time::Instant;

use alloy::primitives::U256;
use alloy::signers::local::PrivateKeySigner;
use async_trait::async_trait;

use crate::application::pipeline::traits::DonationTransfer;
use crate::domain::errors::{ChainStep, TransferError};
use crate::domain::models::{CampaignRef, FailureKind, PendingDonation, TransferResult, WalletRecord};
use crate::domain::services::WalletProvider;
use crate::infrastructure::blockchain::{parse_address, ChainOps};
use crate::utils::{logging, units};

/// Executes the on-chain transfer sequence for the donations of one campaign
pub struct TransferOrchestrator {
    campaign: CampaignRef,
    wallets: Arc<dyn WalletProvider>,
    chain: Arc<dyn ChainOps>,
    /// Platform wallet: gas funder and token owner
    platform_signer: PrivateKeySigner,
    max_gas_price_gwei: u64,
    gas_limit: u64,
}

impl TransferOrchestrator {
    pub fn new(
        campaign: CampaignRef,
        wallets: Arc<dyn WalletProvider>,
        chain: Arc<dyn ChainOps>,
        platform_signer: PrivateKeySigner,
        max_gas_price_gwei: u64,
        gas_limit: u64,
    ) -> Self {
        Self {
            campaign,
            wallets,
            chain,
            platform_signer,
            max_gas_price_gwei,
            gas_limit,
        }
    }

    async fn execute(
        &self,
        donation: &PendingDonation,
        started: &Instant,
    ) -> Result<TransferResult, TransferError> {
        // 1. Validate donation and campaign chain data
        let user_id = donation.user_id.ok_or_else(|| TransferError::WalletNotFound {
            donation_id: donation.id,
            user_id: None,
            message: "Donation has no associated user".to_string(),
        })?;

        let beneficiary = self
            .campaign
            .beneficiary_address
            .as_deref()
            .filter(|a| !a.trim().is_empty())
            .ok_or_else(|| {
                TransferError::IllegalState(format!(
                    "Beneficiary address not set for campaign {}",
                    self.campaign.id
                ))
            })?;

        let contract_str = self
            .campaign
            .contract_address
            .as_deref()
            .filter(|a| !a.trim().is_empty())
            .ok_or_else(|| {
                TransferError::IllegalState(format!(
                    "Contract address not set for campaign {}",
                    self.campaign.id
                ))
            })?;

        let chain_campaign_id = self.campaign.chain_campaign_id.ok_or_else(|| {
            TransferError::IllegalState(format!(
                "On-chain campaign id not set for campaign {}",
                self.campaign.id
            ))
        })?;
        let chain_campaign_id = u64::try_from(chain_campaign_id).map_err(|_| {
            TransferError::IllegalState(format!(
                "On-chain campaign id {} is negative",
                chain_campaign_id
            ))
        })?;

        let contract_address = parse_address(contract_str).map_err(|_| {
            TransferError::IllegalState(format!(
                "Malformed contract address '{}' for campaign {}",
                contract_str, self.campaign.id
            ))
        })?;

        let raw_amount = units::token_to_base_units(donation.amount).ok_or_else(|| {
            TransferError::IllegalState(format!(
                "Donation amount {} is not representable in token base units",
                donation.amount
            ))
        })?;

        // 2. Resolve the donor's primary wallet
        let wallet = self.resolve_wallet(donation, user_id).await?;
        let donor_address = parse_address(&wallet.wallet_address)
            .map_err(|e| TransferError::Other(e.to_string()))?;

        // 3. Fund gas from the platform wallet
        let gas_tx = self
            .chain
            .transfer_native(
                &self.platform_signer,
                donor_address,
                U256::from(units::GAS_FUND_WEI),
            )
            .await
            .map_err(|e| TransferError::ChainNetwork {
                step: ChainStep::GasTransfer,
                message: format!("Failed to transfer gas fee: {}", e),
            })?;
        logging::log_info(&format!(
            "Gas fee transferred to donor wallet {} - tx {}",
            wallet.wallet_address, gas_tx
        ));

        // 4. Mint the donation amount into the donor wallet
        let mint_tx = self
            .chain
            .mint_token(&self.platform_signer, donor_address, raw_amount)
            .await
            .map_err(|e| TransferError::ChainNetwork {
                step: ChainStep::TokenCharge,
                message: format!("Failed to charge USDC: {}", e),
            })?;
        logging::log_info(&format!(
            "USDC charged to donor wallet {} - tx {}",
            wallet.wallet_address, mint_tx
        ));

        // 5. Verify the donor's token balance covers the donation
        self.check_balance(donation, &wallet, donor_address).await?;

        // 6. Approve the campaign contract, then donate
        let donor_signer = self
            .wallets
            .credentials(&wallet)
            .map_err(|e| TransferError::Other(e.to_string()))?;

        self.chain
            .approve_token(&donor_signer, contract_address, raw_amount)
            .await
            .map_err(|e| TransferError::ChainNetwork {
                step: ChainStep::Donation,
                message: format!("Failed to approve USDC: {}", e),
            })?;

        let donate_tx = self
            .chain
            .donate_to_campaign(
                &donor_signer,
                contract_address,
                U256::from(chain_campaign_id),
                raw_amount,
            )
            .await
            .map_err(|e| TransferError::ChainNetwork {
                step: ChainStep::Donation,
                message: format!("Failed to donate to campaign contract: {}", e),
            })?;

        // 7. Finalize with the configured fee ceiling
        let gas_fee = units::gas_fee_ether(self.max_gas_price_gwei, self.gas_limit)
            .ok_or_else(|| TransferError::Other("Gas fee not representable".to_string()))?;

        let elapsed_ms = started.elapsed().as_millis() as u64;
        logging::log_info(&format!(
            "Donation {} settled - donate tx {} ({} ms)",
            donation.id, donate_tx, elapsed_ms
        ));

        Ok(TransferResult::success(
            donation.id,
            donate_tx,
            wallet.wallet_address.clone(),
            beneficiary.to_string(),
            donation.amount,
            gas_fee,
            elapsed_ms,
        ))
    }

    async fn resolve_wallet(
        &self,
        donation: &PendingDonation,
        user_id: i64,
    ) -> Result<WalletRecord, TransferError> {
        let wallet = self
            .wallets
            .primary_wallet(user_id)
            .await
            .map_err(|e| TransferError::Other(e.to_string()))?;

        wallet.ok_or_else(|| TransferError::WalletNotFound {
            donation_id: donation.id,
            user_id: Some(user_id),
            message: format!("No primary wallet found for user {}", user_id),
        })
    }

    async fn check_balance(
        &self,
        donation: &PendingDonation,
        wallet: &WalletRecord,
        donor_address: alloy::primitives::Address,
    ) -> Result<(), TransferError> {
        let balance = self
            .chain
            .token_balance(donor_address)
            .await
            .map_err(|e| TransferError::ChainNetwork {
                step: ChainStep::BalanceCheck,
                message: format!("Failed to check USDC balance: {}", e),
            })?;

        let available = units::token_from_base_units(balance).ok_or_else(|| {
            TransferError::ChainNetwork {
                step: ChainStep::BalanceCheck,
                message: "Balance outside representable range".to_string(),
            }
        })?;

        if available < donation.amount {
            return Err(TransferError::InsufficientBalance {
                wallet_address: wallet.wallet_address.clone(),
                message: format!(
                    "Insufficient USDC balance: required {}, available {}",
                    donation.amount, available
                ),
            });
        }

        Ok(())
    }
}

#[async_trait]
impl DonationTransfer for TransferOrchestrator {
    /// Run the transfer sequence for one donation.
    ///
    /// Classified errors (network, wallet, balance, state) are returned to
    /// the engine for its retry/skip policy; anything unclassified becomes a
    /// generic failure result here and never consumes retry or skip budget.
    async fn transfer(
        &self,
        donation: &PendingDonation,
    ) -> Result<TransferResult, TransferError> {
        let started = Instant::now();
        logging::log_info(&format!(
            "Processing donation {} (amount {})",
            donation.id, donation.amount
        ));

        match self.execute(donation, &started).await {
            Ok(result) => Ok(result),
            Err(TransferError::Other(message)) => {
                logging::log_error(&format!(
                    "Unexpected error processing donation {}: {}",
                    donation.id, message
                ));
                let elapsed_ms = started.elapsed().as_millis() as u64;
                Ok(TransferResult::failure(
                    donation.id,
                    message,
                    FailureKind::Unknown,
                    elapsed_ms,
                ))
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    use alloy::primitives::Address;
    use rust_decimal::Decimal;

    use crate::domain::errors::WalletError;
    use crate::domain::services::keystore;
    use crate::infrastructure::blockchain::error::{ChainError, ChainResult};

    const DONOR_KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
    const DONOR_ADDRESS: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";
    const PLATFORM_KEY: &str = "59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d";
    const CONTRACT_ADDRESS: &str = "0x5FbDB2315678afecb367f032d93F642f64180aa3";
    const BENEFICIARY_ADDRESS: &str = "0x70997970C51812dc3A010C7d01b50e0d17dc79C8";
    const MASTER_PASSWORD: &str = "batch-master";

    struct FakeWallets {
        wallets: HashMap<i64, WalletRecord>,
        master_password: String,
    }

    #[async_trait]
    impl WalletProvider for FakeWallets {
        async fn primary_wallet(&self, user_id: i64) -> Result<Option<WalletRecord>, WalletError> {
            Ok(self.wallets.get(&user_id).cloned())
        }

        fn credentials(&self, wallet: &WalletRecord) -> Result<PrivateKeySigner, WalletError> {
            let key = keystore::decrypt(&wallet.encrypted_private_key, &self.master_password)?;
            crate::domain::services::wallet_service::parse_signer(&key)
        }
    }

    /// Scriptable chain double; tracks minted balances per address
    struct FakeChain {
        fail_step: Option<ChainStep>,
        mint_shortfall: U256,
        minted: Mutex<HashMap<Address, U256>>,
        calls: Mutex<Vec<&'static str>>,
    }

    impl FakeChain {
        fn new() -> Self {
            Self {
                fail_step: None,
                mint_shortfall: U256::ZERO,
                minted: Mutex::new(HashMap::new()),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn failing_at(step: ChainStep) -> Self {
            Self {
                fail_step: Some(step),
                ..Self::new()
            }
        }

        fn record(&self, call: &'static str) {
            self.calls.lock().unwrap().push(call);
        }

        fn fails(&self, step: ChainStep) -> bool {
            self.fail_step == Some(step)
        }
    }

    #[async_trait]
    impl ChainOps for FakeChain {
        async fn token_balance(&self, address: Address) -> ChainResult<U256> {
            self.record("balance");
            if self.fails(ChainStep::BalanceCheck) {
                return Err(ChainError::Rpc("balance read timed out".to_string()));
            }
            Ok(self
                .minted
                .lock()
                .unwrap()
                .get(&address)
                .copied()
                .unwrap_or(U256::ZERO))
        }

        async fn transfer_native(
            &self,
            _from: &PrivateKeySigner,
            _to: Address,
            _amount_wei: U256,
        ) -> ChainResult<String> {
            self.record("gas");
            if self.fails(ChainStep::GasTransfer) {
                return Err(ChainError::Rpc("connection reset".to_string()));
            }
            Ok("0xga5".to_string())
        }

        async fn mint_token(
            &self,
            _owner: &PrivateKeySigner,
            to: Address,
            raw_amount: U256,
        ) -> ChainResult<String> {
            self.record("mint");
            if self.fails(ChainStep::TokenCharge) {
                return Err(ChainError::Rpc("nonce too low".to_string()));
            }
            let credited = raw_amount.saturating_sub(self.mint_shortfall);
            *self
                .minted
                .lock()
                .unwrap()
                .entry(to)
                .or_insert(U256::ZERO) += credited;
            Ok("0x111nt".to_string())
        }

        async fn approve_token(
            &self,
            _owner: &PrivateKeySigner,
            _spender: Address,
            _raw_amount: U256,
        ) -> ChainResult<String> {
            self.record("approve");
            if self.fails(ChainStep::Donation) {
                return Err(ChainError::Rpc("rpc unavailable".to_string()));
            }
            Ok("0xa99r".to_string())
        }

        async fn donate_to_campaign(
            &self,
            _donor: &PrivateKeySigner,
            _contract: Address,
            _chain_campaign_id: U256,
            _raw_amount: U256,
        ) -> ChainResult<String> {
            self.record("donate");
            if self.fails(ChainStep::Donation) {
                return Err(ChainError::Rpc("rpc unavailable".to_string()));
            }
            Ok("0xd0nate".to_string())
        }
    }

    fn campaign_ref() -> CampaignRef {
        CampaignRef {
            id: 10,
            beneficiary_address: Some(BENEFICIARY_ADDRESS.to_string()),
            contract_address: Some(CONTRACT_ADDRESS.to_string()),
            chain_campaign_id: Some(7),
        }
    }

    fn donor_wallet(master_password: &str) -> WalletRecord {
        let encrypted = keystore::encrypt(&format!("0x{}", DONOR_KEY), master_password).unwrap();
        WalletRecord {
            id: 1,
            user_id: 42,
            wallet_address: DONOR_ADDRESS.to_string(),
            encrypted_private_key: encrypted,
            is_primary: true,
            is_verified: true,
        }
    }

    fn donation(amount: i64) -> PendingDonation {
        PendingDonation {
            id: 1,
            campaign_id: 10,
            user_id: Some(42),
            amount: Decimal::from(amount),
            paid_at: None,
        }
    }

    fn orchestrator(
        campaign: CampaignRef,
        chain: Arc<FakeChain>,
        wallets: FakeWallets,
    ) -> TransferOrchestrator {
        let platform_signer: PrivateKeySigner = PLATFORM_KEY.parse().unwrap();
        TransferOrchestrator::new(campaign, Arc::new(wallets), chain, platform_signer, 50, 100_000)
    }

    fn wallets_with_donor() -> FakeWallets {
        let mut wallets = HashMap::new();
        wallets.insert(42, donor_wallet(MASTER_PASSWORD));
        FakeWallets {
            wallets,
            master_password: MASTER_PASSWORD.to_string(),
        }
    }

    #[tokio::test]
    async fn test_successful_transfer() {
        let chain = Arc::new(FakeChain::new());
        let orchestrator = orchestrator(campaign_ref(), chain.clone(), wallets_with_donor());

        let result = orchestrator.transfer(&donation(1000)).await.unwrap();

        assert!(result.is_success());
        match result.outcome {
            crate::domain::models::TransferOutcome::Success {
                tx_hash,
                donor_address,
                beneficiary_address,
                token_amount,
                gas_fee,
            } => {
                assert_eq!(tx_hash, "0xd0nate");
                assert_eq!(donor_address, DONOR_ADDRESS);
                assert_eq!(beneficiary_address, BENEFICIARY_ADDRESS);
                assert_eq!(token_amount, Decimal::from(1000));
                // 50 gwei * 100_000 gas
                assert_eq!(gas_fee, Decimal::new(5, 3));
            }
            _ => panic!("expected success outcome"),
        }

        // Strict step order: gas funding, mint, balance check, approve, donate
        let calls = chain.calls.lock().unwrap().clone();
        assert_eq!(calls, vec!["gas", "mint", "balance", "approve", "donate"]);
    }

    #[tokio::test]
    async fn test_donation_without_user_is_wallet_not_found() {
        let chain = Arc::new(FakeChain::new());
        let orchestrator = orchestrator(campaign_ref(), chain.clone(), wallets_with_donor());

        let mut no_user = donation(1000);
        no_user.user_id = None;

        let err = orchestrator.transfer(&no_user).await.unwrap_err();
        assert!(matches!(err, TransferError::WalletNotFound { .. }));

        // Validation failures must precede any on-chain call
        assert!(chain.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_user_without_primary_wallet_is_wallet_not_found() {
        let chain = Arc::new(FakeChain::new());
        let wallets = FakeWallets {
            wallets: HashMap::new(),
            master_password: MASTER_PASSWORD.to_string(),
        };
        let orchestrator = orchestrator(campaign_ref(), chain, wallets);

        let err = orchestrator.transfer(&donation(1000)).await.unwrap_err();
        assert!(matches!(
            err,
            TransferError::WalletNotFound {
                user_id: Some(42),
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_missing_contract_address_is_illegal_state() {
        let chain = Arc::new(FakeChain::new());
        let mut campaign = campaign_ref();
        campaign.contract_address = None;
        let orchestrator = orchestrator(campaign, chain, wallets_with_donor());

        let err = orchestrator.transfer(&donation(1000)).await.unwrap_err();
        assert!(matches!(err, TransferError::IllegalState(_)));
    }

    #[tokio::test]
    async fn test_gas_funding_failure_is_retryable_network_error() {
        let chain = Arc::new(FakeChain::failing_at(ChainStep::GasTransfer));
        let orchestrator = orchestrator(campaign_ref(), chain, wallets_with_donor());

        let err = orchestrator.transfer(&donation(1000)).await.unwrap_err();
        match err {
            TransferError::ChainNetwork { step, .. } => {
                assert_eq!(step, ChainStep::GasTransfer)
            }
            other => panic!("expected network error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_short_mint_is_insufficient_balance() {
        let chain = Arc::new(FakeChain {
            mint_shortfall: U256::from(1u64),
            ..FakeChain::new()
        });
        let orchestrator = orchestrator(campaign_ref(), chain.clone(), wallets_with_donor());

        let err = orchestrator.transfer(&donation(1000)).await.unwrap_err();
        assert!(matches!(err, TransferError::InsufficientBalance { .. }));

        // No approve/donate after a failed balance check
        let calls = chain.calls.lock().unwrap().clone();
        assert_eq!(calls, vec!["gas", "mint", "balance"]);
    }

    #[tokio::test]
    async fn test_undecryptable_wallet_key_becomes_unknown_failure() {
        let chain = Arc::new(FakeChain::new());
        let mut wallets = HashMap::new();
        // Wallet encrypted under a different master password
        wallets.insert(42, donor_wallet("some-other-password"));
        let wallets = FakeWallets {
            wallets,
            master_password: MASTER_PASSWORD.to_string(),
        };
        let orchestrator = orchestrator(campaign_ref(), chain, wallets);

        // Converted at the orchestrator boundary, not propagated
        let result = orchestrator.transfer(&donation(1000)).await.unwrap();
        assert!(!result.is_success());
        assert_eq!(result.failure_kind(), Some(FailureKind::Unknown));
    }
}
