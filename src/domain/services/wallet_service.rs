use alloy::signers::local::PrivateKeySigner;
use async_trait::async_trait;

use crate::domain::errors::WalletError;
use crate::domain::models::WalletRecord;
use crate::domain::services::keystore;
use crate::infrastructure::persistence::repositories::WalletRepository;
use crate::utils::logging;

/// Resolves donor wallets and their signing credentials.
///
/// The orchestrator works against this trait so transfers can be exercised
/// without a database.
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// The user's primary wallet, if one exists
    async fn primary_wallet(&self, user_id: i64) -> Result<Option<WalletRecord>, WalletError>;

    /// Signing credentials for a stored wallet
    fn credentials(&self, wallet: &WalletRecord) -> Result<PrivateKeySigner, WalletError>;
}

/// Custodial wallet management backed by the wallet repository.
///
/// Wallet keys are encrypted under the platform's master password, which is
/// also what the batch pipeline decrypts with.
pub struct WalletService {
    wallet_repository: WalletRepository,
    master_password: String,
}

impl WalletService {
    pub fn new(wallet_repository: WalletRepository, master_password: String) -> Self {
        Self {
            wallet_repository,
            master_password,
        }
    }

    /// Generate a fresh custodial wallet for a user and store it as the
    /// user's primary wallet, replacing any previous primary flag.
    pub async fn create_wallet(&self, user_id: i64) -> Result<WalletRecord, WalletError> {
        let signer = PrivateKeySigner::random();
        let private_key_hex = format!("0x{}", hex::encode(signer.to_bytes()));
        let address = signer.address().to_string();

        let encrypted = keystore::encrypt(&private_key_hex, &self.master_password)?;

        self.wallet_repository.clear_primary(user_id).await?;
        let record = self
            .wallet_repository
            .insert_wallet(user_id, &address, &encrypted, true)
            .await?;

        logging::log_info(&format!(
            "Created custodial wallet {} for user {}",
            address, user_id
        ));

        Ok(record)
    }
}

#[async_trait]
impl WalletProvider for WalletService {
    async fn primary_wallet(&self, user_id: i64) -> Result<Option<WalletRecord>, WalletError> {
        Ok(self
            .wallet_repository
            .find_primary_by_user(user_id)
            .await?)
    }

    fn credentials(&self, wallet: &WalletRecord) -> Result<PrivateKeySigner, WalletError> {
        let private_key_hex =
            keystore::decrypt(&wallet.encrypted_private_key, &self.master_password)?;
        parse_signer(&private_key_hex)
    }
}

/// Parse a hex private key (with or without 0x prefix) into a signer
pub fn parse_signer(private_key_hex: &str) -> Result<PrivateKeySigner, WalletError> {
    let key_hex = private_key_hex
        .strip_prefix("0x")
        .unwrap_or(private_key_hex);

    key_hex
        .parse::<PrivateKeySigner>()
        .map_err(|e| WalletError::InvalidKey(e.to_string()))
}
