/// A user's custodial wallet as stored
#[derive(Debug, Clone, PartialEq)]
pub struct WalletRecord {
    pub id: i64,
    pub user_id: i64,
    pub wallet_address: String,
    /// Opaque key-store ciphertext; never exposed or logged
    pub encrypted_private_key: String,
    pub is_primary: bool,
    pub is_verified: bool,
}
