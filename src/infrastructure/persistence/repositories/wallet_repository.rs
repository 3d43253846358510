use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
};

use crate::domain::models::WalletRecord;
use crate::infrastructure::persistence::entities::user_wallets;
use crate::infrastructure::persistence::error::DbError;

/// Repository for user wallet operations
#[derive(Clone)]
pub struct WalletRepository {
    conn: DatabaseConnection,
}

impl WalletRepository {
    /// Create a new WalletRepository
    pub fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Get a user's primary wallet
    pub async fn find_primary_by_user(
        &self,
        user_id: i64,
    ) -> Result<Option<WalletRecord>, DbError> {
        let result = user_wallets::Entity::find()
            .filter(user_wallets::Column::UserId.eq(user_id))
            .filter(user_wallets::Column::IsPrimary.eq(true))
            .one(&self.conn)
            .await?;

        Ok(result.map(|w| self.to_domain_model(w)))
    }

    /// Clear the primary flag on all of a user's wallets
    pub async fn clear_primary(&self, user_id: i64) -> Result<(), DbError> {
        user_wallets::Entity::update_many()
            .col_expr(user_wallets::Column::IsPrimary, Expr::value(false))
            .filter(user_wallets::Column::UserId.eq(user_id))
            .filter(user_wallets::Column::IsPrimary.eq(true))
            .exec(&self.conn)
            .await?;

        Ok(())
    }

    /// Insert a wallet
    pub async fn insert_wallet(
        &self,
        user_id: i64,
        wallet_address: &str,
        encrypted_private_key: &str,
        is_primary: bool,
    ) -> Result<WalletRecord, DbError> {
        let wallet = user_wallets::ActiveModel {
            user_id: Set(user_id),
            wallet_address: Set(wallet_address.to_string()),
            encrypted_private_key: Set(encrypted_private_key.to_string()),
            is_primary: Set(is_primary),
            is_verified: Set(false),
            created_at: Set(Utc::now().naive_utc()),
            ..Default::default()
        }
        .insert(&self.conn)
        .await?;

        Ok(self.to_domain_model(wallet))
    }

    /// Convert a database entity to a domain model
    fn to_domain_model(&self, entity: user_wallets::Model) -> WalletRecord {
        WalletRecord {
            id: entity.id,
            user_id: entity.user_id,
            wallet_address: entity.wallet_address,
            encrypted_private_key: entity.encrypted_private_key,
            is_primary: entity.is_primary,
            is_verified: entity.is_verified,
        }
    }
}
