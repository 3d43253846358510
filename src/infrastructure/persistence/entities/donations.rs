//! SeaORM Entity for the donations table

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "donations")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub campaign_id: i64,
    pub user_id: Option<i64>,
    pub amount: Decimal,
    #[sea_orm(column_type = "Text", nullable)]
    pub message: Option<String>,
    pub donor_name: Option<String>,
    pub anonymous: bool,
    pub payment_id: Option<String>,
    pub payment_status: String,
    pub paid_at: Option<NaiveDateTime>,
    pub blockchain_status: String,
    pub donation_tx_hash: Option<String>,
    pub donor_wallet_address: Option<String>,
    pub token_type: Option<String>,
    pub token_amount: Option<Decimal>,
    pub gas_fee: Option<Decimal>,
    pub blockchain_recorded_at: Option<NaiveDateTime>,
    #[sea_orm(column_type = "Text", nullable)]
    pub blockchain_error_message: Option<String>,
    pub fraud_review_status: String,
    pub created_at: NaiveDateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
