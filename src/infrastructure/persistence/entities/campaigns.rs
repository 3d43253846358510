//! SeaORM Entity for the campaigns table

use chrono::NaiveDateTime;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "campaigns")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub title: String,
    pub status: String,
    pub deleted_at: Option<NaiveDateTime>,
    pub beneficiary_address: Option<String>,
    pub contract_address: Option<String>,
    pub chain_campaign_id: Option<i64>,
    pub batch_run_id: Option<i64>,
    pub batch_status: Option<String>,
    pub batch_started_at: Option<NaiveDateTime>,
    pub batch_completed_at: Option<NaiveDateTime>,
    pub total_processed: i64,
    pub successful_transfers: i64,
    pub failed_transfers: i64,
    pub created_at: NaiveDateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
