use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        if !manager.has_table("campaigns").await? {
            // Create campaigns table
            manager
                .create_table(
                    Table::create()
                        .table(Campaigns::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Campaigns::Id)
                                .big_integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Campaigns::Title).string().not_null())
                        .col(
                            ColumnDef::new(Campaigns::Status)
                                .string()
                                .not_null()
                                .default("DRAFT"),
                        )
                        .col(ColumnDef::new(Campaigns::DeletedAt).timestamp())
                        .col(ColumnDef::new(Campaigns::BeneficiaryAddress).string())
                        .col(ColumnDef::new(Campaigns::ContractAddress).string())
                        .col(ColumnDef::new(Campaigns::ChainCampaignId).big_integer())
                        .col(ColumnDef::new(Campaigns::BatchRunId).big_integer())
                        .col(ColumnDef::new(Campaigns::BatchStatus).string())
                        .col(ColumnDef::new(Campaigns::BatchStartedAt).timestamp())
                        .col(ColumnDef::new(Campaigns::BatchCompletedAt).timestamp())
                        .col(
                            ColumnDef::new(Campaigns::TotalProcessed)
                                .big_integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Campaigns::SuccessfulTransfers)
                                .big_integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Campaigns::FailedTransfers)
                                .big_integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Campaigns::CreatedAt)
                                .timestamp()
                                .not_null()
                                .default(Expr::current_timestamp()),
                        )
                        .to_owned(),
                )
                .await?;
        }

        if !manager.has_table("donations").await? {
            // Create donations table
            manager
                .create_table(
                    Table::create()
                        .table(Donations::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Donations::Id)
                                .big_integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Donations::CampaignId).big_integer().not_null())
                        .col(ColumnDef::new(Donations::UserId).big_integer())
                        .col(
                            ColumnDef::new(Donations::Amount)
                                .decimal_len(20, 2)
                                .not_null(),
                        )
                        .col(ColumnDef::new(Donations::Message).string())
                        .col(ColumnDef::new(Donations::DonorName).string())
                        .col(
                            ColumnDef::new(Donations::Anonymous)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(ColumnDef::new(Donations::PaymentId).string())
                        .col(
                            ColumnDef::new(Donations::PaymentStatus)
                                .string()
                                .not_null()
                                .default("PENDING"),
                        )
                        .col(ColumnDef::new(Donations::PaidAt).timestamp())
                        .col(
                            ColumnDef::new(Donations::BlockchainStatus)
                                .string()
                                .not_null()
                                .default("NOT_RECORDED"),
                        )
                        .col(ColumnDef::new(Donations::DonationTxHash).string())
                        .col(ColumnDef::new(Donations::DonorWalletAddress).string())
                        .col(ColumnDef::new(Donations::TokenType).string())
                        .col(ColumnDef::new(Donations::TokenAmount).decimal_len(20, 6))
                        .col(ColumnDef::new(Donations::GasFee).decimal_len(30, 18))
                        .col(ColumnDef::new(Donations::BlockchainRecordedAt).timestamp())
                        .col(ColumnDef::new(Donations::BlockchainErrorMessage).text())
                        .col(
                            ColumnDef::new(Donations::FraudReviewStatus)
                                .string()
                                .not_null()
                                .default("PENDING"),
                        )
                        .col(
                            ColumnDef::new(Donations::CreatedAt)
                                .timestamp()
                                .not_null()
                                .default(Expr::current_timestamp()),
                        )
                        .to_owned(),
                )
                .await?;

            // The pending selection pages over (campaign_id, blockchain_status)
            // ordered by paid_at, so index those columns together
            manager
                .create_index(
                    Index::create()
                        .name("donations_campaign_status_paid_at")
                        .table(Donations::Table)
                        .col(Donations::CampaignId)
                        .col(Donations::BlockchainStatus)
                        .col(Donations::PaidAt)
                        .if_not_exists()
                        .to_owned(),
                )
                .await?;
        }

        if !manager.has_table("user_wallets").await? {
            // Create user_wallets table
            manager
                .create_table(
                    Table::create()
                        .table(UserWallets::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(UserWallets::Id)
                                .big_integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(UserWallets::UserId).big_integer().not_null())
                        .col(
                            ColumnDef::new(UserWallets::WalletAddress)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(UserWallets::EncryptedPrivateKey)
                                .text()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(UserWallets::IsPrimary)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(UserWallets::IsVerified)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(UserWallets::CreatedAt)
                                .timestamp()
                                .not_null()
                                .default(Expr::current_timestamp()),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("user_wallets_user_id")
                        .table(UserWallets::Table)
                        .col(UserWallets::UserId)
                        .if_not_exists()
                        .to_owned(),
                )
                .await?;
        }

        if !manager.has_table("job_runs").await? {
            // Create job_runs table
            manager
                .create_table(
                    Table::create()
                        .table(JobRuns::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(JobRuns::Id)
                                .big_integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(JobRuns::CampaignId).big_integer().not_null())
                        .col(
                            ColumnDef::new(JobRuns::Status)
                                .string()
                                .not_null()
                                .default("STARTING"),
                        )
                        .col(
                            ColumnDef::new(JobRuns::ReadCount)
                                .big_integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(JobRuns::WriteCount)
                                .big_integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(JobRuns::SkipCount)
                                .big_integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(JobRuns::StartedAt)
                                .timestamp()
                                .not_null()
                                .default(Expr::current_timestamp()),
                        )
                        .col(ColumnDef::new(JobRuns::FinishedAt).timestamp())
                        .col(ColumnDef::new(JobRuns::ExitMessage).text())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("job_runs_campaign_id")
                        .table(JobRuns::Table)
                        .col(JobRuns::CampaignId)
                        .if_not_exists()
                        .to_owned(),
                )
                .await?;
        }

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(JobRuns::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(UserWallets::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Donations::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Campaigns::Table).if_exists().to_owned())
            .await?;

        Ok(())
    }
}

// Campaigns table
#[derive(Iden)]
enum Campaigns {
    Table,
    Id,
    Title,
    Status,
    DeletedAt,
    BeneficiaryAddress,
    ContractAddress,
    ChainCampaignId,
    BatchRunId,
    BatchStatus,
    BatchStartedAt,
    BatchCompletedAt,
    TotalProcessed,
    SuccessfulTransfers,
    FailedTransfers,
    CreatedAt,
}

// Donations table
#[derive(Iden)]
enum Donations {
    Table,
    Id,
    CampaignId,
    UserId,
    Amount,
    Message,
    DonorName,
    Anonymous,
    PaymentId,
    PaymentStatus,
    PaidAt,
    BlockchainStatus,
    DonationTxHash,
    DonorWalletAddress,
    TokenType,
    TokenAmount,
    GasFee,
    BlockchainRecordedAt,
    BlockchainErrorMessage,
    FraudReviewStatus,
    CreatedAt,
}

// User wallets table
#[derive(Iden)]
enum UserWallets {
    Table,
    Id,
    UserId,
    WalletAddress,
    EncryptedPrivateKey,
    IsPrimary,
    IsVerified,
    CreatedAt,
}

// Job runs table
#[derive(Iden)]
enum JobRuns {
    Table,
    Id,
    CampaignId,
    Status,
    ReadCount,
    WriteCount,
    SkipCount,
    StartedAt,
    FinishedAt,
    ExitMessage,
}
