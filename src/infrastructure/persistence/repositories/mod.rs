pub mod campaign_repository;
pub mod donation_repository;
pub mod job_run_repository;
pub mod wallet_repository;

pub use campaign_repository::CampaignRepository;
pub use donation_repository::DonationRepository;
pub use job_run_repository::JobRunRepository;
pub use wallet_repository::WalletRepository;
