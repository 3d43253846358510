pub mod campaign;
pub mod donation;
pub mod job_run;
pub mod transfer_result;
pub mod wallet;

pub use campaign::{CampaignRef, CampaignStatus};
pub use donation::{BlockchainStatus, FraudReviewStatus, PendingDonation};
pub use job_run::{JobStatus, RunStats};
pub use transfer_result::{FailureKind, TransferOutcome, TransferResult};
pub use wallet::WalletRecord;
