/// Lifecycle status of a campaign
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CampaignStatus {
    Draft,
    Active,
    Completed,
    Cancelled,
}

impl CampaignStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CampaignStatus::Draft => "DRAFT",
            CampaignStatus::Active => "ACTIVE",
            CampaignStatus::Completed => "COMPLETED",
            CampaignStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "DRAFT" => Some(CampaignStatus::Draft),
            "ACTIVE" => Some(CampaignStatus::Active),
            "COMPLETED" => Some(CampaignStatus::Completed),
            "CANCELLED" => Some(CampaignStatus::Cancelled),
            _ => None,
        }
    }
}

/// Chain data of the campaign a run settles.
///
/// The optional fields are validated per donation; a campaign missing them
/// produces skippable failures rather than refusing the whole run.
#[derive(Debug, Clone)]
pub struct CampaignRef {
    pub id: i64,
    pub beneficiary_address: Option<String>,
    pub contract_address: Option<String>,
    pub chain_campaign_id: Option<i64>,
}
