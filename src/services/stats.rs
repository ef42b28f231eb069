//! Donor/campaign aggregate recompute.
//!
//! Runs synchronously after a donation enters (or would leave) the paid
//! set. Failures are logged and swallowed so a donor or campaign glitch
//! never blocks the payment transition itself; the outcome is returned so
//! callers and tests can still observe what happened.

use std::sync::Arc;
use tracing::warn;

use crate::database::store::{CampaignStore, Donation, DonorStore};

/// What a refresh attempt actually did. `None` means the donation had no
/// link to that entity.
#[derive(Debug, Clone, Default)]
pub struct StatsRefreshOutcome {
    pub donor_refreshed: Option<bool>,
    pub campaign_refreshed: Option<bool>,
}

pub struct StatsRefresher {
    donors: Arc<dyn DonorStore>,
    campaigns: Arc<dyn CampaignStore>,
}

impl StatsRefresher {
    pub fn new(donors: Arc<dyn DonorStore>, campaigns: Arc<dyn CampaignStore>) -> Self {
        Self { donors, campaigns }
    }

    /// Recompute aggregates for the donor and campaign a donation points
    /// at. Fire-and-log: never returns an error.
    pub async fn refresh_for(&self, donation: &Donation) -> StatsRefreshOutcome {
        let mut outcome = StatsRefreshOutcome::default();

        if let Some(donor_id) = donation.donor_id {
            outcome.donor_refreshed = Some(match self.donors.refresh_stats(donor_id).await {
                Ok(()) => true,
                Err(e) => {
                    warn!(donation_id = %donation.id, donor_id = %donor_id, error = %e,
                          "Donor stat recompute failed");
                    false
                }
            });
        }

        if let Some(campaign_id) = donation.campaign_id {
            outcome.campaign_refreshed =
                Some(match self.campaigns.refresh_stats(campaign_id).await {
                    Ok(()) => true,
                    Err(e) => {
                        warn!(donation_id = %donation.id, campaign_id = %campaign_id, error = %e,
                              "Campaign stat recompute failed");
                        false
                    }
                });
        }

        outcome
    }
}
