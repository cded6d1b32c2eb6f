//! External risk signals (watchlist, case history, credit bureau, ...)

use crate::types::customer::KycRiskRating;
use serde::{Deserialize, Serialize};

/// Raw values supplied by the watchlist service, case-history store, credit
/// bureau and investigators. Every field is optional: an absent signal
/// contributes nothing to the risk score and is never an error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskSignals {
    /// Sanctions / watchlist screening hit
    #[serde(alias = "sanctions_hit")]
    pub watchlist_hit: Option<bool>,

    /// Number of SARs previously filed on the customer
    pub prior_sar_count: Option<u32>,

    /// Activity types of the prior SARs (e.g. "structuring")
    pub prior_sar_activity: Vec<String>,

    /// Politically exposed person
    #[serde(alias = "pep_status")]
    pub pep: Option<bool>,

    /// Law-enforcement request / inquiry on file
    pub law_enforcement_flag: Option<bool>,

    pub adverse_media: Option<bool>,

    pub internal_referral_count: Option<u32>,

    /// KYC rating override; falls back to the customer profile when absent
    pub kyc_rating: Option<KycRiskRating>,

    pub investigator_notes: Option<String>,

    /// Payment history no longer current
    pub credit_deterioration: Option<bool>,

    /// Credit card utilization as a 0.0 - 1.0 ratio
    pub credit_utilization: Option<f64>,
}

impl RiskSignals {
    pub fn has_watchlist_hit(&self) -> bool {
        self.watchlist_hit.unwrap_or(false)
    }

    pub fn prior_sars(&self) -> u32 {
        self.prior_sar_count.unwrap_or(0)
    }

    /// Investigator notes with content (blank notes do not count)
    pub fn notes(&self) -> Option<&str> {
        self.investigator_notes
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
    }

    /// Fill the KYC rating from the profile when the signal is missing
    pub fn with_kyc_fallback(mut self, profile_rating: KycRiskRating) -> Self {
        if self.kyc_rating.is_none() {
            self.kyc_rating = Some(profile_rating);
        }
        self
    }

    pub fn with_watchlist_hit(mut self) -> Self {
        self.watchlist_hit = Some(true);
        self
    }

    pub fn with_prior_sars(mut self, count: u32, activity: &[&str]) -> Self {
        self.prior_sar_count = Some(count);
        self.prior_sar_activity = activity.iter().map(|a| a.to_string()).collect();
        self
    }

    pub fn with_pep(mut self) -> Self {
        self.pep = Some(true);
        self
    }

    pub fn with_adverse_media(mut self) -> Self {
        self.adverse_media = Some(true);
        self
    }
}

/// Category of the collaborator that supplied a risk signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalSource {
    Watchlist,
    CaseHistory,
    RiskIntel,
    LawEnforcement,
    Internal,
    Kyc,
    Investigator,
    CreditBureau,
    Monitoring,
}

/// Points awarded for one risk signal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskFactor {
    pub name: String,
    pub source: SignalSource,
    pub points: f64,
    pub max_points: f64,
    /// Raw contributing value, rendered for audit
    pub raw_value: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_payload_is_all_absent() {
        let signals: RiskSignals = serde_json::from_str("{}").unwrap();

        assert_eq!(signals, RiskSignals::default());
        assert!(!signals.has_watchlist_hit());
        assert_eq!(signals.prior_sars(), 0);
    }

    #[test]
    fn test_blank_notes_are_ignored() {
        let signals = RiskSignals {
            investigator_notes: Some("   ".to_string()),
            ..Default::default()
        };
        assert_eq!(signals.notes(), None);
    }

    #[test]
    fn test_kyc_fallback_keeps_explicit_signal() {
        let explicit = RiskSignals {
            kyc_rating: Some(KycRiskRating::Low),
            ..Default::default()
        };
        assert_eq!(
            explicit.with_kyc_fallback(KycRiskRating::High).kyc_rating,
            Some(KycRiskRating::Low)
        );
        assert_eq!(
            RiskSignals::default()
                .with_kyc_fallback(KycRiskRating::High)
                .kyc_rating,
            Some(KycRiskRating::High)
        );
    }
}
