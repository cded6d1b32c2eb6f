//! Customer KYC profile

use crate::error::{Result, TriageError};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// KYC risk rating assigned at onboarding / last refresh
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KycRiskRating {
    #[serde(alias = "low", alias = "LOW")]
    Low,
    #[serde(alias = "medium", alias = "MEDIUM")]
    Medium,
    #[serde(alias = "high", alias = "HIGH")]
    High,
}

/// Customer profile as delivered by the KYC store.
///
/// Required fields are optional on the wire so that a missing or unreadable
/// value surfaces as `MalformedAlert` naming the field.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileRecord {
    pub customer_id: Option<String>,

    #[serde(
        alias = "risk_rating",
        alias = "customer_risk_rating",
        deserialize_with = "crate::types::lenient"
    )]
    pub kyc_risk_rating: Option<KycRiskRating>,

    #[serde(
        alias = "account_opened_date",
        alias = "account_open_date",
        deserialize_with = "crate::types::lenient"
    )]
    pub account_opened: Option<NaiveDate>,

    #[serde(alias = "annual_income", deserialize_with = "crate::types::lenient")]
    pub declared_annual_income: Option<f64>,

    pub occupation: Option<String>,
    pub employer: Option<String>,
    pub historical_counterparties: BTreeSet<String>,
    pub historical_geographies: BTreeSet<String>,
}

impl ProfileRecord {
    /// Check the required profile fields for the alert `alert_id`
    pub fn validate(self, alert_id: &str) -> Result<CustomerProfile> {
        let id = Some(alert_id);
        let customer_id = self
            .customer_id
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| {
                TriageError::malformed(id, "customer_profile.customer_id", "is missing")
            })?;
        let kyc_risk_rating = self.kyc_risk_rating.ok_or_else(|| {
            TriageError::malformed(id, "customer_profile.kyc_risk_rating", "is missing or invalid")
        })?;
        let account_opened = self.account_opened.ok_or_else(|| {
            TriageError::malformed(id, "customer_profile.account_opened", "is missing or invalid")
        })?;

        Ok(CustomerProfile {
            customer_id,
            kyc_risk_rating,
            account_opened,
            declared_annual_income: self.declared_annual_income,
            occupation: self.occupation,
            employer: self.employer,
            historical_counterparties: self.historical_counterparties,
            historical_geographies: self.historical_geographies,
        })
    }
}

impl From<CustomerProfile> for ProfileRecord {
    fn from(profile: CustomerProfile) -> Self {
        Self {
            customer_id: Some(profile.customer_id),
            kyc_risk_rating: Some(profile.kyc_risk_rating),
            account_opened: Some(profile.account_opened),
            declared_annual_income: profile.declared_annual_income,
            occupation: profile.occupation,
            employer: profile.employer,
            historical_counterparties: profile.historical_counterparties,
            historical_geographies: profile.historical_geographies,
        }
    }
}

/// Validated customer profile. Never mutated by triage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerProfile {
    pub customer_id: String,
    pub kyc_risk_rating: KycRiskRating,
    pub account_opened: NaiveDate,
    /// Declared annual income; `None` when nothing was declared
    pub declared_annual_income: Option<f64>,
    pub occupation: Option<String>,
    pub employer: Option<String>,
    /// Counterparties known from KYC / prior reviews
    pub historical_counterparties: BTreeSet<String>,
    /// Countries known from KYC / prior reviews
    pub historical_geographies: BTreeSet<String>,
}

impl CustomerProfile {
    /// Create a profile with the required KYC fields
    pub fn new(
        customer_id: impl Into<String>,
        kyc_risk_rating: KycRiskRating,
        account_opened: NaiveDate,
    ) -> Self {
        Self {
            customer_id: customer_id.into(),
            kyc_risk_rating,
            account_opened,
            declared_annual_income: None,
            occupation: None,
            employer: None,
            historical_counterparties: BTreeSet::new(),
            historical_geographies: BTreeSet::new(),
        }
    }

    pub fn with_income(mut self, annual_income: f64) -> Self {
        self.declared_annual_income = Some(annual_income);
        self
    }

    pub fn with_occupation(mut self, occupation: impl Into<String>) -> Self {
        self.occupation = Some(occupation.into());
        self
    }

    pub fn with_employer(mut self, employer: impl Into<String>) -> Self {
        self.employer = Some(employer.into());
        self
    }

    /// Record a counterparty the customer has dealt with before
    pub fn with_historical_counterparty(mut self, counterparty: impl Into<String>) -> Self {
        self.historical_counterparties.insert(counterparty.into());
        self
    }

    pub fn with_historical_geography(mut self, geography: impl Into<String>) -> Self {
        self.historical_geographies.insert(geography.into());
        self
    }

    /// Account age in days as of `as_of` (never negative)
    pub fn account_age_days(&self, as_of: NaiveDate) -> i64 {
        (as_of - self.account_opened).num_days().max(0)
    }

    /// Declared income when it is a usable positive amount
    pub fn usable_income(&self) -> Option<f64> {
        self.declared_annual_income
            .filter(|income| income.is_finite() && *income > 0.0)
    }
}
