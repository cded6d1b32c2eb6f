//! Transaction data structures for alert triage

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Direction of funds relative to the monitored account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[serde(alias = "inflow")]
    Inbound,
    #[serde(alias = "outflow")]
    Outbound,
}

/// Transaction record as delivered by the monitoring feed.
///
/// Identifier, date, amount and direction are optional on the wire, and an
/// unreadable date, amount or direction reads as absent. Such records are
/// quarantined during ingest instead of failing the alert.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawTransaction {
    #[serde(default, alias = "txn_id")]
    pub transaction_id: Option<String>,

    #[serde(default, deserialize_with = "crate::types::lenient")]
    pub date: Option<NaiveDate>,

    #[serde(default, deserialize_with = "crate::types::lenient")]
    pub amount: Option<f64>,

    #[serde(default, deserialize_with = "crate::types::lenient")]
    pub direction: Option<Direction>,

    /// Counterparty identifier (name or account reference)
    #[serde(default, alias = "counterparty_name")]
    pub counterparty_id: Option<String>,

    /// Counterparty type (individual, business, bank, ...)
    #[serde(default)]
    pub counterparty_type: Option<String>,

    /// Counterparty country code
    #[serde(default, alias = "counterparty_country")]
    pub geography: Option<String>,

    /// Channel (branch, online, atm, mobile, wire)
    #[serde(default)]
    pub channel: Option<String>,

    /// Instrument type (cash_deposit, wire_out, ach_in, ...)
    #[serde(default, alias = "type")]
    pub transaction_type: Option<String>,

    #[serde(default)]
    pub memo: Option<String>,
}

/// Validated transaction: identifier, date and amount are present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub transaction_id: String,
    pub date: NaiveDate,
    pub amount: f64,
    pub direction: Direction,
    pub counterparty_id: Option<String>,
    pub counterparty_type: Option<String>,
    pub geography: Option<String>,
    pub channel: Option<String>,
    pub transaction_type: Option<String>,
    pub memo: Option<String>,
}

impl Transaction {
    /// Create a new transaction with required fields
    pub fn new(
        transaction_id: impl Into<String>,
        date: NaiveDate,
        amount: f64,
        direction: Direction,
    ) -> Self {
        Self {
            transaction_id: transaction_id.into(),
            date,
            amount,
            direction,
            counterparty_id: None,
            counterparty_type: None,
            geography: None,
            channel: None,
            transaction_type: None,
            memo: None,
        }
    }

    pub fn with_counterparty(mut self, counterparty_id: impl Into<String>) -> Self {
        self.counterparty_id = Some(counterparty_id.into());
        self
    }

    pub fn with_counterparty_type(mut self, counterparty_type: impl Into<String>) -> Self {
        self.counterparty_type = Some(counterparty_type.into());
        self
    }

    pub fn with_geography(mut self, geography: impl Into<String>) -> Self {
        self.geography = Some(geography.into());
        self
    }

    pub fn with_channel(mut self, channel: impl Into<String>) -> Self {
        self.channel = Some(channel.into());
        self
    }

    pub fn with_type(mut self, transaction_type: impl Into<String>) -> Self {
        self.transaction_type = Some(transaction_type.into());
        self
    }

    pub fn with_memo(mut self, memo: impl Into<String>) -> Self {
        self.memo = Some(memo.into());
        self
    }

    pub fn is_inbound(&self) -> bool {
        self.direction == Direction::Inbound
    }

    /// Case-insensitive check against the instrument type
    pub fn type_contains(&self, needle: &str) -> bool {
        self.transaction_type
            .as_deref()
            .map(|t| t.to_lowercase().contains(needle))
            .unwrap_or(false)
    }
}

impl From<Transaction> for RawTransaction {
    fn from(tx: Transaction) -> Self {
        Self {
            transaction_id: Some(tx.transaction_id),
            date: Some(tx.date),
            amount: Some(tx.amount),
            direction: Some(tx.direction),
            counterparty_id: tx.counterparty_id,
            counterparty_type: tx.counterparty_type,
            geography: tx.geography,
            channel: tx.channel,
            transaction_type: tx.transaction_type,
            memo: tx.memo,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_transaction_accepts_feed_aliases() {
        let json = r#"{
            "txn_id": "TXN-0001",
            "date": "2026-01-03",
            "amount": 9500.0,
            "direction": "inbound",
            "counterparty_name": "Unknown Sender",
            "counterparty_country": "US",
            "type": "cash_deposit"
        }"#;

        let raw: RawTransaction = serde_json::from_str(json).unwrap();

        assert_eq!(raw.transaction_id.as_deref(), Some("TXN-0001"));
        assert_eq!(raw.amount, Some(9500.0));
        assert_eq!(raw.counterparty_id.as_deref(), Some("Unknown Sender"));
        assert_eq!(raw.geography.as_deref(), Some("US"));
        assert_eq!(raw.transaction_type.as_deref(), Some("cash_deposit"));
        assert!(raw.memo.is_none());
    }

    #[test]
    fn test_missing_date_deserializes_as_none() {
        let json = r#"{"txn_id": "TXN-9", "amount": 10.0, "direction": "outflow"}"#;
        let raw: RawTransaction = serde_json::from_str(json).unwrap();

        assert!(raw.date.is_none());
        assert_eq!(raw.direction, Some(Direction::Outbound));
    }

    #[test]
    fn test_unreadable_fields_deserialize_as_none() {
        let json = r#"{"txn_id": "TXN-9", "date": "2025-13-40", "amount": "lots"}"#;
        let raw: RawTransaction = serde_json::from_str(json).unwrap();

        assert!(raw.date.is_none());
        assert!(raw.amount.is_none());
        assert!(raw.direction.is_none());
    }

    #[test]
    fn test_type_contains_is_case_insensitive() {
        let date = NaiveDate::from_ymd_opt(2026, 1, 3).unwrap();
        let tx = Transaction::new("t1", date, 100.0, Direction::Outbound).with_type("Wire_Out");

        assert!(tx.type_contains("wire"));
        assert!(!tx.type_contains("cash"));
    }
}
