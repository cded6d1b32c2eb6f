//! Transaction ingest: deduplication and quarantine of unusable records

use crate::types::transaction::{RawTransaction, Transaction};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Why a record was excluded from analysis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuarantineReason {
    MissingId,
    MissingDate,
    MissingAmount,
    InvalidAmount,
    MissingDirection,
}

/// A record retained for audit but excluded from analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuarantinedRecord {
    pub transaction_id: Option<String>,
    pub reason: QuarantineReason,
}

/// Result of validating the raw transaction history
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IngestedLedger {
    /// Valid, unique transactions in input order
    pub transactions: Vec<Transaction>,
    pub quarantined: Vec<QuarantinedRecord>,
    pub duplicates_removed: usize,
    pub raw_count: usize,
}

impl IngestedLedger {
    /// Share of raw records that survived ingest, as 0 - 100
    pub fn data_quality_score(&self) -> f64 {
        if self.raw_count == 0 {
            return 100.0;
        }
        100.0 * self.transactions.len() as f64 / self.raw_count as f64
    }

    /// Look up an accepted transaction by id
    pub fn find(&self, transaction_id: &str) -> Option<&Transaction> {
        self.transactions
            .iter()
            .find(|t| t.transaction_id == transaction_id)
    }
}

/// Validate the raw history in input order.
///
/// A quarantined record does not claim its identifier, so a later valid
/// copy with the same id is still accepted.
pub fn ingest(raw: Vec<RawTransaction>) -> IngestedLedger {
    let raw_count = raw.len();
    let mut seen: HashSet<String> = HashSet::with_capacity(raw_count);
    let mut ledger = IngestedLedger {
        raw_count,
        ..Default::default()
    };

    for record in raw {
        let Some(id) = record.transaction_id.filter(|id| !id.trim().is_empty()) else {
            ledger.quarantined.push(QuarantinedRecord {
                transaction_id: None,
                reason: QuarantineReason::MissingId,
            });
            continue;
        };

        if seen.contains(&id) {
            ledger.duplicates_removed += 1;
            continue;
        }

        let checked = match (record.date, record.amount, record.direction) {
            (None, _, _) => Err(QuarantineReason::MissingDate),
            (_, None, _) => Err(QuarantineReason::MissingAmount),
            (_, Some(amount), _) if !amount.is_finite() || amount < 0.0 => {
                Err(QuarantineReason::InvalidAmount)
            }
            (_, _, None) => Err(QuarantineReason::MissingDirection),
            (Some(date), Some(amount), Some(direction)) => Ok((date, amount, direction)),
        };

        match checked {
            Ok((date, amount, direction)) => {
                seen.insert(id.clone());
                ledger.transactions.push(Transaction {
                    transaction_id: id,
                    date,
                    amount,
                    direction,
                    counterparty_id: record.counterparty_id,
                    counterparty_type: record.counterparty_type,
                    geography: record.geography,
                    channel: record.channel,
                    transaction_type: record.transaction_type,
                    memo: record.memo,
                });
            }
            Err(reason) => ledger.quarantined.push(QuarantinedRecord {
                transaction_id: Some(id),
                reason,
            }),
        }
    }

    ledger
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::transaction::Direction;
    use chrono::NaiveDate;

    fn raw(id: Option<&str>, date: Option<(i32, u32, u32)>, amount: Option<f64>) -> RawTransaction {
        RawTransaction {
            transaction_id: id.map(str::to_string),
            date: date.map(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d).unwrap()),
            amount,
            direction: Some(Direction::Inbound),
            counterparty_id: None,
            counterparty_type: None,
            geography: None,
            channel: None,
            transaction_type: None,
            memo: None,
        }
    }

    #[test]
    fn test_duplicates_and_quarantine() {
        let ledger = ingest(vec![
            raw(Some("T1"), Some((2026, 1, 3)), Some(100.0)),
            raw(Some("T1"), Some((2026, 1, 3)), Some(100.0)),
            raw(None, Some((2026, 1, 4)), Some(50.0)),
            raw(Some("T2"), None, Some(75.0)),
            raw(Some("T3"), Some((2026, 1, 5)), None),
            raw(Some("T4"), Some((2026, 1, 5)), Some(-1.0)),
            raw(Some("T5"), Some((2026, 1, 6)), Some(20.0)),
        ]);

        assert_eq!(ledger.transactions.len(), 2);
        assert_eq!(ledger.duplicates_removed, 1);
        assert_eq!(ledger.quarantined.len(), 4);

        let reasons: Vec<QuarantineReason> = ledger.quarantined.iter().map(|q| q.reason).collect();
        assert_eq!(
            reasons,
            vec![
                QuarantineReason::MissingId,
                QuarantineReason::MissingDate,
                QuarantineReason::MissingAmount,
                QuarantineReason::InvalidAmount,
            ]
        );
        assert!((ledger.data_quality_score() - 200.0 / 7.0).abs() < 1e-9);
    }

    #[test]
    fn test_quarantined_record_does_not_claim_id() {
        let ledger = ingest(vec![
            raw(Some("T1"), None, Some(100.0)),
            raw(Some("T1"), Some((2026, 1, 3)), Some(100.0)),
        ]);

        assert_eq!(ledger.transactions.len(), 1);
        assert_eq!(ledger.duplicates_removed, 0);
        assert!(ledger.find("T1").is_some());
    }

    #[test]
    fn test_missing_direction_is_quarantined() {
        let mut undirected = raw(Some("T1"), Some((2026, 1, 3)), Some(100.0));
        undirected.direction = None;

        let ledger = ingest(vec![undirected, raw(Some("T2"), Some((2026, 1, 4)), Some(5.0))]);

        assert_eq!(ledger.transactions.len(), 1);
        assert_eq!(
            ledger.quarantined,
            vec![QuarantinedRecord {
                transaction_id: Some("T1".into()),
                reason: QuarantineReason::MissingDirection,
            }]
        );
    }

    #[test]
    fn test_empty_history_has_full_quality() {
        let ledger = ingest(Vec::new());
        assert_eq!(ledger.data_quality_score(), 100.0);
    }
}
