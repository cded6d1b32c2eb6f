//! Deterministic synthetic cases
//!
//! Each builder returns a complete `CaseInput` whose expected triage outcome
//! is fixed: the same builder always produces the same case.

use crate::types::alert::{AlertHeader, CaseInput};
use crate::types::customer::{CustomerProfile, KycRiskRating};
use crate::types::signals::RiskSignals;
use crate::types::transaction::{Direction, Transaction};
use chrono::NaiveDate;

/// Calendar date from literal components. Only called with valid dates.
fn day(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("scenario dates are valid calendar dates")
}

fn header(
    alert_id: &str,
    customer_id: &str,
    alert_type: &str,
    window: (NaiveDate, NaiveDate),
    base_risk_score: f64,
    flagged: &[Transaction],
) -> AlertHeader {
    AlertHeader {
        alert_id: Some(alert_id.to_string()),
        customer_id: Some(customer_id.to_string()),
        alert_type: Some(alert_type.to_string()),
        window_start: Some(window.0),
        window_end: Some(window.1),
        base_risk_score: Some(base_risk_score),
        flagged_transaction_ids: Some(flagged.iter().map(|t| t.transaction_id.clone()).collect()),
    }
}

fn inbound(id: String, date: NaiveDate, amount: f64, counterparty: &str) -> Transaction {
    Transaction::new(id, date, amount, Direction::Inbound)
        .with_counterparty(counterparty)
        .with_geography("US")
}

fn outbound(id: String, date: NaiveDate, amount: f64, counterparty: &str) -> Transaction {
    Transaction::new(id, date, amount, Direction::Outbound)
        .with_counterparty(counterparty)
        .with_geography("US")
}

/// 47 cash deposits of 9,520 over seven days from new depositors, 6.8x the
/// usual volume. Triaged TRUE_POSITIVE on the composite score with a
/// structuring typology.
pub fn structuring_layering() -> CaseInput {
    let customer = "CUST-STRUCT-01";
    let clients = [
        "Harbor Card Settlements",
        "Bayview Catering",
        "Metro Events LLC",
        "Coastal Tourism Co",
    ];

    let mut history = Vec::new();
    for month in 7..=12 {
        for i in 0..10u32 {
            history.push(
                inbound(
                    format!("STR-{}-IN-{}", month, i),
                    day(2025, month, 1 + i),
                    18_000.0,
                    clients[i as usize % 4],
                )
                .with_channel("ach")
                .with_type("ach_in"),
            );
        }
        for i in 0..6u32 {
            history.push(
                outbound(
                    format!("STR-{}-OUT-{}", month, i),
                    day(2025, month, 12 + i),
                    17_000.0,
                    "Restaurant Supply Co",
                )
                .with_channel("ach")
                .with_type("ach_out"),
            );
        }
    }

    let flagged: Vec<Transaction> = (0..47u32)
        .map(|i| {
            inbound(
                format!("STR-CASH-{:03}", i + 1),
                day(2026, 1, 3 + i % 7),
                9_520.0,
                &format!("Depositor {:03}", i + 1),
            )
            .with_channel("branch")
            .with_type("cash_deposit")
        })
        .collect();

    let profile = CustomerProfile::new(customer, KycRiskRating::Medium, day(2018, 3, 12))
        .with_income(80_000.0)
        .with_occupation("Restaurant owner");
    let alert = header(
        "ALT-STRUCT-0001",
        customer,
        "structuring",
        (day(2026, 1, 3), day(2026, 1, 9)),
        82.5,
        &flagged,
    );

    CaseInput::new(alert, profile)
        .with_transactions(history)
        .with_transactions(flagged)
}

/// A single year-end bonus from the known employer. Closed by the payroll
/// rule.
pub fn payroll_deposit() -> CaseInput {
    let customer = "CUST-PAY-01";
    let payer = "ACME CORP PAYROLL";

    let mut history = Vec::new();
    for month in 6..=11 {
        history.push(
            inbound(format!("PAY-{}-SAL", month), day(2025, month, 28), 6_500.0, payer)
                .with_channel("ach")
                .with_type("ach_in")
                .with_memo("ACME CORP SALARY"),
        );
        history.push(
            outbound(
                format!("PAY-{}-RENT", month),
                day(2025, month, 1),
                2_200.0,
                "Oakwood Apartments",
            )
            .with_channel("ach")
            .with_type("ach_out"),
        );
        history.push(
            outbound(format!("PAY-{}-UTIL", month), day(2025, month, 5), 180.0, "City Utilities")
                .with_channel("online")
                .with_type("bill_pay"),
        );
    }
    history.push(
        outbound("PAY-12-RENT".to_string(), day(2025, 12, 1), 2_200.0, "Oakwood Apartments")
            .with_channel("ach")
            .with_type("ach_out"),
    );

    let bonus = inbound("PAY-12-BONUS".to_string(), day(2025, 12, 15), 19_500.0, payer)
        .with_channel("ach")
        .with_type("ach_in")
        .with_memo("ACME CORP ANNUAL BONUS");

    let profile = CustomerProfile::new(customer, KycRiskRating::Low, day(2016, 5, 1))
        .with_income(78_000.0)
        .with_occupation("Software engineer")
        .with_employer("Acme Corp");
    let alert = header(
        "ALT-PAY-0001",
        customer,
        "large_deposit",
        (day(2025, 12, 1), day(2025, 12, 31)),
        35.0,
        std::slice::from_ref(&bonus),
    );

    CaseInput::new(alert, profile)
        .with_transactions(history)
        .with_transactions([bonus])
}

/// December card takings 1.1x the previous December. Closed by the
/// seasonal rule.
pub fn seasonal_spike() -> CaseInput {
    let customer = "CUST-SEAS-01";
    let processor = "Card Processor";
    let takings = |id: String, date: NaiveDate, amount: f64| {
        inbound(id, date, amount, processor)
            .with_channel("card")
            .with_type("card_settlement")
    };

    let mut history: Vec<Transaction> = (0..25u32)
        .map(|i| takings(format!("SEAS-2024-12-{}", i), day(2024, 12, 1 + i), 4_000.0))
        .collect();
    for month in 1..=11 {
        for i in 0..5u32 {
            history.push(takings(
                format!("SEAS-2025-{}-{}", month, i),
                day(2025, month, 3 + 5 * i),
                2_000.0,
            ));
        }
    }

    let flagged: Vec<Transaction> = (0..25u32)
        .map(|i| takings(format!("SEAS-2025-12-{}", i), day(2025, 12, 1 + i), 4_400.0))
        .collect();

    let profile = CustomerProfile::new(customer, KycRiskRating::Medium, day(2012, 1, 1))
        .with_income(150_000.0)
        .with_occupation("Retail store owner");
    let alert = header(
        "ALT-SEAS-0001",
        customer,
        "volume_spike",
        (day(2025, 12, 1), day(2025, 12, 31)),
        55.0,
        &flagged,
    );

    CaseInput::new(alert, profile)
        .with_transactions(history)
        .with_transactions(flagged)
}

/// Young account receiving wires from four new Mexican payers. Behavioral
/// score 47 and composite 40.3: borderline, sent to the oracle and otherwise
/// NEEDS_REVIEW.
pub fn borderline_review() -> CaseInput {
    let customer = "CUST-BORD-01";

    let mut history = Vec::new();
    for month in 8..=10 {
        for (i, d) in [5u32, 12, 19, 26].into_iter().enumerate() {
            history.push(
                inbound(
                    format!("BRD-{}-IN-{}", month, i),
                    day(2025, month, d),
                    2_500.0,
                    "Northwind Consulting",
                )
                .with_channel("ach")
                .with_type("ach_in"),
            );
        }
        for (i, d) in [10u32, 24].into_iter().enumerate() {
            history.push(
                outbound(
                    format!("BRD-{}-OUT-{}", month, i),
                    day(2025, month, d),
                    1_000.0,
                    "Lakeside Rentals",
                )
                .with_channel("ach")
                .with_type("ach_out"),
            );
        }
    }

    let payers = [
        "Rio Trading SA",
        "Monterrey Imports",
        "Baja Logistics",
        "Sonora Supply",
    ];
    let flagged: Vec<Transaction> = [20u32, 21, 22, 23, 25, 26, 27, 28]
        .into_iter()
        .enumerate()
        .map(|(i, d)| {
            Transaction::new(
                format!("BRD-WIRE-{}", i + 1),
                day(2025, 11, d),
                1_500.0,
                Direction::Inbound,
            )
            .with_counterparty(payers[i % payers.len()])
            .with_geography("MX")
            .with_channel("wire")
            .with_type("wire_in")
        })
        .collect();

    let profile = CustomerProfile::new(customer, KycRiskRating::Medium, day(2025, 8, 1))
        .with_income(60_000.0)
        .with_occupation("Consultant");
    let alert = header(
        "ALT-BORD-0001",
        customer,
        "rapid_movement",
        (day(2025, 11, 20), day(2025, 11, 29)),
        50.0,
        &flagged,
    );

    CaseInput::new(alert, profile)
        .with_transactions(history)
        .with_transactions(flagged)
}

/// Student account collecting deposits from twelve strangers and draining
/// them in cash. TRUE_POSITIVE with a funnel-account typology.
pub fn funnel_account() -> CaseInput {
    let customer = "CUST-FUN-01";

    let history: Vec<Transaction> = [(9u32, 5u32), (9, 20), (10, 5), (10, 20)]
        .into_iter()
        .map(|(m, d)| {
            inbound(format!("FUN-{}-{}", m, d), day(2025, m, d), 500.0, "Parents")
                .with_channel("mobile")
                .with_type("p2p_in")
        })
        .collect();

    let mut flagged: Vec<Transaction> = [10u32, 10, 11, 12, 12, 13, 14, 15, 15, 16, 17, 18]
        .into_iter()
        .enumerate()
        .map(|(i, d)| {
            inbound(
                format!("FUN-DEP-{:02}", i + 1),
                day(2025, 11, d),
                2_500.0,
                &format!("Depositor {}", (b'A' + i as u8) as char),
            )
            .with_channel("branch")
            .with_type("cash_deposit")
        })
        .collect();
    flagged.extend([11u32, 13, 15, 17, 19, 21].into_iter().enumerate().map(|(i, d)| {
        Transaction::new(
            format!("FUN-ATM-{}", i + 1),
            day(2025, 11, d),
            4_750.0,
            Direction::Outbound,
        )
        .with_geography("US")
        .with_channel("atm")
        .with_type("cash_withdrawal")
    }));

    let profile = CustomerProfile::new(customer, KycRiskRating::Low, day(2025, 9, 1))
        .with_income(6_000.0)
        .with_occupation("Student");
    let alert = header(
        "ALT-FUN-0001",
        customer,
        "funnel_account",
        (day(2025, 11, 10), day(2025, 11, 23)),
        75.0,
        &flagged,
    );

    CaseInput::new(alert, profile)
        .with_transactions(history)
        .with_transactions(flagged)
}

/// Ordinary activity, maximum alert base risk and an adverse-media hit.
/// Composite is exactly 45 with no rule match and no oracle call.
pub fn neutral_composite() -> CaseInput {
    let customer = "CUST-NEUT-01";

    let mut history = Vec::new();
    for month in 6..=11 {
        for (i, d) in [2u32, 9, 16, 23].into_iter().enumerate() {
            history.push(
                inbound(
                    format!("NEU-{}-IN-{}", month, i),
                    day(2025, month, d),
                    3_000.0,
                    "Globex Payroll",
                )
                .with_channel("ach"),
            );
        }
        for (i, d) in [4u32, 18].into_iter().enumerate() {
            history.push(
                outbound(
                    format!("NEU-{}-OUT-{}", month, i),
                    day(2025, month, d),
                    1_500.0,
                    "Maple Mortgage",
                )
                .with_channel("ach"),
            );
        }
    }

    let flagged = vec![
        inbound(
            "NEU-12-IN-0".to_string(),
            day(2025, 12, 2),
            3_000.0,
            "Globex Payroll",
        )
        .with_channel("ach"),
        inbound(
            "NEU-12-IN-1".to_string(),
            day(2025, 12, 9),
            3_000.0,
            "Globex Payroll",
        )
        .with_channel("ach"),
    ];
    history.push(
        outbound(
            "NEU-12-OUT-0".to_string(),
            day(2025, 12, 4),
            1_500.0,
            "Maple Mortgage",
        )
        .with_channel("ach"),
    );

    let profile = CustomerProfile::new(customer, KycRiskRating::Medium, day(2010, 4, 1))
        .with_income(120_000.0)
        .with_occupation("Accountant");
    let alert = header(
        "ALT-NEUT-0001",
        customer,
        "watchlist_media",
        (day(2025, 12, 1), day(2025, 12, 10)),
        100.0,
        &flagged,
    );

    CaseInput::new(alert, profile)
        .with_transactions(history)
        .with_transactions(flagged)
        .with_signals(RiskSignals::default().with_adverse_media())
}

/// The payroll case with a watchlist hit: sanctions outrank the payroll rule.
pub fn sanctions_hit() -> CaseInput {
    let mut case = payroll_deposit();
    case.alert.alert_id = Some("ALT-SANC-0001".to_string());
    case.with_signals(RiskSignals::default().with_watchlist_hit())
}

/// Every scenario, in a fixed order
pub fn all() -> Vec<CaseInput> {
    vec![
        structuring_layering(),
        payroll_deposit(),
        seasonal_spike(),
        borderline_review(),
        funnel_account(),
        neutral_composite(),
        sanctions_hit(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_scenario_validates() {
        for case in all() {
            let id = case.alert_id().map(str::to_string);
            assert!(case.validate().is_ok(), "scenario {:?} is malformed", id);
        }
    }

    #[test]
    fn test_builders_are_deterministic() {
        let first = serde_json::to_string(&structuring_layering()).unwrap();
        let second = serde_json::to_string(&structuring_layering()).unwrap();
        assert_eq!(first, second);
    }
}
