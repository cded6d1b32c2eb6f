//! Triage: rule cascade, typology and routing

pub mod behavioral;
pub mod cascade;
pub mod oracle;
pub mod router;
pub mod rules;
pub mod typology;

pub use behavioral::{BehavioralScore, BehavioralScorer};
pub use cascade::{classify_composite, composite_score, TriageCascade};
pub use oracle::{JudgmentOracle, OracleJudgment, StaticOracle};
pub use router::route;
pub use rules::{RuleBook, RuleMatch, TriageRule};
pub use typology::{select_category, IndicatorTally, TypologyClassifier};
