//! Anomaly screening: per-record deny rules and rapid-repeat detection.

pub mod detector;
pub mod rules;

pub use detector::{AnomalyDetector, AnomalyReport};
pub use rules::{AnomalyRules, DenyLists, RapidPlayRule, UNKNOWN_COUNTRY};
