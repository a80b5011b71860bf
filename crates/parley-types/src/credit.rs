//! Credit balance types for Parley.
//!
//! The balance is owned by an external credit service; the client only keeps
//! a read-only mirror of the most recent value.

use serde::{Deserialize, Serialize};

/// Body returned by the credit service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreditBalance {
    pub balance: f64,
}

/// Point-in-time view of the mirrored balance.
///
/// `balance` is `None` while no refresh has completed successfully, or after
/// the latest refresh failed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BalanceSnapshot {
    pub balance: Option<f64>,
    pub is_loading: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

impl BalanceSnapshot {
    /// Render the balance for display, e.g. `Chipps: 42` or `Chipps: loading...`.
    ///
    /// A loading snapshot never shows a number, so a stale value cannot be
    /// mistaken for the current one.
    pub fn display(&self, label: &str) -> String {
        if self.is_loading {
            return format!("{label}: loading...");
        }
        match self.balance {
            Some(value) => format!("{label}: {}", format_balance(value)),
            None => format!("{label}: --"),
        }
    }
}

fn format_balance(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value:.2}")
    }
}

/// Errors from a balance fetch.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BalanceError {
    #[error("network error: {0}")]
    Network(String),

    #[error("credit service returned HTTP {status}")]
    Status { status: u16 },

    #[error("malformed balance response: {0}")]
    Malformed(String),

    #[error("balance fetch timed out after {ms}ms")]
    Timeout { ms: u64 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_snapshot_is_unknown() {
        let snapshot = BalanceSnapshot::default();
        assert!(snapshot.balance.is_none());
        assert!(!snapshot.is_loading);
        assert_eq!(snapshot.display("Chipps"), "Chipps: --");
    }

    #[test]
    fn test_loading_hides_value() {
        let snapshot = BalanceSnapshot {
            balance: Some(12.0),
            is_loading: true,
            last_error: None,
        };
        assert_eq!(snapshot.display("Chipps"), "Chipps: loading...");
    }

    #[test]
    fn test_display_formats_value() {
        let whole = BalanceSnapshot {
            balance: Some(42.0),
            ..Default::default()
        };
        assert_eq!(whole.display("Chipps"), "Chipps: 42");

        let fractional = BalanceSnapshot {
            balance: Some(3.5),
            ..Default::default()
        };
        assert_eq!(fractional.display("Credits"), "Credits: 3.50");
    }

    #[test]
    fn test_zero_is_distinct_from_unknown() {
        let zero = BalanceSnapshot {
            balance: Some(0.0),
            ..Default::default()
        };
        assert_eq!(zero.display("Chipps"), "Chipps: 0");
        assert_ne!(zero.display("Chipps"), BalanceSnapshot::default().display("Chipps"));
    }

    #[test]
    fn test_credit_balance_deserialize() {
        let parsed: CreditBalance = serde_json::from_str(r#"{"balance": 17}"#).unwrap();
        assert!((parsed.balance - 17.0).abs() < f64::EPSILON);
    }
}
