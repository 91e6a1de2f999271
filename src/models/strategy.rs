//! Execution strategies
//!
//! A strategy decides how a batch's items are scheduled relative to each
//! other and to concurrently running batches.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Scheduling policy for a batch of work items
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Items run independently, one worker each.
    Free,
    /// Items run together, in declaration order, inside one worker.
    Serial,
    /// Like free, but no other batch's work may run concurrently.
    IsolatedFree,
    /// Like serial, but no other batch's work may run concurrently.
    IsolatedSerial,
}

impl Strategy {
    /// Scheduling priority. Isolated batches sort after everything that is
    /// allowed to overlap, so the drain barrier around them is cheap.
    pub fn priority(&self) -> u8 {
        match self {
            Strategy::Free | Strategy::Serial => 0,
            Strategy::IsolatedFree => 1,
            Strategy::IsolatedSerial => 2,
        }
    }

    /// Whether other batches are barred from running concurrently.
    pub fn is_isolated(&self) -> bool {
        matches!(self, Strategy::IsolatedFree | Strategy::IsolatedSerial)
    }

    /// Whether the batch's items share a single worker.
    pub fn runs_together(&self) -> bool {
        matches!(self, Strategy::Serial | Strategy::IsolatedSerial)
    }

    /// Canonical name, as written in group declarations.
    pub fn name(&self) -> &'static str {
        match self {
            Strategy::Free => "free",
            Strategy::Serial => "serial",
            Strategy::IsolatedFree => "isolated_free",
            Strategy::IsolatedSerial => "isolated_serial",
        }
    }

    /// Get all strategies
    pub fn all() -> Vec<Strategy> {
        vec![
            Strategy::Free,
            Strategy::Serial,
            Strategy::IsolatedFree,
            Strategy::IsolatedSerial,
        ]
    }
}

impl FromStr for Strategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s {
            "free" => Ok(Strategy::Free),
            "serial" => Ok(Strategy::Serial),
            "isolated_free" => Ok(Strategy::IsolatedFree),
            "isolated_serial" => Ok(Strategy::IsolatedSerial),
            other => Err(Error::UnknownStrategy(other.to_string())),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_ordering() {
        assert_eq!(Strategy::Free.priority(), 0);
        assert_eq!(Strategy::Serial.priority(), 0);
        assert_eq!(Strategy::IsolatedFree.priority(), 1);
        assert_eq!(Strategy::IsolatedSerial.priority(), 2);
    }

    #[test]
    fn test_isolation() {
        assert!(!Strategy::Free.is_isolated());
        assert!(!Strategy::Serial.is_isolated());
        assert!(Strategy::IsolatedFree.is_isolated());
        assert!(Strategy::IsolatedSerial.is_isolated());
    }

    #[test]
    fn test_parse_round_trip() {
        for strategy in Strategy::all() {
            assert_eq!(strategy.name().parse::<Strategy>().unwrap(), strategy);
        }
    }

    #[test]
    fn test_parse_unknown() {
        let err = "eventually".parse::<Strategy>().unwrap_err();
        assert!(matches!(err, Error::UnknownStrategy(_)));
        assert!(err.is_configuration());
    }

    #[test]
    fn test_serde_snake_case() {
        let json = serde_json::to_string(&Strategy::IsolatedSerial).unwrap();
        assert_eq!(json, "\"isolated_serial\"");
        let back: Strategy = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Strategy::IsolatedSerial);
    }
}
