//! # Probe Scenarios
//!
//! Names the scripted exchanges the probe can drive and parses them
//! from the command line.

use std::fmt;
use thiserror::Error;

/// Errors produced while parsing a scenario name
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ScenarioError {
    #[error("Missing scenario name")]
    Missing,

    #[error("Unknown scenario: {0}")]
    Unknown(String),
}

/// A scripted exchange over a freshly wired three-peer world
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scenario {
    /// The host asks the page a question and the page echoes it back
    Roundtrip,
    /// The page asks the host for the tab list, typed end to end
    TabQuery,
    /// The host is destroyed while a reply is in flight; the late reply
    /// must be dropped and the drop must be visible in diagnostics
    Teardown,
}

impl Scenario {
    /// Every scenario the probe knows, in the order usage lists them
    pub const ALL: [Scenario; 3] = [Scenario::Roundtrip, Scenario::TabQuery, Scenario::Teardown];

    /// Parses a scenario name as given on the command line.
    ///
    /// Matching is case-insensitive and tolerant of surrounding
    /// whitespace. `tabs` is accepted as shorthand for `tab-query`.
    pub fn parse(input: &str) -> Result<Self, ScenarioError> {
        match input.trim().to_lowercase().as_str() {
            "roundtrip" => Ok(Scenario::Roundtrip),
            "tab-query" | "tabs" => Ok(Scenario::TabQuery),
            "teardown" => Ok(Scenario::Teardown),
            "" => Err(ScenarioError::Missing),
            other => Err(ScenarioError::Unknown(other.to_string())),
        }
    }

    /// The canonical command-line name for this scenario
    pub fn as_str(&self) -> &'static str {
        match self {
            Scenario::Roundtrip => "roundtrip",
            Scenario::TabQuery => "tab-query",
            Scenario::Teardown => "teardown",
        }
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_roundtrip() {
        assert_eq!(Scenario::parse("roundtrip"), Ok(Scenario::Roundtrip));
    }

    #[test]
    fn test_parse_tab_query() {
        assert_eq!(Scenario::parse("tab-query"), Ok(Scenario::TabQuery));
        assert_eq!(Scenario::parse("tabs"), Ok(Scenario::TabQuery));
    }

    #[test]
    fn test_parse_teardown() {
        assert_eq!(Scenario::parse("teardown"), Ok(Scenario::Teardown));
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!(Scenario::parse("ROUNDTRIP"), Ok(Scenario::Roundtrip));
        assert_eq!(Scenario::parse("Tab-Query"), Ok(Scenario::TabQuery));
    }

    #[test]
    fn test_parse_trims_whitespace() {
        assert_eq!(Scenario::parse("  teardown  "), Ok(Scenario::Teardown));
    }

    #[test]
    fn test_parse_rejects_empty_input() {
        assert_eq!(Scenario::parse(""), Err(ScenarioError::Missing));
        assert_eq!(Scenario::parse("   "), Err(ScenarioError::Missing));
    }

    #[test]
    fn test_parse_rejects_unknown_scenario() {
        assert_eq!(
            Scenario::parse("warp-drive"),
            Err(ScenarioError::Unknown("warp-drive".to_string()))
        );
    }

    #[test]
    fn test_canonical_names_parse_back() {
        for scenario in Scenario::ALL {
            assert_eq!(Scenario::parse(scenario.as_str()), Ok(scenario));
        }
    }

    #[test]
    fn test_display_matches_canonical_name() {
        assert_eq!(Scenario::TabQuery.to_string(), "tab-query");
    }
}
