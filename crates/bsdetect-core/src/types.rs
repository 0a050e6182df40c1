//! Shared enums for claim verification.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Category a claim is routed to.
///
/// Each category selects one expert prompt configuration. Only
/// `CurrentEvent` may delegate to the search tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Engineering, physics and technology claims
    Technical,
    /// Past, verifiable events
    Historical,
    /// Claims tied to a specific recent or ongoing date
    CurrentEvent,
    /// Everything else
    General,
}

impl Category {
    /// All categories in routing-prompt order.
    pub const ALL: [Category; 4] = [
        Category::Technical,
        Category::Historical,
        Category::CurrentEvent,
        Category::General,
    ];

    /// Wire name used in prompts and JSON.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Technical => "technical",
            Category::Historical => "historical",
            Category::CurrentEvent => "current_event",
            Category::General => "general",
        }
    }

    /// Whether experts for this category may request a web search.
    pub fn allows_search(&self) -> bool {
        matches!(self, Category::CurrentEvent)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace([' ', '-'], "_").as_str() {
            "technical" => Ok(Category::Technical),
            "historical" => Ok(Category::Historical),
            "current_event" | "current_events" => Ok(Category::CurrentEvent),
            "general" => Ok(Category::General),
            other => Err(format!("unknown category '{}'", other)),
        }
    }
}

/// Binary judgment on a claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Verdict {
    #[serde(rename = "BS")]
    Bs,
    #[serde(rename = "LEGITIMATE")]
    Legitimate,
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Bs => "BS",
            Verdict::Legitimate => "LEGITIMATE",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Verdict as reported in the final result record.
///
/// `Error` is the sentinel the formatter substitutes when no verdict
/// was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReportedVerdict {
    #[serde(rename = "BS")]
    Bs,
    #[serde(rename = "LEGITIMATE")]
    Legitimate,
    #[serde(rename = "ERROR")]
    Error,
}

impl ReportedVerdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportedVerdict::Bs => "BS",
            ReportedVerdict::Legitimate => "LEGITIMATE",
            ReportedVerdict::Error => "ERROR",
        }
    }
}

impl From<Verdict> for ReportedVerdict {
    fn from(verdict: Verdict) -> Self {
        match verdict {
            Verdict::Bs => ReportedVerdict::Bs,
            Verdict::Legitimate => ReportedVerdict::Legitimate,
        }
    }
}

impl fmt::Display for ReportedVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How sure the router is about its classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceLevel {
    High,
    Medium,
    Low,
}
