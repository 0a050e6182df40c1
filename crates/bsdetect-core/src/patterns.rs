//! Shared regex patterns.
//!
//! Used by the response decoder (labelled-text replies) and by the memory
//! store (entity extraction and known-BS phrase tracking).

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // =========================================================================
    // LABELLED RESPONSE PATTERNS
    // =========================================================================

    /// `VERDICT: [LEGITIMATE/BS/UNCERTAIN]` line
    pub static ref VERDICT_LINE: Regex = Regex::new(
        r"(?mi)^\s*\**VERDICT\**\s*:\s*\[?\s*([A-Za-z_ ]+?)\s*\]?\s*$"
    ).unwrap();

    /// `CONFIDENCE: 85` or `CONFIDENCE: 85%` line
    pub static ref CONFIDENCE_LINE: Regex = Regex::new(
        r"(?mi)^\s*\**CONFIDENCE\**\s*:\s*\[?\s*(-?\d+)\s*%?\s*\]?\s*$"
    ).unwrap();

    /// `REASONING:` marker; everything after it is the reasoning
    pub static ref REASONING_MARKER: Regex = Regex::new(
        r"(?mi)^\s*\**REASONING\**\s*:"
    ).unwrap();

    /// `SEARCH: <query>` line, the labelled form of a tool request
    pub static ref SEARCH_LINE: Regex = Regex::new(
        r"(?mi)^\s*\**SEARCH\**\s*:\s*(.+?)\s*$"
    ).unwrap();

    /// Markdown code fence around a JSON payload
    pub static ref JSON_FENCE: Regex = Regex::new(
        r"(?s)```(?:json)?\s*(\{.*?\})\s*```"
    ).unwrap();

    // =========================================================================
    // ENTITY PATTERNS
    // =========================================================================

    /// Runs of capitalised words ("Boeing", "Wright Brothers")
    pub static ref PROPER_NOUN: Regex = Regex::new(
        r"\b[A-Z][a-z]+(?:\s+[A-Z][a-z]+)*\b"
    ).unwrap();

    /// Acronyms ("NASA", "FAA")
    pub static ref ACRONYM: Regex = Regex::new(r"\b[A-Z]{2,}\b").unwrap();

    /// Letter/digit designators ("A380", "F35", "7E")
    pub static ref DESIGNATOR: Regex = Regex::new(r"\b[A-Z]\d+\b|\b\d+[A-Z]\b").unwrap();

    /// Phrases that recur in fabricated claims
    pub static ref BS_PHRASE: Regex = Regex::new(
        r"\b(?:quantum|perpetual|anti-gravity|light speed|time travel)\b"
    ).unwrap();
}

/// Words that the proper-noun pattern picks up at sentence starts.
pub const COMMON_WORDS: &[&str] = &[
    "The", "This", "That", "These", "Those", "Is", "Are", "Was", "Were", "A", "An", "Another",
];
