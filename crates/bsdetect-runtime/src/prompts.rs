//! Prompts for the router and the category experts.
//!
//! Layout:
//! 1. Router prompt (fixed)
//! 2. Expert prompt = persona for the category + shared answer protocol
//! 3. Dynamic content (claim, memory context, search evidence) in user turns
//!
//! Experts answer in JSON; the labelled `VERDICT:` form is accepted as a
//! fallback by the decoder.

use chrono::NaiveDate;
use std::borrow::Cow;

use bsdetect_core::Category;

/// Claims longer than this are cut before being embedded in a prompt.
pub const MAX_CLAIM_CHARS: usize = 500;

/// Router prompt: classify the claim into one of the four categories.
pub const ROUTER_PROMPT: &str = r#"
You are a routing expert that analyzes claims and determines which specialist should handle them.

Categories:
- technical: Claims about technology, engineering, physics, specifications, capabilities
- historical: Claims about past events, dates, historical facts
- current_event: Claims about recent or ongoing events, or anything tied to a specific recent date ("yesterday", "this week")
- general: Everything else

Respond with a single JSON object and nothing else:
{"claim_type": "technical" | "historical" | "current_event" | "general", "confidence_level": "high" | "medium" | "low"}
"#;

const TECHNICAL_PERSONA: &str = r#"
You are a technical expert specializing in technology, engineering, and scientific claims.

You have deep knowledge of:
- Engineering specifications and capabilities
- Technology limitations and possibilities
- Scientific principles and facts
"#;

const HISTORICAL_PERSONA: &str = r#"
You are a historical expert specializing in historical facts and past events.

You have deep knowledge of:
- Historical dates and events
- Past achievements and failures
- Historical context and significance
"#;

const GENERAL_PERSONA: &str = r#"
You are a general knowledge expert analyzing claims for misinformation.

Use your broad knowledge and critical thinking skills.
"#;

/// Answer protocol shared by all experts.
const ANSWER_PROTOCOL: &str = r#"
Determine if the claim is LEGITIMATE or BS. Answer UNCERTAIN only if you genuinely cannot decide.

Respond with a single JSON object and nothing else:
{"verdict": "LEGITIMATE" | "BS" | "UNCERTAIN", "confidence": <integer 0-100>, "reasoning": "<your explanation>"}
"#;

/// Extra protocol for the current-events expert, which may search once.
const SEARCH_PROTOCOL: &str = r#"
If you lack sufficient information to make a confident assessment, request a web search instead of guessing.
To search, respond with only:
{"tool": "search", "query": "<specific search query>"}

When searching for time-sensitive information, put explicit dates in the query instead of words like "yesterday" or "today".
You may search at most once. After you receive the search results you must give your final assessment.
"#;

/// User turn sent after a search, carrying the evidence block.
pub const EVIDENCE_FOLLOW_UP: &str =
    "Using the search results above, give your final assessment as a JSON object. \
     Do not request another search.";

/// Display name of the expert for a category.
pub fn expert_name(category: Category) -> &'static str {
    match category {
        Category::Technical => "Technical Expert",
        Category::Historical => "Historical Expert",
        Category::CurrentEvent => "Current Events Expert",
        Category::General => "General Expert",
    }
}

/// System prompt for a category expert.
///
/// `today` is embedded in the current-events prompt so the model can turn
/// relative dates into absolute ones.
pub fn expert_system_prompt(category: Category, today: NaiveDate) -> String {
    match category {
        Category::Technical => format!("{}{}", TECHNICAL_PERSONA, ANSWER_PROTOCOL),
        Category::Historical => format!("{}{}", HISTORICAL_PERSONA, ANSWER_PROTOCOL),
        Category::General => format!("{}{}", GENERAL_PERSONA, ANSWER_PROTOCOL),
        Category::CurrentEvent => format!(
            "\nYou are a current events expert analyzing claims for misinformation.\n\n\
             IMPORTANT: Today's date is {}. When claims mention \"yesterday\", \"today\", \
             \"this week\", etc., interpret them relative to this date.\n{}{}",
            today.format("%B %d, %Y"),
            ANSWER_PROTOCOL,
            SEARCH_PROTOCOL
        ),
    }
}

/// User turn for the router.
pub fn router_user_prompt(claim: &str) -> String {
    format!("Route this claim: \"{}\"", truncate_claim(claim))
}

/// First user turn for an expert.
pub fn expert_user_prompt(category: Category, claim: &str, memory_context: Option<&str>) -> String {
    let lead = match category {
        Category::Technical => "Analyze this technical claim",
        Category::Historical => "Analyze this historical claim",
        Category::CurrentEvent => "Analyze this current event claim",
        Category::General => "Analyze this claim",
    };

    let mut prompt = format!("{}: \"{}\"", lead, truncate_claim(claim));
    if let Some(context) = memory_context.filter(|c| !c.trim().is_empty()) {
        prompt.push_str("\n\n");
        prompt.push_str(context);
    }
    prompt
}

/// Cut a claim to [`MAX_CLAIM_CHARS`] characters plus "...".
pub fn truncate_claim(claim: &str) -> Cow<'_, str> {
    match claim.char_indices().nth(MAX_CLAIM_CHARS) {
        Some((cut, _)) => Cow::Owned(format!("{}...", &claim[..cut])),
        None => Cow::Borrowed(claim),
    }
}
