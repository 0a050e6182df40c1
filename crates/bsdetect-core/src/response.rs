//! Decoding of raw LLM replies into typed router and expert output.
//!
//! The JSON form is preferred: the payload is extracted (markdown fences are
//! tolerated), validated against the matching schema, then deserialized.
//! Expert replies may also use the labelled text form
//! (`VERDICT:` / `CONFIDENCE:` / `REASONING:`), which is accepted only when
//! every field parses.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::patterns::{
    CONFIDENCE_LINE, JSON_FENCE, REASONING_MARKER, SEARCH_LINE, VERDICT_LINE,
};
use crate::schema::{validate, ReplySchema, SchemaError};
use crate::types::{Category, ConfidenceLevel, Verdict};

/// Router classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouterDecision {
    pub claim_type: Category,
    #[serde(default)]
    pub confidence_level: Option<ConfidenceLevel>,
}

/// Verdict as the expert model may state it.
///
/// `Uncertain` is a valid answer but is treated as a low-confidence signal,
/// never as a verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssessedVerdict {
    #[serde(rename = "BS")]
    Bs,
    #[serde(rename = "LEGITIMATE")]
    Legitimate,
    #[serde(rename = "UNCERTAIN")]
    Uncertain,
}

impl AssessedVerdict {
    /// The binary verdict, if the model committed to one.
    pub fn into_verdict(self) -> Option<Verdict> {
        match self {
            AssessedVerdict::Bs => Some(Verdict::Bs),
            AssessedVerdict::Legitimate => Some(Verdict::Legitimate),
            AssessedVerdict::Uncertain => None,
        }
    }

    fn parse_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_uppercase().as_str() {
            "BS" => Some(AssessedVerdict::Bs),
            "LEGITIMATE" => Some(AssessedVerdict::Legitimate),
            "UNCERTAIN" => Some(AssessedVerdict::Uncertain),
            _ => None,
        }
    }
}

/// Structured expert answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpertAssessment {
    pub verdict: AssessedVerdict,
    pub confidence: u8,
    pub reasoning: String,
}

/// What an expert reply asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExpertReply {
    /// Final assessment
    Direct(ExpertAssessment),
    /// The model wants one search round-trip first
    ToolRequest { query: String },
}

#[derive(Deserialize)]
struct ToolRequestPayload {
    query: String,
}

/// Pull the JSON object out of a reply.
///
/// Looks for a fenced block first, then parses the first complete JSON value
/// starting at the first `{`. Text after that value is ignored.
pub fn extract_json(raw: &str) -> Result<Value, SchemaError> {
    let candidate = match JSON_FENCE.captures(raw).and_then(|caps| caps.get(1)) {
        Some(m) => m.as_str(),
        None => {
            let start = raw.find('{').ok_or(SchemaError::NoPayload)?;
            &raw[start..]
        }
    };

    let mut values = serde_json::Deserializer::from_str(candidate).into_iter::<Value>();
    match values.next() {
        Some(Ok(value)) => Ok(value),
        Some(Err(e)) => Err(SchemaError::InvalidJson(e.to_string())),
        None => Err(SchemaError::NoPayload),
    }
}

/// Decode the router's reply.
///
/// Accepts the JSON form, or a reply consisting of a bare category name.
pub fn decode_router_decision(raw: &str) -> Result<RouterDecision, SchemaError> {
    match extract_json(raw) {
        Ok(value) => {
            validate(ReplySchema::RouterDecision, &value)?;
            serde_json::from_value(value).map_err(|e| SchemaError::InvalidJson(e.to_string()))
        }
        Err(SchemaError::NoPayload) => {
            let word = raw.trim().trim_matches(|c: char| c == '"' || c == '.' || c == '`');
            word.parse::<Category>()
                .map(|claim_type| RouterDecision {
                    claim_type,
                    confidence_level: None,
                })
                .map_err(|_| SchemaError::InvalidValue {
                    field: "claim_type",
                    value: word.to_string(),
                })
        }
        Err(e) => Err(e),
    }
}

/// Decode an expert's reply.
///
/// A JSON object carrying a `tool` key is a tool request; anything else must
/// be a complete assessment. When the JSON route fails and the reply has a
/// `VERDICT:` line, the labelled form is decoded instead.
pub fn decode_expert_reply(raw: &str) -> Result<ExpertReply, SchemaError> {
    match extract_json(raw).and_then(decode_expert_value) {
        Ok(reply) => Ok(reply),
        Err(SchemaError::NoPayload) => decode_labelled(raw),
        // Braces inside labelled reasoning are not a JSON payload
        Err(_) if VERDICT_LINE.is_match(raw) => decode_labelled(raw),
        Err(e) => Err(e),
    }
}

fn decode_expert_value(value: Value) -> Result<ExpertReply, SchemaError> {
    if value.get("tool").is_some() {
        validate(ReplySchema::ToolRequest, &value)?;
        let payload: ToolRequestPayload =
            serde_json::from_value(value).map_err(|e| SchemaError::InvalidJson(e.to_string()))?;
        return Ok(ExpertReply::ToolRequest {
            query: payload.query.trim().to_string(),
        });
    }

    validate(ReplySchema::ExpertAssessment, &value)?;
    let assessment: ExpertAssessment =
        serde_json::from_value(value).map_err(|e| SchemaError::InvalidJson(e.to_string()))?;
    Ok(ExpertReply::Direct(assessment))
}

/// Strict labelled-text form. All three fields are required.
fn decode_labelled(raw: &str) -> Result<ExpertReply, SchemaError> {
    if VERDICT_LINE.find(raw).is_none() {
        if let Some(caps) = SEARCH_LINE.captures(raw) {
            let query = caps[1].trim().to_string();
            if !query.is_empty() {
                return Ok(ExpertReply::ToolRequest { query });
            }
        }
    }

    let verdict_label = VERDICT_LINE
        .captures(raw)
        .map(|caps| caps[1].to_string())
        .ok_or(SchemaError::MissingField("verdict"))?;
    let verdict =
        AssessedVerdict::parse_label(&verdict_label).ok_or_else(|| SchemaError::InvalidValue {
            field: "verdict",
            value: verdict_label.clone(),
        })?;

    let confidence_text = CONFIDENCE_LINE
        .captures(raw)
        .map(|caps| caps[1].to_string())
        .ok_or(SchemaError::MissingField("confidence"))?;
    let confidence = confidence_text
        .parse::<i64>()
        .ok()
        .filter(|c| (0..=100).contains(c))
        .ok_or_else(|| SchemaError::InvalidValue {
            field: "confidence",
            value: confidence_text.clone(),
        })? as u8;

    let marker = REASONING_MARKER
        .find(raw)
        .ok_or(SchemaError::MissingField("reasoning"))?;
    let reasoning = raw[marker.end()..].trim().to_string();
    if reasoning.is_empty() {
        return Err(SchemaError::MissingField("reasoning"));
    }

    Ok(ExpertReply::Direct(ExpertAssessment {
        verdict,
        confidence,
        reasoning,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_router_json_with_fence() {
        let raw = "```json\n{\"claim_type\": \"technical\", \"confidence_level\": \"high\"}\n```";
        let decision = decode_router_decision(raw).unwrap();
        assert_eq!(decision.claim_type, Category::Technical);
        assert_eq!(decision.confidence_level, Some(ConfidenceLevel::High));
    }

    #[test]
    fn test_router_bare_word() {
        let decision = decode_router_decision("current_event\n").unwrap();
        assert_eq!(decision.claim_type, Category::CurrentEvent);
        assert!(decision.confidence_level.is_none());
    }

    #[test]
    fn test_router_unknown_category_fails() {
        assert!(decode_router_decision("{\"claim_type\": \"sports\"}").is_err());
        assert!(matches!(
            decode_router_decision("no idea"),
            Err(SchemaError::InvalidValue { field: "claim_type", .. })
        ));
    }

    #[test]
    fn test_expert_json_assessment() {
        let raw = concat!(
            "Sure. ",
            r#"{"verdict": "LEGITIMATE", "confidence": 95, "reasoning": "It has four engines."}"#
        );
        let reply = decode_expert_reply(raw).unwrap();
        match reply {
            ExpertReply::Direct(a) => {
                assert_eq!(a.verdict, AssessedVerdict::Legitimate);
                assert_eq!(a.confidence, 95);
                assert_eq!(a.reasoning, "It has four engines.");
            }
            other => panic!("expected direct reply, got {:?}", other),
        }
    }

    #[test]
    fn test_expert_tool_request() {
        let raw = r#"{"tool": "search", "query": "bitcoin price October 17, 2026"}"#;
        assert_eq!(
            decode_expert_reply(raw).unwrap(),
            ExpertReply::ToolRequest {
                query: "bitcoin price October 17, 2026".into()
            }
        );
    }

    #[test]
    fn test_expert_schema_violation() {
        let raw = r#"{"verdict": "BS", "confidence": 101, "reasoning": "x"}"#;
        assert!(matches!(
            decode_expert_reply(raw),
            Err(SchemaError::Violation { .. })
        ));
    }

    #[test]
    fn test_expert_invalid_json() {
        assert!(decode_expert_reply("{verdict: BS").is_err());
        assert!(matches!(
            decode_expert_reply("{verdict: BS}"),
            Err(SchemaError::InvalidJson(_))
        ));
    }

    #[test]
    fn test_labelled_reply() {
        let raw =
            "VERDICT: [BS]\nCONFIDENCE: 90%\nREASONING: Perpetual motion violates\nthermodynamics.";
        let reply = decode_expert_reply(raw).unwrap();
        assert_eq!(
            reply,
            ExpertReply::Direct(ExpertAssessment {
                verdict: AssessedVerdict::Bs,
                confidence: 90,
                reasoning: "Perpetual motion violates\nthermodynamics.".into(),
            })
        );
    }

    #[test]
    fn test_labelled_reply_is_strict() {
        let missing_confidence = "VERDICT: BS\nREASONING: nope";
        assert_eq!(
            decode_expert_reply(missing_confidence),
            Err(SchemaError::MissingField("confidence"))
        );

        let bad_verdict = "VERDICT: MAYBE\nCONFIDENCE: 50\nREASONING: hmm";
        assert!(matches!(
            decode_expert_reply(bad_verdict),
            Err(SchemaError::InvalidValue { field: "verdict", .. })
        ));

        assert_eq!(
            decode_expert_reply("I think it is probably fine."),
            Err(SchemaError::MissingField("verdict"))
        );
    }

    #[test]
    fn test_labelled_reply_with_braces() {
        let raw = "VERDICT: BS\nCONFIDENCE: 90\nREASONING: The set {a, b} has no third member.";
        assert_eq!(
            decode_expert_reply(raw).unwrap(),
            ExpertReply::Direct(ExpertAssessment {
                verdict: AssessedVerdict::Bs,
                confidence: 90,
                reasoning: "The set {a, b} has no third member.".into(),
            })
        );

        let empty_object = "VERDICT: LEGITIMATE\nCONFIDENCE: 80\nREASONING: {} is a valid map.";
        assert!(matches!(
            decode_expert_reply(empty_object),
            Ok(ExpertReply::Direct(ExpertAssessment { confidence: 80, .. }))
        ));
    }

    #[test]
    fn test_json_with_trailing_note() {
        let raw = concat!(
            r#"{"verdict": "LEGITIMATE", "confidence": 95, "reasoning": "Four engines."}"#,
            " (source: {Boeing})"
        );
        match decode_expert_reply(raw).unwrap() {
            ExpertReply::Direct(a) => {
                assert_eq!(a.verdict, AssessedVerdict::Legitimate);
                assert_eq!(a.reasoning, "Four engines.");
            }
            other => panic!("expected direct reply, got {:?}", other),
        }

        let router = r#"{"claim_type": "historical"} because of {dates}"#;
        assert_eq!(
            decode_router_decision(router).unwrap().claim_type,
            Category::Historical
        );
    }

    #[test]
    fn test_labelled_search_line() {
        assert_eq!(
            decode_expert_reply("SEARCH: bitcoin price yesterday").unwrap(),
            ExpertReply::ToolRequest {
                query: "bitcoin price yesterday".into()
            }
        );
    }

    #[test]
    fn test_uncertain_has_no_verdict() {
        assert_eq!(AssessedVerdict::Uncertain.into_verdict(), None);
        assert_eq!(AssessedVerdict::Bs.into_verdict(), Some(Verdict::Bs));
    }
}
