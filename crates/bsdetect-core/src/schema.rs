//! JSON Schema validation for structured LLM replies.
//!
//! Replies are validated against the schemas in `schemas/` before they are
//! deserialized, so a malformed reply becomes an explicit [`SchemaError`]
//! instead of a silently defaulted value.

use std::sync::OnceLock;
use thiserror::Error;

const ROUTER_DECISION_SCHEMA_JSON: &str = include_str!("../schemas/router_decision.schema.json");
const EXPERT_ASSESSMENT_SCHEMA_JSON: &str =
    include_str!("../schemas/expert_assessment.schema.json");
const TOOL_REQUEST_SCHEMA_JSON: &str = include_str!("../schemas/tool_request.schema.json");

static ROUTER_DECISION: OnceLock<Result<jsonschema::Validator, String>> = OnceLock::new();
static EXPERT_ASSESSMENT: OnceLock<Result<jsonschema::Validator, String>> = OnceLock::new();
static TOOL_REQUEST: OnceLock<Result<jsonschema::Validator, String>> = OnceLock::new();

/// Errors from decoding a structured reply.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchemaError {
    #[error("Failed to load schema: {0}")]
    LoadError(String),

    #[error("Reply contains no structured payload")]
    NoPayload,

    #[error("Reply is not valid JSON: {0}")]
    InvalidJson(String),

    #[error("Reply violates {schema} schema: {}", .errors.join("; "))]
    Violation {
        schema: &'static str,
        errors: Vec<String>,
    },

    #[error("Missing field: {0}")]
    MissingField(&'static str),

    #[error("Invalid value for {field}: '{value}'")]
    InvalidValue { field: &'static str, value: String },

    #[error("Unexpected tool request: {0}")]
    UnexpectedToolRequest(String),
}

/// Schemas known to the decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplySchema {
    RouterDecision,
    ExpertAssessment,
    ToolRequest,
}

impl ReplySchema {
    pub fn name(&self) -> &'static str {
        match self {
            ReplySchema::RouterDecision => "router decision",
            ReplySchema::ExpertAssessment => "expert assessment",
            ReplySchema::ToolRequest => "tool request",
        }
    }

    /// Raw schema document, for embedding into prompts.
    pub fn document(&self) -> &'static str {
        match self {
            ReplySchema::RouterDecision => ROUTER_DECISION_SCHEMA_JSON,
            ReplySchema::ExpertAssessment => EXPERT_ASSESSMENT_SCHEMA_JSON,
            ReplySchema::ToolRequest => TOOL_REQUEST_SCHEMA_JSON,
        }
    }

    fn cell(&self) -> &'static OnceLock<Result<jsonschema::Validator, String>> {
        match self {
            ReplySchema::RouterDecision => &ROUTER_DECISION,
            ReplySchema::ExpertAssessment => &EXPERT_ASSESSMENT,
            ReplySchema::ToolRequest => &TOOL_REQUEST,
        }
    }

    fn validator(&self) -> Result<&'static jsonschema::Validator, SchemaError> {
        let document = self.document();
        let result = self.cell().get_or_init(|| {
            let schema_value: serde_json::Value = match serde_json::from_str(document) {
                Ok(v) => v,
                Err(e) => return Err(format!("Invalid schema JSON: {}", e)),
            };

            match jsonschema::options().build(&schema_value) {
                Ok(v) => Ok(v),
                Err(e) => Err(format!("Failed to compile schema: {}", e)),
            }
        });

        match result {
            Ok(v) => Ok(v),
            Err(e) => Err(SchemaError::LoadError(e.clone())),
        }
    }
}

/// Validate a JSON value against one of the reply schemas.
pub fn validate(schema: ReplySchema, value: &serde_json::Value) -> Result<(), SchemaError> {
    let validator = schema.validator()?;

    let errors: Vec<String> = validator
        .iter_errors(value)
        .map(|e| format!("{} at {}", e, e.instance_path))
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(SchemaError::Violation {
            schema: schema.name(),
            errors,
        })
    }
}
