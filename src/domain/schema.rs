//! JSON Schema documents for the payloads the service returns.
//!
//! Raw JSON is checked against these before any typed decoding, so a bad
//! payload reports every broken constraint at once.

use crate::domain::model::TOP_STORIES_MAX;
use crate::utils::error::{ApiError, Result};
use jsonschema::{Draft, Validator};
use serde_json::{json, Value};

fn positive_id() -> Value {
    json!({ "type": "integer", "exclusiveMinimum": 0 })
}

fn optional_kids() -> Value {
    json!({ "type": ["array", "null"], "items": positive_id() })
}

pub fn story_schema() -> Value {
    json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "title": "Story",
        "type": "object",
        "required": ["id", "type", "by", "time", "title", "score", "descendants"],
        "properties": {
            "id": positive_id(),
            "type": { "const": "story" },
            "by": { "type": "string", "minLength": 1 },
            "time": { "type": "integer", "exclusiveMinimum": 0 },
            "title": { "type": "string", "minLength": 1 },
            "score": { "type": "integer", "minimum": 0 },
            "descendants": { "type": "integer", "minimum": 0 },
            "url": { "type": ["string", "null"] },
            "text": { "type": ["string", "null"] },
            "kids": optional_kids()
        }
    })
}

pub fn comment_schema() -> Value {
    json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "title": "Comment",
        "type": "object",
        "required": ["id", "type", "by", "time", "text", "parent"],
        "properties": {
            "id": positive_id(),
            "type": { "const": "comment" },
            "by": { "type": "string", "minLength": 1 },
            "time": { "type": "integer", "exclusiveMinimum": 0 },
            "text": { "type": "string", "minLength": 1 },
            "parent": positive_id(),
            "kids": optional_kids()
        }
    })
}

pub fn top_stories_schema() -> Value {
    json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "title": "TopStories",
        "type": "array",
        "minItems": 1,
        "maxItems": TOP_STORIES_MAX,
        "items": positive_id()
    })
}

/// Compiles a schema document for `entity`.
pub fn compile_schema(entity: &'static str, schema: &Value) -> Result<Validator> {
    jsonschema::options()
        .with_draft(Draft::Draft202012)
        .build(schema)
        .map_err(|err| ApiError::Schema {
            entity,
            violations: vec![format!("invalid schema: {err}")],
        })
}

/// Every error the instance raises against the schema, in evaluation order.
pub fn violations(validator: &Validator, instance: &Value) -> Vec<String> {
    validator
        .iter_errors(instance)
        .map(|err| err.to_string())
        .collect()
}

/// Validates `instance` and folds all errors into one [`ApiError::Schema`].
pub fn check_instance(entity: &'static str, schema: &Value, instance: &Value) -> Result<()> {
    let validator = compile_schema(entity, schema)?;
    let violations = violations(&validator, instance);
    if violations.is_empty() {
        Ok(())
    } else {
        tracing::debug!(entity, count = violations.len(), "schema validation failed");
        Err(ApiError::Schema { entity, violations })
    }
}
