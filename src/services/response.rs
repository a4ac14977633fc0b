use serde_json::Value;

use crate::models::{AiChapter, ParsedChapter};

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("response is not valid JSON: {0}")]
    MalformedJson(String),
    #[error("response has no \"capitulo\" object")]
    MissingChapter,
    #[error("response does not match the chapter schema: {0}")]
    InvalidSchema(String),
}

/// Removes Markdown fence debris and a leading `json` language tag.
pub fn strip_fences(raw: &str) -> &str {
    let body = raw.trim().trim_start_matches('`').trim_end_matches('`');

    let body = match body.get(..4) {
        Some(tag) if tag.eq_ignore_ascii_case("json") => &body[4..],
        _ => body,
    };

    body.trim()
}

/// Validates the model's answer against the chapter schema.
///
/// Fails closed: every key of the schema must be present with the right type.
pub fn parse_response(raw: &str) -> Result<ParsedChapter, ParseError> {
    let body = strip_fences(raw);

    let value: Value =
        serde_json::from_str(body).map_err(|e| ParseError::MalformedJson(e.to_string()))?;

    let chapter = value
        .as_object()
        .and_then(|root| root.get("capitulo"))
        .filter(|chapter| !chapter.is_null())
        .ok_or(ParseError::MissingChapter)?;

    // Serde also reads structs from positional arrays; only objects are accepted.
    let Some(fields) = chapter.as_object() else {
        return Err(ParseError::InvalidSchema("\"capitulo\" is not an object".to_string()));
    };
    if let Some(Value::Array(subtemas)) = fields.get("subtemas") {
        if subtemas.iter().any(|entry| !entry.is_object()) {
            return Err(ParseError::InvalidSchema(
                "every \"subtemas\" entry must be an object".to_string(),
            ));
        }
    }

    let chapter: AiChapter =
        serde_json::from_value(chapter.clone()).map_err(|e| ParseError::InvalidSchema(e.to_string()))?;

    Ok(chapter.into())
}
