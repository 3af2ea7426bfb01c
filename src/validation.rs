/// Input validation for API payloads
///
/// Every create/replace/patch payload is checked here before it reaches the
/// store, so the database only ever sees well-formed records.
use crate::error::{DeckError, Result};

/// Maximum length of a project or agent name
pub const MAX_NAME_LEN: usize = 200;

/// Validate a required text field (must contain non-whitespace characters)
///
/// # Returns
/// * the trimmed value if valid
/// * `Err` if the value is blank
pub fn require_text(value: &str, field_name: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DeckError::Validation(format!("{} is required", field_name)));
    }
    Ok(trimmed.to_string())
}

/// Validate a display name (required, bounded length)
pub fn validate_name(value: &str, field_name: &str) -> Result<String> {
    let name = require_text(value, field_name)?;
    if name.chars().count() > MAX_NAME_LEN {
        return Err(DeckError::Validation(format!(
            "{} cannot exceed {} characters",
            field_name, MAX_NAME_LEN
        )));
    }
    Ok(name)
}

/// Validate a percentage field (0 to 100 inclusive)
pub fn validate_percent(value: i32, field_name: &str) -> Result<()> {
    if !(0..=100).contains(&value) {
        return Err(DeckError::Validation(format!(
            "{} must be between 0 and 100: {}",
            field_name, value
        )));
    }
    Ok(())
}

/// Validate a floating point ratio expressed in percent (0.0 to 100.0)
pub fn validate_percent_f64(value: f64, field_name: &str) -> Result<()> {
    if !value.is_finite() || !(0.0..=100.0).contains(&value) {
        return Err(DeckError::Validation(format!(
            "{} must be between 0 and 100: {}",
            field_name, value
        )));
    }
    Ok(())
}

/// Validate that a numeric field is not negative
pub fn validate_non_negative(value: f64, field_name: &str) -> Result<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(DeckError::Validation(format!(
            "{} cannot be negative: {}",
            field_name, value
        )));
    }
    Ok(())
}

/// Validate a TCP port number
pub fn validate_port(port: i32) -> Result<()> {
    if !(1..=65535).contains(&port) {
        return Err(DeckError::Validation(format!(
            "port must be between 1 and 65535: {}",
            port
        )));
    }
    Ok(())
}

/// Validate an agent identifier
///
/// Agent ids are used as keys in the external directory, so they must be
/// non-empty and free of whitespace.
pub fn validate_agent_id(agent_id: &str) -> Result<String> {
    let id = require_text(agent_id, "agentId")?;
    if id.chars().any(char::is_whitespace) {
        return Err(DeckError::Validation(format!(
            "agentId cannot contain whitespace: {:?}",
            id
        )));
    }
    Ok(id)
}

/// Trim tags and drop the empty ones
pub fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    tags.into_iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect()
}
