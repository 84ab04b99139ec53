//! Input validation helpers. Each records into a shared
//! [`ValidationErrors`] instead of failing fast.

use serde::Deserialize;
use uuid::Uuid;

use super::error::ValidationErrors;
use crate::database::models::PinType;

/// Tags as submitted: a JSON array or a comma-separated string
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum TagsInput {
    List(Vec<String>),
    Csv(String),
}

impl TagsInput {
    pub fn normalize(&self) -> Vec<String> {
        match self {
            TagsInput::List(tags) => normalize_tags(tags),
            TagsInput::Csv(raw) => normalize_tags(raw.split(',')),
        }
    }
}

impl From<Vec<&str>> for TagsInput {
    fn from(tags: Vec<&str>) -> Self {
        TagsInput::List(tags.into_iter().map(String::from).collect())
    }
}

/// Lowercase and trim each tag, dropping blanks. Duplicates are kept.
pub fn normalize_tags<I, S>(tags: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    tags.into_iter()
        .map(|t| normalize_tag(t.as_ref()))
        .filter(|t| !t.is_empty())
        .collect()
}

pub fn normalize_tag(tag: &str) -> String {
    tag.trim().to_lowercase()
}

/// Tag filter from a query string; blank means no filter
pub fn tag_filter(tag: Option<&str>) -> Option<String> {
    tag.map(normalize_tag).filter(|t| !t.is_empty())
}

/// Trimmed value of a required field; records an error when absent or blank
pub fn required_text(errors: &mut ValidationErrors, field: &'static str, value: Option<&str>) -> Option<String> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Some(v.to_string()),
        _ => {
            errors.add(field, "is required");
            None
        }
    }
}

/// For partial updates: absent stays `None`, present must not be blank
pub fn non_blank_if_present(
    errors: &mut ValidationErrors,
    field: &'static str,
    value: Option<&str>,
) -> Option<String> {
    let value = value?.trim();
    if value.is_empty() {
        errors.add(field, "must not be empty");
        None
    } else {
        Some(value.to_string())
    }
}

pub fn optional_text(value: Option<&str>) -> Option<String> {
    value.map(|v| v.trim().to_string())
}

pub fn pin_type(errors: &mut ValidationErrors, field: &'static str, value: &str) -> Option<PinType> {
    match value.parse::<PinType>() {
        Ok(t) => Some(t),
        Err(_) => {
            let allowed: Vec<&str> = PinType::ALL.iter().map(PinType::as_str).collect();
            errors.add(field, format!("must be one of: {}", allowed.join(", ")));
            None
        }
    }
}

pub fn uuid(errors: &mut ValidationErrors, field: &'static str, value: &str) -> Option<Uuid> {
    match Uuid::parse_str(value.trim()) {
        Ok(id) => Some(id),
        Err(_) => {
            errors.add(field, format!("'{}' is not a valid id", value));
            None
        }
    }
}

/// Parse every id, reporting each malformed entry
pub fn uuid_list(errors: &mut ValidationErrors, field: &'static str, values: &[String]) -> Vec<Uuid> {
    values.iter().filter_map(|v| uuid(errors, field, v)).collect()
}

pub fn email(errors: &mut ValidationErrors, field: &'static str, value: Option<&str>) -> Option<String> {
    let email = required_text(errors, field, value)?;
    let valid = match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && !domain.is_empty() && !domain.contains('@'),
        None => false,
    };
    if valid {
        Some(email)
    } else {
        errors.add(field, "is not a valid email address");
        None
    }
}

pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Passwords are never trimmed
pub fn password(errors: &mut ValidationErrors, field: &'static str, value: Option<&str>) -> Option<String> {
    match value {
        Some(pw) if pw.chars().count() >= MIN_PASSWORD_LENGTH => Some(pw.to_string()),
        Some(_) => {
            errors.add(field, format!("must be at least {} characters", MIN_PASSWORD_LENGTH));
            None
        }
        None => {
            errors.add(field, "is required");
            None
        }
    }
}
