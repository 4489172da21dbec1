//! Field sanitizer: the first step applied to every exported row.
//!
//! Drops private and empty fields, trims strings, decodes the numeric HTML
//! character references the export tool leaves in text columns, and filters
//! out malformed email addresses. Pure: problems are returned as warnings
//! for the caller to log.

use serde_json::Value;

use crate::record::{CleanRecord, RawRecord};

/// Fields whose name starts with this prefix are never sent to the CMS.
pub const PRIVATE_FIELD_PREFIX: &str = "_";

/// Options controlling [`sanitize`].
#[derive(Debug, Clone)]
pub struct SanitizeOptions {
    pub private_prefix: String,
    /// Fields validated as email addresses.
    pub email_fields: Vec<String>,
}

impl Default for SanitizeOptions {
    fn default() -> Self {
        Self {
            private_prefix: PRIVATE_FIELD_PREFIX.to_string(),
            email_fields: vec!["email_general".to_string()],
        }
    }
}

/// A non-fatal problem found while sanitizing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SanitizeWarning {
    InvalidEmail { field: String, value: String },
}

impl std::fmt::Display for SanitizeWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidEmail { field, value } => {
                write!(f, "invalid email '{}' in field '{}' was omitted", value, field)
            }
        }
    }
}

/// Result of sanitizing one record.
#[derive(Debug, Clone)]
pub struct Sanitized {
    pub record: CleanRecord,
    pub warnings: Vec<SanitizeWarning>,
}

/// Normalize a raw record into a [`CleanRecord`].
pub fn sanitize(raw: &RawRecord, options: &SanitizeOptions) -> Sanitized {
    let mut record = CleanRecord {
        source_id: raw.source_id.clone(),
        ..Default::default()
    };
    let mut warnings = Vec::new();

    for (key, value) in &raw.fields {
        if key.starts_with(options.private_prefix.as_str()) {
            continue;
        }
        match value {
            Value::Null => {}
            Value::String(s) => {
                let decoded = decode_html_entities(s);
                let trimmed = decoded.trim();
                if trimmed.is_empty() {
                    continue;
                }
                if options.email_fields.iter().any(|f| f == key) && !is_valid_email(trimmed) {
                    warnings.push(SanitizeWarning::InvalidEmail {
                        field: key.clone(),
                        value: trimmed.to_string(),
                    });
                    continue;
                }
                record.insert(key.clone(), trimmed.to_string());
            }
            other => record.insert(key.clone(), other.clone()),
        }
    }

    Sanitized { record, warnings }
}

/// Replace numeric character references (`&#233;`, `&#xE9;`) with the
/// characters they name. Anything that is not a valid reference to a
/// Unicode scalar value is kept verbatim.
pub fn decode_html_entities(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(pos) = rest.find("&#") {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos + 2..];
        match parse_char_ref(tail) {
            Some((ch, consumed)) => {
                out.push(ch);
                rest = &tail[consumed..];
            }
            None => {
                out.push_str("&#");
                rest = tail;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Parse the part of a reference after `&#`. Returns the character and the
/// number of bytes consumed, including the closing `;`.
fn parse_char_ref(tail: &str) -> Option<(char, usize)> {
    let (digits, radix, prefix_len) = match tail.strip_prefix('x') {
        Some(hex) => (hex, 16, 1),
        None => (tail, 10, 0),
    };
    let len = digits
        .find(|c: char| !c.is_digit(radix))
        .unwrap_or(digits.len());
    if len == 0 || !digits[len..].starts_with(';') {
        return None;
    }
    let code = u32::from_str_radix(&digits[..len], radix).ok()?;
    let ch = char::from_u32(code)?;
    Some((ch, prefix_len + len + 1))
}

/// Loose email check: `local@domain.tld` with no whitespace and a single `@`.
pub fn is_valid_email(value: &str) -> bool {
    if value.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    domain
        .char_indices()
        .any(|(i, c)| c == '.' && i > 0 && i + 1 < domain.len())
}

#[cfg(test)]
#[path = "tests/sanitize_tests.rs"]
mod tests;
