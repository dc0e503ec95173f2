//! Defensive JSON extraction from untrusted model output.
//!
//! Each layer is tried in turn and the first one that yields a JSON value
//! wins:
//!
//! 1. strict parse of the trimmed text
//! 2. strict parse after stripping Markdown code fences
//! 3. strict parse of the first balanced `{...}` object
//! 4. smart quotes replaced over the whole text, then the first balanced
//!    object again with trailing commas dropped

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::error::{Error, Result};

static CODE_FENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)```(?:json)?").unwrap());

/// Extract a JSON value from raw text.
pub fn extract_json(raw: &str) -> Result<Value> {
    let text = raw.trim();
    if text.is_empty() {
        return Err(Error::Parse("empty response".to_string()));
    }

    if let Ok(value) = parse_strict(text) {
        return Ok(value);
    }

    let unfenced = strip_code_fences(text);
    if let Ok(value) = parse_strict(&unfenced) {
        return Ok(value);
    }

    if let Some(candidate) = first_balanced_object(&unfenced) {
        if let Ok(value) = parse_strict(candidate) {
            return Ok(value);
        }
    }

    // Smart quotes hide string boundaries from the brace scan.
    let requoted = replace_smart_quotes(&unfenced);
    let candidate = first_balanced_object(&requoted)
        .ok_or_else(|| Error::Parse("no JSON object found".to_string()))?;
    parse_strict(&remove_trailing_commas(candidate))
}

/// Extract a JSON object; any other value kind is a parse error.
pub fn extract_object(raw: &str) -> Result<serde_json::Map<String, Value>> {
    match extract_json(raw)? {
        Value::Object(map) => Ok(map),
        other => Err(Error::Parse(format!(
            "expected a JSON object, got {}",
            kind_name(&other)
        ))),
    }
}

/// Strict `serde_json` parse.
pub fn parse_strict(text: &str) -> Result<Value> {
    Ok(serde_json::from_str(text.trim())?)
}

/// Remove Markdown code fences (```` ``` ```` and ```` ```json ````).
pub fn strip_code_fences(text: &str) -> String {
    CODE_FENCE.replace_all(text, "").trim().to_string()
}

/// Locate the first balanced JSON object, ignoring braces inside strings.
pub fn first_balanced_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, c) in text[start..].char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    let end = start + offset + c.len_utf8();
                    return Some(&text[start..end]);
                }
            }
            _ => {}
        }
    }
    None
}

pub fn replace_smart_quotes(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '\u{201C}' | '\u{201D}' | '\u{201E}' => '"',
            '\u{2018}' | '\u{2019}' => '\'',
            other => other,
        })
        .collect()
}

/// Drop commas directly before `}` or `]`, leaving string contents alone.
pub fn remove_trailing_commas(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut in_string = false;
    let mut escaped = false;

    for (i, &c) in chars.iter().enumerate() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            out.push(c);
            continue;
        }

        if c == '"' {
            in_string = true;
        } else if c == ',' {
            let next = chars[i + 1..].iter().find(|c| !c.is_whitespace());
            if matches!(next, Some('}') | Some(']')) {
                continue;
            }
        }
        out.push(c);
    }
    out
}

fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
