// leafweave-core/src/template.rs
// `{{ path }}` / `{{ path | json }}` templates for single-node fragments.
//
// Everything outside a slot is literal script text, so JS braces need no
// escaping. A slot whose path the resolver cannot answer fails with
// `TemplateError::Undefined`, which the tree walk treats as recoverable.

use serde_json::Value;

use crate::error::TemplateError;

#[derive(Clone, Debug)]
struct ParsedTemplate {
    parts: Vec<TemplatePart>,
}

#[derive(Clone, Debug)]
enum TemplatePart {
    Text(String),
    Slot {
        path: Vec<String>,
        format: Option<SlotFormat>,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum SlotFormat {
    /// JSON-encode the value even when it is plain text.
    Json,
}

/// A resolved slot. Text is spliced verbatim; JSON is serialized compactly.
#[derive(Clone, Debug, PartialEq)]
pub enum SlotValue {
    Text(String),
    Json(Value),
}

pub trait SlotResolver {
    fn resolve(&self, path: &[String]) -> Result<SlotValue, TemplateError>;
}

pub fn render_template(body: &str, resolver: &dyn SlotResolver) -> Result<String, TemplateError> {
    let parsed = parse_template(body)?;

    let mut out = String::with_capacity(body.len());
    for part in parsed.parts {
        match part {
            TemplatePart::Text(text) => out.push_str(&text),
            TemplatePart::Slot { path, format } => {
                let value = resolver.resolve(&path)?;
                out.push_str(&render_value(value, format)?);
            }
        }
    }
    Ok(out)
}

/// Root names referenced by a template, in first-use order.
pub fn slot_roots(body: &str) -> Result<Vec<String>, TemplateError> {
    let parsed = parse_template(body)?;
    let mut roots: Vec<String> = Vec::new();
    for part in parsed.parts {
        if let TemplatePart::Slot { path, .. } = part {
            if let Some(root) = path.first() {
                if !roots.contains(root) {
                    roots.push(root.clone());
                }
            }
        }
    }
    Ok(roots)
}

fn render_value(value: SlotValue, format: Option<SlotFormat>) -> Result<String, TemplateError> {
    match (value, format) {
        (SlotValue::Text(text), None) => Ok(text),
        (SlotValue::Text(text), Some(SlotFormat::Json)) => encode_json(&Value::String(text)),
        (SlotValue::Json(value), _) => encode_json(&value),
    }
}

fn encode_json(value: &Value) -> Result<String, TemplateError> {
    serde_json::to_string(value).map_err(|e| TemplateError::Syntax {
        message: e.to_string(),
    })
}

fn parse_template(body: &str) -> Result<ParsedTemplate, TemplateError> {
    let chars: Vec<char> = body.chars().collect();
    let mut parts = Vec::new();
    let mut buf = String::new();
    let mut idx = 0;

    while idx < chars.len() {
        let ch = chars[idx];
        if ch == '{' && idx + 1 < chars.len() && chars[idx + 1] == '{' {
            if !buf.is_empty() {
                parts.push(TemplatePart::Text(std::mem::take(&mut buf)));
            }
            idx += 2;
            let mut inner = String::new();
            loop {
                if idx + 1 >= chars.len() {
                    return Err(TemplateError::Syntax {
                        message: "unterminated slot".to_string(),
                    });
                }
                if chars[idx] == '}' && chars[idx + 1] == '}' {
                    break;
                }
                inner.push(chars[idx]);
                idx += 1;
            }
            idx += 2;
            let (path, format) = parse_placeholder(inner.trim())?;
            parts.push(TemplatePart::Slot { path, format });
            continue;
        }
        buf.push(ch);
        idx += 1;
    }

    if !buf.is_empty() {
        parts.push(TemplatePart::Text(buf));
    }

    Ok(ParsedTemplate { parts })
}

fn parse_placeholder(text: &str) -> Result<(Vec<String>, Option<SlotFormat>), TemplateError> {
    if text.is_empty() {
        return Err(TemplateError::Syntax {
            message: "empty slot".to_string(),
        });
    }

    let mut iter = text.split('|');
    let key_part = iter.next().unwrap_or("").trim();
    let format_part = iter.next().map(str::trim);
    if iter.next().is_some() {
        return Err(TemplateError::Syntax {
            message: format!("only one filter allowed: {}", text),
        });
    }

    let path = parse_key_path(key_part)?;
    let format = match format_part {
        None => None,
        Some("json") | Some("tojson") => Some(SlotFormat::Json),
        Some(other) => {
            return Err(TemplateError::Syntax {
                message: format!("unknown filter: {}", other),
            })
        }
    };
    Ok((path, format))
}

fn parse_key_path(text: &str) -> Result<Vec<String>, TemplateError> {
    let mut parts = Vec::new();
    for segment in text.split('.') {
        let mut chars = segment.chars();
        let Some(first) = chars.next() else {
            return Err(TemplateError::Syntax {
                message: format!("empty path segment in '{}'", text),
            });
        };
        let valid = if first.is_ascii_digit() {
            segment.chars().all(|ch| ch.is_ascii_digit())
        } else {
            is_ident_start(first) && chars.all(is_ident_continue)
        };
        if !valid {
            return Err(TemplateError::Syntax {
                message: format!("invalid path segment: {}", segment),
            });
        }
        parts.push(segment.to_string());
    }
    Ok(parts)
}

fn is_ident_start(ch: char) -> bool {
    ch == '_' || ch.is_ascii_alphabetic()
}

fn is_ident_continue(ch: char) -> bool {
    ch == '_' || ch == '-' || ch.is_ascii_alphanumeric()
}
