//! Variable resolution
//!
//! Substitutes `${name}` placeholders through request templates using a
//! binding set. Strings are substituted in place; mappings are resolved
//! value-wise (keys untouched); sequences element-wise in order; all other
//! scalars pass through unchanged. An unbound name is fatal to the
//! enclosing case, so resolution fails instead of leaving the reference in
//! place.
//!
//! Substituted text is not re-scanned: a binding value that itself contains
//! literal `${...}` text stays literal, which makes resolution idempotent
//! over its own output.

mod parser;

pub use parser::{PlaceholderRef, parse_placeholders};

use serde_json::Value;
use thiserror::Error;
use verity_domain::Bindings;

/// Errors produced during variable resolution.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// A template references a name absent from the bindings.
    #[error("unbound variable: {name}")]
    UnboundVariable {
        /// The unresolved variable name.
        name: String,
    },
}

/// Resolves all `${name}` placeholders in a single string.
///
/// Each placeholder is replaced by the string form of the bound value:
/// string bindings are inserted verbatim, any other JSON value uses its
/// JSON text form.
///
/// # Errors
///
/// Returns [`ResolveError::UnboundVariable`] for the first name absent
/// from the bindings.
pub fn resolve_str(input: &str, bindings: &Bindings) -> Result<String, ResolveError> {
    let references = parse_placeholders(input);
    if references.is_empty() {
        return Ok(input.to_string());
    }

    let mut resolved = String::with_capacity(input.len());
    let mut last_end = 0;

    for reference in &references {
        resolved.push_str(&input[last_end..reference.span.start]);

        let value = bindings
            .get(&reference.name)
            .ok_or_else(|| ResolveError::UnboundVariable {
                name: reference.name.clone(),
            })?;
        resolved.push_str(&binding_text(value));

        last_end = reference.span.end;
    }

    resolved.push_str(&input[last_end..]);
    Ok(resolved)
}

/// Resolves placeholders recursively through an arbitrary JSON-like
/// template.
///
/// # Errors
///
/// Returns [`ResolveError::UnboundVariable`] for the first unbound name
/// anywhere in the template.
pub fn resolve_template(template: &Value, bindings: &Bindings) -> Result<Value, ResolveError> {
    match template {
        Value::String(text) => Ok(Value::String(resolve_str(text, bindings)?)),
        Value::Object(entries) => {
            let mut resolved = serde_json::Map::with_capacity(entries.len());
            for (key, value) in entries {
                resolved.insert(key.clone(), resolve_template(value, bindings)?);
            }
            Ok(Value::Object(resolved))
        }
        Value::Array(items) => {
            let mut resolved = Vec::with_capacity(items.len());
            for item in items {
                resolved.push(resolve_template(item, bindings)?);
            }
            Ok(Value::Array(resolved))
        }
        Value::Null | Value::Bool(_) | Value::Number(_) => Ok(template.clone()),
    }
}

/// Returns the substitution text for a bound value.
fn binding_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
