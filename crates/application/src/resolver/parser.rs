//! Placeholder parser for `${name}` syntax
//!
//! Parses strings to extract placeholder references with their positions.

use std::ops::Range;

/// A parsed `${name}` reference in a string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceholderRef {
    /// The variable name (without `${` `}`).
    pub name: String,

    /// Byte range in the original string where this reference appears.
    pub span: Range<usize>,
}

/// Parses a string and extracts all `${name}` placeholder references.
///
/// `${}` with an empty name and an unterminated `${` are treated as literal
/// text, not references.
///
/// # Examples
///
/// ```
/// use verity_application::resolver::parse_placeholders;
///
/// let refs = parse_placeholders("http://x/${id}/items?q=${query}");
/// assert_eq!(refs.len(), 2);
/// assert_eq!(refs[0].name, "id");
/// assert_eq!(refs[1].name, "query");
/// ```
#[must_use]
pub fn parse_placeholders(input: &str) -> Vec<PlaceholderRef> {
    let mut references = Vec::new();
    let bytes = input.as_bytes();
    let mut i = 0;

    while i + 1 < bytes.len() {
        if bytes[i] == b'$' && bytes[i + 1] == b'{' {
            match input[i + 2..].find('}') {
                Some(offset) => {
                    let name = &input[i + 2..i + 2 + offset];
                    let end = i + 2 + offset + 1;
                    if name.is_empty() {
                        i += 2;
                    } else {
                        references.push(PlaceholderRef {
                            name: name.to_string(),
                            span: i..end,
                        });
                        i = end;
                    }
                }
                // Unterminated placeholder; nothing further can match.
                None => break,
            }
        } else {
            i += 1;
        }
    }

    references
}
