//! # Header Normalizer
//!
//! Turns raw post text into complete [`Metadata`] plus body, and back.
//!
//! ## Header Block
//!
//! ```text
//! ---                 <-- first line, only "---" (BOM and trailing spaces tolerated)
//! title: Hello
//! tags: [rust]
//! ---                 <-- next line that is only "---"
//!
//! Body text...        <-- leading blank lines dropped
//! ```
//!
//! If the opening line is not a delimiter, or no closing delimiter follows, the
//! input has no header: metadata starts empty and the body is the input
//! verbatim.
//!
//! ## Recovery
//!
//! A header that fails to parse as YAML, or parses to something other than a
//! mapping, never aborts intake. The result is [`Normalized::Fallback`] carrying
//! empty-plus-defaults metadata, the text after the block as body, and a
//! diagnostic string for the caller to show.
//!
//! ## Serialization
//!
//! [`serialize`] writes `---\n<yaml>---\n\n<body>` with keys sorted, so the same
//! metadata always produces the same bytes.

use crate::clock::Clock;
use crate::error::Result;
use crate::model::{FieldDefaults, Metadata, MetadataBuilder};
use serde_yaml::Value;
use std::path::Path;

const DELIMITER: &str = "---";
const UNTITLED: &str = "Untitled";

/// Result of normalizing one document.
#[derive(Debug, Clone, PartialEq)]
pub enum Normalized {
    /// Header absent or parsed cleanly.
    Parsed { metadata: Metadata, body: String },
    /// Header present but unusable; defaults were applied.
    Fallback {
        metadata: Metadata,
        body: String,
        diagnostic: String,
    },
}

impl Normalized {
    pub fn metadata(&self) -> &Metadata {
        match self {
            Normalized::Parsed { metadata, .. } | Normalized::Fallback { metadata, .. } => {
                metadata
            }
        }
    }

    pub fn body(&self) -> &str {
        match self {
            Normalized::Parsed { body, .. } | Normalized::Fallback { body, .. } => body,
        }
    }

    pub fn diagnostic(&self) -> Option<&str> {
        match self {
            Normalized::Parsed { .. } => None,
            Normalized::Fallback { diagnostic, .. } => Some(diagnostic),
        }
    }

    pub fn into_parts(self) -> (Metadata, String, Option<String>) {
        match self {
            Normalized::Parsed { metadata, body } => (metadata, body, None),
            Normalized::Fallback {
                metadata,
                body,
                diagnostic,
            } => (metadata, body, Some(diagnostic)),
        }
    }
}

/// Splits `raw` into `(header_yaml, body)` when it opens with a closed header block.
pub fn split_header(raw: &str) -> Option<(&str, &str)> {
    let text = raw.strip_prefix('\u{feff}').unwrap_or(raw);
    let mut lines = text.split_inclusive('\n');

    let first = lines.next()?;
    if first.trim_end() != DELIMITER {
        return None;
    }

    let header_start = first.len();
    let mut offset = header_start;
    for line in lines {
        if line.trim_end() == DELIMITER {
            let header = &text[header_start..offset];
            let body = &text[offset + line.len()..];
            return Some((header, strip_leading_blank_lines(body)));
        }
        offset += line.len();
    }
    None
}

fn strip_leading_blank_lines(body: &str) -> &str {
    let mut rest = body;
    while let Some(idx) = rest.find('\n') {
        if !rest[..idx].trim().is_empty() {
            break;
        }
        rest = &rest[idx + 1..];
    }
    rest
}

fn parse_header(header: &str) -> std::result::Result<serde_yaml::Mapping, String> {
    match serde_yaml::from_str::<Value>(header) {
        Ok(Value::Mapping(mapping)) => Ok(mapping),
        Ok(Value::Null) => Ok(serde_yaml::Mapping::new()),
        Ok(_) => Err("header is not a key-value mapping".to_string()),
        Err(e) => Err(format!("invalid YAML header: {}", e)),
    }
}

/// Parses and repairs a document's header. Never fails.
pub fn normalize(raw: &str, source_name: &str, clock: &dyn Clock) -> Normalized {
    let defaults = FieldDefaults {
        title: default_title(source_name),
        date: clock.header_timestamp(),
    };

    let Some((header, body)) = split_header(raw) else {
        return Normalized::Parsed {
            metadata: MetadataBuilder::new().build(defaults),
            body: raw.to_string(),
        };
    };

    match parse_header(header) {
        Ok(mapping) => {
            let builder = MetadataBuilder::from_mapping(mapping);
            let missing = builder.missing_required();
            if !missing.is_empty() {
                tracing::debug!(source = source_name, ?missing, "filling header defaults");
            }
            Normalized::Parsed {
                metadata: builder.build(defaults),
                body: body.to_string(),
            }
        }
        Err(diagnostic) => {
            tracing::warn!(source = source_name, %diagnostic, "header dropped, using defaults");
            Normalized::Fallback {
                metadata: MetadataBuilder::new().build(defaults),
                body: body.to_string(),
                diagnostic,
            }
        }
    }
}

/// Title derived from a file name: `my_first-post.md` → `My First Post`.
pub fn default_title(source_name: &str) -> String {
    let stem = Path::new(source_name)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    let spaced = stem.replace(['-', '_'], " ");
    let mut title = String::with_capacity(spaced.len());
    let mut prev_alnum = false;
    for c in spaced.chars() {
        if prev_alnum {
            title.extend(c.to_lowercase());
        } else {
            title.extend(c.to_uppercase());
        }
        prev_alnum = c.is_alphanumeric();
    }

    let title = title.trim();
    if title.is_empty() {
        UNTITLED.to_string()
    } else {
        title.to_string()
    }
}

/// Renders the wire format: header block, one blank line, body.
pub fn serialize(metadata: &Metadata, body: &str) -> Result<String> {
    let yaml = serde_yaml::to_string(&metadata.to_yaml_map())?;
    Ok(format!("{DELIMITER}\n{yaml}{DELIMITER}\n\n{body}"))
}
