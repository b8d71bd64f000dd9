//! # Domain Model: Posts, Metadata and Outcomes
//!
//! A post travels through postdrop as three shapes:
//!
//! ```text
//! raw file ──intake──▶ Draft ──choose name──▶ PublishItem ──reconcile──▶ Outcome
//! ```
//!
//! ## Metadata
//!
//! Every post carries a YAML header. Four keys are required and always present
//! once a [`Metadata`] exists:
//!
//! | Key | Type | Default when absent |
//! |-----|------|---------------------|
//! | `title` | string | title-cased file stem |
//! | `date` | string | now, `YYYY-MM-DD HH:MM:SS ±ZZZZ` |
//! | `categories` | list of strings | `[]` |
//! | `tags` | list of strings | `[]` |
//!
//! Any other key is kept verbatim as a passthrough value (`layout`, `author`,
//! `image`, ...).
//!
//! `Metadata` is immutable. It is constructed once through [`MetadataBuilder`],
//! which only fills a default when the key is absent, and operator edits go
//! through [`Metadata::edited`], which returns a new record.
//!
//! ## Type Coercion
//!
//! Hand-written headers are sloppy. The builder accepts:
//! - scalar `title`/`date` of any YAML type (numbers, booleans) as strings
//! - `categories`/`tags` as a sequence, or as a whitespace-separated string
//!   (`categories: news rust` is two categories, as Jekyll reads it)
//! - `null` for a list key as an empty list; `null` for `title`/`date` as absent

use serde::Serialize;
use serde_yaml::Value;
use std::collections::BTreeMap;

pub const KEY_TITLE: &str = "title";
pub const KEY_DATE: &str = "date";
pub const KEY_CATEGORIES: &str = "categories";
pub const KEY_TAGS: &str = "tags";

/// Normalized post metadata. Always complete.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metadata {
    title: String,
    date: String,
    categories: Vec<String>,
    tags: Vec<String>,
    #[serde(flatten)]
    extra: BTreeMap<String, Value>,
}

impl Metadata {
    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn date(&self) -> &str {
        &self.date
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// Passthrough keys, sorted by name.
    pub fn extra(&self) -> &BTreeMap<String, Value> {
        &self.extra
    }

    /// Returns a copy with the operator's edits applied.
    pub fn edited(&self, edit: &MetadataEdit) -> Metadata {
        Metadata {
            title: edit.title.clone().unwrap_or_else(|| self.title.clone()),
            date: edit.date.clone().unwrap_or_else(|| self.date.clone()),
            categories: edit
                .categories
                .clone()
                .unwrap_or_else(|| self.categories.clone()),
            tags: edit.tags.clone().unwrap_or_else(|| self.tags.clone()),
            extra: self.extra.clone(),
        }
    }

    /// All keys, required and passthrough, in sorted order.
    pub fn to_yaml_map(&self) -> BTreeMap<String, Value> {
        let mut map = self.extra.clone();
        map.insert(KEY_TITLE.to_string(), Value::String(self.title.clone()));
        map.insert(KEY_DATE.to_string(), Value::String(self.date.clone()));
        map.insert(KEY_CATEGORIES.to_string(), string_sequence(&self.categories));
        map.insert(KEY_TAGS.to_string(), string_sequence(&self.tags));
        map
    }
}

fn string_sequence(items: &[String]) -> Value {
    Value::Sequence(items.iter().cloned().map(Value::String).collect())
}

/// Computed values used when a required key is missing.
#[derive(Debug, Clone)]
pub struct FieldDefaults {
    pub title: String,
    pub date: String,
}

#[derive(Debug, Clone, Default)]
pub struct MetadataBuilder {
    title: Option<String>,
    date: Option<String>,
    categories: Option<Vec<String>>,
    tags: Option<Vec<String>>,
    extra: BTreeMap<String, Value>,
}

impl MetadataBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the builder from a parsed YAML header.
    pub fn from_mapping(mapping: serde_yaml::Mapping) -> Self {
        mapping
            .into_iter()
            .fold(Self::new(), |builder, (key, value)| match scalar_to_string(&key) {
                Some(key) => builder.field(key, value),
                None => builder,
            })
    }

    /// Sets a key from a raw YAML value, routing required keys through coercion.
    pub fn field(mut self, key: impl Into<String>, value: Value) -> Self {
        let key = key.into();
        match key.as_str() {
            KEY_TITLE => self.title = scalar_to_string(&value),
            KEY_DATE => self.date = scalar_to_string(&value),
            KEY_CATEGORIES => self.categories = Some(value_to_list(&value)),
            KEY_TAGS => self.tags = Some(value_to_list(&value)),
            _ => {
                self.extra.insert(key, value);
            }
        }
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn date(mut self, date: impl Into<String>) -> Self {
        self.date = Some(date.into());
        self
    }

    pub fn categories(mut self, categories: Vec<String>) -> Self {
        self.categories = Some(categories);
        self
    }

    pub fn tags(mut self, tags: Vec<String>) -> Self {
        self.tags = Some(tags);
        self
    }

    /// Names of required keys that will be filled from defaults.
    pub fn missing_required(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.title.is_none() {
            missing.push(KEY_TITLE);
        }
        if self.date.is_none() {
            missing.push(KEY_DATE);
        }
        if self.categories.is_none() {
            missing.push(KEY_CATEGORIES);
        }
        if self.tags.is_none() {
            missing.push(KEY_TAGS);
        }
        missing
    }

    pub fn build(self, defaults: FieldDefaults) -> Metadata {
        Metadata {
            title: self.title.unwrap_or(defaults.title),
            date: self.date.unwrap_or(defaults.date),
            categories: self.categories.unwrap_or_default(),
            tags: self.tags.unwrap_or_default(),
            extra: self.extra,
        }
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Tagged(tagged) => scalar_to_string(&tagged.value),
        Value::Sequence(_) | Value::Mapping(_) => serde_yaml::to_string(value)
            .ok()
            .map(|s| s.trim_end().to_string()),
    }
}

fn value_to_list(value: &Value) -> Vec<String> {
    match value {
        Value::Null => Vec::new(),
        Value::String(s) => s.split_whitespace().map(str::to_string).collect(),
        Value::Sequence(items) => items.iter().filter_map(scalar_to_string).collect(),
        Value::Tagged(tagged) => value_to_list(&tagged.value),
        other => scalar_to_string(other).into_iter().collect(),
    }
}

/// Operator changes to a draft's metadata. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetadataEdit {
    pub title: Option<String>,
    pub date: Option<String>,
    pub categories: Option<Vec<String>>,
    pub tags: Option<Vec<String>>,
}

impl MetadataEdit {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.date.is_none() && self.categories.is_none() && self.tags.is_none()
    }
}

/// Splits a comma separated field (`"news, rust,, "`) into trimmed non-empty items.
pub fn parse_list(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// One source document after intake.
#[derive(Debug, Clone, PartialEq)]
pub struct Draft {
    /// File name as supplied (e.g. `my-post.md`).
    pub source_name: String,
    /// Identifier the post publishes under unless the candidate is chosen.
    pub identifier: String,
    /// Generated canonical identifier, present only when `identifier` is not canonical.
    pub candidate: Option<String>,
    pub metadata: Metadata,
    pub body: String,
    /// Header parse problem that was recovered from.
    pub diagnostic: Option<String>,
}

impl Draft {
    pub fn has_canonical_identifier(&self) -> bool {
        self.candidate.is_none()
    }

    /// The name this draft publishes under.
    pub fn target_identifier(&self, use_candidate: bool) -> &str {
        match (&self.candidate, use_candidate) {
            (Some(candidate), true) => candidate,
            _ => &self.identifier,
        }
    }

    pub fn into_item(self, use_candidate: bool) -> PublishItem {
        let identifier = self.target_identifier(use_candidate).to_string();
        PublishItem {
            identifier,
            metadata: self.metadata,
            body: self.body,
        }
    }
}

/// Input to a batch publish.
#[derive(Debug, Clone, PartialEq)]
pub struct PublishItem {
    pub identifier: String,
    pub metadata: Metadata,
    pub body: String,
}

/// Terminal classification of one publish attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum OutcomeKind {
    Created { reference: String },
    Updated { reference: String },
    Error { message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Outcome {
    pub identifier: String,
    #[serde(flatten)]
    pub kind: OutcomeKind,
}

impl Outcome {
    pub fn created(identifier: impl Into<String>, reference: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            kind: OutcomeKind::Created {
                reference: reference.into(),
            },
        }
    }

    pub fn updated(identifier: impl Into<String>, reference: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            kind: OutcomeKind::Updated {
                reference: reference.into(),
            },
        }
    }

    pub fn error(identifier: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            kind: OutcomeKind::Error {
                message: message.into(),
            },
        }
    }

    pub fn status(&self) -> &'static str {
        match self.kind {
            OutcomeKind::Created { .. } => "created",
            OutcomeKind::Updated { .. } => "updated",
            OutcomeKind::Error { .. } => "error",
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self.kind, OutcomeKind::Error { .. })
    }

    pub fn reference(&self) -> Option<&str> {
        match &self.kind {
            OutcomeKind::Created { reference } | OutcomeKind::Updated { reference } => {
                Some(reference)
            }
            OutcomeKind::Error { .. } => None,
        }
    }

    pub fn message(&self) -> Option<&str> {
        match &self.kind {
            OutcomeKind::Error { message } => Some(message),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn defaults() -> FieldDefaults {
        FieldDefaults {
            title: "Fallback Title".to_string(),
            date: "2024-01-15 09:30:00 +0000".to_string(),
        }
    }

    fn mapping(yaml: &str) -> serde_yaml::Mapping {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_build_fills_only_missing_keys() {
        let meta = MetadataBuilder::from_mapping(mapping("title: Kept\ntags: [a]"))
            .build(defaults());
        assert_eq!(meta.title(), "Kept");
        assert_eq!(meta.date(), "2024-01-15 09:30:00 +0000");
        assert!(meta.categories().is_empty());
        assert_eq!(meta.tags(), ["a"]);
    }

    #[test]
    fn test_passthrough_keys_survive() {
        let meta = MetadataBuilder::from_mapping(mapping("layout: post\nauthor:\n  name: Ana"))
            .build(defaults());
        assert_eq!(meta.extra()["layout"], Value::String("post".into()));
        assert!(meta.extra()["author"].is_mapping());
        assert!(!meta.extra().contains_key("title"));
    }

    #[test]
    fn test_scalar_coercion() {
        let meta = MetadataBuilder::from_mapping(mapping("title: 2024\ndate: 20240115"))
            .build(defaults());
        assert_eq!(meta.title(), "2024");
        assert_eq!(meta.date(), "20240115");
    }

    #[test]
    fn test_null_title_falls_back_to_default() {
        let meta = MetadataBuilder::from_mapping(mapping("title:\ncategories:")).build(defaults());
        assert_eq!(meta.title(), "Fallback Title");
        assert!(meta.categories().is_empty());
    }

    #[test]
    fn test_space_separated_categories() {
        let meta =
            MetadataBuilder::from_mapping(mapping("categories: news rust")).build(defaults());
        assert_eq!(meta.categories(), ["news", "rust"]);
    }

    #[test]
    fn test_numeric_tags_become_strings() {
        let meta = MetadataBuilder::from_mapping(mapping("tags: [2024, ~, rust]")).build(defaults());
        assert_eq!(meta.tags(), ["2024", "rust"]);
    }

    #[test]
    fn test_missing_required_reports_absent_keys() {
        let builder = MetadataBuilder::from_mapping(mapping("title: X\ntags: []"));
        assert_eq!(builder.missing_required(), vec!["date", "categories"]);
    }

    #[test]
    fn test_edited_returns_new_record() {
        let original = MetadataBuilder::new().title("Old").build(defaults());
        let edit = MetadataEdit {
            title: Some("New".into()),
            tags: Some(vec!["x".into()]),
            ..Default::default()
        };
        let edited = original.edited(&edit);
        assert_eq!(original.title(), "Old");
        assert_eq!(edited.title(), "New");
        assert_eq!(edited.tags(), ["x"]);
        assert_eq!(edited.date(), original.date());
    }

    #[test]
    fn test_to_yaml_map_is_sorted_and_complete() {
        let meta = MetadataBuilder::from_mapping(mapping("zeta: 1\nalpha: 2")).build(defaults());
        let keys: Vec<_> = meta.to_yaml_map().into_keys().collect();
        assert_eq!(keys, ["alpha", "categories", "date", "tags", "title", "zeta"]);
    }

    #[test]
    fn test_parse_list() {
        assert_eq!(parse_list("news, rust,, "), vec!["news", "rust"]);
        assert!(parse_list("  ").is_empty());
    }

    #[test]
    fn test_draft_target_identifier() {
        let draft = Draft {
            source_name: "my post.md".into(),
            identifier: "my post.md".into(),
            candidate: Some("2024-01-15-my-post.md".into()),
            metadata: MetadataBuilder::new().build(defaults()),
            body: String::new(),
            diagnostic: None,
        };
        assert!(!draft.has_canonical_identifier());
        assert_eq!(draft.target_identifier(false), "my post.md");
        assert_eq!(draft.target_identifier(true), "2024-01-15-my-post.md");
        assert_eq!(draft.into_item(true).identifier, "2024-01-15-my-post.md");
    }

    #[test]
    fn test_outcome_serializes_with_status_tag() {
        let json = serde_json::to_value(Outcome::created("a.md", "https://x/a.md")).unwrap();
        assert_eq!(json["identifier"], "a.md");
        assert_eq!(json["status"], "created");
        assert_eq!(json["reference"], "https://x/a.md");

        let json = serde_json::to_value(Outcome::error("b.md", "boom")).unwrap();
        assert_eq!(json["status"], "error");
        assert_eq!(json["message"], "boom");
    }
}
