//! Canonical post identifiers.
//!
//! A canonical identifier is the file name a post is stored under:
//!
//! ```text
//! 2024-01-15-hello-world.md
//! └──date──┘ └───slug───┘
//! ```
//!
//! - [`is_valid`] checks a supplied name against the grammar.
//! - [`generate`] derives a name from a title and a date.
//!
//! Generation does not look at the remote store, so two different titles can
//! slug to the same identifier. Batch publishing decides what to do about that
//! (see `reconcile::DuplicatePolicy`).

use crate::clock::{Clock, IDENTIFIER_DATE_FORMAT};
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

static IDENTIFIER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d{4}-\d{2}-\d{2}-[a-zA-Z0-9-]+\.md$").expect("identifier pattern compiles")
});

pub const EXTENSION: &str = ".md";

/// True iff `name` is `YYYY-MM-DD-<slug>.md`.
///
/// ```
/// use postdropapp::identifier::is_valid;
///
/// assert!(is_valid("2024-01-15-my-post.md"));
/// assert!(!is_valid("my-post.md"));
/// assert!(!is_valid("2024-1-15-post.md"));
/// ```
pub fn is_valid(name: &str) -> bool {
    IDENTIFIER_RE.is_match(name)
}

/// Lowercase, hyphenated, `[a-z0-9-]` only, no edge or doubled hyphens.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    for c in title.to_lowercase().chars() {
        let c = if c == ' ' { '-' } else { c };
        if !(c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-') {
            continue;
        }
        if c == '-' && (slug.is_empty() || slug.ends_with('-')) {
            continue;
        }
        slug.push(c);
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

/// Builds `<date>-<slug>.md`. `date` defaults to the clock's current day.
pub fn generate(title: &str, date: Option<&str>, clock: &dyn Clock) -> String {
    let date = date.map(str::to_string).unwrap_or_else(|| clock.today());
    format!("{}-{}{}", date, slugify(title), EXTENSION)
}

/// The day a post belongs to: the leading `YYYY-MM-DD` of its metadata date
/// when that is a real calendar date, otherwise today.
pub fn effective_date(metadata_date: &str, clock: &dyn Clock) -> String {
    metadata_date
        .get(..10)
        .and_then(|prefix| NaiveDate::parse_from_str(prefix, IDENTIFIER_DATE_FORMAT).ok())
        .map(|date| date.format(IDENTIFIER_DATE_FORMAT).to_string())
        .unwrap_or_else(|| clock.today())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;

    fn clock() -> FixedClock {
        FixedClock::parse("2024-03-09T12:00:00+00:00").unwrap()
    }

    #[test]
    fn test_is_valid() {
        assert!(is_valid("2024-01-15-my-post.md"));
        assert!(is_valid("2024-01-15-My-Post-2.md"));
        assert!(!is_valid("my-post.md"));
        assert!(!is_valid("2024-1-15-post.md"));
        assert!(!is_valid("2024-01-15-.md"));
        assert!(!is_valid("2024-01-15-my_post.md"));
        assert!(!is_valid("2024-01-15-my-post.markdown"));
        assert!(!is_valid("2024-01-15-my-post.md.bak"));
    }

    #[test]
    fn test_generate_strips_punctuation() {
        assert_eq!(
            generate("Hello, World!!", Some("2024-01-15"), &clock()),
            "2024-01-15-hello-world.md"
        );
    }

    #[test]
    fn test_generate_collapses_and_trims_hyphens() {
        let name = generate("  --Weird--Title--  ", None, &clock());
        assert_eq!(name, "2024-03-09-weird-title.md");
        let slug = name
            .trim_start_matches("2024-03-09-")
            .trim_end_matches(".md");
        assert!(!slug.starts_with('-'));
        assert!(!slug.ends_with('-'));
        assert!(!slug.contains("--"));
    }

    #[test]
    fn test_generate_uses_clock_by_default() {
        assert_eq!(generate("Post", None, &clock()), "2024-03-09-post.md");
    }

    #[test]
    fn test_generate_is_deterministic() {
        let a = generate("Same Title", None, &clock());
        let b = generate("Same Title", None, &clock());
        assert_eq!(a, b);
    }

    #[test]
    fn test_slugify_drops_non_ascii() {
        assert_eq!(slugify("Café au lait"), "caf-au-lait");
        assert_eq!(slugify("Tabs\tand_underscores"), "tabsandunderscores");
        assert_eq!(slugify("!!!"), "");
    }

    #[test]
    fn test_generated_names_are_valid_when_slug_nonempty() {
        for title in ["Hello", "Rust 2024 edition", "a - b - c"] {
            assert!(is_valid(&generate(title, Some("2024-01-15"), &clock())));
        }
    }

    #[test]
    fn test_effective_date() {
        assert_eq!(effective_date("2023-05-01 10:00:00 +0200", &clock()), "2023-05-01");
        assert_eq!(effective_date("2023-02-30 10:00", &clock()), "2024-03-09");
        assert_eq!(effective_date("soon", &clock()), "2024-03-09");
        assert_eq!(effective_date("", &clock()), "2024-03-09");
    }
}
