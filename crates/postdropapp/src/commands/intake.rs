use crate::clock::Clock;
use crate::commands::{CmdMessage, CmdResult};
use crate::frontmatter;
use crate::identifier;
use crate::model::{Draft, MetadataEdit};
use std::fs;
use std::path::{Path, PathBuf};

const FALLBACK_SLUG_TITLE: &str = "untitled";

/// Reads every path into a draft. Directories are scanned one level deep
/// for files whose extension is in `extensions`.
///
/// Missing paths, unreadable files and non-UTF-8 content become warnings and
/// the remaining paths are still read.
pub fn run(
    paths: &[PathBuf],
    extensions: &[String],
    edit: &MetadataEdit,
    clock: &dyn Clock,
) -> CmdResult {
    let mut result = CmdResult::default();
    let mut drafts = Vec::new();

    for path in paths {
        if path.is_dir() {
            match list_dir(path, extensions) {
                Ok(files) => {
                    if files.is_empty() {
                        result.add_message(CmdMessage::warning(format!(
                            "No matching files in {}",
                            path.display()
                        )));
                    }
                    for file in files {
                        read_one(&file, edit, clock, &mut drafts, &mut result);
                    }
                }
                Err(e) => result.add_message(CmdMessage::warning(format!(
                    "Failed to read directory {}: {}",
                    path.display(),
                    e
                ))),
            }
        } else if path.is_file() {
            read_one(path, edit, clock, &mut drafts, &mut result);
        } else {
            result.add_message(CmdMessage::warning(format!(
                "Path not found: {}",
                path.display()
            )));
        }
    }

    result.with_drafts(drafts)
}

fn list_dir(dir: &Path, extensions: &[String]) -> std::io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && has_extension(&path, extensions) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn has_extension(path: &Path, extensions: &[String]) -> bool {
    let Some(ext) = path.extension() else {
        return false;
    };
    let ext = format!(".{}", ext.to_string_lossy().to_lowercase());
    extensions.iter().any(|e| e.to_lowercase() == ext)
}

fn read_one(
    path: &Path,
    edit: &MetadataEdit,
    clock: &dyn Clock,
    drafts: &mut Vec<Draft>,
    result: &mut CmdResult,
) {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            result.add_message(CmdMessage::warning(format!(
                "Failed to read {}: {}",
                path.display(),
                e
            )));
            return;
        }
    };
    let Ok(raw) = String::from_utf8(bytes) else {
        result.add_message(CmdMessage::warning(format!(
            "Skipped {}: not valid UTF-8",
            path.display()
        )));
        return;
    };

    let source_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    let draft = build_draft(&source_name, &raw, edit, clock);
    if let Some(diagnostic) = &draft.diagnostic {
        result.add_message(CmdMessage::warning(format!(
            "{}: {}; defaults applied",
            source_name, diagnostic
        )));
    }
    drafts.push(draft);
}

/// Normalizes one document, applies `edit`, and proposes a canonical
/// identifier when the source name is not one.
pub fn build_draft(source_name: &str, raw: &str, edit: &MetadataEdit, clock: &dyn Clock) -> Draft {
    let (metadata, body, diagnostic) = frontmatter::normalize(raw, source_name, clock).into_parts();
    let metadata = if edit.is_empty() {
        metadata
    } else {
        metadata.edited(edit)
    };

    let candidate = if identifier::is_valid(source_name) {
        None
    } else {
        let date = identifier::effective_date(metadata.date(), clock);
        let stem_title = frontmatter::default_title(source_name);
        let title = [metadata.title(), stem_title.as_str()]
            .into_iter()
            .find(|t| !identifier::slugify(t).is_empty())
            .unwrap_or(FALLBACK_SLUG_TITLE);
        Some(identifier::generate(title, Some(&date), clock))
    };

    Draft {
        source_name: source_name.to_string(),
        identifier: source_name.to_string(),
        candidate,
        metadata,
        body,
        diagnostic,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::commands::MessageLevel;
    use tempfile::tempdir;

    fn clock() -> FixedClock {
        FixedClock::parse("2024-03-09T12:00:00+00:00").unwrap()
    }

    fn exts() -> Vec<String> {
        vec![".md".to_string(), ".markdown".to_string()]
    }

    #[test]
    fn test_canonical_name_has_no_candidate() {
        let draft = build_draft(
            "2024-01-15-hello.md",
            "---\ntitle: Hello\n---\nBody",
            &MetadataEdit::default(),
            &clock(),
        );
        assert!(draft.has_canonical_identifier());
        assert_eq!(draft.identifier, "2024-01-15-hello.md");
        assert_eq!(draft.body, "Body");
    }

    #[test]
    fn test_candidate_uses_header_date_and_title() {
        let draft = build_draft(
            "notes.md",
            "---\ntitle: Hello, World!!\ndate: 2023-05-01 10:00:00 +0200\n---\nBody",
            &MetadataEdit::default(),
            &clock(),
        );
        assert_eq!(draft.candidate.as_deref(), Some("2023-05-01-hello-world.md"));
        assert_eq!(draft.target_identifier(false), "notes.md");
        assert_eq!(draft.target_identifier(true), "2023-05-01-hello-world.md");
    }

    #[test]
    fn test_candidate_falls_back_when_title_has_no_slug() {
        let draft = build_draft(
            "my-notes.md",
            "---\ntitle: \"日本語\"\n---\n",
            &MetadataEdit::default(),
            &clock(),
        );
        assert_eq!(draft.candidate.as_deref(), Some("2024-03-09-my-notes.md"));

        let draft = build_draft(
            "日本.md",
            "---\ntitle: \"!!!\"\n---\n",
            &MetadataEdit::default(),
            &clock(),
        );
        assert_eq!(draft.candidate.as_deref(), Some("2024-03-09-untitled.md"));
    }

    #[test]
    fn test_edit_applies_before_candidate() {
        let edit = MetadataEdit {
            title: Some("Edited Title".to_string()),
            tags: Some(vec!["rust".to_string()]),
            ..Default::default()
        };
        let draft = build_draft("draft.md", "Plain body", &edit, &clock());
        assert_eq!(draft.metadata.title(), "Edited Title");
        assert_eq!(draft.metadata.tags(), ["rust".to_string()]);
        assert_eq!(draft.candidate.as_deref(), Some("2024-03-09-edited-title.md"));
        assert_eq!(draft.body, "Plain body");
    }

    #[test]
    fn test_broken_header_reports_diagnostic() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.md");
        fs::write(&path, "---\ntitle: [unclosed\n---\nBody").unwrap();

        let result = run(&[path], &exts(), &MetadataEdit::default(), &clock());
        assert_eq!(result.drafts.len(), 1);
        assert!(result.drafts[0].diagnostic.is_some());
        assert_eq!(result.drafts[0].body, "Body");
        assert_eq!(result.messages[0].level, MessageLevel::Warning);
        assert!(result.messages[0].content.starts_with("broken.md:"));
    }

    #[test]
    fn test_directory_scan_filters_and_sorts() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("b.md"), "B").unwrap();
        fs::write(dir.path().join("a.markdown"), "A").unwrap();
        fs::write(dir.path().join("C.MD"), "C").unwrap();
        fs::write(dir.path().join("skip.txt"), "x").unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("nested").join("deep.md"), "x").unwrap();

        let result = run(
            &[dir.path().to_path_buf()],
            &exts(),
            &MetadataEdit::default(),
            &clock(),
        );
        let names: Vec<_> = result.drafts.iter().map(|d| d.source_name.as_str()).collect();
        assert_eq!(names, vec!["C.MD", "a.markdown", "b.md"]);
        assert!(result.messages.is_empty());
    }

    #[test]
    fn test_missing_and_non_utf8_are_warnings() {
        let dir = tempdir().unwrap();
        let good = dir.path().join("good.md");
        let binary = dir.path().join("binary.md");
        fs::write(&good, "ok").unwrap();
        fs::write(&binary, [0xff, 0xfe, 0x00, 0x80]).unwrap();

        let result = run(
            &[dir.path().join("missing.md"), binary, good],
            &exts(),
            &MetadataEdit::default(),
            &clock(),
        );
        assert_eq!(result.drafts.len(), 1);
        assert_eq!(result.drafts[0].source_name, "good.md");
        assert_eq!(result.messages.len(), 2);
        assert!(result.messages[0].content.starts_with("Path not found"));
        assert!(result.messages[1].content.contains("not valid UTF-8"));
    }

    #[test]
    fn test_empty_directory_warns() {
        let dir = tempdir().unwrap();
        let result = run(
            &[dir.path().to_path_buf()],
            &exts(),
            &MetadataEdit::default(),
            &clock(),
        );
        assert!(result.drafts.is_empty());
        assert!(result.messages[0].content.starts_with("No matching files"));
    }
}
