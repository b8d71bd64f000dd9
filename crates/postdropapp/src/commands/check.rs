use crate::commands::{CmdMessage, CmdResult};
use crate::config::PublishSettings;
use crate::store::{RemoteStore, StoreErrorKind};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum RepoAccess {
    Ok {
        full_name: String,
        default_branch: String,
    },
    Unauthorized {
        message: String,
    },
    NotFound {
        message: String,
    },
    Failed {
        message: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum BranchState {
    Found { head: String },
    Missing,
    Failed { message: String },
    Unchecked,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum PostsDirState {
    Entries { count: usize },
    Missing,
    Failed { message: String },
    Unchecked,
}

/// What a connectivity probe found, step by step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectionReport {
    pub repository: RepoAccess,
    pub branch: BranchState,
    pub posts_dir: PostsDirState,
}

impl ConnectionReport {
    /// Repository reachable and branch present. A missing posts directory
    /// is fine: the first create makes it.
    pub fn is_ready(&self) -> bool {
        matches!(self.repository, RepoAccess::Ok { .. })
            && matches!(self.branch, BranchState::Found { .. })
    }
}

/// Probes repository, branch, then posts directory. Stops at the first step
/// that makes the later ones meaningless.
pub fn probe<S: RemoteStore + ?Sized>(store: &S, settings: &PublishSettings) -> ConnectionReport {
    let repository = match store.repository() {
        Ok(info) => RepoAccess::Ok {
            full_name: info.full_name,
            default_branch: info.default_branch,
        },
        Err(e) => {
            let message = e.to_string();
            let access = match e.kind {
                StoreErrorKind::Unauthorized | StoreErrorKind::Forbidden => {
                    RepoAccess::Unauthorized { message }
                }
                StoreErrorKind::NotFound => RepoAccess::NotFound { message },
                _ => RepoAccess::Failed { message },
            };
            return ConnectionReport {
                repository: access,
                branch: BranchState::Unchecked,
                posts_dir: PostsDirState::Unchecked,
            };
        }
    };

    let branch = match store.get_branch(&settings.branch) {
        Ok(info) => BranchState::Found { head: info.head },
        Err(e) if e.is_not_found() => BranchState::Missing,
        Err(e) => BranchState::Failed {
            message: e.to_string(),
        },
    };
    if !matches!(branch, BranchState::Found { .. }) {
        return ConnectionReport {
            repository,
            branch,
            posts_dir: PostsDirState::Unchecked,
        };
    }

    let posts_dir = match store.list_dir(&settings.posts_dir, &settings.branch) {
        Ok(entries) => PostsDirState::Entries {
            count: entries.len(),
        },
        Err(e) if e.is_not_found() => PostsDirState::Missing,
        Err(e) => PostsDirState::Failed {
            message: e.to_string(),
        },
    };

    ConnectionReport {
        repository,
        branch,
        posts_dir,
    }
}

pub fn run<S: RemoteStore + ?Sized>(store: &S, settings: &PublishSettings) -> CmdResult {
    let report = probe(store, settings);
    let mut result = CmdResult::default();

    match &report.repository {
        RepoAccess::Ok {
            full_name,
            default_branch,
        } => result.add_message(CmdMessage::success(format!(
            "Connected to {} (default branch {})",
            full_name, default_branch
        ))),
        RepoAccess::Unauthorized { message } => result.add_message(CmdMessage::error(format!(
            "Token rejected for {}: {}",
            settings.full_name(),
            message
        ))),
        RepoAccess::NotFound { .. } => result.add_message(CmdMessage::error(format!(
            "Repository {} not found or not visible to this token",
            settings.full_name()
        ))),
        RepoAccess::Failed { message } => result.add_message(CmdMessage::error(format!(
            "Could not reach {}: {}",
            settings.full_name(),
            message
        ))),
    }

    match &report.branch {
        BranchState::Found { head } => result.add_message(CmdMessage::info(format!(
            "Branch {} at {}",
            settings.branch,
            short(head)
        ))),
        BranchState::Missing => result.add_message(CmdMessage::error(format!(
            "Branch {} not found",
            settings.branch
        ))),
        BranchState::Failed { message } => result.add_message(CmdMessage::error(format!(
            "Could not read branch {}: {}",
            settings.branch, message
        ))),
        BranchState::Unchecked => {}
    }

    match &report.posts_dir {
        PostsDirState::Entries { count } => result.add_message(CmdMessage::info(format!(
            "{} holds {} entries",
            settings.posts_dir, count
        ))),
        PostsDirState::Missing => result.add_message(CmdMessage::warning(format!(
            "{} does not exist yet; the first post will create it",
            settings.posts_dir
        ))),
        PostsDirState::Failed { message } => result.add_message(CmdMessage::error(format!(
            "Could not list {}: {}",
            settings.posts_dir, message
        ))),
        PostsDirState::Unchecked => {}
    }

    result.connection = Some(report);
    result
}

fn short(sha: &str) -> &str {
    sha.get(..7).unwrap_or(sha)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::MessageLevel;
    use crate::store::memory::fixtures::{settings, StoreFixture};
    use crate::store::StoreError;

    #[test]
    fn test_ready_with_posts() {
        let fixture = StoreFixture::new()
            .with_post("2024-01-01-a.md", "a")
            .with_post("2024-01-02-b.md", "b");

        let report = probe(&fixture.store, &settings());
        assert!(report.is_ready());
        assert_eq!(report.posts_dir, PostsDirState::Entries { count: 2 });
    }

    #[test]
    fn test_missing_posts_dir_is_a_warning() {
        let fixture = StoreFixture::new();
        let result = run(&fixture.store, &settings());

        let report = result.connection.as_ref().unwrap();
        assert!(report.is_ready());
        assert_eq!(report.posts_dir, PostsDirState::Missing);
        assert_eq!(result.messages.last().unwrap().level, MessageLevel::Warning);
        assert!(!result.has_errors());
    }

    #[test]
    fn test_unauthorized_stops_early() {
        let fixture = StoreFixture::new();
        fixture
            .store
            .fail_all(StoreError::new(StoreErrorKind::Unauthorized, "Bad credentials"));

        let result = run(&fixture.store, &settings());
        let report = result.connection.as_ref().unwrap();
        assert!(matches!(report.repository, RepoAccess::Unauthorized { .. }));
        assert_eq!(report.branch, BranchState::Unchecked);
        assert_eq!(result.messages.len(), 1);
        assert!(result.has_errors());
    }

    #[test]
    fn test_missing_branch() {
        let fixture = StoreFixture::new();
        let mut settings = settings();
        settings.branch = "gh-pages".to_string();

        let report = probe(&fixture.store, &settings);
        assert_eq!(report.branch, BranchState::Missing);
        assert_eq!(report.posts_dir, PostsDirState::Unchecked);
        assert!(!report.is_ready());
    }

    #[test]
    fn test_short_sha() {
        assert_eq!(short("0123456789abcdef"), "0123456");
        assert_eq!(short("abc"), "abc");
    }
}
