//! # Remote Content Store
//!
//! Posts are published into a path-addressed, versioned file store. The
//! [`RemoteStore`] trait is the only thing the reconciler knows about it.
//!
//! ## Version Tokens
//!
//! Every stored entry carries an opaque version token (a blob sha on GitHub).
//! Updates must present the token read just before; a store that sees a
//! different current version rejects the write with [`StoreErrorKind::Conflict`].
//! That is the only cross-process consistency guarantee postdrop relies on.
//!
//! ## Not Found Is Data
//!
//! [`StoreErrorKind::NotFound`] from [`RemoteStore::get_entry`] is how the
//! reconciler learns it must create rather than update. Every other kind is a
//! real failure.
//!
//! ## Implementations
//!
//! - [`github::GitHubStore`]: GitHub REST contents API over a blocking client.
//! - [`memory::MemStore`]: In-memory store with error injection, for tests.
//!
//! All calls block until the round trip completes. There is no retry.

use serde::Serialize;
use thiserror::Error;

pub mod github;
pub mod memory;

/// Classification of a store failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreErrorKind {
    NotFound,
    Unauthorized,
    Forbidden,
    RateLimited,
    /// Stale version token or concurrent change.
    Conflict,
    /// Request rejected as malformed (bad path, missing token on update).
    Unprocessable,
    /// Network or protocol failure before a status was received.
    Transport,
    Other(u16),
}

impl StoreErrorKind {
    /// Maps an HTTP status to a kind. `rate_limited` marks a 403 caused by quota.
    pub fn from_status(status: u16, rate_limited: bool) -> Self {
        match status {
            401 => StoreErrorKind::Unauthorized,
            403 if rate_limited => StoreErrorKind::RateLimited,
            403 => StoreErrorKind::Forbidden,
            404 => StoreErrorKind::NotFound,
            409 => StoreErrorKind::Conflict,
            422 => StoreErrorKind::Unprocessable,
            429 => StoreErrorKind::RateLimited,
            other => StoreErrorKind::Other(other),
        }
    }

    fn describe(&self) -> String {
        match self {
            StoreErrorKind::NotFound => "not found".to_string(),
            StoreErrorKind::Unauthorized => "authentication failed".to_string(),
            StoreErrorKind::Forbidden => "permission denied".to_string(),
            StoreErrorKind::RateLimited => "rate limit exceeded".to_string(),
            StoreErrorKind::Conflict => "version conflict".to_string(),
            StoreErrorKind::Unprocessable => "request rejected".to_string(),
            StoreErrorKind::Transport => "connection failed".to_string(),
            StoreErrorKind::Other(status) => format!("unexpected status {}", status),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{} ({})", .kind.describe(), .message)]
pub struct StoreError {
    pub kind: StoreErrorKind,
    pub message: String,
}

impl StoreError {
    pub fn new(kind: StoreErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StoreErrorKind::NotFound, message)
    }

    pub fn is_not_found(&self) -> bool {
        self.kind == StoreErrorKind::NotFound
    }
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Current state of an existing path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteEntry {
    pub content: String,
    pub version: String,
}

/// What a successful create/update returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteReceipt {
    /// Human-facing location of the written entry (a URL for GitHub).
    pub reference: String,
    /// Version token of the entry after the write.
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchInfo {
    pub name: String,
    pub head: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryInfo {
    pub full_name: String,
    pub default_branch: String,
}

/// Abstract interface for the publish target.
pub trait RemoteStore {
    /// Read the entry at `path` on `git_ref`. Absence is `StoreErrorKind::NotFound`.
    fn get_entry(&self, path: &str, git_ref: &str) -> StoreResult<RemoteEntry>;

    /// Create a new entry. Fails if the path already exists.
    fn create_entry(
        &self,
        path: &str,
        message: &str,
        content: &str,
        branch: &str,
    ) -> StoreResult<WriteReceipt>;

    /// Replace an entry, guarded by the version token read before.
    fn update_entry(
        &self,
        path: &str,
        message: &str,
        content: &str,
        version: &str,
        branch: &str,
    ) -> StoreResult<WriteReceipt>;

    fn get_branch(&self, name: &str) -> StoreResult<BranchInfo>;

    fn repository(&self) -> StoreResult<RepositoryInfo>;

    /// Names of the entries directly under `path`.
    fn list_dir(&self, path: &str, git_ref: &str) -> StoreResult<Vec<String>>;
}

impl<S: RemoteStore + ?Sized> RemoteStore for &S {
    fn get_entry(&self, path: &str, git_ref: &str) -> StoreResult<RemoteEntry> {
        (**self).get_entry(path, git_ref)
    }

    fn create_entry(
        &self,
        path: &str,
        message: &str,
        content: &str,
        branch: &str,
    ) -> StoreResult<WriteReceipt> {
        (**self).create_entry(path, message, content, branch)
    }

    fn update_entry(
        &self,
        path: &str,
        message: &str,
        content: &str,
        version: &str,
        branch: &str,
    ) -> StoreResult<WriteReceipt> {
        (**self).update_entry(path, message, content, version, branch)
    }

    fn get_branch(&self, name: &str) -> StoreResult<BranchInfo> {
        (**self).get_branch(name)
    }

    fn repository(&self) -> StoreResult<RepositoryInfo> {
        (**self).repository()
    }

    fn list_dir(&self, path: &str, git_ref: &str) -> StoreResult<Vec<String>> {
        (**self).list_dir(path, git_ref)
    }
}
