//! # Publish Reconciler
//!
//! Decides per document whether to create or update it in the remote store.
//!
//! 1. Read `<posts_dir>/<identifier>` on the target branch.
//! 2. Entry exists: update it, presenting the version token just read.
//! 3. Store says not found: create it.
//! 4. Anything else: an `error` outcome. The batch moves on.
//!
//! One read and at most one write per document, no retries. A concurrent
//! change between the read and the write shows up as a version conflict
//! and is reported, not retried.
//!
//! ## Duplicates
//!
//! Identifiers are generated without asking the store, so a batch can name
//! the same identifier twice. [`DuplicatePolicy::Reject`] turns every later
//! occurrence into an error outcome without touching the store;
//! [`DuplicatePolicy::Overwrite`] lets the later document update the earlier.

use crate::frontmatter;
use crate::model::{Outcome, PublishItem};
use crate::store::RemoteStore;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicatePolicy {
    #[default]
    Reject,
    Overwrite,
}

impl fmt::Display for DuplicatePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DuplicatePolicy::Reject => write!(f, "reject"),
            DuplicatePolicy::Overwrite => write!(f, "overwrite"),
        }
    }
}

/// Where and how a batch is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishTarget {
    pub branch: String,
    pub posts_dir: String,
    pub duplicates: DuplicatePolicy,
}

impl Default for PublishTarget {
    fn default() -> Self {
        Self {
            branch: "main".to_string(),
            posts_dir: "_posts".to_string(),
            duplicates: DuplicatePolicy::Reject,
        }
    }
}

impl PublishTarget {
    pub fn path_for(&self, identifier: &str) -> String {
        if self.posts_dir.is_empty() {
            identifier.to_string()
        } else {
            format!("{}/{}", self.posts_dir, identifier)
        }
    }
}

/// Receives one tick per processed document.
pub trait ProgressSink {
    fn advance(&mut self, done: usize, total: usize);
}

impl<F: FnMut(usize, usize)> ProgressSink for F {
    fn advance(&mut self, done: usize, total: usize) {
        self(done, total)
    }
}

fn create_message(identifier: &str) -> String {
    format!("Add {} via postdrop", identifier)
}

fn update_message(identifier: &str) -> String {
    format!("Update {} via postdrop", identifier)
}

fn malformed(identifier: &str) -> Option<String> {
    if identifier.trim().is_empty() {
        return Some("malformed path: identifier is empty".to_string());
    }
    if identifier.contains('/') || identifier.contains('\\') {
        return Some(format!(
            "malformed path: identifier {:?} contains a path separator",
            identifier
        ));
    }
    None
}

/// Publishes one serialized document.
pub fn reconcile<S: RemoteStore + ?Sized>(
    store: &S,
    target: &PublishTarget,
    identifier: &str,
    content: &str,
) -> Outcome {
    if let Some(message) = malformed(identifier) {
        return Outcome::error(identifier, message);
    }

    let path = target.path_for(identifier);
    let outcome = match store.get_entry(&path, &target.branch) {
        Ok(entry) => {
            tracing::debug!(%path, version = %entry.version, "entry exists, updating");
            match store.update_entry(
                &path,
                &update_message(identifier),
                content,
                &entry.version,
                &target.branch,
            ) {
                Ok(receipt) => Outcome::updated(identifier, receipt.reference),
                Err(e) => Outcome::error(identifier, format!("update failed: {}", e)),
            }
        }
        Err(e) if e.is_not_found() => {
            tracing::debug!(%path, "entry absent, creating");
            match store.create_entry(&path, &create_message(identifier), content, &target.branch)
            {
                Ok(receipt) => Outcome::created(identifier, receipt.reference),
                Err(e) => Outcome::error(identifier, format!("create failed: {}", e)),
            }
        }
        Err(e) => Outcome::error(identifier, format!("lookup failed: {}", e)),
    };

    match outcome.message() {
        Some(message) => tracing::warn!(identifier, error = message, "publish failed"),
        None => tracing::info!(identifier, status = outcome.status(), "published"),
    }
    outcome
}

/// Publishes `items` in order. The result has one outcome per item, same order.
pub fn publish_batch<S: RemoteStore + ?Sized>(
    store: &S,
    target: &PublishTarget,
    items: &[PublishItem],
    mut sink: Option<&mut dyn ProgressSink>,
) -> Vec<Outcome> {
    let total = items.len();
    let mut seen: HashMap<&str, usize> = HashMap::new();
    let mut outcomes = Vec::with_capacity(total);

    for (i, item) in items.iter().enumerate() {
        let first = seen.get(item.identifier.as_str()).copied();
        let outcome = match first {
            Some(earlier) if target.duplicates == DuplicatePolicy::Reject => {
                tracing::warn!(identifier = %item.identifier, earlier, "duplicate identifier in batch");
                Outcome::error(
                    &item.identifier,
                    format!(
                        "duplicate identifier: already used by item {} of this batch",
                        earlier + 1
                    ),
                )
            }
            _ => match frontmatter::serialize(&item.metadata, &item.body) {
                Ok(content) => reconcile(store, target, &item.identifier, &content),
                Err(e) => Outcome::error(&item.identifier, format!("could not serialize: {}", e)),
            },
        };
        seen.entry(item.identifier.as_str()).or_insert(i);
        outcomes.push(outcome);

        if let Some(sink) = sink.as_mut() {
            sink.advance(i + 1, total);
        }
    }

    outcomes
}
