//! # Configuration
//!
//! Postdrop configuration is loaded with [`confique`] from layered sources.
//!
//! ## Storage Hierarchy
//!
//! Configuration is resolved in priority order:
//! 1. **Command line flags**: `--owner`, `--repo`, `--branch` (applied by the caller).
//! 2. **Environment variables**: `GITHUB_TOKEN`, `POSTDROP_OWNER`, `POSTDROP_REPO`,
//!    `POSTDROP_BRANCH`, `POSTDROP_API_BASE`. A `.env` file is read by the CLI first.
//! 3. **Project Config**: `./postdrop.toml`.
//! 4. **Global Config**: OS-appropriate config directory (via `directories` crate).
//! 5. **Compiled Defaults**: `#[config(default = ...)]`.
//!
//! ## Available Settings
//!
//! | Key | Default | Description |
//! |-----|---------|-------------|
//! | `token` | (none) | Access token with write access to the repository |
//! | `owner` | (none) | Repository owner (user or organization) |
//! | `repo` | (none) | Repository name |
//! | `branch` | `main` | Branch posts are committed to |
//! | `posts_dir` | `_posts` | Directory inside the repository |
//! | `api_base` | `https://api.github.com` | API root (GitHub Enterprise: `https://host/api/v3`) |
//! | `extensions` | `[".md", ".markdown"]` | Extensions picked up when a directory is given |
//! | `duplicates` | `reject` | Same identifier twice in one batch: `reject` or `overwrite` |
//!
//! ## Completeness
//!
//! `token`, `owner` and `repo` have no defaults. [`PostdropConfig::settings`]
//! checks them before any publish starts and returns the validated
//! [`PublishSettings`], which is what the publishing code receives.

use crate::error::{PostdropError, Result};
use crate::reconcile::{DuplicatePolicy, PublishTarget};
use confique::Config;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = "postdrop.toml";

fn default_extensions() -> Vec<String> {
    vec![".md".to_string(), ".markdown".to_string()]
}

/// Configuration for postdrop, stored in `postdrop.toml`.
#[derive(Config, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct PostdropConfig {
    /// Access token with contents write permission.
    #[config(env = "GITHUB_TOKEN")]
    pub token: Option<String>,

    /// Repository owner.
    #[config(env = "POSTDROP_OWNER")]
    pub owner: Option<String>,

    /// Repository name.
    #[config(env = "POSTDROP_REPO")]
    pub repo: Option<String>,

    /// Target branch.
    #[config(env = "POSTDROP_BRANCH", default = "main")]
    pub branch: String,

    /// Directory posts are stored under.
    #[config(default = "_posts")]
    pub posts_dir: String,

    /// API root URL.
    #[config(env = "POSTDROP_API_BASE", default = "https://api.github.com")]
    pub api_base: String,

    /// Extensions to pick up when scanning directories.
    /// When absent, defaults to [".md", ".markdown"].
    pub extensions: Option<Vec<String>>,

    /// What to do when one batch contains the same identifier twice.
    #[config(default = "reject")]
    pub duplicates: DuplicatePolicy,
}

impl Default for PostdropConfig {
    fn default() -> Self {
        Self {
            token: None,
            owner: None,
            repo: None,
            branch: "main".to_string(),
            posts_dir: "_posts".to_string(),
            api_base: "https://api.github.com".to_string(),
            extensions: None,
            duplicates: DuplicatePolicy::Reject,
        }
    }
}

/// Values from the command line that win over every other source.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub owner: Option<String>,
    pub repo: Option<String>,
    pub branch: Option<String>,
}

/// A complete, validated set of publish settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishSettings {
    pub token: String,
    pub owner: String,
    pub repo: String,
    pub branch: String,
    pub posts_dir: String,
    pub api_base: String,
    pub duplicates: DuplicatePolicy,
}

impl PublishSettings {
    pub fn target(&self) -> PublishTarget {
        PublishTarget {
            branch: self.branch.clone(),
            posts_dir: self.posts_dir.clone(),
            duplicates: self.duplicates,
        }
    }

    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }
}

pub fn global_config_path() -> Option<PathBuf> {
    ProjectDirs::from("com", "postdrop", "postdrop")
        .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
}

impl PostdropConfig {
    /// Loads env, `<project_dir>/postdrop.toml`, then the global file.
    pub fn load(project_dir: &Path) -> Result<Self> {
        Self::load_from(project_dir, global_config_path())
    }

    pub fn load_from(project_dir: &Path, global_file: Option<PathBuf>) -> Result<Self> {
        let mut builder = Self::builder()
            .env()
            .file(project_dir.join(CONFIG_FILE_NAME));
        if let Some(global_file) = global_file {
            builder = builder.file(global_file);
        }
        builder
            .load()
            .map_err(|e| PostdropError::Config(e.to_string()))
    }

    pub fn with_overrides(mut self, overrides: &ConfigOverrides) -> Self {
        if let Some(owner) = &overrides.owner {
            self.owner = Some(owner.clone());
        }
        if let Some(repo) = &overrides.repo {
            self.repo = Some(repo.clone());
        }
        if let Some(branch) = &overrides.branch {
            self.branch = branch.clone();
        }
        self
    }

    /// Get extensions, using defaults if not configured.
    pub fn extensions(&self) -> Vec<String> {
        self.extensions
            .clone()
            .unwrap_or_else(default_extensions)
            .into_iter()
            .map(|ext| {
                if ext.starts_with('.') {
                    ext
                } else {
                    format!(".{}", ext)
                }
            })
            .collect()
    }

    /// Branch, directory and duplicate policy. Needs no credentials.
    pub fn target(&self) -> PublishTarget {
        PublishTarget {
            branch: self.branch.trim().to_string(),
            posts_dir: self.posts_dir.trim_matches('/').to_string(),
            duplicates: self.duplicates,
        }
    }

    /// Validates that everything a publish needs is present.
    pub fn settings(&self) -> Result<PublishSettings> {
        let mut missing = Vec::new();
        let token = non_empty(&self.token);
        let owner = non_empty(&self.owner);
        let repo = non_empty(&self.repo);
        if token.is_none() {
            missing.push("token (set GITHUB_TOKEN)");
        }
        if owner.is_none() {
            missing.push("owner");
        }
        if repo.is_none() {
            missing.push("repo");
        }
        if self.branch.trim().is_empty() {
            missing.push("branch");
        }
        if !missing.is_empty() {
            return Err(PostdropError::Config(format!("missing {}", missing.join(", "))));
        }

        Ok(PublishSettings {
            token: token.unwrap_or_default(),
            owner: owner.unwrap_or_default(),
            repo: repo.unwrap_or_default(),
            branch: self.branch.trim().to_string(),
            posts_dir: self.posts_dir.trim_matches('/').to_string(),
            api_base: self.api_base.trim().to_string(),
            duplicates: self.duplicates,
        })
    }

    /// Resolved values for display, token masked.
    pub fn describe(&self) -> Vec<(&'static str, String)> {
        let unset = || "(unset)".to_string();
        vec![
            ("token", self.token.as_deref().map(mask_token).unwrap_or_else(unset)),
            ("owner", self.owner.clone().unwrap_or_else(unset)),
            ("repo", self.repo.clone().unwrap_or_else(unset)),
            ("branch", self.branch.clone()),
            ("posts_dir", self.posts_dir.clone()),
            ("api_base", self.api_base.clone()),
            ("extensions", self.extensions().join(", ")),
            ("duplicates", self.duplicates.to_string()),
        ]
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn mask_token(token: &str) -> String {
    let visible: String = token
        .chars()
        .rev()
        .take(4)
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    if token.chars().count() <= 8 {
        "****".to_string()
    } else {
        format!("****{}", visible)
    }
}
