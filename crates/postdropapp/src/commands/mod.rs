//! # Command Layer
//!
//! Each command lives in its own submodule as plain functions over domain
//! types. Commands return a [`CmdResult`] and leave rendering to the caller.
//!
//! ## What Commands Do NOT Do
//!
//! - **Terminal output**: no stdout or stderr, no colors
//! - **Argument parsing**: the CLI's job
//! - **Exit codes**: return `Result`, let the caller decide
//!
//! Intake reads local files; that is the only filesystem access in this layer.
//!
//! ## Command Modules
//!
//! - [`intake`]: Read files and directories into [`Draft`]s
//! - [`publish`]: Turn drafts into publish items and run a batch
//! - [`check`]: Probe repository, branch and posts directory

use crate::model::{Draft, Outcome};
use serde::Serialize;

pub mod check;
pub mod intake;
pub mod publish;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageLevel {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CmdMessage {
    pub level: MessageLevel,
    pub content: String,
}

impl CmdMessage {
    pub fn info(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Info,
            content: content.into(),
        }
    }

    pub fn success(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Success,
            content: content.into(),
        }
    }

    pub fn warning(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Warning,
            content: content.into(),
        }
    }

    pub fn error(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Error,
            content: content.into(),
        }
    }
}

#[derive(Debug, Default)]
pub struct CmdResult {
    /// Documents read by intake.
    pub drafts: Vec<Draft>,
    /// Publish outcomes, in batch order.
    pub outcomes: Vec<Outcome>,
    pub connection: Option<check::ConnectionReport>,
    pub messages: Vec<CmdMessage>,
}

impl CmdResult {
    pub fn add_message(&mut self, message: CmdMessage) {
        self.messages.push(message);
    }

    pub fn with_drafts(mut self, drafts: Vec<Draft>) -> Self {
        self.drafts = drafts;
        self
    }

    pub fn with_outcomes(mut self, outcomes: Vec<Outcome>) -> Self {
        self.outcomes = outcomes;
        self
    }

    pub fn has_errors(&self) -> bool {
        self.outcomes.iter().any(Outcome::is_error)
            || self.messages.iter().any(|m| m.level == MessageLevel::Error)
    }
}
