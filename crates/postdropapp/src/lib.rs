//! # postdropapp
//!
//! Library behind the `postdrop` CLI: normalize the YAML front matter of
//! markdown posts, give them canonical `YYYY-MM-DD-slug.md` names, and publish
//! them in batches into a Git-hosted static site.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐   ┌───────────────┐   ┌──────────────┐
//! │  CLI / UI    │──▶│     api      │──▶│   commands    │──▶│    store     │
//! │ (postdrop)   │   │ PostdropApi  │   │ intake/publish│   │ RemoteStore  │
//! └──────────────┘   └──────────────┘   └───────────────┘   └──────────────┘
//!                          │                   │
//!                       ledger         frontmatter, identifier, reconcile
//! ```
//!
//! - [`frontmatter`]: header parsing with recovery, and the wire format
//! - [`identifier`]: canonical name validation and generation
//! - [`reconcile`]: per-document create-or-update against a [`store::RemoteStore`]
//! - [`ledger`]: ordered session log of outcomes
//! - [`config`]: layered configuration and validated publish settings
//! - [`api`]: the facade UIs talk to
//!
//! Everything is synchronous and single-threaded. Remote calls block.

pub mod api;
pub mod clock;
pub mod commands;
pub mod config;
pub mod error;
pub mod frontmatter;
pub mod identifier;
pub mod ledger;
pub mod model;
pub mod reconcile;
pub mod store;
