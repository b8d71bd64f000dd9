//! # API Facade
//!
//! The API layer is a **thin facade** over the command layer and the single
//! entry point for every postdrop operation, whatever UI drives it.
//!
//! ## Role and Responsibilities
//!
//! The API facade:
//! - **Owns session state**: configuration, the [`PublishLedger`] and the clock
//! - **Validates settings** before a batch starts, so an incomplete
//!   configuration attempts nothing
//! - **Dispatches** to the command functions and records publish outcomes
//!
//! It does no terminal output and holds no business logic.
//!
//! ## Generic Over RemoteStore
//!
//! `PostdropApi<S: RemoteStore>`:
//! - Production: `PostdropApi<GitHubStore>`
//! - Testing: `PostdropApi<MemStore>`
//!
//! A UI that may run offline commands builds the API with
//! [`PostdropApi::connecting`]. The store is then created from the validated
//! [`PublishSettings`] the first time a command needs the repository.

use crate::clock::{Clock, SystemClock};
use crate::commands::{self, CmdResult};
use crate::config::{PostdropConfig, PublishSettings};
use crate::error::{PostdropError, Result};
use crate::ledger::PublishLedger;
use crate::model::{Draft, MetadataEdit, PublishItem};
use crate::reconcile::ProgressSink;
use crate::store::RemoteStore;
use once_cell::unsync::OnceCell;
use std::path::PathBuf;

/// Builds a store from validated settings.
pub type Connector<S> = fn(&PublishSettings) -> Result<S>;

pub struct PostdropApi<S: RemoteStore> {
    store: OnceCell<S>,
    connector: Option<Connector<S>>,
    config: PostdropConfig,
    ledger: PublishLedger,
    clock: Box<dyn Clock>,
}

impl<S: RemoteStore> PostdropApi<S> {
    pub fn new(store: S, config: PostdropConfig) -> Self {
        Self::with_clock(store, config, SystemClock)
    }

    pub fn with_clock<C: Clock + Clone + 'static>(store: S, config: PostdropConfig, clock: C) -> Self {
        Self::build(OnceCell::with_value(store), None, config, clock)
    }

    /// Defers store creation until `connector` can be given complete settings.
    pub fn connecting(config: PostdropConfig, connector: Connector<S>) -> Self {
        Self::build(OnceCell::new(), Some(connector), config, SystemClock)
    }

    fn build<C: Clock + Clone + 'static>(
        store: OnceCell<S>,
        connector: Option<Connector<S>>,
        config: PostdropConfig,
        clock: C,
    ) -> Self {
        Self {
            store,
            connector,
            config,
            ledger: PublishLedger::new(Box::new(clock.clone())),
            clock: Box::new(clock),
        }
    }

    fn remote(&self, settings: &PublishSettings) -> Result<&S> {
        self.store.get_or_try_init(|| match self.connector {
            Some(connect) => {
                tracing::debug!(repo = %settings.full_name(), "connecting store");
                connect(settings)
            }
            None => Err(PostdropError::Config("no store configured".to_string())),
        })
    }

    /// Reads files and directories into drafts, applying `edit` to each.
    pub fn intake(&self, paths: &[PathBuf], edit: &MetadataEdit) -> CmdResult {
        commands::intake::run(paths, &self.config.extensions(), edit, self.clock.as_ref())
    }

    /// Publishes drafts under their source names, or their generated
    /// identifiers when `use_candidates` is set.
    pub fn publish(
        &mut self,
        drafts: Vec<Draft>,
        use_candidates: bool,
        sink: Option<&mut dyn ProgressSink>,
    ) -> Result<CmdResult> {
        let items = commands::publish::plan(drafts, use_candidates);
        self.publish_items(&items, sink)
    }

    /// Runs one batch and appends every outcome to the ledger.
    pub fn publish_items(
        &mut self,
        items: &[PublishItem],
        sink: Option<&mut dyn ProgressSink>,
    ) -> Result<CmdResult> {
        let settings = self.config.settings()?;
        let store = self.remote(&settings)?;
        let result = commands::publish::run(store, &settings.target(), items, sink);
        for outcome in &result.outcomes {
            self.ledger.record(outcome.clone());
        }
        Ok(result)
    }

    /// Shows where drafts would go without contacting the store.
    pub fn dry_run(&self, drafts: Vec<Draft>, use_candidates: bool) -> Result<CmdResult> {
        let items = commands::publish::plan(drafts, use_candidates);
        commands::publish::dry_run(&self.config.target(), &items)
    }

    pub fn check_connection(&self) -> Result<CmdResult> {
        let settings = self.config.settings()?;
        Ok(commands::check::run(self.remote(&settings)?, &settings))
    }

    pub fn ledger(&self) -> &PublishLedger {
        &self.ledger
    }

    pub fn clear_ledger(&mut self) {
        self.ledger.clear();
    }

    pub fn config(&self) -> &PostdropConfig {
        &self.config
    }

    /// The store, once one has been given or connected.
    pub fn store(&self) -> Option<&S> {
        self.store.get()
    }
}
