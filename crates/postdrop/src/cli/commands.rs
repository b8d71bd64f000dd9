//! # CLI Layer
//!
//! One possible UI client for postdrop. This is the only place that knows
//! about stdout, stderr, exit codes and argument parsing.
//!
//! ## Flow
//!
//! 1. Parse arguments ([`Cli`]) and install logging.
//! 2. Load `.env`, then [`PostdropConfig`] from env and config files, then
//!    apply the command line overrides.
//! 3. Build the [`PostdropApi`]. Its [`GitHubStore`] is created from the
//!    validated settings only when a command talks to the repository, so
//!    `inspect`, `publish --dry-run` and `config` run without credentials.
//! 4. Call the API and render the returned `CmdResult`.
//!
//! A publish batch with failed documents still renders every outcome and the
//! ledger, then exits non-zero.

use super::render::{print_config, print_drafts, print_ledger, print_messages, print_progress};
use super::setup::{init_logging, Cli, Commands, EditArgs};
use anyhow::{bail, Context, Result};
use clap::Parser;
use postdropapp::api::PostdropApi;
use postdropapp::config::{global_config_path, PostdropConfig, CONFIG_FILE_NAME};
use postdropapp::store::github::GitHubStore;
use std::path::{Path, PathBuf};

struct AppContext {
    api: PostdropApi<GitHubStore>,
    project_dir: PathBuf,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Ok(path) = dotenvy::dotenv() {
        tracing::debug!(path = %path.display(), "loaded .env");
    }

    let mut ctx = init_context(&cli)?;

    match cli.command {
        Commands::Inspect {
            paths,
            rename,
            edit,
        } => handle_inspect(&ctx, &paths, rename, &edit),
        Commands::Publish {
            paths,
            rename,
            edit,
            dry_run,
            ledger_json,
        } => handle_publish(&mut ctx, &paths, rename, &edit, dry_run, ledger_json.as_deref()),
        Commands::Check => handle_check(&ctx),
        Commands::Config => handle_config(&ctx),
    }
}

fn init_context(cli: &Cli) -> Result<AppContext> {
    let project_dir = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let config = PostdropConfig::load(&project_dir)?.with_overrides(&cli.overrides());

    Ok(AppContext {
        api: PostdropApi::connecting(config, GitHubStore::from_settings),
        project_dir,
    })
}

fn handle_inspect(ctx: &AppContext, paths: &[PathBuf], rename: bool, edit: &EditArgs) -> Result<()> {
    let result = ctx.api.intake(paths, &edit.to_edit());
    print_drafts(&result.drafts, rename);
    print_messages(&result.messages);
    Ok(())
}

fn handle_publish(
    ctx: &mut AppContext,
    paths: &[PathBuf],
    rename: bool,
    edit: &EditArgs,
    dry_run: bool,
    ledger_json: Option<&Path>,
) -> Result<()> {
    let intake = ctx.api.intake(paths, &edit.to_edit());
    print_messages(&intake.messages);
    if intake.drafts.is_empty() {
        bail!("no posts to publish");
    }

    if dry_run {
        let result = ctx.api.dry_run(intake.drafts, rename)?;
        print_messages(&result.messages);
        return Ok(());
    }

    let total = intake.drafts.len();
    let mut progress = |done: usize, total: usize| {
        tracing::debug!(done, total, "progress");
        print_progress(done, total);
    };
    let result = ctx.api.publish(intake.drafts, rename, Some(&mut progress))?;
    tracing::debug!(total, "batch finished");

    print_messages(&result.messages);
    print_ledger(ctx.api.ledger());

    if let Some(path) = ledger_json {
        let json = ctx.api.ledger().to_json()?;
        std::fs::write(path, json)
            .with_context(|| format!("failed to write ledger to {}", path.display()))?;
    }

    if result.has_errors() {
        let failed = result.outcomes.iter().filter(|o| o.is_error()).count();
        bail!("{} of {} post(s) failed to publish", failed, total);
    }
    Ok(())
}

fn handle_check(ctx: &AppContext) -> Result<()> {
    let result = ctx.api.check_connection()?;
    print_messages(&result.messages);
    if result.has_errors() {
        bail!("repository is not ready for publishing");
    }
    Ok(())
}

fn handle_config(ctx: &AppContext) -> Result<()> {
    let mut sources = vec![ctx.project_dir.join(CONFIG_FILE_NAME).display().to_string()];
    if let Some(global) = global_config_path() {
        sources.push(global.display().to_string());
    }
    print_config(&ctx.api.config().describe(), &sources);
    Ok(())
}
