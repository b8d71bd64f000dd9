use clap::{Args, Parser, Subcommand};
use postdropapp::config::ConfigOverrides;
use postdropapp::model::{parse_list, MetadataEdit};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// "0.1.0" for releases, "0.1.0@abc1234 2024-01-15" for dev builds.
fn get_version() -> &'static str {
    const VERSION: &str = env!("CARGO_PKG_VERSION");
    const GIT_HASH: &str = env!("POSTDROP_GIT_HASH");
    const COMMIT_DATE: &str = env!("POSTDROP_COMMIT_DATE");
    const IS_RELEASE: &str = env!("POSTDROP_IS_RELEASE");

    use std::sync::OnceLock;
    static VERSION_STRING: OnceLock<String> = OnceLock::new();

    VERSION_STRING.get_or_init(|| {
        if IS_RELEASE == "true" || GIT_HASH.is_empty() {
            VERSION.to_string()
        } else {
            format!("{}@{} {}", VERSION, GIT_HASH, COMMIT_DATE)
        }
    })
}

#[derive(Parser, Debug)]
#[command(name = "postdrop", bin_name = "postdrop", version = get_version())]
#[command(about = "Normalize markdown posts and publish them to a Jekyll site on GitHub")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Repository owner (overrides POSTDROP_OWNER and config files)
    #[arg(long, global = true)]
    pub owner: Option<String>,

    /// Repository name (overrides POSTDROP_REPO and config files)
    #[arg(long, global = true)]
    pub repo: Option<String>,

    /// Target branch (overrides POSTDROP_BRANCH and config files)
    #[arg(long, global = true)]
    pub branch: Option<String>,

    /// More log output on stderr (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            owner: self.owner.clone(),
            repo: self.repo.clone(),
            branch: self.branch.clone(),
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the normalized metadata and target name of each post
    Inspect {
        /// Files or directories to read
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Show generated names for non-canonical files
        #[arg(long)]
        rename: bool,

        #[command(flatten)]
        edit: EditArgs,
    },

    /// Publish posts to the configured repository
    Publish {
        /// Files or directories to read
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Publish non-canonical names under their generated YYYY-MM-DD-slug.md name
        #[arg(long)]
        rename: bool,

        #[command(flatten)]
        edit: EditArgs,

        /// Show what would be written without contacting the repository
        #[arg(long)]
        dry_run: bool,

        /// Write the session ledger as JSON to FILE
        #[arg(long, value_name = "FILE")]
        ledger_json: Option<PathBuf>,
    },

    /// Verify the token, repository, branch and posts directory
    Check,

    /// Print the resolved configuration (token masked)
    Config,
}

/// Metadata overrides applied to every post read.
#[derive(Args, Debug, Default, Clone)]
pub struct EditArgs {
    /// Replace the title
    #[arg(long)]
    pub title: Option<String>,

    /// Replace the date (YYYY-MM-DD HH:MM:SS +ZZZZ)
    #[arg(long)]
    pub date: Option<String>,

    /// Replace categories (repeatable, or comma separated)
    #[arg(long = "category", value_name = "CATEGORY")]
    pub categories: Vec<String>,

    /// Replace tags (repeatable, or comma separated)
    #[arg(long = "tag", value_name = "TAG")]
    pub tags: Vec<String>,
}

impl EditArgs {
    pub fn to_edit(&self) -> MetadataEdit {
        MetadataEdit {
            title: self.title.clone(),
            date: self.date.clone(),
            categories: split_values(&self.categories),
            tags: split_values(&self.tags),
        }
    }
}

fn split_values(values: &[String]) -> Option<Vec<String>> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().flat_map(|v| parse_list(v)).collect())
    }
}

/// Logs go to stderr. `RUST_LOG` wins over `-v`.
pub fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_args() {
        let cli = Cli::try_parse_from([
            "postdrop",
            "publish",
            "posts/",
            "--rename",
            "--tag",
            "rust, cli",
            "--tag",
            "jekyll",
            "--owner",
            "octo",
        ])
        .unwrap();

        assert_eq!(cli.owner.as_deref(), Some("octo"));
        match cli.command {
            Commands::Publish {
                paths,
                rename,
                edit,
                dry_run,
                ledger_json,
            } => {
                assert_eq!(paths, vec![PathBuf::from("posts/")]);
                assert!(rename);
                assert!(!dry_run);
                assert!(ledger_json.is_none());
                let edit = edit.to_edit();
                assert_eq!(
                    edit.tags,
                    Some(vec!["rust".into(), "cli".into(), "jekyll".into()])
                );
                assert!(edit.categories.is_none());
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_verbose_counts() {
        let cli = Cli::try_parse_from(["postdrop", "-vv", "check"]).unwrap();
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn test_paths_required() {
        assert!(Cli::try_parse_from(["postdrop", "inspect"]).is_err());
    }

    #[test]
    fn test_empty_edit_args() {
        assert!(EditArgs::default().to_edit().is_empty());
    }
}
