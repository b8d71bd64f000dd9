//! # postdrop CLI
//!
//! The binary is thin: argument parsing, context wiring and rendering live in
//! `src/cli/`, this file only runs it and turns an error into exit code 1.
//!
//! ```text
//! cli/setup.rs     clap definitions, logging setup
//! cli/commands.rs  config loading, store construction, dispatch
//! cli/render.rs    colored output of CmdResult values
//!        │
//!        ▼
//! postdropapp::api::PostdropApi   (UI-agnostic)
//! ```
//!
//! Everything from the API inward returns data; only this crate prints.

mod cli;

fn main() {
    if let Err(e) = cli::run() {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
