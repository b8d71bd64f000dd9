use colored::Colorize;
use postdropapp::commands::{CmdMessage, MessageLevel};
use postdropapp::ledger::PublishLedger;
use postdropapp::model::{Draft, OutcomeKind};

pub(super) fn print_messages(messages: &[CmdMessage]) {
    for message in messages {
        match message.level {
            MessageLevel::Info => println!("{}", message.content.dimmed()),
            MessageLevel::Success => println!("{}", message.content.green()),
            MessageLevel::Warning => println!("{}", message.content.yellow()),
            MessageLevel::Error => println!("{}", message.content.red()),
        }
    }
}

fn join_or_dash(items: &[String]) -> String {
    if items.is_empty() {
        "-".to_string()
    } else {
        items.join(", ")
    }
}

pub(super) fn print_drafts(drafts: &[Draft], rename: bool) {
    if drafts.is_empty() {
        println!("No posts found.");
        return;
    }

    for (i, draft) in drafts.iter().enumerate() {
        if i > 0 {
            println!();
        }
        println!("{}", draft.source_name.bold());

        let target = draft.target_identifier(rename);
        match &draft.candidate {
            None => println!("  name:       {}", target.green()),
            Some(candidate) if rename => {
                println!("  name:       {} (renamed from {})", candidate.green(), draft.identifier)
            }
            Some(candidate) => println!(
                "  name:       {} {}",
                target.yellow(),
                format!("(not canonical, --rename uses {})", candidate).dimmed()
            ),
        }

        let meta = &draft.metadata;
        println!("  title:      {}", meta.title());
        println!("  date:       {}", meta.date());
        println!("  categories: {}", join_or_dash(meta.categories()));
        println!("  tags:       {}", join_or_dash(meta.tags()));
        if !meta.extra().is_empty() {
            let keys: Vec<&str> = meta.extra().keys().map(String::as_str).collect();
            println!("  other keys: {}", keys.join(", ").dimmed());
        }
        if let Some(diagnostic) = &draft.diagnostic {
            println!("  {} {}", "header:".yellow(), diagnostic.yellow());
        }
        println!("  body:       {} chars", draft.body.chars().count());
    }
}

/// Progress goes to stderr so stdout stays the report.
pub(super) fn print_progress(done: usize, total: usize) {
    eprintln!("{}", format!("[{}/{}] published", done, total).dimmed());
}

pub(super) fn print_ledger(ledger: &PublishLedger) {
    if ledger.is_empty() {
        return;
    }

    println!();
    println!("{}", "Publish log".bold());
    for entry in ledger.all() {
        let outcome = &entry.outcome;
        let time = entry.recorded_at.format("%H:%M:%S").to_string();
        let status = match outcome.kind {
            OutcomeKind::Created { .. } => outcome.status().green(),
            OutcomeKind::Updated { .. } => outcome.status().cyan(),
            OutcomeKind::Error { .. } => outcome.status().red(),
        };
        let detail = outcome
            .reference()
            .or_else(|| outcome.message())
            .unwrap_or_default();
        println!(
            "  {}  {:<8} {}  {}",
            time.dimmed(),
            status,
            outcome.identifier,
            detail.dimmed()
        );
    }

    let counts = ledger.counts();
    println!(
        "  {} created, {} updated, {} failed",
        counts.created, counts.updated, counts.errors
    );
}

pub(super) fn print_config(entries: &[(&'static str, String)], sources: &[String]) {
    for (key, value) in entries {
        println!("{:<11} {}", format!("{}:", key).bold(), value);
    }
    if !sources.is_empty() {
        println!();
        println!("{}", "Config files searched:".dimmed());
        for source in sources {
            println!("  {}", source.dimmed());
        }
    }
}
