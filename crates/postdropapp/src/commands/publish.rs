use crate::commands::{CmdMessage, CmdResult};
use crate::error::Result;
use crate::frontmatter;
use crate::model::{Draft, Outcome, PublishItem};
use crate::reconcile::{self, ProgressSink, PublishTarget};
use crate::store::RemoteStore;

/// Picks each draft's publish name. With `use_candidates`, non-canonical
/// source names are replaced by their generated identifier.
pub fn plan(drafts: Vec<Draft>, use_candidates: bool) -> Vec<PublishItem> {
    drafts
        .into_iter()
        .map(|draft| draft.into_item(use_candidates))
        .collect()
}

pub fn run<S: RemoteStore + ?Sized>(
    store: &S,
    target: &PublishTarget,
    items: &[PublishItem],
    sink: Option<&mut dyn ProgressSink>,
) -> CmdResult {
    let outcomes = reconcile::publish_batch(store, target, items, sink);

    let mut result = CmdResult::default();
    for outcome in &outcomes {
        result.add_message(outcome_message(outcome));
    }
    result.add_message(summary(&outcomes));
    result.with_outcomes(outcomes)
}

/// Serializes every item and reports where it would go, without a store.
pub fn dry_run(target: &PublishTarget, items: &[PublishItem]) -> Result<CmdResult> {
    let mut result = CmdResult::default();
    for item in items {
        let content = frontmatter::serialize(&item.metadata, &item.body)?;
        result.add_message(CmdMessage::info(format!(
            "Would publish {} ({} bytes) on {}",
            target.path_for(&item.identifier),
            content.len(),
            target.branch
        )));
    }
    result.add_message(CmdMessage::success(format!(
        "Dry run: {} document(s), nothing written",
        items.len()
    )));
    Ok(result)
}

fn outcome_message(outcome: &Outcome) -> CmdMessage {
    match (outcome.reference(), outcome.message()) {
        (Some(reference), _) => CmdMessage::success(format!(
            "{} {}: {}",
            capitalize(outcome.status()),
            outcome.identifier,
            reference
        )),
        (None, Some(message)) => {
            CmdMessage::error(format!("Failed {}: {}", outcome.identifier, message))
        }
        (None, None) => CmdMessage::info(outcome.identifier.clone()),
    }
}

fn summary(outcomes: &[Outcome]) -> CmdMessage {
    let failed = outcomes.iter().filter(|o| o.is_error()).count();
    let text = format!(
        "Published {} of {} document(s)",
        outcomes.len() - failed,
        outcomes.len()
    );
    if failed == 0 {
        CmdMessage::success(text)
    } else {
        CmdMessage::warning(format!("{}, {} failed", text, failed))
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
