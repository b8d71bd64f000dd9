//! Session log of publish outcomes.
//!
//! The ledger is append-only between clears and keeps insertion order, so
//! reading it back after a batch gives the batch order whatever the outcomes
//! were. Nothing is persisted; [`PublishLedger::to_json`] exports the session.

use crate::clock::{Clock, SystemClock};
use crate::error::Result;
use crate::model::{Outcome, OutcomeKind};
use chrono::{DateTime, FixedOffset};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LedgerEntry {
    #[serde(flatten)]
    pub outcome: Outcome,
    pub recorded_at: DateTime<FixedOffset>,
}

/// Number of entries per outcome kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LedgerCounts {
    pub created: usize,
    pub updated: usize,
    pub errors: usize,
}

impl LedgerCounts {
    pub fn total(&self) -> usize {
        self.created + self.updated + self.errors
    }
}

pub struct PublishLedger {
    entries: Vec<LedgerEntry>,
    clock: Box<dyn Clock>,
}

impl Default for PublishLedger {
    fn default() -> Self {
        Self::new(Box::new(SystemClock))
    }
}

impl PublishLedger {
    pub fn new(clock: Box<dyn Clock>) -> Self {
        Self {
            entries: Vec::new(),
            clock,
        }
    }

    /// Appends `outcome` stamped with the current time.
    pub fn record(&mut self, outcome: Outcome) {
        let recorded_at = self.clock.now();
        self.entries.push(LedgerEntry {
            outcome,
            recorded_at,
        });
    }

    pub fn all(&self) -> &[LedgerEntry] {
        &self.entries
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn counts(&self) -> LedgerCounts {
        self.entries
            .iter()
            .fold(LedgerCounts::default(), |mut counts, entry| {
                match entry.outcome.kind {
                    OutcomeKind::Created { .. } => counts.created += 1,
                    OutcomeKind::Updated { .. } => counts.updated += 1,
                    OutcomeKind::Error { .. } => counts.errors += 1,
                }
                counts
            })
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.entries)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;

    fn ledger() -> PublishLedger {
        PublishLedger::new(Box::new(
            FixedClock::parse("2024-01-15T09:30:00+01:00").unwrap(),
        ))
    }

    #[test]
    fn test_record_keeps_order() {
        let mut ledger = ledger();
        ledger.record(Outcome::created("a.md", "ref-a"));
        ledger.record(Outcome::error("b.md", "boom"));
        ledger.record(Outcome::updated("c.md", "ref-c"));

        let ids: Vec<_> = ledger
            .all()
            .iter()
            .map(|e| e.outcome.identifier.as_str())
            .collect();
        assert_eq!(ids, vec!["a.md", "b.md", "c.md"]);
        assert_eq!(ledger.len(), 3);
    }

    #[test]
    fn test_clear_empties() {
        let mut ledger = ledger();
        ledger.record(Outcome::created("a.md", "ref"));
        ledger.clear();
        assert!(ledger.all().is_empty());
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_counts() {
        let mut ledger = ledger();
        ledger.record(Outcome::created("a.md", "r"));
        ledger.record(Outcome::created("b.md", "r"));
        ledger.record(Outcome::updated("c.md", "r"));
        ledger.record(Outcome::error("d.md", "x"));

        let counts = ledger.counts();
        assert_eq!(
            counts,
            LedgerCounts {
                created: 2,
                updated: 1,
                errors: 1
            }
        );
        assert_eq!(counts.total(), 4);
    }

    #[test]
    fn test_json_export() {
        let mut ledger = ledger();
        ledger.record(Outcome::created("a.md", "https://example.com/a"));
        ledger.record(Outcome::error("b.md", "denied"));

        let value: serde_json::Value = serde_json::from_str(&ledger.to_json().unwrap()).unwrap();
        assert_eq!(value[0]["identifier"], "a.md");
        assert_eq!(value[0]["status"], "created");
        assert_eq!(value[0]["reference"], "https://example.com/a");
        assert_eq!(value[0]["recorded_at"], "2024-01-15T09:30:00+01:00");
        assert_eq!(value[1]["status"], "error");
        assert_eq!(value[1]["message"], "denied");
    }
}
