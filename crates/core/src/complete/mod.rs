//! Concurrent eligibility evaluation for shell completion.
//!
//! Every slot decides on its own, from a private snapshot of the partial
//! command line, whether it could still take another token. The sources of
//! all eligible slots are then invoked and their suggestions merged into a
//! single set. A slot whose task or source fails contributes nothing; the
//! request as a whole never fails.

mod sources;

pub use sources::{CandidateSource, PathCandidates, SourceError, StaticCandidates};

use std::collections::{BTreeSet, HashMap};
use std::convert::Infallible;
use std::sync::Arc;

use log::{debug, warn};
use parking_lot::Mutex;

use crate::cursor::TokenCursor;
use crate::policy::{self, Mode};
use crate::table::{Slot, SlotTable};

/// Result of one completion request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Completion {
    /// Indices of the slots that could take the next token, ascending.
    pub eligible: Vec<usize>,
    /// Merged candidates of those slots.
    pub candidates: BTreeSet<String>,
}

/// Knobs for [`Evaluator`].
#[non_exhaustive]
#[derive(Debug, Clone)]
pub struct CompletionOptions {
    /// Evaluate slots and invoke sources on scoped threads.
    /// When `false`, everything runs on the calling thread, in slot order.
    pub parallel: bool,
    /// Drop candidates equal to a token already on the command line.
    pub filter_present: bool,
}

impl Default for CompletionOptions {
    fn default() -> Self {
        Self {
            parallel: true,
            filter_present: true,
        }
    }
}

/// Works out which slots accept the next token and merges their candidates.
pub struct Evaluator<'t> {
    table: &'t SlotTable,
    sources: HashMap<usize, Arc<dyn CandidateSource>>,
    options: CompletionOptions,
}

impl<'t> Evaluator<'t> {
    /// Evaluator over `table` with no sources registered.
    pub fn new(table: &'t SlotTable) -> Self {
        Self {
            table,
            sources: HashMap::new(),
            options: CompletionOptions::default(),
        }
    }

    /// Register the source for slot `index`, replacing any previous one.
    pub fn with_source(mut self, index: usize, source: Arc<dyn CandidateSource>) -> Self {
        self.sources.insert(index, source);
        self
    }

    /// Register a source for slot `index` unless one is already set.
    ///
    /// Used for sources derived from a slot's value type, which yield to
    /// sources declared explicitly for the slot.
    pub fn with_default_source(mut self, index: usize, source: Arc<dyn CandidateSource>) -> Self {
        self.sources.entry(index).or_insert(source);
        self
    }

    /// Replace the options.
    pub fn with_options(mut self, options: CompletionOptions) -> Self {
        self.options = options;
        self
    }

    /// Indices of the slots that could take the next token, ascending.
    pub fn eligible_slots(&self, partial: &[String]) -> Vec<usize> {
        let eligible = Mutex::new(Vec::new());

        if self.options.parallel {
            let joined = crossbeam::scope(|scope| {
                let tasks: Vec<_> = self
                    .table
                    .slots()
                    .iter()
                    .map(|slot| {
                        let eligible = &eligible;
                        let task = scope.spawn(move |_| {
                            if slot_is_eligible(slot, partial) {
                                eligible.lock().push(slot.index);
                            }
                        });
                        (slot, task)
                    })
                    .collect();
                for (slot, task) in tasks {
                    if task.join().is_err() {
                        warn!("eligibility task for `{}` panicked, skipping", slot.name);
                    }
                }
            });
            if joined.is_err() {
                warn!("eligibility evaluation did not complete");
            }
        } else {
            for slot in self.table.slots() {
                if slot_is_eligible(slot, partial) {
                    eligible.lock().push(slot.index);
                }
            }
        }

        let mut eligible = eligible.into_inner();
        eligible.sort_unstable();
        debug!("eligible slots for {} token(s): {eligible:?}", partial.len());
        eligible
    }

    /// Merged candidates of every eligible slot.
    pub fn evaluate(&self, partial: &[String]) -> BTreeSet<String> {
        self.complete(partial).candidates
    }

    /// Eligible slots and their merged candidates, from a single pass.
    pub fn complete(&self, partial: &[String]) -> Completion {
        let eligible = self.eligible_slots(partial);
        let registered: Vec<(&Slot, &Arc<dyn CandidateSource>)> = eligible
            .iter()
            .filter_map(|&index| {
                let slot = self.table.get(index)?;
                self.sources.get(&index).map(|source| (slot, source))
            })
            .collect();

        let merged = Mutex::new(BTreeSet::new());
        let collect = |slot: &Slot, source: &Arc<dyn CandidateSource>| match source
            .candidates(partial)
        {
            Ok(found) => {
                let mut merged = merged.lock();
                for candidate in found {
                    if self.options.filter_present && partial.contains(&candidate) {
                        continue;
                    }
                    merged.insert(candidate);
                }
            }
            Err(e) => warn!("candidate source for `{}` failed: {e}", slot.name),
        };

        if self.options.parallel {
            let joined = crossbeam::scope(|scope| {
                let tasks: Vec<_> = registered
                    .iter()
                    .map(|&(slot, source)| {
                        let collect = &collect;
                        (slot, scope.spawn(move |_| collect(slot, source)))
                    })
                    .collect();
                for (slot, task) in tasks {
                    if task.join().is_err() {
                        warn!("candidate source for `{}` panicked, skipping", slot.name);
                    }
                }
            });
            if joined.is_err() {
                warn!("candidate collection did not complete");
            }
        } else {
            for &(slot, source) in &registered {
                collect(slot, source);
            }
        }

        Completion {
            eligible,
            candidates: merged.into_inner(),
        }
    }
}

/// Whether `slot` could take the next token after `partial`.
fn slot_is_eligible(slot: &Slot, partial: &[String]) -> bool {
    if partial.len() < slot.start_min {
        return false;
    }
    let mut cursor = TokenCursor::snapshot(partial, slot);
    let Ok(parsed) = policy::consume::<Infallible>(slot, &mut cursor, Mode::Exploratory, |_, _| {
        Ok(())
    });
    policy::is_eligible(slot, parsed)
}
