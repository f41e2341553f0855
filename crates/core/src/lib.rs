//! Positional argument allocation.
//!
//! A command declares an ordered list of positional slots, each with a
//! minimum and maximum token count. This crate resolves those declarations
//! into a [`SlotTable`], distributes a token list across the slots for a
//! final parse ([`Allocator`]), and works out which slots could take the
//! next token of a partial command line for shell completion
//! ([`Evaluator`]). Both paths share one allocation policy, so they never
//! disagree about which slot owns a token.

#![warn(missing_docs)]

/// Build a diagnostic context map from `key => value` pairs.
macro_rules! ctx {
    ($($k:expr => $v:expr),+ $(,)?) => {
        std::collections::BTreeMap::from([$(($k.into(), $v.into())),+])
    };
}

/// Diagnostics (re-exported from the diagnostics crate).
pub mod diag {
    pub use posarg_diagnostics::{Diagnostic, Severity, Span, codes, explain};
}

/// Sequential allocation for the final parse.
pub mod allocate;
/// Concurrent eligibility evaluation for completion.
pub mod complete;
/// Token cursor shared by both allocation regimes.
pub mod cursor;
/// The unified min/max/drift policy.
pub mod policy;
/// Slot declarations and cumulative bounds.
pub mod table;
/// Typed write targets for claimed tokens.
pub mod value;

// ── Convenience re-exports ──────────────────────────────────────────────────

// Table
pub use table::{Bound, RawSlot, Slot, SlotTable, TableError, TablePolicy, ValueKind};

// Allocation
pub use allocate::{
    AllocError, Allocation, Allocator, Clause, OverflowError, RequiredError, Shortfall, SlotClaim,
};

// Completion
pub use complete::{
    CandidateSource, Completion, CompletionOptions, Evaluator, PathCandidates, SourceError,
    StaticCandidates,
};

// Values
pub use value::{Bindings, ConvertError, Converter, List, Scalar, Value};

// Diagnostics
pub use diag::{Diagnostic, Severity, Span, codes};
