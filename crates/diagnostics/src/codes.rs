//! Diagnostic ID constants.
//!
//! Use these instead of string literals to get compile-time typo detection
//! and IDE autocomplete. `PA1xxx` codes are raised while allocating tokens,
//! `PA2xxx` codes while building a slot table or loading a schema.

// ── Allocation ──────────────────────────────────────────────────────────

/// One or more positional slots did not receive their minimum token count.
pub const REQUIRED_MISSING: &str = "PA1001";

/// The final bounded positional slot is full but tokens remain.
pub const TOO_MANY: &str = "PA1002";

/// A token could not be converted into its slot's value.
pub const CONVERSION_FAILED: &str = "PA1003";

// ── Configuration ───────────────────────────────────────────────────────

/// A slot's `required` range could not be parsed.
pub const INVALID_RANGE: &str = "PA2001";

/// An unbounded slot was declared before another slot.
pub const UNBOUNDED_NOT_LAST: &str = "PA2002";

/// An explicit range declares a minimum above its maximum.
pub const MIN_EXCEEDS_MAX: &str = "PA2003";

/// A positional schema document is structurally invalid.
pub const SCHEMA_INVALID: &str = "PA2101";

/// Every known code, in declaration order.
pub const ALL: &[&str] = &[
    REQUIRED_MISSING,
    TOO_MANY,
    CONVERSION_FAILED,
    INVALID_RANGE,
    UNBOUNDED_NOT_LAST,
    MIN_EXCEEDS_MAX,
    SCHEMA_INVALID,
];
