use std::fmt;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::diag::{Diagnostic, codes};

/// Whether a slot binds a single token or a list of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    /// Exactly one value; never claims more than one token.
    Scalar,
    /// A list of values; may claim any number of tokens within its bounds.
    Collection,
}

/// Upper bound on the number of tokens a slot may claim.
///
/// Serializes as a plain integer, or `null` when unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Option<usize>", into = "Option<usize>")]
pub enum Bound {
    /// At most this many tokens (`0` disables the slot).
    Exactly(usize),
    /// No upper limit. Only the last slot of a table may be unbounded.
    Unbounded,
}

impl Bound {
    /// The bound as a number, `None` when unbounded.
    pub fn get(self) -> Option<usize> {
        match self {
            Bound::Exactly(n) => Some(n),
            Bound::Unbounded => None,
        }
    }

    /// Whether there is no upper limit.
    pub fn is_unbounded(self) -> bool {
        matches!(self, Bound::Unbounded)
    }

    /// Whether `count` tokens already reach this bound.
    pub fn is_reached_by(self, count: usize) -> bool {
        match self {
            Bound::Exactly(n) => count >= n,
            Bound::Unbounded => false,
        }
    }
}

impl From<Option<usize>> for Bound {
    fn from(value: Option<usize>) -> Self {
        value.map_or(Bound::Unbounded, Bound::Exactly)
    }
}

impl From<Bound> for Option<usize> {
    fn from(value: Bound) -> Self {
        value.get()
    }
}

impl fmt::Display for Bound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bound::Exactly(n) => write!(f, "{n}"),
            Bound::Unbounded => write!(f, "*"),
        }
    }
}

/// A positional slot as declared by a schema, before bounds are resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawSlot {
    /// Display name used in diagnostics.
    pub name: String,
    /// Requirement spec: `"N"` (minimum) or `"N-M"` (minimum and maximum).
    /// `None` or an empty string applies the defaults for the slot kind.
    pub required: Option<String>,
    /// Scalar or collection.
    pub kind: ValueKind,
}

impl RawSlot {
    /// A scalar slot with default requirements.
    pub fn scalar(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            required: None,
            kind: ValueKind::Scalar,
        }
    }

    /// A collection slot with default requirements.
    pub fn collection(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            required: None,
            kind: ValueKind::Collection,
        }
    }

    /// Set the requirement spec (builder pattern).
    pub fn with_required(mut self, spec: impl Into<String>) -> Self {
        self.required = Some(spec.into());
        self
    }
}

/// One resolved positional slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Slot {
    /// 0-based declaration order.
    pub index: usize,
    /// Display name used in diagnostics.
    pub name: String,
    /// Smallest number of tokens this slot must receive.
    pub minimum: usize,
    /// Largest number of tokens this slot may receive.
    pub maximum: Bound,
    /// Sum of the minimums of all preceding slots.
    pub start_min: usize,
    /// Sum of the bounded maximums of all preceding slots, never below `start_min`.
    pub start_max: usize,
    /// Scalar or collection.
    pub kind: ValueKind,
}

impl Slot {
    /// Whether the slot binds a list.
    pub fn is_collection(&self) -> bool {
        self.kind == ValueKind::Collection
    }

    /// Whether the slot must receive at least one token.
    pub fn is_required(&self) -> bool {
        self.minimum > 0
    }

    /// Whether the slot is explicitly disabled (`maximum == 0`).
    pub fn is_disabled(&self) -> bool {
        self.maximum == Bound::Exactly(0)
    }

    /// Whether `claimed` tokens fill the slot.
    pub fn is_full(&self, claimed: usize) -> bool {
        self.maximum.is_reached_by(claimed)
    }

    /// Width of the token window whose ownership is ambiguous between this
    /// slot and its predecessors.
    pub fn drift(&self) -> usize {
        self.start_max - self.start_min
    }
}

/// Table-wide settings supplied by the schema.
#[non_exhaustive]
#[derive(Debug, Clone, Default)]
pub struct TablePolicy {
    /// Every scalar slot without an explicit spec is required (`1-1`).
    pub required_all: bool,
}

impl TablePolicy {
    /// Policy with `required_all` enabled.
    pub fn required_all() -> Self {
        Self { required_all: true }
    }
}

/// Configuration errors raised while building a [`SlotTable`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum TableError {
    /// A requirement spec is not `N` or `N-M`.
    #[error("invalid required range {spec:?} for `{slot}`: {reason}")]
    InvalidRange {
        /// Owning slot.
        slot: String,
        /// The spec as written.
        spec: String,
        /// What is wrong with it.
        reason: String,
    },

    /// A `N-M` spec with `N > M`.
    #[error("`{slot}` requires at least {minimum} but at most {maximum} arguments")]
    MinExceedsMax {
        /// Owning slot.
        slot: String,
        /// Declared minimum.
        minimum: usize,
        /// Declared maximum.
        maximum: usize,
    },

    /// An unbounded slot followed by another slot.
    #[error("`{slot}` accepts unlimited arguments but is followed by `{next}`")]
    UnboundedNotLast {
        /// The unbounded slot.
        slot: String,
        /// The slot declared right after it.
        next: String,
    },
}

impl TableError {
    /// Convert into a diagnostic with a stable code.
    pub fn to_diagnostic(&self) -> Diagnostic {
        let message = self.to_string();
        match self {
            TableError::InvalidRange { slot, spec, reason } => {
                Diagnostic::error(codes::INVALID_RANGE, message, None).with_context(ctx!(
                    "slot" => slot.as_str(),
                    "spec" => spec.as_str(),
                    "reason" => reason.as_str(),
                ))
            }
            TableError::MinExceedsMax {
                slot,
                minimum,
                maximum,
            } => Diagnostic::error(codes::MIN_EXCEEDS_MAX, message, None).with_context(ctx!(
                "slot" => slot.as_str(),
                "minimum" => minimum.to_string(),
                "maximum" => maximum.to_string(),
            )),
            TableError::UnboundedNotLast { slot, next } => {
                Diagnostic::error(codes::UNBOUNDED_NOT_LAST, message, None).with_context(ctx!(
                    "slot" => slot.as_str(),
                    "next" => next.as_str(),
                ))
            }
        }
    }
}

/// The ordered, immutable list of positional slots for one command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlotTable {
    slots: Vec<Slot>,
    total_min: usize,
    total_max: Option<usize>,
}

impl SlotTable {
    /// Resolve requirements and cumulative bounds for `raws`, in order.
    ///
    /// Fails on the first malformed spec, or when an unbounded slot is not
    /// the last one.
    pub fn build(raws: &[RawSlot], policy: &TablePolicy) -> Result<Self, TableError> {
        let mut slots = Vec::with_capacity(raws.len());
        let mut total_min = 0usize;
        let mut bounded_max = 0usize;
        let mut unbounded: Option<&str> = None;

        for (index, raw) in raws.iter().enumerate() {
            if let Some(prev) = unbounded {
                return Err(TableError::UnboundedNotLast {
                    slot: prev.to_string(),
                    next: raw.name.clone(),
                });
            }

            let (minimum, maximum) = resolve_requirements(raw, policy)?;
            let slot = Slot {
                index,
                name: raw.name.clone(),
                minimum,
                maximum,
                start_min: total_min,
                start_max: bounded_max.max(total_min),
                kind: raw.kind,
            };
            debug!(
                "slot {} `{}`: {}..{} starts at {}..{}",
                slot.index, slot.name, slot.minimum, slot.maximum, slot.start_min, slot.start_max
            );

            let too_large = || TableError::InvalidRange {
                slot: raw.name.clone(),
                spec: raw.required.clone().unwrap_or_default(),
                reason: "range too large".to_string(),
            };
            total_min = total_min.checked_add(minimum).ok_or_else(too_large)?;
            match maximum {
                Bound::Exactly(n) => {
                    bounded_max = bounded_max.checked_add(n).ok_or_else(too_large)?;
                }
                Bound::Unbounded => unbounded = Some(&raw.name),
            }
            slots.push(slot);
        }

        Ok(Self {
            slots,
            total_min,
            total_max: unbounded.is_none().then_some(bounded_max),
        })
    }

    /// All slots in declaration order.
    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    /// Slot by index.
    pub fn get(&self, index: usize) -> Option<&Slot> {
        self.slots.get(index)
    }

    /// Slot by name.
    pub fn find(&self, name: &str) -> Option<&Slot> {
        self.slots.iter().find(|s| s.name == name)
    }

    /// Number of slots.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether the table has no slots.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// The last declared slot.
    pub fn last(&self) -> Option<&Slot> {
        self.slots.last()
    }

    /// Sum of all minimums.
    pub fn total_min(&self) -> usize {
        self.total_min
    }

    /// Sum of all maximums, `None` when the last slot is unbounded.
    pub fn total_max(&self) -> Option<usize> {
        self.total_max
    }
}

/// Minimum and maximum for one raw slot, after kind defaults and pinning.
fn resolve_requirements(raw: &RawSlot, policy: &TablePolicy) -> Result<(usize, Bound), TableError> {
    let spec = raw.required.as_deref().map(str::trim).unwrap_or("");
    let parsed = if spec.is_empty() {
        None
    } else {
        Some(parse_range(&raw.name, spec)?)
    };

    let resolved = match (raw.kind, parsed) {
        (ValueKind::Scalar, None) if policy.required_all => (1, Bound::Exactly(1)),
        (ValueKind::Scalar, None) => (0, Bound::Exactly(1)),
        (ValueKind::Scalar, Some((_, Bound::Exactly(0)))) => (0, Bound::Exactly(0)),
        (ValueKind::Scalar, Some((min, _))) => (min.min(1), Bound::Exactly(1)),
        (ValueKind::Collection, None) => (0, Bound::Unbounded),
        (ValueKind::Collection, Some(range)) => range,
    };
    Ok(resolved)
}

/// Parse `"N"` or `"N-M"`.
fn parse_range(slot: &str, spec: &str) -> Result<(usize, Bound), TableError> {
    let invalid = |reason: &str| TableError::InvalidRange {
        slot: slot.to_string(),
        spec: spec.to_string(),
        reason: reason.to_string(),
    };
    let number = |part: &str| {
        part.trim()
            .parse::<usize>()
            .map_err(|_| invalid(&format!("{:?} is not a non-negative integer", part.trim())))
    };

    let mut parts = spec.split('-');
    let min = number(parts.next().unwrap_or(""))?;
    let Some(max_part) = parts.next() else {
        return Ok((min, Bound::Unbounded));
    };
    if parts.next().is_some() {
        return Err(invalid("expected at most one '-'"));
    }

    let max = number(max_part)?;
    if min > max {
        return Err(TableError::MinExceedsMax {
            slot: slot.to_string(),
            minimum: min,
            maximum: max,
        });
    }
    Ok((min, Bound::Exactly(max)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(raws: &[RawSlot]) -> SlotTable {
        SlotTable::build(raws, &TablePolicy::default()).unwrap()
    }

    #[test]
    fn scalar_defaults_to_optional_single() {
        let t = build(&[RawSlot::scalar("a")]);
        let s = &t.slots()[0];
        assert_eq!((s.minimum, s.maximum), (0, Bound::Exactly(1)));
    }

    #[test]
    fn required_all_pins_untagged_scalars() {
        let t = SlotTable::build(
            &[RawSlot::scalar("a"), RawSlot::collection("rest")],
            &TablePolicy::required_all(),
        )
        .unwrap();
        assert_eq!(t.slots()[0].minimum, 1);
        assert_eq!(t.slots()[0].maximum, Bound::Exactly(1));
        // Collections are not affected by the policy.
        assert_eq!(t.slots()[1].minimum, 0);
        assert_eq!(t.slots()[1].maximum, Bound::Unbounded);
    }

    #[test]
    fn collection_defaults_to_unbounded() {
        let t = build(&[RawSlot::collection("files")]);
        let s = &t.slots()[0];
        assert_eq!((s.minimum, s.maximum), (0, Bound::Unbounded));
        assert_eq!(t.total_max(), None);
    }

    #[test]
    fn bare_minimum_on_collection_stays_unbounded() {
        let t = build(&[RawSlot::collection("files").with_required("2")]);
        assert_eq!(t.slots()[0].minimum, 2);
        assert_eq!(t.slots()[0].maximum, Bound::Unbounded);
    }

    #[test]
    fn scalar_minimum_is_pinned_to_one() {
        let t = build(&[
            RawSlot::scalar("a").with_required("3"),
            RawSlot::scalar("b").with_required("1-4"),
        ]);
        for s in t.slots() {
            assert_eq!((s.minimum, s.maximum), (1, Bound::Exactly(1)), "{}", s.name);
        }
    }

    #[test]
    fn scalar_zero_range_disables_slot() {
        let t = build(&[RawSlot::scalar("off").with_required("0-0")]);
        assert!(t.slots()[0].is_disabled());
        assert_eq!(t.total_max(), Some(0));
    }

    #[test]
    fn explicit_range_with_whitespace() {
        let t = build(&[RawSlot::collection("xs").with_required(" 1 - 3 ")]);
        assert_eq!(t.slots()[0].minimum, 1);
        assert_eq!(t.slots()[0].maximum, Bound::Exactly(3));
    }

    #[test]
    fn cumulative_bounds() {
        let t = build(&[
            RawSlot::collection("a").with_required("1-2"),
            RawSlot::scalar("b").with_required("1"),
            RawSlot::collection("c").with_required("0-3"),
            RawSlot::collection("d"),
        ]);
        let starts: Vec<_> = t.slots().iter().map(|s| (s.start_min, s.start_max)).collect();
        assert_eq!(starts, vec![(0, 0), (1, 2), (2, 3), (2, 6)]);
        assert_eq!(t.total_min(), 2);
        assert_eq!(t.total_max(), None);
        assert_eq!(t.slots()[3].drift(), 4);
    }

    #[test]
    fn start_max_never_below_start_min() {
        let t = build(&[
            RawSlot::scalar("off").with_required("0-0"),
            RawSlot::scalar("a").with_required("1"),
            RawSlot::scalar("b"),
        ]);
        for s in t.slots() {
            assert!(s.start_max >= s.start_min, "{}", s.name);
        }
        assert_eq!(t.total_max(), Some(2));
    }

    #[test]
    fn malformed_ranges_are_rejected() {
        for spec in ["x", "1-y", "1-2-3", "-1", "1.5"] {
            let err = SlotTable::build(
                &[RawSlot::collection("xs").with_required(spec)],
                &TablePolicy::default(),
            )
            .unwrap_err();
            assert!(
                matches!(err, TableError::InvalidRange { ref slot, .. } if slot == "xs"),
                "{spec}: {err:?}"
            );
        }
    }

    #[test]
    fn cumulative_overflow_is_rejected() {
        let huge = usize::MAX.to_string();
        let cases = [
            [
                RawSlot::collection("a").with_required(format!("0-{huge}")),
                RawSlot::collection("b").with_required(format!("0-{huge}")),
            ],
            [
                RawSlot::collection("a").with_required(format!("{huge}-{huge}")),
                RawSlot::collection("b").with_required("1"),
            ],
        ];
        for raws in cases {
            let err = SlotTable::build(&raws, &TablePolicy::default()).unwrap_err();
            assert!(
                matches!(err, TableError::InvalidRange { ref slot, ref reason, .. }
                    if slot == "b" && reason == "range too large"),
                "{err:?}"
            );
            assert_eq!(err.to_diagnostic().id, codes::INVALID_RANGE);
        }
    }

    #[test]
    fn inverted_range_is_rejected() {
        let err = SlotTable::build(
            &[RawSlot::collection("xs").with_required("3-1")],
            &TablePolicy::default(),
        )
        .unwrap_err();
        assert_eq!(
            err,
            TableError::MinExceedsMax {
                slot: "xs".into(),
                minimum: 3,
                maximum: 1
            }
        );
        assert_eq!(err.to_diagnostic().id, codes::MIN_EXCEEDS_MAX);
    }

    #[test]
    fn unbounded_slot_must_be_last() {
        let err = SlotTable::build(
            &[RawSlot::collection("files"), RawSlot::scalar("dest")],
            &TablePolicy::default(),
        )
        .unwrap_err();
        assert!(matches!(err, TableError::UnboundedNotLast { .. }));
        let d = err.to_diagnostic();
        assert_eq!(d.id, codes::UNBOUNDED_NOT_LAST);
        assert_eq!(d.context.unwrap()["next"], "dest");
    }

    #[test]
    fn bound_serializes_as_optional_number() {
        assert_eq!(serde_json::to_string(&Bound::Exactly(2)).unwrap(), "2");
        assert_eq!(serde_json::to_string(&Bound::Unbounded).unwrap(), "null");
    }
}
