//! Sequential allocation of a complete token list onto positional slots.

use std::collections::BTreeMap;
use std::fmt;
use std::ops::Range;

use log::debug;
use serde::Serialize;

use crate::cursor::TokenCursor;
use crate::diag::{Diagnostic, Span, codes};
use crate::policy::{self, Mode};
use crate::table::{Bound, Slot, SlotTable};
use crate::value::{ConvertError, Converter};

/// Tokens claimed by one slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlotClaim {
    /// Slot index.
    pub index: usize,
    /// Slot name.
    pub name: String,
    /// Indices of the claimed tokens in the input list.
    pub tokens: Range<usize>,
}

/// Result of a successful [`Allocator::allocate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Allocation {
    /// One entry per slot, in slot order.
    pub claims: Vec<SlotClaim>,
    /// Tokens no slot claimed, to be handed to the command itself.
    pub remainder: Vec<String>,
}

impl Allocation {
    /// Total number of tokens claimed by slots.
    pub fn claimed(&self) -> usize {
        self.claims.iter().map(|c| c.tokens.len()).sum()
    }

    /// Claim for slot `index`.
    pub fn claim(&self, index: usize) -> Option<&SlotClaim> {
        self.claims.get(index)
    }

    /// The tokens slot `index` claimed out of `tokens` (the allocated input).
    pub fn tokens_for<'t>(&self, tokens: &'t [String], index: usize) -> &'t [String] {
        self.claim(index)
            .and_then(|c| tokens.get(c.tokens.clone()))
            .unwrap_or(&[])
    }
}

/// Why a slot appears in a [`RequiredError`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Shortfall {
    /// A scalar slot received nothing.
    Missing,
    /// A collection slot received fewer than `minimum` tokens.
    AtLeast {
        /// Declared minimum.
        minimum: usize,
        /// Tokens actually received.
        got: usize,
    },
    /// A collection slot was offered more than `maximum` tokens.
    AtMost {
        /// Declared maximum.
        maximum: usize,
        /// Tokens offered.
        got: usize,
    },
    /// A disabled slot was offered tokens.
    Zero,
}

/// One slot's entry in a requirement message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clause {
    /// Slot index.
    pub index: usize,
    /// Slot name.
    pub slot: String,
    /// What is wrong.
    pub shortfall: Shortfall,
}

fn arguments(n: usize) -> &'static str {
    if n == 1 { "argument" } else { "arguments" }
}

impl fmt::Display for Clause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.shortfall {
            Shortfall::Missing => write!(f, "`{}`", self.slot),
            Shortfall::AtLeast { minimum, .. } => {
                write!(f, "`{} (at least {minimum} {})`", self.slot, arguments(minimum))
            }
            Shortfall::AtMost { maximum, .. } => {
                write!(f, "`{} (at most {maximum} {})`", self.slot, arguments(maximum))
            }
            Shortfall::Zero => write!(f, "`{} (zero arguments)`", self.slot),
        }
    }
}

/// Join clauses as `a`, `a and b`, `a, b and c`.
fn join_clauses(clauses: &[Clause]) -> String {
    let rendered: Vec<String> = clauses.iter().map(Clause::to_string).collect();
    match rendered.split_last() {
        Some((last, [])) => last.clone(),
        Some((last, rest)) => format!("{} and {last}", rest.join(", ")),
        None => String::new(),
    }
}

/// One or more slots are still short of their minimum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequiredError {
    /// Deficient slots, from the first failing one onward.
    pub clauses: Vec<Clause>,
    /// Token position at which allocation stopped.
    pub position: usize,
}

impl fmt::Display for RequiredError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.clauses.len() == 1 {
            write!(
                f,
                "required argument: {} was not provided",
                join_clauses(&self.clauses)
            )
        } else {
            write!(
                f,
                "required arguments: {} were not provided",
                join_clauses(&self.clauses)
            )
        }
    }
}

impl std::error::Error for RequiredError {}

/// The last bounded slot is full but tokens remain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverflowError {
    /// The full slot.
    pub clause: Clause,
    /// Tokens left over.
    pub extra: Span,
}

impl fmt::Display for OverflowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "too many arguments: expected {}", self.clause)
    }
}

impl std::error::Error for OverflowError {}

/// Errors from [`Allocator::allocate`].
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum AllocError {
    /// Slots did not receive their minimum.
    #[error(transparent)]
    Required(RequiredError),

    /// Tokens remain after the last bounded slot filled up.
    #[error(transparent)]
    Overflow(OverflowError),

    /// The converter rejected a token.
    #[error("invalid value for `{slot}`: {source}")]
    Convert {
        /// Slot name.
        slot: String,
        /// Slot index.
        index: usize,
        /// The rejected token.
        token: String,
        /// Token index in the input.
        position: usize,
        /// The converter's error, unchanged.
        #[source]
        source: ConvertError,
    },
}

impl AllocError {
    /// Convert into a diagnostic pointing at the offending tokens.
    pub fn to_diagnostic(&self) -> Diagnostic {
        let message = self.to_string();
        match self {
            AllocError::Required(e) => {
                let slots: Vec<&str> = e.clauses.iter().map(|c| c.slot.as_str()).collect();
                Diagnostic::error(
                    codes::REQUIRED_MISSING,
                    message,
                    Some(Span::empty(e.position)),
                )
                .with_context(ctx!("slots" => slots.join(",")))
            }
            AllocError::Overflow(e) => {
                let mut ctx: BTreeMap<String, String> = ctx!(
                    "slot" => e.clause.slot.as_str(),
                    "extra" => e.extra.len().to_string(),
                );
                if let Shortfall::AtMost { maximum, .. } = e.clause.shortfall {
                    ctx.insert("maximum".into(), maximum.to_string());
                }
                Diagnostic::error(codes::TOO_MANY, message, Some(e.extra)).with_context(ctx)
            }
            AllocError::Convert {
                slot,
                token,
                position,
                ..
            } => Diagnostic::error(
                codes::CONVERSION_FAILED,
                message,
                Some(Span::new(*position, position + 1)),
            )
            .with_context(ctx!(
                "slot" => slot.as_str(),
                "token" => token.as_str(),
            )),
        }
    }
}

/// Walks slots in declaration order and distributes a complete token list.
#[derive(Debug, Clone, Copy)]
pub struct Allocator<'t> {
    table: &'t SlotTable,
}

impl<'t> Allocator<'t> {
    /// Allocator over `table`.
    pub fn new(table: &'t SlotTable) -> Self {
        Self { table }
    }

    /// Distribute `tokens` over the slots, converting each claimed token.
    ///
    /// Each slot claims as many tokens as its maximum allows while leaving
    /// enough for the minimums of the slots after it. The first converter
    /// error, or the first slot left short, aborts the walk.
    pub fn allocate(
        &self,
        tokens: &[String],
        converter: &mut dyn Converter,
    ) -> Result<Allocation, AllocError> {
        let mut cursor = TokenCursor::new(tokens, self.table.total_min());
        let mut claims = Vec::with_capacity(self.table.len());

        for slot in self.table.slots() {
            let start = cursor.position();
            let claimed = policy::consume(slot, &mut cursor, Mode::Destructive, |position, token| {
                converter
                    .convert(slot, token)
                    .map_err(|source| AllocError::Convert {
                        slot: slot.name.clone(),
                        index: slot.index,
                        token: token.to_string(),
                        position,
                        source,
                    })
            })?;
            debug!(
                "`{}` claimed {claimed} token(s), {} left",
                slot.name,
                cursor.len()
            );

            if claimed < slot.minimum {
                return Err(AllocError::Required(self.required_error(
                    slot,
                    claimed,
                    cursor.position(),
                )));
            }
            claims.push(SlotClaim {
                index: slot.index,
                name: slot.name.clone(),
                tokens: start..cursor.position(),
            });
        }

        let remainder = cursor.remaining().to_vec();
        if let Some(err) = self.overflow(&claims, tokens.len(), remainder.len()) {
            return Err(AllocError::Overflow(err));
        }
        Ok(Allocation { claims, remainder })
    }

    /// Every required, deficient slot from `failed` onward.
    fn required_error(&self, failed: &Slot, claimed: usize, position: usize) -> RequiredError {
        let clauses = self.table.slots()[failed.index..]
            .iter()
            .filter(|slot| slot.is_required())
            .filter_map(|slot| {
                let got = if slot.index == failed.index { claimed } else { 0 };
                shortfall(slot, got).map(|shortfall| Clause {
                    index: slot.index,
                    slot: slot.name.clone(),
                    shortfall,
                })
            })
            .collect();
        RequiredError { clauses, position }
    }

    /// A full, bounded last slot with tokens still left.
    fn overflow(&self, claims: &[SlotClaim], total: usize, left: usize) -> Option<OverflowError> {
        let last = self.table.last()?;
        let Bound::Exactly(maximum) = last.maximum else {
            return None;
        };
        let claimed = claims.last().map_or(0, |c| c.tokens.len());
        if left == 0 || claimed != maximum || !(last.is_collection() || maximum == 0) {
            return None;
        }
        let shortfall = if maximum == 0 {
            Shortfall::Zero
        } else {
            Shortfall::AtMost {
                maximum,
                got: claimed + left,
            }
        };
        Some(OverflowError {
            clause: Clause {
                index: last.index,
                slot: last.name.clone(),
                shortfall,
            },
            extra: Span::new(total - left, total),
        })
    }
}

/// How `slot` falls short after receiving `got` tokens, if it does.
fn shortfall(slot: &Slot, got: usize) -> Option<Shortfall> {
    if !slot.is_collection() {
        return (got < slot.minimum).then_some(Shortfall::Missing);
    }
    if got < slot.minimum {
        return Some(Shortfall::AtLeast {
            minimum: slot.minimum,
            got,
        });
    }
    match slot.maximum {
        Bound::Exactly(maximum) if got > maximum => Some(if maximum == 0 {
            Shortfall::Zero
        } else {
            Shortfall::AtMost { maximum, got }
        }),
        _ => None,
    }
}
