//! Mutable view over the tokens still to be claimed.

use crate::table::Slot;

/// Outcome of advancing a [`TokenCursor`] by one token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step<'a> {
    /// The current slot claimed the token at `position`.
    Claimed {
        /// Index of the token in the full token list.
        position: usize,
        /// The token itself.
        token: &'a str,
    },
    /// The token was attributed to a predecessor that may still be open.
    Drifted,
}

/// Parse state for one traversal over a token list.
///
/// A destructive cursor ([`TokenCursor::new`]) is shared by every slot of a
/// sequential allocation and keeps the running counters across slots. An
/// exploratory cursor ([`TokenCursor::snapshot`]) is private to a single
/// slot's completion task and starts at that slot's earliest position.
#[derive(Debug, Clone)]
pub struct TokenCursor<'a> {
    tokens: &'a [String],
    pos: usize,
    claimed_globally: usize,
    claimed_by_slot: usize,
    /// Tokens still owed to the minimums of the current and following slots.
    still_required: usize,
    /// Part of `still_required` owed to the current slot.
    owed: usize,
    drift: usize,
}

impl<'a> TokenCursor<'a> {
    /// Cursor over the full token list, owing `total_min` tokens overall.
    pub fn new(tokens: &'a [String], total_min: usize) -> Self {
        Self {
            tokens,
            pos: 0,
            claimed_globally: 0,
            claimed_by_slot: 0,
            still_required: total_min,
            owed: 0,
            drift: 0,
        }
    }

    /// Private window for `slot`, starting at its `start_min`, with its
    /// drift charged to predecessors before any token counts as its own.
    pub fn snapshot(tokens: &'a [String], slot: &Slot) -> Self {
        let pos = slot.start_min.min(tokens.len());
        Self {
            tokens,
            pos,
            claimed_globally: pos,
            claimed_by_slot: 0,
            still_required: 0,
            owed: 0,
            drift: slot.drift(),
        }
    }

    /// Reset the per-slot counters before `slot` takes its turn.
    pub fn begin_slot(&mut self, slot: &Slot) {
        self.claimed_by_slot = 0;
        self.owed = slot.minimum;
    }

    /// Tokens not yet claimed.
    pub fn remaining(&self) -> &'a [String] {
        &self.tokens[self.pos..]
    }

    /// Number of tokens not yet claimed.
    pub fn len(&self) -> usize {
        self.tokens.len() - self.pos
    }

    /// Whether every token has been claimed.
    pub fn is_empty(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    /// Index of the next token in the full list.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Tokens claimed by any slot so far.
    pub fn claimed_globally(&self) -> usize {
        self.claimed_globally
    }

    /// Tokens claimed by the current slot.
    pub fn claimed_by_slot(&self) -> usize {
        self.claimed_by_slot
    }

    /// Tokens still owed to the minimums of the current and following slots.
    pub fn still_required(&self) -> usize {
        self.still_required
    }

    /// Remaining ambiguous tokens to attribute to predecessors.
    pub fn drift(&self) -> usize {
        self.drift
    }

    /// Whether every remaining token is needed by the minimums of the
    /// slots after the current one.
    pub fn reserved_for_successors(&self) -> bool {
        self.len() <= self.still_required.saturating_sub(self.owed)
    }

    /// Take the next token, or `None` when exhausted.
    pub fn advance(&mut self) -> Option<Step<'a>> {
        let token = self.tokens.get(self.pos)?;
        let position = self.pos;
        self.pos += 1;
        self.claimed_globally += 1;

        if self.drift > 0 {
            self.drift -= 1;
            return Some(Step::Drifted);
        }

        self.claimed_by_slot += 1;
        if self.owed > 0 {
            self.owed -= 1;
            self.still_required = self.still_required.saturating_sub(1);
        }
        Some(Step::Claimed {
            position,
            token: token.as_str(),
        })
    }
}
