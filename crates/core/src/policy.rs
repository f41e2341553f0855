//! The allocation policy shared by final parsing and completion.
//!
//! Both regimes walk a slot's tokens through [`consume`]; only the
//! [`Mode`] differs. Keeping the min/max/drift arithmetic in one place
//! means a parse and a completion over the same line cannot disagree about
//! which slot a token belongs to.

use log::trace;

use crate::cursor::{Step, TokenCursor};
use crate::table::Slot;

/// How a slot walk treats the cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Final parse: claimed tokens are converted, and the walk leaves
    /// enough tokens for the minimums of later slots.
    Destructive,
    /// Completion: the walk runs on a private snapshot whose leading drift
    /// belongs to predecessors, and nothing is written anywhere.
    Exploratory,
}

/// Walk `slot` over `cursor`, calling `on_claim` for each token it claims.
///
/// Returns the number of tokens the slot claimed. An error from `on_claim`
/// stops the walk immediately.
pub fn consume<'a, E>(
    slot: &Slot,
    cursor: &mut TokenCursor<'a>,
    mode: Mode,
    mut on_claim: impl FnMut(usize, &'a str) -> Result<(), E>,
) -> Result<usize, E> {
    cursor.begin_slot(slot);

    while !cursor.is_empty() {
        let claimed = cursor.claimed_by_slot();
        if slot.is_full(claimed) {
            break;
        }
        if mode == Mode::Destructive
            && claimed >= slot.minimum
            && cursor.reserved_for_successors()
        {
            trace!(
                "`{}` leaves {} token(s) to later slots",
                slot.name,
                cursor.len()
            );
            break;
        }

        match cursor.advance() {
            Some(Step::Claimed { position, token }) => {
                trace!("`{}` claims #{position} {token:?}", slot.name);
                on_claim(position, token)?;
                if !slot.is_collection() {
                    break;
                }
            }
            Some(Step::Drifted) => {}
            None => break,
        }
    }

    Ok(cursor.claimed_by_slot())
}

/// Whether `slot` could still take another token after claiming `parsed`.
pub fn is_eligible(slot: &Slot, parsed: usize) -> bool {
    slot.maximum.is_unbounded() || parsed < slot.minimum || !slot.is_full(parsed)
}
