//! Shared test helpers for `posarg_core` integration tests.

#![allow(unreachable_pub)]

use posarg_core::{ConvertError, RawSlot, Slot, SlotTable, TablePolicy};

/// Owned tokens from string literals.
#[allow(dead_code)]
pub fn words(ws: &[&str]) -> Vec<String> {
    ws.iter().map(|w| w.to_string()).collect()
}

/// Build a table with the default policy, panicking on configuration errors.
#[allow(dead_code)]
pub fn table(raws: &[RawSlot]) -> SlotTable {
    SlotTable::build(raws, &TablePolicy::default())
        .unwrap_or_else(|e| panic!("invalid test table: {e}"))
}

/// A converter that accepts every token and records where it went.
#[allow(dead_code)]
pub fn recorder(
    log: &mut Vec<(String, String)>,
) -> impl FnMut(&Slot, &str) -> Result<(), ConvertError> + '_ {
    move |slot: &Slot, token: &str| {
        log.push((slot.name.clone(), token.to_string()));
        Ok(())
    }
}

/// A converter that accepts every token.
#[allow(dead_code)]
pub fn accept_all(_: &Slot, _: &str) -> Result<(), ConvertError> {
    Ok(())
}
