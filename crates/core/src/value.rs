//! Write targets for converted tokens.
//!
//! The allocator never looks inside a slot's value: it hands each claimed
//! token to a [`Converter`], which is usually a [`Bindings`] holding one
//! [`Value`] per slot.

use std::error::Error as StdError;
use std::fmt::Display;
use std::str::FromStr;

use crate::table::{Slot, ValueKind};

/// A token could not be converted into a slot's value.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct ConvertError {
    message: String,
    #[source]
    source: Option<Box<dyn StdError + Send + Sync>>,
}

impl ConvertError {
    /// Error with a message only.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Error wrapping an underlying cause.
    pub fn with_source(
        message: impl Into<String>,
        source: impl Into<Box<dyn StdError + Send + Sync>>,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// The error message, without the cause.
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// An opaque, typed write handle for one slot.
pub trait Value {
    /// Scalar or collection.
    fn kind(&self) -> ValueKind;

    /// Number of elements written so far (0 or 1 for scalars).
    fn len(&self) -> usize;

    /// Whether nothing has been written yet.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Convert `token` and store it as the next element.
    fn write_next(&mut self, token: &str) -> Result<(), ConvertError>;
}

impl<V: Value + ?Sized> Value for Box<V> {
    fn kind(&self) -> ValueKind {
        (**self).kind()
    }

    fn len(&self) -> usize {
        (**self).len()
    }

    fn write_next(&mut self, token: &str) -> Result<(), ConvertError> {
        (**self).write_next(token)
    }
}

fn parse_token<T>(token: &str) -> Result<T, ConvertError>
where
    T: FromStr,
    T::Err: Display,
{
    token
        .parse::<T>()
        .map_err(|e| ConvertError::new(format!("invalid value {token:?}: {e}")))
}

/// A single value parsed with [`FromStr`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scalar<T>(Option<T>);

impl<T> Scalar<T> {
    /// An empty target.
    pub fn new() -> Self {
        Self(None)
    }

    /// The stored value, if any.
    pub fn get(&self) -> Option<&T> {
        self.0.as_ref()
    }

    /// Take the stored value.
    pub fn into_inner(self) -> Option<T> {
        self.0
    }
}

impl<T> Default for Scalar<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Value for Scalar<T>
where
    T: FromStr,
    T::Err: Display,
{
    fn kind(&self) -> ValueKind {
        ValueKind::Scalar
    }

    fn len(&self) -> usize {
        usize::from(self.0.is_some())
    }

    fn write_next(&mut self, token: &str) -> Result<(), ConvertError> {
        self.0 = Some(parse_token(token)?);
        Ok(())
    }
}

/// A list of values parsed with [`FromStr`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct List<T>(Vec<T>);

impl<T> List<T> {
    /// An empty target.
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// The stored values.
    pub fn as_slice(&self) -> &[T] {
        &self.0
    }

    /// Take the stored values.
    pub fn into_inner(self) -> Vec<T> {
        self.0
    }
}

impl<T> Default for List<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Value for List<T>
where
    T: FromStr,
    T::Err: Display,
{
    fn kind(&self) -> ValueKind {
        ValueKind::Collection
    }

    fn len(&self) -> usize {
        self.0.len()
    }

    fn write_next(&mut self, token: &str) -> Result<(), ConvertError> {
        self.0.push(parse_token(token)?);
        Ok(())
    }
}

/// Converts claimed tokens into slot values.
///
/// Called once per claimed token, in slot order, never concurrently.
pub trait Converter {
    /// Convert `token` into the value bound to `slot`.
    fn convert(&mut self, slot: &Slot, token: &str) -> Result<(), ConvertError>;
}

impl<F> Converter for F
where
    F: FnMut(&Slot, &str) -> Result<(), ConvertError>,
{
    fn convert(&mut self, slot: &Slot, token: &str) -> Result<(), ConvertError> {
        self(slot, token)
    }
}

/// One value per slot, indexed by slot index.
#[derive(Debug, Default)]
pub struct Bindings<V> {
    values: Vec<V>,
}

impl<V: Value> Bindings<V> {
    /// Bind `values[i]` to slot `i`.
    pub fn new(values: Vec<V>) -> Self {
        Self { values }
    }

    /// Value bound to slot `index`.
    pub fn get(&self, index: usize) -> Option<&V> {
        self.values.get(index)
    }

    /// All bound values, in slot order.
    pub fn values(&self) -> &[V] {
        &self.values
    }

    /// Take the bound values.
    pub fn into_inner(self) -> Vec<V> {
        self.values
    }
}

impl<V: Value> Converter for Bindings<V> {
    fn convert(&mut self, slot: &Slot, token: &str) -> Result<(), ConvertError> {
        let value = self
            .values
            .get_mut(slot.index)
            .ok_or_else(|| ConvertError::new(format!("no value bound to `{}`", slot.name)))?;
        if value.kind() != slot.kind {
            return Err(ConvertError::new(format!(
                "`{}` is declared {:?} but bound to a {:?} value",
                slot.name,
                slot.kind,
                value.kind()
            )));
        }
        value.write_next(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::{RawSlot, SlotTable, TablePolicy};

    #[test]
    fn scalar_parses_and_overwrites() {
        let mut v = Scalar::<u32>::new();
        assert!(v.is_empty());
        v.write_next("7").unwrap();
        assert_eq!(v.get(), Some(&7));
        assert_eq!(v.len(), 1);
        let err = v.write_next("seven").unwrap_err();
        assert!(err.message().contains("\"seven\""), "{err}");
    }

    #[test]
    fn list_appends() {
        let mut v = List::<i64>::new();
        v.write_next("1").unwrap();
        v.write_next("-2").unwrap();
        assert_eq!(v.as_slice(), &[1, -2]);
        assert_eq!(v.kind(), ValueKind::Collection);
    }

    #[test]
    fn bindings_route_by_slot_index() {
        let table = SlotTable::build(
            &[
                RawSlot::collection("a").with_required("0-1"),
                RawSlot::collection("b"),
            ],
            &TablePolicy::default(),
        )
        .unwrap();
        let mut b: Bindings<Box<dyn Value>> = Bindings::new(vec![
            Box::new(List::<String>::new()),
            Box::new(List::<String>::new()),
        ]);
        b.convert(&table.slots()[1], "x").unwrap();
        assert_eq!(b.get(0).unwrap().len(), 0);
        assert_eq!(b.get(1).unwrap().len(), 1);
    }

    #[test]
    fn bindings_reject_kind_mismatch() {
        let table =
            SlotTable::build(&[RawSlot::collection("xs")], &TablePolicy::default()).unwrap();
        let mut b = Bindings::new(vec![Scalar::<String>::new()]);
        let err = b.convert(&table.slots()[0], "x").unwrap_err();
        assert!(err.to_string().contains("`xs`"), "{err}");
    }

    #[test]
    fn bindings_missing_value() {
        let table = SlotTable::build(&[RawSlot::scalar("a")], &TablePolicy::default()).unwrap();
        let mut b: Bindings<Scalar<String>> = Bindings::new(Vec::new());
        assert!(b.convert(&table.slots()[0], "x").is_err());
    }
}
