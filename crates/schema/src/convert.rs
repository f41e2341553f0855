//! Conversion of claimed tokens into JSON values by slot type.

use posarg_core::{ConvertError, Converter, Slot};
use serde_json::{Map, Number, Value};

use crate::{Schema, SlotKind, SlotType};

/// Collects converted tokens as JSON, one entry per slot.
///
/// Scalars become a single value (or `null` when absent), lists an array.
#[derive(Debug, Clone)]
pub struct JsonBindings {
    names: Vec<String>,
    types: Vec<SlotType>,
    values: Vec<Vec<Value>>,
    lists: Vec<bool>,
}

impl JsonBindings {
    /// Empty bindings for every slot of `schema`.
    pub fn new(schema: &Schema) -> Self {
        Self {
            names: schema.slots.iter().map(|s| s.name.clone()).collect(),
            types: schema.types(),
            values: vec![Vec::new(); schema.slots.len()],
            lists: schema
                .slots
                .iter()
                .map(|s| s.kind == SlotKind::List)
                .collect(),
        }
    }

    /// Bound values keyed by slot name.
    pub fn into_json(self) -> Value {
        let mut map = Map::new();
        for ((name, values), list) in self.names.into_iter().zip(self.values).zip(self.lists) {
            let value = if list {
                Value::Array(values)
            } else {
                values.into_iter().next().unwrap_or(Value::Null)
            };
            map.insert(name, value);
        }
        Value::Object(map)
    }
}

impl Converter for JsonBindings {
    fn convert(&mut self, slot: &Slot, token: &str) -> Result<(), ConvertError> {
        let (Some(ty), Some(values)) = (self.types.get(slot.index), self.values.get_mut(slot.index))
        else {
            return Err(ConvertError::new(format!("no value bound to `{}`", slot.name)));
        };
        values.push(convert_token(*ty, token)?);
        Ok(())
    }
}

/// Convert one token according to `ty`.
pub(crate) fn convert_token(ty: SlotType, token: &str) -> Result<Value, ConvertError> {
    match ty {
        SlotType::String | SlotType::Path => Ok(Value::String(token.to_string())),
        SlotType::Int => token
            .parse::<i64>()
            .map(Value::from)
            .map_err(|e| ConvertError::with_source(format!("{token:?} is not an integer"), e)),
        SlotType::Float => {
            let f = token
                .parse::<f64>()
                .map_err(|e| ConvertError::with_source(format!("{token:?} is not a number"), e))?;
            Number::from_f64(f)
                .map(Value::Number)
                .ok_or_else(|| ConvertError::new(format!("{token:?} is not a finite number")))
        }
        SlotType::Bool => token
            .parse::<bool>()
            .map(Value::Bool)
            .map_err(|e| ConvertError::with_source(format!("{token:?} is not true or false"), e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::load_schema_from_str;
    use posarg_core::Allocator;

    fn schema() -> Schema {
        load_schema_from_str(
            r#"{ "id": "x", "schema_version": "1", "slots": [
                { "name": "count", "kind": "scalar", "required": "1", "type": "int" },
                { "name": "ratio", "kind": "scalar", "type": "float" },
                { "name": "flags", "kind": "list", "type": "bool" } ] }"#,
        )
        .unwrap()
    }

    #[test]
    fn token_conversion_by_type() {
        assert_eq!(convert_token(SlotType::Int, "-4").unwrap(), Value::from(-4));
        assert_eq!(convert_token(SlotType::Bool, "true").unwrap(), Value::Bool(true));
        assert_eq!(
            convert_token(SlotType::Path, "a/b").unwrap(),
            Value::String("a/b".into())
        );
        assert!(convert_token(SlotType::Float, "NaN").is_err());
        let err = convert_token(SlotType::Int, "4.5").unwrap_err();
        assert_eq!(err.to_string(), "\"4.5\" is not an integer");
    }

    #[test]
    fn allocation_fills_json_by_slot() {
        let s = schema();
        let t = s.slot_table().unwrap();
        let tokens: Vec<String> = ["3", "0.5", "true", "false"]
            .iter()
            .map(|t| t.to_string())
            .collect();
        let mut bindings = JsonBindings::new(&s);
        Allocator::new(&t).allocate(&tokens, &mut bindings).unwrap();
        assert_eq!(
            bindings.into_json(),
            serde_json::json!({ "count": 3, "ratio": 0.5, "flags": [true, false] })
        );
    }

    #[test]
    fn absent_scalar_is_null() {
        let s = schema();
        let t = s.slot_table().unwrap();
        let mut bindings = JsonBindings::new(&s);
        Allocator::new(&t)
            .allocate(&["1".to_string()], &mut bindings)
            .unwrap();
        assert_eq!(
            bindings.into_json(),
            serde_json::json!({ "count": 1, "ratio": null, "flags": [] })
        );
    }
}
