//! JSON positional schemas for posarg.
//!
//! A schema declares the positional slots of one command: their names,
//! requirement ranges, value types and completion sources. Loading a schema
//! validates it and produces the inputs `posarg_core` works on.

mod convert;

pub use convert::JsonBindings;

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use log::debug;
use posarg_core::{
    CandidateSource, Evaluator, PathCandidates, RawSlot, SlotTable, StaticCandidates, TableError,
    TablePolicy,
};
use posarg_diagnostics::{Diagnostic, codes};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when loading or validating a positional schema.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// JSON deserialization failed.
    #[error("invalid schema JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// A field value is structurally invalid.
    #[error("invalid {field}: {reason}")]
    InvalidField {
        /// Path of the offending field (e.g. `slots[2].name`).
        field: String,
        /// A human-readable explanation of why the field value is invalid.
        reason: String,
    },

    /// The slots do not form a valid table.
    #[error(transparent)]
    Table(#[from] TableError),
}

impl SchemaError {
    /// Convert into a diagnostic with a stable code.
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            SchemaError::Table(e) => e.to_diagnostic(),
            SchemaError::InvalidField { field, .. } => {
                let mut ctx = BTreeMap::new();
                ctx.insert("field".to_string(), field.clone());
                Diagnostic::error(codes::SCHEMA_INVALID, self.to_string(), None).with_context(ctx)
            }
            SchemaError::InvalidJson(_) => {
                Diagnostic::error(codes::SCHEMA_INVALID, self.to_string(), None)
            }
        }
    }
}

/// Shape of a slot's value.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SlotKind {
    /// One token at most.
    Scalar,
    /// Any number of tokens within the slot's range.
    List,
}

/// How each claimed token is converted.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SlotType {
    /// Kept verbatim.
    #[default]
    String,
    /// Signed 64-bit integer.
    Int,
    /// Finite 64-bit float.
    Float,
    /// `true` or `false`.
    Bool,
    /// A filesystem path; completes from the working directory.
    Path,
}

/// Where completion candidates for a slot come from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CompleteSpec {
    /// A fixed list.
    Values(Vec<String>),
    /// Entries of a directory.
    Path(PathSpec),
}

/// Directory listing options for [`CompleteSpec::Path`].
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PathSpec {
    /// Directory to list; the working directory when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<String>,
    /// Only offer files with these extensions (without the dot).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extensions: Vec<String>,
}

/// One positional slot declaration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SlotSpec {
    /// Display name, unique within the schema.
    pub name: String,
    /// Scalar or list.
    pub kind: SlotKind,
    /// Requirement range: `"N"` or `"N-M"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<String>,
    /// Value type used for conversion.
    #[serde(default, rename = "type")]
    pub ty: SlotType,
    /// Explicit completion source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub complete: Option<CompleteSpec>,
}

/// The positional schema of one command.
///
/// # Example
/// ```
/// let schema = posarg_schema::load_schema_from_str(r#"{
///     "id": "cp",
///     "schema_version": "1.0.0",
///     "slots": [
///         { "name": "sources", "kind": "list", "required": "1-8", "type": "path" },
///         { "name": "dest", "kind": "scalar", "required": "1" }
///     ]
/// }"#).unwrap();
/// assert_eq!(schema.slot_table().unwrap().total_min(), 2);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Schema {
    /// Unique schema identifier, usually the command name.
    pub id: String,
    /// Schema format version (e.g. `"1.0.0"`).
    pub schema_version: String,
    /// Scalar slots without an explicit range are required.
    #[serde(default)]
    pub required_all: bool,
    /// Slots in positional order.
    pub slots: Vec<SlotSpec>,
}

/// Where a slot's completion source was configured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceOrigin {
    /// Written in the slot's `complete` field.
    Declared,
    /// Implied by the slot's `type`.
    Type,
}

/// A completion source bound to a slot.
#[derive(Clone)]
pub struct SlotSource {
    /// Slot index.
    pub index: usize,
    /// Where the source came from.
    pub origin: SourceOrigin,
    /// The source itself.
    pub source: Arc<dyn CandidateSource>,
}

impl Schema {
    /// Raw slot declarations for [`SlotTable::build`].
    pub fn raw_slots(&self) -> Vec<RawSlot> {
        self.slots
            .iter()
            .map(|s| {
                let raw = match s.kind {
                    SlotKind::Scalar => RawSlot::scalar(&s.name),
                    SlotKind::List => RawSlot::collection(&s.name),
                };
                match &s.required {
                    Some(spec) => raw.with_required(spec),
                    None => raw,
                }
            })
            .collect()
    }

    /// Table-wide policy.
    pub fn policy(&self) -> TablePolicy {
        let mut policy = TablePolicy::default();
        policy.required_all = self.required_all;
        policy
    }

    /// Resolve the slot table.
    pub fn slot_table(&self) -> Result<SlotTable, SchemaError> {
        Ok(SlotTable::build(&self.raw_slots(), &self.policy())?)
    }

    /// Value types in slot order.
    pub fn types(&self) -> Vec<SlotType> {
        self.slots.iter().map(|s| s.ty).collect()
    }

    /// Every completion source, declared and type-implied.
    pub fn sources(&self) -> Vec<SlotSource> {
        let mut out = Vec::new();
        for (index, slot) in self.slots.iter().enumerate() {
            if let Some(spec) = &slot.complete {
                let source: Arc<dyn CandidateSource> = match spec {
                    CompleteSpec::Values(values) => {
                        Arc::new(StaticCandidates::new(values.iter().cloned()))
                    }
                    CompleteSpec::Path(path) => Arc::new(
                        PathCandidates::new(path.dir.as_deref().unwrap_or("."))
                            .with_extensions(path.extensions.iter().cloned()),
                    ),
                };
                out.push(SlotSource {
                    index,
                    origin: SourceOrigin::Declared,
                    source,
                });
            }
            let typed: Option<Arc<dyn CandidateSource>> = match slot.ty {
                SlotType::Bool => Some(Arc::new(StaticCandidates::new(["true", "false"]))),
                SlotType::Path => Some(Arc::new(PathCandidates::new("."))),
                SlotType::String | SlotType::Int | SlotType::Float => None,
            };
            if let Some(source) = typed {
                out.push(SlotSource {
                    index,
                    origin: SourceOrigin::Type,
                    source,
                });
            }
        }
        out
    }

    /// An evaluator over `table` with every source registered; declared
    /// sources win over type-implied ones.
    pub fn evaluator<'t>(&self, table: &'t SlotTable) -> Evaluator<'t> {
        self.sources()
            .into_iter()
            .fold(Evaluator::new(table), |ev, s| match s.origin {
                SourceOrigin::Declared => ev.with_source(s.index, s.source),
                SourceOrigin::Type => ev.with_default_source(s.index, s.source),
            })
    }
}

/// Load and validate a [`Schema`] from a JSON string.
///
/// Performs structural validation after deserialization:
/// - `id` and `schema_version` must be non-empty
/// - at least one slot must be declared
/// - slot names must be non-empty and unique
/// - a `complete.values` list must not be empty
/// - the slots must form a valid table (ranges parse, only the last slot
///   is unbounded)
pub fn load_schema_from_str(s: &str) -> Result<Schema, SchemaError> {
    let schema: Schema = serde_json::from_str(s)?;

    if schema.id.trim().is_empty() {
        return Err(SchemaError::InvalidField {
            field: "id".into(),
            reason: "must not be empty".into(),
        });
    }
    if schema.schema_version.trim().is_empty() {
        return Err(SchemaError::InvalidField {
            field: "schema_version".into(),
            reason: "must not be empty".into(),
        });
    }
    if schema.slots.is_empty() {
        return Err(SchemaError::InvalidField {
            field: "slots".into(),
            reason: "at least one slot is required".into(),
        });
    }

    let mut seen = HashSet::new();
    for (i, slot) in schema.slots.iter().enumerate() {
        if slot.name.trim().is_empty() {
            return Err(SchemaError::InvalidField {
                field: format!("slots[{i}].name"),
                reason: "must not be empty".into(),
            });
        }
        if !seen.insert(slot.name.as_str()) {
            return Err(SchemaError::InvalidField {
                field: format!("slots[{i}].name"),
                reason: format!("duplicate slot name `{}`", slot.name),
            });
        }
        if let Some(CompleteSpec::Values(values)) = &slot.complete
            && values.is_empty()
        {
            return Err(SchemaError::InvalidField {
                field: format!("slots[{i}].complete.values"),
                reason: "must not be empty".into(),
            });
        }
    }

    let table = schema.slot_table()?;
    debug!(
        "loaded schema `{}`: {} slot(s), {} token(s) minimum",
        schema.id,
        table.len(),
        table.total_min()
    );
    Ok(schema)
}
