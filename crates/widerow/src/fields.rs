//! Field extraction and response merging.
//!
//! Pure conversion between live records and wire shapes: a record instance
//! is captured into a [`RowImage`] before a request, and response columns or
//! primary keys are merged back through kind-checked [`Record::restore`]
//! calls afterwards. Testable in isolation without store access.

use crate::error::{Error, Result};
use crate::keys;
use crate::record::{FieldData, Patch, Record};
use crate::schema::Schema;
use crate::store::{Column, ColumnUpdate, PkValue, PrimaryKey};
use crate::tag::FieldSpec;
use crate::value::Value;

/// One mapped field captured from a record instance.
#[derive(Debug, Clone)]
pub(crate) struct FieldState {
    pub slot: usize,
    pub spec: &'static FieldSpec,
    pub data: FieldData,
    pub is_zero: bool,
}

/// Uniform intermediate representation of one record instance: the assembled
/// primary key plus every mapped field's captured state. Lives for one
/// operation call.
#[derive(Debug, Clone)]
pub(crate) struct RowImage {
    pub schema: &'static Schema,
    pub primary_key: PrimaryKey,
    pub fields: Vec<FieldState>,
}

/// Captures `record` into a [`RowImage`], applying the hash-prefix transform
/// and auto-increment placeholders to key fields and validating atomic and
/// prefix field shapes.
pub(crate) fn extract<R: Record>(record: &R) -> Result<RowImage> {
    let schema = R::schema()?;
    let captured = record.capture();
    if captured.len() != schema.slot_count() {
        return Err(Error::InvalidRecord(format!(
            "capture returned {} fields, schema declares {}",
            captured.len(),
            schema.slot_count()
        )));
    }

    let mut fields = Vec::new();
    for (slot, spec) in schema.fields() {
        let data = captured[slot].clone();
        validate_shape(spec, &data)?;
        let is_zero = data.is_zero();
        fields.push(FieldState {
            slot,
            spec,
            data,
            is_zero,
        });
    }

    let mut primary_key = PrimaryKey::default();
    for state in fields.iter().filter(|s| s.spec.is_pk()) {
        let FieldData::Scalar(value) = &state.data else {
            return Err(Error::InvalidRecord(format!(
                "primary key `{}` must be a scalar field",
                state.spec.column
            )));
        };
        let component = if state.spec.is_hash_pk() {
            let raw = value.as_str().ok_or_else(|| {
                Error::InvalidRecord(format!(
                    "hash primary key `{}` must be a string, found {}",
                    state.spec.column,
                    value.kind_name()
                ))
            })?;
            PkValue::Str(keys::add_hash_prefix(raw))
        } else if state.spec.is_auto_inc_pk() {
            match value {
                // A zero value asks the store to generate the key; anything
                // else adopts the caller's value verbatim.
                Value::Int(0) => PkValue::AutoIncrement,
                Value::Int(n) => PkValue::Int(*n),
                other => {
                    return Err(Error::InvalidRecord(format!(
                        "auto-increment primary key `{}` must be an i64, found {}",
                        state.spec.column,
                        other.kind_name()
                    )));
                }
            }
        } else {
            PkValue::from_value(value.clone()).ok_or_else(|| {
                Error::InvalidRecord(format!(
                    "primary key `{}` must be i64, string, or bytes, found {}",
                    state.spec.column,
                    value.kind_name()
                ))
            })?
        };
        primary_key.add(state.spec.column.clone(), component);
    }

    Ok(RowImage {
        schema,
        primary_key,
        fields,
    })
}

fn validate_shape(spec: &FieldSpec, data: &FieldData) -> Result<()> {
    match data {
        FieldData::Map(entries) => {
            if !spec.is_prefix() {
                return Err(Error::InvalidRecord(format!(
                    "field `{}` is a map but is not tagged as a prefix column",
                    spec.column
                )));
            }
            if spec.is_atomic() {
                for (key, value) in entries {
                    if value.as_int().is_none() {
                        return Err(Error::InvalidRecord(format!(
                            "atomic prefix column `{}{}` must be an i64, found {}",
                            spec.column,
                            key,
                            value.kind_name()
                        )));
                    }
                }
            }
        }
        FieldData::Scalar(value) => {
            if spec.is_prefix() {
                return Err(Error::InvalidRecord(format!(
                    "prefix column `{}` must be a string-keyed map",
                    spec.column
                )));
            }
            if spec.is_atomic() && !value.is_absent() && value.as_int().is_none() {
                return Err(Error::InvalidRecord(format!(
                    "atomic column `{}` must be an i64, found {}",
                    spec.column,
                    value.kind_name()
                )));
            }
        }
    }
    Ok(())
}

impl RowImage {
    fn writable_fields(&self, store_zero: bool) -> impl Iterator<Item = &FieldState> {
        self.fields
            .iter()
            .filter(move |s| !s.spec.is_pk() && (store_zero || !s.is_zero))
    }

    /// Columns for a plain put: non-key fields, zero values skipped unless
    /// `store_zero`, prefix maps expanded, absent values dropped.
    pub(crate) fn write_columns(&self, store_zero: bool) -> Vec<Column> {
        let mut columns = Vec::new();
        for state in self.writable_fields(store_zero) {
            match &state.data {
                FieldData::Scalar(value) => {
                    if !value.is_absent() {
                        columns.push(Column::new(state.spec.column.clone(), value.clone()));
                    }
                }
                FieldData::Map(entries) => {
                    for (key, value) in entries {
                        if !value.is_absent() {
                            columns.push(Column::new(
                                format!("{}{}", state.spec.column, key),
                                value.clone(),
                            ));
                        }
                    }
                }
            }
        }
        columns
    }

    /// Column mutations for an update: atomic fields become increments and
    /// are listed for post-update read-back, everything else is upserted.
    pub(crate) fn update_ops(
        &self,
        store_zero: bool,
    ) -> (Vec<(String, ColumnUpdate)>, Vec<String>) {
        let mut updates = Vec::new();
        let mut increments = Vec::new();
        for state in self.writable_fields(store_zero) {
            let atomic = state.spec.is_atomic();
            match &state.data {
                FieldData::Scalar(value) => {
                    if value.is_absent() {
                        continue;
                    }
                    let name = state.spec.column.clone();
                    if atomic {
                        // Shape was validated at capture time.
                        let delta = value.as_int().unwrap_or_default();
                        increments.push(name.clone());
                        updates.push((name, ColumnUpdate::Increment(delta)));
                    } else {
                        updates.push((name, ColumnUpdate::Put(value.clone())));
                    }
                }
                FieldData::Map(entries) => {
                    for (key, value) in entries {
                        if value.is_absent() {
                            continue;
                        }
                        let name = format!("{}{}", state.spec.column, key);
                        if atomic {
                            let delta = value.as_int().unwrap_or_default();
                            increments.push(name.clone());
                            updates.push((name, ColumnUpdate::Increment(delta)));
                        } else {
                            updates.push((name, ColumnUpdate::Put(value.clone())));
                        }
                    }
                }
            }
        }
        (updates, increments)
    }
}

/// Merges response columns into the record. Exact column names win over
/// prefix matches; columns that match nothing are dropped.
pub(crate) fn merge_columns<R: Record>(record: &mut R, schema: &Schema, columns: &[Column]) {
    for column in columns {
        if column.value.is_absent() {
            continue;
        }
        if let Some((slot, _)) = schema.slot_for_column(&column.name) {
            record.restore(slot, Patch::Scalar(column.value.clone()));
        } else if let Some((slot, key)) = schema.prefix_slot_for_column(&column.name) {
            record.restore(slot, Patch::Entry(key.to_string(), column.value.clone()));
        }
    }
}

/// Merges a response primary key into the record, undoing the hash-prefix
/// transform on hash-marked keys.
pub(crate) fn merge_primary_key<R: Record>(record: &mut R, schema: &Schema, pk: &PrimaryKey) {
    for key_column in &pk.columns {
        let Some((slot, spec)) = schema.slot_for_column(&key_column.name) else {
            continue;
        };
        if !spec.is_pk() {
            continue;
        }
        let Some(value) = key_column.value.to_value() else {
            continue;
        };
        let value = match (&value, spec.is_hash_pk()) {
            (Value::Str(s), true) => Value::Str(keys::strip_hash_prefix(s).to_string()),
            _ => value,
        };
        record.restore(slot, Patch::Scalar(value));
    }
}
