//! The record registration API.
//!
//! A record type declares its mapping once, field by field, with the tag
//! syntax from [`crate::tag`]. The [`record!`] macro is the usual way in:
//!
//! ```
//! widerow::record! {
//!     /// A row in the `orders` table.
//!     pub struct Order {
//!         "pk:customer,hash table:orders" customer: String,
//!         "pk:seq,auto_inc" seq: i64,
//!         "col:total" total: i64,
//!         "prefix:meta_" metadata: std::collections::HashMap<String, String>,
//!     }
//! }
//! ```
//!
//! It generates the struct and a [`Record`] implementation whose schema is
//! parsed once per type and memoized. Implementing [`Record`] by hand works
//! too; `capture` and `restore` must stay index-aligned with `tags`.

use std::collections::{BTreeMap, HashMap};

use crate::error::Result;
use crate::schema::Schema;
use crate::value::{FromValue, ToValue, Value};

/// Snapshot of one field's value, taken per operation.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldData {
    Scalar(Value),
    /// Entries of a prefix-column map, keyed by the un-prefixed column name.
    Map(BTreeMap<String, Value>),
}

impl FieldData {
    /// Zero-valued fields are skipped on writes unless the caller opts in.
    /// A prefix map is zero when it has no entries.
    pub fn is_zero(&self) -> bool {
        match self {
            FieldData::Scalar(value) => value.is_zero(),
            FieldData::Map(entries) => entries.is_empty(),
        }
    }
}

/// A single value flowing back into a record after a response.
#[derive(Debug, Clone, PartialEq)]
pub enum Patch {
    Scalar(Value),
    /// An entry of a prefix-column map; the key has the prefix stripped.
    Entry(String, Value),
}

/// A mapped record type.
pub trait Record {
    /// One tag string per declared field, in declaration order. An empty
    /// string leaves the field unmapped.
    fn tags() -> &'static [&'static str]
    where
        Self: Sized;

    /// Resolved schema, parsed once per type.
    fn schema() -> Result<&'static Schema>
    where
        Self: Sized;

    /// Snapshot of every declared field, index-aligned with `tags`.
    fn capture(&self) -> Vec<FieldData>;

    /// Writes a decoded value back into the field at `slot`. Kind mismatches
    /// are skipped silently; the field keeps its prior value.
    fn restore(&mut self, slot: usize, patch: Patch);
}

/// Field-level binding between a native type and its wire representation.
///
/// Implemented for the five wire-representable scalar kinds, for [`Value`]
/// itself (accepts any kind), and for `HashMap<String, T>` prefix columns.
pub trait Bind {
    fn capture(&self) -> FieldData;
    fn restore(&mut self, patch: Patch);
}

macro_rules! bind_scalar {
    ($($ty:ty),*) => {
        $(impl Bind for $ty {
            fn capture(&self) -> FieldData {
                FieldData::Scalar(self.to_value())
            }

            fn restore(&mut self, patch: Patch) {
                if let Patch::Scalar(value) = patch {
                    if let Some(decoded) = FromValue::from_value(value) {
                        *self = decoded;
                    }
                }
            }
        })*
    };
}

bind_scalar!(bool, i64, f64, String, Vec<u8>, Value);

impl<T: ToValue + FromValue> Bind for HashMap<String, T> {
    fn capture(&self) -> FieldData {
        FieldData::Map(
            self.iter()
                .map(|(key, value)| (key.clone(), value.to_value()))
                .collect(),
        )
    }

    fn restore(&mut self, patch: Patch) {
        if let Patch::Entry(key, value) = patch {
            if let Some(decoded) = T::from_value(value) {
                self.insert(key, decoded);
            }
        }
    }
}

/// Declares a record struct and its [`Record`] implementation in one place.
#[macro_export]
macro_rules! record {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $($(#[$field_meta:meta])* $tag:literal $field:ident : $ty:ty),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq)]
        $vis struct $name {
            $($(#[$field_meta])* $vis $field: $ty,)+
        }

        impl $crate::Record for $name {
            fn tags() -> &'static [&'static str] {
                &[$($tag),+]
            }

            fn schema() -> $crate::Result<&'static $crate::Schema> {
                static SCHEMA: std::sync::LazyLock<$crate::Result<$crate::Schema>> =
                    std::sync::LazyLock::new(|| {
                        $crate::Schema::parse(<$name as $crate::Record>::tags())
                    });
                match &*SCHEMA {
                    Ok(schema) => Ok(schema),
                    Err(error) => Err(error.clone()),
                }
            }

            fn capture(&self) -> Vec<$crate::FieldData> {
                vec![$($crate::Bind::capture(&self.$field)),+]
            }

            fn restore(&mut self, slot: usize, patch: $crate::Patch) {
                let mut index = 0usize;
                $(
                    if slot == index {
                        $crate::Bind::restore(&mut self.$field, patch);
                        return;
                    }
                    index += 1;
                )+
                let _ = index;
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    crate::record! {
        struct Sample {
            "pk:p1 table:samples" p1: String,
            "col:count" count: i64,
            "col:any" any: Value,
            "" scratch: i64,
            "prefix:c_" extras: HashMap<String, String>,
        }
    }

    #[test]
    fn test_schema_is_memoized_and_valid() {
        let schema = Sample::schema().unwrap();
        assert_eq!(schema.table, "samples");
        let again = Sample::schema().unwrap();
        assert!(std::ptr::eq(schema, again));
    }

    #[test]
    fn test_capture_alignment() {
        let mut sample = Sample {
            p1: "k".to_string(),
            count: 3,
            ..Sample::default()
        };
        sample.extras.insert("foo".to_string(), "a".to_string());

        let captured = sample.capture();
        assert_eq!(captured.len(), Sample::tags().len());
        assert_eq!(captured[0], FieldData::Scalar(Value::Str("k".to_string())));
        assert_eq!(captured[1], FieldData::Scalar(Value::Int(3)));
        assert_eq!(captured[2], FieldData::Scalar(Value::Absent));
        assert!(captured[3].is_zero());
        assert_eq!(
            captured[4],
            FieldData::Map(BTreeMap::from([(
                "foo".to_string(),
                Value::Str("a".to_string())
            )]))
        );
    }

    #[test]
    fn test_restore_kind_mismatch_is_skipped() {
        let mut sample = Sample {
            count: 42,
            ..Sample::default()
        };
        sample.restore(1, Patch::Scalar(Value::Str("not a number".to_string())));
        assert_eq!(sample.count, 42);

        sample.restore(1, Patch::Scalar(Value::Int(7)));
        assert_eq!(sample.count, 7);
    }

    #[test]
    fn test_value_field_accepts_any_kind() {
        let mut sample = Sample::default();
        sample.restore(2, Patch::Scalar(Value::Bytes(vec![1])));
        assert_eq!(sample.any, Value::Bytes(vec![1]));
        sample.restore(2, Patch::Scalar(Value::Int(5)));
        assert_eq!(sample.any, Value::Int(5));
    }

    #[test]
    fn test_map_restore_checks_entry_kind() {
        let mut sample = Sample::default();
        sample.restore(
            4,
            Patch::Entry("foo".to_string(), Value::Str("bar".to_string())),
        );
        assert_eq!(sample.extras.get("foo"), Some(&"bar".to_string()));

        sample.restore(4, Patch::Entry("num".to_string(), Value::Int(1)));
        assert!(!sample.extras.contains_key("num"));
    }

    #[test]
    fn test_out_of_range_slot_is_ignored() {
        let mut sample = Sample::default();
        sample.restore(99, Patch::Scalar(Value::Int(1)));
        assert_eq!(sample, Sample::default());
    }
}
