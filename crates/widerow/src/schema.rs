//! Per-record schema assembled from parsed field tags.
//!
//! A `Schema` is resolved once per record type (the `record!` macro memoizes
//! it behind a `LazyLock`) and shared by every operation on that type.

use crate::error::{Error, Result};
use crate::tag::{self, FieldSpec};

/// Resolved layout of one record type: table name plus one slot per declared
/// field, in declaration order. Unmapped fields keep their slot so capture
/// and restore stay index-aligned.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    pub table: String,
    fields: Vec<Option<FieldSpec>>,
}

impl Schema {
    /// Parses one tag string per field and checks record-level invariants:
    /// exactly one field declares the table name.
    pub fn parse(tags: &[&str]) -> Result<Schema> {
        let fields = tags
            .iter()
            .map(|t| tag::parse(t))
            .collect::<Result<Vec<_>>>()?;

        let mut table = None;
        for spec in fields.iter().flatten() {
            if let Some(name) = &spec.table {
                if table.replace(name.clone()).is_some() {
                    return Err(Error::Tag(
                        "table declared on more than one field".to_string(),
                    ));
                }
            }
        }
        let table = table.ok_or(Error::MissingTable)?;

        Ok(Schema { table, fields })
    }

    /// Number of declared field slots, mapped or not.
    pub fn slot_count(&self) -> usize {
        self.fields.len()
    }

    /// Mapped fields with their slot indices, in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = (usize, &FieldSpec)> {
        self.fields
            .iter()
            .enumerate()
            .filter_map(|(slot, spec)| spec.as_ref().map(|s| (slot, s)))
    }

    /// Primary-key fields in declaration order, which is also the store's
    /// key-column order.
    pub fn pk_fields(&self) -> impl Iterator<Item = (usize, &FieldSpec)> {
        self.fields().filter(|(_, spec)| spec.is_pk())
    }

    /// Slot of the field bound to the exact column `name`, primary keys
    /// included.
    pub fn slot_for_column(&self, name: &str) -> Option<(usize, &FieldSpec)> {
        self.fields()
            .find(|(_, spec)| !spec.is_prefix() && spec.column == name)
    }

    /// Prefix field owning the dynamic column `name`, with the prefix
    /// stripped. First declared prefix wins when several match.
    pub fn prefix_slot_for_column<'a>(&self, name: &'a str) -> Option<(usize, &'a str)> {
        self.fields()
            .filter(|(_, spec)| spec.is_prefix())
            .find_map(|(slot, spec)| {
                name.strip_prefix(spec.column.as_str()).map(|rest| (slot, rest))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_schema() -> Schema {
        Schema::parse(&[
            "pk:p1,hash table:things",
            "pk:p2",
            "col:col_str",
            "",
            "prefix:c_",
        ])
        .unwrap()
    }

    #[test]
    fn test_parse_collects_table_and_order() {
        let schema = sample_schema();
        assert_eq!(schema.table, "things");
        assert_eq!(schema.slot_count(), 5);

        let pk_names: Vec<&str> = schema
            .pk_fields()
            .map(|(_, spec)| spec.column.as_str())
            .collect();
        assert_eq!(pk_names, ["p1", "p2"]);
    }

    #[test]
    fn test_missing_table_fails() {
        let err = Schema::parse(&["pk:p1", "col:c"]).unwrap_err();
        assert_eq!(err, Error::MissingTable);
    }

    #[test]
    fn test_duplicate_table_fails() {
        let err = Schema::parse(&["pk:p1 table:a", "pk:p2 table:b"]).unwrap_err();
        assert!(matches!(err, Error::Tag(_)));
    }

    #[test]
    fn test_slot_lookup_skips_unmapped_fields() {
        let schema = sample_schema();
        let (slot, spec) = schema.slot_for_column("col_str").unwrap();
        assert_eq!(slot, 2);
        assert!(!spec.is_pk());
        assert!(schema.slot_for_column("missing").is_none());
    }

    #[test]
    fn test_prefix_lookup_strips_prefix() {
        let schema = sample_schema();
        let (slot, rest) = schema.prefix_slot_for_column("c_foo").unwrap();
        assert_eq!(slot, 4);
        assert_eq!(rest, "foo");
        assert!(schema.prefix_slot_for_column("x_foo").is_none());
    }

    #[test]
    fn test_exact_column_beats_prefix() {
        let schema =
            Schema::parse(&["pk:p table:t", "col:c_exact", "prefix:c_"]).unwrap();
        let (slot, _) = schema.slot_for_column("c_exact").unwrap();
        assert_eq!(slot, 1);
    }
}
