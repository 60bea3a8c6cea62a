//! Table reconciliation.
//!
//! [`Mapper::ensure_table`] compares a record type's declared primary-key
//! layout against the live table, creating the table when it does not exist
//! and rejecting the record type when the layouts disagree.

use crate::error::{Error, Result};
use crate::fields::{self, RowImage};
use crate::ops::Mapper;
use crate::options::{EnsureOptions, DEFAULT_TABLE_OPTIONS};
use crate::record::Record;
use crate::store::{
    CreateTableRequest, PkColumnSchema, PkKind, PkValue, StoreClient, StoreError, TableMeta,
};

impl<C: StoreClient> Mapper<C> {
    /// Makes sure `R`'s table exists with a primary key matching the record's
    /// declaration. The `template` record only supplies the value kinds for
    /// the key columns; its contents are never written.
    pub async fn ensure_table<R: Record>(
        &self,
        template: &R,
        options: &EnsureOptions,
    ) -> Result<()> {
        let image = fields::extract(template)?;
        let table = image.schema.table.clone();

        match self.client.describe_table(&table).await {
            Ok(described) => validate_meta(&image, &described.meta),
            Err(StoreError::ObjectNotExist(_)) if options.fail_if_missing => {
                Err(Error::TableMissing(table))
            }
            Err(StoreError::ObjectNotExist(_)) => {
                let request = CreateTableRequest {
                    meta: TableMeta {
                        name: table.clone(),
                        primary_key: pk_schema(&image)?,
                    },
                    options: options.table_options.unwrap_or(DEFAULT_TABLE_OPTIONS),
                    throughput: options.throughput.unwrap_or_default(),
                    stream: options.stream,
                    indexes: options.indexes.clone(),
                };
                tracing::debug!(table = %table, "creating table");
                self.client.create_table(request).await?;
                Ok(())
            }
            Err(other) => Err(other.into()),
        }
    }
}

fn validate_meta(image: &RowImage, meta: &TableMeta) -> Result<()> {
    let declared: Vec<_> = image.schema.pk_fields().collect();
    if declared.len() != meta.primary_key.len() {
        return Err(Error::SchemaMismatch(format!(
            "table `{}` has {} primary-key columns, record declares {}",
            meta.name,
            meta.primary_key.len(),
            declared.len()
        )));
    }
    for ((_, spec), column) in declared.iter().zip(&meta.primary_key) {
        if spec.column != column.name {
            return Err(Error::SchemaMismatch(format!(
                "table `{}` primary-key column `{}` does not match declared `{}`",
                meta.name, column.name, spec.column
            )));
        }
        if column.auto_increment != spec.is_auto_inc_pk() {
            return Err(Error::SchemaMismatch(format!(
                "table `{}` column `{}` auto-increment setting does not match the record",
                meta.name, column.name
            )));
        }
    }
    Ok(())
}

fn pk_schema(image: &RowImage) -> Result<Vec<PkColumnSchema>> {
    image
        .primary_key
        .columns
        .iter()
        .map(|column| {
            let kind = match column.value {
                PkValue::Int(_) | PkValue::AutoIncrement => PkKind::Integer,
                PkValue::Str(_) => PkKind::String,
                PkValue::Bytes(_) => PkKind::Binary,
                PkValue::Min | PkValue::Max => {
                    return Err(Error::InvalidRecord(format!(
                        "primary-key column `{}` has no concrete kind",
                        column.name
                    )))
                }
            };
            Ok(PkColumnSchema {
                name: column.name.clone(),
                kind,
                auto_increment: column.value == PkValue::AutoIncrement,
            })
        })
        .collect()
}
