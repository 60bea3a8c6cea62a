//! Row operations.
//!
//! [`Mapper`] wraps a store client and exposes the record-level CRUD surface.
//! Each call extracts the record, issues one request, and reflects the
//! response back into the record. Transport failures are surfaced
//! immediately; only the object-not-exist and condition-check-fail signals
//! are translated into domain errors.

use crate::error::{Error, Result};
use crate::fields;
use crate::options::WriteOptions;
use crate::record::Record;
use crate::store::{
    DeleteRowRequest, GetRowRequest, PutRowRequest, StoreClient, StoreError, UpdateRowRequest,
};

/// Record-level interface to a wide-column store.
#[derive(Debug, Clone)]
pub struct Mapper<C> {
    pub(crate) client: C,
}

impl<C: StoreClient> Mapper<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Looks up the row addressed by `record`'s primary-key fields and merges
    /// the stored columns into it. Returns `Ok(false)` when no row exists;
    /// that is not an error.
    pub async fn get_row<R: Record>(&self, record: &mut R) -> Result<bool> {
        let image = fields::extract(record)?;
        let resp = self
            .client
            .get_row(GetRowRequest {
                table: image.schema.table.clone(),
                primary_key: image.primary_key,
            })
            .await?;
        match resp.row {
            None => Ok(false),
            Some(row) => {
                fields::merge_columns(record, image.schema, &row.columns);
                Ok(true)
            }
        }
    }

    /// Writes the record as a full row. Zero-valued columns are skipped
    /// unless the options say otherwise. The store's echoed primary key,
    /// including any generated auto-increment value, is reflected back into
    /// the record.
    pub async fn put_row<R: Record>(&self, record: &mut R, options: &WriteOptions) -> Result<()> {
        let image = fields::extract(record)?;
        let columns = image.write_columns(options.store_zero_values);
        tracing::debug!(table = %image.schema.table, columns = columns.len(), "put row");
        let resp = self
            .client
            .put_row(PutRowRequest {
                table: image.schema.table.clone(),
                primary_key: image.primary_key,
                columns,
                row_existence: options.row_existence,
                column_condition: options.column_condition.clone(),
            })
            .await
            .map_err(translate_write_error)?;
        fields::merge_primary_key(record, image.schema, &resp.primary_key);
        Ok(())
    }

    /// Applies the record's non-key fields as column mutations: atomic
    /// columns become server-side increments, the rest are upserted. When
    /// increments are present their post-update values are requested and
    /// merged back, so the record reflects the new totals without a
    /// separate read.
    pub async fn update_row<R: Record>(
        &self,
        record: &mut R,
        options: &WriteOptions,
    ) -> Result<()> {
        let image = fields::extract(record)?;
        let (updates, increments) = image.update_ops(options.store_zero_values);
        tracing::debug!(
            table = %image.schema.table,
            updates = updates.len(),
            increments = increments.len(),
            "update row"
        );
        let resp = self
            .client
            .update_row(UpdateRowRequest {
                table: image.schema.table.clone(),
                primary_key: image.primary_key,
                updates,
                row_existence: options.row_existence,
                column_condition: options.column_condition.clone(),
                columns_to_return: increments,
            })
            .await
            .map_err(translate_write_error)?;
        fields::merge_columns(record, image.schema, &resp.columns);
        Ok(())
    }

    /// Deletes the row addressed by `record`'s primary-key fields.
    pub async fn delete_row<R: Record>(&self, record: &R, options: &WriteOptions) -> Result<()> {
        let image = fields::extract(record)?;
        self.client
            .delete_row(DeleteRowRequest {
                table: image.schema.table.clone(),
                primary_key: image.primary_key,
                row_existence: options.row_existence,
                column_condition: options.column_condition.clone(),
            })
            .await
            .map_err(translate_write_error)?;
        Ok(())
    }
}

fn translate_write_error(error: StoreError) -> Error {
    match error {
        StoreError::ObjectNotExist(_) => Error::RowNotFound,
        StoreError::ConditionCheckFail(message) => Error::ConditionCheckFailed(message),
        other => Error::Store(other),
    }
}
