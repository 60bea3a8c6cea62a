//! Call-site options for writes and table reconciliation.

use crate::store::{
    ColumnCondition, IndexMeta, RowExistence, StreamSpec, TableOptions, Throughput,
};

/// Table options used when `ensure_table` creates a table and the caller
/// supplied none: retain forever, one version per cell.
pub const DEFAULT_TABLE_OPTIONS: TableOptions = TableOptions {
    time_to_live: -1,
    max_versions: 1,
};

/// Options for put, update, and delete.
#[derive(Debug, Clone, Default)]
pub struct WriteOptions {
    pub(crate) store_zero_values: bool,
    pub(crate) row_existence: RowExistence,
    pub(crate) column_condition: Option<ColumnCondition>,
}

impl WriteOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Also write columns holding their type's zero value, which are skipped
    /// by default.
    pub fn store_zero_values(mut self) -> Self {
        self.store_zero_values = true;
        self
    }

    /// Require the row to exist (or not) before the write applies.
    pub fn row_existence(mut self, expectation: RowExistence) -> Self {
        self.row_existence = expectation;
        self
    }

    /// Require a stored column value to satisfy a comparison before the
    /// write applies.
    pub fn column_condition(mut self, condition: ColumnCondition) -> Self {
        self.column_condition = Some(condition);
        self
    }
}

/// Options for `ensure_table`.
#[derive(Debug, Clone, Default)]
pub struct EnsureOptions {
    pub(crate) fail_if_missing: bool,
    pub(crate) table_options: Option<TableOptions>,
    pub(crate) throughput: Option<Throughput>,
    pub(crate) stream: Option<StreamSpec>,
    pub(crate) indexes: Vec<IndexMeta>,
}

impl EnsureOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report a missing table as an error instead of creating it.
    pub fn fail_if_missing(mut self) -> Self {
        self.fail_if_missing = true;
        self
    }

    pub fn table_options(mut self, options: TableOptions) -> Self {
        self.table_options = Some(options);
        self
    }

    pub fn throughput(mut self, throughput: Throughput) -> Self {
        self.throughput = Some(throughput);
        self
    }

    pub fn stream(mut self, spec: StreamSpec) -> Self {
        self.stream = Some(spec);
        self
    }

    /// Secondary-index metadata forwarded at creation time.
    pub fn index(mut self, index: IndexMeta) -> Self {
        self.indexes.push(index);
        self
    }
}
