//! The external store seam.
//!
//! Wire-level request/response types and the [`StoreClient`] trait a backend
//! must implement. The mapper treats the client as an opaque collaborator:
//! connection handling, retries, and the wire protocol all live behind this
//! trait. [`MemoryStore`] is the bundled hermetic implementation.

use async_trait::async_trait;
use thiserror::Error;

use crate::value::Value;

mod memory;

pub use memory::MemoryStore;

/// Errors reported by a store client.
///
/// `ObjectNotExist` and `ConditionCheckFail` are signals the operation layer
/// translates into domain errors; everything else is an opaque transport
/// failure passed through to the caller untouched.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum StoreError {
    #[error("object not exist: {0}")]
    ObjectNotExist(String),
    #[error("condition check fail: {0}")]
    ConditionCheckFail(String),
    #[error("store transport error: {0}")]
    Transport(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// One component of a primary key.
///
/// Variant order matters: the derived `Ord` places `Min` below and `Max`
/// above every concrete value, which is exactly the sort the range scanner
/// relies on. `AutoIncrement` is a write-time placeholder and never appears
/// in a stored key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum PkValue {
    /// Sentinel: sorts before every concrete value.
    Min,
    Int(i64),
    Str(String),
    Bytes(Vec<u8>),
    /// Placeholder for a store-generated key, valid only in write requests.
    AutoIncrement,
    /// Sentinel: sorts after every concrete value.
    Max,
}

impl PkValue {
    /// Narrows a wire value to a key-compatible kind.
    pub fn from_value(value: Value) -> Option<PkValue> {
        match value {
            Value::Int(i) => Some(PkValue::Int(i)),
            Value::Str(s) => Some(PkValue::Str(s)),
            Value::Bytes(b) => Some(PkValue::Bytes(b)),
            _ => None,
        }
    }

    /// Concrete key component as a wire value; sentinels and placeholders
    /// have no value form.
    pub fn to_value(&self) -> Option<Value> {
        match self {
            PkValue::Int(i) => Some(Value::Int(*i)),
            PkValue::Str(s) => Some(Value::Str(s.clone())),
            PkValue::Bytes(b) => Some(Value::Bytes(b.clone())),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PkColumn {
    pub name: String,
    pub value: PkValue,
}

/// Ordered sequence of named key components. Order matches the record's
/// primary-key field declaration order, which is also the store's sort order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PrimaryKey {
    pub columns: Vec<PkColumn>,
}

impl PrimaryKey {
    pub fn add(&mut self, name: impl Into<String>, value: PkValue) {
        self.columns.push(PkColumn {
            name: name.into(),
            value,
        });
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn values(&self) -> Vec<PkValue> {
        self.columns.iter().map(|c| c.value.clone()).collect()
    }
}

/// An attribute column with the version timestamp the store reports on reads.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub value: Value,
    pub timestamp: Option<i64>,
}

impl Column {
    pub fn new(name: impl Into<String>, value: Value) -> Self {
        Self {
            name: name.into(),
            value,
            timestamp: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub primary_key: PrimaryKey,
    pub columns: Vec<Column>,
}

/// Row-existence precondition for writes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RowExistence {
    #[default]
    Ignore,
    ExpectExist,
    ExpectNotExist,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparator {
    Equal,
    NotEqual,
    GreaterThan,
    GreaterEqual,
    LessThan,
    LessEqual,
}

/// Precondition on the current stored value of a single column.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnCondition {
    pub column: String,
    pub comparator: Comparator,
    pub value: Value,
}

impl ColumnCondition {
    pub fn new(
        column: impl Into<String>,
        comparator: Comparator,
        value: impl crate::value::ToValue,
    ) -> Self {
        Self {
            column: column.into(),
            comparator,
            value: value.to_value(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct GetRowRequest {
    pub table: String,
    pub primary_key: PrimaryKey,
}

/// `row` is `None` when the key addresses no row; that is not an error.
#[derive(Debug, Clone)]
pub struct GetRowResponse {
    pub row: Option<Row>,
}

#[derive(Debug, Clone)]
pub struct PutRowRequest {
    pub table: String,
    pub primary_key: PrimaryKey,
    pub columns: Vec<Column>,
    pub row_existence: RowExistence,
    pub column_condition: Option<ColumnCondition>,
}

/// Echoes the written key with placeholders resolved, so a generated
/// auto-increment value can be reconciled back into the record.
#[derive(Debug, Clone)]
pub struct PutRowResponse {
    pub primary_key: PrimaryKey,
}

/// Per-column mutation in an update.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnUpdate {
    Put(Value),
    /// Server-side delta; the post-update value can be requested back via
    /// `columns_to_return`.
    Increment(i64),
}

#[derive(Debug, Clone)]
pub struct UpdateRowRequest {
    pub table: String,
    pub primary_key: PrimaryKey,
    pub updates: Vec<(String, ColumnUpdate)>,
    pub row_existence: RowExistence,
    pub column_condition: Option<ColumnCondition>,
    pub columns_to_return: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct UpdateRowResponse {
    pub columns: Vec<Column>,
}

#[derive(Debug, Clone)]
pub struct DeleteRowRequest {
    pub table: String,
    pub primary_key: PrimaryKey,
    pub row_existence: RowExistence,
    pub column_condition: Option<ColumnCondition>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

#[derive(Debug, Clone)]
pub struct GetRangeRequest {
    pub table: String,
    pub start: PrimaryKey,
    pub end: PrimaryKey,
    pub direction: Direction,
    pub limit: u32,
}

/// `next_start` is the opaque continuation key: feed it back as the next
/// request's start. `None` means the range is exhausted.
#[derive(Debug, Clone)]
pub struct GetRangeResponse {
    pub rows: Vec<Row>,
    pub next_start: Option<PrimaryKey>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PkKind {
    Integer,
    String,
    Binary,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PkColumnSchema {
    pub name: String,
    pub kind: PkKind,
    pub auto_increment: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableMeta {
    pub name: String,
    pub primary_key: Vec<PkColumnSchema>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableOptions {
    /// Seconds a cell is retained; `-1` means forever.
    pub time_to_live: i64,
    pub max_versions: i32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Throughput {
    pub read: i32,
    pub write: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamSpec {
    pub enabled: bool,
    pub expiration_hours: i32,
}

/// Secondary-index metadata, forwarded verbatim at table creation.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexMeta {
    pub name: String,
    pub primary_key: Vec<String>,
    pub defined_columns: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct CreateTableRequest {
    pub meta: TableMeta,
    pub options: TableOptions,
    pub throughput: Throughput,
    pub stream: Option<StreamSpec>,
    pub indexes: Vec<IndexMeta>,
}

#[derive(Debug, Clone)]
pub struct DescribeTableResponse {
    pub meta: TableMeta,
    pub options: TableOptions,
    pub throughput: Throughput,
    pub stream: Option<StreamSpec>,
    pub indexes: Vec<IndexMeta>,
}

/// The wide-column store client contract.
///
/// Implementations own everything operational: connections, retries,
/// timeouts. The mapper issues at most one or two calls per public operation
/// and never retries.
#[async_trait]
pub trait StoreClient: Send + Sync {
    async fn get_row(&self, req: GetRowRequest) -> StoreResult<GetRowResponse>;

    async fn put_row(&self, req: PutRowRequest) -> StoreResult<PutRowResponse>;

    async fn update_row(&self, req: UpdateRowRequest) -> StoreResult<UpdateRowResponse>;

    async fn delete_row(&self, req: DeleteRowRequest) -> StoreResult<()>;

    async fn get_range(&self, req: GetRangeRequest) -> StoreResult<GetRangeResponse>;

    async fn describe_table(&self, table: &str) -> StoreResult<DescribeTableResponse>;

    async fn create_table(&self, req: CreateTableRequest) -> StoreResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pk_value_sentinel_ordering() {
        assert!(PkValue::Min < PkValue::Int(i64::MIN));
        assert!(PkValue::Int(i64::MAX) < PkValue::Max);
        assert!(PkValue::Str(String::new()) < PkValue::Max);
        assert!(PkValue::Min < PkValue::Bytes(Vec::new()));
        assert!(PkValue::Int(1) < PkValue::Int(2));
        assert!(PkValue::Str("a".into()) < PkValue::Str("b".into()));
    }

    #[test]
    fn test_pk_value_narrowing() {
        assert_eq!(PkValue::from_value(Value::Int(5)), Some(PkValue::Int(5)));
        assert_eq!(PkValue::from_value(Value::Bool(true)), None);
        assert_eq!(PkValue::from_value(Value::Float(1.0)), None);
        assert_eq!(PkValue::Min.to_value(), None);
        assert_eq!(PkValue::Int(5).to_value(), Some(Value::Int(5)));
    }
}
