//! In-memory store implementation.
//!
//! A hermetic [`StoreClient`] used for tests and local development. Tables
//! live in `BTreeMap`s wrapped in `Arc<RwLock<_>>` for thread-safe access;
//! nothing is persisted. Supports the full contract: auto-increment keys,
//! atomic increments with post-update reads, write preconditions, and
//! paginated range queries.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{
    Column, ColumnCondition, ColumnUpdate, Comparator, CreateTableRequest, DeleteRowRequest,
    DescribeTableResponse, Direction, GetRangeRequest, GetRangeResponse, GetRowRequest,
    GetRowResponse, IndexMeta, PkValue, PrimaryKey, PutRowRequest, PutRowResponse, Row,
    RowExistence, StoreClient, StoreError, StoreResult, StreamSpec, TableMeta, TableOptions,
    Throughput, UpdateRowRequest, UpdateRowResponse,
};
use crate::value::Value;

/// Generated auto-increment keys start above this, matching the "always a
/// very big number" behavior callers observe from the real store.
const FIRST_AUTO_ID: i64 = 1_000_001;

#[derive(Debug, Clone)]
struct StoredColumn {
    value: Value,
    timestamp: i64,
}

/// Key tuple ordered by the derived `PkValue` ordering, so sentinel bounds
/// slot naturally below/above concrete keys.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct RowKey(Vec<PkValue>);

#[derive(Debug)]
struct TableState {
    meta: TableMeta,
    options: TableOptions,
    throughput: Throughput,
    stream: Option<StreamSpec>,
    indexes: Vec<IndexMeta>,
    rows: BTreeMap<RowKey, HashMap<String, StoredColumn>>,
    next_auto_id: i64,
}

impl TableState {
    fn row_primary_key(&self, key: &RowKey) -> PrimaryKey {
        let mut pk = PrimaryKey::default();
        for (schema, value) in self.meta.primary_key.iter().zip(&key.0) {
            pk.add(schema.name.clone(), value.clone());
        }
        pk
    }

    fn row_for_key(&self, key: &RowKey, columns: &HashMap<String, StoredColumn>) -> Row {
        let mut out: Vec<Column> = columns
            .iter()
            .map(|(name, stored)| Column {
                name: name.clone(),
                value: stored.value.clone(),
                timestamp: Some(stored.timestamp),
            })
            .collect();
        out.sort_by(|a, b| a.name.cmp(&b.name));
        Row {
            primary_key: self.row_primary_key(key),
            columns: out,
        }
    }
}

/// In-memory wide-column store.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<HashMap<String, TableState>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}

fn table_missing(name: &str) -> StoreError {
    StoreError::ObjectNotExist(format!("table `{name}` does not exist"))
}

/// Resolves a write-request key against the table, allocating auto-increment
/// values for placeholders. Sentinels are not valid in a write key.
fn resolve_write_key(state: &mut TableState, pk: &PrimaryKey) -> StoreResult<RowKey> {
    if pk.columns.len() != state.meta.primary_key.len() {
        return Err(StoreError::Transport(format!(
            "key has {} components, table `{}` expects {}",
            pk.columns.len(),
            state.meta.name,
            state.meta.primary_key.len()
        )));
    }
    let mut components = Vec::with_capacity(pk.columns.len());
    for column in &pk.columns {
        let value = match &column.value {
            PkValue::AutoIncrement => {
                let id = state.next_auto_id;
                state.next_auto_id += 1;
                PkValue::Int(id)
            }
            PkValue::Min | PkValue::Max => {
                return Err(StoreError::Transport(format!(
                    "sentinel key component `{}` in write request",
                    column.name
                )));
            }
            concrete => concrete.clone(),
        };
        components.push(value);
    }
    Ok(RowKey(components))
}

fn resolve_read_key(state: &TableState, pk: &PrimaryKey) -> StoreResult<RowKey> {
    let mut components = Vec::with_capacity(pk.columns.len());
    for column in &pk.columns {
        match &column.value {
            PkValue::AutoIncrement | PkValue::Min | PkValue::Max => {
                return Err(StoreError::Transport(format!(
                    "key component `{}` has no concrete value",
                    column.name
                )));
            }
            concrete => components.push(concrete.clone()),
        }
    }
    if components.len() != state.meta.primary_key.len() {
        return Err(StoreError::Transport(format!(
            "key has {} components, table `{}` expects {}",
            components.len(),
            state.meta.name,
            state.meta.primary_key.len()
        )));
    }
    Ok(RowKey(components))
}

fn compare_values(stored: &Value, expected: &Value) -> Option<std::cmp::Ordering> {
    match (stored, expected) {
        (Value::Int(a), Value::Int(b)) => a.partial_cmp(b),
        (Value::Float(a), Value::Float(b)) => a.partial_cmp(b),
        (Value::Str(a), Value::Str(b)) => a.partial_cmp(b),
        (Value::Bytes(a), Value::Bytes(b)) => a.partial_cmp(b),
        (Value::Bool(a), Value::Bool(b)) => a.partial_cmp(b),
        _ => None,
    }
}

fn check_condition(
    existing: Option<&HashMap<String, StoredColumn>>,
    row_existence: RowExistence,
    column_condition: Option<&ColumnCondition>,
) -> StoreResult<()> {
    match row_existence {
        RowExistence::ExpectExist if existing.is_none() => {
            return Err(StoreError::ObjectNotExist("row does not exist".to_string()));
        }
        RowExistence::ExpectNotExist if existing.is_some() => {
            return Err(StoreError::ConditionCheckFail(
                "row already exists".to_string(),
            ));
        }
        _ => {}
    }

    let Some(condition) = column_condition else {
        return Ok(());
    };
    let stored = existing
        .and_then(|columns| columns.get(&condition.column))
        .ok_or_else(|| {
            StoreError::ConditionCheckFail(format!("column `{}` is not set", condition.column))
        })?;
    let ordering = compare_values(&stored.value, &condition.value).ok_or_else(|| {
        StoreError::ConditionCheckFail(format!(
            "column `{}` kind mismatch: stored {} vs expected {}",
            condition.column,
            stored.value.kind_name(),
            condition.value.kind_name()
        ))
    })?;
    use std::cmp::Ordering::*;
    let holds = match condition.comparator {
        Comparator::Equal => ordering == Equal,
        Comparator::NotEqual => ordering != Equal,
        Comparator::GreaterThan => ordering == Greater,
        Comparator::GreaterEqual => ordering != Less,
        Comparator::LessThan => ordering == Less,
        Comparator::LessEqual => ordering != Greater,
    };
    if holds {
        Ok(())
    } else {
        Err(StoreError::ConditionCheckFail(format!(
            "column `{}` failed its comparison",
            condition.column
        )))
    }
}

#[async_trait]
impl StoreClient for MemoryStore {
    async fn get_row(&self, req: GetRowRequest) -> StoreResult<GetRowResponse> {
        let tables = self.tables.read().await;
        let state = tables
            .get(&req.table)
            .ok_or_else(|| table_missing(&req.table))?;
        let key = resolve_read_key(state, &req.primary_key)?;
        let row = state
            .rows
            .get(&key)
            .map(|columns| state.row_for_key(&key, columns));
        Ok(GetRowResponse { row })
    }

    async fn put_row(&self, req: PutRowRequest) -> StoreResult<PutRowResponse> {
        let mut tables = self.tables.write().await;
        let state = tables
            .get_mut(&req.table)
            .ok_or_else(|| table_missing(&req.table))?;
        let key = resolve_write_key(state, &req.primary_key)?;
        check_condition(
            state.rows.get(&key),
            req.row_existence,
            req.column_condition.as_ref(),
        )?;

        let timestamp = now_millis();
        let columns: HashMap<String, StoredColumn> = req
            .columns
            .into_iter()
            .map(|c| {
                (
                    c.name,
                    StoredColumn {
                        value: c.value,
                        timestamp,
                    },
                )
            })
            .collect();
        let primary_key = state.row_primary_key(&key);
        state.rows.insert(key, columns);
        Ok(PutRowResponse { primary_key })
    }

    async fn update_row(&self, req: UpdateRowRequest) -> StoreResult<UpdateRowResponse> {
        let mut tables = self.tables.write().await;
        let state = tables
            .get_mut(&req.table)
            .ok_or_else(|| table_missing(&req.table))?;
        let key = resolve_write_key(state, &req.primary_key)?;
        check_condition(
            state.rows.get(&key),
            req.row_existence,
            req.column_condition.as_ref(),
        )?;

        let timestamp = now_millis();
        let row = state.rows.entry(key).or_default();
        for (name, update) in req.updates {
            match update {
                ColumnUpdate::Put(value) => {
                    row.insert(name, StoredColumn { value, timestamp });
                }
                ColumnUpdate::Increment(delta) => {
                    // A missing counter increments from zero.
                    let base = match row.get(&name) {
                        None => 0,
                        Some(stored) => stored.value.as_int().ok_or_else(|| {
                            StoreError::Transport(format!(
                                "increment on non-integer column `{name}`"
                            ))
                        })?,
                    };
                    row.insert(
                        name,
                        StoredColumn {
                            value: Value::Int(base + delta),
                            timestamp,
                        },
                    );
                }
            }
        }

        let columns = req
            .columns_to_return
            .iter()
            .filter_map(|name| {
                row.get(name).map(|stored| Column {
                    name: name.clone(),
                    value: stored.value.clone(),
                    timestamp: Some(stored.timestamp),
                })
            })
            .collect();
        Ok(UpdateRowResponse { columns })
    }

    async fn delete_row(&self, req: DeleteRowRequest) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        let state = tables
            .get_mut(&req.table)
            .ok_or_else(|| table_missing(&req.table))?;
        let key = resolve_read_key(state, &req.primary_key)?;
        check_condition(
            state.rows.get(&key),
            req.row_existence,
            req.column_condition.as_ref(),
        )?;
        state.rows.remove(&key);
        Ok(())
    }

    async fn get_range(&self, req: GetRangeRequest) -> StoreResult<GetRangeResponse> {
        let tables = self.tables.read().await;
        let state = tables
            .get(&req.table)
            .ok_or_else(|| table_missing(&req.table))?;

        let start = RowKey(req.start.values());
        let end = RowKey(req.end.values());
        let (lo, hi) = match req.direction {
            Direction::Forward => (start, end),
            Direction::Backward => (end, start),
        };
        if lo > hi {
            return Ok(GetRangeResponse {
                rows: Vec::new(),
                next_start: None,
            });
        }

        let limit = req.limit.max(1) as usize;
        let mut rows = Vec::with_capacity(limit.min(64));
        let mut next_start = None;
        let mut in_range = state.rows.range(lo..=hi);
        let mut walk = |entry: Option<(&RowKey, &HashMap<String, StoredColumn>)>| match entry {
            None => false,
            Some((key, columns)) => {
                if rows.len() == limit {
                    next_start = Some(state.row_primary_key(key));
                    false
                } else {
                    rows.push(state.row_for_key(key, columns));
                    true
                }
            }
        };
        match req.direction {
            Direction::Forward => while walk(in_range.next()) {},
            Direction::Backward => while walk(in_range.next_back()) {},
        }

        Ok(GetRangeResponse { rows, next_start })
    }

    async fn describe_table(&self, table: &str) -> StoreResult<DescribeTableResponse> {
        let tables = self.tables.read().await;
        let state = tables.get(table).ok_or_else(|| table_missing(table))?;
        Ok(DescribeTableResponse {
            meta: state.meta.clone(),
            options: state.options,
            throughput: state.throughput,
            stream: state.stream,
            indexes: state.indexes.clone(),
        })
    }

    async fn create_table(&self, req: CreateTableRequest) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        if tables.contains_key(&req.meta.name) {
            return Err(StoreError::Transport(format!(
                "table `{}` already exists",
                req.meta.name
            )));
        }
        tables.insert(
            req.meta.name.clone(),
            TableState {
                meta: req.meta,
                options: req.options,
                throughput: req.throughput,
                stream: req.stream,
                indexes: req.indexes,
                rows: BTreeMap::new(),
                next_auto_id: FIRST_AUTO_ID,
            },
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{PkColumnSchema, PkKind};

    fn meta(name: &str) -> TableMeta {
        TableMeta {
            name: name.to_string(),
            primary_key: vec![
                PkColumnSchema {
                    name: "pk".to_string(),
                    kind: PkKind::Integer,
                    auto_increment: false,
                },
                PkColumnSchema {
                    name: "seq".to_string(),
                    kind: PkKind::Integer,
                    auto_increment: true,
                },
            ],
        }
    }

    async fn store_with_table(name: &str) -> MemoryStore {
        let store = MemoryStore::new();
        store
            .create_table(CreateTableRequest {
                meta: meta(name),
                options: TableOptions {
                    time_to_live: -1,
                    max_versions: 1,
                },
                throughput: Throughput::default(),
                stream: None,
                indexes: Vec::new(),
            })
            .await
            .unwrap();
        store
    }

    fn key(pk: i64, seq: PkValue) -> PrimaryKey {
        let mut k = PrimaryKey::default();
        k.add("pk", PkValue::Int(pk));
        k.add("seq", seq);
        k
    }

    #[tokio::test]
    async fn test_put_get_delete_round_trip() {
        let store = store_with_table("t").await;
        store
            .put_row(PutRowRequest {
                table: "t".to_string(),
                primary_key: key(1, PkValue::Int(7)),
                columns: vec![Column::new("c", Value::Str("v".to_string()))],
                row_existence: RowExistence::Ignore,
                column_condition: None,
            })
            .await
            .unwrap();

        let resp = store
            .get_row(GetRowRequest {
                table: "t".to_string(),
                primary_key: key(1, PkValue::Int(7)),
            })
            .await
            .unwrap();
        let row = resp.row.unwrap();
        assert_eq!(row.columns[0].value, Value::Str("v".to_string()));
        assert!(row.columns[0].timestamp.is_some());

        store
            .delete_row(DeleteRowRequest {
                table: "t".to_string(),
                primary_key: key(1, PkValue::Int(7)),
                row_existence: RowExistence::Ignore,
                column_condition: None,
            })
            .await
            .unwrap();
        let resp = store
            .get_row(GetRowRequest {
                table: "t".to_string(),
                primary_key: key(1, PkValue::Int(7)),
            })
            .await
            .unwrap();
        assert!(resp.row.is_none());
    }

    #[tokio::test]
    async fn test_missing_table_is_object_not_exist() {
        let store = MemoryStore::new();
        let err = store.describe_table("nope").await.unwrap_err();
        assert!(matches!(err, StoreError::ObjectNotExist(_)));
    }

    #[tokio::test]
    async fn test_auto_increment_keys_are_large_and_increasing() {
        let store = store_with_table("t").await;
        let mut generated = Vec::new();
        for _ in 0..3 {
            let resp = store
                .put_row(PutRowRequest {
                    table: "t".to_string(),
                    primary_key: key(1, PkValue::AutoIncrement),
                    columns: Vec::new(),
                    row_existence: RowExistence::Ignore,
                    column_condition: None,
                })
                .await
                .unwrap();
            match &resp.primary_key.columns[1].value {
                PkValue::Int(id) => generated.push(*id),
                other => panic!("expected integer key, got {other:?}"),
            }
        }
        assert!(generated.iter().all(|id| *id > 1_000_000));
        assert!(generated.windows(2).all(|w| w[0] < w[1]));
    }

    #[tokio::test]
    async fn test_increment_from_missing_column() {
        let store = store_with_table("t").await;
        let resp = store
            .update_row(UpdateRowRequest {
                table: "t".to_string(),
                primary_key: key(1, PkValue::Int(1)),
                updates: vec![("n".to_string(), ColumnUpdate::Increment(5))],
                row_existence: RowExistence::Ignore,
                column_condition: None,
                columns_to_return: vec!["n".to_string()],
            })
            .await
            .unwrap();
        assert_eq!(resp.columns[0].value, Value::Int(5));
    }

    #[tokio::test]
    async fn test_expect_exist_on_missing_row() {
        let store = store_with_table("t").await;
        let err = store
            .update_row(UpdateRowRequest {
                table: "t".to_string(),
                primary_key: key(9, PkValue::Int(9)),
                updates: vec![("n".to_string(), ColumnUpdate::Put(Value::Int(1)))],
                row_existence: RowExistence::ExpectExist,
                column_condition: None,
                columns_to_return: Vec::new(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::ObjectNotExist(_)));
    }

    #[tokio::test]
    async fn test_range_pagination_with_sentinels() {
        let store = store_with_table("t").await;
        for seq in 0..7 {
            store
                .put_row(PutRowRequest {
                    table: "t".to_string(),
                    primary_key: key(1, PkValue::Int(seq)),
                    columns: vec![Column::new("n", Value::Int(seq))],
                    row_existence: RowExistence::Ignore,
                    column_condition: None,
                })
                .await
                .unwrap();
        }

        let mut start = key(1, PkValue::Min);
        let end = key(1, PkValue::Max);
        let mut seen = Vec::new();
        loop {
            let resp = store
                .get_range(GetRangeRequest {
                    table: "t".to_string(),
                    start: start.clone(),
                    end: end.clone(),
                    direction: Direction::Forward,
                    limit: 3,
                })
                .await
                .unwrap();
            for row in &resp.rows {
                seen.push(row.primary_key.columns[1].value.clone());
            }
            match resp.next_start {
                Some(next) => start = next,
                None => break,
            }
        }
        let expected: Vec<PkValue> = (0..7).map(PkValue::Int).collect();
        assert_eq!(seen, expected);
    }

    #[tokio::test]
    async fn test_range_backward() {
        let store = store_with_table("t").await;
        for seq in 0..3 {
            store
                .put_row(PutRowRequest {
                    table: "t".to_string(),
                    primary_key: key(1, PkValue::Int(seq)),
                    columns: Vec::new(),
                    row_existence: RowExistence::Ignore,
                    column_condition: None,
                })
                .await
                .unwrap();
        }
        let resp = store
            .get_range(GetRangeRequest {
                table: "t".to_string(),
                start: key(1, PkValue::Max),
                end: key(1, PkValue::Min),
                direction: Direction::Backward,
                limit: 10,
            })
            .await
            .unwrap();
        let seqs: Vec<PkValue> = resp
            .rows
            .iter()
            .map(|r| r.primary_key.columns[1].value.clone())
            .collect();
        assert_eq!(seqs, vec![PkValue::Int(2), PkValue::Int(1), PkValue::Int(0)]);
    }
}
