//! Paginated range scans.
//!
//! [`Mapper::range`] builds a [`Rows`] cursor over the primary key's ordered
//! address space. The cursor pulls pages lazily: a store fetch happens only
//! when the in-memory buffer runs out. Once terminal it stays terminal;
//! `next` keeps answering `Ok(false)`.

use std::marker::PhantomData;

use crate::error::{Error, Result};
use crate::fields;
use crate::ops::Mapper;
use crate::record::Record;
use crate::schema::Schema;
use crate::store::{Direction, GetRangeRequest, PkValue, PrimaryKey, StoreClient};
use crate::value::{ToValue, Value};

/// Most rows a single page fetch will request.
pub const PAGE_LIMIT: u32 = 50;

/// One component of a range boundary: a concrete value or an open end of the
/// key space.
#[derive(Debug, Clone, PartialEq)]
pub enum Bound {
    Min,
    Max,
    Value(Value),
}

impl Bound {
    pub fn value(value: impl ToValue) -> Self {
        Bound::Value(value.to_value())
    }

    fn to_pk_value(&self, column: &str) -> Result<PkValue> {
        match self {
            Bound::Min => Ok(PkValue::Min),
            Bound::Max => Ok(PkValue::Max),
            Bound::Value(value) => PkValue::from_value(value.clone()).ok_or_else(|| {
                Error::InvalidRecord(format!(
                    "range bound for `{column}` must be i64, string, or bytes, found {}",
                    value.kind_name()
                ))
            }),
        }
    }
}

/// A pull-based cursor over a key range. Finite and non-restartable.
#[derive(Debug)]
pub struct Rows<'a, C, R> {
    client: &'a C,
    schema: &'static Schema,
    start: PrimaryKey,
    end: PrimaryKey,
    direction: Direction,
    buffer: Vec<crate::store::Row>,
    cursor: usize,
    next_start: Option<PrimaryKey>,
    no_next_page: bool,
    produced: u32,
    target: Option<u32>,
    done: bool,
    _record: PhantomData<fn() -> R>,
}

impl<C: StoreClient> Mapper<C> {
    /// Starts a range scan over `R`'s table. `from` and `to` give one
    /// inclusive boundary component per primary-key column, in key order. A
    /// `total` of zero or less scans until the range is exhausted.
    pub fn range<R: Record>(
        &self,
        from: &[Bound],
        to: &[Bound],
        direction: Direction,
        total: i64,
    ) -> Result<Rows<'_, C, R>> {
        let schema = R::schema()?;
        let pk_fields: Vec<_> = schema.pk_fields().collect();
        if from.len() != pk_fields.len() || to.len() != pk_fields.len() {
            return Err(Error::InvalidRecord(format!(
                "range bounds must have {} components, got {} and {}",
                pk_fields.len(),
                from.len(),
                to.len()
            )));
        }

        let mut start = PrimaryKey::default();
        let mut end = PrimaryKey::default();
        for ((_, spec), (lo, hi)) in pk_fields.iter().zip(from.iter().zip(to)) {
            start.add(spec.column.clone(), lo.to_pk_value(&spec.column)?);
            end.add(spec.column.clone(), hi.to_pk_value(&spec.column)?);
        }

        Ok(Rows {
            client: &self.client,
            schema,
            start,
            end,
            direction,
            buffer: Vec::new(),
            cursor: 0,
            next_start: None,
            no_next_page: false,
            produced: 0,
            target: u32::try_from(total).ok().filter(|t| *t > 0),
            done: false,
            _record: PhantomData,
        })
    }
}

impl<C: StoreClient, R: Record> Rows<'_, C, R> {
    /// Advances the cursor, merging the next row's primary key and columns
    /// into `record`. Returns `Ok(false)` once the range has ended: the
    /// bounded target was reached, or the store reported no more rows. A
    /// transport failure during a page fetch is returned as an error and
    /// does not terminate the cursor.
    pub async fn next(&mut self, record: &mut R) -> Result<bool> {
        if self.done {
            return Ok(false);
        }

        if self.cursor == self.buffer.len() {
            if self.no_next_page {
                self.done = true;
                return Ok(false);
            }
            self.fetch_page().await?;
            if self.buffer.is_empty() {
                self.done = true;
                return Ok(false);
            }
        }

        let row = &self.buffer[self.cursor];
        fields::merge_primary_key(record, self.schema, &row.primary_key);
        fields::merge_columns(record, self.schema, &row.columns);
        self.cursor += 1;
        self.produced += 1;
        if self.target == Some(self.produced) {
            self.done = true;
        }
        Ok(true)
    }

    /// Rows emitted so far.
    pub fn count(&self) -> u32 {
        self.produced
    }

    async fn fetch_page(&mut self) -> Result<()> {
        if let Some(next) = self.next_start.take() {
            self.start = next;
        }
        let limit = match self.target {
            None => PAGE_LIMIT,
            Some(target) => PAGE_LIMIT.min(target - self.produced),
        };
        let resp = self
            .client
            .get_range(GetRangeRequest {
                table: self.schema.table.clone(),
                start: self.start.clone(),
                end: self.end.clone(),
                direction: self.direction,
                limit,
            })
            .await?;

        self.buffer = resp.rows;
        self.cursor = 0;
        self.next_start = resp.next_start;
        if self.next_start.is_none() {
            self.no_next_page = true;
        }
        Ok(())
    }
}
