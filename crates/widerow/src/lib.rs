//! Record-to-row mapping for wide-column primary-key stores.
//!
//! `widerow` binds annotated record structs to rows in a wide-column store.
//! A record declares its table, primary-key columns, and attribute columns
//! through string tags on its fields; the [`record!`] macro turns those
//! declarations into a [`Record`] implementation whose parsed [`Schema`] is
//! computed once per type. A [`Mapper`] then executes reads, writes, range
//! scans, and table reconciliation against any [`store::StoreClient`].
//!
//! ```no_run
//! use widerow::{record, Mapper, WriteOptions};
//! use widerow::store::MemoryStore;
//!
//! record! {
//!     struct Post {
//!         "pk:author,hash table:posts" author: String,
//!         "pk:id,auto_inc" id: i64,
//!         "col:title" title: String,
//!         "col:likes,atomic" likes: i64,
//!     }
//! }
//!
//! # async fn demo() -> widerow::Result<()> {
//! let mapper = Mapper::new(MemoryStore::new());
//! let mut post = Post {
//!     author: "ada".to_string(),
//!     title: "hello".to_string(),
//!     ..Post::default()
//! };
//! mapper.put_row(&mut post, &WriteOptions::new()).await?;
//! assert!(post.id > 1_000_000);
//! # Ok(())
//! # }
//! ```

mod ensure;
mod error;
mod fields;
mod ops;
mod options;
mod record;
mod scan;
mod schema;
mod tag;
mod value;

pub mod keys;
pub mod store;

pub use error::{Error, Result};
pub use ops::Mapper;
pub use options::{EnsureOptions, WriteOptions, DEFAULT_TABLE_OPTIONS};
pub use record::{Bind, FieldData, Patch, Record};
pub use scan::{Bound, Rows, PAGE_LIMIT};
pub use schema::Schema;
pub use tag::{FieldSpec, Role};
pub use value::{FromValue, ToValue, Value};
