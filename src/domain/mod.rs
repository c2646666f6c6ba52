//! Snapshot domain: identifiers, loosely typed records, table schemas and coercion.

pub mod coerce;
pub mod ident;
pub mod record;
pub mod request;
pub mod schema;
pub mod value;

pub use coerce::{coerce_field, coerce_record};
pub use ident::{is_valid_identifier, resolve_table_name};
pub use record::Record;
pub use request::{ClearMode, ClearPolicy, SyncOutcome, SyncRequest};
pub use schema::{CoercionClass, ColumnSpec, SchemaError, TableSchema};
pub use value::{FieldValue, SqlValue};
