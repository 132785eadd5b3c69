//! morph-data - CSV, DataTable and SQL marshaling for reflected types
//!
//! Every surface here moves data between an external text or storage
//! format and `morph_core` records, converting each field with the
//! [`Coercer`](morph_core::Coercer).
//!
//! - [`csv`]: read rows into structs, write structs as rows
//! - [`table`]: in-memory [`DataTable`] typed by a struct's members
//! - [`sql`]: [`DbClient`] over a [`Connection`], with SQLite built in

#![warn(missing_docs)]

pub mod csv;
pub mod error;
pub mod sql;
pub mod table;

pub use crate::csv::{CsvImport, CsvOptions, FieldError, FieldPolicy};
pub use crate::error::{CsvError, CsvResult, SqlError, SqlResult};
pub use crate::sql::{Connection, DbClient, Entity, Filter, Row, SqliteConnection};
pub use crate::table::{DataColumn, DataRow, DataTable};
