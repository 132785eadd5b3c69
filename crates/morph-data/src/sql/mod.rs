//! Thin SQL client
//!
//! [`Connection`] abstracts the driver, [`SqliteConnection`] implements it
//! over `rusqlite`, and [`DbClient`] maps [`Entity`] types onto tables.

mod client;
mod connection;
mod filter;

pub use client::{DbClient, Entity};
pub use connection::{bind, read_value, Connection, Row, SqliteConnection};
pub use filter::{Clause, Filter};
