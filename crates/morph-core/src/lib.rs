//! morph-core - Type reflection, metadata caching and dynamic coercion
//!
//! Rust types describe themselves through [`Reflect`]; the
//! [`MetadataCache`] turns those descriptions into memoized
//! [`TypeDescriptor`]s, and the [`Coercer`] converts dynamic [`Value`]s to
//! any reflected type. On top of that sit the delegate adapters
//! ([`widen`], [`narrow`]) and the instance factory.
//!
//! # Example
//!
//! ```ignore
//! use morph_core::{Coercer, Reflect, Value};
//!
//! #[derive(Reflect)]
//! struct Order {
//!     id: u32,
//!     #[morph(display = "Customer name")]
//!     customer: String,
//! }
//!
//! let record = Value::map([
//!     ("ID", Value::String("17".into())),
//!     ("customer", Value::String("Ada".into())),
//! ]);
//! let order: Order = Coercer::global().coerce_into(record)?;
//! assert_eq!(order.id, 17);
//! ```

#![warn(missing_docs)]

// `#[derive(Reflect)]` emits `::morph_core` paths
extern crate self as morph_core;

pub mod adapter;
pub mod cache;
pub mod classify;
pub mod coerce;
pub mod config;
pub mod construct;
pub mod error;
pub mod metadata;
pub mod parse;
pub mod shape;
pub mod value;

pub use adapter::{narrow, widen, widen_with, DynamicFn, FunctionRegistry, IntoArgs, IntoDynamicFn, TypedFn};
pub use cache::MetadataCache;
pub use coerce::Coercer;
pub use config::{CoerceOptions, ConfigError};
pub use error::{AdaptError, AdaptResult, CoerceError, CoerceResult};
pub use metadata::{
    AttributeProvider, MemberDescriptor, MemberKind, MetadataProvider, SideTable, TypeDescriptor,
    TypeFlags,
};
pub use shape::{Constructor, FieldInfo, Primitive, Reflect, Shape, ShapeKind, TypeHandle, VariantInfo};
pub use value::{Collection, EnumValue, FromValue, IntoValue, MapValue, Record, Value};

#[cfg(feature = "derive")]
pub use morph_derive::Reflect;
