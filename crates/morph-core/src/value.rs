//! Dynamic runtime values
//!
//! [`Value`] is the type-erased currency of the coercer, the delegate
//! adapters and the data-access layer. Every non-null value carries enough
//! information to recover its runtime [`TypeHandle`]: scalars map to their
//! Rust type, composites carry the handle they were created for.
//!
//! [`FromValue`] is a strict extraction (no conversion); use
//! [`Coercer::coerce_into`](crate::Coercer::coerce_into) for loose
//! conversion.

use crate::adapter::DynamicFn;
use crate::coerce::Coercer;
use crate::error::{CoerceError, CoerceResult};
use crate::parse::format_timespan;
use crate::shape::{Reflect, TypeHandle};
use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, TimeDelta, Utc};
use indexmap::IndexMap;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::fmt;
use std::hash::Hash;
use uuid::Uuid;

// ============================================================================
// Value
// ============================================================================

/// A dynamically typed value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Absence of a value
    Null,
    /// Database-null sentinel, equivalent to `Null` for coercion
    DbNull,
    /// `bool`
    Bool(bool),
    /// `char`
    Char(char),
    /// `i8`
    I8(i8),
    /// `i16`
    I16(i16),
    /// `i32`
    I32(i32),
    /// `i64`
    I64(i64),
    /// `u8`
    U8(u8),
    /// `u16`
    U16(u16),
    /// `u32`
    U32(u32),
    /// `u64`
    U64(u64),
    /// `f32`
    F32(f32),
    /// `f64`
    F64(f64),
    /// `String`
    String(String),
    /// Calendar date
    Date(NaiveDate),
    /// Date and time without offset
    DateTime(NaiveDateTime),
    /// UTC date and time
    DateTimeUtc(DateTime<Utc>),
    /// Signed duration
    TimeSpan(TimeDelta),
    /// UUID
    Guid(Uuid),
    /// Member of a reflected enum
    Enum(EnumValue),
    /// List, array or set
    List(Collection),
    /// Positional tuple
    Tuple(Collection),
    /// Key-value map
    Map(MapValue),
    /// Object form of a reflected struct
    Record(Record),
    /// Uniform callable
    Function(DynamicFn),
}

impl Value {
    /// `Null` or `DbNull`.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null | Value::DbNull)
    }

    /// Any sentinel absence value: `Null`, `DbNull` or NaN.
    pub fn is_absent(&self) -> bool {
        match self {
            Value::Null | Value::DbNull => true,
            Value::F32(f) => f.is_nan(),
            Value::F64(f) => f.is_nan(),
            _ => false,
        }
    }

    /// Runtime type of this value, `None` for `Null` and `DbNull`.
    pub fn runtime_type(&self) -> Option<TypeHandle> {
        let handle = match self {
            Value::Null | Value::DbNull => return None,
            Value::Bool(_) => TypeHandle::of::<bool>(),
            Value::Char(_) => TypeHandle::of::<char>(),
            Value::I8(_) => TypeHandle::of::<i8>(),
            Value::I16(_) => TypeHandle::of::<i16>(),
            Value::I32(_) => TypeHandle::of::<i32>(),
            Value::I64(_) => TypeHandle::of::<i64>(),
            Value::U8(_) => TypeHandle::of::<u8>(),
            Value::U16(_) => TypeHandle::of::<u16>(),
            Value::U32(_) => TypeHandle::of::<u32>(),
            Value::U64(_) => TypeHandle::of::<u64>(),
            Value::F32(_) => TypeHandle::of::<f32>(),
            Value::F64(_) => TypeHandle::of::<f64>(),
            Value::String(_) => TypeHandle::of::<String>(),
            Value::Date(_) => TypeHandle::of::<NaiveDate>(),
            Value::DateTime(_) => TypeHandle::of::<NaiveDateTime>(),
            Value::DateTimeUtc(_) => TypeHandle::of::<DateTime<Utc>>(),
            Value::TimeSpan(_) => TypeHandle::of::<TimeDelta>(),
            Value::Guid(_) => TypeHandle::of::<Uuid>(),
            Value::Enum(e) => e.ty,
            Value::List(c) | Value::Tuple(c) => c.ty,
            Value::Map(m) => m.ty,
            Value::Record(r) => r.ty,
            Value::Function(_) => TypeHandle::of::<DynamicFn>(),
        };
        Some(handle)
    }

    /// Short runtime type name, `"null"` for absent values.
    pub fn type_name(&self) -> String {
        match self {
            Value::DbNull => "dbnull".to_string(),
            other => other
                .runtime_type()
                .map_or_else(|| "null".to_string(), |t| t.short_name()),
        }
    }

    /// Get as bool if this is a bool
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Any integer variant widened to `i64` (fails for `u64` above `i64::MAX`).
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Value::I8(v) => Some(v as i64),
            Value::I16(v) => Some(v as i64),
            Value::I32(v) => Some(v as i64),
            Value::I64(v) => Some(v),
            Value::U8(v) => Some(v as i64),
            Value::U16(v) => Some(v as i64),
            Value::U32(v) => Some(v as i64),
            Value::U64(v) => i64::try_from(v).ok(),
            _ => None,
        }
    }

    /// Any numeric variant as `f64`.
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Value::F32(v) => Some(v as f64),
            Value::F64(v) => Some(v),
            Value::U64(v) => Some(v as f64),
            _ => self.as_i64().map(|v| v as f64),
        }
    }

    /// Get as string slice if this is a string
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Items of a list or tuple.
    pub fn as_items(&self) -> Option<&[Value]> {
        match self {
            Value::List(c) | Value::Tuple(c) => Some(&c.items),
            _ => None,
        }
    }

    /// Get as record if this is a record
    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Value::Record(r) => Some(r),
            _ => None,
        }
    }

    /// Build a list of dynamically typed items (`Vec<Value>`).
    pub fn list(items: Vec<Value>) -> Self {
        Value::List(Collection {
            ty: TypeHandle::of::<Vec<Value>>(),
            items,
        })
    }

    /// Build a string-keyed map of dynamically typed values.
    pub fn map<K: Into<String>>(entries: impl IntoIterator<Item = (K, Value)>) -> Self {
        Value::Map(MapValue {
            ty: TypeHandle::of::<HashMap<String, Value>>(),
            entries: entries
                .into_iter()
                .map(|(k, v)| (Value::String(k.into()), v))
                .collect(),
        })
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::Null
    }
}

fn write_items(f: &mut fmt::Formatter<'_>, items: &[Value]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

/// Locale-invariant rendering. Dates use ISO-8601, enums their member name.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null | Value::DbNull => f.write_str("null"),
            Value::Bool(v) => write!(f, "{}", v),
            Value::Char(v) => write!(f, "{}", v),
            Value::I8(v) => write!(f, "{}", v),
            Value::I16(v) => write!(f, "{}", v),
            Value::I32(v) => write!(f, "{}", v),
            Value::I64(v) => write!(f, "{}", v),
            Value::U8(v) => write!(f, "{}", v),
            Value::U16(v) => write!(f, "{}", v),
            Value::U32(v) => write!(f, "{}", v),
            Value::U64(v) => write!(f, "{}", v),
            Value::F32(v) => write!(f, "{}", v),
            Value::F64(v) => write!(f, "{}", v),
            Value::String(v) => f.write_str(v),
            Value::Date(v) => write!(f, "{}", v.format("%Y-%m-%d")),
            Value::DateTime(v) => write!(f, "{}", v.format("%Y-%m-%dT%H:%M:%S%.f")),
            Value::DateTimeUtc(v) => f.write_str(&v.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
            Value::TimeSpan(v) => f.write_str(&format_timespan(*v)),
            Value::Guid(v) => write!(f, "{}", v.hyphenated()),
            Value::Enum(e) => f.write_str(e.name),
            Value::List(c) => {
                f.write_str("[")?;
                write_items(f, &c.items)?;
                f.write_str("]")
            }
            Value::Tuple(c) => {
                f.write_str("(")?;
                write_items(f, &c.items)?;
                f.write_str(")")
            }
            Value::Map(m) => {
                f.write_str("{")?;
                for (i, (k, v)) in m.entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}: {}", k, v)?;
                }
                f.write_str("}")
            }
            Value::Record(r) => {
                write!(f, "{} {{", r.ty)?;
                for (i, (k, v)) in r.fields.iter().enumerate() {
                    f.write_str(if i == 0 { " " } else { ", " })?;
                    write!(f, "{}: {}", k, v)?;
                }
                f.write_str(" }")
            }
            Value::Function(func) => write!(f, "<fn/{}>", func.arity()),
        }
    }
}

// ============================================================================
// Composite Payloads
// ============================================================================

/// Member of a reflected enum.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnumValue {
    /// Enum type
    pub ty: TypeHandle,
    /// Underlying numeric value
    pub discriminant: i64,
    /// Member name
    pub name: &'static str,
}

impl EnumValue {
    /// Create an enum value.
    pub fn new(ty: TypeHandle, discriminant: i64, name: &'static str) -> Self {
        EnumValue {
            ty,
            discriminant,
            name,
        }
    }
}

/// Items of a list, array, set or tuple, tagged with the container type.
#[derive(Debug, Clone, PartialEq)]
pub struct Collection {
    /// Container type
    pub ty: TypeHandle,
    /// Items in order
    pub items: Vec<Value>,
}

impl Collection {
    /// Empty collection of the given container type.
    pub fn new(ty: TypeHandle) -> Self {
        Collection {
            ty,
            items: Vec::new(),
        }
    }

    /// Collection with items.
    pub fn with_items(ty: TypeHandle, items: Vec<Value>) -> Self {
        Collection { ty, items }
    }
}

/// Entries of a map, tagged with the map type.
#[derive(Debug, Clone, PartialEq)]
pub struct MapValue {
    /// Map type
    pub ty: TypeHandle,
    /// Entries in insertion order
    pub entries: Vec<(Value, Value)>,
}

impl MapValue {
    /// Empty map of the given type.
    pub fn new(ty: TypeHandle) -> Self {
        MapValue {
            ty,
            entries: Vec::new(),
        }
    }

    /// Look up a string key.
    pub fn get_str(&self, key: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(k, _)| k.as_str() == Some(key))
            .map(|(_, v)| v)
    }
}

/// Object form of a reflected struct: named members in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    ty: TypeHandle,
    fields: IndexMap<String, Value>,
}

impl Record {
    /// Empty record of the given type.
    pub fn new(ty: TypeHandle) -> Self {
        Record {
            ty,
            fields: IndexMap::new(),
        }
    }

    /// Empty record for `T`.
    pub fn of<T: Reflect>() -> Self {
        Self::new(TypeHandle::of::<T>())
    }

    /// Unwrap a record of type `T`, failing for any other value.
    pub fn expect<T: Reflect>(value: Value) -> CoerceResult<Self> {
        let target = TypeHandle::of::<T>();
        match value {
            Value::Record(r) if r.ty == target => Ok(r),
            other => Err(CoerceError::conversion(&other, &target)),
        }
    }

    /// Record type.
    pub fn ty(&self) -> TypeHandle {
        self.ty
    }

    /// Get a member value.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Get a member value, ignoring ASCII case.
    pub fn get_ignore_case(&self, name: &str) -> Option<&Value> {
        self.fields.get(name).or_else(|| {
            self.fields
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(name))
                .map(|(_, v)| v)
        })
    }

    /// Get a mutable member value.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut Value> {
        self.fields.get_mut(name)
    }

    /// Set a member value, returning the previous one.
    pub fn insert(&mut self, name: impl Into<String>, value: Value) -> Option<Value> {
        self.fields.insert(name.into(), value)
    }

    /// Remove a member value, keeping the order of the others.
    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.fields.shift_remove(name)
    }

    /// Check whether a member is present.
    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Number of members present.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Check whether no member is present.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterate members in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Consume into the ordered member map.
    pub fn into_fields(self) -> IndexMap<String, Value> {
        self.fields
    }

    /// Remove a member and coerce it to `T` with the global coercer.
    ///
    /// A missing member is treated as absent, so it resolves to `None` for
    /// optional members and to the type's default otherwise.
    pub fn take<T: Reflect + FromValue>(&mut self, name: &str) -> CoerceResult<T> {
        let value = self.remove(name).unwrap_or(Value::Null);
        Coercer::global().coerce_into::<T>(value)
    }
}

// ============================================================================
// Conversion Traits
// ============================================================================

/// Strict extraction of a Rust value from a [`Value`].
///
/// No conversion is performed beyond unwrapping; a mismatch is a
/// `TypeConversion` error.
pub trait FromValue: Sized {
    /// Extract from a value of exactly this type.
    fn from_value(value: Value) -> CoerceResult<Self>;
}

/// Conversion of a Rust value into a [`Value`].
pub trait IntoValue {
    /// Convert into a dynamic value.
    fn into_value(self) -> Value;
}

macro_rules! scalar_value {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl IntoValue for $ty {
                #[inline]
                fn into_value(self) -> Value {
                    Value::$variant(self)
                }
            }

            impl FromValue for $ty {
                fn from_value(value: Value) -> CoerceResult<Self> {
                    match value {
                        Value::$variant(v) => Ok(v),
                        other => Err(CoerceError::conversion(&other, &TypeHandle::of::<$ty>())),
                    }
                }
            }
        )*
    };
}

scalar_value! {
    bool => Bool,
    char => Char,
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    f32 => F32,
    f64 => F64,
    String => String,
    NaiveDate => Date,
    NaiveDateTime => DateTime,
    DateTime<Utc> => DateTimeUtc,
    TimeDelta => TimeSpan,
    Uuid => Guid,
}

impl IntoValue for &str {
    fn into_value(self) -> Value {
        Value::String(self.to_string())
    }
}

impl IntoValue for Value {
    #[inline]
    fn into_value(self) -> Value {
        self
    }
}

impl FromValue for Value {
    #[inline]
    fn from_value(value: Value) -> CoerceResult<Self> {
        Ok(value)
    }
}

impl IntoValue for () {
    fn into_value(self) -> Value {
        Value::Null
    }
}

impl FromValue for () {
    fn from_value(value: Value) -> CoerceResult<Self> {
        if value.is_null() {
            Ok(())
        } else {
            Err(CoerceError::conversion(&value, &TypeHandle::of::<()>()))
        }
    }
}

impl<T: IntoValue> IntoValue for Option<T> {
    fn into_value(self) -> Value {
        match self {
            Some(v) => v.into_value(),
            None => Value::Null,
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: Value) -> CoerceResult<Self> {
        if value.is_absent() {
            Ok(None)
        } else {
            T::from_value(value).map(Some)
        }
    }
}

fn collect_items<T: Reflect, C>(items: C) -> Value
where
    C: IntoIterator,
    C::Item: IntoValue,
{
    Value::List(Collection {
        ty: TypeHandle::of::<T>(),
        items: items.into_iter().map(IntoValue::into_value).collect(),
    })
}

fn extract_items<T: FromValue>(value: Value, target: TypeHandle) -> CoerceResult<Vec<T>> {
    match value {
        Value::List(c) | Value::Tuple(c) => c.items.into_iter().map(T::from_value).collect(),
        other => Err(CoerceError::conversion(&other, &target)),
    }
}

impl<T: Reflect + IntoValue> IntoValue for Vec<T> {
    fn into_value(self) -> Value {
        collect_items::<Vec<T>, _>(self)
    }
}

impl<T: Reflect + FromValue> FromValue for Vec<T> {
    fn from_value(value: Value) -> CoerceResult<Self> {
        extract_items(value, TypeHandle::of::<Vec<T>>())
    }
}

impl<T: Reflect + IntoValue> IntoValue for VecDeque<T> {
    fn into_value(self) -> Value {
        collect_items::<VecDeque<T>, _>(self)
    }
}

impl<T: Reflect + FromValue> FromValue for VecDeque<T> {
    fn from_value(value: Value) -> CoerceResult<Self> {
        extract_items(value, TypeHandle::of::<VecDeque<T>>()).map(VecDeque::from)
    }
}

impl<T: Reflect + IntoValue, const N: usize> IntoValue for [T; N] {
    fn into_value(self) -> Value {
        collect_items::<[T; N], _>(self)
    }
}

impl<T: Reflect + FromValue, const N: usize> FromValue for [T; N] {
    fn from_value(value: Value) -> CoerceResult<Self> {
        let target = TypeHandle::of::<[T; N]>();
        let rendered = value.clone();
        let items: Vec<T> = extract_items(value, target)?;
        items
            .try_into()
            .map_err(|_| CoerceError::conversion(&rendered, &target))
    }
}

impl<T: Reflect + IntoValue> IntoValue for HashSet<T> {
    fn into_value(self) -> Value {
        collect_items::<HashSet<T>, _>(self)
    }
}

impl<T: Reflect + FromValue + Eq + Hash> FromValue for HashSet<T> {
    fn from_value(value: Value) -> CoerceResult<Self> {
        extract_items(value, TypeHandle::of::<HashSet<T>>()).map(|v| v.into_iter().collect())
    }
}

impl<T: Reflect + IntoValue> IntoValue for BTreeSet<T> {
    fn into_value(self) -> Value {
        collect_items::<BTreeSet<T>, _>(self)
    }
}

impl<T: Reflect + FromValue + Ord> FromValue for BTreeSet<T> {
    fn from_value(value: Value) -> CoerceResult<Self> {
        extract_items(value, TypeHandle::of::<BTreeSet<T>>()).map(|v| v.into_iter().collect())
    }
}

fn extract_entries<K: FromValue, V: FromValue>(
    value: Value,
    target: TypeHandle,
) -> CoerceResult<Vec<(K, V)>> {
    match value {
        Value::Map(m) => m
            .entries
            .into_iter()
            .map(|(k, v)| Ok((K::from_value(k)?, V::from_value(v)?)))
            .collect(),
        other => Err(CoerceError::conversion(&other, &target)),
    }
}

impl<K: Reflect + IntoValue, V: Reflect + IntoValue> IntoValue for HashMap<K, V> {
    fn into_value(self) -> Value {
        Value::Map(MapValue {
            ty: TypeHandle::of::<HashMap<K, V>>(),
            entries: self
                .into_iter()
                .map(|(k, v)| (k.into_value(), v.into_value()))
                .collect(),
        })
    }
}

impl<K, V> FromValue for HashMap<K, V>
where
    K: Reflect + FromValue + Eq + Hash,
    V: Reflect + FromValue,
{
    fn from_value(value: Value) -> CoerceResult<Self> {
        extract_entries(value, TypeHandle::of::<HashMap<K, V>>()).map(|e| e.into_iter().collect())
    }
}

impl<K: Reflect + IntoValue, V: Reflect + IntoValue> IntoValue for BTreeMap<K, V> {
    fn into_value(self) -> Value {
        Value::Map(MapValue {
            ty: TypeHandle::of::<BTreeMap<K, V>>(),
            entries: self
                .into_iter()
                .map(|(k, v)| (k.into_value(), v.into_value()))
                .collect(),
        })
    }
}

impl<K, V> FromValue for BTreeMap<K, V>
where
    K: Reflect + FromValue + Ord,
    V: Reflect + FromValue,
{
    fn from_value(value: Value) -> CoerceResult<Self> {
        extract_entries(value, TypeHandle::of::<BTreeMap<K, V>>()).map(|e| e.into_iter().collect())
    }
}

macro_rules! tuple_value {
    ($len:expr; $($name:ident $idx:tt),+) => {
        impl<$($name: Reflect + IntoValue),+> IntoValue for ($($name,)+) {
            fn into_value(self) -> Value {
                Value::Tuple(Collection {
                    ty: TypeHandle::of::<($($name,)+)>(),
                    items: vec![$(self.$idx.into_value()),+],
                })
            }
        }

        impl<$($name: Reflect + FromValue),+> FromValue for ($($name,)+) {
            fn from_value(value: Value) -> CoerceResult<Self> {
                let target = TypeHandle::of::<($($name,)+)>();
                match value {
                    Value::Tuple(c) | Value::List(c) if c.items.len() == $len => {
                        let mut items = c.items.into_iter();
                        Ok(($($name::from_value(items.next().unwrap_or_default())?,)+))
                    }
                    other => Err(CoerceError::conversion(&other, &target)),
                }
            }
        }
    };
}

tuple_value!(1; A 0);
tuple_value!(2; A 0, B 1);
tuple_value!(3; A 0, B 1, C 2);
tuple_value!(4; A 0, B 1, C 2, D 3);
tuple_value!(5; A 0, B 1, C 2, D 3, E 4);
tuple_value!(6; A 0, B 1, C 2, D 3, E 4, F 5);
tuple_value!(7; A 0, B 1, C 2, D 3, E 4, F 5, G 6);
tuple_value!(8; A 0, B 1, C 2, D 3, E 4, F 5, G 6, H 7);

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_values() {
        assert!(Value::Null.is_absent());
        assert!(Value::DbNull.is_absent());
        assert!(Value::F64(f64::NAN).is_absent());
        assert!(Value::F32(f32::NAN).is_absent());
        assert!(!Value::F64(0.0).is_absent());
        assert!(!Value::String(String::new()).is_absent());
    }

    #[test]
    fn test_runtime_type() {
        assert_eq!(Value::I32(1).runtime_type(), Some(TypeHandle::of::<i32>()));
        assert_eq!(Value::Null.runtime_type(), None);
        assert_eq!(
            vec![1u8, 2].into_value().runtime_type(),
            Some(TypeHandle::of::<Vec<u8>>())
        );
        assert_eq!(Value::DbNull.type_name(), "dbnull");
        assert_eq!(Value::String("x".into()).type_name(), "String");
    }

    #[test]
    fn test_strict_extraction() {
        assert_eq!(i32::from_value(Value::I32(7)).unwrap(), 7);
        assert!(i32::from_value(Value::I64(7)).is_err());
        assert_eq!(Option::<u8>::from_value(Value::DbNull).unwrap(), None);
        assert_eq!(Option::<u8>::from_value(Value::U8(3)).unwrap(), Some(3));
    }

    #[test]
    fn test_container_round_trip() {
        let v = vec![String::from("a"), String::from("b")].into_value();
        assert_eq!(v.to_string(), "[a, b]");
        let back = Vec::<String>::from_value(v).unwrap();
        assert_eq!(back, vec!["a", "b"]);

        let t = (1i32, true).into_value();
        assert_eq!(<(i32, bool)>::from_value(t).unwrap(), (1, true));

        let arr = [1u16, 2, 3].into_value();
        assert_eq!(<[u16; 3]>::from_value(arr.clone()).unwrap(), [1, 2, 3]);
        assert!(<[u16; 2]>::from_value(arr).is_err());
    }

    #[test]
    fn test_display_invariant() {
        assert_eq!(Value::F64(3.5).to_string(), "3.5");
        assert_eq!(Value::Bool(true).to_string(), "true");
        let date = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        assert_eq!(Value::Date(date).to_string(), "2024-02-29");
        let dt = date.and_hms_opt(13, 5, 0).unwrap();
        assert_eq!(Value::DateTime(dt).to_string(), "2024-02-29T13:05:00");
        assert_eq!(Value::DateTimeUtc(dt.and_utc()).to_string(), "2024-02-29T13:05:00Z");
    }

    #[test]
    fn test_record_access() {
        let mut record = Record::new(TypeHandle::of::<Value>());
        record.insert("Name", Value::String("Ada".into()));
        record.insert("age", Value::I64(36));
        assert_eq!(record.len(), 2);
        assert_eq!(record.get_ignore_case("name"), Some(&Value::String("Ada".into())));
        let age: u32 = record.take("age").unwrap();
        assert_eq!(age, 36);
        assert!(!record.contains("age"));
        let missing: Option<String> = record.take("nickname").unwrap();
        assert_eq!(missing, None);
    }
}
