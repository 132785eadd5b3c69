//! Dynamic value coercion
//!
//! [`Coercer::coerce`] converts a [`Value`] to a requested type following a
//! fixed ladder:
//!
//! 1. absent input (`Null`, `DbNull`, NaN) for a nullable target is `Null`
//! 2. input that already is an instance of the target is returned as is;
//!    remaining absent input resolves to the target's default
//! 3. enum targets resolve by member name, display name or numeric value
//! 4. basic targets use locale-invariant text and checked numeric conversion
//! 5. collections, tuples, maps and structs convert element- or member-wise
//!
//! Anything else is a [`CoerceError::TypeConversion`].

use crate::cache::MetadataCache;
use crate::config::CoerceOptions;
use crate::error::{CoerceError, CoerceResult};
use crate::metadata::TypeDescriptor;
use crate::parse::{
    parse_bool, parse_char, parse_date, parse_datetime, parse_datetime_utc, parse_float,
    parse_guid, parse_integer, parse_timespan,
};
use crate::shape::{FieldInfo, Primitive, ShapeKind, TypeHandle, VariantInfo};
use crate::value::{Collection, EnumValue, FromValue, MapValue, Record, Value};
use crate::Reflect;
use chrono::{NaiveTime, TimeDelta};
use indexmap::IndexMap;
use num_traits::{NumCast, ToPrimitive};
use std::fmt;
use std::sync::{Arc, LazyLock};

static GLOBAL: LazyLock<Coercer> =
    LazyLock::new(|| Coercer::new(MetadataCache::global(), CoerceOptions::default()));

/// Converts dynamic values to requested types.
///
/// Cheap to clone; the metadata cache and options are shared.
#[derive(Clone)]
pub struct Coercer {
    cache: Arc<MetadataCache>,
    options: Arc<CoerceOptions>,
}

impl Coercer {
    /// Create a coercer over an explicit cache.
    pub fn new(cache: Arc<MetadataCache>, options: CoerceOptions) -> Self {
        Coercer {
            cache,
            options: Arc::new(options),
        }
    }

    /// Create a coercer over the global cache with custom options.
    pub fn with_options(options: CoerceOptions) -> Self {
        Self::new(MetadataCache::global(), options)
    }

    /// The process-wide coercer (global cache, default options).
    pub fn global() -> &'static Coercer {
        &GLOBAL
    }

    /// Metadata cache used for type lookups.
    pub fn cache(&self) -> &Arc<MetadataCache> {
        &self.cache
    }

    /// Active options.
    pub fn options(&self) -> &CoerceOptions {
        &self.options
    }

    /// Check whether `value` can be used as `target` without conversion.
    pub fn is_instance(&self, value: &Value, target: &TypeHandle) -> bool {
        self.cache.descriptor(target).is_instance(value)
    }

    /// Convert `value` to `target`.
    pub fn coerce(&self, value: Value, target: &TypeHandle) -> CoerceResult<Value> {
        let descriptor = self.cache.descriptor(target);
        self.coerce_to(value, &descriptor)
    }

    /// Convert `value` to `T`.
    pub fn coerce_into<T: Reflect + FromValue>(&self, value: Value) -> CoerceResult<T> {
        let coerced = self.coerce(value, &TypeHandle::of::<T>())?;
        T::from_value(coerced)
    }

    fn coerce_to(&self, value: Value, target: &TypeDescriptor) -> CoerceResult<Value> {
        let flags = target.flags();

        if value.is_absent() && flags.nullable {
            return Ok(Value::Null);
        }
        if target.is_instance(&value) {
            return Ok(value);
        }
        // NaN stays NaN for float targets
        let nan_to_float = flags.float && matches!(value, Value::F32(_) | Value::F64(_));
        if value.is_absent() && !nan_to_float {
            log::trace!("absent value resolves to default of {}", target.handle());
            return target
                .default_value()
                .ok_or_else(|| CoerceError::conversion(&value, &target.handle()));
        }
        if flags.delegate && matches!(value, Value::Function(_)) {
            return Ok(value);
        }

        match &target.shape().kind {
            ShapeKind::Optional(inner) => self.coerce(value, inner),
            ShapeKind::Dynamic => Ok(value),
            ShapeKind::Enum(variants) => self.to_enum(value, target, variants),
            ShapeKind::Primitive(p) => self.to_primitive(value, *p, target.handle()),
            ShapeKind::List(elem) | ShapeKind::Set(elem) => {
                let items = self.items(value, target.handle(), None)?;
                let items = self.coerce_items(items, elem)?;
                Ok(Value::List(Collection::with_items(target.handle(), items)))
            }
            ShapeKind::Array(elem, len) => {
                let items = self.items(value, target.handle(), Some(*len))?;
                let items = self.coerce_items(items, elem)?;
                Ok(Value::List(Collection::with_items(target.handle(), items)))
            }
            ShapeKind::Tuple(elems) => {
                let items = self.items(value, target.handle(), Some(elems.len()))?;
                let items = items
                    .into_iter()
                    .zip(elems)
                    .map(|(item, ty)| self.coerce(item, ty))
                    .collect::<CoerceResult<Vec<_>>>()?;
                Ok(Value::Tuple(Collection::with_items(target.handle(), items)))
            }
            ShapeKind::Map { key, value: value_ty } => self.to_map(value, target.handle(), key, value_ty),
            ShapeKind::Struct(fields) => self.to_struct(value, target.handle(), fields),
            ShapeKind::Unit | ShapeKind::Function { .. } | ShapeKind::Opaque => {
                Err(CoerceError::conversion(&value, &target.handle()))
            }
        }
    }

    fn text<'a>(&self, s: &'a str) -> &'a str {
        if self.options.trim_strings {
            s.trim()
        } else {
            s
        }
    }

    // ------------------------------------------------------------------------
    // Enums
    // ------------------------------------------------------------------------

    fn to_enum(
        &self,
        value: Value,
        target: &TypeDescriptor,
        variants: &[VariantInfo],
    ) -> CoerceResult<Value> {
        let by_discriminant = |n: i64| variants.iter().find(|v| v.discriminant == n);

        let found = match &value {
            Value::String(s) => {
                let s = self.text(s);
                variants
                    .iter()
                    .find(|v| {
                        v.name.eq_ignore_ascii_case(s)
                            || self.cache.field(target, v.name).display_name().eq_ignore_ascii_case(s)
                    })
                    .or_else(|| {
                        parse_integer(s)
                            .and_then(|n| i64::try_from(n).ok())
                            .and_then(by_discriminant)
                    })
            }
            Value::Enum(e) => by_discriminant(e.discriminant),
            Value::F32(_) | Value::F64(_) => value
                .as_f64()
                .filter(|f| f.fract() == 0.0)
                .and_then(|f| f.to_i64())
                .and_then(by_discriminant),
            other => other.as_i64().and_then(by_discriminant),
        };

        match found {
            Some(v) => Ok(Value::Enum(EnumValue::new(target.handle(), v.discriminant, v.name))),
            None if self.options.enum_fallback => {
                log::warn!(
                    "no member of {} matches '{}', using its zero value",
                    target.handle(),
                    value
                );
                target
                    .default_value()
                    .ok_or_else(|| CoerceError::conversion(&value, &target.handle()))
            }
            None => Err(CoerceError::conversion(&value, &target.handle())),
        }
    }

    // ------------------------------------------------------------------------
    // Primitives
    // ------------------------------------------------------------------------

    fn to_primitive(&self, value: Value, target: Primitive, handle: TypeHandle) -> CoerceResult<Value> {
        let converted = match target {
            Primitive::String => to_text(&value),
            Primitive::Bool => self.to_bool(&value).map(Value::Bool),
            Primitive::Char => self.to_char(&value).map(Value::Char),
            Primitive::F32 | Primitive::F64 => self.to_float(&value, target),
            p if p.is_integer() => self.to_integer(&value, p),
            Primitive::Date => self.to_date(&value),
            Primitive::DateTime => self.to_datetime(&value),
            Primitive::DateTimeUtc => self.to_datetime_utc(&value),
            Primitive::TimeSpan => self.to_timespan(&value),
            Primitive::Guid => match &value {
                Value::String(s) => parse_guid(s).map(Value::Guid),
                _ => None,
            },
            _ => None,
        };
        converted.ok_or_else(|| {
            log::trace!("no conversion from {} to {}", value.type_name(), handle);
            CoerceError::conversion(&value, &handle)
        })
    }

    fn to_integer(&self, value: &Value, target: Primitive) -> Option<Value> {
        match value {
            Value::F32(_) | Value::F64(_) => float_to_integer(value.as_f64()?, target),
            Value::Bool(b) => numeric_value(*b as i32, target),
            Value::Char(c) => numeric_value(*c as u32, target),
            Value::Enum(e) => numeric_value(e.discriminant, target),
            Value::String(s) => {
                let s = self.text(s);
                match parse_integer(s) {
                    Some(n) => numeric_value(n, target),
                    None => float_to_integer(
                        parse_float(s, self.options.decimal_comma_fallback)?,
                        target,
                    ),
                }
            }
            other => numeric_value(integer_of(other)?, target),
        }
    }

    fn to_float(&self, value: &Value, target: Primitive) -> Option<Value> {
        let f = match value {
            Value::F32(f) => *f as f64,
            Value::F64(f) => *f,
            Value::Bool(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            Value::Enum(e) => e.discriminant as f64,
            Value::TimeSpan(span) => span.num_nanoseconds()? as f64 / 1e9,
            Value::String(s) => parse_float(self.text(s), self.options.decimal_comma_fallback)?,
            other => integer_of(other)?.to_f64()?,
        };
        match target {
            Primitive::F64 => Some(Value::F64(f)),
            Primitive::F32 if f.is_finite() && f.abs() > f32::MAX as f64 => None,
            Primitive::F32 => Some(Value::F32(f as f32)),
            _ => None,
        }
    }

    fn to_bool(&self, value: &Value) -> Option<bool> {
        match value {
            Value::String(s) => parse_bool(
                self.text(s),
                self.options.true_literals.as_slice(),
                self.options.false_literals.as_slice(),
            ),
            Value::F32(_) | Value::F64(_) => value.as_f64().map(|f| f != 0.0),
            other => integer_of(other).map(|n| n != 0),
        }
    }

    fn to_char(&self, value: &Value) -> Option<char> {
        match value {
            Value::String(s) => parse_char(s).or_else(|| parse_char(self.text(s))),
            other => integer_of(other)
                .and_then(|n| u32::try_from(n).ok())
                .and_then(char::from_u32),
        }
    }

    fn to_date(&self, value: &Value) -> Option<Value> {
        let date = match value {
            Value::String(s) => parse_date(s, self.options.date_formats.as_slice())?,
            Value::DateTime(dt) => dt.date(),
            Value::DateTimeUtc(dt) => dt.date_naive(),
            _ => return None,
        };
        Some(Value::Date(date))
    }

    fn to_datetime(&self, value: &Value) -> Option<Value> {
        let dt = match value {
            Value::String(s) => parse_datetime(s, self.options.datetime_formats.as_slice())?,
            Value::Date(d) => d.and_time(NaiveTime::MIN),
            Value::DateTimeUtc(dt) => dt.naive_utc(),
            _ => return None,
        };
        Some(Value::DateTime(dt))
    }

    fn to_datetime_utc(&self, value: &Value) -> Option<Value> {
        let dt = match value {
            Value::String(s) => parse_datetime_utc(s, self.options.datetime_formats.as_slice())?,
            Value::Date(d) => d.and_time(NaiveTime::MIN).and_utc(),
            Value::DateTime(dt) => dt.and_utc(),
            _ => return None,
        };
        Some(Value::DateTimeUtc(dt))
    }

    fn to_timespan(&self, value: &Value) -> Option<Value> {
        let span = match value {
            Value::String(s) => parse_timespan(s)?,
            Value::F32(_) | Value::F64(_) => {
                let nanos = (value.as_f64()? * 1e9).round();
                if !nanos.is_finite() || nanos.abs() >= i64::MAX as f64 {
                    return None;
                }
                TimeDelta::nanoseconds(nanos as i64)
            }
            other => TimeDelta::try_seconds(integer_of(other)?.to_i64()?)?,
        };
        Some(Value::TimeSpan(span))
    }

    // ------------------------------------------------------------------------
    // Structural
    // ------------------------------------------------------------------------

    fn items(&self, value: Value, target: TypeHandle, arity: Option<usize>) -> CoerceResult<Vec<Value>> {
        match value {
            Value::List(c) | Value::Tuple(c) if arity.is_none_or(|n| n == c.items.len()) => Ok(c.items),
            other => Err(CoerceError::conversion(&other, &target)),
        }
    }

    fn coerce_items(&self, items: Vec<Value>, elem: &TypeHandle) -> CoerceResult<Vec<Value>> {
        let elem = self.cache.descriptor(elem);
        items
            .into_iter()
            .map(|item| self.coerce_to(item, &elem))
            .collect()
    }

    fn to_map(
        &self,
        value: Value,
        target: TypeHandle,
        key: &TypeHandle,
        value_ty: &TypeHandle,
    ) -> CoerceResult<Value> {
        let entries = match value {
            Value::Map(m) => m.entries,
            Value::Record(r) => r
                .into_fields()
                .into_iter()
                .map(|(k, v)| (Value::String(k), v))
                .collect(),
            other => return Err(CoerceError::conversion(&other, &target)),
        };
        let entries = entries
            .into_iter()
            .map(|(k, v)| Ok((self.coerce(k, key)?, self.coerce(v, value_ty)?)))
            .collect::<CoerceResult<Vec<_>>>()?;
        Ok(Value::Map(MapValue {
            ty: target,
            entries,
        }))
    }

    fn to_struct(&self, value: Value, target: TypeHandle, fields: &[FieldInfo]) -> CoerceResult<Value> {
        let mut source: IndexMap<String, Value> = match value {
            Value::Record(r) => r.into_fields(),
            Value::Map(m) if m.entries.iter().all(|(k, _)| matches!(k, Value::String(_))) => m
                .entries
                .into_iter()
                .filter_map(|(k, v)| match k {
                    Value::String(k) => Some((k, v)),
                    _ => None,
                })
                .collect(),
            other => return Err(CoerceError::conversion(&other, &target)),
        };

        let mut record = Record::new(target);
        for field in fields {
            let raw = take_ignore_case(&mut source, field.name).unwrap_or(Value::Null);
            record.insert(field.name, self.coerce(raw, &field.ty)?);
        }
        Ok(Value::Record(record))
    }
}

impl Default for Coercer {
    fn default() -> Self {
        Self::new(MetadataCache::global(), CoerceOptions::default())
    }
}

impl fmt::Debug for Coercer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Coercer")
            .field("cached_types", &self.cache.len())
            .field("options", &self.options)
            .finish()
    }
}

fn take_ignore_case(source: &mut IndexMap<String, Value>, name: &str) -> Option<Value> {
    if let Some(v) = source.swap_remove(name) {
        return Some(v);
    }
    let index = source.keys().position(|k| k.eq_ignore_ascii_case(name))?;
    source.swap_remove_index(index).map(|(_, v)| v)
}

/// Basic values render through `Display`; composites have no text form.
fn to_text(value: &Value) -> Option<Value> {
    match value {
        Value::List(_)
        | Value::Tuple(_)
        | Value::Map(_)
        | Value::Record(_)
        | Value::Function(_)
        | Value::Null
        | Value::DbNull => None,
        other => Some(Value::String(other.to_string())),
    }
}

fn integer_of(value: &Value) -> Option<i128> {
    Some(match *value {
        Value::Bool(b) => b as i128,
        Value::Char(c) => c as u32 as i128,
        Value::I8(v) => v as i128,
        Value::I16(v) => v as i128,
        Value::I32(v) => v as i128,
        Value::I64(v) => v as i128,
        Value::U8(v) => v as i128,
        Value::U16(v) => v as i128,
        Value::U32(v) => v as i128,
        Value::U64(v) => v as i128,
        Value::Enum(e) => e.discriminant as i128,
        _ => return None,
    })
}

/// Floats round half to even before the checked narrowing.
fn float_to_integer(f: f64, target: Primitive) -> Option<Value> {
    if !f.is_finite() {
        return None;
    }
    numeric_value(f.round_ties_even(), target)
}

/// Checked conversion into an integer or float primitive.
fn numeric_value<N: ToPrimitive + Copy>(n: N, target: Primitive) -> Option<Value> {
    Some(match target {
        Primitive::I8 => Value::I8(NumCast::from(n)?),
        Primitive::I16 => Value::I16(NumCast::from(n)?),
        Primitive::I32 => Value::I32(NumCast::from(n)?),
        Primitive::I64 => Value::I64(NumCast::from(n)?),
        Primitive::U8 => Value::U8(NumCast::from(n)?),
        Primitive::U16 => Value::U16(NumCast::from(n)?),
        Primitive::U32 => Value::U32(NumCast::from(n)?),
        Primitive::U64 => Value::U64(NumCast::from(n)?),
        Primitive::F32 => Value::F32(NumCast::from(n)?),
        Primitive::F64 => Value::F64(NumCast::from(n)?),
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::Shape;
    use chrono::NaiveDate;
    use std::collections::HashMap;

    fn coerce<T: Reflect>(value: Value) -> CoerceResult<Value> {
        Coercer::global().coerce(value, &TypeHandle::of::<T>())
    }

    struct Color;

    impl Reflect for Color {
        fn shape() -> Shape {
            Shape::new(ShapeKind::Enum(vec![
                VariantInfo::new("Red", 1),
                VariantInfo::new("Green", 2).with_display("Leaf"),
                VariantInfo::new("None", 0),
            ]))
        }
    }

    #[test]
    fn test_identity() {
        let v = Value::String("abc".into());
        assert_eq!(coerce::<String>(v.clone()).unwrap(), v);
        assert_eq!(coerce::<Value>(Value::I8(1)).unwrap(), Value::I8(1));
        assert_eq!(coerce::<Option<i32>>(Value::I32(4)).unwrap(), Value::I32(4));
    }

    #[test]
    fn test_absent_for_nullable_targets() {
        for absent in [Value::Null, Value::DbNull, Value::F64(f64::NAN)] {
            assert_eq!(coerce::<Option<i32>>(absent.clone()).unwrap(), Value::Null);
            assert_eq!(coerce::<Value>(absent).unwrap(), Value::Null);
        }
    }

    #[test]
    fn test_absent_for_value_targets_uses_default() {
        assert_eq!(coerce::<i32>(Value::DbNull).unwrap(), Value::I32(0));
        assert_eq!(coerce::<String>(Value::Null).unwrap(), Value::String(String::new()));
        let nan = coerce::<f64>(Value::F64(f64::NAN)).unwrap();
        assert!(matches!(nan, Value::F64(f) if f.is_nan()));
        let narrowed = coerce::<f32>(Value::F64(f64::NAN)).unwrap();
        assert!(matches!(narrowed, Value::F32(f) if f.is_nan()));
        assert_eq!(coerce::<f64>(Value::DbNull).unwrap(), Value::F64(0.0));
        assert!(coerce::<[u8; 2]>(Value::Null).is_ok());
        assert!(coerce::<()>(Value::I32(1)).is_err());
    }

    #[test]
    fn test_numeric_conversions() {
        assert_eq!(coerce::<i64>(Value::I32(-5)).unwrap(), Value::I64(-5));
        assert_eq!(coerce::<u8>(Value::I64(255)).unwrap(), Value::U8(255));
        let err = coerce::<u8>(Value::I64(300)).unwrap_err();
        assert_eq!(err.to_string(), "Cannot convert i64 value '300' to u8");
        assert!(coerce::<u32>(Value::I32(-1)).is_err());
        assert_eq!(coerce::<i32>(Value::F64(2.5)).unwrap(), Value::I32(2));
        assert_eq!(coerce::<i32>(Value::F64(3.5)).unwrap(), Value::I32(4));
        assert_eq!(coerce::<f32>(Value::U64(7)).unwrap(), Value::F32(7.0));
        assert!(coerce::<f32>(Value::F64(1e300)).is_err());
        assert_eq!(coerce::<u16>(Value::Bool(true)).unwrap(), Value::U16(1));
    }

    #[test]
    fn test_text_to_number() {
        assert_eq!(coerce::<i32>(Value::String(" 42 ".into())).unwrap(), Value::I32(42));
        assert_eq!(coerce::<f64>(Value::String("3,5".into())).unwrap(), Value::F64(3.5));
        assert_eq!(coerce::<i32>(Value::String("7.5".into())).unwrap(), Value::I32(8));
        assert!(coerce::<i32>(Value::String("seven".into())).is_err());

        let strict = Coercer::with_options(CoerceOptions {
            decimal_comma_fallback: false,
            ..CoerceOptions::default()
        });
        assert!(strict
            .coerce(Value::String("3,5".into()), &TypeHandle::of::<f64>())
            .is_err());
    }

    #[test]
    fn test_bool_char_string() {
        assert_eq!(coerce::<bool>(Value::String("Yes".into())).unwrap(), Value::Bool(true));
        assert_eq!(coerce::<bool>(Value::I32(0)).unwrap(), Value::Bool(false));
        assert!(coerce::<bool>(Value::String("perhaps".into())).is_err());
        assert_eq!(coerce::<char>(Value::String("x".into())).unwrap(), Value::Char('x'));
        assert_eq!(coerce::<char>(Value::U32(65)).unwrap(), Value::Char('A'));
        assert_eq!(coerce::<u32>(Value::Char('A')).unwrap(), Value::U32(65));
        assert_eq!(coerce::<String>(Value::F64(1.5)).unwrap(), Value::String("1.5".into()));
        assert!(coerce::<String>(Value::list(vec![])).is_err());
    }

    #[test]
    fn test_dates_and_spans() {
        let date = NaiveDate::from_ymd_opt(2023, 11, 5).unwrap();
        assert_eq!(coerce::<NaiveDate>(Value::String("2023-11-05".into())).unwrap(), Value::Date(date));
        let midnight = date.and_hms_opt(0, 0, 0).unwrap();
        assert_eq!(coerce::<chrono::NaiveDateTime>(Value::Date(date)).unwrap(), Value::DateTime(midnight));
        assert_eq!(
            coerce::<String>(Value::DateTime(midnight)).unwrap(),
            Value::String("2023-11-05T00:00:00".into())
        );
        assert_eq!(
            coerce::<TimeDelta>(Value::I32(90)).unwrap(),
            Value::TimeSpan(TimeDelta::seconds(90))
        );
        assert_eq!(
            coerce::<TimeDelta>(Value::String("00:01:30".into())).unwrap(),
            Value::TimeSpan(TimeDelta::seconds(90))
        );
        assert_eq!(coerce::<f64>(Value::TimeSpan(TimeDelta::milliseconds(1500))).unwrap(), Value::F64(1.5));
    }

    #[test]
    fn test_enum_resolution() {
        let green = coerce::<Color>(Value::String("green".into())).unwrap();
        assert!(matches!(green, Value::Enum(e) if e.name == "Green"));
        let leaf = coerce::<Color>(Value::String("LEAF".into())).unwrap();
        assert!(matches!(leaf, Value::Enum(e) if e.discriminant == 2));
        let red = coerce::<Color>(Value::I64(1)).unwrap();
        assert!(matches!(red, Value::Enum(e) if e.name == "Red"));
        let numeric_text = coerce::<Color>(Value::String("2".into())).unwrap();
        assert!(matches!(numeric_text, Value::Enum(e) if e.name == "Green"));
        let fallback = coerce::<Color>(Value::String("purple".into())).unwrap();
        assert!(matches!(fallback, Value::Enum(e) if e.name == "None"));

        let strict = Coercer::with_options(CoerceOptions {
            enum_fallback: false,
            ..CoerceOptions::default()
        });
        assert!(strict
            .coerce(Value::String("purple".into()), &TypeHandle::of::<Color>())
            .is_err());
        assert_eq!(coerce::<i32>(red).unwrap(), Value::I32(1));
    }

    #[test]
    fn test_collections() {
        let source = Value::list(vec![Value::String("1".into()), Value::I64(2)]);
        let list = coerce::<Vec<i32>>(source.clone()).unwrap();
        assert_eq!(Vec::<i32>::from_value(list).unwrap(), vec![1, 2]);

        let pair = coerce::<(u8, String)>(source.clone()).unwrap();
        assert_eq!(<(u8, String)>::from_value(pair).unwrap(), (1, "2".to_string()));

        assert!(coerce::<(u8, u8, u8)>(source.clone()).is_err());
        assert!(coerce::<[i32; 3]>(source).is_err());
    }

    #[test]
    fn test_maps() {
        let source = Value::map([("a", Value::String("1".into())), ("b", Value::I32(2))]);
        let map = coerce::<HashMap<String, u64>>(source).unwrap();
        let map = HashMap::<String, u64>::from_value(map).unwrap();
        assert_eq!(map["a"], 1);
        assert_eq!(map["b"], 2);
    }
}
