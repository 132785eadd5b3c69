//! Type classification predicates
//!
//! Every predicate is answered from the descriptor in a
//! [`MetadataCache`]: the global one by default, or an explicit cache via
//! the `*_in` variants. Predicates never fail; opaque types answer `false`.

use crate::cache::MetadataCache;
use crate::metadata::TypeFlags;
use crate::shape::{Primitive, Shape, ShapeKind, TypeHandle};

/// Compute the classification flags of a shape.
pub(crate) fn compute_flags(shape: &Shape) -> TypeFlags {
    let (core, nullable) = match &shape.kind {
        ShapeKind::Optional(inner) => (inner.shape().kind, true),
        ShapeKind::Dynamic => (ShapeKind::Dynamic, true),
        other => (other.clone(), false),
    };
    let primitive = match &core {
        ShapeKind::Primitive(p) => Some(*p),
        _ => None,
    };
    let core_enum = matches!(core, ShapeKind::Enum(_));

    TypeFlags {
        collection: matches!(
            shape.kind,
            ShapeKind::List(_) | ShapeKind::Array(..) | ShapeKind::Set(_)
        ),
        dictionary: matches!(shape.kind, ShapeKind::Map { .. }),
        numeric: primitive.is_some_and(|p| p.is_numeric()),
        float: primitive.is_some_and(|p| p.is_float()),
        boolean: primitive == Some(Primitive::Bool),
        date: primitive.is_some_and(|p| p.is_date()),
        delegate: matches!(shape.kind, ShapeKind::Function { .. }),
        tuple: matches!(shape.kind, ShapeKind::Tuple(_)),
        nullable,
        basic: primitive.is_some() || core_enum,
        enumeration: matches!(shape.kind, ShapeKind::Enum(_)),
    }
}

/// Item type of a list, array or set shape.
pub(crate) fn element_of(shape: &Shape) -> Option<TypeHandle> {
    match shape.kind {
        ShapeKind::List(elem) | ShapeKind::Array(elem, _) | ShapeKind::Set(elem) => Some(elem),
        _ => None,
    }
}

fn flags(t: &TypeHandle) -> TypeFlags {
    MetadataCache::global().descriptor(t).flags()
}

/// Integer type (or float, when `include_float`), through `Option`.
pub fn is_numeric(t: &TypeHandle, include_float: bool) -> bool {
    is_numeric_in(&MetadataCache::global(), t, include_float)
}

/// [`is_numeric`] against an explicit cache.
pub fn is_numeric_in(cache: &MetadataCache, t: &TypeHandle, include_float: bool) -> bool {
    let f = cache.descriptor(t).flags();
    f.numeric && (include_float || !f.float)
}

/// `f32` or `f64`, through `Option`.
pub fn is_float(t: &TypeHandle) -> bool {
    flags(t).float
}

/// `bool`, through `Option`.
pub fn is_boolean(t: &TypeHandle) -> bool {
    flags(t).boolean
}

/// Date, date-time or UTC date-time, through `Option`.
pub fn is_date(t: &TypeHandle) -> bool {
    flags(t).date
}

/// List, array or set. Strings and maps are not collections.
pub fn is_collection(t: &TypeHandle) -> bool {
    flags(t).collection
}

/// [`is_collection`] against an explicit cache.
pub fn is_collection_in(cache: &MetadataCache, t: &TypeHandle) -> bool {
    cache.descriptor(t).flags().collection
}

/// Key-value map.
pub fn is_dictionary(t: &TypeHandle) -> bool {
    flags(t).dictionary
}

/// Fixed-arity positional tuple.
pub fn is_tuple(t: &TypeHandle) -> bool {
    flags(t).tuple
}

/// Enum, or a primitive in the closed basic set, through `Option`.
pub fn is_basic(t: &TypeHandle) -> bool {
    flags(t).basic
}

/// [`is_basic`] against an explicit cache.
pub fn is_basic_in(cache: &MetadataCache, t: &TypeHandle) -> bool {
    cache.descriptor(t).flags().basic
}

/// Accepts the absent value: `Option<_>` and `Value`.
pub fn is_nullable(t: &TypeHandle) -> bool {
    flags(t).nullable
}

/// [`is_nullable`] against an explicit cache.
pub fn is_nullable_in(cache: &MetadataCache, t: &TypeHandle) -> bool {
    cache.descriptor(t).flags().nullable
}

/// Callable.
pub fn is_delegate(t: &TypeHandle) -> bool {
    flags(t).delegate
}

/// Fieldless enum.
pub fn is_enum(t: &TypeHandle) -> bool {
    flags(t).enumeration
}

/// Item type of a list, array or set.
pub fn element_type(t: &TypeHandle) -> Option<TypeHandle> {
    MetadataCache::global().descriptor(t).element_type()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;
    use chrono::{NaiveDate, TimeDelta};
    use std::collections::{BTreeSet, HashMap};
    use uuid::Uuid;

    fn h<T: crate::Reflect>() -> TypeHandle {
        TypeHandle::of::<T>()
    }

    #[test]
    fn test_numeric() {
        assert!(is_numeric(&h::<i32>(), false));
        assert!(is_numeric(&h::<Option<u64>>(), false));
        assert!(!is_numeric(&h::<f64>(), false));
        assert!(is_numeric(&h::<f64>(), true));
        assert!(!is_numeric(&h::<String>(), true));
        assert!(!is_numeric(&h::<bool>(), true));
        assert!(is_float(&h::<Option<f32>>()));
    }

    #[test]
    fn test_collection_and_dictionary() {
        assert!(is_collection(&h::<Vec<i32>>()));
        assert!(is_collection(&h::<[u8; 4]>()));
        assert!(is_collection(&h::<BTreeSet<String>>()));
        assert!(!is_collection(&h::<String>()));
        assert!(!is_collection(&h::<HashMap<String, i32>>()));
        assert!(is_dictionary(&h::<HashMap<String, i32>>()));
        assert_eq!(element_type(&h::<Vec<bool>>()), Some(h::<bool>()));
        assert_eq!(element_type(&h::<i32>()), None);
    }

    #[test]
    fn test_nullable() {
        assert!(is_nullable(&h::<Option<i32>>()));
        assert!(is_nullable(&h::<Value>()));
        assert!(!is_nullable(&h::<i32>()));
        assert!(!is_nullable(&h::<String>()));
    }

    #[test]
    fn test_basic() {
        assert!(is_basic(&h::<String>()));
        assert!(is_basic(&h::<Option<NaiveDate>>()));
        assert!(is_basic(&h::<TimeDelta>()));
        assert!(is_basic(&h::<Uuid>()));
        assert!(is_basic(&h::<char>()));
        assert!(!is_basic(&h::<Vec<u8>>()));
        assert!(!is_basic(&h::<(i32, i32)>()));
        assert!(is_date(&h::<NaiveDate>()));
        assert!(is_boolean(&h::<Option<bool>>()));
    }

    #[test]
    fn test_tuple_structural() {
        assert!(is_tuple(&h::<(i32,)>()));
        assert!(is_tuple(&h::<(i32, String, bool, u8, u8, u8, u8, u8)>()));
        assert!(!is_tuple(&h::<Vec<i32>>()));
        assert!(!is_tuple(&h::<()>()));
    }

    #[test]
    fn test_explicit_cache() {
        let cache = MetadataCache::new();
        assert!(is_numeric_in(&cache, &h::<u8>(), false));
        assert!(is_collection_in(&cache, &h::<Vec<u8>>()));
        assert!(is_nullable_in(&cache, &h::<Option<u8>>()));
        assert!(is_basic_in(&cache, &h::<u8>()));
        assert_eq!(cache.len(), 3);
    }
}
