//! Static reflection: type handles and shapes
//!
//! Rust has no runtime reflection, so every reflectable type describes
//! itself through [`Reflect::shape`]. A [`TypeHandle`] pairs the type's
//! `TypeId` (its identity and cache key) with that shape function.
//!
//! # Example
//!
//! ```ignore
//! use morph_core::{Reflect, ShapeKind, TypeHandle};
//!
//! let handle = TypeHandle::of::<Vec<i32>>();
//! assert!(matches!(handle.shape().kind, ShapeKind::List(_)));
//! ```

use crate::error::CoerceResult;
use crate::value::{Collection, MapValue, Value};
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeDelta, Utc};
use std::any::TypeId;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use uuid::Uuid;

// ============================================================================
// Reflect
// ============================================================================

/// A type that can describe its own shape at runtime.
///
/// Implemented for primitives, standard containers, tuples, [`Value`] and
/// anything using `#[derive(Reflect)]`.
pub trait Reflect: 'static {
    /// Describe the type.
    fn shape() -> Shape;
}

// ============================================================================
// TypeHandle
// ============================================================================

/// Runtime handle to a reflectable type.
///
/// Equality and hashing use only the `TypeId`, so handles are cheap cache
/// keys.
#[derive(Clone, Copy)]
pub struct TypeHandle {
    id: TypeId,
    name: &'static str,
    shape: fn() -> Shape,
}

impl TypeHandle {
    /// Handle for `T`.
    #[inline]
    pub fn of<T: Reflect>() -> Self {
        TypeHandle {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
            shape: T::shape,
        }
    }

    /// The underlying `TypeId`.
    #[inline]
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Fully qualified Rust type name.
    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Type name with module paths stripped (`Vec<String>` rather than
    /// `alloc::vec::Vec<alloc::string::String>`).
    pub fn short_name(&self) -> String {
        short_type_name(self.name)
    }

    /// Compute the shape. Prefer the metadata cache for repeated queries.
    pub fn shape(&self) -> Shape {
        (self.shape)()
    }

    /// Check whether this handle refers to `T`.
    #[inline]
    pub fn is<T: 'static>(&self) -> bool {
        self.id == TypeId::of::<T>()
    }
}

impl PartialEq for TypeHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeHandle {}

impl Hash for TypeHandle {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeHandle({})", self.short_name())
    }
}

impl fmt::Display for TypeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.short_name())
    }
}

/// Strip module paths from every segment of a type name.
fn short_type_name(full: &str) -> String {
    let mut out = String::with_capacity(full.len());
    let mut token = String::new();
    for ch in full.chars() {
        if ch.is_alphanumeric() || ch == '_' || ch == ':' {
            token.push(ch);
            continue;
        }
        out.push_str(token.rsplit("::").next().unwrap_or(""));
        token.clear();
        out.push(ch);
    }
    out.push_str(token.rsplit("::").next().unwrap_or(""));
    out
}

// ============================================================================
// Shape
// ============================================================================

/// Closed set of primitive ("basic") kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    /// `bool`
    Bool,
    /// `char`
    Char,
    /// `i8`
    I8,
    /// `i16`
    I16,
    /// `i32`
    I32,
    /// `i64`
    I64,
    /// `u8`
    U8,
    /// `u16`
    U16,
    /// `u32`
    U32,
    /// `u64`
    U64,
    /// `f32`
    F32,
    /// `f64`
    F64,
    /// `String`
    String,
    /// `chrono::NaiveDate`
    Date,
    /// `chrono::NaiveDateTime`
    DateTime,
    /// `chrono::DateTime<Utc>`
    DateTimeUtc,
    /// `chrono::TimeDelta`
    TimeSpan,
    /// `uuid::Uuid`
    Guid,
}

impl Primitive {
    /// Integer kinds.
    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            Self::I8 | Self::I16 | Self::I32 | Self::I64 | Self::U8 | Self::U16 | Self::U32 | Self::U64
        )
    }

    /// Floating-point kinds.
    pub fn is_float(&self) -> bool {
        matches!(self, Self::F32 | Self::F64)
    }

    /// Integer or floating-point kinds.
    pub fn is_numeric(&self) -> bool {
        self.is_integer() || self.is_float()
    }

    /// Calendar kinds (date, date-time, UTC date-time).
    pub fn is_date(&self) -> bool {
        matches!(self, Self::Date | Self::DateTime | Self::DateTimeUtc)
    }
}

/// Declared struct member.
#[derive(Debug, Clone)]
pub struct FieldInfo {
    /// Member name
    pub name: &'static str,
    /// Member type
    pub ty: TypeHandle,
    /// Description annotation
    pub description: Option<&'static str>,
    /// Display-name annotation
    pub display: Option<&'static str>,
}

impl FieldInfo {
    /// Create a field of type `T`.
    pub fn new<T: Reflect>(name: &'static str) -> Self {
        FieldInfo {
            name,
            ty: TypeHandle::of::<T>(),
            description: None,
            display: None,
        }
    }

    /// Attach a description.
    pub fn with_description(mut self, description: &'static str) -> Self {
        self.description = Some(description);
        self
    }

    /// Attach a display name.
    pub fn with_display(mut self, display: &'static str) -> Self {
        self.display = Some(display);
        self
    }
}

/// Declared enum member.
#[derive(Debug, Clone)]
pub struct VariantInfo {
    /// Member name
    pub name: &'static str,
    /// Underlying numeric value
    pub discriminant: i64,
    /// Description annotation
    pub description: Option<&'static str>,
    /// Display-name annotation
    pub display: Option<&'static str>,
}

impl VariantInfo {
    /// Create a variant.
    pub fn new(name: &'static str, discriminant: i64) -> Self {
        VariantInfo {
            name,
            discriminant,
            description: None,
            display: None,
        }
    }

    /// Attach a description.
    pub fn with_description(mut self, description: &'static str) -> Self {
        self.description = Some(description);
        self
    }

    /// Attach a display name.
    pub fn with_display(mut self, display: &'static str) -> Self {
        self.display = Some(display);
        self
    }
}

/// Structural category of a type.
#[derive(Debug, Clone)]
pub enum ShapeKind {
    /// `()`
    Unit,
    /// One of the closed primitive kinds
    Primitive(Primitive),
    /// `Option<T>`
    Optional(TypeHandle),
    /// Growable sequence (`Vec`, `VecDeque`)
    List(TypeHandle),
    /// Fixed-length array
    Array(TypeHandle, usize),
    /// Unordered unique items
    Set(TypeHandle),
    /// Key-value map
    Map {
        /// Key type
        key: TypeHandle,
        /// Value type
        value: TypeHandle,
    },
    /// Fixed-arity positional tuple
    Tuple(Vec<TypeHandle>),
    /// Fieldless enum
    Enum(Vec<VariantInfo>),
    /// Struct with named members
    Struct(Vec<FieldInfo>),
    /// Callable
    Function {
        /// Parameter types (empty for variadic uniform callables)
        params: Vec<TypeHandle>,
        /// Return type
        ret: TypeHandle,
    },
    /// The universal top type ([`Value`])
    Dynamic,
    /// No structural information
    Opaque,
}

/// Constructor body: receives arguments already coerced to the declared
/// parameter types.
pub type ConstructFn = Arc<dyn Fn(Vec<Value>) -> CoerceResult<Value> + Send + Sync>;

/// A constructor with a fixed parameter list.
#[derive(Clone)]
pub struct Constructor {
    /// Declared parameter types
    pub params: Vec<TypeHandle>,
    /// Builds the instance
    pub build: ConstructFn,
}

impl Constructor {
    /// Create a constructor.
    pub fn new(
        params: Vec<TypeHandle>,
        build: impl Fn(Vec<Value>) -> CoerceResult<Value> + Send + Sync + 'static,
    ) -> Self {
        Constructor {
            params,
            build: Arc::new(build),
        }
    }
}

impl fmt::Debug for Constructor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Constructor")
            .field("params", &self.params)
            .finish()
    }
}

/// Complete static description of a type.
#[derive(Debug, Clone)]
pub struct Shape {
    /// Structural category
    pub kind: ShapeKind,
    /// Type-level description annotation
    pub description: Option<&'static str>,
    /// Zero-argument factory
    pub default: Option<fn() -> Value>,
    /// Explicit constructors
    pub constructors: Vec<Constructor>,
}

impl Shape {
    /// Create a shape of the given kind.
    pub fn new(kind: ShapeKind) -> Self {
        Shape {
            kind,
            description: None,
            default: None,
            constructors: Vec::new(),
        }
    }

    /// Attach a type-level description.
    pub fn with_description(mut self, description: &'static str) -> Self {
        self.description = Some(description);
        self
    }

    /// Attach a zero-argument factory.
    pub fn with_default(mut self, default: fn() -> Value) -> Self {
        self.default = Some(default);
        self
    }

    /// Register an explicit constructor.
    pub fn with_constructor(mut self, constructor: Constructor) -> Self {
        self.constructors.push(constructor);
        self
    }

    /// Struct members, if this is a struct.
    pub fn fields(&self) -> Option<&[FieldInfo]> {
        match &self.kind {
            ShapeKind::Struct(fields) => Some(fields),
            _ => None,
        }
    }

    /// Enum members, if this is an enum.
    pub fn variants(&self) -> Option<&[VariantInfo]> {
        match &self.kind {
            ShapeKind::Enum(variants) => Some(variants),
            _ => None,
        }
    }
}

// ============================================================================
// Primitive Implementations
// ============================================================================

macro_rules! reflect_primitive {
    ($($ty:ty => $kind:ident, $default:expr;)*) => {
        $(
            impl Reflect for $ty {
                fn shape() -> Shape {
                    Shape::new(ShapeKind::Primitive(Primitive::$kind)).with_default(|| $default)
                }
            }
        )*
    };
}

reflect_primitive! {
    bool => Bool, Value::Bool(false);
    char => Char, Value::Char('\0');
    i8 => I8, Value::I8(0);
    i16 => I16, Value::I16(0);
    i32 => I32, Value::I32(0);
    i64 => I64, Value::I64(0);
    u8 => U8, Value::U8(0);
    u16 => U16, Value::U16(0);
    u32 => U32, Value::U32(0);
    u64 => U64, Value::U64(0);
    f32 => F32, Value::F32(0.0);
    f64 => F64, Value::F64(0.0);
    String => String, Value::String(String::new());
    NaiveDate => Date, Value::Date(NaiveDate::default());
    NaiveDateTime => DateTime, Value::DateTime(NaiveDateTime::default());
    DateTime<Utc> => DateTimeUtc, Value::DateTimeUtc(DateTime::<Utc>::default());
    TimeDelta => TimeSpan, Value::TimeSpan(TimeDelta::zero());
    Uuid => Guid, Value::Guid(Uuid::nil());
}

impl Reflect for () {
    fn shape() -> Shape {
        Shape::new(ShapeKind::Unit).with_default(|| Value::Null)
    }
}

impl Reflect for Value {
    fn shape() -> Shape {
        Shape::new(ShapeKind::Dynamic).with_default(|| Value::Null)
    }
}

// ============================================================================
// Container Implementations
// ============================================================================

impl<T: Reflect> Reflect for Option<T> {
    fn shape() -> Shape {
        Shape::new(ShapeKind::Optional(TypeHandle::of::<T>())).with_default(|| Value::Null)
    }
}

impl<T: Reflect> Reflect for Vec<T> {
    fn shape() -> Shape {
        Shape::new(ShapeKind::List(TypeHandle::of::<T>()))
            .with_default(|| Value::List(Collection::new(TypeHandle::of::<Vec<T>>())))
    }
}

impl<T: Reflect> Reflect for VecDeque<T> {
    fn shape() -> Shape {
        Shape::new(ShapeKind::List(TypeHandle::of::<T>()))
            .with_default(|| Value::List(Collection::new(TypeHandle::of::<VecDeque<T>>())))
    }
}

impl<T: Reflect, const N: usize> Reflect for [T; N] {
    fn shape() -> Shape {
        Shape::new(ShapeKind::Array(TypeHandle::of::<T>(), N))
    }
}

impl<T: Reflect> Reflect for HashSet<T> {
    fn shape() -> Shape {
        Shape::new(ShapeKind::Set(TypeHandle::of::<T>()))
            .with_default(|| Value::List(Collection::new(TypeHandle::of::<HashSet<T>>())))
    }
}

impl<T: Reflect> Reflect for BTreeSet<T> {
    fn shape() -> Shape {
        Shape::new(ShapeKind::Set(TypeHandle::of::<T>()))
            .with_default(|| Value::List(Collection::new(TypeHandle::of::<BTreeSet<T>>())))
    }
}

impl<K: Reflect, V: Reflect> Reflect for HashMap<K, V> {
    fn shape() -> Shape {
        Shape::new(ShapeKind::Map {
            key: TypeHandle::of::<K>(),
            value: TypeHandle::of::<V>(),
        })
        .with_default(|| Value::Map(MapValue::new(TypeHandle::of::<HashMap<K, V>>())))
    }
}

impl<K: Reflect, V: Reflect> Reflect for BTreeMap<K, V> {
    fn shape() -> Shape {
        Shape::new(ShapeKind::Map {
            key: TypeHandle::of::<K>(),
            value: TypeHandle::of::<V>(),
        })
        .with_default(|| Value::Map(MapValue::new(TypeHandle::of::<BTreeMap<K, V>>())))
    }
}

macro_rules! reflect_tuple {
    ($($name:ident),+) => {
        impl<$($name: Reflect),+> Reflect for ($($name,)+) {
            fn shape() -> Shape {
                Shape::new(ShapeKind::Tuple(vec![$(TypeHandle::of::<$name>()),+]))
            }
        }
    };
}

reflect_tuple!(A);
reflect_tuple!(A, B);
reflect_tuple!(A, B, C);
reflect_tuple!(A, B, C, D);
reflect_tuple!(A, B, C, D, E);
reflect_tuple!(A, B, C, D, E, F);
reflect_tuple!(A, B, C, D, E, F, G);
reflect_tuple!(A, B, C, D, E, F, G, H);

// ============================================================================
// Tests
// ============================================================================
