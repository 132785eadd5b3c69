//! Delegate signature adapters
//!
//! Widening turns a typed closure of arity 0 to 8 into a [`DynamicFn`] that
//! accepts `&[Value]` and coerces each argument to the declared parameter
//! type. Narrowing wraps a [`DynamicFn`] into a [`TypedFn`] whose arguments
//! and result are converted strictly, without coercion.
//!
//! ```ignore
//! let f = widen(|a: i32, b: String| format!("{}:{}", a, b));
//! let out = f.call(&[Value::String("42".into()), Value::I32(7)])?;
//! assert_eq!(out, Value::String("42:7".into()));
//! ```

use crate::coerce::Coercer;
use crate::error::{AdaptError, AdaptResult};
use crate::shape::{Reflect, Shape, ShapeKind, TypeHandle};
use crate::value::{FromValue, IntoValue, Value};
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// Uniform callable body.
pub type UniformFn = Arc<dyn Fn(&[Value]) -> AdaptResult<Value> + Send + Sync>;

// ============================================================================
// DynamicFn
// ============================================================================

/// A callable taking a uniform argument list.
#[derive(Clone)]
pub struct DynamicFn {
    params: Arc<[TypeHandle]>,
    ret: TypeHandle,
    func: UniformFn,
}

impl DynamicFn {
    /// Create a uniform callable with declared parameter and return types.
    pub fn new(
        params: Vec<TypeHandle>,
        ret: TypeHandle,
        func: impl Fn(&[Value]) -> AdaptResult<Value> + Send + Sync + 'static,
    ) -> Self {
        DynamicFn {
            params: params.into(),
            ret,
            func: Arc::new(func),
        }
    }

    /// Create a uniform callable with no declared parameters, returning
    /// dynamic values.
    pub fn variadic(func: impl Fn(&[Value]) -> AdaptResult<Value> + Send + Sync + 'static) -> Self {
        Self::new(Vec::new(), TypeHandle::of::<Value>(), func)
    }

    /// Number of declared parameters.
    pub fn arity(&self) -> usize {
        self.params.len()
    }

    /// Declared parameter types.
    pub fn params(&self) -> &[TypeHandle] {
        &self.params
    }

    /// Declared return type.
    pub fn return_type(&self) -> TypeHandle {
        self.ret
    }

    /// Invoke with positional arguments. Arguments beyond the declared
    /// parameters are ignored.
    pub fn call(&self, args: &[Value]) -> AdaptResult<Value> {
        if args.len() < self.params.len() {
            return Err(AdaptError::ArgumentCount {
                expected: self.params.len(),
                got: Some(args.len()),
            });
        }
        (self.func)(args)
    }

    /// Invoke with a possibly absent argument list.
    pub fn call_opt(&self, args: Option<&[Value]>) -> AdaptResult<Value> {
        match args {
            Some(args) => self.call(args),
            None if self.params.is_empty() => self.call(&[]),
            None => Err(AdaptError::ArgumentCount {
                expected: self.params.len(),
                got: None,
            }),
        }
    }
}

impl fmt::Debug for DynamicFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynamicFn")
            .field("params", &self.params)
            .field("ret", &self.ret)
            .finish()
    }
}

/// Two handles are equal when they share the same body.
impl PartialEq for DynamicFn {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.func, &other.func)
    }
}

impl Reflect for DynamicFn {
    fn shape() -> Shape {
        Shape::new(ShapeKind::Function {
            params: Vec::new(),
            ret: TypeHandle::of::<Value>(),
        })
    }
}

impl IntoValue for DynamicFn {
    fn into_value(self) -> Value {
        Value::Function(self)
    }
}

impl FromValue for DynamicFn {
    fn from_value(value: Value) -> crate::CoerceResult<Self> {
        match value {
            Value::Function(f) => Ok(f),
            other => Err(crate::CoerceError::conversion(
                &other,
                &TypeHandle::of::<DynamicFn>(),
            )),
        }
    }
}

// ============================================================================
// Widening
// ============================================================================

/// Typed closures convertible into a [`DynamicFn`].
///
/// `Marker` is the closure's `fn` signature; it only disambiguates the
/// per-arity implementations.
pub trait IntoDynamicFn<Marker> {
    /// Wrap into a uniform callable coercing arguments with `coercer`.
    fn into_dynamic(self, coercer: Coercer) -> DynamicFn;
}

/// Bind positional argument `index` to parameter type `T`.
///
/// Instances of `T` pass through untouched; anything else is coerced.
fn bind_arg<T: Reflect + FromValue>(coercer: &Coercer, args: &[Value], index: usize) -> AdaptResult<T> {
    let raw = args.get(index).cloned().unwrap_or(Value::Null);
    let target = TypeHandle::of::<T>();
    let from = raw.type_name();
    let converted = if coercer.is_instance(&raw, &target) {
        Ok(raw)
    } else {
        coercer.coerce(raw, &target)
    };
    converted
        .and_then(T::from_value)
        .map_err(|source| AdaptError::ArgumentConversion {
            index,
            from,
            to: target.to_string(),
            source,
        })
}

macro_rules! impl_into_dynamic {
    ($($arg:ident $idx:tt),*) => {
        impl<F, R, $($arg,)*> IntoDynamicFn<fn($($arg,)*) -> R> for F
        where
            F: Fn($($arg),*) -> R + Send + Sync + 'static,
            R: Reflect + IntoValue,
            $($arg: Reflect + FromValue,)*
        {
            #[allow(unused_variables)]
            fn into_dynamic(self, coercer: Coercer) -> DynamicFn {
                let params = vec![$(TypeHandle::of::<$arg>()),*];
                DynamicFn::new(params, TypeHandle::of::<R>(), move |args: &[Value]| {
                    Ok((self)($(bind_arg::<$arg>(&coercer, args, $idx)?),*).into_value())
                })
            }
        }
    };
}

impl_into_dynamic!();
impl_into_dynamic!(A0 0);
impl_into_dynamic!(A0 0, A1 1);
impl_into_dynamic!(A0 0, A1 1, A2 2);
impl_into_dynamic!(A0 0, A1 1, A2 2, A3 3);
impl_into_dynamic!(A0 0, A1 1, A2 2, A3 3, A4 4);
impl_into_dynamic!(A0 0, A1 1, A2 2, A3 3, A4 4, A5 5);
impl_into_dynamic!(A0 0, A1 1, A2 2, A3 3, A4 4, A5 5, A6 6);
impl_into_dynamic!(A0 0, A1 1, A2 2, A3 3, A4 4, A5 5, A6 6, A7 7);

/// Widen a typed closure using the global coercer.
pub fn widen<F, M>(f: F) -> DynamicFn
where
    F: IntoDynamicFn<M>,
{
    f.into_dynamic(Coercer::global().clone())
}

/// Widen a typed closure using an explicit coercer.
pub fn widen_with<F, M>(f: F, coercer: &Coercer) -> DynamicFn
where
    F: IntoDynamicFn<M>,
{
    f.into_dynamic(coercer.clone())
}

// ============================================================================
// Narrowing
// ============================================================================

/// Typed argument lists (tuples of arity 0 to 8).
pub trait IntoArgs: 'static {
    /// Declared parameter types.
    fn param_types() -> Vec<TypeHandle>;

    /// Convert into positional values.
    fn into_args(self) -> Vec<Value>;
}

impl IntoArgs for () {
    fn param_types() -> Vec<TypeHandle> {
        Vec::new()
    }

    fn into_args(self) -> Vec<Value> {
        Vec::new()
    }
}

macro_rules! impl_into_args {
    ($($arg:ident $idx:tt),+) => {
        impl<$($arg: Reflect + IntoValue),+> IntoArgs for ($($arg,)+) {
            fn param_types() -> Vec<TypeHandle> {
                vec![$(TypeHandle::of::<$arg>()),+]
            }

            fn into_args(self) -> Vec<Value> {
                vec![$(self.$idx.into_value()),+]
            }
        }
    };
}

impl_into_args!(A0 0);
impl_into_args!(A0 0, A1 1);
impl_into_args!(A0 0, A1 1, A2 2);
impl_into_args!(A0 0, A1 1, A2 2, A3 3);
impl_into_args!(A0 0, A1 1, A2 2, A3 3, A4 4);
impl_into_args!(A0 0, A1 1, A2 2, A3 3, A4 4, A5 5);
impl_into_args!(A0 0, A1 1, A2 2, A3 3, A4 4, A5 5, A6 6);
impl_into_args!(A0 0, A1 1, A2 2, A3 3, A4 4, A5 5, A6 6, A7 7);

/// A uniform callable viewed through a typed signature.
pub struct TypedFn<Args, R> {
    inner: DynamicFn,
    _signature: PhantomData<fn(Args) -> R>,
}

impl<Args: IntoArgs, R: Reflect + FromValue> TypedFn<Args, R> {
    /// Wrap a raw uniform closure.
    pub fn from_uniform(
        func: impl Fn(&[Value]) -> AdaptResult<Value> + Send + Sync + 'static,
    ) -> Self {
        TypedFn {
            inner: DynamicFn::new(Args::param_types(), TypeHandle::of::<R>(), func),
            _signature: PhantomData,
        }
    }

    /// Invoke. Arguments convert through `IntoValue` and the result through
    /// strict `FromValue`.
    pub fn call(&self, args: Args) -> AdaptResult<R> {
        let out = self.inner.call(&args.into_args())?;
        R::from_value(out).map_err(AdaptError::ReturnConversion)
    }

    /// The underlying uniform callable.
    pub fn as_dynamic(&self) -> &DynamicFn {
        &self.inner
    }

    /// Unwrap into the underlying uniform callable.
    pub fn into_dynamic(self) -> DynamicFn {
        self.inner
    }
}

/// View a uniform callable through a typed signature.
pub fn narrow<Args: IntoArgs, R: Reflect + FromValue>(f: DynamicFn) -> TypedFn<Args, R> {
    TypedFn {
        inner: f,
        _signature: PhantomData,
    }
}

impl<Args, R> Clone for TypedFn<Args, R> {
    fn clone(&self) -> Self {
        TypedFn {
            inner: self.inner.clone(),
            _signature: PhantomData,
        }
    }
}

impl<Args, R> fmt::Debug for TypedFn<Args, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TypedFn").field(&self.inner).finish()
    }
}

impl<Args: IntoArgs, R: Reflect> Reflect for TypedFn<Args, R> {
    fn shape() -> Shape {
        Shape::new(ShapeKind::Function {
            params: Args::param_types(),
            ret: TypeHandle::of::<R>(),
        })
    }
}

impl<Args, R> IntoValue for TypedFn<Args, R> {
    fn into_value(self) -> Value {
        Value::Function(self.inner)
    }
}

impl<Args: IntoArgs, R: Reflect + FromValue> FromValue for TypedFn<Args, R> {
    fn from_value(value: Value) -> crate::CoerceResult<Self> {
        match value {
            Value::Function(f) => Ok(narrow(f)),
            other => Err(crate::CoerceError::conversion(&other, &TypeHandle::of::<Self>())),
        }
    }
}

// ============================================================================
// FunctionRegistry
// ============================================================================

/// Name-keyed registry of uniform callables.
#[derive(Clone, Default)]
pub struct FunctionRegistry {
    functions: HashMap<String, DynamicFn>,
}

impl FunctionRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a uniform callable by name, replacing any previous one.
    pub fn register(&mut self, name: &str, func: DynamicFn) {
        self.functions.insert(name.to_string(), func);
    }

    /// Widen and register a typed closure.
    pub fn register_fn<F, M>(&mut self, name: &str, f: F)
    where
        F: IntoDynamicFn<M>,
    {
        self.register(name, widen(f));
    }

    /// Get a callable by name
    pub fn get(&self, name: &str) -> Option<DynamicFn> {
        self.functions.get(name).cloned()
    }

    /// Check if a callable is registered
    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.functions.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Get the number of registered callables
    pub fn len(&self) -> usize {
        self.functions.len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    /// Invoke a callable by name.
    pub fn call(&self, name: &str, args: &[Value]) -> AdaptResult<Value> {
        match self.functions.get(name) {
            Some(func) => func.call(args),
            None => Err(AdaptError::UnknownFunction(name.to_string())),
        }
    }
}

impl fmt::Debug for FunctionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionRegistry")
            .field("names", &self.names())
            .finish()
    }
}
