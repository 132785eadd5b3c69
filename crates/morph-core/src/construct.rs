//! Instance factory
//!
//! Builds values of a reflected type from positional arguments, using the
//! constructors recorded in the type's descriptor.

use crate::coerce::Coercer;
use crate::error::{CoerceError, CoerceResult};
use crate::shape::{Reflect, TypeHandle};
use crate::value::{FromValue, Value};

impl Coercer {
    /// Create an instance of `ty`.
    ///
    /// With no arguments this is the type's default value. Otherwise the
    /// first constructor whose arity matches and whose parameters all accept
    /// the arguments (after coercion) is used.
    pub fn create_instance(&self, ty: &TypeHandle, args: &[Value]) -> CoerceResult<Value> {
        let descriptor = self.cache().descriptor(ty);
        let unsupported = || CoerceError::UnsupportedConstruction {
            ty: ty.to_string(),
            args: args.iter().map(Value::type_name).collect(),
        };

        if args.is_empty() {
            return descriptor.default_value().ok_or_else(unsupported);
        }

        for constructor in descriptor.constructors() {
            if constructor.params.len() != args.len() {
                continue;
            }
            let bound = args
                .iter()
                .zip(&constructor.params)
                .map(|(arg, param)| self.coerce(arg.clone(), param))
                .collect::<CoerceResult<Vec<_>>>();
            match bound {
                Ok(bound) => return (constructor.build)(bound),
                Err(err) => log::trace!("constructor of {} rejected arguments: {}", ty, err),
            }
        }
        Err(unsupported())
    }

    /// Create an instance of `T`.
    pub fn create<T: Reflect + FromValue>(&self, args: &[Value]) -> CoerceResult<T> {
        let value = self.create_instance(&TypeHandle::of::<T>(), args)?;
        T::from_value(value)
    }
}
