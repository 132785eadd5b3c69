//! Type and member descriptors, and metadata providers
//!
//! Descriptors are built by [`MetadataCache`](crate::MetadataCache) and
//! shared as `Arc`s; nothing here is mutated after construction.

use crate::coerce::Coercer;
use crate::error::{CoerceError, CoerceResult};
use crate::shape::{Constructor, FieldInfo, Shape, ShapeKind, TypeHandle, VariantInfo};
use crate::value::{EnumValue, Record, Value};
use dashmap::DashMap;
use std::any::TypeId;
use std::fmt;
use std::sync::Arc;

/// Shared zero-argument factory.
pub type DefaultFn = Arc<dyn Fn() -> Value + Send + Sync>;

// ============================================================================
// TypeDescriptor
// ============================================================================

/// Cached classification facts for a type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TypeFlags {
    /// List, array or set
    pub collection: bool,
    /// Key-value map
    pub dictionary: bool,
    /// Integer or float, through `Option`
    pub numeric: bool,
    /// `f32` or `f64`, through `Option`
    pub float: bool,
    /// `bool`, through `Option`
    pub boolean: bool,
    /// Date, date-time or UTC date-time, through `Option`
    pub date: bool,
    /// Callable
    pub delegate: bool,
    /// Positional tuple
    pub tuple: bool,
    /// Accepts the absent value (`Option<_>` and `Value`)
    pub nullable: bool,
    /// Primitive or enum, through `Option`
    pub basic: bool,
    /// Fieldless enum
    pub enumeration: bool,
}

/// Everything the coercer needs to know about a type, computed once.
pub struct TypeDescriptor {
    pub(crate) handle: TypeHandle,
    pub(crate) shape: Shape,
    pub(crate) flags: TypeFlags,
    pub(crate) element_type: Option<TypeHandle>,
    pub(crate) default: Option<DefaultFn>,
    pub(crate) constructors: Vec<Constructor>,
}

impl TypeDescriptor {
    /// Type handle.
    pub fn handle(&self) -> TypeHandle {
        self.handle
    }

    /// Short type name.
    pub fn name(&self) -> String {
        self.handle.short_name()
    }

    /// Reflected shape.
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Classification flags.
    pub fn flags(&self) -> TypeFlags {
        self.flags
    }

    /// Item type of a list, array or set.
    pub fn element_type(&self) -> Option<TypeHandle> {
        self.element_type
    }

    /// Whether a default value can be produced.
    pub fn has_default(&self) -> bool {
        self.default.is_some()
    }

    /// A fresh default value, if the type has one.
    pub fn default_value(&self) -> Option<Value> {
        self.default.as_ref().map(|f| f())
    }

    /// Explicit constructors followed by the derived member-wise or
    /// positional constructor.
    pub fn constructors(&self) -> &[Constructor] {
        &self.constructors
    }

    /// Declared member names in order: struct fields or enum variants.
    pub fn members(&self) -> Vec<&'static str> {
        match &self.shape.kind {
            ShapeKind::Struct(fields) => fields.iter().map(|f| f.name).collect(),
            ShapeKind::Enum(variants) => variants.iter().map(|v| v.name).collect(),
            _ => Vec::new(),
        }
    }

    /// Declared struct field, by exact name.
    pub fn field_info(&self, name: &str) -> Option<&FieldInfo> {
        self.shape.fields()?.iter().find(|f| f.name == name)
    }

    /// Declared enum variant, by exact name.
    pub fn variant_info(&self, name: &str) -> Option<&VariantInfo> {
        self.shape.variants()?.iter().find(|v| v.name == name)
    }

    /// Check whether `value` can be used as this type without conversion.
    pub fn is_instance(&self, value: &Value) -> bool {
        if matches!(self.shape.kind, ShapeKind::Dynamic) {
            return true;
        }
        let Some(runtime) = value.runtime_type() else {
            return false;
        };
        match &self.shape.kind {
            ShapeKind::Optional(inner) => runtime == *inner || runtime == self.handle,
            _ => runtime == self.handle,
        }
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("type", &self.handle)
            .field("flags", &self.flags)
            .field("element_type", &self.element_type)
            .field("has_default", &self.has_default())
            .field("constructors", &self.constructors.len())
            .finish()
    }
}

// ============================================================================
// MemberDescriptor
// ============================================================================

/// What a member name refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberKind {
    /// Struct field (readable and writable)
    Field,
    /// Enum variant (read-only)
    Variant,
    /// Not declared by the type
    Undeclared,
}

/// Cached metadata for one member of a type.
#[derive(Debug, Clone)]
pub struct MemberDescriptor {
    pub(crate) owner: TypeHandle,
    pub(crate) name: String,
    pub(crate) description: String,
    pub(crate) display_name: String,
    pub(crate) member_type: Option<TypeHandle>,
    pub(crate) kind: MemberKind,
    pub(crate) discriminant: Option<i64>,
}

impl MemberDescriptor {
    /// Owning type.
    pub fn owner(&self) -> TypeHandle {
        self.owner
    }

    /// Member name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Description, falling back to the member name.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Display name, falling back to the member name.
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Field type, or the enum type for variants.
    pub fn member_type(&self) -> Option<TypeHandle> {
        self.member_type
    }

    /// Member kind.
    pub fn kind(&self) -> MemberKind {
        self.kind
    }

    /// Declared by the owning type.
    pub fn is_declared(&self) -> bool {
        self.kind != MemberKind::Undeclared
    }

    /// Readable through [`get`](Self::get) or [`value`](Self::value).
    pub fn can_read(&self) -> bool {
        self.is_declared()
    }

    /// Writable through [`set`](Self::set).
    pub fn can_write(&self) -> bool {
        self.kind == MemberKind::Field
    }

    /// Underlying value of an enum variant.
    pub fn discriminant(&self) -> Option<i64> {
        self.discriminant
    }

    /// The enum value named by a variant member.
    pub fn value(&self) -> Option<Value> {
        let discriminant = self.discriminant?;
        let variants = self.owner.shape();
        let name = variants.variants()?.iter().find(|v| v.name == self.name)?.name;
        Some(Value::Enum(EnumValue::new(self.owner, discriminant, name)))
    }

    /// Read a field from a record.
    pub fn get<'r>(&self, record: &'r Record) -> Option<&'r Value> {
        match self.kind {
            MemberKind::Field => record.get(&self.name),
            _ => None,
        }
    }

    /// Coerce `value` to the field type and store it in `record`.
    pub fn set(&self, record: &mut Record, value: Value, coercer: &Coercer) -> CoerceResult<()> {
        match (self.kind, self.member_type) {
            (MemberKind::Field, Some(ty)) => {
                let coerced = coercer.coerce(value, &ty)?;
                record.insert(self.name.clone(), coerced);
                Ok(())
            }
            (MemberKind::Undeclared, _) => Err(CoerceError::UnknownMember {
                ty: self.owner.to_string(),
                member: self.name.clone(),
            }),
            _ => Err(CoerceError::ReadOnlyMember {
                ty: self.owner.to_string(),
                member: self.name.clone(),
            }),
        }
    }
}

// ============================================================================
// Metadata Providers
// ============================================================================

/// Source of human-readable member metadata.
///
/// Providers answer `None` when they have nothing to say, letting the next
/// provider (or the bare member name) decide.
pub trait MetadataProvider: Send + Sync {
    /// Provider name for logging
    fn name(&self) -> &str;

    /// Description of a member.
    fn description(&self, owner: &TypeDescriptor, member: &str) -> Option<String>;

    /// Display name of a member.
    fn display_name(&self, owner: &TypeDescriptor, member: &str) -> Option<String>;

    /// Description of the type itself.
    fn type_description(&self, _owner: &TypeDescriptor) -> Option<String> {
        None
    }
}

/// Reads annotations attached through `#[derive(Reflect)]`.
#[derive(Debug, Default, Clone, Copy)]
pub struct AttributeProvider;

impl AttributeProvider {
    fn annotations(owner: &TypeDescriptor, member: &str) -> (Option<&'static str>, Option<&'static str>) {
        if let Some(field) = owner.field_info(member) {
            (field.description, field.display)
        } else if let Some(variant) = owner.variant_info(member) {
            (variant.description, variant.display)
        } else {
            (None, None)
        }
    }
}

impl MetadataProvider for AttributeProvider {
    fn name(&self) -> &str {
        "attributes"
    }

    fn description(&self, owner: &TypeDescriptor, member: &str) -> Option<String> {
        Self::annotations(owner, member).0.map(str::to_string)
    }

    fn display_name(&self, owner: &TypeDescriptor, member: &str) -> Option<String> {
        Self::annotations(owner, member).1.map(str::to_string)
    }

    fn type_description(&self, owner: &TypeDescriptor) -> Option<String> {
        owner.shape.description.map(str::to_string)
    }
}

#[derive(Debug, Default, Clone)]
struct Annotations {
    description: Option<String>,
    display: Option<String>,
}

/// Runtime registry of member metadata for types that cannot carry
/// annotations.
///
/// ```ignore
/// let table = SideTable::new();
/// table.describe::<Point>("x", "Horizontal offset");
/// table.display::<Point>("x", "X");
/// cache.add_provider(Arc::new(table));
/// ```
#[derive(Debug, Default)]
pub struct SideTable {
    members: DashMap<(TypeId, String), Annotations>,
    types: DashMap<TypeId, String>,
}

impl SideTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a member description.
    pub fn describe<T: 'static>(&self, member: &str, description: impl Into<String>) -> &Self {
        self.members
            .entry((TypeId::of::<T>(), member.to_string()))
            .or_default()
            .description = Some(description.into());
        self
    }

    /// Register a member display name.
    pub fn display<T: 'static>(&self, member: &str, display: impl Into<String>) -> &Self {
        self.members
            .entry((TypeId::of::<T>(), member.to_string()))
            .or_default()
            .display = Some(display.into());
        self
    }

    /// Register a type-level description.
    pub fn describe_type<T: 'static>(&self, description: impl Into<String>) -> &Self {
        self.types.insert(TypeId::of::<T>(), description.into());
        self
    }

    /// Number of annotated members.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Check whether nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty() && self.types.is_empty()
    }

    fn lookup(&self, owner: &TypeDescriptor, member: &str) -> Option<Annotations> {
        self.members
            .get(&(owner.handle.id(), member.to_string()))
            .map(|entry| entry.value().clone())
    }
}

impl MetadataProvider for SideTable {
    fn name(&self) -> &str {
        "side-table"
    }

    fn description(&self, owner: &TypeDescriptor, member: &str) -> Option<String> {
        self.lookup(owner, member)?.description
    }

    fn display_name(&self, owner: &TypeDescriptor, member: &str) -> Option<String> {
        self.lookup(owner, member)?.display
    }

    fn type_description(&self, owner: &TypeDescriptor) -> Option<String> {
        self.types.get(&owner.handle.id()).map(|d| d.value().clone())
    }
}
