//! Member metadata cache
//!
//! Memoizes one [`TypeDescriptor`] per type and one [`MemberDescriptor`]
//! per (type, member). Lookups are lock-free on hit; on a miss the
//! descriptor is computed outside any lock and inserted if absent, so
//! concurrent first queries converge on the first inserted instance.
//!
//! Entries are never evicted. [`MetadataCache::clear`] resets the cache.

use crate::classify::{compute_flags, element_of};
use crate::metadata::{
    AttributeProvider, DefaultFn, MemberDescriptor, MemberKind, MetadataProvider, TypeDescriptor,
};
use crate::shape::{Constructor, ShapeKind, TypeHandle};
use crate::value::{Collection, EnumValue, Record, Value};
use crate::Reflect;
use dashmap::DashMap;
use parking_lot::RwLock;
use rustc_hash::FxHasher;
use std::any::TypeId;
use std::hash::BuildHasherDefault;
use std::sync::{Arc, LazyLock};

type FxBuild = BuildHasherDefault<FxHasher>;

static GLOBAL: LazyLock<Arc<MetadataCache>> = LazyLock::new(|| Arc::new(MetadataCache::new()));

/// Process-wide or injected cache of type and member metadata.
pub struct MetadataCache {
    types: DashMap<TypeId, Arc<TypeDescriptor>, FxBuild>,
    members: DashMap<(TypeId, String), Arc<MemberDescriptor>, FxBuild>,
    providers: RwLock<Vec<Arc<dyn MetadataProvider>>>,
}

impl MetadataCache {
    /// Create a cache that reads `#[derive(Reflect)]` annotations.
    pub fn new() -> Self {
        Self::with_providers(vec![Arc::new(AttributeProvider)])
    }

    /// Create a cache with an explicit provider list (earlier entries are
    /// consulted last).
    pub fn with_providers(providers: Vec<Arc<dyn MetadataProvider>>) -> Self {
        MetadataCache {
            types: DashMap::default(),
            members: DashMap::default(),
            providers: RwLock::new(providers),
        }
    }

    /// Add a provider on top of the existing ones.
    pub fn with_provider(self, provider: Arc<dyn MetadataProvider>) -> Self {
        self.add_provider(provider);
        self
    }

    /// The process-wide cache.
    pub fn global() -> Arc<MetadataCache> {
        Arc::clone(&GLOBAL)
    }

    /// Register a provider. It takes precedence over every provider
    /// registered before it. Cached member metadata is discarded.
    pub fn add_provider(&self, provider: Arc<dyn MetadataProvider>) {
        log::debug!("registering metadata provider '{}'", provider.name());
        self.providers.write().push(provider);
        self.members.clear();
    }

    /// Number of registered providers.
    pub fn provider_count(&self) -> usize {
        self.providers.read().len()
    }

    /// Descriptor for `handle`, computed on first use.
    pub fn descriptor(&self, handle: &TypeHandle) -> Arc<TypeDescriptor> {
        let id = handle.id();
        let cached = self.types.get(&id).map(|entry| Arc::clone(entry.value()));
        if let Some(descriptor) = cached {
            return descriptor;
        }

        let built = Arc::new(self.build_descriptor(*handle));
        let entry = self.types.entry(id).or_insert(built);
        Arc::clone(entry.value())
    }

    /// Descriptor for `T`.
    pub fn descriptor_of<T: Reflect>(&self) -> Arc<TypeDescriptor> {
        self.descriptor(&TypeHandle::of::<T>())
    }

    /// Member metadata for `name` on `owner`, computed on first use.
    ///
    /// Unknown names yield an undeclared member whose description and
    /// display name are the bare name.
    pub fn field(&self, owner: &TypeDescriptor, name: &str) -> Arc<MemberDescriptor> {
        let key = (owner.handle().id(), name.to_string());
        let cached = self.members.get(&key).map(|entry| Arc::clone(entry.value()));
        if let Some(member) = cached {
            return member;
        }

        let built = Arc::new(self.build_member(owner, name));
        let entry = self.members.entry(key).or_insert(built);
        Arc::clone(entry.value())
    }

    /// Member metadata by type handle.
    pub fn member(&self, owner: &TypeHandle, name: &str) -> Arc<MemberDescriptor> {
        let descriptor = self.descriptor(owner);
        self.field(&descriptor, name)
    }

    /// Declared members of `owner`, in declaration order.
    pub fn members(&self, owner: &TypeHandle) -> Vec<Arc<MemberDescriptor>> {
        let descriptor = self.descriptor(owner);
        descriptor
            .members()
            .into_iter()
            .map(|name| self.field(&descriptor, name))
            .collect()
    }

    /// Type-level description, falling back to the short type name.
    pub fn type_description(&self, handle: &TypeHandle) -> String {
        let descriptor = self.descriptor(handle);
        let providers = self.providers.read().clone();
        providers
            .iter()
            .rev()
            .find_map(|p| p.type_description(&descriptor))
            .unwrap_or_else(|| descriptor.name())
    }

    /// Number of cached type descriptors.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Check whether no type descriptor is cached.
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Drop every cached descriptor. Providers are kept.
    pub fn clear(&self) {
        self.types.clear();
        self.members.clear();
    }

    fn build_descriptor(&self, handle: TypeHandle) -> TypeDescriptor {
        log::debug!("building type descriptor for {}", handle);
        let shape = handle.shape();
        let flags = compute_flags(&shape);
        let element_type = element_of(&shape);

        let default: Option<DefaultFn> = match shape.default {
            Some(f) => Some(Arc::new(f) as DefaultFn),
            None => self.derived_default(handle, &shape.kind),
        };

        let mut constructors = shape.constructors.clone();
        match &shape.kind {
            ShapeKind::Struct(fields) => {
                let names: Vec<&'static str> = fields.iter().map(|f| f.name).collect();
                constructors.push(Constructor::new(
                    fields.iter().map(|f| f.ty).collect(),
                    move |args| {
                        let mut record = Record::new(handle);
                        for (name, value) in names.iter().zip(args) {
                            record.insert(*name, value);
                        }
                        Ok(Value::Record(record))
                    },
                ));
            }
            ShapeKind::Tuple(elems) => {
                constructors.push(Constructor::new(elems.clone(), move |args| {
                    Ok(Value::Tuple(Collection::with_items(handle, args)))
                }));
            }
            _ => {}
        }

        TypeDescriptor {
            handle,
            shape,
            flags,
            element_type,
            default,
            constructors,
        }
    }

    /// Default for types whose shape declares none: member-wise for
    /// structs, element-wise for tuples and arrays, the zero variant for
    /// enums.
    fn derived_default(&self, handle: TypeHandle, kind: &ShapeKind) -> Option<DefaultFn> {
        match kind {
            ShapeKind::Struct(fields) => {
                let members = fields
                    .iter()
                    .map(|f| Some((f.name, self.descriptor(&f.ty).default.clone()?)))
                    .collect::<Option<Vec<_>>>()?;
                Some(Arc::new(move || {
                    let mut record = Record::new(handle);
                    for (name, factory) in &members {
                        record.insert(*name, factory());
                    }
                    Value::Record(record)
                }))
            }
            ShapeKind::Tuple(elems) => {
                let factories = elems
                    .iter()
                    .map(|e| self.descriptor(e).default.clone())
                    .collect::<Option<Vec<_>>>()?;
                Some(Arc::new(move || {
                    Value::Tuple(Collection::with_items(
                        handle,
                        factories.iter().map(|f| f()).collect(),
                    ))
                }))
            }
            ShapeKind::Array(elem, len) => {
                let factory = self.descriptor(elem).default.clone()?;
                let len = *len;
                Some(Arc::new(move || {
                    Value::List(Collection::with_items(
                        handle,
                        (0..len).map(|_| factory()).collect(),
                    ))
                }))
            }
            ShapeKind::Enum(variants) => {
                let zero = variants
                    .iter()
                    .find(|v| v.discriminant == 0)
                    .or_else(|| variants.first())?;
                let value = EnumValue::new(handle, zero.discriminant, zero.name);
                Some(Arc::new(move || Value::Enum(value)))
            }
            _ => None,
        }
    }

    fn build_member(&self, owner: &TypeDescriptor, name: &str) -> MemberDescriptor {
        let providers = self.providers.read().clone();
        let description = providers
            .iter()
            .rev()
            .find_map(|p| p.description(owner, name))
            .unwrap_or_else(|| name.to_string());
        let display_name = providers
            .iter()
            .rev()
            .find_map(|p| p.display_name(owner, name))
            .unwrap_or_else(|| name.to_string());

        let (kind, member_type, discriminant) = if let Some(field) = owner.field_info(name) {
            (MemberKind::Field, Some(field.ty), None)
        } else if let Some(variant) = owner.variant_info(name) {
            (MemberKind::Variant, Some(owner.handle()), Some(variant.discriminant))
        } else {
            (MemberKind::Undeclared, None, None)
        };

        MemberDescriptor {
            owner: owner.handle(),
            name: name.to_string(),
            description,
            display_name,
            member_type,
            kind,
            discriminant,
        }
    }
}

impl Default for MetadataCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::SideTable;
    use crate::shape::{FieldInfo, Shape, VariantInfo};
    use std::thread;

    struct Point;

    impl Reflect for Point {
        fn shape() -> Shape {
            Shape::new(ShapeKind::Struct(vec![
                FieldInfo::new::<i32>("x").with_description("Horizontal offset"),
                FieldInfo::new::<i32>("y").with_display("Y axis"),
                FieldInfo::new::<Option<String>>("label"),
            ]))
            .with_description("A point")
        }
    }

    struct Level;

    impl Reflect for Level {
        fn shape() -> Shape {
            Shape::new(ShapeKind::Enum(vec![
                VariantInfo::new("Low", 1),
                VariantInfo::new("Off", 0).with_display("Disabled"),
                VariantInfo::new("High", 5),
            ]))
        }
    }

    #[test]
    fn test_descriptor_is_memoized() {
        let cache = MetadataCache::new();
        let a = cache.descriptor_of::<Vec<i32>>();
        let b = cache.descriptor_of::<Vec<i32>>();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(cache.len(), 1);
        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_concurrent_first_query_converges() {
        let cache = Arc::new(MetadataCache::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                thread::spawn(move || cache.descriptor_of::<(i32, String)>())
            })
            .collect();
        let descriptors: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        for d in &descriptors[1..] {
            assert!(Arc::ptr_eq(d, &descriptors[0]));
            assert_eq!(d.flags(), descriptors[0].flags());
        }
    }

    #[test]
    fn test_struct_default_is_memberwise() {
        let cache = MetadataCache::new();
        let descriptor = cache.descriptor_of::<Point>();
        let Some(Value::Record(record)) = descriptor.default_value() else {
            panic!("expected a record default");
        };
        assert_eq!(record.get("x"), Some(&Value::I32(0)));
        assert_eq!(record.get("label"), Some(&Value::Null));
        assert_eq!(descriptor.constructors().len(), 1);
    }

    #[test]
    fn test_enum_default_is_zero_variant() {
        let cache = MetadataCache::new();
        let default = cache.descriptor_of::<Level>().default_value();
        match default {
            Some(Value::Enum(e)) => assert_eq!(e.name, "Off"),
            other => panic!("unexpected default {:?}", other),
        }
    }

    #[test]
    fn test_member_metadata_fallbacks() {
        let cache = MetadataCache::new();
        let x = cache.member(&TypeHandle::of::<Point>(), "x");
        assert_eq!(x.description(), "Horizontal offset");
        assert_eq!(x.display_name(), "x");
        assert!(x.can_write());

        let y = cache.member(&TypeHandle::of::<Point>(), "y");
        assert_eq!(y.description(), "y");
        assert_eq!(y.display_name(), "Y axis");

        let missing = cache.member(&TypeHandle::of::<Point>(), "z");
        assert!(!missing.is_declared());
        assert_eq!(missing.description(), "z");

        let off = cache.member(&TypeHandle::of::<Level>(), "Off");
        assert_eq!(off.display_name(), "Disabled");
        assert_eq!(off.discriminant(), Some(0));
        assert!(off.can_read() && !off.can_write());
    }

    #[test]
    fn test_side_table_overrides_attributes() {
        let cache = MetadataCache::new();
        let before = cache.member(&TypeHandle::of::<Point>(), "x");
        assert_eq!(before.description(), "Horizontal offset");

        let table = SideTable::new();
        table.describe::<Point>("x", "Column index");
        table.describe_type::<Point>("Grid cell");
        cache.add_provider(Arc::new(table));

        let after = cache.member(&TypeHandle::of::<Point>(), "x");
        assert_eq!(after.description(), "Column index");
        assert_eq!(cache.type_description(&TypeHandle::of::<Point>()), "Grid cell");
        assert_eq!(cache.type_description(&TypeHandle::of::<Level>()), "Level");
    }
}
