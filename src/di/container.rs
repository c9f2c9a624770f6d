use crate::di::Injectable;
use crate::error::{ContainerError, Result};
use dashmap::DashMap;
use std::any::{Any, TypeId};
use std::sync::Arc;

/// A type-erased service instance as stored by the container.
pub type Instance = Arc<dyn Any + Send + Sync>;

/// Type alias for a function that can cast an `Arc<dyn Any>` to another `Arc<dyn Any>`.
/// The inner value is usually an `Arc<dyn Trait>`.
type CasterFn = Arc<dyn Fn(Instance) -> Option<Instance> + Send + Sync>;

/// Builds a fresh instance on every resolution.
type FactoryFn = Arc<dyn Fn(&Container) -> Result<Instance> + Send + Sync>;

/// Thread-safe dependency injection container.
///
/// Services are keyed by `TypeId`. Every registration is also indexed under its
/// type name so callers that only know a name (see
/// [`DependencyResolver`](crate::di::DependencyResolver)) can resolve it.
pub struct Container {
    services: DashMap<TypeId, Instance>,
    factories: DashMap<TypeId, FactoryFn>,
    trait_mappings: DashMap<TypeId, TypeId>,
    casters: DashMap<TypeId, CasterFn>,
    names: DashMap<String, TypeId>,
}

impl Clone for Container {
    fn clone(&self) -> Self {
        Self {
            services: self.services.clone(),
            factories: self.factories.clone(),
            trait_mappings: self.trait_mappings.clone(),
            casters: self.casters.clone(),
            names: self.names.clone(),
        }
    }
}

impl Container {
    pub fn new() -> Self {
        Self {
            services: DashMap::new(),
            factories: DashMap::new(),
            trait_mappings: DashMap::new(),
            casters: DashMap::new(),
            names: DashMap::new(),
        }
    }

    /// Register a singleton instance, replacing any earlier registration of `T`
    pub fn register<T: 'static + Send + Sync>(&mut self, instance: T) -> &mut Self {
        let type_id = TypeId::of::<T>();
        self.factories.remove(&type_id);
        self.services.insert(type_id, Arc::new(instance));
        self.index_name::<T>();
        self
    }

    /// Register a factory that constructs a new `T` on every resolution.
    ///
    /// Replaces any earlier instance or factory registered for `T`.
    pub fn register_factory<T, F>(&mut self, factory: F) -> &mut Self
    where
        T: 'static + Send + Sync,
        F: Fn(&Container) -> Result<T> + 'static + Send + Sync,
    {
        let factory: FactoryFn = Arc::new(move |container: &Container| {
            factory(container).map(|value| Arc::new(value) as Instance)
        });
        let type_id = TypeId::of::<T>();
        self.services.remove(&type_id);
        self.factories.insert(type_id, factory);
        self.index_name::<T>();
        self
    }

    /// Register `T` so that it is built through [`Injectable::inject`]
    pub fn register_injectable<T: Injectable>(&mut self) -> &mut Self {
        self.register_factory::<T, _>(T::inject)
    }

    pub fn register_trait<Trait, Impl, F>(&mut self, caster_fn: F) -> &mut Self
    where
        Trait: ?Sized + 'static + Send + Sync,
        Impl: 'static + Send + Sync,
        F: Fn(Arc<Impl>) -> Arc<Trait> + 'static + Send + Sync,
    {
        let trait_id = TypeId::of::<Trait>();
        let impl_id = TypeId::of::<Impl>();

        self.trait_mappings.insert(trait_id, impl_id);

        let caster: CasterFn = Arc::new(move |instance: Instance| {
            let concrete = instance.downcast::<Impl>().ok()?;
            let trait_obj: Arc<Trait> = caster_fn(concrete);
            Some(Arc::new(trait_obj) as Instance) // Wrap the Arc<dyn Trait> in an Arc<dyn Any>
        });

        self.casters.insert(trait_id, caster);
        self.index_name::<Trait>();
        self
    }

    /// Make an already registered `T` resolvable under an extra name
    pub fn alias<T: ?Sized + 'static>(&mut self, name: impl Into<String>) -> &mut Self {
        self.names.insert(name.into(), TypeId::of::<T>());
        self
    }

    pub fn resolve<T: 'static + Send + Sync>(&self) -> Result<Arc<T>> {
        self.instance(TypeId::of::<T>(), std::any::type_name::<T>())?
            .downcast::<T>()
            .map_err(|_| ContainerError::downcast_failed::<T>())
    }

    pub fn resolve_trait<T: ?Sized + 'static + Send + Sync>(&self) -> Result<Arc<T>> {
        let requested_type_id = TypeId::of::<T>();
        let cast_result = self.cast(requested_type_id, std::any::type_name::<T>())?;

        // The caster returns an Arc<dyn Any> which holds an Arc<T>.
        let wrapper = cast_result
            .downcast::<Arc<T>>()
            .map_err(|_| ContainerError::downcast_failed::<Arc<T>>())?;
        Ok(wrapper.as_ref().clone())
    }

    /// Resolve a service by its type name or alias.
    ///
    /// Trait bindings resolve to an `Arc<dyn Any>` holding the `Arc<dyn Trait>`.
    pub fn resolve_by_name(&self, name: &str) -> Result<Instance> {
        let type_id = self
            .names
            .get(name)
            .map(|entry| *entry.value())
            .ok_or_else(|| ContainerError::DependencyNotFound {
                type_name: name.to_string(),
            })?;

        if self.trait_mappings.contains_key(&type_id) {
            self.cast(type_id, name)
        } else {
            self.instance(type_id, name)
        }
    }

    pub fn contains<T: ?Sized + 'static>(&self) -> bool {
        let type_id = TypeId::of::<T>();
        self.services.contains_key(&type_id)
            || self.factories.contains_key(&type_id)
            || self.trait_mappings.contains_key(&type_id)
    }

    /// Number of concrete types that can be resolved
    pub fn len(&self) -> usize {
        // A type lives in exactly one of the two maps.
        self.services.len() + self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty() && self.factories.is_empty()
    }

    fn index_name<T: ?Sized + 'static>(&self) {
        self.names
            .insert(std::any::type_name::<T>().to_string(), TypeId::of::<T>());
    }

    fn instance(&self, type_id: TypeId, type_name: &str) -> Result<Instance> {
        if let Some(entry) = self.services.get(&type_id) {
            return Ok(Arc::clone(entry.value()));
        }

        // Release the map guard before running the factory; it may resolve other services.
        let factory = self
            .factories
            .get(&type_id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| ContainerError::DependencyNotFound {
                type_name: type_name.to_string(),
            })?;
        factory(self)
    }

    fn cast(&self, trait_id: TypeId, type_name: &str) -> Result<Instance> {
        let caster = self
            .casters
            .get(&trait_id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| ContainerError::DependencyNotFound {
                type_name: type_name.to_string(),
            })?;

        let impl_type_id = self
            .trait_mappings
            .get(&trait_id)
            .map(|entry| *entry.value())
            .ok_or_else(|| ContainerError::DependencyNotFound {
                type_name: format!("No implementation mapping found for trait '{type_name}'"),
            })?;

        if !self.services.contains_key(&impl_type_id) && !self.factories.contains_key(&impl_type_id)
        {
            return Err(ContainerError::DependencyNotFound {
                type_name: format!("Implementation for trait '{type_name}' not registered"),
            });
        }
        let instance = self.instance(impl_type_id, type_name)?;

        caster(instance).ok_or_else(|| ContainerError::DowncastFailed {
            type_name: type_name.to_string(),
        })
    }
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}
