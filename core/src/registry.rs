//! Capability declarations: which renderer realizes which view type.
//!
//! Bindings are collected into a [`RegistryBuilder`] while backends and plugins
//! initialize, then frozen into an immutable [`RendererRegistry`]. Lookups are
//! keyed by the exact concrete [`TypeId`] of a view, so resolving never needs
//! reflection and never needs a lock.

use core::{
    any::{TypeId, type_name},
    fmt::{self, Debug},
};
use std::{
    collections::HashMap,
    sync::{Arc, OnceLock},
};

use crate::{
    error::BindingError,
    renderer::{ErasedRenderer, RenderedBy, Renderer, Typed},
    view::LogicalView,
};

type Factory = Box<dyn Fn() -> Box<dyn ErasedRenderer> + Send + Sync>;

/// How a binding entered the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BindingSource {
    /// Registered through [`RegistryBuilder::bind`] or [`RegistryBuilder::bind_with`].
    Explicit,
    /// Collected from a [`RenderedBy`] implementation on the view type.
    Declared,
}

/// An immutable pairing of one view type with one renderer type.
pub struct RendererBinding {
    view_type: &'static str,
    renderer_type: &'static str,
    source: BindingSource,
    factory: Factory,
}

impl Debug for RendererBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RendererBinding")
            .field("view_type", &self.view_type)
            .field("renderer_type", &self.renderer_type)
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}

impl RendererBinding {
    /// Name of the bound view type.
    #[must_use]
    pub const fn view_type(&self) -> &'static str {
        self.view_type
    }

    /// Name of the renderer type.
    #[must_use]
    pub const fn renderer_type(&self) -> &'static str {
        self.renderer_type
    }

    /// Which declaration mechanism produced this binding.
    #[must_use]
    pub const fn source(&self) -> BindingSource {
        self.source
    }

    pub(crate) fn instantiate(&self) -> Box<dyn ErasedRenderer> {
        (self.factory)()
    }
}

/// Collects bindings before they are frozen.
#[derive(Default)]
pub struct RegistryBuilder {
    bindings: HashMap<TypeId, RendererBinding>,
}

impl Debug for RegistryBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryBuilder")
            .field("bindings", &self.bindings.len())
            .finish()
    }
}

impl RegistryBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `V` to `R`, constructing a fresh `R` with [`Default`] per render.
    ///
    /// # Errors
    ///
    /// Returns [`BindingError::Duplicate`] if `V` already has a renderer.
    pub fn bind<V, R>(&mut self) -> Result<&mut Self, BindingError>
    where
        V: LogicalView,
        R: Renderer<V> + Default,
    {
        self.insert::<V, R>(BindingSource::Explicit, R::default)
    }

    /// Binds `V` to `R`, constructing each renderer instance with `factory`.
    ///
    /// # Errors
    ///
    /// Returns [`BindingError::Duplicate`] if `V` already has a renderer.
    pub fn bind_with<V, R>(
        &mut self,
        factory: impl Fn() -> R + Send + Sync + 'static,
    ) -> Result<&mut Self, BindingError>
    where
        V: LogicalView,
        R: Renderer<V>,
    {
        self.insert::<V, R>(BindingSource::Explicit, factory)
    }

    /// Collects the binding `V` declares through [`RenderedBy`].
    ///
    /// # Errors
    ///
    /// Returns [`BindingError::Duplicate`] if `V` already has a renderer, for
    /// example because it was also bound explicitly.
    pub fn declare<V: RenderedBy>(&mut self) -> Result<&mut Self, BindingError> {
        self.insert::<V, V::Renderer>(BindingSource::Declared, V::Renderer::default)
    }

    fn insert<V, R>(
        &mut self,
        source: BindingSource,
        factory: impl Fn() -> R + Send + Sync + 'static,
    ) -> Result<&mut Self, BindingError>
    where
        V: LogicalView,
        R: Renderer<V>,
    {
        let key = TypeId::of::<V>();
        if let Some(existing) = self.bindings.get(&key) {
            return Err(BindingError::Duplicate {
                view_type: type_name::<V>(),
                existing: existing.renderer_type,
                attempted: type_name::<R>(),
            });
        }

        tracing::trace!(
            view_type = type_name::<V>(),
            renderer = type_name::<R>(),
            ?source,
            "renderer bound"
        );
        self.bindings.insert(
            key,
            RendererBinding {
                view_type: type_name::<V>(),
                renderer_type: type_name::<R>(),
                source,
                factory: Box::new(move || -> Box<dyn ErasedRenderer> {
                    Box::new(Typed::<V, R>::new(factory()))
                }),
            },
        );
        Ok(self)
    }

    /// Freezes the collected bindings.
    #[must_use]
    pub fn build(self) -> RendererRegistry {
        RendererRegistry {
            bindings: self.bindings,
        }
    }
}

/// Read-only table from view type to renderer binding.
pub struct RendererRegistry {
    bindings: HashMap<TypeId, RendererBinding>,
}

impl Debug for RendererRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.bindings.values()).finish()
    }
}

static GLOBAL: OnceLock<Arc<RendererRegistry>> = OnceLock::new();

impl RendererRegistry {
    /// Starts collecting bindings.
    #[must_use]
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    /// Looks up the binding for an exact view type.
    #[must_use]
    pub fn binding_for(&self, view_type: TypeId) -> Option<&RendererBinding> {
        self.bindings.get(&view_type)
    }

    /// Whether `V` has a renderer.
    #[must_use]
    pub fn contains<V: LogicalView>(&self) -> bool {
        self.bindings.contains_key(&TypeId::of::<V>())
    }

    /// Number of bound view types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Whether no view type is bound.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Iterates over every binding, in no particular order.
    pub fn bindings(&self) -> impl Iterator<Item = &RendererBinding> {
        self.bindings.values()
    }

    /// Installs this registry as the process-wide one.
    ///
    /// # Errors
    ///
    /// Returns [`BindingError::GlobalAlreadyInstalled`] if a registry was
    /// installed before.
    pub fn install_global(self) -> Result<Arc<Self>, BindingError> {
        let registry = Arc::new(self);
        GLOBAL
            .set(registry.clone())
            .map_err(|_| BindingError::GlobalAlreadyInstalled)?;
        tracing::debug!(bindings = registry.len(), "global renderer registry installed");
        Ok(registry)
    }

    /// The process-wide registry, if one was installed.
    #[must_use]
    pub fn global() -> Option<Arc<Self>> {
        GLOBAL.get().cloned()
    }
}
