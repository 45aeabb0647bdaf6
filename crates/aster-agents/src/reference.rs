// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Counted, lazily resolving handles to registry resources.

use aster_core::resource::{downcast_resource, Resource, ResourceId, ResourceState, TypedResource};
use std::{
    collections::{HashMap, HashSet},
    fmt,
    marker::PhantomData,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex, PoisonError, Weak,
    },
};

/// The lookup a reference resolves itself through.
pub trait ResourceProvider: Send + Sync {
    /// The loaded object of `id`, or the state explaining why there is none.
    fn get_resource(&self, id: &ResourceId) -> Result<Arc<dyn Resource>, ResourceState>;
}

/// Something a [`ResourceReference`] can point to: a concrete resource kind,
/// or `dyn Resource` for untyped handles.
pub trait ReferenceTarget: Send + Sync + 'static {
    /// Converts a shared resource into this target, `None` on a kind mismatch.
    fn from_resource(resource: Arc<dyn Resource>) -> Option<Arc<Self>>;

    /// Human readable name of the target, for diagnostics.
    fn target_name() -> String;
}

impl<T: TypedResource> ReferenceTarget for T {
    fn from_resource(resource: Arc<dyn Resource>) -> Option<Arc<Self>> {
        downcast_resource::<T>(resource)
    }

    fn target_name() -> String {
        format!("{} ({})", T::TYPE, std::any::type_name::<T>())
    }
}

impl ReferenceTarget for dyn Resource {
    fn from_resource(resource: Arc<dyn Resource>) -> Option<Arc<Self>> {
        Some(resource)
    }

    fn target_name() -> String {
        "any resource".to_string()
    }
}

/// Tracks every live [`ResourceReference`] by id.
///
/// Each handle holds one token; clones take a new one and drops give theirs
/// back, so the count per id is exactly the number of live handles. Handles
/// keep their manager alive, so the owner reports leaks through
/// [`outstanding`](Self::outstanding) when it shuts down.
#[derive(Default)]
pub struct ReferenceManager {
    next_token: AtomicU64,
    entries: Mutex<HashMap<ResourceId, HashSet<u64>>>,
}

impl ReferenceManager {
    /// Creates an empty manager.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new handle to `id` and returns its token.
    pub fn register(&self, id: &ResourceId) -> u64 {
        let token = self.next_token.fetch_add(1, Ordering::Relaxed);
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(id.clone())
            .or_default()
            .insert(token);
        token
    }

    /// Releases the handle behind `token`.
    pub fn unregister(&self, id: &ResourceId, token: u64) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let removed = match entries.get_mut(id) {
            Some(tokens) => {
                let removed = tokens.remove(&token);
                if tokens.is_empty() {
                    entries.remove(id);
                }
                removed
            }
            None => false,
        };
        if !removed {
            log::error!("Reference token {token} for '{id}' was released twice");
        }
    }

    /// Number of live handles to `id`.
    pub fn count(&self, id: &ResourceId) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .map_or(0, HashSet::len)
    }

    /// Every id with live handles and how many, sorted by id.
    pub fn outstanding(&self) -> Vec<(ResourceId, usize)> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let mut outstanding: Vec<_> = entries
            .iter()
            .map(|(id, tokens)| (id.clone(), tokens.len()))
            .collect();
        outstanding.sort();
        outstanding
    }
}

impl fmt::Debug for ReferenceManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReferenceManager")
            .field("outstanding", &self.outstanding().len())
            .finish()
    }
}

struct Binding {
    provider: Weak<dyn ResourceProvider>,
    manager: Arc<ReferenceManager>,
    token: u64,
}

struct Cached<T: ?Sized> {
    state: ResourceState,
    resource: Option<Arc<T>>,
}

/// A handle to one resource id.
///
/// The handle resolves lazily: [`get_state`](Self::get_state) asks the registry
/// until the resource is `Loaded` or `Error`, then keeps that answer. Handles
/// of the wrong kind log the mismatch once and never yield an object.
pub struct ResourceReference<T: ?Sized + ReferenceTarget> {
    id: ResourceId,
    binding: Option<Binding>,
    cache: Mutex<Cached<T>>,
    _target: PhantomData<fn() -> Arc<T>>,
}

impl<T: ?Sized + ReferenceTarget> ResourceReference<T> {
    /// A handle bound to `id`, resolving through `provider`.
    pub fn new(
        id: ResourceId,
        provider: Weak<dyn ResourceProvider>,
        manager: Arc<ReferenceManager>,
    ) -> Self {
        if id.is_null() {
            return Self::null();
        }
        let token = manager.register(&id);
        Self {
            id,
            binding: Some(Binding {
                provider,
                manager,
                token,
            }),
            cache: Mutex::new(Cached {
                state: ResourceState::Unknown,
                resource: None,
            }),
            _target: PhantomData,
        }
    }

    /// A handle bound to nothing. Its state is always `Null`.
    pub fn null() -> Self {
        Self {
            id: ResourceId::null(),
            binding: None,
            cache: Mutex::new(Cached {
                state: ResourceState::Null,
                resource: None,
            }),
            _target: PhantomData,
        }
    }

    /// The id this handle is bound to.
    pub fn id(&self) -> &ResourceId {
        &self.id
    }

    /// Resolves and returns the current state.
    pub fn get_state(&self) -> ResourceState {
        let Some(binding) = &self.binding else {
            return ResourceState::Null;
        };
        let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        if cache.state.is_terminal() {
            return cache.state;
        }

        let Some(provider) = binding.provider.upgrade() else {
            // The registry is gone; nothing can become available any more.
            if cache.state != ResourceState::Unknown {
                return cache.state;
            }
            cache.state = ResourceState::Missing;
            return cache.state;
        };

        cache.state = match provider.get_resource(&self.id) {
            Ok(resource) => {
                let actual = resource.resource_type();
                match T::from_resource(resource) {
                    Some(resource) => {
                        cache.resource = Some(resource);
                        ResourceState::Loaded
                    }
                    None => {
                        log::error!(
                            "Reference to '{}' expects {} but the resource is a {}",
                            self.id,
                            T::target_name(),
                            actual
                        );
                        ResourceState::Error
                    }
                }
            }
            Err(state) => state,
        };
        cache.state
    }

    /// Returns `true` once the object is available through this handle.
    pub fn is_valid(&self) -> bool {
        self.get_state() == ResourceState::Loaded
    }

    /// The object, once loaded.
    pub fn get(&self) -> Option<Arc<T>> {
        self.get_state();
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .resource
            .clone()
    }

    /// A handle to the same id with another target kind.
    pub fn cast<U: ?Sized + ReferenceTarget>(&self) -> ResourceReference<U> {
        match &self.binding {
            Some(binding) => ResourceReference::new(
                self.id.clone(),
                binding.provider.clone(),
                binding.manager.clone(),
            ),
            None => ResourceReference::null(),
        }
    }
}

impl<T: ?Sized + ReferenceTarget> Clone for ResourceReference<T> {
    fn clone(&self) -> Self {
        let cloned = self.cast::<T>();
        {
            let cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
            let mut target = cloned.cache.lock().unwrap_or_else(PoisonError::into_inner);
            target.state = cache.state;
            target.resource = cache.resource.clone();
        }
        cloned
    }
}

impl<T: ?Sized + ReferenceTarget> Drop for ResourceReference<T> {
    fn drop(&mut self) {
        if let Some(binding) = &self.binding {
            binding.manager.unregister(&self.id, binding.token);
        }
    }
}

impl<T: ?Sized + ReferenceTarget> Default for ResourceReference<T> {
    fn default() -> Self {
        Self::null()
    }
}

impl<T: ?Sized + ReferenceTarget> fmt::Debug for ResourceReference<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self
            .cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .state;
        f.debug_struct("ResourceReference")
            .field("id", &self.id)
            .field("target", &T::target_name())
            .field("state", &state)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aster_core::resource::ResourceType;

    struct Heightmap(u32);
    impl TypedResource for Heightmap {
        const TYPE: ResourceType = ResourceType::Texture;
    }

    struct Voice;
    impl TypedResource for Voice {
        const TYPE: ResourceType = ResourceType::Font;
    }

    /// Serves one resource and reports every other id as pending.
    struct OneResource {
        id: ResourceId,
        resource: Mutex<Option<Arc<dyn Resource>>>,
    }

    impl ResourceProvider for OneResource {
        fn get_resource(&self, id: &ResourceId) -> Result<Arc<dyn Resource>, ResourceState> {
            if *id != self.id {
                return Err(ResourceState::Missing);
            }
            self.resource
                .lock()
                .unwrap()
                .clone()
                .ok_or(ResourceState::Pending)
        }
    }

    fn setup() -> (Arc<OneResource>, Arc<ReferenceManager>) {
        let provider = Arc::new(OneResource {
            id: ResourceId::new("h.png"),
            resource: Mutex::new(None),
        });
        (provider, Arc::new(ReferenceManager::new()))
    }

    fn reference<T: ?Sized + ReferenceTarget>(
        id: &str,
        provider: &Arc<OneResource>,
        manager: &Arc<ReferenceManager>,
    ) -> ResourceReference<T> {
        let weak: Weak<OneResource> = Arc::downgrade(provider);
        ResourceReference::new(ResourceId::new(id), weak, manager.clone())
    }

    #[test]
    fn resolves_once_loaded_and_caches() {
        let (provider, manager) = setup();
        let handle = reference::<Heightmap>("h.png", &provider, &manager);
        assert_eq!(handle.get_state(), ResourceState::Pending);
        assert!(handle.get().is_none());

        *provider.resource.lock().unwrap() = Some(Arc::new(Heightmap(3)));
        assert_eq!(handle.get().map(|h| h.0), Some(3));

        // Loaded is final even if the provider changes its answer.
        *provider.resource.lock().unwrap() = None;
        assert_eq!(handle.get_state(), ResourceState::Loaded);
    }

    #[test]
    fn clones_are_counted_and_released() {
        let (provider, manager) = setup();
        let handle = reference::<Heightmap>("h.png", &provider, &manager);
        let clones: Vec<_> = (0..5).map(|_| handle.clone()).collect();
        assert_eq!(manager.count(handle.id()), 6);

        drop(clones);
        assert_eq!(manager.count(handle.id()), 1);
        drop(handle);
        assert!(manager.outstanding().is_empty());
    }

    #[test]
    fn kind_mismatch_makes_the_handle_unusable() {
        let (provider, manager) = setup();
        *provider.resource.lock().unwrap() = Some(Arc::new(Heightmap(1)));

        let wrong = reference::<Voice>("h.png", &provider, &manager);
        assert_eq!(wrong.get_state(), ResourceState::Error);
        assert!(wrong.get().is_none());

        let untyped = wrong.cast::<dyn Resource>();
        assert!(untyped.is_valid());
        assert_eq!(untyped.get().unwrap().resource_type(), ResourceType::Texture);
    }

    #[test]
    fn null_and_missing_handles() {
        let (provider, manager) = setup();
        let null = ResourceReference::<Heightmap>::null();
        assert_eq!(null.get_state(), ResourceState::Null);
        assert_eq!(null.clone().get_state(), ResourceState::Null);

        let missing = reference::<Heightmap>("nope.png", &provider, &manager);
        assert_eq!(missing.get_state(), ResourceState::Missing);
        assert_eq!(manager.count(&ResourceId::new("nope.png")), 1);
    }

    #[test]
    fn handles_outliving_the_provider_report_missing() {
        let (provider, manager) = setup();
        let handle = reference::<Heightmap>("h.png", &provider, &manager);
        drop(provider);
        assert_eq!(handle.get_state(), ResourceState::Missing);
    }

    #[test]
    fn handles_keep_their_manager_alive() {
        let (provider, manager) = setup();
        let handle = reference::<Heightmap>("h.png", &provider, &manager);
        let observer = Arc::downgrade(&manager);
        drop(manager);

        let manager = observer.upgrade().expect("the handle holds the manager");
        assert_eq!(manager.outstanding(), vec![(ResourceId::new("h.png"), 1)]);
        drop(manager);

        drop(handle);
        assert!(observer.upgrade().is_none());
    }
}
