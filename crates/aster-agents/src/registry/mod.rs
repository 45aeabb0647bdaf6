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

//! The central registry: at most one load per id, shared results, and
//! save-back of edited resources.
//!
//! Every id moves through `absent -> pending -> {loaded | errored}` and stays
//! in its final set for the lifetime of the registry. The three sets live
//! under a single lock; loader work always runs outside it.

mod state;

pub use state::RegistryStats;

use self::state::{Enqueued, PendingLoad, RegistryState};
use crate::{
    reference::{ReferenceManager, ReferenceTarget, ResourceProvider, ResourceReference},
    scheduler::ThreadPoolScheduler,
};
use anyhow::{anyhow, Context, Result};
use aster_core::{
    gpu::GpuContext,
    jobs::{JobHandle, Scheduler},
    resource::{
        DirtyFlags, Resource, ResourceId, ResourceState, SourceFormat, SourceMetadata,
        TypedResource,
    },
    ByteSource, MemorySource, ResourceConfig, ResourceDatabase, ResourceRequester,
};
use aster_io::FolderResourceDatabase;
use aster_lanes::{loading::TextureLoader, LoadContext, LoaderFactory, ResourceData};
use std::{
    sync::{Arc, Mutex, MutexGuard, PoisonError, Weak},
    thread,
    time::Instant,
};

/// Owns every loaded resource and schedules the loads.
///
/// Cheap handles to resources are handed out as [`ResourceReference`]s; they
/// resolve against the registry lazily and never keep it alive.
pub struct ResourceRegistry {
    inner: Arc<RegistryInner>,
}

pub(crate) struct RegistryInner {
    this: Weak<RegistryInner>,
    database: Arc<dyn ResourceDatabase>,
    loaders: Arc<LoaderFactory>,
    scheduler: Arc<dyn Scheduler>,
    gpu: Arc<dyn GpuContext>,
    config: Arc<ResourceConfig>,
    references: Arc<ReferenceManager>,
    state: Mutex<RegistryState>,
    last_validation: Mutex<Instant>,
}

impl ResourceRegistry {
    /// Creates a registry over existing services and allocates the fallback
    /// textures.
    pub fn new(
        database: Arc<dyn ResourceDatabase>,
        loaders: Arc<LoaderFactory>,
        scheduler: Arc<dyn Scheduler>,
        gpu: Arc<dyn GpuContext>,
    ) -> Result<Self> {
        let config = loaders.config().clone();
        let inner = Arc::new_cyclic(|this| RegistryInner {
            this: this.clone(),
            database,
            loaders,
            scheduler,
            gpu,
            config,
            references: Arc::new(ReferenceManager::new()),
            state: Mutex::new(RegistryState::default()),
            last_validation: Mutex::new(Instant::now()),
        });

        let fallbacks = TextureLoader::fallback_textures(&*inner.gpu)
            .context("Failed to create fallback textures")?;
        for (id, texture) in fallbacks {
            inner.allocate(id, texture);
        }
        log::info!("Resource registry ready");
        Ok(Self { inner })
    }

    /// Opens the folder database at `config.root` and builds a registry with
    /// the built-in loaders and a worker pool of `config.worker_threads`.
    pub fn open(config: Arc<ResourceConfig>, gpu: Arc<dyn GpuContext>) -> Result<Self> {
        let loaders = Arc::new(LoaderFactory::new(config.clone()));
        let database = FolderResourceDatabase::open(&config, loaders.clone());
        let scheduler = ThreadPoolScheduler::new(config.worker_threads)
            .context("Failed to start loader workers")?;
        Self::new(Arc::new(database), loaders, Arc::new(scheduler), gpu)
    }

    /// Starts loading `id` if nobody has, and returns a handle to it. Never
    /// blocks on the load.
    pub fn load<T: ?Sized + ReferenceTarget>(&self, id: impl Into<ResourceId>) -> ResourceReference<T> {
        let id = id.into();
        if !id.is_null() {
            self.inner.enqueue(&id);
        }
        self.inner.reference(id)
    }

    /// Like [`load`](Self::load), but blocks until the load of `id` finished.
    pub fn immediate_load<T: ?Sized + ReferenceTarget>(
        &self,
        id: impl Into<ResourceId>,
    ) -> ResourceReference<T> {
        let id = id.into();
        if !id.is_null() {
            let enqueued = self.inner.enqueue(&id);
            self.inner.wait_for(&id, enqueued);
        }
        self.inner.reference(id)
    }

    /// A handle to `id` without starting a load.
    pub fn get<T: ?Sized + ReferenceTarget>(&self, id: impl Into<ResourceId>) -> ResourceReference<T> {
        self.inner.reference(id.into())
    }

    /// Registers a procedurally created resource as loaded.
    ///
    /// If `id` is already tracked, the existing entry wins and a warning is
    /// logged; `value` is still returned to the caller.
    pub fn allocate<T: TypedResource>(&self, id: impl Into<ResourceId>, value: T) -> Arc<T> {
        self.inner.allocate(id.into(), value)
    }

    /// Runs the loader of `metadata`'s category on the calling thread, without
    /// touching the registry's bookkeeping. Failures are logged.
    pub fn load_direct(
        &self,
        metadata: &SourceMetadata,
        source: Arc<dyn ByteSource>,
    ) -> Option<ResourceData> {
        self.inner.load_direct(metadata, source)
    }

    /// Starts loading a resource whose bytes are already at hand.
    pub fn load_with_source(&self, metadata: SourceMetadata, source: Arc<dyn ByteSource>) {
        self.inner.load_with_source(metadata, source);
    }

    /// The loaded object of `id`, or the state explaining why there is none.
    pub fn get_resource(&self, id: &ResourceId) -> Result<Arc<dyn Resource>, ResourceState> {
        self.inner.get_resource(id)
    }

    /// The registry's view of `id`.
    pub fn state(&self, id: &ResourceId) -> ResourceState {
        match self.inner.get_resource(id) {
            Ok(_) => ResourceState::Loaded,
            Err(state) => state,
        }
    }

    /// The metadata a loaded resource was created from.
    pub fn metadata(&self, id: &ResourceId) -> Option<SourceMetadata> {
        self.inner
            .lock()
            .resources
            .get(id)
            .map(|data| data.metadata.clone())
    }

    /// Flags a loaded resource as edited. Returns `false` if it is not loaded.
    pub fn mark_dirty(&self, id: &ResourceId) -> bool {
        match self.inner.lock().resources.get_mut(id) {
            Some(data) => {
                data.dirty |= DirtyFlags::DATA_CHANGED;
                true
            }
            None => false,
        }
    }

    /// Writes one loaded resource back through its source and clears its
    /// dirty flag.
    pub fn save(&self, id: &ResourceId) -> Result<()> {
        self.inner.save(id)
    }

    /// Saves every resource flagged dirty. Failures are logged and the flag
    /// kept. Returns how many were saved.
    pub fn save_dirty(&self) -> usize {
        let dirty: Vec<ResourceId> = self
            .inner
            .lock()
            .resources
            .iter()
            .filter(|(_, data)| data.dirty.contains(DirtyFlags::DATA_CHANGED))
            .map(|(id, _)| id.clone())
            .collect();
        dirty
            .iter()
            .filter(|id| match self.inner.save(id) {
                Ok(()) => true,
                Err(e) => {
                    log::error!("Failed to save '{id}': {e:#}");
                    false
                }
            })
            .count()
    }

    /// Per-frame maintenance. Re-validates the database once the configured
    /// interval elapsed and logs any drift. Nothing is reloaded.
    pub fn update(&self) {
        let Some(interval) = self.inner.config.staleness_check_interval() else {
            return;
        };
        {
            let mut last = self
                .inner
                .last_validation
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            if last.elapsed() < interval {
                return;
            }
            *last = Instant::now();
        }
        let errors = self.inner.database.validate();
        if !errors.is_success() {
            log::warn!("Resource database is out of date: {errors}");
        }
    }

    /// Counts of the registry's id sets.
    pub fn stats(&self) -> RegistryStats {
        let references = self
            .inner
            .references
            .outstanding()
            .iter()
            .map(|(_, count)| count)
            .sum::<usize>();
        let state = self.inner.lock();
        RegistryStats {
            loaded: state.resources.len(),
            pending: state.pending.len(),
            errored: state.errored.len(),
            dirty: state
                .resources
                .values()
                .filter(|data| data.dirty.contains(DirtyFlags::DATA_CHANGED))
                .count(),
            references,
        }
    }

    /// Blocks until no load is pending, including loads enqueued meanwhile.
    pub fn wait_idle(&self) {
        loop {
            let handles: Vec<JobHandle> = self
                .inner
                .lock()
                .pending
                .values()
                .filter_map(|pending| pending.handle.clone())
                .collect();
            if handles.is_empty() {
                if self.inner.lock().pending.is_empty() {
                    return;
                }
                thread::yield_now();
                continue;
            }
            self.inner.scheduler.wait_all(&handles);
        }
    }

    /// The database the registry loads from.
    pub fn database(&self) -> &Arc<dyn ResourceDatabase> {
        &self.inner.database
    }

    /// The configuration shared with the loaders.
    pub fn config(&self) -> &Arc<ResourceConfig> {
        &self.inner.config
    }

    /// The bookkeeping of live reference handles.
    pub fn references(&self) -> &Arc<ReferenceManager> {
        &self.inner.references
    }
}

impl Drop for ResourceRegistry {
    fn drop(&mut self) {
        // Jobs hold the registry alive; let them finish before tearing down.
        self.wait_idle();
    }
}

impl RegistryInner {
    fn lock(&self) -> MutexGuard<'_, RegistryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn reference<T: ?Sized + ReferenceTarget>(&self, id: ResourceId) -> ResourceReference<T> {
        let provider: Weak<dyn ResourceProvider> = self.this.clone();
        ResourceReference::new(id, provider, self.references.clone())
    }

    /// Marks `id` pending and dispatches `work` unless the id is already
    /// tracked.
    fn enqueue_with<F>(&self, id: &ResourceId, work: F) -> Enqueued
    where
        F: FnOnce(&RegistryInner) + Send + 'static,
    {
        {
            let mut state = self.lock();
            if state.is_settled(id) {
                return Enqueued::Settled;
            }
            if let Some(pending) = state.pending.get(id) {
                return Enqueued::InFlight(pending.handle.clone());
            }
            state.pending.insert(id.clone(), PendingLoad::default());
        }

        let Some(this) = self.this.upgrade() else {
            // Only reachable while the registry is being torn down.
            self.finish(id, None);
            return Enqueued::Settled;
        };
        log::debug!("'{id}' is now pending");
        let handle = self.scheduler.dispatch(Box::new(move || work(&*this)));

        if let Some(pending) = self.lock().pending.get_mut(id) {
            pending.handle = Some(handle.clone());
        }
        Enqueued::Dispatched(handle)
    }

    fn enqueue(&self, id: &ResourceId) -> Enqueued {
        let job_id = id.clone();
        self.enqueue_with(id, move |registry| registry.load_resource(&job_id))
    }

    fn wait_for(&self, id: &ResourceId, enqueued: Enqueued) {
        let mut handle = match enqueued {
            Enqueued::Settled => return,
            Enqueued::Dispatched(handle) | Enqueued::InFlight(Some(handle)) => Some(handle),
            Enqueued::InFlight(None) => None,
        };
        loop {
            if let Some(handle) = handle.take() {
                self.scheduler.wait(&handle);
                return;
            }
            match self.lock().pending.get(id) {
                None => return,
                Some(pending) => handle = pending.handle.clone(),
            }
            if handle.is_none() {
                thread::yield_now();
            }
        }
    }

    /// Claims the pending load of `id`. Returns `false` if it is settled or
    /// another job already runs it.
    fn claim(&self, id: &ResourceId) -> bool {
        let mut state = self.lock();
        if state.is_settled(id) {
            return false;
        }
        let pending = state.pending.entry(id.clone()).or_default();
        if pending.running {
            return false;
        }
        pending.running = true;
        true
    }

    /// The unit of work behind a database-backed load.
    fn load_resource(&self, id: &ResourceId) {
        if !self.claim(id) {
            return;
        }
        let metadata = match self.database.find(id) {
            Ok(metadata) => metadata,
            Err(e) => {
                log::error!("Cannot load '{id}': {e}");
                self.finish(id, None);
                return;
            }
        };
        for dependency in &metadata.dependencies {
            self.request(dependency);
        }
        let source = self.database.create_source(id, &metadata);
        let data = self.load_direct(&metadata, source);
        self.finish(id, data);
    }

    fn load_with_source(&self, metadata: SourceMetadata, source: Arc<dyn ByteSource>) {
        let id = metadata.resource_id.clone();
        if id.is_null() {
            log::error!("Refusing to load a resource without an id from {}", source.describe());
            return;
        }
        self.enqueue_with(&id, move |registry| {
            let id = metadata.resource_id.clone();
            if !registry.claim(&id) {
                return;
            }
            let data = registry.load_direct(&metadata, source);
            registry.finish(&id, data);
        });
    }

    fn load_direct(&self, metadata: &SourceMetadata, source: Arc<dyn ByteSource>) -> Option<ResourceData> {
        let loader = self.loaders.get(metadata.resource_type);
        let ctx = LoadContext {
            gpu: &*self.gpu,
            requester: self,
            config: &self.config,
        };
        let data = match loader.load(metadata, source, &ctx) {
            Ok(data) => data,
            Err(e) => {
                log::error!(
                    "{} failed to load '{}': {e:#}",
                    loader.name(),
                    metadata.resource_id
                );
                return None;
            }
        };
        let produced = data.resource.resource_type();
        if produced != metadata.resource_type {
            log::error!(
                "{} produced a {produced} for {} resource '{}'",
                loader.name(),
                metadata.resource_type,
                metadata.resource_id
            );
            return None;
        }
        Some(data)
    }

    /// Moves `id` out of pending into its final set.
    fn finish(&self, id: &ResourceId, data: Option<ResourceData>) {
        let mut state = self.lock();
        state.pending.remove(id);
        match data {
            Some(data) => {
                log::debug!("'{id}' is now loaded");
                state.resources.insert(id.clone(), data);
            }
            None => {
                log::debug!("'{id}' is now errored");
                state.errored.insert(id.clone());
            }
        }
    }

    fn allocate<T: TypedResource>(&self, id: ResourceId, value: T) -> Arc<T> {
        let resource = Arc::new(value);
        let mut state = self.lock();
        if state.is_tracked(&id) {
            log::warn!("'{id}' is already registered; keeping the existing resource");
            return resource;
        }
        let metadata = SourceMetadata::new(id.clone(), T::TYPE, SourceFormat::Memory, id.as_str());
        let source = Arc::new(MemorySource::empty(id.as_str()));
        state
            .resources
            .insert(id, ResourceData::new(resource.clone(), source, metadata));
        resource
    }

    fn save(&self, id: &ResourceId) -> Result<()> {
        let data = self
            .lock()
            .resources
            .get(id)
            .cloned()
            .ok_or_else(|| anyhow!("'{id}' is not loaded"))?;
        self.loaders
            .get(data.metadata.resource_type)
            .save(&data)
            .with_context(|| format!("Failed to save '{id}'"))?;
        if let Some(data) = self.lock().resources.get_mut(id) {
            data.dirty.remove(DirtyFlags::DATA_CHANGED);
        }
        log::info!("Saved '{id}' to {}", data.source.describe());
        Ok(())
    }
}

impl ResourceProvider for RegistryInner {
    fn get_resource(&self, id: &ResourceId) -> Result<Arc<dyn Resource>, ResourceState> {
        if id.is_null() {
            return Err(ResourceState::Null);
        }
        let state = self.lock();
        if let Some(data) = state.resources.get(id) {
            Ok(data.resource.clone())
        } else if state.pending.contains_key(id) {
            Err(ResourceState::Pending)
        } else if state.errored.contains(id) {
            Err(ResourceState::Error)
        } else {
            Err(ResourceState::Missing)
        }
    }
}

impl ResourceRequester for RegistryInner {
    fn request(&self, id: &ResourceId) {
        if !id.is_null() {
            self.enqueue(id);
        }
    }

    fn request_with_source(&self, metadata: SourceMetadata, source: Arc<dyn ByteSource>) {
        self.load_with_source(metadata, source);
    }
}

impl Drop for RegistryInner {
    fn drop(&mut self) {
        let state = self.state.get_mut().unwrap_or_else(PoisonError::into_inner);
        for (id, data) in &state.resources {
            let holders = Arc::strong_count(&data.resource) - 1;
            if holders > 0 {
                log::error!("'{id}' is still held by {holders} owner(s) outside the registry");
            }
        }
        for (id, count) in self.references.outstanding() {
            log::error!("{count} reference(s) to '{id}' outlive the registry");
        }
        log::info!(
            "Resource registry shut down ({} loaded, {} errored)",
            state.resources.len(),
            state.errored.len()
        );
    }
}
