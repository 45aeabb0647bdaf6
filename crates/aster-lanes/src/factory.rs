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

//! Maps resource categories to their loaders.

use crate::{
    error::LoaderError,
    loader::{LoadContext, ResourceData, ResourceLoader},
    loading::{
        FontLoader, GltfLoader, MaterialLoader, MeshLoader, SceneLoader, ShaderLoader,
        TextureLoader,
    },
};
use ahash::AHashMap;
use anyhow::Result;
use aster_core::{
    resource::{ResourceType, SourceMetadata},
    ByteSource, MetadataEnricher, ResourceConfig,
};
use std::sync::Arc;

/// A loader for categories nothing is registered for. Always fails cleanly.
#[derive(Debug, Default, Clone, Copy)]
pub struct StubLoader;

impl ResourceLoader for StubLoader {
    fn name(&self) -> &'static str {
        "StubLoader"
    }

    fn load(
        &self,
        metadata: &SourceMetadata,
        _source: Arc<dyn ByteSource>,
        _ctx: &LoadContext<'_>,
    ) -> Result<ResourceData> {
        Err(LoaderError::NoLoader {
            id: metadata.resource_id.clone(),
            resource_type: metadata.resource_type,
        }
        .into())
    }
}

/// The dispatch table from [`ResourceType`] to [`ResourceLoader`].
///
/// Also acts as the database's [`MetadataEnricher`], forwarding probing to the
/// loader of each resource's category.
pub struct LoaderFactory {
    loaders: AHashMap<ResourceType, Arc<dyn ResourceLoader>>,
    stub: Arc<dyn ResourceLoader>,
    config: Arc<ResourceConfig>,
}

impl LoaderFactory {
    /// A factory with every built-in loader registered.
    pub fn new(config: Arc<ResourceConfig>) -> Self {
        let mut factory = Self::empty(config);
        factory.register(ResourceType::Texture, Arc::new(TextureLoader));
        factory.register(ResourceType::Shader, Arc::new(ShaderLoader));
        factory.register(ResourceType::Mesh, Arc::new(MeshLoader));
        factory.register(ResourceType::Material, Arc::new(MaterialLoader));
        factory.register(ResourceType::Font, Arc::new(FontLoader));
        factory.register(ResourceType::Scene, Arc::new(SceneLoader));
        factory.register(ResourceType::Composite, Arc::new(GltfLoader));
        factory
    }

    /// A factory where every category resolves to the stub loader.
    pub fn empty(config: Arc<ResourceConfig>) -> Self {
        Self {
            loaders: AHashMap::new(),
            stub: Arc::new(StubLoader),
            config,
        }
    }

    /// Registers (or replaces) the loader of `resource_type`.
    pub fn register(&mut self, resource_type: ResourceType, loader: Arc<dyn ResourceLoader>) {
        log::debug!("Registering {} for {}", loader.name(), resource_type);
        self.loaders.insert(resource_type, loader);
    }

    /// The loader of `resource_type`, or the stub loader.
    pub fn get(&self, resource_type: ResourceType) -> Arc<dyn ResourceLoader> {
        self.loaders
            .get(&resource_type)
            .cloned()
            .unwrap_or_else(|| self.stub.clone())
    }

    /// The configuration handed to loaders.
    pub fn config(&self) -> &Arc<ResourceConfig> {
        &self.config
    }
}

impl MetadataEnricher for LoaderFactory {
    fn enrich(&self, metadata: &mut SourceMetadata, bytes: &[u8]) {
        self.get(metadata.resource_type)
            .enrich_metadata(metadata, bytes, &self.config);
    }
}
