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

//! The contract every per-type decoder implements.

use anyhow::Result;
use aster_core::{
    gpu::GpuContext,
    resource::{downcast_resource, DirtyFlags, Resource, SourceMetadata, TypedResource},
    ByteSource, ResourceConfig, ResourceRequester,
};
use std::{fmt, sync::Arc};

use crate::error::LoaderError;

/// Everything the registry stores for one loaded resource.
#[derive(Clone)]
pub struct ResourceData {
    /// The decoded object.
    pub resource: Arc<dyn Resource>,
    /// Where the bytes came from, kept for save-back.
    pub source: Arc<dyn ByteSource>,
    pub metadata: SourceMetadata,
    pub dirty: DirtyFlags,
}

impl ResourceData {
    /// Wraps a freshly decoded object. Starts clean.
    pub fn new(
        resource: Arc<dyn Resource>,
        source: Arc<dyn ByteSource>,
        metadata: SourceMetadata,
    ) -> Self {
        Self {
            resource,
            source,
            metadata,
            dirty: DirtyFlags::CLEAN,
        }
    }

    /// The resource as its concrete type, for loaders saving their own output.
    pub fn downcast<T: TypedResource>(&self) -> Result<Arc<T>> {
        downcast_resource::<T>(self.resource.clone()).ok_or_else(|| {
            LoaderError::InvalidData {
                what: "resource",
                reason: format!(
                    "'{}' is a {}, not a {}",
                    self.metadata.resource_id,
                    self.resource.resource_type(),
                    T::TYPE
                ),
            }
            .into()
        })
    }
}

impl fmt::Debug for ResourceData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceData")
            .field("id", &self.metadata.resource_id)
            .field("type", &self.resource.resource_type())
            .field("source", &self.source)
            .field("dirty", &self.dirty)
            .finish()
    }
}

/// Services available to a loader while it runs on a worker.
#[derive(Clone, Copy)]
pub struct LoadContext<'a> {
    /// The device decoded data is uploaded to.
    pub gpu: &'a dyn GpuContext,
    /// Enqueues further loads without blocking.
    pub requester: &'a dyn ResourceRequester,
    pub config: &'a ResourceConfig,
}

/// Decodes one category of resources.
///
/// Loaders are shared by every worker and must not assume exclusive access to
/// the GPU context or the requester.
pub trait ResourceLoader: Send + Sync {
    /// A short name for logs.
    fn name(&self) -> &'static str;

    /// Reads the bytes from `source` and decodes them. Blocking.
    ///
    /// Composite loaders enqueue their children through
    /// [`LoadContext::requester`] and return as soon as their own top-level
    /// object exists.
    fn load(
        &self,
        metadata: &SourceMetadata,
        source: Arc<dyn ByteSource>,
        ctx: &LoadContext<'_>,
    ) -> Result<ResourceData>;

    /// Writes the in-memory state of `data` back through its source.
    fn save(&self, _data: &ResourceData) -> Result<()> {
        Err(LoaderError::SaveUnsupported(self.name()).into())
    }

    /// Fills the type-specific part of freshly created metadata from the raw
    /// source bytes.
    fn enrich_metadata(
        &self,
        _metadata: &mut SourceMetadata,
        _bytes: &[u8],
        _config: &ResourceConfig,
    ) {
    }
}
