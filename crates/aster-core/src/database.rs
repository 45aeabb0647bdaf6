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

//! Contracts between the registry, the metadata database and the loaders.

use crate::{
    error::DatabaseError,
    resource::{ResourceId, SourceMetadata},
    source::ByteSource,
};
use std::sync::Arc;

/// A catalogue of resources and the sources their bytes come from.
///
/// Implementations are shared between the foreground thread and the loader
/// workers, so every method takes `&self`.
pub trait ResourceDatabase: Send + Sync {
    /// Looks up the metadata of `id`. Never touches storage.
    fn find(&self, id: &ResourceId) -> Result<SourceMetadata, DatabaseError>;

    /// Catalogues a new resource and persists its metadata.
    fn add(&self, id: ResourceId, metadata: SourceMetadata) -> Result<(), DatabaseError>;

    /// Forgets a resource and deletes its persisted metadata.
    fn remove(&self, id: &ResourceId) -> Result<(), DatabaseError>;

    /// Creates a lazy reader for the bytes of `id`.
    fn create_source(&self, id: &ResourceId, metadata: &SourceMetadata) -> Arc<dyn ByteSource>;

    /// Cross-checks the catalogue against storage and returns every issue found.
    fn validate(&self) -> DatabaseError;
}

/// Loader-side probing that fills the type-specific part of new metadata.
///
/// The database calls this whenever it creates metadata, either through
/// `add` or while repairing missing sidecars.
pub trait MetadataEnricher: Send + Sync {
    /// Updates `metadata` from the raw source `bytes`.
    fn enrich(&self, metadata: &mut SourceMetadata, bytes: &[u8]);
}

/// An enricher that leaves metadata untouched.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoEnrichment;

impl MetadataEnricher for NoEnrichment {
    fn enrich(&self, _metadata: &mut SourceMetadata, _bytes: &[u8]) {}
}

/// The registry-facing surface loaders use to enqueue further loads.
///
/// Requests never block: they only make sure a load is pending or done.
pub trait ResourceRequester: Send + Sync {
    /// Enqueues a database-backed load of `id`.
    fn request(&self, id: &ResourceId);

    /// Enqueues a load whose metadata and bytes are already known, such as a
    /// child bundled inside a composite source.
    fn request_with_source(&self, metadata: SourceMetadata, source: Arc<dyn ByteSource>);
}
