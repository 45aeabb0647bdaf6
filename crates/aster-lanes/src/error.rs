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

use aster_core::resource::{ResourceId, ResourceType, SourceFormat};
use thiserror::Error;

/// Typed failures raised by loaders. They travel inside `anyhow::Error`.
#[derive(Debug, Error)]
pub enum LoaderError {
    /// No loader is registered for this category.
    #[error("no loader registered for {resource_type} resource '{id}'")]
    NoLoader {
        id: ResourceId,
        resource_type: ResourceType,
    },
    /// The loader does not understand this encoding.
    #[error("{loader} cannot decode {format:?} sources ('{id}')")]
    UnsupportedFormat {
        loader: &'static str,
        format: SourceFormat,
        id: ResourceId,
    },
    /// The bytes are not a valid instance of the declared format.
    #[error("invalid {what}: {reason}")]
    InvalidData { what: &'static str, reason: String },
    /// The format has no write-back path.
    #[error("{0} does not support saving")]
    SaveUnsupported(&'static str),
}
