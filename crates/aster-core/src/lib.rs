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

//! # Aster Core
//!
//! Foundational crate containing the plain data and the interface contracts
//! of the resource system: identifiers, metadata, error kinds, configuration,
//! and the traits through which the database, the loaders, the scheduler and
//! the GPU device talk to each other.

#![warn(missing_docs)]

pub mod config;
pub mod database;
pub mod error;
pub mod gpu;
pub mod jobs;
pub mod resource;
pub mod source;

pub use config::{ConfigError, ResourceConfig};
pub use database::{MetadataEnricher, NoEnrichment, ResourceDatabase, ResourceRequester};
pub use error::DatabaseError;
pub use source::{ByteSource, FileSource, MemorySource};
