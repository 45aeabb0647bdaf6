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

//! # Aster IO
//!
//! Storage services of the resource system. The [`FolderResourceDatabase`]
//! owns a directory tree, keeps a `.meta` sidecar next to every source file
//! and repairs the tree when it drifts from what the sidecars describe.
//! A [`ResourceDatabaseFacade`] mounts several of them under one namespace.

pub mod document;
pub mod extensions;
pub mod facade;
pub mod folder;

pub use document::{DocumentError, DATABASE_FILE_NAME, SIDECAR_EXTENSION};
pub use extensions::{classify_path, extension_to_type};
pub use facade::ResourceDatabaseFacade;
pub use folder::{FolderResourceDatabase, MendReport};
