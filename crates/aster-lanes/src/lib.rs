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

//! # Aster Lanes
//!
//! The decoding side of the resource system. Each [`ResourceLoader`] turns the
//! bytes of one resource category into a shared in-memory object, uploading
//! to the GPU where the category needs it. The [`LoaderFactory`] maps
//! categories to loaders and doubles as the database's metadata enricher.

pub mod error;
pub mod factory;
pub mod loader;
pub mod loading;
pub mod resources;

#[cfg(test)]
mod testing;

pub use error::LoaderError;
pub use factory::{LoaderFactory, StubLoader};
pub use loader::{LoadContext, ResourceData, ResourceLoader};
