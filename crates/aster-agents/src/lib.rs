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

//! # Aster Agents
//!
//! The stateful side of the resource system. The [`ResourceRegistry`] turns
//! ids into shared objects, making sure each id is loaded at most once, and
//! hands out counted [`ResourceReference`] handles that resolve lazily. Loads
//! run on a [`ThreadPoolScheduler`] unless another scheduler is supplied.

pub mod reference;
pub mod registry;
pub mod scheduler;

pub use reference::{ReferenceManager, ReferenceTarget, ResourceProvider, ResourceReference};
pub use registry::{RegistryStats, ResourceRegistry};
pub use scheduler::ThreadPoolScheduler;
