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

use aster_core::resource::{ResourceId, ResourceType, TypedResource};
use std::collections::BTreeMap;

/// A container whose sub-resources were enqueued as separate loads.
///
/// The composite only lists its children; each child is a resource of its
/// own, resolved through the registry by id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Composite {
    children: BTreeMap<ResourceType, BTreeMap<String, ResourceId>>,
    /// The scene to instantiate by default, if the container declares one.
    pub default_scene: Option<ResourceId>,
}

impl Composite {
    /// Records a child.
    pub fn insert(&mut self, resource_type: ResourceType, name: impl Into<String>, id: ResourceId) {
        self.children
            .entry(resource_type)
            .or_default()
            .insert(name.into(), id);
    }

    /// The id of the child of `resource_type` called `name`.
    pub fn child(&self, resource_type: ResourceType, name: &str) -> Option<&ResourceId> {
        self.children.get(&resource_type)?.get(name)
    }

    /// Children of one type, by name.
    pub fn children_of(&self, resource_type: ResourceType) -> impl Iterator<Item = (&str, &ResourceId)> {
        self.children
            .get(&resource_type)
            .into_iter()
            .flat_map(|children| children.iter().map(|(name, id)| (name.as_str(), id)))
    }

    /// Every child id.
    pub fn ids(&self) -> impl Iterator<Item = &ResourceId> {
        self.children.values().flat_map(|children| children.values())
    }

    /// Total number of children.
    pub fn len(&self) -> usize {
        self.children.values().map(BTreeMap::len).sum()
    }

    /// Returns `true` if the container bundled nothing.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl TypedResource for Composite {
    const TYPE: ResourceType = ResourceType::Composite;
}
