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
use serde::{Deserialize, Serialize};
use std::sync::{PoisonError, RwLock, RwLockReadGuard};

fn identity_rotation() -> [f32; 4] {
    [0.0, 0.0, 0.0, 1.0]
}

fn unit_scale() -> [f32; 3] {
    [1.0; 3]
}

/// One node of a scene graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneNode {
    pub name: String,
    #[serde(default)]
    pub translation: [f32; 3],
    /// Quaternion, `[x, y, z, w]`.
    #[serde(default = "identity_rotation")]
    pub rotation: [f32; 4],
    #[serde(default = "unit_scale")]
    pub scale: [f32; 3],
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mesh: Option<ResourceId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub material: Option<ResourceId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<SceneNode>,
}

impl SceneNode {
    /// A node at the origin with no attachments.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            translation: [0.0; 3],
            rotation: identity_rotation(),
            scale: unit_scale(),
            mesh: None,
            material: None,
            children: Vec::new(),
        }
    }

    fn visit<'a>(&'a self, out: &mut Vec<&'a SceneNode>) {
        out.push(self);
        for child in &self.children {
            child.visit(out);
        }
    }
}

/// The persisted form of a scene, stored as JSON.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SceneGraph {
    pub name: String,
    /// Root nodes.
    #[serde(default)]
    pub nodes: Vec<SceneNode>,
}

impl SceneGraph {
    /// Every node, depth first.
    pub fn walk(&self) -> Vec<&SceneNode> {
        let mut out = Vec::new();
        for node in &self.nodes {
            node.visit(&mut out);
        }
        out
    }

    /// Every mesh and material id the graph references, deduplicated, in
    /// traversal order.
    pub fn referenced_resources(&self) -> Vec<ResourceId> {
        let mut ids: Vec<ResourceId> = Vec::new();
        for node in self.walk() {
            for id in node.mesh.iter().chain(node.material.iter()) {
                if !ids.contains(id) {
                    ids.push(id.clone());
                }
            }
        }
        ids
    }
}

/// A loaded, editable scene.
///
/// Scenes are shared like every resource, so edits go through an internal
/// lock. After editing, flag the resource dirty in the registry to have it
/// saved back.
#[derive(Debug, Default)]
pub struct Scene {
    graph: RwLock<SceneGraph>,
}

impl Scene {
    /// Wraps a graph.
    pub fn new(graph: SceneGraph) -> Self {
        Self {
            graph: RwLock::new(graph),
        }
    }

    /// Read access to the graph.
    pub fn graph(&self) -> RwLockReadGuard<'_, SceneGraph> {
        self.graph.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Mutates the graph.
    pub fn edit<R>(&self, f: impl FnOnce(&mut SceneGraph) -> R) -> R {
        let mut graph = self.graph.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut graph)
    }

    /// Number of nodes, at every depth.
    pub fn node_count(&self) -> usize {
        self.graph().walk().len()
    }
}

impl TypedResource for Scene {
    const TYPE: ResourceType = ResourceType::Scene;
}
