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

use aster_core::{
    gpu::GpuObject,
    resource::{ResourceType, TypedResource},
};
use serde::{Deserialize, Serialize};

/// CPU-side triangle geometry with a single index stream.
///
/// This is also the payload format of meshes extracted from composite
/// sources, encoded with `bincode`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeshGeometry {
    pub positions: Vec<[f32; 3]>,
    /// Empty, or one per position.
    pub normals: Vec<[f32; 3]>,
    /// Empty, or one per position.
    pub tex_coords: Vec<[f32; 2]>,
    /// Triangle list indices into the vertex arrays.
    pub indices: Vec<u32>,
}

/// Axis-aligned bounds of a geometry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: [f32; 3],
    pub max: [f32; 3],
}

impl MeshGeometry {
    /// Number of vertices.
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Floats per interleaved vertex: position, then normal and uv when present.
    pub fn vertex_stride(&self) -> usize {
        3 + if self.normals.is_empty() { 0 } else { 3 }
            + if self.tex_coords.is_empty() { 0 } else { 2 }
    }

    /// Checks attribute lengths and index bounds.
    pub fn validate(&self) -> Result<(), String> {
        if self.positions.is_empty() {
            return Err("geometry has no vertices".to_string());
        }
        let count = self.positions.len();
        if !self.normals.is_empty() && self.normals.len() != count {
            return Err(format!(
                "{} normals for {} positions",
                self.normals.len(),
                count
            ));
        }
        if !self.tex_coords.is_empty() && self.tex_coords.len() != count {
            return Err(format!(
                "{} texture coordinates for {} positions",
                self.tex_coords.len(),
                count
            ));
        }
        if let Some(index) = self.indices.iter().find(|&&i| i as usize >= count) {
            return Err(format!("index {index} out of range for {count} vertices"));
        }
        Ok(())
    }

    /// Vertex attributes interleaved as `[position, normal?, uv?]`.
    pub fn interleaved(&self) -> Vec<f32> {
        let mut out = Vec::with_capacity(self.vertex_count() * self.vertex_stride());
        for (i, position) in self.positions.iter().enumerate() {
            out.extend_from_slice(position);
            if let Some(normal) = self.normals.get(i) {
                out.extend_from_slice(normal);
            }
            if let Some(uv) = self.tex_coords.get(i) {
                out.extend_from_slice(uv);
            }
        }
        out
    }

    /// Bounds of all positions, `None` for empty geometry.
    pub fn bounds(&self) -> Option<Bounds> {
        let first = *self.positions.first()?;
        let mut bounds = Bounds {
            min: first,
            max: first,
        };
        for position in &self.positions[1..] {
            for axis in 0..3 {
                bounds.min[axis] = bounds.min[axis].min(position[axis]);
                bounds.max[axis] = bounds.max[axis].max(position[axis]);
            }
        }
        Some(bounds)
    }
}

/// A mesh resident on the GPU.
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    pub vertex_count: usize,
    pub index_count: usize,
    pub bounds: Bounds,
    pub vertex_buffer: GpuObject,
    pub index_buffer: GpuObject,
}

impl TypedResource for Mesh {
    const TYPE: ResourceType = ResourceType::Mesh;
}
