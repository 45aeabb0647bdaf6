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

//! Mesh decoding: Wavefront OBJ files and in-memory geometry payloads.

use crate::{
    error::LoaderError,
    loader::{LoadContext, ResourceData, ResourceLoader},
    resources::{Mesh, MeshGeometry},
};
use ahash::AHashMap;
use anyhow::{Context, Result};
use aster_core::{
    gpu::{BufferUsage, GpuContext, GpuUpload},
    resource::{SourceFormat, SourceMetadata},
    ByteSource,
};
use std::sync::Arc;

/// Loads `Obj` sources and `Memory` payloads produced by composite loaders.
#[derive(Debug, Default, Clone, Copy)]
pub struct MeshLoader;

impl MeshLoader {
    /// Parses OBJ text. Every model of the file is merged into one geometry.
    pub fn parse_obj(bytes: &[u8]) -> Result<MeshGeometry> {
        let obj_text = std::str::from_utf8(bytes).context("OBJ file is not valid UTF-8")?;

        let (models, _materials) = tobj::load_obj_buf(
            &mut std::io::Cursor::new(obj_text),
            &tobj::LoadOptions {
                triangulate: true,
                single_index: true,
                ..Default::default()
            },
            |_| Ok((Vec::new(), AHashMap::new())),
        )
        .context("Failed to parse OBJ file")?;

        if models.is_empty() {
            return Err(LoaderError::InvalidData {
                what: "OBJ file",
                reason: "no models found".to_string(),
            }
            .into());
        }

        let mut geometry = MeshGeometry::default();
        for model in &models {
            let mesh = &model.mesh;
            let base = geometry.positions.len() as u32;
            let count = mesh.positions.len() / 3;

            geometry
                .positions
                .extend(mesh.positions.chunks_exact(3).map(|v| [v[0], v[1], v[2]]));
            if mesh.normals.len() == count * 3 {
                geometry
                    .normals
                    .extend(mesh.normals.chunks_exact(3).map(|n| [n[0], n[1], n[2]]));
            }
            if mesh.texcoords.len() == count * 2 {
                geometry
                    .tex_coords
                    .extend(mesh.texcoords.chunks_exact(2).map(|t| [t[0], t[1]]));
            }
            geometry
                .indices
                .extend(mesh.indices.iter().map(|&i| base + i));
        }

        if geometry.positions.is_empty() || geometry.indices.is_empty() {
            return Err(LoaderError::InvalidData {
                what: "OBJ file",
                reason: "no faces found".to_string(),
            }
            .into());
        }

        // Attributes only some models carry cannot be interleaved.
        if geometry.normals.len() != geometry.positions.len() {
            geometry.normals.clear();
        }
        if geometry.tex_coords.len() != geometry.positions.len() {
            geometry.tex_coords.clear();
        }
        Ok(geometry)
    }

    /// Encodes geometry as a `Memory` payload.
    pub fn encode_payload(geometry: &MeshGeometry) -> Result<Vec<u8>> {
        bincode::serde::encode_to_vec(geometry, bincode::config::standard())
            .context("Failed to encode mesh payload")
    }

    /// Decodes a `Memory` payload.
    pub fn decode_payload(bytes: &[u8]) -> Result<MeshGeometry> {
        let (geometry, _) =
            bincode::serde::decode_from_slice(bytes, bincode::config::standard())
                .context("Failed to decode mesh payload")?;
        Ok(geometry)
    }

    /// Validates geometry and uploads its vertex and index buffers.
    pub fn upload(gpu: &dyn GpuContext, label: &str, geometry: &MeshGeometry) -> Result<Mesh> {
        geometry.validate().map_err(|reason| LoaderError::InvalidData {
            what: "mesh geometry",
            reason,
        })?;
        let bounds = geometry.bounds().ok_or_else(|| LoaderError::InvalidData {
            what: "mesh geometry",
            reason: "no vertices".to_string(),
        })?;

        let indices: Vec<u32> = if geometry.indices.is_empty() {
            (0..geometry.vertex_count() as u32).collect()
        } else {
            geometry.indices.clone()
        };
        let vertices = geometry.interleaved();

        let vertex_buffer = gpu.upload(GpuUpload::Buffer {
            label,
            usage: BufferUsage::Vertex,
            bytes: bytemuck::cast_slice(&vertices),
        })?;
        let index_buffer = gpu.upload(GpuUpload::Buffer {
            label,
            usage: BufferUsage::Index,
            bytes: bytemuck::cast_slice(&indices),
        })?;

        Ok(Mesh {
            vertex_count: geometry.vertex_count(),
            index_count: indices.len(),
            bounds,
            vertex_buffer,
            index_buffer,
        })
    }
}

impl ResourceLoader for MeshLoader {
    fn name(&self) -> &'static str {
        "MeshLoader"
    }

    fn load(
        &self,
        metadata: &SourceMetadata,
        source: Arc<dyn ByteSource>,
        ctx: &LoadContext<'_>,
    ) -> Result<ResourceData> {
        let bytes = source
            .load()
            .with_context(|| format!("Failed to read {}", source.describe()))?;
        let geometry = match metadata.format {
            SourceFormat::Obj => Self::parse_obj(&bytes)?,
            SourceFormat::Memory => Self::decode_payload(&bytes)?,
            format => {
                return Err(LoaderError::UnsupportedFormat {
                    loader: self.name(),
                    format,
                    id: metadata.resource_id.clone(),
                }
                .into())
            }
        };

        let mesh = Self::upload(ctx.gpu, metadata.resource_id.as_str(), &geometry)
            .with_context(|| format!("Failed to create mesh '{}'", metadata.resource_id))?;
        log::debug!(
            "Loaded mesh '{}' ({} vertices, {} indices)",
            metadata.resource_id,
            mesh.vertex_count,
            mesh.index_count
        );
        Ok(ResourceData::new(Arc::new(mesh), source, metadata.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::TestEnv;
    use aster_core::{
        resource::{downcast_resource, ResourceId, ResourceType},
        MemorySource,
    };

    const QUAD: &str = "\
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
vn 0 0 1
f 1//1 2//1 3//1 4//1
";

    #[test]
    fn parses_and_triangulates_obj() {
        let geometry = MeshLoader::parse_obj(QUAD.as_bytes()).unwrap();
        assert_eq!(geometry.vertex_count(), 4);
        assert_eq!(geometry.indices.len(), 6);
        assert_eq!(geometry.normals.len(), 4);
        assert!(geometry.tex_coords.is_empty());
    }

    #[test]
    fn loads_memory_payload() {
        let geometry = MeshGeometry {
            positions: vec![[0.0; 3], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            normals: Vec::new(),
            tex_coords: Vec::new(),
            indices: Vec::new(),
        };
        let payload = MeshLoader::encode_payload(&geometry).unwrap();
        let metadata = SourceMetadata::new(
            ResourceId::new("scene.glb/Mesh0-tri"),
            ResourceType::Mesh,
            SourceFormat::Memory,
            "scene.glb",
        );

        let env = TestEnv::new();
        let data = MeshLoader
            .load(&metadata, Arc::new(MemorySource::new("tri", payload)), &env.ctx())
            .unwrap();
        let mesh = downcast_resource::<Mesh>(data.resource).unwrap();
        assert_eq!(mesh.vertex_count, 3);
        assert_eq!(mesh.index_count, 3);
        assert_eq!(env.gpu.upload_count(), 2);
    }

    #[test]
    fn empty_obj_is_rejected() {
        assert!(MeshLoader::parse_obj(b"").is_err());
        assert!(MeshLoader::parse_obj(b"# nothing here\n").is_err());
        assert!(MeshLoader::parse_obj(b"o empty\n").is_err());
        assert!(MeshLoader::parse_obj(b"v 0 0 0\nv 1 0 0\nv 0 1 0\n").is_err());
    }
}
