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

//! glTF containers, loaded as composites.
//!
//! The container is parsed once. Every image, material, mesh primitive and
//! scene it bundles becomes a child resource with in-memory bytes, enqueued
//! through the requester in that order so later children find their siblings
//! already pending.

mod resolver;

pub use resolver::{
    decode_data_uri, resolver_for, DetachedResolver, FileSystemResolver, GltfResourceResolver,
};

use crate::{
    error::LoaderError,
    loader::{LoadContext, ResourceData, ResourceLoader},
    loading::{MeshLoader, TextureLoader},
    resources::{AlphaMode, Composite, MaterialDescription, MeshGeometry, SceneGraph, SceneNode},
};
use anyhow::{Context, Result};
use aster_core::{
    resource::{
        CompositeMetadata, FormatMetadata, ResourceId, ResourceType, SourceFormat,
        SourceMetadata,
    },
    ByteSource, MemorySource, ResourceConfig,
};
use gltf::{mesh::Mode, Buffer, Document};
use std::{collections::BTreeMap, sync::Arc};

/// One child the container will be split into.
#[derive(Debug, Clone)]
struct PlannedChild {
    /// Name of the child inside the composite, `{Type}{index}-{name}`.
    key: String,
    metadata: SourceMetadata,
}

/// The children of a container, grouped in enqueue order.
#[derive(Debug, Default)]
struct ChildPlan {
    /// By image index.
    textures: Vec<PlannedChild>,
    /// By material index.
    materials: Vec<PlannedChild>,
    /// By mesh index, then primitive index. Non-triangle primitives are `None`.
    primitives: Vec<Vec<Option<PlannedChild>>>,
    /// By scene index.
    scenes: Vec<PlannedChild>,
}

impl ChildPlan {
    fn new(parent: &SourceMetadata, document: &Document) -> Self {
        let child = |resource_type: ResourceType, format, index: usize, name: String| {
            let name = name.replace(['/', '\\'], "_");
            let key = format!("{}{index}-{name}", resource_type.name());
            let id = parent.resource_id.child(resource_type.name(), index, &name);
            let mut metadata =
                SourceMetadata::new(id, resource_type, format, parent.source.clone());
            metadata.full_source_path = parent.full_source_path.clone();
            PlannedChild { key, metadata }
        };

        let textures = document
            .images()
            .map(|image| {
                let name = image.name().unwrap_or("image").to_string();
                child(ResourceType::Texture, SourceFormat::Image, image.index(), name)
            })
            .collect();
        let materials = document
            .materials()
            .enumerate()
            .map(|(index, material)| {
                let name = material.name().unwrap_or("material").to_string();
                child(ResourceType::Material, SourceFormat::Memory, index, name)
            })
            .collect();

        let mut next_mesh = 0;
        let primitives = document
            .meshes()
            .map(|mesh| {
                let mesh_name = mesh.name().unwrap_or("mesh");
                mesh.primitives()
                    .map(|primitive| {
                        if primitive.mode() != Mode::Triangles {
                            return None;
                        }
                        let name = match primitive.index() {
                            0 => mesh_name.to_string(),
                            p => format!("{mesh_name}.{p}"),
                        };
                        let planned = child(ResourceType::Mesh, SourceFormat::Memory, next_mesh, name);
                        next_mesh += 1;
                        Some(planned)
                    })
                    .collect()
            })
            .collect();

        let scenes = document
            .scenes()
            .map(|scene| {
                let name = scene.name().unwrap_or("scene").to_string();
                child(ResourceType::Scene, SourceFormat::Memory, scene.index(), name)
            })
            .collect();

        Self {
            textures,
            materials,
            primitives,
            scenes,
        }
    }

    fn all(&self) -> impl Iterator<Item = &PlannedChild> {
        self.textures
            .iter()
            .chain(self.materials.iter())
            .chain(self.primitives.iter().flatten().flatten())
            .chain(self.scenes.iter())
    }

    fn texture_id(&self, texture: gltf::Texture<'_>) -> Option<ResourceId> {
        self.textures
            .get(texture.source().index())
            .map(|child| child.metadata.resource_id.clone())
    }

    fn material_id(&self, material: &gltf::Material<'_>) -> Option<ResourceId> {
        material
            .index()
            .and_then(|index| self.materials.get(index))
            .map(|child| child.metadata.resource_id.clone())
    }
}

/// A parsed container with its buffers resolved.
struct Container {
    document: Document,
    buffers: Vec<Vec<u8>>,
}

impl Container {
    fn parse(bytes: &[u8], resolver: &dyn GltfResourceResolver) -> Result<Self> {
        let gltf = gltf::Gltf::from_slice(bytes).context("Failed to parse glTF container")?;
        let mut buffers = Vec::new();
        for buffer in gltf.buffers() {
            let data = match buffer.source() {
                gltf::buffer::Source::Bin => gltf
                    .blob
                    .as_deref()
                    .map(<[u8]>::to_vec)
                    .ok_or(LoaderError::InvalidData {
                        what: "glTF container",
                        reason: "GLB file references binary chunk but it is missing".to_string(),
                    })?,
                gltf::buffer::Source::Uri(uri) if uri.starts_with("data:") => {
                    decode_data_uri(uri)?
                }
                gltf::buffer::Source::Uri(uri) => resolver.resolve_buffer(uri)?,
            };
            buffers.push(data);
        }
        Ok(Self {
            document: gltf.document,
            buffers,
        })
    }

    fn image_bytes(
        &self,
        image: &gltf::Image<'_>,
        resolver: &dyn GltfResourceResolver,
    ) -> Result<Vec<u8>> {
        match image.source() {
            gltf::image::Source::View { view, .. } => {
                let buffer = self
                    .buffers
                    .get(view.buffer().index())
                    .context("Image view points past the buffer list")?;
                buffer
                    .get(view.offset()..view.offset() + view.length())
                    .map(<[u8]>::to_vec)
                    .context("Image view is out of buffer bounds")
            }
            gltf::image::Source::Uri { uri, .. } if uri.starts_with("data:") => {
                decode_data_uri(uri)
            }
            gltf::image::Source::Uri { uri, .. } => resolver.resolve_image(uri),
        }
    }

    fn geometry(&self, primitive: &gltf::Primitive<'_>) -> Result<MeshGeometry> {
        let get_buffer_data = |buffer: Buffer<'_>| self.buffers.get(buffer.index()).map(Vec::as_slice);
        let reader = primitive.reader(get_buffer_data);

        let positions: Vec<[f32; 3]> = reader
            .read_positions()
            .context("Vertex positions attribute not found")?
            .collect();
        let normals: Vec<[f32; 3]> = reader
            .read_normals()
            .map(|iter| iter.collect())
            .unwrap_or_default();
        let tex_coords: Vec<[f32; 2]> = reader
            .read_tex_coords(0)
            .map(|iter| iter.into_f32().collect())
            .unwrap_or_default();
        let indices: Vec<u32> = reader
            .read_indices()
            .map(|iter| iter.into_u32().collect())
            .unwrap_or_default();

        Ok(MeshGeometry {
            positions,
            normals,
            tex_coords,
            indices,
        })
    }
}

fn material_description(material: &gltf::Material<'_>, plan: &ChildPlan) -> MaterialDescription {
    let pbr = material.pbr_metallic_roughness();
    let mut textures = BTreeMap::new();
    let mut bind = |slot: &str, texture: Option<gltf::Texture<'_>>| {
        if let Some(id) = texture.and_then(|texture| plan.texture_id(texture)) {
            textures.insert(slot.to_string(), id);
        }
    };
    bind("base_color", pbr.base_color_texture().map(|info| info.texture()));
    bind(
        "metallic_roughness",
        pbr.metallic_roughness_texture().map(|info| info.texture()),
    );
    bind("normal", material.normal_texture().map(|info| info.texture()));
    bind("occlusion", material.occlusion_texture().map(|info| info.texture()));
    bind("emissive", material.emissive_texture().map(|info| info.texture()));

    let defaults = MaterialDescription::default();
    MaterialDescription {
        shader: None,
        base_color: pbr.base_color_factor(),
        metallic: pbr.metallic_factor(),
        roughness: pbr.roughness_factor(),
        emissive: material.emissive_factor(),
        alpha_mode: match material.alpha_mode() {
            gltf::material::AlphaMode::Opaque => AlphaMode::Opaque,
            gltf::material::AlphaMode::Mask => AlphaMode::Mask,
            gltf::material::AlphaMode::Blend => AlphaMode::Blend,
        },
        alpha_cutoff: material.alpha_cutoff().unwrap_or(defaults.alpha_cutoff),
        double_sided: material.double_sided(),
        textures,
    }
}

fn scene_node(node: gltf::Node<'_>, plan: &ChildPlan) -> SceneNode {
    let (translation, rotation, scale) = node.transform().decomposed();
    let mut out = SceneNode::new(node.name().unwrap_or("node"));
    out.translation = translation;
    out.rotation = rotation;
    out.scale = scale;

    if let Some(mesh) = node.mesh() {
        let parts: Vec<_> = mesh
            .primitives()
            .filter_map(|primitive| {
                let planned = plan
                    .primitives
                    .get(mesh.index())?
                    .get(primitive.index())?
                    .as_ref()?;
                Some((
                    planned.metadata.resource_id.clone(),
                    plan.material_id(&primitive.material()),
                ))
            })
            .collect();
        match parts.as_slice() {
            [(mesh_id, material_id)] => {
                out.mesh = Some(mesh_id.clone());
                out.material = material_id.clone();
            }
            parts => {
                // One child node per primitive.
                for (p, (mesh_id, material_id)) in parts.iter().enumerate() {
                    let mut part = SceneNode::new(format!("{}.{p}", out.name));
                    part.mesh = Some(mesh_id.clone());
                    part.material = material_id.clone();
                    out.children.push(part);
                }
            }
        }
    }

    out.children
        .extend(node.children().map(|child| scene_node(child, plan)));
    out
}

/// Loads `.gltf` and `.glb` containers as [`Composite`] resources.
#[derive(Debug, Default, Clone, Copy)]
pub struct GltfLoader;

impl GltfLoader {
    fn enqueue(
        ctx: &LoadContext<'_>,
        composite: &mut Composite,
        child: &PlannedChild,
        bytes: Vec<u8>,
    ) {
        let source = Arc::new(MemorySource::new(
            child.metadata.resource_id.as_str(),
            bytes,
        ));
        composite.insert(
            child.metadata.resource_type,
            child.key.clone(),
            child.metadata.resource_id.clone(),
        );
        ctx.requester
            .request_with_source(child.metadata.clone(), source);
    }

    fn load_children(
        container: &Container,
        plan: &ChildPlan,
        resolver: &dyn GltfResourceResolver,
        ctx: &LoadContext<'_>,
    ) -> Result<Composite> {
        let document = &container.document;
        let mut composite = Composite::default();

        for (image, planned) in document.images().zip(&plan.textures) {
            let bytes = match container.image_bytes(&image, resolver) {
                Ok(bytes) => bytes,
                Err(e) => {
                    log::warn!("Skipping image '{}': {:#}", planned.metadata.resource_id, e);
                    continue;
                }
            };
            let mut child = planned.clone();
            if let Err(e) = TextureLoader::read_dimensions(&mut child.metadata, &bytes) {
                log::warn!("Cannot inspect image '{}': {:#}", child.metadata.resource_id, e);
            }
            Self::enqueue(ctx, &mut composite, &child, bytes);
        }

        for (material, planned) in document.materials().zip(&plan.materials) {
            let description = material_description(&material, plan);
            let bytes = serde_json::to_vec(&description).context("Failed to encode material")?;
            Self::enqueue(ctx, &mut composite, planned, bytes);
        }

        for mesh in document.meshes() {
            for primitive in mesh.primitives() {
                let Some(Some(planned)) = plan
                    .primitives
                    .get(mesh.index())
                    .and_then(|primitives| primitives.get(primitive.index()))
                else {
                    continue;
                };
                let geometry = match container.geometry(&primitive) {
                    Ok(geometry) => geometry,
                    Err(e) => {
                        log::warn!("Skipping mesh '{}': {:#}", planned.metadata.resource_id, e);
                        continue;
                    }
                };
                let bytes = MeshLoader::encode_payload(&geometry)?;
                Self::enqueue(ctx, &mut composite, planned, bytes);
            }
        }

        for (scene, planned) in document.scenes().zip(&plan.scenes) {
            let graph = SceneGraph {
                name: scene.name().unwrap_or("scene").to_string(),
                nodes: scene.nodes().map(|node| scene_node(node, plan)).collect(),
            };
            let bytes = serde_json::to_vec(&graph).context("Failed to encode scene")?;
            Self::enqueue(ctx, &mut composite, planned, bytes);
        }

        composite.default_scene = document
            .default_scene()
            .or_else(|| document.scenes().next())
            .and_then(|scene| plan.scenes.get(scene.index()))
            .map(|child| child.metadata.resource_id.clone());
        Ok(composite)
    }
}

impl ResourceLoader for GltfLoader {
    fn name(&self) -> &'static str {
        "GltfLoader"
    }

    fn load(
        &self,
        metadata: &SourceMetadata,
        source: Arc<dyn ByteSource>,
        ctx: &LoadContext<'_>,
    ) -> Result<ResourceData> {
        if metadata.format != SourceFormat::Gltf {
            return Err(LoaderError::UnsupportedFormat {
                loader: self.name(),
                format: metadata.format,
                id: metadata.resource_id.clone(),
            }
            .into());
        }
        let bytes = source
            .load()
            .with_context(|| format!("Failed to read {}", source.describe()))?;
        let resolver = resolver_for(&*source);
        let container = Container::parse(&bytes, &*resolver)
            .with_context(|| format!("Failed to load glTF '{}'", metadata.resource_id))?;
        let plan = ChildPlan::new(metadata, &container.document);

        let composite = Self::load_children(&container, &plan, &*resolver, ctx)?;
        log::debug!(
            "Split '{}' into {} child resource(s)",
            metadata.resource_id,
            composite.len()
        );
        Ok(ResourceData::new(Arc::new(composite), source, metadata.clone()))
    }

    fn enrich_metadata(&self, metadata: &mut SourceMetadata, bytes: &[u8], _config: &ResourceConfig) {
        let gltf = match gltf::Gltf::from_slice(bytes) {
            Ok(gltf) => gltf,
            Err(e) => {
                log::warn!("Cannot inspect glTF '{}': {}", metadata.resource_id, e);
                return;
            }
        };
        let plan = ChildPlan::new(metadata, &gltf.document);
        let children = plan
            .all()
            .map(|child| (child.key.clone(), child.metadata.clone()))
            .collect();
        metadata.format_specific = FormatMetadata::Composite(CompositeMetadata { children });
    }
}
