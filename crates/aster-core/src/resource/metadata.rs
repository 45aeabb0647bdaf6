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

use super::{ResourceId, ResourceType, SourceFormat};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, path::PathBuf};

/// The current schema version of sidecar and database documents.
pub const METADATA_SCHEMA_VERSION: u32 = 1;

/// Serializable description of one resource.
///
/// This is the "identity card" the database persists next to every source
/// file. It carries everything the registry needs to pick a loader and open
/// the bytes, without touching the bytes themselves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceMetadata {
    /// The stable identifier, primary key everywhere.
    pub resource_id: ResourceId,

    /// The coarse category, used to select a loader.
    #[serde(rename = "type")]
    pub resource_type: ResourceType,

    /// Other resources this one needs loaded first, in order.
    #[serde(default)]
    pub dependencies: Vec<ResourceId>,

    /// The path of the source relative to the database root, or an opaque
    /// locator for in-memory children.
    pub source: String,

    /// The fine-grained encoding of the source bytes.
    pub format: SourceFormat,

    /// Extra fields whose shape depends on `resource_type`.
    #[serde(default)]
    pub format_specific: FormatMetadata,

    /// The resolved absolute path of the source. Computed, never persisted.
    #[serde(skip)]
    pub full_source_path: PathBuf,
}

impl SourceMetadata {
    /// Creates metadata with no dependencies and the default extra fields for
    /// `resource_type`.
    pub fn new(
        resource_id: ResourceId,
        resource_type: ResourceType,
        format: SourceFormat,
        source: impl Into<String>,
    ) -> Self {
        Self {
            resource_id,
            resource_type,
            dependencies: Vec::new(),
            source: source.into(),
            format,
            format_specific: FormatMetadata::default_for(resource_type),
            full_source_path: PathBuf::new(),
        }
    }

    /// Returns `true` when the active `format_specific` case matches the type.
    pub fn is_consistent(&self) -> bool {
        self.format_specific.matches(self.resource_type)
    }
}

/// Pixel layout of a decoded texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TextureFormat {
    /// Four 8-bit unsigned normalized channels.
    #[default]
    Rgba8,
    /// Four 32-bit float channels, used for HDR sources.
    Rgba32F,
}

impl TextureFormat {
    /// Size of one pixel in bytes.
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            TextureFormat::Rgba8 => 4,
            TextureFormat::Rgba32F => 16,
        }
    }
}

/// Extra fields for textures.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextureMetadata {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Whether the source stores high dynamic range samples.
    pub hdr: bool,
    /// Pixel layout after decoding.
    pub format: TextureFormat,
}

/// Extra fields for composites: every bundled child, by name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompositeMetadata {
    /// Child metadata keyed by the child's name within the container.
    pub children: BTreeMap<String, SourceMetadata>,
}

/// Extra fields for materials.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MaterialMetadata {
    /// The shader the material renders with.
    pub shader: ResourceId,
}

/// Extra fields for fonts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FontMetadata {
    /// Inclusive code point ranges to rasterize.
    pub glyph_ranges: Vec<(u32, u32)>,
}

/// The closed set of type-specific metadata blocks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub enum FormatMetadata {
    /// No extra fields.
    #[default]
    None,
    /// Texture dimensions and pixel layout.
    Texture(TextureMetadata),
    /// Bundled children.
    Composite(CompositeMetadata),
    /// Shader reference.
    Material(MaterialMetadata),
    /// Glyph ranges.
    Font(FontMetadata),
}

impl FormatMetadata {
    /// The empty block expected for a freshly created resource of `ty`.
    pub fn default_for(ty: ResourceType) -> Self {
        match ty {
            ResourceType::Texture => FormatMetadata::Texture(TextureMetadata::default()),
            ResourceType::Composite => FormatMetadata::Composite(CompositeMetadata::default()),
            ResourceType::Material => FormatMetadata::Material(MaterialMetadata::default()),
            ResourceType::Font => FormatMetadata::Font(FontMetadata::default()),
            _ => FormatMetadata::None,
        }
    }

    /// Returns `true` if this block is the one `ty` carries.
    pub fn matches(&self, ty: ResourceType) -> bool {
        matches!(
            (self, ty),
            (FormatMetadata::Texture(_), ResourceType::Texture)
                | (FormatMetadata::Composite(_), ResourceType::Composite)
                | (FormatMetadata::Material(_), ResourceType::Material)
                | (FormatMetadata::Font(_), ResourceType::Font)
                | (
                    FormatMetadata::None,
                    ResourceType::Shader
                        | ResourceType::Mesh
                        | ResourceType::Scene
                        | ResourceType::Unknown
                )
        )
    }
}

/// Per-database bookkeeping, persisted once per root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseMetadata {
    /// Schema version of the document.
    pub version: u32,
    /// Human readable database name.
    pub name: String,
    /// Number of catalogued resources at the last persist.
    pub resource_count: usize,
    /// Set when the catalogue changed since the last clean persist.
    pub dirty: bool,
}

impl DatabaseMetadata {
    /// A fresh, empty document.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            version: METADATA_SCHEMA_VERSION,
            name: name.into(),
            resource_count: 0,
            dirty: false,
        }
    }
}

/// The on-disk envelope of a `.meta` sidecar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SidecarDocument {
    /// Schema version the sidecar was written with.
    pub version: u32,
    /// The described resource.
    pub metadata: SourceMetadata,
}

impl SidecarDocument {
    /// Wraps metadata at the current schema version.
    pub fn current(metadata: SourceMetadata) -> Self {
        Self {
            version: METADATA_SCHEMA_VERSION,
            metadata,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texture() -> SourceMetadata {
        let mut meta = SourceMetadata::new(
            ResourceId::new("textures/a.png"),
            ResourceType::Texture,
            SourceFormat::Image,
            "textures/a.png",
        );
        meta.format_specific = FormatMetadata::Texture(TextureMetadata {
            width: 64,
            height: 32,
            hdr: false,
            format: TextureFormat::Rgba8,
        });
        meta
    }

    fn every_variant() -> Vec<SourceMetadata> {
        let mut material = SourceMetadata::new(
            ResourceId::new("materials/stone.mtl"),
            ResourceType::Material,
            SourceFormat::Material,
            "materials/stone.mtl",
        );
        material.format_specific = FormatMetadata::Material(MaterialMetadata {
            shader: ResourceId::new("shaders/pbr.slang"),
        });
        material.dependencies = vec![ResourceId::new("shaders/pbr.slang")];

        let mut font = SourceMetadata::new(
            ResourceId::new("fonts/mono.ttf"),
            ResourceType::Font,
            SourceFormat::FontFile,
            "fonts/mono.ttf",
        );
        font.format_specific = FormatMetadata::Font(FontMetadata {
            glyph_ranges: vec![(0x20, 0x7e), (0x400, 0x4ff)],
        });

        let mut composite = SourceMetadata::new(
            ResourceId::new("scenes/house.glb"),
            ResourceType::Composite,
            SourceFormat::Gltf,
            "scenes/house.glb",
        );
        let mut children = BTreeMap::new();
        children.insert("Texture0-roof".to_string(), texture());
        composite.format_specific = FormatMetadata::Composite(CompositeMetadata { children });

        let shader = SourceMetadata::new(
            ResourceId::new("shaders/pbr.slang"),
            ResourceType::Shader,
            SourceFormat::Shader,
            "shaders/pbr.slang",
        );

        vec![texture(), material, font, composite, shader]
    }

    #[test]
    fn archive_round_trip_is_lossless_for_every_variant() {
        for meta in every_variant() {
            let first = serde_json::to_string(&meta).unwrap();
            let back: SourceMetadata = serde_json::from_str(&first).unwrap();
            let second = serde_json::to_string(&back).unwrap();
            assert_eq!(first, second, "round trip changed {}", meta.resource_id);
            assert_eq!(back, meta);
        }
    }

    #[test]
    fn full_source_path_is_not_persisted() {
        let mut meta = texture();
        meta.full_source_path = PathBuf::from("/abs/textures/a.png");
        let json = serde_json::to_string(&meta).unwrap();
        assert!(!json.contains("/abs/"));
        let back: SourceMetadata = serde_json::from_str(&json).unwrap();
        assert_eq!(back.full_source_path, PathBuf::new());
    }

    #[test]
    fn variant_must_match_type() {
        assert!(texture().is_consistent());
        let mut wrong = texture();
        wrong.format_specific = FormatMetadata::Font(FontMetadata::default());
        assert!(!wrong.is_consistent());
        for ty in ResourceType::ALL {
            assert!(FormatMetadata::default_for(ty).matches(ty));
        }
    }

    #[test]
    fn type_field_is_named_type() {
        let json = serde_json::to_value(texture()).unwrap();
        assert_eq!(json["type"], "Texture");
        assert_eq!(json["format_specific"]["Texture"]["width"], 64);
    }
}
