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
use std::collections::BTreeMap;

/// How a material's alpha channel is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AlphaMode {
    #[default]
    Opaque,
    /// Alpha tested against `alpha_cutoff`.
    Mask,
    Blend,
}

fn white() -> [f32; 4] {
    [1.0; 4]
}

fn one() -> f32 {
    1.0
}

fn half() -> f32 {
    0.5
}

/// The persisted description of a material, stored as JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialDescription {
    /// The shader to render with; falls back to the metadata, then the
    /// configured default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shader: Option<ResourceId>,
    #[serde(default = "white")]
    pub base_color: [f32; 4],
    #[serde(default = "one")]
    pub metallic: f32,
    #[serde(default = "one")]
    pub roughness: f32,
    #[serde(default)]
    pub emissive: [f32; 3],
    #[serde(default)]
    pub alpha_mode: AlphaMode,
    #[serde(default = "half")]
    pub alpha_cutoff: f32,
    #[serde(default)]
    pub double_sided: bool,
    /// Texture ids by slot name (`base_color`, `normal`, ...).
    #[serde(default)]
    pub textures: BTreeMap<String, ResourceId>,
}

impl Default for MaterialDescription {
    fn default() -> Self {
        Self {
            shader: None,
            base_color: white(),
            metallic: one(),
            roughness: one(),
            emissive: [0.0; 3],
            alpha_mode: AlphaMode::Opaque,
            alpha_cutoff: half(),
            double_sided: false,
            textures: BTreeMap::new(),
        }
    }
}

/// A loaded material. Its shader and textures are separate resources,
/// requested when the material loads and looked up by id.
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    /// The resolved shader.
    pub shader: ResourceId,
    pub description: MaterialDescription,
}

impl Material {
    /// The texture bound to `slot`, if any.
    pub fn texture(&self, slot: &str) -> Option<&ResourceId> {
        self.description.textures.get(slot)
    }
}

impl TypedResource for Material {
    const TYPE: ResourceType = ResourceType::Material;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_take_defaults() {
        let description: MaterialDescription =
            serde_json::from_str(r#"{ "roughness": 0.25, "textures": { "normal": "t/n.png" } }"#)
                .unwrap();
        assert_eq!(description.roughness, 0.25);
        assert_eq!(description.metallic, 1.0);
        assert_eq!(description.base_color, [1.0; 4]);
        assert_eq!(description.shader, None);
        assert_eq!(
            description.textures.get("normal"),
            Some(&ResourceId::new("t/n.png"))
        );
    }
}
