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

//! Maps file extensions to resource categories and encodings.

use aster_core::resource::{ResourceType, SourceFormat};
use std::path::Path;

/// Every extension the database recognizes, lower case, without the dot.
pub const KNOWN_EXTENSIONS: &[(&str, ResourceType, SourceFormat)] = &[
    ("png", ResourceType::Texture, SourceFormat::Image),
    ("jpg", ResourceType::Texture, SourceFormat::Image),
    ("jpeg", ResourceType::Texture, SourceFormat::Image),
    ("hdr", ResourceType::Texture, SourceFormat::Image),
    ("obj", ResourceType::Mesh, SourceFormat::Obj),
    ("mtl", ResourceType::Material, SourceFormat::Material),
    ("slang", ResourceType::Shader, SourceFormat::Shader),
    ("spv", ResourceType::Shader, SourceFormat::PrecompiledShader),
    ("glb", ResourceType::Composite, SourceFormat::Gltf),
    ("gltf", ResourceType::Composite, SourceFormat::Gltf),
    ("ttf", ResourceType::Font, SourceFormat::FontFile),
    ("otf", ResourceType::Font, SourceFormat::FontFile),
    ("scene", ResourceType::Scene, SourceFormat::Scene),
];

/// Looks up an extension, case-insensitively. The leading dot is optional.
pub fn extension_to_type(extension: &str) -> Option<(ResourceType, SourceFormat)> {
    let extension = extension.trim_start_matches('.').to_ascii_lowercase();
    KNOWN_EXTENSIONS
        .iter()
        .find(|(ext, _, _)| *ext == extension)
        .map(|&(_, ty, format)| (ty, format))
}

/// Classifies a path by its extension.
pub fn classify_path(path: &Path) -> Option<(ResourceType, SourceFormat)> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .and_then(extension_to_type)
}
