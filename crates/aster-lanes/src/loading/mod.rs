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

//! Per-format loaders.

mod font_loader;
mod gltf_loader;
mod material_loader;
mod mesh_loader;
mod scene_loader;
mod shader_loader;
mod texture_loader;

pub use font_loader::*;
pub use gltf_loader::*;
pub use material_loader::*;
pub use mesh_loader::*;
pub use scene_loader::*;
pub use shader_loader::*;
pub use texture_loader::*;
