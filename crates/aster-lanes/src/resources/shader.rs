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

/// The form a shader module was created from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderLanguage {
    /// Slang source text.
    Slang,
    /// Precompiled SPIR-V.
    SpirV,
}

/// A shader module created on the device.
#[derive(Debug, Clone, PartialEq)]
pub struct Shader {
    pub language: ShaderLanguage,
    /// Size of the code handed to the device, in bytes.
    pub code_size: usize,
    pub module: GpuObject,
}

impl TypedResource for Shader {
    const TYPE: ResourceType = ResourceType::Shader;
}
