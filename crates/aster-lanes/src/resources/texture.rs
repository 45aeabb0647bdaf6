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
    resource::{ResourceType, TextureFormat, TypedResource},
};

/// A texture resident on the GPU.
///
/// The CPU copy of the pixels is released once uploaded; only the layout and
/// the device object are kept.
#[derive(Debug, Clone, PartialEq)]
pub struct Texture {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Pixel layout on the device.
    pub format: TextureFormat,
    /// Whether the source held high dynamic range samples.
    pub hdr: bool,
    /// The uploaded device object.
    pub gpu_object: GpuObject,
}

impl Texture {
    /// Size of the uploaded pixel data in bytes.
    pub fn byte_size(&self) -> usize {
        self.width as usize * self.height as usize * self.format.bytes_per_pixel()
    }
}

impl TypedResource for Texture {
    const TYPE: ResourceType = ResourceType::Texture;
}
