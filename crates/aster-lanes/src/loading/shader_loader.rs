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

use crate::{
    error::LoaderError,
    loader::{LoadContext, ResourceData, ResourceLoader},
    resources::{Shader, ShaderLanguage},
};
use anyhow::{Context, Result};
use aster_core::{
    gpu::{GpuUpload, ShaderCode},
    resource::{SourceFormat, SourceMetadata},
    ByteSource,
};
use std::sync::Arc;

/// First word of every SPIR-V module.
pub const SPIRV_MAGIC: u32 = 0x0723_0203;

/// Loads shader source text and precompiled SPIR-V.
#[derive(Debug, Default, Clone, Copy)]
pub struct ShaderLoader;

impl ShaderLoader {
    /// Splits SPIR-V bytes into words, checking size and magic number.
    pub fn spirv_words(bytes: &[u8]) -> Result<Vec<u32>, LoaderError> {
        if bytes.is_empty() || bytes.len() % 4 != 0 {
            return Err(LoaderError::InvalidData {
                what: "SPIR-V module",
                reason: format!("length {} is not a positive multiple of 4", bytes.len()),
            });
        }
        let words: Vec<u32> = bytes
            .chunks_exact(4)
            .map(|chunk| u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect();
        if words[0] != SPIRV_MAGIC {
            return Err(LoaderError::InvalidData {
                what: "SPIR-V module",
                reason: format!("bad magic number {:#010x}", words[0]),
            });
        }
        Ok(words)
    }
}

impl ResourceLoader for ShaderLoader {
    fn name(&self) -> &'static str {
        "ShaderLoader"
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
        let label = metadata.resource_id.as_str();

        let (language, module) = match metadata.format {
            SourceFormat::Shader => {
                let text = std::str::from_utf8(&bytes).map_err(|e| LoaderError::InvalidData {
                    what: "shader source",
                    reason: e.to_string(),
                })?;
                let module = ctx.gpu.upload(GpuUpload::ShaderModule {
                    label,
                    code: ShaderCode::Source(text),
                })?;
                (ShaderLanguage::Slang, module)
            }
            SourceFormat::PrecompiledShader => {
                let words = Self::spirv_words(&bytes)?;
                let module = ctx.gpu.upload(GpuUpload::ShaderModule {
                    label,
                    code: ShaderCode::SpirV(&words),
                })?;
                (ShaderLanguage::SpirV, module)
            }
            format => {
                return Err(LoaderError::UnsupportedFormat {
                    loader: self.name(),
                    format,
                    id: metadata.resource_id.clone(),
                }
                .into())
            }
        };

        log::debug!("Created {:?} shader module '{}'", language, label);
        let shader = Shader {
            language,
            code_size: bytes.len(),
            module,
        };
        Ok(ResourceData::new(Arc::new(shader), source, metadata.clone()))
    }
}
