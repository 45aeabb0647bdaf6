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
    resources::{Material, MaterialDescription},
};
use anyhow::{Context, Result};
use aster_core::{
    resource::{FormatMetadata, MaterialMetadata, ResourceId, SourceFormat, SourceMetadata},
    ByteSource, ResourceConfig,
};
use std::sync::Arc;

/// Loads JSON material descriptions, from files or composite payloads.
#[derive(Debug, Default, Clone, Copy)]
pub struct MaterialLoader;

impl MaterialLoader {
    /// Parses a description. An empty file is an all-default material.
    pub fn parse(bytes: &[u8]) -> Result<MaterialDescription> {
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(MaterialDescription::default());
        }
        serde_json::from_slice(bytes).map_err(|e| {
            LoaderError::InvalidData {
                what: "material description",
                reason: e.to_string(),
            }
            .into()
        })
    }

    /// Picks the shader: the description's, then the metadata's, then the
    /// configured default.
    pub fn resolve_shader(
        description: &MaterialDescription,
        metadata: &SourceMetadata,
        config: &ResourceConfig,
    ) -> ResourceId {
        if let Some(shader) = description.shader.as_ref().filter(|id| !id.is_null()) {
            return shader.clone();
        }
        match &metadata.format_specific {
            FormatMetadata::Material(MaterialMetadata { shader }) if !shader.is_null() => {
                shader.clone()
            }
            _ => config.default_material_shader.clone(),
        }
    }
}

impl ResourceLoader for MaterialLoader {
    fn name(&self) -> &'static str {
        "MaterialLoader"
    }

    fn load(
        &self,
        metadata: &SourceMetadata,
        source: Arc<dyn ByteSource>,
        ctx: &LoadContext<'_>,
    ) -> Result<ResourceData> {
        if !matches!(metadata.format, SourceFormat::Material | SourceFormat::Memory) {
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
        let description = Self::parse(&bytes)
            .with_context(|| format!("Failed to parse material '{}'", metadata.resource_id))?;
        let shader = Self::resolve_shader(&description, metadata, ctx.config);

        ctx.requester.request(&shader);
        for texture in description.textures.values() {
            ctx.requester.request(texture);
        }

        Ok(ResourceData::new(
            Arc::new(Material {
                shader,
                description,
            }),
            source,
            metadata.clone(),
        ))
    }

    fn save(&self, data: &ResourceData) -> Result<()> {
        let material = data.downcast::<Material>()?;
        let text = serde_json::to_vec_pretty(&material.description)
            .context("Failed to serialize material")?;
        data.source
            .write(&text)
            .with_context(|| format!("Failed to write {}", data.source.describe()))
    }

    fn enrich_metadata(&self, metadata: &mut SourceMetadata, bytes: &[u8], config: &ResourceConfig) {
        let description = Self::parse(bytes).unwrap_or_else(|e| {
            log::warn!("Cannot inspect material '{}': {:#}", metadata.resource_id, e);
            MaterialDescription::default()
        });
        let shader = Self::resolve_shader(&description, metadata, config);
        metadata.format_specific = FormatMetadata::Material(MaterialMetadata {
            shader: shader.clone(),
        });
        if !metadata.dependencies.contains(&shader) {
            metadata.dependencies.push(shader);
        }
    }
}
