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
    resources::{Scene, SceneGraph},
};
use anyhow::{Context, Result};
use aster_core::{
    resource::{SourceFormat, SourceMetadata},
    ByteSource,
};
use std::sync::Arc;

/// Loads JSON scene graphs and writes edited scenes back.
#[derive(Debug, Default, Clone, Copy)]
pub struct SceneLoader;

impl ResourceLoader for SceneLoader {
    fn name(&self) -> &'static str {
        "SceneLoader"
    }

    fn load(
        &self,
        metadata: &SourceMetadata,
        source: Arc<dyn ByteSource>,
        ctx: &LoadContext<'_>,
    ) -> Result<ResourceData> {
        if !matches!(metadata.format, SourceFormat::Scene | SourceFormat::Memory) {
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
        let graph: SceneGraph = serde_json::from_slice(&bytes).map_err(|e| {
            LoaderError::InvalidData {
                what: "scene graph",
                reason: e.to_string(),
            }
        })?;

        for id in graph.referenced_resources() {
            ctx.requester.request(&id);
        }
        log::debug!(
            "Loaded scene '{}' ({} root node(s))",
            metadata.resource_id,
            graph.nodes.len()
        );
        Ok(ResourceData::new(
            Arc::new(Scene::new(graph)),
            source,
            metadata.clone(),
        ))
    }

    fn save(&self, data: &ResourceData) -> Result<()> {
        let scene = data.downcast::<Scene>()?;
        let text = serde_json::to_vec_pretty(&*scene.graph()).context("Failed to serialize scene")?;
        data.source
            .write(&text)
            .with_context(|| format!("Failed to write {}", data.source.describe()))
    }
}
