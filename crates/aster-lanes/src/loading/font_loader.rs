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
    resources::Font,
};
use anyhow::{Context, Result};
use aster_core::{
    resource::{FontMetadata, FormatMetadata, SourceFormat, SourceMetadata},
    ByteSource, ResourceConfig,
};
use std::{path::Path, sync::Arc};

/// Leading tags of the font containers we accept.
const FONT_MAGICS: [[u8; 4]; 4] = [
    [0x00, 0x01, 0x00, 0x00], // TrueType
    *b"OTTO",                 // OpenType with CFF outlines
    *b"true",                 // Apple TrueType
    *b"ttcf",                 // collection
];

/// Loads TrueType and OpenType font files.
#[derive(Debug, Default, Clone, Copy)]
pub struct FontLoader;

impl FontLoader {
    /// Checks the container tag.
    pub fn check_magic(bytes: &[u8]) -> Result<(), LoaderError> {
        let tag = bytes.get(..4).ok_or_else(|| LoaderError::InvalidData {
            what: "font file",
            reason: format!("{} bytes is too short for a font header", bytes.len()),
        })?;
        if FONT_MAGICS.iter().any(|magic| magic == tag) {
            Ok(())
        } else {
            Err(LoaderError::InvalidData {
                what: "font file",
                reason: format!("unknown container tag {tag:02x?}"),
            })
        }
    }

    fn glyph_ranges(metadata: &SourceMetadata, config: &ResourceConfig) -> Vec<(u32, u32)> {
        match &metadata.format_specific {
            FormatMetadata::Font(font) if !font.glyph_ranges.is_empty() => {
                font.glyph_ranges.clone()
            }
            _ => config.default_glyph_ranges.clone(),
        }
    }
}

impl ResourceLoader for FontLoader {
    fn name(&self) -> &'static str {
        "FontLoader"
    }

    fn load(
        &self,
        metadata: &SourceMetadata,
        source: Arc<dyn ByteSource>,
        ctx: &LoadContext<'_>,
    ) -> Result<ResourceData> {
        if metadata.format != SourceFormat::FontFile {
            return Err(LoaderError::UnsupportedFormat {
                loader: self.name(),
                format: metadata.format,
                id: metadata.resource_id.clone(),
            }
            .into());
        }
        let data = source
            .load()
            .with_context(|| format!("Failed to read {}", source.describe()))?;
        Self::check_magic(&data)
            .with_context(|| format!("Failed to load font '{}'", metadata.resource_id))?;

        let name = Path::new(&metadata.source)
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or(metadata.resource_id.as_str())
            .to_string();
        let font = Font {
            name,
            data,
            glyph_ranges: Self::glyph_ranges(metadata, ctx.config),
        };
        log::debug!(
            "Loaded font '{}' with {} glyph range(s)",
            font.name,
            font.glyph_ranges.len()
        );
        Ok(ResourceData::new(Arc::new(font), source, metadata.clone()))
    }

    fn enrich_metadata(&self, metadata: &mut SourceMetadata, _bytes: &[u8], config: &ResourceConfig) {
        let glyph_ranges = Self::glyph_ranges(metadata, config);
        metadata.format_specific = FormatMetadata::Font(FontMetadata { glyph_ranges });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::TestEnv;
    use aster_core::{
        resource::{downcast_resource, ResourceId, ResourceType},
        MemorySource,
    };

    fn metadata() -> SourceMetadata {
        SourceMetadata::new(
            ResourceId::new("fonts/mono.ttf"),
            ResourceType::Font,
            SourceFormat::FontFile,
            "fonts/mono.ttf",
        )
    }

    #[test]
    fn accepts_truetype_and_uses_default_ranges() {
        let env = TestEnv::new();
        let mut bytes = vec![0x00, 0x01, 0x00, 0x00];
        bytes.extend_from_slice(&[0; 12]);
        let data = FontLoader
            .load(&metadata(), Arc::new(MemorySource::new("f", bytes)), &env.ctx())
            .unwrap();
        let font = downcast_resource::<Font>(data.resource).unwrap();
        assert_eq!(font.name, "mono");
        assert!(font.covers('A'));
        assert!(!font.covers('é'));
    }

    #[test]
    fn rejects_unknown_containers() {
        assert!(FontLoader::check_magic(b"OTTO....").is_ok());
        assert!(FontLoader::check_magic(b"wOFF....").is_err());
        assert!(FontLoader::check_magic(b"tt").is_err());
    }

    #[test]
    fn enrichment_keeps_declared_ranges() {
        let config = ResourceConfig::default();
        let mut meta = metadata();
        FontLoader.enrich_metadata(&mut meta, &[], &config);
        assert_eq!(
            meta.format_specific,
            FormatMetadata::Font(FontMetadata {
                glyph_ranges: config.default_glyph_ranges.clone(),
            })
        );

        meta.format_specific = FormatMetadata::Font(FontMetadata {
            glyph_ranges: vec![(0x400, 0x4ff)],
        });
        FontLoader.enrich_metadata(&mut meta, &[], &config);
        assert_eq!(
            meta.format_specific,
            FormatMetadata::Font(FontMetadata {
                glyph_ranges: vec![(0x400, 0x4ff)],
            })
        );
    }
}
