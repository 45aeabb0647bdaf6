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

//! Texture decoding and upload.

use crate::{
    error::LoaderError,
    loader::{LoadContext, ResourceData, ResourceLoader},
    resources::Texture,
};
use anyhow::{Context, Result};
use aster_core::{
    gpu::{GpuContext, GpuUpload},
    resource::{
        FormatMetadata, ResourceId, SourceFormat, SourceMetadata, TextureFormat, TextureMetadata,
    },
    ByteSource, ResourceConfig,
};
use image::{ImageFormat, ImageReader};
use std::{io::Cursor, sync::Arc};

/// Id of the procedural opaque white texture.
pub const WHITE_TEXTURE: &str = "engine/textures/white";
/// Id of the procedural opaque black texture.
pub const BLACK_TEXTURE: &str = "engine/textures/black";
/// Id of the procedural checkerboard shown in place of missing textures.
pub const MISSING_TEXTURE: &str = "engine/textures/missing";

/// Decoded pixels, ready for upload.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
    pub hdr: bool,
    /// Tightly packed rows.
    pub pixels: Vec<u8>,
}

impl DecodedImage {
    fn solid(rgba: [u8; 4]) -> Self {
        Self {
            width: 1,
            height: 1,
            format: TextureFormat::Rgba8,
            hdr: false,
            pixels: rgba.to_vec(),
        }
    }

    fn checkerboard(size: u32, cell: u32) -> Self {
        let mut pixels = Vec::with_capacity((size * size * 4) as usize);
        for y in 0..size {
            for x in 0..size {
                let magenta = ((x / cell) + (y / cell)) % 2 == 0;
                pixels.extend_from_slice(if magenta {
                    &[255, 0, 255, 255]
                } else {
                    &[0, 0, 0, 255]
                });
            }
        }
        Self {
            width: size,
            height: size,
            format: TextureFormat::Rgba8,
            hdr: false,
            pixels,
        }
    }
}

/// Loads `Image` sources: PNG, JPEG, HDR and friends.
#[derive(Debug, Default, Clone, Copy)]
pub struct TextureLoader;

impl TextureLoader {
    /// Decodes an encoded image. HDR sources keep float precision.
    pub fn decode(bytes: &[u8]) -> Result<DecodedImage> {
        let hdr = matches!(
            image::guess_format(bytes),
            Ok(ImageFormat::Hdr | ImageFormat::OpenExr)
        );
        let img = image::load_from_memory(bytes).context("Failed to decode image from memory")?;
        let (width, height) = (img.width(), img.height());

        let (format, pixels) = if hdr {
            let rgba = img.to_rgba32f().into_raw();
            (
                TextureFormat::Rgba32F,
                bytemuck::cast_slice::<f32, u8>(&rgba).to_vec(),
            )
        } else {
            (TextureFormat::Rgba8, img.to_rgba8().into_raw())
        };

        Ok(DecodedImage {
            width,
            height,
            format,
            hdr,
            pixels,
        })
    }

    /// Uploads decoded pixels and returns the texture resource.
    pub fn upload(gpu: &dyn GpuContext, label: &str, image: &DecodedImage) -> Result<Texture> {
        let gpu_object = gpu
            .upload(GpuUpload::Texture {
                label,
                width: image.width,
                height: image.height,
                format: image.format,
                pixels: &image.pixels,
            })
            .with_context(|| format!("Failed to upload texture '{label}'"))?;
        Ok(Texture {
            width: image.width,
            height: image.height,
            format: image.format,
            hdr: image.hdr,
            gpu_object,
        })
    }

    /// Reads dimensions and pixel layout from the header only.
    pub fn read_dimensions(metadata: &mut SourceMetadata, bytes: &[u8]) -> Result<()> {
        let reader = ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .context("Failed to read image header")?;
        let hdr = matches!(reader.format(), Some(ImageFormat::Hdr | ImageFormat::OpenExr));
        let (width, height) = reader
            .into_dimensions()
            .context("Failed to read image dimensions")?;
        metadata.format_specific = FormatMetadata::Texture(TextureMetadata {
            width,
            height,
            hdr,
            format: if hdr {
                TextureFormat::Rgba32F
            } else {
                TextureFormat::Rgba8
            },
        });
        Ok(())
    }

    /// The procedural textures every registry starts with.
    pub fn fallback_textures(gpu: &dyn GpuContext) -> Result<Vec<(ResourceId, Texture)>> {
        [
            (WHITE_TEXTURE, DecodedImage::solid([255, 255, 255, 255])),
            (BLACK_TEXTURE, DecodedImage::solid([0, 0, 0, 255])),
            (MISSING_TEXTURE, DecodedImage::checkerboard(8, 4)),
        ]
        .into_iter()
        .map(|(id, image)| Ok((ResourceId::new(id), Self::upload(gpu, id, &image)?)))
        .collect()
    }
}

impl ResourceLoader for TextureLoader {
    fn name(&self) -> &'static str {
        "TextureLoader"
    }

    fn load(
        &self,
        metadata: &SourceMetadata,
        source: Arc<dyn ByteSource>,
        ctx: &LoadContext<'_>,
    ) -> Result<ResourceData> {
        if metadata.format != SourceFormat::Image {
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
        let image = Self::decode(&bytes)
            .with_context(|| format!("Failed to decode texture '{}'", metadata.resource_id))?;
        let texture = Self::upload(ctx.gpu, metadata.resource_id.as_str(), &image)?;
        log::debug!(
            "Decoded texture '{}' ({}x{}, {:?})",
            metadata.resource_id,
            texture.width,
            texture.height,
            texture.format
        );
        Ok(ResourceData::new(Arc::new(texture), source, metadata.clone()))
    }

    fn enrich_metadata(&self, metadata: &mut SourceMetadata, bytes: &[u8], _config: &ResourceConfig) {
        if let Err(e) = Self::read_dimensions(metadata, bytes) {
            log::warn!("Cannot inspect texture '{}': {:#}", metadata.resource_id, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{png, TestEnv};
    use aster_core::{
        resource::{downcast_resource, ResourceType},
        MemorySource,
    };

    fn metadata() -> SourceMetadata {
        SourceMetadata::new(
            ResourceId::new("textures/a.png"),
            ResourceType::Texture,
            SourceFormat::Image,
            "textures/a.png",
        )
    }

    #[test]
    fn decodes_and_uploads_png() {
        let env = TestEnv::new();
        let source = Arc::new(MemorySource::new("a", png(4, 2)));
        let data = TextureLoader.load(&metadata(), source, &env.ctx()).unwrap();

        let texture = downcast_resource::<Texture>(data.resource).unwrap();
        assert_eq!((texture.width, texture.height), (4, 2));
        assert_eq!(texture.format, TextureFormat::Rgba8);
        assert!(!texture.hdr);
        assert_eq!(env.gpu.uploaded_bytes(), 32);
    }

    #[test]
    fn garbage_fails_without_upload() {
        let env = TestEnv::new();
        let source = Arc::new(MemorySource::new("bad", b"definitely not an image".to_vec()));
        assert!(TextureLoader.load(&metadata(), source, &env.ctx()).is_err());
        assert_eq!(env.gpu.upload_count(), 0);
    }

    #[test]
    fn read_dimensions_fills_metadata() {
        let mut meta = metadata();
        TextureLoader.enrich_metadata(&mut meta, &png(3, 5), &ResourceConfig::default());
        assert_eq!(
            meta.format_specific,
            FormatMetadata::Texture(TextureMetadata {
                width: 3,
                height: 5,
                hdr: false,
                format: TextureFormat::Rgba8,
            })
        );
    }

    #[test]
    fn fallback_textures_are_uploaded() {
        let env = TestEnv::new();
        let textures = TextureLoader::fallback_textures(&env.gpu).unwrap();
        assert_eq!(textures.len(), 3);
        assert_eq!(textures[2].0.as_str(), MISSING_TEXTURE);
        assert_eq!((textures[2].1.width, textures[2].1.height), (8, 8));
        assert_eq!(env.gpu.upload_count(), 3);
    }
}
