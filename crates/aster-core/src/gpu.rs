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

//! The GPU sink loaders materialize decoded data into.
//!
//! Loaders see the device as an opaque service: hand over decoded bytes, get
//! back an opaque [`GpuObject`]. Failures are ordinary errors.

use crate::resource::TextureFormat;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use thiserror::Error;

/// An opaque device-side object created by a [`GpuContext`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GpuObject(pub u64);

/// How a buffer will be bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferUsage {
    /// Vertex attributes.
    Vertex,
    /// Triangle indices.
    Index,
    /// Constant parameters.
    Uniform,
}

/// Shader code in one of the forms a device accepts.
#[derive(Debug, Clone, Copy)]
pub enum ShaderCode<'a> {
    /// Source text, compiled by the device layer.
    Source(&'a str),
    /// SPIR-V words.
    SpirV(&'a [u32]),
}

/// One upload request.
#[derive(Debug, Clone, Copy)]
pub enum GpuUpload<'a> {
    /// A 2D texture with tightly packed rows.
    Texture {
        /// Debug label.
        label: &'a str,
        /// Width in pixels.
        width: u32,
        /// Height in pixels.
        height: u32,
        /// Layout of `pixels`.
        format: TextureFormat,
        /// Pixel data, `width * height * format.bytes_per_pixel()` bytes.
        pixels: &'a [u8],
    },
    /// A linear buffer.
    Buffer {
        /// Debug label.
        label: &'a str,
        /// Intended binding.
        usage: BufferUsage,
        /// Contents.
        bytes: &'a [u8],
    },
    /// A shader module.
    ShaderModule {
        /// Debug label.
        label: &'a str,
        /// Code to compile or load.
        code: ShaderCode<'a>,
    },
}

impl GpuUpload<'_> {
    /// The debug label of the request.
    pub fn label(&self) -> &str {
        match self {
            GpuUpload::Texture { label, .. }
            | GpuUpload::Buffer { label, .. }
            | GpuUpload::ShaderModule { label, .. } => label,
        }
    }

    /// Number of bytes transferred to the device.
    pub fn byte_len(&self) -> usize {
        match self {
            GpuUpload::Texture { pixels, .. } => pixels.len(),
            GpuUpload::Buffer { bytes, .. } => bytes.len(),
            GpuUpload::ShaderModule { code, .. } => match code {
                ShaderCode::Source(text) => text.len(),
                ShaderCode::SpirV(words) => words.len() * 4,
            },
        }
    }
}

/// Errors reported by a [`GpuContext`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GpuError {
    /// The pixel data does not match the declared dimensions.
    #[error("texture '{label}' has {actual} bytes of pixel data, expected {expected}")]
    SizeMismatch {
        /// Debug label of the upload.
        label: String,
        /// Bytes implied by the dimensions.
        expected: usize,
        /// Bytes provided.
        actual: usize,
    },
    /// The upload carries no data.
    #[error("upload '{0}' is empty")]
    Empty(String),
    /// The device refused the upload.
    #[error("device rejected upload '{label}': {reason}")]
    Rejected {
        /// Debug label of the upload.
        label: String,
        /// Device supplied reason.
        reason: String,
    },
}

/// The device-side sink used by loaders. Must be usable from any worker.
pub trait GpuContext: Send + Sync {
    /// Uploads decoded data and returns the created device object.
    fn upload(&self, upload: GpuUpload<'_>) -> Result<GpuObject, GpuError>;
}

/// A device that keeps nothing, for tools, tests and servers.
///
/// It validates requests the way a real device would, hands out increasing
/// object ids and counts what was uploaded.
#[derive(Debug, Default)]
pub struct HeadlessGpuContext {
    next_object: AtomicU64,
    uploads: AtomicUsize,
    uploaded_bytes: AtomicU64,
    reject_all: AtomicBool,
}

impl HeadlessGpuContext {
    /// Creates an empty device.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every following upload fail with [`GpuError::Rejected`].
    pub fn set_reject_all(&self, reject: bool) {
        self.reject_all.store(reject, Ordering::SeqCst);
    }

    /// Number of successful uploads.
    pub fn upload_count(&self) -> usize {
        self.uploads.load(Ordering::SeqCst)
    }

    /// Total bytes of successful uploads.
    pub fn uploaded_bytes(&self) -> u64 {
        self.uploaded_bytes.load(Ordering::SeqCst)
    }
}

impl GpuContext for HeadlessGpuContext {
    fn upload(&self, upload: GpuUpload<'_>) -> Result<GpuObject, GpuError> {
        if self.reject_all.load(Ordering::SeqCst) {
            return Err(GpuError::Rejected {
                label: upload.label().to_string(),
                reason: "headless device set to reject uploads".to_string(),
            });
        }

        if let GpuUpload::Texture {
            label,
            width,
            height,
            format,
            pixels,
        } = upload
        {
            let expected = width as usize * height as usize * format.bytes_per_pixel();
            if pixels.len() != expected {
                return Err(GpuError::SizeMismatch {
                    label: label.to_string(),
                    expected,
                    actual: pixels.len(),
                });
            }
        }

        if upload.byte_len() == 0 {
            return Err(GpuError::Empty(upload.label().to_string()));
        }

        self.uploads.fetch_add(1, Ordering::SeqCst);
        self.uploaded_bytes
            .fetch_add(upload.byte_len() as u64, Ordering::SeqCst);
        Ok(GpuObject(self.next_object.fetch_add(1, Ordering::SeqCst) + 1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headless_device_validates_texture_size() {
        let gpu = HeadlessGpuContext::new();
        let pixels = vec![0u8; 2 * 2 * 4];
        let ok = gpu.upload(GpuUpload::Texture {
            label: "white",
            width: 2,
            height: 2,
            format: TextureFormat::Rgba8,
            pixels: &pixels,
        });
        assert_eq!(ok, Ok(GpuObject(1)));

        let bad = gpu.upload(GpuUpload::Texture {
            label: "short",
            width: 4,
            height: 4,
            format: TextureFormat::Rgba8,
            pixels: &pixels,
        });
        assert!(matches!(bad, Err(GpuError::SizeMismatch { expected: 64, .. })));
        assert_eq!(gpu.upload_count(), 1);
        assert_eq!(gpu.uploaded_bytes(), 16);
    }

    #[test]
    fn rejecting_device_fails_every_upload() {
        let gpu = HeadlessGpuContext::new();
        gpu.set_reject_all(true);
        let result = gpu.upload(GpuUpload::Buffer {
            label: "vertices",
            usage: BufferUsage::Vertex,
            bytes: &[1, 2, 3, 4],
        });
        assert!(matches!(result, Err(GpuError::Rejected { .. })));
    }
}
