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

//! Test doubles shared by the loader tests.

use crate::loader::LoadContext;
use aster_core::{
    gpu::HeadlessGpuContext,
    resource::{ResourceId, SourceMetadata},
    ByteSource, ResourceConfig, ResourceRequester,
};
use std::sync::{Arc, Mutex};

/// Records every request instead of loading anything.
#[derive(Default)]
pub struct RecordingRequester {
    pub requested: Mutex<Vec<ResourceId>>,
    pub children: Mutex<Vec<(SourceMetadata, Arc<dyn ByteSource>)>>,
}

impl RecordingRequester {
    pub fn requested(&self) -> Vec<ResourceId> {
        self.requested.lock().unwrap().clone()
    }

    pub fn child_ids(&self) -> Vec<ResourceId> {
        self.children
            .lock()
            .unwrap()
            .iter()
            .map(|(metadata, _)| metadata.resource_id.clone())
            .collect()
    }
}

impl ResourceRequester for RecordingRequester {
    fn request(&self, id: &ResourceId) {
        self.requested.lock().unwrap().push(id.clone());
    }

    fn request_with_source(&self, metadata: SourceMetadata, source: Arc<dyn ByteSource>) {
        self.children.lock().unwrap().push((metadata, source));
    }
}

pub struct TestEnv {
    pub gpu: HeadlessGpuContext,
    pub requester: RecordingRequester,
    pub config: ResourceConfig,
}

impl TestEnv {
    pub fn new() -> Self {
        Self {
            gpu: HeadlessGpuContext::new(),
            requester: RecordingRequester::default(),
            config: ResourceConfig::default(),
        }
    }

    pub fn ctx(&self) -> LoadContext<'_> {
        LoadContext {
            gpu: &self.gpu,
            requester: &self.requester,
            config: &self.config,
        }
    }
}

/// Encodes a small RGBA8 PNG.
pub fn png(width: u32, height: u32) -> Vec<u8> {
    let image = image::RgbaImage::from_fn(width, height, |x, y| {
        image::Rgba([(x * 40) as u8, (y * 40) as u8, 128, 255])
    });
    let mut bytes = Vec::new();
    image
        .write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
        .unwrap();
    bytes
}
