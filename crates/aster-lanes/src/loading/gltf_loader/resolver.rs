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

//! Resolution of the external files and inline data a glTF container points to.

use anyhow::{anyhow, bail, Context, Result};
use aster_core::ByteSource;
use base64::Engine;
use std::path::{Path, PathBuf};

/// Resolves URIs referenced from inside a glTF container.
pub trait GltfResourceResolver: Send + Sync {
    /// Resolves an external buffer URI to its binary data.
    fn resolve_buffer(&self, uri: &str) -> Result<Vec<u8>>;

    /// Resolves an external image URI to its encoded data.
    fn resolve_image(&self, uri: &str) -> Result<Vec<u8>>;
}

/// Resolves URIs relative to the directory holding the container.
pub struct FileSystemResolver {
    base_path: PathBuf,
}

impl FileSystemResolver {
    /// Creates a resolver rooted at `base_path`.
    pub fn new(base_path: impl AsRef<Path>) -> Self {
        Self {
            base_path: base_path.as_ref().to_path_buf(),
        }
    }

    fn read(&self, uri: &str, what: &str) -> Result<Vec<u8>> {
        let path = self.base_path.join(uri);
        std::fs::read(&path)
            .with_context(|| format!("Failed to read external {what} from '{}'", path.display()))
    }
}

impl GltfResourceResolver for FileSystemResolver {
    fn resolve_buffer(&self, uri: &str) -> Result<Vec<u8>> {
        self.read(uri, "buffer")
    }

    fn resolve_image(&self, uri: &str) -> Result<Vec<u8>> {
        self.read(uri, "image")
    }
}

/// For containers without a location on disk. Every external URI fails.
pub struct DetachedResolver {
    label: String,
}

impl GltfResourceResolver for DetachedResolver {
    fn resolve_buffer(&self, uri: &str) -> Result<Vec<u8>> {
        bail!("{} has no directory to resolve buffer '{uri}' against", self.label)
    }

    fn resolve_image(&self, uri: &str) -> Result<Vec<u8>> {
        bail!("{} has no directory to resolve image '{uri}' against", self.label)
    }
}

/// The resolver matching where `source` lives.
pub fn resolver_for(source: &dyn ByteSource) -> Box<dyn GltfResourceResolver> {
    match source.path().and_then(Path::parent) {
        Some(dir) => Box::new(FileSystemResolver::new(dir)),
        None => Box::new(DetachedResolver {
            label: source.describe(),
        }),
    }
}

/// Decodes a base64 `data:` URI, whatever its media type.
pub fn decode_data_uri(uri: &str) -> Result<Vec<u8>> {
    let (_media_type, data) = uri
        .strip_prefix("data:")
        .and_then(|rest| rest.split_once(";base64,"))
        .ok_or_else(|| anyhow!("Unsupported data URI format: {}", truncate(uri)))?;
    base64::engine::general_purpose::STANDARD
        .decode(data)
        .context("Invalid base64 payload in data URI")
}

fn truncate(uri: &str) -> &str {
    uri.char_indices().nth(48).map_or(uri, |(end, _)| &uri[..end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use aster_core::{FileSource, MemorySource};

    #[test]
    fn data_uris_of_any_media_type_decode() {
        assert_eq!(
            decode_data_uri("data:application/octet-stream;base64,AQID").unwrap(),
            vec![1, 2, 3]
        );
        assert_eq!(decode_data_uri("data:image/png;base64,AQID").unwrap(), vec![1, 2, 3]);
        assert!(decode_data_uri("data:text/plain,hello").is_err());
    }

    #[test]
    fn external_files_resolve_next_to_the_container() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("mesh.bin"), [7u8, 8, 9]).unwrap();

        let file = FileSource::new(dir.path().join("scene.gltf"));
        let resolver = resolver_for(&file);
        assert_eq!(resolver.resolve_buffer("mesh.bin").unwrap(), vec![7, 8, 9]);

        let memory = MemorySource::empty("inline");
        assert!(resolver_for(&memory).resolve_buffer("mesh.bin").is_err());
    }
}
