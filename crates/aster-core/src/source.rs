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

//! Abstractions over where a resource's raw bytes live.

use std::{
    fmt, fs, io,
    path::{Path, PathBuf},
    sync::Arc,
};

/// Reads (and optionally writes back) the raw bytes of one resource.
///
/// Creating a source never touches storage; bytes are read on [`ByteSource::load`].
pub trait ByteSource: Send + Sync + fmt::Debug {
    /// Reads the full contents.
    fn load(&self) -> io::Result<Vec<u8>>;

    /// Replaces the full contents.
    fn write(&self, bytes: &[u8]) -> io::Result<()>;

    /// A short human readable locator, for logs.
    fn describe(&self) -> String;

    /// The file backing this source, if any.
    ///
    /// Loaders use it to resolve sibling files (external glTF buffers, ...).
    fn path(&self) -> Option<&Path> {
        None
    }
}

/// A source backed by a file on disk.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    /// Creates a source for `path`. The file is not opened.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ByteSource for FileSource {
    fn load(&self) -> io::Result<Vec<u8>> {
        fs::read(&self.path)
    }

    fn write(&self, bytes: &[u8]) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, bytes)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn path(&self) -> Option<&Path> {
        Some(&self.path)
    }
}

/// A read-only source over bytes already in memory.
#[derive(Clone)]
pub struct MemorySource {
    label: String,
    bytes: Arc<[u8]>,
}

impl MemorySource {
    /// Wraps `bytes`, labelled for logs.
    pub fn new(label: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            label: label.into(),
            bytes: bytes.into(),
        }
    }

    /// An empty source, used for procedurally allocated resources.
    pub fn empty(label: impl Into<String>) -> Self {
        Self::new(label, Vec::new())
    }

    /// Borrows the bytes without copying.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl fmt::Debug for MemorySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemorySource")
            .field("label", &self.label)
            .field("len", &self.bytes.len())
            .finish()
    }
}

impl ByteSource for MemorySource {
    fn load(&self) -> io::Result<Vec<u8>> {
        Ok(self.bytes.to_vec())
    }

    fn write(&self, _bytes: &[u8]) -> io::Result<()> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            format!("memory source '{}' is read-only", self.label),
        ))
    }

    fn describe(&self) -> String {
        format!("memory:{}", self.label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_source_reads_lazily_and_writes_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("data.bin");
        let source = FileSource::new(&path);

        assert!(source.load().is_err());
        source.write(b"abc").unwrap();
        assert_eq!(source.load().unwrap(), b"abc");
        assert_eq!(source.path(), Some(path.as_path()));
    }

    #[test]
    fn memory_source_is_read_only() {
        let source = MemorySource::new("child", vec![1u8, 2, 3]);
        assert_eq!(source.load().unwrap(), vec![1, 2, 3]);
        let err = source.write(b"x").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::Unsupported);
        assert_eq!(source.describe(), "memory:child");
        assert!(source.path().is_none());
    }
}
