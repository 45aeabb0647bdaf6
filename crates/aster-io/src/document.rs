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

//! Reading and writing the JSON documents a database root is made of.

use aster_core::resource::{DatabaseMetadata, SidecarDocument};
use serde::{de::DeserializeOwned, Serialize};
use std::{
    ffi::OsString,
    fs, io,
    path::{Path, PathBuf},
};
use thiserror::Error;

/// File name of the per-root database document.
pub const DATABASE_FILE_NAME: &str = "resources.db";

/// Extension of per-resource sidecars, without the dot.
pub const SIDECAR_EXTENSION: &str = "meta";

/// An error while reading or writing a persisted document.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// The file could not be read or written.
    #[error("I/O error on '{path}': {source}")]
    Io {
        /// The document.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: io::Error,
    },
    /// The file is not a valid document.
    #[error("malformed document '{path}': {source}")]
    Malformed {
        /// The document.
        path: PathBuf,
        /// The parse error.
        #[source]
        source: serde_json::Error,
    },
}

/// The sidecar path of a source file: `a.png` becomes `a.png.meta`.
pub fn sidecar_path(source: &Path) -> PathBuf {
    let mut path = OsString::from(source.as_os_str());
    path.push(".");
    path.push(SIDECAR_EXTENSION);
    PathBuf::from(path)
}

/// The source path a sidecar describes, or `None` if `path` is not a sidecar.
pub fn source_of_sidecar(path: &Path) -> Option<PathBuf> {
    let is_sidecar = path
        .extension()
        .is_some_and(|ext| ext == SIDECAR_EXTENSION);
    is_sidecar.then(|| path.with_extension(""))
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, DocumentError> {
    let bytes = fs::read(path).map_err(|source| DocumentError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_slice(&bytes).map_err(|source| DocumentError::Malformed {
        path: path.to_path_buf(),
        source,
    })
}

/// Writes `value` as pretty JSON. Returns `false` without touching the file
/// when it already holds exactly these contents.
fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<bool, DocumentError> {
    let text = serde_json::to_vec_pretty(value).map_err(|source| DocumentError::Malformed {
        path: path.to_path_buf(),
        source,
    })?;
    if fs::read(path).is_ok_and(|existing| existing == text) {
        return Ok(false);
    }
    fs::write(path, text).map_err(|source| DocumentError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(true)
}

/// Reads a `.meta` sidecar.
pub fn read_sidecar(path: &Path) -> Result<SidecarDocument, DocumentError> {
    read_json(path)
}

/// Writes a `.meta` sidecar. Returns whether the file changed.
pub fn write_sidecar(path: &Path, document: &SidecarDocument) -> Result<bool, DocumentError> {
    write_json(path, document)
}

/// Reads the database document.
pub fn read_database(path: &Path) -> Result<DatabaseMetadata, DocumentError> {
    read_json(path)
}

/// Writes the database document. Returns whether the file changed.
pub fn write_database(path: &Path, document: &DatabaseMetadata) -> Result<bool, DocumentError> {
    write_json(path, document)
}
