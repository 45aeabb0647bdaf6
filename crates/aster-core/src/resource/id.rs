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

use serde::{Deserialize, Serialize};
use std::{fmt, path::Path, sync::Arc};
use uuid::Uuid;

/// Namespace used to derive stable UUIDs from textual resource ids.
const RESOURCE_NAMESPACE: Uuid = Uuid::from_u128(0x6f1d_2a4c_93b0_4e57_a0c8_51d2_7e9f_3b16);

/// The stable textual identifier of a resource.
///
/// Ids derived from the filesystem are the source path relative to the
/// database root, using forward slashes and keeping the extension
/// (`textures/a.png`). This makes the id independent of the host platform and
/// lets it be typed by hand in configuration files.
///
/// Cloning is cheap: the string is shared.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceId(Arc<str>);

impl ResourceId {
    /// Creates an id from any string-like value.
    pub fn new(id: impl AsRef<str>) -> Self {
        Self(Arc::from(id.as_ref()))
    }

    /// The null id, carried by handles never bound to a resource.
    pub fn null() -> Self {
        Self(Arc::from(""))
    }

    /// Returns `true` for the null id.
    pub fn is_null(&self) -> bool {
        self.0.is_empty()
    }

    /// Derives the id of a file from its path relative to a database root.
    ///
    /// Returns `None` when the path is not valid UTF-8.
    pub fn from_relative_path(relative: &Path) -> Option<Self> {
        let mut parts = Vec::new();
        for component in relative.components() {
            parts.push(component.as_os_str().to_str()?);
        }
        Some(Self::new(parts.join("/")))
    }

    /// The first path segment, naming the database the id belongs to when
    /// several databases are mounted together. `None` for single-segment ids.
    pub fn database_prefix(&self) -> Option<&str> {
        self.0.split_once('/').map(|(prefix, _)| prefix)
    }

    /// Derives the id of a child resource bundled inside a composite source.
    pub fn child(&self, kind: &str, index: usize, name: &str) -> Self {
        Self::new(format!("{}/{kind}{index}-{name}", self.0))
    }

    /// The textual form of this id.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// A stable (version 5) UUID derived from the textual id.
    pub fn uuid(&self) -> Uuid {
        Uuid::new_v5(&RESOURCE_NAMESPACE, self.0.as_bytes())
    }
}

impl Default for ResourceId {
    fn default() -> Self {
        Self::null()
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ResourceId({:?})", &*self.0)
    }
}

impl From<&str> for ResourceId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ResourceId {
    fn from(value: String) -> Self {
        Self(Arc::from(value))
    }
}
