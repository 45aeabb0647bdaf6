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

//! Several databases mounted side by side under one id namespace.

use aster_core::{
    resource::{ResourceId, SourceMetadata},
    ByteSource, DatabaseError, ResourceDatabase,
};
use std::{collections::BTreeMap, fmt, io, sync::Arc};

/// Routes every request to the database named by the first segment of the
/// resource id: `engine/textures/white.png` goes to the database registered
/// as `engine`. The id is forwarded unchanged, so the mounted databases must
/// derive prefixed ids themselves (see `ResourceConfig::mount_ids`).
#[derive(Default)]
pub struct ResourceDatabaseFacade {
    databases: BTreeMap<String, Arc<dyn ResourceDatabase>>,
}

impl ResourceDatabaseFacade {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mounts `database` under `name`, returning the database it replaced.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        database: Arc<dyn ResourceDatabase>,
    ) -> Option<Arc<dyn ResourceDatabase>> {
        let name = name.into();
        let previous = self.databases.insert(name.clone(), database);
        if previous.is_some() {
            log::warn!("Database '{}' was already mounted, replacing it", name);
        } else {
            log::debug!("Mounted database '{}'", name);
        }
        previous
    }

    /// The database mounted under `name`.
    pub fn database(&self, name: &str) -> Option<&Arc<dyn ResourceDatabase>> {
        self.databases.get(name)
    }

    /// Mounted names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.databases.keys().map(String::as_str)
    }

    fn route(&self, id: &ResourceId) -> Option<&Arc<dyn ResourceDatabase>> {
        id.database_prefix().and_then(|prefix| self.databases.get(prefix))
    }
}

impl ResourceDatabase for ResourceDatabaseFacade {
    fn find(&self, id: &ResourceId) -> Result<SourceMetadata, DatabaseError> {
        self.route(id)
            .ok_or(DatabaseError::DATABASE_MISSING)?
            .find(id)
    }

    fn add(&self, id: ResourceId, metadata: SourceMetadata) -> Result<(), DatabaseError> {
        match self.route(&id) {
            Some(database) => database.add(id, metadata),
            None => {
                log::error!("No database mounted for '{}'", id);
                Err(DatabaseError::DATABASE_MISSING)
            }
        }
    }

    fn remove(&self, id: &ResourceId) -> Result<(), DatabaseError> {
        match self.route(id) {
            Some(database) => database.remove(id),
            None => {
                log::error!("No database mounted for '{}'", id);
                Err(DatabaseError::DATABASE_MISSING)
            }
        }
    }

    fn create_source(&self, id: &ResourceId, metadata: &SourceMetadata) -> Arc<dyn ByteSource> {
        match self.route(id) {
            Some(database) => database.create_source(id, metadata),
            None => {
                log::error!("No database mounted for '{}'", id);
                Arc::new(UnroutedSource { id: id.clone() })
            }
        }
    }

    /// The union of what every mounted database reports.
    fn validate(&self) -> DatabaseError {
        self.databases
            .values()
            .fold(DatabaseError::SUCCESS, |errors, database| {
                errors | database.validate()
            })
    }
}

/// Stands in for the source of an id no database claims. Every access fails.
struct UnroutedSource {
    id: ResourceId,
}

impl UnroutedSource {
    fn error(&self) -> io::Error {
        io::Error::new(
            io::ErrorKind::NotFound,
            format!("no database mounted for '{}'", self.id),
        )
    }
}

impl fmt::Debug for UnroutedSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnroutedSource").field("id", &self.id).finish()
    }
}

impl ByteSource for UnroutedSource {
    fn load(&self) -> io::Result<Vec<u8>> {
        Err(self.error())
    }

    fn write(&self, _bytes: &[u8]) -> io::Result<()> {
        Err(self.error())
    }

    fn describe(&self) -> String {
        format!("unrouted:{}", self.id)
    }
}
