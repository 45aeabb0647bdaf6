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

//! A resource database backed by a directory tree.
//!
//! Every source file under the root gets a `.meta` sidecar holding its
//! [`SourceMetadata`]; the root holds one [`DatabaseMetadata`] document. The
//! in-memory catalogue is rebuilt from the sidecars when the database opens,
//! then cross-checked against the directory and repaired.

use crate::{
    document::{
        read_database, read_sidecar, sidecar_path, source_of_sidecar, write_database,
        write_sidecar, DocumentError, DATABASE_FILE_NAME,
    },
    extensions::classify_path,
};
use aster_core::{
    resource::{
        DatabaseMetadata, FormatMetadata, ResourceId, SidecarDocument, SourceMetadata,
        METADATA_SCHEMA_VERSION,
    },
    ByteSource, DatabaseError, FileSource, MetadataEnricher, ResourceConfig, ResourceDatabase,
};
use std::{
    collections::HashMap,
    fs, io,
    path::{Path, PathBuf},
    sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard},
};
use walkdir::WalkDir;

/// What a repair pass did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MendReport {
    /// Number of files written.
    pub written: usize,
    /// Issues still present after the repair.
    pub remaining: DatabaseError,
}

struct Catalogue {
    resources: HashMap<ResourceId, SourceMetadata>,
    document: DatabaseMetadata,
    /// Changes made in this session and not yet flushed.
    dirty: bool,
    /// The document was left dirty by a previous session.
    previous_session_dirty: bool,
}

/// Files found under the root.
#[derive(Default)]
struct ScanReport {
    sources: Vec<PathBuf>,
    sidecars: Vec<PathBuf>,
}

/// The outcome of reading one sidecar.
enum SidecarState {
    Valid(SourceMetadata),
    /// The source file the sidecar describes is gone.
    Stale,
    Unreadable,
    WrongId {
        metadata: SourceMetadata,
        expected: ResourceId,
    },
    Inconsistent(SourceMetadata),
}

/// A [`ResourceDatabase`] over a directory tree.
pub struct FolderResourceDatabase {
    root: PathBuf,
    document_path: PathBuf,
    name: String,
    /// Prefix of every derived id when the database is mounted by name.
    mount: Option<String>,
    enricher: Arc<dyn MetadataEnricher>,
    catalogue: RwLock<Catalogue>,
}

impl FolderResourceDatabase {
    /// Opens (or initializes) the database rooted at `config.root`.
    ///
    /// Opening populates the catalogue from the sidecars, validates it against
    /// the directory and mends whatever drift it found. Problems are logged and
    /// reflected by [`ResourceDatabase::validate`]; opening itself never fails.
    pub fn open(config: &ResourceConfig, enricher: Arc<dyn MetadataEnricher>) -> Self {
        if !config.root.is_dir() {
            if let Err(e) = fs::create_dir_all(&config.root) {
                log::error!(
                    "Failed to create resource database directory {}: {}",
                    config.root.display(),
                    e
                );
            }
        }

        let (database, document_missing) = Self::unopened(config, enricher);
        if document_missing {
            log::info!(
                "No database document in {}, initializing '{}'",
                database.root.display(),
                database.name
            );
            if let Err(e) = write_database(&database.document_path, &database.read().document) {
                log::error!("{}", e);
            }
        }

        database.populate();
        let errors = database.validate();
        if !errors.is_success() {
            log::warn!(
                "Resource database '{}' needs repair: {}",
                database.name,
                errors
            );
            let report = database.mend(errors);
            if !report.remaining.is_success() {
                log::warn!(
                    "Resource database '{}' still reports: {}",
                    database.name,
                    report.remaining
                );
            }
        }

        log::info!(
            "Resource database '{}' loaded with {} resources",
            database.name,
            database.len()
        );
        database
    }

    /// Opens the database without touching the disk.
    ///
    /// The catalogue is populated from whatever sidecars exist, but nothing is
    /// created, upgraded or repaired. Drift stays visible through
    /// [`ResourceDatabase::validate`] until [`FolderResourceDatabase::mend`]
    /// is called.
    pub fn inspect(config: &ResourceConfig, enricher: Arc<dyn MetadataEnricher>) -> Self {
        let (database, document_missing) = Self::unopened(config, enricher);
        if document_missing {
            log::debug!("No database document in {}", database.root.display());
        }
        database.populate_with(false);
        database
    }

    /// Reads the database document and builds an empty catalogue. Returns
    /// whether the document was missing.
    fn unopened(config: &ResourceConfig, enricher: Arc<dyn MetadataEnricher>) -> (Self, bool) {
        let root = config.root.clone();
        let document_path = root.join(DATABASE_FILE_NAME);
        let mut document_missing = false;
        let (document, previous_session_dirty) = match read_database(&document_path) {
            Ok(document) => {
                let dirty = document.dirty;
                (document, dirty)
            }
            Err(DocumentError::Io { source, .. }) if source.kind() == io::ErrorKind::NotFound => {
                document_missing = true;
                (DatabaseMetadata::new(&config.database_name), false)
            }
            Err(e) => {
                log::warn!("{}", e);
                (DatabaseMetadata::new(&config.database_name), true)
            }
        };

        let database = Self {
            root,
            document_path,
            name: config.database_name.clone(),
            mount: config.mount_ids.then(|| config.database_name.clone()),
            enricher,
            catalogue: RwLock::new(Catalogue {
                resources: HashMap::new(),
                document,
                dirty: false,
                previous_session_dirty,
            }),
        };
        (database, document_missing)
    }

    /// The storage root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The database name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of catalogued resources.
    pub fn len(&self) -> usize {
        self.read().resources.len()
    }

    /// Returns `true` if nothing is catalogued.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every catalogued id, sorted.
    pub fn ids(&self) -> Vec<ResourceId> {
        let mut ids: Vec<_> = self.read().resources.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Rebuilds the in-memory catalogue from the sidecars on disk.
    ///
    /// Sidecars written with an older schema are rewritten. Unreadable or
    /// stale sidecars are logged and left out.
    pub fn populate(&self) -> usize {
        self.populate_with(true)
    }

    fn populate_with(&self, upgrade: bool) -> usize {
        let mut resources: HashMap<ResourceId, SourceMetadata> = HashMap::new();
        for sidecar in self.scan().sidecars {
            let Some(source) = source_of_sidecar(&sidecar) else {
                continue;
            };
            if !source.is_file() {
                log::warn!(
                    "Stale sidecar {} (source file is gone), keeping it",
                    sidecar.display()
                );
                continue;
            }
            let document = match read_sidecar(&sidecar) {
                Ok(document) => document,
                Err(e) => {
                    log::warn!("Skipping corrupt sidecar: {}", e);
                    continue;
                }
            };

            if document.version < METADATA_SCHEMA_VERSION && upgrade {
                log::info!(
                    "Upgrading sidecar {} from schema {} to {}",
                    sidecar.display(),
                    document.version,
                    METADATA_SCHEMA_VERSION
                );
                let upgraded = SidecarDocument::current(document.metadata.clone());
                if let Err(e) = write_sidecar(&sidecar, &upgraded) {
                    log::error!("{}", e);
                }
            } else if document.version > METADATA_SCHEMA_VERSION {
                log::warn!(
                    "Sidecar {} uses a newer schema ({}), reading it anyway",
                    sidecar.display(),
                    document.version
                );
            }

            let mut metadata = document.metadata;
            metadata.full_source_path = source;
            if let Some(previous) = resources.get(&metadata.resource_id) {
                log::warn!(
                    "Resource id '{}' is declared by both {} and {}, keeping the first",
                    metadata.resource_id,
                    previous.full_source_path.display(),
                    metadata.full_source_path.display()
                );
                continue;
            }
            resources.insert(metadata.resource_id.clone(), metadata);
        }

        let count = resources.len();
        self.write().resources = resources;
        log::debug!("Populated {} resources from {}", count, self.root.display());
        count
    }

    /// Repairs the categories present in `errors` and re-validates.
    ///
    /// Missing sidecars are regenerated from the extension table, corrupted
    /// ones are re-derived from their path and the database document is
    /// rewritten with the live count. Stale sidecars are only reported.
    /// Running it again with no new drift writes nothing.
    pub fn mend(&self, errors: DatabaseError) -> MendReport {
        let mut written = 0;

        if errors.contains(DatabaseError::DATABASE_MISSING) && !self.root.is_dir() {
            match fs::create_dir_all(&self.root) {
                Ok(()) => log::info!("Recreated database root {}", self.root.display()),
                Err(e) => log::error!(
                    "Failed to recreate database root {}: {}",
                    self.root.display(),
                    e
                ),
            }
        }
        if errors.contains(DatabaseError::CORRUPT_METADATA) {
            written += self.repair_corrupt_sidecars();
        }
        if errors.contains(DatabaseError::MISSING_METADATA) {
            written += self.write_missing_sidecars();
        }

        let touches_catalogue = DatabaseError::DATABASE_MISSING
            | DatabaseError::STALE_METADATA
            | DatabaseError::CORRUPT_METADATA
            | DatabaseError::MISSING_METADATA;
        if errors.intersects(touches_catalogue) {
            self.populate();
            match self.persist_document() {
                Ok(true) => written += 1,
                Ok(false) => {}
                Err(e) => log::error!("{}", e),
            }
        }

        MendReport {
            written,
            remaining: self.validate(),
        }
    }

    /// Persists the database document if the catalogue changed.
    pub fn flush(&self) -> Result<(), DatabaseError> {
        if !self.read().dirty {
            return Ok(());
        }
        self.persist_document().map(|_| ()).map_err(|e| {
            log::error!("{}", e);
            DatabaseError::DATABASE_MISSING
        })
    }

    fn read(&self) -> RwLockReadGuard<'_, Catalogue> {
        self.catalogue.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Catalogue> {
        self.catalogue.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn scan(&self) -> ScanReport {
        let mut report = ScanReport::default();
        if !self.root.is_dir() {
            return report;
        }
        for entry in WalkDir::new(&self.root).sort_by_file_name() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    log::warn!("Skipping unreadable entry while scanning: {}", e);
                    continue;
                }
            };
            if !entry.file_type().is_file() || entry.path() == self.document_path {
                continue;
            }
            let path = entry.into_path();
            if source_of_sidecar(&path).is_some() {
                report.sidecars.push(path);
            } else {
                report.sources.push(path);
            }
        }
        report
    }

    /// The id of `source` relative to the root, without any mount prefix.
    fn relative_id(&self, source: &Path) -> Option<ResourceId> {
        source
            .strip_prefix(&self.root)
            .ok()
            .and_then(ResourceId::from_relative_path)
    }

    fn derive_id(&self, source: &Path) -> Option<ResourceId> {
        let relative = self.relative_id(source)?;
        Some(match &self.mount {
            Some(mount) => ResourceId::new(format!("{}/{}", mount, relative)),
            None => relative,
        })
    }

    fn resolve(&self, metadata: &SourceMetadata) -> PathBuf {
        if metadata.full_source_path.as_os_str().is_empty() {
            self.root.join(&metadata.source)
        } else {
            metadata.full_source_path.clone()
        }
    }

    fn inspect_sidecar(&self, sidecar: &Path) -> SidecarState {
        let Some(source) = source_of_sidecar(sidecar) else {
            return SidecarState::Unreadable;
        };
        if !source.is_file() {
            return SidecarState::Stale;
        }
        let Ok(document) = read_sidecar(sidecar) else {
            return SidecarState::Unreadable;
        };
        let mut metadata = document.metadata;
        metadata.full_source_path = source.clone();
        match self.derive_id(&source) {
            Some(expected) if expected != metadata.resource_id => {
                SidecarState::WrongId { metadata, expected }
            }
            _ if !metadata.is_consistent() => SidecarState::Inconsistent(metadata),
            _ => SidecarState::Valid(metadata),
        }
    }

    /// Builds fresh metadata for a source file from the extension table.
    fn infer_metadata(&self, source: &Path) -> Option<SourceMetadata> {
        let (resource_type, format) = classify_path(source)?;
        let id = self.derive_id(source)?;
        let relative = self.relative_id(source)?;
        let mut metadata = SourceMetadata::new(id, resource_type, format, relative.as_str());
        metadata.full_source_path = source.to_path_buf();
        self.enrich(&mut metadata);
        Some(metadata)
    }

    fn enrich(&self, metadata: &mut SourceMetadata) {
        match fs::read(&metadata.full_source_path) {
            Ok(bytes) => self.enricher.enrich(metadata, &bytes),
            Err(e) => log::warn!(
                "Cannot inspect {} for metadata: {}",
                metadata.full_source_path.display(),
                e
            ),
        }
        if !metadata.is_consistent() {
            log::warn!(
                "Enrichment of '{}' produced {:?} metadata for a {}, resetting it",
                metadata.resource_id,
                metadata.format_specific,
                metadata.resource_type
            );
            metadata.format_specific = FormatMetadata::default_for(metadata.resource_type);
        }
    }

    fn store_sidecar(&self, metadata: &SourceMetadata) -> bool {
        let path = sidecar_path(&metadata.full_source_path);
        match write_sidecar(&path, &SidecarDocument::current(metadata.clone())) {
            Ok(changed) => changed,
            Err(e) => {
                log::error!("{}", e);
                false
            }
        }
    }

    fn repair_corrupt_sidecars(&self) -> usize {
        let mut written = 0;
        for sidecar in self.scan().sidecars {
            let repaired = match self.inspect_sidecar(&sidecar) {
                SidecarState::Valid(_) | SidecarState::Stale => continue,
                SidecarState::Unreadable => {
                    let Some(source) = source_of_sidecar(&sidecar) else {
                        continue;
                    };
                    match self.infer_metadata(&source) {
                        Some(metadata) => metadata,
                        None => {
                            log::warn!(
                                "Cannot regenerate {}: unknown source type",
                                sidecar.display()
                            );
                            continue;
                        }
                    }
                }
                SidecarState::WrongId {
                    mut metadata,
                    expected,
                } => {
                    log::info!(
                        "Re-deriving id of {}: '{}' -> '{}'",
                        sidecar.display(),
                        metadata.resource_id,
                        expected
                    );
                    if let Some(relative) = self.relative_id(&metadata.full_source_path) {
                        metadata.source = relative.as_str().to_string();
                    }
                    metadata.resource_id = expected;
                    if !metadata.is_consistent() {
                        metadata.format_specific =
                            FormatMetadata::default_for(metadata.resource_type);
                        self.enrich(&mut metadata);
                    }
                    metadata
                }
                SidecarState::Inconsistent(mut metadata) => {
                    metadata.format_specific = FormatMetadata::default_for(metadata.resource_type);
                    self.enrich(&mut metadata);
                    metadata
                }
            };
            if self.store_sidecar(&repaired) {
                log::info!("Repaired sidecar {}", sidecar.display());
                written += 1;
            }
        }
        written
    }

    fn write_missing_sidecars(&self) -> usize {
        let mut written = 0;
        for source in self.scan().sources {
            if sidecar_path(&source).is_file() || classify_path(&source).is_none() {
                continue;
            }
            let known = self
                .derive_id(&source)
                .and_then(|id| self.read().resources.get(&id).cloned());
            let Some(metadata) = known.or_else(|| self.infer_metadata(&source)) else {
                continue;
            };
            if self.store_sidecar(&metadata) {
                log::info!(
                    "Generated sidecar for '{}' ({})",
                    metadata.resource_id,
                    metadata.resource_type
                );
                written += 1;
            }
        }
        written
    }

    /// Writes the document with the live count and a clean flag.
    fn persist_document(&self) -> Result<bool, DocumentError> {
        let mut catalogue = self.write();
        let mut document = catalogue.document.clone();
        document.name = self.name.clone();
        document.resource_count = catalogue.resources.len();
        document.dirty = false;
        let changed = write_database(&self.document_path, &document)?;
        catalogue.document = document;
        catalogue.dirty = false;
        catalogue.previous_session_dirty = false;
        Ok(changed)
    }

    /// Records an unflushed change. The first change of a session persists the
    /// dirty flag so an unclean shutdown is detected on the next open.
    fn mark_dirty(&self, catalogue: &mut Catalogue) {
        if catalogue.dirty {
            return;
        }
        catalogue.dirty = true;
        let mut document = catalogue.document.clone();
        document.dirty = true;
        if let Err(e) = write_database(&self.document_path, &document) {
            log::error!("{}", e);
        }
    }
}

impl ResourceDatabase for FolderResourceDatabase {
    fn find(&self, id: &ResourceId) -> Result<SourceMetadata, DatabaseError> {
        self.read()
            .resources
            .get(id)
            .cloned()
            .ok_or(DatabaseError::NOT_FOUND)
    }

    fn add(&self, id: ResourceId, mut metadata: SourceMetadata) -> Result<(), DatabaseError> {
        if self.read().resources.contains_key(&id) {
            return Err(DatabaseError::CONFLICT);
        }
        let source = self.resolve(&metadata);
        if !source.is_file() {
            return Err(DatabaseError::MISSING_RESOURCE);
        }
        if self.derive_id(&source).as_ref() != Some(&id) {
            log::warn!(
                "Refusing to add '{}' for {}, which does not match its path",
                id,
                source.display()
            );
            return Err(DatabaseError::CONFLICT);
        }

        metadata.resource_id = id.clone();
        metadata.full_source_path = source;
        if !metadata.is_consistent() {
            metadata.format_specific = FormatMetadata::default_for(metadata.resource_type);
        }
        self.enrich(&mut metadata);

        let mut catalogue = self.write();
        if catalogue.resources.contains_key(&id) {
            return Err(DatabaseError::CONFLICT);
        }
        let path = sidecar_path(&metadata.full_source_path);
        if let Err(e) = write_sidecar(&path, &SidecarDocument::current(metadata.clone())) {
            log::error!("{}", e);
            return Err(DatabaseError::CORRUPT_METADATA);
        }
        log::debug!("Added '{}' ({})", id, metadata.resource_type);
        catalogue.resources.insert(id, metadata);
        self.mark_dirty(&mut catalogue);
        Ok(())
    }

    fn remove(&self, id: &ResourceId) -> Result<(), DatabaseError> {
        let mut catalogue = self.write();
        let metadata = catalogue
            .resources
            .remove(id)
            .ok_or(DatabaseError::MISSING_RESOURCE)?;
        let path = sidecar_path(&self.resolve(&metadata));
        match fs::remove_file(&path) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => log::error!("Failed to delete sidecar {}: {}", path.display(), e),
        }
        log::debug!("Removed '{}'", id);
        self.mark_dirty(&mut catalogue);
        Ok(())
    }

    fn create_source(&self, _id: &ResourceId, metadata: &SourceMetadata) -> Arc<dyn ByteSource> {
        Arc::new(FileSource::new(self.resolve(metadata)))
    }

    fn validate(&self) -> DatabaseError {
        let mut errors = DatabaseError::SUCCESS;
        if !self.root.is_dir() {
            return DatabaseError::DATABASE_MISSING;
        }
        if !self.document_path.is_file() {
            errors |= DatabaseError::DATABASE_MISSING;
        }

        let catalogue = self.read();
        if catalogue.previous_session_dirty {
            errors |= DatabaseError::STALE_METADATA;
        }
        if !catalogue.dirty && self.document_path.is_file() {
            match read_database(&self.document_path) {
                Ok(document)
                    if document.resource_count == catalogue.resources.len()
                        && !document.dirty => {}
                Ok(_) | Err(_) => errors |= DatabaseError::STALE_METADATA,
            }
        }

        let scan = self.scan();
        for source in &scan.sources {
            if classify_path(source).is_some() && !sidecar_path(source).is_file() {
                errors |= DatabaseError::MISSING_METADATA;
            }
        }
        for sidecar in &scan.sidecars {
            match self.inspect_sidecar(sidecar) {
                SidecarState::Valid(metadata) => {
                    if !catalogue.resources.contains_key(&metadata.resource_id) {
                        errors |= DatabaseError::STALE_METADATA;
                    }
                }
                SidecarState::Stale => errors |= DatabaseError::STALE_METADATA,
                SidecarState::Unreadable
                | SidecarState::WrongId { .. }
                | SidecarState::Inconsistent(_) => errors |= DatabaseError::CORRUPT_METADATA,
            }
        }
        for metadata in catalogue.resources.values() {
            let source = self.resolve(metadata);
            if !source.is_file() {
                errors |= DatabaseError::STALE_METADATA;
            } else if !sidecar_path(&source).is_file() {
                errors |= DatabaseError::MISSING_METADATA;
            }
        }
        errors
    }
}

impl Drop for FolderResourceDatabase {
    fn drop(&mut self) {
        if let Err(e) = self.flush() {
            log::error!("Failed to flush resource database '{}': {}", self.name, e);
        }
        let errors = self.validate();
        if !errors.is_success() {
            log::warn!(
                "Resource database '{}' left inconsistent: {}",
                self.name,
                errors
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aster_core::{
        resource::{ResourceType, SourceFormat},
        NoEnrichment,
    };

    fn open(root: &Path) -> FolderResourceDatabase {
        FolderResourceDatabase::open(&ResourceConfig::with_root(root), Arc::new(NoEnrichment))
    }

    #[test]
    fn find_is_in_memory_only() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.png"), b"png").unwrap();
        let db = open(dir.path());

        let id = ResourceId::new("a.png");
        let metadata = db.find(&id).unwrap();
        assert_eq!(metadata.resource_type, ResourceType::Texture);
        assert_eq!(metadata.full_source_path, dir.path().join("a.png"));

        // Removing the file does not affect lookup.
        fs::remove_file(dir.path().join("a.png")).unwrap();
        assert!(db.find(&id).is_ok());
        assert_eq!(db.find(&ResourceId::new("b.png")), Err(DatabaseError::NOT_FOUND));
    }

    #[test]
    fn add_rejects_conflicts_and_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.png"), b"png").unwrap();
        let db = open(dir.path());

        let existing = db.find(&ResourceId::new("a.png")).unwrap();
        assert_eq!(
            db.add(ResourceId::new("a.png"), existing),
            Err(DatabaseError::CONFLICT)
        );

        let ghost = SourceMetadata::new(
            ResourceId::new("ghost.obj"),
            ResourceType::Mesh,
            SourceFormat::Obj,
            "ghost.obj",
        );
        assert_eq!(
            db.add(ResourceId::new("ghost.obj"), ghost),
            Err(DatabaseError::MISSING_RESOURCE)
        );
    }

    #[test]
    fn add_then_remove_round_trips_the_sidecar() {
        let dir = tempfile::tempdir().unwrap();
        let db = open(dir.path());
        fs::write(dir.path().join("cube.obj"), b"v 0 0 0").unwrap();

        let id = ResourceId::new("cube.obj");
        let metadata = SourceMetadata::new(id.clone(), ResourceType::Mesh, SourceFormat::Obj, "cube.obj");
        db.add(id.clone(), metadata).unwrap();
        assert!(dir.path().join("cube.obj.meta").is_file());
        assert_eq!(db.len(), 1);

        db.remove(&id).unwrap();
        assert!(!dir.path().join("cube.obj.meta").exists());
        assert_eq!(db.remove(&id), Err(DatabaseError::MISSING_RESOURCE));
        assert!(db.is_empty());
    }

    #[test]
    fn create_source_is_lazy() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("s.slang"), b"void main() {}").unwrap();
        let db = open(dir.path());

        let id = ResourceId::new("s.slang");
        let metadata = db.find(&id).unwrap();
        let source = db.create_source(&id, &metadata);
        fs::write(dir.path().join("s.slang"), b"changed").unwrap();
        assert_eq!(source.load().unwrap(), b"changed");
    }
}
