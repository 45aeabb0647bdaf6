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

//! Composable error kinds reported by resource databases.

use bitflags::bitflags;
use std::fmt;

bitflags! {
    /// A set of database error kinds.
    ///
    /// Validation returns the union of every issue it detected; the empty set
    /// means success. Single operations such as `find` or `add` return exactly
    /// one kind.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct DatabaseError: u16 {
        /// No resource with the requested id is catalogued.
        const NOT_FOUND = 1 << 0;
        /// A resource with the requested id already exists.
        const CONFLICT = 1 << 1;
        /// The source file of a resource is absent.
        const MISSING_RESOURCE = 1 << 2;
        /// Persisted bookkeeping disagrees with the live catalogue, or a
        /// sidecar outlived its source file.
        const STALE_METADATA = 1 << 3;
        /// A source file has no sidecar.
        const MISSING_METADATA = 1 << 4;
        /// A sidecar is unreadable or inconsistent with its path.
        const CORRUPT_METADATA = 1 << 5;
        /// The database root or its document is gone.
        const DATABASE_MISSING = 1 << 6;
    }
}

impl DatabaseError {
    /// The empty set.
    pub const SUCCESS: DatabaseError = DatabaseError::empty();

    /// Returns `true` if no error kind is set.
    pub fn is_success(self) -> bool {
        self.is_empty()
    }

    /// Converts into a `Result`, mapping the empty set to `Ok`.
    pub fn into_result(self) -> Result<(), DatabaseError> {
        if self.is_success() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for DatabaseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_success() {
            return f.write_str("success");
        }
        let mut first = true;
        for (name, _) in self.iter_names() {
            if !first {
                f.write_str(" | ")?;
            }
            first = false;
            f.write_str(&name.to_lowercase().replace('_', " "))?;
        }
        Ok(())
    }
}

impl std::error::Error for DatabaseError {}
