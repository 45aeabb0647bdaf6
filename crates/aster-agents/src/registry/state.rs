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

use aster_core::{jobs::JobHandle, resource::ResourceId};
use aster_lanes::ResourceData;
use std::collections::{HashMap, HashSet};

/// A load that has been accepted but has not finished.
#[derive(Default)]
pub(super) struct PendingLoad {
    /// Set once the dispatch returned.
    pub handle: Option<JobHandle>,
    /// Set by the job that claimed the load.
    pub running: bool,
}

/// The three id sets of the registry. An id is in at most one of them, and
/// only ever moves from `pending` to `resources` or `errored`.
#[derive(Default)]
pub(super) struct RegistryState {
    pub resources: HashMap<ResourceId, ResourceData>,
    pub pending: HashMap<ResourceId, PendingLoad>,
    pub errored: HashSet<ResourceId>,
}

impl RegistryState {
    pub fn is_tracked(&self, id: &ResourceId) -> bool {
        self.resources.contains_key(id) || self.pending.contains_key(id) || self.errored.contains(id)
    }

    pub fn is_settled(&self, id: &ResourceId) -> bool {
        self.resources.contains_key(id) || self.errored.contains(id)
    }
}

/// Outcome of asking for a load.
pub(super) enum Enqueued {
    /// Already loaded or errored.
    Settled,
    /// Another caller's load is in flight. The handle is `None` while that
    /// caller is still between dispatching and recording it.
    InFlight(Option<JobHandle>),
    /// This call dispatched the load.
    Dispatched(JobHandle),
}

/// A snapshot of the registry's bookkeeping.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegistryStats {
    pub loaded: usize,
    pub pending: usize,
    pub errored: usize,
    /// Loaded resources flagged for save-back.
    pub dirty: usize,
    /// Live reference handles, across all ids.
    pub references: usize,
}
