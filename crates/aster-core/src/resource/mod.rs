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

//! The common language of the resource system.
//!
//! This module defines what a resource *is* from the point of view of every
//! other crate: a stable [`ResourceId`], a coarse [`ResourceType`] that selects
//! a loader, a fine-grained [`SourceFormat`], and the [`Resource`] trait that
//! every decoded in-memory object implements.
//!
//! It knows nothing about where bytes come from or how they are decoded.

mod id;
mod metadata;

pub use id::*;
pub use metadata::*;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::{any::Any, fmt, sync::Arc};

/// The coarse category of a resource. Selects the loader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ResourceType {
    /// A sampled image living on the GPU.
    Texture,
    /// A shader module, from source or precompiled.
    Shader,
    /// Vertex and index geometry.
    Mesh,
    /// Shading parameters referencing a shader and textures.
    Material,
    /// A source bundling many sub-resources, loaded by fan-out.
    Composite,
    /// A font face with the glyph ranges to rasterize.
    Font,
    /// A scene graph.
    Scene,
    /// Anything the system cannot categorize.
    Unknown,
}

impl ResourceType {
    /// All known categories, in declaration order.
    pub const ALL: [ResourceType; 8] = [
        ResourceType::Texture,
        ResourceType::Shader,
        ResourceType::Mesh,
        ResourceType::Material,
        ResourceType::Composite,
        ResourceType::Font,
        ResourceType::Scene,
        ResourceType::Unknown,
    ];

    /// The name used in logs and in generated child ids.
    pub fn name(self) -> &'static str {
        match self {
            ResourceType::Texture => "Texture",
            ResourceType::Shader => "Shader",
            ResourceType::Mesh => "Mesh",
            ResourceType::Material => "Material",
            ResourceType::Composite => "Composite",
            ResourceType::Font => "Font",
            ResourceType::Scene => "Scene",
            ResourceType::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The fine-grained encoding of a resource's bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SourceFormat {
    /// PNG, JPEG, HDR and the other formats the image codec understands.
    Image,
    /// Wavefront OBJ geometry.
    Obj,
    /// Shader source text.
    Shader,
    /// SPIR-V words.
    PrecompiledShader,
    /// A JSON material description.
    Material,
    /// A glTF container, text or binary.
    Gltf,
    /// A TrueType or OpenType font file.
    FontFile,
    /// A JSON scene graph.
    Scene,
    /// An encoded payload produced in memory, usually by a composite loader.
    Memory,
    /// Unrecognized encoding.
    Unknown,
}

/// The lifecycle of one reference's view of a resource.
///
/// `Unknown` is only the pre-query default of a handle. Once the registry
/// reports `Loaded` or `Error` for an id, that state never changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ResourceState {
    /// Not queried yet.
    #[default]
    Unknown,
    /// A load is in flight.
    Pending,
    /// The decoded object is available.
    Loaded,
    /// The load failed; the failure was logged.
    Error,
    /// The id is bound but the registry does not know it.
    Missing,
    /// The handle is not bound to any id.
    Null,
}

impl ResourceState {
    /// `Loaded` and `Error` never change once reached.
    pub fn is_terminal(self) -> bool {
        matches!(self, ResourceState::Loaded | ResourceState::Error)
    }
}

bitflags! {
    /// Tracks whether in-memory state has diverged from its persisted source.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct DirtyFlags: u8 {
        /// The decoded object was modified and needs a save.
        const DATA_CHANGED = 1 << 0;
    }
}

impl DirtyFlags {
    /// No pending changes.
    pub const CLEAN: DirtyFlags = DirtyFlags::empty();
}

/// Object-safe access to `Any` for every resource.
///
/// Implemented for all eligible types; never implement it by hand.
pub trait AsAnyResource: Any + Send + Sync {
    /// Borrows the object as `Any`.
    fn as_any(&self) -> &dyn Any;
    /// Converts the shared object into a shared `Any` for down-casting.
    fn into_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

impl<T: Any + Send + Sync> AsAnyResource for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

/// A decoded, typed, in-memory resource.
///
/// The type tag returned by [`Resource::resource_type`] is checked before any
/// down-cast, so a mismatch is reported as a wrong category instead of a
/// silent failure.
pub trait Resource: AsAnyResource {
    /// The category tag stored alongside the object.
    fn resource_type(&self) -> ResourceType;
}

/// A concrete resource kind with a statically known category.
///
/// # Examples
///
/// ```
/// use aster_core::resource::{ResourceType, TypedResource};
///
/// struct Heightmap {
///     samples: Vec<f32>,
/// }
///
/// impl TypedResource for Heightmap {
///     const TYPE: ResourceType = ResourceType::Texture;
/// }
/// ```
pub trait TypedResource: Any + Send + Sync {
    /// The category every instance of this type reports.
    const TYPE: ResourceType;
}

impl<T: TypedResource> Resource for T {
    fn resource_type(&self) -> ResourceType {
        T::TYPE
    }
}

/// Down-casts a shared polymorphic resource to a concrete kind.
///
/// Returns `None` if the type tag does not match `T::TYPE` or if the object is
/// a different concrete type within the same category.
pub fn downcast_resource<T: TypedResource>(resource: Arc<dyn Resource>) -> Option<Arc<T>> {
    if resource.resource_type() != T::TYPE {
        return None;
    }
    resource.into_any_arc().downcast::<T>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Glyphs(u32);
    impl TypedResource for Glyphs {
        const TYPE: ResourceType = ResourceType::Font;
    }

    struct Pixels;
    impl TypedResource for Pixels {
        const TYPE: ResourceType = ResourceType::Texture;
    }

    struct OtherFont;
    impl TypedResource for OtherFont {
        const TYPE: ResourceType = ResourceType::Font;
    }

    #[test]
    fn downcast_checks_tag_and_concrete_type() {
        let shared: Arc<dyn Resource> = Arc::new(Glyphs(7));
        assert_eq!(shared.resource_type(), ResourceType::Font);

        let glyphs = downcast_resource::<Glyphs>(shared.clone()).unwrap();
        assert_eq!(glyphs.0, 7);
        assert!(downcast_resource::<Pixels>(shared.clone()).is_none());
        assert!(downcast_resource::<OtherFont>(shared).is_none());
    }

    #[test]
    fn only_loaded_and_error_are_terminal() {
        assert!(ResourceState::Loaded.is_terminal());
        assert!(ResourceState::Error.is_terminal());
        assert!(!ResourceState::Pending.is_terminal());
        assert!(!ResourceState::Missing.is_terminal());
        assert_eq!(ResourceState::default(), ResourceState::Unknown);
    }
}
