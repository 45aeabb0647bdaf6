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

use aster_core::resource::{ResourceType, TypedResource};

/// A font face and the code point ranges to rasterize from it.
///
/// Rasterization happens later, on the text rendering side; the loader only
/// keeps the validated font file.
#[derive(Debug, Clone, PartialEq)]
pub struct Font {
    /// Face name, taken from the file name.
    pub name: String,
    /// Raw TrueType/OpenType data.
    pub data: Vec<u8>,
    /// Inclusive code point ranges.
    pub glyph_ranges: Vec<(u32, u32)>,
}

impl Font {
    /// Returns `true` if `c` falls inside one of the glyph ranges.
    pub fn covers(&self, c: char) -> bool {
        let code = c as u32;
        self.glyph_ranges
            .iter()
            .any(|&(first, last)| (first..=last).contains(&code))
    }
}

impl TypedResource for Font {
    const TYPE: ResourceType = ResourceType::Font;
}
