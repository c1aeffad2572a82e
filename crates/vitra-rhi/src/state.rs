// Copyright 2025 vitra
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

//! The mirrored driver state cache.
//!
//! One instance per device. The cache must equal the driver's actual state
//! after every executor step; divergence is a silent rendering-correctness
//! bug, not a crash. Every code path that changes driver state updates the
//! cache in the same step — never in a later pass.

use crate::driver::{NativeBuffer, NativeProgram, NativeTexture};
use crate::math::{LinearRgba, Rect2D};
use crate::resource::{BlendTargetState, DepthStencilState, RasterizerState};

/// Texture units tracked by the cache.
pub const MAX_TEXTURE_UNITS: usize = 16;

/// A mirror of the native driver's fixed-function and binding state.
///
/// `Default` matches the driver defaults after context creation, so a fresh
/// cache is truthful without issuing any call.
#[derive(Debug, Clone)]
pub struct StateCache {
    /// Rasterizer state group.
    pub rasterizer: RasterizerState,
    /// Depth-stencil state group.
    pub depth_stencil: DepthStencilState,
    /// Whether alpha-to-coverage is enabled.
    pub alpha_to_coverage: bool,
    /// The constant blend color.
    pub blend_constant: LinearRgba,
    /// Blend state of the single draw buffer this tier drives.
    pub blend_target: BlendTargetState,
    /// The buffer bound to the vertex (array) target.
    pub array_buffer: Option<NativeBuffer>,
    /// The buffer bound to the index (element) target.
    pub element_buffer: Option<NativeBuffer>,
    /// The current program.
    pub program: Option<NativeProgram>,
    /// The texture bound to each unit.
    pub textures: [Option<NativeTexture>; MAX_TEXTURE_UNITS],
    /// The viewport rectangle.
    pub viewport: Rect2D,
    /// The scissor rectangle.
    pub scissor: Rect2D,
    /// Bitset of enabled vertex attribute locations, diffed per draw against
    /// the previous draw's set.
    pub enabled_attributes: u64,
}

impl Default for StateCache {
    fn default() -> Self {
        Self {
            rasterizer: RasterizerState::default(),
            depth_stencil: DepthStencilState::default(),
            alpha_to_coverage: false,
            blend_constant: LinearRgba::TRANSPARENT,
            blend_target: BlendTargetState::default(),
            array_buffer: None,
            element_buffer: None,
            program: None,
            textures: [None; MAX_TEXTURE_UNITS],
            viewport: Rect2D::default(),
            scissor: Rect2D::default(),
            enabled_attributes: 0,
        }
    }
}

impl StateCache {
    /// Creates a cache mirroring a freshly created context.
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::{CompareFunction, CullMode};

    #[test]
    fn defaults_mirror_context_defaults() {
        let cache = StateCache::new();
        assert_eq!(cache.rasterizer.cull_mode, CullMode::None);
        approx::assert_relative_eq!(cache.rasterizer.line_width, 1.0);
        assert!(!cache.depth_stencil.depth_test);
        assert!(cache.depth_stencil.depth_write);
        assert_eq!(cache.depth_stencil.depth_compare, CompareFunction::Less);
        assert!(!cache.blend_target.blend_enabled);
        assert_eq!(cache.enabled_attributes, 0);
        assert!(cache.program.is_none());
    }
}
