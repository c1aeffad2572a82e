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

//! Defines data structures related to GPU texture, texture view, and sampler
//! resources.

use super::TextureId;
use crate::driver::{NativeTexFormat, NativeTexture};
use crate::format::PixelFormat;
use crate::vitra_bitflags;

/// The dimensionality of a texture (and of views into it).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TextureType {
    /// A two-dimensional texture.
    D2,
    /// A cubemap texture (6 faces of a 2D texture).
    Cube,
}

vitra_bitflags! {
    /// A set of flags describing the allowed usages of a texture.
    pub struct TextureUsage: u32 {
        /// The texture can be sampled in a shader.
        const SAMPLED = 1 << 0;
        /// The texture can be a color attachment.
        const COLOR_ATTACHMENT = 1 << 1;
        /// The texture can be a depth/stencil attachment.
        const DEPTH_STENCIL_ATTACHMENT = 1 << 2;
        /// The texture can be the destination of a transfer operation.
        const TRANSFER_DST = 1 << 3;
    }
}

vitra_bitflags! {
    /// Behavior flags for a texture.
    pub struct TextureFlags: u32 {
        /// Generate the mip chain from level 0 after uploads.
        const GEN_MIPMAPS = 1 << 0;
    }
}

/// A descriptor used to create a [`Texture`].
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TextureDescriptor {
    /// The dimensionality of the texture.
    pub texture_type: TextureType,
    /// The pixel format of the texture data.
    pub format: PixelFormat,
    /// A bitmask of [`TextureUsage`] flags.
    pub usage: TextureUsage,
    /// Width of mip level 0 in texels.
    pub width: u32,
    /// Height of mip level 0 in texels.
    pub height: u32,
    /// Depth of the texture (1 for 2D and cube textures).
    pub depth: u32,
    /// The number of array layers.
    pub array_layers: u32,
    /// The number of mip levels.
    pub mip_levels: u32,
    /// Behavior flags.
    pub flags: TextureFlags,
}

/// A texture: descriptor fields plus realized native state.
#[derive(Debug)]
pub struct Texture {
    /// The dimensionality of the texture.
    pub texture_type: TextureType,
    /// The pixel format of the texture data.
    pub format: PixelFormat,
    /// Allowed usages.
    pub usage: TextureUsage,
    /// Width of mip level 0 in texels.
    pub width: u32,
    /// Height of mip level 0 in texels.
    pub height: u32,
    /// Depth of the texture.
    pub depth: u32,
    /// The number of array layers.
    pub array_layers: u32,
    /// The number of mip levels.
    pub mip_levels: u32,
    /// Behavior flags.
    pub flags: TextureFlags,
    /// The native handle, populated by realization; `None` means degraded.
    pub native: Option<NativeTexture>,
    /// The native internal-format/format/type triple derived from `format`.
    pub native_format: Option<NativeTexFormat>,
}

impl Texture {
    /// Builds an unrealized texture from a descriptor.
    pub fn new(descriptor: &TextureDescriptor) -> Self {
        Self {
            texture_type: descriptor.texture_type,
            format: descriptor.format,
            usage: descriptor.usage,
            width: descriptor.width,
            height: descriptor.height,
            depth: descriptor.depth,
            array_layers: descriptor.array_layers,
            mip_levels: descriptor.mip_levels,
            flags: descriptor.flags,
            native: None,
            native_format: None,
        }
    }
}

/// A descriptor used to create a [`TextureView`].
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TextureViewDescriptor {
    /// The texture being viewed. The view must not outlive the texture; the
    /// reference is weak and a dangling view is a caller defect.
    pub texture: TextureId,
    /// The dimensionality of the view.
    pub view_type: TextureType,
    /// Overrides the texture's format when `Some`.
    pub format: Option<PixelFormat>,
    /// The first mip level visible through the view.
    pub base_mip: u32,
    /// The number of mip levels visible through the view.
    pub level_count: u32,
}

/// A view into a texture's mip range. Views hold no native handle of their
/// own in this backend tier; attachment and binding go through the texture.
#[derive(Debug)]
pub struct TextureView {
    /// The viewed texture (weak; must not outlive it).
    pub texture: TextureId,
    /// The dimensionality of the view.
    pub view_type: TextureType,
    /// Format override.
    pub format: Option<PixelFormat>,
    /// The first mip level visible through the view.
    pub base_mip: u32,
    /// The number of mip levels visible through the view.
    pub level_count: u32,
}

impl TextureView {
    /// Builds a view from a descriptor.
    pub fn new(descriptor: &TextureViewDescriptor) -> Self {
        Self {
            texture: descriptor.texture,
            view_type: descriptor.view_type,
            format: descriptor.format,
            base_mip: descriptor.base_mip,
            level_count: descriptor.level_count,
        }
    }
}

/// Defines the filtering mode for texture sampling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TextureFilter {
    /// Point sampling. Returns the value of the nearest texel.
    Nearest,
    /// Linear interpolation of the nearest texels.
    #[default]
    Linear,
}

/// Defines how texture coordinates outside `[0, 1]` are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TextureWrap {
    /// Coordinates wrap around.
    #[default]
    Repeat,
    /// Coordinates are clamped to the edge.
    ClampToEdge,
    /// Coordinates wrap around, mirroring at each integer boundary.
    MirrorRepeat,
}

/// A descriptor used to create a [`Sampler`].
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SamplerDescriptor {
    /// Filtering for minification.
    pub min_filter: TextureFilter,
    /// Filtering for magnification.
    pub mag_filter: TextureFilter,
    /// Filtering between mip levels, `None` to sample only the base level.
    pub mip_filter: Option<TextureFilter>,
    /// Addressing along U.
    pub wrap_u: TextureWrap,
    /// Addressing along V.
    pub wrap_v: TextureWrap,
    /// Addressing along W.
    pub wrap_w: TextureWrap,
}

/// A sampler state object. Pure descriptor; this backend tier applies sampler
/// parameters at texture-bind time rather than realizing a native object.
#[derive(Debug)]
pub struct Sampler {
    /// The sampling parameters.
    pub desc: SamplerDescriptor,
}

impl Sampler {
    /// Builds a sampler from a descriptor.
    pub fn new(descriptor: &SamplerDescriptor) -> Self {
        Self { desc: descriptor.clone() }
    }
}
