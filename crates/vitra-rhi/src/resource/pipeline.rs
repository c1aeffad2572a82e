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

//! Fixed-function state descriptors and the pipeline state object.
//!
//! Defaults of every state struct match the native context defaults, so a
//! fresh [`crate::state::StateCache`] is truthful without any driver call.

use super::{RenderPassId, ShaderId};
use crate::math::LinearRgba;
use crate::vitra_bitflags;

/// The face culling mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CullMode {
    /// No culling.
    #[default]
    None,
    /// Cull front-facing primitives.
    Front,
    /// Cull back-facing primitives.
    Back,
}

/// The vertex winding order that determines the "front" face of a triangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FrontFace {
    /// Counter-clockwise winding.
    #[default]
    Ccw,
    /// Clockwise winding.
    Cw,
}

/// A comparison function for depth and stencil tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CompareFunction {
    /// The test never passes.
    Never,
    /// Passes if the incoming value is less than the stored value.
    #[default]
    Less,
    /// Passes if the incoming value equals the stored value.
    Equal,
    /// Passes if the incoming value is less than or equal to the stored value.
    LessEqual,
    /// Passes if the incoming value is greater than the stored value.
    Greater,
    /// Passes if the incoming value differs from the stored value.
    NotEqual,
    /// Passes if the incoming value is greater than or equal to the stored value.
    GreaterEqual,
    /// The test always passes.
    Always,
}

/// An operation applied to a stencil value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StencilOperation {
    /// Keep the current value.
    #[default]
    Keep,
    /// Set the value to zero.
    Zero,
    /// Replace the value with the reference.
    Replace,
    /// Increment the value, clamping at the maximum.
    IncrementClamp,
    /// Decrement the value, clamping at zero.
    DecrementClamp,
    /// Bitwise-invert the value.
    Invert,
    /// Increment the value, wrapping on overflow.
    IncrementWrap,
    /// Decrement the value, wrapping on underflow.
    DecrementWrap,
}

/// Selects a primitive face for separate stencil state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StencilFace {
    /// Front-facing primitives.
    Front,
    /// Back-facing primitives.
    Back,
}

/// A source or destination blend factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BlendFactor {
    /// `0`.
    Zero,
    /// `1`.
    One,
    /// Source color.
    Src,
    /// `1 - source color`.
    OneMinusSrc,
    /// Source alpha.
    SrcAlpha,
    /// `1 - source alpha`.
    OneMinusSrcAlpha,
    /// Destination color.
    Dst,
    /// `1 - destination color`.
    OneMinusDst,
    /// Destination alpha.
    DstAlpha,
    /// `1 - destination alpha`.
    OneMinusDstAlpha,
    /// The constant blend color.
    Constant,
    /// `1 - constant blend color`.
    OneMinusConstant,
    /// `min(source alpha, 1 - destination alpha)`, for RGB only.
    SrcAlphaSaturated,
}

/// The operation combining source and destination blend terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BlendOperation {
    /// `src + dst`.
    #[default]
    Add,
    /// `src - dst`.
    Subtract,
    /// `dst - src`.
    ReverseSubtract,
    /// `min(src, dst)`.
    Min,
    /// `max(src, dst)`.
    Max,
}

/// The topology of the primitives fed to a draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PrimitiveTopology {
    /// Each vertex is a point.
    PointList,
    /// Every two vertices form a line.
    LineList,
    /// Consecutive vertices form a connected line.
    LineStrip,
    /// Every three vertices form a triangle.
    #[default]
    TriangleList,
    /// Consecutive vertices form connected triangles.
    TriangleStrip,
}

vitra_bitflags! {
    /// A bitmask to enable or disable writes to individual color channels.
    pub struct ColorWrites: u8 {
        /// Enable writes to the Red channel.
        const R = 0b0001;
        /// Enable writes to the Green channel.
        const G = 0b0010;
        /// Enable writes to the Blue channel.
        const B = 0b0100;
        /// Enable writes to the Alpha channel.
        const A = 0b1000;
        /// Enable writes to all channels.
        const ALL = Self::R.bits() | Self::G.bits() | Self::B.bits() | Self::A.bits();
    }
}

/// Rasterizer fixed-function state.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RasterizerState {
    /// The face culling mode.
    pub cull_mode: CullMode,
    /// The front-face winding order.
    pub front_face: FrontFace,
    /// A constant value added to the depth of each fragment.
    pub depth_bias: f32,
    /// A factor scaling with the fragment's depth slope.
    pub depth_bias_slope: f32,
    /// Rasterized line width in pixels.
    pub line_width: f32,
}

impl Default for RasterizerState {
    fn default() -> Self {
        Self {
            cull_mode: CullMode::None,
            front_face: FrontFace::Ccw,
            depth_bias: 0.0,
            depth_bias_slope: 0.0,
            line_width: 1.0,
        }
    }
}

/// Stencil state for one primitive face.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StencilSideState {
    /// The comparison function for the stencil test.
    pub compare: CompareFunction,
    /// The reference value compared against the stored stencil value.
    pub reference: u32,
    /// A bitmask applied to both sides of the comparison.
    pub read_mask: u32,
    /// The operation when the stencil test fails.
    pub fail_op: StencilOperation,
    /// The operation when the stencil test passes but the depth test fails.
    pub depth_fail_op: StencilOperation,
    /// The operation when both tests pass.
    pub pass_op: StencilOperation,
    /// A bitmask restricting writes to the stencil buffer.
    pub write_mask: u32,
}

impl Default for StencilSideState {
    fn default() -> Self {
        Self {
            compare: CompareFunction::Always,
            reference: 0,
            read_mask: 0xffff_ffff,
            fail_op: StencilOperation::Keep,
            depth_fail_op: StencilOperation::Keep,
            pass_op: StencilOperation::Keep,
            write_mask: 0xffff_ffff,
        }
    }
}

/// Depth and stencil fixed-function state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DepthStencilState {
    /// Enables the depth test.
    pub depth_test: bool,
    /// Enables writes to the depth buffer.
    pub depth_write: bool,
    /// The depth comparison function.
    pub depth_compare: CompareFunction,
    /// Enables the stencil test.
    pub stencil_test: bool,
    /// Stencil state for front-facing primitives.
    pub front: StencilSideState,
    /// Stencil state for back-facing primitives.
    pub back: StencilSideState,
}

impl Default for DepthStencilState {
    fn default() -> Self {
        Self {
            depth_test: false,
            depth_write: true,
            depth_compare: CompareFunction::Less,
            stencil_test: false,
            front: StencilSideState::default(),
            back: StencilSideState::default(),
        }
    }
}

/// Blend state for a single color target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BlendTargetState {
    /// Enables blending for this target.
    pub blend_enabled: bool,
    /// The blend operation for the RGB components.
    pub color_op: BlendOperation,
    /// The source factor for the RGB components.
    pub src_color_factor: BlendFactor,
    /// The destination factor for the RGB components.
    pub dst_color_factor: BlendFactor,
    /// The blend operation for the alpha component.
    pub alpha_op: BlendOperation,
    /// The source factor for the alpha component.
    pub src_alpha_factor: BlendFactor,
    /// The destination factor for the alpha component.
    pub dst_alpha_factor: BlendFactor,
    /// A bitmask controlling which color channels are written.
    pub write_mask: ColorWrites,
}

impl Default for BlendTargetState {
    fn default() -> Self {
        Self {
            blend_enabled: false,
            color_op: BlendOperation::Add,
            src_color_factor: BlendFactor::One,
            dst_color_factor: BlendFactor::Zero,
            alpha_op: BlendOperation::Add,
            src_alpha_factor: BlendFactor::One,
            dst_alpha_factor: BlendFactor::Zero,
            write_mask: ColorWrites::ALL,
        }
    }
}

/// Blend fixed-function state.
///
/// This backend tier drives a single draw buffer; the executor applies
/// `targets[0]` and warns once about extra entries.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BlendState {
    /// Enables alpha-to-coverage.
    pub alpha_to_coverage: bool,
    /// The constant blend color referenced by [`BlendFactor::Constant`].
    pub blend_color: LinearRgba,
    /// Per-target blend state.
    pub targets: Vec<BlendTargetState>,
}

impl Default for BlendState {
    fn default() -> Self {
        Self {
            alpha_to_coverage: false,
            blend_color: LinearRgba::TRANSPARENT,
            targets: vec![BlendTargetState::default()],
        }
    }
}

/// A descriptor used to create a [`PipelineState`].
#[derive(Debug, Clone)]
pub struct PipelineStateDescriptor {
    /// The shader program used by this pipeline.
    pub shader: ShaderId,
    /// Rasterizer state.
    pub rasterizer: RasterizerState,
    /// Depth and stencil state.
    pub depth_stencil: DepthStencilState,
    /// Blend state.
    pub blend: BlendState,
    /// The primitive topology of draws issued under this pipeline.
    pub topology: PrimitiveTopology,
    /// The render pass this pipeline is compatible with.
    pub render_pass: RenderPassId,
}

/// An immutable snapshot of shader + fixed-function state for one draw style.
#[derive(Debug)]
pub struct PipelineState {
    /// The shader program used by this pipeline.
    pub shader: ShaderId,
    /// Rasterizer state.
    pub rasterizer: RasterizerState,
    /// Depth and stencil state.
    pub depth_stencil: DepthStencilState,
    /// Blend state.
    pub blend: BlendState,
    /// The primitive topology of draws issued under this pipeline.
    pub topology: PrimitiveTopology,
    /// The render pass this pipeline is compatible with.
    pub render_pass: RenderPassId,
}

impl PipelineState {
    /// Builds a pipeline state from a descriptor.
    pub fn new(descriptor: &PipelineStateDescriptor) -> Self {
        Self {
            shader: descriptor.shader,
            rasterizer: descriptor.rasterizer,
            depth_stencil: descriptor.depth_stencil,
            blend: descriptor.blend.clone(),
            topology: descriptor.topology,
            render_pass: descriptor.render_pass,
        }
    }
}
