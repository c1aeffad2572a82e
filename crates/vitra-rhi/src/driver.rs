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

//! The trait seam to the native graphics driver.
//!
//! [`DriverContext`] is the only surface through which the executor and the
//! realization functions touch the native API. The RHI never calls the driver
//! directly from anywhere else, and every state-changing call made through it
//! is mirrored into the [`crate::state::StateCache`] in the same step.

use crate::format::PixelFormat;
use crate::math::{LinearRgba, Rect2D};
use crate::resource::texture::SamplerDescriptor;
use crate::resource::{
    BlendFactor, BlendOperation, ColorWrites, CompareFunction, CullMode, FrontFace,
    PrimitiveTopology, ShaderStageKind, StencilFace, StencilOperation, TextureType, UniformType,
};

macro_rules! native_handle {
    ($(#[$attr:meta])* $name:ident) => {
        $(#[$attr])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub struct $name(pub u64);
    };
}

native_handle!(
    /// An opaque native buffer handle.
    NativeBuffer
);
native_handle!(
    /// An opaque native texture handle.
    NativeTexture
);
native_handle!(
    /// An opaque native framebuffer handle.
    NativeFramebuffer
);
native_handle!(
    /// An opaque native shader stage object.
    NativeStage
);
native_handle!(
    /// An opaque native linked program handle.
    NativeProgram
);

/// The native binding target of a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BufferTarget {
    /// The vertex (array) buffer target.
    Vertex,
    /// The index (element array) buffer target.
    Index,
}

/// The element width of an index buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexKind {
    /// 8-bit unsigned indices.
    U8,
    /// 16-bit unsigned indices.
    U16,
    /// 32-bit unsigned indices.
    U32,
}

/// The driver-specific internal-format/format/type triple a [`PixelFormat`]
/// maps to. Values are opaque to the RHI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NativeTexFormat {
    /// The native internal format.
    pub internal: u32,
    /// The native pixel data format.
    pub format: u32,
    /// The native pixel data type.
    pub ty: u32,
}

/// A vertex input reported by program reflection.
#[derive(Debug, Clone)]
pub struct ReflectedAttribute {
    /// The input name.
    pub name: String,
    /// The input type.
    pub ty: UniformType,
    /// The native attribute location.
    pub location: u32,
}

/// A uniform reported by program reflection.
#[derive(Debug, Clone)]
pub struct ReflectedUniform {
    /// The uniform name.
    pub name: String,
    /// The uniform type.
    pub ty: UniformType,
    /// Array element count (1 for non-arrays).
    pub count: u32,
    /// The native uniform location.
    pub location: i32,
}

/// Everything reflection reports about a linked program.
#[derive(Debug, Clone, Default)]
pub struct ProgramReflection {
    /// Active vertex inputs.
    pub attributes: Vec<ReflectedAttribute>,
    /// Active uniforms, samplers included.
    pub uniforms: Vec<ReflectedUniform>,
}

/// An opaque native graphics context.
///
/// Creation methods return `None` when the driver fails to allocate a handle;
/// the owning resource is then left degraded and later operations against it
/// no-op. Compile and link return their diagnostics as the error string.
///
/// The contract is single-threaded and synchronous, like everything else in
/// this crate.
pub trait DriverContext {
    // --- Buffers ---

    /// Allocates a native buffer handle.
    fn create_buffer(&mut self) -> Option<NativeBuffer>;
    /// Releases a native buffer handle.
    fn delete_buffer(&mut self, buffer: NativeBuffer);
    /// Binds a buffer (or unbinds with `None`) to a target.
    fn bind_buffer(&mut self, target: BufferTarget, buffer: Option<NativeBuffer>);
    /// Allocates storage for the buffer currently bound to `target`.
    fn allocate_buffer(&mut self, target: BufferTarget, size: u64, dynamic: bool);
    /// Uploads bytes into the buffer currently bound to `target`.
    fn upload_buffer(&mut self, target: BufferTarget, offset: u64, data: &[u8]);

    // --- Textures ---

    /// Allocates a native texture handle.
    fn create_texture(&mut self) -> Option<NativeTexture>;
    /// Releases a native texture handle.
    fn delete_texture(&mut self, texture: NativeTexture);
    /// Binds a texture (or unbinds with `None`) to a texture unit.
    fn bind_texture(&mut self, unit: u32, target: TextureType, texture: Option<NativeTexture>);
    /// Maps a pixel format to the driver's internal-format/format/type triple,
    /// or `None` when the combination is unsupported.
    fn texture_format(&self, format: PixelFormat) -> Option<NativeTexFormat>;
    /// Allocates one mip level of the texture bound to unit 0. For cube
    /// textures `face` selects the face, otherwise it is 0.
    fn allocate_texture_level(
        &mut self,
        target: TextureType,
        face: u32,
        level: u32,
        format: NativeTexFormat,
        width: u32,
        height: u32,
    );
    /// Uploads pixel data into one mip level of the texture bound to unit 0.
    fn upload_texture_level(
        &mut self,
        target: TextureType,
        face: u32,
        level: u32,
        format: NativeTexFormat,
        width: u32,
        height: u32,
        data: &[u8],
    );
    /// Uploads block-compressed data into one mip level of the texture bound
    /// to unit 0. A zero-length `data` allocates a placeholder level.
    fn upload_compressed_texture_level(
        &mut self,
        target: TextureType,
        face: u32,
        level: u32,
        format: NativeTexFormat,
        width: u32,
        height: u32,
        data: &[u8],
    );
    /// Applies sampler parameters to the texture bound at `unit`.
    fn apply_sampler(&mut self, unit: u32, target: TextureType, sampler: &SamplerDescriptor);

    // --- Framebuffers ---

    /// Allocates a native framebuffer handle.
    fn create_framebuffer(&mut self) -> Option<NativeFramebuffer>;
    /// Releases a native framebuffer handle.
    fn delete_framebuffer(&mut self, framebuffer: NativeFramebuffer);
    /// Binds a framebuffer, or the default target with `None`.
    fn bind_framebuffer(&mut self, framebuffer: Option<NativeFramebuffer>);
    /// Attaches a texture level to color attachment `index` of the bound
    /// framebuffer.
    fn attach_color(&mut self, index: u32, texture: NativeTexture, level: u32);
    /// Attaches a texture level to the depth or combined depth-stencil
    /// attachment point of the bound framebuffer.
    fn attach_depth_stencil(&mut self, with_stencil: bool, texture: NativeTexture, level: u32);

    // --- Shaders ---

    /// Compiles one stage. `Err` carries the compiler diagnostics.
    fn compile_stage(&mut self, stage: ShaderStageKind, source: &str) -> Result<NativeStage, String>;
    /// Releases a compiled stage object.
    fn delete_stage(&mut self, stage: NativeStage);
    /// Links compiled stages into a program. `Err` carries the linker
    /// diagnostics.
    fn link_program(&mut self, stages: &[NativeStage]) -> Result<NativeProgram, String>;
    /// Releases a linked program.
    fn delete_program(&mut self, program: NativeProgram);
    /// Reports the active inputs and uniforms of a linked program.
    fn reflect_program(&mut self, program: NativeProgram) -> ProgramReflection;
    /// Makes a program (or none) current.
    fn use_program(&mut self, program: Option<NativeProgram>);

    // --- Rasterizer state ---

    /// Sets the face culling mode.
    fn set_cull_mode(&mut self, mode: CullMode);
    /// Sets the front-face winding.
    fn set_front_face(&mut self, winding: FrontFace);
    /// Sets the polygon depth bias.
    fn set_depth_bias(&mut self, constant: f32, slope_scale: f32);
    /// Sets the rasterized line width.
    fn set_line_width(&mut self, width: f32);

    // --- Depth-stencil state ---

    /// Enables or disables the depth test.
    fn set_depth_test(&mut self, enabled: bool);
    /// Enables or disables depth writes.
    fn set_depth_write(&mut self, enabled: bool);
    /// Sets the depth comparison function.
    fn set_depth_compare(&mut self, compare: CompareFunction);
    /// Enables or disables the stencil test.
    fn set_stencil_test(&mut self, enabled: bool);
    /// Sets the stencil comparison for one face.
    fn set_stencil_func(
        &mut self,
        face: StencilFace,
        compare: CompareFunction,
        reference: u32,
        read_mask: u32,
    );
    /// Sets the stencil operations for one face.
    fn set_stencil_ops(
        &mut self,
        face: StencilFace,
        fail: StencilOperation,
        depth_fail: StencilOperation,
        pass: StencilOperation,
    );
    /// Sets the stencil write mask for one face.
    fn set_stencil_write_mask(&mut self, face: StencilFace, mask: u32);

    // --- Blend state ---

    /// Enables or disables alpha-to-coverage.
    fn set_alpha_to_coverage(&mut self, enabled: bool);
    /// Enables or disables blending.
    fn set_blend_enabled(&mut self, enabled: bool);
    /// Sets the constant blend color.
    fn set_blend_constant(&mut self, color: LinearRgba);
    /// Sets the color and alpha blend operations.
    fn set_blend_equation(&mut self, color: BlendOperation, alpha: BlendOperation);
    /// Sets the four blend factors.
    fn set_blend_factors(
        &mut self,
        src_color: BlendFactor,
        dst_color: BlendFactor,
        src_alpha: BlendFactor,
        dst_alpha: BlendFactor,
    );
    /// Sets the color channel write mask.
    fn set_color_write_mask(&mut self, mask: ColorWrites);

    // --- Viewport and clears ---

    /// Sets the viewport rectangle.
    fn set_viewport(&mut self, rect: Rect2D);
    /// Sets the scissor rectangle.
    fn set_scissor(&mut self, rect: Rect2D);
    /// Clears the bound render target. Each `Some` aspect is cleared.
    fn clear(&mut self, color: Option<LinearRgba>, depth: Option<f32>, stencil: Option<u32>);

    // --- Vertex attributes and draws ---

    /// Enables a vertex attribute location.
    fn enable_attribute(&mut self, location: u32);
    /// Disables a vertex attribute location.
    fn disable_attribute(&mut self, location: u32);
    /// Points a vertex attribute location into the bound vertex buffer.
    fn attribute_pointer(
        &mut self,
        location: u32,
        components: u32,
        stride: u32,
        offset: u32,
        instanced: bool,
    );
    /// Issues a non-indexed draw.
    fn draw_arrays(&mut self, topology: PrimitiveTopology, first: u32, count: u32);
    /// Issues an indexed draw reading the bound index buffer at `byte_offset`.
    fn draw_elements(
        &mut self,
        topology: PrimitiveTopology,
        kind: IndexKind,
        count: u32,
        byte_offset: u64,
    );

    // --- Uniform commit ---
    // One entry point per shape so the commit dispatch is observable and each
    // matrix size routes through its own call.

    /// Commits float scalars.
    fn set_uniform_f1(&mut self, location: i32, data: &[f32]);
    /// Commits 2-component float vectors.
    fn set_uniform_f2(&mut self, location: i32, data: &[f32]);
    /// Commits 3-component float vectors.
    fn set_uniform_f3(&mut self, location: i32, data: &[f32]);
    /// Commits 4-component float vectors.
    fn set_uniform_f4(&mut self, location: i32, data: &[f32]);
    /// Commits integer scalars.
    fn set_uniform_i1(&mut self, location: i32, data: &[i32]);
    /// Commits 2-component integer vectors.
    fn set_uniform_i2(&mut self, location: i32, data: &[i32]);
    /// Commits 3-component integer vectors.
    fn set_uniform_i3(&mut self, location: i32, data: &[i32]);
    /// Commits 4-component integer vectors.
    fn set_uniform_i4(&mut self, location: i32, data: &[i32]);
    /// Commits 2x2 float matrices.
    fn set_uniform_mat2(&mut self, location: i32, data: &[f32]);
    /// Commits 3x3 float matrices.
    fn set_uniform_mat3(&mut self, location: i32, data: &[f32]);
    /// Commits 4x4 float matrices.
    fn set_uniform_mat4(&mut self, location: i32, data: &[f32]);
}

impl IndexKind {
    /// Derives the index kind from a buffer stride, if the stride is one of
    /// the supported widths.
    pub fn from_stride(stride: u32) -> Option<Self> {
        match stride {
            1 => Some(IndexKind::U8),
            2 => Some(IndexKind::U16),
            4 => Some(IndexKind::U32),
            _ => None,
        }
    }
}
