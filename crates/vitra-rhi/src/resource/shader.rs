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

//! Shader resources: stage descriptors, the uniform type vocabulary, and the
//! reflected program layout built during realization.

use crate::driver::NativeProgram;

/// The programmable stage a shader source targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ShaderStageKind {
    /// The vertex shader stage.
    Vertex,
    /// The fragment shader stage.
    Fragment,
}

/// The type of a shader uniform or vertex input, as reported by reflection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum UniformType {
    /// A 32-bit signed integer.
    Int,
    /// A 2-component integer vector.
    IVec2,
    /// A 3-component integer vector.
    IVec3,
    /// A 4-component integer vector.
    IVec4,
    /// A 32-bit float.
    Float,
    /// A 2-component float vector.
    Vec2,
    /// A 3-component float vector.
    Vec3,
    /// A 4-component float vector.
    Vec4,
    /// A 2x2 float matrix.
    Mat2,
    /// A 3x3 float matrix.
    Mat3,
    /// A 4x4 float matrix.
    Mat4,
    /// A 2D texture sampler.
    Sampler2D,
    /// A cubemap texture sampler.
    SamplerCube,
}

impl UniformType {
    /// Number of 4-byte scalar components.
    pub const fn components(self) -> u32 {
        match self {
            UniformType::Int | UniformType::Float | UniformType::Sampler2D | UniformType::SamplerCube => 1,
            UniformType::IVec2 | UniformType::Vec2 => 2,
            UniformType::IVec3 | UniformType::Vec3 => 3,
            UniformType::IVec4 | UniformType::Vec4 => 4,
            UniformType::Mat2 => 4,
            UniformType::Mat3 => 9,
            UniformType::Mat4 => 16,
        }
    }

    /// Byte size of one element of this type.
    pub const fn byte_size(self) -> u32 {
        self.components() * 4
    }

    /// Number of vertex attribute locations one element occupies. Matrices
    /// span one location per column.
    pub const fn locations(self) -> u32 {
        match self {
            UniformType::Mat2 => 2,
            UniformType::Mat3 => 3,
            UniformType::Mat4 => 4,
            _ => 1,
        }
    }

    /// Number of scalar components per occupied location.
    pub const fn components_per_location(self) -> u32 {
        match self {
            UniformType::Mat2 => 2,
            UniformType::Mat3 => 3,
            UniformType::Mat4 => 4,
            other => other.components(),
        }
    }

    /// `true` for sampler types.
    pub const fn is_sampler(self) -> bool {
        matches!(self, UniformType::Sampler2D | UniformType::SamplerCube)
    }

    /// `true` for the integer scalar family.
    pub const fn is_integer(self) -> bool {
        matches!(
            self,
            UniformType::Int | UniformType::IVec2 | UniformType::IVec3 | UniformType::IVec4
        )
    }
}

/// One stage program of a shader.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ShaderStageDescriptor {
    /// The stage this source targets.
    pub stage: ShaderStageKind,
    /// The stage source text.
    pub source: String,
    /// Macro names prepended to the source as `#define` lines.
    pub macros: Vec<String>,
}

/// Declares a uniform block and the names of the uniforms it owns. Reflected
/// uniforms are matched into the block that declares their name.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UniformBlockDeclaration {
    /// The binding slot the block is addressed by in a binding set layout.
    pub binding: u32,
    /// The block name.
    pub name: String,
    /// Names of the uniforms belonging to this block.
    pub members: Vec<String>,
}

/// A descriptor used to create a [`Shader`].
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ShaderDescriptor {
    /// A descriptive name, used in diagnostics.
    pub name: String,
    /// The stage programs to compile and link.
    pub stages: Vec<ShaderStageDescriptor>,
    /// Uniform block declarations for the commit path.
    pub blocks: Vec<UniformBlockDeclaration>,
}

/// A reflected vertex input of a linked program.
#[derive(Debug, Clone)]
pub struct ShaderInput {
    /// The input name, matched against input-assembler attribute names.
    pub name: String,
    /// The input type.
    pub ty: UniformType,
    /// The native attribute location.
    pub location: u32,
    /// Byte size of one element of the input.
    pub size: u32,
}

/// One byte-offset-packed uniform inside a [`UniformBlock`].
#[derive(Debug, Clone)]
pub struct UniformEntry {
    /// The uniform name.
    pub name: String,
    /// The uniform type.
    pub ty: UniformType,
    /// Array element count (1 for non-arrays).
    pub count: u32,
    /// The native uniform location.
    pub location: i32,
    /// Byte offset within the block.
    pub offset: u32,
}

/// A uniform block with its backing storage.
///
/// Storage is kept as `f32` words so typed views for the commit path are
/// always aligned; every uniform type is a multiple of 4 bytes.
#[derive(Debug)]
pub struct UniformBlock {
    /// The binding slot of the block.
    pub binding: u32,
    /// The block name.
    pub name: String,
    /// Byte-offset-packed uniform entries.
    pub entries: Vec<UniformEntry>,
    /// Total byte size of the block.
    pub size: u32,
    /// Backing storage, one word per 4 bytes of block size.
    pub storage: Vec<f32>,
    /// Whether the block has been committed at least once; the first commit
    /// pushes every entry regardless of the stored bytes.
    pub committed: bool,
}

/// A reflected sampler with its assigned texture unit.
#[derive(Debug, Clone)]
pub struct ShaderSampler {
    /// The sampler name.
    pub name: String,
    /// The sampler type.
    pub ty: UniformType,
    /// The native uniform location.
    pub location: i32,
    /// The texture unit the sampler was assigned (sequential at reflection).
    pub unit: u32,
}

/// A shader: stage descriptors plus, post-link, the reflected program layout.
#[derive(Debug)]
pub struct Shader {
    /// A descriptive name, used in diagnostics.
    pub name: String,
    /// The stage programs.
    pub stages: Vec<ShaderStageDescriptor>,
    /// Uniform block declarations.
    pub blocks_decl: Vec<UniformBlockDeclaration>,
    /// The linked native program. `None` means compilation or linking failed
    /// and the shader is unusable; submitting draws against it is a caller
    /// defect.
    pub program: Option<NativeProgram>,
    /// Reflected vertex inputs.
    pub inputs: Vec<ShaderInput>,
    /// Reflected uniform blocks with backing storage.
    pub blocks: Vec<UniformBlock>,
    /// Reflected samplers with assigned texture units.
    pub samplers: Vec<ShaderSampler>,
}

impl Shader {
    /// Builds an unrealized shader from a descriptor.
    pub fn new(descriptor: &ShaderDescriptor) -> Self {
        Self {
            name: descriptor.name.clone(),
            stages: descriptor.stages.clone(),
            blocks_decl: descriptor.blocks.clone(),
            program: None,
            inputs: Vec::new(),
            blocks: Vec::new(),
            samplers: Vec::new(),
        }
    }
}
