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

//! The GPU object model.
//!
//! Every resource kind is a flat, behavior-free record: descriptive fields
//! populated at creation, native handles populated by realization. There is no
//! virtual dispatch; exhaustive matches in the executor are the only
//! polymorphism over the closed kind set, and the [`ResourceKind`] tag names a
//! kind where one must travel through an error.

pub mod binding;
pub mod buffer;
pub mod input_assembler;
pub mod pass;
pub mod pipeline;
pub mod shader;
pub mod texture;

pub use binding::{BindingResource, BindingSetLayout, BindingSetLayoutDescriptor, BindingUnit};
pub use buffer::{Buffer, BufferDescriptor, BufferUsage, MemoryUsage};
pub use input_assembler::{
    InputAssembler, InputAssemblerDescriptor, ResolvedAttribute, VertexAttribute,
};
pub use pass::{
    ColorAttachmentDescriptor, DepthStencilAttachmentDescriptor, Framebuffer,
    FramebufferDescriptor, LoadOp, RenderPass, RenderPassDescriptor, StoreOp,
};
pub use pipeline::{
    BlendFactor, BlendOperation, BlendState, BlendTargetState, ColorWrites, CompareFunction,
    CullMode, DepthStencilState, FrontFace, PipelineState, PipelineStateDescriptor,
    PrimitiveTopology, RasterizerState, StencilFace, StencilOperation, StencilSideState,
};
pub use shader::{
    Shader, ShaderDescriptor, ShaderInput, ShaderSampler, ShaderStageDescriptor, ShaderStageKind,
    UniformBlock, UniformBlockDeclaration, UniformEntry, UniformType,
};
pub use texture::{
    Sampler, SamplerDescriptor, Texture, TextureDescriptor, TextureFilter, TextureFlags,
    TextureType, TextureUsage, TextureView, TextureViewDescriptor, TextureWrap,
};

/// The closed set of GPU resource kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    /// A GPU data buffer.
    Buffer,
    /// A texture image.
    Texture,
    /// A view into a texture's mip range.
    TextureView,
    /// A render pass attachment contract.
    RenderPass,
    /// A framebuffer binding render pass attachments to texture views.
    Framebuffer,
    /// A sampler state object.
    Sampler,
    /// A linked shader program.
    Shader,
    /// A bundled pipeline state snapshot.
    PipelineState,
    /// A declared list of resource-binding slots.
    BindingSetLayout,
    /// A vertex/index buffer feeding configuration.
    InputAssembler,
}

macro_rules! resource_id {
    ($(#[$attr:meta])* $name:ident) => {
        $(#[$attr])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        pub struct $name(pub usize);
    };
}

resource_id!(
    /// An opaque handle to a GPU buffer resource.
    BufferId
);
resource_id!(
    /// An opaque handle to a texture resource.
    TextureId
);
resource_id!(
    /// An opaque handle to a texture view.
    TextureViewId
);
resource_id!(
    /// An opaque handle to a render pass.
    RenderPassId
);
resource_id!(
    /// An opaque handle to a framebuffer.
    FramebufferId
);
resource_id!(
    /// An opaque handle to a sampler.
    SamplerId
);
resource_id!(
    /// An opaque handle to a shader program.
    ShaderId
);
resource_id!(
    /// An opaque handle to a pipeline state object.
    PipelineStateId
);
resource_id!(
    /// An opaque handle to a binding set layout.
    BindingSetLayoutId
);
resource_id!(
    /// An opaque handle to an input assembler.
    InputAssemblerId
);
