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

//! Input assembler: the vertex/index buffer feeding configuration.

use super::{BufferId, ShaderId};
use crate::format::PixelFormat;

/// One vertex attribute of an input assembler's layout.
///
/// The pixel format doubles as the attribute data format; component count and
/// byte size come from its [`crate::format::FormatInfo`].
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VertexAttribute {
    /// The attribute name, matched against reflected shader input names.
    pub name: String,
    /// The data format of the attribute.
    pub format: PixelFormat,
    /// The vertex buffer stream this attribute reads from.
    pub stream: u32,
    /// Whether integer data is normalized when converted to float.
    pub normalized: bool,
    /// Whether the attribute advances per instance rather than per vertex.
    pub instanced: bool,
}

/// A descriptor used to create an [`InputAssembler`].
#[derive(Debug, Clone)]
pub struct InputAssemblerDescriptor {
    /// The attribute layout, in declaration order. Byte offsets accumulate
    /// per stream in this order.
    pub attributes: Vec<VertexAttribute>,
    /// Vertex buffers by stream index.
    pub vertex_buffers: Vec<BufferId>,
    /// The optional index buffer.
    pub index_buffer: Option<BufferId>,
}

/// One attribute of the resolved per-shader feed table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedAttribute {
    /// The first native attribute location.
    pub location: u32,
    /// Locations occupied (matrices span one per column).
    pub locations: u32,
    /// Scalar components per occupied location.
    pub components: u32,
    /// Byte stride of the source buffer.
    pub stride: u32,
    /// Byte offset of the attribute within one vertex.
    pub offset: u32,
    /// Byte size of one occupied location's data.
    pub row_size: u32,
    /// The source vertex buffer.
    pub buffer: BufferId,
    /// Whether the attribute advances per instance.
    pub instanced: bool,
}

/// An input assembler: attribute layout, vertex buffers by stream, optional
/// index buffer, and the feed table resolved against a shader's inputs.
#[derive(Debug)]
pub struct InputAssembler {
    /// The attribute layout, in declaration order.
    pub attributes: Vec<VertexAttribute>,
    /// Vertex buffers by stream index.
    pub vertex_buffers: Vec<BufferId>,
    /// The optional index buffer.
    pub index_buffer: Option<BufferId>,
    /// The resolved feed table, cached per shader. Recomputed when a draw is
    /// issued under a different shader.
    pub resolved: Option<(ShaderId, Vec<ResolvedAttribute>)>,
}

impl InputAssembler {
    /// Builds an input assembler from a descriptor.
    pub fn new(descriptor: &InputAssemblerDescriptor) -> Self {
        Self {
            attributes: descriptor.attributes.clone(),
            vertex_buffers: descriptor.vertex_buffers.clone(),
            index_buffer: descriptor.index_buffer,
            resolved: None,
        }
    }
}
