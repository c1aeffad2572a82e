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

//! The command package: an ordered tag sequence plus per-kind record arrays.

use super::pool::CommandAllocator;
use crate::math::{LinearRgba, Rect2D};
use crate::resource::{
    BindingSetLayoutId, BufferId, FramebufferId, InputAssemblerId, PipelineStateId,
};

/// The closed set of recordable command kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    /// Begin a render pass against a framebuffer.
    BeginRenderPass,
    /// Bind a pipeline state object.
    BindPipelineState,
    /// Bind an input assembler.
    BindInputAssembler,
    /// Bind a binding set layout.
    BindBindingSetLayout,
    /// Issue a draw.
    Draw,
    /// Upload bytes into a buffer.
    UpdateBuffer,
}

/// Record for [`CommandKind::BeginRenderPass`].
#[derive(Debug, Clone, Default)]
pub struct BeginRenderPassCmd {
    /// The framebuffer to render into.
    pub framebuffer: FramebufferId,
    /// The viewport and scissor rectangle of the pass.
    pub render_area: Rect2D,
    /// Clear color, applied to color attachments whose load op is `Clear`.
    pub clear_color: LinearRgba,
    /// Clear depth, applied when the depth load op is `Clear`.
    pub clear_depth: f32,
    /// Clear stencil, applied when the stencil load op is `Clear`.
    pub clear_stencil: u32,
}

/// Record for [`CommandKind::BindPipelineState`].
#[derive(Debug, Clone, Copy, Default)]
pub struct BindPipelineStateCmd {
    /// The pipeline to bind.
    pub pipeline: PipelineStateId,
}

/// Record for [`CommandKind::BindInputAssembler`].
#[derive(Debug, Clone, Copy, Default)]
pub struct BindInputAssemblerCmd {
    /// The input assembler to bind.
    pub assembler: InputAssemblerId,
}

/// Record for [`CommandKind::BindBindingSetLayout`].
#[derive(Debug, Clone, Copy, Default)]
pub struct BindBindingSetLayoutCmd {
    /// The binding set layout to apply.
    pub layout: BindingSetLayoutId,
}

/// Record for [`CommandKind::Draw`].
#[derive(Debug, Clone, Copy, Default)]
pub struct DrawCmd {
    /// First vertex of a non-indexed draw.
    pub first_vertex: u32,
    /// Vertex count of a non-indexed draw.
    pub vertex_count: u32,
    /// First index of an indexed draw.
    pub first_index: u32,
    /// Index count; an indexed draw is issued when this is non-zero and the
    /// bound assembler has an index buffer.
    pub index_count: u32,
}

/// Record for [`CommandKind::UpdateBuffer`].
#[derive(Debug, Clone, Default)]
pub struct UpdateBufferCmd {
    /// The destination buffer.
    pub buffer: BufferId,
    /// Destination byte offset.
    pub offset: u64,
    /// The bytes to upload. The vector is pooled; capacity survives clears.
    pub data: Vec<u8>,
}

/// A recorded, replayable batch of rendering commands.
///
/// The tag sequence carries the exact recorded order across kinds; replay
/// walks it once, advancing one per-kind cursor per occurrence. After
/// [`CommandPackage::clear`] the records are back in the allocator's pools
/// and must not be read again until re-recorded.
#[derive(Debug, Default)]
pub struct CommandPackage {
    /// The ordered command tag sequence.
    pub tags: Vec<CommandKind>,
    /// Begin-render-pass records, in recording order.
    pub begin_render_pass: Vec<BeginRenderPassCmd>,
    /// Bind-pipeline-state records, in recording order.
    pub bind_pipeline_state: Vec<BindPipelineStateCmd>,
    /// Bind-input-assembler records, in recording order.
    pub bind_input_assembler: Vec<BindInputAssemblerCmd>,
    /// Bind-binding-set-layout records, in recording order.
    pub bind_binding_set_layout: Vec<BindBindingSetLayoutCmd>,
    /// Draw records, in recording order.
    pub draw: Vec<DrawCmd>,
    /// Update-buffer records, in recording order.
    pub update_buffer: Vec<UpdateBufferCmd>,
}

impl CommandPackage {
    /// Creates an empty package.
    pub fn new() -> Self {
        Self::default()
    }

    /// `true` when nothing has been recorded since the last clear.
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// Records a begin-render-pass command.
    #[allow(clippy::too_many_arguments)]
    pub fn begin_render_pass(
        &mut self,
        allocator: &mut CommandAllocator,
        framebuffer: FramebufferId,
        render_area: Rect2D,
        clear_color: LinearRgba,
        clear_depth: f32,
        clear_stencil: u32,
    ) {
        let mut cmd = allocator.begin_render_pass.acquire();
        cmd.framebuffer = framebuffer;
        cmd.render_area = render_area;
        cmd.clear_color = clear_color;
        cmd.clear_depth = clear_depth;
        cmd.clear_stencil = clear_stencil;
        self.begin_render_pass.push(cmd);
        self.tags.push(CommandKind::BeginRenderPass);
    }

    /// Records a pipeline state bind.
    pub fn bind_pipeline_state(
        &mut self,
        allocator: &mut CommandAllocator,
        pipeline: PipelineStateId,
    ) {
        let mut cmd = allocator.bind_pipeline_state.acquire();
        cmd.pipeline = pipeline;
        self.bind_pipeline_state.push(cmd);
        self.tags.push(CommandKind::BindPipelineState);
    }

    /// Records an input assembler bind.
    pub fn bind_input_assembler(
        &mut self,
        allocator: &mut CommandAllocator,
        assembler: InputAssemblerId,
    ) {
        let mut cmd = allocator.bind_input_assembler.acquire();
        cmd.assembler = assembler;
        self.bind_input_assembler.push(cmd);
        self.tags.push(CommandKind::BindInputAssembler);
    }

    /// Records a binding set layout bind.
    pub fn bind_binding_set_layout(
        &mut self,
        allocator: &mut CommandAllocator,
        layout: BindingSetLayoutId,
    ) {
        let mut cmd = allocator.bind_binding_set_layout.acquire();
        cmd.layout = layout;
        self.bind_binding_set_layout.push(cmd);
        self.tags.push(CommandKind::BindBindingSetLayout);
    }

    /// Records a draw.
    pub fn draw(
        &mut self,
        allocator: &mut CommandAllocator,
        first_vertex: u32,
        vertex_count: u32,
        first_index: u32,
        index_count: u32,
    ) {
        let mut cmd = allocator.draw.acquire();
        cmd.first_vertex = first_vertex;
        cmd.vertex_count = vertex_count;
        cmd.first_index = first_index;
        cmd.index_count = index_count;
        self.draw.push(cmd);
        self.tags.push(CommandKind::Draw);
    }

    /// Records a buffer update. The bytes are copied into a pooled record.
    pub fn update_buffer(
        &mut self,
        allocator: &mut CommandAllocator,
        buffer: BufferId,
        offset: u64,
        data: &[u8],
    ) {
        let mut cmd = allocator.update_buffer.acquire();
        cmd.buffer = buffer;
        cmd.offset = offset;
        cmd.data.clear();
        cmd.data.extend_from_slice(data);
        self.update_buffer.push(cmd);
        self.tags.push(CommandKind::UpdateBuffer);
    }

    /// Returns every record to the allocator's pools, empties the per-kind
    /// arrays, and resets the tag sequence. Backing storage is retained.
    pub fn clear(&mut self, allocator: &mut CommandAllocator) {
        for cmd in self.begin_render_pass.drain(..) {
            allocator.begin_render_pass.release(cmd);
        }
        for cmd in self.bind_pipeline_state.drain(..) {
            allocator.bind_pipeline_state.release(cmd);
        }
        for cmd in self.bind_input_assembler.drain(..) {
            allocator.bind_input_assembler.release(cmd);
        }
        for cmd in self.bind_binding_set_layout.drain(..) {
            allocator.bind_binding_set_layout.release(cmd);
        }
        for cmd in self.draw.drain(..) {
            allocator.draw.release(cmd);
        }
        for cmd in self.update_buffer.drain(..) {
            allocator.update_buffer.release(cmd);
        }
        self.tags.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_sequence_carries_recording_order() {
        let mut allocator = CommandAllocator::new();
        let mut package = CommandPackage::new();

        package.bind_pipeline_state(&mut allocator, PipelineStateId(1));
        package.bind_input_assembler(&mut allocator, InputAssemblerId(2));
        package.draw(&mut allocator, 0, 3, 0, 0);
        package.bind_input_assembler(&mut allocator, InputAssemblerId(3));
        package.draw(&mut allocator, 0, 6, 0, 0);

        assert_eq!(
            package.tags,
            vec![
                CommandKind::BindPipelineState,
                CommandKind::BindInputAssembler,
                CommandKind::Draw,
                CommandKind::BindInputAssembler,
                CommandKind::Draw,
            ]
        );
        assert_eq!(package.bind_input_assembler[0].assembler, InputAssemblerId(2));
        assert_eq!(package.bind_input_assembler[1].assembler, InputAssemblerId(3));
    }

    #[test]
    fn clear_empties_arrays_and_pools_records() {
        let mut allocator = CommandAllocator::new();
        let mut package = CommandPackage::new();

        for _ in 0..4 {
            package.draw(&mut allocator, 0, 3, 0, 0);
        }
        package.update_buffer(&mut allocator, BufferId(7), 0, &[0u8; 48]);
        package.clear(&mut allocator);

        assert!(package.is_empty());
        assert_eq!(package.draw.len(), 0);
        assert_eq!(package.update_buffer.len(), 0);
        assert_eq!(allocator.draw.pooled(), 4);
        assert_eq!(allocator.update_buffer.pooled(), 1);
    }

    #[test]
    fn rerecording_reuses_pooled_storage() {
        let mut allocator = CommandAllocator::new();
        let mut package = CommandPackage::new();

        for _ in 0..8 {
            package.draw(&mut allocator, 0, 3, 0, 0);
        }
        package.clear(&mut allocator);
        let high_water = allocator.draw.pooled();
        assert_eq!(high_water, 8);

        // Re-recording the same count drains the pool without growing it.
        for _ in 0..8 {
            package.draw(&mut allocator, 0, 3, 0, 0);
        }
        assert_eq!(allocator.draw.pooled(), 0);
        package.clear(&mut allocator);
        assert_eq!(allocator.draw.pooled(), high_water);
    }
}
