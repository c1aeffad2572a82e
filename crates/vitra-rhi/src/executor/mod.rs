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

//! Diffed command replay.
//!
//! [`execute`] walks a package's tag sequence once, advancing one per-kind
//! cursor per occurrence, and turns each record into the minimal set of
//! driver calls: every state-changing call is diffed against the
//! [`StateCache`] first and skipped when the cache already mirrors the
//! requested value. Recording-time mistakes (missing resources, draws with no
//! pipeline bound) are logged and skipped; replay never panics on them.

pub(crate) mod realize;

use std::collections::HashMap;

use log::{error, warn};

use crate::command::{
    BeginRenderPassCmd, CommandKind, CommandPackage, DrawCmd, UpdateBufferCmd,
};
use crate::device::Device;
use crate::driver::{BufferTarget, DriverContext, IndexKind};
use crate::resource::{
    BindingResource, BindingSetLayout, Buffer, BufferId, Framebuffer, FramebufferId,
    InputAssembler, InputAssemblerId, LoadOp, PipelineState, PrimitiveTopology, RenderPass,
    RenderPassId, Sampler, SamplerId, Shader, ShaderId, StencilFace, StencilSideState, Texture,
    TextureId, TextureView, TextureViewId, UniformBlock, UniformType,
};
use crate::state::StateCache;

#[derive(Default)]
struct Cursors {
    begin_render_pass: usize,
    bind_pipeline_state: usize,
    bind_input_assembler: usize,
    bind_binding_set_layout: usize,
    draw: usize,
    update_buffer: usize,
}

fn next<'a, T>(cursor: &mut usize, records: &'a [T]) -> &'a T {
    debug_assert!(*cursor < records.len(), "command package replayed after clear");
    let record = &records[*cursor];
    *cursor += 1;
    record
}

/// Replays a recorded package against the device's driver.
///
/// The package must not have been cleared since it was recorded; replaying a
/// cleared package is a caller defect caught by a debug assertion.
pub fn execute(device: &mut Device, package: &CommandPackage) {
    let Device {
        driver,
        cache,
        buffers,
        textures,
        texture_views,
        render_passes,
        framebuffers,
        samplers,
        shaders,
        pipelines,
        binding_set_layouts,
        input_assemblers,
        ..
    } = device;
    let driver = driver.as_mut();

    let mut cursors = Cursors::default();
    let mut current_shader: Option<ShaderId> = None;
    let mut current_assembler: Option<InputAssemblerId> = None;
    let mut topology = PrimitiveTopology::default();

    for tag in &package.tags {
        match tag {
            CommandKind::BeginRenderPass => {
                let cmd = next(&mut cursors.begin_render_pass, &package.begin_render_pass);
                begin_render_pass(&mut *driver, cache, framebuffers, render_passes, cmd);
            }
            CommandKind::BindPipelineState => {
                let cmd = next(&mut cursors.bind_pipeline_state, &package.bind_pipeline_state);
                if let Some(pipeline) =
                    lookup(pipelines, &cmd.pipeline, "pipeline state", CommandKind::BindPipelineState)
                {
                    apply_pipeline(&mut *driver, cache, pipeline, shaders);
                    topology = pipeline.topology;
                    current_shader = Some(pipeline.shader);
                }
            }
            CommandKind::BindInputAssembler => {
                let cmd = next(&mut cursors.bind_input_assembler, &package.bind_input_assembler);
                current_assembler = Some(cmd.assembler);
            }
            CommandKind::BindBindingSetLayout => {
                let cmd =
                    next(&mut cursors.bind_binding_set_layout, &package.bind_binding_set_layout);
                let Some(layout) = lookup(
                    binding_set_layouts,
                    &cmd.layout,
                    "binding set layout",
                    CommandKind::BindBindingSetLayout,
                ) else {
                    continue;
                };
                apply_binding_set(
                    &mut *driver,
                    cache,
                    layout,
                    current_shader,
                    shaders,
                    buffers,
                    textures,
                    texture_views,
                    samplers,
                );
            }
            CommandKind::Draw => {
                let cmd = next(&mut cursors.draw, &package.draw);
                draw(
                    &mut *driver,
                    cache,
                    buffers,
                    shaders,
                    input_assemblers,
                    current_shader,
                    current_assembler,
                    topology,
                    cmd,
                );
            }
            CommandKind::UpdateBuffer => {
                let cmd = next(&mut cursors.update_buffer, &package.update_buffer);
                update_buffer(&mut *driver, cache, buffers, cmd);
            }
        }
    }
}

fn lookup<'a, K: std::hash::Hash + Eq + std::fmt::Debug, V>(
    map: &'a HashMap<K, V>,
    key: &K,
    what: &str,
    kind: CommandKind,
) -> Option<&'a V> {
    let value = map.get(key);
    if value.is_none() {
        error!("{kind:?} references a missing {what} {key:?}; command skipped");
    }
    value
}

fn begin_render_pass(
    driver: &mut dyn DriverContext,
    cache: &mut StateCache,
    framebuffers: &HashMap<FramebufferId, Framebuffer>,
    render_passes: &HashMap<RenderPassId, RenderPass>,
    cmd: &BeginRenderPassCmd,
) {
    let Some(framebuffer) = framebuffers.get(&cmd.framebuffer) else {
        error!("begin_render_pass references a missing framebuffer {:?}", cmd.framebuffer);
        return;
    };
    if framebuffer.offscreen {
        driver.bind_framebuffer(None);
    } else if let Some(native) = framebuffer.native {
        driver.bind_framebuffer(Some(native));
    } else {
        warn!("framebuffer {:?} is degraded; binding the default target", cmd.framebuffer);
        driver.bind_framebuffer(None);
    }

    if cache.viewport != cmd.render_area {
        driver.set_viewport(cmd.render_area);
        cache.viewport = cmd.render_area;
    }
    if cache.scissor != cmd.render_area {
        driver.set_scissor(cmd.render_area);
        cache.scissor = cmd.render_area;
    }

    let Some(pass) = render_passes.get(&framebuffer.render_pass) else {
        error!("framebuffer {:?} references a missing render pass", cmd.framebuffer);
        return;
    };
    let color = pass
        .color_attachments
        .iter()
        .any(|attachment| attachment.load_op == LoadOp::Clear)
        .then_some(cmd.clear_color);
    let (depth, stencil) = match &pass.depth_stencil_attachment {
        Some(ds) => (
            (ds.depth_load_op == LoadOp::Clear).then_some(cmd.clear_depth),
            (ds.stencil_load_op == LoadOp::Clear).then_some(cmd.clear_stencil),
        ),
        None => (None, None),
    };
    if color.is_some() || depth.is_some() || stencil.is_some() {
        driver.clear(color, depth, stencil);
    }
}

fn apply_pipeline(
    driver: &mut dyn DriverContext,
    cache: &mut StateCache,
    pipeline: &PipelineState,
    shaders: &HashMap<ShaderId, Shader>,
) {
    let r = &pipeline.rasterizer;
    let cached = &mut cache.rasterizer;
    if cached.cull_mode != r.cull_mode {
        driver.set_cull_mode(r.cull_mode);
        cached.cull_mode = r.cull_mode;
    }
    if cached.front_face != r.front_face {
        driver.set_front_face(r.front_face);
        cached.front_face = r.front_face;
    }
    if cached.depth_bias != r.depth_bias || cached.depth_bias_slope != r.depth_bias_slope {
        driver.set_depth_bias(r.depth_bias, r.depth_bias_slope);
        cached.depth_bias = r.depth_bias;
        cached.depth_bias_slope = r.depth_bias_slope;
    }
    if cached.line_width != r.line_width {
        driver.set_line_width(r.line_width);
        cached.line_width = r.line_width;
    }

    let d = &pipeline.depth_stencil;
    let cached = &mut cache.depth_stencil;
    if cached.depth_test != d.depth_test {
        driver.set_depth_test(d.depth_test);
        cached.depth_test = d.depth_test;
    }
    if cached.depth_write != d.depth_write {
        driver.set_depth_write(d.depth_write);
        cached.depth_write = d.depth_write;
    }
    if cached.depth_compare != d.depth_compare {
        driver.set_depth_compare(d.depth_compare);
        cached.depth_compare = d.depth_compare;
    }
    if cached.stencil_test != d.stencil_test {
        driver.set_stencil_test(d.stencil_test);
        cached.stencil_test = d.stencil_test;
    }
    apply_stencil_side(driver, &mut cached.front, StencilFace::Front, &d.front);
    apply_stencil_side(driver, &mut cached.back, StencilFace::Back, &d.back);

    let b = &pipeline.blend;
    if cache.alpha_to_coverage != b.alpha_to_coverage {
        driver.set_alpha_to_coverage(b.alpha_to_coverage);
        cache.alpha_to_coverage = b.alpha_to_coverage;
    }
    if cache.blend_constant != b.blend_color {
        driver.set_blend_constant(b.blend_color);
        cache.blend_constant = b.blend_color;
    }
    if b.targets.len() > 1 {
        warn!("only blend target 0 is applied; {} extra targets ignored", b.targets.len() - 1);
    }
    if let Some(t) = b.targets.first() {
        let cached = &mut cache.blend_target;
        if cached.blend_enabled != t.blend_enabled {
            driver.set_blend_enabled(t.blend_enabled);
            cached.blend_enabled = t.blend_enabled;
        }
        if cached.color_op != t.color_op || cached.alpha_op != t.alpha_op {
            driver.set_blend_equation(t.color_op, t.alpha_op);
            cached.color_op = t.color_op;
            cached.alpha_op = t.alpha_op;
        }
        if cached.src_color_factor != t.src_color_factor
            || cached.dst_color_factor != t.dst_color_factor
            || cached.src_alpha_factor != t.src_alpha_factor
            || cached.dst_alpha_factor != t.dst_alpha_factor
        {
            driver.set_blend_factors(
                t.src_color_factor,
                t.dst_color_factor,
                t.src_alpha_factor,
                t.dst_alpha_factor,
            );
            cached.src_color_factor = t.src_color_factor;
            cached.dst_color_factor = t.dst_color_factor;
            cached.src_alpha_factor = t.src_alpha_factor;
            cached.dst_alpha_factor = t.dst_alpha_factor;
        }
        if cached.write_mask != t.write_mask {
            driver.set_color_write_mask(t.write_mask);
            cached.write_mask = t.write_mask;
        }
    }

    match shaders.get(&pipeline.shader) {
        Some(shader) => {
            if cache.program != shader.program {
                driver.use_program(shader.program);
                cache.program = shader.program;
            }
        }
        None => error!("pipeline references a missing shader {:?}", pipeline.shader),
    }
}

fn apply_stencil_side(
    driver: &mut dyn DriverContext,
    cached: &mut StencilSideState,
    face: StencilFace,
    side: &StencilSideState,
) {
    if cached.compare != side.compare
        || cached.reference != side.reference
        || cached.read_mask != side.read_mask
    {
        driver.set_stencil_func(face, side.compare, side.reference, side.read_mask);
        cached.compare = side.compare;
        cached.reference = side.reference;
        cached.read_mask = side.read_mask;
    }
    if cached.fail_op != side.fail_op
        || cached.depth_fail_op != side.depth_fail_op
        || cached.pass_op != side.pass_op
    {
        driver.set_stencil_ops(face, side.fail_op, side.depth_fail_op, side.pass_op);
        cached.fail_op = side.fail_op;
        cached.depth_fail_op = side.depth_fail_op;
        cached.pass_op = side.pass_op;
    }
    if cached.write_mask != side.write_mask {
        driver.set_stencil_write_mask(face, side.write_mask);
        cached.write_mask = side.write_mask;
    }
}

#[allow(clippy::too_many_arguments)]
fn apply_binding_set(
    driver: &mut dyn DriverContext,
    cache: &mut StateCache,
    layout: &BindingSetLayout,
    current_shader: Option<ShaderId>,
    shaders: &mut HashMap<ShaderId, Shader>,
    buffers: &HashMap<BufferId, Buffer>,
    textures: &HashMap<TextureId, Texture>,
    texture_views: &HashMap<TextureViewId, TextureView>,
    samplers: &HashMap<SamplerId, Sampler>,
) {
    let Some(shader_id) = current_shader else {
        warn!("binding set layout applied with no pipeline bound; skipped");
        return;
    };
    let Some(shader) = shaders.get_mut(&shader_id) else {
        error!("current pipeline references a missing shader {shader_id:?}");
        return;
    };
    for unit in &layout.bindings {
        match unit.resource {
            BindingResource::UniformBuffer(buffer_id) => {
                let Some(block) =
                    shader.blocks.iter_mut().find(|block| block.binding == unit.slot)
                else {
                    warn!(
                        "slot {} has no matching uniform block in '{}'; binding skipped",
                        unit.slot, shader.name
                    );
                    continue;
                };
                let Some(buffer) = buffers.get(&buffer_id) else {
                    warn!("slot {} references a missing buffer {buffer_id:?}", unit.slot);
                    continue;
                };
                let Some(backing) = &buffer.backing else {
                    warn!("slot {} buffer {buffer_id:?} is not a uniform buffer", unit.slot);
                    continue;
                };
                commit_uniform_block(driver, block, backing);
            }
            BindingResource::Sampler { texture_view, sampler } => {
                let Some(entry) = shader.samplers.iter().find(|entry| entry.unit == unit.slot)
                else {
                    warn!(
                        "slot {} matches no sampler unit in '{}'; binding skipped",
                        unit.slot, shader.name
                    );
                    continue;
                };
                let Some(view) = texture_views.get(&texture_view) else {
                    warn!("slot {} references a missing texture view", unit.slot);
                    continue;
                };
                let Some(texture) = textures.get(&view.texture) else {
                    warn!("slot {} references a missing texture", unit.slot);
                    continue;
                };
                let Some(native) = texture.native else {
                    warn!("slot {} references a degraded texture", unit.slot);
                    continue;
                };
                let rebound = realize::bind_texture_cached(
                    driver,
                    cache,
                    entry.unit,
                    texture.texture_type,
                    Some(native),
                );
                if rebound {
                    if let Some(sampler) = samplers.get(&sampler) {
                        driver.apply_sampler(entry.unit, texture.texture_type, &sampler.desc);
                    }
                }
            }
        }
    }
}

/// Copies a uniform buffer's bytes into the block's storage and commits every
/// entry whose bytes changed. The first commit after realization pushes all
/// entries regardless.
fn commit_uniform_block(driver: &mut dyn DriverContext, block: &mut UniformBlock, data: &[u8]) {
    let first = !block.committed;
    let UniformBlock { entries, storage, .. } = block;
    for entry in entries.iter() {
        let offset = entry.offset as usize;
        let bytes = (entry.ty.byte_size() * entry.count) as usize;
        if offset + bytes > data.len() {
            warn!("uniform '{}' reads past the end of its buffer; skipped", entry.name);
            continue;
        }
        let word_offset = offset / 4;
        let words = bytes / 4;
        let changed = {
            let stored: &mut [u8] =
                bytemuck::cast_slice_mut(&mut storage[word_offset..word_offset + words]);
            let incoming = &data[offset..offset + bytes];
            if stored != incoming {
                stored.copy_from_slice(incoming);
                true
            } else {
                false
            }
        };
        if !(first || changed) {
            continue;
        }
        let values = &storage[word_offset..word_offset + words];
        match entry.ty {
            UniformType::Float => driver.set_uniform_f1(entry.location, values),
            UniformType::Vec2 => driver.set_uniform_f2(entry.location, values),
            UniformType::Vec3 => driver.set_uniform_f3(entry.location, values),
            UniformType::Vec4 => driver.set_uniform_f4(entry.location, values),
            UniformType::Int => driver.set_uniform_i1(entry.location, bytemuck::cast_slice(values)),
            UniformType::IVec2 => {
                driver.set_uniform_i2(entry.location, bytemuck::cast_slice(values))
            }
            UniformType::IVec3 => {
                driver.set_uniform_i3(entry.location, bytemuck::cast_slice(values))
            }
            UniformType::IVec4 => {
                driver.set_uniform_i4(entry.location, bytemuck::cast_slice(values))
            }
            UniformType::Mat2 => driver.set_uniform_mat2(entry.location, values),
            UniformType::Mat3 => driver.set_uniform_mat3(entry.location, values),
            UniformType::Mat4 => driver.set_uniform_mat4(entry.location, values),
            UniformType::Sampler2D | UniformType::SamplerCube => {
                // Sampler units are fixed at realization; nothing to commit.
            }
        }
    }
    block.committed = true;
}

#[allow(clippy::too_many_arguments)]
fn draw(
    driver: &mut dyn DriverContext,
    cache: &mut StateCache,
    buffers: &HashMap<BufferId, Buffer>,
    shaders: &HashMap<ShaderId, Shader>,
    input_assemblers: &mut HashMap<InputAssemblerId, InputAssembler>,
    current_shader: Option<ShaderId>,
    current_assembler: Option<InputAssemblerId>,
    topology: PrimitiveTopology,
    cmd: &DrawCmd,
) {
    let Some(shader_id) = current_shader else {
        warn!("draw with no pipeline bound; skipped");
        return;
    };
    let Some(assembler_id) = current_assembler else {
        warn!("draw with no input assembler bound; skipped");
        return;
    };
    let Some(shader) = shaders.get(&shader_id) else {
        error!("draw under a missing shader {shader_id:?}; skipped");
        return;
    };
    if shader.program.is_none() {
        warn!("draw under the degraded shader '{}'; skipped", shader.name);
        return;
    }
    let Some(assembler) = input_assemblers.get_mut(&assembler_id) else {
        error!("draw references a missing input assembler {assembler_id:?}; skipped");
        return;
    };

    let stale = match &assembler.resolved {
        Some((resolved_for, _)) => *resolved_for != shader_id,
        None => true,
    };
    if stale {
        let table = realize::resolve_attributes(assembler, shader, buffers);
        assembler.resolved = Some((shader_id, table));
    }
    let Some((_, table)) = &assembler.resolved else {
        return;
    };

    let mut mask = 0u64;
    for attribute in table {
        let Some(buffer) = buffers.get(&attribute.buffer) else {
            warn!("attribute stream buffer {:?} is missing; skipped", attribute.buffer);
            continue;
        };
        let Some(native) = buffer.native else {
            warn!("attribute stream buffer {:?} is degraded; skipped", attribute.buffer);
            continue;
        };
        realize::bind_buffer_cached(driver, cache, BufferTarget::Vertex, Some(native));
        for row in 0..attribute.locations {
            let location = attribute.location + row;
            driver.attribute_pointer(
                location,
                attribute.components,
                attribute.stride,
                attribute.offset + row * attribute.row_size,
                attribute.instanced,
            );
            mask |= 1 << location;
        }
    }

    let previous = cache.enabled_attributes;
    let mut to_enable = mask & !previous;
    while to_enable != 0 {
        let location = to_enable.trailing_zeros();
        driver.enable_attribute(location);
        to_enable &= to_enable - 1;
    }
    let mut to_disable = previous & !mask;
    while to_disable != 0 {
        let location = to_disable.trailing_zeros();
        driver.disable_attribute(location);
        to_disable &= to_disable - 1;
    }
    cache.enabled_attributes = mask;

    // Indexed only when indices were both requested and provided; an
    // assembler without an index buffer falls back to a non-indexed draw.
    match assembler.index_buffer {
        Some(index_buffer_id) if cmd.index_count > 0 => {
            let Some(buffer) = buffers.get(&index_buffer_id) else {
                warn!("index buffer {index_buffer_id:?} is missing; skipped");
                return;
            };
            let Some(native) = buffer.native else {
                warn!("index buffer {index_buffer_id:?} is degraded; skipped");
                return;
            };
            let Some(kind) = IndexKind::from_stride(buffer.stride) else {
                error!("index buffer stride {} is not an index width; draw skipped", buffer.stride);
                return;
            };
            realize::bind_buffer_cached(driver, cache, BufferTarget::Index, Some(native));
            let byte_offset = cmd.first_index as u64 * buffer.stride as u64;
            driver.draw_elements(topology, kind, cmd.index_count, byte_offset);
        }
        _ => driver.draw_arrays(topology, cmd.first_vertex, cmd.vertex_count),
    }
}

fn update_buffer(
    driver: &mut dyn DriverContext,
    cache: &mut StateCache,
    buffers: &mut HashMap<BufferId, Buffer>,
    cmd: &UpdateBufferCmd,
) {
    let Some(buffer) = buffers.get_mut(&cmd.buffer) else {
        error!("update_buffer references a missing buffer {:?}; skipped", cmd.buffer);
        return;
    };
    if let Err(err) = realize::write_buffer(driver, cache, buffer, cmd.offset, &cmd.data) {
        error!("update_buffer into {:?} failed: {err}", cmd.buffer);
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::driver::{ProgramReflection, ReflectedAttribute, ReflectedUniform};
    use crate::error::{ResourceError, ShaderError};
    use crate::format::PixelFormat;
    use crate::math::{LinearRgba, Rect2D};
    use crate::resource::{
        BindingSetLayoutDescriptor, BindingUnit, BlendState, BufferDescriptor, BufferUsage,
        ColorAttachmentDescriptor, CullMode, DepthStencilAttachmentDescriptor, DepthStencilState,
        FramebufferDescriptor, InputAssemblerDescriptor, MemoryUsage, PipelineStateDescriptor,
        RasterizerState, RenderPassDescriptor, SamplerDescriptor, ShaderDescriptor,
        ShaderStageDescriptor, ShaderStageKind, StoreOp, TextureDescriptor, TextureFlags,
        TextureType, TextureUsage, TextureViewDescriptor, UniformBlockDeclaration,
        VertexAttribute,
    };
    use crate::test_driver::{Call, RecordingDriver};

    fn device_with(reflection: ProgramReflection) -> (Device, Rc<RefCell<Vec<Call>>>) {
        let (driver, calls) = RecordingDriver::with_reflection(reflection);
        (Device::new(Box::new(driver)), calls)
    }

    fn attribute(name: &str, ty: UniformType, location: u32) -> ReflectedAttribute {
        ReflectedAttribute { name: name.to_string(), ty, location }
    }

    fn uniform(name: &str, ty: UniformType, location: i32) -> ReflectedUniform {
        ReflectedUniform { name: name.to_string(), ty, count: 1, location }
    }

    fn shader_descriptor(blocks: Vec<UniformBlockDeclaration>) -> ShaderDescriptor {
        ShaderDescriptor {
            name: "test".to_string(),
            stages: vec![
                ShaderStageDescriptor {
                    stage: ShaderStageKind::Vertex,
                    source: "void main() {}".to_string(),
                    macros: Vec::new(),
                },
                ShaderStageDescriptor {
                    stage: ShaderStageKind::Fragment,
                    source: "void main() {}".to_string(),
                    macros: Vec::new(),
                },
            ],
            blocks,
        }
    }

    fn pipeline_descriptor(
        shader: ShaderId,
        pass: RenderPassId,
    ) -> PipelineStateDescriptor {
        PipelineStateDescriptor {
            shader,
            rasterizer: RasterizerState::default(),
            depth_stencil: DepthStencilState::default(),
            blend: BlendState::default(),
            topology: PrimitiveTopology::default(),
            render_pass: pass,
        }
    }

    fn vertex_buffer(device: &mut Device, size: u64, stride: u32) -> BufferId {
        device
            .create_buffer(&BufferDescriptor {
                usage: BufferUsage::VERTEX,
                memory: MemoryUsage::DEVICE,
                size,
                stride,
            })
            .unwrap()
    }

    #[test]
    fn identical_pipeline_rebind_is_elided() {
        let (mut device, calls) = device_with(ProgramReflection::default());
        let shader = device.create_shader(&shader_descriptor(Vec::new())).unwrap();
        let pass = device.create_render_pass(&RenderPassDescriptor::default()).unwrap();
        let mut descriptor = pipeline_descriptor(shader, pass);
        descriptor.rasterizer.cull_mode = CullMode::Back;
        descriptor.depth_stencil.depth_test = true;
        descriptor.blend.targets[0].blend_enabled = true;
        let pipeline = device.create_pipeline_state(&descriptor).unwrap();

        let mut package = CommandPackage::new();
        package.bind_pipeline_state(device.allocator_mut(), pipeline);
        execute(&mut device, &package);
        let baseline = calls.borrow().len();

        let mut package = CommandPackage::new();
        package.bind_pipeline_state(device.allocator_mut(), pipeline);
        execute(&mut device, &package);
        assert_eq!(calls.borrow().len(), baseline, "redundant rebind must issue no calls");
    }

    #[test]
    fn single_state_change_issues_exactly_one_call() {
        let (mut device, calls) = device_with(ProgramReflection::default());
        let shader = device.create_shader(&shader_descriptor(Vec::new())).unwrap();
        let pass = device.create_render_pass(&RenderPassDescriptor::default()).unwrap();
        let mut descriptor = pipeline_descriptor(shader, pass);
        descriptor.depth_stencil.depth_test = true;
        let first = device.create_pipeline_state(&descriptor).unwrap();
        descriptor.rasterizer.cull_mode = CullMode::Front;
        let second = device.create_pipeline_state(&descriptor).unwrap();

        let mut package = CommandPackage::new();
        package.bind_pipeline_state(device.allocator_mut(), first);
        execute(&mut device, &package);
        let baseline = calls.borrow().len();

        let mut package = CommandPackage::new();
        package.bind_pipeline_state(device.allocator_mut(), second);
        execute(&mut device, &package);
        let log = calls.borrow();
        assert_eq!(&log[baseline..], &[Call::SetCullMode(CullMode::Front)]);
    }

    #[test]
    fn first_bind_sets_only_divergent_state() {
        let (mut device, calls) = device_with(ProgramReflection::default());
        let shader = device.create_shader(&shader_descriptor(Vec::new())).unwrap();
        let pass = device.create_render_pass(&RenderPassDescriptor::default()).unwrap();
        let mut descriptor = pipeline_descriptor(shader, pass);
        descriptor.depth_stencil.depth_test = true;
        let pipeline = device.create_pipeline_state(&descriptor).unwrap();

        let baseline = calls.borrow().len();
        let mut package = CommandPackage::new();
        package.bind_pipeline_state(device.allocator_mut(), pipeline);
        execute(&mut device, &package);
        // The shader's program is already current from realization, so the
        // only divergence from the context defaults is the depth test.
        let log = calls.borrow();
        assert_eq!(&log[baseline..], &[Call::SetDepthTest(true)]);
    }

    #[test]
    fn buffer_updates_reuse_the_cached_binding() {
        let (mut device, calls) = device_with(ProgramReflection::default());
        let buffer = vertex_buffer(&mut device, 256, 16);

        let baseline = calls.borrow().len();
        let mut package = CommandPackage::new();
        package.update_buffer(device.allocator_mut(), buffer, 0, &[1u8; 64]);
        package.update_buffer(device.allocator_mut(), buffer, 64, &[2u8; 64]);
        execute(&mut device, &package);

        let log = calls.borrow();
        let window = &log[baseline..];
        let uploads = window.iter().filter(|c| matches!(c, Call::UploadBuffer(..))).count();
        let binds = window.iter().filter(|c| matches!(c, Call::BindBuffer(..))).count();
        assert_eq!(uploads, 2);
        assert_eq!(binds, 0, "the buffer is bound since realization");
    }

    #[test]
    fn draws_route_direct_and_indexed() {
        let reflection = ProgramReflection {
            attributes: vec![attribute("position", UniformType::Vec4, 0)],
            uniforms: Vec::new(),
        };
        let (mut device, calls) = device_with(reflection);
        let vb = vertex_buffer(&mut device, 256, 16);
        let ib = device
            .create_buffer(&BufferDescriptor {
                usage: BufferUsage::INDEX,
                memory: MemoryUsage::DEVICE,
                size: 64,
                stride: 2,
            })
            .unwrap();
        let shader = device.create_shader(&shader_descriptor(Vec::new())).unwrap();
        let pass = device.create_render_pass(&RenderPassDescriptor::default()).unwrap();
        let pipeline =
            device.create_pipeline_state(&pipeline_descriptor(shader, pass)).unwrap();
        let assembler = device
            .create_input_assembler(&InputAssemblerDescriptor {
                attributes: vec![VertexAttribute {
                    name: "position".to_string(),
                    format: PixelFormat::Rgba32Float,
                    stream: 0,
                    normalized: false,
                    instanced: false,
                }],
                vertex_buffers: vec![vb],
                index_buffer: Some(ib),
            })
            .unwrap();

        let baseline = calls.borrow().len();
        let mut package = CommandPackage::new();
        package.bind_pipeline_state(device.allocator_mut(), pipeline);
        package.bind_input_assembler(device.allocator_mut(), assembler);
        package.draw(device.allocator_mut(), 0, 3, 0, 0);
        package.draw(device.allocator_mut(), 0, 0, 6, 12);
        execute(&mut device, &package);

        let log = calls.borrow();
        let window = &log[baseline..];
        assert!(window.contains(&Call::AttributePointer {
            location: 0,
            components: 4,
            stride: 16,
            offset: 0,
            instanced: false,
        }));
        assert!(window.contains(&Call::EnableAttribute(0)));
        assert!(window.contains(&Call::DrawArrays(PrimitiveTopology::TriangleList, 0, 3)));
        // first_index 6 against 16-bit indices reads at byte offset 12.
        assert!(window.contains(&Call::DrawElements(
            PrimitiveTopology::TriangleList,
            IndexKind::U16,
            12,
            12,
        )));
    }

    #[test]
    fn draw_without_index_buffer_falls_back_to_non_indexed() {
        let reflection = ProgramReflection {
            attributes: vec![attribute("position", UniformType::Vec4, 0)],
            uniforms: Vec::new(),
        };
        let (mut device, calls) = device_with(reflection);
        let vb = vertex_buffer(&mut device, 256, 16);
        let shader = device.create_shader(&shader_descriptor(Vec::new())).unwrap();
        let pass = device.create_render_pass(&RenderPassDescriptor::default()).unwrap();
        let pipeline =
            device.create_pipeline_state(&pipeline_descriptor(shader, pass)).unwrap();
        let assembler = device
            .create_input_assembler(&InputAssemblerDescriptor {
                attributes: vec![VertexAttribute {
                    name: "position".to_string(),
                    format: PixelFormat::Rgba32Float,
                    stream: 0,
                    normalized: false,
                    instanced: false,
                }],
                vertex_buffers: vec![vb],
                index_buffer: None,
            })
            .unwrap();

        let baseline = calls.borrow().len();
        let mut package = CommandPackage::new();
        package.bind_pipeline_state(device.allocator_mut(), pipeline);
        package.bind_input_assembler(device.allocator_mut(), assembler);
        // A non-zero index count without an index buffer still draws the
        // vertex range directly.
        package.draw(device.allocator_mut(), 0, 3, 0, 12);
        execute(&mut device, &package);

        let log = calls.borrow();
        let window = &log[baseline..];
        assert!(window.contains(&Call::DrawArrays(PrimitiveTopology::TriangleList, 0, 3)));
        assert!(!window.iter().any(|c| matches!(c, Call::DrawElements(..))));
    }

    #[test]
    fn stale_attribute_locations_are_disabled() {
        let reflection = ProgramReflection {
            attributes: vec![
                attribute("position", UniformType::Vec4, 0),
                attribute("uv", UniformType::Vec2, 1),
            ],
            uniforms: Vec::new(),
        };
        let (mut device, calls) = device_with(reflection);
        let vb = vertex_buffer(&mut device, 512, 24);
        let shader = device.create_shader(&shader_descriptor(Vec::new())).unwrap();
        let pass = device.create_render_pass(&RenderPassDescriptor::default()).unwrap();
        let pipeline =
            device.create_pipeline_state(&pipeline_descriptor(shader, pass)).unwrap();
        let position = VertexAttribute {
            name: "position".to_string(),
            format: PixelFormat::Rgba32Float,
            stream: 0,
            normalized: false,
            instanced: false,
        };
        let uv = VertexAttribute {
            name: "uv".to_string(),
            format: PixelFormat::Rg32Float,
            stream: 0,
            normalized: false,
            instanced: false,
        };
        let full = device
            .create_input_assembler(&InputAssemblerDescriptor {
                attributes: vec![position.clone(), uv],
                vertex_buffers: vec![vb],
                index_buffer: None,
            })
            .unwrap();
        let position_only = device
            .create_input_assembler(&InputAssemblerDescriptor {
                attributes: vec![position],
                vertex_buffers: vec![vb],
                index_buffer: None,
            })
            .unwrap();

        let mut package = CommandPackage::new();
        package.bind_pipeline_state(device.allocator_mut(), pipeline);
        package.bind_input_assembler(device.allocator_mut(), full);
        package.draw(device.allocator_mut(), 0, 3, 0, 0);
        execute(&mut device, &package);
        assert!(calls.borrow().contains(&Call::EnableAttribute(1)));

        let baseline = calls.borrow().len();
        let mut package = CommandPackage::new();
        package.bind_pipeline_state(device.allocator_mut(), pipeline);
        package.bind_input_assembler(device.allocator_mut(), position_only);
        package.draw(device.allocator_mut(), 0, 3, 0, 0);
        execute(&mut device, &package);

        let log = calls.borrow();
        let window = &log[baseline..];
        assert!(window.contains(&Call::DisableAttribute(1)));
        assert!(!window.iter().any(|c| matches!(c, Call::EnableAttribute(_))));
    }

    #[test]
    fn uniform_commits_route_matrix_sizes_and_diff() {
        let reflection = ProgramReflection {
            attributes: Vec::new(),
            uniforms: vec![
                uniform("u_model", UniformType::Mat4, 5),
                uniform("u_normal", UniformType::Mat3, 6),
                uniform("u_tint", UniformType::Vec4, 7),
                uniform("u_flags", UniformType::IVec2, 8),
            ],
        };
        let (mut device, calls) = device_with(reflection);
        let shader = device
            .create_shader(&shader_descriptor(vec![UniformBlockDeclaration {
                binding: 0,
                name: "Globals".to_string(),
                members: vec![
                    "u_model".to_string(),
                    "u_normal".to_string(),
                    "u_tint".to_string(),
                    "u_flags".to_string(),
                ],
            }]))
            .unwrap();
        let pass = device.create_render_pass(&RenderPassDescriptor::default()).unwrap();
        let pipeline =
            device.create_pipeline_state(&pipeline_descriptor(shader, pass)).unwrap();
        // 16 + 9 + 4 + 2 words.
        let words: Vec<f32> = (0..31).map(|i| i as f32).collect();
        let ub = device
            .create_buffer(&BufferDescriptor {
                usage: BufferUsage::UNIFORM,
                memory: MemoryUsage::HOST,
                size: 124,
                stride: 0,
            })
            .unwrap();
        device.update_buffer(ub, 0, bytemuck::cast_slice(&words)).unwrap();
        let layout = device
            .create_binding_set_layout(&BindingSetLayoutDescriptor {
                bindings: vec![BindingUnit {
                    slot: 0,
                    resource: BindingResource::UniformBuffer(ub),
                }],
            })
            .unwrap();

        let baseline = calls.borrow().len();
        let mut package = CommandPackage::new();
        package.bind_pipeline_state(device.allocator_mut(), pipeline);
        package.bind_binding_set_layout(device.allocator_mut(), layout);
        execute(&mut device, &package);
        {
            let log = calls.borrow();
            let window = &log[baseline..];
            assert!(window.contains(&Call::SetUniformMat4(5, words[0..16].to_vec())));
            assert!(window.contains(&Call::SetUniformMat3(6, words[16..25].to_vec())));
            assert!(window.contains(&Call::SetUniformF4(7, words[25..29].to_vec())));
            assert!(window.contains(&Call::SetUniformI2(
                8,
                bytemuck::cast_slice(&words[29..31]).to_vec(),
            )));
        }

        // Unchanged bytes commit nothing on the next replay.
        let baseline = calls.borrow().len();
        let mut package = CommandPackage::new();
        package.bind_pipeline_state(device.allocator_mut(), pipeline);
        package.bind_binding_set_layout(device.allocator_mut(), layout);
        execute(&mut device, &package);
        assert_eq!(calls.borrow().len(), baseline);

        // Touching one member re-commits only that member.
        let tint = [9.0f32, 8.0, 7.0, 6.0];
        device.update_buffer(ub, 100, bytemuck::cast_slice(&tint)).unwrap();
        let baseline = calls.borrow().len();
        let mut package = CommandPackage::new();
        package.bind_pipeline_state(device.allocator_mut(), pipeline);
        package.bind_binding_set_layout(device.allocator_mut(), layout);
        execute(&mut device, &package);
        let log = calls.borrow();
        assert_eq!(&log[baseline..], &[Call::SetUniformF4(7, tint.to_vec())]);
    }

    #[test]
    fn sampler_binding_applies_parameters_once() {
        let reflection = ProgramReflection {
            attributes: Vec::new(),
            uniforms: vec![uniform("u_tex", UniformType::Sampler2D, 2)],
        };
        let (mut device, calls) = device_with(reflection);
        let texture = device
            .create_texture(&TextureDescriptor {
                texture_type: TextureType::D2,
                format: PixelFormat::Rgba8Unorm,
                usage: TextureUsage::SAMPLED,
                width: 4,
                height: 4,
                depth: 1,
                array_layers: 1,
                mip_levels: 1,
                flags: TextureFlags::EMPTY,
            })
            .unwrap();
        let view = device
            .create_texture_view(&TextureViewDescriptor {
                texture,
                view_type: TextureType::D2,
                format: None,
                base_mip: 0,
                level_count: 1,
            })
            .unwrap();
        let sampler = device.create_sampler(&SamplerDescriptor::default()).unwrap();
        let shader = device.create_shader(&shader_descriptor(Vec::new())).unwrap();
        let pass = device.create_render_pass(&RenderPassDescriptor::default()).unwrap();
        let pipeline =
            device.create_pipeline_state(&pipeline_descriptor(shader, pass)).unwrap();
        let layout = device
            .create_binding_set_layout(&BindingSetLayoutDescriptor {
                bindings: vec![BindingUnit {
                    slot: 0,
                    resource: BindingResource::Sampler { texture_view: view, sampler },
                }],
            })
            .unwrap();

        let baseline = calls.borrow().len();
        let mut package = CommandPackage::new();
        package.bind_pipeline_state(device.allocator_mut(), pipeline);
        package.bind_binding_set_layout(device.allocator_mut(), layout);
        execute(&mut device, &package);
        {
            let log = calls.borrow();
            let window = &log[baseline..];
            assert!(window.iter().any(|c| matches!(c, Call::BindTexture(0, Some(_)))));
            assert!(window.contains(&Call::ApplySampler(0)));
        }

        let baseline = calls.borrow().len();
        let mut package = CommandPackage::new();
        package.bind_pipeline_state(device.allocator_mut(), pipeline);
        package.bind_binding_set_layout(device.allocator_mut(), layout);
        execute(&mut device, &package);
        assert_eq!(calls.borrow().len(), baseline, "cached texture bind must be elided");
    }

    #[test]
    fn binding_slot_without_matching_block_is_skipped() {
        let (mut device, calls) = device_with(ProgramReflection::default());
        let shader = device.create_shader(&shader_descriptor(Vec::new())).unwrap();
        let pass = device.create_render_pass(&RenderPassDescriptor::default()).unwrap();
        let pipeline =
            device.create_pipeline_state(&pipeline_descriptor(shader, pass)).unwrap();
        let ub = device
            .create_buffer(&BufferDescriptor {
                usage: BufferUsage::UNIFORM,
                memory: MemoryUsage::HOST,
                size: 16,
                stride: 0,
            })
            .unwrap();
        let layout = device
            .create_binding_set_layout(&BindingSetLayoutDescriptor {
                bindings: vec![BindingUnit {
                    slot: 3,
                    resource: BindingResource::UniformBuffer(ub),
                }],
            })
            .unwrap();

        let baseline = calls.borrow().len();
        let mut package = CommandPackage::new();
        package.bind_pipeline_state(device.allocator_mut(), pipeline);
        package.bind_binding_set_layout(device.allocator_mut(), layout);
        execute(&mut device, &package);
        let log = calls.borrow();
        assert!(!log[baseline..].iter().any(|c| matches!(
            c,
            Call::SetUniformF1(..) | Call::SetUniformF4(..) | Call::SetUniformMat4(..)
        )));
    }

    #[test]
    fn begin_render_pass_clears_per_load_ops() {
        let (mut device, calls) = device_with(ProgramReflection::default());
        let pass = device
            .create_render_pass(&RenderPassDescriptor {
                color_attachments: vec![ColorAttachmentDescriptor {
                    format: PixelFormat::Rgba8Unorm,
                    load_op: LoadOp::Clear,
                    store_op: StoreOp::Store,
                }],
                depth_stencil_attachment: Some(DepthStencilAttachmentDescriptor {
                    format: PixelFormat::Depth24UnormStencil8,
                    depth_load_op: LoadOp::Clear,
                    depth_store_op: StoreOp::Store,
                    stencil_load_op: LoadOp::Load,
                    stencil_store_op: StoreOp::Store,
                }),
            })
            .unwrap();
        let framebuffer = device
            .create_framebuffer(&FramebufferDescriptor {
                render_pass: pass,
                color_views: vec![None],
                depth_stencil_view: None,
                offscreen: true,
            })
            .unwrap();

        let area = Rect2D::new(0, 0, 640, 480);
        let color = LinearRgba::new(0.1, 0.2, 0.3, 1.0);
        let baseline = calls.borrow().len();
        let mut package = CommandPackage::new();
        package.begin_render_pass(device.allocator_mut(), framebuffer, area, color, 1.0, 0);
        execute(&mut device, &package);

        let log = calls.borrow();
        assert_eq!(
            &log[baseline..],
            &[
                Call::BindFramebuffer(None),
                Call::SetViewport(area),
                Call::SetScissor(area),
                Call::Clear(Some(color), Some(1.0), None),
            ]
        );
    }

    #[test]
    fn shader_stages_are_released_after_link() {
        let (mut device, calls) = device_with(ProgramReflection::default());
        device.create_shader(&shader_descriptor(Vec::new())).unwrap();
        let log = calls.borrow();
        let link = log.iter().position(|c| matches!(c, Call::LinkProgram(_))).unwrap();
        let first_delete = log.iter().position(|c| matches!(c, Call::DeleteStage(_))).unwrap();
        assert!(link < first_delete, "stages must outlive the link");
        assert_eq!(log.iter().filter(|c| matches!(c, Call::DeleteStage(_))).count(), 2);
    }

    #[test]
    fn compile_failure_releases_earlier_stages() {
        let (mut driver, calls) = RecordingDriver::new();
        driver.fail_compile = Some(ShaderStageKind::Fragment);
        let mut device = Device::new(Box::new(driver));
        let result = device.create_shader(&shader_descriptor(Vec::new()));
        assert!(matches!(
            result,
            Err(ResourceError::Shader(ShaderError::CompilationError { .. }))
        ));
        let log = calls.borrow();
        // The vertex stage compiled before the fragment stage failed; it must
        // be released, and no link may be attempted.
        assert_eq!(log.iter().filter(|c| matches!(c, Call::DeleteStage(_))).count(), 1);
        assert!(!log.iter().any(|c| matches!(c, Call::LinkProgram(_))));
    }

    #[test]
    #[should_panic(expected = "command package replayed after clear")]
    fn replaying_a_cleared_package_is_caught_in_debug() {
        let (mut device, _calls) = device_with(ProgramReflection::default());
        let mut package = CommandPackage::new();
        package.draw(device.allocator_mut(), 0, 3, 0, 0);
        let stale_tags = package.tags.clone();
        package.clear(device.allocator_mut());
        // A stale tag sequence held across a clear points at drained records.
        package.tags = stale_tags;
        execute(&mut device, &package);
    }

    #[test]
    fn link_failure_still_releases_stages() {
        let (mut driver, calls) = RecordingDriver::new();
        driver.fail_link = true;
        let mut device = Device::new(Box::new(driver));
        let result = device.create_shader(&shader_descriptor(Vec::new()));
        assert!(matches!(
            result,
            Err(ResourceError::Shader(ShaderError::LinkError { .. }))
        ));
        let log = calls.borrow();
        assert_eq!(log.iter().filter(|c| matches!(c, Call::DeleteStage(_))).count(), 2);
    }

    #[test]
    fn shader_macros_are_prepended_as_defines() {
        let (mut device, calls) = device_with(ProgramReflection::default());
        device
            .create_shader(&ShaderDescriptor {
                name: "fog".to_string(),
                stages: vec![ShaderStageDescriptor {
                    stage: ShaderStageKind::Vertex,
                    source: "void main() {}".to_string(),
                    macros: vec!["USE_FOG".to_string(), "SKINNED".to_string()],
                }],
                blocks: Vec::new(),
            })
            .unwrap();
        let log = calls.borrow();
        let source = log
            .iter()
            .find_map(|c| match c {
                Call::CompileStage(_, source) => Some(source.clone()),
                _ => None,
            })
            .unwrap();
        assert!(source.starts_with("#define USE_FOG\n#define SKINNED\n"));
        assert!(source.ends_with("void main() {}"));
    }

    #[test]
    fn degraded_buffer_update_is_a_noop() {
        let (mut driver, calls) = RecordingDriver::new();
        driver.fail_buffer_create = true;
        let mut device = Device::new(Box::new(driver));
        let buffer = device
            .create_buffer(&BufferDescriptor {
                usage: BufferUsage::VERTEX,
                memory: MemoryUsage::DEVICE,
                size: 64,
                stride: 16,
            })
            .unwrap();

        let mut package = CommandPackage::new();
        package.update_buffer(device.allocator_mut(), buffer, 0, &[0u8; 16]);
        execute(&mut device, &package);
        assert!(!calls.borrow().iter().any(|c| matches!(c, Call::UploadBuffer(..))));
    }
}
