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

//! Resource realization: turning descriptor records into native driver state.
//!
//! A resource that fails realization is left degraded (`native == None`) and
//! every later operation against it logs and no-ops. Binding calls made here
//! go through the cached helpers so the [`StateCache`] stays truthful.

use std::collections::HashMap;

use log::{error, warn};

use crate::driver::{BufferTarget, DriverContext, NativeBuffer, NativeTexture};
use crate::error::{ResourceError, ShaderError};
use crate::format::{self, PixelFormat};
use crate::resource::{
    Buffer, BufferId, BufferUsage, Framebuffer, InputAssembler, MemoryUsage, ResolvedAttribute,
    Shader, ShaderSampler, ShaderStageDescriptor, Texture, TextureId, TextureType, TextureView,
    TextureViewId, UniformBlock, UniformEntry,
};
use crate::state::{StateCache, MAX_TEXTURE_UNITS};

/// Binds a buffer to a target, skipping the call when the cache already
/// mirrors the requested binding.
pub(crate) fn bind_buffer_cached(
    driver: &mut dyn DriverContext,
    cache: &mut StateCache,
    target: BufferTarget,
    native: Option<NativeBuffer>,
) {
    let slot = match target {
        BufferTarget::Vertex => &mut cache.array_buffer,
        BufferTarget::Index => &mut cache.element_buffer,
    };
    if *slot != native {
        driver.bind_buffer(target, native);
        *slot = native;
    }
}

/// Binds a texture to a unit, skipping the call when the cache already
/// mirrors the requested binding. Returns whether a call was issued.
pub(crate) fn bind_texture_cached(
    driver: &mut dyn DriverContext,
    cache: &mut StateCache,
    unit: u32,
    target: TextureType,
    native: Option<NativeTexture>,
) -> bool {
    let slot = unit as usize;
    if slot >= MAX_TEXTURE_UNITS {
        warn!("texture unit {unit} is beyond the tracked range; binding skipped");
        return false;
    }
    if cache.textures[slot] != native {
        driver.bind_texture(unit, target, native);
        cache.textures[slot] = native;
        true
    } else {
        false
    }
}

/// Allocates native storage for a buffer, or a CPU backing store for uniform
/// buffers, which this backend tier has no native target for.
pub(crate) fn realize_buffer(
    driver: &mut dyn DriverContext,
    cache: &mut StateCache,
    buffer: &mut Buffer,
) {
    if buffer.usage.contains(BufferUsage::UNIFORM) {
        error!("uniform buffers have no native binding target on this tier; emulating host-side");
        buffer.backing = Some(vec![0; buffer.size as usize]);
        return;
    }
    let target = if buffer.usage.contains(BufferUsage::INDEX) {
        BufferTarget::Index
    } else if buffer.usage.contains(BufferUsage::VERTEX) {
        BufferTarget::Vertex
    } else {
        warn!("buffer usage {:?} maps to no binding target; buffer left degraded", buffer.usage);
        return;
    };
    let Some(native) = driver.create_buffer() else {
        warn!("driver failed to allocate a buffer handle; buffer left degraded");
        return;
    };
    bind_buffer_cached(driver, cache, target, Some(native));
    driver.allocate_buffer(target, buffer.size, buffer.memory.contains(MemoryUsage::HOST));
    buffer.native = Some(native);
    buffer.target = Some(target);
}

/// Writes bytes into a buffer: into the backing store for emulated uniform
/// buffers, through the driver otherwise. Degraded buffers log and no-op.
pub(crate) fn write_buffer(
    driver: &mut dyn DriverContext,
    cache: &mut StateCache,
    buffer: &mut Buffer,
    offset: u64,
    data: &[u8],
) -> Result<(), ResourceError> {
    if offset + data.len() as u64 > buffer.size {
        return Err(ResourceError::OutOfBounds);
    }
    if let Some(backing) = &mut buffer.backing {
        let start = offset as usize;
        backing[start..start + data.len()].copy_from_slice(data);
        return Ok(());
    }
    match (buffer.native, buffer.target) {
        (Some(native), Some(target)) => {
            bind_buffer_cached(driver, cache, target, Some(native));
            driver.upload_buffer(target, offset, data);
            Ok(())
        }
        _ => {
            warn!("write into a degraded buffer ignored");
            Ok(())
        }
    }
}

fn face_count(texture_type: TextureType) -> u32 {
    match texture_type {
        TextureType::D2 => 1,
        TextureType::Cube => 6,
    }
}

/// Allocates a native texture and every mip level of every face. Compressed
/// formats get zero-length placeholder levels until real data is uploaded.
pub(crate) fn realize_texture(
    driver: &mut dyn DriverContext,
    cache: &mut StateCache,
    texture: &mut Texture,
) {
    let native_format = driver.texture_format(texture.format).or_else(|| {
        error!(
            "pixel format {:?} is unsupported by the driver; substituting {:?}",
            texture.format,
            PixelFormat::Rgba8Unorm
        );
        driver.texture_format(PixelFormat::Rgba8Unorm)
    });
    let Some(native_format) = native_format else {
        warn!("no usable native format; texture left degraded");
        return;
    };
    let Some(native) = driver.create_texture() else {
        warn!("driver failed to allocate a texture handle; texture left degraded");
        return;
    };
    // Level allocation goes through unit 0.
    bind_texture_cached(driver, cache, 0, texture.texture_type, Some(native));
    let compressed = texture.format.is_compressed();
    let mut width = texture.width;
    let mut height = texture.height;
    for level in 0..texture.mip_levels {
        for face in 0..face_count(texture.texture_type) {
            if compressed {
                driver.upload_compressed_texture_level(
                    texture.texture_type,
                    face,
                    level,
                    native_format,
                    width,
                    height,
                    &[],
                );
            } else {
                driver.allocate_texture_level(
                    texture.texture_type,
                    face,
                    level,
                    native_format,
                    width,
                    height,
                );
            }
        }
        width = (width / 2).max(1);
        height = (height / 2).max(1);
    }
    // Leave unit 0 unbound so later sampler binds are never elided against
    // this scratch binding.
    bind_texture_cached(driver, cache, 0, texture.texture_type, None);
    texture.native = Some(native);
    texture.native_format = Some(native_format);
}

/// Uploads pixel data into one face/level of a realized texture.
pub(crate) fn write_texture(
    driver: &mut dyn DriverContext,
    cache: &mut StateCache,
    texture: &mut Texture,
    face: u32,
    level: u32,
    data: &[u8],
) -> Result<(), ResourceError> {
    if level >= texture.mip_levels || face >= face_count(texture.texture_type) {
        return Err(ResourceError::OutOfBounds);
    }
    let (Some(native), Some(native_format)) = (texture.native, texture.native_format) else {
        warn!("write into a degraded texture ignored");
        return Ok(());
    };
    let width = (texture.width >> level).max(1);
    let height = (texture.height >> level).max(1);
    if (data.len() as u64) < format::texture_size(texture.format, width, height, 1) {
        return Err(ResourceError::OutOfBounds);
    }
    bind_texture_cached(driver, cache, 0, texture.texture_type, Some(native));
    if texture.format.is_compressed() {
        driver.upload_compressed_texture_level(
            texture.texture_type,
            face,
            level,
            native_format,
            width,
            height,
            data,
        );
    } else {
        driver.upload_texture_level(
            texture.texture_type,
            face,
            level,
            native_format,
            width,
            height,
            data,
        );
    }
    bind_texture_cached(driver, cache, 0, texture.texture_type, None);
    Ok(())
}

/// Allocates a native framebuffer and attaches its texture views. Offscreen
/// framebuffers stand for the default target and allocate nothing.
pub(crate) fn realize_framebuffer(
    driver: &mut dyn DriverContext,
    framebuffer: &mut Framebuffer,
    views: &HashMap<TextureViewId, TextureView>,
    textures: &HashMap<TextureId, Texture>,
) {
    if framebuffer.offscreen {
        return;
    }
    let Some(native) = driver.create_framebuffer() else {
        warn!("driver failed to allocate a framebuffer handle; framebuffer left degraded");
        return;
    };
    driver.bind_framebuffer(Some(native));
    for (index, view_id) in framebuffer.color_views.iter().enumerate() {
        let Some(view_id) = view_id else { continue };
        let Some((view, texture)) = lookup_attachment(*view_id, views, textures) else {
            warn!("color attachment {index} references a missing view or texture");
            continue;
        };
        let Some(tex_native) = texture.native else {
            warn!("color attachment {index} references a degraded texture");
            continue;
        };
        driver.attach_color(index as u32, tex_native, view.base_mip);
    }
    if let Some(view_id) = framebuffer.depth_stencil_view {
        match lookup_attachment(view_id, views, textures) {
            Some((view, texture)) => match texture.native {
                Some(tex_native) => {
                    let attach_format = view.format.unwrap_or(texture.format);
                    driver.attach_depth_stencil(
                        attach_format.has_stencil(),
                        tex_native,
                        view.base_mip,
                    );
                }
                None => warn!("depth-stencil attachment references a degraded texture"),
            },
            None => warn!("depth-stencil attachment references a missing view or texture"),
        }
    }
    framebuffer.native = Some(native);
}

fn lookup_attachment<'a>(
    view_id: TextureViewId,
    views: &'a HashMap<TextureViewId, TextureView>,
    textures: &'a HashMap<TextureId, Texture>,
) -> Option<(&'a TextureView, &'a Texture)> {
    let view = views.get(&view_id)?;
    let texture = textures.get(&view.texture)?;
    Some((view, texture))
}

fn assemble_source(stage: &ShaderStageDescriptor) -> String {
    if stage.macros.is_empty() {
        return stage.source.clone();
    }
    let mut source = String::new();
    for name in &stage.macros {
        source.push_str("#define ");
        source.push_str(name);
        source.push('\n');
    }
    source.push_str(&stage.source);
    source
}

/// Compiles, links, and reflects a shader.
///
/// Stage objects are released only after the link so the program keeps valid
/// references throughout. Samplers get sequential texture units and their
/// uniforms are committed once here; declared uniform blocks are packed at
/// running byte offsets in declaration order.
pub(crate) fn realize_shader(
    driver: &mut dyn DriverContext,
    cache: &mut StateCache,
    shader: &mut Shader,
) -> Result<(), ShaderError> {
    let mut stages = Vec::with_capacity(shader.stages.len());
    for stage in &shader.stages {
        let source = assemble_source(stage);
        match driver.compile_stage(stage.stage, &source) {
            Ok(native) => stages.push(native),
            Err(details) => {
                for native in stages {
                    driver.delete_stage(native);
                }
                return Err(ShaderError::CompilationError { name: shader.name.clone(), details });
            }
        }
    }
    let program = match driver.link_program(&stages) {
        Ok(program) => program,
        Err(details) => {
            for native in stages {
                driver.delete_stage(native);
            }
            return Err(ShaderError::LinkError { name: shader.name.clone(), details });
        }
    };
    // The program holds the stages now; releasing them earlier would be a
    // driver-side use-after-free on some implementations.
    for native in stages {
        driver.delete_stage(native);
    }

    let reflection = driver.reflect_program(program);
    shader.inputs = reflection
        .attributes
        .iter()
        .map(|attribute| crate::resource::ShaderInput {
            name: attribute.name.clone(),
            ty: attribute.ty,
            location: attribute.location,
            size: attribute.ty.byte_size(),
        })
        .collect();

    driver.use_program(Some(program));
    cache.program = Some(program);
    let mut samplers = Vec::new();
    for uniform in reflection.uniforms.iter().filter(|uniform| uniform.ty.is_sampler()) {
        let unit = samplers.len() as u32;
        driver.set_uniform_i1(uniform.location, &[unit as i32]);
        samplers.push(ShaderSampler {
            name: uniform.name.clone(),
            ty: uniform.ty,
            location: uniform.location,
            unit,
        });
    }
    shader.samplers = samplers;

    let mut blocks = Vec::with_capacity(shader.blocks_decl.len());
    for decl in &shader.blocks_decl {
        let mut entries = Vec::new();
        let mut offset = 0u32;
        for member in &decl.members {
            let Some(uniform) = reflection.uniforms.iter().find(|u| &u.name == member) else {
                warn!("uniform '{member}' of block '{}' is not active in '{}'", decl.name, shader.name);
                continue;
            };
            entries.push(UniformEntry {
                name: uniform.name.clone(),
                ty: uniform.ty,
                count: uniform.count,
                location: uniform.location,
                offset,
            });
            offset += uniform.ty.byte_size() * uniform.count;
        }
        blocks.push(UniformBlock {
            binding: decl.binding,
            name: decl.name.clone(),
            entries,
            size: offset,
            storage: vec![0.0; (offset / 4) as usize],
            committed: false,
        });
    }
    shader.blocks = blocks;

    shader.program = Some(program);
    Ok(())
}

/// Resolves an input assembler's attribute layout against a shader's
/// reflected inputs. Byte offsets accumulate per stream in declaration order;
/// attributes the shader does not consume still advance their stream offset.
pub(crate) fn resolve_attributes(
    assembler: &InputAssembler,
    shader: &Shader,
    buffers: &HashMap<BufferId, Buffer>,
) -> Vec<ResolvedAttribute> {
    let mut offsets = vec![0u32; assembler.vertex_buffers.len()];
    let mut table = Vec::new();
    for attribute in &assembler.attributes {
        let stream = attribute.stream as usize;
        let Some(&buffer_id) = assembler.vertex_buffers.get(stream) else {
            warn!("attribute '{}' reads from missing stream {}", attribute.name, attribute.stream);
            continue;
        };
        let row_size = attribute.format.info().size;
        let input = shader.inputs.iter().find(|input| input.name == attribute.name);
        let locations = input.map(|input| input.ty.locations()).unwrap_or(1);
        let offset = offsets[stream];
        offsets[stream] += row_size * locations;
        // Inactive attributes still occupy their bytes in the vertex layout.
        let Some(input) = input else { continue };
        let stride = buffers.get(&buffer_id).map(|buffer| buffer.stride).unwrap_or(0);
        table.push(ResolvedAttribute {
            location: input.location,
            locations,
            components: attribute.format.info().channel_count as u32,
            stride,
            offset,
            row_size,
            buffer: buffer_id,
            instanced: attribute.instanced,
        });
    }
    table
}
