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

//! The device: resource factory, registry, and owner of the driver seam.
//!
//! One device per native context, single-threaded. Resources are realized
//! eagerly at creation; a resource whose native allocation fails is created
//! anyway in a degraded state and later operations against it log and no-op.
//! Handles are never reused within a device's lifetime.

use std::collections::HashMap;

use crate::command::CommandAllocator;
use crate::driver::DriverContext;
use crate::error::{ResourceError, ShaderError};
use crate::executor::realize;
use crate::resource::{
    BindingResource, BindingSetLayout, BindingSetLayoutDescriptor, BindingSetLayoutId, Buffer,
    BufferDescriptor, BufferId, Framebuffer, FramebufferDescriptor, FramebufferId, InputAssembler,
    InputAssemblerDescriptor, InputAssemblerId, PipelineState, PipelineStateDescriptor,
    PipelineStateId, RenderPass, RenderPassDescriptor, RenderPassId, ResourceKind, Sampler,
    SamplerDescriptor, SamplerId, Shader, ShaderDescriptor, ShaderId, Texture, TextureDescriptor,
    TextureId, TextureView, TextureViewDescriptor, TextureViewId,
};
use crate::state::StateCache;

/// A rendering device bound to one native context.
pub struct Device {
    pub(crate) driver: Box<dyn DriverContext>,
    pub(crate) cache: StateCache,
    pub(crate) allocator: CommandAllocator,
    pub(crate) buffers: HashMap<BufferId, Buffer>,
    pub(crate) textures: HashMap<TextureId, Texture>,
    pub(crate) texture_views: HashMap<TextureViewId, TextureView>,
    pub(crate) render_passes: HashMap<RenderPassId, RenderPass>,
    pub(crate) framebuffers: HashMap<FramebufferId, Framebuffer>,
    pub(crate) samplers: HashMap<SamplerId, Sampler>,
    pub(crate) shaders: HashMap<ShaderId, Shader>,
    pub(crate) pipelines: HashMap<PipelineStateId, PipelineState>,
    pub(crate) binding_set_layouts: HashMap<BindingSetLayoutId, BindingSetLayout>,
    pub(crate) input_assemblers: HashMap<InputAssemblerId, InputAssembler>,
    pub(crate) next_id: usize,
}

impl Device {
    /// Creates a device over a native driver context. The state cache starts
    /// as the context defaults, which a freshly created context matches.
    pub fn new(driver: Box<dyn DriverContext>) -> Self {
        Self {
            driver,
            cache: StateCache::new(),
            allocator: CommandAllocator::new(),
            buffers: HashMap::new(),
            textures: HashMap::new(),
            texture_views: HashMap::new(),
            render_passes: HashMap::new(),
            framebuffers: HashMap::new(),
            samplers: HashMap::new(),
            shaders: HashMap::new(),
            pipelines: HashMap::new(),
            binding_set_layouts: HashMap::new(),
            input_assemblers: HashMap::new(),
            next_id: 1,
        }
    }

    fn next_id(&mut self) -> usize {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// The device's command allocator, for recording into packages.
    pub fn allocator_mut(&mut self) -> &mut CommandAllocator {
        &mut self.allocator
    }

    /// The mirrored driver state, read-only.
    pub fn state_cache(&self) -> &StateCache {
        &self.cache
    }

    /// Direct access to the driver seam. Calls made through this bypass the
    /// state cache; useful for backend-specific setup and tests only.
    pub fn driver_mut(&mut self) -> &mut dyn DriverContext {
        self.driver.as_mut()
    }

    // --- Buffers ---

    /// Creates and realizes a buffer.
    pub fn create_buffer(&mut self, descriptor: &BufferDescriptor) -> Result<BufferId, ResourceError> {
        let mut buffer = Buffer::new(descriptor);
        realize::realize_buffer(self.driver.as_mut(), &mut self.cache, &mut buffer);
        let id = BufferId(self.next_id());
        self.buffers.insert(id, buffer);
        Ok(id)
    }

    /// Writes bytes into a buffer, immediately.
    pub fn update_buffer(
        &mut self,
        buffer: BufferId,
        offset: u64,
        data: &[u8],
    ) -> Result<(), ResourceError> {
        let buffer =
            self.buffers.get_mut(&buffer).ok_or(ResourceError::NotFound(ResourceKind::Buffer))?;
        realize::write_buffer(self.driver.as_mut(), &mut self.cache, buffer, offset, data)
    }

    /// Destroys a buffer and releases its native handle.
    pub fn destroy_buffer(&mut self, buffer: BufferId) -> Result<(), ResourceError> {
        let buffer =
            self.buffers.remove(&buffer).ok_or(ResourceError::NotFound(ResourceKind::Buffer))?;
        if let Some(native) = buffer.native {
            // Deleting a bound buffer unbinds it driver-side; mirror that.
            if self.cache.array_buffer == Some(native) {
                self.cache.array_buffer = None;
            }
            if self.cache.element_buffer == Some(native) {
                self.cache.element_buffer = None;
            }
            self.driver.delete_buffer(native);
        }
        Ok(())
    }

    // --- Textures, views, samplers ---

    /// Creates and realizes a texture, allocating every face and mip level.
    pub fn create_texture(
        &mut self,
        descriptor: &TextureDescriptor,
    ) -> Result<TextureId, ResourceError> {
        let mut texture = Texture::new(descriptor);
        realize::realize_texture(self.driver.as_mut(), &mut self.cache, &mut texture);
        let id = TextureId(self.next_id());
        self.textures.insert(id, texture);
        Ok(id)
    }

    /// Uploads pixel data into one face and mip level of a texture.
    pub fn update_texture(
        &mut self,
        texture: TextureId,
        face: u32,
        level: u32,
        data: &[u8],
    ) -> Result<(), ResourceError> {
        let texture = self
            .textures
            .get_mut(&texture)
            .ok_or(ResourceError::NotFound(ResourceKind::Texture))?;
        realize::write_texture(self.driver.as_mut(), &mut self.cache, texture, face, level, data)
    }

    /// Destroys a texture and releases its native handle. Views into the
    /// texture become dangling; destroying them first is the caller's job.
    pub fn destroy_texture(&mut self, texture: TextureId) -> Result<(), ResourceError> {
        let texture =
            self.textures.remove(&texture).ok_or(ResourceError::NotFound(ResourceKind::Texture))?;
        if let Some(native) = texture.native {
            for slot in self.cache.textures.iter_mut() {
                if *slot == Some(native) {
                    *slot = None;
                }
            }
            self.driver.delete_texture(native);
        }
        Ok(())
    }

    /// Creates a view into a texture's mip range.
    pub fn create_texture_view(
        &mut self,
        descriptor: &TextureViewDescriptor,
    ) -> Result<TextureViewId, ResourceError> {
        if !self.textures.contains_key(&descriptor.texture) {
            return Err(ResourceError::InvalidHandle);
        }
        let id = TextureViewId(self.next_id());
        self.texture_views.insert(id, TextureView::new(descriptor));
        Ok(id)
    }

    /// Destroys a texture view.
    pub fn destroy_texture_view(&mut self, view: TextureViewId) -> Result<(), ResourceError> {
        self.texture_views
            .remove(&view)
            .map(|_| ())
            .ok_or(ResourceError::NotFound(ResourceKind::TextureView))
    }

    /// Creates a sampler state object.
    pub fn create_sampler(
        &mut self,
        descriptor: &SamplerDescriptor,
    ) -> Result<SamplerId, ResourceError> {
        let id = SamplerId(self.next_id());
        self.samplers.insert(id, Sampler::new(descriptor));
        Ok(id)
    }

    /// Destroys a sampler.
    pub fn destroy_sampler(&mut self, sampler: SamplerId) -> Result<(), ResourceError> {
        self.samplers
            .remove(&sampler)
            .map(|_| ())
            .ok_or(ResourceError::NotFound(ResourceKind::Sampler))
    }

    // --- Render passes and framebuffers ---

    /// Creates a render pass.
    pub fn create_render_pass(
        &mut self,
        descriptor: &RenderPassDescriptor,
    ) -> Result<RenderPassId, ResourceError> {
        let id = RenderPassId(self.next_id());
        self.render_passes.insert(id, RenderPass::new(descriptor));
        Ok(id)
    }

    /// Destroys a render pass. Framebuffers and pipelines referencing it must
    /// go first.
    pub fn destroy_render_pass(&mut self, pass: RenderPassId) -> Result<(), ResourceError> {
        self.render_passes
            .remove(&pass)
            .map(|_| ())
            .ok_or(ResourceError::NotFound(ResourceKind::RenderPass))
    }

    /// Creates and realizes a framebuffer, attaching its texture views.
    pub fn create_framebuffer(
        &mut self,
        descriptor: &FramebufferDescriptor,
    ) -> Result<FramebufferId, ResourceError> {
        if !self.render_passes.contains_key(&descriptor.render_pass) {
            return Err(ResourceError::InvalidHandle);
        }
        let mut framebuffer = Framebuffer::new(descriptor);
        realize::realize_framebuffer(
            self.driver.as_mut(),
            &mut framebuffer,
            &self.texture_views,
            &self.textures,
        );
        let id = FramebufferId(self.next_id());
        self.framebuffers.insert(id, framebuffer);
        Ok(id)
    }

    /// Destroys a framebuffer and releases its native handle.
    pub fn destroy_framebuffer(&mut self, framebuffer: FramebufferId) -> Result<(), ResourceError> {
        let framebuffer = self
            .framebuffers
            .remove(&framebuffer)
            .ok_or(ResourceError::NotFound(ResourceKind::Framebuffer))?;
        if let Some(native) = framebuffer.native {
            self.driver.delete_framebuffer(native);
        }
        Ok(())
    }

    // --- Shaders and pipelines ---

    /// Creates, compiles, links, and reflects a shader. Compile and link
    /// failures surface here with the driver's diagnostics; the shader is not
    /// registered on failure.
    pub fn create_shader(
        &mut self,
        descriptor: &ShaderDescriptor,
    ) -> Result<ShaderId, ResourceError> {
        let mut shader = Shader::new(descriptor);
        realize::realize_shader(self.driver.as_mut(), &mut self.cache, &mut shader)?;
        let id = ShaderId(self.next_id());
        self.shaders.insert(id, shader);
        Ok(id)
    }

    /// Destroys a shader and releases its program.
    pub fn destroy_shader(&mut self, shader: ShaderId) -> Result<(), ResourceError> {
        let shader =
            self.shaders.remove(&shader).ok_or(ResourceError::NotFound(ResourceKind::Shader))?;
        if let Some(program) = shader.program {
            if self.cache.program == Some(program) {
                self.driver.use_program(None);
                self.cache.program = None;
            }
            self.driver.delete_program(program);
        }
        Ok(())
    }

    /// Creates a pipeline state object.
    pub fn create_pipeline_state(
        &mut self,
        descriptor: &PipelineStateDescriptor,
    ) -> Result<PipelineStateId, ResourceError> {
        if !self.shaders.contains_key(&descriptor.shader) {
            return Err(ShaderError::NotFound { id: descriptor.shader }.into());
        }
        if !self.render_passes.contains_key(&descriptor.render_pass) {
            return Err(ResourceError::InvalidHandle);
        }
        let id = PipelineStateId(self.next_id());
        self.pipelines.insert(id, PipelineState::new(descriptor));
        Ok(id)
    }

    /// Destroys a pipeline state object.
    pub fn destroy_pipeline_state(
        &mut self,
        pipeline: PipelineStateId,
    ) -> Result<(), ResourceError> {
        self.pipelines
            .remove(&pipeline)
            .map(|_| ())
            .ok_or(ResourceError::NotFound(ResourceKind::PipelineState))
    }

    // --- Binding set layouts and input assemblers ---

    /// Creates a binding set layout. Every referenced resource must exist at
    /// creation time.
    pub fn create_binding_set_layout(
        &mut self,
        descriptor: &BindingSetLayoutDescriptor,
    ) -> Result<BindingSetLayoutId, ResourceError> {
        for unit in &descriptor.bindings {
            let valid = match unit.resource {
                BindingResource::UniformBuffer(buffer) => self.buffers.contains_key(&buffer),
                BindingResource::Sampler { texture_view, sampler } => {
                    self.texture_views.contains_key(&texture_view)
                        && self.samplers.contains_key(&sampler)
                }
            };
            if !valid {
                return Err(ResourceError::InvalidHandle);
            }
        }
        let id = BindingSetLayoutId(self.next_id());
        self.binding_set_layouts.insert(id, BindingSetLayout::new(descriptor));
        Ok(id)
    }

    /// Destroys a binding set layout.
    pub fn destroy_binding_set_layout(
        &mut self,
        layout: BindingSetLayoutId,
    ) -> Result<(), ResourceError> {
        self.binding_set_layouts
            .remove(&layout)
            .map(|_| ())
            .ok_or(ResourceError::NotFound(ResourceKind::BindingSetLayout))
    }

    /// Creates an input assembler. Every referenced buffer must exist at
    /// creation time.
    pub fn create_input_assembler(
        &mut self,
        descriptor: &InputAssemblerDescriptor,
    ) -> Result<InputAssemblerId, ResourceError> {
        for buffer in descriptor.vertex_buffers.iter().chain(descriptor.index_buffer.iter()) {
            if !self.buffers.contains_key(buffer) {
                return Err(ResourceError::InvalidHandle);
            }
        }
        let id = InputAssemblerId(self.next_id());
        self.input_assemblers.insert(id, InputAssembler::new(descriptor));
        Ok(id)
    }

    /// Destroys an input assembler.
    pub fn destroy_input_assembler(
        &mut self,
        assembler: InputAssemblerId,
    ) -> Result<(), ResourceError> {
        self.input_assemblers
            .remove(&assembler)
            .map(|_| ())
            .ok_or(ResourceError::NotFound(ResourceKind::InputAssembler))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::PixelFormat;
    use crate::resource::{BufferUsage, MemoryUsage, TextureFlags, TextureType, TextureUsage};
    use crate::test_driver::{Call, RecordingDriver};

    fn vertex_buffer_descriptor(size: u64) -> BufferDescriptor {
        BufferDescriptor {
            usage: BufferUsage::VERTEX,
            memory: MemoryUsage::DEVICE,
            size,
            stride: 16,
        }
    }

    #[test]
    fn double_destroy_reports_not_found() {
        let (driver, _calls) = RecordingDriver::new();
        let mut device = Device::new(Box::new(driver));
        let buffer = device.create_buffer(&vertex_buffer_descriptor(64)).unwrap();
        assert!(device.destroy_buffer(buffer).is_ok());
        assert!(matches!(
            device.destroy_buffer(buffer),
            Err(ResourceError::NotFound(ResourceKind::Buffer))
        ));
    }

    #[test]
    fn update_buffer_checks_bounds() {
        let (driver, _calls) = RecordingDriver::new();
        let mut device = Device::new(Box::new(driver));
        let buffer = device.create_buffer(&vertex_buffer_descriptor(16)).unwrap();
        assert!(device.update_buffer(buffer, 0, &[0u8; 16]).is_ok());
        assert!(matches!(
            device.update_buffer(buffer, 8, &[0u8; 16]),
            Err(ResourceError::OutOfBounds)
        ));
    }

    #[test]
    fn uniform_buffers_are_emulated_host_side() {
        let (driver, calls) = RecordingDriver::new();
        let mut device = Device::new(Box::new(driver));
        let buffer = device
            .create_buffer(&BufferDescriptor {
                usage: BufferUsage::UNIFORM,
                memory: MemoryUsage::HOST,
                size: 32,
                stride: 0,
            })
            .unwrap();
        assert!(!calls.borrow().iter().any(|call| matches!(call, Call::CreateBuffer)));
        let stored = &device.buffers[&buffer];
        assert!(stored.native.is_none());
        assert_eq!(stored.backing.as_ref().map(Vec::len), Some(32));

        device.update_buffer(buffer, 4, &[0xab; 8]).unwrap();
        let stored = &device.buffers[&buffer];
        assert_eq!(stored.backing.as_ref().unwrap()[4], 0xab);
        assert!(!calls.borrow().iter().any(|call| matches!(call, Call::UploadBuffer(..))));
    }

    #[test]
    fn texture_view_requires_live_texture() {
        let (driver, _calls) = RecordingDriver::new();
        let mut device = Device::new(Box::new(driver));
        let result = device.create_texture_view(&TextureViewDescriptor {
            texture: TextureId(999),
            view_type: TextureType::D2,
            format: None,
            base_mip: 0,
            level_count: 1,
        });
        assert!(matches!(result, Err(ResourceError::InvalidHandle)));
    }

    #[test]
    fn texture_realization_allocates_full_mip_chain() {
        let (driver, calls) = RecordingDriver::new();
        let mut device = Device::new(Box::new(driver));
        device
            .create_texture(&TextureDescriptor {
                texture_type: TextureType::D2,
                format: PixelFormat::Rgba8Unorm,
                usage: TextureUsage::SAMPLED,
                width: 8,
                height: 4,
                depth: 1,
                array_layers: 1,
                mip_levels: 4,
                flags: TextureFlags::EMPTY,
            })
            .unwrap();
        let levels: Vec<(u32, u32, u32)> = calls
            .borrow()
            .iter()
            .filter_map(|call| match call {
                Call::AllocateTextureLevel { level, width, height, .. } => {
                    Some((*level, *width, *height))
                }
                _ => None,
            })
            .collect();
        assert_eq!(levels, vec![(0, 8, 4), (1, 4, 2), (2, 2, 1), (3, 1, 1)]);
    }

    #[test]
    fn cube_texture_allocates_six_faces_per_level() {
        let (driver, calls) = RecordingDriver::new();
        let mut device = Device::new(Box::new(driver));
        device
            .create_texture(&TextureDescriptor {
                texture_type: TextureType::Cube,
                format: PixelFormat::Rgba8Unorm,
                usage: TextureUsage::SAMPLED,
                width: 16,
                height: 16,
                depth: 1,
                array_layers: 1,
                mip_levels: 2,
                flags: TextureFlags::EMPTY,
            })
            .unwrap();
        let count = calls
            .borrow()
            .iter()
            .filter(|call| matches!(call, Call::AllocateTextureLevel { .. }))
            .count();
        assert_eq!(count, 12);
    }

    #[test]
    fn offscreen_framebuffer_skips_native_allocation() {
        let (driver, calls) = RecordingDriver::new();
        let mut device = Device::new(Box::new(driver));
        let pass = device.create_render_pass(&RenderPassDescriptor::default()).unwrap();
        let framebuffer = device
            .create_framebuffer(&FramebufferDescriptor {
                render_pass: pass,
                color_views: vec![None],
                depth_stencil_view: None,
                offscreen: true,
            })
            .unwrap();
        assert!(device.framebuffers[&framebuffer].native.is_none());
        assert!(!calls.borrow().iter().any(|call| matches!(call, Call::CreateFramebuffer)));
    }
}
