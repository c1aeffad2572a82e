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

//! A recording driver for tests: every call is appended to a shared log so
//! tests can assert on the exact call sequence the executor produced.

use std::cell::RefCell;
use std::rc::Rc;

use crate::driver::{
    BufferTarget, DriverContext, IndexKind, NativeBuffer, NativeFramebuffer, NativeProgram,
    NativeStage, NativeTexFormat, NativeTexture, ProgramReflection,
};
use crate::format::PixelFormat;
use crate::math::{LinearRgba, Rect2D};
use crate::resource::{
    BlendFactor, BlendOperation, ColorWrites, CompareFunction, CullMode, FrontFace,
    PrimitiveTopology, SamplerDescriptor, ShaderStageKind, StencilFace, StencilOperation,
    TextureType,
};

/// One recorded driver call.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Call {
    CreateBuffer,
    DeleteBuffer(u64),
    BindBuffer(BufferTarget, Option<u64>),
    AllocateBuffer(BufferTarget, u64, bool),
    UploadBuffer(BufferTarget, u64, usize),
    CreateTexture,
    DeleteTexture(u64),
    BindTexture(u32, Option<u64>),
    AllocateTextureLevel { face: u32, level: u32, width: u32, height: u32 },
    UploadTextureLevel { face: u32, level: u32, len: usize },
    UploadCompressedTextureLevel { face: u32, level: u32, len: usize },
    ApplySampler(u32),
    CreateFramebuffer,
    DeleteFramebuffer(u64),
    BindFramebuffer(Option<u64>),
    AttachColor(u32, u64, u32),
    AttachDepthStencil(bool, u64, u32),
    CompileStage(ShaderStageKind, String),
    DeleteStage(u64),
    LinkProgram(usize),
    DeleteProgram(u64),
    ReflectProgram(u64),
    UseProgram(Option<u64>),
    SetCullMode(CullMode),
    SetFrontFace(FrontFace),
    SetDepthBias(f32, f32),
    SetLineWidth(f32),
    SetDepthTest(bool),
    SetDepthWrite(bool),
    SetDepthCompare(CompareFunction),
    SetStencilTest(bool),
    SetStencilFunc(StencilFace, CompareFunction, u32, u32),
    SetStencilOps(StencilFace, StencilOperation, StencilOperation, StencilOperation),
    SetStencilWriteMask(StencilFace, u32),
    SetAlphaToCoverage(bool),
    SetBlendEnabled(bool),
    SetBlendConstant(LinearRgba),
    SetBlendEquation(BlendOperation, BlendOperation),
    SetBlendFactors(BlendFactor, BlendFactor, BlendFactor, BlendFactor),
    SetColorWriteMask(ColorWrites),
    SetViewport(Rect2D),
    SetScissor(Rect2D),
    Clear(Option<LinearRgba>, Option<f32>, Option<u32>),
    EnableAttribute(u32),
    DisableAttribute(u32),
    AttributePointer { location: u32, components: u32, stride: u32, offset: u32, instanced: bool },
    DrawArrays(PrimitiveTopology, u32, u32),
    DrawElements(PrimitiveTopology, IndexKind, u32, u64),
    SetUniformF1(i32, Vec<f32>),
    SetUniformF2(i32, Vec<f32>),
    SetUniformF3(i32, Vec<f32>),
    SetUniformF4(i32, Vec<f32>),
    SetUniformI1(i32, Vec<i32>),
    SetUniformI2(i32, Vec<i32>),
    SetUniformI3(i32, Vec<i32>),
    SetUniformI4(i32, Vec<i32>),
    SetUniformMat2(i32, Vec<f32>),
    SetUniformMat3(i32, Vec<f32>),
    SetUniformMat4(i32, Vec<f32>),
}

/// A driver that records every call and hands out sequential handles.
pub(crate) struct RecordingDriver {
    pub calls: Rc<RefCell<Vec<Call>>>,
    pub reflection: ProgramReflection,
    /// Fail compilation of the given stage kind, leaving other stages intact.
    pub fail_compile: Option<ShaderStageKind>,
    pub fail_link: bool,
    pub fail_buffer_create: bool,
    next_handle: u64,
}

impl RecordingDriver {
    /// Creates a driver plus a handle onto its shared call log.
    pub fn new() -> (Self, Rc<RefCell<Vec<Call>>>) {
        Self::with_reflection(ProgramReflection::default())
    }

    /// Creates a driver whose linked programs reflect as `reflection`.
    pub fn with_reflection(reflection: ProgramReflection) -> (Self, Rc<RefCell<Vec<Call>>>) {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let driver = Self {
            calls: Rc::clone(&calls),
            reflection,
            fail_compile: None,
            fail_link: false,
            fail_buffer_create: false,
            next_handle: 1,
        };
        (driver, calls)
    }

    fn push(&self, call: Call) {
        self.calls.borrow_mut().push(call);
    }

    fn handle(&mut self) -> u64 {
        let handle = self.next_handle;
        self.next_handle += 1;
        handle
    }
}

impl DriverContext for RecordingDriver {
    fn create_buffer(&mut self) -> Option<NativeBuffer> {
        self.push(Call::CreateBuffer);
        if self.fail_buffer_create {
            return None;
        }
        Some(NativeBuffer(self.handle()))
    }

    fn delete_buffer(&mut self, buffer: NativeBuffer) {
        self.push(Call::DeleteBuffer(buffer.0));
    }

    fn bind_buffer(&mut self, target: BufferTarget, buffer: Option<NativeBuffer>) {
        self.push(Call::BindBuffer(target, buffer.map(|b| b.0)));
    }

    fn allocate_buffer(&mut self, target: BufferTarget, size: u64, dynamic: bool) {
        self.push(Call::AllocateBuffer(target, size, dynamic));
    }

    fn upload_buffer(&mut self, target: BufferTarget, offset: u64, data: &[u8]) {
        self.push(Call::UploadBuffer(target, offset, data.len()));
    }

    fn create_texture(&mut self) -> Option<NativeTexture> {
        self.push(Call::CreateTexture);
        Some(NativeTexture(self.handle()))
    }

    fn delete_texture(&mut self, texture: NativeTexture) {
        self.push(Call::DeleteTexture(texture.0));
    }

    fn bind_texture(&mut self, unit: u32, _target: TextureType, texture: Option<NativeTexture>) {
        self.push(Call::BindTexture(unit, texture.map(|t| t.0)));
    }

    fn texture_format(&self, format: PixelFormat) -> Option<NativeTexFormat> {
        Some(NativeTexFormat { internal: format as u32, format: 0, ty: 0 })
    }

    fn allocate_texture_level(
        &mut self,
        _target: TextureType,
        face: u32,
        level: u32,
        _format: NativeTexFormat,
        width: u32,
        height: u32,
    ) {
        self.push(Call::AllocateTextureLevel { face, level, width, height });
    }

    fn upload_texture_level(
        &mut self,
        _target: TextureType,
        face: u32,
        level: u32,
        _format: NativeTexFormat,
        _width: u32,
        _height: u32,
        data: &[u8],
    ) {
        self.push(Call::UploadTextureLevel { face, level, len: data.len() });
    }

    fn upload_compressed_texture_level(
        &mut self,
        _target: TextureType,
        face: u32,
        level: u32,
        _format: NativeTexFormat,
        _width: u32,
        _height: u32,
        data: &[u8],
    ) {
        self.push(Call::UploadCompressedTextureLevel { face, level, len: data.len() });
    }

    fn apply_sampler(&mut self, unit: u32, _target: TextureType, _sampler: &SamplerDescriptor) {
        self.push(Call::ApplySampler(unit));
    }

    fn create_framebuffer(&mut self) -> Option<NativeFramebuffer> {
        self.push(Call::CreateFramebuffer);
        Some(NativeFramebuffer(self.handle()))
    }

    fn delete_framebuffer(&mut self, framebuffer: NativeFramebuffer) {
        self.push(Call::DeleteFramebuffer(framebuffer.0));
    }

    fn bind_framebuffer(&mut self, framebuffer: Option<NativeFramebuffer>) {
        self.push(Call::BindFramebuffer(framebuffer.map(|f| f.0)));
    }

    fn attach_color(&mut self, index: u32, texture: NativeTexture, level: u32) {
        self.push(Call::AttachColor(index, texture.0, level));
    }

    fn attach_depth_stencil(&mut self, with_stencil: bool, texture: NativeTexture, level: u32) {
        self.push(Call::AttachDepthStencil(with_stencil, texture.0, level));
    }

    fn compile_stage(
        &mut self,
        stage: ShaderStageKind,
        source: &str,
    ) -> Result<NativeStage, String> {
        self.push(Call::CompileStage(stage, source.to_string()));
        if self.fail_compile == Some(stage) {
            return Err("synthetic compile failure".to_string());
        }
        Ok(NativeStage(self.handle()))
    }

    fn delete_stage(&mut self, stage: NativeStage) {
        self.push(Call::DeleteStage(stage.0));
    }

    fn link_program(&mut self, stages: &[NativeStage]) -> Result<NativeProgram, String> {
        self.push(Call::LinkProgram(stages.len()));
        if self.fail_link {
            return Err("synthetic link failure".to_string());
        }
        Ok(NativeProgram(self.handle()))
    }

    fn delete_program(&mut self, program: NativeProgram) {
        self.push(Call::DeleteProgram(program.0));
    }

    fn reflect_program(&mut self, program: NativeProgram) -> ProgramReflection {
        self.push(Call::ReflectProgram(program.0));
        self.reflection.clone()
    }

    fn use_program(&mut self, program: Option<NativeProgram>) {
        self.push(Call::UseProgram(program.map(|p| p.0)));
    }

    fn set_cull_mode(&mut self, mode: CullMode) {
        self.push(Call::SetCullMode(mode));
    }

    fn set_front_face(&mut self, winding: FrontFace) {
        self.push(Call::SetFrontFace(winding));
    }

    fn set_depth_bias(&mut self, constant: f32, slope_scale: f32) {
        self.push(Call::SetDepthBias(constant, slope_scale));
    }

    fn set_line_width(&mut self, width: f32) {
        self.push(Call::SetLineWidth(width));
    }

    fn set_depth_test(&mut self, enabled: bool) {
        self.push(Call::SetDepthTest(enabled));
    }

    fn set_depth_write(&mut self, enabled: bool) {
        self.push(Call::SetDepthWrite(enabled));
    }

    fn set_depth_compare(&mut self, compare: CompareFunction) {
        self.push(Call::SetDepthCompare(compare));
    }

    fn set_stencil_test(&mut self, enabled: bool) {
        self.push(Call::SetStencilTest(enabled));
    }

    fn set_stencil_func(
        &mut self,
        face: StencilFace,
        compare: CompareFunction,
        reference: u32,
        read_mask: u32,
    ) {
        self.push(Call::SetStencilFunc(face, compare, reference, read_mask));
    }

    fn set_stencil_ops(
        &mut self,
        face: StencilFace,
        fail: StencilOperation,
        depth_fail: StencilOperation,
        pass: StencilOperation,
    ) {
        self.push(Call::SetStencilOps(face, fail, depth_fail, pass));
    }

    fn set_stencil_write_mask(&mut self, face: StencilFace, mask: u32) {
        self.push(Call::SetStencilWriteMask(face, mask));
    }

    fn set_alpha_to_coverage(&mut self, enabled: bool) {
        self.push(Call::SetAlphaToCoverage(enabled));
    }

    fn set_blend_enabled(&mut self, enabled: bool) {
        self.push(Call::SetBlendEnabled(enabled));
    }

    fn set_blend_constant(&mut self, color: LinearRgba) {
        self.push(Call::SetBlendConstant(color));
    }

    fn set_blend_equation(&mut self, color: BlendOperation, alpha: BlendOperation) {
        self.push(Call::SetBlendEquation(color, alpha));
    }

    fn set_blend_factors(
        &mut self,
        src_color: BlendFactor,
        dst_color: BlendFactor,
        src_alpha: BlendFactor,
        dst_alpha: BlendFactor,
    ) {
        self.push(Call::SetBlendFactors(src_color, dst_color, src_alpha, dst_alpha));
    }

    fn set_color_write_mask(&mut self, mask: ColorWrites) {
        self.push(Call::SetColorWriteMask(mask));
    }

    fn set_viewport(&mut self, rect: Rect2D) {
        self.push(Call::SetViewport(rect));
    }

    fn set_scissor(&mut self, rect: Rect2D) {
        self.push(Call::SetScissor(rect));
    }

    fn clear(&mut self, color: Option<LinearRgba>, depth: Option<f32>, stencil: Option<u32>) {
        self.push(Call::Clear(color, depth, stencil));
    }

    fn enable_attribute(&mut self, location: u32) {
        self.push(Call::EnableAttribute(location));
    }

    fn disable_attribute(&mut self, location: u32) {
        self.push(Call::DisableAttribute(location));
    }

    fn attribute_pointer(
        &mut self,
        location: u32,
        components: u32,
        stride: u32,
        offset: u32,
        instanced: bool,
    ) {
        self.push(Call::AttributePointer { location, components, stride, offset, instanced });
    }

    fn draw_arrays(&mut self, topology: PrimitiveTopology, first: u32, count: u32) {
        self.push(Call::DrawArrays(topology, first, count));
    }

    fn draw_elements(
        &mut self,
        topology: PrimitiveTopology,
        kind: IndexKind,
        count: u32,
        byte_offset: u64,
    ) {
        self.push(Call::DrawElements(topology, kind, count, byte_offset));
    }

    fn set_uniform_f1(&mut self, location: i32, data: &[f32]) {
        self.push(Call::SetUniformF1(location, data.to_vec()));
    }

    fn set_uniform_f2(&mut self, location: i32, data: &[f32]) {
        self.push(Call::SetUniformF2(location, data.to_vec()));
    }

    fn set_uniform_f3(&mut self, location: i32, data: &[f32]) {
        self.push(Call::SetUniformF3(location, data.to_vec()));
    }

    fn set_uniform_f4(&mut self, location: i32, data: &[f32]) {
        self.push(Call::SetUniformF4(location, data.to_vec()));
    }

    fn set_uniform_i1(&mut self, location: i32, data: &[i32]) {
        self.push(Call::SetUniformI1(location, data.to_vec()));
    }

    fn set_uniform_i2(&mut self, location: i32, data: &[i32]) {
        self.push(Call::SetUniformI2(location, data.to_vec()));
    }

    fn set_uniform_i3(&mut self, location: i32, data: &[i32]) {
        self.push(Call::SetUniformI3(location, data.to_vec()));
    }

    fn set_uniform_i4(&mut self, location: i32, data: &[i32]) {
        self.push(Call::SetUniformI4(location, data.to_vec()));
    }

    fn set_uniform_mat2(&mut self, location: i32, data: &[f32]) {
        self.push(Call::SetUniformMat2(location, data.to_vec()));
    }

    fn set_uniform_mat3(&mut self, location: i32, data: &[f32]) {
        self.push(Call::SetUniformMat3(location, data.to_vec()));
    }

    fn set_uniform_mat4(&mut self, location: i32, data: &[f32]) {
        self.push(Call::SetUniformMat4(location, data.to_vec()));
    }
}
