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

//! Render pass and framebuffer resources.

use super::{RenderPassId, TextureViewId};
use crate::driver::NativeFramebuffer;
use crate::format::PixelFormat;

/// Describes how an attachment is initialized at the start of a render pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LoadOp {
    /// The existing contents of the attachment are loaded into the pass.
    #[default]
    Load,
    /// The attachment is cleared before the pass begins. Clear values are
    /// supplied per `begin_render_pass` record, not per pass.
    Clear,
    /// The prior contents are irrelevant and may be discarded.
    Discard,
}

/// Describes what happens to an attachment at the end of a render pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StoreOp {
    /// The results of the pass are stored to the attachment's memory.
    #[default]
    Store,
    /// The results are discarded, leaving the attachment's memory undefined.
    Discard,
}

/// Describes a single color attachment slot of a render pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ColorAttachmentDescriptor {
    /// The pixel format of the attachment.
    pub format: PixelFormat,
    /// The operation performed at the beginning of the pass.
    pub load_op: LoadOp,
    /// The operation performed at the end of the pass.
    pub store_op: StoreOp,
}

/// Describes the depth-stencil attachment slot of a render pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DepthStencilAttachmentDescriptor {
    /// The pixel format of the attachment.
    pub format: PixelFormat,
    /// The operation performed on the depth aspect at the start of the pass.
    pub depth_load_op: LoadOp,
    /// The operation performed on the depth aspect at the end of the pass.
    pub depth_store_op: StoreOp,
    /// The operation performed on the stencil aspect at the start of the pass.
    pub stencil_load_op: LoadOp,
    /// The operation performed on the stencil aspect at the end of the pass.
    pub stencil_store_op: StoreOp,
}

/// A descriptor used to create a [`RenderPass`].
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RenderPassDescriptor {
    /// Ordered color attachment slots.
    pub color_attachments: Vec<ColorAttachmentDescriptor>,
    /// The optional depth-stencil attachment slot.
    pub depth_stencil_attachment: Option<DepthStencilAttachmentDescriptor>,
}

/// A render pass: the attachment contract a framebuffer and pipeline agree on.
#[derive(Debug)]
pub struct RenderPass {
    /// Ordered color attachment slots.
    pub color_attachments: Vec<ColorAttachmentDescriptor>,
    /// The optional depth-stencil attachment slot.
    pub depth_stencil_attachment: Option<DepthStencilAttachmentDescriptor>,
}

impl RenderPass {
    /// Builds a render pass from a descriptor.
    pub fn new(descriptor: &RenderPassDescriptor) -> Self {
        Self {
            color_attachments: descriptor.color_attachments.clone(),
            depth_stencil_attachment: descriptor.depth_stencil_attachment,
        }
    }
}

/// A descriptor used to create a [`Framebuffer`].
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FramebufferDescriptor {
    /// The render pass this framebuffer satisfies (shared; the pass may back
    /// any number of framebuffers).
    pub render_pass: RenderPassId,
    /// Color texture views, ordered by attachment index. `None` leaves the
    /// slot unattached.
    pub color_views: Vec<Option<TextureViewId>>,
    /// The optional depth-stencil texture view.
    pub depth_stencil_view: Option<TextureViewId>,
    /// When set, the framebuffer stands for the default target: realization
    /// skips native allocation entirely and execution binds the driver default.
    pub offscreen: bool,
}

/// A framebuffer: descriptor fields plus realized native state.
#[derive(Debug)]
pub struct Framebuffer {
    /// The render pass this framebuffer satisfies.
    pub render_pass: RenderPassId,
    /// Color texture views by attachment index.
    pub color_views: Vec<Option<TextureViewId>>,
    /// The optional depth-stencil texture view.
    pub depth_stencil_view: Option<TextureViewId>,
    /// Default-target marker; see [`FramebufferDescriptor::offscreen`].
    pub offscreen: bool,
    /// The native handle. Always `None` for offscreen framebuffers.
    pub native: Option<NativeFramebuffer>,
}

impl Framebuffer {
    /// Builds an unrealized framebuffer from a descriptor.
    pub fn new(descriptor: &FramebufferDescriptor) -> Self {
        Self {
            render_pass: descriptor.render_pass,
            color_views: descriptor.color_views.clone(),
            depth_stencil_view: descriptor.depth_stencil_view,
            offscreen: descriptor.offscreen,
            native: None,
        }
    }
}
