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

//! Binding set layouts: declared lists of resource-binding slots.

use super::{BufferId, SamplerId, TextureViewId};

/// The resource bound at a binding slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingResource {
    /// A uniform buffer feeding a shader uniform block.
    UniformBuffer(BufferId),
    /// A sampled texture with its sampler state.
    Sampler {
        /// The texture view to sample.
        texture_view: TextureViewId,
        /// The sampler state to apply.
        sampler: SamplerId,
    },
}

/// One slot of a binding set layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BindingUnit {
    /// The binding slot. For uniform buffers this addresses a declared block
    /// binding; for samplers it addresses the sampler's assigned texture unit.
    pub slot: u32,
    /// The bound resource.
    pub resource: BindingResource,
}

/// A descriptor used to create a [`BindingSetLayout`].
#[derive(Debug, Clone)]
pub struct BindingSetLayoutDescriptor {
    /// The ordered binding units.
    pub bindings: Vec<BindingUnit>,
}

/// A declared list of resource-binding slots consumed by a shader.
#[derive(Debug)]
pub struct BindingSetLayout {
    /// The ordered binding units.
    pub bindings: Vec<BindingUnit>,
}

impl BindingSetLayout {
    /// Builds a binding set layout from a descriptor.
    pub fn new(descriptor: &BindingSetLayoutDescriptor) -> Self {
        Self { bindings: descriptor.bindings.clone() }
    }
}
