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

//! Defines data structures related to GPU buffer resources.

use crate::driver::{BufferTarget, NativeBuffer};
use crate::vitra_bitflags;

vitra_bitflags! {
    /// A set of flags describing the allowed usages of a buffer.
    ///
    /// The realization step uses these to pick the native binding target and
    /// to decide whether the buffer needs a CPU backing store.
    pub struct BufferUsage: u32 {
        /// The buffer can be bound as a vertex buffer.
        const VERTEX = 1 << 0;
        /// The buffer can be bound as an index buffer.
        const INDEX = 1 << 1;
        /// The buffer backs uniform data. Not natively supported by this
        /// backend tier; such buffers are CPU-emulated.
        const UNIFORM = 1 << 2;
        /// The buffer can be the source of a transfer operation.
        const TRANSFER_SRC = 1 << 3;
        /// The buffer can be the destination of a transfer operation.
        const TRANSFER_DST = 1 << 4;
    }
}

vitra_bitflags! {
    /// A set of flags describing where a buffer's memory should live.
    pub struct MemoryUsage: u32 {
        /// Device-local memory; contents are written rarely (static hint).
        const DEVICE = 1 << 0;
        /// Host-visible memory; contents are rewritten often (dynamic hint).
        const HOST = 1 << 1;
    }
}

/// A descriptor used to create a [`Buffer`].
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BufferDescriptor {
    /// A bitmask of [`BufferUsage`] flags describing how the buffer will be used.
    pub usage: BufferUsage,
    /// A bitmask of [`MemoryUsage`] flags hinting at the memory placement.
    pub memory: MemoryUsage,
    /// The total size of the buffer in bytes.
    pub size: u64,
    /// The byte distance between consecutive elements (0 for raw buffers).
    pub stride: u32,
}

/// A GPU buffer: descriptor fields plus realized native state.
#[derive(Debug)]
pub struct Buffer {
    /// How the buffer may be used.
    pub usage: BufferUsage,
    /// Memory placement hint.
    pub memory: MemoryUsage,
    /// Total byte size.
    pub size: u64,
    /// Byte distance between consecutive elements.
    pub stride: u32,
    /// The native handle, populated by realization. `None` means the buffer
    /// is degraded (allocation failed or usage unsupported) and later
    /// operations against it no-op.
    pub native: Option<NativeBuffer>,
    /// The native binding target chosen from the usage bits.
    pub target: Option<BufferTarget>,
    /// CPU backing store, allocated for uniform buffers (which this backend
    /// tier emulates host-side) and consumed by the uniform commit path.
    pub backing: Option<Vec<u8>>,
}

impl Buffer {
    /// Builds an unrealized buffer from a descriptor.
    pub fn new(descriptor: &BufferDescriptor) -> Self {
        Self {
            usage: descriptor.usage,
            memory: descriptor.memory,
            size: descriptor.size,
            stride: descriptor.stride,
            native: None,
            target: None,
            backing: None,
        }
    }
}
