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

//! Free-list pools of reusable command records.

use super::package::{
    BeginRenderPassCmd, BindBindingSetLayoutCmd, BindInputAssemblerCmd, BindPipelineStateCmd,
    DrawCmd, UpdateBufferCmd,
};

/// A free-list pool of records of one command kind.
///
/// Released records keep their heap payloads (an update-buffer record keeps
/// its byte vector's capacity), so steady-state recording allocates nothing
/// once the per-frame high-water mark has been reached.
#[derive(Debug)]
pub struct CommandPool<T: Default> {
    free: Vec<T>,
}

impl<T: Default> CommandPool<T> {
    /// Creates an empty pool.
    pub fn new() -> Self {
        Self { free: Vec::new() }
    }

    /// Takes a record from the free list, or default-constructs one.
    pub fn acquire(&mut self) -> T {
        self.free.pop().unwrap_or_default()
    }

    /// Returns a record to the free list.
    pub fn release(&mut self, record: T) {
        self.free.push(record);
    }

    /// The number of records currently pooled.
    pub fn pooled(&self) -> usize {
        self.free.len()
    }
}

impl<T: Default> Default for CommandPool<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// One pool per command kind. A device owns exactly one allocator for its
/// full lifetime.
#[derive(Debug, Default)]
pub struct CommandAllocator {
    /// Pool of begin-render-pass records.
    pub begin_render_pass: CommandPool<BeginRenderPassCmd>,
    /// Pool of bind-pipeline-state records.
    pub bind_pipeline_state: CommandPool<BindPipelineStateCmd>,
    /// Pool of bind-input-assembler records.
    pub bind_input_assembler: CommandPool<BindInputAssemblerCmd>,
    /// Pool of bind-binding-set-layout records.
    pub bind_binding_set_layout: CommandPool<BindBindingSetLayoutCmd>,
    /// Pool of draw records.
    pub draw: CommandPool<DrawCmd>,
    /// Pool of update-buffer records.
    pub update_buffer: CommandPool<UpdateBufferCmd>,
}

impl CommandAllocator {
    /// Creates an allocator with empty pools.
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acquire_reuses_released_records() {
        let mut pool: CommandPool<UpdateBufferCmd> = CommandPool::new();
        let mut record = pool.acquire();
        record.data.extend_from_slice(&[1, 2, 3, 4]);
        let capacity = record.data.capacity();
        record.data.clear();
        pool.release(record);
        assert_eq!(pool.pooled(), 1);

        let reused = pool.acquire();
        assert_eq!(pool.pooled(), 0);
        assert!(reused.data.capacity() >= capacity, "payload capacity must survive pooling");
    }
}
