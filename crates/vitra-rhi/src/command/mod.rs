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

//! Command recording: pooled records and the per-frame command package.
//!
//! The lifecycle is strict: record → execute → clear, once per frame or pass,
//! with no overlap. Replay order is carried solely by the package's tag
//! sequence; the per-kind record arrays are storage, not ordering.

pub mod package;
pub mod pool;

pub use package::{
    BeginRenderPassCmd, BindBindingSetLayoutCmd, BindInputAssemblerCmd, BindPipelineStateCmd,
    CommandKind, CommandPackage, DrawCmd, UpdateBufferCmd,
};
pub use pool::{CommandAllocator, CommandPool};
