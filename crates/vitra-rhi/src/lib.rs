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

//! # Vitra RHI
//!
//! A backend-agnostic Rendering Hardware Interface. Drawing intent is recorded
//! as a sequence of typed commands plus GPU resource descriptors, then replayed
//! against a native graphics driver while diffing each state group against a
//! mirrored [`state::StateCache`] to elide redundant driver calls.
//!
//! The crate is organized leaves-first:
//!
//! - **[`format`]**: pixel/texel format registry and binary-size arithmetic.
//! - **[`resource`]**: descriptors and realized state for every GPU object kind.
//! - **[`command`]**: pooled command records and the recording surface.
//! - **[`state`]**: the mirrored driver state cache.
//! - **[`driver`]**: the trait seam to the native graphics context.
//! - **[`device`]**: resource factory and ownership.
//! - **[`executor`]**: command replay and resource realization.
//!
//! The whole surface is single-threaded by contract: one thread owns the
//! [`device::Device`] and drives record → execute → clear once per frame.

#![warn(missing_docs)]

pub mod command;
pub mod device;
pub mod driver;
pub mod error;
pub mod executor;
pub mod format;
pub mod math;
pub mod resource;
pub mod state;
pub mod utils;

#[cfg(test)]
pub(crate) mod test_driver;

pub use command::{CommandAllocator, CommandKind, CommandPackage};
pub use device::Device;
pub use driver::DriverContext;
pub use error::{ResourceError, ShaderError};
pub use executor::execute;
pub use format::{surface_size, texture_size, PixelFormat};
