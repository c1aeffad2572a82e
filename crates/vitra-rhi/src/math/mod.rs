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

//! POD value types consumed by the RHI: colors and rectangles.
//!
//! The RHI performs no vector math of its own; these types exist so that
//! viewport rects, clear colors, and blend constants have a stable `repr(C)`
//! layout at the driver boundary.

pub mod color;
pub mod dimension;

pub use color::LinearRgba;
pub use dimension::Rect2D;
