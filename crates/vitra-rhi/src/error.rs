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

//! Defines the hierarchy of error types for the RHI.
//!
//! Execution-time failures (unsupported format combinations, degraded native
//! handles) are surfaced through logs and safe defaults rather than through
//! these types; the `Result`-returning surface is the resource factory, where
//! misuse is detectable and terminal for the affected resource instance.

use crate::resource::{ResourceKind, ShaderId};
use std::fmt;

/// An error related to compiling or linking a shader.
#[derive(Debug)]
pub enum ShaderError {
    /// A stage failed to compile into a native stage object.
    CompilationError {
        /// A descriptive name for the shader.
        name: String,
        /// Detailed diagnostics from the native compiler, per stage.
        details: String,
    },
    /// The compiled stages failed to link into a program.
    LinkError {
        /// A descriptive name for the shader.
        name: String,
        /// Detailed diagnostics from the native linker.
        details: String,
    },
    /// The requested shader could not be found.
    NotFound {
        /// The ID of the shader that was not found.
        id: ShaderId,
    },
}

impl fmt::Display for ShaderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderError::CompilationError { name, details } => {
                write!(f, "Shader compilation failed for '{name}': {details}")
            }
            ShaderError::LinkError { name, details } => {
                write!(f, "Shader link failed for '{name}': {details}")
            }
            ShaderError::NotFound { id } => {
                write!(f, "Shader not found for ID: {id:?}")
            }
        }
    }
}

impl std::error::Error for ShaderError {}

/// An error related to the creation, update, or destruction of a GPU resource.
#[derive(Debug)]
pub enum ResourceError {
    /// A shader-specific error occurred.
    Shader(ShaderError),
    /// A resource of the given kind could not be found (including
    /// double-destroy).
    NotFound(ResourceKind),
    /// The handle or ID used to reference a resource is invalid.
    InvalidHandle,
    /// An attempt was made to access a resource out of its bounds (e.g., in a buffer).
    OutOfBounds,
    /// An error originating from the native driver context.
    DriverError(String),
}

impl fmt::Display for ResourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceError::Shader(e) => write!(f, "Shader error: {e}"),
            ResourceError::NotFound(kind) => write!(f, "{kind:?} not found"),
            ResourceError::InvalidHandle => write!(f, "Invalid resource handle"),
            ResourceError::OutOfBounds => write!(f, "Resource access out of bounds"),
            ResourceError::DriverError(details) => write!(f, "Driver error: {details}"),
        }
    }
}

impl std::error::Error for ResourceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ResourceError::Shader(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ShaderError> for ResourceError {
    fn from(e: ShaderError) -> Self {
        ResourceError::Shader(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_formats_are_descriptive() {
        let err = ResourceError::Shader(ShaderError::CompilationError {
            name: "sprite".to_string(),
            details: "unexpected token".to_string(),
        });
        let text = err.to_string();
        assert!(text.contains("sprite"));
        assert!(text.contains("unexpected token"));
        assert_eq!(
            ResourceError::NotFound(ResourceKind::Buffer).to_string(),
            "Buffer not found"
        );
    }
}
