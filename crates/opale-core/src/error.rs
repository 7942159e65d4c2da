// Copyright 2025 eraflo
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

//! Defines the error types surfaced by graphics devices.

use std::fmt;

/// Errors produced while constructing a device or creating GPU resources.
///
/// Binding and drawing operations never fail through this type; native
/// errors encountered on those paths are reported through the device's
/// diagnostic callback instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphicsError {
    /// The backend could not be brought up on this machine (no suitable
    /// adapter, context creation failed, required extension missing, ...).
    BackendUnavailable(String),
    /// A native entry point required by the backend could not be resolved
    /// from the host-provided loader.
    MissingEntryPoint(String),
    /// A shader failed to compile. Carries the native info log.
    ShaderCompilation(String),
    /// A program failed to link. Carries the native info log.
    ProgramLink(String),
    /// A native resource could not be created.
    ResourceCreation(String),
}

impl fmt::Display for GraphicsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GraphicsError::BackendUnavailable(reason) => {
                write!(f, "graphics backend unavailable: {}", reason)
            }
            GraphicsError::MissingEntryPoint(name) => {
                write!(f, "missing native entry point: {}", name)
            }
            GraphicsError::ShaderCompilation(log) => {
                write!(f, "shader compilation failed: {}", log)
            }
            GraphicsError::ProgramLink(log) => write!(f, "program link failed: {}", log),
            GraphicsError::ResourceCreation(what) => {
                write!(f, "resource creation failed: {}", what)
            }
        }
    }
}

impl std::error::Error for GraphicsError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = GraphicsError::MissingEntryPoint("glCreateBuffers".to_string());
        assert_eq!(
            err.to_string(),
            "missing native entry point: glCreateBuffers"
        );

        let err = GraphicsError::BackendUnavailable("no discrete GPU".to_string());
        assert!(err.to_string().contains("no discrete GPU"));
    }
}
