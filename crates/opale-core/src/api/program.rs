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

//! Defines data structures for shaders and linked programs.

use super::common::ShaderStage;
use super::handle::{DeviceId, Handle};

/// A descriptor used to create a [`Shader`].
///
/// `source` is backend-dependent: GLSL text for the GL backends, SPIR-V
/// for Vulkan, compiled bytecode for D3D11.
#[derive(Debug, Clone, Copy)]
pub struct ShaderDescriptor<'a> {
    /// Pipeline stage the shader runs at.
    pub stage: ShaderStage,
    /// Backend-dependent shader source or bytecode.
    pub source: &'a [u8],
}

/// A compiled shader stage.
#[derive(Debug, Clone, Default)]
pub struct Shader {
    /// The device that created this shader.
    pub device: DeviceId,
    /// Native shader object.
    pub handle: Handle,
    /// Pipeline stage the shader runs at.
    pub stage: ShaderStage,
}

/// A named slot assignment resolved at program creation.
///
/// Backends without binding annotations in their shading language (GL3)
/// resolve `name` against the linked program and route it to `slot`;
/// backends with explicit bindings ignore the names.
#[derive(Debug, Clone, Copy)]
pub struct ProgramBinding<'a> {
    /// Name of the attribute, uniform block or sampler in the shader.
    pub name: &'a str,
    /// Slot the name is routed to.
    pub slot: u32,
}

/// A descriptor used to create a [`Program`].
#[derive(Debug, Clone, Copy)]
pub struct ProgramDescriptor<'a> {
    /// Vertex stage, required.
    pub vertex: &'a Shader,
    /// Fragment stage, required.
    pub fragment: &'a Shader,
    /// Optional geometry stage.
    pub geometry: Option<&'a Shader>,
    /// Vertex attribute slot assignments.
    pub attributes: &'a [ProgramBinding<'a>],
    /// Uniform block slot assignments.
    pub constants: &'a [ProgramBinding<'a>],
    /// Sampler slot assignments.
    pub samplers: &'a [ProgramBinding<'a>],
}

/// A linked shader program.
///
/// Keeps handle copies of its stages and, on backends that need it, the
/// vertex stage bytecode (D3D11 validates input layouts against it).
#[derive(Debug, Clone, Default)]
pub struct Program {
    /// The device that created this program.
    pub device: DeviceId,
    /// Native program object.
    pub handle: Handle,
    /// Handle of the vertex stage.
    pub vertex: Handle,
    /// Handle of the fragment stage.
    pub fragment: Handle,
    /// Handle of the geometry stage, if any.
    pub geometry: Handle,
    /// Vertex stage bytecode retained for input layout creation.
    pub vertex_bytecode: Vec<u8>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_program_starts_empty() {
        let program = Program::default();
        assert!(program.handle.is_none());
        assert!(program.vertex.is_none());
        assert!(program.vertex_bytecode.is_empty());
    }
}
