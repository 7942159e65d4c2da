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

//! Mirror of the GL context state last applied by this device.
//!
//! Every mutation of context state goes through this cache and is
//! skipped when the cached value already matches, so redundant binds
//! never reach the driver. The mirror assumes nothing else touches the
//! context.

use opale_core::api::{
    BlendEquation, BlendFunction, CompareFunction, CullMode, FillMode, FrontFace, IndexKind,
    StencilOperation,
};

use super::api::GLuint;

/// Sampler units the cache tracks per-unit texture bindings for.
pub(crate) const MAX_SAMPLER_UNITS: usize = 64;

/// One bit per `glEnable` capability enum value.
const CAPABILITY_BITS: usize = u16::MAX as usize / 8;

/// Last-applied context state, kept under the device's state lock.
pub(crate) struct GlState {
    capabilities: [u8; CAPABILITY_BITS],

    pub blend_src_color: BlendFunction,
    pub blend_dst_color: BlendFunction,
    pub blend_src_alpha: BlendFunction,
    pub blend_dst_alpha: BlendFunction,
    pub blend_color_equation: BlendEquation,
    pub blend_alpha_equation: BlendEquation,

    pub depth_compare: CompareFunction,
    pub depth_write: bool,
    pub stencil_compare: CompareFunction,
    pub stencil_reference: u32,
    pub stencil_compare_mask: u32,
    pub stencil_write_mask: u32,
    pub stencil_fail: StencilOperation,
    pub stencil_zfail: StencilOperation,
    pub stencil_pass: StencilOperation,

    pub fill_mode: FillMode,
    pub cull_mode: CullMode,
    pub front_face: FrontFace,

    pub program: GLuint,
    pub vertex_array: GLuint,
    pub draw_framebuffer: GLuint,
    pub active_texture: u32,
    pub textures: [GLuint; MAX_SAMPLER_UNITS],

    /// Index width of the currently bound attributes state, if it has an
    /// index buffer. Indexed draws read it.
    pub index: Option<IndexKind>,

    pub line_width: f32,
    pub point_size: f32,

    /// Client ids of the currently applied state objects. Ids are
    /// allocated monotonically and never reused, so an equal id always
    /// means the same state.
    pub blend_state: u64,
    pub depth_stencil_state: u64,
    pub rasterizer_state: u64,
    pub pipeline_state: u64,
}

impl Default for GlState {
    fn default() -> Self {
        // A fresh context: all capabilities off, pass-through fixed
        // function defaults.
        Self {
            capabilities: [0; CAPABILITY_BITS],
            blend_src_color: BlendFunction::One,
            blend_dst_color: BlendFunction::Zero,
            blend_src_alpha: BlendFunction::One,
            blend_dst_alpha: BlendFunction::Zero,
            blend_color_equation: BlendEquation::Add,
            blend_alpha_equation: BlendEquation::Add,
            depth_compare: CompareFunction::Less,
            depth_write: true,
            stencil_compare: CompareFunction::Always,
            stencil_reference: 0,
            stencil_compare_mask: u32::MAX,
            stencil_write_mask: u32::MAX,
            stencil_fail: StencilOperation::Keep,
            stencil_zfail: StencilOperation::Keep,
            stencil_pass: StencilOperation::Keep,
            fill_mode: FillMode::Solid,
            cull_mode: CullMode::None,
            front_face: FrontFace::CounterClockwise,
            program: 0,
            vertex_array: 0,
            draw_framebuffer: 0,
            active_texture: 0,
            textures: [0; MAX_SAMPLER_UNITS],
            index: None,
            line_width: 1.0,
            point_size: 1.0,
            blend_state: 0,
            depth_stencil_state: 0,
            rasterizer_state: 0,
            pipeline_state: 0,
        }
    }
}

impl GlState {
    /// Flips the cached bit for a capability. Returns `false` when the
    /// capability already had that value and no GL call is needed.
    pub fn set_capability(&mut self, capability: u32, enabled: bool) -> bool {
        debug_assert!((capability as usize) < CAPABILITY_BITS * 8);
        let byte = (capability / 8) as usize;
        let bit = 1u8 << (capability % 8);
        let current = self.capabilities[byte] & bit != 0;
        if current == enabled {
            return false;
        }
        if enabled {
            self.capabilities[byte] |= bit;
        } else {
            self.capabilities[byte] &= !bit;
        }
        true
    }
}

impl std::fmt::Debug for GlState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GlState")
            .field("program", &self.program)
            .field("vertex_array", &self.vertex_array)
            .field("draw_framebuffer", &self.draw_framebuffer)
            .field("pipeline_state", &self.pipeline_state)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capability_bit_transitions() {
        let mut state = GlState::default();
        // Everything starts disabled, so disabling again is redundant.
        assert!(!state.set_capability(0x0BE2, false));
        assert!(state.set_capability(0x0BE2, true));
        assert!(!state.set_capability(0x0BE2, true));
        assert!(state.set_capability(0x0BE2, false));
    }

    #[test]
    fn test_capabilities_do_not_alias() {
        let mut state = GlState::default();
        assert!(state.set_capability(0x0B71, true));
        // A neighbouring enum value lives in the same byte.
        assert!(state.set_capability(0x0B70, true));
        assert!(!state.set_capability(0x0B71, true));
    }
}
