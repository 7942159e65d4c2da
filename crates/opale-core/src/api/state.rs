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

//! Immutable fixed-function state blocks and the pipeline state that
//! groups them.
//!
//! On D3D11 these map to native state objects; on GL they are client-side
//! records with device-allocated ids, and binding one diffs its fields
//! against the cached last-applied values so only changes reach the
//! driver. Binding the state object that is already current is free on
//! every backend.

use super::common::{
    BlendEquation, BlendFunction, CompareFunction, CullMode, FillMode, FrontFace, StencilOperation,
};
use super::handle::{DeviceId, Handle};
use super::layout::InputLayout;
use super::program::Program;

/// A descriptor used to create a [`BlendState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlendStateDescriptor {
    /// Whether blending is performed at all.
    pub enabled: bool,
    /// Source factor for the color channels.
    pub src_color: BlendFunction,
    /// Destination factor for the color channels.
    pub dst_color: BlendFunction,
    /// Source factor for alpha.
    pub src_alpha: BlendFunction,
    /// Destination factor for alpha.
    pub dst_alpha: BlendFunction,
    /// Equation for the color channels.
    pub color_equation: BlendEquation,
    /// Equation for alpha.
    pub alpha_equation: BlendEquation,
}

impl Default for BlendStateDescriptor {
    fn default() -> Self {
        Self {
            enabled: false,
            src_color: BlendFunction::One,
            dst_color: BlendFunction::Zero,
            src_alpha: BlendFunction::One,
            dst_alpha: BlendFunction::Zero,
            color_equation: BlendEquation::Add,
            alpha_equation: BlendEquation::Add,
        }
    }
}

/// An immutable blend configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct BlendState {
    /// The device that created this state.
    pub device: DeviceId,
    /// Native state object or device-allocated id.
    pub handle: Handle,
    /// The configuration this state applies.
    pub desc: BlendStateDescriptor,
}

/// A descriptor used to create a [`DepthStencilState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DepthStencilStateDescriptor {
    /// Whether the depth test runs.
    pub depth_test: bool,
    /// Whether passing fragments write depth.
    pub depth_write: bool,
    /// Depth test comparison.
    pub depth_compare: CompareFunction,
    /// Whether the stencil test runs.
    pub stencil_enabled: bool,
    /// Stencil test comparison.
    pub stencil_compare: CompareFunction,
    /// Reference value for the stencil test.
    pub stencil_reference: u32,
    /// Mask applied to both sides of the stencil comparison.
    pub stencil_compare_mask: u32,
    /// Mask applied to stencil writes.
    pub stencil_write_mask: u32,
    /// Applied when the stencil test fails.
    pub stencil_fail: StencilOperation,
    /// Applied when the stencil test passes but depth fails.
    pub stencil_zfail: StencilOperation,
    /// Applied when both tests pass.
    pub stencil_pass: StencilOperation,
}

impl Default for DepthStencilStateDescriptor {
    fn default() -> Self {
        Self {
            depth_test: false,
            depth_write: true,
            depth_compare: CompareFunction::Less,
            stencil_enabled: false,
            stencil_compare: CompareFunction::Always,
            stencil_reference: 0,
            stencil_compare_mask: u32::MAX,
            stencil_write_mask: u32::MAX,
            stencil_fail: StencilOperation::Keep,
            stencil_zfail: StencilOperation::Keep,
            stencil_pass: StencilOperation::Keep,
        }
    }
}

/// An immutable depth and stencil configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct DepthStencilState {
    /// The device that created this state.
    pub device: DeviceId,
    /// Native state object or device-allocated id.
    pub handle: Handle,
    /// The configuration this state applies.
    pub desc: DepthStencilStateDescriptor,
}

/// A descriptor used to create a [`RasterizerState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RasterizerStateDescriptor {
    /// Polygon raster mode.
    pub fill_mode: FillMode,
    /// Face culling.
    pub cull_mode: CullMode,
    /// Winding order of front faces.
    pub front_face: FrontFace,
    /// Whether the scissor test applies.
    pub scissor: bool,
}

impl Default for RasterizerStateDescriptor {
    fn default() -> Self {
        Self {
            fill_mode: FillMode::Solid,
            cull_mode: CullMode::None,
            front_face: FrontFace::CounterClockwise,
            scissor: false,
        }
    }
}

/// An immutable rasterizer configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct RasterizerState {
    /// The device that created this state.
    pub device: DeviceId,
    /// Native state object or device-allocated id.
    pub handle: Handle,
    /// The configuration this state applies.
    pub desc: RasterizerStateDescriptor,
}

/// A descriptor used to create a [`PipelineState`].
#[derive(Debug, Clone, Copy)]
pub struct PipelineStateDescriptor<'a> {
    /// The linked program.
    pub program: &'a Program,
    /// Rasterizer configuration.
    pub rasterizer: &'a RasterizerState,
    /// Depth and stencil configuration.
    pub depth_stencil: &'a DepthStencilState,
    /// Blend configuration.
    pub blend: &'a BlendState,
    /// Vertex input layout.
    pub layout: &'a InputLayout,
}

/// The full static configuration of a draw: program, fixed-function
/// states and input layout.
///
/// A pipeline state copies the sub-states it was built from (handles and
/// configurations, not references), so deleting a sub-state later does
/// not invalidate the pipeline record itself. Binding a pipeline applies
/// its parts in order: program, rasterizer, depth-stencil, blend.
#[derive(Debug, Clone, Copy, Default)]
pub struct PipelineState {
    /// The device that created this state.
    pub device: DeviceId,
    /// Native pipeline object or device-allocated id.
    pub handle: Handle,
    /// Handle of the program.
    pub program: Handle,
    /// Copy of the rasterizer state.
    pub rasterizer: RasterizerState,
    /// Copy of the depth-stencil state.
    pub depth_stencil: DepthStencilState,
    /// Copy of the blend state.
    pub blend: BlendState,
    /// Copy of the input layout.
    pub layout: InputLayout,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_defaults_are_pass_through() {
        let blend = BlendStateDescriptor::default();
        assert!(!blend.enabled);
        assert_eq!(blend.src_color, BlendFunction::One);
        assert_eq!(blend.dst_color, BlendFunction::Zero);

        let depth = DepthStencilStateDescriptor::default();
        assert!(!depth.depth_test);
        assert!(!depth.stencil_enabled);
        assert_eq!(depth.stencil_compare_mask, u32::MAX);

        let raster = RasterizerStateDescriptor::default();
        assert_eq!(raster.cull_mode, CullMode::None);
        assert_eq!(raster.fill_mode, FillMode::Solid);
    }

    #[test]
    fn test_pipeline_starts_empty() {
        let pipeline = PipelineState::default();
        assert!(pipeline.handle.is_none());
        assert!(pipeline.program.is_none());
    }
}
