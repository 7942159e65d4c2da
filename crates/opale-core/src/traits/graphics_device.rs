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

use crate::api::*;
use crate::error::GraphicsError;
use std::fmt::Debug;

/// Static limits and alignments reported by a backend at construction.
#[derive(Debug, Clone, Copy)]
pub struct DeviceCaps {
    /// Required alignment of uniform buffer bind offsets, in bytes.
    pub uniform_buffer_alignment: u32,
    /// Number of sampler slots addressable by [`GraphicsDevice::bind_samplers`].
    pub max_samplers: u32,
    /// Highest supported sample count for multisampled textures.
    pub max_msaa_samples: u32,
}

/// The uniform operation table implemented by every graphics backend.
///
/// Implementations are constructed per backend (construction is not part
/// of the trait) and dispatched through a trait object by
/// [`Device`](crate::device::Device). All methods take `&self`;
/// implementations use interior mutability for their state caches. The
/// only method that may be raced against from other threads is resource
/// deletion, which backends funnel through a synchronized reclamation
/// queue drained by [`tick`](GraphicsDevice::tick).
///
/// Creation methods fill in a default-initialized record and
/// `debug_assert!` that its handle is empty; deletion methods reset the
/// handle and are no-ops on already-empty records.
pub trait GraphicsDevice: Send + Sync + Debug {
    /// Returns the static limits of this device.
    fn caps(&self) -> DeviceCaps;

    /// Ends the frame: drains deferred resource reclamation.
    ///
    /// Must be called from the rendering thread; it is the
    /// synchronization point that makes cross-thread deletes safe.
    fn tick(&self);

    /// Clears one color attachment of `target` (or the default target
    /// when `None`) to `color`.
    fn clear_color(&self, target: Option<&RenderTarget>, attachment: Attachment, color: [f32; 4]);

    /// Clears the depth and stencil planes of `target` (or the default
    /// target when `None`).
    fn clear_depth_stencil(&self, target: Option<&RenderTarget>, depth: f32, stencil: u8);

    /// Draws `count` vertices starting at `offset`.
    fn draw(&self, primitive: PrimitiveType, count: u32, offset: u32);

    /// Draws `count` vertices, `instances` times.
    fn draw_instanced(&self, primitive: PrimitiveType, count: u32, offset: u32, instances: u32);

    /// Draws `count` indices starting at index `offset`.
    fn draw_indexed(&self, primitive: PrimitiveType, count: u32, offset: u32);

    /// Draws `count` indices, `instances` times.
    fn draw_indexed_instanced(
        &self,
        primitive: PrimitiveType,
        count: u32,
        offset: u32,
        instances: u32,
    );

    /// Creates an immutable blend state.
    /// ## Errors
    /// * `GraphicsError::ResourceCreation` - If the native state object
    ///   cannot be created.
    fn create_blend_state(
        &self,
        state: &mut BlendState,
        desc: &BlendStateDescriptor,
    ) -> Result<(), GraphicsError>;

    /// Deletes a blend state. No-op if `state` was never created.
    fn delete_blend_state(&self, state: &mut BlendState);

    /// Creates an immutable depth-stencil state.
    /// ## Errors
    /// * `GraphicsError::ResourceCreation` - If the native state object
    ///   cannot be created.
    fn create_depth_stencil_state(
        &self,
        state: &mut DepthStencilState,
        desc: &DepthStencilStateDescriptor,
    ) -> Result<(), GraphicsError>;

    /// Deletes a depth-stencil state. No-op if `state` was never created.
    fn delete_depth_stencil_state(&self, state: &mut DepthStencilState);

    /// Creates an immutable rasterizer state.
    /// ## Errors
    /// * `GraphicsError::ResourceCreation` - If the native state object
    ///   cannot be created.
    fn create_rasterizer_state(
        &self,
        state: &mut RasterizerState,
        desc: &RasterizerStateDescriptor,
    ) -> Result<(), GraphicsError>;

    /// Deletes a rasterizer state. No-op if `state` was never created.
    fn delete_rasterizer_state(&self, state: &mut RasterizerState);

    /// Creates a buffer, optionally filled with `data`.
    ///
    /// A requested size of 0 allocates 1 byte; uniform buffer sizes are
    /// rounded up to a multiple of 16.
    /// ## Errors
    /// * `GraphicsError::ResourceCreation` - If the native buffer cannot
    ///   be allocated.
    fn create_buffer(
        &self,
        buffer: &mut Buffer,
        desc: &BufferDescriptor,
        data: Option<&[u8]>,
    ) -> Result<(), GraphicsError>;

    /// Uploads `data` at `offset` bytes into `buffer`.
    fn write_buffer(&self, buffer: &mut Buffer, data: &[u8], offset: u32);

    /// Deletes a buffer. Reclamation may be deferred to the next `tick`.
    fn delete_buffer(&self, buffer: &mut Buffer);

    /// Creates an attributes state from buffer bindings.
    fn create_attributes_state(
        &self,
        state: &mut AttributesState,
        desc: &AttributesStateDescriptor<'_>,
    ) -> Result<(), GraphicsError>;

    /// Binds an attributes state for subsequent draws, realizing the
    /// native vertex array from `layout` on first use where the backend
    /// needs one.
    fn bind_attributes_state(&self, state: &mut AttributesState, layout: &InputLayout);

    /// Deletes an attributes state.
    fn delete_attributes_state(&self, state: &mut AttributesState);

    /// Creates an input layout; `program` supplies the vertex bytecode on
    /// backends that validate the layout against it.
    fn create_input_layout(
        &self,
        layout: &mut InputLayout,
        desc: &InputLayoutDescriptor<'_>,
        program: &Program,
    ) -> Result<(), GraphicsError>;

    /// Deletes an input layout.
    fn delete_input_layout(&self, layout: &mut InputLayout);

    /// Creates a texture with zero-initialized storage for its full mip
    /// chain and default sampling parameters.
    /// ## Errors
    /// * `GraphicsError::ResourceCreation` - If the native texture cannot
    ///   be allocated.
    fn create_texture(
        &self,
        texture: &mut Texture,
        desc: &TextureDescriptor,
    ) -> Result<(), GraphicsError>;

    /// Uploads texel data to one mip level. `offset` is the starting
    /// depth slice (or array layer); `width`/`height`/`depth` describe
    /// the uploaded region.
    #[allow(clippy::too_many_arguments)]
    fn write_texture(
        &self,
        texture: &mut Texture,
        level: u8,
        offset: u32,
        width: u32,
        height: u32,
        depth: u32,
        data: &[u8],
    );

    /// Changes coordinate addressing. Takes effect on the next sampler
    /// materialization or immediately on backends with mutable samplers.
    fn set_texture_addressing(
        &self,
        texture: &mut Texture,
        u: TextureAddressing,
        v: TextureAddressing,
        w: TextureAddressing,
    );

    /// Changes min/mag/mip filtering.
    fn set_texture_filtering(
        &self,
        texture: &mut Texture,
        min: Filtering,
        mag: Filtering,
        mip: Filtering,
    );

    /// Changes the maximum anisotropy (1 disables it).
    fn set_texture_anisotropy(&self, texture: &mut Texture, anisotropy: u32);

    /// Restricts sampling to mip levels `[base, max]`.
    fn set_texture_levels(&self, texture: &mut Texture, base: u32, max: u32);

    /// Deletes a texture together with any realized view and sampler.
    fn delete_texture(&self, texture: &mut Texture);

    /// Compiles a shader stage.
    /// ## Errors
    /// * `GraphicsError::ShaderCompilation` - With the native info log on
    ///   failure.
    fn create_shader(
        &self,
        shader: &mut Shader,
        desc: &ShaderDescriptor<'_>,
    ) -> Result<(), GraphicsError>;

    /// Deletes a shader. Programs linked from it stay valid.
    fn delete_shader(&self, shader: &mut Shader);

    /// Links a program from compiled stages and resolves its named
    /// bindings.
    /// ## Errors
    /// * `GraphicsError::ProgramLink` - With the native info log on
    ///   failure.
    fn create_program(
        &self,
        program: &mut Program,
        desc: &ProgramDescriptor<'_>,
    ) -> Result<(), GraphicsError>;

    /// Deletes a program.
    fn delete_program(&self, program: &mut Program);

    /// Binds `size` bytes of `buffer` at `offset` to uniform slot `slot`.
    ///
    /// `offset` must be a multiple of
    /// [`DeviceCaps::uniform_buffer_alignment`].
    fn bind_uniform_buffer(&self, slot: u32, buffer: &Buffer, size: u32, offset: u32);

    /// Binds textures to consecutive sampler slots starting at `first`,
    /// materializing missing views and samplers. `None` entries unbind
    /// their slot.
    fn bind_samplers(&self, first: u32, textures: &mut [Option<&mut Texture>]);

    /// Creates an empty render target.
    fn create_render_target(&self, target: &mut RenderTarget) -> Result<(), GraphicsError>;

    /// Makes `target` (or the default target when `None`) the destination
    /// of subsequent draws.
    fn bind_render_target(&self, target: Option<&RenderTarget>);

    /// Attaches `texture` at `attachment`.
    fn set_render_target_texture(
        &self,
        target: &mut RenderTarget,
        attachment: Attachment,
        texture: &Texture,
    );

    /// Replaces the list of color attachments written by draws. The list
    /// is independent of which attachment points hold textures.
    fn set_render_target_draw_buffers(&self, target: &mut RenderTarget, buffers: &[Attachment]);

    /// Copies/resolves the planes in `mask` from `src` to `dst`, using
    /// color attachment `src_color`/`dst_color` for the color plane. The
    /// copied region is inferred from the attached textures.
    fn resolve_render_target(
        &self,
        src: &RenderTarget,
        dst: &RenderTarget,
        mask: ResolveMask,
        src_color: u8,
        dst_color: u8,
    );

    /// Deletes a render target. Attached textures are untouched.
    fn delete_render_target(&self, target: &mut RenderTarget);

    /// Creates a pipeline state grouping a program, fixed-function states
    /// and an input layout.
    fn create_pipeline_state(
        &self,
        state: &mut PipelineState,
        desc: &PipelineStateDescriptor<'_>,
    ) -> Result<(), GraphicsError>;

    /// Applies a pipeline state: program, then rasterizer, depth-stencil
    /// and blend. Re-binding the current pipeline is free.
    fn bind_pipeline_state(&self, state: &PipelineState);

    /// Deletes a pipeline state. The sub-states it copied are untouched.
    fn delete_pipeline_state(&self, state: &mut PipelineState);

    /// Sets the viewport rectangle.
    fn set_viewport(&self, x: i32, y: i32, width: u32, height: u32);

    /// Sets the scissor rectangle.
    fn set_scissor(&self, x: i32, y: i32, width: u32, height: u32);

    /// Sets the rasterized line width.
    fn set_line_width(&self, width: f32);

    /// Sets the rasterized point size.
    fn set_point_size(&self, size: f32);
}
