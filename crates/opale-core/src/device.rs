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

//! The backend-agnostic device facade.
//!
//! [`Device`] wraps a boxed [`GraphicsDevice`] and adds what every
//! backend shares: per-frame draw accounting and uniform buffer size
//! rounding. Everything else forwards straight to the backend through a
//! single indirect call.

use crate::api::*;
use crate::error::GraphicsError;
use crate::traits::{DeviceCaps, GraphicsDevice};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Sink for backend diagnostics (native error codes, validation
/// messages). Invoked from whatever thread hit the condition.
pub type DiagnosticSink = Arc<dyn Fn(&str) + Send + Sync>;

/// Options shared by every backend constructor.
#[derive(Clone, Default)]
pub struct DeviceConfig {
    /// Receives native diagnostics. When `None`, diagnostics go to the
    /// `log` facade at warn level.
    pub diagnostics: Option<DiagnosticSink>,
}

impl std::fmt::Debug for DeviceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceConfig")
            .field("diagnostics", &self.diagnostics.is_some())
            .finish()
    }
}

/// Frame counters sampled from a [`Device`].
///
/// `draw_calls` is always maintained; the primitive counters are only
/// maintained in debug builds and read 0 in release builds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameStats {
    /// Draw calls issued since the last tick.
    pub draw_calls: u64,
    /// Triangles submitted since the last tick (debug builds).
    pub triangles: u64,
    /// Points submitted since the last tick (debug builds).
    pub points: u64,
    /// Lines submitted since the last tick (debug builds).
    pub lines: u64,
}

#[derive(Debug, Default)]
struct Counters {
    draw_calls: AtomicU64,
    #[cfg(debug_assertions)]
    triangles: AtomicU64,
    #[cfg(debug_assertions)]
    points: AtomicU64,
    #[cfg(debug_assertions)]
    lines: AtomicU64,
}

/// A graphics device: one backend plus frame accounting.
#[derive(Debug)]
pub struct Device {
    backend: Box<dyn GraphicsDevice>,
    counters: Counters,
}

impl Device {
    /// Wraps a constructed backend.
    pub fn new(backend: Box<dyn GraphicsDevice>) -> Self {
        Self {
            backend,
            counters: Counters::default(),
        }
    }

    /// Returns the static limits of the backend.
    pub fn caps(&self) -> DeviceCaps {
        self.backend.caps()
    }

    /// Current frame counters.
    pub fn stats(&self) -> FrameStats {
        #[cfg(debug_assertions)]
        {
            FrameStats {
                draw_calls: self.counters.draw_calls.load(Ordering::Relaxed),
                triangles: self.counters.triangles.load(Ordering::Relaxed),
                points: self.counters.points.load(Ordering::Relaxed),
                lines: self.counters.lines.load(Ordering::Relaxed),
            }
        }
        #[cfg(not(debug_assertions))]
        {
            FrameStats {
                draw_calls: self.counters.draw_calls.load(Ordering::Relaxed),
                ..FrameStats::default()
            }
        }
    }

    /// Rounds `size` up to the smallest multiple of the backend's
    /// uniform buffer alignment that holds it.
    pub fn uniform_buffer_size(&self, size: u32) -> u32 {
        let align = self.backend.caps().uniform_buffer_alignment.max(1);
        (size + align - 1) - (size + align - 1) % align
    }

    /// Ends the frame: resets the counters, then drains the backend's
    /// deferred reclamation.
    pub fn tick(&self) {
        self.counters.draw_calls.store(0, Ordering::Relaxed);
        #[cfg(debug_assertions)]
        {
            self.counters.triangles.store(0, Ordering::Relaxed);
            self.counters.points.store(0, Ordering::Relaxed);
            self.counters.lines.store(0, Ordering::Relaxed);
        }
        self.backend.tick();
    }

    fn count_draw(&self, primitive: PrimitiveType, count: u32, instances: u32) {
        self.counters.draw_calls.fetch_add(1, Ordering::Relaxed);
        #[cfg(debug_assertions)]
        {
            let submitted = match primitive {
                PrimitiveType::Triangles => count / 3,
                PrimitiveType::Points => count,
                PrimitiveType::Lines => count / 2,
            } as u64
                * instances as u64;
            let counter = match primitive {
                PrimitiveType::Triangles => &self.counters.triangles,
                PrimitiveType::Points => &self.counters.points,
                PrimitiveType::Lines => &self.counters.lines,
            };
            counter.fetch_add(submitted, Ordering::Relaxed);
        }
        #[cfg(not(debug_assertions))]
        {
            let _ = (primitive, count, instances);
        }
    }

    /// Clears one color attachment of `target`, or of the default target
    /// when `None`.
    pub fn clear_color(
        &self,
        target: Option<&RenderTarget>,
        attachment: Attachment,
        color: [f32; 4],
    ) {
        self.backend.clear_color(target, attachment, color);
    }

    /// Clears depth and stencil of `target`, or of the default target
    /// when `None`.
    pub fn clear_depth_stencil(&self, target: Option<&RenderTarget>, depth: f32, stencil: u8) {
        self.backend.clear_depth_stencil(target, depth, stencil);
    }

    /// Draws `count` vertices starting at `offset`.
    pub fn draw(&self, primitive: PrimitiveType, count: u32, offset: u32) {
        self.count_draw(primitive, count, 1);
        self.backend.draw(primitive, count, offset);
    }

    /// Draws `count` vertices, `instances` times.
    pub fn draw_instanced(&self, primitive: PrimitiveType, count: u32, offset: u32, instances: u32) {
        self.count_draw(primitive, count, instances);
        self.backend.draw_instanced(primitive, count, offset, instances);
    }

    /// Draws `count` indices starting at index `offset`.
    pub fn draw_indexed(&self, primitive: PrimitiveType, count: u32, offset: u32) {
        self.count_draw(primitive, count, 1);
        self.backend.draw_indexed(primitive, count, offset);
    }

    /// Draws `count` indices, `instances` times.
    pub fn draw_indexed_instanced(
        &self,
        primitive: PrimitiveType,
        count: u32,
        offset: u32,
        instances: u32,
    ) {
        self.count_draw(primitive, count, instances);
        self.backend
            .draw_indexed_instanced(primitive, count, offset, instances);
    }

    /// See [`GraphicsDevice::create_blend_state`].
    pub fn create_blend_state(
        &self,
        state: &mut BlendState,
        desc: &BlendStateDescriptor,
    ) -> Result<(), GraphicsError> {
        self.backend.create_blend_state(state, desc)
    }

    /// See [`GraphicsDevice::delete_blend_state`].
    pub fn delete_blend_state(&self, state: &mut BlendState) {
        self.backend.delete_blend_state(state);
    }

    /// See [`GraphicsDevice::create_depth_stencil_state`].
    pub fn create_depth_stencil_state(
        &self,
        state: &mut DepthStencilState,
        desc: &DepthStencilStateDescriptor,
    ) -> Result<(), GraphicsError> {
        self.backend.create_depth_stencil_state(state, desc)
    }

    /// See [`GraphicsDevice::delete_depth_stencil_state`].
    pub fn delete_depth_stencil_state(&self, state: &mut DepthStencilState) {
        self.backend.delete_depth_stencil_state(state);
    }

    /// See [`GraphicsDevice::create_rasterizer_state`].
    pub fn create_rasterizer_state(
        &self,
        state: &mut RasterizerState,
        desc: &RasterizerStateDescriptor,
    ) -> Result<(), GraphicsError> {
        self.backend.create_rasterizer_state(state, desc)
    }

    /// See [`GraphicsDevice::delete_rasterizer_state`].
    pub fn delete_rasterizer_state(&self, state: &mut RasterizerState) {
        self.backend.delete_rasterizer_state(state);
    }

    /// See [`GraphicsDevice::create_buffer`].
    pub fn create_buffer(
        &self,
        buffer: &mut Buffer,
        desc: &BufferDescriptor,
        data: Option<&[u8]>,
    ) -> Result<(), GraphicsError> {
        self.backend.create_buffer(buffer, desc, data)
    }

    /// See [`GraphicsDevice::write_buffer`].
    pub fn write_buffer(&self, buffer: &mut Buffer, data: &[u8], offset: u32) {
        self.backend.write_buffer(buffer, data, offset);
    }

    /// See [`GraphicsDevice::delete_buffer`].
    pub fn delete_buffer(&self, buffer: &mut Buffer) {
        self.backend.delete_buffer(buffer);
    }

    /// See [`GraphicsDevice::create_attributes_state`].
    pub fn create_attributes_state(
        &self,
        state: &mut AttributesState,
        desc: &AttributesStateDescriptor<'_>,
    ) -> Result<(), GraphicsError> {
        self.backend.create_attributes_state(state, desc)
    }

    /// See [`GraphicsDevice::bind_attributes_state`].
    pub fn bind_attributes_state(&self, state: &mut AttributesState, layout: &InputLayout) {
        self.backend.bind_attributes_state(state, layout);
    }

    /// See [`GraphicsDevice::delete_attributes_state`].
    pub fn delete_attributes_state(&self, state: &mut AttributesState) {
        self.backend.delete_attributes_state(state);
    }

    /// See [`GraphicsDevice::create_input_layout`].
    pub fn create_input_layout(
        &self,
        layout: &mut InputLayout,
        desc: &InputLayoutDescriptor<'_>,
        program: &Program,
    ) -> Result<(), GraphicsError> {
        self.backend.create_input_layout(layout, desc, program)
    }

    /// See [`GraphicsDevice::delete_input_layout`].
    pub fn delete_input_layout(&self, layout: &mut InputLayout) {
        self.backend.delete_input_layout(layout);
    }

    /// See [`GraphicsDevice::create_texture`].
    pub fn create_texture(
        &self,
        texture: &mut Texture,
        desc: &TextureDescriptor,
    ) -> Result<(), GraphicsError> {
        self.backend.create_texture(texture, desc)
    }

    /// See [`GraphicsDevice::write_texture`].
    #[allow(clippy::too_many_arguments)]
    pub fn write_texture(
        &self,
        texture: &mut Texture,
        level: u8,
        offset: u32,
        width: u32,
        height: u32,
        depth: u32,
        data: &[u8],
    ) {
        self.backend
            .write_texture(texture, level, offset, width, height, depth, data);
    }

    /// See [`GraphicsDevice::set_texture_addressing`].
    pub fn set_texture_addressing(
        &self,
        texture: &mut Texture,
        u: TextureAddressing,
        v: TextureAddressing,
        w: TextureAddressing,
    ) {
        self.backend.set_texture_addressing(texture, u, v, w);
    }

    /// See [`GraphicsDevice::set_texture_filtering`].
    pub fn set_texture_filtering(
        &self,
        texture: &mut Texture,
        min: Filtering,
        mag: Filtering,
        mip: Filtering,
    ) {
        self.backend.set_texture_filtering(texture, min, mag, mip);
    }

    /// See [`GraphicsDevice::set_texture_anisotropy`].
    pub fn set_texture_anisotropy(&self, texture: &mut Texture, anisotropy: u32) {
        self.backend.set_texture_anisotropy(texture, anisotropy);
    }

    /// See [`GraphicsDevice::set_texture_levels`].
    pub fn set_texture_levels(&self, texture: &mut Texture, base: u32, max: u32) {
        self.backend.set_texture_levels(texture, base, max);
    }

    /// See [`GraphicsDevice::delete_texture`].
    pub fn delete_texture(&self, texture: &mut Texture) {
        self.backend.delete_texture(texture);
    }

    /// See [`GraphicsDevice::create_shader`].
    pub fn create_shader(
        &self,
        shader: &mut Shader,
        desc: &ShaderDescriptor<'_>,
    ) -> Result<(), GraphicsError> {
        self.backend.create_shader(shader, desc)
    }

    /// See [`GraphicsDevice::delete_shader`].
    pub fn delete_shader(&self, shader: &mut Shader) {
        self.backend.delete_shader(shader);
    }

    /// See [`GraphicsDevice::create_program`].
    pub fn create_program(
        &self,
        program: &mut Program,
        desc: &ProgramDescriptor<'_>,
    ) -> Result<(), GraphicsError> {
        self.backend.create_program(program, desc)
    }

    /// See [`GraphicsDevice::delete_program`].
    pub fn delete_program(&self, program: &mut Program) {
        self.backend.delete_program(program);
    }

    /// See [`GraphicsDevice::bind_uniform_buffer`].
    pub fn bind_uniform_buffer(&self, slot: u32, buffer: &Buffer, size: u32, offset: u32) {
        debug_assert_eq!(
            offset % self.backend.caps().uniform_buffer_alignment.max(1),
            0,
            "uniform buffer offset must honor the device alignment"
        );
        self.backend.bind_uniform_buffer(slot, buffer, size, offset);
    }

    /// See [`GraphicsDevice::bind_samplers`].
    pub fn bind_samplers(&self, first: u32, textures: &mut [Option<&mut Texture>]) {
        self.backend.bind_samplers(first, textures);
    }

    /// See [`GraphicsDevice::create_render_target`].
    pub fn create_render_target(&self, target: &mut RenderTarget) -> Result<(), GraphicsError> {
        self.backend.create_render_target(target)
    }

    /// See [`GraphicsDevice::bind_render_target`].
    pub fn bind_render_target(&self, target: Option<&RenderTarget>) {
        self.backend.bind_render_target(target);
    }

    /// See [`GraphicsDevice::set_render_target_texture`].
    pub fn set_render_target_texture(
        &self,
        target: &mut RenderTarget,
        attachment: Attachment,
        texture: &Texture,
    ) {
        self.backend.set_render_target_texture(target, attachment, texture);
    }

    /// See [`GraphicsDevice::set_render_target_draw_buffers`].
    pub fn set_render_target_draw_buffers(
        &self,
        target: &mut RenderTarget,
        buffers: &[Attachment],
    ) {
        self.backend.set_render_target_draw_buffers(target, buffers);
    }

    /// See [`GraphicsDevice::resolve_render_target`].
    pub fn resolve_render_target(
        &self,
        src: &RenderTarget,
        dst: &RenderTarget,
        mask: ResolveMask,
        src_color: u8,
        dst_color: u8,
    ) {
        self.backend
            .resolve_render_target(src, dst, mask, src_color, dst_color);
    }

    /// See [`GraphicsDevice::delete_render_target`].
    pub fn delete_render_target(&self, target: &mut RenderTarget) {
        self.backend.delete_render_target(target);
    }

    /// See [`GraphicsDevice::create_pipeline_state`].
    pub fn create_pipeline_state(
        &self,
        state: &mut PipelineState,
        desc: &PipelineStateDescriptor<'_>,
    ) -> Result<(), GraphicsError> {
        self.backend.create_pipeline_state(state, desc)
    }

    /// See [`GraphicsDevice::bind_pipeline_state`].
    pub fn bind_pipeline_state(&self, state: &PipelineState) {
        self.backend.bind_pipeline_state(state);
    }

    /// See [`GraphicsDevice::delete_pipeline_state`].
    pub fn delete_pipeline_state(&self, state: &mut PipelineState) {
        self.backend.delete_pipeline_state(state);
    }

    /// Sets the viewport rectangle.
    pub fn set_viewport(&self, x: i32, y: i32, width: u32, height: u32) {
        self.backend.set_viewport(x, y, width, height);
    }

    /// Sets the scissor rectangle.
    pub fn set_scissor(&self, x: i32, y: i32, width: u32, height: u32) {
        self.backend.set_scissor(x, y, width, height);
    }

    /// Sets the rasterized line width.
    pub fn set_line_width(&self, width: f32) {
        self.backend.set_line_width(width);
    }

    /// Sets the rasterized point size.
    pub fn set_point_size(&self, size: f32) {
        self.backend.set_point_size(size);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A backend that does nothing; enough to exercise the facade.
    #[derive(Debug)]
    struct NullBackend {
        caps: DeviceCaps,
    }

    impl NullBackend {
        fn boxed(alignment: u32) -> Box<dyn GraphicsDevice> {
            Box::new(Self {
                caps: DeviceCaps {
                    uniform_buffer_alignment: alignment,
                    max_samplers: 16,
                    max_msaa_samples: 8,
                },
            })
        }
    }

    impl GraphicsDevice for NullBackend {
        fn caps(&self) -> DeviceCaps {
            self.caps
        }
        fn tick(&self) {}
        fn clear_color(&self, _: Option<&RenderTarget>, _: Attachment, _: [f32; 4]) {}
        fn clear_depth_stencil(&self, _: Option<&RenderTarget>, _: f32, _: u8) {}
        fn draw(&self, _: PrimitiveType, _: u32, _: u32) {}
        fn draw_instanced(&self, _: PrimitiveType, _: u32, _: u32, _: u32) {}
        fn draw_indexed(&self, _: PrimitiveType, _: u32, _: u32) {}
        fn draw_indexed_instanced(&self, _: PrimitiveType, _: u32, _: u32, _: u32) {}
        fn create_blend_state(
            &self,
            state: &mut BlendState,
            desc: &BlendStateDescriptor,
        ) -> Result<(), GraphicsError> {
            state.handle = Handle::Id(1);
            state.desc = *desc;
            Ok(())
        }
        fn delete_blend_state(&self, state: &mut BlendState) {
            state.handle.take();
        }
        fn create_depth_stencil_state(
            &self,
            state: &mut DepthStencilState,
            desc: &DepthStencilStateDescriptor,
        ) -> Result<(), GraphicsError> {
            state.handle = Handle::Id(1);
            state.desc = *desc;
            Ok(())
        }
        fn delete_depth_stencil_state(&self, state: &mut DepthStencilState) {
            state.handle.take();
        }
        fn create_rasterizer_state(
            &self,
            state: &mut RasterizerState,
            desc: &RasterizerStateDescriptor,
        ) -> Result<(), GraphicsError> {
            state.handle = Handle::Id(1);
            state.desc = *desc;
            Ok(())
        }
        fn delete_rasterizer_state(&self, state: &mut RasterizerState) {
            state.handle.take();
        }
        fn create_buffer(
            &self,
            buffer: &mut Buffer,
            desc: &BufferDescriptor,
            _: Option<&[u8]>,
        ) -> Result<(), GraphicsError> {
            buffer.handle = Handle::Id(1);
            buffer.size = desc.size.max(1);
            Ok(())
        }
        fn write_buffer(&self, _: &mut Buffer, _: &[u8], _: u32) {}
        fn delete_buffer(&self, buffer: &mut Buffer) {
            buffer.handle.take();
        }
        fn create_attributes_state(
            &self,
            _: &mut AttributesState,
            _: &AttributesStateDescriptor<'_>,
        ) -> Result<(), GraphicsError> {
            Ok(())
        }
        fn bind_attributes_state(&self, _: &mut AttributesState, _: &InputLayout) {}
        fn delete_attributes_state(&self, _: &mut AttributesState) {}
        fn create_input_layout(
            &self,
            _: &mut InputLayout,
            _: &InputLayoutDescriptor<'_>,
            _: &Program,
        ) -> Result<(), GraphicsError> {
            Ok(())
        }
        fn delete_input_layout(&self, _: &mut InputLayout) {}
        fn create_texture(
            &self,
            _: &mut Texture,
            _: &TextureDescriptor,
        ) -> Result<(), GraphicsError> {
            Ok(())
        }
        fn write_texture(&self, _: &mut Texture, _: u8, _: u32, _: u32, _: u32, _: u32, _: &[u8]) {
        }
        fn set_texture_addressing(
            &self,
            _: &mut Texture,
            _: TextureAddressing,
            _: TextureAddressing,
            _: TextureAddressing,
        ) {
        }
        fn set_texture_filtering(&self, _: &mut Texture, _: Filtering, _: Filtering, _: Filtering) {
        }
        fn set_texture_anisotropy(&self, _: &mut Texture, _: u32) {}
        fn set_texture_levels(&self, _: &mut Texture, _: u32, _: u32) {}
        fn delete_texture(&self, _: &mut Texture) {}
        fn create_shader(
            &self,
            _: &mut Shader,
            _: &ShaderDescriptor<'_>,
        ) -> Result<(), GraphicsError> {
            Ok(())
        }
        fn delete_shader(&self, _: &mut Shader) {}
        fn create_program(
            &self,
            _: &mut Program,
            _: &ProgramDescriptor<'_>,
        ) -> Result<(), GraphicsError> {
            Ok(())
        }
        fn delete_program(&self, _: &mut Program) {}
        fn bind_uniform_buffer(&self, _: u32, _: &Buffer, _: u32, _: u32) {}
        fn bind_samplers(&self, _: u32, _: &mut [Option<&mut Texture>]) {}
        fn create_render_target(&self, _: &mut RenderTarget) -> Result<(), GraphicsError> {
            Ok(())
        }
        fn bind_render_target(&self, _: Option<&RenderTarget>) {}
        fn set_render_target_texture(&self, _: &mut RenderTarget, _: Attachment, _: &Texture) {}
        fn set_render_target_draw_buffers(&self, _: &mut RenderTarget, _: &[Attachment]) {}
        fn resolve_render_target(&self, _: &RenderTarget, _: &RenderTarget, _: ResolveMask, _: u8, _: u8) {
        }
        fn delete_render_target(&self, _: &mut RenderTarget) {}
        fn create_pipeline_state(
            &self,
            _: &mut PipelineState,
            _: &PipelineStateDescriptor<'_>,
        ) -> Result<(), GraphicsError> {
            Ok(())
        }
        fn bind_pipeline_state(&self, _: &PipelineState) {}
        fn delete_pipeline_state(&self, _: &mut PipelineState) {}
        fn set_viewport(&self, _: i32, _: i32, _: u32, _: u32) {}
        fn set_scissor(&self, _: i32, _: i32, _: u32, _: u32) {}
        fn set_line_width(&self, _: f32) {}
        fn set_point_size(&self, _: f32) {}
    }

    #[test]
    fn test_uniform_buffer_size_rounds_up() {
        let device = Device::new(NullBackend::boxed(256));
        assert_eq!(device.uniform_buffer_size(0), 0);
        assert_eq!(device.uniform_buffer_size(1), 256);
        assert_eq!(device.uniform_buffer_size(255), 256);
        assert_eq!(device.uniform_buffer_size(256), 256);
        assert_eq!(device.uniform_buffer_size(257), 512);

        let device = Device::new(NullBackend::boxed(64));
        assert_eq!(device.uniform_buffer_size(130), 192);
    }

    #[test]
    fn test_draw_counters_accumulate_and_reset() {
        let device = Device::new(NullBackend::boxed(256));

        device.draw(PrimitiveType::Triangles, 6, 0);
        device.draw_instanced(PrimitiveType::Triangles, 3, 0, 4);
        device.draw_indexed(PrimitiveType::Lines, 10, 0);
        device.draw_indexed_instanced(PrimitiveType::Points, 5, 0, 2);

        let stats = device.stats();
        assert_eq!(stats.draw_calls, 4);
        assert_eq!(stats.triangles, 2 + 4);
        assert_eq!(stats.lines, 5);
        assert_eq!(stats.points, 10);

        device.tick();
        assert_eq!(device.stats(), FrameStats::default());
    }

    #[test]
    fn test_state_lifecycle_through_facade() {
        let device = Device::new(NullBackend::boxed(256));
        let mut blend = BlendState::default();
        device
            .create_blend_state(&mut blend, &BlendStateDescriptor::default())
            .unwrap();
        assert!(blend.handle.is_some());
        device.delete_blend_state(&mut blend);
        assert!(blend.handle.is_none());
        // Deleting an already-empty state stays a no-op.
        device.delete_blend_state(&mut blend);
        assert!(blend.handle.is_none());
    }
}
