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

//! The OpenGL 3.3 device.
//!
//! Edits go through bind-to-edit entry points; the context state mirror
//! keeps the bind churn off the driver.

use core::ffi::c_void;

use opale_core::api::*;
use opale_core::device::DeviceConfig;
use opale_core::error::GraphicsError;
use opale_core::traits::{DeviceCaps, GraphicsDevice};

use super::api::*;
use super::convert;
use super::shared::GlShared;
use super::state::MAX_SAMPLER_UNITS;

/// A device over an OpenGL 3.3 context.
///
/// The context must be current on the thread that constructed the device
/// for every call except resource deletion, which is deferred and runs in
/// [`tick`](GraphicsDevice::tick).
#[derive(Debug)]
pub struct Gl3Device {
    shared: GlShared,
    compat: GlCompat,
}

impl Gl3Device {
    /// Builds a device over the current context, resolving every entry
    /// point through `loader`.
    ///
    /// ## Errors
    /// * `GraphicsError::MissingEntryPoint` - If the context does not
    ///   expose a required 3.3 entry point.
    pub fn new(
        config: &DeviceConfig,
        loader: &mut dyn FnMut(&str) -> *const c_void,
    ) -> Result<Self, GraphicsError> {
        let core = GlCore::load(loader)?;
        let compat = GlCompat::load(loader)?;
        let shared = GlShared::new(core, config);
        log::info!(
            "gl3 device ready (uniform alignment {}, {} sampler slots, {}x msaa)",
            shared.caps.uniform_buffer_alignment,
            shared.caps.max_samplers,
            shared.caps.max_msaa_samples
        );
        Ok(Self { shared, compat })
    }

    /// Binds `name` on the current active unit for an edit, keeping the
    /// unit cache in sync.
    fn bind_texture_for_edit(&self, target: GLenum, name: GLuint) {
        let mut state = self.shared.state();
        let unit = state.active_texture as usize;
        if state.textures[unit] != name {
            state.textures[unit] = name;
            unsafe { (self.compat.bind_texture)(target, name) };
        }
    }

    fn allocate_texture_storage(&self, desc: &TextureDescriptor, target: GLenum) {
        let internal = convert::internal_format(desc.format);
        unsafe {
            match desc.kind {
                TextureKind::D2Multisample => {
                    (self.compat.tex_image_2d_multisample)(
                        target,
                        desc.samples as GLsizei,
                        internal,
                        desc.width as GLsizei,
                        desc.height as GLsizei,
                        GL_TRUE,
                    );
                }
                TextureKind::D2ArrayMultisample => {
                    (self.compat.tex_image_3d_multisample)(
                        target,
                        desc.samples as GLsizei,
                        internal,
                        desc.width as GLsizei,
                        desc.height as GLsizei,
                        desc.depth as GLsizei,
                        GL_TRUE,
                    );
                }
                TextureKind::D2 => {
                    for level in 0..desc.levels.max(1) {
                        let width = Texture::level_extent(desc.width, level);
                        let height = Texture::level_extent(desc.height, level);
                        if desc.format.is_compressed() {
                            (self.compat.compressed_tex_image_2d)(
                                target,
                                level as GLint,
                                internal,
                                width as GLsizei,
                                height as GLsizei,
                                0,
                                desc.format.surface_size(width, height) as GLsizei,
                                core::ptr::null(),
                            );
                        } else {
                            (self.compat.tex_image_2d)(
                                target,
                                level as GLint,
                                internal as GLint,
                                width as GLsizei,
                                height as GLsizei,
                                0,
                                convert::external_format(desc.format),
                                convert::external_type(desc.format),
                                core::ptr::null(),
                            );
                        }
                    }
                }
                TextureKind::D2Array | TextureKind::D3 => {
                    for level in 0..desc.levels.max(1) {
                        let width = Texture::level_extent(desc.width, level);
                        let height = Texture::level_extent(desc.height, level);
                        // Array layers do not shrink with the mip chain.
                        let depth = if desc.kind == TextureKind::D3 {
                            Texture::level_extent(desc.depth, level)
                        } else {
                            desc.depth
                        };
                        if desc.format.is_compressed() {
                            (self.compat.compressed_tex_image_3d)(
                                target,
                                level as GLint,
                                internal,
                                width as GLsizei,
                                height as GLsizei,
                                depth as GLsizei,
                                0,
                                (desc.format.surface_size(width, height) * depth) as GLsizei,
                                core::ptr::null(),
                            );
                        } else {
                            (self.compat.tex_image_3d)(
                                target,
                                level as GLint,
                                internal as GLint,
                                width as GLsizei,
                                height as GLsizei,
                                depth as GLsizei,
                                0,
                                convert::external_format(desc.format),
                                convert::external_type(desc.format),
                                core::ptr::null(),
                            );
                        }
                    }
                }
            }
        }
    }

    fn attach(&self, target: &RenderTarget, attachment: Attachment, name: GLuint) {
        let mut state = self.shared.state();
        self.shared
            .bind_draw_framebuffer(&mut state, target.handle.id_pair().0);
        unsafe {
            match attachment {
                Attachment::DepthStencil => {
                    (self.compat.framebuffer_texture)(GL_DRAW_FRAMEBUFFER, GL_DEPTH_ATTACHMENT, name, 0);
                    (self.compat.framebuffer_texture)(
                        GL_DRAW_FRAMEBUFFER,
                        GL_STENCIL_ATTACHMENT,
                        name,
                        0,
                    );
                }
                Attachment::Color(index) => {
                    (self.compat.framebuffer_texture)(
                        GL_DRAW_FRAMEBUFFER,
                        GL_COLOR_ATTACHMENT0 + index as GLenum,
                        name,
                        0,
                    );
                }
            }
        }
        if cfg!(debug_assertions) {
            let status = unsafe { (self.compat.check_framebuffer_status)(GL_DRAW_FRAMEBUFFER) };
            if status != GL_FRAMEBUFFER_COMPLETE {
                self.shared
                    .report(&format!("render target incomplete (status 0x{status:04X})"));
            }
        }
    }
}

impl GraphicsDevice for Gl3Device {
    fn caps(&self) -> DeviceCaps {
        self.shared.caps
    }

    fn tick(&self) {
        self.shared.tick();
    }

    fn clear_color(&self, target: Option<&RenderTarget>, attachment: Attachment, color: [f32; 4]) {
        let name = target.map(|t| t.handle.id_pair().0).unwrap_or(0);
        let index = match (target, attachment) {
            (Some(_), Attachment::Color(index)) => index as GLint,
            _ => 0,
        };
        let mut state = self.shared.state();
        self.shared.bind_draw_framebuffer(&mut state, name);
        unsafe { (self.compat.clear_bufferfv)(GL_COLOR, index, color.as_ptr()) };
        drop(state);
        self.shared.check_errors("clear_color");
    }

    fn clear_depth_stencil(&self, target: Option<&RenderTarget>, depth: f32, stencil: u8) {
        let name = target.map(|t| t.handle.id_pair().0).unwrap_or(0);
        let mut state = self.shared.state();
        self.shared.bind_draw_framebuffer(&mut state, name);
        unsafe { (self.compat.clear_bufferfi)(GL_DEPTH_STENCIL, 0, depth, stencil as GLint) };
        drop(state);
        self.shared.check_errors("clear_depth_stencil");
    }

    fn draw(&self, primitive: PrimitiveType, count: u32, offset: u32) {
        self.shared.draw(primitive, count, offset);
    }

    fn draw_instanced(&self, primitive: PrimitiveType, count: u32, offset: u32, instances: u32) {
        self.shared.draw_instanced(primitive, count, offset, instances);
    }

    fn draw_indexed(&self, primitive: PrimitiveType, count: u32, offset: u32) {
        self.shared.draw_indexed(primitive, count, offset);
    }

    fn draw_indexed_instanced(
        &self,
        primitive: PrimitiveType,
        count: u32,
        offset: u32,
        instances: u32,
    ) {
        self.shared
            .draw_indexed_instanced(primitive, count, offset, instances);
    }

    fn create_blend_state(
        &self,
        state: &mut BlendState,
        desc: &BlendStateDescriptor,
    ) -> Result<(), GraphicsError> {
        self.shared.create_blend_state(state, desc)
    }

    fn delete_blend_state(&self, state: &mut BlendState) {
        state.handle.take();
    }

    fn create_depth_stencil_state(
        &self,
        state: &mut DepthStencilState,
        desc: &DepthStencilStateDescriptor,
    ) -> Result<(), GraphicsError> {
        self.shared.create_depth_stencil_state(state, desc)
    }

    fn delete_depth_stencil_state(&self, state: &mut DepthStencilState) {
        state.handle.take();
    }

    fn create_rasterizer_state(
        &self,
        state: &mut RasterizerState,
        desc: &RasterizerStateDescriptor,
    ) -> Result<(), GraphicsError> {
        self.shared.create_rasterizer_state(state, desc)
    }

    fn delete_rasterizer_state(&self, state: &mut RasterizerState) {
        state.handle.take();
    }

    fn create_buffer(
        &self,
        buffer: &mut Buffer,
        desc: &BufferDescriptor,
        data: Option<&[u8]>,
    ) -> Result<(), GraphicsError> {
        debug_assert!(buffer.handle.is_none());
        let mut size = desc.size.max(1);
        if desc.kind == BufferKind::Uniform {
            size = (size + 15) - (size + 15) % 16;
        }

        let mut name: GLuint = 0;
        unsafe { (self.compat.gen_buffers)(1, &mut name) };
        if name == 0 {
            return Err(GraphicsError::ResourceCreation("glGenBuffers".into()));
        }
        let target = convert::buffer_kind(desc.kind);
        let pointer = data.map(|d| d.as_ptr() as *const c_void).unwrap_or(core::ptr::null());
        unsafe {
            (self.shared.core.bind_buffer)(target, name);
            (self.compat.buffer_data)(
                target,
                size as GLsizeiptr,
                pointer,
                convert::buffer_usage(desc.usage),
            );
        }

        buffer.device = self.shared.device;
        buffer.handle = Handle::IdPair(name, 0);
        buffer.kind = desc.kind;
        buffer.usage = desc.usage;
        buffer.size = size;
        self.shared.check_errors("create_buffer");
        Ok(())
    }

    fn write_buffer(&self, buffer: &mut Buffer, data: &[u8], offset: u32) {
        debug_assert_eq!(buffer.device, self.shared.device);
        debug_assert!(offset as usize + data.len() <= buffer.size as usize);
        let target = convert::buffer_kind(buffer.kind);
        unsafe {
            (self.shared.core.bind_buffer)(target, buffer.handle.id_pair().0);
            (self.compat.buffer_sub_data)(
                target,
                offset as GLintptr,
                data.len() as GLsizeiptr,
                data.as_ptr() as *const c_void,
            );
        }
        self.shared.check_errors("write_buffer");
    }

    fn delete_buffer(&self, buffer: &mut Buffer) {
        if let Handle::IdPair(name, _) = buffer.handle.take() {
            self.shared.reclaim.push_buffer(name);
        }
        buffer.size = 0;
    }

    fn create_attributes_state(
        &self,
        state: &mut AttributesState,
        desc: &AttributesStateDescriptor<'_>,
    ) -> Result<(), GraphicsError> {
        debug_assert!(!state.handle.is_ready());
        debug_assert!(desc.binds.len() <= MAX_ATTRIBUTES);
        state.device = self.shared.device;
        state.handle = Lazy::Uninit;
        state.count = desc.binds.len().min(MAX_ATTRIBUTES) as u32;
        for (slot, bind) in desc.binds.iter().take(MAX_ATTRIBUTES).enumerate() {
            state.binds[slot] = AttributeBind {
                buffer: bind.buffer.handle,
                stride: bind.stride,
                offset: bind.offset,
            };
        }
        state.index = desc.index.map(|(buffer, kind)| (buffer.handle, kind));
        Ok(())
    }

    fn bind_attributes_state(&self, state: &mut AttributesState, layout: &InputLayout) {
        debug_assert_eq!(state.device, self.shared.device);
        let mut st = self.shared.state();

        if let Some(handle) = state.handle.get() {
            let name = handle.id_pair().0;
            if st.vertex_array != name {
                st.vertex_array = name;
                unsafe { (self.shared.core.bind_vertex_array)(name) };
            }
            self.shared
                .note_bound_index(&mut st, state.index.map(|(_, kind)| kind));
            return;
        }

        // First bind: realize the vertex array from the layout.
        let mut name: GLuint = 0;
        unsafe { (self.compat.gen_vertex_arrays)(1, &mut name) };
        state.handle = Lazy::Ready(Handle::IdPair(name, 0));
        st.vertex_array = name;
        unsafe { (self.shared.core.bind_vertex_array)(name) };

        let slots = (state.count as usize).min(layout.count as usize);
        for slot in 0..slots {
            let entry = layout.entries[slot];
            let bind = state.binds[slot];
            if entry.attribute == AttributeType::Disabled || bind.buffer.is_none() {
                continue;
            }
            let pointer = (bind.offset + entry.offset) as usize as *const c_void;
            unsafe {
                (self.shared.core.bind_buffer)(GL_ARRAY_BUFFER, bind.buffer.id_pair().0);
                if convert::attribute_is_float(entry.attribute) {
                    (self.compat.vertex_attrib_pointer)(
                        slot as GLuint,
                        convert::attribute_size(entry.attribute),
                        convert::attribute_type(entry.attribute),
                        convert::attribute_normalized(entry.attribute),
                        bind.stride as GLsizei,
                        pointer,
                    );
                } else {
                    (self.compat.vertex_attrib_ipointer)(
                        slot as GLuint,
                        convert::attribute_size(entry.attribute),
                        convert::attribute_type(entry.attribute),
                        bind.stride as GLsizei,
                        pointer,
                    );
                }
                (self.compat.enable_vertex_attrib_array)(slot as GLuint);
            }
        }
        if let Some((handle, _)) = state.index {
            unsafe { (self.shared.core.bind_buffer)(GL_ELEMENT_ARRAY_BUFFER, handle.id_pair().0) };
        }
        self.shared
            .note_bound_index(&mut st, state.index.map(|(_, kind)| kind));
        drop(st);
        self.shared.check_errors("bind_attributes_state");
    }

    fn delete_attributes_state(&self, state: &mut AttributesState) {
        if let Some(handle) = state.handle.take() {
            let name = handle.id_pair().0;
            let mut st = self.shared.state();
            // Names can be reused once reclaimed; drop the cache entry so
            // a future bind of the recycled name is not skipped.
            if st.vertex_array == name {
                st.vertex_array = 0;
                st.index = None;
            }
            self.shared.reclaim.push_vertex_array(name);
        }
        state.binds = [AttributeBind::default(); MAX_ATTRIBUTES];
        state.count = 0;
        state.index = None;
    }

    fn create_input_layout(
        &self,
        layout: &mut InputLayout,
        desc: &InputLayoutDescriptor<'_>,
        _program: &Program,
    ) -> Result<(), GraphicsError> {
        debug_assert!(layout.handle.is_none());
        debug_assert!(desc.entries.len() <= MAX_ATTRIBUTES);
        layout.device = self.shared.device;
        layout.handle = Handle::Id(self.shared.alloc_state_id());
        layout.count = desc.entries.len().min(MAX_ATTRIBUTES) as u32;
        for (slot, entry) in desc.entries.iter().take(MAX_ATTRIBUTES).enumerate() {
            layout.entries[slot] = *entry;
        }
        Ok(())
    }

    fn delete_input_layout(&self, layout: &mut InputLayout) {
        layout.handle.take();
        layout.count = 0;
    }

    fn create_texture(
        &self,
        texture: &mut Texture,
        desc: &TextureDescriptor,
    ) -> Result<(), GraphicsError> {
        debug_assert!(texture.handle.is_none());
        let mut name: GLuint = 0;
        unsafe { (self.compat.gen_textures)(1, &mut name) };
        if name == 0 {
            return Err(GraphicsError::ResourceCreation("glGenTextures".into()));
        }
        let target = convert::texture_kind(desc.kind);
        self.bind_texture_for_edit(target, name);
        self.allocate_texture_storage(desc, target);

        texture.device = self.shared.device;
        texture.handle = Handle::IdPair(name, 0);
        texture.view = Lazy::Uninit;
        texture.sampler = Lazy::Uninit;
        texture.kind = desc.kind;
        texture.format = desc.format;
        texture.levels = desc.levels.max(1);
        texture.samples = if desc.kind.is_multisampled() { desc.samples.max(1) } else { 1 };
        texture.width = desc.width;
        texture.height = desc.height;
        texture.depth = desc.depth.max(1);
        texture.addressing_u = TextureAddressing::Repeat;
        texture.addressing_v = TextureAddressing::Repeat;
        texture.addressing_w = TextureAddressing::Repeat;
        texture.min_filtering = Filtering::Nearest;
        texture.mag_filtering = Filtering::Linear;
        texture.mip_filtering = Filtering::Linear;
        texture.anisotropy = 1;
        texture.base_level = 0;
        texture.max_level = 1000;
        self.shared.check_errors("create_texture");
        Ok(())
    }

    fn write_texture(
        &self,
        texture: &mut Texture,
        level: u8,
        offset: u32,
        width: u32,
        height: u32,
        depth: u32,
        data: &[u8],
    ) {
        debug_assert_eq!(texture.device, self.shared.device);
        debug_assert!(!texture.kind.is_multisampled());
        let target = convert::texture_kind(texture.kind);
        let name = texture.handle.id_pair().0;
        self.bind_texture_for_edit(target, name);

        let flat = texture.kind == TextureKind::D2;
        unsafe {
            if texture.format.is_compressed() {
                let size = texture.format.surface_size(width, height);
                if flat {
                    (self.compat.compressed_tex_sub_image_2d)(
                        target,
                        level as GLint,
                        0,
                        offset as GLint,
                        width as GLsizei,
                        height as GLsizei,
                        convert::internal_format(texture.format),
                        size as GLsizei,
                        data.as_ptr() as *const c_void,
                    );
                } else {
                    (self.compat.compressed_tex_sub_image_3d)(
                        target,
                        level as GLint,
                        0,
                        0,
                        offset as GLint,
                        width as GLsizei,
                        height as GLsizei,
                        depth as GLsizei,
                        convert::internal_format(texture.format),
                        (size * depth.max(1)) as GLsizei,
                        data.as_ptr() as *const c_void,
                    );
                }
            } else if flat {
                (self.compat.tex_sub_image_2d)(
                    target,
                    level as GLint,
                    0,
                    offset as GLint,
                    width as GLsizei,
                    height as GLsizei,
                    convert::external_format(texture.format),
                    convert::external_type(texture.format),
                    data.as_ptr() as *const c_void,
                );
            } else {
                (self.compat.tex_sub_image_3d)(
                    target,
                    level as GLint,
                    0,
                    0,
                    offset as GLint,
                    width as GLsizei,
                    height as GLsizei,
                    depth as GLsizei,
                    convert::external_format(texture.format),
                    convert::external_type(texture.format),
                    data.as_ptr() as *const c_void,
                );
            }
        }
        self.shared.check_errors("write_texture");
    }

    fn set_texture_addressing(
        &self,
        texture: &mut Texture,
        u: TextureAddressing,
        v: TextureAddressing,
        w: TextureAddressing,
    ) {
        if texture.addressing_u == u && texture.addressing_v == v && texture.addressing_w == w {
            return;
        }
        let target = convert::texture_kind(texture.kind);
        self.bind_texture_for_edit(target, texture.handle.id_pair().0);
        unsafe {
            if texture.addressing_u != u {
                (self.compat.tex_parameteri)(target, GL_TEXTURE_WRAP_S, convert::addressing(u));
            }
            if texture.addressing_v != v {
                (self.compat.tex_parameteri)(target, GL_TEXTURE_WRAP_T, convert::addressing(v));
            }
            if texture.addressing_w != w {
                (self.compat.tex_parameteri)(target, GL_TEXTURE_WRAP_R, convert::addressing(w));
            }
        }
        texture.addressing_u = u;
        texture.addressing_v = v;
        texture.addressing_w = w;
    }

    fn set_texture_filtering(
        &self,
        texture: &mut Texture,
        min: Filtering,
        mag: Filtering,
        mip: Filtering,
    ) {
        if texture.min_filtering == min && texture.mag_filtering == mag && texture.mip_filtering == mip
        {
            return;
        }
        let target = convert::texture_kind(texture.kind);
        self.bind_texture_for_edit(target, texture.handle.id_pair().0);
        unsafe {
            if texture.min_filtering != min || texture.mip_filtering != mip {
                (self.compat.tex_parameteri)(target, GL_TEXTURE_MIN_FILTER, convert::min_filter(min, mip));
            }
            if texture.mag_filtering != mag {
                (self.compat.tex_parameteri)(target, GL_TEXTURE_MAG_FILTER, convert::mag_filter(mag));
            }
        }
        texture.min_filtering = min;
        texture.mag_filtering = mag;
        texture.mip_filtering = mip;
    }

    fn set_texture_anisotropy(&self, texture: &mut Texture, anisotropy: u32) {
        let anisotropy = anisotropy.max(1);
        if texture.anisotropy == anisotropy {
            return;
        }
        let target = convert::texture_kind(texture.kind);
        self.bind_texture_for_edit(target, texture.handle.id_pair().0);
        unsafe {
            (self.compat.tex_parameterf)(target, GL_TEXTURE_MAX_ANISOTROPY_EXT, anisotropy as GLfloat);
        }
        texture.anisotropy = anisotropy;
    }

    fn set_texture_levels(&self, texture: &mut Texture, base: u32, max: u32) {
        if texture.base_level == base && texture.max_level == max {
            return;
        }
        let target = convert::texture_kind(texture.kind);
        self.bind_texture_for_edit(target, texture.handle.id_pair().0);
        unsafe {
            if texture.base_level != base {
                (self.compat.tex_parameteri)(target, GL_TEXTURE_BASE_LEVEL, base as GLint);
            }
            if texture.max_level != max {
                (self.compat.tex_parameteri)(target, GL_TEXTURE_MAX_LEVEL, max as GLint);
            }
        }
        texture.base_level = base;
        texture.max_level = max;
    }

    fn delete_texture(&self, texture: &mut Texture) {
        if let Handle::IdPair(name, _) = texture.handle.take() {
            let mut state = self.shared.state();
            for slot in state.textures.iter_mut() {
                if *slot == name {
                    *slot = 0;
                }
            }
            drop(state);
            self.shared.reclaim.push_texture(name);
        }
        texture.view.take();
        texture.sampler.take();
    }

    fn create_shader(
        &self,
        shader: &mut Shader,
        desc: &ShaderDescriptor<'_>,
    ) -> Result<(), GraphicsError> {
        self.shared.create_shader(shader, desc)
    }

    fn delete_shader(&self, shader: &mut Shader) {
        self.shared.delete_shader(shader);
    }

    fn create_program(
        &self,
        program: &mut Program,
        desc: &ProgramDescriptor<'_>,
    ) -> Result<(), GraphicsError> {
        self.shared.create_program(program, desc)
    }

    fn delete_program(&self, program: &mut Program) {
        self.shared.delete_program(program);
    }

    fn bind_uniform_buffer(&self, slot: u32, buffer: &Buffer, size: u32, offset: u32) {
        self.shared.bind_uniform_buffer(slot, buffer, size, offset);
    }

    fn bind_samplers(&self, first: u32, textures: &mut [Option<&mut Texture>]) {
        let mut state = self.shared.state();
        for (position, entry) in textures.iter_mut().enumerate() {
            let unit = first as usize + position;
            if unit >= MAX_SAMPLER_UNITS {
                break;
            }
            // GL samples through the texture object itself; the view and
            // sampler slots just record that the bind happened.
            if let Some(texture) = entry {
                if !texture.view.is_ready() {
                    texture.view = Lazy::Ready(Handle::None);
                }
                if !texture.sampler.is_ready() {
                    texture.sampler = Lazy::Ready(Handle::None);
                }
            }
            let (target, name) = match entry {
                Some(texture) => (convert::texture_kind(texture.kind), texture.handle.id_pair().0),
                None => (GL_TEXTURE_2D, 0),
            };
            if state.textures[unit] == name {
                continue;
            }
            state.textures[unit] = name;
            if state.active_texture != unit as u32 {
                state.active_texture = unit as u32;
                unsafe { (self.compat.active_texture)(GL_TEXTURE0 + unit as GLenum) };
            }
            unsafe { (self.compat.bind_texture)(target, name) };
        }
        drop(state);
        self.shared.check_errors("bind_samplers");
    }

    fn create_render_target(&self, target: &mut RenderTarget) -> Result<(), GraphicsError> {
        debug_assert!(target.handle.is_none());
        let mut name: GLuint = 0;
        unsafe { (self.compat.gen_framebuffers)(1, &mut name) };
        if name == 0 {
            return Err(GraphicsError::ResourceCreation("glGenFramebuffers".into()));
        }
        target.device = self.shared.device;
        target.handle = Handle::IdPair(name, 0);
        target.colors = [None; MAX_COLOR_ATTACHMENTS];
        target.depth_stencil = None;
        target.draw_buffers.clear();
        Ok(())
    }

    fn bind_render_target(&self, target: Option<&RenderTarget>) {
        let name = target.map(|t| t.handle.id_pair().0).unwrap_or(0);
        let mut state = self.shared.state();
        self.shared.bind_draw_framebuffer(&mut state, name);
    }

    fn set_render_target_texture(
        &self,
        target: &mut RenderTarget,
        attachment: Attachment,
        texture: &Texture,
    ) {
        debug_assert_eq!(target.device, self.shared.device);
        let snapshot = AttachmentRef::of(texture);
        match attachment {
            Attachment::DepthStencil => target.depth_stencil = Some(snapshot),
            Attachment::Color(index) => {
                if let Some(slot) = target.colors.get_mut(index as usize) {
                    *slot = Some(snapshot);
                }
            }
        }
        self.attach(target, attachment, texture.handle.id_pair().0);
        self.shared.check_errors("set_render_target_texture");
    }

    fn set_render_target_draw_buffers(&self, target: &mut RenderTarget, buffers: &[Attachment]) {
        debug_assert_eq!(target.device, self.shared.device);
        target.draw_buffers.clear();
        target.draw_buffers.extend_from_slice(buffers);

        let translated: Vec<GLenum> = buffers.iter().map(|b| convert::attachment(*b)).collect();
        let mut state = self.shared.state();
        self.shared
            .bind_draw_framebuffer(&mut state, target.handle.id_pair().0);
        unsafe { (self.compat.draw_buffers)(translated.len() as GLsizei, translated.as_ptr()) };
        drop(state);
        self.shared.check_errors("set_render_target_draw_buffers");
    }

    fn resolve_render_target(
        &self,
        src: &RenderTarget,
        dst: &RenderTarget,
        mask: ResolveMask,
        src_color: u8,
        dst_color: u8,
    ) {
        let mut width = 0;
        let mut height = 0;
        if mask.contains(ResolveMask::COLOR) {
            if let Some(re) = src.attachment(Attachment::Color(src_color)) {
                (width, height) = (re.width, re.height);
            } else if let Some(re) = dst.attachment(Attachment::Color(dst_color)) {
                (width, height) = (re.width, re.height);
            }
        }
        if width == 0 || height == 0 {
            if let Some(re) = &src.depth_stencil {
                (width, height) = (re.width, re.height);
            } else if let Some(re) = &dst.depth_stencil {
                (width, height) = (re.width, re.height);
            }
        }
        debug_assert!(width != 0 && height != 0, "resolve region cannot be inferred");
        if width == 0 || height == 0 {
            return;
        }

        let src_name = src.handle.id_pair().0;
        let dst_name = dst.handle.id_pair().0;
        let mut state = self.shared.state();
        unsafe { (self.shared.core.bind_framebuffer)(GL_READ_FRAMEBUFFER, src_name) };
        self.shared.bind_draw_framebuffer(&mut state, dst_name);

        let mut bits: GLbitfield = 0;
        if mask.contains(ResolveMask::COLOR) {
            bits |= GL_COLOR_BUFFER_BIT;
            unsafe {
                (self.compat.read_buffer)(if src_name != 0 {
                    GL_COLOR_ATTACHMENT0 + src_color as GLenum
                } else {
                    GL_BACK
                });
                (self.compat.draw_buffer)(if dst_name != 0 {
                    GL_COLOR_ATTACHMENT0 + dst_color as GLenum
                } else {
                    GL_BACK
                });
            }
        }
        if mask.contains(ResolveMask::DEPTH) {
            bits |= GL_DEPTH_BUFFER_BIT;
        }
        if mask.contains(ResolveMask::STENCIL) {
            bits |= GL_STENCIL_BUFFER_BIT;
        }
        unsafe {
            (self.compat.blit_framebuffer)(
                0,
                0,
                width as GLint,
                height as GLint,
                0,
                0,
                width as GLint,
                height as GLint,
                bits,
                GL_NEAREST,
            );
        }
        drop(state);
        self.shared.check_errors("resolve_render_target");
    }

    fn delete_render_target(&self, target: &mut RenderTarget) {
        if let Handle::IdPair(name, _) = target.handle.take() {
            let mut state = self.shared.state();
            if state.draw_framebuffer == name {
                state.draw_framebuffer = 0;
            }
            drop(state);
            self.shared.reclaim.push_framebuffer(name);
        }
        target.colors = [None; MAX_COLOR_ATTACHMENTS];
        target.depth_stencil = None;
        target.draw_buffers.clear();
    }

    fn create_pipeline_state(
        &self,
        state: &mut PipelineState,
        desc: &PipelineStateDescriptor<'_>,
    ) -> Result<(), GraphicsError> {
        self.shared.create_pipeline_state(state, desc)
    }

    fn bind_pipeline_state(&self, state: &PipelineState) {
        self.shared.bind_pipeline(state);
    }

    fn delete_pipeline_state(&self, state: &mut PipelineState) {
        state.handle.take();
    }

    fn set_viewport(&self, x: i32, y: i32, width: u32, height: u32) {
        self.shared.set_viewport(x, y, width, height);
    }

    fn set_scissor(&self, x: i32, y: i32, width: u32, height: u32) {
        self.shared.set_scissor(x, y, width, height);
    }

    fn set_line_width(&self, width: f32) {
        self.shared.set_line_width(width);
    }

    fn set_point_size(&self, size: f32) {
        self.shared.set_point_size(size);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gl::testing;
    use opale_core::device::{Device, FrameStats};

    fn device() -> Gl3Device {
        testing::reset();
        let mut loader = |name: &str| testing::resolve(name);
        Gl3Device::new(&DeviceConfig::default(), &mut loader).unwrap()
    }

    fn color_texture(device: &Gl3Device, width: u32, height: u32) -> Texture {
        let mut texture = Texture::default();
        device
            .create_texture(
                &mut texture,
                &TextureDescriptor {
                    kind: TextureKind::D2,
                    format: PixelFormat::Bgra8Unorm,
                    levels: 1,
                    width,
                    height,
                    depth: 1,
                    samples: 1,
                },
            )
            .unwrap();
        texture
    }

    fn linked_program(device: &Gl3Device) -> Program {
        let mut vertex = Shader::default();
        let mut fragment = Shader::default();
        device
            .create_shader(
                &mut vertex,
                &ShaderDescriptor {
                    stage: ShaderStage::Vertex,
                    source: b"void main() {}",
                },
            )
            .unwrap();
        device
            .create_shader(
                &mut fragment,
                &ShaderDescriptor {
                    stage: ShaderStage::Fragment,
                    source: b"void main() {}",
                },
            )
            .unwrap();
        let mut program = Program::default();
        device
            .create_program(
                &mut program,
                &ProgramDescriptor {
                    vertex: &vertex,
                    fragment: &fragment,
                    geometry: None,
                    attributes: &[ProgramBinding { name: "position", slot: 0 }],
                    constants: &[ProgramBinding { name: "globals", slot: 0 }],
                    samplers: &[ProgramBinding { name: "albedo", slot: 0 }],
                },
            )
            .unwrap();
        program
    }

    #[test]
    fn test_caps_come_from_the_context() {
        let device = device();
        let caps = device.caps();
        assert_eq!(caps.uniform_buffer_alignment, 256);
        assert_eq!(caps.max_samplers, 16);
        assert_eq!(caps.max_msaa_samples, 8);
    }

    #[test]
    fn test_debug_output_reflects_an_attached_sink() {
        testing::reset();
        let sink: opale_core::device::DiagnosticSink = std::sync::Arc::new(|_: &str| {});
        let config = DeviceConfig {
            diagnostics: Some(sink),
        };
        let mut loader = |name: &str| testing::resolve(name);
        let device = Gl3Device::new(&config, &mut loader).unwrap();
        let printed = format!("{:?}", device);
        assert!(printed.contains("diagnostics: true"), "{}", printed);
    }

    #[test]
    fn test_pipeline_rebind_is_free() {
        let device = device();
        let program = linked_program(&device);

        let mut blend = BlendState::default();
        device
            .create_blend_state(
                &mut blend,
                &BlendStateDescriptor {
                    enabled: true,
                    src_color: BlendFunction::SrcAlpha,
                    dst_color: BlendFunction::OneMinusSrcAlpha,
                    src_alpha: BlendFunction::One,
                    dst_alpha: BlendFunction::Zero,
                    color_equation: BlendEquation::Add,
                    alpha_equation: BlendEquation::Add,
                },
            )
            .unwrap();
        let mut depth_stencil = DepthStencilState::default();
        device
            .create_depth_stencil_state(&mut depth_stencil, &DepthStencilStateDescriptor::default())
            .unwrap();
        let mut rasterizer = RasterizerState::default();
        device
            .create_rasterizer_state(&mut rasterizer, &RasterizerStateDescriptor::default())
            .unwrap();
        let mut layout = InputLayout::default();
        device
            .create_input_layout(
                &mut layout,
                &InputLayoutDescriptor { entries: &[] },
                &program,
            )
            .unwrap();

        let mut pipeline = PipelineState::default();
        device
            .create_pipeline_state(
                &mut pipeline,
                &PipelineStateDescriptor {
                    program: &program,
                    rasterizer: &rasterizer,
                    depth_stencil: &depth_stencil,
                    blend: &blend,
                    layout: &layout,
                },
            )
            .unwrap();

        // Program creation already made it current.
        assert_eq!(testing::count("glUseProgram"), 1);

        device.bind_pipeline_state(&pipeline);
        assert_eq!(testing::count("glUseProgram"), 1);
        assert_eq!(testing::count("glBlendFuncSeparate"), 1);

        // The program was made current before any blend state reached
        // the driver.
        let log = testing::calls();
        let program_at = log.iter().position(|call| *call == "glUseProgram");
        let blend_at = log.iter().position(|call| *call == "glBlendFuncSeparate");
        assert!(program_at < blend_at);

        // Same pipeline again: nothing reaches the driver.
        device.bind_pipeline_state(&pipeline);
        assert_eq!(testing::count("glUseProgram"), 1);
        assert_eq!(testing::count("glBlendFuncSeparate"), 1);
    }

    #[test]
    fn test_vertex_array_realized_on_first_bind() {
        let device = device();
        let vertices: [f32; 9] = [-0.5, -0.5, 0.0, 0.5, -0.5, 0.0, 0.0, 0.5, 0.0];
        let mut buffer = Buffer::default();
        device
            .create_buffer(
                &mut buffer,
                &BufferDescriptor {
                    kind: BufferKind::Vertex,
                    usage: BufferUsage::Static,
                    size: std::mem::size_of_val(&vertices) as u32,
                },
                Some(bytemuck::cast_slice(&vertices)),
            )
            .unwrap();
        let program = linked_program(&device);
        let mut layout = InputLayout::default();
        device
            .create_input_layout(
                &mut layout,
                &InputLayoutDescriptor {
                    entries: &[LayoutEntry {
                        attribute: AttributeType::R32G32B32Float,
                        stride: 12,
                        offset: 0,
                    }],
                },
                &program,
            )
            .unwrap();
        let mut state = AttributesState::default();
        device
            .create_attributes_state(
                &mut state,
                &AttributesStateDescriptor {
                    binds: &[AttributeBindDescriptor {
                        buffer: &buffer,
                        stride: 12,
                        offset: 0,
                    }],
                    index: None,
                },
            )
            .unwrap();
        assert_eq!(testing::count("glGenVertexArrays"), 0);
        assert!(!state.handle.is_ready());

        device.bind_attributes_state(&mut state, &layout);
        assert_eq!(testing::count("glGenVertexArrays"), 1);
        assert_eq!(testing::count("glBindVertexArray"), 1);
        assert_eq!(testing::count("glVertexAttribPointer"), 1);
        assert!(state.handle.is_ready());

        device.bind_attributes_state(&mut state, &layout);
        assert_eq!(testing::count("glGenVertexArrays"), 1);
        assert_eq!(testing::count("glBindVertexArray"), 1);
    }

    #[test]
    fn test_buffer_delete_defers_until_tick() {
        let device = device();
        let mut buffer = Buffer::default();
        device
            .create_buffer(
                &mut buffer,
                &BufferDescriptor {
                    kind: BufferKind::Vertex,
                    usage: BufferUsage::Static,
                    size: 16,
                },
                None,
            )
            .unwrap();
        device.delete_buffer(&mut buffer);
        assert!(buffer.handle.is_none());
        assert_eq!(testing::count("glDeleteBuffers"), 0);
        assert_eq!(device.shared.reclaim.pending(), 1);

        device.tick();
        assert_eq!(testing::count("glDeleteBuffers"), 1);
        assert_eq!(device.shared.reclaim.pending(), 0);
    }

    #[test]
    fn test_resolve_blits_the_color_region() {
        let device = device();
        let mut src = RenderTarget::default();
        let mut dst = RenderTarget::default();
        device.create_render_target(&mut src).unwrap();
        device.create_render_target(&mut dst).unwrap();
        let mut src_color = color_texture(&device, 8, 8);
        let mut dst_color = color_texture(&device, 8, 8);
        device.set_render_target_texture(&mut src, Attachment::Color(0), &src_color);
        device.set_render_target_texture(&mut dst, Attachment::Color(0), &dst_color);

        device.resolve_render_target(&src, &dst, ResolveMask::COLOR, 0, 0);
        assert_eq!(testing::count("glBlitFramebuffer"), 1);

        device.delete_texture(&mut src_color);
        device.delete_texture(&mut dst_color);
    }

    #[test]
    fn test_depth_resolve_infers_region_without_color_bit() {
        let device = device();
        let mut src = RenderTarget::default();
        let mut dst = RenderTarget::default();
        device.create_render_target(&mut src).unwrap();
        device.create_render_target(&mut dst).unwrap();
        let depth = |device: &Gl3Device| {
            let mut texture = Texture::default();
            device
                .create_texture(
                    &mut texture,
                    &TextureDescriptor {
                        kind: TextureKind::D2,
                        format: PixelFormat::Depth24Stencil8,
                        levels: 1,
                        width: 16,
                        height: 16,
                        depth: 1,
                        samples: 1,
                    },
                )
                .unwrap();
            texture
        };
        let src_depth = depth(&device);
        let dst_depth = depth(&device);
        device.set_render_target_texture(&mut src, Attachment::DepthStencil, &src_depth);
        device.set_render_target_texture(&mut dst, Attachment::DepthStencil, &dst_depth);

        device.resolve_render_target(
            &src,
            &dst,
            ResolveMask::DEPTH | ResolveMask::STENCIL,
            0,
            0,
        );
        assert_eq!(testing::count("glBlitFramebuffer"), 1);
        // No color plane was selected, so no read/draw buffer rerouting.
        assert_eq!(testing::count("glReadBuffer"), 0);
    }

    #[test]
    fn test_facade_counts_draws_and_skips_redundant_filtering() {
        let gl3 = device();
        let device = Device::new(Box::new(gl3));

        let mut texture = Texture::default();
        device
            .create_texture(
                &mut texture,
                &TextureDescriptor {
                    kind: TextureKind::D2,
                    format: PixelFormat::Bgra8Unorm,
                    levels: 1,
                    width: 4,
                    height: 4,
                    depth: 1,
                    samples: 1,
                },
            )
            .unwrap();
        device.set_texture_filtering(
            &mut texture,
            Filtering::Linear,
            Filtering::Linear,
            Filtering::Linear,
        );
        let after_first = testing::count("glTexParameteri");
        device.set_texture_filtering(
            &mut texture,
            Filtering::Linear,
            Filtering::Linear,
            Filtering::Linear,
        );
        assert_eq!(testing::count("glTexParameteri"), after_first);

        device.draw(PrimitiveType::Triangles, 6, 0);
        let stats = device.stats();
        assert_eq!(stats.draw_calls, 1);
        assert_eq!(stats.triangles, 2);
        assert_eq!(testing::count("glDrawArrays"), 1);

        device.tick();
        assert_eq!(device.stats(), FrameStats::default());
    }
}
