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

//! The OpenGL 4.5 device.
//!
//! Objects are edited through direct state access, so edits never
//! disturb the binding points. Stream buffers are backed by persistent
//! coherent maps and written with a plain memcpy.

use core::ffi::c_void;
use std::collections::HashMap;
use std::sync::Mutex;

use opale_core::api::*;
use opale_core::device::DeviceConfig;
use opale_core::error::GraphicsError;
use opale_core::traits::{DeviceCaps, GraphicsDevice};

use super::api::*;
use super::convert;
use super::shared::GlShared;
use super::state::MAX_SAMPLER_UNITS;

/// A persistent coherent mapping of a stream buffer.
///
/// The pointer stays valid until the buffer is deleted; coherent maps
/// may be written from any thread.
#[derive(Debug)]
struct StreamMap {
    pointer: *mut u8,
    size: u32,
}

// SAFETY: the mapping is written only through `write_buffer`, which the
// caller serializes per buffer like any other record mutation.
unsafe impl Send for StreamMap {}

/// A device over an OpenGL 4.5 context with `ARB_direct_state_access`
/// and `ARB_buffer_storage`.
#[derive(Debug)]
pub struct Gl4Device {
    shared: GlShared,
    dsa: GlDsa,
    stream_maps: Mutex<HashMap<GLuint, StreamMap>>,
}

impl Gl4Device {
    /// Builds a device over the current context, resolving every entry
    /// point through `loader`.
    ///
    /// ## Errors
    /// * `GraphicsError::MissingEntryPoint` - If the context does not
    ///   expose a required 4.5 entry point.
    pub fn new(
        config: &DeviceConfig,
        loader: &mut dyn FnMut(&str) -> *const c_void,
    ) -> Result<Self, GraphicsError> {
        let core = GlCore::load(loader)?;
        let dsa = GlDsa::load(loader)?;
        let shared = GlShared::new(core, config);
        log::info!(
            "gl4 device ready (uniform alignment {}, {} sampler slots, {}x msaa)",
            shared.caps.uniform_buffer_alignment,
            shared.caps.max_samplers,
            shared.caps.max_msaa_samples
        );
        Ok(Self {
            shared,
            dsa,
            stream_maps: Mutex::new(HashMap::new()),
        })
    }

    fn with_stream_map<R>(&self, f: impl FnOnce(&mut HashMap<GLuint, StreamMap>) -> R) -> R {
        let mut maps = match self.stream_maps.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        f(&mut maps)
    }

    fn allocate_texture_storage(&self, name: GLuint, desc: &TextureDescriptor) {
        let internal = convert::internal_format(desc.format);
        unsafe {
            match desc.kind {
                TextureKind::D2 => {
                    (self.dsa.texture_storage_2d)(
                        name,
                        desc.levels.max(1) as GLsizei,
                        internal,
                        desc.width as GLsizei,
                        desc.height as GLsizei,
                    );
                }
                TextureKind::D2Array | TextureKind::D3 => {
                    (self.dsa.texture_storage_3d)(
                        name,
                        desc.levels.max(1) as GLsizei,
                        internal,
                        desc.width as GLsizei,
                        desc.height as GLsizei,
                        desc.depth.max(1) as GLsizei,
                    );
                }
                TextureKind::D2Multisample => {
                    (self.dsa.texture_storage_2d_multisample)(
                        name,
                        desc.samples.max(1) as GLsizei,
                        internal,
                        desc.width as GLsizei,
                        desc.height as GLsizei,
                        GL_TRUE,
                    );
                }
                TextureKind::D2ArrayMultisample => {
                    (self.dsa.texture_storage_3d_multisample)(
                        name,
                        desc.samples.max(1) as GLsizei,
                        internal,
                        desc.width as GLsizei,
                        desc.height as GLsizei,
                        desc.depth.max(1) as GLsizei,
                        GL_TRUE,
                    );
                }
            }
        }
    }

    fn attach(&self, target: &RenderTarget, attachment: Attachment, texture: GLuint) {
        let name = target.handle.id_pair().0;
        unsafe {
            match attachment {
                Attachment::DepthStencil => {
                    (self.dsa.named_framebuffer_texture)(name, GL_DEPTH_ATTACHMENT, texture, 0);
                    (self.dsa.named_framebuffer_texture)(name, GL_STENCIL_ATTACHMENT, texture, 0);
                }
                Attachment::Color(index) => {
                    (self.dsa.named_framebuffer_texture)(
                        name,
                        GL_COLOR_ATTACHMENT0 + index as GLenum,
                        texture,
                        0,
                    );
                }
            }
        }
        if cfg!(debug_assertions) {
            let status =
                unsafe { (self.dsa.check_named_framebuffer_status)(name, GL_DRAW_FRAMEBUFFER) };
            if status != GL_FRAMEBUFFER_COMPLETE {
                self.shared
                    .report(&format!("render target incomplete (status 0x{status:04X})"));
            }
        }
    }
}

impl GraphicsDevice for Gl4Device {
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
        unsafe { (self.dsa.clear_named_framebufferfv)(name, GL_COLOR, index, color.as_ptr()) };
        self.shared.check_errors("clear_color");
    }

    fn clear_depth_stencil(&self, target: Option<&RenderTarget>, depth: f32, stencil: u8) {
        let name = target.map(|t| t.handle.id_pair().0).unwrap_or(0);
        unsafe {
            (self.dsa.clear_named_framebufferfi)(name, GL_DEPTH_STENCIL, 0, depth, stencil as GLint);
        }
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
        unsafe { (self.dsa.create_buffers)(1, &mut name) };
        if name == 0 {
            return Err(GraphicsError::ResourceCreation("glCreateBuffers".into()));
        }
        let stream_access = GL_MAP_WRITE_BIT | GL_MAP_PERSISTENT_BIT | GL_MAP_COHERENT_BIT;
        let flags = match desc.usage {
            BufferUsage::Immutable => 0,
            BufferUsage::Stream => stream_access,
            BufferUsage::Static | BufferUsage::Dynamic => GL_DYNAMIC_STORAGE_BIT,
        };
        let pointer = data.map(|d| d.as_ptr() as *const c_void).unwrap_or(core::ptr::null());
        unsafe {
            (self.dsa.named_buffer_storage)(name, size as GLsizeiptr, pointer, flags);
        }
        if desc.usage == BufferUsage::Stream {
            let mapping = unsafe {
                (self.dsa.map_named_buffer_range)(name, 0, size as GLsizeiptr, stream_access)
            };
            if mapping.is_null() {
                self.shared.report("stream buffer mapping failed");
            } else {
                self.with_stream_map(|maps| {
                    maps.insert(
                        name,
                        StreamMap {
                            pointer: mapping as *mut u8,
                            size,
                        },
                    )
                });
            }
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
        let name = buffer.handle.id_pair().0;

        if buffer.usage == BufferUsage::Stream {
            let copied = self.with_stream_map(|maps| {
                let Some(map) = maps.get(&name) else {
                    return false;
                };
                let available = (map.size as usize).saturating_sub(offset as usize);
                let length = data.len().min(available);
                unsafe {
                    core::ptr::copy_nonoverlapping(
                        data.as_ptr(),
                        map.pointer.add(offset as usize),
                        length,
                    );
                }
                true
            });
            if copied {
                return;
            }
        }
        unsafe {
            (self.dsa.named_buffer_sub_data)(
                name,
                offset as GLintptr,
                data.len() as GLsizeiptr,
                data.as_ptr() as *const c_void,
            );
        }
        self.shared.check_errors("write_buffer");
    }

    fn delete_buffer(&self, buffer: &mut Buffer) {
        if let Handle::IdPair(name, _) = buffer.handle.take() {
            // Deleting the buffer implicitly releases its mapping.
            self.with_stream_map(|maps| maps.remove(&name));
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
        unsafe { (self.dsa.create_vertex_arrays)(1, &mut name) };
        state.handle = Lazy::Ready(Handle::IdPair(name, 0));

        let slots = (state.count as usize).min(layout.count as usize);
        for slot in 0..slots {
            let entry = layout.entries[slot];
            let bind = state.binds[slot];
            if entry.attribute == AttributeType::Disabled || bind.buffer.is_none() {
                continue;
            }
            let slot = slot as GLuint;
            unsafe {
                (self.dsa.vertex_array_vertex_buffer)(
                    name,
                    slot,
                    bind.buffer.id_pair().0,
                    bind.offset as GLintptr,
                    bind.stride as GLsizei,
                );
                (self.dsa.vertex_array_attrib_binding)(name, slot, slot);
                if convert::attribute_is_float(entry.attribute) {
                    (self.dsa.vertex_array_attrib_format)(
                        name,
                        slot,
                        convert::attribute_size(entry.attribute),
                        convert::attribute_type(entry.attribute),
                        convert::attribute_normalized(entry.attribute),
                        entry.offset,
                    );
                } else {
                    (self.dsa.vertex_array_attrib_iformat)(
                        name,
                        slot,
                        convert::attribute_size(entry.attribute),
                        convert::attribute_type(entry.attribute),
                        entry.offset,
                    );
                }
                (self.dsa.enable_vertex_array_attrib)(name, slot);
            }
        }
        if let Some((handle, _)) = state.index {
            unsafe { (self.dsa.vertex_array_element_buffer)(name, handle.id_pair().0) };
        }

        st.vertex_array = name;
        unsafe { (self.shared.core.bind_vertex_array)(name) };
        self.shared
            .note_bound_index(&mut st, state.index.map(|(_, kind)| kind));
        drop(st);
        self.shared.check_errors("bind_attributes_state");
    }

    fn delete_attributes_state(&self, state: &mut AttributesState) {
        if let Some(handle) = state.handle.take() {
            let name = handle.id_pair().0;
            let mut st = self.shared.state();
            if st.vertex_array == name {
                st.vertex_array = 0;
                st.index = None;
            }
            drop(st);
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
        unsafe { (self.dsa.create_textures)(convert::texture_kind(desc.kind), 1, &mut name) };
        if name == 0 {
            return Err(GraphicsError::ResourceCreation("glCreateTextures".into()));
        }
        self.allocate_texture_storage(name, desc);

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
        let name = texture.handle.id_pair().0;
        let flat = texture.kind == TextureKind::D2;
        unsafe {
            if texture.format.is_compressed() {
                let size = texture.format.surface_size(width, height);
                if flat {
                    (self.dsa.compressed_texture_sub_image_2d)(
                        name,
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
                    (self.dsa.compressed_texture_sub_image_3d)(
                        name,
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
                (self.dsa.texture_sub_image_2d)(
                    name,
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
                (self.dsa.texture_sub_image_3d)(
                    name,
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
        let name = texture.handle.id_pair().0;
        unsafe {
            if texture.addressing_u != u {
                (self.dsa.texture_parameteri)(name, GL_TEXTURE_WRAP_S, convert::addressing(u));
            }
            if texture.addressing_v != v {
                (self.dsa.texture_parameteri)(name, GL_TEXTURE_WRAP_T, convert::addressing(v));
            }
            if texture.addressing_w != w {
                (self.dsa.texture_parameteri)(name, GL_TEXTURE_WRAP_R, convert::addressing(w));
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
        let name = texture.handle.id_pair().0;
        unsafe {
            if texture.min_filtering != min || texture.mip_filtering != mip {
                (self.dsa.texture_parameteri)(name, GL_TEXTURE_MIN_FILTER, convert::min_filter(min, mip));
            }
            if texture.mag_filtering != mag {
                (self.dsa.texture_parameteri)(name, GL_TEXTURE_MAG_FILTER, convert::mag_filter(mag));
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
        unsafe {
            (self.dsa.texture_parameterf)(
                texture.handle.id_pair().0,
                GL_TEXTURE_MAX_ANISOTROPY_EXT,
                anisotropy as GLfloat,
            );
        }
        texture.anisotropy = anisotropy;
    }

    fn set_texture_levels(&self, texture: &mut Texture, base: u32, max: u32) {
        let name = texture.handle.id_pair().0;
        unsafe {
            if texture.base_level != base {
                (self.dsa.texture_parameteri)(name, GL_TEXTURE_BASE_LEVEL, base as GLint);
            }
            if texture.max_level != max {
                (self.dsa.texture_parameteri)(name, GL_TEXTURE_MAX_LEVEL, max as GLint);
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
        if textures.is_empty() {
            return;
        }
        let mut names = [0 as GLuint; MAX_SAMPLER_UNITS];
        let first_unit = (first as usize).min(MAX_SAMPLER_UNITS);
        let span = textures.len().min(MAX_SAMPLER_UNITS - first_unit);
        if span == 0 {
            return;
        }
        for (position, entry) in textures.iter_mut().take(span).enumerate() {
            if let Some(texture) = entry {
                if !texture.view.is_ready() {
                    texture.view = Lazy::Ready(Handle::None);
                }
                if !texture.sampler.is_ready() {
                    texture.sampler = Lazy::Ready(Handle::None);
                }
                names[position] = texture.handle.id_pair().0;
            }
        }

        let mut state = self.shared.state();
        if state.textures[first_unit..first_unit + span] == names[..span] {
            return;
        }
        state.textures[first_unit..first_unit + span].copy_from_slice(&names[..span]);
        unsafe { (self.dsa.bind_textures)(first_unit as GLuint, span as GLsizei, names.as_ptr()) };
        drop(state);
        self.shared.check_errors("bind_samplers");
    }

    fn create_render_target(&self, target: &mut RenderTarget) -> Result<(), GraphicsError> {
        debug_assert!(target.handle.is_none());
        let mut name: GLuint = 0;
        unsafe { (self.dsa.create_framebuffers)(1, &mut name) };
        if name == 0 {
            return Err(GraphicsError::ResourceCreation("glCreateFramebuffers".into()));
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
        unsafe {
            (self.dsa.named_framebuffer_draw_buffers)(
                target.handle.id_pair().0,
                translated.len() as GLsizei,
                translated.as_ptr(),
            );
        }
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
        let mut bits: GLbitfield = 0;
        if mask.contains(ResolveMask::COLOR) {
            bits |= GL_COLOR_BUFFER_BIT;
            unsafe {
                (self.dsa.named_framebuffer_read_buffer)(
                    src_name,
                    if src_name != 0 {
                        GL_COLOR_ATTACHMENT0 + src_color as GLenum
                    } else {
                        GL_BACK
                    },
                );
                (self.dsa.named_framebuffer_draw_buffer)(
                    dst_name,
                    if dst_name != 0 {
                        GL_COLOR_ATTACHMENT0 + dst_color as GLenum
                    } else {
                        GL_BACK
                    },
                );
            }
        }
        if mask.contains(ResolveMask::DEPTH) {
            bits |= GL_DEPTH_BUFFER_BIT;
        }
        if mask.contains(ResolveMask::STENCIL) {
            bits |= GL_STENCIL_BUFFER_BIT;
        }
        unsafe {
            (self.dsa.blit_named_framebuffer)(
                src_name,
                dst_name,
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

    fn device() -> Gl4Device {
        testing::reset();
        let mut loader = |name: &str| testing::resolve(name);
        Gl4Device::new(&DeviceConfig::default(), &mut loader).unwrap()
    }

    #[test]
    fn test_stream_buffer_maps_at_creation_and_writes_through_map() {
        let device = device();
        let mut buffer = Buffer::default();
        device
            .create_buffer(
                &mut buffer,
                &BufferDescriptor {
                    kind: BufferKind::Vertex,
                    usage: BufferUsage::Stream,
                    size: 64,
                },
                None,
            )
            .unwrap();
        assert_eq!(testing::count("glMapNamedBufferRange"), 1);

        device.write_buffer(&mut buffer, &[1, 2, 3, 4], 8);
        // Stream writes go through the persistent map, not the driver.
        assert_eq!(testing::count("glNamedBufferSubData"), 0);
        let map = testing::map_snapshot(0);
        assert_eq!(&map[8..12], &[1, 2, 3, 4]);
        assert_eq!(map[0], 0);
    }

    #[test]
    fn test_static_buffer_write_uses_sub_data() {
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
        assert_eq!(testing::count("glMapNamedBufferRange"), 0);
        device.write_buffer(&mut buffer, &[0; 16], 0);
        assert_eq!(testing::count("glNamedBufferSubData"), 1);
    }

    #[test]
    fn test_uniform_buffer_size_rounds_to_sixteen() {
        let device = device();
        let mut buffer = Buffer::default();
        device
            .create_buffer(
                &mut buffer,
                &BufferDescriptor {
                    kind: BufferKind::Uniform,
                    usage: BufferUsage::Dynamic,
                    size: 20,
                },
                None,
            )
            .unwrap();
        assert_eq!(buffer.size, 32);
    }

    #[test]
    fn test_sampler_multi_bind_skips_redundant_spans() {
        let device = device();
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

        device.bind_samplers(0, &mut [Some(&mut texture)]);
        assert_eq!(testing::count("glBindTextures"), 1);
        assert!(texture.view.is_ready());
        assert!(texture.sampler.is_ready());

        // Same span, same names: no native call.
        device.bind_samplers(0, &mut [Some(&mut texture)]);
        assert_eq!(testing::count("glBindTextures"), 1);

        device.bind_samplers(0, &mut [None]);
        assert_eq!(testing::count("glBindTextures"), 2);
    }

    #[test]
    fn test_sampler_bind_past_the_last_unit_is_a_no_op() {
        let device = device();
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

        device.bind_samplers(MAX_SAMPLER_UNITS as u32 + 1, &mut [Some(&mut texture)]);
        assert_eq!(testing::count("glBindTextures"), 0);

        // A span straddling the limit binds only the units that exist.
        device.bind_samplers(
            MAX_SAMPLER_UNITS as u32 - 1,
            &mut [Some(&mut texture), None],
        );
        assert_eq!(testing::count("glBindTextures"), 1);
    }

    #[test]
    fn test_texture_parameters_never_bind() {
        let device = device();
        let mut texture = Texture::default();
        device
            .create_texture(
                &mut texture,
                &TextureDescriptor {
                    kind: TextureKind::D2,
                    format: PixelFormat::Bgra8Unorm,
                    levels: 1,
                    width: 8,
                    height: 8,
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
        assert_eq!(testing::count("glBindTexture"), 0);
        assert_eq!(testing::count("glTextureParameteri"), 1);
    }

    #[test]
    fn test_set_texture_levels_sets_base_and_max() {
        let device = device();
        let mut texture = Texture::default();
        device
            .create_texture(
                &mut texture,
                &TextureDescriptor {
                    kind: TextureKind::D2,
                    format: PixelFormat::Bgra8Unorm,
                    levels: 4,
                    width: 8,
                    height: 8,
                    depth: 1,
                    samples: 1,
                },
            )
            .unwrap();
        device.set_texture_levels(&mut texture, 1, 3);
        assert_eq!(texture.base_level, 1);
        assert_eq!(texture.max_level, 3);
        // One call for the base level, one for the max level.
        assert_eq!(testing::count("glTextureParameteri"), 2);
    }
}
