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

//! State and logic shared by the two GL devices.
//!
//! Everything that only touches entry points present in both profiles
//! lives here: draw submission, fixed-function state diffing, shader and
//! program construction, and end-of-frame reclamation.

use std::ffi::CString;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

use opale_core::api::{
    BlendState, BlendStateDescriptor, Buffer, DepthStencilState, DepthStencilStateDescriptor,
    DeviceId, Handle, IndexKind, PipelineState, PipelineStateDescriptor, PrimitiveType, Program,
    ProgramDescriptor, RasterizerState, RasterizerStateDescriptor, Shader, ShaderDescriptor,
};
use opale_core::device::{DeviceConfig, DiagnosticSink};
use opale_core::error::GraphicsError;
use opale_core::traits::DeviceCaps;

use super::api::*;
use super::convert;
use super::reclaim::ReclaimQueues;
use super::state::{GlState, MAX_SAMPLER_UNITS};

const GL_INVALID_INDEX: GLuint = u32::MAX;

/// Base of both GL devices: the common entry points, the context state
/// mirror, the dead-object queues and the static limits.
pub(crate) struct GlShared {
    pub core: GlCore,
    pub caps: DeviceCaps,
    pub device: DeviceId,
    pub reclaim: ReclaimQueues,
    state: Mutex<GlState>,
    next_state_id: AtomicU64,
    diagnostics: Option<DiagnosticSink>,
}

impl std::fmt::Debug for GlShared {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GlShared")
            .field("device", &self.device)
            .field("caps", &self.caps)
            .field("diagnostics", &self.diagnostics.is_some())
            .finish_non_exhaustive()
    }
}

impl GlShared {
    pub fn new(core: GlCore, config: &DeviceConfig) -> Self {
        let caps = query_caps(&core);
        Self {
            core,
            caps,
            device: crate::next_device_id(),
            reclaim: ReclaimQueues::default(),
            state: Mutex::new(GlState::default()),
            next_state_id: AtomicU64::new(1),
            diagnostics: config.diagnostics.clone(),
        }
    }

    pub fn state(&self) -> MutexGuard<'_, GlState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Ids for client-side state objects. Monotonic, never reused, so
    /// the cache can compare ids instead of contents.
    pub fn alloc_state_id(&self) -> u64 {
        self.next_state_id.fetch_add(1, Ordering::Relaxed)
    }

    pub fn report(&self, message: &str) {
        match &self.diagnostics {
            Some(sink) => sink(message),
            None => log::error!("{message}"),
        }
    }

    /// Drains the GL error queue in debug builds. `op` names the
    /// operation that just ran.
    pub fn check_errors(&self, op: &str) {
        if !cfg!(debug_assertions) {
            return;
        }
        loop {
            let code = unsafe { (self.core.get_error)() };
            if code == GL_NO_ERROR {
                break;
            }
            let name = match code {
                GL_INVALID_ENUM => "GL_INVALID_ENUM",
                GL_INVALID_VALUE => "GL_INVALID_VALUE",
                GL_INVALID_OPERATION => "GL_INVALID_OPERATION",
                GL_OUT_OF_MEMORY => "GL_OUT_OF_MEMORY",
                GL_INVALID_FRAMEBUFFER_OPERATION => "GL_INVALID_FRAMEBUFFER_OPERATION",
                _ => "unknown GL error",
            };
            self.report(&format!("{op}: {name} (0x{code:04X})"));
        }
    }

    fn set_capability(&self, state: &mut GlState, capability: GLenum, enabled: bool) {
        if state.set_capability(capability, enabled) {
            unsafe {
                if enabled {
                    (self.core.enable)(capability);
                } else {
                    (self.core.disable)(capability);
                }
            }
        }
    }

    pub fn bind_program_name(&self, state: &mut GlState, name: GLuint) {
        if state.program != name {
            state.program = name;
            unsafe { (self.core.use_program)(name) };
        }
    }

    pub fn bind_draw_framebuffer(&self, state: &mut GlState, name: GLuint) {
        if state.draw_framebuffer != name {
            state.draw_framebuffer = name;
            unsafe { (self.core.bind_framebuffer)(GL_DRAW_FRAMEBUFFER, name) };
        }
    }

    // ---- fixed-function state -------------------------------------------

    pub fn apply_blend(&self, state: &mut GlState, id: u64, desc: &BlendStateDescriptor) {
        if state.blend_state == id {
            return;
        }
        state.blend_state = id;

        self.set_capability(state, GL_BLEND, desc.enabled);
        if !desc.enabled {
            return;
        }
        if state.blend_src_color != desc.src_color
            || state.blend_dst_color != desc.dst_color
            || state.blend_src_alpha != desc.src_alpha
            || state.blend_dst_alpha != desc.dst_alpha
        {
            state.blend_src_color = desc.src_color;
            state.blend_dst_color = desc.dst_color;
            state.blend_src_alpha = desc.src_alpha;
            state.blend_dst_alpha = desc.dst_alpha;
            unsafe {
                (self.core.blend_func_separate)(
                    convert::blend_function(desc.src_color),
                    convert::blend_function(desc.dst_color),
                    convert::blend_function(desc.src_alpha),
                    convert::blend_function(desc.dst_alpha),
                );
            }
        }
        if state.blend_color_equation != desc.color_equation
            || state.blend_alpha_equation != desc.alpha_equation
        {
            state.blend_color_equation = desc.color_equation;
            state.blend_alpha_equation = desc.alpha_equation;
            unsafe {
                (self.core.blend_equation_separate)(
                    convert::blend_equation(desc.color_equation),
                    convert::blend_equation(desc.alpha_equation),
                );
            }
        }
    }

    pub fn apply_depth_stencil(
        &self,
        state: &mut GlState,
        id: u64,
        desc: &DepthStencilStateDescriptor,
    ) {
        if state.depth_stencil_state == id {
            return;
        }
        state.depth_stencil_state = id;

        self.set_capability(state, GL_DEPTH_TEST, desc.depth_test);
        if desc.depth_test {
            if state.depth_compare != desc.depth_compare {
                state.depth_compare = desc.depth_compare;
                unsafe { (self.core.depth_func)(convert::compare(desc.depth_compare)) };
            }
            if state.depth_write != desc.depth_write {
                state.depth_write = desc.depth_write;
                unsafe { (self.core.depth_mask)(desc.depth_write as GLboolean) };
            }
        }

        self.set_capability(state, GL_STENCIL_TEST, desc.stencil_enabled);
        if !desc.stencil_enabled {
            return;
        }
        if state.stencil_compare != desc.stencil_compare
            || state.stencil_reference != desc.stencil_reference
            || state.stencil_compare_mask != desc.stencil_compare_mask
        {
            state.stencil_compare = desc.stencil_compare;
            state.stencil_reference = desc.stencil_reference;
            state.stencil_compare_mask = desc.stencil_compare_mask;
            unsafe {
                (self.core.stencil_func)(
                    convert::compare(desc.stencil_compare),
                    desc.stencil_reference as GLint,
                    desc.stencil_compare_mask,
                );
            }
        }
        if state.stencil_write_mask != desc.stencil_write_mask {
            state.stencil_write_mask = desc.stencil_write_mask;
            unsafe { (self.core.stencil_mask)(desc.stencil_write_mask) };
        }
        if state.stencil_fail != desc.stencil_fail
            || state.stencil_zfail != desc.stencil_zfail
            || state.stencil_pass != desc.stencil_pass
        {
            state.stencil_fail = desc.stencil_fail;
            state.stencil_zfail = desc.stencil_zfail;
            state.stencil_pass = desc.stencil_pass;
            unsafe {
                (self.core.stencil_op)(
                    convert::stencil_operation(desc.stencil_fail),
                    convert::stencil_operation(desc.stencil_zfail),
                    convert::stencil_operation(desc.stencil_pass),
                );
            }
        }
    }

    pub fn apply_rasterizer(
        &self,
        state: &mut GlState,
        id: u64,
        desc: &RasterizerStateDescriptor,
    ) {
        if state.rasterizer_state == id {
            return;
        }
        state.rasterizer_state = id;

        if state.fill_mode != desc.fill_mode {
            state.fill_mode = desc.fill_mode;
            unsafe { (self.core.polygon_mode)(GL_FRONT_AND_BACK, convert::fill_mode(desc.fill_mode)) };
        }
        if state.cull_mode != desc.cull_mode {
            let was_culling = state.cull_mode != opale_core::api::CullMode::None;
            let culling = desc.cull_mode != opale_core::api::CullMode::None;
            state.cull_mode = desc.cull_mode;
            if culling != was_culling {
                self.set_capability(state, GL_CULL_FACE, culling);
            }
            if culling {
                unsafe { (self.core.cull_face)(convert::cull_mode(desc.cull_mode)) };
            }
        }
        if state.front_face != desc.front_face {
            state.front_face = desc.front_face;
            unsafe { (self.core.front_face)(convert::front_face(desc.front_face)) };
        }
        self.set_capability(state, GL_SCISSOR_TEST, desc.scissor);
    }

    pub fn bind_pipeline(&self, pipeline: &PipelineState) {
        debug_assert_eq!(pipeline.device, self.device);
        let mut state = self.state();
        let id = pipeline.handle.id();
        if state.pipeline_state == id {
            return;
        }
        state.pipeline_state = id;

        self.bind_program_name(&mut state, pipeline.program.id_pair().0);
        self.apply_rasterizer(
            &mut state,
            pipeline.rasterizer.handle.id(),
            &pipeline.rasterizer.desc,
        );
        self.apply_depth_stencil(
            &mut state,
            pipeline.depth_stencil.handle.id(),
            &pipeline.depth_stencil.desc,
        );
        self.apply_blend(&mut state, pipeline.blend.handle.id(), &pipeline.blend.desc);
        self.check_errors("bind_pipeline_state");
    }

    // ---- client-side state objects --------------------------------------

    pub fn create_blend_state(
        &self,
        state: &mut BlendState,
        desc: &BlendStateDescriptor,
    ) -> Result<(), GraphicsError> {
        debug_assert!(state.handle.is_none());
        state.device = self.device;
        state.handle = Handle::Id(self.alloc_state_id());
        state.desc = *desc;
        Ok(())
    }

    pub fn create_depth_stencil_state(
        &self,
        state: &mut DepthStencilState,
        desc: &DepthStencilStateDescriptor,
    ) -> Result<(), GraphicsError> {
        debug_assert!(state.handle.is_none());
        state.device = self.device;
        state.handle = Handle::Id(self.alloc_state_id());
        state.desc = *desc;
        Ok(())
    }

    pub fn create_rasterizer_state(
        &self,
        state: &mut RasterizerState,
        desc: &RasterizerStateDescriptor,
    ) -> Result<(), GraphicsError> {
        debug_assert!(state.handle.is_none());
        state.device = self.device;
        state.handle = Handle::Id(self.alloc_state_id());
        state.desc = *desc;
        Ok(())
    }

    /// Pipeline states are client-side on GL: they copy their parts so
    /// binding can diff without chasing references.
    pub fn create_pipeline_state(
        &self,
        state: &mut PipelineState,
        desc: &PipelineStateDescriptor<'_>,
    ) -> Result<(), GraphicsError> {
        debug_assert!(state.handle.is_none());
        state.device = self.device;
        state.handle = Handle::Id(self.alloc_state_id());
        state.program = desc.program.handle;
        state.rasterizer = *desc.rasterizer;
        state.depth_stencil = *desc.depth_stencil;
        state.blend = *desc.blend;
        state.layout = *desc.layout;
        Ok(())
    }

    // ---- draws ----------------------------------------------------------

    pub fn draw(&self, primitive: PrimitiveType, count: u32, offset: u32) {
        unsafe {
            (self.core.draw_arrays)(convert::primitive(primitive), offset as GLint, count as GLsizei);
        }
        self.check_errors("draw");
    }

    pub fn draw_instanced(&self, primitive: PrimitiveType, count: u32, offset: u32, instances: u32) {
        unsafe {
            (self.core.draw_arrays_instanced)(
                convert::primitive(primitive),
                offset as GLint,
                count as GLsizei,
                instances as GLsizei,
            );
        }
        self.check_errors("draw_instanced");
    }

    fn bound_index_kind(&self) -> Option<IndexKind> {
        let state = self.state();
        let kind = state.index;
        debug_assert!(kind.is_some(), "indexed draw without a bound index buffer");
        kind
    }

    pub fn draw_indexed(&self, primitive: PrimitiveType, count: u32, offset: u32) {
        let Some(kind) = self.bound_index_kind() else {
            return;
        };
        unsafe {
            (self.core.draw_elements)(
                convert::primitive(primitive),
                count as GLsizei,
                convert::index_kind(kind),
                (offset as usize * kind.size() as usize) as *const core::ffi::c_void,
            );
        }
        self.check_errors("draw_indexed");
    }

    pub fn draw_indexed_instanced(
        &self,
        primitive: PrimitiveType,
        count: u32,
        offset: u32,
        instances: u32,
    ) {
        let Some(kind) = self.bound_index_kind() else {
            return;
        };
        unsafe {
            (self.core.draw_elements_instanced)(
                convert::primitive(primitive),
                count as GLsizei,
                convert::index_kind(kind),
                (offset as usize * kind.size() as usize) as *const core::ffi::c_void,
                instances as GLsizei,
            );
        }
        self.check_errors("draw_indexed_instanced");
    }

    // ---- shaders and programs -------------------------------------------

    pub fn create_shader(
        &self,
        shader: &mut Shader,
        desc: &ShaderDescriptor<'_>,
    ) -> Result<(), GraphicsError> {
        debug_assert!(shader.handle.is_none());
        let name = unsafe { (self.core.create_shader)(convert::shader_stage(desc.stage)) };
        if name == 0 {
            return Err(GraphicsError::ResourceCreation("glCreateShader".into()));
        }
        let source = desc.source.as_ptr() as *const GLchar;
        let length = desc.source.len() as GLint;
        unsafe {
            (self.core.shader_source)(name, 1, &source, &length);
            (self.core.compile_shader)(name);
        }
        let mut status: GLint = 0;
        unsafe { (self.core.get_shaderiv)(name, GL_COMPILE_STATUS, &mut status) };
        if status == 0 {
            let log = self.read_info_log(name, self.core.get_shader_info_log);
            unsafe { (self.core.delete_shader)(name) };
            return Err(GraphicsError::ShaderCompilation(log));
        }
        shader.device = self.device;
        shader.handle = Handle::IdPair(name, 0);
        shader.stage = desc.stage;
        self.check_errors("create_shader");
        Ok(())
    }

    pub fn delete_shader(&self, shader: &mut Shader) {
        if let Handle::IdPair(name, _) = shader.handle.take() {
            self.reclaim.push_shader(name);
        }
    }

    pub fn create_program(
        &self,
        program: &mut Program,
        desc: &ProgramDescriptor<'_>,
    ) -> Result<(), GraphicsError> {
        debug_assert!(program.handle.is_none());
        let name = unsafe { (self.core.create_program)() };
        if name == 0 {
            return Err(GraphicsError::ResourceCreation("glCreateProgram".into()));
        }
        let (vertex, _) = desc.vertex.handle.id_pair();
        let (fragment, _) = desc.fragment.handle.id_pair();
        let geometry = desc.geometry.map(|shader| shader.handle.id_pair().0);
        unsafe {
            (self.core.attach_shader)(name, vertex);
            (self.core.attach_shader)(name, fragment);
            if let Some(geometry) = geometry {
                (self.core.attach_shader)(name, geometry);
            }
        }
        // Attribute slots must be assigned before the link.
        for binding in desc.attributes {
            let Ok(c_name) = CString::new(binding.name) else {
                self.report(&format!("attribute name {:?} contains NUL", binding.name));
                continue;
            };
            unsafe { (self.core.bind_attrib_location)(name, binding.slot, c_name.as_ptr()) };
        }
        unsafe { (self.core.link_program)(name) };
        let mut status: GLint = 0;
        unsafe { (self.core.get_programiv)(name, GL_LINK_STATUS, &mut status) };
        let detach = |name: GLuint| unsafe {
            (self.core.detach_shader)(name, vertex);
            (self.core.detach_shader)(name, fragment);
            if let Some(geometry) = geometry {
                (self.core.detach_shader)(name, geometry);
            }
        };
        if status == 0 {
            let log = self.read_info_log(name, self.core.get_program_info_log);
            detach(name);
            unsafe { (self.core.delete_program)(name) };
            return Err(GraphicsError::ProgramLink(log));
        }
        detach(name);

        // Named bindings resolve against the program being current.
        {
            let mut state = self.state();
            self.bind_program_name(&mut state, name);
        }
        for binding in desc.constants {
            let Ok(c_name) = CString::new(binding.name) else {
                self.report(&format!("uniform block name {:?} contains NUL", binding.name));
                continue;
            };
            let index = unsafe { (self.core.get_uniform_block_index)(name, c_name.as_ptr()) };
            if index != GL_INVALID_INDEX {
                unsafe { (self.core.uniform_block_binding)(name, index, binding.slot) };
            }
        }
        for binding in desc.samplers {
            let Ok(c_name) = CString::new(binding.name) else {
                self.report(&format!("sampler name {:?} contains NUL", binding.name));
                continue;
            };
            let location = unsafe { (self.core.get_uniform_location)(name, c_name.as_ptr()) };
            if location >= 0 {
                unsafe { (self.core.uniform1i)(location, binding.slot as GLint) };
            }
        }

        program.device = self.device;
        program.handle = Handle::IdPair(name, 0);
        program.vertex = desc.vertex.handle;
        program.fragment = desc.fragment.handle;
        program.geometry = desc.geometry.map(|shader| shader.handle).unwrap_or_default();
        program.vertex_bytecode = Vec::new();
        self.check_errors("create_program");
        Ok(())
    }

    pub fn delete_program(&self, program: &mut Program) {
        if let Handle::IdPair(name, _) = program.handle.take() {
            // Names can be reused once reclaimed; drop the cache entry so
            // a future bind of a recycled name is not skipped.
            let mut state = self.state();
            if state.program == name {
                state.program = 0;
            }
            drop(state);
            self.reclaim.push_program(name);
        }
        program.vertex = Handle::None;
        program.fragment = Handle::None;
        program.geometry = Handle::None;
        program.vertex_bytecode.clear();
    }

    fn read_info_log(
        &self,
        name: GLuint,
        read: unsafe extern "system" fn(GLuint, GLsizei, *mut GLsizei, *mut GLchar),
    ) -> String {
        let mut buffer = vec![0u8; 4096];
        let mut written: GLsizei = 0;
        unsafe {
            read(
                name,
                buffer.len() as GLsizei,
                &mut written,
                buffer.as_mut_ptr() as *mut GLchar,
            );
        }
        let written = (written.max(0) as usize).min(buffer.len());
        String::from_utf8_lossy(&buffer[..written]).into_owned()
    }

    // ---- uniform buffers -------------------------------------------------

    pub fn bind_uniform_buffer(&self, slot: u32, buffer: &Buffer, size: u32, offset: u32) {
        debug_assert_eq!(buffer.device, self.device);
        unsafe {
            (self.core.bind_buffer_range)(
                GL_UNIFORM_BUFFER,
                slot,
                buffer.handle.id_pair().0,
                offset as GLintptr,
                size as GLsizeiptr,
            );
        }
        self.check_errors("bind_uniform_buffer");
    }

    // ---- attributes bookkeeping -----------------------------------------

    /// Records the index width of the attributes state that just became
    /// current.
    pub fn note_bound_index(&self, state: &mut GlState, index: Option<IndexKind>) {
        state.index = index;
    }

    // ---- frame end -------------------------------------------------------

    pub fn tick(&self) {
        let bin = self.reclaim.drain();
        if bin.len() == 0 {
            return;
        }
        unsafe {
            if !bin.buffers.is_empty() {
                (self.core.delete_buffers)(bin.buffers.len() as GLsizei, bin.buffers.as_ptr());
            }
            if !bin.textures.is_empty() {
                (self.core.delete_textures)(bin.textures.len() as GLsizei, bin.textures.as_ptr());
            }
            if !bin.framebuffers.is_empty() {
                (self.core.delete_framebuffers)(
                    bin.framebuffers.len() as GLsizei,
                    bin.framebuffers.as_ptr(),
                );
            }
            if !bin.vertex_arrays.is_empty() {
                (self.core.delete_vertex_arrays)(
                    bin.vertex_arrays.len() as GLsizei,
                    bin.vertex_arrays.as_ptr(),
                );
            }
            for shader in &bin.shaders {
                (self.core.delete_shader)(*shader);
            }
            for program in &bin.programs {
                (self.core.delete_program)(*program);
            }
        }
        self.check_errors("tick");
    }

    // ---- raster parameters ----------------------------------------------

    pub fn set_viewport(&self, x: i32, y: i32, width: u32, height: u32) {
        unsafe { (self.core.viewport)(x, y, width as GLsizei, height as GLsizei) };
    }

    pub fn set_scissor(&self, x: i32, y: i32, width: u32, height: u32) {
        unsafe { (self.core.scissor)(x, y, width as GLsizei, height as GLsizei) };
    }

    pub fn set_line_width(&self, width: f32) {
        let mut state = self.state();
        if state.line_width != width {
            state.line_width = width;
            unsafe { (self.core.line_width)(width) };
        }
    }

    pub fn set_point_size(&self, size: f32) {
        let mut state = self.state();
        if state.point_size != size {
            state.point_size = size;
            unsafe { (self.core.point_size)(size) };
        }
    }
}

fn query_caps(core: &GlCore) -> DeviceCaps {
    let mut alignment: GLint = 0;
    let mut samplers: GLint = 0;
    let mut samples: GLint = 0;
    unsafe {
        (core.get_integerv)(GL_UNIFORM_BUFFER_OFFSET_ALIGNMENT, &mut alignment);
        (core.get_integerv)(GL_MAX_TEXTURE_IMAGE_UNITS, &mut samplers);
        (core.get_integerv)(GL_MAX_COLOR_TEXTURE_SAMPLES, &mut samples);
    }
    DeviceCaps {
        uniform_buffer_alignment: alignment.max(1) as u32,
        max_samplers: (samplers.max(1) as u32).min(MAX_SAMPLER_UNITS as u32),
        max_msaa_samples: samples.max(1) as u32,
    }
}
