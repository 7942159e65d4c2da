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

//! Raw OpenGL surface: scalar type aliases, the constants the backends
//! touch, and loader-built function pointer tables.
//!
//! Entry points are resolved by name through a host callback. A table
//! either resolves completely or construction fails with
//! [`GraphicsError::MissingEntryPoint`], so a device that exists can
//! call any slot without checking.

#![allow(missing_docs)]
#![allow(clippy::too_many_arguments)]

use core::ffi::c_void;
use opale_core::error::GraphicsError;

pub type GLenum = u32;
pub type GLboolean = u8;
pub type GLbitfield = u32;
pub type GLint = i32;
pub type GLuint = u32;
pub type GLsizei = i32;
pub type GLfloat = f32;
pub type GLchar = core::ffi::c_char;
pub type GLintptr = isize;
pub type GLsizeiptr = isize;

pub const GL_FALSE: GLboolean = 0;
pub const GL_TRUE: GLboolean = 1;

pub const GL_NO_ERROR: GLenum = 0;
pub const GL_INVALID_ENUM: GLenum = 0x0500;
pub const GL_INVALID_VALUE: GLenum = 0x0501;
pub const GL_INVALID_OPERATION: GLenum = 0x0502;
pub const GL_OUT_OF_MEMORY: GLenum = 0x0505;
pub const GL_INVALID_FRAMEBUFFER_OPERATION: GLenum = 0x0506;

pub const GL_POINTS: GLenum = 0x0000;
pub const GL_LINES: GLenum = 0x0001;
pub const GL_TRIANGLES: GLenum = 0x0004;

pub const GL_NEVER: GLenum = 0x0200;
pub const GL_LESS: GLenum = 0x0201;
pub const GL_EQUAL: GLenum = 0x0202;
pub const GL_LEQUAL: GLenum = 0x0203;
pub const GL_GREATER: GLenum = 0x0204;
pub const GL_NOTEQUAL: GLenum = 0x0205;
pub const GL_GEQUAL: GLenum = 0x0206;
pub const GL_ALWAYS: GLenum = 0x0207;

pub const GL_ZERO: GLenum = 0;
pub const GL_ONE: GLenum = 1;
pub const GL_SRC_COLOR: GLenum = 0x0300;
pub const GL_ONE_MINUS_SRC_COLOR: GLenum = 0x0301;
pub const GL_SRC_ALPHA: GLenum = 0x0302;
pub const GL_ONE_MINUS_SRC_ALPHA: GLenum = 0x0303;
pub const GL_DST_ALPHA: GLenum = 0x0304;
pub const GL_ONE_MINUS_DST_ALPHA: GLenum = 0x0305;
pub const GL_DST_COLOR: GLenum = 0x0306;
pub const GL_ONE_MINUS_DST_COLOR: GLenum = 0x0307;
pub const GL_CONSTANT_COLOR: GLenum = 0x8001;
pub const GL_ONE_MINUS_CONSTANT_COLOR: GLenum = 0x8002;

pub const GL_FUNC_ADD: GLenum = 0x8006;
pub const GL_MIN: GLenum = 0x8007;
pub const GL_MAX: GLenum = 0x8008;
pub const GL_FUNC_SUBTRACT: GLenum = 0x800A;
pub const GL_FUNC_REVERSE_SUBTRACT: GLenum = 0x800B;

pub const GL_KEEP: GLenum = 0x1E00;
pub const GL_REPLACE: GLenum = 0x1E01;
pub const GL_INCR: GLenum = 0x1E02;
pub const GL_DECR: GLenum = 0x1E03;
pub const GL_INVERT: GLenum = 0x150A;
pub const GL_INCR_WRAP: GLenum = 0x8507;
pub const GL_DECR_WRAP: GLenum = 0x8508;

pub const GL_POINT: GLenum = 0x1B00;
pub const GL_LINE: GLenum = 0x1B01;
pub const GL_FILL: GLenum = 0x1B02;
pub const GL_CW: GLenum = 0x0900;
pub const GL_CCW: GLenum = 0x0901;
pub const GL_FRONT: GLenum = 0x0404;
pub const GL_BACK: GLenum = 0x0405;
pub const GL_FRONT_AND_BACK: GLenum = 0x0408;

pub const GL_CULL_FACE: GLenum = 0x0B44;
pub const GL_DEPTH_TEST: GLenum = 0x0B71;
pub const GL_STENCIL_TEST: GLenum = 0x0B90;
pub const GL_BLEND: GLenum = 0x0BE2;
pub const GL_SCISSOR_TEST: GLenum = 0x0C11;

pub const GL_TEXTURE_2D: GLenum = 0x0DE1;
pub const GL_TEXTURE_3D: GLenum = 0x806F;
pub const GL_TEXTURE_2D_ARRAY: GLenum = 0x8C1A;
pub const GL_TEXTURE_2D_MULTISAMPLE: GLenum = 0x9100;
pub const GL_TEXTURE_2D_MULTISAMPLE_ARRAY: GLenum = 0x9102;
pub const GL_TEXTURE0: GLenum = 0x84C0;

pub const GL_NEAREST: GLenum = 0x2600;
pub const GL_LINEAR: GLenum = 0x2601;
pub const GL_NEAREST_MIPMAP_NEAREST: GLenum = 0x2700;
pub const GL_LINEAR_MIPMAP_NEAREST: GLenum = 0x2701;
pub const GL_NEAREST_MIPMAP_LINEAR: GLenum = 0x2702;
pub const GL_LINEAR_MIPMAP_LINEAR: GLenum = 0x2703;

pub const GL_TEXTURE_MAG_FILTER: GLenum = 0x2800;
pub const GL_TEXTURE_MIN_FILTER: GLenum = 0x2801;
pub const GL_TEXTURE_WRAP_S: GLenum = 0x2802;
pub const GL_TEXTURE_WRAP_T: GLenum = 0x2803;
pub const GL_TEXTURE_WRAP_R: GLenum = 0x8072;
pub const GL_TEXTURE_BASE_LEVEL: GLenum = 0x813C;
pub const GL_TEXTURE_MAX_LEVEL: GLenum = 0x813D;
pub const GL_TEXTURE_MAX_ANISOTROPY_EXT: GLenum = 0x84FE;

pub const GL_CLAMP_TO_EDGE: GLenum = 0x812F;
pub const GL_CLAMP_TO_BORDER: GLenum = 0x812D;
pub const GL_REPEAT: GLenum = 0x2901;
pub const GL_MIRRORED_REPEAT: GLenum = 0x8370;
pub const GL_MIRROR_CLAMP_TO_EDGE: GLenum = 0x8743;

pub const GL_DEPTH24_STENCIL8: GLenum = 0x88F0;
pub const GL_RGBA32F: GLenum = 0x8814;
pub const GL_RGBA16F: GLenum = 0x881A;
pub const GL_RGB32F: GLenum = 0x8815;
pub const GL_RGBA8: GLenum = 0x8058;
pub const GL_RGB5_A1: GLenum = 0x8057;
pub const GL_RGBA4: GLenum = 0x8056;
pub const GL_RGB565: GLenum = 0x8D62;
pub const GL_RG8: GLenum = 0x822B;
pub const GL_R8: GLenum = 0x8229;
pub const GL_COMPRESSED_RGB_S3TC_DXT1_EXT: GLenum = 0x83F0;
pub const GL_COMPRESSED_RGBA_S3TC_DXT1_EXT: GLenum = 0x83F1;
pub const GL_COMPRESSED_RGBA_S3TC_DXT3_EXT: GLenum = 0x83F2;
pub const GL_COMPRESSED_RGBA_S3TC_DXT5_EXT: GLenum = 0x83F3;

pub const GL_DEPTH_STENCIL: GLenum = 0x84F9;
pub const GL_BGRA: GLenum = 0x80E1;
pub const GL_RGB: GLenum = 0x1907;
pub const GL_RG: GLenum = 0x8227;
pub const GL_RED: GLenum = 0x1903;

pub const GL_UNSIGNED_INT_24_8: GLenum = 0x84FA;
pub const GL_UNSIGNED_INT_8_8_8_8_REV: GLenum = 0x8367;
pub const GL_UNSIGNED_SHORT_1_5_5_5_REV: GLenum = 0x8366;
pub const GL_UNSIGNED_SHORT_4_4_4_4_REV: GLenum = 0x8365;
pub const GL_UNSIGNED_SHORT_5_6_5_REV: GLenum = 0x8364;

pub const GL_BYTE: GLenum = 0x1400;
pub const GL_UNSIGNED_BYTE: GLenum = 0x1401;
pub const GL_SHORT: GLenum = 0x1402;
pub const GL_UNSIGNED_SHORT: GLenum = 0x1403;
pub const GL_INT: GLenum = 0x1404;
pub const GL_UNSIGNED_INT: GLenum = 0x1405;
pub const GL_FLOAT: GLenum = 0x1406;
pub const GL_HALF_FLOAT: GLenum = 0x140B;

pub const GL_ARRAY_BUFFER: GLenum = 0x8892;
pub const GL_ELEMENT_ARRAY_BUFFER: GLenum = 0x8893;
pub const GL_UNIFORM_BUFFER: GLenum = 0x8A11;
pub const GL_STATIC_DRAW: GLenum = 0x88E4;
pub const GL_DYNAMIC_DRAW: GLenum = 0x88E8;
pub const GL_STREAM_DRAW: GLenum = 0x88E0;

pub const GL_MAP_WRITE_BIT: GLbitfield = 0x0002;
pub const GL_MAP_PERSISTENT_BIT: GLbitfield = 0x0040;
pub const GL_MAP_COHERENT_BIT: GLbitfield = 0x0080;
pub const GL_DYNAMIC_STORAGE_BIT: GLbitfield = 0x0100;

pub const GL_VERTEX_SHADER: GLenum = 0x8B31;
pub const GL_FRAGMENT_SHADER: GLenum = 0x8B30;
pub const GL_GEOMETRY_SHADER: GLenum = 0x8DD9;
pub const GL_COMPILE_STATUS: GLenum = 0x8B81;
pub const GL_LINK_STATUS: GLenum = 0x8B82;

pub const GL_READ_FRAMEBUFFER: GLenum = 0x8CA8;
pub const GL_DRAW_FRAMEBUFFER: GLenum = 0x8CA9;
pub const GL_FRAMEBUFFER_COMPLETE: GLenum = 0x8CD5;
pub const GL_COLOR_ATTACHMENT0: GLenum = 0x8CE0;
pub const GL_DEPTH_ATTACHMENT: GLenum = 0x8D00;
pub const GL_STENCIL_ATTACHMENT: GLenum = 0x8D20;
pub const GL_NONE: GLenum = 0;
pub const GL_COLOR: GLenum = 0x1800;
pub const GL_DEPTH: GLenum = 0x1801;
pub const GL_STENCIL: GLenum = 0x1802;

pub const GL_COLOR_BUFFER_BIT: GLbitfield = 0x0000_4000;
pub const GL_DEPTH_BUFFER_BIT: GLbitfield = 0x0000_0100;
pub const GL_STENCIL_BUFFER_BIT: GLbitfield = 0x0000_0400;

pub const GL_UNIFORM_BUFFER_OFFSET_ALIGNMENT: GLenum = 0x8A34;
pub const GL_MAX_TEXTURE_IMAGE_UNITS: GLenum = 0x8872;
pub const GL_MAX_COLOR_TEXTURE_SAMPLES: GLenum = 0x910E;

/// Builds a function pointer table resolved by name through a host
/// loader. Any name the loader cannot resolve fails the whole table
/// with [`GraphicsError::MissingEntryPoint`].
macro_rules! gl_fn_table {
    (
        $(#[$meta:meta])*
        pub struct $table:ident {
            $( $field:ident: $name:literal => fn($($arg:ty),* $(,)?) $(-> $ret:ty)? ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy)]
        pub struct $table {
            $( pub $field: unsafe extern "system" fn($($arg),*) $(-> $ret)?, )+
        }

        impl $table {
            pub fn load(
                loader: &mut dyn FnMut(&str) -> *const c_void,
            ) -> Result<Self, GraphicsError> {
                Ok(Self {
                    $( $field: {
                        let ptr = loader($name);
                        if ptr.is_null() {
                            return Err(GraphicsError::MissingEntryPoint($name.to_string()));
                        }
                        // SAFETY: the loader contract is that a non-null
                        // pointer for this name has this signature.
                        unsafe {
                            core::mem::transmute::<
                                *const c_void,
                                unsafe extern "system" fn($($arg),*) $(-> $ret)?,
                            >(ptr)
                        }
                    }, )+
                })
            }
        }

        impl core::fmt::Debug for $table {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.debug_struct(stringify!($table)).finish_non_exhaustive()
            }
        }
    };
}

gl_fn_table! {
    /// Entry points common to the 3.3 and 4.5 devices.
    pub struct GlCore {
        enable: "glEnable" => fn(GLenum),
        disable: "glDisable" => fn(GLenum),
        get_error: "glGetError" => fn() -> GLenum,
        get_integerv: "glGetIntegerv" => fn(GLenum, *mut GLint),
        viewport: "glViewport" => fn(GLint, GLint, GLsizei, GLsizei),
        scissor: "glScissor" => fn(GLint, GLint, GLsizei, GLsizei),
        line_width: "glLineWidth" => fn(GLfloat),
        point_size: "glPointSize" => fn(GLfloat),
        draw_arrays: "glDrawArrays" => fn(GLenum, GLint, GLsizei),
        draw_elements: "glDrawElements" => fn(GLenum, GLsizei, GLenum, *const c_void),
        draw_arrays_instanced: "glDrawArraysInstanced" => fn(GLenum, GLint, GLsizei, GLsizei),
        draw_elements_instanced: "glDrawElementsInstanced"
            => fn(GLenum, GLsizei, GLenum, *const c_void, GLsizei),
        blend_func_separate: "glBlendFuncSeparate" => fn(GLenum, GLenum, GLenum, GLenum),
        blend_equation_separate: "glBlendEquationSeparate" => fn(GLenum, GLenum),
        depth_func: "glDepthFunc" => fn(GLenum),
        depth_mask: "glDepthMask" => fn(GLboolean),
        stencil_func: "glStencilFunc" => fn(GLenum, GLint, GLuint),
        stencil_mask: "glStencilMask" => fn(GLuint),
        stencil_op: "glStencilOp" => fn(GLenum, GLenum, GLenum),
        polygon_mode: "glPolygonMode" => fn(GLenum, GLenum),
        cull_face: "glCullFace" => fn(GLenum),
        front_face: "glFrontFace" => fn(GLenum),
        bind_buffer: "glBindBuffer" => fn(GLenum, GLuint),
        bind_buffer_range: "glBindBufferRange" => fn(GLenum, GLuint, GLuint, GLintptr, GLsizeiptr),
        bind_vertex_array: "glBindVertexArray" => fn(GLuint),
        bind_framebuffer: "glBindFramebuffer" => fn(GLenum, GLuint),
        delete_buffers: "glDeleteBuffers" => fn(GLsizei, *const GLuint),
        delete_textures: "glDeleteTextures" => fn(GLsizei, *const GLuint),
        delete_framebuffers: "glDeleteFramebuffers" => fn(GLsizei, *const GLuint),
        delete_vertex_arrays: "glDeleteVertexArrays" => fn(GLsizei, *const GLuint),
        delete_shader: "glDeleteShader" => fn(GLuint),
        delete_program: "glDeleteProgram" => fn(GLuint),
        create_shader: "glCreateShader" => fn(GLenum) -> GLuint,
        shader_source: "glShaderSource" => fn(GLuint, GLsizei, *const *const GLchar, *const GLint),
        compile_shader: "glCompileShader" => fn(GLuint),
        get_shaderiv: "glGetShaderiv" => fn(GLuint, GLenum, *mut GLint),
        get_shader_info_log: "glGetShaderInfoLog" => fn(GLuint, GLsizei, *mut GLsizei, *mut GLchar),
        create_program: "glCreateProgram" => fn() -> GLuint,
        attach_shader: "glAttachShader" => fn(GLuint, GLuint),
        bind_attrib_location: "glBindAttribLocation" => fn(GLuint, GLuint, *const GLchar),
        detach_shader: "glDetachShader" => fn(GLuint, GLuint),
        link_program: "glLinkProgram" => fn(GLuint),
        get_programiv: "glGetProgramiv" => fn(GLuint, GLenum, *mut GLint),
        get_program_info_log: "glGetProgramInfoLog" => fn(GLuint, GLsizei, *mut GLsizei, *mut GLchar),
        use_program: "glUseProgram" => fn(GLuint),
        get_uniform_block_index: "glGetUniformBlockIndex" => fn(GLuint, *const GLchar) -> GLuint,
        uniform_block_binding: "glUniformBlockBinding" => fn(GLuint, GLuint, GLuint),
        get_uniform_location: "glGetUniformLocation" => fn(GLuint, *const GLchar) -> GLint,
        uniform1i: "glUniform1i" => fn(GLint, GLint),
    }
}

gl_fn_table! {
    /// Bind-to-edit entry points for the 3.3 device.
    pub struct GlCompat {
        gen_buffers: "glGenBuffers" => fn(GLsizei, *mut GLuint),
        buffer_data: "glBufferData" => fn(GLenum, GLsizeiptr, *const c_void, GLenum),
        buffer_sub_data: "glBufferSubData" => fn(GLenum, GLintptr, GLsizeiptr, *const c_void),
        gen_textures: "glGenTextures" => fn(GLsizei, *mut GLuint),
        active_texture: "glActiveTexture" => fn(GLenum),
        bind_texture: "glBindTexture" => fn(GLenum, GLuint),
        tex_parameteri: "glTexParameteri" => fn(GLenum, GLenum, GLint),
        tex_parameterf: "glTexParameterf" => fn(GLenum, GLenum, GLfloat),
        tex_image_2d: "glTexImage2D"
            => fn(GLenum, GLint, GLint, GLsizei, GLsizei, GLint, GLenum, GLenum, *const c_void),
        tex_image_3d: "glTexImage3D"
            => fn(GLenum, GLint, GLint, GLsizei, GLsizei, GLsizei, GLint, GLenum, GLenum, *const c_void),
        tex_sub_image_2d: "glTexSubImage2D"
            => fn(GLenum, GLint, GLint, GLint, GLsizei, GLsizei, GLenum, GLenum, *const c_void),
        tex_sub_image_3d: "glTexSubImage3D"
            => fn(GLenum, GLint, GLint, GLint, GLint, GLsizei, GLsizei, GLsizei, GLenum, GLenum, *const c_void),
        compressed_tex_image_2d: "glCompressedTexImage2D"
            => fn(GLenum, GLint, GLenum, GLsizei, GLsizei, GLint, GLsizei, *const c_void),
        compressed_tex_image_3d: "glCompressedTexImage3D"
            => fn(GLenum, GLint, GLenum, GLsizei, GLsizei, GLsizei, GLint, GLsizei, *const c_void),
        compressed_tex_sub_image_2d: "glCompressedTexSubImage2D"
            => fn(GLenum, GLint, GLint, GLint, GLsizei, GLsizei, GLenum, GLsizei, *const c_void),
        compressed_tex_sub_image_3d: "glCompressedTexSubImage3D"
            => fn(GLenum, GLint, GLint, GLint, GLint, GLsizei, GLsizei, GLsizei, GLenum, GLsizei, *const c_void),
        tex_image_2d_multisample: "glTexImage2DMultisample"
            => fn(GLenum, GLsizei, GLenum, GLsizei, GLsizei, GLboolean),
        tex_image_3d_multisample: "glTexImage3DMultisample"
            => fn(GLenum, GLsizei, GLenum, GLsizei, GLsizei, GLsizei, GLboolean),
        gen_vertex_arrays: "glGenVertexArrays" => fn(GLsizei, *mut GLuint),
        enable_vertex_attrib_array: "glEnableVertexAttribArray" => fn(GLuint),
        vertex_attrib_pointer: "glVertexAttribPointer"
            => fn(GLuint, GLint, GLenum, GLboolean, GLsizei, *const c_void),
        vertex_attrib_ipointer: "glVertexAttribIPointer"
            => fn(GLuint, GLint, GLenum, GLsizei, *const c_void),
        gen_framebuffers: "glGenFramebuffers" => fn(GLsizei, *mut GLuint),
        framebuffer_texture: "glFramebufferTexture" => fn(GLenum, GLenum, GLuint, GLint),
        check_framebuffer_status: "glCheckFramebufferStatus" => fn(GLenum) -> GLenum,
        clear_bufferfv: "glClearBufferfv" => fn(GLenum, GLint, *const GLfloat),
        clear_bufferfi: "glClearBufferfi" => fn(GLenum, GLint, GLfloat, GLint),
        draw_buffers: "glDrawBuffers" => fn(GLsizei, *const GLenum),
        draw_buffer: "glDrawBuffer" => fn(GLenum),
        read_buffer: "glReadBuffer" => fn(GLenum),
        blit_framebuffer: "glBlitFramebuffer"
            => fn(GLint, GLint, GLint, GLint, GLint, GLint, GLint, GLint, GLbitfield, GLenum),
    }
}

gl_fn_table! {
    /// Direct state access entry points for the 4.5 device.
    pub struct GlDsa {
        create_buffers: "glCreateBuffers" => fn(GLsizei, *mut GLuint),
        named_buffer_storage: "glNamedBufferStorage" => fn(GLuint, GLsizeiptr, *const c_void, GLbitfield),
        named_buffer_sub_data: "glNamedBufferSubData" => fn(GLuint, GLintptr, GLsizeiptr, *const c_void),
        map_named_buffer_range: "glMapNamedBufferRange"
            => fn(GLuint, GLintptr, GLsizeiptr, GLbitfield) -> *mut c_void,
        create_textures: "glCreateTextures" => fn(GLenum, GLsizei, *mut GLuint),
        texture_storage_2d: "glTextureStorage2D" => fn(GLuint, GLsizei, GLenum, GLsizei, GLsizei),
        texture_storage_3d: "glTextureStorage3D" => fn(GLuint, GLsizei, GLenum, GLsizei, GLsizei, GLsizei),
        texture_storage_2d_multisample: "glTextureStorage2DMultisample"
            => fn(GLuint, GLsizei, GLenum, GLsizei, GLsizei, GLboolean),
        texture_storage_3d_multisample: "glTextureStorage3DMultisample"
            => fn(GLuint, GLsizei, GLenum, GLsizei, GLsizei, GLsizei, GLboolean),
        texture_sub_image_2d: "glTextureSubImage2D"
            => fn(GLuint, GLint, GLint, GLint, GLsizei, GLsizei, GLenum, GLenum, *const c_void),
        texture_sub_image_3d: "glTextureSubImage3D"
            => fn(GLuint, GLint, GLint, GLint, GLint, GLsizei, GLsizei, GLsizei, GLenum, GLenum, *const c_void),
        compressed_texture_sub_image_2d: "glCompressedTextureSubImage2D"
            => fn(GLuint, GLint, GLint, GLint, GLsizei, GLsizei, GLenum, GLsizei, *const c_void),
        compressed_texture_sub_image_3d: "glCompressedTextureSubImage3D"
            => fn(GLuint, GLint, GLint, GLint, GLint, GLsizei, GLsizei, GLsizei, GLenum, GLsizei, *const c_void),
        texture_parameteri: "glTextureParameteri" => fn(GLuint, GLenum, GLint),
        texture_parameterf: "glTextureParameterf" => fn(GLuint, GLenum, GLfloat),
        create_vertex_arrays: "glCreateVertexArrays" => fn(GLsizei, *mut GLuint),
        enable_vertex_array_attrib: "glEnableVertexArrayAttrib" => fn(GLuint, GLuint),
        vertex_array_attrib_binding: "glVertexArrayAttribBinding" => fn(GLuint, GLuint, GLuint),
        vertex_array_attrib_format: "glVertexArrayAttribFormat"
            => fn(GLuint, GLuint, GLint, GLenum, GLboolean, GLuint),
        vertex_array_attrib_iformat: "glVertexArrayAttribIFormat"
            => fn(GLuint, GLuint, GLint, GLenum, GLuint),
        vertex_array_vertex_buffer: "glVertexArrayVertexBuffer"
            => fn(GLuint, GLuint, GLuint, GLintptr, GLsizei),
        vertex_array_element_buffer: "glVertexArrayElementBuffer" => fn(GLuint, GLuint),
        create_framebuffers: "glCreateFramebuffers" => fn(GLsizei, *mut GLuint),
        named_framebuffer_texture: "glNamedFramebufferTexture" => fn(GLuint, GLenum, GLuint, GLint),
        named_framebuffer_draw_buffers: "glNamedFramebufferDrawBuffers"
            => fn(GLuint, GLsizei, *const GLenum),
        named_framebuffer_draw_buffer: "glNamedFramebufferDrawBuffer" => fn(GLuint, GLenum),
        named_framebuffer_read_buffer: "glNamedFramebufferReadBuffer" => fn(GLuint, GLenum),
        check_named_framebuffer_status: "glCheckNamedFramebufferStatus" => fn(GLuint, GLenum) -> GLenum,
        clear_named_framebufferfv: "glClearNamedFramebufferfv"
            => fn(GLuint, GLenum, GLint, *const GLfloat),
        clear_named_framebufferfi: "glClearNamedFramebufferfi"
            => fn(GLuint, GLenum, GLint, GLfloat, GLint),
        blit_named_framebuffer: "glBlitNamedFramebuffer"
            => fn(GLuint, GLuint, GLint, GLint, GLint, GLint, GLint, GLint, GLint, GLint, GLbitfield, GLenum),
        bind_textures: "glBindTextures" => fn(GLuint, GLsizei, *const GLuint),
    }
}
