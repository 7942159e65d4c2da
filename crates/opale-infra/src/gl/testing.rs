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

//! A recording in-process GL for tests.
//!
//! [`resolve`] hands out stubs for every entry point the devices load.
//! Each stub appends its name to a thread-local call log, so tests can
//! assert exactly which native calls an operation produced - in
//! particular that a redundant operation produced none. State is
//! per-thread; every test builds its own device and log.

#![allow(non_snake_case)]

use core::ffi::c_void;
use std::cell::{Cell, RefCell};

use super::api::*;

thread_local! {
    static CALLS: RefCell<Vec<&'static str>> = const { RefCell::new(Vec::new()) };
    static NEXT_NAME: Cell<GLuint> = const { Cell::new(1) };
    static MAPS: RefCell<Vec<Box<[u8]>>> = const { RefCell::new(Vec::new()) };
}

fn record(name: &'static str) {
    CALLS.with(|calls| calls.borrow_mut().push(name));
}

fn next_name() -> GLuint {
    NEXT_NAME.with(|next| {
        let name = next.get();
        next.set(name + 1);
        name
    })
}

fn alloc_names(count: GLsizei, out: *mut GLuint) {
    for index in 0..count.max(0) as usize {
        unsafe { *out.add(index) = next_name() };
    }
}

/// Clears the call log, the name counter and the mapped-range arena.
pub fn reset() {
    CALLS.with(|calls| calls.borrow_mut().clear());
    NEXT_NAME.with(|next| next.set(1));
    MAPS.with(|maps| maps.borrow_mut().clear());
}

/// Number of calls to the entry point `name` since the last reset.
pub fn count(name: &str) -> usize {
    CALLS.with(|calls| calls.borrow().iter().filter(|call| **call == name).count())
}

/// The full call log since the last reset.
pub fn calls() -> Vec<&'static str> {
    CALLS.with(|calls| calls.borrow().clone())
}

/// Copy of the `index`-th mapped buffer range handed out on this thread.
pub fn map_snapshot(index: usize) -> Vec<u8> {
    MAPS.with(|maps| maps.borrow()[index].to_vec())
}

// Stubs with observable behavior.

unsafe extern "system" fn glGetError() -> GLenum {
    GL_NO_ERROR
}

unsafe extern "system" fn glGetIntegerv(pname: GLenum, out: *mut GLint) {
    record("glGetIntegerv");
    let value = match pname {
        GL_UNIFORM_BUFFER_OFFSET_ALIGNMENT => 256,
        GL_MAX_TEXTURE_IMAGE_UNITS => 16,
        GL_MAX_COLOR_TEXTURE_SAMPLES => 8,
        _ => 0,
    };
    unsafe { *out = value };
}

unsafe extern "system" fn glGenBuffers(count: GLsizei, out: *mut GLuint) {
    record("glGenBuffers");
    alloc_names(count, out);
}

unsafe extern "system" fn glGenTextures(count: GLsizei, out: *mut GLuint) {
    record("glGenTextures");
    alloc_names(count, out);
}

unsafe extern "system" fn glGenVertexArrays(count: GLsizei, out: *mut GLuint) {
    record("glGenVertexArrays");
    alloc_names(count, out);
}

unsafe extern "system" fn glGenFramebuffers(count: GLsizei, out: *mut GLuint) {
    record("glGenFramebuffers");
    alloc_names(count, out);
}

unsafe extern "system" fn glCreateBuffers(count: GLsizei, out: *mut GLuint) {
    record("glCreateBuffers");
    alloc_names(count, out);
}

unsafe extern "system" fn glCreateTextures(_target: GLenum, count: GLsizei, out: *mut GLuint) {
    record("glCreateTextures");
    alloc_names(count, out);
}

unsafe extern "system" fn glCreateVertexArrays(count: GLsizei, out: *mut GLuint) {
    record("glCreateVertexArrays");
    alloc_names(count, out);
}

unsafe extern "system" fn glCreateFramebuffers(count: GLsizei, out: *mut GLuint) {
    record("glCreateFramebuffers");
    alloc_names(count, out);
}

unsafe extern "system" fn glCreateShader(_stage: GLenum) -> GLuint {
    record("glCreateShader");
    next_name()
}

unsafe extern "system" fn glCreateProgram() -> GLuint {
    record("glCreateProgram");
    next_name()
}

unsafe extern "system" fn glGetShaderiv(_shader: GLuint, _pname: GLenum, out: *mut GLint) {
    record("glGetShaderiv");
    unsafe { *out = 1 };
}

unsafe extern "system" fn glGetProgramiv(_program: GLuint, _pname: GLenum, out: *mut GLint) {
    record("glGetProgramiv");
    unsafe { *out = 1 };
}

unsafe extern "system" fn glGetShaderInfoLog(
    _shader: GLuint,
    _capacity: GLsizei,
    written: *mut GLsizei,
    _out: *mut GLchar,
) {
    record("glGetShaderInfoLog");
    unsafe { *written = 0 };
}

unsafe extern "system" fn glGetProgramInfoLog(
    _program: GLuint,
    _capacity: GLsizei,
    written: *mut GLsizei,
    _out: *mut GLchar,
) {
    record("glGetProgramInfoLog");
    unsafe { *written = 0 };
}

unsafe extern "system" fn glGetUniformBlockIndex(_program: GLuint, _name: *const GLchar) -> GLuint {
    record("glGetUniformBlockIndex");
    0
}

unsafe extern "system" fn glGetUniformLocation(_program: GLuint, _name: *const GLchar) -> GLint {
    record("glGetUniformLocation");
    0
}

unsafe extern "system" fn glCheckFramebufferStatus(_target: GLenum) -> GLenum {
    record("glCheckFramebufferStatus");
    GL_FRAMEBUFFER_COMPLETE
}

unsafe extern "system" fn glCheckNamedFramebufferStatus(_name: GLuint, _target: GLenum) -> GLenum {
    record("glCheckNamedFramebufferStatus");
    GL_FRAMEBUFFER_COMPLETE
}

unsafe extern "system" fn glMapNamedBufferRange(
    _name: GLuint,
    _offset: GLintptr,
    length: GLsizeiptr,
    _access: GLbitfield,
) -> *mut c_void {
    record("glMapNamedBufferRange");
    MAPS.with(|maps| {
        let mut maps = maps.borrow_mut();
        maps.push(vec![0u8; length.max(1) as usize].into_boxed_slice());
        let index = maps.len() - 1;
        maps[index].as_mut_ptr() as *mut c_void
    })
}

macro_rules! fake_gl_noops {
    ( $( $name:ident ( $($arg:ty),* ); )+ ) => {
        $(
            unsafe extern "system" fn $name($(_: $arg),*) {
                record(stringify!($name));
            }
        )+

        fn resolve_noop(name: &str) -> *const c_void {
            match name {
                $( stringify!($name) => $name as *const c_void, )+
                _ => core::ptr::null(),
            }
        }
    };
}

fake_gl_noops! {
    glEnable(GLenum);
    glDisable(GLenum);
    glViewport(GLint, GLint, GLsizei, GLsizei);
    glScissor(GLint, GLint, GLsizei, GLsizei);
    glLineWidth(GLfloat);
    glPointSize(GLfloat);
    glDrawArrays(GLenum, GLint, GLsizei);
    glDrawElements(GLenum, GLsizei, GLenum, *const c_void);
    glDrawArraysInstanced(GLenum, GLint, GLsizei, GLsizei);
    glDrawElementsInstanced(GLenum, GLsizei, GLenum, *const c_void, GLsizei);
    glBlendFuncSeparate(GLenum, GLenum, GLenum, GLenum);
    glBlendEquationSeparate(GLenum, GLenum);
    glDepthFunc(GLenum);
    glDepthMask(GLboolean);
    glStencilFunc(GLenum, GLint, GLuint);
    glStencilMask(GLuint);
    glStencilOp(GLenum, GLenum, GLenum);
    glPolygonMode(GLenum, GLenum);
    glCullFace(GLenum);
    glFrontFace(GLenum);
    glBindBuffer(GLenum, GLuint);
    glBindBufferRange(GLenum, GLuint, GLuint, GLintptr, GLsizeiptr);
    glBindVertexArray(GLuint);
    glBindFramebuffer(GLenum, GLuint);
    glDeleteBuffers(GLsizei, *const GLuint);
    glDeleteTextures(GLsizei, *const GLuint);
    glDeleteFramebuffers(GLsizei, *const GLuint);
    glDeleteVertexArrays(GLsizei, *const GLuint);
    glDeleteShader(GLuint);
    glDeleteProgram(GLuint);
    glShaderSource(GLuint, GLsizei, *const *const GLchar, *const GLint);
    glCompileShader(GLuint);
    glAttachShader(GLuint, GLuint);
    glBindAttribLocation(GLuint, GLuint, *const GLchar);
    glDetachShader(GLuint, GLuint);
    glLinkProgram(GLuint);
    glUseProgram(GLuint);
    glUniformBlockBinding(GLuint, GLuint, GLuint);
    glUniform1i(GLint, GLint);
    glBufferData(GLenum, GLsizeiptr, *const c_void, GLenum);
    glBufferSubData(GLenum, GLintptr, GLsizeiptr, *const c_void);
    glActiveTexture(GLenum);
    glBindTexture(GLenum, GLuint);
    glTexParameteri(GLenum, GLenum, GLint);
    glTexParameterf(GLenum, GLenum, GLfloat);
    glTexImage2D(GLenum, GLint, GLint, GLsizei, GLsizei, GLint, GLenum, GLenum, *const c_void);
    glTexImage3D(GLenum, GLint, GLint, GLsizei, GLsizei, GLsizei, GLint, GLenum, GLenum, *const c_void);
    glTexSubImage2D(GLenum, GLint, GLint, GLint, GLsizei, GLsizei, GLenum, GLenum, *const c_void);
    glTexSubImage3D(GLenum, GLint, GLint, GLint, GLint, GLsizei, GLsizei, GLsizei, GLenum, GLenum, *const c_void);
    glCompressedTexImage2D(GLenum, GLint, GLenum, GLsizei, GLsizei, GLint, GLsizei, *const c_void);
    glCompressedTexImage3D(GLenum, GLint, GLenum, GLsizei, GLsizei, GLsizei, GLint, GLsizei, *const c_void);
    glCompressedTexSubImage2D(GLenum, GLint, GLint, GLint, GLsizei, GLsizei, GLenum, GLsizei, *const c_void);
    glCompressedTexSubImage3D(GLenum, GLint, GLint, GLint, GLint, GLsizei, GLsizei, GLsizei, GLenum, GLsizei, *const c_void);
    glTexImage2DMultisample(GLenum, GLsizei, GLenum, GLsizei, GLsizei, GLboolean);
    glTexImage3DMultisample(GLenum, GLsizei, GLenum, GLsizei, GLsizei, GLsizei, GLboolean);
    glEnableVertexAttribArray(GLuint);
    glVertexAttribPointer(GLuint, GLint, GLenum, GLboolean, GLsizei, *const c_void);
    glVertexAttribIPointer(GLuint, GLint, GLenum, GLsizei, *const c_void);
    glFramebufferTexture(GLenum, GLenum, GLuint, GLint);
    glClearBufferfv(GLenum, GLint, *const GLfloat);
    glClearBufferfi(GLenum, GLint, GLfloat, GLint);
    glDrawBuffers(GLsizei, *const GLenum);
    glDrawBuffer(GLenum);
    glReadBuffer(GLenum);
    glBlitFramebuffer(GLint, GLint, GLint, GLint, GLint, GLint, GLint, GLint, GLbitfield, GLenum);
    glNamedBufferStorage(GLuint, GLsizeiptr, *const c_void, GLbitfield);
    glNamedBufferSubData(GLuint, GLintptr, GLsizeiptr, *const c_void);
    glTextureStorage2D(GLuint, GLsizei, GLenum, GLsizei, GLsizei);
    glTextureStorage3D(GLuint, GLsizei, GLenum, GLsizei, GLsizei, GLsizei);
    glTextureStorage2DMultisample(GLuint, GLsizei, GLenum, GLsizei, GLsizei, GLboolean);
    glTextureStorage3DMultisample(GLuint, GLsizei, GLenum, GLsizei, GLsizei, GLsizei, GLboolean);
    glTextureSubImage2D(GLuint, GLint, GLint, GLint, GLsizei, GLsizei, GLenum, GLenum, *const c_void);
    glTextureSubImage3D(GLuint, GLint, GLint, GLint, GLint, GLsizei, GLsizei, GLsizei, GLenum, GLenum, *const c_void);
    glCompressedTextureSubImage2D(GLuint, GLint, GLint, GLint, GLsizei, GLsizei, GLenum, GLsizei, *const c_void);
    glCompressedTextureSubImage3D(GLuint, GLint, GLint, GLint, GLint, GLsizei, GLsizei, GLsizei, GLenum, GLsizei, *const c_void);
    glTextureParameteri(GLuint, GLenum, GLint);
    glTextureParameterf(GLuint, GLenum, GLfloat);
    glEnableVertexArrayAttrib(GLuint, GLuint);
    glVertexArrayAttribBinding(GLuint, GLuint, GLuint);
    glVertexArrayAttribFormat(GLuint, GLuint, GLint, GLenum, GLboolean, GLuint);
    glVertexArrayAttribIFormat(GLuint, GLuint, GLint, GLenum, GLuint);
    glVertexArrayVertexBuffer(GLuint, GLuint, GLuint, GLintptr, GLsizei);
    glVertexArrayElementBuffer(GLuint, GLuint);
    glNamedFramebufferTexture(GLuint, GLenum, GLuint, GLint);
    glNamedFramebufferDrawBuffers(GLuint, GLsizei, *const GLenum);
    glNamedFramebufferDrawBuffer(GLuint, GLenum);
    glNamedFramebufferReadBuffer(GLuint, GLenum);
    glClearNamedFramebufferfv(GLuint, GLenum, GLint, *const GLfloat);
    glClearNamedFramebufferfi(GLuint, GLenum, GLint, GLfloat, GLint);
    glBlitNamedFramebuffer(GLuint, GLuint, GLint, GLint, GLint, GLint, GLint, GLint, GLint, GLint, GLbitfield, GLenum);
    glBindTextures(GLuint, GLsizei, *const GLuint);
}

/// Resolves an entry point by name, as a context loader would.
pub fn resolve(name: &str) -> *const c_void {
    match name {
        "glGetError" => glGetError as *const c_void,
        "glGetIntegerv" => glGetIntegerv as *const c_void,
        "glGenBuffers" => glGenBuffers as *const c_void,
        "glGenTextures" => glGenTextures as *const c_void,
        "glGenVertexArrays" => glGenVertexArrays as *const c_void,
        "glGenFramebuffers" => glGenFramebuffers as *const c_void,
        "glCreateBuffers" => glCreateBuffers as *const c_void,
        "glCreateTextures" => glCreateTextures as *const c_void,
        "glCreateVertexArrays" => glCreateVertexArrays as *const c_void,
        "glCreateFramebuffers" => glCreateFramebuffers as *const c_void,
        "glCreateShader" => glCreateShader as *const c_void,
        "glCreateProgram" => glCreateProgram as *const c_void,
        "glGetShaderiv" => glGetShaderiv as *const c_void,
        "glGetProgramiv" => glGetProgramiv as *const c_void,
        "glGetShaderInfoLog" => glGetShaderInfoLog as *const c_void,
        "glGetProgramInfoLog" => glGetProgramInfoLog as *const c_void,
        "glGetUniformBlockIndex" => glGetUniformBlockIndex as *const c_void,
        "glGetUniformLocation" => glGetUniformLocation as *const c_void,
        "glCheckFramebufferStatus" => glCheckFramebufferStatus as *const c_void,
        "glCheckNamedFramebufferStatus" => glCheckNamedFramebufferStatus as *const c_void,
        "glMapNamedBufferRange" => glMapNamedBufferRange as *const c_void,
        _ => resolve_noop(name),
    }
}
