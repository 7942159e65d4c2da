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

//! Deferred destruction of GL objects.
//!
//! GL objects can only be destroyed on the thread that owns the context,
//! but record owners may drop resources from anywhere. Deletion therefore
//! pushes the native name into a synchronized per-kind queue; the device
//! drains it on the rendering thread at the end of each frame, batching
//! the names into single `glDelete*` calls where GL allows it.

use std::sync::{Mutex, MutexGuard};

use super::api::GLuint;

/// Names pending destruction, grouped by object kind.
#[derive(Debug, Default)]
pub(crate) struct ReclaimBin {
    pub buffers: Vec<GLuint>,
    pub textures: Vec<GLuint>,
    pub framebuffers: Vec<GLuint>,
    pub vertex_arrays: Vec<GLuint>,
    pub shaders: Vec<GLuint>,
    pub programs: Vec<GLuint>,
}

impl ReclaimBin {
    pub fn len(&self) -> usize {
        self.buffers.len()
            + self.textures.len()
            + self.framebuffers.len()
            + self.vertex_arrays.len()
            + self.shaders.len()
            + self.programs.len()
    }
}

/// A thread-safe dead-object queue shared between record owners and the
/// rendering thread.
#[derive(Debug, Default)]
pub struct ReclaimQueues {
    bin: Mutex<ReclaimBin>,
}

impl ReclaimQueues {
    fn bin(&self) -> MutexGuard<'_, ReclaimBin> {
        match self.bin.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    pub(crate) fn push_buffer(&self, name: GLuint) {
        self.bin().buffers.push(name);
    }

    pub(crate) fn push_texture(&self, name: GLuint) {
        self.bin().textures.push(name);
    }

    pub(crate) fn push_framebuffer(&self, name: GLuint) {
        self.bin().framebuffers.push(name);
    }

    pub(crate) fn push_vertex_array(&self, name: GLuint) {
        self.bin().vertex_arrays.push(name);
    }

    pub(crate) fn push_shader(&self, name: GLuint) {
        self.bin().shaders.push(name);
    }

    pub(crate) fn push_program(&self, name: GLuint) {
        self.bin().programs.push(name);
    }

    /// Takes everything queued so far, leaving the queues empty.
    pub(crate) fn drain(&self) -> ReclaimBin {
        std::mem::take(&mut *self.bin())
    }

    /// Number of names currently queued, across all kinds.
    pub fn pending(&self) -> usize {
        self.bin().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drain_empties_all_kinds() {
        let queues = ReclaimQueues::default();
        queues.push_buffer(3);
        queues.push_buffer(4);
        queues.push_texture(9);
        queues.push_program(2);
        assert_eq!(queues.pending(), 4);

        let bin = queues.drain();
        assert_eq!(bin.buffers, vec![3, 4]);
        assert_eq!(bin.textures, vec![9]);
        assert_eq!(bin.programs, vec![2]);
        assert_eq!(queues.pending(), 0);
    }

    #[test]
    fn test_concurrent_pushes_all_arrive() {
        let queues = ReclaimQueues::default();
        let a = 57;
        let b = 43;

        std::thread::scope(|scope| {
            scope.spawn(|| {
                for name in 0..a {
                    queues.push_buffer(name);
                }
            });
            scope.spawn(|| {
                for name in 0..b {
                    queues.push_texture(name);
                }
            });
        });

        assert_eq!(queues.pending(), (a + b) as usize);
        let bin = queues.drain();
        assert_eq!(bin.buffers.len(), a as usize);
        assert_eq!(bin.textures.len(), b as usize);
    }
}
