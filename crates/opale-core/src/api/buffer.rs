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

//! Defines data structures related to GPU buffer resources.

use super::handle::{DeviceId, Handle};

/// What a buffer is bound as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BufferKind {
    /// Vertex data.
    #[default]
    Vertex,
    /// Index data.
    Index,
    /// Uniform (constant) data.
    Uniform,
}

/// How often the contents of a buffer are expected to change.
///
/// Backends use this to pick storage flags and upload strategies; GL4 for
/// instance maps [`Stream`](BufferUsage::Stream) buffers persistently and
/// writes go through the mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BufferUsage {
    /// Never written after creation.
    Immutable,
    /// Written rarely.
    #[default]
    Static,
    /// Written frequently.
    Dynamic,
    /// Rewritten every frame.
    Stream,
}

/// A descriptor used to create a [`Buffer`].
#[derive(Debug, Clone, Copy)]
pub struct BufferDescriptor {
    /// What the buffer is bound as.
    pub kind: BufferKind,
    /// Expected update frequency.
    pub usage: BufferUsage,
    /// Requested size in bytes. A size of 0 is normalized to 1, and
    /// uniform buffers are rounded up to a multiple of 16.
    pub size: u32,
}

/// A GPU buffer record.
///
/// Starts out empty (`Default`), is filled in by
/// [`GraphicsDevice::create_buffer`](crate::traits::GraphicsDevice::create_buffer)
/// and emptied again by `delete_buffer`. Deleting an already-empty buffer
/// is a no-op.
#[derive(Debug, Clone, Copy, Default)]
pub struct Buffer {
    /// The device that created this buffer.
    pub device: DeviceId,
    /// Native buffer object.
    pub handle: Handle,
    /// What the buffer is bound as.
    pub kind: BufferKind,
    /// Expected update frequency.
    pub usage: BufferUsage,
    /// Allocated size in bytes, after normalization.
    pub size: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_starts_empty() {
        let buffer = Buffer::default();
        assert!(buffer.handle.is_none());
        assert_eq!(buffer.size, 0);
    }
}
