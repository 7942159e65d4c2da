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

//! Vertex input layouts and attribute buffer bindings.

use super::buffer::Buffer;
use super::common::{AttributeType, IndexKind};
use super::handle::{DeviceId, Handle, Lazy};

/// Maximum vertex attribute slots a layout or attributes state can use.
pub const MAX_ATTRIBUTES: usize = 8;

/// One attribute slot of an input layout.
#[derive(Debug, Clone, Copy, Default)]
pub struct LayoutEntry {
    /// Component layout, [`AttributeType::Disabled`] for unused slots.
    pub attribute: AttributeType,
    /// Distance between consecutive vertices in the bound buffer.
    pub stride: u32,
    /// Offset of the first component inside a vertex.
    pub offset: u32,
}

/// A descriptor used to create an [`InputLayout`].
#[derive(Debug, Clone, Copy)]
pub struct InputLayoutDescriptor<'a> {
    /// Attribute slots, at most [`MAX_ATTRIBUTES`].
    pub entries: &'a [LayoutEntry],
}

/// How vertex buffer contents map to shader attributes.
///
/// Client-side on GL (consumed when a vertex array is realized), a native
/// object on D3D11.
#[derive(Debug, Clone, Copy, Default)]
pub struct InputLayout {
    /// The device that created this layout.
    pub device: DeviceId,
    /// Native layout object, where the backend has one.
    pub handle: Handle,
    /// Attribute slots.
    pub entries: [LayoutEntry; MAX_ATTRIBUTES],
    /// Number of used slots.
    pub count: u32,
}

/// A vertex buffer bound to an attribute slot, as stored on records.
#[derive(Debug, Clone, Copy, Default)]
pub struct AttributeBind {
    /// Handle of the bound vertex buffer.
    pub buffer: Handle,
    /// Distance between consecutive vertices.
    pub stride: u32,
    /// Offset of the first vertex in the buffer.
    pub offset: u32,
}

/// A vertex buffer bound to an attribute slot, as passed at creation.
#[derive(Debug, Clone, Copy)]
pub struct AttributeBindDescriptor<'a> {
    /// The vertex buffer to bind.
    pub buffer: &'a Buffer,
    /// Distance between consecutive vertices.
    pub stride: u32,
    /// Offset of the first vertex in the buffer.
    pub offset: u32,
}

/// A descriptor used to create an [`AttributesState`].
#[derive(Debug, Clone, Copy)]
pub struct AttributesStateDescriptor<'a> {
    /// Buffer bindings, slot by slot, at most [`MAX_ATTRIBUTES`].
    pub binds: &'a [AttributeBindDescriptor<'a>],
    /// Optional index buffer with its index width.
    pub index: Option<(&'a Buffer, IndexKind)>,
}

/// The set of vertex and index buffers feeding a draw.
///
/// On GL the native vertex array is realized lazily on the first bind,
/// using the input layout supplied alongside. Records only keep handle
/// copies of the buffers they reference; they do not own them.
#[derive(Debug, Clone, Copy, Default)]
pub struct AttributesState {
    /// The device that created this state.
    pub device: DeviceId,
    /// Native vertex array, realized on first bind where the backend has
    /// one.
    pub handle: Lazy<Handle>,
    /// Buffer bindings, slot by slot.
    pub binds: [AttributeBind; MAX_ATTRIBUTES],
    /// Number of used slots.
    pub count: u32,
    /// Bound index buffer and its index width, if any.
    pub index: Option<(Handle, IndexKind)>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_entry_default_is_disabled() {
        let entry = LayoutEntry::default();
        assert_eq!(entry.attribute, AttributeType::Disabled);
    }

    #[test]
    fn test_attributes_state_starts_unrealized() {
        let state = AttributesState::default();
        assert!(!state.handle.is_ready());
        assert!(state.index.is_none());
    }
}
