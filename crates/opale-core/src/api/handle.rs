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

//! Backend-neutral native handles and lazy native object slots.

/// A native object reference whose encoding depends on the backend.
///
/// GL backends store object names (optionally paired with a second id),
/// Vulkan and D3D11 store 64-bit registry keys. `Handle::None` is the
/// empty handle: every record starts out with it and deletion resets to
/// it, so "was this created?" is always answerable from the record alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Handle {
    /// No native object. The state of a freshly initialized or deleted
    /// record.
    #[default]
    None,
    /// A single 64-bit native id or registry key.
    Id(u64),
    /// Two 32-bit native ids (e.g. a GL object name plus a companion
    /// object name).
    IdPair(u32, u32),
}

impl Handle {
    /// Returns `true` if this handle references no native object.
    pub const fn is_none(&self) -> bool {
        matches!(self, Handle::None)
    }

    /// Returns `true` if this handle references a native object.
    pub const fn is_some(&self) -> bool {
        !self.is_none()
    }

    /// Resets the handle to [`Handle::None`] and returns its former value.
    pub fn take(&mut self) -> Handle {
        std::mem::take(self)
    }

    /// Returns the 64-bit id, or 0 if the handle is empty or pair-encoded.
    pub const fn id(&self) -> u64 {
        match self {
            Handle::Id(id) => *id,
            _ => 0,
        }
    }

    /// Returns the pair encoding, or `(0, 0)` for any other variant.
    pub const fn id_pair(&self) -> (u32, u32) {
        match self {
            Handle::IdPair(a, b) => (*a, *b),
            _ => (0, 0),
        }
    }
}

/// A native object that is materialized on first use.
///
/// Texture views, sampler states, and GL vertex arrays are not created
/// with their owning record; the backend realizes them the first time a
/// bind actually needs them and flips the slot to `Ready`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Lazy<T> {
    /// Not materialized yet.
    #[default]
    Uninit,
    /// Materialized native object.
    Ready(T),
}

impl<T> Lazy<T> {
    /// Returns `true` once the native object has been materialized.
    pub const fn is_ready(&self) -> bool {
        matches!(self, Lazy::Ready(_))
    }

    /// Returns the materialized value, if any.
    pub fn get(&self) -> Option<&T> {
        match self {
            Lazy::Ready(value) => Some(value),
            Lazy::Uninit => None,
        }
    }

    /// Resets the slot to `Uninit` and returns the former value, if any.
    pub fn take(&mut self) -> Option<T> {
        match std::mem::replace(self, Lazy::Uninit) {
            Lazy::Ready(value) => Some(value),
            Lazy::Uninit => None,
        }
    }
}

/// Identity of the device that created a record.
///
/// Records carry it so that cross-device use can be caught with a debug
/// assertion instead of corrupting native state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct DeviceId(pub u64);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handle_default_is_none() {
        let handle = Handle::default();
        assert!(handle.is_none());
        assert_eq!(handle.id(), 0);
        assert_eq!(handle.id_pair(), (0, 0));
    }

    #[test]
    fn test_handle_take_clears() {
        let mut handle = Handle::Id(42);
        assert!(handle.is_some());
        assert_eq!(handle.take(), Handle::Id(42));
        assert!(handle.is_none());
    }

    #[test]
    fn test_lazy_lifecycle() {
        let mut slot: Lazy<u32> = Lazy::default();
        assert!(!slot.is_ready());
        assert_eq!(slot.get(), None);

        slot = Lazy::Ready(7);
        assert!(slot.is_ready());
        assert_eq!(slot.get(), Some(&7));
        assert_eq!(slot.take(), Some(7));
        assert!(!slot.is_ready());
        assert_eq!(slot.take(), None);
    }
}
