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

#![warn(missing_docs)]

//! # Opale Infra
//!
//! Concrete backends for the `opale-core` graphics contract:
//!
//! - [`gl`] - OpenGL 3.3 (bind-to-edit) and OpenGL 4.5 (direct state
//!   access) devices over a host-provided entry point loader.
//! - [`vulkan`] - a Vulkan device built on `ash`.
//! - `d3d11` - a Direct3D 11 device (Windows targets only).

pub mod gl;
pub mod vulkan;

#[cfg(windows)]
pub mod d3d11;

use opale_core::api::DeviceId;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_DEVICE_ID: AtomicU64 = AtomicU64::new(1);

/// Allocates a process-unique identity for a newly constructed device.
pub(crate) fn next_device_id() -> DeviceId {
    DeviceId(NEXT_DEVICE_ID.fetch_add(1, Ordering::Relaxed))
}
