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

//! # Opale Core
//!
//! Foundational crate of the Opale graphics abstraction. It defines the
//! [`GraphicsDevice`](traits::GraphicsDevice) contract that every backend
//! implements, the resource and state records shared by all of them, and
//! the [`Device`](device::Device) facade that adds frame accounting on top
//! of a backend.
//!
//! This crate is intentionally free of any graphics API dependency; the
//! concrete GL, Vulkan and D3D11 devices live in `opale-infra`.

pub mod api;
pub mod device;
pub mod error;
pub mod traits;
