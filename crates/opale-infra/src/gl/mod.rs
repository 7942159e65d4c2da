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

//! OpenGL backends.
//!
//! Two devices share one state-caching base: [`Gl3Device`] drives a 3.3
//! bind-to-edit context and [`Gl4Device`] a 4.5 context through direct
//! state access. Both are constructed from a host entry point loader
//! (`wglGetProcAddress`, `glXGetProcAddress`, ...) and never create a
//! context themselves.

pub mod api;
mod convert;
mod gl3;
mod gl4;
mod reclaim;
mod shared;
mod state;

#[cfg(test)]
pub(crate) mod testing;

pub use gl3::Gl3Device;
pub use gl4::Gl4Device;
pub use reclaim::ReclaimQueues;
