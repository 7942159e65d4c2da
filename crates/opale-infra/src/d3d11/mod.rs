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

//! Direct3D 11 backend.
//!
//! [`D3d11Device`] owns the immediate context, so unlike the GL devices
//! it carries no current-object state beyond a pointer cache used to
//! skip redundant binds. COM reference counting releases native objects
//! the moment their registry entry is dropped.

mod convert;
mod device;

pub use device::D3d11Device;
