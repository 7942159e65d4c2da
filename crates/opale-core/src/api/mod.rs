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

//! Resource records, descriptors, and the enumerations shared by every
//! backend.

pub mod buffer;
pub mod common;
pub mod handle;
pub mod layout;
pub mod program;
pub mod render_target;
pub mod state;
pub mod texture;

pub use buffer::*;
pub use common::*;
pub use handle::*;
pub use layout::*;
pub use program::*;
pub use render_target::*;
pub use state::*;
pub use texture::*;
