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

//! Defines data structures related to GPU texture resources.

use super::common::{Filtering, PixelFormat, TextureAddressing, TextureKind};
use super::handle::{DeviceId, Handle, Lazy};

/// A descriptor used to create a [`Texture`].
#[derive(Debug, Clone, Copy)]
pub struct TextureDescriptor {
    /// Shape of the texture.
    pub kind: TextureKind,
    /// Texel format.
    pub format: PixelFormat,
    /// Number of mip levels to allocate (at least 1). Ignored by the
    /// multisampled kinds.
    pub levels: u8,
    /// Width of level 0 in texels.
    pub width: u32,
    /// Height of level 0 in texels.
    pub height: u32,
    /// Depth for [`TextureKind::D3`], array layer count for the array
    /// kinds, 1 otherwise.
    pub depth: u32,
    /// Sample count for the multisampled kinds, 1 otherwise.
    pub samples: u8,
}

/// A GPU texture record.
///
/// Creation allocates zero-initialized storage for the full mip chain and
/// applies the default sampling parameters: repeat addressing, nearest
/// minification, linear magnification and mip filtering, anisotropy 1,
/// level range `[0, 1000]`. The shader view and sampler state are not
/// created until a sampler bind first needs them.
#[derive(Debug, Clone, Copy, Default)]
pub struct Texture {
    /// The device that created this texture.
    pub device: DeviceId,
    /// Native texture object.
    pub handle: Handle,
    /// Shader-visible view, materialized on first sampler bind.
    pub view: Lazy<Handle>,
    /// Sampler state, materialized on first sampler bind.
    pub sampler: Lazy<Handle>,
    /// Shape of the texture.
    pub kind: TextureKind,
    /// Texel format.
    pub format: PixelFormat,
    /// Allocated mip level count.
    pub levels: u8,
    /// Sample count (1 for single-sampled kinds).
    pub samples: u8,
    /// Width of level 0 in texels.
    pub width: u32,
    /// Height of level 0 in texels.
    pub height: u32,
    /// Depth or array layer count.
    pub depth: u32,
    /// Addressing along u.
    pub addressing_u: TextureAddressing,
    /// Addressing along v.
    pub addressing_v: TextureAddressing,
    /// Addressing along w.
    pub addressing_w: TextureAddressing,
    /// Minification filter.
    pub min_filtering: Filtering,
    /// Magnification filter.
    pub mag_filtering: Filtering,
    /// Filter between mip levels.
    pub mip_filtering: Filtering,
    /// Maximum anisotropy (1 disables anisotropic filtering).
    pub anisotropy: u32,
    /// Lowest mip level sampled.
    pub base_level: u32,
    /// Highest mip level sampled.
    pub max_level: u32,
}

impl Texture {
    /// Extent of `extent` at mip `level`, halved per level with a floor
    /// of 1 texel.
    pub const fn level_extent(extent: u32, level: u8) -> u32 {
        let shifted = extent >> level;
        if shifted == 0 {
            1
        } else {
            shifted
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_extent_halves_with_floor() {
        assert_eq!(Texture::level_extent(256, 0), 256);
        assert_eq!(Texture::level_extent(256, 1), 128);
        assert_eq!(Texture::level_extent(256, 8), 1);
        assert_eq!(Texture::level_extent(256, 12), 1);
        assert_eq!(Texture::level_extent(5, 1), 2);
        assert_eq!(Texture::level_extent(5, 2), 1);
    }

    #[test]
    fn test_texture_starts_empty() {
        let texture = Texture::default();
        assert!(texture.handle.is_none());
        assert!(!texture.view.is_ready());
        assert!(!texture.sampler.is_ready());
    }
}
