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

//! Off-screen render targets and their attachments.

use super::common::{Attachment, PixelFormat};
use super::handle::{DeviceId, Handle};
use super::texture::Texture;

/// Number of color attachment points on a render target.
pub const MAX_COLOR_ATTACHMENTS: usize = 8;

/// A snapshot of the texture behind an attachment point.
///
/// Render targets do not own the textures attached to them; they keep the
/// handle and the geometry needed for clears and resolves. The caller
/// keeps the texture alive for as long as the target renders into it.
#[derive(Debug, Clone, Copy)]
pub struct AttachmentRef {
    /// Handle of the attached texture.
    pub texture: Handle,
    /// Texel format of the attachment.
    pub format: PixelFormat,
    /// Width of the attached level in texels.
    pub width: u32,
    /// Height of the attached level in texels.
    pub height: u32,
    /// Sample count of the attached texture.
    pub samples: u8,
}

impl AttachmentRef {
    /// Captures the attachment-relevant fields of a texture.
    pub fn of(texture: &Texture) -> Self {
        Self {
            texture: texture.handle,
            format: texture.format,
            width: texture.width,
            height: texture.height,
            samples: texture.samples,
        }
    }
}

/// An off-screen rendering destination.
///
/// Which attachments hold textures and which attachments are written by
/// draws are independent: the draw buffer list can name any subset of the
/// color attachment points, in any order, regardless of occupancy.
#[derive(Debug, Clone, Default)]
pub struct RenderTarget {
    /// The device that created this target.
    pub device: DeviceId,
    /// Native framebuffer object.
    pub handle: Handle,
    /// Color attachment points.
    pub colors: [Option<AttachmentRef>; MAX_COLOR_ATTACHMENTS],
    /// Combined depth-stencil attachment point.
    pub depth_stencil: Option<AttachmentRef>,
    /// Color attachments written by draws, in shader output order.
    pub draw_buffers: Vec<Attachment>,
}

impl RenderTarget {
    /// Returns the attachment snapshot at `attachment`, if occupied.
    pub fn attachment(&self, attachment: Attachment) -> Option<&AttachmentRef> {
        match attachment {
            Attachment::DepthStencil => self.depth_stencil.as_ref(),
            Attachment::Color(index) => {
                self.colors.get(index as usize).and_then(|slot| slot.as_ref())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::TextureKind;

    fn test_texture(width: u32, height: u32) -> Texture {
        Texture {
            handle: Handle::Id(9),
            kind: TextureKind::D2,
            format: PixelFormat::Bgra8Unorm,
            width,
            height,
            samples: 1,
            ..Default::default()
        }
    }

    #[test]
    fn test_attachment_lookup() {
        let mut target = RenderTarget::default();
        assert!(target.attachment(Attachment::Color(0)).is_none());
        assert!(target.attachment(Attachment::DepthStencil).is_none());

        let texture = test_texture(64, 32);
        target.colors[2] = Some(AttachmentRef::of(&texture));
        let re = target.attachment(Attachment::Color(2)).unwrap();
        assert_eq!(re.width, 64);
        assert_eq!(re.height, 32);
        assert!(target.attachment(Attachment::Color(0)).is_none());
    }

    #[test]
    fn test_draw_buffers_independent_of_occupancy() {
        // The draw buffer list may name unoccupied attachment points and
        // may skip occupied ones.
        let mut target = RenderTarget::default();
        let texture = test_texture(16, 16);
        target.colors[0] = Some(AttachmentRef::of(&texture));

        target.draw_buffers = vec![Attachment::Color(3), Attachment::Color(1)];
        assert_eq!(target.draw_buffers.len(), 2);
        assert!(target.attachment(Attachment::Color(3)).is_none());
        assert!(target.attachment(Attachment::Color(0)).is_some());
    }
}
