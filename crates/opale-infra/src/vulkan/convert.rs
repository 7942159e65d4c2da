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

//! Translation of the uniform enums to their Vulkan values.

use ash::vk;
use opale_core::api::*;

pub fn topology(value: PrimitiveType) -> vk::PrimitiveTopology {
    match value {
        PrimitiveType::Triangles => vk::PrimitiveTopology::TRIANGLE_LIST,
        PrimitiveType::Points => vk::PrimitiveTopology::POINT_LIST,
        PrimitiveType::Lines => vk::PrimitiveTopology::LINE_LIST,
    }
}

pub fn index_type(value: IndexKind) -> vk::IndexType {
    match value {
        IndexKind::U16 => vk::IndexType::UINT16,
        IndexKind::U32 => vk::IndexType::UINT32,
    }
}

pub fn compare(value: CompareFunction) -> vk::CompareOp {
    match value {
        CompareFunction::Never => vk::CompareOp::NEVER,
        CompareFunction::Less => vk::CompareOp::LESS,
        CompareFunction::Equal => vk::CompareOp::EQUAL,
        CompareFunction::LessEqual => vk::CompareOp::LESS_OR_EQUAL,
        CompareFunction::Greater => vk::CompareOp::GREATER,
        CompareFunction::NotEqual => vk::CompareOp::NOT_EQUAL,
        CompareFunction::GreaterEqual => vk::CompareOp::GREATER_OR_EQUAL,
        CompareFunction::Always => vk::CompareOp::ALWAYS,
    }
}

pub fn blend_function(value: BlendFunction) -> vk::BlendFactor {
    match value {
        BlendFunction::Zero => vk::BlendFactor::ZERO,
        BlendFunction::One => vk::BlendFactor::ONE,
        BlendFunction::SrcColor => vk::BlendFactor::SRC_COLOR,
        BlendFunction::OneMinusSrcColor => vk::BlendFactor::ONE_MINUS_SRC_COLOR,
        BlendFunction::DstColor => vk::BlendFactor::DST_COLOR,
        BlendFunction::OneMinusDstColor => vk::BlendFactor::ONE_MINUS_DST_COLOR,
        BlendFunction::SrcAlpha => vk::BlendFactor::SRC_ALPHA,
        BlendFunction::OneMinusSrcAlpha => vk::BlendFactor::ONE_MINUS_SRC_ALPHA,
        BlendFunction::DstAlpha => vk::BlendFactor::DST_ALPHA,
        BlendFunction::OneMinusDstAlpha => vk::BlendFactor::ONE_MINUS_DST_ALPHA,
        BlendFunction::Factor => vk::BlendFactor::CONSTANT_COLOR,
        BlendFunction::OneMinusFactor => vk::BlendFactor::ONE_MINUS_CONSTANT_COLOR,
    }
}

pub fn blend_equation(value: BlendEquation) -> vk::BlendOp {
    match value {
        BlendEquation::Add => vk::BlendOp::ADD,
        BlendEquation::Subtract => vk::BlendOp::SUBTRACT,
        BlendEquation::ReverseSubtract => vk::BlendOp::REVERSE_SUBTRACT,
        BlendEquation::Min => vk::BlendOp::MIN,
        BlendEquation::Max => vk::BlendOp::MAX,
    }
}

pub fn stencil_operation(value: StencilOperation) -> vk::StencilOp {
    match value {
        StencilOperation::Keep => vk::StencilOp::KEEP,
        StencilOperation::Zero => vk::StencilOp::ZERO,
        StencilOperation::Replace => vk::StencilOp::REPLACE,
        StencilOperation::Increment => vk::StencilOp::INCREMENT_AND_CLAMP,
        StencilOperation::Decrement => vk::StencilOp::DECREMENT_AND_CLAMP,
        StencilOperation::Invert => vk::StencilOp::INVERT,
        StencilOperation::IncrementWrap => vk::StencilOp::INCREMENT_AND_WRAP,
        StencilOperation::DecrementWrap => vk::StencilOp::DECREMENT_AND_WRAP,
    }
}

pub fn fill_mode(value: FillMode) -> vk::PolygonMode {
    match value {
        FillMode::Point => vk::PolygonMode::POINT,
        FillMode::Line => vk::PolygonMode::LINE,
        FillMode::Solid => vk::PolygonMode::FILL,
    }
}

pub fn cull_mode(value: CullMode) -> vk::CullModeFlags {
    match value {
        CullMode::None => vk::CullModeFlags::NONE,
        CullMode::Front => vk::CullModeFlags::FRONT,
        CullMode::Back => vk::CullModeFlags::BACK,
    }
}

pub fn front_face(value: FrontFace) -> vk::FrontFace {
    match value {
        FrontFace::CounterClockwise => vk::FrontFace::COUNTER_CLOCKWISE,
        FrontFace::Clockwise => vk::FrontFace::CLOCKWISE,
    }
}

pub fn format(value: PixelFormat) -> vk::Format {
    match value {
        PixelFormat::Depth24Stencil8 => vk::Format::D24_UNORM_S8_UINT,
        PixelFormat::Bgra32Float => vk::Format::R32G32B32A32_SFLOAT,
        PixelFormat::Bgra16Float => vk::Format::R16G16B16A16_SFLOAT,
        PixelFormat::Rgb32Float => vk::Format::R32G32B32_SFLOAT,
        PixelFormat::Bgra8Unorm => vk::Format::B8G8R8A8_UNORM,
        PixelFormat::Bgr5A1Unorm => vk::Format::A1R5G5B5_UNORM_PACK16,
        PixelFormat::Bgra4Unorm => vk::Format::B4G4R4A4_UNORM_PACK16,
        PixelFormat::B5G6R5Unorm => vk::Format::R5G6B5_UNORM_PACK16,
        PixelFormat::Rg8Unorm => vk::Format::R8G8_UNORM,
        PixelFormat::R8Unorm => vk::Format::R8_UNORM,
        PixelFormat::Bc1Rgb => vk::Format::BC1_RGB_UNORM_BLOCK,
        PixelFormat::Bc1Rgba => vk::Format::BC1_RGBA_UNORM_BLOCK,
        PixelFormat::Bc2Rgba => vk::Format::BC2_UNORM_BLOCK,
        PixelFormat::Bc3Rgba => vk::Format::BC3_UNORM_BLOCK,
    }
}

pub fn address_mode(value: TextureAddressing) -> vk::SamplerAddressMode {
    match value {
        TextureAddressing::Repeat => vk::SamplerAddressMode::REPEAT,
        TextureAddressing::Mirror => vk::SamplerAddressMode::MIRRORED_REPEAT,
        TextureAddressing::Clamp => vk::SamplerAddressMode::CLAMP_TO_EDGE,
        TextureAddressing::Border => vk::SamplerAddressMode::CLAMP_TO_BORDER,
        TextureAddressing::MirrorOnce => vk::SamplerAddressMode::MIRROR_CLAMP_TO_EDGE,
    }
}

pub fn filter(value: Filtering) -> vk::Filter {
    match value {
        Filtering::None | Filtering::Nearest => vk::Filter::NEAREST,
        Filtering::Linear => vk::Filter::LINEAR,
    }
}

pub fn mipmap_mode(value: Filtering) -> vk::SamplerMipmapMode {
    match value {
        Filtering::None | Filtering::Nearest => vk::SamplerMipmapMode::NEAREST,
        Filtering::Linear => vk::SamplerMipmapMode::LINEAR,
    }
}

pub fn samples(value: u8) -> vk::SampleCountFlags {
    match value {
        0 | 1 => vk::SampleCountFlags::TYPE_1,
        2 | 3 => vk::SampleCountFlags::TYPE_2,
        4..=7 => vk::SampleCountFlags::TYPE_4,
        8..=15 => vk::SampleCountFlags::TYPE_8,
        _ => vk::SampleCountFlags::TYPE_16,
    }
}

pub fn attribute_format(value: AttributeType) -> vk::Format {
    match value {
        AttributeType::Disabled => vk::Format::UNDEFINED,
        AttributeType::R32Float => vk::Format::R32_SFLOAT,
        AttributeType::R32G32Float => vk::Format::R32G32_SFLOAT,
        AttributeType::R32G32B32Float => vk::Format::R32G32B32_SFLOAT,
        AttributeType::R32G32B32A32Float => vk::Format::R32G32B32A32_SFLOAT,
        AttributeType::R16G16Float => vk::Format::R16G16_SFLOAT,
        AttributeType::R16G16B16A16Float => vk::Format::R16G16B16A16_SFLOAT,
        AttributeType::R16G16Unorm => vk::Format::R16G16_UNORM,
        AttributeType::R16G16B16A16Unorm => vk::Format::R16G16B16A16_UNORM,
        AttributeType::R16G16Snorm => vk::Format::R16G16_SNORM,
        AttributeType::R16G16B16A16Snorm => vk::Format::R16G16B16A16_SNORM,
        AttributeType::R16G16Uint => vk::Format::R16G16_UINT,
        AttributeType::R16G16B16A16Uint => vk::Format::R16G16B16A16_UINT,
        AttributeType::R16G16Sint => vk::Format::R16G16_SINT,
        AttributeType::R16G16B16A16Sint => vk::Format::R16G16B16A16_SINT,
        AttributeType::R8Unorm => vk::Format::R8_UNORM,
        AttributeType::R8G8Unorm => vk::Format::R8G8_UNORM,
        AttributeType::R8G8B8A8Unorm => vk::Format::R8G8B8A8_UNORM,
        AttributeType::R8Snorm => vk::Format::R8_SNORM,
        AttributeType::R8G8Snorm => vk::Format::R8G8_SNORM,
        AttributeType::R8G8B8A8Snorm => vk::Format::R8G8B8A8_SNORM,
        AttributeType::R8Uint => vk::Format::R8_UINT,
        AttributeType::R8G8Uint => vk::Format::R8G8_UINT,
        AttributeType::R8G8B8A8Uint => vk::Format::R8G8B8A8_UINT,
        AttributeType::R8Sint => vk::Format::R8_SINT,
        AttributeType::R8G8Sint => vk::Format::R8G8_SINT,
        AttributeType::R8G8B8A8Sint => vk::Format::R8G8B8A8_SINT,
        AttributeType::R32Uint => vk::Format::R32_UINT,
        AttributeType::R32G32Uint => vk::Format::R32G32_UINT,
        AttributeType::R32G32B32Uint => vk::Format::R32G32B32_UINT,
        AttributeType::R32G32B32A32Uint => vk::Format::R32G32B32A32_UINT,
        AttributeType::R32Sint => vk::Format::R32_SINT,
        AttributeType::R32G32Sint => vk::Format::R32G32_SINT,
        AttributeType::R32G32B32Sint => vk::Format::R32G32B32_SINT,
        AttributeType::R32G32B32A32Sint => vk::Format::R32G32B32A32_SINT,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_depth_stencil_format_maps_to_d24s8() {
        assert_eq!(
            format(PixelFormat::Depth24Stencil8),
            vk::Format::D24_UNORM_S8_UINT
        );
    }

    #[test]
    fn test_sample_counts_round_down_to_supported_powers() {
        assert_eq!(samples(1), vk::SampleCountFlags::TYPE_1);
        assert_eq!(samples(3), vk::SampleCountFlags::TYPE_2);
        assert_eq!(samples(8), vk::SampleCountFlags::TYPE_8);
    }

    #[test]
    fn test_disabled_attribute_has_no_format() {
        assert_eq!(attribute_format(AttributeType::Disabled), vk::Format::UNDEFINED);
    }

    #[test]
    fn test_every_fill_mode_has_a_polygon_mode() {
        assert_eq!(fill_mode(FillMode::Point), vk::PolygonMode::POINT);
        assert_eq!(fill_mode(FillMode::Line), vk::PolygonMode::LINE);
        assert_eq!(fill_mode(FillMode::Solid), vk::PolygonMode::FILL);
    }
}
