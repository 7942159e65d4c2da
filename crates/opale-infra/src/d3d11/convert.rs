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

//! Translation of the uniform enums to their Direct3D 11 values.

use opale_core::api::*;
use windows::Win32::Graphics::Direct3D::*;
use windows::Win32::Graphics::Direct3D11::*;
use windows::Win32::Graphics::Dxgi::Common::*;

pub fn topology(value: PrimitiveType) -> D3D_PRIMITIVE_TOPOLOGY {
    match value {
        PrimitiveType::Triangles => D3D_PRIMITIVE_TOPOLOGY_TRIANGLELIST,
        PrimitiveType::Points => D3D_PRIMITIVE_TOPOLOGY_POINTLIST,
        PrimitiveType::Lines => D3D_PRIMITIVE_TOPOLOGY_LINELIST,
    }
}

pub fn index_format(value: IndexKind) -> DXGI_FORMAT {
    match value {
        IndexKind::U16 => DXGI_FORMAT_R16_UINT,
        IndexKind::U32 => DXGI_FORMAT_R32_UINT,
    }
}

pub fn compare(value: CompareFunction) -> D3D11_COMPARISON_FUNC {
    match value {
        CompareFunction::Never => D3D11_COMPARISON_NEVER,
        CompareFunction::Less => D3D11_COMPARISON_LESS,
        CompareFunction::LessEqual => D3D11_COMPARISON_LESS_EQUAL,
        CompareFunction::Equal => D3D11_COMPARISON_EQUAL,
        CompareFunction::GreaterEqual => D3D11_COMPARISON_GREATER_EQUAL,
        CompareFunction::Greater => D3D11_COMPARISON_GREATER,
        CompareFunction::NotEqual => D3D11_COMPARISON_NOT_EQUAL,
        CompareFunction::Always => D3D11_COMPARISON_ALWAYS,
    }
}

pub fn blend_function(value: BlendFunction) -> D3D11_BLEND {
    match value {
        BlendFunction::Zero => D3D11_BLEND_ZERO,
        BlendFunction::One => D3D11_BLEND_ONE,
        BlendFunction::SrcColor => D3D11_BLEND_SRC_COLOR,
        BlendFunction::OneMinusSrcColor => D3D11_BLEND_INV_SRC_COLOR,
        BlendFunction::DstColor => D3D11_BLEND_DEST_COLOR,
        BlendFunction::OneMinusDstColor => D3D11_BLEND_INV_DEST_COLOR,
        BlendFunction::SrcAlpha => D3D11_BLEND_SRC_ALPHA,
        BlendFunction::OneMinusSrcAlpha => D3D11_BLEND_INV_SRC_ALPHA,
        BlendFunction::DstAlpha => D3D11_BLEND_DEST_ALPHA,
        BlendFunction::OneMinusDstAlpha => D3D11_BLEND_INV_DEST_ALPHA,
        BlendFunction::Factor => D3D11_BLEND_BLEND_FACTOR,
        BlendFunction::OneMinusFactor => D3D11_BLEND_INV_BLEND_FACTOR,
    }
}

pub fn blend_equation(value: BlendEquation) -> D3D11_BLEND_OP {
    match value {
        BlendEquation::Add => D3D11_BLEND_OP_ADD,
        BlendEquation::Subtract => D3D11_BLEND_OP_SUBTRACT,
        BlendEquation::ReverseSubtract => D3D11_BLEND_OP_REV_SUBTRACT,
        BlendEquation::Min => D3D11_BLEND_OP_MIN,
        BlendEquation::Max => D3D11_BLEND_OP_MAX,
    }
}

pub fn stencil_operation(value: StencilOperation) -> D3D11_STENCIL_OP {
    match value {
        StencilOperation::Keep => D3D11_STENCIL_OP_KEEP,
        StencilOperation::Zero => D3D11_STENCIL_OP_ZERO,
        StencilOperation::Replace => D3D11_STENCIL_OP_REPLACE,
        StencilOperation::Increment => D3D11_STENCIL_OP_INCR_SAT,
        StencilOperation::IncrementWrap => D3D11_STENCIL_OP_INCR,
        StencilOperation::Decrement => D3D11_STENCIL_OP_DECR_SAT,
        StencilOperation::DecrementWrap => D3D11_STENCIL_OP_DECR,
        StencilOperation::Invert => D3D11_STENCIL_OP_INVERT,
    }
}

// Direct3D has no point fill; point and line both rasterize wireframe.
pub fn fill_mode(value: FillMode) -> D3D11_FILL_MODE {
    match value {
        FillMode::Point | FillMode::Line => D3D11_FILL_WIREFRAME,
        FillMode::Solid => D3D11_FILL_SOLID,
    }
}

pub fn cull_mode(value: CullMode) -> D3D11_CULL_MODE {
    match value {
        CullMode::None => D3D11_CULL_NONE,
        CullMode::Front => D3D11_CULL_FRONT,
        CullMode::Back => D3D11_CULL_BACK,
    }
}

pub fn format(value: PixelFormat) -> DXGI_FORMAT {
    match value {
        PixelFormat::Depth24Stencil8 => DXGI_FORMAT_D24_UNORM_S8_UINT,
        PixelFormat::Bgra32Float => DXGI_FORMAT_R32G32B32A32_FLOAT,
        PixelFormat::Bgra16Float => DXGI_FORMAT_R16G16B16A16_FLOAT,
        PixelFormat::Rgb32Float => DXGI_FORMAT_R32G32B32_FLOAT,
        PixelFormat::Bgra8Unorm => DXGI_FORMAT_B8G8R8A8_UNORM,
        PixelFormat::Bgr5A1Unorm => DXGI_FORMAT_B5G5R5A1_UNORM,
        PixelFormat::Bgra4Unorm => DXGI_FORMAT_B4G4R4A4_UNORM,
        PixelFormat::B5G6R5Unorm => DXGI_FORMAT_B5G6R5_UNORM,
        PixelFormat::Rg8Unorm => DXGI_FORMAT_R8G8_UNORM,
        PixelFormat::R8Unorm => DXGI_FORMAT_R8_UNORM,
        PixelFormat::Bc1Rgb | PixelFormat::Bc1Rgba => DXGI_FORMAT_BC1_UNORM,
        PixelFormat::Bc2Rgba => DXGI_FORMAT_BC2_UNORM,
        PixelFormat::Bc3Rgba => DXGI_FORMAT_BC3_UNORM,
    }
}

pub fn addressing(value: TextureAddressing) -> D3D11_TEXTURE_ADDRESS_MODE {
    match value {
        TextureAddressing::Clamp => D3D11_TEXTURE_ADDRESS_CLAMP,
        TextureAddressing::Repeat => D3D11_TEXTURE_ADDRESS_WRAP,
        TextureAddressing::Mirror => D3D11_TEXTURE_ADDRESS_MIRROR,
        TextureAddressing::Border => D3D11_TEXTURE_ADDRESS_BORDER,
        TextureAddressing::MirrorOnce => D3D11_TEXTURE_ADDRESS_MIRROR_ONCE,
    }
}

/// Collapses the three filtering axes and the anisotropy setting into a
/// single `D3D11_FILTER` value.
pub fn filter(min: Filtering, mag: Filtering, mip: Filtering, anisotropy: u32) -> D3D11_FILTER {
    if anisotropy > 1 {
        return D3D11_FILTER_ANISOTROPIC;
    }
    let linear = |f: Filtering| f == Filtering::Linear;
    match (linear(min), linear(mag), linear(mip)) {
        (false, false, false) => D3D11_FILTER_MIN_MAG_MIP_POINT,
        (false, false, true) => D3D11_FILTER_MIN_MAG_POINT_MIP_LINEAR,
        (false, true, false) => D3D11_FILTER_MIN_POINT_MAG_LINEAR_MIP_POINT,
        (false, true, true) => D3D11_FILTER_MIN_POINT_MAG_MIP_LINEAR,
        (true, false, false) => D3D11_FILTER_MIN_LINEAR_MAG_MIP_POINT,
        (true, false, true) => D3D11_FILTER_MIN_LINEAR_MAG_POINT_MIP_LINEAR,
        (true, true, false) => D3D11_FILTER_MIN_MAG_LINEAR_MIP_POINT,
        (true, true, true) => D3D11_FILTER_MIN_MAG_MIP_LINEAR,
    }
}

pub fn attribute_format(value: AttributeType) -> DXGI_FORMAT {
    match value {
        AttributeType::Disabled => DXGI_FORMAT_UNKNOWN,
        AttributeType::R32Float => DXGI_FORMAT_R32_FLOAT,
        AttributeType::R32G32Float => DXGI_FORMAT_R32G32_FLOAT,
        AttributeType::R32G32B32Float => DXGI_FORMAT_R32G32B32_FLOAT,
        AttributeType::R32G32B32A32Float => DXGI_FORMAT_R32G32B32A32_FLOAT,
        AttributeType::R32Uint => DXGI_FORMAT_R32_UINT,
        AttributeType::R32G32Uint => DXGI_FORMAT_R32G32_UINT,
        AttributeType::R32G32B32Uint => DXGI_FORMAT_R32G32B32_UINT,
        AttributeType::R32G32B32A32Uint => DXGI_FORMAT_R32G32B32A32_UINT,
        AttributeType::R32Sint => DXGI_FORMAT_R32_SINT,
        AttributeType::R32G32Sint => DXGI_FORMAT_R32G32_SINT,
        AttributeType::R32G32B32Sint => DXGI_FORMAT_R32G32B32_SINT,
        AttributeType::R32G32B32A32Sint => DXGI_FORMAT_R32G32B32A32_SINT,
        AttributeType::R16G16Float => DXGI_FORMAT_R16G16_FLOAT,
        AttributeType::R16G16B16A16Float => DXGI_FORMAT_R16G16B16A16_FLOAT,
        AttributeType::R16G16Unorm => DXGI_FORMAT_R16G16_UNORM,
        AttributeType::R16G16B16A16Unorm => DXGI_FORMAT_R16G16B16A16_UNORM,
        AttributeType::R16G16Snorm => DXGI_FORMAT_R16G16_SNORM,
        AttributeType::R16G16B16A16Snorm => DXGI_FORMAT_R16G16B16A16_SNORM,
        AttributeType::R16G16Uint => DXGI_FORMAT_R16G16_UINT,
        AttributeType::R16G16B16A16Uint => DXGI_FORMAT_R16G16B16A16_UINT,
        AttributeType::R16G16Sint => DXGI_FORMAT_R16G16_SINT,
        AttributeType::R16G16B16A16Sint => DXGI_FORMAT_R16G16B16A16_SINT,
        AttributeType::R8Unorm => DXGI_FORMAT_R8_UNORM,
        AttributeType::R8G8Unorm => DXGI_FORMAT_R8G8_UNORM,
        AttributeType::R8G8B8A8Unorm => DXGI_FORMAT_R8G8B8A8_UNORM,
        AttributeType::R8Snorm => DXGI_FORMAT_R8_SNORM,
        AttributeType::R8G8Snorm => DXGI_FORMAT_R8G8_SNORM,
        AttributeType::R8G8B8A8Snorm => DXGI_FORMAT_R8G8B8A8_SNORM,
        AttributeType::R8Uint => DXGI_FORMAT_R8_UINT,
        AttributeType::R8G8Uint => DXGI_FORMAT_R8G8_UINT,
        AttributeType::R8G8B8A8Uint => DXGI_FORMAT_R8G8B8A8_UINT,
        AttributeType::R8Sint => DXGI_FORMAT_R8_SINT,
        AttributeType::R8G8Sint => DXGI_FORMAT_R8G8_SINT,
        AttributeType::R8G8B8A8Sint => DXGI_FORMAT_R8G8B8A8_SINT,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anisotropy_overrides_the_filter_axes() {
        assert_eq!(
            filter(Filtering::Nearest, Filtering::Nearest, Filtering::Nearest, 8),
            D3D11_FILTER_ANISOTROPIC
        );
        assert_eq!(
            filter(Filtering::Linear, Filtering::Linear, Filtering::Linear, 1),
            D3D11_FILTER_MIN_MAG_MIP_LINEAR
        );
    }

    #[test]
    fn test_depth_format_maps_to_d24s8() {
        assert_eq!(format(PixelFormat::Depth24Stencil8), DXGI_FORMAT_D24_UNORM_S8_UINT);
    }

    #[test]
    fn test_point_and_line_fill_both_rasterize_wireframe() {
        assert_eq!(fill_mode(FillMode::Point), D3D11_FILL_WIREFRAME);
        assert_eq!(fill_mode(FillMode::Line), D3D11_FILL_WIREFRAME);
        assert_eq!(fill_mode(FillMode::Solid), D3D11_FILL_SOLID);
    }
}
