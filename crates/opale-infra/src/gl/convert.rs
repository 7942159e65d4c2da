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

//! Translation from the portable enums to their GL encodings.

use opale_core::api::{
    Attachment, AttributeType, BlendEquation, BlendFunction, BufferKind, BufferUsage,
    CompareFunction, CullMode, FillMode, Filtering, FrontFace, IndexKind, PixelFormat,
    PrimitiveType, ShaderStage, StencilOperation, TextureAddressing, TextureKind,
};

use super::api::*;

pub const fn primitive(value: PrimitiveType) -> GLenum {
    match value {
        PrimitiveType::Triangles => GL_TRIANGLES,
        PrimitiveType::Points => GL_POINTS,
        PrimitiveType::Lines => GL_LINES,
    }
}

pub const fn index_kind(value: IndexKind) -> GLenum {
    match value {
        IndexKind::U16 => GL_UNSIGNED_SHORT,
        IndexKind::U32 => GL_UNSIGNED_INT,
    }
}

pub const fn compare(value: CompareFunction) -> GLenum {
    match value {
        CompareFunction::Never => GL_NEVER,
        CompareFunction::Less => GL_LESS,
        CompareFunction::LessEqual => GL_LEQUAL,
        CompareFunction::Equal => GL_EQUAL,
        CompareFunction::GreaterEqual => GL_GEQUAL,
        CompareFunction::Greater => GL_GREATER,
        CompareFunction::NotEqual => GL_NOTEQUAL,
        CompareFunction::Always => GL_ALWAYS,
    }
}

pub const fn blend_function(value: BlendFunction) -> GLenum {
    match value {
        BlendFunction::Zero => GL_ZERO,
        BlendFunction::One => GL_ONE,
        BlendFunction::SrcColor => GL_SRC_COLOR,
        BlendFunction::OneMinusSrcColor => GL_ONE_MINUS_SRC_COLOR,
        BlendFunction::DstColor => GL_DST_COLOR,
        BlendFunction::OneMinusDstColor => GL_ONE_MINUS_DST_COLOR,
        BlendFunction::SrcAlpha => GL_SRC_ALPHA,
        BlendFunction::OneMinusSrcAlpha => GL_ONE_MINUS_SRC_ALPHA,
        BlendFunction::DstAlpha => GL_DST_ALPHA,
        BlendFunction::OneMinusDstAlpha => GL_ONE_MINUS_DST_ALPHA,
        BlendFunction::Factor => GL_CONSTANT_COLOR,
        BlendFunction::OneMinusFactor => GL_ONE_MINUS_CONSTANT_COLOR,
    }
}

pub const fn blend_equation(value: BlendEquation) -> GLenum {
    match value {
        BlendEquation::Add => GL_FUNC_ADD,
        BlendEquation::Subtract => GL_FUNC_SUBTRACT,
        BlendEquation::ReverseSubtract => GL_FUNC_REVERSE_SUBTRACT,
        BlendEquation::Min => GL_MIN,
        BlendEquation::Max => GL_MAX,
    }
}

pub const fn stencil_operation(value: StencilOperation) -> GLenum {
    match value {
        StencilOperation::Keep => GL_KEEP,
        StencilOperation::Zero => GL_ZERO,
        StencilOperation::Replace => GL_REPLACE,
        StencilOperation::Increment => GL_INCR,
        StencilOperation::IncrementWrap => GL_INCR_WRAP,
        StencilOperation::Decrement => GL_DECR,
        StencilOperation::DecrementWrap => GL_DECR_WRAP,
        StencilOperation::Invert => GL_INVERT,
    }
}

pub const fn fill_mode(value: FillMode) -> GLenum {
    match value {
        FillMode::Point => GL_POINT,
        FillMode::Line => GL_LINE,
        FillMode::Solid => GL_FILL,
    }
}

/// `CullMode::None` never reaches the cull face call; callers gate on it
/// and toggle `GL_CULL_FACE` instead.
pub const fn cull_mode(value: CullMode) -> GLenum {
    match value {
        CullMode::None | CullMode::Back => GL_BACK,
        CullMode::Front => GL_FRONT,
    }
}

pub const fn front_face(value: FrontFace) -> GLenum {
    match value {
        FrontFace::Clockwise => GL_CW,
        FrontFace::CounterClockwise => GL_CCW,
    }
}

pub const fn buffer_kind(value: BufferKind) -> GLenum {
    match value {
        BufferKind::Vertex => GL_ARRAY_BUFFER,
        BufferKind::Index => GL_ELEMENT_ARRAY_BUFFER,
        BufferKind::Uniform => GL_UNIFORM_BUFFER,
    }
}

pub const fn buffer_usage(value: BufferUsage) -> GLenum {
    match value {
        BufferUsage::Immutable | BufferUsage::Static => GL_STATIC_DRAW,
        BufferUsage::Dynamic => GL_DYNAMIC_DRAW,
        BufferUsage::Stream => GL_STREAM_DRAW,
    }
}

pub const fn shader_stage(value: ShaderStage) -> GLenum {
    match value {
        ShaderStage::Vertex => GL_VERTEX_SHADER,
        ShaderStage::Fragment => GL_FRAGMENT_SHADER,
        ShaderStage::Geometry => GL_GEOMETRY_SHADER,
    }
}

pub const fn texture_kind(value: TextureKind) -> GLenum {
    match value {
        TextureKind::D2 => GL_TEXTURE_2D,
        TextureKind::D2Multisample => GL_TEXTURE_2D_MULTISAMPLE,
        TextureKind::D2Array => GL_TEXTURE_2D_ARRAY,
        TextureKind::D2ArrayMultisample => GL_TEXTURE_2D_MULTISAMPLE_ARRAY,
        TextureKind::D3 => GL_TEXTURE_3D,
    }
}

pub const fn addressing(value: TextureAddressing) -> GLint {
    (match value {
        TextureAddressing::Clamp => GL_CLAMP_TO_EDGE,
        TextureAddressing::Repeat => GL_REPEAT,
        TextureAddressing::Mirror => GL_MIRRORED_REPEAT,
        TextureAddressing::Border => GL_CLAMP_TO_BORDER,
        TextureAddressing::MirrorOnce => GL_MIRROR_CLAMP_TO_EDGE,
    }) as GLint
}

pub const fn mag_filter(value: Filtering) -> GLint {
    (match value {
        Filtering::None | Filtering::Nearest => GL_NEAREST,
        Filtering::Linear => GL_LINEAR,
    }) as GLint
}

/// Minification and mip filters collapse into a single GL filter.
pub const fn min_filter(min: Filtering, mip: Filtering) -> GLint {
    (match (mip, min) {
        (Filtering::None, Filtering::None | Filtering::Nearest) => GL_NEAREST,
        (Filtering::None, Filtering::Linear) => GL_LINEAR,
        (Filtering::Nearest, Filtering::None | Filtering::Nearest) => GL_NEAREST_MIPMAP_NEAREST,
        (Filtering::Nearest, Filtering::Linear) => GL_LINEAR_MIPMAP_NEAREST,
        (Filtering::Linear, Filtering::None | Filtering::Nearest) => GL_NEAREST_MIPMAP_LINEAR,
        (Filtering::Linear, Filtering::Linear) => GL_LINEAR_MIPMAP_LINEAR,
    }) as GLint
}

pub const fn internal_format(value: PixelFormat) -> GLenum {
    match value {
        PixelFormat::Depth24Stencil8 => GL_DEPTH24_STENCIL8,
        PixelFormat::Bgra32Float => GL_RGBA32F,
        PixelFormat::Bgra16Float => GL_RGBA16F,
        PixelFormat::Rgb32Float => GL_RGB32F,
        PixelFormat::Bgra8Unorm => GL_RGBA8,
        PixelFormat::Bgr5A1Unorm => GL_RGB5_A1,
        PixelFormat::Bgra4Unorm => GL_RGBA4,
        PixelFormat::B5G6R5Unorm => GL_RGB565,
        PixelFormat::Rg8Unorm => GL_RG8,
        PixelFormat::R8Unorm => GL_R8,
        PixelFormat::Bc1Rgb => GL_COMPRESSED_RGB_S3TC_DXT1_EXT,
        PixelFormat::Bc1Rgba => GL_COMPRESSED_RGBA_S3TC_DXT1_EXT,
        PixelFormat::Bc2Rgba => GL_COMPRESSED_RGBA_S3TC_DXT3_EXT,
        PixelFormat::Bc3Rgba => GL_COMPRESSED_RGBA_S3TC_DXT5_EXT,
    }
}

/// External layout for uploads of uncompressed formats. Compressed
/// formats go through the compressed upload paths and never ask.
pub const fn external_format(value: PixelFormat) -> GLenum {
    match value {
        PixelFormat::Depth24Stencil8 => GL_DEPTH_STENCIL,
        PixelFormat::Rgb32Float | PixelFormat::B5G6R5Unorm => GL_RGB,
        PixelFormat::Rg8Unorm => GL_RG,
        PixelFormat::R8Unorm => GL_RED,
        _ => GL_BGRA,
    }
}

pub const fn external_type(value: PixelFormat) -> GLenum {
    match value {
        PixelFormat::Depth24Stencil8 => GL_UNSIGNED_INT_24_8,
        PixelFormat::Bgra32Float | PixelFormat::Bgra16Float | PixelFormat::Rgb32Float => GL_FLOAT,
        PixelFormat::Bgra8Unorm => GL_UNSIGNED_INT_8_8_8_8_REV,
        PixelFormat::Bgr5A1Unorm => GL_UNSIGNED_SHORT_1_5_5_5_REV,
        PixelFormat::Bgra4Unorm => GL_UNSIGNED_SHORT_4_4_4_4_REV,
        PixelFormat::B5G6R5Unorm => GL_UNSIGNED_SHORT_5_6_5_REV,
        _ => GL_UNSIGNED_BYTE,
    }
}

pub const fn attachment(value: Attachment) -> GLenum {
    match value {
        // Depth and stencil attach separately; callers special-case it.
        Attachment::DepthStencil => GL_NONE,
        Attachment::Color(index) => GL_COLOR_ATTACHMENT0 + index as GLenum,
    }
}

/// Component count of a vertex attribute.
pub const fn attribute_size(value: AttributeType) -> GLint {
    use AttributeType::*;
    match value {
        Disabled => 0,
        R32G32B32A32Float | R32G32B32A32Uint | R32G32B32A32Sint | R16G16B16A16Float
        | R16G16B16A16Unorm | R16G16B16A16Uint | R16G16B16A16Snorm | R16G16B16A16Sint
        | R8G8B8A8Unorm | R8G8B8A8Uint | R8G8B8A8Snorm | R8G8B8A8Sint => 4,
        R32G32B32Float | R32G32B32Uint | R32G32B32Sint => 3,
        R32G32Float | R32G32Uint | R32G32Sint | R16G16Float | R16G16Unorm | R16G16Uint
        | R16G16Snorm | R16G16Sint | R8G8Unorm | R8G8Uint | R8G8Snorm | R8G8Sint => 2,
        R32Float | R32Uint | R32Sint | R8Unorm | R8Uint | R8Snorm | R8Sint => 1,
    }
}

pub const fn attribute_type(value: AttributeType) -> GLenum {
    use AttributeType::*;
    match value {
        Disabled => GL_NONE,
        R32G32B32A32Float | R32G32B32Float | R32G32Float | R32Float => GL_FLOAT,
        R32G32B32A32Uint | R32G32B32Uint | R32G32Uint | R32Uint => GL_UNSIGNED_INT,
        R32G32B32A32Sint | R32G32B32Sint | R32G32Sint | R32Sint => GL_INT,
        R16G16B16A16Float | R16G16Float => GL_HALF_FLOAT,
        R16G16B16A16Unorm | R16G16B16A16Uint | R16G16Unorm | R16G16Uint => GL_UNSIGNED_SHORT,
        R16G16B16A16Snorm | R16G16B16A16Sint | R16G16Snorm | R16G16Sint => GL_SHORT,
        R8G8B8A8Unorm | R8G8B8A8Uint | R8G8Unorm | R8G8Uint | R8Unorm | R8Uint => GL_UNSIGNED_BYTE,
        R8G8B8A8Snorm | R8G8B8A8Sint | R8G8Snorm | R8G8Sint | R8Snorm | R8Sint => GL_BYTE,
    }
}

/// Whether the attribute feeds the shader as a (possibly normalized)
/// float rather than an integer.
pub const fn attribute_is_float(value: AttributeType) -> bool {
    use AttributeType::*;
    matches!(
        value,
        R32G32B32A32Float
            | R32G32B32Float
            | R32G32Float
            | R32Float
            | R16G16B16A16Float
            | R16G16Float
            | R16G16B16A16Unorm
            | R16G16B16A16Snorm
            | R16G16Unorm
            | R16G16Snorm
            | R8G8B8A8Unorm
            | R8G8B8A8Snorm
            | R8G8Unorm
            | R8G8Snorm
            | R8Unorm
            | R8Snorm
    )
}

/// Whether the float-path attribute wants integer data normalized.
pub const fn attribute_normalized(value: AttributeType) -> GLboolean {
    use AttributeType::*;
    let normalized = matches!(
        value,
        R16G16B16A16Unorm
            | R16G16B16A16Snorm
            | R16G16Unorm
            | R16G16Snorm
            | R8G8B8A8Unorm
            | R8G8B8A8Snorm
            | R8G8Unorm
            | R8G8Snorm
            | R8Unorm
            | R8Snorm
    );
    if normalized {
        GL_TRUE
    } else {
        GL_FALSE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_min_filter_matrix() {
        assert_eq!(
            min_filter(Filtering::Linear, Filtering::Linear),
            GL_LINEAR_MIPMAP_LINEAR as GLint
        );
        assert_eq!(
            min_filter(Filtering::Nearest, Filtering::Linear),
            GL_NEAREST_MIPMAP_LINEAR as GLint
        );
        assert_eq!(min_filter(Filtering::None, Filtering::None), GL_NEAREST as GLint);
    }

    #[test]
    fn test_attribute_tables_line_up() {
        assert_eq!(attribute_size(AttributeType::R32G32B32Float), 3);
        assert_eq!(attribute_type(AttributeType::R16G16Snorm), GL_SHORT);
        assert!(attribute_is_float(AttributeType::R16G16Snorm));
        assert_eq!(attribute_normalized(AttributeType::R16G16Snorm), GL_TRUE);
        assert!(!attribute_is_float(AttributeType::R8G8B8A8Uint));
        assert_eq!(attribute_normalized(AttributeType::R32Float), GL_FALSE);
    }

    #[test]
    fn test_compressed_formats_have_no_external_layout_queries() {
        assert_eq!(internal_format(PixelFormat::Bc3Rgba), GL_COMPRESSED_RGBA_S3TC_DXT5_EXT);
        assert_eq!(external_format(PixelFormat::Bgra8Unorm), GL_BGRA);
        assert_eq!(external_type(PixelFormat::Bgra8Unorm), GL_UNSIGNED_INT_8_8_8_8_REV);
    }
}
