//! sampler state 与 pipeline state 中属性值的解析

use ash::vk;

pub fn parse_bool(value: &str) -> Option<bool> {
    match value {
        "on" | "true" => Some(true),
        "off" | "false" => Some(false),
        _ => None,
    }
}

pub fn parse_filter(value: &str) -> Option<(vk::Filter, vk::SamplerMipmapMode)> {
    match value {
        "nearest" => Some((vk::Filter::NEAREST, vk::SamplerMipmapMode::NEAREST)),
        "linear" => Some((vk::Filter::LINEAR, vk::SamplerMipmapMode::LINEAR)),
        _ => None,
    }
}

pub fn parse_address_mode(value: &str) -> Option<vk::SamplerAddressMode> {
    Some(match value {
        "repeat" => vk::SamplerAddressMode::REPEAT,
        "mirroredRepeat" => vk::SamplerAddressMode::MIRRORED_REPEAT,
        "clampToEdge" => vk::SamplerAddressMode::CLAMP_TO_EDGE,
        "clampToBorder" => vk::SamplerAddressMode::CLAMP_TO_BORDER,
        "mirrorClampToEdge" => vk::SamplerAddressMode::MIRROR_CLAMP_TO_EDGE,
        _ => return None,
    })
}

pub fn parse_border_color(value: &str) -> Option<vk::BorderColor> {
    Some(match value {
        "floatTransparentBlack" => vk::BorderColor::FLOAT_TRANSPARENT_BLACK,
        "intTransparentBlack" => vk::BorderColor::INT_TRANSPARENT_BLACK,
        "floatOpaqueBlack" => vk::BorderColor::FLOAT_OPAQUE_BLACK,
        "intOpaqueBlack" => vk::BorderColor::INT_OPAQUE_BLACK,
        "floatOpaqueWhite" => vk::BorderColor::FLOAT_OPAQUE_WHITE,
        "intOpaqueWhite" => vk::BorderColor::INT_OPAQUE_WHITE,
        _ => return None,
    })
}

pub fn parse_compare_op(value: &str) -> Option<vk::CompareOp> {
    Some(match value {
        "never" => vk::CompareOp::NEVER,
        "less" => vk::CompareOp::LESS,
        "equal" => vk::CompareOp::EQUAL,
        "lessOrEqual" => vk::CompareOp::LESS_OR_EQUAL,
        "greater" => vk::CompareOp::GREATER,
        "notEqual" => vk::CompareOp::NOT_EQUAL,
        "greaterOrEqual" => vk::CompareOp::GREATER_OR_EQUAL,
        "always" => vk::CompareOp::ALWAYS,
        _ => return None,
    })
}

/// 普通浮点数，`allow_inf` 时额外接受 `inf`
pub fn parse_float(value: &str, allow_inf: bool) -> Option<f32> {
    if value == "inf" {
        return allow_inf.then_some(f32::INFINITY);
    }
    value.strip_suffix('f').unwrap_or(value).parse::<f32>().ok().filter(|value| value.is_finite())
}

pub fn parse_topology(value: &str) -> Option<vk::PrimitiveTopology> {
    Some(match value {
        "triangleList" => vk::PrimitiveTopology::TRIANGLE_LIST,
        "triangleStrip" => vk::PrimitiveTopology::TRIANGLE_STRIP,
        "lineList" => vk::PrimitiveTopology::LINE_LIST,
        "lineStrip" => vk::PrimitiveTopology::LINE_STRIP,
        "pointList" => vk::PrimitiveTopology::POINT_LIST,
        _ => return None,
    })
}

pub fn parse_polygon(value: &str) -> Option<vk::PolygonMode> {
    Some(match value {
        "fill" => vk::PolygonMode::FILL,
        "line" => vk::PolygonMode::LINE,
        "point" => vk::PolygonMode::POINT,
        _ => return None,
    })
}

pub fn parse_cull_face(value: &str) -> Option<vk::CullModeFlags> {
    Some(match value {
        "front" => vk::CullModeFlags::FRONT,
        "back" => vk::CullModeFlags::BACK,
        "frontAndBack" => vk::CullModeFlags::FRONT_AND_BACK,
        _ => return None,
    })
}

pub fn parse_front_face(value: &str) -> Option<vk::FrontFace> {
    Some(match value {
        "counterClockwise" => vk::FrontFace::COUNTER_CLOCKWISE,
        "clockwise" => vk::FrontFace::CLOCKWISE,
        _ => return None,
    })
}

pub fn parse_blend_factor(value: &str) -> Option<vk::BlendFactor> {
    Some(match value {
        "zero" => vk::BlendFactor::ZERO,
        "one" => vk::BlendFactor::ONE,
        "srcColor" => vk::BlendFactor::SRC_COLOR,
        "oneMinusSrcColor" => vk::BlendFactor::ONE_MINUS_SRC_COLOR,
        "dstColor" => vk::BlendFactor::DST_COLOR,
        "oneMinusDstColor" => vk::BlendFactor::ONE_MINUS_DST_COLOR,
        "srcAlpha" => vk::BlendFactor::SRC_ALPHA,
        "oneMinusSrcAlpha" => vk::BlendFactor::ONE_MINUS_SRC_ALPHA,
        "dstAlpha" => vk::BlendFactor::DST_ALPHA,
        "oneMinusDstAlpha" => vk::BlendFactor::ONE_MINUS_DST_ALPHA,
        "constColor" => vk::BlendFactor::CONSTANT_COLOR,
        "oneMinusConstColor" => vk::BlendFactor::ONE_MINUS_CONSTANT_COLOR,
        "constAlpha" => vk::BlendFactor::CONSTANT_ALPHA,
        "oneMinusConstAlpha" => vk::BlendFactor::ONE_MINUS_CONSTANT_ALPHA,
        "src1Color" => vk::BlendFactor::SRC1_COLOR,
        "oneMinusSrc1Color" => vk::BlendFactor::ONE_MINUS_SRC1_COLOR,
        "src1Alpha" => vk::BlendFactor::SRC1_ALPHA,
        "oneMinusSrc1Alpha" => vk::BlendFactor::ONE_MINUS_SRC1_ALPHA,
        "srcAlphaSaturate" => vk::BlendFactor::SRC_ALPHA_SATURATE,
        _ => return None,
    })
}

pub fn parse_blend_op(value: &str) -> Option<vk::BlendOp> {
    Some(match value {
        "add" => vk::BlendOp::ADD,
        "subtract" => vk::BlendOp::SUBTRACT,
        "reverseSubtract" => vk::BlendOp::REVERSE_SUBTRACT,
        "minimum" => vk::BlendOp::MIN,
        "maximum" => vk::BlendOp::MAX,
        _ => return None,
    })
}

/// `none`、`all` 或 `r` `g` `b` `a` 的任意组合（每个分量最多出现一次）
pub fn parse_color_mask(value: &str) -> Option<vk::ColorComponentFlags> {
    match value {
        "none" => return Some(vk::ColorComponentFlags::empty()),
        "all" => return Some(vk::ColorComponentFlags::RGBA),
        "" => return None,
        _ => {}
    }

    let mut mask = vk::ColorComponentFlags::empty();
    for c in value.chars() {
        let component = match c {
            'r' => vk::ColorComponentFlags::R,
            'g' => vk::ColorComponentFlags::G,
            'b' => vk::ColorComponentFlags::B,
            'a' => vk::ColorComponentFlags::A,
            _ => return None,
        };
        if mask.contains(component) {
            return None;
        }
        mask |= component;
    }
    Some(mask)
}

/// 去掉结尾的 `;`，没有 `;` 时返回 None
#[inline]
pub fn strip_semicolon(word: &str) -> Option<&str> {
    word.strip_suffix(';')
}

#[inline]
pub fn is_identifier(name: &str) -> bool {
    !name.is_empty() && name.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_')
}

/// 解析 `name`、`name[N]`、`name[]`，返回名字和数组大小（1 表示非数组，0 表示不定长）
pub fn parse_array_name(name: &str) -> Option<(&str, u32)> {
    let Some(open) = name.find('[') else {
        return is_identifier(name).then_some((name, 1));
    };

    let base = &name[..open];
    let size = name[open + 1..].strip_suffix(']')?;
    if !is_identifier(base) {
        return None;
    }
    if size.is_empty() {
        return Some((base, 0));
    }

    let size = size.parse::<u32>().ok().filter(|&size| size >= 1)?;
    Some((base, size))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_mask() {
        assert_eq!(parse_color_mask("all"), Some(vk::ColorComponentFlags::RGBA));
        assert_eq!(parse_color_mask("none"), Some(vk::ColorComponentFlags::empty()));
        assert_eq!(
            parse_color_mask("ra"),
            Some(vk::ColorComponentFlags::R | vk::ColorComponentFlags::A)
        );
        assert_eq!(parse_color_mask("rr"), None);
        assert_eq!(parse_color_mask("x"), None);
    }

    #[test]
    fn test_float_values() {
        assert_eq!(parse_float("0.5", false), Some(0.5));
        assert_eq!(parse_float("2.0f", false), Some(2.0));
        assert_eq!(parse_float("inf", false), None);
        assert_eq!(parse_float("inf", true), Some(f32::INFINITY));
        assert_eq!(parse_float("NaN", true), None);
    }

    #[test]
    fn test_array_name() {
        assert_eq!(parse_array_name("lights"), Some(("lights", 1)));
        assert_eq!(parse_array_name("lights[4]"), Some(("lights", 4)));
        assert_eq!(parse_array_name("textures[]"), Some(("textures", 0)));
        assert_eq!(parse_array_name("lights[0]"), None);
        assert_eq!(parse_array_name("lights[4"), None);
        assert_eq!(parse_array_name("[4]"), None);
        assert_eq!(parse_array_name("}data"), None);
    }
}
