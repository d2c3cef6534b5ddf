//! `pipelineState { <property> = <value>; ... }`
//!
//! vertex 与 fragment 共用同一个 family 的 pipeline state。混合相关的属性名后面带 color attachment 的编号，
//! 例如 `blending0`、`colorMask2`。属性在 GLSL 中以注释的形式保留。

use garden_gslh::{BlendState, PipelineState};

use crate::context::FileData;
use crate::error::CompileError;
use crate::values;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
enum PipelineStateStage {
    #[default]
    Idle,
    ExpectOpen,
    ExpectProperty,
    ExpectEquals,
    ExpectValue,
}

#[derive(Default)]
pub struct PipelineStateParser {
    stage: PipelineStateStage,
    property: String,
}
impl PipelineStateParser {
    #[inline]
    pub fn is_active(&self) -> bool {
        self.stage != PipelineStateStage::Idle
    }

    pub fn begin(&mut self, file: &mut FileData) {
        file.emit("/* pipelineState ");
        self.stage = PipelineStateStage::ExpectOpen;
    }

    pub fn on_word(&mut self, file: &mut FileData, word: &str) -> Result<(), CompileError> {
        match self.stage {
            PipelineStateStage::Idle => unreachable!("pipeline state parser is not active"),
            PipelineStateStage::ExpectOpen => {
                if word != "{" {
                    return Err(file.error("Expected '{' after pipelineState", word));
                }
                file.emit("{ */ ");
                self.stage = PipelineStateStage::ExpectProperty;
            }
            PipelineStateStage::ExpectProperty => {
                if word == "}" {
                    file.emit("/* } */ ");
                    self.stage = PipelineStateStage::Idle;
                    return Ok(());
                }
                self.property = word.to_string();
                self.stage = PipelineStateStage::ExpectEquals;
            }
            PipelineStateStage::ExpectEquals => {
                if word != "=" {
                    return Err(file.error("Expected '=' after pipeline state property", word));
                }
                self.stage = PipelineStateStage::ExpectValue;
            }
            PipelineStateStage::ExpectValue => {
                let value = values::strip_semicolon(word)
                    .ok_or_else(|| file.error("Expected ';' after pipeline state value", word))?;
                let property = std::mem::take(&mut self.property);

                let result = match split_attachment_index(&property) {
                    Some((name, attachment)) => {
                        apply_blend_property(file.family.blend_state_mut(attachment), name, value)
                    }
                    None => apply_pipeline_property(&mut file.family.pipeline_state, &property, value),
                };
                result.map_err(|err| match err {
                    PropertyError::UnknownProperty => file.error("Unknown pipeline state property", &property),
                    PropertyError::InvalidValue => file.error("Invalid pipeline state value", word),
                })?;

                file.emit(&format!("/* {property} = {value}; */ "));
                self.stage = PipelineStateStage::ExpectProperty;
            }
        }
        Ok(())
    }
}

enum PropertyError {
    UnknownProperty,
    InvalidValue,
}

/// `blending0` -> (`blending`, 0)，没有数字后缀时返回 None
fn split_attachment_index(property: &str) -> Option<(&str, usize)> {
    let digits = property.len() - property.trim_end_matches(|c: char| c.is_ascii_digit()).len();
    if digits == 0 || digits == property.len() {
        return None;
    }
    let (name, index) = property.split_at(property.len() - digits);
    // attachment 的数量远小于 u8::MAX
    let index = index.parse::<u8>().ok()?;
    Some((name, index as usize))
}

fn apply_pipeline_property(state: &mut PipelineState, property: &str, value: &str) -> Result<(), PropertyError> {
    fn parsed<T>(value: Option<T>) -> Result<T, PropertyError> {
        value.ok_or(PropertyError::InvalidValue)
    }

    match property {
        "topology" => state.topology = parsed(values::parse_topology(value))?,
        "polygon" => state.polygon = parsed(values::parse_polygon(value))?,
        "discarding" => state.discarding = parsed(values::parse_bool(value))?,
        "depthTesting" => state.depth_testing = parsed(values::parse_bool(value))?,
        "depthWriting" => state.depth_writing = parsed(values::parse_bool(value))?,
        "depthClamping" => state.depth_clamping = parsed(values::parse_bool(value))?,
        "depthBiasing" => state.depth_biasing = parsed(values::parse_bool(value))?,
        "stencilTesting" => state.stencil_testing = parsed(values::parse_bool(value))?,
        "faceCulling" => state.face_culling = parsed(values::parse_bool(value))?,
        "cullFace" => state.cull_face = parsed(values::parse_cull_face(value))?,
        "frontFace" => state.front_face = parsed(values::parse_front_face(value))?,
        "depthCompare" => state.depth_compare = parsed(values::parse_compare_op(value))?,
        _ => return Err(PropertyError::UnknownProperty),
    }
    Ok(())
}

fn apply_blend_property(state: &mut BlendState, property: &str, value: &str) -> Result<(), PropertyError> {
    let factor = || values::parse_blend_factor(value).ok_or(PropertyError::InvalidValue);
    let operation = || values::parse_blend_op(value).ok_or(PropertyError::InvalidValue);

    match property {
        "colorMask" => state.color_mask = values::parse_color_mask(value).ok_or(PropertyError::InvalidValue)?,
        "blending" => state.blending = values::parse_bool(value).ok_or(PropertyError::InvalidValue)?,
        "srcBlendFactor" => {
            let factor = factor()?;
            state.src_color_factor = factor;
            state.src_alpha_factor = factor;
        }
        "dstBlendFactor" => {
            let factor = factor()?;
            state.dst_color_factor = factor;
            state.dst_alpha_factor = factor;
        }
        "srcColorBlendFactor" => state.src_color_factor = factor()?,
        "dstColorBlendFactor" => state.dst_color_factor = factor()?,
        "srcAlphaBlendFactor" => state.src_alpha_factor = factor()?,
        "dstAlphaBlendFactor" => state.dst_alpha_factor = factor()?,
        "blendOperation" => {
            let operation = operation()?;
            state.color_operation = operation;
            state.alpha_operation = operation;
        }
        "colorBlendOperation" => state.color_operation = operation()?,
        "alphaBlendOperation" => state.alpha_operation = operation()?,
        _ => return Err(PropertyError::UnknownProperty),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use ash::vk;
    use garden_gslh::ShaderStage;

    use super::*;
    use crate::context::FamilyData;

    fn parse(family: &mut FamilyData, source: &str) -> Result<String, CompileError> {
        let mut file = FileData::new(family, ShaderStage::Fragment);
        let mut parser = PipelineStateParser::default();
        parser.begin(&mut file);
        for word in source.split_whitespace() {
            parser.on_word(&mut file, word)?;
        }
        assert!(!parser.is_active());
        Ok(file.into_output())
    }

    #[test]
    fn test_scalar_properties() {
        let mut family = FamilyData::new(128);
        parse(
            &mut family,
            "{ topology = lineStrip; depthTesting = on; depthWriting = true; faceCulling = off; cullFace = front; depthCompare = lessOrEqual; }",
        )
        .unwrap();

        let state = family.pipeline_state;
        assert_eq!(state.topology, vk::PrimitiveTopology::LINE_STRIP);
        assert!(state.depth_testing && state.depth_writing);
        assert!(!state.face_culling);
        assert_eq!(state.cull_face, vk::CullModeFlags::FRONT);
        assert_eq!(state.depth_compare, vk::CompareOp::LESS_OR_EQUAL);
        assert_eq!(state.polygon, vk::PolygonMode::FILL);
    }

    #[test]
    fn test_blend_properties_grow_attachments() {
        let mut family = FamilyData::new(128);
        let output = parse(
            &mut family,
            "{ blending1 = on; srcBlendFactor1 = one; alphaBlendOperation1 = maximum; colorMask0 = rgb; }",
        )
        .unwrap();

        assert_eq!(family.blend_states.len(), 2);
        assert_eq!(
            family.blend_states[0].color_mask,
            vk::ColorComponentFlags::R | vk::ColorComponentFlags::G | vk::ColorComponentFlags::B
        );
        assert!(!family.blend_states[0].blending);

        let blend = family.blend_states[1];
        assert!(blend.blending);
        assert_eq!(blend.src_color_factor, vk::BlendFactor::ONE);
        assert_eq!(blend.src_alpha_factor, vk::BlendFactor::ONE);
        assert_eq!(blend.dst_color_factor, vk::BlendFactor::ONE_MINUS_SRC_ALPHA);
        assert_eq!(blend.alpha_operation, vk::BlendOp::MAX);
        assert_eq!(blend.color_operation, vk::BlendOp::ADD);

        assert!(output.starts_with("/* pipelineState { */ /* blending1 = on; */ "));
        assert!(output.ends_with("/* } */ "));
    }

    #[test]
    fn test_property_errors() {
        for (source, message, word) in [
            ("{ topology = quads; }", "Invalid pipeline state value", "quads;"),
            ("{ wireframe = on; }", "Unknown pipeline state property", "wireframe"),
            ("{ blending = on; }", "Unknown pipeline state property", "blending"),
            ("{ colorMask0 = rgbx; }", "Invalid pipeline state value", "rgbx;"),
            ("{ depthTesting = on }", "Expected ';' after pipeline state value", "on"),
            ("{ depthTesting on; }", "Expected '=' after pipeline state property", "on;"),
            ("depthTesting = on;", "Expected '{' after pipelineState", "depthTesting"),
        ] {
            let mut family = FamilyData::new(128);
            let err = parse(&mut family, source).unwrap_err();
            assert_eq!(err.message, message, "{source}");
            assert_eq!(err.word.as_deref(), Some(word), "{source}");
        }
    }

    #[test]
    fn test_attachment_index_split() {
        assert_eq!(split_attachment_index("blending12"), Some(("blending", 12)));
        assert_eq!(split_attachment_index("blending"), None);
        assert_eq!(split_attachment_index("42"), None);
    }
}
