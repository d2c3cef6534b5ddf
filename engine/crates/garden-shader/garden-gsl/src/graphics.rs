//! vertex 与 fragment stage 的语法
//!
//! ```text
//! in float3 position : f32;                  // vertex 输入，同时是顶点属性
//! out flat uint32 materialIndex;
//! #attributeOffset 12
//! #attachmentOffset 1
//! pipelineState { depthTesting = on; }
//! ```

use garden_gslh::{GslDataFormat, GslDataType, ShaderStage, VertexAttribute};

use crate::context::FileData;
use crate::directive::parse_directive_value;
use crate::error::CompileError;
use crate::pipeline_state::PipelineStateParser;
use crate::tokenizer::{StageParser, fix_global_names};
use crate::values;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
enum InOutState {
    #[default]
    Idle,
    /// 限定符或类型
    Type,
    Name,
    Colon,
    Format,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GraphicsDirective {
    AttributeOffset,
    AttachmentOffset,
}

#[derive(Debug, Default)]
struct InOutDeclaration {
    is_input: bool,
    flat: bool,
    noperspective: bool,
    data_type: Option<GslDataType>,
    name: String,
    array_size: u32,
}

pub struct GraphicsParser {
    stage: ShaderStage,
    state: InOutState,
    declaration: InOutDeclaration,
    directive: Option<GraphicsDirective>,
    pipeline_state: PipelineStateParser,

    input_location: u32,
    output_location: u32,
    attribute_offset: u32,
    vertex_attributes: Vec<VertexAttribute>,
}
// new & init
impl GraphicsParser {
    pub fn new(stage: ShaderStage) -> Self {
        debug_assert!(matches!(stage, ShaderStage::Vertex | ShaderStage::Fragment));
        Self {
            stage,
            state: InOutState::Idle,
            declaration: InOutDeclaration::default(),
            directive: None,
            pipeline_state: PipelineStateParser::default(),
            input_location: 0,
            output_location: 0,
            attribute_offset: 0,
            vertex_attributes: Vec::new(),
        }
    }
}
// getters
impl GraphicsParser {
    /// 输入占用的 location 数量
    #[inline]
    pub fn input_location_count(&self) -> u32 {
        self.input_location
    }

    /// 输出占用的 location 数量，fragment 中即 color attachment 的数量
    #[inline]
    pub fn output_location_count(&self) -> u32 {
        self.output_location
    }

    #[inline]
    pub fn vertex_attributes(&self) -> &[VertexAttribute] {
        &self.vertex_attributes
    }

    /// 一个顶点的字节数
    #[inline]
    pub fn vertex_attributes_size(&self) -> u16 {
        // 每次增加 offset 时都检查过上限
        self.attribute_offset as u16
    }

    #[inline]
    fn is_vertex(&self) -> bool {
        self.stage == ShaderStage::Vertex
    }
}
impl GraphicsParser {
    fn on_directive(
        &mut self,
        file: &mut FileData,
        directive: GraphicsDirective,
        word: &str,
    ) -> Result<(), CompileError> {
        let value = parse_directive_value(word).ok_or_else(|| file.error("Invalid directive value", word))?;
        match directive {
            GraphicsDirective::AttributeOffset => {
                self.attribute_offset = self.attribute_offset.saturating_add(value);
                if self.attribute_offset > u16::MAX as u32 {
                    return Err(file.error("Vertex attributes size is too big", word));
                }
            }
            GraphicsDirective::AttachmentOffset => {
                self.output_location = self.output_location.saturating_add(value);
            }
        }
        Ok(())
    }

    fn on_in_out(&mut self, file: &mut FileData, word: &str) -> Result<(), CompileError> {
        match self.state {
            InOutState::Idle => unreachable!("in/out declaration is not active"),
            InOutState::Type => match word {
                "flat" => self.declaration.flat = true,
                "noperspective" => self.declaration.noperspective = true,
                _ => {
                    let data_type =
                        GslDataType::from_gsl_name(word).ok_or_else(|| file.error("Invalid in/out type", word))?;
                    if self.is_vertex()
                        && self.declaration.is_input
                        && (self.declaration.flat || self.declaration.noperspective)
                    {
                        return Err(file.error("Vertex input can't have qualifiers", word));
                    }
                    self.declaration.data_type = Some(data_type);
                    self.state = InOutState::Name;
                }
            },
            InOutState::Name => {
                if self.is_vertex() && self.declaration.is_input {
                    if word.ends_with(';') {
                        return Err(file.error("Expected ':' after vertex attribute name", word));
                    }
                    let (name, array_size) =
                        values::parse_array_name(word).ok_or_else(|| file.error("Invalid vertex attribute name", word))?;
                    if array_size != 1 {
                        return Err(file.error("Vertex attribute can't be an array", word));
                    }
                    self.declaration.name = name.to_string();
                    self.declaration.array_size = 1;
                    self.state = InOutState::Colon;
                } else {
                    let fixed_word = fix_global_names(word);
                    let (name, array_size) = values::strip_semicolon(&fixed_word)
                        .and_then(values::parse_array_name)
                        .filter(|&(_, array_size)| array_size > 0)
                        .ok_or_else(|| file.error("Invalid in/out name", word))?;
                    self.declaration.name = name.to_string();
                    self.declaration.array_size = array_size;
                    self.emit_declaration(file, word)?;
                }
            }
            InOutState::Colon => {
                if word != ":" {
                    return Err(file.error("Expected ':' after vertex attribute name", word));
                }
                self.state = InOutState::Format;
            }
            InOutState::Format => {
                let Some(data_type) = self.declaration.data_type else {
                    unreachable!("in/out type is set before the format");
                };
                let format = values::strip_semicolon(word)
                    .and_then(|name| {
                        GslDataFormat::from_gsl_name(name)
                            .or_else(|| GslDataType::from_gsl_name(name).map(GslDataFormat::from_data_type))
                    })
                    .ok_or_else(|| file.error("Invalid vertex attribute format", word))?;

                if self.vertex_attributes.len() >= u8::MAX as usize {
                    return Err(file.error("Too many vertex attributes", word));
                }
                self.vertex_attributes.push(VertexAttribute {
                    data_type,
                    format,
                    offset: self.attribute_offset,
                });
                self.attribute_offset += data_type.component_count() * format.binary_size();
                if self.attribute_offset > u16::MAX as u32 {
                    return Err(file.error("Vertex attributes size is too big", word));
                }
                self.emit_declaration(file, word)?;
            }
        }
        Ok(())
    }

    /// `layout(location = L) [flat ][noperspective ]in|out <type> <name>;`
    fn emit_declaration(&mut self, file: &mut FileData, word: &str) -> Result<(), CompileError> {
        let declaration = std::mem::take(&mut self.declaration);
        let Some(data_type) = declaration.data_type else {
            unreachable!("in/out type is set before the name");
        };

        let location = if declaration.is_input {
            &mut self.input_location
        } else {
            &mut self.output_location
        };
        let next_location = data_type
            .location_count()
            .checked_mul(declaration.array_size)
            .and_then(|count| location.checked_add(count))
            .ok_or_else(|| file.error("Too many in/out locations", word))?;
        let mut text = format!("layout(location = {location}) ");
        *location = next_location;

        if declaration.flat {
            text.push_str("flat ");
        }
        if declaration.noperspective {
            text.push_str("noperspective ");
        }
        text.push_str(if declaration.is_input { "in " } else { "out " });
        text.push_str(data_type.gsl_name());
        text.push(' ');
        text.push_str(&declaration.name);
        if declaration.array_size != 1 {
            text.push_str(&format!("[{}]", declaration.array_size));
        }
        text.push(';');
        file.echo(&text);

        self.state = InOutState::Idle;
        Ok(())
    }
}
impl StageParser for GraphicsParser {
    fn is_active(&self) -> bool {
        self.state != InOutState::Idle || self.directive.is_some() || self.pipeline_state.is_active()
    }

    fn on_word(&mut self, file: &mut FileData, word: &str, is_first_word: bool) -> Result<bool, CompileError> {
        if self.pipeline_state.is_active() {
            self.pipeline_state.on_word(file, word)?;
            return Ok(true);
        }
        if let Some(directive) = self.directive.take() {
            self.on_directive(file, directive, word)?;
            return Ok(true);
        }
        if self.state != InOutState::Idle {
            self.on_in_out(file, word)?;
            return Ok(true);
        }

        match word {
            "in" | "out" if is_first_word => {
                self.declaration = InOutDeclaration {
                    is_input: word == "in",
                    ..Default::default()
                };
                self.state = InOutState::Type;
            }
            "pipelineState" => self.pipeline_state.begin(file),
            "#attributeOffset" if self.is_vertex() => self.directive = Some(GraphicsDirective::AttributeOffset),
            "#attachmentOffset" if !self.is_vertex() => self.directive = Some(GraphicsDirective::AttachmentOffset),
            _ => return Ok(false),
        }
        Ok(true)
    }
}
