//! ray tracing stage 的语法：payload、callable data 以及相关指令

use garden_gslh::ShaderStage;

use crate::context::FileData;
use crate::directive::parse_directive_value;
use crate::error::CompileError;
use crate::tokenizer::{StageParser, fix_global_names};
use crate::values;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RayDeclaration {
    RayPayload,
    RayPayloadIn,
    CallableData,
    CallableDataIn,
}
impl RayDeclaration {
    fn from_keyword(word: &str) -> Option<Self> {
        Some(match word {
            "rayPayload" => Self::RayPayload,
            "rayPayloadIn" => Self::RayPayloadIn,
            "callableData" => Self::CallableData,
            "callableDataIn" => Self::CallableDataIn,
            _ => return None,
        })
    }

    fn glsl_name(self) -> &'static str {
        match self {
            Self::RayPayload => "rayPayloadEXT",
            Self::RayPayloadIn => "rayPayloadInEXT",
            Self::CallableData => "callableDataEXT",
            Self::CallableDataIn => "callableDataInEXT",
        }
    }

    fn is_allowed(self, stage: ShaderStage) -> bool {
        use ShaderStage::*;
        match self {
            Self::RayPayload => matches!(stage, RayGen | ClosestHit | Miss),
            Self::RayPayloadIn => matches!(stage, ClosestHit | AnyHit | Miss),
            Self::CallableData => matches!(stage, RayGen | ClosestHit | Miss | Callable),
            Self::CallableDataIn => stage == Callable,
        }
    }

    #[inline]
    fn is_payload(self) -> bool {
        matches!(self, Self::RayPayload | Self::RayPayloadIn)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RayDirective {
    RayPayloadOffset,
    CallableDataOffset,
    RayRecursionDepth,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
enum DeclarationState {
    #[default]
    Idle,
    Type,
    Name,
}

pub struct RayTracingParser {
    stage: ShaderStage,
    declaration: Option<RayDeclaration>,
    declaration_state: DeclarationState,
    type_name: String,
    directive: Option<RayDirective>,

    payload_location: u32,
    callable_location: u32,
    ray_recursion_depth: Option<u8>,
}
// new & init
impl RayTracingParser {
    pub fn new(stage: ShaderStage) -> Self {
        debug_assert!(stage.is_ray_tracing());
        Self {
            stage,
            declaration: None,
            declaration_state: DeclarationState::Idle,
            type_name: String::new(),
            directive: None,
            payload_location: 0,
            callable_location: 0,
            ray_recursion_depth: None,
        }
    }
}
// getters
impl RayTracingParser {
    /// `#rayRecursionDepth` 声明的值
    #[inline]
    pub fn ray_recursion_depth(&self) -> Option<u8> {
        self.ray_recursion_depth
    }
}
impl RayTracingParser {
    fn is_payload_stage(&self) -> bool {
        use ShaderStage::*;
        matches!(self.stage, RayGen | ClosestHit | AnyHit | Miss)
    }

    fn is_callable_stage(&self) -> bool {
        use ShaderStage::*;
        matches!(self.stage, RayGen | ClosestHit | Miss | Callable)
    }

    fn on_directive(&mut self, file: &mut FileData, directive: RayDirective, word: &str) -> Result<(), CompileError> {
        let value = parse_directive_value(word).ok_or_else(|| file.error("Invalid directive value", word))?;
        match directive {
            RayDirective::RayPayloadOffset => self.payload_location = self.payload_location.saturating_add(value),
            RayDirective::CallableDataOffset => self.callable_location = self.callable_location.saturating_add(value),
            RayDirective::RayRecursionDepth => {
                let depth = u8::try_from(value)
                    .ok()
                    .filter(|&depth| depth > 0)
                    .ok_or_else(|| file.error("Invalid ray recursion depth", word))?;
                self.ray_recursion_depth = Some(depth);
            }
        }
        Ok(())
    }

    fn on_declaration(&mut self, file: &mut FileData, word: &str) -> Result<(), CompileError> {
        let Some(declaration) = self.declaration else {
            unreachable!("ray tracing declaration is not active");
        };

        match self.declaration_state {
            DeclarationState::Idle => unreachable!("ray tracing declaration is not active"),
            DeclarationState::Type => {
                if !values::is_identifier(word) {
                    return Err(file.error("Invalid payload type", word));
                }
                self.type_name = word.to_string();
                self.declaration_state = DeclarationState::Name;
            }
            DeclarationState::Name => {
                let fixed_word = fix_global_names(word);
                let name = values::strip_semicolon(&fixed_word)
                    .filter(|name| values::is_identifier(name))
                    .ok_or_else(|| file.error("Invalid payload name", word))?
                    .to_string();

                let location = if declaration.is_payload() {
                    &mut self.payload_location
                } else {
                    &mut self.callable_location
                };
                let next_location = location
                    .checked_add(1)
                    .ok_or_else(|| file.error("Too many payload locations", word))?;
                let text = format!(
                    "layout(location = {location}) {} {} {name};",
                    declaration.glsl_name(),
                    self.type_name
                );
                *location = next_location;
                file.echo(&text);

                self.declaration = None;
                self.declaration_state = DeclarationState::Idle;
            }
        }
        Ok(())
    }
}
impl StageParser for RayTracingParser {
    fn is_active(&self) -> bool {
        self.declaration.is_some() || self.directive.is_some()
    }

    fn on_word(&mut self, file: &mut FileData, word: &str, _is_first_word: bool) -> Result<bool, CompileError> {
        if let Some(directive) = self.directive.take() {
            self.on_directive(file, directive, word)?;
            return Ok(true);
        }
        if self.declaration.is_some() {
            self.on_declaration(file, word)?;
            return Ok(true);
        }

        if let Some(declaration) = RayDeclaration::from_keyword(word) {
            if !declaration.is_allowed(self.stage) {
                return Err(file.error("Declaration is not supported in this stage", word));
            }
            self.declaration = Some(declaration);
            self.declaration_state = DeclarationState::Type;
            return Ok(true);
        }

        let directive = match word {
            "#rayPayloadOffset" => RayDirective::RayPayloadOffset,
            "#callableDataOffset" => RayDirective::CallableDataOffset,
            "#rayRecursionDepth" => RayDirective::RayRecursionDepth,
            _ => return Ok(false),
        };
        let is_allowed = match directive {
            RayDirective::RayPayloadOffset => self.is_payload_stage(),
            RayDirective::CallableDataOffset => self.is_callable_stage(),
            RayDirective::RayRecursionDepth => self.stage == ShaderStage::RayGen,
        };
        if !is_allowed {
            return Err(file.error("Directive is not supported in this stage", word));
        }
        self.directive = Some(directive);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::FamilyData;
    use crate::tokenizer::test_utils::transpile;

    fn transpile_stage(stage: ShaderStage, source: &str) -> Result<(String, RayTracingParser), CompileError> {
        let mut family = FamilyData::new(128);
        let mut parser = RayTracingParser::new(stage);
        let output = transpile(&mut family, stage, &mut parser, source)?;
        Ok((output, parser))
    }

    #[test]
    fn test_payload_locations() {
        let (output, _) = transpile_stage(
            ShaderStage::ClosestHit,
            "rayPayloadIn HitInfo hit;\nrayPayload ShadowInfo shadow;\ncallableData float3 color;",
        )
        .unwrap();

        let lines = output.lines().collect::<Vec<_>>();
        assert_eq!(lines[0], "layout(location = 0) rayPayloadInEXT HitInfo hit; ");
        assert_eq!(lines[1], "layout(location = 1) rayPayloadEXT ShadowInfo shadow; ");
        assert_eq!(lines[2], "layout(location = 0) callableDataEXT float3 color; ");
    }

    #[test]
    fn test_offsets_and_recursion_depth() {
        let (output, parser) = transpile_stage(
            ShaderStage::RayGen,
            "#rayRecursionDepth 2\n#rayPayloadOffset 2\nrayPayload HitInfo hit;\n#callableDataOffset 1;\ncallableData float4 data;",
        )
        .unwrap();

        assert_eq!(parser.ray_recursion_depth(), Some(2));
        assert!(output.contains("layout(location = 2) rayPayloadEXT HitInfo hit;"));
        assert!(output.contains("layout(location = 1) callableDataEXT float4 data;"));
    }

    #[test]
    fn test_stage_restrictions() {
        for (stage, source, message) in [
            (ShaderStage::RayGen, "rayPayloadIn HitInfo hit;", "Declaration is not supported in this stage"),
            (ShaderStage::AnyHit, "callableData float c;", "Declaration is not supported in this stage"),
            (ShaderStage::Miss, "callableDataIn float c;", "Declaration is not supported in this stage"),
            (ShaderStage::Miss, "#rayRecursionDepth 2", "Directive is not supported in this stage"),
            (ShaderStage::Callable, "#rayPayloadOffset 1", "Directive is not supported in this stage"),
            (ShaderStage::RayGen, "#rayRecursionDepth 0", "Invalid ray recursion depth"),
            (ShaderStage::RayGen, "#rayRecursionDepth 256", "Invalid ray recursion depth"),
            (ShaderStage::RayGen, "rayPayload HitInfo hit", "Invalid payload name"),
            (
                ShaderStage::RayGen,
                "#rayPayloadOffset 4294967295\nrayPayload HitInfo hit;",
                "Too many payload locations",
            ),
            (
                ShaderStage::Miss,
                "#callableDataOffset 4294967295\ncallableData float c;",
                "Too many payload locations",
            ),
        ] {
            let Err(err) = transpile_stage(stage, source) else {
                panic!("expected an error for {source}");
            };
            assert_eq!(err.message, message, "{source}");
        }

        assert!(transpile_stage(ShaderStage::Callable, "callableDataIn float3 color;").is_ok());
        assert!(transpile_stage(ShaderStage::AnyHit, "rayPayloadIn HitInfo hit;").is_ok());
    }
}
