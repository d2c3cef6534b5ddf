//! `uniform pushConstants { <type> <name>; ... } <instance>;`

use garden_gslh::GslDataType;

use crate::context::FileData;
use crate::error::CompileError;
use crate::values;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
enum PushConstantsState {
    #[default]
    Idle,
    ExpectOpen,
    ExpectTypeOrClose,
    ExpectName,
    ExpectInstance,
}

#[derive(Default)]
pub struct PushConstantsParser {
    state: PushConstantsState,
    field_type: Option<GslDataType>,
    size: u32,
}
impl PushConstantsParser {
    #[inline]
    pub fn is_active(&self) -> bool {
        self.state != PushConstantsState::Idle
    }

    /// 每个 stage 文件只能有一个 push constants 块
    pub fn begin(&mut self, file: &mut FileData, word: &str) -> Result<(), CompileError> {
        if file.push_constants_size.is_some() {
            return Err(file.error("Push constants are already declared", word));
        }
        file.emit("layout(push_constant) uniform PushConstants ");
        *self = Self {
            state: PushConstantsState::ExpectOpen,
            ..Default::default()
        };
        Ok(())
    }

    pub fn on_word(&mut self, file: &mut FileData, word: &str) -> Result<(), CompileError> {
        match self.state {
            PushConstantsState::Idle => unreachable!("push constants parser is not active"),
            PushConstantsState::ExpectOpen => {
                if word != "{" {
                    return Err(file.error("Expected '{' after pushConstants", word));
                }
                self.state = PushConstantsState::ExpectTypeOrClose;
            }
            PushConstantsState::ExpectTypeOrClose => {
                if let Some(rest) = word.strip_prefix('}') {
                    file.echo(word);
                    if rest.is_empty() {
                        self.state = PushConstantsState::ExpectInstance;
                    } else {
                        self.finish(file);
                    }
                    return Ok(());
                }

                let field_type = GslDataType::from_gsl_name(word)
                    .ok_or_else(|| file.error("Invalid push constants field type", word))?;
                self.field_type = Some(field_type);
                self.state = PushConstantsState::ExpectName;
            }
            PushConstantsState::ExpectName => {
                let (_, count) = values::strip_semicolon(word)
                    .and_then(values::parse_array_name)
                    .filter(|&(_, count)| count > 0)
                    .ok_or_else(|| file.error("Invalid push constants field name", word))?;
                let Some(field_type) = self.field_type.take() else {
                    unreachable!("push constants field type is set before the name");
                };

                self.size = self.size.saturating_add(field_type.binary_size().saturating_mul(count));
                if self.size > file.family.max_push_constants_size as u32 {
                    return Err(file.error("Push constants size exceeds the maximum", word));
                }
                self.state = PushConstantsState::ExpectTypeOrClose;
            }
            PushConstantsState::ExpectInstance => {
                file.echo(word);
                self.finish(file);
                return Ok(());
            }
        }

        file.echo(word);
        Ok(())
    }

    fn finish(&mut self, file: &mut FileData) {
        // 不超过最大值，而最大值是 u16
        file.push_constants_size = Some(self.size as u16);
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use crate::context::FamilyData;
    use crate::tokenizer::test_utils::transpile_plain;

    #[test]
    fn test_push_constants_block() {
        let mut family = FamilyData::new(128);
        let output =
            transpile_plain(&mut family, "uniform pushConstants\n{\n  float4x4 mvp;\n  float4 colors[2];\n} pc;").unwrap();

        assert_eq!(
            output,
            "layout(push_constant) uniform PushConstants \n{ \nfloat4x4 mvp; \nfloat4 colors[2]; \n} pc; \n"
        );
    }

    #[test]
    fn test_size_limit_fails_at_crossing_field() {
        let mut family = FamilyData::new(128);
        let source = "uniform pushConstants {\n  float4x4 a;\n  float4x4 b;\n  float c;\n} pc;";
        let err = transpile_plain(&mut family, source).unwrap_err();

        assert_eq!(err.message, "Push constants size exceeds the maximum");
        assert_eq!(err.word.as_deref(), Some("c;"));
        assert_eq!(err.line, 5);

        let mut family = FamilyData::new(132);
        assert!(transpile_plain(&mut family, source).is_ok());
    }

    #[test]
    fn test_push_constants_errors() {
        for (source, message) in [
            ("uniform pushConstants { Light light; } pc;", "Invalid push constants field type"),
            ("uniform pushConstants { float a } pc;", "Invalid push constants field name"),
            ("uniform pushConstants float a;", "Expected '{' after pushConstants"),
            ("pushConstants { float a; } pc;", "pushConstants must be declared as uniform"),
            (
                "uniform pushConstants { float a; } pc;\nuniform pushConstants { float b; } pc2;",
                "Push constants are already declared",
            ),
        ] {
            let mut family = FamilyData::new(128);
            let err = transpile_plain(&mut family, source).unwrap_err();
            assert_eq!(err.message, message, "{source}");
        }
    }
}
