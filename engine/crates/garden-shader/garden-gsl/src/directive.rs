//! `#feature` 与 `#variantCount`，以及各个 stage 的数值指令共用的解析

use crate::context::FileData;
use crate::error::CompileError;

/// `#feature` 支持的扩展
const FEATURES: &[(&str, &str)] = &[
    ("ext.debugPrintf", "GL_EXT_debug_printf"),
    ("ext.explicitTypes", "GL_EXT_shader_explicit_arithmetic_types"),
    ("ext.int8BitStorage", "GL_EXT_shader_8bit_storage"),
    ("ext.int16BitStorage", "GL_EXT_shader_16bit_storage"),
    ("ext.bindless", "GL_EXT_nonuniform_qualifier"),
    ("ext.scalarLayout", "GL_EXT_scalar_block_layout"),
    ("ext.bufferReference", "GL_EXT_buffer_reference"),
    ("ext.subgroupBasic", "GL_KHR_shader_subgroup_basic"),
    ("ext.subgroupVote", "GL_KHR_shader_subgroup_vote"),
    ("ext.rayQuery", "GL_EXT_ray_query"),
];

/// 带 ray query 辅助函数的 include 文件
const RAY_QUERY_INCLUDE: &str = "ray-query.gsl";

/// 解析指令的数值参数，允许结尾带 `;`
pub fn parse_directive_value(word: &str) -> Option<u32> {
    word.strip_suffix(';').unwrap_or(word).parse::<u32>().ok()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PendingDirective {
    Feature,
    VariantCount,
}

#[derive(Default)]
pub struct DirectiveParser {
    pending: Option<PendingDirective>,
}
impl DirectiveParser {
    #[inline]
    pub fn is_active(&self) -> bool {
        self.pending.is_some()
    }

    pub fn on_keyword(&mut self, file: &mut FileData, word: &str) -> Result<bool, CompileError> {
        match word {
            "#feature" => self.pending = Some(PendingDirective::Feature),
            "#variantCount" => {
                if file.variant_count.is_some() {
                    return Err(file.error("Variant count is already declared", word));
                }
                self.pending = Some(PendingDirective::VariantCount);
            }
            _ => return Ok(false),
        }
        Ok(true)
    }

    pub fn on_word(&mut self, file: &mut FileData, word: &str) -> Result<(), CompileError> {
        match self.pending.take() {
            Some(PendingDirective::Feature) => Self::on_feature(file, word),
            Some(PendingDirective::VariantCount) => {
                let count = parse_directive_value(word)
                    .filter(|count| (2..=255).contains(count))
                    .ok_or_else(|| file.error("Invalid variant count", word))?;
                file.variant_count = Some(count as u8);
                file.emit("layout(constant_id = 0) const uint gsl_variant = 0;");
                Ok(())
            }
            None => unreachable!("no pending directive"),
        }
    }

    fn on_feature(file: &mut FileData, word: &str) -> Result<(), CompileError> {
        let name = word.strip_suffix(';').unwrap_or(word);
        let Some((feature, extension)) = FEATURES.iter().find(|(feature, _)| *feature == name) else {
            return Err(file.error("Unknown GSL feature", word));
        };

        file.emit(&format!("#extension {extension} : require"));
        if *feature == "ext.rayQuery" {
            // include 之后恢复行号，下一行的行号即当前的 line_index
            let line = file.line_index;
            file.emit(&format!("\n#include \"{RAY_QUERY_INCLUDE}\"\n#line {line}"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::context::FamilyData;
    use crate::tokenizer::test_utils::transpile_plain;

    #[test]
    fn test_variant_count_range() {
        for (source, is_ok) in [
            ("#variantCount 1;", false),
            ("#variantCount 256;", false),
            ("#variantCount x;", false),
            ("#variantCount 2;", true),
            ("#variantCount 255", true),
        ] {
            let mut family = FamilyData::new(128);
            assert_eq!(transpile_plain(&mut family, source).is_ok(), is_ok, "{source}");
        }
    }

    #[test]
    fn test_variant_count_once_per_file() {
        let mut family = FamilyData::new(128);
        let output = transpile_plain(&mut family, "#variantCount 4").unwrap();
        assert_eq!(output, "layout(constant_id = 0) const uint gsl_variant = 0;\n");

        let err = transpile_plain(&mut family, "#variantCount 4\n#variantCount 4").unwrap_err();
        assert_eq!(err.message, "Variant count is already declared");
        assert_eq!(err.line, 3);
    }

    #[test]
    fn test_features() {
        let mut family = FamilyData::new(128);
        let output = transpile_plain(&mut family, "#feature ext.debugPrintf;").unwrap();
        assert_eq!(output, "#extension GL_EXT_debug_printf : require\n");

        let err = transpile_plain(&mut family, "#feature ext.unknown").unwrap_err();
        assert_eq!(err.word.as_deref(), Some("ext.unknown"));
    }

    #[test]
    fn test_ray_query_line_resync() {
        let mut family = FamilyData::new(128);
        let output = transpile_plain(&mut family, "#feature ext.rayQuery\nvoid main() {}").unwrap();

        let lines = output.lines().collect::<Vec<_>>();
        assert_eq!(lines[0], "#extension GL_EXT_ray_query : require");
        assert_eq!(lines[1], "#include \"ray-query.gsl\"");
        // 源码第二行报告为 line 3，GLSL 中为 2
        assert_eq!(lines[2], "#line 2");
        assert_eq!(lines[3], "void main() {} ");
    }
}
