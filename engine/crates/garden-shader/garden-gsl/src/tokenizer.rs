//! 逐行、逐单词处理 GSL 源码
//!
//! 单词以空白分隔。每个单词依次交给：活动中的通用语法结构、stage 的语法结构、stage 关键字、
//! 通用关键字，都不处理时做全局名字替换后原样输出。每一行在输出中恰好对应一行，
//! 保证 `#line` 之后 glslc 报告的行号与源码一致。

use std::borrow::Cow;

use garden_gslh::ShaderStage;

use crate::context::FileData;
use crate::error::CompileError;
use crate::generic::GenericParser;

/// stage 专有的语法
pub trait StageParser {
    /// 是否处于未结束的语法结构中
    fn is_active(&self) -> bool;

    /// 处理一个单词，返回 false 表示该单词不属于 stage 的语法
    fn on_word(&mut self, file: &mut FileData, word: &str, is_first_word: bool) -> Result<bool, CompileError>;
}

/// 每个 stage 的 GLSL 开头
pub fn preamble(stage: ShaderStage) -> String {
    let mut preamble = String::from("#version 460\n");
    if stage.is_ray_tracing() {
        preamble.push_str("#extension GL_EXT_ray_tracing : require\n");
    }
    preamble.push_str("#include \"types.gsl\"\n#line 1\n");
    preamble
}

/// 单词以及它在行中的字节偏移
fn split_words(line: &str) -> impl Iterator<Item = (usize, &str)> {
    line.split_whitespace().map(move |word| (word.as_ptr() as usize - line.as_ptr() as usize, word))
}

/// 处理整个源文件，结果写入 `file` 的输出
pub fn process_source(source: &str, file: &mut FileData, stage: &mut dyn StageParser) -> Result<(), CompileError> {
    let mut generic = GenericParser::default();
    file.is_skip_mode = false;

    for line in source.lines() {
        file.line_index += 1;

        for (index, (offset, word)) in split_words(line).enumerate() {
            // 块注释中的内容原样输出；任何包含 `*/` 的单词都会结束注释
            if file.is_skip_mode {
                file.echo(word);
                if word.contains("*/") {
                    file.is_skip_mode = false;
                }
                continue;
            }
            if word.starts_with("//") {
                file.emit(&line[offset..]);
                break;
            }
            if let Some(rest) = word.strip_prefix("/*") {
                file.echo(word);
                file.is_skip_mode = !rest.contains("*/");
                continue;
            }

            if generic.is_active() {
                generic.on_active_word(file, word)?;
                continue;
            }
            if stage.on_word(file, word, index == 0)? {
                continue;
            }
            if generic.on_keyword(file, word)? {
                continue;
            }
            file.echo(&fix_global_names(word));
        }

        file.emit("\n");
    }

    if generic.is_active() || stage.is_active() {
        return Err(file.error_no_word("Unexpected end of file"));
    }
    Ok(())
}

const GLOBAL_PREFIXES: [&str; 5] = ["vs.", "fs.", "fb.", "gl.", "gsl."];

#[inline]
fn is_identifier_byte(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || byte == b'_'
}

/// `vs.` `fs.` `fb.` `gl.` `gsl.` 前缀中的 `.` 替换为 `_`，`gl.` 之后的首字母大写
///
/// 前缀前面不能是标识符字符或 `.`，所以 `a.gl.x` 与 `agl.x` 保持不变。
pub fn fix_global_names(word: &str) -> Cow<'_, str> {
    if !GLOBAL_PREFIXES.iter().any(|prefix| word.contains(prefix)) {
        return Cow::Borrowed(word);
    }

    let bytes = word.as_bytes();
    let mut result = String::with_capacity(word.len());
    let mut index = 0;
    while index < word.len() {
        let is_boundary = index == 0 || {
            let prev = bytes[index - 1];
            !is_identifier_byte(prev) && prev != b'.'
        };

        if is_boundary {
            if let Some(prefix) = GLOBAL_PREFIXES.iter().find(|prefix| word[index..].starts_with(*prefix)) {
                result.push_str(&prefix[..prefix.len() - 1]);
                result.push('_');
                index += prefix.len();

                if *prefix == "gl." {
                    if let Some(c) = word[index..].chars().next() {
                        result.extend(c.to_uppercase());
                        index += c.len_utf8();
                    }
                }
                continue;
            }
        }

        let Some(c) = word[index..].chars().next() else {
            break;
        };
        result.push(c);
        index += c.len_utf8();
    }

    Cow::Owned(result)
}

#[cfg(test)]
pub(crate) mod test_utils {
    use super::*;
    use crate::context::FamilyData;

    /// 没有任何 stage 语法
    pub struct PlainStage;
    impl StageParser for PlainStage {
        fn is_active(&self) -> bool {
            false
        }

        fn on_word(&mut self, _: &mut FileData, _: &str, _: bool) -> Result<bool, CompileError> {
            Ok(false)
        }
    }

    /// 处理一段源码，返回输出（不含 preamble）
    pub fn transpile(
        family: &mut FamilyData,
        stage: ShaderStage,
        parser: &mut dyn StageParser,
        source: &str,
    ) -> Result<String, CompileError> {
        let mut file = FileData::new(family, stage);
        process_source(source, &mut file, parser)?;
        Ok(file.into_output())
    }

    pub fn transpile_plain(family: &mut FamilyData, source: &str) -> Result<String, CompileError> {
        transpile(family, ShaderStage::Compute, &mut PlainStage, source)
    }
}
