//! compute stage 的语法：`localSize = X, Y, Z;`

use crate::context::FileData;
use crate::error::CompileError;
use crate::tokenizer::StageParser;

#[derive(Default)]
pub struct ComputeParser {
    /// 正在收集 `localSize` 之后的单词
    is_collecting: bool,
    collected: String,
    local_size: Option<glam::UVec3>,
}
impl ComputeParser {
    #[inline]
    pub fn local_size(&self) -> Option<glam::UVec3> {
        self.local_size
    }

    fn finish(&mut self, file: &mut FileData) -> Result<(), CompileError> {
        let text = std::mem::take(&mut self.collected);
        let local_size =
            parse_local_size(&text).ok_or_else(|| file.error("Invalid local size", &format!("localSize {text}")))?;

        file.emit(&format!(
            "layout(local_size_x = {}, local_size_y = {}, local_size_z = {}) in; ",
            local_size.x, local_size.y, local_size.z
        ));
        self.local_size = Some(local_size);
        self.is_collecting = false;
        Ok(())
    }
}
impl StageParser for ComputeParser {
    fn is_active(&self) -> bool {
        self.is_collecting
    }

    fn on_word(&mut self, file: &mut FileData, word: &str, _is_first_word: bool) -> Result<bool, CompileError> {
        if self.is_collecting {
            self.collected.push_str(word);
            if word.ends_with(';') {
                self.finish(file)?;
            }
            return Ok(true);
        }

        if word == "localSize" {
            if self.local_size.is_some() {
                return Err(file.error("Local size is already declared", word));
            }
            self.is_collecting = true;
            return Ok(true);
        }
        Ok(false)
    }
}

/// `=X,Y,Z;`（单词之间的空白已去掉），每个分量都必须大于 0
fn parse_local_size(text: &str) -> Option<glam::UVec3> {
    let values = text.strip_prefix('=')?.strip_suffix(';')?;
    let mut values = values.split(',').map(|value| value.parse::<u32>().ok().filter(|&value| value > 0));

    let x = values.next()??;
    let y = values.next()??;
    let z = values.next()??;
    if values.next().is_some() {
        return None;
    }
    Some(glam::UVec3::new(x, y, z))
}
