//! 所有 stage 共有的语法：uniform、push constants、spec const、`#feature`、`#variantCount`

use crate::context::FileData;
use crate::directive::DirectiveParser;
use crate::error::CompileError;
use crate::push_constants::PushConstantsParser;
use crate::spec_const::SpecConstParser;
use crate::uniform::{UniformOutcome, UniformParser};

#[derive(Default)]
pub struct GenericParser {
    uniform: UniformParser,
    push_constants: PushConstantsParser,
    spec_const: SpecConstParser,
    directive: DirectiveParser,
}
impl GenericParser {
    pub fn is_active(&self) -> bool {
        self.uniform.is_active()
            || self.push_constants.is_active()
            || self.spec_const.is_active()
            || self.directive.is_active()
    }

    /// 交给当前活动的语法结构
    pub fn on_active_word(&mut self, file: &mut FileData, word: &str) -> Result<(), CompileError> {
        if self.uniform.is_active() {
            match self.uniform.on_word(file, word)? {
                UniformOutcome::Continue => {}
                UniformOutcome::PushConstants => self.push_constants.begin(file, word)?,
            }
        } else if self.push_constants.is_active() {
            self.push_constants.on_word(file, word)?;
        } else if self.spec_const.is_active() {
            self.spec_const.on_word(file, word)?;
        } else if self.directive.is_active() {
            self.directive.on_word(file, word)?;
        } else {
            unreachable!("no active construct for word: {word}");
        }
        Ok(())
    }

    /// 检查通用关键字，返回是否已处理
    pub fn on_keyword(&mut self, file: &mut FileData, word: &str) -> Result<bool, CompileError> {
        match word {
            "uniform" => self.uniform.begin(false),
            "buffer" => self.uniform.begin(true),
            "spec" => self.spec_const.begin(),
            "pushConstants" => return Err(file.error("pushConstants must be declared as uniform", word)),
            _ => return self.directive.on_keyword(file, word),
        }
        Ok(true)
    }
}
