//! `spec const <type> <name> = <value>;`
//!
//! 输出为 `layout(constant_id = N) const <type> <name> = <value>;`，同名的 spec const 在 family 中共享 N。

use garden_gslh::{GslDataType, SpecConst};

use crate::context::FileData;
use crate::error::CompileError;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
enum SpecConstState {
    #[default]
    Idle,
    ExpectConst,
    ExpectType,
    ExpectName,
    ExpectEquals,
    ExpectValue,
}

#[derive(Default)]
pub struct SpecConstParser {
    state: SpecConstState,
    data_type: Option<GslDataType>,
}
impl SpecConstParser {
    #[inline]
    pub fn is_active(&self) -> bool {
        self.state != SpecConstState::Idle
    }

    pub fn begin(&mut self) {
        self.state = SpecConstState::ExpectConst;
        self.data_type = None;
    }

    pub fn on_word(&mut self, file: &mut FileData, word: &str) -> Result<(), CompileError> {
        match self.state {
            SpecConstState::Idle => unreachable!("spec const parser is not active"),
            SpecConstState::ExpectConst => {
                if word == "const" {
                    self.state = SpecConstState::ExpectType;
                } else {
                    // 普通的 `spec` 标识符
                    file.echo("spec");
                    file.echo(&crate::tokenizer::fix_global_names(word));
                    self.state = SpecConstState::Idle;
                }
            }
            SpecConstState::ExpectType => {
                let data_type = GslDataType::from_gsl_name(word)
                    .filter(|data_type| data_type.is_scalar())
                    .ok_or_else(|| file.error("Invalid spec const type", word))?;
                self.data_type = Some(data_type);
                self.state = SpecConstState::ExpectName;
            }
            SpecConstState::ExpectName => {
                let Some(data_type) = self.data_type else {
                    unreachable!("spec const type is set before the name");
                };
                let index = register_spec_const(file, word, data_type)?;
                file.emit(&format!("layout(constant_id = {index}) const {data_type} {word} "));
                self.state = SpecConstState::ExpectEquals;
            }
            SpecConstState::ExpectEquals => {
                if word != "=" {
                    return Err(file.error("Expected '=' after spec const name", word));
                }
                file.echo(word);
                self.state = SpecConstState::ExpectValue;
            }
            SpecConstState::ExpectValue => {
                file.echo(word);
                if word.ends_with(';') {
                    self.state = SpecConstState::Idle;
                }
            }
        }
        Ok(())
    }
}

fn register_spec_const(file: &mut FileData, name: &str, data_type: GslDataType) -> Result<u8, CompileError> {
    if name.len() > u8::MAX as usize {
        return Err(file.error("Spec const name is too long", name));
    }

    let stage = file.stage.vk_flag();
    if let Some(existing) = file.family.spec_consts.get_mut(name) {
        if existing.data_type != data_type {
            return Err(CompileError::new("Different spec const type", file.line_index, Some(name)));
        }
        existing.shader_stages |= stage;
        return Ok(existing.index);
    }

    let index = file.family.allocate_spec_const().ok_or_else(|| file.error("Too many spec consts", name))?;
    file.family.spec_consts.insert(
        name.to_string(),
        SpecConst {
            data_type,
            shader_stages: stage,
            index,
        },
    );
    Ok(index)
}
