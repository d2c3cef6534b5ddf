//! 编译过程中的状态
//!
//! - `FamilyData`：同一个 shader family（同一个 shader path 下的所有 stage）共享的数据
//! - `FileData`：单个 stage 文件的数据，借用 family 的数据

use ash::vk;
use garden_gslh::{BlendState, PipelineState, SamplerStates, ShaderStage, SpecConsts, Uniforms};

use crate::error::CompileError;

/// 同一个 family 中所有 stage 共享的数据
pub struct FamilyData {
    pub uniforms: Uniforms,
    pub sampler_states: SamplerStates,
    pub spec_consts: SpecConsts,
    pub pipeline_state: PipelineState,
    pub blend_states: Vec<BlendState>,

    pub variant_count: u8,
    pub push_constants_size: u16,
    pub push_constants_stages: vk::ShaderStageFlags,

    /// 下一个 uniform 的 binding
    next_binding: u32,
    /// 下一个 spec const 的 constant id，0 保留给 `gsl_variant`
    next_spec_const: u32,
    pub max_push_constants_size: u16,
}
// new & init
impl FamilyData {
    pub fn new(max_push_constants_size: u16) -> Self {
        Self {
            uniforms: Uniforms::new(),
            sampler_states: SamplerStates::new(),
            spec_consts: SpecConsts::new(),
            pipeline_state: PipelineState::default(),
            blend_states: Vec::new(),
            variant_count: 1,
            push_constants_size: 0,
            push_constants_stages: vk::ShaderStageFlags::empty(),
            next_binding: 0,
            next_spec_const: 1,
            max_push_constants_size,
        }
    }
}
impl FamilyData {
    /// 分配下一个 binding，超过 256 个 uniform 时返回 None
    pub fn allocate_binding(&mut self) -> Option<u8> {
        let binding = u8::try_from(self.next_binding).ok()?;
        self.next_binding += 1;
        Some(binding)
    }

    /// 分配下一个 constant id，超过 255 个时返回 None
    pub fn allocate_spec_const(&mut self) -> Option<u8> {
        let index = u8::try_from(self.next_spec_const).ok()?;
        self.next_spec_const += 1;
        Some(index)
    }

    /// 访问 color attachment 的 blend state，不存在时按默认值扩展
    pub fn blend_state_mut(&mut self, attachment: usize) -> &mut BlendState {
        if self.blend_states.len() <= attachment {
            self.blend_states.resize(attachment + 1, BlendState::default());
        }
        &mut self.blend_states[attachment]
    }

    /// 合并一个 stage 文件的结果，variant count 和 push constants 大小必须一致
    pub fn merge_stage(&mut self, file: &FileResult) -> Result<(), CompileError> {
        if file.variant_count > 1 {
            if self.variant_count > 1 && self.variant_count != file.variant_count {
                return Err(CompileError::family("Different variant count between stages"));
            }
            self.variant_count = file.variant_count;
        }

        if file.push_constants_size > 0 {
            if self.push_constants_size > 0 && self.push_constants_size != file.push_constants_size {
                return Err(CompileError::family("Different push constants size between stages"));
            }
            self.push_constants_size = file.push_constants_size;
            self.push_constants_stages |= file.stage.vk_flag();
        }

        Ok(())
    }
}

/// 单个 stage 文件的编译状态
pub struct FileData<'a> {
    pub family: &'a mut FamilyData,
    pub stage: ShaderStage,

    /// 从 1 开始，每处理一行之前先加 1
    pub line_index: i32,
    pub is_skip_mode: bool,

    output: String,
    /// uniform block 的内容需要在名字确定之后才能输出，期间写入这里
    capture: Option<String>,

    pub variant_count: Option<u8>,
    pub push_constants_size: Option<u16>,
    /// 当前文件中 subpass input 的数量
    pub subpass_input_count: u32,
}
// new & init
impl<'a> FileData<'a> {
    pub fn new(family: &'a mut FamilyData, stage: ShaderStage) -> Self {
        Self {
            family,
            stage,
            line_index: 1,
            is_skip_mode: false,
            output: String::with_capacity(4096),
            capture: None,
            variant_count: None,
            push_constants_size: None,
            subpass_input_count: 0,
        }
    }
}
// output
impl FileData<'_> {
    #[inline]
    pub fn emit(&mut self, text: &str) {
        match &mut self.capture {
            Some(capture) => capture.push_str(text),
            None => self.output.push_str(text),
        }
    }

    /// 输出一个单词以及后面的空格
    #[inline]
    pub fn echo(&mut self, word: &str) {
        self.emit(word);
        self.emit(" ");
    }

    #[inline]
    pub fn begin_capture(&mut self) {
        self.capture = Some(String::new());
    }

    pub fn end_capture(&mut self) -> String {
        self.capture.take().unwrap_or_default()
    }

    pub fn into_output(self) -> String {
        self.output
    }

    #[cfg(test)]
    pub fn output(&self) -> &str {
        &self.output
    }
}
// error
impl FileData<'_> {
    #[inline]
    pub fn error(&self, message: impl Into<String>, word: &str) -> CompileError {
        CompileError::new(message, self.line_index, Some(word))
    }

    #[inline]
    pub fn error_no_word(&self, message: impl Into<String>) -> CompileError {
        CompileError::new(message, self.line_index, None)
    }

    /// 用于 family 合并的结果
    pub fn result(&self) -> FileResult {
        FileResult {
            stage: self.stage,
            variant_count: self.variant_count.unwrap_or(1),
            push_constants_size: self.push_constants_size.unwrap_or(0),
        }
    }
}

/// 单个文件中需要与其他 stage 比较的值
#[derive(Debug, Clone, Copy)]
pub struct FileResult {
    pub stage: ShaderStage,
    pub variant_count: u8,
    pub push_constants_size: u16,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binding_allocation_limit() {
        let mut family = FamilyData::new(128);
        for expected in 0..=255u8 {
            assert_eq!(family.allocate_binding(), Some(expected));
        }
        assert_eq!(family.allocate_binding(), None);
    }

    #[test]
    fn test_spec_const_allocation_starts_at_one() {
        let mut family = FamilyData::new(128);
        assert_eq!(family.allocate_spec_const(), Some(1));
        for _ in 2..=255 {
            assert!(family.allocate_spec_const().is_some());
        }
        assert_eq!(family.allocate_spec_const(), None);
    }

    #[test]
    fn test_merge_stage() {
        let mut family = FamilyData::new(128);
        let vertex = FileResult {
            stage: ShaderStage::Vertex,
            variant_count: 4,
            push_constants_size: 16,
        };
        family.merge_stage(&vertex).unwrap();

        let fragment = FileResult {
            stage: ShaderStage::Fragment,
            variant_count: 1,
            push_constants_size: 16,
        };
        family.merge_stage(&fragment).unwrap();
        assert_eq!(family.variant_count, 4);
        assert_eq!(
            family.push_constants_stages,
            vk::ShaderStageFlags::VERTEX | vk::ShaderStageFlags::FRAGMENT
        );

        let bad = FileResult {
            variant_count: 3,
            ..fragment
        };
        assert!(family.merge_stage(&bad).is_err());

        let bad = FileResult {
            push_constants_size: 32,
            ..fragment
        };
        assert!(family.merge_stage(&bad).is_err());
    }

    #[test]
    fn test_capture_redirects_output() {
        let mut family = FamilyData::new(128);
        let mut file = FileData::new(&mut family, ShaderStage::Compute);
        file.echo("a");
        file.begin_capture();
        file.echo("b");
        assert_eq!(file.end_capture(), "b ");
        file.emit("\n");
        assert_eq!(file.into_output(), "a \n");
    }
}
