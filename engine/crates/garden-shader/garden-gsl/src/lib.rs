//! GSL 编译器
//!
//! GSL 是在 GLSL 之上扩展的着色语言：uniform 不需要手写 binding，sampler state、pipeline state
//! 直接写在 shader 中，vertex 属性、push constants 等信息在编译时提取为 GSLH 反射头。
//!
//! 编译是逐行、逐单词的单遍状态机，不构建语法树：
//! - `tokenizer`：拆分单词、处理注释、分派
//! - `generic`：所有 stage 共有的 uniform、push constants、spec const、指令
//! - `graphics`、`compute`、`ray_tracing`：各个 stage 专有的语法
//! - `compiler`：一个 shader family 的完整流程，输出 SPIR-V 与 GSLH

pub mod compiler;
pub mod compute;
pub mod config;
pub mod context;
pub mod directive;
pub mod error;
pub mod generic;
pub mod glslc;
pub mod graphics;
pub mod pipeline_state;
pub mod push_constants;
pub mod ray_tracing;
pub mod spec_const;
pub mod tokenizer;
pub mod uniform;
pub mod values;

pub use compiler::{GslCompiler, default_input_path, default_output_path};
pub use config::GslCompilerConfig;
pub use error::{CompileError, GslError};
pub use glslc::{GlslcCompiler, SpirvCompiler};
