//! 使用 glslc (来自 Vulkan SDK) 将转换后的 GLSL 编译为 SPIR-V

use std::path::{Path, PathBuf};

use itertools::Itertools;

use crate::config::GslCompilerConfig;
use crate::error::GslError;

/// GLSL -> SPIR-V 编译器
pub trait SpirvCompiler: Send + Sync {
    /// 编译 `glsl_path`，结果写入 `spirv_path`
    fn compile(&self, glsl_path: &Path, spirv_path: &Path) -> Result<(), GslError>;

    /// 根据 cmd 执行的结果，处理输出信息
    fn process_cmd_output(&self, output: &std::process::Output) {
        if !output.stdout.is_empty() {
            log::info!("stdout: {}", String::from_utf8_lossy(&output.stdout));
        }
        if !output.stderr.is_empty() {
            log::error!("stderr: {}", String::from_utf8_lossy(&output.stderr));
        }
    }
}

#[derive(Debug, Clone)]
pub struct GlslcCompiler {
    glslc_path: PathBuf,
    target_env: String,
    include_paths: Vec<PathBuf>,
}
impl GlslcCompiler {
    pub fn new(config: &GslCompilerConfig) -> Self {
        Self {
            glslc_path: config.glslc_path.clone(),
            target_env: config.target_env.clone(),
            include_paths: config.include_paths.clone(),
        }
    }

    /// `--target-env=<env> -c -O <glsl> -o <spv> [-I <path>]*`
    fn args(&self, glsl_path: &Path, spirv_path: &Path) -> Vec<String> {
        let mut args = vec![
            format!("--target-env={}", self.target_env),
            "-c".to_string(),
            "-O".to_string(),
            glsl_path.display().to_string(),
            "-o".to_string(),
            spirv_path.display().to_string(),
        ];
        for include_path in &self.include_paths {
            args.push("-I".to_string());
            args.push(include_path.display().to_string());
        }
        args
    }
}
impl SpirvCompiler for GlslcCompiler {
    fn compile(&self, glsl_path: &Path, spirv_path: &Path) -> Result<(), GslError> {
        let args = self.args(glsl_path, spirv_path);
        log::debug!("{} {}", self.glslc_path.display(), args.iter().join(" "));

        let output = std::process::Command::new(&self.glslc_path)
            .args(&args)
            .output()
            .map_err(|err| GslError::io(&self.glslc_path, err))?;
        self.process_cmd_output(&output);

        if !output.status.success() {
            return Err(GslError::Glslc(glsl_path.to_path_buf()));
        }
        Ok(())
    }
}

/// 删除文件，失败时等待后重试；重试耗尽只输出警告
pub fn remove_file_with_retry(path: &Path, retry_count: u32, sleep_ms: u64) {
    for _ in 0..=retry_count {
        match std::fs::remove_file(path) {
            Ok(()) => return,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return,
            Err(_) => std::thread::sleep(std::time::Duration::from_millis(sleep_ms)),
        }
    }
    log::warn!("Failed to delete intermediate file: {}", path.display());
}
