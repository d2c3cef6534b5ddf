use std::path::{Path, PathBuf};

use anyhow::Context;
use garden_crate_tools::resource::GardenPath;
use serde::{Deserialize, Serialize};

/// GSL 编译器的配置，可以从 TOML 文件加载，缺少的项使用默认值
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GslCompilerConfig {
    /// glslc 可执行文件，默认从 PATH 中查找
    pub glslc_path: PathBuf,

    /// 传给 glslc 的 `--target-env`
    pub target_env: String,

    /// 传给 glslc 的 `-I` 目录，需要包含 `types.gsl`
    pub include_paths: Vec<PathBuf>,

    /// push constants 的最大字节数
    pub max_push_constants_size: u16,

    /// 删除中间 GLSL 文件的重试次数
    pub delete_retry_count: u32,

    /// 每次重试之间的等待时间（毫秒）
    pub delete_retry_sleep_ms: u64,
}
impl Default for GslCompilerConfig {
    fn default() -> Self {
        Self {
            glslc_path: PathBuf::from("glslc"),
            target_env: "vulkan1.3".to_string(),
            include_paths: vec![GardenPath::shader_include_path()],
            max_push_constants_size: 128,
            delete_retry_count: 10,
            delete_retry_sleep_ms: 1,
        }
    }
}
impl GslCompilerConfig {
    /// 从 TOML 文件加载配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;
        Self::from_toml(&content).with_context(|| format!("Failed to parse config file: {:?}", path.as_ref()))
    }

    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        let config: Self = toml::from_str(content)?;
        anyhow::ensure!(!config.target_env.is_empty(), "target_env must not be empty");
        Ok(config)
    }

    pub fn to_toml(&self) -> anyhow::Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize compiler config")
    }
}
