use std::path::{Path, PathBuf};

/// 统一资源路径管理
///
/// 所有路径基于工作区根目录（通过 `CARGO_MANIFEST_DIR` 推导）。
/// 避免使用硬编码相对路径，确保在不同构建环境下路径一致。
///
/// # 使用示例
/// ```ignore
/// let include = GardenPath::shader_include_path();            // engine/shader/include
/// let source = GardenPath::resources_shaders_path();          // resources/shaders
/// let header = GardenPath::cache_shader_path("pbr/lighting.gslh"); // cache/shaders/pbr/lighting.gslh
/// ```
pub struct GardenPath {}
// 核心路径
impl GardenPath {
    /// 获取工作区根目录
    pub fn workspace_path() -> PathBuf {
        // engine/crates/garden-crate-tools -> workspace root
        let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
        manifest_dir.ancestors().nth(3).unwrap_or(manifest_dir).to_path_buf()
    }

    pub fn engine_path() -> PathBuf {
        Self::workspace_path().join("engine")
    }
}
// 资源与缓存
impl GardenPath {
    /// shader 源码根目录：`resources/shaders`
    pub fn resources_shaders_path() -> PathBuf {
        Self::workspace_path().join("resources").join("shaders")
    }

    /// 编译产物根目录：`cache/shaders`
    pub fn cache_shaders_path() -> PathBuf {
        Self::workspace_path().join("cache").join("shaders")
    }

    /// 获取 `cache/shaders/` 目录下的文件路径（`.spv` 与 `.gslh`）
    pub fn cache_shader_path(filename: &str) -> PathBuf {
        Self::cache_shaders_path().join(filename)
    }
}
// engine 目录下
impl GardenPath {
    pub fn shader_root_path() -> PathBuf {
        Self::engine_path().join("shader")
    }

    /// GSL 的 include 目录，包含 `types.gsl` 等公共头文件
    pub fn shader_include_path() -> PathBuf {
        Self::shader_root_path().join("include")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shader_include_path_contains_types() {
        let types = GardenPath::shader_include_path().join("types.gsl");
        assert!(types.is_file(), "missing {types:?}");
    }

    #[test]
    fn test_cache_shader_path() {
        let path = GardenPath::cache_shader_path("pbr/lighting.gslh");
        assert!(path.ends_with("cache/shaders/pbr/lighting.gslh"));
    }
}
