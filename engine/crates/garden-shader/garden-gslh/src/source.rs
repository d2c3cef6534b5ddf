//! 运行时读取 shader 数据的来源：松散的 cache 目录或资源包

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::Context;

/// 按相对路径（如 `pbr/opaque.vert.spv`）读取 shader 数据
pub trait ShaderBlobSource {
    fn contains(&self, file_name: &str) -> bool;

    fn read(&self, file_name: &str) -> anyhow::Result<Vec<u8>>;
}

/// 编译结果所在的目录，通常是 `<cache>/shaders`
pub struct LooseShaderCache {
    root: PathBuf,
}
impl LooseShaderCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[inline]
    pub fn root(&self) -> &Path {
        &self.root
    }
}
impl ShaderBlobSource for LooseShaderCache {
    fn contains(&self, file_name: &str) -> bool {
        self.root.join(file_name).is_file()
    }

    fn read(&self, file_name: &str) -> anyhow::Result<Vec<u8>> {
        let path = self.root.join(file_name);
        std::fs::read(&path).with_context(|| format!("Failed to read shader file: {}", path.display()))
    }
}

/// 资源包的查询接口，只提供按 key 查找和读取
pub trait ResourcePack {
    fn get_item_index(&self, key: &str) -> Option<u64>;

    fn read_item_data(&self, index: u64) -> anyhow::Result<Vec<u8>>;
}

/// 资源包中 `shaders/` 前缀下的 shader 数据
pub struct PackedShaders<'a, P: ResourcePack + ?Sized> {
    pack: &'a P,
}
impl<'a, P: ResourcePack + ?Sized> PackedShaders<'a, P> {
    pub const KEY_PREFIX: &'static str = "shaders/";

    pub fn new(pack: &'a P) -> Self {
        Self { pack }
    }

    fn key(file_name: &str) -> String {
        format!("{}{file_name}", Self::KEY_PREFIX)
    }
}
impl<P: ResourcePack + ?Sized> ShaderBlobSource for PackedShaders<'_, P> {
    fn contains(&self, file_name: &str) -> bool {
        self.pack.get_item_index(&Self::key(file_name)).is_some()
    }

    fn read(&self, file_name: &str) -> anyhow::Result<Vec<u8>> {
        let key = Self::key(file_name);
        let index = self.pack.get_item_index(&key).with_context(|| format!("Resource pack has no item: {key}"))?;
        self.pack.read_item_data(index).with_context(|| format!("Failed to read pack item: {key}"))
    }
}

/// 内存中的资源包
#[derive(Default)]
pub struct MemoryPack {
    indices: HashMap<String, u64>,
    items: Vec<Vec<u8>>,
}
impl MemoryPack {
    pub fn new() -> Self {
        Self::default()
    }

    /// 插入或替换一个条目
    pub fn insert(&mut self, key: impl Into<String>, data: Vec<u8>) {
        let key = key.into();
        match self.indices.get(&key) {
            Some(&index) => self.items[index as usize] = data,
            None => {
                self.indices.insert(key, self.items.len() as u64);
                self.items.push(data);
            }
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
impl ResourcePack for MemoryPack {
    fn get_item_index(&self, key: &str) -> Option<u64> {
        self.indices.get(key).copied()
    }

    fn read_item_data(&self, index: u64) -> anyhow::Result<Vec<u8>> {
        self.items
            .get(index as usize)
            .cloned()
            .with_context(|| format!("Resource pack item index out of range: {index}"))
    }
}
