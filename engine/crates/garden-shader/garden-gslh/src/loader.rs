//! 从 cache 目录或资源包中读取 GSLH 头以及对应的 SPIR-V

use std::io::Cursor;

use anyhow::Context;

use crate::data::{ComputeData, GraphicsData, HitGroup, RayTracingData};
use crate::source::ShaderBlobSource;
use crate::types::{ShaderStage, group_file_name};

/// 编号 group 的最大数量（不含 group 0）
pub const MAX_NUMBERED_GROUPS: u32 = 254;

#[inline]
pub fn header_file_name(shader_path: &str) -> String {
    format!("{shader_path}.gslh")
}

#[inline]
pub fn spirv_file_name(shader_path: &str, group: u32, stage: ShaderStage) -> String {
    format!("{}.spv", group_file_name(shader_path, group, stage))
}

fn read_header(source: &dyn ShaderBlobSource, shader_path: &str) -> anyhow::Result<Vec<u8>> {
    let file_name = header_file_name(shader_path);
    source.read(&file_name).with_context(|| format!("Failed to load shader header: {file_name}"))
}

/// 读取 SPIR-V 并转换为 u32 数组
fn read_spirv(source: &dyn ShaderBlobSource, file_name: &str) -> anyhow::Result<Vec<u32>> {
    let bytes = source.read(file_name)?;
    let code = ash::util::read_spv(&mut Cursor::new(bytes))
        .with_context(|| format!("Invalid SPIR-V file: {file_name}"))?;
    anyhow::ensure!(!code.is_empty(), "Empty SPIR-V file: {file_name}");
    Ok(code)
}

/// 文件存在时读取，不存在时返回 None
fn read_optional_spirv(
    source: &dyn ShaderBlobSource,
    shader_path: &str,
    group: u32,
    stage: ShaderStage,
) -> anyhow::Result<Option<Vec<u32>>> {
    let file_name = spirv_file_name(shader_path, group, stage);
    if !source.contains(&file_name) {
        return Ok(None);
    }
    read_spirv(source, &file_name).map(Some)
}

pub fn load_graphics_shaders(source: &dyn ShaderBlobSource, shader_path: &str) -> anyhow::Result<GraphicsData> {
    let header = read_header(source, shader_path)?;
    let mut data = GraphicsData::decode_header(&header)
        .with_context(|| format!("Invalid graphics shader header: {shader_path}"))?;

    data.vertex_code = read_optional_spirv(source, shader_path, 0, ShaderStage::Vertex)?;
    data.fragment_code = read_optional_spirv(source, shader_path, 0, ShaderStage::Fragment)?;
    anyhow::ensure!(
        data.vertex_code.is_some() || data.fragment_code.is_some(),
        "No vertex or fragment shader found: {shader_path}"
    );

    log::debug!("loaded graphics shaders: {shader_path}");
    Ok(data)
}

pub fn load_compute_shader(source: &dyn ShaderBlobSource, shader_path: &str) -> anyhow::Result<ComputeData> {
    let header = read_header(source, shader_path)?;
    let mut data = ComputeData::decode_header(&header)
        .with_context(|| format!("Invalid compute shader header: {shader_path}"))?;

    data.code = read_spirv(source, &spirv_file_name(shader_path, 0, ShaderStage::Compute))?;

    log::debug!("loaded compute shader: {shader_path}");
    Ok(data)
}

/// 读取某一类 shader 的所有 group，遇到第一个缺失的编号即停止
fn load_stage_groups(
    source: &dyn ShaderBlobSource,
    shader_path: &str,
    stage: ShaderStage,
) -> anyhow::Result<Vec<Vec<u32>>> {
    let mut groups = Vec::new();
    for group in 0..=MAX_NUMBERED_GROUPS {
        match read_optional_spirv(source, shader_path, group, stage)? {
            Some(code) => groups.push(code),
            None => break,
        }
    }
    Ok(groups)
}

fn load_hit_groups(source: &dyn ShaderBlobSource, shader_path: &str) -> anyhow::Result<Vec<HitGroup>> {
    let mut groups = Vec::new();
    for group in 0..=MAX_NUMBERED_GROUPS {
        let hit_group = HitGroup {
            intersection_code: read_optional_spirv(source, shader_path, group, ShaderStage::Intersection)?,
            any_hit_code: read_optional_spirv(source, shader_path, group, ShaderStage::AnyHit)?,
            closest_hit_code: read_optional_spirv(source, shader_path, group, ShaderStage::ClosestHit)?,
        };
        if hit_group.is_empty() {
            break;
        }
        groups.push(hit_group);
    }

    let first_group_is_valid = groups
        .first()
        .is_some_and(|first| first.any_hit_code.is_some() || first.closest_hit_code.is_some());
    anyhow::ensure!(
        first_group_is_valid,
        "First hit group has no any-hit or closest-hit shader: {shader_path}"
    );
    Ok(groups)
}

pub fn load_ray_tracing_shaders(
    source: &dyn ShaderBlobSource,
    shader_path: &str,
) -> anyhow::Result<RayTracingData> {
    let header = read_header(source, shader_path)?;
    let mut data = RayTracingData::decode_header(&header)
        .with_context(|| format!("Invalid ray tracing shader header: {shader_path}"))?;

    data.ray_gen_groups = load_stage_groups(source, shader_path, ShaderStage::RayGen)?;
    anyhow::ensure!(!data.ray_gen_groups.is_empty(), "No ray generation shader found: {shader_path}");
    data.miss_groups = load_stage_groups(source, shader_path, ShaderStage::Miss)?;
    data.callable_groups = load_stage_groups(source, shader_path, ShaderStage::Callable)?;
    data.hit_groups = load_hit_groups(source, shader_path)?;

    log::debug!(
        "loaded ray tracing shaders: {shader_path} (rgen: {}, miss: {}, call: {}, hit: {})",
        data.ray_gen_groups.len(),
        data.miss_groups.len(),
        data.callable_groups.len(),
        data.hit_groups.len()
    );
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{LooseShaderCache, MemoryPack, PackedShaders};

    const SPIRV_MAGIC: u32 = 0x0723_0203;

    fn spirv(marker: u32) -> Vec<u8> {
        [SPIRV_MAGIC, 0x0001_0600, marker].iter().flat_map(|word| word.to_ne_bytes()).collect()
    }

    fn put(pack: &mut MemoryPack, file_name: &str, data: Vec<u8>) {
        pack.insert(format!("shaders/{file_name}"), data);
    }

    #[test]
    fn test_ray_tracing_group_discovery() {
        garden_crate_tools::init_log::init_log();

        let mut pack = MemoryPack::new();
        put(&mut pack, "rt/scene.gslh", RayTracingData::default().encode_header().unwrap());
        put(&mut pack, "rt/scene.rgen.spv", spirv(1));
        put(&mut pack, "rt/scene.1.rgen.spv", spirv(2));
        put(&mut pack, "rt/scene.rmiss.spv", spirv(3));
        put(&mut pack, "rt/scene.1.rmiss.spv", spirv(4));
        // 编号不连续，group 3 不会被读取
        put(&mut pack, "rt/scene.3.rmiss.spv", spirv(5));
        put(&mut pack, "rt/scene.rchit.spv", spirv(6));

        let data = load_ray_tracing_shaders(&PackedShaders::new(&pack), "rt/scene").unwrap();
        assert_eq!(data.ray_gen_groups.len(), 2);
        assert_eq!(data.miss_groups.len(), 2);
        assert_eq!(data.miss_groups[1][2], 4);
        assert!(data.callable_groups.is_empty());
        assert_eq!(data.hit_groups.len(), 1);
        assert!(data.hit_groups[0].closest_hit_code.is_some());
        assert!(data.hit_groups[0].any_hit_code.is_none());
    }

    #[test]
    fn test_ray_tracing_requires_ray_gen() {
        let mut pack = MemoryPack::new();
        put(&mut pack, "rt/empty.gslh", RayTracingData::default().encode_header().unwrap());
        put(&mut pack, "rt/empty.rmiss.spv", spirv(1));

        let err = load_ray_tracing_shaders(&PackedShaders::new(&pack), "rt/empty").unwrap_err();
        assert!(err.to_string().contains("No ray generation shader"));
    }

    #[test]
    fn test_first_hit_group_needs_hit_shader() {
        let mut pack = MemoryPack::new();
        put(&mut pack, "rt/proc.gslh", RayTracingData::default().encode_header().unwrap());
        put(&mut pack, "rt/proc.rgen.spv", spirv(1));
        put(&mut pack, "rt/proc.rint.spv", spirv(2));

        assert!(load_ray_tracing_shaders(&PackedShaders::new(&pack), "rt/proc").is_err());
    }

    #[test]
    fn test_ray_tracing_without_hit_groups() {
        let mut pack = MemoryPack::new();
        put(&mut pack, "rt/sky.gslh", RayTracingData::default().encode_header().unwrap());
        put(&mut pack, "rt/sky.rgen.spv", spirv(1));
        put(&mut pack, "rt/sky.rmiss.spv", spirv(2));

        let err = load_ray_tracing_shaders(&PackedShaders::new(&pack), "rt/sky").unwrap_err();
        assert!(err.to_string().contains("First hit group has no any-hit or closest-hit shader"));
    }

    #[test]
    fn test_graphics_from_loose_cache() {
        let root = std::env::temp_dir().join(format!("garden-gslh-loader-{}", std::process::id()));
        std::fs::create_dir_all(root.join("ui")).unwrap();

        let header = GraphicsData::default().encode_header().unwrap();
        std::fs::write(root.join("ui/text.gslh"), header).unwrap();
        std::fs::write(root.join("ui/text.frag.spv"), spirv(9)).unwrap();

        let data = load_graphics_shaders(&LooseShaderCache::new(&root), "ui/text").unwrap();
        assert!(data.vertex_code.is_none());
        assert_eq!(data.fragment_code.unwrap()[0], SPIRV_MAGIC);

        // 头不存在
        assert!(load_graphics_shaders(&LooseShaderCache::new(&root), "ui/missing").is_err());

        std::fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn test_compute_rejects_wrong_header_kind() {
        let mut pack = MemoryPack::new();
        put(&mut pack, "blur.gslh", GraphicsData::default().encode_header().unwrap());
        put(&mut pack, "blur.comp.spv", spirv(1));

        let err = load_compute_shader(&PackedShaders::new(&pack), "blur").unwrap_err();
        assert!(format!("{err:#}").contains("Invalid GSLH magic"));
    }
}
