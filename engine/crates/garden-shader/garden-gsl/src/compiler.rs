//! 一个 shader family 的完整编译流程
//!
//! 1. 所有 stage 的 GSL 转换为 GLSL，同时收集反射数据
//! 2. 检查 stage 之间的一致性
//! 3. 调用 glslc 生成 SPIR-V，删除中间的 GLSL 文件
//! 4. 写出 `<output>/<path>.gslh`
//!
//! 同一个 `GslCompiler` 可以在多个线程中同时编译不同的 family。

use std::io::Cursor;
use std::path::{Path, PathBuf};

use garden_crate_tools::resource::GardenPath;
use garden_gslh::loader::{MAX_NUMBERED_GROUPS, header_file_name};
use garden_gslh::types::group_file_name;
use garden_gslh::{ComputeData, GraphicsData, HitGroup, PipelineData, RayTracingData, ShaderStage};

use crate::compute::ComputeParser;
use crate::config::GslCompilerConfig;
use crate::context::{FamilyData, FileData};
use crate::error::{CompileError, GslError};
use crate::glslc::{GlslcCompiler, SpirvCompiler, remove_file_with_retry};
use crate::graphics::GraphicsParser;
use crate::ray_tracing::RayTracingParser;
use crate::tokenizer::{StageParser, preamble, process_source};

/// 转换完成、等待 glslc 编译的 stage
struct TranspiledStage {
    stage: ShaderStage,
    group: u32,
    file_name: String,
    glsl: String,
}

pub struct GslCompiler {
    config: GslCompilerConfig,
    spirv_compiler: Box<dyn SpirvCompiler>,
}
// new & init
impl GslCompiler {
    pub fn new(config: GslCompilerConfig) -> Self {
        let spirv_compiler = Box::new(GlslcCompiler::new(&config));
        Self {
            config,
            spirv_compiler,
        }
    }

    /// 使用自定义的 SPIR-V 编译器
    pub fn with_spirv_compiler(config: GslCompilerConfig, spirv_compiler: Box<dyn SpirvCompiler>) -> Self {
        Self {
            config,
            spirv_compiler,
        }
    }
}
// getters
impl GslCompiler {
    #[inline]
    pub fn config(&self) -> &GslCompilerConfig {
        &self.config
    }
}
// compile
impl GslCompiler {
    /// 编译 `<input>/<path>.vert` 与 `<input>/<path>.frag`，两者都不存在时返回 None
    pub fn compile_graphics_shaders(
        &self,
        input_path: &Path,
        output_path: &Path,
        shader_path: &str,
    ) -> Result<Option<GraphicsData>, GslError> {
        let family_path = input_path.join(shader_path);
        let mut family = FamilyData::new(self.config.max_push_constants_size);

        let mut vertex_parser = GraphicsParser::new(ShaderStage::Vertex);
        let vertex = self.transpile_stage(&mut family, input_path, shader_path, 0, ShaderStage::Vertex, &mut vertex_parser)?;
        let mut fragment_parser = GraphicsParser::new(ShaderStage::Fragment);
        let fragment =
            self.transpile_stage(&mut family, input_path, shader_path, 0, ShaderStage::Fragment, &mut fragment_parser)?;

        if vertex.is_none() && fragment.is_none() {
            return Ok(None);
        }

        let family_error = |message: &str| GslError::compile(&family_path, CompileError::family(message));
        match (&vertex, &fragment) {
            (Some(_), Some(_)) => {
                if vertex_parser.output_location_count() != fragment_parser.input_location_count() {
                    return Err(family_error("Different vertex output and fragment input count"));
                }
            }
            (Some(_), None) if vertex_parser.output_location_count() > 0 => {
                return Err(family_error("Vertex shader has outputs but no fragment shader"));
            }
            (None, Some(_)) if fragment_parser.input_location_count() > 0 => {
                return Err(family_error("Fragment shader has inputs but no vertex shader"));
            }
            _ => {}
        }

        // 每个 color attachment 都需要一个 blend state
        let attachment_count = fragment_parser.output_location_count() as usize;
        if family.blend_states.len() < attachment_count {
            family.blend_states.resize(attachment_count, Default::default());
        }
        let pipeline = pipeline_data(&mut family).map_err(|err| GslError::compile(&family_path, err))?;

        let mut data = GraphicsData {
            pipeline,
            vertex_attributes: vertex_parser.vertex_attributes().to_vec(),
            vertex_attributes_size: vertex_parser.vertex_attributes_size(),
            pipeline_state: family.pipeline_state,
            blend_states: std::mem::take(&mut family.blend_states),
            vertex_code: None,
            fragment_code: None,
        };
        if let Some(vertex) = &vertex {
            data.vertex_code = Some(self.compile_stage(output_path, vertex)?);
        }
        if let Some(fragment) = &fragment {
            data.fragment_code = Some(self.compile_stage(output_path, fragment)?);
        }

        self.write_header(output_path, shader_path, &data.encode_header()?)?;
        log::info!(
            "compiled graphics shaders: {shader_path} (uniforms: {}, attributes: {}, attachments: {})",
            data.pipeline.uniforms.len(),
            data.vertex_attributes.len(),
            data.blend_states.len()
        );
        Ok(Some(data))
    }

    /// 编译 `<input>/<path>.comp`，不存在时返回 None
    pub fn compile_compute_shader(
        &self,
        input_path: &Path,
        output_path: &Path,
        shader_path: &str,
    ) -> Result<Option<ComputeData>, GslError> {
        let mut family = FamilyData::new(self.config.max_push_constants_size);
        let mut parser = ComputeParser::default();
        let Some(compute) =
            self.transpile_stage(&mut family, input_path, shader_path, 0, ShaderStage::Compute, &mut parser)?
        else {
            return Ok(None);
        };

        let source_path = input_path.join(&compute.file_name);
        let local_size = parser
            .local_size()
            .ok_or_else(|| GslError::compile(&source_path, CompileError::family("Compute shader has no localSize")))?;
        let pipeline = pipeline_data(&mut family).map_err(|err| GslError::compile(&source_path, err))?;

        let code = self.compile_stage(output_path, &compute)?;
        let data = ComputeData {
            pipeline,
            local_size,
            code,
        };

        self.write_header(output_path, shader_path, &data.encode_header()?)?;
        log::info!(
            "compiled compute shader: {shader_path} (local size: {}x{}x{})",
            local_size.x,
            local_size.y,
            local_size.z
        );
        Ok(Some(data))
    }

    /// 编译 `<input>/<path>[.N].<rgen|rmiss|rcall|rint|rahit|rchit>`，一个文件都没有时返回 None
    pub fn compile_ray_tracing_shaders(
        &self,
        input_path: &Path,
        output_path: &Path,
        shader_path: &str,
    ) -> Result<Option<RayTracingData>, GslError> {
        let family_path = input_path.join(shader_path);
        let mut family = FamilyData::new(self.config.max_push_constants_size);
        let mut ray_recursion_depth = None;
        let mut stages = Vec::new();

        let mut transpile = |family: &mut FamilyData, group: u32, stage: ShaderStage| -> Result<bool, GslError> {
            let mut parser = RayTracingParser::new(stage);
            let Some(transpiled) = self.transpile_stage(family, input_path, shader_path, group, stage, &mut parser)?
            else {
                return Ok(false);
            };

            if let Some(depth) = parser.ray_recursion_depth() {
                match ray_recursion_depth {
                    Some(existing) if existing != depth => {
                        return Err(GslError::compile(
                            input_path.join(&transpiled.file_name),
                            CompileError::family("Different ray recursion depth between stages"),
                        ));
                    }
                    _ => ray_recursion_depth = Some(depth),
                }
            }
            stages.push(transpiled);
            Ok(true)
        };

        for stage in [ShaderStage::RayGen, ShaderStage::Miss, ShaderStage::Callable] {
            for group in 0..=MAX_NUMBERED_GROUPS {
                if !transpile(&mut family, group, stage)? {
                    break;
                }
            }
        }
        for group in 0..=MAX_NUMBERED_GROUPS {
            let mut is_found = false;
            for stage in [ShaderStage::Intersection, ShaderStage::AnyHit, ShaderStage::ClosestHit] {
                is_found |= transpile(&mut family, group, stage)?;
            }
            if !is_found {
                break;
            }
        }

        if stages.is_empty() {
            return Ok(None);
        }

        let family_error = |message: &str| GslError::compile(&family_path, CompileError::family(message));
        if !stages.iter().any(|transpiled| transpiled.stage == ShaderStage::RayGen) {
            return Err(family_error("No ray generation shader"));
        }
        let first_hit_group_is_valid = stages.iter().any(|transpiled| {
            transpiled.group == 0 && matches!(transpiled.stage, ShaderStage::AnyHit | ShaderStage::ClosestHit)
        });
        if !first_hit_group_is_valid {
            return Err(family_error("First hit group has no any-hit or closest-hit shader"));
        }

        let pipeline = pipeline_data(&mut family).map_err(|err| GslError::compile(&family_path, err))?;
        let mut data = RayTracingData {
            pipeline,
            ray_recursion_depth: ray_recursion_depth.unwrap_or(1),
            ..Default::default()
        };

        for transpiled in &stages {
            let code = self.compile_stage(output_path, transpiled)?;
            let group = transpiled.group as usize;
            match transpiled.stage {
                ShaderStage::RayGen => data.ray_gen_groups.push(code),
                ShaderStage::Miss => data.miss_groups.push(code),
                ShaderStage::Callable => data.callable_groups.push(code),
                stage => {
                    if data.hit_groups.len() <= group {
                        data.hit_groups.resize_with(group + 1, HitGroup::default);
                    }
                    let hit_group = &mut data.hit_groups[group];
                    match stage {
                        ShaderStage::Intersection => hit_group.intersection_code = Some(code),
                        ShaderStage::AnyHit => hit_group.any_hit_code = Some(code),
                        ShaderStage::ClosestHit => hit_group.closest_hit_code = Some(code),
                        _ => unreachable!("not a ray tracing stage: {stage:?}"),
                    }
                }
            }
        }

        self.write_header(output_path, shader_path, &data.encode_header()?)?;
        log::info!(
            "compiled ray tracing shaders: {shader_path} (rgen: {}, miss: {}, call: {}, hit: {})",
            data.ray_gen_groups.len(),
            data.miss_groups.len(),
            data.callable_groups.len(),
            data.hit_groups.len()
        );
        Ok(Some(data))
    }
}
// stage
impl GslCompiler {
    /// 读取并转换一个 stage 文件，结果合并到 family 中；文件不存在时返回 None
    fn transpile_stage(
        &self,
        family: &mut FamilyData,
        input_path: &Path,
        shader_path: &str,
        group: u32,
        stage: ShaderStage,
        parser: &mut dyn StageParser,
    ) -> Result<Option<TranspiledStage>, GslError> {
        let file_name = group_file_name(shader_path, group, stage);
        let source_path = input_path.join(&file_name);
        if !source_path.is_file() {
            return Ok(None);
        }
        let source = std::fs::read_to_string(&source_path).map_err(|err| GslError::io(&source_path, err))?;

        let mut file = FileData::new(family, stage);
        process_source(&source, &mut file, parser).map_err(|err| GslError::compile(&source_path, err))?;
        let result = file.result();
        let glsl = preamble(stage) + &file.into_output();
        family.merge_stage(&result).map_err(|err| GslError::compile(&source_path, err))?;

        log::debug!("transpiled {}", source_path.display());
        Ok(Some(TranspiledStage {
            stage,
            group,
            file_name,
            glsl,
        }))
    }

    /// 写出 GLSL 并编译为 SPIR-V，编译成功后删除 GLSL
    fn compile_stage(&self, output_path: &Path, transpiled: &TranspiledStage) -> Result<Vec<u32>, GslError> {
        let glsl_path = output_path.join(&transpiled.file_name);
        let spirv_path = output_path.join(format!("{}.spv", transpiled.file_name));
        create_parent_dir(&glsl_path)?;
        std::fs::write(&glsl_path, &transpiled.glsl).map_err(|err| GslError::io(&glsl_path, err))?;

        // 失败时保留 GLSL，方便对照 glslc 的报错
        self.spirv_compiler.compile(&glsl_path, &spirv_path)?;
        remove_file_with_retry(&glsl_path, self.config.delete_retry_count, self.config.delete_retry_sleep_ms);

        let bytes = std::fs::read(&spirv_path).map_err(|err| GslError::io(&spirv_path, err))?;
        let code = ash::util::read_spv(&mut Cursor::new(bytes)).map_err(|err| GslError::io(&spirv_path, err))?;
        if code.is_empty() {
            return Err(GslError::io(
                &spirv_path,
                std::io::Error::new(std::io::ErrorKind::InvalidData, "empty SPIR-V file"),
            ));
        }
        Ok(code)
    }

    fn write_header(&self, output_path: &Path, shader_path: &str, header: &[u8]) -> Result<(), GslError> {
        let header_path = output_path.join(header_file_name(shader_path));
        create_parent_dir(&header_path)?;
        std::fs::write(&header_path, header).map_err(|err| GslError::io(&header_path, err))
    }
}

fn create_parent_dir(path: &Path) -> Result<(), GslError> {
    match path.parent() {
        Some(parent) => std::fs::create_dir_all(parent).map_err(|err| GslError::io(parent, err)),
        None => Ok(()),
    }
}

/// 取出 family 中的反射数据
fn pipeline_data(family: &mut FamilyData) -> Result<PipelineData, CompileError> {
    let descriptor_set_count = PipelineData::descriptor_set_count_of(&family.uniforms)
        .ok_or_else(|| CompileError::family("Too many descriptor sets"))?;
    Ok(PipelineData {
        uniforms: std::mem::take(&mut family.uniforms),
        sampler_states: std::mem::take(&mut family.sampler_states),
        spec_consts: std::mem::take(&mut family.spec_consts),
        descriptor_set_count,
        variant_count: family.variant_count,
        push_constants_size: family.push_constants_size,
        push_constants_stages: family.push_constants_stages,
    })
}

/// GSL 源码的默认目录：`resources/shaders`
pub fn default_input_path() -> PathBuf {
    GardenPath::resources_shaders_path()
}

/// 编译产物的默认目录：`cache/shaders`，也是运行时 `LooseShaderCache` 的根目录
pub fn default_output_path() -> PathBuf {
    GardenPath::cache_shaders_path()
}
