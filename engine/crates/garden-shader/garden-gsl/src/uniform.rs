//! uniform 与 buffer 声明
//!
//! ```text
//! uniform [setN] [qualifiers] sampler2D [{ filter = linear; ... }] name[N];
//! uniform [setN] [qualifiers] image2D : unormR8G8B8A8 name;
//! uniform [setN] subpassInput name;
//! uniform [setN] accelerationStructure name;
//! uniform [setN] [scalar] Type { ... } name;
//! buffer [setN] [qualifiers] Type { ... } name[];
//! buffer reference [scalar] Type { ... } rest
//! ```

use garden_gslh::{GslImageFormat, GslUniformType, SamplerState, Uniform};

use crate::context::FileData;
use crate::error::CompileError;
use crate::values;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
enum UniformState {
    #[default]
    Idle,
    Declaration,
    /// sampler 类型之后：`{` 或名字
    SamplerOpen,
    SamplerBlock,
    ImageColon,
    ImageFormat,
    Name,
    BlockOpen,
    BlockBody,
    BlockName,
}

/// sampler state 块中一条属性的解析进度
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
enum SamplerPropertyState {
    #[default]
    Name,
    Equals,
    Value,
}

#[derive(Debug, Default, Clone, Copy)]
struct Qualifiers {
    readonly: bool,
    writeonly: bool,
    mutable: bool,
    restrict: bool,
    volatile: bool,
    coherent: bool,
    scalar: bool,
    reference: bool,
}
impl Qualifiers {
    fn any(&self) -> bool {
        self.readonly
            || self.writeonly
            || self.mutable
            || self.restrict
            || self.volatile
            || self.coherent
            || self.scalar
            || self.reference
    }

    /// 输出到 GLSL 的内存限定符，每个后面带一个空格
    fn memory_qualifiers(&self) -> String {
        [
            (self.readonly, "readonly "),
            (self.writeonly, "writeonly "),
            (self.restrict, "restrict "),
            (self.volatile, "volatile "),
            (self.coherent, "coherent "),
        ]
        .into_iter()
        .filter_map(|(enabled, text)| enabled.then_some(text))
        .collect()
    }

    fn set(&mut self, word: &str) -> bool {
        let flag = match word {
            "readonly" => &mut self.readonly,
            "writeonly" => &mut self.writeonly,
            "mutable" => &mut self.mutable,
            "restrict" => &mut self.restrict,
            "volatile" => &mut self.volatile,
            "coherent" => &mut self.coherent,
            "scalar" => &mut self.scalar,
            "reference" => &mut self.reference,
            _ => return false,
        };
        *flag = true;
        true
    }
}

pub enum UniformOutcome {
    Continue,
    /// 声明的是 push constants，之后交给 push constants 的解析
    PushConstants,
}

#[derive(Default)]
pub struct UniformParser {
    state: UniformState,
    /// 由 `buffer` 关键字开始
    is_storage: bool,
    has_set: bool,
    descriptor_set_index: u8,
    qualifiers: Qualifiers,
    uniform_type: Option<GslUniformType>,
    image_format: Option<GslImageFormat>,
    struct_type: String,
    block_depth: u32,
    block_body: String,

    sampler_state: Option<SamplerState>,
    sampler_property_state: SamplerPropertyState,
    sampler_property: String,
}
impl UniformParser {
    #[inline]
    pub fn is_active(&self) -> bool {
        self.state != UniformState::Idle
    }

    pub fn begin(&mut self, is_storage: bool) {
        *self = Self {
            state: UniformState::Declaration,
            is_storage,
            ..Default::default()
        };
    }

    fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn on_word(&mut self, file: &mut FileData, word: &str) -> Result<UniformOutcome, CompileError> {
        match self.state {
            UniformState::Idle => unreachable!("uniform parser is not active"),
            UniformState::Declaration => return self.on_declaration(file, word),
            UniformState::SamplerOpen => {
                if word == "{" {
                    self.sampler_state = Some(SamplerState::default());
                    self.sampler_property_state = SamplerPropertyState::Name;
                    self.state = UniformState::SamplerBlock;
                } else {
                    self.on_name(file, word)?;
                }
            }
            UniformState::SamplerBlock => self.on_sampler_block(file, word)?,
            UniformState::ImageColon => {
                if word == ":" {
                    self.state = UniformState::ImageFormat;
                } else if let Some(format) = word.strip_prefix(':').filter(|format| !format.is_empty()) {
                    self.image_format = Some(Self::parse_image_format(file, format, word)?);
                    self.state = UniformState::Name;
                } else {
                    return Err(file.error("Expected ':' after image type", word));
                }
            }
            UniformState::ImageFormat => {
                self.image_format = Some(Self::parse_image_format(file, word, word)?);
                self.state = UniformState::Name;
            }
            UniformState::Name => self.on_name(file, word)?,
            UniformState::BlockOpen => {
                if word != "{" {
                    return Err(file.error("Expected '{' after uniform type", word));
                }
                file.begin_capture();
                self.block_depth = 0;
                self.state = UniformState::BlockBody;
            }
            UniformState::BlockBody => match word.strip_prefix('}').filter(|_| self.block_depth == 0) {
                Some(rest) => {
                    self.block_body = file.end_capture();
                    self.state = UniformState::BlockName;
                    if !rest.is_empty() {
                        self.on_block_name(file, rest)?;
                    }
                }
                None => {
                    let opens = word.matches('{').count() as u32;
                    let closes = word.matches('}').count() as u32;
                    self.block_depth = (self.block_depth + opens).saturating_sub(closes);
                    file.echo(word);
                }
            },
            UniformState::BlockName => self.on_block_name(file, word)?,
        }
        Ok(UniformOutcome::Continue)
    }

    /// `setN`，N 必须能放入一个字节的 descriptor set 数量（不含 255）
    fn parse_set(file: &FileData, word: &str) -> Result<Option<u8>, CompileError> {
        let Some(digits) = word.strip_prefix("set") else {
            return Ok(None);
        };
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Ok(None);
        }

        digits
            .parse::<u8>()
            .ok()
            .filter(|&index| index != u8::MAX)
            .map(Some)
            .ok_or_else(|| file.error("Invalid descriptor set index", word))
    }

    fn parse_image_format(file: &FileData, format: &str, word: &str) -> Result<GslImageFormat, CompileError> {
        GslImageFormat::from_gsl_name(format).ok_or_else(|| file.error("Invalid image format", word))
    }

    fn on_declaration(&mut self, file: &mut FileData, word: &str) -> Result<UniformOutcome, CompileError> {
        if let Some(index) = Self::parse_set(file, word)? {
            self.descriptor_set_index = index;
            self.has_set = true;
            return Ok(UniformOutcome::Continue);
        }
        if self.qualifiers.set(word) {
            return Ok(UniformOutcome::Continue);
        }

        if word == "pushConstants" {
            if self.is_storage || self.has_set || self.qualifiers.any() {
                return Err(file.error("Push constants can't have descriptor set or qualifiers", word));
            }
            self.reset();
            return Ok(UniformOutcome::PushConstants);
        }

        let resource_type = match word {
            "subpassInput" => Some(GslUniformType::SubpassInput),
            "accelerationStructure" => Some(GslUniformType::AccelerationStructure),
            _ => GslUniformType::from_gsl_name(word).filter(|t| t.is_sampler() || t.is_image()),
        };

        match resource_type {
            Some(uniform_type) => {
                if self.is_storage {
                    return Err(file.error("Invalid buffer type", word));
                }
                self.uniform_type = Some(uniform_type);
                self.state = if uniform_type.is_sampler() {
                    UniformState::SamplerOpen
                } else if uniform_type.is_image() {
                    UniformState::ImageColon
                } else {
                    UniformState::Name
                };
            }
            None => {
                self.uniform_type = Some(if self.is_storage {
                    GslUniformType::StorageBuffer
                } else {
                    GslUniformType::UniformBuffer
                });
                self.struct_type = word.to_string();
                self.state = UniformState::BlockOpen;
            }
        }
        Ok(UniformOutcome::Continue)
    }

    fn on_sampler_block(&mut self, file: &mut FileData, word: &str) -> Result<(), CompileError> {
        match self.sampler_property_state {
            SamplerPropertyState::Name => {
                if let Some(rest) = word.strip_prefix('}') {
                    self.state = UniformState::Name;
                    if !rest.is_empty() {
                        self.on_name(file, rest)?;
                    }
                    return Ok(());
                }
                self.sampler_property = word.to_string();
                self.sampler_property_state = SamplerPropertyState::Equals;
            }
            SamplerPropertyState::Equals => {
                if word != "=" {
                    return Err(file.error("Expected '=' after sampler state property", word));
                }
                self.sampler_property_state = SamplerPropertyState::Value;
            }
            SamplerPropertyState::Value => {
                let value =
                    values::strip_semicolon(word).ok_or_else(|| file.error("Expected ';' after sampler state value", word))?;
                let property = std::mem::take(&mut self.sampler_property);
                let state = self.sampler_state.get_or_insert_with(SamplerState::default);
                apply_sampler_property(state, &property, value).map_err(|err| match err {
                    PropertyError::UnknownProperty => file.error("Unknown sampler state property", &property),
                    PropertyError::InvalidValue => file.error("Invalid sampler state value", word),
                })?;

                file.emit(&format!("/* {property} = {value}; */ "));
                self.sampler_property_state = SamplerPropertyState::Name;
            }
        }
        Ok(())
    }

    /// `name;`、`name[N];`、`name[];`
    fn on_name(&mut self, file: &mut FileData, word: &str) -> Result<(), CompileError> {
        let (name, array_size) = values::strip_semicolon(word)
            .and_then(values::parse_array_name)
            .ok_or_else(|| file.error("Invalid uniform name", word))?;
        self.finalize(file, name, array_size, word)
    }

    fn on_block_name(&mut self, file: &mut FileData, word: &str) -> Result<(), CompileError> {
        if self.is_storage && self.qualifiers.reference {
            // buffer reference 只是类型声明，不注册为 uniform
            let layout = if self.qualifiers.scalar { "scalar" } else { "std430" };
            let text = format!(
                "layout(buffer_reference, {layout}) buffer {} {{ {}}} {word}",
                self.struct_type, self.block_body
            );
            file.echo(&text);
            self.reset();
            return Ok(());
        }
        self.on_name(file, word)
    }

    fn finalize(&mut self, file: &mut FileData, name: &str, array_size: u32, word: &str) -> Result<(), CompileError> {
        let Some(uniform_type) = self.uniform_type else {
            unreachable!("uniform type is set before the name");
        };
        let qualifiers = self.qualifiers;

        if qualifiers.mutable && !uniform_type.is_buffer() {
            return Err(file.error("Only buffers can be mutable", word));
        }
        let read_access = !qualifiers.writeonly;
        let write_access = !qualifiers.readonly && !uniform_type.is_read_only();
        if !read_access && !write_access {
            return Err(file.error("Uniform has no read or write access", word));
        }

        let uniform = Uniform {
            uniform_type,
            shader_stages: file.stage.vk_flag(),
            binding_index: 0,
            descriptor_set_index: self.descriptor_set_index,
            array_size,
            read_access,
            write_access,
            is_mutable: qualifiers.mutable,
        };
        let binding = register_uniform(file, name, uniform, word)?;

        if let Some(sampler_state) = self.sampler_state.take() {
            match file.family.sampler_states.get(name) {
                Some(existing) if *existing != sampler_state => {
                    return Err(file.error("Different sampler state", word));
                }
                Some(_) => {}
                None => {
                    file.family.sampler_states.insert(name.to_string(), sampler_state);
                }
            }
        }

        let text = self.declaration_text(file, binding, name, array_size);
        file.emit(&text);
        self.reset();
        Ok(())
    }

    fn declaration_text(&self, file: &mut FileData, binding: u8, name: &str, array_size: u32) -> String {
        let set = self.descriptor_set_index;
        let array = match array_size {
            1 => String::new(),
            0 => "[]".to_string(),
            size => format!("[{size}]"),
        };
        let qualifiers = self.qualifiers.memory_qualifiers();

        match self.uniform_type {
            Some(GslUniformType::SubpassInput) => {
                let index = file.subpass_input_count;
                file.subpass_input_count += 1;
                format!(
                    "layout(binding = {binding}, set = {set}, input_attachment_index = {index}) uniform subpassInput {name};"
                )
            }
            Some(GslUniformType::UniformBuffer) => {
                let layout = if self.qualifiers.scalar { "scalar" } else { "std140" };
                format!(
                    "layout(binding = {binding}, set = {set}, {layout}) uniform {} {{ {}}} {name}{array};",
                    self.struct_type, self.block_body
                )
            }
            Some(GslUniformType::StorageBuffer) => {
                let layout = if self.qualifiers.scalar { "scalar" } else { "std430" };
                format!(
                    "layout(binding = {binding}, set = {set}, {layout}) {qualifiers}buffer {} {{ {}}} {name}{array};",
                    self.struct_type, self.block_body
                )
            }
            Some(image) if image.is_image() => {
                let format = self.image_format.map(GslImageFormat::glsl_name).unwrap_or_default();
                format!(
                    "layout(binding = {binding}, set = {set}, {format}) uniform {qualifiers}{} {name}{array};",
                    image.glsl_name()
                )
            }
            Some(other) => {
                format!("layout(binding = {binding}, set = {set}) uniform {} {name}{array};", other.glsl_name())
            }
            None => unreachable!("uniform type is set before the name"),
        }
    }
}

/// 注册到 family 中，同名 uniform 必须一致，返回 binding
fn register_uniform(file: &mut FileData, name: &str, uniform: Uniform, word: &str) -> Result<u8, CompileError> {
    if let Some(existing) = file.family.uniforms.get(name) {
        let mismatch = if existing.uniform_type != uniform.uniform_type {
            Some("Different uniform type")
        } else if existing.descriptor_set_index != uniform.descriptor_set_index {
            Some("Different uniform descriptor set")
        } else if existing.array_size != uniform.array_size {
            Some("Different uniform array size")
        } else if existing.read_access != uniform.read_access || existing.write_access != uniform.write_access {
            Some("Different uniform access")
        } else if existing.is_mutable != uniform.is_mutable {
            Some("Different uniform mutability")
        } else {
            None
        };
        if let Some(message) = mismatch {
            return Err(file.error(message, word));
        }

        let binding = existing.binding_index;
        if let Some(existing) = file.family.uniforms.get_mut(name) {
            existing.shader_stages |= uniform.shader_stages;
        }
        return Ok(binding);
    }

    let binding = file.family.allocate_binding().ok_or_else(|| file.error("Too many uniforms", word))?;
    file.family.uniforms.insert(
        name.to_string(),
        Uniform {
            binding_index: binding,
            ..uniform
        },
    );
    Ok(binding)
}

enum PropertyError {
    UnknownProperty,
    InvalidValue,
}

fn apply_sampler_property(state: &mut SamplerState, property: &str, value: &str) -> Result<(), PropertyError> {
    use PropertyError::InvalidValue;

    match property {
        "filter" => {
            let (filter, mipmap) = values::parse_filter(value).ok_or(InvalidValue)?;
            state.filter_min = filter;
            state.filter_mag = filter;
            state.filter_mipmap = mipmap;
        }
        "filterMin" => state.filter_min = values::parse_filter(value).ok_or(InvalidValue)?.0,
        "filterMag" => state.filter_mag = values::parse_filter(value).ok_or(InvalidValue)?.0,
        "filterMipmap" => state.filter_mipmap = values::parse_filter(value).ok_or(InvalidValue)?.1,
        "borderColor" => state.border_color = values::parse_border_color(value).ok_or(InvalidValue)?,
        "addressMode" => {
            let mode = values::parse_address_mode(value).ok_or(InvalidValue)?;
            state.address_mode_x = mode;
            state.address_mode_y = mode;
            state.address_mode_z = mode;
        }
        "addressModeX" => state.address_mode_x = values::parse_address_mode(value).ok_or(InvalidValue)?,
        "addressModeY" => state.address_mode_y = values::parse_address_mode(value).ok_or(InvalidValue)?,
        "addressModeZ" => state.address_mode_z = values::parse_address_mode(value).ok_or(InvalidValue)?,
        "comparison" => state.comparison = values::parse_bool(value).ok_or(InvalidValue)?,
        "compareOperation" => state.compare_operation = values::parse_compare_op(value).ok_or(InvalidValue)?,
        "anisoFiltering" => state.aniso_filtering = values::parse_bool(value).ok_or(InvalidValue)?,
        "maxAnisotropy" => state.max_anisotropy = values::parse_float(value, false).ok_or(InvalidValue)?,
        "unnormCoords" => state.unnorm_coords = values::parse_bool(value).ok_or(InvalidValue)?,
        "mipLodBias" => state.mip_lod_bias = values::parse_float(value, false).ok_or(InvalidValue)?,
        "minLod" => state.min_lod = values::parse_float(value, false).ok_or(InvalidValue)?,
        "maxLod" => state.max_lod = values::parse_float(value, true).ok_or(InvalidValue)?,
        _ => return Err(PropertyError::UnknownProperty),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use ash::vk;
    use garden_gslh::ShaderStage;

    use crate::context::FamilyData;
    use crate::tokenizer::test_utils::{PlainStage, transpile, transpile_plain};

    #[test]
    fn test_sampler_declaration() {
        let mut family = FamilyData::new(128);
        let output = transpile_plain(&mut family, "uniform sampler2D albedo;").unwrap();
        assert_eq!(output, "layout(binding = 0, set = 0) uniform sampler2D albedo;\n");

        let albedo = &family.uniforms["albedo"];
        assert!(albedo.read_access);
        assert!(!albedo.write_access);
        assert_eq!(albedo.array_size, 1);
        assert!(family.sampler_states.is_empty());
    }

    #[test]
    fn test_sampler_state_block() {
        let mut family = FamilyData::new(128);
        let source = "uniform set1 sampler2D\n{\n  filter = linear;\n  addressModeY = repeat;\n  maxLod = inf;\n} shadowMap[4];";
        let output = transpile_plain(&mut family, source).unwrap();

        assert_eq!(output.lines().count(), 6);
        assert!(output.contains("/* filter = linear; */"));
        assert!(output.ends_with("layout(binding = 0, set = 1) uniform sampler2D shadowMap[4];\n"));

        let state = &family.sampler_states["shadowMap"];
        assert_eq!(state.filter_min, vk::Filter::LINEAR);
        assert_eq!(state.filter_mipmap, vk::SamplerMipmapMode::LINEAR);
        assert_eq!(state.address_mode_x, vk::SamplerAddressMode::CLAMP_TO_EDGE);
        assert_eq!(state.address_mode_y, vk::SamplerAddressMode::REPEAT);
        assert_eq!(state.max_lod, f32::INFINITY);
        assert_eq!(family.uniforms["shadowMap"].array_size, 4);
    }

    #[test]
    fn test_sampler_state_errors() {
        for (source, word) in [
            ("uniform sampler2D { blur = on; } a;", "blur"),
            ("uniform sampler2D { filter = cubic; } a;", "cubic;"),
            ("uniform sampler2D { filter linear; } a;", "linear;"),
            ("uniform sampler2D { filter = linear } a;", "linear"),
        ] {
            let mut family = FamilyData::new(128);
            let err = transpile_plain(&mut family, source).unwrap_err();
            assert_eq!(err.word.as_deref(), Some(word), "{source}");
        }
    }

    #[test]
    fn test_image_and_qualifiers() {
        let mut family = FamilyData::new(128);
        let output =
            transpile_plain(&mut family, "uniform set2 writeonly restrict image2D : unormR8G8B8A8 target;").unwrap();
        assert_eq!(
            output,
            "layout(binding = 0, set = 2, rgba8) uniform writeonly restrict image2D target;\n"
        );

        let target = &family.uniforms["target"];
        assert!(!target.read_access);
        assert!(target.write_access);

        let err = transpile_plain(&mut family, "uniform image2D : rgba8 other;").unwrap_err();
        assert_eq!(err.message, "Invalid image format");
    }

    #[test]
    fn test_buffers() {
        let mut family = FamilyData::new(128);
        let source = "uniform Globals { float4x4 mvp; } globals;\nbuffer readonly mutable scalar Instances { float4 data[]; } instances[];";
        let output = transpile_plain(&mut family, source).unwrap();
        let lines = output.lines().collect::<Vec<_>>();

        assert_eq!(
            lines[0],
            "layout(binding = 0, set = 0, std140) uniform Globals { float4x4 mvp; } globals;"
        );
        assert_eq!(
            lines[1],
            "layout(binding = 1, set = 0, scalar) readonly buffer Instances { float4 data[]; } instances[];"
        );

        let instances = &family.uniforms["instances"];
        assert!(instances.is_mutable);
        assert!(!instances.write_access);
        assert_eq!(instances.array_size, 0);
        assert!(!family.uniforms["globals"].write_access);
    }

    #[test]
    fn test_buffer_reference_not_registered() {
        let mut family = FamilyData::new(128);
        let output = transpile_plain(&mut family, "buffer reference Vertices { float3 positions[]; };").unwrap();
        assert_eq!(
            output,
            "layout(buffer_reference, std430) buffer Vertices { float3 positions[]; } ; \n"
        );
        assert!(family.uniforms.is_empty());
    }

    #[test]
    fn test_nested_braces_in_block() {
        let mut family = FamilyData::new(128);
        let err = transpile_plain(&mut family, "uniform Data { Light lights[2]; } }data;").unwrap_err();
        assert_eq!(err.message, "Invalid uniform name");

        let output = transpile_plain(&mut family, "uniform Data { float a; }data;").unwrap();
        assert!(output.contains("{ float a; } data;"));
    }

    #[test]
    fn test_subpass_and_acceleration_structure() {
        let mut family = FamilyData::new(128);
        let output = transpile_plain(
            &mut family,
            "uniform subpassInput gColor;\nuniform subpassInput gDepth;\nuniform set1 accelerationStructure tlas;",
        )
        .unwrap();
        let lines = output.lines().collect::<Vec<_>>();

        assert_eq!(
            lines[1],
            "layout(binding = 1, set = 0, input_attachment_index = 1) uniform subpassInput gDepth;"
        );
        assert_eq!(
            lines[2],
            "layout(binding = 2, set = 1) uniform accelerationStructureEXT tlas;"
        );
    }

    #[test]
    fn test_declaration_errors() {
        for (source, message) in [
            ("buffer sampler2D a;", "Invalid buffer type"),
            ("uniform mutable sampler2D a;", "Only buffers can be mutable"),
            ("uniform readonly writeonly image2D : uintR8 a;", "Uniform has no read or write access"),
            ("uniform set255 sampler2D a;", "Invalid descriptor set index"),
            ("uniform set1 pushConstants { float a; } pc;", "Push constants can't have descriptor set or qualifiers"),
            ("uniform sampler2D a", "Invalid uniform name"),
            ("uniform sampler2D a[0];", "Invalid uniform name"),
            ("uniform Globals float a;", "Expected '{' after uniform type"),
        ] {
            let mut family = FamilyData::new(128);
            let err = transpile_plain(&mut family, source).unwrap_err();
            assert_eq!(err.message, message, "{source}");
        }
    }

    #[test]
    fn test_settings_is_a_type_name() {
        let mut family = FamilyData::new(128);
        transpile_plain(&mut family, "uniform settings { float a; } cfg;").unwrap();
        assert_eq!(family.uniforms["cfg"].descriptor_set_index, 0);
    }

    #[test]
    fn test_merge_across_stages() {
        let mut family = FamilyData::new(128);
        transpile(&mut family, ShaderStage::Vertex, &mut PlainStage, "uniform set1 sampler2D a;\nuniform sampler2D b;")
            .unwrap();
        let output =
            transpile(&mut family, ShaderStage::Fragment, &mut PlainStage, "uniform sampler2D b;\nuniform set1 sampler2D a;")
                .unwrap();

        // 再次声明时复用 binding，顺序无关
        assert!(output.contains("layout(binding = 1, set = 0) uniform sampler2D b;"));
        assert!(output.contains("layout(binding = 0, set = 1) uniform sampler2D a;"));
        assert_eq!(family.uniforms.len(), 2);
        assert_eq!(
            family.uniforms["a"].shader_stages,
            vk::ShaderStageFlags::VERTEX | vk::ShaderStageFlags::FRAGMENT
        );

        // 重复合并保持不变
        let before = family.uniforms.clone();
        transpile(&mut family, ShaderStage::Fragment, &mut PlainStage, "uniform sampler2D b;").unwrap();
        assert_eq!(family.uniforms, before);
    }

    #[test]
    fn test_merge_mismatches() {
        for (second, message) in [
            ("uniform image2D : unormR8G8B8A8 tex;", "Different uniform type"),
            ("uniform set1 sampler2D tex;", "Different uniform descriptor set"),
            ("uniform sampler2D tex[2];", "Different uniform array size"),
        ] {
            let mut family = FamilyData::new(128);
            transpile(&mut family, ShaderStage::Vertex, &mut PlainStage, "uniform sampler2D tex;").unwrap();
            let err = transpile(&mut family, ShaderStage::Fragment, &mut PlainStage, second).unwrap_err();
            assert_eq!(err.message, message, "{second}");
        }

        let mut family = FamilyData::new(128);
        transpile_plain(&mut family, "buffer Data { float a; } data;").unwrap();
        let err = transpile_plain(&mut family, "buffer readonly Data { float a; } data;").unwrap_err();
        assert_eq!(err.message, "Different uniform access");
        let err = transpile_plain(&mut family, "buffer mutable Data { float a; } data;").unwrap_err();
        assert_eq!(err.message, "Different uniform mutability");
    }

    #[test]
    fn test_conflicting_sampler_state() {
        let mut family = FamilyData::new(128);
        transpile_plain(&mut family, "uniform sampler2D { filter = linear; } tex;").unwrap();
        transpile_plain(&mut family, "uniform sampler2D { filter = linear; } tex;").unwrap();
        let err = transpile_plain(&mut family, "uniform sampler2D { filter = nearest; } tex;").unwrap_err();
        assert_eq!(err.message, "Different sampler state");
    }
}
