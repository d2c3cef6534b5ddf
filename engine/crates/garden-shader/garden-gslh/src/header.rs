//! GSLH 二进制头的逐字段读写
//!
//! 布局：`<magic 4B><version 4B><固定字段><各类型数组><uniforms><sampler states><spec consts>`，
//! 具名条目为 `<u8 名字长度><名字><值>`。多字节字段使用本机字节序，version 的最后一个字节记录字节序。

use ash::vk;

use crate::error::GslhError;
use crate::pipeline_state::{BlendState, PipelineState, VertexAttribute};
use crate::reflection::{PipelineData, SamplerState, SamplerStates, SpecConst, SpecConsts, Uniform, Uniforms};
use crate::types::{GslDataFormat, GslDataType, GslUniformType};

pub const GRAPHICS_MAGIC: [u8; 4] = *b"GSLG";
pub const COMPUTE_MAGIC: [u8; 4] = *b"GSLC";
pub const RAY_TRACING_MAGIC: [u8; 4] = *b"GSLR";

/// 1 表示小端，0 表示大端
pub const ENDIANNESS: u8 = if cfg!(target_endian = "little") { 1 } else { 0 };
pub const VERSION: [u8; 4] = [1, 0, 0, ENDIANNESS];

pub struct ByteWriter {
    data: Vec<u8>,
}
// new & init
impl ByteWriter {
    /// 写入 magic 和 version
    pub fn new(magic: [u8; 4]) -> Self {
        let mut data = Vec::with_capacity(256);
        data.extend_from_slice(&magic);
        data.extend_from_slice(&VERSION);
        Self { data }
    }
}
impl ByteWriter {
    #[inline]
    pub fn u8(&mut self, value: u8) {
        self.data.push(value);
    }

    #[inline]
    pub fn u16(&mut self, value: u16) {
        self.data.extend_from_slice(&value.to_ne_bytes());
    }

    #[inline]
    pub fn u32(&mut self, value: u32) {
        self.data.extend_from_slice(&value.to_ne_bytes());
    }

    #[inline]
    pub fn f32(&mut self, value: f32) {
        self.data.extend_from_slice(&value.to_ne_bytes());
    }

    #[inline]
    pub fn bool(&mut self, value: bool) {
        self.data.push(value as u8);
    }

    /// vulkan 枚举按一个字节存储
    #[inline]
    pub fn vk_enum(&mut self, raw: i32) {
        self.data.push(raw as u8);
    }

    /// 数量字段，超出一个字节时报错
    pub fn count(&mut self, kind: &'static str, count: usize) -> Result<(), GslhError> {
        let value = u8::try_from(count).map_err(|_| GslhError::CountOverflow { kind, count })?;
        self.u8(value);
        Ok(())
    }

    pub fn name(&mut self, name: &str) -> Result<(), GslhError> {
        let len = u8::try_from(name.len()).map_err(|_| GslhError::NameTooLong(name.to_string()))?;
        self.u8(len);
        self.data.extend_from_slice(name.as_bytes());
        Ok(())
    }

    pub fn finish(self) -> Vec<u8> {
        self.data
    }
}

pub struct ByteReader<'a> {
    data: &'a [u8],
    offset: usize,
}
// new & init
impl<'a> ByteReader<'a> {
    /// 校验 magic 和 version
    pub fn new(data: &'a [u8], magic: [u8; 4]) -> Result<Self, GslhError> {
        let mut reader = Self { data, offset: 0 };

        let found = reader.array4()?;
        if found != magic {
            return Err(GslhError::BadMagic { expected: magic, found });
        }
        let found = reader.array4()?;
        if found != VERSION {
            return Err(GslhError::BadVersion {
                expected: VERSION,
                found,
            });
        }

        Ok(reader)
    }
}
impl<'a> ByteReader<'a> {
    fn take<const N: usize>(&mut self) -> Result<[u8; N], GslhError> {
        let end = self.offset + N;
        let bytes = self.data.get(self.offset..end).ok_or(GslhError::Truncated {
            offset: self.offset,
            needed: N,
        })?;
        self.offset = end;

        let mut array = [0; N];
        array.copy_from_slice(bytes);
        Ok(array)
    }

    fn array4(&mut self) -> Result<[u8; 4], GslhError> {
        self.take::<4>()
    }

    #[inline]
    pub fn u8(&mut self) -> Result<u8, GslhError> {
        Ok(self.take::<1>()?[0])
    }

    #[inline]
    pub fn u16(&mut self) -> Result<u16, GslhError> {
        Ok(u16::from_ne_bytes(self.take()?))
    }

    #[inline]
    pub fn u32(&mut self) -> Result<u32, GslhError> {
        Ok(u32::from_ne_bytes(self.take()?))
    }

    #[inline]
    pub fn f32(&mut self) -> Result<f32, GslhError> {
        Ok(f32::from_ne_bytes(self.take()?))
    }

    /// 只接受 0 和 1
    pub fn bool(&mut self, field: &'static str) -> Result<bool, GslhError> {
        match self.u8()? {
            0 => Ok(false),
            1 => Ok(true),
            value => Err(GslhError::InvalidValue {
                field,
                value: value as u32,
            }),
        }
    }

    /// 读取一个字节的 vulkan 枚举，超出 `0..=max` 时报错
    pub fn vk_enum(&mut self, field: &'static str, max: u8) -> Result<i32, GslhError> {
        let value = self.u8()?;
        if value > max {
            return Err(GslhError::InvalidValue {
                field,
                value: value as u32,
            });
        }
        Ok(value as i32)
    }

    pub fn name(&mut self) -> Result<String, GslhError> {
        let len = self.u8()? as usize;
        let bytes = self.data.get(self.offset..self.offset + len).ok_or(GslhError::Truncated {
            offset: self.offset,
            needed: len,
        })?;
        self.offset += len;
        String::from_utf8(bytes.to_vec()).map_err(|_| GslhError::InvalidName)
    }

    /// 数据必须恰好读完
    pub fn finish(self) -> Result<(), GslhError> {
        let remaining = self.data.len() - self.offset;
        if remaining != 0 {
            return Err(GslhError::TrailingData(remaining));
        }
        Ok(())
    }
}

// 各枚举的最大合法值
const MAX_FILTER: u8 = 1;
const MAX_MIPMAP_MODE: u8 = 1;
const MAX_ADDRESS_MODE: u8 = 4;
const MAX_BORDER_COLOR: u8 = 5;
const MAX_COMPARE_OP: u8 = 7;
const MAX_TOPOLOGY: u8 = 10;
const MAX_POLYGON_MODE: u8 = 2;
const MAX_CULL_MODE: u8 = 3;
const MAX_FRONT_FACE: u8 = 1;
const MAX_BLEND_FACTOR: u8 = 18;
const MAX_BLEND_OP: u8 = 4;
const MAX_COLOR_MASK: u8 = 15;

/// 所有 pipeline 共有的前缀中的数量字段，具名 map 在头的末尾读取
pub struct PipelineCounts {
    uniform_count: u8,
    sampler_state_count: u8,
    spec_const_count: u8,
}

pub fn write_pipeline_prefix(writer: &mut ByteWriter, data: &PipelineData) -> Result<(), GslhError> {
    writer.count("uniform", data.uniforms.len())?;
    writer.count("sampler state", data.sampler_states.len())?;
    writer.u8(data.descriptor_set_count);
    writer.u8(data.variant_count);
    writer.u16(data.push_constants_size);
    writer.count("spec const", data.spec_consts.len())?;
    Ok(())
}

pub fn read_pipeline_prefix(
    reader: &mut ByteReader,
    data: &mut PipelineData,
) -> Result<PipelineCounts, GslhError> {
    let uniform_count = reader.u8()?;
    let sampler_state_count = reader.u8()?;

    data.descriptor_set_count = reader.u8()?;
    if data.descriptor_set_count == 0 {
        return Err(GslhError::InvalidValue {
            field: "descriptor set count",
            value: 0,
        });
    }
    data.variant_count = reader.u8()?;
    if data.variant_count == 0 {
        return Err(GslhError::InvalidValue {
            field: "variant count",
            value: 0,
        });
    }
    data.push_constants_size = reader.u16()?;
    let spec_const_count = reader.u8()?;

    Ok(PipelineCounts {
        uniform_count,
        sampler_state_count,
        spec_const_count,
    })
}

pub fn write_pipeline_maps(writer: &mut ByteWriter, data: &PipelineData) -> Result<(), GslhError> {
    for (name, uniform) in &data.uniforms {
        writer.name(name)?;
        write_uniform(writer, uniform);
    }
    for (name, sampler_state) in &data.sampler_states {
        writer.name(name)?;
        write_sampler_state(writer, sampler_state);
    }
    for (name, spec_const) in &data.spec_consts {
        writer.name(name)?;
        write_spec_const(writer, spec_const);
    }
    Ok(())
}

pub fn read_pipeline_maps(
    reader: &mut ByteReader,
    counts: &PipelineCounts,
    data: &mut PipelineData,
) -> Result<(), GslhError> {
    let mut uniforms = Uniforms::with_capacity(counts.uniform_count as usize);
    for _ in 0..counts.uniform_count {
        let name = reader.name()?;
        let uniform = read_uniform(reader)?;
        if uniforms.contains_key(&name) {
            return Err(GslhError::Duplicate { kind: "uniform", name });
        }
        uniforms.insert(name, uniform);
    }

    let mut sampler_states = SamplerStates::with_capacity(counts.sampler_state_count as usize);
    for _ in 0..counts.sampler_state_count {
        let name = reader.name()?;
        let sampler_state = read_sampler_state(reader)?;
        if sampler_states.contains_key(&name) {
            return Err(GslhError::Duplicate {
                kind: "sampler state",
                name,
            });
        }
        sampler_states.insert(name, sampler_state);
    }

    let mut spec_consts = SpecConsts::with_capacity(counts.spec_const_count as usize);
    for _ in 0..counts.spec_const_count {
        let name = reader.name()?;
        let spec_const = read_spec_const(reader)?;
        if spec_consts.contains_key(&name) {
            return Err(GslhError::Duplicate {
                kind: "spec const",
                name,
            });
        }
        spec_consts.insert(name, spec_const);
    }

    data.uniforms = uniforms;
    data.sampler_states = sampler_states;
    data.spec_consts = spec_consts;
    Ok(())
}

fn write_uniform(writer: &mut ByteWriter, uniform: &Uniform) {
    writer.u8(uniform.uniform_type.as_u8());
    writer.u32(uniform.shader_stages.as_raw());
    writer.u8(uniform.binding_index);
    writer.u8(uniform.descriptor_set_index);
    writer.u32(uniform.array_size);
    writer.bool(uniform.read_access);
    writer.bool(uniform.write_access);
    writer.bool(uniform.is_mutable);
}

fn read_uniform(reader: &mut ByteReader) -> Result<Uniform, GslhError> {
    let raw_type = reader.u8()?;
    let uniform_type = GslUniformType::from_u8(raw_type).ok_or(GslhError::InvalidValue {
        field: "uniform type",
        value: raw_type as u32,
    })?;

    Ok(Uniform {
        uniform_type,
        shader_stages: vk::ShaderStageFlags::from_raw(reader.u32()?),
        binding_index: reader.u8()?,
        descriptor_set_index: reader.u8()?,
        array_size: reader.u32()?,
        read_access: reader.bool("uniform read access")?,
        write_access: reader.bool("uniform write access")?,
        is_mutable: reader.bool("uniform mutability")?,
    })
}

fn write_sampler_state(writer: &mut ByteWriter, state: &SamplerState) {
    writer.vk_enum(state.filter_min.as_raw());
    writer.vk_enum(state.filter_mag.as_raw());
    writer.vk_enum(state.filter_mipmap.as_raw());
    writer.vk_enum(state.address_mode_x.as_raw());
    writer.vk_enum(state.address_mode_y.as_raw());
    writer.vk_enum(state.address_mode_z.as_raw());
    writer.vk_enum(state.border_color.as_raw());
    writer.bool(state.comparison);
    writer.vk_enum(state.compare_operation.as_raw());
    writer.bool(state.aniso_filtering);
    writer.bool(state.unnorm_coords);
    writer.f32(state.max_anisotropy);
    writer.f32(state.mip_lod_bias);
    writer.f32(state.min_lod);
    writer.f32(state.max_lod);
}

fn read_sampler_state(reader: &mut ByteReader) -> Result<SamplerState, GslhError> {
    Ok(SamplerState {
        filter_min: vk::Filter::from_raw(reader.vk_enum("filter", MAX_FILTER)?),
        filter_mag: vk::Filter::from_raw(reader.vk_enum("filter", MAX_FILTER)?),
        filter_mipmap: vk::SamplerMipmapMode::from_raw(reader.vk_enum("mipmap filter", MAX_MIPMAP_MODE)?),
        address_mode_x: vk::SamplerAddressMode::from_raw(reader.vk_enum("address mode", MAX_ADDRESS_MODE)?),
        address_mode_y: vk::SamplerAddressMode::from_raw(reader.vk_enum("address mode", MAX_ADDRESS_MODE)?),
        address_mode_z: vk::SamplerAddressMode::from_raw(reader.vk_enum("address mode", MAX_ADDRESS_MODE)?),
        border_color: vk::BorderColor::from_raw(reader.vk_enum("border color", MAX_BORDER_COLOR)?),
        comparison: reader.bool("comparison")?,
        compare_operation: vk::CompareOp::from_raw(reader.vk_enum("compare operation", MAX_COMPARE_OP)?),
        aniso_filtering: reader.bool("anisotropic filtering")?,
        unnorm_coords: reader.bool("unnormalized coordinates")?,
        max_anisotropy: reader.f32()?,
        mip_lod_bias: reader.f32()?,
        min_lod: reader.f32()?,
        max_lod: reader.f32()?,
    })
}

fn write_spec_const(writer: &mut ByteWriter, spec_const: &SpecConst) {
    writer.u8(spec_const.data_type.as_u8());
    writer.u32(spec_const.shader_stages.as_raw());
    writer.u8(spec_const.index);
}

fn read_spec_const(reader: &mut ByteReader) -> Result<SpecConst, GslhError> {
    Ok(SpecConst {
        data_type: read_data_type(reader)?,
        shader_stages: vk::ShaderStageFlags::from_raw(reader.u32()?),
        index: reader.u8()?,
    })
}

fn read_data_type(reader: &mut ByteReader) -> Result<GslDataType, GslhError> {
    let raw = reader.u8()?;
    GslDataType::from_u8(raw).ok_or(GslhError::InvalidValue {
        field: "data type",
        value: raw as u32,
    })
}

pub fn write_pipeline_state(writer: &mut ByteWriter, state: &PipelineState) {
    writer.vk_enum(state.topology.as_raw());
    writer.vk_enum(state.polygon.as_raw());
    writer.bool(state.discarding);
    writer.bool(state.depth_testing);
    writer.bool(state.depth_writing);
    writer.bool(state.depth_clamping);
    writer.bool(state.depth_biasing);
    writer.bool(state.stencil_testing);
    writer.bool(state.face_culling);
    writer.u8(state.cull_face.as_raw() as u8);
    writer.vk_enum(state.front_face.as_raw());
    writer.vk_enum(state.depth_compare.as_raw());
}

pub fn read_pipeline_state(reader: &mut ByteReader) -> Result<PipelineState, GslhError> {
    Ok(PipelineState {
        topology: vk::PrimitiveTopology::from_raw(reader.vk_enum("topology", MAX_TOPOLOGY)?),
        polygon: vk::PolygonMode::from_raw(reader.vk_enum("polygon mode", MAX_POLYGON_MODE)?),
        discarding: reader.bool("discarding")?,
        depth_testing: reader.bool("depth testing")?,
        depth_writing: reader.bool("depth writing")?,
        depth_clamping: reader.bool("depth clamping")?,
        depth_biasing: reader.bool("depth biasing")?,
        stencil_testing: reader.bool("stencil testing")?,
        face_culling: reader.bool("face culling")?,
        cull_face: vk::CullModeFlags::from_raw(reader.vk_enum("cull face", MAX_CULL_MODE)? as u32),
        front_face: vk::FrontFace::from_raw(reader.vk_enum("front face", MAX_FRONT_FACE)?),
        depth_compare: vk::CompareOp::from_raw(reader.vk_enum("depth compare", MAX_COMPARE_OP)?),
    })
}

pub fn write_vertex_attribute(writer: &mut ByteWriter, attribute: &VertexAttribute) {
    writer.u8(attribute.data_type.as_u8());
    writer.u8(attribute.format.as_u8());
    writer.u32(attribute.offset);
}

pub fn read_vertex_attribute(reader: &mut ByteReader) -> Result<VertexAttribute, GslhError> {
    let data_type = read_data_type(reader)?;
    let raw_format = reader.u8()?;
    let format = GslDataFormat::from_u8(raw_format).ok_or(GslhError::InvalidValue {
        field: "data format",
        value: raw_format as u32,
    })?;

    Ok(VertexAttribute {
        data_type,
        format,
        offset: reader.u32()?,
    })
}

pub fn write_blend_state(writer: &mut ByteWriter, state: &BlendState) {
    writer.u8(state.color_mask.as_raw() as u8);
    writer.bool(state.blending);
    writer.vk_enum(state.src_color_factor.as_raw());
    writer.vk_enum(state.dst_color_factor.as_raw());
    writer.vk_enum(state.src_alpha_factor.as_raw());
    writer.vk_enum(state.dst_alpha_factor.as_raw());
    writer.vk_enum(state.color_operation.as_raw());
    writer.vk_enum(state.alpha_operation.as_raw());
}

pub fn read_blend_state(reader: &mut ByteReader) -> Result<BlendState, GslhError> {
    Ok(BlendState {
        color_mask: vk::ColorComponentFlags::from_raw(reader.vk_enum("color mask", MAX_COLOR_MASK)? as u32),
        blending: reader.bool("blending")?,
        src_color_factor: vk::BlendFactor::from_raw(reader.vk_enum("blend factor", MAX_BLEND_FACTOR)?),
        dst_color_factor: vk::BlendFactor::from_raw(reader.vk_enum("blend factor", MAX_BLEND_FACTOR)?),
        src_alpha_factor: vk::BlendFactor::from_raw(reader.vk_enum("blend factor", MAX_BLEND_FACTOR)?),
        dst_alpha_factor: vk::BlendFactor::from_raw(reader.vk_enum("blend factor", MAX_BLEND_FACTOR)?),
        color_operation: vk::BlendOp::from_raw(reader.vk_enum("blend operation", MAX_BLEND_OP)?),
        alpha_operation: vk::BlendOp::from_raw(reader.vk_enum("blend operation", MAX_BLEND_OP)?),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_magic_and_version() {
        let bytes = ByteWriter::new(COMPUTE_MAGIC).finish();
        assert!(ByteReader::new(&bytes, COMPUTE_MAGIC).is_ok());
        assert!(matches!(
            ByteReader::new(&bytes, GRAPHICS_MAGIC),
            Err(GslhError::BadMagic { .. })
        ));

        let mut bad_version = bytes.clone();
        bad_version[7] ^= 1;
        assert!(matches!(
            ByteReader::new(&bad_version, COMPUTE_MAGIC),
            Err(GslhError::BadVersion { .. })
        ));

        assert!(matches!(
            ByteReader::new(&bytes[..6], COMPUTE_MAGIC),
            Err(GslhError::Truncated { offset: 4, needed: 4 })
        ));
    }

    #[test]
    fn test_strict_bool_and_enum_range() {
        let mut writer = ByteWriter::new(GRAPHICS_MAGIC);
        writer.u8(2);
        writer.u8(9);
        let bytes = writer.finish();

        let mut reader = ByteReader::new(&bytes, GRAPHICS_MAGIC).unwrap();
        assert!(matches!(
            reader.bool("blending"),
            Err(GslhError::InvalidValue { value: 2, .. })
        ));
        assert!(matches!(
            reader.vk_enum("compare operation", MAX_COMPARE_OP),
            Err(GslhError::InvalidValue { value: 9, .. })
        ));
    }

    #[test]
    fn test_name_limits() {
        let mut writer = ByteWriter::new(GRAPHICS_MAGIC);
        assert!(matches!(writer.name(&"x".repeat(256)), Err(GslhError::NameTooLong(_))));
        assert!(writer.name(&"x".repeat(255)).is_ok());
        assert!(matches!(
            writer.count("uniform", 256),
            Err(GslhError::CountOverflow { count: 256, .. })
        ));
    }

    #[test]
    fn test_trailing_data() {
        let mut writer = ByteWriter::new(GRAPHICS_MAGIC);
        writer.u16(7);
        let bytes = writer.finish();

        let mut reader = ByteReader::new(&bytes, GRAPHICS_MAGIC).unwrap();
        assert_eq!(reader.u8().unwrap(), 7u16.to_ne_bytes()[0]);
        assert!(matches!(reader.finish(), Err(GslhError::TrailingData(1))));
    }

    #[test]
    fn test_sampler_state_round_trip() {
        let state = SamplerState {
            filter_min: vk::Filter::LINEAR,
            address_mode_y: vk::SamplerAddressMode::MIRROR_CLAMP_TO_EDGE,
            border_color: vk::BorderColor::INT_OPAQUE_WHITE,
            comparison: true,
            compare_operation: vk::CompareOp::ALWAYS,
            max_anisotropy: 16.0,
            max_lod: f32::INFINITY,
            ..Default::default()
        };

        let mut writer = ByteWriter::new(GRAPHICS_MAGIC);
        write_sampler_state(&mut writer, &state);
        let bytes = writer.finish();

        let mut reader = ByteReader::new(&bytes, GRAPHICS_MAGIC).unwrap();
        assert_eq!(read_sampler_state(&mut reader).unwrap(), state);
        reader.finish().unwrap();
    }
}
