//! 三种 pipeline 的完整数据：反射信息 + SPIR-V

use ash::vk;

use crate::error::GslhError;
use crate::header::{self, ByteReader, ByteWriter};
use crate::pipeline_state::{BlendState, PipelineState, VertexAttribute};
use crate::reflection::PipelineData;

/// graphics pipeline：vertex + fragment
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GraphicsData {
    pub pipeline: PipelineData,
    pub vertex_attributes: Vec<VertexAttribute>,
    /// 单个顶点的字节数
    pub vertex_attributes_size: u16,
    pub pipeline_state: PipelineState,
    /// 按 color attachment 索引
    pub blend_states: Vec<BlendState>,

    pub vertex_code: Option<Vec<u32>>,
    pub fragment_code: Option<Vec<u32>>,
}
impl GraphicsData {
    pub fn encode_header(&self) -> Result<Vec<u8>, GslhError> {
        let mut writer = ByteWriter::new(header::GRAPHICS_MAGIC);
        header::write_pipeline_prefix(&mut writer, &self.pipeline)?;
        writer.u16(self.vertex_attributes_size);
        writer.count("vertex attribute", self.vertex_attributes.len())?;
        writer.count("blend state", self.blend_states.len())?;
        writer.u32(self.pipeline.push_constants_stages.as_raw());
        header::write_pipeline_state(&mut writer, &self.pipeline_state);

        for attribute in &self.vertex_attributes {
            header::write_vertex_attribute(&mut writer, attribute);
        }
        for blend_state in &self.blend_states {
            header::write_blend_state(&mut writer, blend_state);
        }

        header::write_pipeline_maps(&mut writer, &self.pipeline)?;
        Ok(writer.finish())
    }

    /// 只解析头，SPIR-V 保持为空
    pub fn decode_header(bytes: &[u8]) -> Result<Self, GslhError> {
        let mut reader = ByteReader::new(bytes, header::GRAPHICS_MAGIC)?;
        let mut data = Self::default();

        let counts = header::read_pipeline_prefix(&mut reader, &mut data.pipeline)?;
        data.vertex_attributes_size = reader.u16()?;
        let vertex_attribute_count = reader.u8()?;
        let blend_state_count = reader.u8()?;
        data.pipeline.push_constants_stages = vk::ShaderStageFlags::from_raw(reader.u32()?);
        data.pipeline_state = header::read_pipeline_state(&mut reader)?;

        data.vertex_attributes = (0..vertex_attribute_count)
            .map(|_| header::read_vertex_attribute(&mut reader))
            .collect::<Result<_, _>>()?;
        data.blend_states =
            (0..blend_state_count).map(|_| header::read_blend_state(&mut reader)).collect::<Result<_, _>>()?;

        header::read_pipeline_maps(&mut reader, &counts, &mut data.pipeline)?;
        reader.finish()?;
        Ok(data)
    }

    /// 顶点输入的 binding 描述，没有顶点属性时为空
    pub fn vertex_binding(&self, binding: u32) -> Option<vk::VertexInputBindingDescription> {
        (!self.vertex_attributes.is_empty()).then(|| vk::VertexInputBindingDescription {
            binding,
            stride: self.vertex_attributes_size as u32,
            input_rate: vk::VertexInputRate::VERTEX,
        })
    }

    /// 所有顶点属性的 vulkan 描述，location 按类型占用的数量递增
    pub fn vertex_attribute_descs(&self, binding: u32) -> Vec<vk::VertexInputAttributeDescription> {
        let mut location = 0;
        let mut descs = Vec::with_capacity(self.vertex_attributes.len());
        for attribute in &self.vertex_attributes {
            descs.extend(attribute.to_vk(location, binding));
            location += attribute.data_type.location_count();
        }
        descs
    }
}

/// compute pipeline
#[derive(Debug, Clone, PartialEq)]
pub struct ComputeData {
    pub pipeline: PipelineData,
    pub local_size: glam::UVec3,
    pub code: Vec<u32>,
}
impl Default for ComputeData {
    fn default() -> Self {
        Self {
            pipeline: PipelineData::default(),
            local_size: glam::UVec3::ONE,
            code: Vec::new(),
        }
    }
}
impl ComputeData {
    pub fn encode_header(&self) -> Result<Vec<u8>, GslhError> {
        let mut writer = ByteWriter::new(header::COMPUTE_MAGIC);
        header::write_pipeline_prefix(&mut writer, &self.pipeline)?;
        writer.u32(self.local_size.x);
        writer.u32(self.local_size.y);
        writer.u32(self.local_size.z);
        header::write_pipeline_maps(&mut writer, &self.pipeline)?;
        Ok(writer.finish())
    }

    pub fn decode_header(bytes: &[u8]) -> Result<Self, GslhError> {
        let mut reader = ByteReader::new(bytes, header::COMPUTE_MAGIC)?;
        let mut data = Self::default();

        let counts = header::read_pipeline_prefix(&mut reader, &mut data.pipeline)?;
        data.local_size = glam::UVec3::new(reader.u32()?, reader.u32()?, reader.u32()?);
        if data.local_size.min_element() == 0 {
            return Err(GslhError::InvalidValue {
                field: "local size",
                value: 0,
            });
        }
        if data.pipeline.push_constants_size > 0 {
            data.pipeline.push_constants_stages = vk::ShaderStageFlags::COMPUTE;
        }

        header::read_pipeline_maps(&mut reader, &counts, &mut data.pipeline)?;
        reader.finish()?;
        Ok(data)
    }
}

/// 一个 hit group，每个 stage 都是可选的
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HitGroup {
    pub intersection_code: Option<Vec<u32>>,
    pub any_hit_code: Option<Vec<u32>>,
    pub closest_hit_code: Option<Vec<u32>>,
}
impl HitGroup {
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.intersection_code.is_none() && self.any_hit_code.is_none() && self.closest_hit_code.is_none()
    }
}

/// ray tracing pipeline，每类 shader 按 group 编号排列
#[derive(Debug, Clone, PartialEq)]
pub struct RayTracingData {
    pub pipeline: PipelineData,
    pub ray_recursion_depth: u8,

    pub ray_gen_groups: Vec<Vec<u32>>,
    pub miss_groups: Vec<Vec<u32>>,
    pub callable_groups: Vec<Vec<u32>>,
    pub hit_groups: Vec<HitGroup>,
}
impl Default for RayTracingData {
    fn default() -> Self {
        Self {
            pipeline: PipelineData::default(),
            ray_recursion_depth: 1,
            ray_gen_groups: Vec::new(),
            miss_groups: Vec::new(),
            callable_groups: Vec::new(),
            hit_groups: Vec::new(),
        }
    }
}
impl RayTracingData {
    pub fn encode_header(&self) -> Result<Vec<u8>, GslhError> {
        let mut writer = ByteWriter::new(header::RAY_TRACING_MAGIC);
        header::write_pipeline_prefix(&mut writer, &self.pipeline)?;
        writer.u32(self.pipeline.push_constants_stages.as_raw());
        writer.u8(self.ray_recursion_depth);
        header::write_pipeline_maps(&mut writer, &self.pipeline)?;
        Ok(writer.finish())
    }

    pub fn decode_header(bytes: &[u8]) -> Result<Self, GslhError> {
        let mut reader = ByteReader::new(bytes, header::RAY_TRACING_MAGIC)?;
        let mut data = Self::default();

        let counts = header::read_pipeline_prefix(&mut reader, &mut data.pipeline)?;
        data.pipeline.push_constants_stages = vk::ShaderStageFlags::from_raw(reader.u32()?);
        data.ray_recursion_depth = reader.u8()?;
        if data.ray_recursion_depth == 0 {
            return Err(GslhError::InvalidValue {
                field: "ray recursion depth",
                value: 0,
            });
        }

        header::read_pipeline_maps(&mut reader, &counts, &mut data.pipeline)?;
        reader.finish()?;
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reflection::{SamplerState, SpecConst, Uniform};
    use crate::types::{GslDataFormat, GslDataType, GslUniformType};

    fn sample_pipeline() -> PipelineData {
        let mut pipeline = PipelineData {
            descriptor_set_count: 2,
            variant_count: 3,
            push_constants_size: 64,
            push_constants_stages: vk::ShaderStageFlags::VERTEX | vk::ShaderStageFlags::FRAGMENT,
            ..Default::default()
        };
        pipeline.uniforms.insert(
            "albedo".to_string(),
            Uniform {
                uniform_type: GslUniformType::Sampler2D,
                shader_stages: vk::ShaderStageFlags::FRAGMENT,
                binding_index: 0,
                descriptor_set_index: 0,
                array_size: 1,
                read_access: true,
                write_access: false,
                is_mutable: false,
            },
        );
        pipeline.uniforms.insert(
            "instances".to_string(),
            Uniform {
                uniform_type: GslUniformType::StorageBuffer,
                shader_stages: vk::ShaderStageFlags::VERTEX,
                binding_index: 1,
                descriptor_set_index: 1,
                array_size: 0,
                read_access: true,
                write_access: true,
                is_mutable: true,
            },
        );
        pipeline.sampler_states.insert(
            "albedo".to_string(),
            SamplerState {
                filter_min: vk::Filter::LINEAR,
                filter_mag: vk::Filter::LINEAR,
                ..Default::default()
            },
        );
        pipeline.spec_consts.insert(
            "useShadows".to_string(),
            SpecConst {
                data_type: GslDataType::Bool,
                shader_stages: vk::ShaderStageFlags::FRAGMENT,
                index: 1,
            },
        );
        pipeline
    }

    #[test]
    fn test_graphics_header_round_trip() {
        let data = GraphicsData {
            pipeline: sample_pipeline(),
            vertex_attributes: vec![
                VertexAttribute {
                    data_type: GslDataType::Float3,
                    format: GslDataFormat::F32,
                    offset: 0,
                },
                VertexAttribute {
                    data_type: GslDataType::Float4,
                    format: GslDataFormat::U8,
                    offset: 12,
                },
            ],
            vertex_attributes_size: 16,
            pipeline_state: PipelineState {
                depth_testing: true,
                cull_face: vk::CullModeFlags::FRONT_AND_BACK,
                ..Default::default()
            },
            blend_states: vec![
                BlendState::default(),
                BlendState {
                    blending: true,
                    color_mask: vk::ColorComponentFlags::R | vk::ColorComponentFlags::A,
                    ..Default::default()
                },
            ],
            vertex_code: None,
            fragment_code: None,
        };

        let bytes = data.encode_header().unwrap();
        assert_eq!(&bytes[..4], b"GSLG");
        assert_eq!(GraphicsData::decode_header(&bytes).unwrap(), data);
    }

    #[test]
    fn test_compute_and_ray_tracing_round_trip() {
        let mut compute = ComputeData {
            pipeline: sample_pipeline(),
            local_size: glam::UVec3::new(8, 8, 1),
            code: Vec::new(),
        };
        compute.pipeline.push_constants_stages = vk::ShaderStageFlags::COMPUTE;
        let bytes = compute.encode_header().unwrap();
        assert_eq!(ComputeData::decode_header(&bytes).unwrap(), compute);

        let ray_tracing = RayTracingData {
            pipeline: sample_pipeline(),
            ray_recursion_depth: 4,
            ..Default::default()
        };
        let bytes = ray_tracing.encode_header().unwrap();
        assert_eq!(RayTracingData::decode_header(&bytes).unwrap(), ray_tracing);

        // 不同种类的头互相不能解析
        assert!(matches!(
            ComputeData::decode_header(&bytes),
            Err(GslhError::BadMagic { .. })
        ));
    }

    #[test]
    fn test_truncated_header() {
        let bytes = ComputeData::default().encode_header().unwrap();
        for len in 0..bytes.len() {
            assert!(ComputeData::decode_header(&bytes[..len]).is_err());
        }
    }

    #[test]
    fn test_duplicate_entry_rejected() {
        let mut data = ComputeData::default();
        data.pipeline.spec_consts.insert(
            "a".to_string(),
            SpecConst {
                data_type: GslDataType::Float,
                shader_stages: vk::ShaderStageFlags::COMPUTE,
                index: 1,
            },
        );
        data.pipeline.spec_consts.insert(
            "b".to_string(),
            SpecConst {
                data_type: GslDataType::Float,
                shader_stages: vk::ShaderStageFlags::COMPUTE,
                index: 2,
            },
        );
        let mut bytes = data.encode_header().unwrap();

        // 把第二个名字改成与第一个相同
        let second_name = bytes.len() - 6 - 1;
        assert_eq!(bytes[second_name], b'b');
        bytes[second_name] = b'a';

        assert!(matches!(
            ComputeData::decode_header(&bytes),
            Err(GslhError::Duplicate { kind: "spec const", .. })
        ));
    }

    #[test]
    fn test_vertex_attribute_descs() {
        let data = GraphicsData {
            vertex_attributes: vec![
                VertexAttribute {
                    data_type: GslDataType::Float3x3,
                    format: GslDataFormat::F32,
                    offset: 0,
                },
                VertexAttribute {
                    data_type: GslDataType::Float2,
                    format: GslDataFormat::F32,
                    offset: 36,
                },
            ],
            vertex_attributes_size: 44,
            ..Default::default()
        };

        let descs = data.vertex_attribute_descs(0);
        assert_eq!(descs.len(), 4);
        assert_eq!(descs[3].location, 3);
        assert_eq!(descs[3].offset, 36);
        assert_eq!(data.vertex_binding(0).unwrap().stride, 44);
    }
}
