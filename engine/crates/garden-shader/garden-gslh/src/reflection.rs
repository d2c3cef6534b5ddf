//! 从 GSL 源码中提取的反射数据：uniform、sampler state、spec const

use ash::vk;
use indexmap::IndexMap;

use crate::types::{GslDataType, GslUniformType};

/// uniform 名字 -> uniform，保持首次出现的顺序
pub type Uniforms = IndexMap<String, Uniform>;
/// uniform 名字 -> sampler state
pub type SamplerStates = IndexMap<String, SamplerState>;
/// spec const 名字 -> spec const
pub type SpecConsts = IndexMap<String, SpecConst>;

/// 一个 shader 可见的资源绑定
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Uniform {
    pub uniform_type: GslUniformType,
    /// 所有声明了该 uniform 的 stage
    pub shader_stages: vk::ShaderStageFlags,
    pub binding_index: u8,
    pub descriptor_set_index: u8,
    /// 1 表示单个资源，0 表示不定长（bindless），N 表示定长数组
    pub array_size: u32,
    pub read_access: bool,
    pub write_access: bool,
    /// 只对 buffer 有效
    pub is_mutable: bool,
}

/// sampler 的配置
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplerState {
    pub filter_min: vk::Filter,
    pub filter_mag: vk::Filter,
    pub filter_mipmap: vk::SamplerMipmapMode,
    pub address_mode_x: vk::SamplerAddressMode,
    pub address_mode_y: vk::SamplerAddressMode,
    pub address_mode_z: vk::SamplerAddressMode,
    pub border_color: vk::BorderColor,
    pub comparison: bool,
    pub compare_operation: vk::CompareOp,
    pub aniso_filtering: bool,
    pub unnorm_coords: bool,
    pub max_anisotropy: f32,
    pub mip_lod_bias: f32,
    pub min_lod: f32,
    pub max_lod: f32,
}
impl Default for SamplerState {
    fn default() -> Self {
        Self {
            filter_min: vk::Filter::NEAREST,
            filter_mag: vk::Filter::NEAREST,
            filter_mipmap: vk::SamplerMipmapMode::NEAREST,
            address_mode_x: vk::SamplerAddressMode::CLAMP_TO_EDGE,
            address_mode_y: vk::SamplerAddressMode::CLAMP_TO_EDGE,
            address_mode_z: vk::SamplerAddressMode::CLAMP_TO_EDGE,
            border_color: vk::BorderColor::FLOAT_TRANSPARENT_BLACK,
            comparison: false,
            compare_operation: vk::CompareOp::LESS,
            aniso_filtering: false,
            unnorm_coords: false,
            max_anisotropy: 1.0,
            mip_lod_bias: 0.0,
            min_lod: 0.0,
            max_lod: vk::LOD_CLAMP_NONE,
        }
    }
}
impl SamplerState {
    /// 转换为 vulkan 的 sampler 创建信息
    pub fn to_vk_create_info(&self) -> vk::SamplerCreateInfo<'static> {
        vk::SamplerCreateInfo::default()
            .min_filter(self.filter_min)
            .mag_filter(self.filter_mag)
            .mipmap_mode(self.filter_mipmap)
            .address_mode_u(self.address_mode_x)
            .address_mode_v(self.address_mode_y)
            .address_mode_w(self.address_mode_z)
            .border_color(self.border_color)
            .compare_enable(self.comparison)
            .compare_op(self.compare_operation)
            .anisotropy_enable(self.aniso_filtering)
            .max_anisotropy(self.max_anisotropy)
            .unnormalized_coordinates(self.unnorm_coords)
            .mip_lod_bias(self.mip_lod_bias)
            .min_lod(self.min_lod)
            .max_lod(self.max_lod)
    }
}

/// specialization constant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpecConst {
    pub data_type: GslDataType,
    pub shader_stages: vk::ShaderStageFlags,
    /// 从 1 开始，0 保留给 `gsl_variant`
    pub index: u8,
}

/// 所有 pipeline 类型共有的反射数据
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineData {
    pub uniforms: Uniforms,
    pub sampler_states: SamplerStates,
    pub spec_consts: SpecConsts,
    pub descriptor_set_count: u8,
    pub variant_count: u8,
    pub push_constants_size: u16,
    pub push_constants_stages: vk::ShaderStageFlags,
}
impl Default for PipelineData {
    fn default() -> Self {
        Self {
            uniforms: Uniforms::new(),
            sampler_states: SamplerStates::new(),
            spec_consts: SpecConsts::new(),
            descriptor_set_count: 1,
            variant_count: 1,
            push_constants_size: 0,
            push_constants_stages: vk::ShaderStageFlags::empty(),
        }
    }
}
impl PipelineData {
    /// `1 + max(descriptor_set_index)`，没有 uniform 时为 1
    ///
    /// 超出 u8 范围时返回 None
    pub fn descriptor_set_count_of(uniforms: &Uniforms) -> Option<u8> {
        let max_index = uniforms.values().map(|uniform| uniform.descriptor_set_index).max().unwrap_or(0);
        max_index.checked_add(1)
    }

    /// 属于指定 descriptor set 的 uniform，按 binding 排序
    pub fn set_uniforms(&self, descriptor_set_index: u8) -> Vec<(&str, &Uniform)> {
        let mut uniforms = self
            .uniforms
            .iter()
            .filter(|(_, uniform)| uniform.descriptor_set_index == descriptor_set_index)
            .map(|(name, uniform)| (name.as_str(), uniform))
            .collect::<Vec<_>>();
        uniforms.sort_by_key(|(_, uniform)| uniform.binding_index);
        uniforms
    }

    pub fn push_constant_range(&self) -> Option<vk::PushConstantRange> {
        (self.push_constants_size > 0).then(|| vk::PushConstantRange {
            stage_flags: self.push_constants_stages,
            offset: 0,
            size: self.push_constants_size as u32,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uniform(set: u8, binding: u8) -> Uniform {
        Uniform {
            uniform_type: GslUniformType::Sampler2D,
            shader_stages: vk::ShaderStageFlags::FRAGMENT,
            binding_index: binding,
            descriptor_set_index: set,
            array_size: 1,
            read_access: true,
            write_access: false,
            is_mutable: false,
        }
    }

    #[test]
    fn test_descriptor_set_count() {
        let mut uniforms = Uniforms::new();
        assert_eq!(PipelineData::descriptor_set_count_of(&uniforms), Some(1));

        uniforms.insert("a".to_string(), uniform(0, 0));
        uniforms.insert("b".to_string(), uniform(2, 1));
        assert_eq!(PipelineData::descriptor_set_count_of(&uniforms), Some(3));

        uniforms.insert("c".to_string(), uniform(255, 2));
        assert_eq!(PipelineData::descriptor_set_count_of(&uniforms), None);
    }

    #[test]
    fn test_set_uniforms_sorted_by_binding() {
        let mut data = PipelineData::default();
        data.uniforms.insert("late".to_string(), uniform(1, 3));
        data.uniforms.insert("other".to_string(), uniform(0, 0));
        data.uniforms.insert("early".to_string(), uniform(1, 1));

        let names = data.set_uniforms(1).into_iter().map(|(name, _)| name).collect::<Vec<_>>();
        assert_eq!(names, ["early", "late"]);
    }

    #[test]
    fn test_push_constant_range() {
        let mut data = PipelineData::default();
        assert!(data.push_constant_range().is_none());

        data.push_constants_size = 16;
        data.push_constants_stages = vk::ShaderStageFlags::VERTEX;
        let range = data.push_constant_range().unwrap();
        assert_eq!(range.size, 16);
        assert_eq!(range.stage_flags, vk::ShaderStageFlags::VERTEX);
    }
}
