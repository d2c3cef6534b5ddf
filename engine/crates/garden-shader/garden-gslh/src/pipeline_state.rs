//! graphics pipeline 的固定功能状态与顶点属性

use ash::vk;

use crate::types::{GslDataFormat, GslDataType};

/// 单个 color attachment 的混合设置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlendState {
    pub color_mask: vk::ColorComponentFlags,
    pub blending: bool,
    pub src_color_factor: vk::BlendFactor,
    pub dst_color_factor: vk::BlendFactor,
    pub src_alpha_factor: vk::BlendFactor,
    pub dst_alpha_factor: vk::BlendFactor,
    pub color_operation: vk::BlendOp,
    pub alpha_operation: vk::BlendOp,
}
impl Default for BlendState {
    fn default() -> Self {
        Self {
            color_mask: vk::ColorComponentFlags::RGBA,
            blending: false,
            src_color_factor: vk::BlendFactor::SRC_ALPHA,
            dst_color_factor: vk::BlendFactor::ONE_MINUS_SRC_ALPHA,
            src_alpha_factor: vk::BlendFactor::ONE,
            dst_alpha_factor: vk::BlendFactor::ZERO,
            color_operation: vk::BlendOp::ADD,
            alpha_operation: vk::BlendOp::ADD,
        }
    }
}
impl BlendState {
    pub fn to_vk(&self) -> vk::PipelineColorBlendAttachmentState {
        vk::PipelineColorBlendAttachmentState::default()
            .color_write_mask(self.color_mask)
            .blend_enable(self.blending)
            .src_color_blend_factor(self.src_color_factor)
            .dst_color_blend_factor(self.dst_color_factor)
            .color_blend_op(self.color_operation)
            .src_alpha_blend_factor(self.src_alpha_factor)
            .dst_alpha_blend_factor(self.dst_alpha_factor)
            .alpha_blend_op(self.alpha_operation)
    }
}

/// graphics pipeline 的状态，由 `pipelineState { ... }` 块描述
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineState {
    pub topology: vk::PrimitiveTopology,
    pub polygon: vk::PolygonMode,
    pub discarding: bool,
    pub depth_testing: bool,
    pub depth_writing: bool,
    pub depth_clamping: bool,
    pub depth_biasing: bool,
    pub stencil_testing: bool,
    pub face_culling: bool,
    pub cull_face: vk::CullModeFlags,
    pub front_face: vk::FrontFace,
    /// 使用 reverse-Z，默认 greater
    pub depth_compare: vk::CompareOp,
}
impl Default for PipelineState {
    fn default() -> Self {
        Self {
            topology: vk::PrimitiveTopology::TRIANGLE_LIST,
            polygon: vk::PolygonMode::FILL,
            discarding: false,
            depth_testing: false,
            depth_writing: false,
            depth_clamping: false,
            depth_biasing: false,
            stencil_testing: false,
            face_culling: true,
            cull_face: vk::CullModeFlags::BACK,
            front_face: vk::FrontFace::COUNTER_CLOCKWISE,
            depth_compare: vk::CompareOp::GREATER,
        }
    }
}
impl PipelineState {
    pub fn rasterization_info(&self) -> vk::PipelineRasterizationStateCreateInfo<'static> {
        vk::PipelineRasterizationStateCreateInfo::default()
            .depth_clamp_enable(self.depth_clamping)
            .rasterizer_discard_enable(self.discarding)
            .polygon_mode(self.polygon)
            .cull_mode(if self.face_culling { self.cull_face } else { vk::CullModeFlags::NONE })
            .front_face(self.front_face)
            .depth_bias_enable(self.depth_biasing)
            .line_width(1.0)
    }

    pub fn depth_stencil_info(&self) -> vk::PipelineDepthStencilStateCreateInfo<'static> {
        vk::PipelineDepthStencilStateCreateInfo::default()
            .depth_test_enable(self.depth_testing)
            .depth_write_enable(self.depth_writing)
            .depth_compare_op(self.depth_compare)
            .stencil_test_enable(self.stencil_testing)
    }
}

/// 一个顶点属性
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexAttribute {
    pub data_type: GslDataType,
    pub format: GslDataFormat,
    /// 在顶点结构中的字节偏移
    pub offset: u32,
}
impl VertexAttribute {
    /// 该属性在顶点中占用的字节数
    #[inline]
    pub fn binary_size(&self) -> u32 {
        self.data_type.component_count() * self.format.binary_size()
    }

    /// 每个 location 一个 vulkan 属性描述，矩阵按列拆分
    pub fn to_vk(&self, first_location: u32, binding: u32) -> Vec<vk::VertexInputAttributeDescription> {
        let (columns, rows) = self.data_type.dimensions();
        let column_size = rows * self.format.binary_size();
        let Some(format) = self.format.to_vk_format(rows) else {
            return Vec::new();
        };

        (0..columns)
            .map(|column| vk::VertexInputAttributeDescription {
                location: first_location + column,
                binding,
                format,
                offset: self.offset + column * column_size,
            })
            .collect()
    }
}
