//! GSL 中的基础类型：数据类型、顶点数据格式、uniform 类型、image 格式以及 shader stage

use ash::vk;

/// 定义一个与 GSL 关键字一一对应的枚举
///
/// 枚举值从 0 开始连续编号，同时作为 GSLH 中的二进制编码。
macro_rules! gsl_enum {
    ($(#[$meta:meta])* $vis:vis enum $name:ident { $($variant:ident => $gsl:literal),* $(,)? }) => {
        $(#[$meta])*
        #[repr(u8)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        $vis enum $name {
            $($variant,)*
        }

        impl $name {
            pub const ALL: &'static [Self] = &[$(Self::$variant,)*];

            /// 根据 GSL 源码中的名字查找
            pub fn from_gsl_name(name: &str) -> Option<Self> {
                match name {
                    $($gsl => Some(Self::$variant),)*
                    _ => None,
                }
            }

            /// GSL 源码中的名字
            pub const fn gsl_name(self) -> &'static str {
                match self {
                    $(Self::$variant => $gsl,)*
                }
            }

            #[inline]
            pub fn from_u8(value: u8) -> Option<Self> {
                Self::ALL.get(value as usize).copied()
            }

            #[inline]
            pub const fn as_u8(self) -> u8 {
                self as u8
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.gsl_name())
            }
        }
    };
}

gsl_enum! {
    /// GSL 的数据类型，对应 `types.gsl` 中的宏
    pub enum GslDataType {
        Bool => "bool",
        Int32 => "int32",
        Int32x2 => "int32x2",
        Int32x3 => "int32x3",
        Int32x4 => "int32x4",
        Uint32 => "uint32",
        Uint32x2 => "uint32x2",
        Uint32x3 => "uint32x3",
        Uint32x4 => "uint32x4",
        Float => "float",
        Float2 => "float2",
        Float3 => "float3",
        Float4 => "float4",
        Float2x2 => "float2x2",
        Float3x3 => "float3x3",
        Float4x4 => "float4x4",
        Float2x3 => "float2x3",
        Float3x2 => "float3x2",
        Float2x4 => "float2x4",
        Float4x2 => "float4x2",
        Float3x4 => "float3x4",
        Float4x3 => "float4x3",
    }
}

/// 数据类型的分量种类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GslComponentKind {
    Bool,
    Int,
    Uint,
    Float,
}

impl GslDataType {
    pub const fn component_kind(self) -> GslComponentKind {
        match self {
            Self::Bool => GslComponentKind::Bool,
            Self::Int32 | Self::Int32x2 | Self::Int32x3 | Self::Int32x4 => GslComponentKind::Int,
            Self::Uint32 | Self::Uint32x2 | Self::Uint32x3 | Self::Uint32x4 => GslComponentKind::Uint,
            _ => GslComponentKind::Float,
        }
    }

    /// (列数, 行数)，非矩阵类型的列数为 1
    pub const fn dimensions(self) -> (u32, u32) {
        match self {
            Self::Bool | Self::Int32 | Self::Uint32 | Self::Float => (1, 1),
            Self::Int32x2 | Self::Uint32x2 | Self::Float2 => (1, 2),
            Self::Int32x3 | Self::Uint32x3 | Self::Float3 => (1, 3),
            Self::Int32x4 | Self::Uint32x4 | Self::Float4 => (1, 4),
            Self::Float2x2 => (2, 2),
            Self::Float3x3 => (3, 3),
            Self::Float4x4 => (4, 4),
            Self::Float2x3 => (2, 3),
            Self::Float3x2 => (3, 2),
            Self::Float2x4 => (2, 4),
            Self::Float4x2 => (4, 2),
            Self::Float3x4 => (3, 4),
            Self::Float4x3 => (4, 3),
        }
    }

    #[inline]
    pub const fn component_count(self) -> u32 {
        let (columns, rows) = self.dimensions();
        columns * rows
    }

    /// 占用的字节数，bool 在 GLSL 中按 4 字节存储
    #[inline]
    pub const fn binary_size(self) -> u32 {
        self.component_count() * 4
    }

    /// 作为 stage 输入输出时占用的 location 数量（矩阵每列一个）
    #[inline]
    pub const fn location_count(self) -> u32 {
        self.dimensions().0
    }

    #[inline]
    pub const fn is_scalar(self) -> bool {
        self.component_count() == 1
    }
}

gsl_enum! {
    /// 顶点属性在 buffer 中的分量格式
    pub enum GslDataFormat {
        F32 => "f32",
        I8 => "i8",
        I16 => "i16",
        I32 => "i32",
        U8 => "u8",
        U16 => "u16",
        U32 => "u32",
    }
}

impl GslDataFormat {
    #[inline]
    pub const fn binary_size(self) -> u32 {
        match self {
            Self::I8 | Self::U8 => 1,
            Self::I16 | Self::U16 => 2,
            Self::F32 | Self::I32 | Self::U32 => 4,
        }
    }

    /// 数据类型的分量种类对应的默认格式
    pub const fn from_data_type(data_type: GslDataType) -> Self {
        match data_type.component_kind() {
            GslComponentKind::Float => Self::F32,
            GslComponentKind::Int => Self::I32,
            GslComponentKind::Uint | GslComponentKind::Bool => Self::U32,
        }
    }

    /// 单个 location（矩阵的一列）对应的 vulkan 顶点格式
    pub fn to_vk_format(self, component_count: u32) -> Option<vk::Format> {
        const FORMATS: [[vk::Format; 4]; 7] = [
            [
                vk::Format::R32_SFLOAT,
                vk::Format::R32G32_SFLOAT,
                vk::Format::R32G32B32_SFLOAT,
                vk::Format::R32G32B32A32_SFLOAT,
            ],
            [
                vk::Format::R8_SINT,
                vk::Format::R8G8_SINT,
                vk::Format::R8G8B8_SINT,
                vk::Format::R8G8B8A8_SINT,
            ],
            [
                vk::Format::R16_SINT,
                vk::Format::R16G16_SINT,
                vk::Format::R16G16B16_SINT,
                vk::Format::R16G16B16A16_SINT,
            ],
            [
                vk::Format::R32_SINT,
                vk::Format::R32G32_SINT,
                vk::Format::R32G32B32_SINT,
                vk::Format::R32G32B32A32_SINT,
            ],
            [
                vk::Format::R8_UINT,
                vk::Format::R8G8_UINT,
                vk::Format::R8G8B8_UINT,
                vk::Format::R8G8B8A8_UINT,
            ],
            [
                vk::Format::R16_UINT,
                vk::Format::R16G16_UINT,
                vk::Format::R16G16B16_UINT,
                vk::Format::R16G16B16A16_UINT,
            ],
            [
                vk::Format::R32_UINT,
                vk::Format::R32G32_UINT,
                vk::Format::R32G32B32_UINT,
                vk::Format::R32G32B32A32_UINT,
            ],
        ];

        if !(1..=4).contains(&component_count) {
            return None;
        }
        Some(FORMATS[self as usize][component_count as usize - 1])
    }
}

gsl_enum! {
    /// shader 可见的资源类型
    ///
    /// 最后三项不会出现在 GSL 源码的类型位置上，由编译器根据声明方式推导。
    pub enum GslUniformType {
        Sampler1D => "sampler1D",
        Sampler2D => "sampler2D",
        Sampler3D => "sampler3D",
        SamplerCube => "samplerCube",
        Sampler1DArray => "sampler1DArray",
        Sampler2DArray => "sampler2DArray",
        SamplerCubeArray => "samplerCubeArray",
        ISampler1D => "isampler1D",
        ISampler2D => "isampler2D",
        ISampler3D => "isampler3D",
        ISamplerCube => "isamplerCube",
        ISampler1DArray => "isampler1DArray",
        ISampler2DArray => "isampler2DArray",
        ISamplerCubeArray => "isamplerCubeArray",
        USampler1D => "usampler1D",
        USampler2D => "usampler2D",
        USampler3D => "usampler3D",
        USamplerCube => "usamplerCube",
        USampler1DArray => "usampler1DArray",
        USampler2DArray => "usampler2DArray",
        USamplerCubeArray => "usamplerCubeArray",
        Sampler1DShadow => "sampler1DShadow",
        Sampler2DShadow => "sampler2DShadow",
        SamplerCubeShadow => "samplerCubeShadow",
        Sampler1DArrayShadow => "sampler1DArrayShadow",
        Sampler2DArrayShadow => "sampler2DArrayShadow",
        SamplerCubeArrayShadow => "samplerCubeArrayShadow",
        Image1D => "image1D",
        Image2D => "image2D",
        Image3D => "image3D",
        ImageCube => "imageCube",
        Image1DArray => "image1DArray",
        Image2DArray => "image2DArray",
        ImageCubeArray => "imageCubeArray",
        IImage1D => "iimage1D",
        IImage2D => "iimage2D",
        IImage3D => "iimage3D",
        IImageCube => "iimageCube",
        IImage1DArray => "iimage1DArray",
        IImage2DArray => "iimage2DArray",
        IImageCubeArray => "iimageCubeArray",
        UImage1D => "uimage1D",
        UImage2D => "uimage2D",
        UImage3D => "uimage3D",
        UImageCube => "uimageCube",
        UImage1DArray => "uimage1DArray",
        UImage2DArray => "uimage2DArray",
        UImageCubeArray => "uimageCubeArray",
        SubpassInput => "subpassInput",
        AccelerationStructure => "accelerationStructure",
        UniformBuffer => "uniformBuffer",
        StorageBuffer => "storageBuffer",
        PushConstants => "pushConstants",
    }
}

impl GslUniformType {
    #[inline]
    pub const fn is_sampler(self) -> bool {
        (self as u8) <= (Self::SamplerCubeArrayShadow as u8)
    }

    #[inline]
    pub const fn is_image(self) -> bool {
        (self as u8) >= (Self::Image1D as u8) && (self as u8) <= (Self::UImageCubeArray as u8)
    }

    #[inline]
    pub const fn is_buffer(self) -> bool {
        matches!(self, Self::UniformBuffer | Self::StorageBuffer)
    }

    /// 输出到 GLSL 中的类型名
    pub const fn glsl_name(self) -> &'static str {
        match self {
            Self::AccelerationStructure => "accelerationStructureEXT",
            other => other.gsl_name(),
        }
    }

    /// 在 shader 中只能读的资源类型
    pub const fn is_read_only(self) -> bool {
        self.is_sampler()
            || matches!(
                self,
                Self::SubpassInput | Self::UniformBuffer | Self::PushConstants | Self::AccelerationStructure
            )
    }

    pub fn to_vk_descriptor_type(self) -> vk::DescriptorType {
        match self {
            t if t.is_sampler() => vk::DescriptorType::COMBINED_IMAGE_SAMPLER,
            t if t.is_image() => vk::DescriptorType::STORAGE_IMAGE,
            Self::SubpassInput => vk::DescriptorType::INPUT_ATTACHMENT,
            Self::AccelerationStructure => vk::DescriptorType::ACCELERATION_STRUCTURE_KHR,
            Self::UniformBuffer => vk::DescriptorType::UNIFORM_BUFFER,
            Self::StorageBuffer => vk::DescriptorType::STORAGE_BUFFER,
            _ => unreachable!("push constants have no descriptor type"),
        }
    }
}

gsl_enum! {
    /// storage image 的格式，对应 GLSL 的 format layout qualifier
    pub enum GslImageFormat {
        UintR8 => "uintR8",
        UintR8G8 => "uintR8G8",
        UintR8G8B8A8 => "uintR8G8B8A8",
        UintR16 => "uintR16",
        UintR16G16 => "uintR16G16",
        UintR16G16B16A16 => "uintR16G16B16A16",
        UintR32 => "uintR32",
        UintR32G32 => "uintR32G32",
        UintR32G32B32A32 => "uintR32G32B32A32",
        UintA2R10G10B10 => "uintA2R10G10B10",
        SintR8 => "sintR8",
        SintR8G8 => "sintR8G8",
        SintR8G8B8A8 => "sintR8G8B8A8",
        SintR16 => "sintR16",
        SintR16G16 => "sintR16G16",
        SintR16G16B16A16 => "sintR16G16B16A16",
        SintR32 => "sintR32",
        SintR32G32 => "sintR32G32",
        SintR32G32B32A32 => "sintR32G32B32A32",
        UnormR8 => "unormR8",
        UnormR8G8 => "unormR8G8",
        UnormR8G8B8A8 => "unormR8G8B8A8",
        UnormR16 => "unormR16",
        UnormR16G16 => "unormR16G16",
        UnormR16G16B16A16 => "unormR16G16B16A16",
        UnormA2R10G10B10 => "unormA2R10G10B10",
        SnormR8 => "snormR8",
        SnormR8G8 => "snormR8G8",
        SnormR8G8B8A8 => "snormR8G8B8A8",
        SnormR16 => "snormR16",
        SnormR16G16 => "snormR16G16",
        SnormR16G16B16A16 => "snormR16G16B16A16",
        SfloatR16 => "sfloatR16",
        SfloatR16G16 => "sfloatR16G16",
        SfloatR16G16B16A16 => "sfloatR16G16B16A16",
        SfloatR32 => "sfloatR32",
        SfloatR32G32 => "sfloatR32G32",
        SfloatR32G32B32A32 => "sfloatR32G32B32A32",
        UfloatB10G11R11 => "ufloatB10G11R11",
    }
}

impl GslImageFormat {
    pub const fn glsl_name(self) -> &'static str {
        match self {
            Self::UintR8 => "r8ui",
            Self::UintR8G8 => "rg8ui",
            Self::UintR8G8B8A8 => "rgba8ui",
            Self::UintR16 => "r16ui",
            Self::UintR16G16 => "rg16ui",
            Self::UintR16G16B16A16 => "rgba16ui",
            Self::UintR32 => "r32ui",
            Self::UintR32G32 => "rg32ui",
            Self::UintR32G32B32A32 => "rgba32ui",
            Self::UintA2R10G10B10 => "rgb10_a2ui",
            Self::SintR8 => "r8i",
            Self::SintR8G8 => "rg8i",
            Self::SintR8G8B8A8 => "rgba8i",
            Self::SintR16 => "r16i",
            Self::SintR16G16 => "rg16i",
            Self::SintR16G16B16A16 => "rgba16i",
            Self::SintR32 => "r32i",
            Self::SintR32G32 => "rg32i",
            Self::SintR32G32B32A32 => "rgba32i",
            Self::UnormR8 => "r8",
            Self::UnormR8G8 => "rg8",
            Self::UnormR8G8B8A8 => "rgba8",
            Self::UnormR16 => "r16",
            Self::UnormR16G16 => "rg16",
            Self::UnormR16G16B16A16 => "rgba16",
            Self::UnormA2R10G10B10 => "rgb10_a2",
            Self::SnormR8 => "r8_snorm",
            Self::SnormR8G8 => "rg8_snorm",
            Self::SnormR8G8B8A8 => "rgba8_snorm",
            Self::SnormR16 => "r16_snorm",
            Self::SnormR16G16 => "rg16_snorm",
            Self::SnormR16G16B16A16 => "rgba16_snorm",
            Self::SfloatR16 => "r16f",
            Self::SfloatR16G16 => "rg16f",
            Self::SfloatR16G16B16A16 => "rgba16f",
            Self::SfloatR32 => "r32f",
            Self::SfloatR32G32 => "rg32f",
            Self::SfloatR32G32B32A32 => "rgba32f",
            Self::UfloatB10G11R11 => "r11f_g11f_b10f",
        }
    }
}

/// Shader 的执行阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
    Compute,

    // Ray Tracing 阶段
    RayGen,
    Miss,
    Callable,
    Intersection,
    AnyHit,
    ClosestHit,
}

impl ShaderStage {
    pub const RAY_TRACING: [Self; 6] =
        [Self::RayGen, Self::Miss, Self::Callable, Self::Intersection, Self::AnyHit, Self::ClosestHit];

    /// 源文件扩展名
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Vertex => "vert",
            Self::Fragment => "frag",
            Self::Compute => "comp",
            Self::RayGen => "rgen",
            Self::Miss => "rmiss",
            Self::Callable => "rcall",
            Self::Intersection => "rint",
            Self::AnyHit => "rahit",
            Self::ClosestHit => "rchit",
        }
    }

    pub const fn vk_flag(self) -> vk::ShaderStageFlags {
        match self {
            Self::Vertex => vk::ShaderStageFlags::VERTEX,
            Self::Fragment => vk::ShaderStageFlags::FRAGMENT,
            Self::Compute => vk::ShaderStageFlags::COMPUTE,
            Self::RayGen => vk::ShaderStageFlags::RAYGEN_KHR,
            Self::Miss => vk::ShaderStageFlags::MISS_KHR,
            Self::Callable => vk::ShaderStageFlags::CALLABLE_KHR,
            Self::Intersection => vk::ShaderStageFlags::INTERSECTION_KHR,
            Self::AnyHit => vk::ShaderStageFlags::ANY_HIT_KHR,
            Self::ClosestHit => vk::ShaderStageFlags::CLOSEST_HIT_KHR,
        }
    }

    #[inline]
    pub const fn is_ray_tracing(self) -> bool {
        !matches!(self, Self::Vertex | Self::Fragment | Self::Compute)
    }
}

/// 编号的 group 文件名：`path.ext`（group 0）或 `path.N.ext`
pub fn group_file_name(shader_path: &str, group: u32, stage: ShaderStage) -> String {
    if group == 0 {
        format!("{shader_path}.{}", stage.extension())
    } else {
        format!("{shader_path}.{group}.{}", stage.extension())
    }
}
