pub mod data;
pub mod error;
pub mod header;
pub mod loader;
pub mod pipeline_state;
pub mod reflection;
pub mod source;
pub mod types;

pub use data::{ComputeData, GraphicsData, HitGroup, RayTracingData};
pub use error::GslhError;
pub use loader::{load_compute_shader, load_graphics_shaders, load_ray_tracing_shaders};
pub use pipeline_state::{BlendState, PipelineState, VertexAttribute};
pub use reflection::{PipelineData, SamplerState, SamplerStates, SpecConst, SpecConsts, Uniform, Uniforms};
pub use source::{LooseShaderCache, MemoryPack, PackedShaders, ResourcePack, ShaderBlobSource};
pub use types::{GslDataFormat, GslDataType, GslImageFormat, GslUniformType, ShaderStage};
