//! Guest GPU state as captured from the command stream.

pub mod format;
pub mod record;
pub mod texture;
pub mod vertex;

pub use format::{ColorBaseFormat, ColorFormat, ColorSwizzle, TextureBaseFormat, TextureFormat};
pub use record::{ColorSurface, FragmentProgram, PipelineRecordState, SamplerParameter};
pub use texture::{
    effective_stride_in_pixels, FilterMode, TextureDescriptor, TextureLayout, MAX_TEXTURE_UNITS,
    TOTAL_TEXTURE_UNITS,
};
pub use vertex::{
    AttributeFormat, AttributeInformation, AttributeType, IndexSource, ParameterType,
    ProgramInterface, VertexAttribute, VertexProgram, VertexStreamData, VertexStreamLayout,
    MAX_VERTEX_STREAMS,
};
