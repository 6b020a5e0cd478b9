use super::format::ColorFormat;
use super::texture::{TextureDescriptor, TOTAL_TEXTURE_UNITS};
use super::vertex::{VertexProgram, VertexStreamData, MAX_VERTEX_STREAMS};

/// Color surface currently being rendered into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorSurface {
    pub data_addr: u32,
    pub width: u32,
    pub height: u32,
    pub stride_pixels: u32,
    pub format: ColorFormat,
}

/// Sampler parameter of a fragment program, as listed in its parameter table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SamplerParameter {
    pub resource_index: u32,
    pub name: String,
}

#[derive(Debug, Clone, Default)]
pub struct FragmentProgram {
    /// Program binary, hashed to name texture dumps.
    pub code: Vec<u8>,
    pub samplers: Vec<SamplerParameter>,
}

impl FragmentProgram {
    pub fn sampler_name(&self, resource_index: u32) -> Option<&str> {
        self.samplers
            .iter()
            .find(|p| p.resource_index == resource_index)
            .map(|p| p.name.as_str())
    }
}

/// Guest pipeline state captured for one draw.
#[derive(Debug, Clone, Default)]
pub struct PipelineRecordState {
    pub color_surface: Option<ColorSurface>,
    pub textures: [Option<TextureDescriptor>; TOTAL_TEXTURE_UNITS],
    pub fragment_program: Option<FragmentProgram>,
    pub vertex_program: Option<VertexProgram>,
    pub vertex_streams: [VertexStreamData; MAX_VERTEX_STREAMS],
}

impl PipelineRecordState {
    /// Whether `addr` is the address of the surface being rendered into.
    pub fn is_color_surface_addr(&self, addr: u32) -> bool {
        self.color_surface.is_some_and(|s| s.data_addr == addr)
    }
}
