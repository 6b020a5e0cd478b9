#![allow(dead_code)]

use vgx_renderer::backend::RecordingBackend;
use vgx_renderer::guest_memory::VecGuestMemory;
use vgx_renderer::surface_cache::SurfaceTable;
use vgx_renderer::texture_cache::RecordingTextureCache;
use vgx_renderer::vertex_ring::{HeapMappedBuffer, VertexRingConfig, VertexStreamRing};
use vgx_renderer::{DrawEnv, HostBuffer, RenderContext, RendererConfig};

pub const RAM_BASE: u32 = 0x8100_0000;
pub const RAM_SIZE: usize = 0x10_0000;
pub const RING_HANDLE: HostBuffer = HostBuffer(0x77);

/// Everything a draw borrows, owned in one place.
pub struct Harness {
    pub config: RendererConfig,
    pub mem: VecGuestMemory,
    pub surfaces: SurfaceTable,
    pub textures: RecordingTextureCache,
    pub backend: RecordingBackend,
    pub ctx: RenderContext,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_ring(VertexRingConfig {
            per_frame_size: 1024,
            frames_in_flight: 2,
            alignment: 16,
        })
    }

    pub fn with_ring(ring_config: VertexRingConfig) -> Self {
        let size = ring_config.required_size().unwrap() as usize;
        let ring = VertexStreamRing::new(
            Box::new(HeapMappedBuffer::new(RING_HANDLE, size)),
            ring_config,
        )
        .unwrap();

        Self {
            config: RendererConfig::default(),
            mem: VecGuestMemory::new(RAM_BASE, RAM_SIZE),
            surfaces: SurfaceTable::new(),
            textures: RecordingTextureCache::new(),
            backend: RecordingBackend::new(),
            ctx: RenderContext::new(ring),
        }
    }

    /// Borrow the render context and the per-draw collaborators at the same time.
    pub fn split(&mut self) -> (&mut RenderContext, DrawEnv<'_>) {
        (
            &mut self.ctx,
            DrawEnv {
                config: &self.config,
                mem: &self.mem,
                surfaces: &self.surfaces,
                textures: &mut self.textures,
                backend: &mut self.backend,
            },
        )
    }
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::TRACE)
        .try_init();
}
