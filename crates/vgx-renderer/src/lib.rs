//! `vgx-renderer` resolves captured guest GPU state into host bindings right before a draw.
//!
//! Currently this crate provides:
//! - Texture unit resolution: self-sampling of the live render target, aliasing of cached
//!   surfaces, or upload through a texture cache (see [`resolve_texture_unit`]).
//! - Channel order reconciliation between a texture's declared swizzle and the order its
//!   backing surface is stored in (see [`reconcile_swizzle`]).
//! - A per-frame vertex staging ring and guest-to-host attribute layout translation
//!   (see [`stage_vertex_streams_and_bind_attributes`]).

pub mod backend;
pub mod config;
pub mod context;
pub mod dump;
pub mod error;
pub mod guest_memory;
pub mod gxm;
pub mod stats;
pub mod surface_cache;
pub mod swizzle;
pub mod texture_cache;
pub mod texture_sync;
pub mod vertex_ring;
pub mod vertex_sync;

pub use backend::{GraphicsBackend, HostBuffer, HostTexture};
pub use config::RendererConfig;
pub use context::{DrawEnv, RenderContext, SelfSamplingSet, ShaderHints};
pub use error::{StreamUploadError, SyncError};
pub use guest_memory::{GuestMemory, GuestMemoryError};
pub use stats::{SyncStats, SyncStatsSnapshot};
pub use surface_cache::{color_surface_key, find_surface_alias, SurfaceAlias, SurfaceCache};
pub use swizzle::{reconcile_swizzle, ChannelSource, SwizzleMapping};
pub use texture_cache::TextureCache;
pub use texture_sync::{resolve_texture_unit, sync_textures, AliasSource, BindingOutcome};
pub use vertex_ring::{
    MappedBuffer, RingAllocation, RingBufferError, VertexRingConfig, VertexStreamRing,
};
pub use vertex_sync::{
    stage_vertex_streams_and_bind_attributes, translate_attribute, AttributeBinding, StageReport,
};
