//! Mutable state carried across draws, and the collaborators each draw borrows.

use std::collections::BTreeSet;

use crate::backend::{GraphicsBackend, HostTexture};
use crate::config::RendererConfig;
use crate::dump::TextureDumper;
use crate::guest_memory::GuestMemory;
use crate::gxm::{TextureFormat, MAX_TEXTURE_UNITS, MAX_VERTEX_STREAMS};
use crate::stats::SyncStats;
use crate::surface_cache::SurfaceCache;
use crate::texture_cache::TextureCache;
use crate::vertex_ring::VertexStreamRing;

/// Texture units currently sampling the color surface they are rendered into.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelfSamplingSet(BTreeSet<u32>);

impl SelfSamplingSet {
    pub fn insert(&mut self, unit: u32) -> bool {
        self.0.insert(unit)
    }

    pub fn remove(&mut self, unit: u32) -> bool {
        self.0.remove(&unit)
    }

    pub fn contains(&self, unit: u32) -> bool {
        self.0.contains(&unit)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Units in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.0.iter().copied()
    }
}

/// Texture formats last bound per unit, used when specializing shaders.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShaderHints {
    pub fragment_textures: [Option<TextureFormat>; MAX_TEXTURE_UNITS],
    pub vertex_textures: [Option<TextureFormat>; MAX_TEXTURE_UNITS],
}

impl ShaderHints {
    /// Units `0..16` are fragment units, `16..32` vertex units. Returns `false` for any other
    /// unit.
    pub fn record(&mut self, unit: u32, format: TextureFormat) -> bool {
        let unit = unit as usize;
        let slot = if unit < MAX_TEXTURE_UNITS {
            &mut self.fragment_textures[unit]
        } else if let Some(slot) = self.vertex_textures.get_mut(unit - MAX_TEXTURE_UNITS) {
            slot
        } else {
            return false;
        };
        *slot = Some(format);
        true
    }
}

/// Renderer state with a per-draw lifecycle.
#[derive(Debug)]
pub struct RenderContext {
    pub self_sampling: SelfSamplingSet,
    /// Host texture of the color attachment bound for the current pass.
    pub current_color_attachment: Option<HostTexture>,
    pub vertex_ring: VertexStreamRing,
    /// Ring offset of the last data staged for each stream.
    pub stream_offsets: [u64; MAX_VERTEX_STREAMS],
    pub shader_hints: ShaderHints,
    pub stats: SyncStats,
    /// Created on the first dump.
    pub dumper: Option<TextureDumper>,
}

impl RenderContext {
    pub fn new(vertex_ring: VertexStreamRing) -> Self {
        Self {
            self_sampling: SelfSamplingSet::default(),
            current_color_attachment: None,
            vertex_ring,
            stream_offsets: [0; MAX_VERTEX_STREAMS],
            shader_hints: ShaderHints::default(),
            stats: SyncStats::new(),
            dumper: None,
        }
    }
}

/// External collaborators borrowed for one draw.
pub struct DrawEnv<'a> {
    pub config: &'a RendererConfig,
    pub mem: &'a dyn GuestMemory,
    pub surfaces: &'a dyn SurfaceCache,
    pub textures: &'a mut dyn TextureCache,
    pub backend: &'a mut dyn GraphicsBackend,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gxm::TextureBaseFormat;

    #[test]
    fn hints_split_fragment_and_vertex_units() {
        let format = TextureFormat::new(TextureBaseFormat::F32, 0);
        let mut hints = ShaderHints::default();
        assert!(hints.record(3, format));
        assert!(hints.record(17, format));
        assert!(!hints.record(32, format));

        assert_eq!(hints.fragment_textures[3], Some(format));
        assert_eq!(hints.vertex_textures[1], Some(format));
        assert_eq!(hints.fragment_textures[1], None);
    }

    #[test]
    fn self_sampling_set_iterates_in_unit_order() {
        let mut set = SelfSamplingSet::default();
        set.insert(5);
        set.insert(1);
        assert!(!set.insert(5));
        assert_eq!(set.iter().collect::<Vec<_>>(), [1, 5]);
        assert!(set.remove(1));
        assert!(!set.contains(1));
    }
}
