//! Read-only gateway to the surface cache.
//!
//! Surfaces are created and destroyed by the render-target path. Texture resolution only asks
//! whether a surface already covers a texture's memory and borrows the entry it finds.

use bitflags::bitflags;
use hashbrown::HashMap;

use crate::backend::HostTexture;
use crate::gxm::{ColorBaseFormat, ColorFormat, ColorSwizzle, TextureDescriptor};

/// Identity of a color surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ColorSurfaceKey {
    pub addr: u32,
    pub width: u16,
    pub height: u16,
    pub stride_pixels: u16,
    pub format: ColorBaseFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachedColorSurface {
    pub handle: HostTexture,
    /// Channel order the surface was written with.
    pub swizzle: ColorSwizzle,
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct DepthStencilAspects: u8 {
        const DEPTH = 1 << 0;
        const STENCIL = 1 << 1;
    }
}

/// Depth/stencil lookup. Depth and stencil planes are matched independently; an absent address
/// means the aspect is not part of the query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DepthStencilKey {
    pub depth_addr: Option<u32>,
    pub stencil_addr: Option<u32>,
    pub width: u16,
    pub height: u16,
    pub read_only: bool,
}

impl DepthStencilKey {
    pub fn aspects(&self) -> DepthStencilAspects {
        let mut aspects = DepthStencilAspects::empty();
        aspects.set(DepthStencilAspects::DEPTH, self.depth_addr.is_some());
        aspects.set(DepthStencilAspects::STENCIL, self.stencil_addr.is_some());
        aspects
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachedDepthStencil {
    pub handle: HostTexture,
    pub aspects: DepthStencilAspects,
}

/// Lookups only ever read: a returned surface is sampled, never rendered into.
pub trait SurfaceCache {
    fn lookup_color(&self, key: &ColorSurfaceKey) -> Option<&CachedColorSurface>;

    fn lookup_depth_stencil(&self, key: &DepthStencilKey) -> Option<&CachedDepthStencil>;
}

/// Color surface lookup key for a texture, or `None` when the texture's base format cannot be
/// stored in a color surface or its effective stride does not fit a surface's stride field.
pub fn color_surface_key(texture: &TextureDescriptor) -> Option<ColorSurfaceKey> {
    let format = texture.base_format().to_color_base()?;
    Some(ColorSurfaceKey {
        addr: texture.data_addr,
        width: texture.width,
        height: texture.height,
        stride_pixels: u16::try_from(texture.stride_in_pixels()).ok()?,
        format,
    })
}

/// Depth-only lookup key for a texture reading depth data as color.
pub fn depth_surface_key(texture: &TextureDescriptor) -> DepthStencilKey {
    DepthStencilKey {
        depth_addr: Some(texture.data_addr),
        stencil_addr: None,
        width: texture.width,
        height: texture.height,
        read_only: true,
    }
}

/// A cached surface whose memory a texture aliases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceAlias<'a> {
    Color {
        surface: &'a CachedColorSurface,
        format: ColorFormat,
    },
    DepthStencil(&'a CachedDepthStencil),
}

impl SurfaceAlias<'_> {
    pub fn handle(&self) -> HostTexture {
        match self {
            SurfaceAlias::Color { surface, .. } => surface.handle,
            SurfaceAlias::DepthStencil(ds) => ds.handle,
        }
    }

    /// Depth reads and non-filterable color formats must be sampled with nearest filtering.
    pub fn only_nearest(&self) -> bool {
        match self {
            SurfaceAlias::Color { format, .. } => format.base.requires_nearest_filtering(),
            SurfaceAlias::DepthStencil(_) => true,
        }
    }
}

/// Find a cached surface backing `texture`: first a color surface with the texture's exact
/// geometry and layout, then a depth surface at the same address.
pub fn find_surface_alias<'a>(
    cache: &'a dyn SurfaceCache,
    texture: &TextureDescriptor,
) -> Option<SurfaceAlias<'a>> {
    if let Some(key) = color_surface_key(texture) {
        if let Some(surface) = cache.lookup_color(&key) {
            return Some(SurfaceAlias::Color {
                surface,
                format: ColorFormat::new(key.format, surface.swizzle),
            });
        }
    }

    cache
        .lookup_depth_stencil(&depth_surface_key(texture))
        .map(SurfaceAlias::DepthStencil)
}

#[derive(Debug, Clone, Copy)]
struct DepthStencilEntry {
    depth_addr: Option<u32>,
    stencil_addr: Option<u32>,
    width: u16,
    height: u16,
    surface: CachedDepthStencil,
}

impl DepthStencilEntry {
    fn matches(&self, key: &DepthStencilKey) -> bool {
        if key.depth_addr.is_some() && key.depth_addr != self.depth_addr {
            return false;
        }
        if key.stencil_addr.is_some() && key.stencil_addr != self.stencil_addr {
            return false;
        }
        !key.aspects().is_empty() && self.width >= key.width && self.height >= key.height
    }
}

/// In-memory surface registry keyed the same way the lookups are.
///
/// Color surfaces match on the exact key; depth/stencil surfaces match on every address the
/// query names and must be at least as large as the requested view.
#[derive(Debug, Default)]
pub struct SurfaceTable {
    color: HashMap<ColorSurfaceKey, CachedColorSurface>,
    depth_stencil: Vec<DepthStencilEntry>,
}

impl SurfaceTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_color(&mut self, key: ColorSurfaceKey, surface: CachedColorSurface) {
        self.color.insert(key, surface);
    }

    pub fn insert_depth_stencil(
        &mut self,
        depth_addr: Option<u32>,
        stencil_addr: Option<u32>,
        width: u16,
        height: u16,
        handle: HostTexture,
    ) {
        let mut aspects = DepthStencilAspects::empty();
        aspects.set(DepthStencilAspects::DEPTH, depth_addr.is_some());
        aspects.set(DepthStencilAspects::STENCIL, stencil_addr.is_some());
        self.depth_stencil.push(DepthStencilEntry {
            depth_addr,
            stencil_addr,
            width,
            height,
            surface: CachedDepthStencil { handle, aspects },
        });
    }
}

impl SurfaceCache for SurfaceTable {
    fn lookup_color(&self, key: &ColorSurfaceKey) -> Option<&CachedColorSurface> {
        self.color.get(key)
    }

    fn lookup_depth_stencil(&self, key: &DepthStencilKey) -> Option<&CachedDepthStencil> {
        self.depth_stencil
            .iter()
            .find(|entry| entry.matches(key))
            .map(|entry| &entry.surface)
    }
}
