//! Per-draw texture unit resolution.
//!
//! Every active unit is bound from exactly one source:
//!
//! 1. the color surface being rendered into (self-sampling),
//! 2. a cached surface whose memory the texture aliases,
//! 3. the generic texture cache, which uploads from guest memory.
//!
//! Filtering and swizzle follow the chosen source.

use tracing::{debug, trace, warn};

use crate::backend::HostTexture;
use crate::context::{DrawEnv, RenderContext};
use crate::dump::TextureDumper;
use crate::error::SyncError;
use crate::gxm::{
    FilterMode, PipelineRecordState, TextureBaseFormat, TextureDescriptor, TOTAL_TEXTURE_UNITS,
};
use crate::surface_cache::{find_surface_alias, SurfaceAlias};
use crate::swizzle::{reconcile_swizzle, SwizzleMapping};

/// Which kind of cached surface a texture aliases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AliasSource {
    Color,
    DepthStencil,
}

/// How a texture unit was bound for the current draw.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindingOutcome {
    /// The live color attachment was bound.
    SelfSample { handle: HostTexture },
    SurfaceAlias {
        handle: HostTexture,
        source: AliasSource,
        only_nearest: bool,
    },
    /// Handed to the texture cache (`cached`) or uploaded directly.
    ExternalUpload { cached: bool },
    /// Nothing was bound; the unit keeps its previous binding.
    Skipped(SyncError),
}

impl BindingOutcome {
    pub fn is_bound(&self) -> bool {
        !matches!(self, BindingOutcome::Skipped(_))
    }
}

struct Resolved {
    outcome: BindingOutcome,
    only_nearest: bool,
    surface_swizzle: Option<SwizzleMapping>,
}

/// Resolve and bind texture `unit` for the current draw.
///
/// Failures are not fatal: they are logged, counted and returned as
/// [`BindingOutcome::Skipped`], and the unit's previous host binding is left in place.
pub fn resolve_texture_unit(
    ctx: &mut RenderContext,
    env: &mut DrawEnv<'_>,
    record: &PipelineRecordState,
    unit: u32,
    texture: &TextureDescriptor,
) -> BindingOutcome {
    if unit as usize >= TOTAL_TEXTURE_UNITS {
        let err = SyncError::UnitOutOfRange {
            unit,
            max: TOTAL_TEXTURE_UNITS as u32,
        };
        warn!(unit, "{err}");
        ctx.stats.inc_skipped_units();
        return BindingOutcome::Skipped(err);
    }

    let base = texture.base_format();
    let size = texture.size_in_bytes();
    let mem = env.mem;
    let data = match mem.read(texture.data_addr, size) {
        Ok(data) => data,
        Err(source) => {
            return skip(
                ctx,
                record,
                unit,
                texture,
                SyncError::InvalidTextureMemory {
                    unit,
                    addr: texture.data_addr,
                    size,
                    source,
                },
            );
        }
    };

    if base.is_paletted() && texture.palette_addr == 0 {
        return skip(
            ctx,
            record,
            unit,
            texture,
            SyncError::NullPalette { unit, format: base },
        );
    }

    ctx.shader_hints.record(unit, texture.format);

    let resolved = if record.is_color_surface_addr(texture.data_addr) {
        ctx.self_sampling.insert(unit);
        match (ctx.current_color_attachment, record.color_surface) {
            (Some(handle), Some(surface)) => {
                trace!(unit, addr = texture.data_addr, "sampling the live color surface");
                env.backend.bind_texture(unit, handle);
                Resolved {
                    outcome: BindingOutcome::SelfSample { handle },
                    only_nearest: false,
                    surface_swizzle: Some(surface.format.storage_swizzle()),
                }
            }
            _ => {
                warn!(
                    unit,
                    addr = texture.data_addr,
                    "texture aliases the color surface but no attachment is bound; uploading"
                );
                upload_external(env, unit, texture, data)
            }
        }
    } else {
        ctx.self_sampling.remove(unit);
        let surfaces = env.surfaces;
        match find_surface_alias(surfaces, texture) {
            Some(alias) => {
                let handle = alias.handle();
                let only_nearest = alias.only_nearest();
                let (source, surface_swizzle) = match alias {
                    SurfaceAlias::Color { format, .. } => {
                        (AliasSource::Color, Some(format.storage_swizzle()))
                    }
                    SurfaceAlias::DepthStencil(_) => (AliasSource::DepthStencil, None),
                };
                debug!(
                    unit,
                    addr = texture.data_addr,
                    ?source,
                    handle = handle.0,
                    "texture aliases a cached surface"
                );
                env.backend.bind_texture(unit, handle);
                Resolved {
                    outcome: BindingOutcome::SurfaceAlias {
                        handle,
                        source,
                        only_nearest,
                    },
                    only_nearest,
                    surface_swizzle,
                }
            }
            None => upload_external(env, unit, texture, data),
        }
    };

    let (min, mag) = if resolved.only_nearest {
        (FilterMode::Nearest, FilterMode::Nearest)
    } else {
        (texture.min_filter, texture.mag_filter)
    };
    env.backend.set_filter(unit, min, mag);

    // Depth read as color has a fixed channel layout.
    if base != TextureBaseFormat::X8U24 {
        match texture.format.declared_swizzle() {
            Some(declared) => {
                let mapping = reconcile_swizzle(declared, resolved.surface_swizzle);
                env.backend.set_swizzle(unit, mapping);
            }
            None => debug!(
                unit,
                ?base,
                swizzle = texture.format.swizzle,
                "format declares no swizzle; keeping sampler default"
            ),
        }
    }

    if env.config.dump_textures {
        let config = env.config;
        let dumper = ctx
            .dumper
            .get_or_insert_with(|| TextureDumper::new(&config.dump_root, &config.title_id));
        if let Err(err) = dumper.dump(record.fragment_program.as_ref(), unit, texture, data) {
            warn!(unit, "{err}");
        }
    }

    match resolved.outcome {
        BindingOutcome::SelfSample { .. } => ctx.stats.inc_self_sample_binds(),
        BindingOutcome::SurfaceAlias { .. } => ctx.stats.inc_surface_alias_binds(),
        BindingOutcome::ExternalUpload { .. } => ctx.stats.inc_external_uploads(),
        BindingOutcome::Skipped(_) => {}
    }
    resolved.outcome
}

/// Resolve every unit that has a texture, in unit order.
///
/// Units without a texture leave the self-sampling set.
pub fn sync_textures(
    ctx: &mut RenderContext,
    env: &mut DrawEnv<'_>,
    record: &PipelineRecordState,
) -> Vec<(u32, BindingOutcome)> {
    let mut outcomes = Vec::new();
    for (unit, slot) in record.textures.iter().enumerate() {
        let unit = unit as u32;
        match slot {
            Some(texture) => {
                let outcome = resolve_texture_unit(ctx, env, record, unit, texture);
                outcomes.push((unit, outcome));
            }
            None => {
                ctx.self_sampling.remove(unit);
            }
        }
    }
    outcomes
}

fn upload_external(
    env: &mut DrawEnv<'_>,
    unit: u32,
    texture: &TextureDescriptor,
    data: &[u8],
) -> Resolved {
    let cached = env.config.texture_cache;
    if cached {
        env.textures.cache_and_bind(unit, texture, data, &mut *env.backend);
    } else {
        env.textures.bind_direct(unit, texture, data, &mut *env.backend);
    }
    trace!(unit, addr = texture.data_addr, cached, "texture uploaded from guest memory");
    Resolved {
        outcome: BindingOutcome::ExternalUpload { cached },
        only_nearest: false,
        surface_swizzle: None,
    }
}

/// Log and count a skipped unit. A skipped unit keeps its host binding, so it only stays in
/// the self-sampling set while its address still matches the color surface.
fn skip(
    ctx: &mut RenderContext,
    record: &PipelineRecordState,
    unit: u32,
    texture: &TextureDescriptor,
    err: SyncError,
) -> BindingOutcome {
    if !record.is_color_surface_addr(texture.data_addr) {
        ctx.self_sampling.remove(unit);
    }
    warn!(unit, addr = texture.data_addr, "skipping texture: {err}");
    ctx.stats.inc_skipped_units();
    BindingOutcome::Skipped(err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{BackendCall, HostBuffer, RecordingBackend};
    use crate::config::RendererConfig;
    use crate::guest_memory::VecGuestMemory;
    use crate::gxm::{ColorBaseFormat, ColorFormat, ColorSurface, ColorSwizzle, TextureFormat};
    use crate::surface_cache::SurfaceTable;
    use crate::swizzle::ChannelSource::{Alpha as A, Blue as B, Green as G, Red as R};
    use crate::texture_cache::RecordingTextureCache;
    use crate::vertex_ring::{HeapMappedBuffer, VertexRingConfig, VertexStreamRing};

    const RAM_BASE: u32 = 0x8100_0000;

    fn context() -> RenderContext {
        let config = VertexRingConfig {
            per_frame_size: 256,
            frames_in_flight: 1,
            alignment: 16,
        };
        let ring = VertexStreamRing::new(
            Box::new(HeapMappedBuffer::new(HostBuffer(9), 256)),
            config,
        )
        .unwrap();
        RenderContext::new(ring)
    }

    fn rgba(addr: u32) -> TextureDescriptor {
        // ARGB selector.
        TextureDescriptor::new(addr, TextureFormat::new(TextureBaseFormat::U8U8U8U8, 1), 8, 8)
    }

    #[test]
    fn null_palette_is_skipped_without_backend_calls() {
        let mem = VecGuestMemory::new(RAM_BASE, 0x1000);
        let surfaces = SurfaceTable::new();
        let mut textures = RecordingTextureCache::new();
        let mut backend = RecordingBackend::new();
        let config = RendererConfig::default();
        let mut env = DrawEnv {
            config: &config,
            mem: &mem,
            surfaces: &surfaces,
            textures: &mut textures,
            backend: &mut backend,
        };
        let mut ctx = context();
        let record = PipelineRecordState::default();

        let tex =
            TextureDescriptor::new(RAM_BASE, TextureFormat::new(TextureBaseFormat::P8, 0), 8, 8);
        let outcome = resolve_texture_unit(&mut ctx, &mut env, &record, 0, &tex);
        assert_eq!(
            outcome,
            BindingOutcome::Skipped(SyncError::NullPalette {
                unit: 0,
                format: TextureBaseFormat::P8,
            })
        );
        assert!(backend.calls.is_empty());
        assert_eq!(ctx.stats.snapshot().skipped_units, 1);
        assert_eq!(ctx.shader_hints.fragment_textures[0], None);
    }

    #[test]
    fn out_of_range_unit_is_rejected() {
        let mem = VecGuestMemory::new(RAM_BASE, 0x1000);
        let surfaces = SurfaceTable::new();
        let mut textures = RecordingTextureCache::new();
        let mut backend = RecordingBackend::new();
        let config = RendererConfig::default();
        let mut env = DrawEnv {
            config: &config,
            mem: &mem,
            surfaces: &surfaces,
            textures: &mut textures,
            backend: &mut backend,
        };
        let mut ctx = context();

        let outcome = resolve_texture_unit(
            &mut ctx,
            &mut env,
            &PipelineRecordState::default(),
            32,
            &rgba(RAM_BASE),
        );
        assert_eq!(
            outcome,
            BindingOutcome::Skipped(SyncError::UnitOutOfRange { unit: 32, max: 32 })
        );
    }

    #[test]
    fn self_sample_reconciles_against_the_render_target_order() {
        let mem = VecGuestMemory::new(RAM_BASE, 0x1000);
        let surfaces = SurfaceTable::new();
        let mut textures = RecordingTextureCache::new();
        let mut backend = RecordingBackend::new();
        let config = RendererConfig::default();
        let mut env = DrawEnv {
            config: &config,
            mem: &mem,
            surfaces: &surfaces,
            textures: &mut textures,
            backend: &mut backend,
        };
        let mut ctx = context();
        ctx.current_color_attachment = Some(HostTexture(42));
        let record = PipelineRecordState {
            color_surface: Some(ColorSurface {
                data_addr: RAM_BASE,
                width: 8,
                height: 8,
                stride_pixels: 8,
                format: ColorFormat::new(ColorBaseFormat::U8U8U8U8, ColorSwizzle::Argb),
            }),
            ..Default::default()
        };

        let outcome = resolve_texture_unit(&mut ctx, &mut env, &record, 4, &rgba(RAM_BASE));
        assert_eq!(
            outcome,
            BindingOutcome::SelfSample {
                handle: HostTexture(42)
            }
        );
        assert!(ctx.self_sampling.contains(4));
        assert_eq!(
            backend.unit_calls(4),
            [
                BackendCall::BindTexture {
                    unit: 4,
                    texture: HostTexture(42),
                },
                BackendCall::SetFilter {
                    unit: 4,
                    min: FilterMode::Linear,
                    mag: FilterMode::Linear,
                },
                BackendCall::SetSwizzle {
                    unit: 4,
                    mapping: SwizzleMapping::IDENTITY,
                },
            ]
        );
        assert!(textures.uploads.is_empty());
    }

    #[test]
    fn self_sample_without_attachment_falls_back_to_upload() {
        let mem = VecGuestMemory::new(RAM_BASE, 0x1000);
        let surfaces = SurfaceTable::new();
        let mut textures = RecordingTextureCache::new();
        let mut backend = RecordingBackend::new();
        let config = RendererConfig {
            texture_cache: false,
            ..Default::default()
        };
        let mut env = DrawEnv {
            config: &config,
            mem: &mem,
            surfaces: &surfaces,
            textures: &mut textures,
            backend: &mut backend,
        };
        let mut ctx = context();
        let record = PipelineRecordState {
            color_surface: Some(ColorSurface {
                data_addr: RAM_BASE,
                width: 8,
                height: 8,
                stride_pixels: 8,
                format: ColorFormat::new(ColorBaseFormat::U8U8U8U8, ColorSwizzle::Abgr),
            }),
            ..Default::default()
        };

        let outcome = resolve_texture_unit(&mut ctx, &mut env, &record, 0, &rgba(RAM_BASE));
        assert_eq!(outcome, BindingOutcome::ExternalUpload { cached: false });
        assert!(ctx.self_sampling.contains(0));
        assert_eq!(
            backend.unit_calls(0).last(),
            Some(&BackendCall::SetSwizzle {
                unit: 0,
                mapping: SwizzleMapping([B, G, R, A]),
            })
        );
    }
}
