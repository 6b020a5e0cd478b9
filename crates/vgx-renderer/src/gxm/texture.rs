use super::format::{TextureBaseFormat, TextureFormat};

/// Number of fragment texture units; vertex texture units follow them.
pub const MAX_TEXTURE_UNITS: usize = 16;
/// Fragment units `0..16` plus vertex units `16..32`.
pub const TOTAL_TEXTURE_UNITS: usize = MAX_TEXTURE_UNITS * 2;

/// Row alignment (in pixels) of linear textures.
pub const LINEAR_ROW_ALIGNMENT: u32 = 8;
/// Edge length of a texture tile.
pub const TILE_SIZE: u32 = 32;

/// Memory layout of a texture's texels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureLayout {
    Linear,
    LinearStrided { stride_bytes: u32 },
    /// 32x32 pixel tiles.
    Tiled,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum FilterMode {
    Nearest,
    #[default]
    Linear,
}

/// A texture as described by the guest's texture control words.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureDescriptor {
    pub data_addr: u32,
    pub format: TextureFormat,
    pub width: u16,
    pub height: u16,
    pub layout: TextureLayout,
    /// Zero when the texture has no palette.
    pub palette_addr: u32,
    pub mip_count: u8,
    pub min_filter: FilterMode,
    pub mag_filter: FilterMode,
}

impl TextureDescriptor {
    /// Single-level linear texture with linear filtering.
    pub fn new(data_addr: u32, format: TextureFormat, width: u16, height: u16) -> Self {
        Self {
            data_addr,
            format,
            width,
            height,
            layout: TextureLayout::Linear,
            palette_addr: 0,
            mip_count: 1,
            min_filter: FilterMode::Linear,
            mag_filter: FilterMode::Linear,
        }
    }

    pub fn with_layout(mut self, layout: TextureLayout) -> Self {
        self.layout = layout;
        self
    }

    pub fn base_format(&self) -> TextureBaseFormat {
        self.format.base
    }

    /// Row stride in pixels of the top mip level.
    pub fn stride_in_pixels(&self) -> u32 {
        effective_stride_in_pixels(self.layout, self.format.base, u32::from(self.width))
    }

    /// Bytes spanned by every mip level, used to validate the backing range.
    pub fn size_in_bytes(&self) -> usize {
        let base = self.format.base;
        let levels = u32::from(self.mip_count.max(1));
        let mut total = 0u64;

        for level in 0..levels {
            let w = (u32::from(self.width) >> level).max(1);
            let h = (u32::from(self.height) >> level).max(1);

            let bytes = if base.is_block_compressed() {
                let blocks = u64::from(w.div_ceil(4)) * u64::from(h.div_ceil(4));
                blocks * u64::from(base.bits_per_pixel()) * 16 / 8
            } else {
                let stride = u64::from(effective_stride_in_pixels(self.layout, base, w));
                let rows = match self.layout {
                    TextureLayout::Tiled => u64::from(h.next_multiple_of(TILE_SIZE)),
                    _ => u64::from(h),
                };
                (stride * rows * u64::from(base.bits_per_pixel())).div_ceil(8)
            };

            total += bytes;

            // Strided textures have a single level.
            if matches!(self.layout, TextureLayout::LinearStrided { .. }) {
                break;
            }
        }

        total as usize
    }
}

/// Row stride in pixels of a `width`-pixel wide level.
///
/// * strided: the explicit byte stride divided by whole bytes per pixel,
/// * linear: width rounded up to 8 pixels,
/// * tiled: width rounded up to a whole tile (32 pixels).
pub fn effective_stride_in_pixels(
    layout: TextureLayout,
    base: TextureBaseFormat,
    width: u32,
) -> u32 {
    match layout {
        TextureLayout::LinearStrided { stride_bytes } => stride_bytes / base.bytes_per_pixel(),
        TextureLayout::Linear => width.next_multiple_of(LINEAR_ROW_ALIGNMENT),
        TextureLayout::Tiled => width.next_multiple_of(TILE_SIZE),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rgba(width: u16, height: u16) -> TextureDescriptor {
        TextureDescriptor::new(
            0x8100_0000,
            TextureFormat::new(TextureBaseFormat::U8U8U8U8, 0),
            width,
            height,
        )
    }

    #[test]
    fn stride_follows_layout_rule() {
        let tex = rgba(100, 10);
        assert_eq!(tex.stride_in_pixels(), 104);
        assert_eq!(tex.with_layout(TextureLayout::Tiled).stride_in_pixels(), 128);
        assert_eq!(
            tex.with_layout(TextureLayout::LinearStrided { stride_bytes: 512 })
                .stride_in_pixels(),
            128
        );
    }

    #[test]
    fn strided_stride_uses_whole_bytes_per_pixel() {
        let tex = TextureDescriptor::new(
            0,
            TextureFormat::new(TextureBaseFormat::U5U6U5, 0),
            30,
            4,
        )
        .with_layout(TextureLayout::LinearStrided { stride_bytes: 64 });
        assert_eq!(tex.stride_in_pixels(), 32);
    }

    #[test]
    fn size_covers_aligned_rows() {
        assert_eq!(rgba(100, 10).size_in_bytes(), 104 * 10 * 4);
        assert_eq!(
            rgba(100, 10).with_layout(TextureLayout::Tiled).size_in_bytes(),
            128 * 32 * 4
        );
    }

    #[test]
    fn size_sums_mip_levels() {
        let mut tex = rgba(16, 16);
        tex.mip_count = 3;
        // 16x16, 8x8, 4x4 with linear rows aligned to 8 pixels.
        assert_eq!(tex.size_in_bytes(), (16 * 16 + 8 * 8 + 8 * 4) * 4);
    }

    #[test]
    fn block_compressed_size_counts_blocks() {
        let tex = TextureDescriptor::new(
            0,
            TextureFormat::new(TextureBaseFormat::Ubc1, 0),
            10,
            10,
        );
        // 3x3 blocks of 8 bytes.
        assert_eq!(tex.size_in_bytes(), 9 * 8);
    }
}
