//! Guest texture and color surface formats.
//!
//! Swizzle tables follow the guest naming convention: a swizzle name lists components from the
//! most significant to the least significant bits, so for byte-sized components the last letter
//! lands in the first byte in memory and is therefore read by the host's red channel.

use crate::swizzle::ChannelSource::{Alpha as A, Blue as B, Green as G, One, Red as R, Zero};
use crate::swizzle::SwizzleMapping;

/// Texture base format (component layout without swizzle).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureBaseFormat {
    U8,
    U4U4U4U4,
    U1U5U5U5,
    U5U6U5,
    U8U8,
    F16,
    U8U8U8U8,
    U2U10U10U10,
    F16F16,
    F32,
    /// Depth data read as color (24-bit depth in the low bits).
    X8U24,
    F11F11F10,
    U32,
    F16F16F16F16,
    F32F32,
    Pvrt2Bpp,
    Pvrt4Bpp,
    Ubc1,
    Ubc2,
    Ubc3,
    P4,
    P8,
}

impl TextureBaseFormat {
    pub fn bits_per_pixel(self) -> u32 {
        use TextureBaseFormat::*;
        match self {
            Pvrt2Bpp => 2,
            Pvrt4Bpp | Ubc1 | P4 => 4,
            U8 | Ubc2 | Ubc3 | P8 => 8,
            U4U4U4U4 | U1U5U5U5 | U5U6U5 | U8U8 | F16 => 16,
            U8U8U8U8 | U2U10U10U10 | F16F16 | F32 | X8U24 | F11F11F10 | U32 => 32,
            F16F16F16F16 | F32F32 => 64,
        }
    }

    /// Whole bytes per pixel, rounding sub-byte formats up.
    pub fn bytes_per_pixel(self) -> u32 {
        (self.bits_per_pixel() + 7) >> 3
    }

    /// Number of channels stored per texel (palette indices count as one).
    pub fn channel_count(self) -> u8 {
        use TextureBaseFormat::*;
        match self {
            U8 | F16 | F32 | X8U24 | U32 | P4 | P8 => 1,
            U8U8 | F16F16 | F32F32 => 2,
            U5U6U5 | F11F11F10 => 3,
            U4U4U4U4 | U1U5U5U5 | U8U8U8U8 | U2U10U10U10 | F16F16F16F16 | Pvrt2Bpp | Pvrt4Bpp
            | Ubc1 | Ubc2 | Ubc3 => 4,
        }
    }

    pub fn is_paletted(self) -> bool {
        matches!(self, TextureBaseFormat::P4 | TextureBaseFormat::P8)
    }

    pub fn is_block_compressed(self) -> bool {
        use TextureBaseFormat::*;
        matches!(self, Pvrt2Bpp | Pvrt4Bpp | Ubc1 | Ubc2 | Ubc3)
    }

    /// The color surface base format that stores texels with this layout, if any.
    ///
    /// Paletted, block-compressed and depth formats can never alias a color surface.
    pub fn to_color_base(self) -> Option<ColorBaseFormat> {
        use TextureBaseFormat as T;
        let out = match self {
            T::U8 => ColorBaseFormat::U8,
            T::U4U4U4U4 => ColorBaseFormat::U4U4U4U4,
            T::U1U5U5U5 => ColorBaseFormat::U1U5U5U5,
            T::U5U6U5 => ColorBaseFormat::U5U6U5,
            T::U8U8 => ColorBaseFormat::U8U8,
            T::F16 => ColorBaseFormat::F16,
            T::U8U8U8U8 => ColorBaseFormat::U8U8U8U8,
            T::U2U10U10U10 => ColorBaseFormat::U2U10U10U10,
            T::F16F16 => ColorBaseFormat::F16F16,
            T::F32 => ColorBaseFormat::F32,
            T::F11F11F10 => ColorBaseFormat::F11F11F10,
            T::F16F16F16F16 => ColorBaseFormat::F16F16F16F16,
            T::F32F32 => ColorBaseFormat::F32F32,
            T::X8U24
            | T::U32
            | T::Pvrt2Bpp
            | T::Pvrt4Bpp
            | T::Ubc1
            | T::Ubc2
            | T::Ubc3
            | T::P4
            | T::P8 => return None,
        };
        Some(out)
    }
}

/// Full texture format: base layout plus the raw 3-bit swizzle selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureFormat {
    pub base: TextureBaseFormat,
    pub swizzle: u8,
}

impl TextureFormat {
    pub const fn new(base: TextureBaseFormat, swizzle: u8) -> Self {
        Self { base, swizzle }
    }

    /// Swizzle the format declares for sampling, or `None` for selectors the base layout does
    /// not define.
    pub fn declared_swizzle(&self) -> Option<SwizzleMapping> {
        let m = match (self.base.channel_count(), self.swizzle) {
            // R, 000R, 111R, RRRR, 0RRR, 1RRR, R000, R111
            (1, 0) => [R, Zero, Zero, One],
            (1, 1) => [R, Zero, Zero, Zero],
            (1, 2) => [R, One, One, One],
            (1, 3) => [R, R, R, R],
            (1, 4) => [R, R, R, Zero],
            (1, 5) => [R, R, R, One],
            (1, 6) => [Zero, Zero, Zero, R],
            (1, 7) => [One, One, One, R],
            // GR, 00GR, GRRR, RGGG, GRGR, 00RG
            (2, 0) => [R, G, Zero, One],
            (2, 1) => [R, G, Zero, Zero],
            (2, 2) => [R, R, R, G],
            (2, 3) => [G, G, G, R],
            (2, 4) => [R, G, R, G],
            (2, 5) => [G, R, Zero, Zero],
            // BGR, RGB
            (3, 0) => [R, G, B, One],
            (3, 1) => [B, G, R, One],
            // ABGR, ARGB, RGBA, BGRA, 1BGR, 1RGB, RGB1, BGR1
            (4, 0) => [R, G, B, A],
            (4, 1) => [B, G, R, A],
            (4, 2) => [A, B, G, R],
            (4, 3) => [G, B, A, R],
            (4, 4) => [R, G, B, One],
            (4, 5) => [B, G, R, One],
            (4, 6) => [A, B, G, One],
            (4, 7) => [G, B, A, One],
            _ => return None,
        };
        Some(SwizzleMapping(m))
    }
}

/// Color surface base format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorBaseFormat {
    U8,
    U4U4U4U4,
    U1U5U5U5,
    U5U6U5,
    U8U8,
    F16,
    U8U8U8U8,
    U2U10U10U10,
    F16F16,
    F32,
    F11F11F10,
    F16F16F16F16,
    F32F32,
}

impl ColorBaseFormat {
    pub fn channel_count(self) -> u8 {
        use ColorBaseFormat::*;
        match self {
            U8 | F16 | F32 => 1,
            U8U8 | F16F16 | F32F32 => 2,
            U5U6U5 | F11F11F10 => 3,
            U4U4U4U4 | U1U5U5U5 | U8U8U8U8 | U2U10U10U10 | F16F16F16F16 => 4,
        }
    }

    /// Whether sampling a surface of this format must use nearest filtering.
    ///
    /// 32-bit float surfaces are not linearly filterable on every host.
    pub fn requires_nearest_filtering(self) -> bool {
        matches!(self, ColorBaseFormat::F32 | ColorBaseFormat::F32F32)
    }
}

/// Channel order a color surface is written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorSwizzle {
    Abgr,
    Argb,
    Rgba,
    Bgra,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ColorFormat {
    pub base: ColorBaseFormat,
    pub swizzle: ColorSwizzle,
}

impl ColorFormat {
    pub const fn new(base: ColorBaseFormat, swizzle: ColorSwizzle) -> Self {
        Self { base, swizzle }
    }

    /// Channel order in which the surface's texels are stored, as seen by a host sampler.
    ///
    /// For fewer than four channels the selector picks among the orders the width supports
    /// (`R`/`A` for one channel, `GR`/`RG`/`RA`/`AR` for two).
    pub fn storage_swizzle(&self) -> SwizzleMapping {
        use ColorSwizzle::*;
        let m = match (self.base.channel_count(), self.swizzle) {
            (1, Abgr | Rgba) => [R, Zero, Zero, One],
            (1, Argb | Bgra) => [Zero, Zero, Zero, R],
            (2, Abgr) => [R, G, Zero, One],
            (2, Argb) => [G, R, Zero, One],
            (2, Rgba) => [G, Zero, Zero, R],
            (2, Bgra) => [R, Zero, Zero, G],
            (3, Abgr | Rgba) => [R, G, B, One],
            (3, Argb | Bgra) => [B, G, R, One],
            (_, Abgr) => [R, G, B, A],
            (_, Argb) => [B, G, R, A],
            (_, Rgba) => [A, B, G, R],
            (_, Bgra) => [G, B, A, R],
        };
        SwizzleMapping(m)
    }
}
