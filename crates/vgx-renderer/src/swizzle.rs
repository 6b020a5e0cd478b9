//! Channel swizzles and surface/texture swizzle reconciliation.
//!
//! Render targets are stored in one canonical channel order in backing memory. When a texture
//! view of the same memory declares a different nominal channel order, the view must be
//! remapped on the host sampler instead of copying any data.

use std::fmt;

/// Source of one output channel of a sampler swizzle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelSource {
    Red,
    Green,
    Blue,
    Alpha,
    Zero,
    One,
}

impl ChannelSource {
    const COLORS: [ChannelSource; 4] = [
        ChannelSource::Red,
        ChannelSource::Green,
        ChannelSource::Blue,
        ChannelSource::Alpha,
    ];

    /// Host channel index (`0..4`) for color sources, `None` for fixed values.
    pub fn color_index(self) -> Option<usize> {
        match self {
            ChannelSource::Red => Some(0),
            ChannelSource::Green => Some(1),
            ChannelSource::Blue => Some(2),
            ChannelSource::Alpha => Some(3),
            ChannelSource::Zero | ChannelSource::One => None,
        }
    }

    pub fn is_color(self) -> bool {
        self.color_index().is_some()
    }

    /// Color source reading host channel `index`. Panics on `index >= 4`.
    pub fn from_color_index(index: usize) -> Self {
        Self::COLORS[index]
    }
}

/// Per-output-channel swizzle, in `[r, g, b, a]` output order.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct SwizzleMapping(pub [ChannelSource; 4]);

impl SwizzleMapping {
    pub const IDENTITY: SwizzleMapping = SwizzleMapping(ChannelSource::COLORS);

    pub fn channels(&self) -> &[ChannelSource; 4] {
        &self.0
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }
}

impl fmt::Debug for SwizzleMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SwizzleMapping(")?;
        for c in self.0 {
            let ch = match c {
                ChannelSource::Red => 'R',
                ChannelSource::Green => 'G',
                ChannelSource::Blue => 'B',
                ChannelSource::Alpha => 'A',
                ChannelSource::Zero => '0',
                ChannelSource::One => '1',
            };
            write!(f, "{ch}")?;
        }
        f.write_str(")")
    }
}

/// Compute the host swizzle for a texture sampled through a resolved surface.
///
/// * No surface swizzle (data uploaded from guest memory): the declared swizzle is used as-is.
/// * Identical swizzles: the surface already holds the channel order the texture expects, so
///   the identity mapping is used.
/// * Otherwise fixed `0`/`1` outputs pass through, and each color output reads the host channel
///   at which the surface stores the declared channel. A declared channel the surface does not
///   store at all keeps its declared source.
pub fn reconcile_swizzle(
    declared: SwizzleMapping,
    surface: Option<SwizzleMapping>,
) -> SwizzleMapping {
    let Some(surface) = surface else {
        return declared;
    };

    if surface == declared {
        return SwizzleMapping::IDENTITY;
    }

    let mut out = declared.0;
    for (dst, &wanted) in out.iter_mut().zip(declared.0.iter()) {
        if !wanted.is_color() {
            continue;
        }
        if let Some(j) = surface.0.iter().position(|&s| s == wanted) {
            *dst = ChannelSource::from_color_index(j);
        }
    }
    SwizzleMapping(out)
}
