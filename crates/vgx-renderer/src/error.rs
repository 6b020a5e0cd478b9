use thiserror::Error;

use crate::gxm::TextureBaseFormat;
use crate::guest_memory::GuestMemoryError;
use crate::vertex_ring::RingBufferError;

/// Why a texture unit was left with its previous binding.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    #[error("texture unit {unit} out of range (max {max})")]
    UnitOutOfRange { unit: u32, max: u32 },
    #[error("texture unit {unit}: data at {addr:#010x} ({size} bytes) is not readable")]
    InvalidTextureMemory {
        unit: u32,
        addr: u32,
        size: usize,
        #[source]
        source: GuestMemoryError,
    },
    #[error("texture unit {unit}: paletted format {format:?} has a null palette address")]
    NullPalette {
        unit: u32,
        format: TextureBaseFormat,
    },
}

/// Why a vertex stream's pending data was not staged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StreamUploadError {
    #[error("stream data not readable: {0}")]
    InvalidMemory(#[from] GuestMemoryError),
    #[error(transparent)]
    Ring(#[from] RingBufferError),
}
