//! Guest memory abstraction used by the per-draw sync code.
//!
//! The emulator's memory system owns the real address space; the renderer only needs to
//! validate a range and borrow its bytes for the duration of a draw.

use std::ops::Range;

use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum GuestMemoryError {
    #[error("guest memory range out of bounds: addr=0x{addr:08x}, len=0x{len:x}")]
    OutOfBounds { addr: u32, len: usize },
    #[error("guest memory range overlaps freed memory: addr=0x{addr:08x}, len=0x{len:x}")]
    Freed { addr: u32, len: usize },
}

/// Minimal guest memory interface.
pub trait GuestMemory {
    /// Validate `addr..addr + len` and borrow its bytes.
    fn read(&self, addr: u32, len: usize) -> Result<&[u8], GuestMemoryError>;

    fn is_valid_range(&self, addr: u32, len: usize) -> bool {
        self.read(addr, len).is_ok()
    }
}

/// Contiguous in-memory guest RAM for tests and tools.
///
/// The address space starts at `base`. Ranges can be marked as freed to emulate the guest
/// releasing memory that a stale descriptor still points at.
#[derive(Clone, Debug)]
pub struct VecGuestMemory {
    base: u32,
    data: Vec<u8>,
    freed: Vec<Range<u64>>,
}

impl VecGuestMemory {
    pub fn new(base: u32, size_bytes: usize) -> Self {
        Self {
            base,
            data: vec![0u8; size_bytes],
            freed: Vec::new(),
        }
    }

    pub fn base(&self) -> u32 {
        self.base
    }

    fn span(&self, addr: u32, len: usize) -> Result<Range<usize>, GuestMemoryError> {
        let oob = GuestMemoryError::OutOfBounds { addr, len };
        let start = addr.checked_sub(self.base).ok_or(oob.clone())? as usize;
        let end = start.checked_add(len).ok_or(oob.clone())?;
        if end > self.data.len() {
            return Err(oob);
        }
        Ok(start..end)
    }

    pub fn write(&mut self, addr: u32, src: &[u8]) -> Result<(), GuestMemoryError> {
        let span = self.span(addr, src.len())?;
        self.data[span].copy_from_slice(src);
        Ok(())
    }

    /// Mark `addr..addr + len` as freed; later reads touching it fail.
    pub fn free(&mut self, addr: u32, len: usize) {
        let start = u64::from(addr);
        self.freed.push(start..start + len as u64);
    }
}

impl GuestMemory for VecGuestMemory {
    fn read(&self, addr: u32, len: usize) -> Result<&[u8], GuestMemoryError> {
        let span = self.span(addr, len)?;
        let start = u64::from(addr);
        let end = start + len as u64;
        if self.freed.iter().any(|r| r.start < end && start < r.end) {
            return Err(GuestMemoryError::Freed { addr, len });
        }
        Ok(&self.data[span])
    }
}
