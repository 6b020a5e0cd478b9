use std::fmt;

use thiserror::Error;

use crate::backend::HostBuffer;

/// Host-visible, persistently mapped buffer backing the vertex ring.
pub trait MappedBuffer: fmt::Debug {
    fn handle(&self) -> HostBuffer;
    fn bytes_mut(&mut self) -> &mut [u8];
}

/// Mapped buffer backed by host heap memory.
#[derive(Debug)]
pub struct HeapMappedBuffer {
    handle: HostBuffer,
    data: Vec<u8>,
}

impl HeapMappedBuffer {
    pub fn new(handle: HostBuffer, size_bytes: usize) -> Self {
        Self {
            handle,
            data: vec![0u8; size_bytes],
        }
    }
}

impl MappedBuffer for HeapMappedBuffer {
    fn handle(&self) -> HostBuffer {
        self.handle
    }

    fn bytes_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }
}

#[derive(Debug, Clone, Copy)]
pub struct VertexRingConfig {
    /// Bytes available to one frame.
    pub per_frame_size: u64,
    /// Frames the GPU may still be reading from while the CPU writes the next one.
    pub frames_in_flight: usize,
    /// Alignment of every allocation's offset.
    pub alignment: u64,
}

impl Default for VertexRingConfig {
    fn default() -> Self {
        Self {
            per_frame_size: 8 * 1024 * 1024,
            frames_in_flight: 3,
            alignment: 16,
        }
    }
}

impl VertexRingConfig {
    /// Mapped bytes a ring built from this config needs.
    pub fn required_size(&self) -> Option<u64> {
        self.per_frame_size
            .checked_next_multiple_of(self.alignment.max(1))?
            .checked_mul(self.frames_in_flight as u64)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RingBufferError {
    #[error("invalid vertex ring config: {0}")]
    InvalidConfig(&'static str),
    #[error("mapped buffer too small for vertex ring: need {required} bytes, have {available}")]
    BufferTooSmall { required: u64, available: u64 },
    #[error(
        "vertex ring out of space: requested {requested} bytes, remaining {remaining} bytes (per-frame capacity {per_frame_capacity} bytes)"
    )]
    OutOfSpace {
        requested: u64,
        remaining: u64,
        per_frame_capacity: u64,
    },
}

/// A region handed out by [`VertexStreamRing::allocate`].
#[derive(Debug)]
pub struct RingAllocation<'a> {
    /// Host-visible bytes to fill, exactly as long as requested.
    pub data: &'a mut [u8],
    /// Offset of `data` inside the ring buffer.
    pub offset: u64,
}

/// Transient vertex data arena shared by every draw.
///
/// The mapped buffer is split into `frames_in_flight` equal segments. Each frame bump-allocates
/// from the next segment, so a region is only rewritten after the GPU has had
/// `frames_in_flight - 1` further frames to finish reading it.
#[derive(Debug)]
pub struct VertexStreamRing {
    buffer: Box<dyn MappedBuffer>,
    /// Bytes used in each frame's segment, relative to the segment start.
    cursors: Vec<u64>,
    segment_index: usize,
    per_frame_capacity: u64,
    alignment: u64,
}

impl VertexStreamRing {
    pub fn new(
        mut buffer: Box<dyn MappedBuffer>,
        config: VertexRingConfig,
    ) -> Result<Self, RingBufferError> {
        if config.frames_in_flight == 0 {
            return Err(RingBufferError::InvalidConfig(
                "frames_in_flight must be > 0",
            ));
        }
        if config.per_frame_size == 0 {
            return Err(RingBufferError::InvalidConfig("per_frame_size must be > 0"));
        }
        if !config.alignment.is_power_of_two() {
            return Err(RingBufferError::InvalidConfig(
                "alignment must be a power of two",
            ));
        }

        let required = config
            .required_size()
            .ok_or(RingBufferError::InvalidConfig("vertex ring size overflows"))?;
        let per_frame_capacity = required / config.frames_in_flight as u64;
        let available = buffer.bytes_mut().len() as u64;
        if available < required {
            return Err(RingBufferError::BufferTooSmall {
                required,
                available,
            });
        }

        Ok(Self {
            buffer,
            cursors: vec![0; config.frames_in_flight],
            segment_index: 0,
            per_frame_capacity,
            alignment: config.alignment,
        })
    }

    pub fn handle(&self) -> HostBuffer {
        self.buffer.handle()
    }

    pub fn per_frame_capacity(&self) -> u64 {
        self.per_frame_capacity
    }

    /// Bytes still available to the current frame.
    pub fn remaining(&self) -> u64 {
        self.per_frame_capacity
            .saturating_sub(self.cursors[self.segment_index])
    }

    /// Move to the next frame's segment and drop its old allocations.
    pub fn begin_frame(&mut self) {
        self.segment_index = (self.segment_index + 1) % self.cursors.len();
        self.cursors[self.segment_index] = 0;
    }

    /// Reserve `len` bytes in the current frame's segment.
    ///
    /// The returned offset is aligned to the configured alignment. Padding skipped to reach it
    /// counts against the segment.
    pub fn allocate(&mut self, len: usize) -> Result<RingAllocation<'_>, RingBufferError> {
        let requested = len as u64;
        let cursor = self.cursors[self.segment_index];
        let out_of_space = RingBufferError::OutOfSpace {
            requested,
            remaining: self.per_frame_capacity.saturating_sub(cursor),
            per_frame_capacity: self.per_frame_capacity,
        };

        // Cursors stay within the segment, so the aligned start cannot overflow.
        let start = cursor.next_multiple_of(self.alignment);
        let end = match start.checked_add(requested) {
            Some(end) if end <= self.per_frame_capacity => end,
            _ => return Err(out_of_space),
        };
        self.cursors[self.segment_index] = end;

        let offset = self.segment_index as u64 * self.per_frame_capacity + start;
        let begin = offset as usize;
        let data = &mut self.buffer.bytes_mut()[begin..begin + len];
        Ok(RingAllocation { data, offset })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ring(per_frame_size: u64, frames_in_flight: usize) -> VertexStreamRing {
        let config = VertexRingConfig {
            per_frame_size,
            frames_in_flight,
            alignment: 16,
        };
        let size = config.required_size().unwrap() as usize;
        VertexStreamRing::new(
            Box::new(HeapMappedBuffer::new(HostBuffer(1), size)),
            config,
        )
        .unwrap()
    }

    #[test]
    fn allocations_do_not_overlap_and_match_requested_size() {
        let mut ring = ring(256, 2);
        let mut ranges = Vec::new();
        for len in [12usize, 40, 1, 64] {
            let alloc = ring.allocate(len).unwrap();
            assert_eq!(alloc.data.len(), len);
            assert_eq!(alloc.offset % 16, 0);
            ranges.push(alloc.offset..alloc.offset + len as u64);
        }
        for (i, a) in ranges.iter().enumerate() {
            for b in &ranges[i + 1..] {
                assert!(a.end <= b.start || b.end <= a.start, "{a:?} overlaps {b:?}");
            }
        }
    }

    #[test]
    fn exhaustion_is_reported_and_cleared_by_the_next_frame() {
        let mut ring = ring(64, 2);
        ring.allocate(48).unwrap();
        let err = ring.allocate(32).unwrap_err();
        assert_eq!(
            err,
            RingBufferError::OutOfSpace {
                requested: 32,
                remaining: 16,
                per_frame_capacity: 64,
            }
        );

        ring.begin_frame();
        assert_eq!(ring.allocate(32).unwrap().offset, 64);

        // Wrapping back to the first segment reuses its space.
        ring.begin_frame();
        assert_eq!(ring.allocate(64).unwrap().offset, 0);
    }

    #[test]
    fn alignment_padding_counts_against_the_frame() {
        let mut ring = ring(64, 2);
        ring.begin_frame();
        assert_eq!(ring.allocate(10).unwrap().offset, 64);
        assert_eq!(ring.allocate(10).unwrap().offset, 80);
        assert_eq!(ring.remaining(), 38);

        // 38 bytes remain, but only 32 of them start on an aligned offset.
        assert_eq!(
            ring.allocate(40).unwrap_err(),
            RingBufferError::OutOfSpace {
                requested: 40,
                remaining: 38,
                per_frame_capacity: 64,
            }
        );
        let alloc = ring.allocate(32).unwrap();
        assert_eq!((alloc.offset, alloc.data.len()), (96, 32));
        assert_eq!(ring.remaining(), 0);
    }

    #[test]
    fn per_frame_size_is_rounded_up_to_the_alignment() {
        let mut ring = ring(40, 3);
        assert_eq!(ring.per_frame_capacity(), 48);
        ring.begin_frame();
        ring.begin_frame();
        assert_eq!(ring.allocate(48).unwrap().offset, 96);
        assert!(ring.allocate(1).is_err());
    }

    #[test]
    fn rejects_buffers_smaller_than_the_config() {
        let config = VertexRingConfig {
            per_frame_size: 100,
            frames_in_flight: 3,
            alignment: 16,
        };
        let err = VertexStreamRing::new(
            Box::new(HeapMappedBuffer::new(HostBuffer(1), 200)),
            config,
        )
        .unwrap_err();
        assert_eq!(
            err,
            RingBufferError::BufferTooSmall {
                required: 336,
                available: 200,
            }
        );
    }

    #[test]
    fn rejects_zero_frames_in_flight() {
        let config = VertexRingConfig {
            frames_in_flight: 0,
            ..Default::default()
        };
        assert!(matches!(
            VertexStreamRing::new(Box::new(HeapMappedBuffer::new(HostBuffer(1), 0)), config),
            Err(RingBufferError::InvalidConfig(_))
        ));
    }
}
