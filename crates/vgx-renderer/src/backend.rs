//! Host graphics backend abstraction.
//!
//! The sync code targets a conventional immediate-mode bind/set API. Production builds forward
//! these calls to the host driver; tests use [`RecordingBackend`] to observe them.

use crate::gxm::{AttributeType, FilterMode};
use crate::swizzle::SwizzleMapping;

/// Host texture object. Handles are borrowed: whoever created the texture owns its lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HostTexture(pub u32);

/// Host buffer object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HostBuffer(pub u32);

/// How vertex attribute components reach the shader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeUpload {
    /// Components are passed through as integers.
    Integer,
    /// Components are converted to floats, optionally normalized.
    Float { normalized: bool },
}

/// One `set_vertex_attribute` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexAttributePointer {
    pub components: u8,
    pub ty: AttributeType,
    pub upload: AttributeUpload,
    pub stride: u32,
    /// Byte offset inside the bound vertex buffer.
    pub offset: u64,
}

pub trait GraphicsBackend {
    fn bind_texture(&mut self, unit: u32, texture: HostTexture);
    fn set_filter(&mut self, unit: u32, min: FilterMode, mag: FilterMode);
    fn set_swizzle(&mut self, unit: u32, mapping: SwizzleMapping);

    /// Bind the buffer vertex attribute offsets refer to; `None` unbinds.
    fn bind_vertex_buffer(&mut self, buffer: Option<HostBuffer>);
    fn set_vertex_attribute(&mut self, location: u32, pointer: VertexAttributePointer);
    fn enable_vertex_attribute(&mut self, location: u32);
    fn set_attribute_divisor(&mut self, location: u32, divisor: u32);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendCall {
    BindTexture { unit: u32, texture: HostTexture },
    SetFilter {
        unit: u32,
        min: FilterMode,
        mag: FilterMode,
    },
    SetSwizzle { unit: u32, mapping: SwizzleMapping },
    BindVertexBuffer(Option<HostBuffer>),
    SetVertexAttribute {
        location: u32,
        pointer: VertexAttributePointer,
    },
    EnableVertexAttribute(u32),
    SetAttributeDivisor { location: u32, divisor: u32 },
}

/// Backend that records every call in order.
#[derive(Debug, Default)]
pub struct RecordingBackend {
    pub calls: Vec<BackendCall>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn take_calls(&mut self) -> Vec<BackendCall> {
        std::mem::take(&mut self.calls)
    }

    /// Calls that target texture `unit`.
    pub fn unit_calls(&self, unit: u32) -> Vec<BackendCall> {
        self.calls
            .iter()
            .copied()
            .filter(|call| match *call {
                BackendCall::BindTexture { unit: u, .. }
                | BackendCall::SetFilter { unit: u, .. }
                | BackendCall::SetSwizzle { unit: u, .. } => u == unit,
                _ => false,
            })
            .collect()
    }

    /// Calls that target vertex attribute `location`.
    pub fn location_calls(&self, location: u32) -> Vec<BackendCall> {
        self.calls
            .iter()
            .copied()
            .filter(|call| match *call {
                BackendCall::SetVertexAttribute { location: l, .. }
                | BackendCall::SetAttributeDivisor { location: l, .. }
                | BackendCall::EnableVertexAttribute(l) => l == location,
                _ => false,
            })
            .collect()
    }
}

impl GraphicsBackend for RecordingBackend {
    fn bind_texture(&mut self, unit: u32, texture: HostTexture) {
        self.calls.push(BackendCall::BindTexture { unit, texture });
    }

    fn set_filter(&mut self, unit: u32, min: FilterMode, mag: FilterMode) {
        self.calls.push(BackendCall::SetFilter { unit, min, mag });
    }

    fn set_swizzle(&mut self, unit: u32, mapping: SwizzleMapping) {
        self.calls.push(BackendCall::SetSwizzle { unit, mapping });
    }

    fn bind_vertex_buffer(&mut self, buffer: Option<HostBuffer>) {
        self.calls.push(BackendCall::BindVertexBuffer(buffer));
    }

    fn set_vertex_attribute(&mut self, location: u32, pointer: VertexAttributePointer) {
        self.calls.push(BackendCall::SetVertexAttribute { location, pointer });
    }

    fn enable_vertex_attribute(&mut self, location: u32) {
        self.calls.push(BackendCall::EnableVertexAttribute(location));
    }

    fn set_attribute_divisor(&mut self, location: u32, divisor: u32) {
        self.calls.push(BackendCall::SetAttributeDivisor { location, divisor });
    }
}
