//! Vertex stream staging and attribute binding.

use hashbrown::HashMap;
use tracing::{debug, error, trace, warn};

use crate::backend::{AttributeUpload, VertexAttributePointer};
use crate::context::{DrawEnv, RenderContext};
use crate::error::StreamUploadError;
use crate::guest_memory::GuestMemory;
use crate::gxm::{
    AttributeFormat, AttributeInformation, AttributeType, PipelineRecordState, VertexAttribute,
    VertexStreamLayout, MAX_VERTEX_STREAMS,
};
use crate::vertex_ring::VertexStreamRing;

/// Byte distance between the consecutive vec4 elements of a register-formatted attribute.
pub const PACKED_ELEMENT_STRIDE: u64 = 16;

/// One host location configured for a guest attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttributeBinding {
    pub location: u32,
    pub pointer: VertexAttributePointer,
    /// 1 for instance-rate streams, 0 for per-vertex streams.
    pub divisor: u32,
}

/// Host locations for `attribute`, whose stream data starts at `base_offset` in the ring.
///
/// Register-formatted attributes are fetched as raw 32-bit words: their byte size is rounded up
/// to whole words and anything wider than one vec4 is spread over consecutive locations.
pub fn translate_attribute(
    attribute: &VertexAttribute,
    info: &AttributeInformation,
    stream: &VertexStreamLayout,
    base_offset: u64,
) -> Vec<AttributeBinding> {
    let location = u32::from(info.location);
    let stride = u32::from(stream.stride);
    let offset = u64::from(attribute.offset) + base_offset;
    let divisor = u32::from(stream.index_source.is_instancing());

    if info.regformat {
        let bytes = attribute.format.component_size() * u32::from(attribute.component_count);
        let components = bytes.div_ceil(4);
        if components > 4 {
            let array_size = components.div_ceil(4);
            return (0..array_size)
                .map(|i| AttributeBinding {
                    location: location + i,
                    pointer: VertexAttributePointer {
                        components: 4,
                        ty: AttributeType::I32,
                        upload: AttributeUpload::Integer,
                        stride,
                        offset: offset + u64::from(i) * PACKED_ELEMENT_STRIDE,
                    },
                    divisor,
                })
                .collect();
        }

        return vec![AttributeBinding {
            location,
            pointer: VertexAttributePointer {
                components: components as u8,
                ty: AttributeType::I32,
                upload: AttributeUpload::Integer,
                stride,
                offset,
            },
            divisor,
        }];
    }

    let upload = if attribute.format == AttributeFormat::Untyped || info.gxm_type.is_integral() {
        AttributeUpload::Integer
    } else {
        AttributeUpload::Float {
            normalized: attribute.format.is_normalized(),
        }
    };

    vec![AttributeBinding {
        location,
        pointer: VertexAttributePointer {
            components: attribute.component_count,
            ty: attribute.format.host_type(),
            upload,
            stride,
            offset,
        },
        divisor,
    }]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeSkipReason {
    /// The program declares no layout for the attribute's stream.
    MissingStream(u16),
    /// The stream's data could not be staged this draw.
    StreamNotStaged(u16),
    /// Another register already owns `location` this draw.
    LocationOverlap { location: u32, claimed_by: u16 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SkippedAttribute {
    pub reg_index: u16,
    pub reason: AttributeSkipReason,
}

/// What a call to [`stage_vertex_streams_and_bind_attributes`] did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StageReport {
    /// Streams whose pending data was copied into the ring, in stream order.
    pub uploaded_streams: Vec<usize>,
    pub failed_streams: Vec<(usize, StreamUploadError)>,
    /// Locations configured, in binding order.
    pub bound_locations: Vec<u32>,
    pub skipped_attributes: Vec<SkippedAttribute>,
}

/// Copy every pending vertex stream into the ring and bind the vertex program's attributes.
///
/// Pending stream data is consumed: after this call no stream of `record` is pending, whether
/// or not its upload succeeded. Streams without pending data keep the ring offset they were
/// last staged at. Attributes of a stream whose upload failed this draw are not bound.
pub fn stage_vertex_streams_and_bind_attributes(
    ctx: &mut RenderContext,
    env: &mut DrawEnv<'_>,
    record: &mut PipelineRecordState,
) -> StageReport {
    let mut report = StageReport::default();

    let Some(program) = record.vertex_program.as_mut() else {
        debug!("draw has no vertex program; skipping vertex streams");
        return report;
    };
    program.ensure_stripped_symbols();

    let mem = env.mem;
    let mut failed = [false; MAX_VERTEX_STREAMS];
    for (index, stream) in record.vertex_streams.iter_mut().enumerate() {
        let Some(addr) = stream.data_addr else {
            continue;
        };
        let len = stream.size as usize;
        stream.clear();
        if len == 0 {
            continue;
        }

        match stage_stream(&mut ctx.vertex_ring, mem, addr, len) {
            Ok(offset) => {
                trace!(stream = index, addr, len, offset, "staged vertex stream");
                ctx.stream_offsets[index] = offset;
                ctx.stats.add_ring_bytes_staged(len as u64);
                report.uploaded_streams.push(index);
            }
            Err(err) => {
                match &err {
                    StreamUploadError::Ring(ring_err) => {
                        ctx.stats.inc_ring_allocation_failures();
                        error!(stream = index, len, "failed to stage vertex stream: {ring_err}");
                    }
                    StreamUploadError::InvalidMemory(mem_err) => {
                        warn!(
                            stream = index,
                            addr, len, "failed to stage vertex stream: {mem_err}"
                        );
                    }
                }
                failed[index] = true;
                report.failed_streams.push((index, err));
            }
        }
    }

    env.backend.bind_vertex_buffer(Some(ctx.vertex_ring.handle()));

    let mut claimed: HashMap<u32, u16> = HashMap::new();
    for attribute in &program.attributes {
        let Some(info) = program.interface.attribute_infos.get(&attribute.reg_index) else {
            trace!(
                reg_index = attribute.reg_index,
                "attribute register has no host location"
            );
            continue;
        };

        let stream_index = usize::from(attribute.stream_index);
        let (Some(layout), Some(&base_offset)) = (
            program.streams.get(stream_index),
            ctx.stream_offsets.get(stream_index),
        ) else {
            warn!(
                reg_index = attribute.reg_index,
                stream = attribute.stream_index,
                "attribute references an undeclared stream"
            );
            report.skipped_attributes.push(SkippedAttribute {
                reg_index: attribute.reg_index,
                reason: AttributeSkipReason::MissingStream(attribute.stream_index),
            });
            continue;
        };

        if failed[stream_index] {
            report.skipped_attributes.push(SkippedAttribute {
                reg_index: attribute.reg_index,
                reason: AttributeSkipReason::StreamNotStaged(attribute.stream_index),
            });
            continue;
        }

        let bindings = translate_attribute(attribute, info, layout, base_offset);

        let overlap = bindings.iter().find_map(|b| {
            claimed
                .get(&b.location)
                .filter(|&&owner| owner != attribute.reg_index)
                .map(|&owner| (b.location, owner))
        });
        if let Some((location, claimed_by)) = overlap {
            warn!(
                reg_index = attribute.reg_index,
                location, claimed_by, "attribute location already bound by another register"
            );
            report.skipped_attributes.push(SkippedAttribute {
                reg_index: attribute.reg_index,
                reason: AttributeSkipReason::LocationOverlap {
                    location,
                    claimed_by,
                },
            });
            continue;
        }

        for binding in bindings {
            claimed.insert(binding.location, attribute.reg_index);
            env.backend.set_vertex_attribute(binding.location, binding.pointer);
            env.backend.enable_vertex_attribute(binding.location);
            env.backend.set_attribute_divisor(binding.location, binding.divisor);
            report.bound_locations.push(binding.location);
        }
    }

    env.backend.bind_vertex_buffer(None);
    report
}

fn stage_stream(
    ring: &mut VertexStreamRing,
    mem: &dyn GuestMemory,
    addr: u32,
    len: usize,
) -> Result<u64, StreamUploadError> {
    let src = mem.read(addr, len)?;
    let alloc = ring.allocate(len)?;
    alloc.data.copy_from_slice(src);
    Ok(alloc.offset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gxm::{IndexSource, ParameterType};

    fn attribute(format: AttributeFormat, component_count: u8) -> VertexAttribute {
        VertexAttribute {
            stream_index: 0,
            offset: 8,
            format,
            component_count,
            reg_index: 4,
        }
    }

    fn stream(stride: u16, index_source: IndexSource) -> VertexStreamLayout {
        VertexStreamLayout {
            stride,
            index_source,
        }
    }

    #[test]
    fn register_formatted_up_to_16_bytes_binds_one_integer_location() {
        let info = AttributeInformation::new(2, ParameterType::F32, true);
        let bindings = translate_attribute(
            &attribute(AttributeFormat::U8, 6),
            &info,
            &stream(24, IndexSource::Index16Bit),
            0x100,
        );
        assert_eq!(
            bindings,
            [AttributeBinding {
                location: 2,
                pointer: VertexAttributePointer {
                    components: 2,
                    ty: AttributeType::I32,
                    upload: AttributeUpload::Integer,
                    stride: 24,
                    offset: 0x108,
                },
                divisor: 0,
            }]
        );
    }

    #[test]
    fn register_formatted_20_bytes_spans_two_locations() {
        let info = AttributeInformation::new(3, ParameterType::F32, true);
        let bindings = translate_attribute(
            &attribute(AttributeFormat::F32, 5),
            &info,
            &stream(32, IndexSource::InstanceIndex16Bit),
            0,
        );
        let summary: Vec<_> = bindings
            .iter()
            .map(|b| (b.location, b.pointer.components, b.pointer.offset, b.divisor))
            .collect();
        assert_eq!(summary, [(3, 4, 8, 1), (4, 4, 24, 1)]);
        assert!(bindings
            .iter()
            .all(|b| b.pointer.upload == AttributeUpload::Integer));
    }

    #[test]
    fn typed_attributes_honor_integral_and_normalized_flags() {
        let float = translate_attribute(
            &attribute(AttributeFormat::U8N, 4),
            &AttributeInformation::new(0, ParameterType::F32, false),
            &stream(4, IndexSource::Index16Bit),
            0,
        );
        assert_eq!(
            float[0].pointer.upload,
            AttributeUpload::Float { normalized: true }
        );
        assert_eq!(float[0].pointer.ty, AttributeType::U8);

        let integral = translate_attribute(
            &attribute(AttributeFormat::S16, 2),
            &AttributeInformation::new(0, ParameterType::S16, false),
            &stream(4, IndexSource::Index16Bit),
            0,
        );
        assert_eq!(integral[0].pointer.upload, AttributeUpload::Integer);

        let untyped = translate_attribute(
            &attribute(AttributeFormat::Untyped, 1),
            &AttributeInformation::new(0, ParameterType::F32, false),
            &stream(4, IndexSource::Index16Bit),
            0,
        );
        assert_eq!(untyped[0].pointer.upload, AttributeUpload::Integer);
        assert_eq!(untyped[0].pointer.ty, AttributeType::U32);
    }
}
