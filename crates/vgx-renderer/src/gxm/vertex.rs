use hashbrown::HashMap;

pub const MAX_VERTEX_STREAMS: usize = 16;

/// Guest vertex attribute component format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeFormat {
    U8,
    S8,
    U16,
    S16,
    U8N,
    S8N,
    U16N,
    S16N,
    F16,
    F32,
    /// Raw 32-bit words with no declared interpretation.
    Untyped,
}

impl AttributeFormat {
    /// Size of one component in bytes.
    pub fn component_size(self) -> u32 {
        use AttributeFormat::*;
        match self {
            U8 | S8 | U8N | S8N => 1,
            U16 | S16 | U16N | S16N | F16 => 2,
            F32 | Untyped => 4,
        }
    }

    pub fn is_normalized(self) -> bool {
        use AttributeFormat::*;
        matches!(self, U8N | S8N | U16N | S16N)
    }

    /// Host component type used when fetching this format.
    pub fn host_type(self) -> AttributeType {
        use AttributeFormat::*;
        match self {
            U8 | U8N => AttributeType::U8,
            S8 | S8N => AttributeType::I8,
            U16 | U16N => AttributeType::U16,
            S16 | S16N => AttributeType::I16,
            F16 => AttributeType::F16,
            F32 => AttributeType::F32,
            Untyped => AttributeType::U32,
        }
    }
}

/// Host vertex fetch component type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeType {
    U8,
    I8,
    U16,
    I16,
    U32,
    I32,
    F16,
    F32,
}

/// Type of a shader input as seen by the program's interface analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParameterType {
    F32,
    F16,
    C10,
    U32,
    S32,
    U16,
    S16,
    U8,
    S8,
    Aggregate,
}

impl ParameterType {
    /// Whether the shader reads this input as an integer.
    pub fn is_integral(self) -> bool {
        use ParameterType::*;
        matches!(self, U8 | S8 | U16 | S16 | U32 | S32)
    }
}

/// How a stream is indexed; instanced sources advance once per instance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum IndexSource {
    #[default]
    Index16Bit,
    Index32Bit,
    InstanceIndex16Bit,
    InstanceIndex32Bit,
}

impl IndexSource {
    pub fn is_instancing(self) -> bool {
        matches!(
            self,
            IndexSource::InstanceIndex16Bit | IndexSource::InstanceIndex32Bit
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexAttribute {
    pub stream_index: u16,
    pub offset: u16,
    pub format: AttributeFormat,
    pub component_count: u8,
    pub reg_index: u16,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct VertexStreamLayout {
    pub stride: u16,
    pub index_source: IndexSource,
}

/// Host-side description of one vertex program input register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AttributeInformation {
    pub location: u16,
    pub gxm_type: ParameterType,
    /// The register is read as raw bit-packed words rather than typed components.
    pub regformat: bool,
}

impl AttributeInformation {
    pub fn new(location: u16, gxm_type: ParameterType, regformat: bool) -> Self {
        Self {
            location,
            gxm_type,
            regformat,
        }
    }
}

/// Host locations produced by shader interface analysis, keyed by input register index.
#[derive(Debug, Clone, Default)]
pub struct ProgramInterface {
    pub attribute_infos: HashMap<u16, AttributeInformation>,
    stripped_symbols_checked: bool,
}

impl ProgramInterface {
    pub fn new(attribute_infos: HashMap<u16, AttributeInformation>) -> Self {
        Self {
            attribute_infos,
            stripped_symbols_checked: false,
        }
    }

    pub fn stripped_symbols_checked(&self) -> bool {
        self.stripped_symbols_checked
    }
}

#[derive(Debug, Clone, Default)]
pub struct VertexProgram {
    pub attributes: Vec<VertexAttribute>,
    pub streams: Vec<VertexStreamLayout>,
    pub primary_reg_count: u16,
    pub interface: ProgramInterface,
}

impl VertexProgram {
    /// Give every declared attribute a host location when the program binary carried no
    /// input symbols.
    ///
    /// Runs once per program. Registers that already have an analysed location keep it; the
    /// rest are read as `F32` at the attribute's declaration index.
    pub fn ensure_stripped_symbols(&mut self) {
        if self.interface.stripped_symbols_checked {
            return;
        }

        if self.primary_reg_count != 0 {
            for (i, attribute) in self.attributes.iter().enumerate() {
                self.interface
                    .attribute_infos
                    .entry(attribute.reg_index)
                    .or_insert_with(|| {
                        AttributeInformation::new(i as u16, ParameterType::F32, false)
                    });
            }
        }

        self.interface.stripped_symbols_checked = true;
    }
}

/// Guest vertex data pending upload for one stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VertexStreamData {
    /// Guest address of the data; `None` once the data has been staged.
    pub data_addr: Option<u32>,
    pub size: u32,
}

impl VertexStreamData {
    pub fn new(data_addr: u32, size: u32) -> Self {
        Self {
            data_addr: Some(data_addr),
            size,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.data_addr.is_some()
    }

    pub(crate) fn clear(&mut self) {
        self.data_addr = None;
        self.size = 0;
    }
}
