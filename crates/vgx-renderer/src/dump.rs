//! Raw dumps of sampled guest textures, grouped by title and fragment program.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use hashbrown::HashSet;
use thiserror::Error;
use tracing::debug;

use crate::gxm::{FragmentProgram, TextureDescriptor, TextureFormat, MAX_TEXTURE_UNITS};

#[derive(Debug, Error)]
pub enum DumpError {
    #[error("failed to write texture dump {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct DumpKey {
    program: blake3::Hash,
    addr: u32,
    format: TextureFormat,
    width: u16,
    height: u16,
}

/// Writes each distinct (program, texture) pair once.
#[derive(Debug)]
pub struct TextureDumper {
    dir: PathBuf,
    dumped: HashSet<DumpKey>,
}

impl TextureDumper {
    pub fn new(dump_root: impl AsRef<Path>, title_id: &str) -> Self {
        Self {
            dir: dump_root.as_ref().join("textures").join(title_id),
            dumped: HashSet::new(),
        }
    }

    /// Directory the dumps of this title go to.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write `data` for the texture bound to `unit`.
    ///
    /// Returns the written path, or `None` when this texture was already dumped for the same
    /// program.
    pub fn dump(
        &mut self,
        program: Option<&FragmentProgram>,
        unit: u32,
        texture: &TextureDescriptor,
        data: &[u8],
    ) -> Result<Option<PathBuf>, DumpError> {
        let code = program.map(|p| p.code.as_slice()).unwrap_or_default();
        let key = DumpKey {
            program: blake3::hash(code),
            addr: texture.data_addr,
            format: texture.format,
            width: texture.width,
            height: texture.height,
        };
        if self.dumped.contains(&key) {
            return Ok(None);
        }

        // Sampler names only exist for fragment units.
        let parameter = program
            .filter(|_| (unit as usize) < MAX_TEXTURE_UNITS)
            .and_then(|p| p.sampler_name(unit))
            .map(sanitize)
            .unwrap_or_else(|| format!("unit{unit}"));

        let hex = key.program.to_hex();
        let dir = self.dir.join(&hex.as_str()[..16]);
        let path = dir.join(format!(
            "{parameter}_{:08x}_{}x{}.raw",
            texture.data_addr, texture.width, texture.height
        ));

        fs::create_dir_all(&dir).map_err(|source| DumpError::Io {
            path: dir.clone(),
            source,
        })?;
        fs::write(&path, data).map_err(|source| DumpError::Io {
            path: path.clone(),
            source,
        })?;

        debug!(unit, path = %path.display(), bytes = data.len(), "dumped texture");
        self.dumped.insert(key);
        Ok(Some(path))
    }
}

fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}
