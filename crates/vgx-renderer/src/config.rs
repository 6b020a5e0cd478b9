use std::path::PathBuf;

/// Renderer options that influence per-draw resolution.
#[derive(Debug, Clone)]
pub struct RendererConfig {
    /// Route external uploads through the content-addressed texture cache instead of uploading
    /// every draw.
    pub texture_cache: bool,
    /// Write the guest bytes of every resolved texture under `dump_root`.
    pub dump_textures: bool,
    pub dump_root: PathBuf,
    /// Title the dumps are grouped under.
    pub title_id: String,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            texture_cache: true,
            dump_textures: false,
            dump_root: PathBuf::from("."),
            title_id: String::from("unknown"),
        }
    }
}
