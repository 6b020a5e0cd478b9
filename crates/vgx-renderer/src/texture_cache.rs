//! Fallback path for textures that alias no cached surface.

use hashbrown::HashMap;

use crate::backend::{GraphicsBackend, HostTexture};
use crate::gxm::TextureDescriptor;

/// Generic texture upload subsystem.
///
/// `data` is the already validated guest range of the texture (all mip levels).
pub trait TextureCache {
    /// Look the texture up by content, upload it on a miss, then bind it to `unit`.
    fn cache_and_bind(
        &mut self,
        unit: u32,
        texture: &TextureDescriptor,
        data: &[u8],
        backend: &mut dyn GraphicsBackend,
    );

    /// Upload into the unit's own texture object without caching.
    fn bind_direct(
        &mut self,
        unit: u32,
        texture: &TextureDescriptor,
        data: &[u8],
        backend: &mut dyn GraphicsBackend,
    );
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadKind {
    /// Content hash hit; nothing was uploaded.
    CacheHit,
    CacheMiss,
    Direct,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureUpload {
    pub unit: u32,
    pub addr: u32,
    pub len: usize,
    pub kind: UploadKind,
    pub handle: HostTexture,
}

/// Content-addressed cache stand-in that records every request.
///
/// Cached textures are keyed by the BLAKE3 digest of their bytes. Direct uploads use one
/// texture object per unit.
#[derive(Debug)]
pub struct RecordingTextureCache {
    pub uploads: Vec<TextureUpload>,
    by_content: HashMap<blake3::Hash, HostTexture>,
    next_handle: u32,
}

impl Default for RecordingTextureCache {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingTextureCache {
    /// Handles start at `0x1000` to stay clear of surface handles in tests.
    pub fn new() -> Self {
        Self {
            uploads: Vec::new(),
            by_content: HashMap::new(),
            next_handle: 0x1000,
        }
    }

    fn alloc_handle(&mut self) -> HostTexture {
        let handle = HostTexture(self.next_handle);
        self.next_handle += 1;
        handle
    }
}

impl TextureCache for RecordingTextureCache {
    fn cache_and_bind(
        &mut self,
        unit: u32,
        texture: &TextureDescriptor,
        data: &[u8],
        backend: &mut dyn GraphicsBackend,
    ) {
        let key = blake3::hash(data);
        let (handle, kind) = match self.by_content.get(&key) {
            Some(&handle) => (handle, UploadKind::CacheHit),
            None => {
                let handle = self.alloc_handle();
                self.by_content.insert(key, handle);
                (handle, UploadKind::CacheMiss)
            }
        };

        backend.bind_texture(unit, handle);
        self.uploads.push(TextureUpload {
            unit,
            addr: texture.data_addr,
            len: data.len(),
            kind,
            handle,
        });
    }

    fn bind_direct(
        &mut self,
        unit: u32,
        texture: &TextureDescriptor,
        data: &[u8],
        backend: &mut dyn GraphicsBackend,
    ) {
        let handle = HostTexture(unit);
        backend.bind_texture(unit, handle);
        self.uploads.push(TextureUpload {
            unit,
            addr: texture.data_addr,
            len: data.len(),
            kind: UploadKind::Direct,
            handle,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{BackendCall, RecordingBackend};
    use crate::gxm::{TextureBaseFormat, TextureFormat};

    #[test]
    fn identical_content_reuses_the_cached_texture() {
        let tex = TextureDescriptor::new(
            0x8100_0000,
            TextureFormat::new(TextureBaseFormat::U8, 0),
            8,
            1,
        );
        let mut cache = RecordingTextureCache::new();
        let mut backend = RecordingBackend::new();

        cache.cache_and_bind(0, &tex, &[1; 8], &mut backend);
        cache.cache_and_bind(3, &tex, &[1; 8], &mut backend);
        cache.cache_and_bind(0, &tex, &[2; 8], &mut backend);

        let kinds: Vec<_> = cache.uploads.iter().map(|u| u.kind).collect();
        assert_eq!(
            kinds,
            [UploadKind::CacheMiss, UploadKind::CacheHit, UploadKind::CacheMiss]
        );
        assert_eq!(cache.uploads[0].handle, cache.uploads[1].handle);
        assert_ne!(cache.uploads[0].handle, cache.uploads[2].handle);
        assert_eq!(
            backend.calls[1],
            BackendCall::BindTexture {
                unit: 3,
                texture: cache.uploads[0].handle,
            }
        );
    }
}
