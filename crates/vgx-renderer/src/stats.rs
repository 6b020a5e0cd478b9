use std::sync::atomic::{AtomicU64, Ordering};

/// Per-context counters for draw-time state resolution.
///
/// Updated on the render thread; safe to read from another thread for telemetry.
#[derive(Debug, Default)]
pub struct SyncStats {
    self_sample_binds: AtomicU64,
    surface_alias_binds: AtomicU64,
    external_uploads: AtomicU64,
    skipped_units: AtomicU64,
    ring_bytes_staged: AtomicU64,
    ring_allocation_failures: AtomicU64,
}

impl SyncStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inc_self_sample_binds(&self) {
        self.self_sample_binds.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_surface_alias_binds(&self) {
        self.surface_alias_binds.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_external_uploads(&self) {
        self.external_uploads.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_skipped_units(&self) {
        self.skipped_units.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_ring_bytes_staged(&self, bytes: u64) {
        self.ring_bytes_staged.fetch_add(bytes, Ordering::Relaxed);
    }

    pub fn inc_ring_allocation_failures(&self) {
        self.ring_allocation_failures
            .fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> SyncStatsSnapshot {
        SyncStatsSnapshot {
            self_sample_binds: self.self_sample_binds.load(Ordering::Relaxed),
            surface_alias_binds: self.surface_alias_binds.load(Ordering::Relaxed),
            external_uploads: self.external_uploads.load(Ordering::Relaxed),
            skipped_units: self.skipped_units.load(Ordering::Relaxed),
            ring_bytes_staged: self.ring_bytes_staged.load(Ordering::Relaxed),
            ring_allocation_failures: self.ring_allocation_failures.load(Ordering::Relaxed),
        }
    }

    /// Returns a JSON object as a string.
    pub fn to_json(&self) -> String {
        self.snapshot().to_json()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncStatsSnapshot {
    pub self_sample_binds: u64,
    pub surface_alias_binds: u64,
    pub external_uploads: u64,
    pub skipped_units: u64,
    pub ring_bytes_staged: u64,
    pub ring_allocation_failures: u64,
}

impl SyncStatsSnapshot {
    pub fn to_json(self) -> String {
        format!(
            "{{\"self_sample_binds\":{},\"surface_alias_binds\":{},\"external_uploads\":{},\"skipped_units\":{},\"ring\":{{\"bytes_staged\":{},\"allocation_failures\":{}}}}}",
            self.self_sample_binds,
            self.surface_alias_binds,
            self.external_uploads,
            self.skipped_units,
            self.ring_bytes_staged,
            self.ring_allocation_failures,
        )
    }
}
