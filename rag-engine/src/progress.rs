//! Progress reporting for batch ingestion.
//!
//! Servers use [`NoopProgress`]; the CLI uploader plugs in a terminal bar.

/// Minimal progress interface driven by [`crate::DocumentIngestor::ingest_batch_with`].
pub trait Progress: Send + Sync {
    /// Known total items.
    fn set_total(&self, _n: u64) {}
    /// One item finished (either way); `label` identifies it.
    fn step(&self, _label: &str, _ok: bool) {}
    fn finish(&self, _msg: &str) {}
}

#[derive(Default, Clone, Copy)]
pub struct NoopProgress;

impl Progress for NoopProgress {}
