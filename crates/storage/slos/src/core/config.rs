//! Mount-time configuration, analogous to the sysctls the original exposed.
//!
//! Built once at mount and passed by reference to whatever needs it; there
//! is no global mutable config, so tests can mount several filesystems
//! with different settings in the same process.

use super::structures::DEFAULT_AMORTIZATION_CHUNK;

#[derive(Clone, Copy, Debug)]
pub struct SlosConfig {
    /// Milliseconds between syncer wakeups that check whether a checkpoint
    /// is due.
    pub checkpointtime_ms: u64,

    /// Whether to verify (and recompute) CRCs on structures the format
    /// does not require a checksum for. Metadata nodes are always
    /// checksummed; this only gates the optional checksum tree.
    pub checksum_enabled: bool,

    /// Track bytes read/written per open object, for callers that want
    /// accounting without a full metrics pipeline.
    pub count_opened_bytes: bool,

    /// Blocks pulled from the size tree per allocator refill.
    pub amortization_chunk: u64,
}

impl Default for SlosConfig {
    fn default() -> Self {
        Self {
            checkpointtime_ms: 100,
            checksum_enabled: false,
            count_opened_bytes: false,
            amortization_chunk: DEFAULT_AMORTIZATION_CHUNK,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_documented_sysctl_defaults() {
        let cfg = SlosConfig::default();
        assert_eq!(cfg.checkpointtime_ms, 100);
        assert!(!cfg.checksum_enabled);
        assert_eq!(cfg.amortization_chunk, 1024);
    }
}
