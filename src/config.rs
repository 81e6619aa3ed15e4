//! Reader tunables.

use std::time::Duration;

/// Knobs for one [`GitReader`](crate::GitReader).
#[derive(Debug, Clone)]
pub struct ReaderConfig {
    /// Upper bound for a single pipe read. Small enough that a chatty child
    /// cannot stall the loop, large enough to keep syscall overhead down.
    pub chunk_size: usize,
    /// Maximum bytes of stderr retained for the diagnostic message
    /// (default: 256 KiB). Older bytes are dropped first.
    pub stderr_cap_bytes: usize,
    /// How long a terminated child may linger after SIGTERM before the
    /// reader escalates to SIGKILL.
    pub kill_grace: Duration,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            chunk_size: 512,
            stderr_cap_bytes: 256 * 1024,
            kill_grace: Duration::from_secs(5),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ReaderConfig::default();
        assert_eq!(config.chunk_size, 512);
        assert_eq!(config.stderr_cap_bytes, 256 * 1024);
        assert_eq!(config.kill_grace, Duration::from_secs(5));
    }
}
