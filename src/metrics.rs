//! Transfer metrics and CLI-friendly display formatting for the upload and
//! download coordinators and the `simulate` demo.

use std::time::Duration;

/// Metrics collected over one upload or download run.
#[derive(Debug, Clone)]
pub struct TransferMetrics {
    pub total_duration: Duration,
    pub file_size_bytes: u64,
    pub num_segments: usize,
    pub num_nodes: usize,
}

impl TransferMetrics {
    /// Bytes per second sustained over the whole transfer.
    pub fn throughput_bytes_per_sec(&self) -> f64 {
        let secs = self.total_duration.as_secs_f64();
        if secs > 0.0 {
            self.file_size_bytes as f64 / secs
        } else {
            0.0
        }
    }

    /// Format metrics as a table for CLI output.
    pub fn format_table(&self) -> String {
        let mut output = String::new();
        output.push_str("  ┌─────────────────────────────────────────────────────┐\n");
        output.push_str("  │ Metric                 │ Value                        │\n");
        output.push_str("  ├────────────────────────┼──────────────────────────────┤\n");
        output.push_str(&format!(
            "  │ File size              │ {:>28} │\n",
            format!("{:.1} KB", self.file_size_bytes as f64 / 1024.0)
        ));
        output.push_str(&format!(
            "  │ Segments               │ {:>28} │\n",
            self.num_segments
        ));
        output.push_str(&format!(
            "  │ Nodes                  │ {:>28} │\n",
            self.num_nodes
        ));
        output.push_str(&format!(
            "  │ Duration               │ {:>28} │\n",
            format!("{:.2}s", self.total_duration.as_secs_f64())
        ));
        output.push_str(&format!(
            "  │ Throughput             │ {:>28} │\n",
            format!("{:.1} KB/s", self.throughput_bytes_per_sec() / 1024.0)
        ));
        output.push_str("  └─────────────────────────────────────────────────────┘\n");
        output
    }
}

/// File size category for the CLI demo's synthetic sample files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DemoFileSize {
    /// A few chunks, well under one segment.
    Tiny,
    /// Several segments.
    Small,
    /// Tens of segments.
    Medium,
}

impl DemoFileSize {
    /// Deterministic size in bytes within this category's range, derived
    /// from a seed rather than sampled at random so demo runs are
    /// reproducible.
    pub fn sample_size(&self, seed: u64) -> usize {
        use crate::config::{CHUNK, SEG};
        let spread = match self {
            DemoFileSize::Tiny => seed % (4 * CHUNK) as u64,
            DemoFileSize::Small => seed % (4 * SEG) as u64,
            DemoFileSize::Medium => seed % (40 * SEG) as u64,
        };
        let floor = match self {
            DemoFileSize::Tiny => CHUNK,
            DemoFileSize::Small => SEG,
            DemoFileSize::Medium => 10 * SEG,
        };
        floor + spread as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn throughput_is_zero_for_an_instant_transfer() {
        let metrics = TransferMetrics {
            total_duration: Duration::ZERO,
            file_size_bytes: 1024,
            num_segments: 1,
            num_nodes: 1,
        };
        assert_eq!(metrics.throughput_bytes_per_sec(), 0.0);
    }

    #[test]
    fn demo_file_sizes_stay_within_their_category() {
        use crate::config::{CHUNK, SEG};
        for seed in [0u64, 1, 42, 1000] {
            let tiny = DemoFileSize::Tiny.sample_size(seed);
            assert!(tiny >= CHUNK && tiny < CHUNK + 4 * CHUNK);

            let small = DemoFileSize::Small.sample_size(seed);
            assert!(small >= SEG && small < SEG + 4 * SEG);
        }
    }
}
