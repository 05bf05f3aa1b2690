//! Per-pass and per-run metrics.
//!
//! [`PassMetrics`] captures timing and counts for one sweep over the
//! block sequence; [`RunReport`] collects the passes of a completed run.

use indexmap::IndexMap;
use skyvis_core::{DescriptorList, RunMode};

/// Timing and counts collected during one pass.
///
/// All durations are in microseconds.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PassMetrics {
    /// Mode the pass ran in.
    pub mode: RunMode,
    /// Number of blocks dispatched.
    pub blocks: usize,
    /// Number of blocks written to the output sink.
    pub blocks_persisted: usize,
    /// Wall-clock time for the whole pass.
    pub total_us: u64,
    /// Time spent inside the generator.
    pub generate_us: u64,
    /// Time spent writing blocks to the output sink.
    pub persist_us: u64,
    /// Accumulated update time per imager, in registration order.
    pub imager_us: IndexMap<String, u64>,
}

impl PassMetrics {
    /// Empty metrics for a pass in `mode`.
    pub fn new(mode: RunMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    /// Add update time for one imager.
    pub fn record_imager(&mut self, name: &str, us: u64) {
        match self.imager_us.get_mut(name) {
            Some(total) => *total += us,
            None => {
                self.imager_us.insert(name.to_string(), us);
            }
        }
    }
}

/// Summary of a successful run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunReport {
    /// Classification of every imager, read before the run.
    pub imagers: DescriptorList,
    /// The coordinate-only pass, if one was required.
    pub coords_pass: Option<PassMetrics>,
    /// The full pass.
    pub full_pass: PassMetrics,
    /// Time spent finalising the output sink and imagers.
    pub finalise_us: u64,
    /// Wall-clock time for the whole run.
    pub total_us: u64,
}

impl RunReport {
    /// Number of passes executed: 1 or 2.
    pub fn passes(&self) -> usize {
        1 + usize::from(self.coords_pass.is_some())
    }

    /// Total blocks written to the output sink across the run.
    pub fn blocks_persisted(&self) -> usize {
        self.coords_pass
            .as_ref()
            .map_or(0, |p| p.blocks_persisted)
            + self.full_pass.blocks_persisted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_metrics_are_zero() {
        let m = PassMetrics::new(RunMode::CoordsOnly);
        assert_eq!(m.mode, RunMode::CoordsOnly);
        assert_eq!(m.blocks, 0);
        assert_eq!(m.blocks_persisted, 0);
        assert_eq!(m.total_us, 0);
        assert!(m.imager_us.is_empty());
    }

    #[test]
    fn imager_times_accumulate_in_registration_order() {
        let mut m = PassMetrics::new(RunMode::Full);
        m.record_imager("psf", 5);
        m.record_imager("dirty", 7);
        m.record_imager("psf", 3);
        let names: Vec<&str> = m.imager_us.keys().map(String::as_str).collect();
        assert_eq!(names, ["psf", "dirty"]);
        assert_eq!(m.imager_us["psf"], 8);
    }

    #[test]
    fn report_counts_passes() {
        let report = RunReport {
            imagers: DescriptorList::new(),
            coords_pass: Some(PassMetrics::new(RunMode::CoordsOnly)),
            full_pass: PassMetrics {
                blocks_persisted: 4,
                ..PassMetrics::new(RunMode::Full)
            },
            finalise_us: 0,
            total_us: 0,
        };
        assert_eq!(report.passes(), 2);
        assert_eq!(report.blocks_persisted(), 4);
    }
}
